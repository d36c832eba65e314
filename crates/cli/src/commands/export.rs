//! Export the product catalog as CSV.

use std::path::Path;

use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::info;

use jsonshop_server::db::{CsvStream, Database};

/// Write the catalog CSV to `output`, or stdout when `None`.
///
/// # Errors
///
/// Returns an error if the products collection cannot be loaded or the
/// output cannot be written.
pub async fn run(db: &Database, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let stream = db.products().export_csv().await?;

    let rows = match output {
        Some(path) => {
            let mut file = tokio::fs::File::create(path).await?;
            let rows = write_csv(stream, &mut file).await?;
            file.sync_all().await?;
            info!(path = %path.display(), rows, "Catalog exported");
            rows
        }
        None => write_csv(stream, &mut tokio::io::stdout()).await?,
    };

    info!(rows, "Export complete");
    Ok(())
}

/// Copy every chunk to `writer`, returning the number of product rows.
async fn write_csv<W>(mut stream: CsvStream, writer: &mut W) -> Result<usize, Box<dyn std::error::Error>>
where
    W: AsyncWrite + Unpin,
{
    let mut chunks = 0usize;
    while let Some(chunk) = stream.next().await {
        writer.write_all(&chunk?).await?;
        chunks += 1;
    }
    writer.flush().await?;
    // First chunk is the header
    Ok(chunks.saturating_sub(1))
}
