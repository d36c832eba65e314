//! CSV export of the product catalog.
//!
//! Rows are encoded lazily, one per poll, so the HTTP body never holds the
//! whole file.

use std::pin::Pin;

use axum::body::Bytes;
use futures::stream::{self, Stream, StreamExt};

use jsonshop_core::{Product, timestamp};

/// Exported columns, in order.
pub const CSV_FIELDS: [&str; 9] = [
    "_id",
    "name",
    "description",
    "brand",
    "price",
    "category",
    "createdAt",
    "updatedAt",
    "imageUrl",
];

/// A stream of encoded CSV rows, header first.
pub type CsvStream = Pin<Box<dyn Stream<Item = Result<Bytes, csv::Error>> + Send>>;

/// Build the export stream for `products`.
#[must_use]
pub fn csv_stream(products: Vec<Product>) -> CsvStream {
    let header = stream::once(async { encode_row(CSV_FIELDS) });
    let rows = stream::iter(products).map(|product| encode_row(product_row(&product)));
    Box::pin(header.chain(rows))
}

/// One row per product; absent optional fields become blank cells.
fn product_row(product: &Product) -> [String; 9] {
    [
        product.id.to_string(),
        product.name.clone(),
        product.description.clone().unwrap_or_default(),
        product.brand.clone().unwrap_or_default(),
        product.price.map(|p| p.to_string()).unwrap_or_default(),
        product.category.clone().unwrap_or_default(),
        timestamp::format(&product.created_at),
        timestamp::format(&product.updated_at),
        product.image_url.clone().unwrap_or_default(),
    ]
}

fn encode_row<I, T>(record: I) -> Result<Bytes, csv::Error>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(record)?;
    let buf = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(Bytes::from(buf))
}
