//! Seed the product and cart collections from a YAML file.
//!
//! ```yaml
//! products:
//!   - _id: espresso-cup        # optional, generated when absent
//!     name: Espresso Cup
//!     price: 9.5
//!     category: kitchen
//! carts:
//!   - _id: cart1
//!     products: [espresso-cup]
//! ```
//!
//! The whole file is validated before anything is written. Records whose id
//! already exists are skipped, not overwritten.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use jsonshop_core::{Cart, Product, ProductId, ProductInput, timestamp};
use jsonshop_server::db::{Database, RepositoryError};

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub products: Vec<SeedProduct>,
    #[serde(default)]
    pub carts: Vec<Cart>,
}

/// A product entry; `_id` is optional.
#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    #[serde(rename = "_id", default)]
    pub id: Option<ProductId>,
    #[serde(flatten)]
    pub input: ProductInput,
}

/// Outcome of a seeding run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub products_inserted: usize,
    pub products_skipped: usize,
    pub carts_inserted: usize,
    pub carts_skipped: usize,
}

/// Check every entry, returning one message per problem.
#[must_use]
pub fn validate(seed: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();

    let mut product_ids = HashSet::new();
    for (index, product) in seed.products.iter().enumerate() {
        if let Err(e) = product.input.validated_name() {
            errors.push(format!("products[{index}]: {e}"));
        }
        if let Some(id) = &product.id
            && !product_ids.insert(id)
        {
            errors.push(format!("products[{index}]: duplicate _id {id}"));
        }
    }

    let mut cart_ids = HashSet::new();
    for (index, cart) in seed.carts.iter().enumerate() {
        if !cart_ids.insert(&cart.id) {
            errors.push(format!("carts[{index}]: duplicate _id {}", cart.id));
        }
    }

    errors
}

/// Insert every entry of a validated seed file.
///
/// # Errors
///
/// Returns the first error other than a `Conflict`, which counts as skipped.
pub async fn seed_database(
    db: &Database,
    seed: SeedFile,
    clear_existing: bool,
) -> Result<SeedSummary, RepositoryError> {
    let mut summary = SeedSummary::default();

    if clear_existing {
        let products = db.products().delete_all().await?;
        let carts = db.carts().delete_all().await?;
        info!(products, carts, "Cleared existing collections");
    }

    let now = timestamp::now();
    for entry in seed.products {
        let name = entry.input.validated_name()?;
        let id = entry.id.unwrap_or_else(ProductId::generate);
        let product = Product::new(id, name, entry.input, now);

        match db.products().insert(product).await {
            Ok(_) => summary.products_inserted += 1,
            Err(RepositoryError::Conflict(msg)) => {
                info!("Skipping: {msg}");
                summary.products_skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    for cart in seed.carts {
        match db.carts().insert(cart).await {
            Ok(_) => summary.carts_inserted += 1,
            Err(RepositoryError::Conflict(msg)) => {
                info!("Skipping: {msg}");
                summary.carts_skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(summary)
}

/// Seed the collections from a YAML file.
///
/// # Arguments
///
/// * `db` - Target collections
/// * `file_path` - Path to the YAML seed file
/// * `clear_existing` - If true, delete all products and carts first
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a collection cannot be written.
pub async fn run(
    db: &Database,
    file_path: &Path,
    clear_existing: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(path = %file_path.display(), "Loading seed data from file");

    let content = tokio::fs::read_to_string(file_path)
        .await
        .map_err(|e| format!("Cannot read {}: {e}", file_path.display()))?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    info!(
        products = seed.products.len(),
        carts = seed.carts.len(),
        "Parsed seed file"
    );

    let errors = validate(&seed);
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let summary = seed_database(db, seed, clear_existing).await?;

    info!("Seeding complete!");
    info!("  Products inserted: {}", summary.products_inserted);
    info!(
        "  Products skipped (already exist): {}",
        summary.products_skipped
    );
    info!("  Carts inserted: {}", summary.carts_inserted);
    info!("  Carts skipped (already exist): {}", summary.carts_skipped);

    Ok(())
}
