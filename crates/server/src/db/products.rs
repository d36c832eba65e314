//! Product repository: catalog CRUD and nested review operations.
//!
//! Every operation loads the full products collection. Mutations run as a
//! single locked read-modify-write cycle through [`Database::modify`].

use tracing::instrument;

use jsonshop_core::{
    Product, ProductId, ProductInput, Rating, Review, ReviewId, ReviewInput, ReviewPatch,
    timestamp,
};

use super::export::{self, CsvStream};
use super::{Database, RepositoryError};

/// Repository for product operations.
pub struct ProductRepository<'a> {
    db: &'a Database,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// List all products, or only those in `category` when given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the collection cannot be loaded.
    #[instrument(skip(self))]
    pub async fn get_all(&self, category: Option<&str>) -> Result<Vec<Product>, RepositoryError> {
        let products: Vec<Product> = self.db.read(&self.db.paths().products).await?;

        Ok(match category {
            Some(category) => products
                .into_iter()
                .filter(|p| p.in_category(category))
                .collect(),
            None => products,
        })
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this ID.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_by_id(&self, id: &ProductId) -> Result<Product, RepositoryError> {
        self.get_all(None)
            .await?
            .into_iter()
            .find(|p| &p.id == id)
            .ok_or_else(|| RepositoryError::not_found("product", id))
    }

    /// Create a product from client input.
    ///
    /// Assigns a fresh ID, sets both timestamps to now and starts with no
    /// reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` if the name is missing or out
    /// of bounds, `RepositoryError::Conflict` if the generated ID is taken.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: ProductInput) -> Result<Product, RepositoryError> {
        let name = input.validated_name()?;
        let product = Product::new(ProductId::generate(), name, input, timestamp::now());
        self.insert(product).await
    }

    /// Insert a fully formed product, keeping its ID and timestamps.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a product with the same ID exists.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn insert(&self, product: Product) -> Result<Product, RepositoryError> {
        self.db
            .modify(&self.db.paths().products, |products: &mut Vec<Product>| {
                if products.iter().any(|p| p.id == product.id) {
                    return Err(RepositoryError::Conflict(format!(
                        "product {} already exists",
                        product.id
                    )));
                }
                products.push(product.clone());
                Ok(product)
            })
            .await
    }

    /// Merge `input` onto an existing product and refresh its update time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` if the name is missing or out
    /// of bounds, `RepositoryError::NotFound` if no product has this ID.
    #[instrument(skip(self, input), fields(product_id = %id))]
    pub async fn update(
        &self,
        id: &ProductId,
        input: ProductInput,
    ) -> Result<Product, RepositoryError> {
        let name = input.validated_name()?;
        let now = timestamp::now();

        self.db
            .modify(&self.db.paths().products, |products: &mut Vec<Product>| {
                let product = find_mut(products, id)?;
                product.merge(name, input, now);
                Ok(product.clone())
            })
            .await
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this ID.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        self.db
            .modify(&self.db.paths().products, |products: &mut Vec<Product>| {
                let index = products
                    .iter()
                    .position(|p| &p.id == id)
                    .ok_or_else(|| RepositoryError::not_found("product", id))?;
                products.remove(index);
                Ok(())
            })
            .await
    }

    /// Delete every product, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the collection cannot be rewritten.
    #[instrument(skip(self))]
    pub async fn delete_all(&self) -> Result<usize, RepositoryError> {
        self.db
            .modify(&self.db.paths().products, |products: &mut Vec<Product>| {
                let removed = products.len();
                products.clear();
                Ok(removed)
            })
            .await
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// List the reviews of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this ID.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn list_reviews(&self, product_id: &ProductId) -> Result<Vec<Review>, RepositoryError> {
        Ok(self.get_by_id(product_id).await?.reviews)
    }

    /// Get a single review of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product or the review is absent.
    #[instrument(skip(self), fields(product_id = %product_id, review_id = %review_id))]
    pub async fn get_review(
        &self,
        product_id: &ProductId,
        review_id: &ReviewId,
    ) -> Result<Review, RepositoryError> {
        self.get_by_id(product_id)
            .await?
            .reviews
            .into_iter()
            .find(|r| &r.id == review_id)
            .ok_or_else(|| RepositoryError::not_found("review", review_id))
    }

    /// Add a review to a product, returning the product's reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` if the rating or comment is
    /// missing or the rating is not a number from 1 to 5 (nothing is
    /// written), `RepositoryError::NotFound` if no product has this ID.
    #[instrument(skip(self, input), fields(product_id = %product_id))]
    pub async fn add_review(
        &self,
        product_id: &ProductId,
        input: ReviewInput,
    ) -> Result<Vec<Review>, RepositoryError> {
        let rating = input
            .rating
            .ok_or_else(|| RepositoryError::Validation("Rate is required".to_string()))?;
        let rating = Rating::parse(&rating)?;
        let comment = input
            .comment
            .ok_or_else(|| RepositoryError::Validation("comment is required".to_string()))?;
        let review = Review::new(ReviewId::generate(), rating, comment, timestamp::now());

        self.db
            .modify(&self.db.paths().products, |products: &mut Vec<Product>| {
                let product = find_mut(products, product_id)?;
                product.reviews.push(review);
                Ok(product.reviews.clone())
            })
            .await
    }

    /// Merge `input` onto a review and stamp its update time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` if a supplied rating is not a
    /// number in range, `RepositoryError::NotFound` if the product or review is absent.
    #[instrument(skip(self, input), fields(product_id = %product_id, review_id = %review_id))]
    pub async fn update_review(
        &self,
        product_id: &ProductId,
        review_id: &ReviewId,
        input: ReviewInput,
    ) -> Result<Vec<Review>, RepositoryError> {
        let patch = ReviewPatch::from_input(input)?;
        let now = timestamp::now();

        self.db
            .modify(&self.db.paths().products, |products: &mut Vec<Product>| {
                let product = find_mut(products, product_id)?;
                let review = product
                    .reviews
                    .iter_mut()
                    .find(|r| &r.id == review_id)
                    .ok_or_else(|| RepositoryError::not_found("review", review_id))?;
                patch.apply(review, now);
                Ok(product.reviews.clone())
            })
            .await
    }

    /// Delete a review, returning the product's remaining reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product or review is absent.
    #[instrument(skip(self), fields(product_id = %product_id, review_id = %review_id))]
    pub async fn delete_review(
        &self,
        product_id: &ProductId,
        review_id: &ReviewId,
    ) -> Result<Vec<Review>, RepositoryError> {
        self.db
            .modify(&self.db.paths().products, |products: &mut Vec<Product>| {
                let product = find_mut(products, product_id)?;
                let index = product
                    .reviews
                    .iter()
                    .position(|r| &r.id == review_id)
                    .ok_or_else(|| RepositoryError::not_found("review", review_id))?;
                product.reviews.remove(index);
                Ok(product.reviews.clone())
            })
            .await
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Export the catalog as a stream of CSV rows.
    ///
    /// The collection is loaded before the stream is returned, so storage
    /// errors surface here rather than mid-stream.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the collection cannot be loaded.
    #[instrument(skip(self))]
    pub async fn export_csv(&self) -> Result<CsvStream, RepositoryError> {
        let products = self.get_all(None).await?;
        tracing::info!(products = products.len(), "Exporting catalog as CSV");
        Ok(export::csv_stream(products))
    }
}

fn find_mut<'p>(
    products: &'p mut [Product],
    id: &ProductId,
) -> Result<&'p mut Product, RepositoryError> {
    products
        .iter_mut()
        .find(|p| &p.id == id)
        .ok_or_else(|| RepositoryError::not_found("product", id))
}
