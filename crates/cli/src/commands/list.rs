//! Print stored records.

use bazaar_storefront::catalog;
use bazaar_storefront::db::{RecordStore, RepositoryError};
use bazaar_storefront::models::{Product, User};

use super::Paths;

/// Print the catalog, each product joined with its owner, as JSON.
///
/// # Errors
///
/// Returns an error if a document cannot be read.
#[allow(clippy::print_stdout)]
pub async fn products(paths: &Paths) -> Result<(), Box<dyn std::error::Error>> {
    let store = RecordStore::new(&paths.data_dir);
    let products = load::<Product>(&store).await?;
    let users = load::<User>(&store).await?;
    let views = catalog::join_products(products, &users);
    println!("{}", serde_json::to_string_pretty(&views)?);
    Ok(())
}

/// Print the user records as JSON.
///
/// # Errors
///
/// Returns an error if the document cannot be read.
#[allow(clippy::print_stdout)]
pub async fn users(paths: &Paths) -> Result<(), Box<dyn std::error::Error>> {
    let store = RecordStore::new(&paths.data_dir);
    let users = load::<User>(&store).await?;
    println!("{}", serde_json::to_string_pretty(&users)?);
    Ok(())
}

/// Strict load, so a corrupt document is reported instead of printed as empty.
async fn load<R: bazaar_storefront::db::Record>(
    store: &RecordStore,
) -> Result<Vec<R>, RepositoryError> {
    store.load_document::<R>().await
}
