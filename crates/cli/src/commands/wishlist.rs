//! Wishlist commands.
//!
//! The wishlist is not kept between runs; every command starts by loading
//! the backend's list.

use shopfront_core::ProductId;
use shopfront_storefront::{FileStorage, Result, ShopSession};
use tracing::info;

fn report(shop: &ShopSession<FileStorage>) {
    let wishlist = shop.wishlist();
    if wishlist.is_empty() {
        info!("Wishlist is empty");
        return;
    }

    for item in wishlist.items() {
        info!(
            id = %item.id,
            title = %item.title,
            price = %item.price,
            in_stock = ?item.in_stock,
            "Saved"
        );
    }
    info!(count = wishlist.count(), "Wishlist total");
}

/// Load and report the wishlist.
///
/// # Errors
///
/// Returns an error if the backend cannot be reached.
pub async fn show(shop: &mut ShopSession<FileStorage>) -> Result<()> {
    shop.refresh_wishlist().await?;
    report(shop);
    Ok(())
}

/// Save a product.
///
/// # Errors
///
/// Returns an error if the product does not exist or the backend rejects the
/// change.
pub async fn add(shop: &mut ShopSession<FileStorage>, id: &ProductId) -> Result<()> {
    shop.refresh_wishlist().await?;
    let product = shop.fetch_product(id).await?;

    if shop.add_to_wishlist(&product).await? {
        info!(id = %product.id, title = %product.title, "Saved to wishlist");
    } else {
        info!(id = %product.id, "Already in wishlist");
    }
    report(shop);
    Ok(())
}

/// Remove a saved product.
///
/// # Errors
///
/// Returns an error if the backend rejects the change.
pub async fn remove(shop: &mut ShopSession<FileStorage>, id: &ProductId) -> Result<()> {
    shop.refresh_wishlist().await?;

    if shop.remove_from_wishlist(id).await? {
        info!(%id, "Removed from wishlist");
    } else {
        info!(%id, "Product not in wishlist");
    }
    report(shop);
    Ok(())
}
