//! Cart commands.

use shopfront_core::ProductId;
use shopfront_storefront::{FileStorage, Result, ShopSession};
use tracing::{info, warn};

/// Report every cart line and the totals.
pub fn show(shop: &ShopSession<FileStorage>) {
    let cart = shop.cart();
    if cart.is_empty() {
        info!("Cart is empty");
        return;
    }

    for line in cart.items() {
        info!(
            id = %line.id,
            title = %line.title,
            amount = line.amount,
            price = %line.price,
            line_price = %format!("${:.2}", line.line_price().unwrap_or_default()),
            "Cart line"
        );
    }
    info!(
        total_quantity = cart.total_quantity(),
        total_price = %format!("${:.2}", cart.total_price()),
        "Cart total"
    );
}

/// Add `quantity` units of a product.
///
/// # Errors
///
/// Returns an error if the quantity is zero, the product does not exist, or
/// the backend rejects the change.
pub async fn add(shop: &mut ShopSession<FileStorage>, id: &ProductId, quantity: u32) -> Result<()> {
    let product = shop.fetch_product(id).await?;
    if product.in_stock == Some(false) {
        warn!(id = %product.id, "Product is out of stock");
    }

    shop.add_to_cart(&product, quantity).await?;
    info!(id = %product.id, title = %product.title, quantity, "Added to cart");
    show(shop);
    Ok(())
}

/// Set the quantity of a product.
///
/// # Errors
///
/// Returns an error if the quantity is zero or the backend rejects the change.
pub async fn update(
    shop: &mut ShopSession<FileStorage>,
    id: &ProductId,
    quantity: u32,
) -> Result<()> {
    if shop.update_cart_amount(id, quantity).await? {
        info!(%id, quantity, "Cart updated");
    } else {
        info!(%id, "Product not in cart");
    }
    show(shop);
    Ok(())
}

/// Remove a product.
///
/// # Errors
///
/// Returns an error if the backend rejects the change.
pub async fn remove(shop: &mut ShopSession<FileStorage>, id: &ProductId) -> Result<()> {
    if shop.remove_from_cart(id).await? {
        info!(%id, "Removed from cart");
    } else {
        info!(%id, "Product not in cart");
    }
    show(shop);
    Ok(())
}

/// Empty the local cart.
pub fn clear(shop: &mut ShopSession<FileStorage>) {
    shop.clear_cart();
    info!("Cart cleared");
}
