//! Sign-in and sign-out commands.

use secrecy::SecretString;
use shopfront_storefront::{FileStorage, Result, ShopSession};
use tracing::info;

/// Sign in and load the user's wishlist.
///
/// # Errors
///
/// Returns an error if the credentials are rejected or the backend fails.
pub async fn login(
    shop: &mut ShopSession<FileStorage>,
    email: &str,
    password: &SecretString,
) -> Result<()> {
    let user = shop.sign_in(email, password).await?;
    info!(user_id = %user.id, name = %user.name, "Signed in");
    info!(
        cart_lines = shop.cart().len(),
        wishlist = shop.wishlist().count(),
        "Session ready"
    );
    Ok(())
}

/// Sign out and clear the cart and wishlist.
pub fn logout(shop: &mut ShopSession<FileStorage>) {
    if !shop.is_signed_in() {
        info!("Not signed in");
    }
    shop.sign_out();
}
