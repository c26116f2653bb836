//! Domain models for the storefront.
//!
//! - [`product`] - Catalog products and their create/patch payloads
//! - [`user`] - User records (product owners)
//! - [`session`] - The logged-in identity decoded from the session token

pub mod product;
pub mod session;
pub mod user;

pub use product::{NewProduct, Product, ProductPatch, is_absolute_url};
pub use session::{CurrentUser, SESSION_COOKIE};
pub use user::{NewUser, User, UserPatch};
