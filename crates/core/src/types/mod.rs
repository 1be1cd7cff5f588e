//! Core types for InnovateMart.
//!
//! This module provides type-safe wrappers for the storefront's domain.

pub mod cart;
pub mod id;
pub mod order;
pub mod price;
pub mod product;

pub use cart::{Cart, CartError, CartLine};
pub use id::{ProductId, ProductIdError};
pub use order::{OrderLine, OrderRequest};
pub use price::Price;
pub use product::{Catalog, Product};
