//! InnovateMart storefront library.
//!
//! Server-rendered product catalog, per-visitor cart and checkout, served
//! by the `innovatemart-storefront` binary. Exposed as a library so the
//! router can be exercised in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod render;
pub mod routes;
pub mod state;
