//! InnovateMart Core - Shared domain types.
//!
//! This crate provides the types shared by the storefront and its tests:
//! - `storefront` - Server-rendered shop front with a per-visitor cart
//! - `integration-tests` - End-to-end tests against a mock catalog API
//!
//! # Architecture
//!
//! The core crate contains only types and pure cart logic - no I/O, no
//! sessions, no HTTP clients. Persistence and rendering live in the
//! storefront crate.
//!
//! # Modules
//!
//! - [`types`] - Product identifiers, prices, catalog entries, carts and orders

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
