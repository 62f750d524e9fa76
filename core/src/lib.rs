//! Core types, traits and configuration for vecdex.
//!
//! Backends and providers are implemented in `vecdex-plugins`; this crate only
//! defines the shapes they agree on.

pub mod api;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod filter;
pub mod vector_store;
