//! Coloring-page catalog site and content generator.
//!
//! The library is shared by two binaries: `colorbook` (the axum site) and
//! `colorbook-gen` (the generator CLI).

pub mod catalog;
pub mod config;
pub mod error;
pub mod generator;
pub mod logger;
pub mod server;
pub mod slug;
