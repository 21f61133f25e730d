//! Library crate for usrapi-manager.
//!
//! This crate exposes the building blocks of the TUI:
//! - Remote collection client and record schema (`api`)
//! - User collection synchronization (`sync`)
//! - Application state and update loop (`app`)
//! - Command-line configuration (`config`)
//! - Error and result types (`error`)
//! - UI rendering and widgets (`ui`)
//!
//! It is used by the `usrapi-manager` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod sync;
pub mod ui;

// Re-export commonly used items at the crate root for convenience
/// Convenient error and result types shared across the crate.
pub use error::{DynError, RequestError, Result};
pub use sync::UserCollectionSync;
