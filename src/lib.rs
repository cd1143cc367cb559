//! msgkit - message extraction and translation sync
//!
//! msgkit scans JavaScript, TypeScript, HTML, Vue and PHP sources for
//! translatable messages, keeps per-locale translation catalogs in step with
//! them, checks translations for placeholder and markup drift, and reconciles
//! everything with a remote translation store.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer
//! - `config`: Configuration file loading and validation
//! - `core`: Entry model, extraction, validation, catalogs and sync
//! - `utils`: Shared text helpers

pub mod cli;
pub mod config;
pub mod core;
pub mod utils;
