//! Library core: no terminal output and no configuration lookup.
//!
//! - `entry`: keys, translations and the collection they live in
//! - `extract`: per-dialect message extraction
//! - `validate`: placeholder and markup checks for translations
//! - `catalog`: persisted key and translation catalogs
//! - `plural`: plural categories per locale
//! - `sync`: reconciliation with a remote translation store

pub mod catalog;
pub mod entry;
pub mod extract;
pub mod plural;
pub mod sync;
pub mod validate;
