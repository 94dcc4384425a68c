//! Manifests: the documents stages hand to each other.
//!
//! A manifest is saved as `<Type>_<yyyyMMdd_HHmmss>.json` in the manifest
//! directory and recovered by [`ManifestStore::find`], which prefers the
//! run's in-memory cache and falls back to the newest recent file on disk.

mod model;
mod snapshot;
mod store;

pub use model::{Manifest, ManifestTemplate};
pub use snapshot::{json_depth, BackReference, BACK_REFERENCE_KEYS};
pub use store::ManifestStore;
