//! Pure tree algorithms: path normalization, link classification, building
//! the tree from rows, mapping it into editor nodes and flattening it back.
//!
//! None of these functions fail on well-typed input; malformed structure
//! (orphans, cycles, unknown paths) degrades to a defined shape instead.

pub mod normalize;
pub mod classify;
pub mod builder;
pub mod mapper;
pub mod flatten;
pub mod editor_ops;
pub mod triples;
pub mod transfer;

pub use normalize::normalize;
pub use classify::{classify, resolve_internal_path, Classification};
pub use builder::build;
pub use mapper::to_editor;
pub use flatten::flatten;
pub use triples::derive_triples;
pub use transfer::{export_json, parse_import};
