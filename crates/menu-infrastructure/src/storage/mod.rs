//! Local draft storage adapters

pub mod file_draft_storage;

pub use file_draft_storage::FileDraftStorage;
