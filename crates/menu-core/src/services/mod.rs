//! Domain services

pub mod abort;
pub mod debounce;
pub mod menu_store;

pub use abort::{AbortController, AbortSignal};
pub use debounce::Debouncer;
pub use menu_store::{LoadOutcome, MenuStore, MenuStoreConfig, RequestKey, SaveReport, ScheduledLink, StoreStatus};
