// Adapters layer: concrete implementations for external systems (files, document store, http).

pub mod http;
pub mod storage;
pub mod store;
