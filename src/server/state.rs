//! Shared application state for the API server

use crate::record::Dataset;
use crate::store::KeyValueStore;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Persisted-state backend shared by all handlers.
pub type SharedStore = Arc<Mutex<Box<dyn KeyValueStore + Send>>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Records loaded at startup, most recent first. Read-only.
    pub dataset: Arc<Dataset>,
    /// Settings, layout and comments.
    /// Wrapped in Mutex because SQLite connections are not thread-safe
    pub store: SharedStore,
}

impl AppState {
    /// Creates a new application state
    pub fn new<S>(dataset: Dataset, store: S) -> Self
    where
        S: KeyValueStore + Send + 'static,
    {
        AppState {
            dataset: Arc::new(dataset),
            store: Arc::new(Mutex::new(Box::new(store))),
        }
    }
}
