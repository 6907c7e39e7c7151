//! Server state and configuration.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::compose::MergeList;
use crate::render::engine::{QrEngine, QrcodeEngine};
use crate::scan::{BarcodeScanner, RqrrScanner};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "127.0.0.1:8080")
    pub listen_addr: String,
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub engine: Arc<dyn QrEngine>,
    pub scanner: Arc<dyn BarcodeScanner>,
    /// One merge list per server; every client edits the same list.
    pub merge: RwLock<MergeList>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_collaborators(config, Arc::new(QrcodeEngine), Arc::new(RqrrScanner))
    }

    pub fn with_collaborators(
        config: ServerConfig,
        engine: Arc<dyn QrEngine>,
        scanner: Arc<dyn BarcodeScanner>,
    ) -> Self {
        Self {
            config,
            engine,
            scanner,
            merge: RwLock::new(MergeList::new()),
        }
    }
}
