//! REST API server for the spread dashboard

mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, SharedStore};

use crate::record::Dataset;
use crate::sqlite_store::SqliteStore;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host address (default: "127.0.0.1")
    pub host: String,
    /// Server port (default: 3000)
    pub port: u16,
    /// Path to the imported JSON dataset
    pub data_path: String,
    /// Path to the SQLite database holding settings, layout and comments
    pub database_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            data_path: "data/cotton_data.json".to_string(),
            database_path: "dashboard.db".to_string(),
        }
    }
}

impl ServerConfig {
    /// Creates a new server configuration
    pub fn new(
        host: impl Into<String>,
        port: u16,
        data_path: impl Into<String>,
        database_path: impl Into<String>,
    ) -> Self {
        ServerConfig {
            host: host.into(),
            port,
            data_path: data_path.into(),
            database_path: database_path.into(),
        }
    }

    /// Reads `HOST`, `PORT`, `DATA_PATH` and `DATABASE_PATH`, falling back to
    /// the defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = ServerConfig::default();
        ServerConfig {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|port| port.parse::<u16>().ok())
                .unwrap_or(defaults.port),
            data_path: std::env::var("DATA_PATH").unwrap_or(defaults.data_path),
            database_path: std::env::var("DATABASE_PATH").unwrap_or(defaults.database_path),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Installs the global fmt subscriber; `RUST_LOG` overrides the default
/// `info` level.
///
/// Returns `false` when a subscriber was already installed, e.g. by an
/// embedding binary, in which case that one keeps receiving events.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
    {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(error = %e, "Tracing subscriber already installed");
            false
        }
    }
}

/// Runs the API server
///
/// # Arguments
/// * `config` - Server configuration
///
/// # Returns
/// Returns an error if the dataset cannot be loaded, the database cannot be
/// opened, or the server fails to start
///
/// # Example
/// ```rust,no_run
/// use spread_analytics::server::{run_server, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     run_server(ServerConfig::default()).await?;
///     Ok(())
/// }
/// ```
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let dataset = Dataset::from_json_file(&config.data_path)?;
    tracing::info!(
        records = dataset.len(),
        fields = dataset.field_names().len(),
        "Loaded dataset from {}",
        config.data_path
    );

    let store = SqliteStore::new(&config.database_path)?;

    let state = Arc::new(AppState::new(dataset, store));
    let app = create_router(state);

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.address(), "127.0.0.1:3000");
        assert_eq!(config.data_path, "data/cotton_data.json");
        assert_eq!(config.database_path, "dashboard.db");
    }

    #[test]
    fn tracing_installs_once() {
        init_tracing();
        assert!(!init_tracing());
    }

    #[test]
    fn explicit_config() {
        let config = ServerConfig::new("0.0.0.0", 8080, "a.json", "b.db");
        assert_eq!(config.address(), "0.0.0.0:8080");
        assert_eq!(config.data_path, "a.json");
    }
}
