//! Spread Dashboard API Server Binary
//!
//! Run with: `cargo run --bin spreads-server`

use spread_analytics::{run_server, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Tracing is initialized in run_server()
    // Set RUST_LOG to control the log level:
    //   RUST_LOG=debug cargo run --bin spreads-server
    //   RUST_LOG=spread_analytics::server=debug cargo run --bin spreads-server

    let config = ServerConfig::from_env();

    println!("Starting Spread Dashboard API Server...");
    println!("   Host: {}", config.host);
    println!("   Port: {}", config.port);
    println!("   Dataset: {}", config.data_path);
    println!("   Database: {}", config.database_path);
    println!();
    println!(
        "Server will be available at: http://{}:{}",
        config.host, config.port
    );
    println!();
    println!("Available endpoints:");
    println!("  GET  /health                          - Health check");
    println!("  GET  /fields                          - List columns");
    println!("  GET  /records?range=30d               - Records for a range");
    println!("  GET  /compare/:field?mode=week        - Change against baseline");
    println!("  GET  /statistics/:field               - Summary statistics");
    println!("  GET  /indicators/:field/:indicator    - SMA, EMA, Bollinger, RSI, levels");
    println!("  GET  /correlation                     - Correlation matrix");
    println!("  GET  /heatmap?range=                  - Spread heat map");
    println!("  GET  /volatility                      - Volatility panel");
    println!("  GET  /settings  PUT /settings         - User settings");
    println!("  POST /settings/reset                  - Restore default settings");
    println!("  GET  /layout    POST /layout/reset    - Dashboard layout");
    println!("  POST /layout/:view/move               - Reorder a section");
    println!("  POST /layout/:view/toggle/:section    - Show or hide a section");
    println!("  GET  /layout/:view/active             - Visible sections");
    println!("  GET  /comments                        - Sections with comments");
    println!("  GET  /comments/:section  POST ...     - Section comments");
    println!("  PUT  /comment/:id  DELETE ...         - Edit or delete a comment");
    println!();

    run_server(config).await?;

    Ok(())
}
