//! Converts an exported market sheet (CSV) into the dashboard's JSON dataset.
//!
//! Usage: `import-sheet <input.csv> [output.json]`
//!
//! The output defaults to `data/cotton_data.json`.

use spread_analytics::import::{import_csv, write_json};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing_subscriber::EnvFilter;

const DEFAULT_OUTPUT: &str = "data/cotton_data.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let mut args = std::env::args().skip(1);
    let input = match args.next() {
        Some(input) => input,
        None => {
            eprintln!("Usage: import-sheet <input.csv> [output.json]");
            std::process::exit(2);
        }
    };
    let output = args.next().unwrap_or_else(|| DEFAULT_OUTPUT.to_string());

    let records = import_csv(BufReader::new(File::open(&input)?))?;

    if let Some(parent) = Path::new(&output).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    write_json(&records, BufWriter::new(File::create(&output)?))?;

    println!("Imported {} records from {} into {}", records.len(), input, output);

    Ok(())
}
