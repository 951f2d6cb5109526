//! Query command implementation

use anyhow::Result;
use std::path::PathBuf;

#[cfg(feature = "sqlite-sink")]
pub fn run_query(db_path: PathBuf, sql: String) -> Result<()> {
    use anyhow::Context;
    use meridian::{GraphSink, SqliteSink};

    if !db_path.exists() {
        anyhow::bail!("database not found: {}", db_path.display());
    }
    let sink = SqliteSink::open(&db_path)
        .with_context(|| format!("Failed to open {}", db_path.display()))?;
    let rows = sink.execute_query(&sql)?;

    for row in &rows {
        let line: Vec<String> = row
            .columns()
            .map(|(column, value)| format!("{}={}", column, value))
            .collect();
        println!("{}", line.join("\t"));
    }
    eprintln!("{} rows", rows.len());
    Ok(())
}

#[cfg(not(feature = "sqlite-sink"))]
pub fn run_query(_db_path: PathBuf, _sql: String) -> Result<()> {
    anyhow::bail!("query requires the sqlite-sink feature")
}
