//! CSV export for episode step records.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::StepRecord;

/// Column header for CSV step export.
const HEADER: &str = "episode,hour,reward,grid_cost_eur,purchased_kwh,\
                      buying_buildings,transferred_kwh,done";

/// Exports the records of one or more episodes to a CSV file at the given path.
///
/// Writes a header row followed by one data row per step. Produces
/// deterministic output for identical inputs.
///
/// # Arguments
///
/// * `episodes` - Step records per episode, in episode order
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(episodes: &[Vec<StepRecord>], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(episodes, buf)
}

/// Writes episode records as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(episodes: &[Vec<StepRecord>], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for (episode, records) in episodes.iter().enumerate() {
        for r in records {
            wtr.write_record(&[
                episode.to_string(),
                r.hour.to_string(),
                format!("{:.4}", r.reward),
                format!("{:.6}", r.grid_cost),
                format!("{:.6}", r.purchased_kwh),
                r.buying_buildings.to_string(),
                format!("{:.6}", r.transferred_kwh),
                r.done.to_string(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
