pub mod commands;
pub mod params;

use serde::Serialize;

use crate::requests::historical::{ChunkReport, FetchResult};

/// Exit code when the whole range produced no records.
pub const NO_DATA_EXIT_CODE: u8 = 2;

/// Output of one fetch command.
pub struct Rendered {
    /// Pretty JSON for stdout.
    pub json: String,
    /// Lines for stderr describing failed chunks.
    pub notes: Vec<String>,
    pub exit_code: u8,
}

pub fn render<T: Serialize + ChunkReport>(result: &FetchResult<T>) -> serde_json::Result<Rendered> {
    let json = serde_json::to_string_pretty(result)?;
    let (failures, cancelled, exit_code) = match result {
        FetchResult::Data(report) => (report.failures(), report.cancelled(), 0),
        FetchResult::NoDataFound { failures, cancelled } => {
            (failures.as_slice(), *cancelled, NO_DATA_EXIT_CODE)
        }
    };

    let mut notes = Vec::new();
    if matches!(result, FetchResult::NoDataFound { .. }) {
        notes.push("No data found for the requested range.".to_string());
    } else if !failures.is_empty() {
        notes.push(format!("Partial result: {} chunk(s) failed.", failures.len()));
    }
    notes.extend(failures.iter().map(|f| format!("  {f}")));
    if cancelled {
        notes.push("Stopped early: timeout reached before the last chunk.".to_string());
    }

    Ok(Rendered {
        json,
        notes,
        exit_code,
    })
}
