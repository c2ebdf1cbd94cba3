//! Result rendering
//!
//! Two output modes: `human` prints a bold file name followed by a colored
//! OK/ERROR verdict with per-error lines on stderr; `json` emits a map of
//! file path to the list of per-document statuses.

use std::collections::BTreeMap;
use std::io::{self, Write};

use console::style;
use kubevet_validator::{Status, ValidationError, error_to_status};

/// The per-file validation outcome
pub struct FileResult {
    pub path: String,
    pub outcomes: Vec<Option<ValidationError>>,
}

impl FileResult {
    pub fn has_errors(&self) -> bool {
        self.outcomes.iter().any(Option::is_some)
    }

    pub fn statuses(&self) -> Vec<Status> {
        self.outcomes
            .iter()
            .map(|outcome| error_to_status(outcome.as_ref()))
            .collect()
    }
}

/// Render one file's verdict in human mode
pub fn display_human(result: &FileResult, out: &mut dyn Write, err: &mut dyn Write) -> io::Result<()> {
    write!(out, "{}...", style(&result.path).bold())?;
    if result.has_errors() {
        writeln!(out, "{}", style("ERROR").red())?;
        for outcome in result.outcomes.iter().flatten() {
            writeln!(err, "{outcome}")?;
        }
    } else {
        writeln!(out, "{}", style("OK").green())?;
    }
    Ok(())
}

/// Render every file's statuses as a JSON map
pub fn display_json(results: &[FileResult], out: &mut dyn Write) -> io::Result<()> {
    let map: BTreeMap<&str, Vec<Status>> = results
        .iter()
        .map(|result| (result.path.as_str(), result.statuses()))
        .collect();

    let rendered = serde_json::to_string_pretty(&map).map_err(io::Error::other)?;
    writeln!(out, "{rendered}")
}
