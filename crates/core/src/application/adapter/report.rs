// Parsing of the tool's captured output

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Marker printed by 3DFSC in front of the sphericity value
pub const SPHERICITY_MARKER: &str = "Sphericity is ";

/// Lines of captured output attached to a failed run
pub const FAILURE_TAIL_LINES: usize = 20;

/// What a scan of the report found
#[derive(Debug, Clone, PartialEq)]
pub enum SphericityScan {
    Found(f64),
    /// Marker present but the third token is missing or not a number
    Unparsable(String),
    Missing,
}

/// Scan for the first line containing the marker
///
/// The value is the third whitespace-delimited token of that line
/// (`Sphericity is 0.847 at threshold 0.5` -> 0.847).
pub fn scan_sphericity<R: Read>(reader: R) -> std::io::Result<SphericityScan> {
    let reader = BufReader::new(reader);
    for line in reader.split(b'\n') {
        let line = String::from_utf8_lossy(&line?).into_owned();
        if !line.contains(SPHERICITY_MARKER) {
            continue;
        }
        return Ok(match line.split_whitespace().nth(2).map(str::parse::<f64>) {
            Some(Ok(value)) => SphericityScan::Found(value),
            _ => SphericityScan::Unparsable(line.trim_end().to_string()),
        });
    }
    Ok(SphericityScan::Missing)
}

/// Scan a report file; a missing file counts as a missing marker
pub fn scan_sphericity_file(path: &Path) -> std::io::Result<SphericityScan> {
    match std::fs::File::open(path) {
        Ok(file) => scan_sphericity(file),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SphericityScan::Missing),
        Err(e) => Err(e),
    }
}

/// Last `lines` lines of a text file, `None` if it cannot be read
pub fn read_tail(path: &Path, lines: usize) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    let text = String::from_utf8_lossy(&bytes);
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    Some(all[start..].join("\n"))
}
