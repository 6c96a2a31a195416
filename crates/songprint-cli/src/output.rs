//! JSON output formatting

use serde::Serialize;
use songprint_core::{IndexEntry, MatchResult};
use std::collections::BTreeMap;
use std::path::Path;

/// Matched library entry as printed by `spmatch`
#[derive(Debug, Serialize)]
pub struct MatchedEntry {
    pub id: String,
    pub file_name: String,
    pub file_path: String,
    pub song_name: String,
    pub author: String,
    pub duration: f64,
    pub cover_path: Option<String>,
}

/// JSON projection of a [`MatchResult`]
#[derive(Debug, Serialize)]
pub struct MatchReport {
    pub query_path: String,
    pub matched: Option<MatchedEntry>,
    pub best_id: Option<String>,
    pub confidence: f64,
    pub fallback: bool,
    pub feature_breakdown: BTreeMap<String, f64>,
}

impl MatchReport {
    pub fn new(query_path: &Path, result: MatchResult) -> Self {
        Self {
            query_path: query_path.display().to_string(),
            matched: result.matched.map(|d| MatchedEntry {
                id: d.id,
                file_name: d.file_name,
                file_path: d.file_path,
                song_name: d.song_name,
                author: d.author,
                duration: d.duration_seconds,
                cover_path: d.cover_path,
            }),
            best_id: result.best_id,
            confidence: result.confidence,
            fallback: result.fallback,
            feature_breakdown: result.feature_breakdown,
        }
    }
}

/// A file that could not be ingested
#[derive(Debug, Serialize)]
pub struct FailedFile {
    pub path: String,
    pub error: String,
}

/// Summary printed at the end of a batch ingest
#[derive(Debug, Default, Serialize)]
pub struct IngestSummary {
    pub processed: usize,
    pub added: usize,
    pub replaced: usize,
    pub skipped_duplicates: usize,
    pub failed: Vec<FailedFile>,
}

/// Index listing printed by `spdb list`
#[derive(Debug, Serialize)]
pub struct ListedEntry<'a> {
    pub id: &'a str,
    #[serde(flatten)]
    pub entry: &'a IndexEntry,
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing output: {}", e),
    }
}
