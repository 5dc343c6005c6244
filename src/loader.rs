// Discovery and parsing of per-legislator source documents.
//
// The upstream exporter writes `NaN` for missing numbers, which strict JSON
// parsers reject. Documents are repaired textually, parsed with serde, and
// defaulted into a `SourceRecord` at this boundary so nothing downstream
// deals with optional fields.
use rayon::prelude::*;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Anomaly, PipelineError, PipelineResult};
use crate::types::{Project, RawMlaDocument, SectorEntry, SourceRecord};
use crate::util::{value_as_f64, value_as_text};

pub const UNKNOWN_MLA: &str = "Unknown MLA";
pub const UNKNOWN_CONSTITUENCY: &str = "Unknown";
pub const UNLABELLED_SECTOR: &str = "Others";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub files_found: usize,
    pub records_parsed: usize,
    /// One `Anomaly::ParseFailure` per skipped file.
    pub failures: Vec<Anomaly>,
}

/// A candidate source file below the data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// `./<data root name>/<CODE>/<file>` with `/` separators; the record id
    /// that published documents and lookups use.
    pub id: String,
    pub district_code: String,
}

/// Replace unquoted `NaN` value tokens with `null`.
///
/// Only tokens in value position (after `:`, `,` or `[`) outside string
/// literals are touched, so a project named "NaN Road" survives. Returns the
/// input unchanged when there is nothing to repair.
pub fn repair_nan(raw: &str) -> Cow<'_, str> {
    if !raw.contains("NaN") {
        return Cow::Borrowed(raw);
    }
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut copied = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut prev: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
                prev = Some(b);
            }
        } else if b == b'"' {
            in_string = true;
        } else if bytes[i..].starts_with(b"NaN")
            && matches!(prev, Some(b':' | b',' | b'['))
            && !bytes
                .get(i + 3)
                .is_some_and(|n| n.is_ascii_alphanumeric() || *n == b'_')
        {
            out.push_str(&raw[copied..i]);
            out.push_str("null");
            i += 3;
            copied = i;
            prev = Some(b'l');
            continue;
        } else if !b.is_ascii_whitespace() {
            prev = Some(b);
        }
        i += 1;
    }

    if copied == 0 {
        return Cow::Borrowed(raw);
    }
    out.push_str(&raw[copied..]);
    Cow::Owned(out)
}

/// Parse one source document into a `SourceRecord`.
///
/// `id` is used for error messages and stored on the record.
pub fn parse_record(raw: &str, id: &str, district_code: &str) -> PipelineResult<SourceRecord> {
    let repaired = repair_nan(raw);
    let doc: RawMlaDocument = serde_json::from_str(&repaired).map_err(|e| PipelineError::Parse {
        path: id.to_string(),
        reason: e.to_string(),
    })?;
    Ok(SourceRecord::from_raw(doc, id, district_code))
}

impl SourceRecord {
    /// Apply defaults for every optional field of a raw document.
    pub fn from_raw(doc: RawMlaDocument, id: &str, district_code: &str) -> Self {
        let summary = doc.summary;
        let expenditure_total = summary
            .as_ref()
            .and_then(|s| s.total_expenditure_crores)
            .unwrap_or(0.0);
        let sector_breakdown = summary
            .and_then(|s| s.breakdown)
            .unwrap_or_default()
            .into_iter()
            .map(|s| SectorEntry {
                label: s.label.unwrap_or_else(|| UNLABELLED_SECTOR.to_string()),
                value_crores: s.value_crores,
            })
            .collect();
        let projects = doc
            .projects
            .unwrap_or_default()
            .iter()
            .map(project_from_value)
            .collect();

        SourceRecord {
            id: id.to_string(),
            district_code: district_code.to_string(),
            legislator_name: doc.mla_name.unwrap_or_else(|| UNKNOWN_MLA.to_string()),
            constituency_raw: doc
                .constituency
                .unwrap_or_else(|| UNKNOWN_CONSTITUENCY.to_string()),
            expenditure_total,
            sector_breakdown,
            projects,
            image: doc.image,
        }
    }
}

// Project entries are hand-entered and loosely typed; a malformed project
// should never cost us the legislator's totals, so fields are read leniently.
fn project_from_value(v: &serde_json::Value) -> Project {
    let text = |key: &str| v.get(key).and_then(value_as_text).filter(|s| !s.is_empty());
    Project {
        project_name: text("project_name"),
        fy: text("fy"),
        category: text("category"),
        implementing_agency: text("implementing_agency"),
        estimate_lakhs: v.get("estimate_lakhs").and_then(value_as_f64),
    }
}

/// Record id for a file at `segments` below `root`: the path relative to
/// the root's parent, prefixed with `./`.
pub fn record_id(root: &Path, segments: &[String]) -> String {
    let mut id = String::from(".");
    if let Some(name) = root.file_name() {
        id.push('/');
        id.push_str(&name.to_string_lossy());
    }
    for segment in segments {
        id.push('/');
        id.push_str(segment);
    }
    id
}

/// Recursively find files under `root` whose name ends with `suffix`.
///
/// Results are sorted by id so every run folds records in the same order.
/// A missing root yields no files; files directly in the root have no
/// district segment and are skipped.
pub fn discover_files(root: &Path, suffix: &str) -> Vec<SourceFile> {
    if !root.exists() {
        warn!(root = %root.display(), "data directory does not exist");
        return Vec::new();
    }
    let mut files: Vec<SourceFile> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().ends_with(suffix))
        .filter_map(|e| {
            let rel = e.path().strip_prefix(root).ok()?;
            let segments: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            if segments.len() < 2 {
                warn!(path = %e.path().display(), "source file has no district directory, skipping");
                return None;
            }
            Some(SourceFile {
                path: e.path().to_path_buf(),
                id: record_id(root, &segments),
                district_code: segments[0].clone(),
            })
        })
        .collect();
    files.sort_by(|a, b| a.id.cmp(&b.id));
    files
}

fn read_and_parse(file: &SourceFile) -> PipelineResult<SourceRecord> {
    let raw = std::fs::read_to_string(&file.path).map_err(|e| PipelineError::io(&file.path, e))?;
    parse_record(&raw, &file.id, &file.district_code)
}

/// Load every source document under `root`.
///
/// Files are read and parsed in parallel; the returned records keep
/// discovery order. A file that cannot be read or parsed is logged, listed
/// in the report and left out. It never fails the load.
pub fn load_records(root: &Path, suffix: &str) -> (Vec<SourceRecord>, LoadReport) {
    let files = discover_files(root, suffix);
    debug!(count = files.len(), root = %root.display(), "discovered source files");

    let results: Vec<PipelineResult<SourceRecord>> = files.par_iter().map(read_and_parse).collect();

    let mut records = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (file, result) in files.iter().zip(results) {
        match result {
            Ok(record) => records.push(record),
            Err(e) => {
                let reason = match e {
                    PipelineError::Parse { reason, .. } => reason,
                    other => other.to_string(),
                };
                warn!(path = %file.id, reason = %reason, "failed to parse source file, skipping");
                failures.push(Anomaly::ParseFailure {
                    path: file.id.clone(),
                    reason,
                });
            }
        }
    }

    let report = LoadReport {
        files_found: files.len(),
        records_parsed: records.len(),
        failures,
    };
    info!(
        files = report.files_found,
        parsed = report.records_parsed,
        skipped = report.failures.len(),
        "loaded source records"
    );
    (records, report)
}
