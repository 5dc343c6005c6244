// Run configuration for the batch commands and the query layer.
//
// Defaults reproduce the fixed layout the site build expects; every field
// can be overridden through an `MLA_*` environment variable so the commands
// stay argument-free.
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::util::parse_f64_safe;

pub const DEFAULT_DATA_DIR: &str = "src/data/MLA_DATA";
pub const DEFAULT_GEOGRAPHY_FILE: &str = "src/data/ConstituencyByDistrict.json";
pub const DEFAULT_IMAGE_IDS_FILE: &str = "src/data/mlaImageIds.json";
pub const DEFAULT_MLA_SUMMARY_FILE: &str = "src/data/mlaSummary.json";
pub const DEFAULT_DISTRICT_SUMMARY_FILE: &str = "src/data/districtSummary.json";
pub const DEFAULT_FILE_SUFFIX: &str = "_projects.json";

/// Expected full allocation, in crores, used by the utilization heuristic.
///
/// The upstream figure of 25 crores per seat is a placeholder, not a
/// published entitlement; treat any utilization number as indicative only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtilizationBaselines {
    /// Multiplied by the number of constituencies in a district.
    pub per_district_seat: f64,
    /// Baseline for a single constituency.
    pub per_constituency: f64,
}

impl Default for UtilizationBaselines {
    fn default() -> Self {
        Self {
            per_district_seat: 25.0,
            per_constituency: 25.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub geography_file: PathBuf,
    /// Optional list of known portrait identifiers; a missing file simply
    /// disables image matching.
    pub image_ids_file: PathBuf,
    pub mla_summary_file: PathBuf,
    pub district_summary_file: PathBuf,
    pub file_suffix: String,
    pub baselines: UtilizationBaselines,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            geography_file: PathBuf::from(DEFAULT_GEOGRAPHY_FILE),
            image_ids_file: PathBuf::from(DEFAULT_IMAGE_IDS_FILE),
            mla_summary_file: PathBuf::from(DEFAULT_MLA_SUMMARY_FILE),
            district_summary_file: PathBuf::from(DEFAULT_DISTRICT_SUMMARY_FILE),
            file_suffix: DEFAULT_FILE_SUFFIX.to_string(),
            baselines: UtilizationBaselines::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults with overrides read from the process environment.
    pub fn from_env() -> PipelineResult<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`. Empty values are ignored.
    ///
    /// Recognised keys: `MLA_DATA_DIR`, `MLA_GEOGRAPHY_FILE`,
    /// `MLA_IMAGE_IDS_FILE`, `MLA_SUMMARY_OUT`, `MLA_DISTRICT_SUMMARY_OUT`,
    /// `MLA_FILE_SUFFIX`, `MLA_BASELINE_DISTRICT_SEAT`,
    /// `MLA_BASELINE_CONSTITUENCY`.
    pub fn with_overrides<F>(mut self, lookup: F) -> PipelineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("MLA_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = get("MLA_GEOGRAPHY_FILE") {
            self.geography_file = PathBuf::from(v);
        }
        if let Some(v) = get("MLA_IMAGE_IDS_FILE") {
            self.image_ids_file = PathBuf::from(v);
        }
        if let Some(v) = get("MLA_SUMMARY_OUT") {
            self.mla_summary_file = PathBuf::from(v);
        }
        if let Some(v) = get("MLA_DISTRICT_SUMMARY_OUT") {
            self.district_summary_file = PathBuf::from(v);
        }
        if let Some(v) = get("MLA_FILE_SUFFIX") {
            self.file_suffix = v;
        }
        if let Some(v) = get("MLA_BASELINE_DISTRICT_SEAT") {
            self.baselines.per_district_seat = parse_baseline("MLA_BASELINE_DISTRICT_SEAT", &v)?;
        }
        if let Some(v) = get("MLA_BASELINE_CONSTITUENCY") {
            self.baselines.per_constituency = parse_baseline("MLA_BASELINE_CONSTITUENCY", &v)?;
        }
        Ok(self)
    }

    /// Rooted at `root`: every default path is joined onto it.
    pub fn rooted_at(root: &Path) -> Self {
        let d = Self::default();
        Self {
            data_dir: root.join(d.data_dir),
            geography_file: root.join(d.geography_file),
            image_ids_file: root.join(d.image_ids_file),
            mla_summary_file: root.join(d.mla_summary_file),
            district_summary_file: root.join(d.district_summary_file),
            ..d
        }
    }
}

fn parse_baseline(key: &str, raw: &str) -> PipelineResult<f64> {
    match parse_f64_safe(Some(raw)) {
        Some(v) if v > 0.0 => Ok(v),
        _ => Err(PipelineError::Config(format!(
            "{key} must be a positive number of crores, got {raw:?}"
        ))),
    }
}

/// Path of the CSV companion written next to a JSON output.
pub fn csv_companion(json_path: &Path) -> PathBuf {
    json_path.with_extension("csv")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_match_site_layout() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.data_dir, PathBuf::from("src/data/MLA_DATA"));
        assert_eq!(cfg.file_suffix, "_projects.json");
        assert_eq!(cfg.baselines.per_district_seat, 25.0);
    }

    #[test]
    fn overrides_replace_paths_and_baselines() {
        let cfg = PipelineConfig::default()
            .with_overrides(lookup(&[
                ("MLA_DATA_DIR", "/tmp/mla"),
                ("MLA_BASELINE_CONSTITUENCY", "40"),
                ("MLA_FILE_SUFFIX", ""),
            ]))
            .expect("valid overrides");
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/mla"));
        assert_eq!(cfg.baselines.per_constituency, 40.0);
        assert_eq!(cfg.baselines.per_district_seat, 25.0);
        assert_eq!(cfg.file_suffix, "_projects.json");
    }

    #[test]
    fn non_positive_baseline_is_rejected() {
        let err = PipelineConfig::default()
            .with_overrides(lookup(&[("MLA_BASELINE_DISTRICT_SEAT", "0")]))
            .expect_err("zero baseline");
        assert!(err.to_string().contains("MLA_BASELINE_DISTRICT_SEAT"));
    }

    #[test]
    fn csv_companion_swaps_extension() {
        assert_eq!(
            csv_companion(Path::new("out/districtSummary.json")),
            PathBuf::from("out/districtSummary.csv")
        );
    }
}
