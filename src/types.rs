use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::Tabled;

use crate::util::display_crores;

// ----------------------------- Source documents -----------------------------

/// One legislator's source document as it appears on disk (after `NaN`
/// repair). Every field is optional; defaults are applied once, in
/// `SourceRecord::from_raw`.
#[derive(Debug, Deserialize)]
pub struct RawMlaDocument {
    pub mla_name: Option<String>,
    pub constituency: Option<String>,
    pub summary: Option<RawSummary>,
    pub projects: Option<Vec<Value>>,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawSummary {
    pub total_expenditure_crores: Option<f64>,
    pub breakdown: Option<Vec<RawSector>>,
}

#[derive(Debug, Deserialize)]
pub struct RawSector {
    pub label: Option<String>,
    pub value_crores: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorEntry {
    pub label: String,
    /// `None` when the source had `null` or `NaN`; aggregation counts it as 0.
    pub value_crores: Option<f64>,
}

impl SectorEntry {
    pub fn value(&self) -> f64 {
        self.value_crores.unwrap_or(0.0)
    }
}

/// A single project line from a source document. Projects are only counted
/// by the aggregator; the fields feed the project listing queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Project {
    pub project_name: Option<String>,
    pub fy: Option<String>,
    pub category: Option<String>,
    pub implementing_agency: Option<String>,
    pub estimate_lakhs: Option<f64>,
}

/// A parsed, defaulted legislator record. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    /// `./` plus the path relative to the data root's parent, `/`-separated,
    /// e.g. `./MLA_DATA/TRIVANDRUM/nemom_projects.json`.
    pub id: String,
    /// First path segment below the data root, e.g. `TRIVANDRUM`.
    pub district_code: String,
    pub legislator_name: String,
    pub constituency_raw: String,
    pub expenditure_total: f64,
    pub sector_breakdown: Vec<SectorEntry>,
    pub projects: Vec<Project>,
    pub image: Option<String>,
}

impl SourceRecord {
    pub fn project_count(&self) -> usize {
        self.projects.len()
    }
}

// ----------------------------- Geography -----------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CanonicalDistrict {
    #[serde(rename = "district")]
    pub name: String,
    pub constituencies: Vec<String>,
}

// ----------------------------- Output documents -----------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorValue {
    pub label: String,
    pub value_crores: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct MlaSummaryRow {
    #[tabled(skip)]
    pub id: String,
    #[tabled(rename = "MLA")]
    pub name: String,
    #[tabled(rename = "Constituency")]
    pub constituency: String,
    #[tabled(rename = "District")]
    pub district: String,
    #[tabled(rename = "Expenditure (Cr)", display_with = "display_crores")]
    pub total_expenditure: f64,
    #[tabled(rename = "Projects")]
    pub project_count: usize,
    #[tabled(skip)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateStats {
    #[serde(rename = "totalMLAs")]
    pub total_mlas: usize,
    #[serde(rename = "totalExpenditure")]
    pub total_expenditure: f64,
    #[serde(rename = "totalProjects")]
    pub total_projects: usize,
    #[serde(rename = "totalDistricts")]
    pub total_districts: usize,
    #[serde(rename = "sectorBreakdown")]
    pub sector_breakdown: Vec<SectorValue>,
}

/// Statewide summary: every legislator plus a roll-up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MlaSummaryDocument {
    pub mlas: Vec<MlaSummaryRow>,
    pub aggregate: AggregateStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstituencySummaryRow {
    pub name: String,
    pub expenditure: f64,
    pub projects: usize,
    pub utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct DistrictSummaryRow {
    #[tabled(rename = "District")]
    pub name: String,
    #[tabled(rename = "Expenditure (Cr)", display_with = "display_crores")]
    pub total_expenditure: f64,
    #[tabled(rename = "Projects")]
    pub project_count: usize,
    #[tabled(rename = "Utilization %")]
    pub utilization: f64,
    #[tabled(skip)]
    pub sectors: Vec<SectorValue>,
    #[tabled(skip)]
    pub constituencies: Vec<ConstituencySummaryRow>,
}

/// Flat per-constituency row for the district CSV export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictCsvRow {
    #[serde(rename = "District")]
    pub district: String,
    #[serde(rename = "Constituency")]
    pub constituency: String,
    #[serde(rename = "Expenditure")]
    pub expenditure: f64,
    #[serde(rename = "Projects")]
    pub projects: usize,
    #[serde(rename = "Utilization")]
    pub utilization: f64,
}
