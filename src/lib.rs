//! Aggregation of MLA constituency development fund records.
//!
//! Per-legislator JSON documents are parsed (tolerating `NaN`), their
//! constituency names normalized against a canonical district map, and
//! folded into statewide and per-district summaries. The batch binaries
//! write those summaries to disk; [`query::FundStore`] answers the same
//! questions in memory.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod geography;
pub mod image;
pub mod loader;
pub mod logging;
pub mod normalize;
pub mod output;
pub mod query;
pub mod reports;
pub mod types;
pub mod util;

pub use aggregate::{aggregate_records, DistrictAggregate, DistrictAggregates};
pub use config::{PipelineConfig, UtilizationBaselines};
pub use error::{Anomaly, PipelineError, PipelineResult};
pub use geography::GeographyIndex;
pub use loader::{load_records, LoadReport};
pub use normalize::constituency_key;
pub use query::FundStore;
pub use types::{DistrictSummaryRow, MlaSummaryDocument, SourceRecord};

/// Everything the district command produces, before it is written.
#[derive(Debug, Clone)]
pub struct DistrictRun {
    pub rows: Vec<DistrictSummaryRow>,
    pub load: LoadReport,
    /// Unmapped districts and constituencies found while aggregating.
    pub anomalies: Vec<Anomaly>,
}

/// Everything the statewide command produces, before it is written.
#[derive(Debug, Clone)]
pub struct MlaRun {
    pub document: MlaSummaryDocument,
    pub load: LoadReport,
}

/// Load, aggregate and finalize the district summary.
pub fn run_district_summary(config: &PipelineConfig) -> PipelineResult<DistrictRun> {
    let geography = GeographyIndex::load(&config.geography_file)?;
    let (records, load) = load_records(&config.data_dir, &config.file_suffix);
    let aggregates = aggregate_records(&geography, &records);
    let rows = reports::district_summary(&aggregates, &config.baselines);
    Ok(DistrictRun {
        rows,
        load,
        anomalies: aggregates.anomalies().to_vec(),
    })
}

/// Load every record and build the statewide summary.
pub fn run_mla_summary(config: &PipelineConfig) -> MlaRun {
    let (records, load) = load_records(&config.data_dir, &config.file_suffix);
    MlaRun {
        document: reports::mla_summary(&records),
        load,
    }
}
