// Folding parsed records into per-district and per-constituency totals.
//
// Buckets live in insertion-ordered vectors rather than hash maps: the
// number of districts and seats is small, `resolve` is a linear scan by
// contract, and insertion order is what breaks ties when the reports sort.
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Anomaly;
use crate::geography::{district_display_name, GeographyIndex};
use crate::normalize::constituency_key;
use crate::types::{SectorValue, SourceRecord};
use crate::util::cmp_desc;

/// Running per-label sums, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SectorTotals {
    entries: Vec<(String, f64)>,
}

impl SectorTotals {
    pub fn add(&mut self, label: &str, value: f64) {
        match self.entries.iter_mut().find(|(l, _)| l == label) {
            Some((_, total)) => *total += value,
            None => self.entries.push((label.to_string(), value)),
        }
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by value, largest first; ties keep first-seen order.
    pub fn sorted_desc(&self) -> Vec<SectorValue> {
        let mut out: Vec<SectorValue> = self
            .entries
            .iter()
            .map(|(label, value)| SectorValue {
                label: label.clone(),
                value_crores: *value,
            })
            .collect();
        out.sort_by(|a, b| cmp_desc(a.value_crores, b.value_crores));
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstituencyAggregate {
    /// Upper-cased raw name; the value `GeographyIndex::resolve` normalizes.
    pub key: String,
    pub name: String,
    pub expenditure: f64,
    pub projects: usize,
}

impl ConstituencyAggregate {
    pub fn new(key: String, name: String) -> Self {
        Self {
            key,
            name,
            expenditure: 0.0,
            projects: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictAggregate {
    pub name: String,
    pub total_expenditure: f64,
    pub project_count: usize,
    pub sectors: SectorTotals,
    pub constituencies: Vec<ConstituencyAggregate>,
}

impl DistrictAggregate {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            total_expenditure: 0.0,
            project_count: 0,
            sectors: SectorTotals::default(),
            constituencies: Vec::new(),
        }
    }
}

/// The accumulator threaded through one aggregation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistrictAggregates {
    districts: Vec<DistrictAggregate>,
    anomalies: Vec<Anomaly>,
}

impl DistrictAggregates {
    /// Pre-seeded with every canonical district and constituency at zero.
    pub fn seeded(geography: &GeographyIndex) -> Self {
        Self {
            districts: geography.seed(),
            anomalies: Vec::new(),
        }
    }

    pub fn districts(&self) -> &[DistrictAggregate] {
        &self.districts
    }

    pub fn district(&self, name: &str) -> Option<&DistrictAggregate> {
        self.districts.iter().find(|d| d.name == name)
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    pub fn total_expenditure(&self) -> f64 {
        self.districts.iter().map(|d| d.total_expenditure).sum()
    }

    /// Add one record to its district and constituency.
    ///
    /// - The district code goes through `DISTRICT_CODES`; an unknown code
    ///   becomes its own district bucket.
    /// - Expenditure and project count are added to the district and to the
    ///   resolved constituency in the same step, so a district's total
    ///   always equals the sum of its constituencies.
    /// - A constituency that resolves to nothing gets a new bucket named by
    ///   its upper-cased raw name, and a warning.
    pub fn accumulate(&mut self, record: &SourceRecord) {
        let district_name = match district_display_name(&record.district_code) {
            Some(name) => name.to_string(),
            None => {
                debug!(code = %record.district_code, "unmapped district code, using it verbatim");
                let anomaly = Anomaly::UnmappedDistrictCode {
                    code: record.district_code.clone(),
                };
                if !self.anomalies.contains(&anomaly) {
                    self.anomalies.push(anomaly);
                }
                record.district_code.clone()
            }
        };

        let district = district_entry(&mut self.districts, &district_name);
        let expenditure = record.expenditure_total;
        let projects = record.project_count();

        district.total_expenditure += expenditure;
        district.project_count += projects;
        for sector in &record.sector_breakdown {
            district.sectors.add(&sector.label, sector.value());
        }

        let pos = match GeographyIndex::resolve(district, &record.constituency_raw) {
            Some(pos) => pos,
            None => {
                let key = constituency_key(&record.constituency_raw);
                warn!(
                    constituency = %record.constituency_raw,
                    key = %key,
                    district = %district_name,
                    "no mapping found for constituency, creating new entry"
                );
                self.anomalies.push(Anomaly::UnmappedConstituency {
                    raw_name: record.constituency_raw.clone(),
                    key,
                    district: district_name.clone(),
                });
                let bucket = record.constituency_raw.to_uppercase();
                district
                    .constituencies
                    .push(ConstituencyAggregate::new(bucket.clone(), bucket));
                district.constituencies.len() - 1
            }
        };

        let bucket = &mut district.constituencies[pos];
        bucket.expenditure += expenditure;
        bucket.projects += projects;
    }
}

fn district_entry<'a>(districts: &'a mut Vec<DistrictAggregate>, name: &str) -> &'a mut DistrictAggregate {
    let pos = match districts.iter().position(|d| d.name == name) {
        Some(pos) => pos,
        None => {
            districts.push(DistrictAggregate::new(name));
            districts.len() - 1
        }
    };
    &mut districts[pos]
}

/// Fold `records` into accumulators seeded from `geography`.
pub fn aggregate_records<'a, I>(geography: &GeographyIndex, records: I) -> DistrictAggregates
where
    I: IntoIterator<Item = &'a SourceRecord>,
{
    records
        .into_iter()
        .fold(DistrictAggregates::seeded(geography), |mut acc, record| {
            acc.accumulate(record);
            acc
        })
}
