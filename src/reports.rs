use crate::aggregate::{DistrictAggregate, DistrictAggregates, SectorTotals};
use crate::config::UtilizationBaselines;
use crate::geography::{district_name_or_code, DISTRICT_CODES};
use crate::types::{
    AggregateStats, ConstituencySummaryRow, DistrictCsvRow, DistrictSummaryRow,
    MlaSummaryDocument, MlaSummaryRow, SourceRecord,
};
use crate::util::{cmp_desc, round1};

/// Share of an expected allocation that has been spent, as a percentage
/// clamped to `[0, 100]` and rounded to one decimal.
///
/// A non-positive allocation (e.g. a district with no seats) yields 0.
pub fn utilization(expenditure: f64, allocation: f64) -> f64 {
    if allocation <= 0.0 || !expenditure.is_finite() {
        return 0.0;
    }
    round1((expenditure / allocation * 100.0).clamp(0.0, 100.0))
}

/// Summary row for one legislator. Shared by the batch document and the
/// query layer so both report the same figures.
pub fn mla_row(record: &SourceRecord) -> MlaSummaryRow {
    MlaSummaryRow {
        id: record.id.clone(),
        name: record.legislator_name.clone(),
        constituency: record.constituency_raw.clone(),
        district: district_name_or_code(&record.district_code),
        total_expenditure: record.expenditure_total,
        project_count: record.project_count(),
        image: record.image.clone(),
    }
}

/// Statewide document: every legislator sorted by expenditure, plus totals
/// computed straight from the records (independent of district bucketing).
pub fn mla_summary(records: &[SourceRecord]) -> MlaSummaryDocument {
    let mut mlas: Vec<MlaSummaryRow> = records.iter().map(mla_row).collect();
    mlas.sort_by(|a, b| cmp_desc(a.total_expenditure, b.total_expenditure));

    let mut sectors = SectorTotals::default();
    for record in records {
        for sector in &record.sector_breakdown {
            sectors.add(&sector.label, sector.value());
        }
    }

    let aggregate = AggregateStats {
        total_mlas: records.len(),
        total_expenditure: records.iter().map(|r| r.expenditure_total).sum(),
        total_projects: records.iter().map(SourceRecord::project_count).sum(),
        total_districts: DISTRICT_CODES.len(),
        sector_breakdown: sectors.sorted_desc(),
    };
    MlaSummaryDocument { mlas, aggregate }
}

fn district_row(d: &DistrictAggregate, baselines: &UtilizationBaselines) -> DistrictSummaryRow {
    let mut constituencies: Vec<ConstituencySummaryRow> = d
        .constituencies
        .iter()
        .map(|c| ConstituencySummaryRow {
            name: c.name.clone(),
            expenditure: c.expenditure,
            projects: c.projects,
            utilization: utilization(c.expenditure, baselines.per_constituency),
        })
        .collect();
    constituencies.sort_by(|a, b| cmp_desc(a.expenditure, b.expenditure));

    let allocation = constituencies.len() as f64 * baselines.per_district_seat;
    DistrictSummaryRow {
        name: d.name.clone(),
        total_expenditure: d.total_expenditure,
        project_count: d.project_count,
        utilization: utilization(d.total_expenditure, allocation),
        sectors: d.sectors.sorted_desc(),
        constituencies,
    }
}

/// Finalize accumulated district totals into the district document,
/// sorted by total expenditure (largest first, ties in seed order).
pub fn district_summary(
    aggregates: &DistrictAggregates,
    baselines: &UtilizationBaselines,
) -> Vec<DistrictSummaryRow> {
    let mut rows: Vec<DistrictSummaryRow> = aggregates
        .districts()
        .iter()
        .map(|d| district_row(d, baselines))
        .collect();
    rows.sort_by(|a, b| cmp_desc(a.total_expenditure, b.total_expenditure));
    rows
}

/// One row per constituency, districts in document order.
pub fn district_csv_rows(rows: &[DistrictSummaryRow]) -> Vec<DistrictCsvRow> {
    rows.iter()
        .flat_map(|d| {
            d.constituencies.iter().map(move |c| DistrictCsvRow {
                district: d.name.clone(),
                constituency: c.name.clone(),
                expenditure: c.expenditure,
                projects: c.projects,
                utilization: c.utilization,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_records;
    use crate::geography::GeographyIndex;
    use crate::types::{Project, SectorEntry};

    fn record(code: &str, constituency: &str, expenditure: f64, projects: usize, sectors: &[(&str, f64)]) -> SourceRecord {
        SourceRecord {
            id: format!("{code}/{}_projects.json", constituency.to_lowercase()),
            district_code: code.to_string(),
            legislator_name: format!("MLA of {constituency}"),
            constituency_raw: constituency.to_string(),
            expenditure_total: expenditure,
            sector_breakdown: sectors
                .iter()
                .map(|(l, v)| SectorEntry { label: l.to_string(), value_crores: Some(*v) })
                .collect(),
            projects: vec![Project::default(); projects],
            image: None,
        }
    }

    #[test]
    fn utilization_is_clamped_and_rounded() {
        assert_eq!(utilization(10.5, 25.0), 42.0);
        assert_eq!(utilization(1.0, 3.0), 33.3);
        assert_eq!(utilization(500.0, 25.0), 100.0);
        assert_eq!(utilization(-4.0, 25.0), 0.0);
        assert_eq!(utilization(3.0, 0.0), 0.0);
        assert_eq!(utilization(10.5125, 25.0), 42.0);
    }

    #[test]
    fn mla_summary_sorts_and_totals() {
        let recs = vec![
            record("KOLLAM", "Kundara", 2.0, 1, &[("Road", 1.5), ("Sports", 0.5)]),
            record("ATLANTIS", "Somewhere", 7.0, 4, &[("Road", 3.0), ("Education", 4.0)]),
        ];
        let doc = mla_summary(&recs);
        assert_eq!(doc.mlas[0].district, "ATLANTIS");
        assert_eq!(doc.mlas[1].district, "Kollam");
        assert_eq!(doc.aggregate.total_mlas, 2);
        assert_eq!(doc.aggregate.total_expenditure, 9.0);
        assert_eq!(doc.aggregate.total_projects, 5);
        assert_eq!(doc.aggregate.total_districts, 14);
        let labels: Vec<&str> = doc.aggregate.sector_breakdown.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["Road", "Education", "Sports"]);
    }

    #[test]
    fn district_summary_sorts_every_level() {
        let geo = GeographyIndex::from_json_str(
            r#"{"All": [
                {"district": "Kollam", "constituencies": ["Kundara", "Chavara"]},
                {"district": "Thiruvananthapuram", "constituencies": ["Nemom", "Kovalam"]}
            ]}"#,
        )
        .expect("map");
        let recs = vec![
            record("KOLLAM", "Chavara", 1.0, 1, &[("Road", 1.0)]),
            record("TRIVANDRUM", "Kovalam", 30.0, 2, &[("Road", 10.0), ("Education", 20.0)]),
        ];
        let agg = aggregate_records(&geo, &recs);
        let rows = district_summary(&agg, &UtilizationBaselines::default());

        assert_eq!(rows[0].name, "Thiruvananthapuram");
        assert_eq!(rows[0].utilization, 60.0);
        assert_eq!(rows[0].sectors[0].label, "Education");
        assert_eq!(rows[0].constituencies[0].name, "Kovalam");
        assert_eq!(rows[0].constituencies[0].utilization, 100.0);
        assert_eq!(rows[1].constituencies[0].name, "Chavara");
        // Zero-expenditure seats keep seed order.
        assert_eq!(rows[1].constituencies[1].name, "Kundara");

        let csv_rows = district_csv_rows(&rows);
        assert_eq!(csv_rows.len(), 4);
        assert_eq!(csv_rows[0].district, "Thiruvananthapuram");
    }

    #[test]
    fn district_summary_serializes_with_camel_case_keys() {
        let geo = GeographyIndex::from_json_str(r#"{"All": [{"district": "Kollam", "constituencies": ["Kundara"]}]}"#)
            .expect("map");
        let rows = district_summary(
            &aggregate_records(&geo, std::iter::empty()),
            &UtilizationBaselines::default(),
        );
        let json = serde_json::to_value(&rows).expect("json");
        let first = &json[0];
        assert!(first.get("totalExpenditure").is_some());
        assert!(first.get("projectCount").is_some());
        assert_eq!(first["constituencies"][0]["projects"], 0);
    }
}
