// On-demand queries over the loaded records.
//
// `FundStore` is the runtime counterpart of the batch commands: it loads
// the same source tree through `loader`, derives rows through `reports`
// and `aggregate`, and memoizes the derived views. Nothing here mutates
// after construction, so repeated calls return identical results.
use once_cell::unsync::OnceCell;
use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregate::aggregate_records;
use crate::config::{PipelineConfig, UtilizationBaselines};
use crate::error::PipelineResult;
use crate::geography::{district_code_for, GeographyIndex};
use crate::image::ImageIndex;
use crate::loader::{load_records, LoadReport};
use crate::reports::{district_summary, mla_row};
use crate::types::{DistrictSummaryRow, Project, SourceRecord};
use crate::util::{cmp_desc, percentage_string, round1};

const HONORIFICS: &[&str] = &["shri", "smt", "dr.", "dr"];

/// One legislator as the dashboards list them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MlaProfile {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub constituency: String,
    pub district: String,
    pub district_code: String,
    pub total_expenditure: f64,
    pub project_count: usize,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictRollup {
    pub code: String,
    pub name: String,
    pub total_expenditure: f64,
    pub total_projects: usize,
    pub mla_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownItem {
    /// Position of the sector in the source document.
    pub index: usize,
    pub label: String,
    pub short_label: String,
    pub value: f64,
    /// Share of the legislator's total, one decimal.
    pub percentage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingBreakdown {
    pub profile: MlaProfile,
    pub breakdown: Vec<BreakdownItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorComparison {
    pub label: String,
    pub a: f64,
    pub b: f64,
    /// Percentage difference of `a` relative to `b`.
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub a: SpendingBreakdown,
    pub b: SpendingBreakdown,
    pub sectors: Vec<SectorComparison>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Expenditure,
    Name,
    District,
    Projects,
}

pub struct FundStore {
    records: Vec<SourceRecord>,
    report: LoadReport,
    geography: Option<GeographyIndex>,
    images: ImageIndex,
    baselines: UtilizationBaselines,
    mlas: OnceCell<Vec<MlaProfile>>,
    districts: OnceCell<Vec<DistrictSummaryRow>>,
}

impl FundStore {
    /// Load records, geography and image identifiers as configured.
    ///
    /// A missing geography map or image list only disables the views that
    /// need them; a map that exists but cannot be parsed is an error.
    pub fn open(config: &PipelineConfig) -> PipelineResult<Self> {
        let (records, report) = load_records(&config.data_dir, &config.file_suffix);
        let geography = if config.geography_file.exists() {
            Some(GeographyIndex::load(&config.geography_file)?)
        } else {
            debug!(path = %config.geography_file.display(), "no geography map, district summary disabled");
            None
        };
        let images = if config.image_ids_file.exists() {
            ImageIndex::load(&config.image_ids_file).unwrap_or_else(|e| {
                warn!(error = %e, "ignoring unreadable image identifier list");
                ImageIndex::default()
            })
        } else {
            ImageIndex::default()
        };
        let mut store = Self::from_records(records)
            .with_images(images)
            .with_baselines(config.baselines);
        store.report = report;
        store.geography = geography;
        Ok(store)
    }

    pub fn from_records(records: Vec<SourceRecord>) -> Self {
        Self {
            records,
            report: LoadReport::default(),
            geography: None,
            images: ImageIndex::default(),
            baselines: UtilizationBaselines::default(),
            mlas: OnceCell::new(),
            districts: OnceCell::new(),
        }
    }

    pub fn with_geography(mut self, geography: GeographyIndex) -> Self {
        self.geography = Some(geography);
        self.districts = OnceCell::new();
        self
    }

    pub fn with_images(mut self, images: ImageIndex) -> Self {
        self.images = images;
        self.mlas = OnceCell::new();
        self
    }

    pub fn with_baselines(mut self, baselines: UtilizationBaselines) -> Self {
        self.baselines = baselines;
        self.districts = OnceCell::new();
        self
    }

    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }

    fn profile(&self, record: &SourceRecord) -> MlaProfile {
        let row = mla_row(record);
        MlaProfile {
            display_name: display_name(&row.name),
            image: self.images.resolve(
                Some(&row.constituency),
                Some(&row.name),
                row.image.as_deref(),
            ),
            id: row.id,
            name: row.name,
            constituency: row.constituency,
            district: row.district,
            district_code: record.district_code.clone(),
            total_expenditure: row.total_expenditure,
            project_count: row.project_count,
        }
    }

    /// Every legislator, largest expenditure first.
    pub fn all_mlas(&self) -> &[MlaProfile] {
        self.mlas.get_or_init(|| {
            let mut rows: Vec<MlaProfile> = self.records.iter().map(|r| self.profile(r)).collect();
            rows.sort_by(|a, b| cmp_desc(a.total_expenditure, b.total_expenditure));
            rows
        })
    }

    /// Legislators of one district (case-insensitive); `""` or `"all"`
    /// returns everyone.
    pub fn mlas_by_district(&self, district: &str) -> Vec<&MlaProfile> {
        let wanted = district.trim().to_lowercase();
        self.all_mlas()
            .iter()
            .filter(|m| wanted.is_empty() || wanted == "all" || m.district.to_lowercase() == wanted)
            .collect()
    }

    pub fn top_mlas(&self, count: usize) -> &[MlaProfile] {
        let all = self.all_mlas();
        &all[..count.min(all.len())]
    }

    /// Per-district totals over the legislators present in the data,
    /// largest expenditure first.
    pub fn districts(&self) -> Vec<DistrictRollup> {
        let mut out: Vec<DistrictRollup> = Vec::new();
        for m in self.all_mlas() {
            let pos = match out.iter().position(|d| d.name == m.district) {
                Some(pos) => pos,
                None => {
                    out.push(DistrictRollup {
                        code: district_code_for(&m.district)
                            .map(str::to_string)
                            .unwrap_or_else(|| m.district_code.clone()),
                        name: m.district.clone(),
                        total_expenditure: 0.0,
                        total_projects: 0,
                        mla_count: 0,
                    });
                    out.len() - 1
                }
            };
            let d = &mut out[pos];
            d.total_expenditure += m.total_expenditure;
            d.total_projects += m.project_count;
            d.mla_count += 1;
        }
        out.sort_by(|a, b| cmp_desc(a.total_expenditure, b.total_expenditure));
        out
    }

    pub fn top_districts(&self, count: usize) -> Vec<DistrictRollup> {
        let mut all = self.districts();
        all.truncate(count);
        all
    }

    /// The district document, computed through the batch aggregator.
    /// `None` without a geography map.
    pub fn district_summary(&self) -> Option<&[DistrictSummaryRow]> {
        let geography = self.geography.as_ref()?;
        let rows = self.districts.get_or_init(|| {
            let aggregates = aggregate_records(geography, &self.records);
            district_summary(&aggregates, &self.baselines)
        });
        Some(rows.as_slice())
    }

    pub fn mla(&self, id: &str) -> Option<&SourceRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn mla_projects(&self, id: &str) -> Option<&[Project]> {
        self.mla(id).map(|r| r.projects.as_slice())
    }

    /// Sector breakdown of one legislator with each sector's share of
    /// their total, largest first.
    pub fn spending_breakdown(&self, id: &str) -> Option<SpendingBreakdown> {
        let record = self.mla(id)?;
        let total = record.expenditure_total;
        let mut breakdown: Vec<BreakdownItem> = record
            .sector_breakdown
            .iter()
            .enumerate()
            .map(|(index, s)| BreakdownItem {
                index,
                label: s.label.clone(),
                short_label: shorten_label(&s.label),
                value: s.value(),
                percentage: percentage_string(s.value(), total),
            })
            .collect();
        breakdown.sort_by(|a, b| cmp_desc(a.value, b.value));
        Some(SpendingBreakdown {
            profile: self.profile(record),
            breakdown,
        })
    }

    /// Side-by-side sector comparison of two legislators. Sectors are the
    /// union of both breakdowns, ordered by combined value.
    pub fn compare(&self, id_a: &str, id_b: &str) -> Option<Comparison> {
        let a = self.spending_breakdown(id_a)?;
        let b = self.spending_breakdown(id_b)?;

        let mut sectors: Vec<SectorComparison> = Vec::new();
        for item in &a.breakdown {
            sectors.push(SectorComparison {
                label: item.label.clone(),
                a: item.value,
                b: 0.0,
                delta: 0.0,
            });
        }
        for item in &b.breakdown {
            match sectors.iter_mut().find(|s| s.label == item.label) {
                Some(s) => s.b = item.value,
                None => sectors.push(SectorComparison {
                    label: item.label.clone(),
                    a: 0.0,
                    b: item.value,
                    delta: 0.0,
                }),
            }
        }
        for s in &mut sectors {
            s.delta = percent_delta(s.a, s.b);
        }
        sectors.sort_by(|x, y| cmp_desc(x.a + x.b, y.a + y.b));
        Some(Comparison { a, b, sectors })
    }
}

/// Case-insensitive substring search over name, constituency and district.
/// A blank query matches everything.
pub fn search_mlas<'a, I>(mlas: I, query: &str) -> Vec<&'a MlaProfile>
where
    I: IntoIterator<Item = &'a MlaProfile>,
{
    let q = query.trim().to_lowercase();
    mlas.into_iter()
        .filter(|m| {
            q.is_empty()
                || m.name.to_lowercase().contains(&q)
                || m.constituency.to_lowercase().contains(&q)
                || m.district.to_lowercase().contains(&q)
        })
        .collect()
}

/// Stable sort: expenditure and projects descending, names ascending.
pub fn sort_mlas(mlas: &mut [&MlaProfile], key: SortKey) {
    match key {
        SortKey::Expenditure => mlas.sort_by(|a, b| cmp_desc(a.total_expenditure, b.total_expenditure)),
        SortKey::Name => mlas.sort_by_key(|m| m.name.to_lowercase()),
        SortKey::District => mlas.sort_by_key(|m| m.district.to_lowercase()),
        SortKey::Projects => mlas.sort_by(|a, b| b.project_count.cmp(&a.project_count)),
    }
}

/// Case-insensitive search over project name and implementing agency,
/// optionally restricted to one category.
pub fn search_projects<'a>(projects: &'a [Project], query: &str, category: Option<&str>) -> Vec<&'a Project> {
    let q = query.trim().to_lowercase();
    let contains = |field: &Option<String>| {
        field
            .as_deref()
            .is_some_and(|v| v.to_lowercase().contains(&q))
    };
    projects
        .iter()
        .filter(|p| q.is_empty() || contains(&p.project_name) || contains(&p.implementing_agency))
        .filter(|p| match category {
            None | Some("all") => true,
            Some(c) => p.category.as_deref() == Some(c),
        })
        .collect()
}

/// Distinct project categories in first-seen order.
pub fn project_categories(projects: &[Project]) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for c in projects.iter().filter_map(|p| p.category.as_deref()) {
        if !out.contains(&c) {
            out.push(c);
        }
    }
    out
}

/// `(a - b) / b * 100` to one decimal; 100 when only `a` spent anything.
pub fn percent_delta(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        return if a > 0.0 { 100.0 } else { 0.0 };
    }
    round1((a - b) / b * 100.0)
}

/// Name without a leading `Shri`, `Smt` or `Dr.` honorific.
pub fn display_name(name: &str) -> String {
    let trimmed = name.trim();
    if let Some((first, rest)) = trimmed.split_once(char::is_whitespace) {
        if HONORIFICS.contains(&first.to_lowercase().as_str()) && !rest.trim().is_empty() {
            return rest.trim_start().to_string();
        }
    }
    trimmed.to_string()
}

/// Two-letter initials for avatar fallbacks.
pub fn initials(name: &str) -> String {
    let shown = display_name(name);
    let parts: Vec<&str> = shown.split_whitespace().collect();
    match parts.as_slice() {
        [] => "ML".to_string(),
        [only] => only.chars().take(2).collect::<String>().to_uppercase(),
        [first, second, ..] => first
            .chars()
            .take(1)
            .chain(second.chars().take(1))
            .collect::<String>()
            .to_uppercase(),
    }
}

const CATEGORY_COLORS: &[&str] = &[
    "#3B82F6", "#13ECB2", "#8B5CF6", "#F59E0B", "#EF4444", "#14B8A6", "#EC4899", "#10B981",
    "#6B7280",
];

pub fn category_color(index: usize) -> &'static str {
    CATEGORY_COLORS[index % CATEGORY_COLORS.len()]
}

/// Material icon name for a sector label; unknown labels get `category`.
pub fn category_icon(label: &str) -> &'static str {
    match label {
        "Road" | "Roads" => "directions_car",
        "Infrastructure" => "apartment",
        "Healthcare" => "medical_services",
        "Education" => "school",
        "Electricity" => "bolt",
        "Irrigation" => "water_drop",
        "Sports" => "sports_soccer",
        _ => "category",
    }
}

const MAX_SHORT_LABEL: usize = 20;

pub fn shorten_label(label: &str) -> String {
    if label == "Road" {
        return "Roads".to_string();
    }
    if label.chars().count() > MAX_SHORT_LABEL {
        let head: String = label.chars().take(MAX_SHORT_LABEL).collect();
        return format!("{head}...");
    }
    label.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SectorEntry;

    fn record(id: &str, code: &str, name: &str, constituency: &str, total: f64, sectors: &[(&str, f64)]) -> SourceRecord {
        SourceRecord {
            id: id.to_string(),
            district_code: code.to_string(),
            legislator_name: name.to_string(),
            constituency_raw: constituency.to_string(),
            expenditure_total: total,
            sector_breakdown: sectors
                .iter()
                .map(|(l, v)| SectorEntry { label: l.to_string(), value_crores: Some(*v) })
                .collect(),
            projects: vec![
                Project {
                    project_name: Some("Ring Road".into()),
                    category: Some("Road".into()),
                    implementing_agency: Some("PWD".into()),
                    ..Project::default()
                },
                Project {
                    project_name: Some("School Lab".into()),
                    category: Some("Education".into()),
                    implementing_agency: Some("LSGD".into()),
                    ..Project::default()
                },
            ],
            image: None,
        }
    }

    fn store() -> FundStore {
        FundStore::from_records(vec![
            record("KOLLAM/a_projects.json", "KOLLAM", "Shri A Kumar", "Kundara", 4.0, &[("Road", 3.0), ("Sports", 1.0)]),
            record("TRIVANDRUM/b_projects.json", "TRIVANDRUM", "Smt B Devi", "Nemom", 9.0, &[("Education", 6.0), ("Road", 3.0)]),
            record("KOLLAM/c_projects.json", "KOLLAM", "Dr. C Nair", "Chavara", 2.0, &[]),
        ])
    }

    #[test]
    fn all_mlas_are_sorted_and_stripped_of_honorifics() {
        let s = store();
        let names: Vec<&str> = s.all_mlas().iter().map(|m| m.display_name.as_str()).collect();
        assert_eq!(names, ["B Devi", "A Kumar", "C Nair"]);
        assert_eq!(s.all_mlas()[0].district, "Thiruvananthapuram");
        assert_eq!(s.top_mlas(10).len(), 3);
    }

    #[test]
    fn district_filter_is_case_insensitive() {
        let s = store();
        assert_eq!(s.mlas_by_district("kollam").len(), 2);
        assert_eq!(s.mlas_by_district("all").len(), 3);
        assert!(s.mlas_by_district("Wayanad").is_empty());
    }

    #[test]
    fn district_rollup_sums_members() {
        let s = store();
        let d = s.districts();
        assert_eq!(d[0].name, "Thiruvananthapuram");
        assert_eq!(d[0].code, "TRIVANDRUM");
        assert_eq!(d[1].name, "Kollam");
        assert_eq!(d[1].total_expenditure, 6.0);
        assert_eq!(d[1].mla_count, 2);
        assert_eq!(d[1].total_projects, 4);
        assert_eq!(s.top_districts(1).len(), 1);
    }

    #[test]
    fn search_and_sort() {
        let s = store();
        let hits = search_mlas(s.all_mlas(), "  NEMOM ");
        assert_eq!(hits.len(), 1);
        assert_eq!(search_mlas(s.all_mlas(), "").len(), 3);

        let mut rows: Vec<&MlaProfile> = s.all_mlas().iter().collect();
        sort_mlas(&mut rows, SortKey::Name);
        assert_eq!(rows[0].name, "Dr. C Nair");
        sort_mlas(&mut rows, SortKey::District);
        assert_eq!(rows[0].district, "Kollam");
        sort_mlas(&mut rows, SortKey::Expenditure);
        assert_eq!(rows[0].total_expenditure, 9.0);
    }

    #[test]
    fn breakdown_percentages_and_order() {
        let s = store();
        let b = s.spending_breakdown("KOLLAM/a_projects.json").expect("known id");
        assert_eq!(b.breakdown[0].label, "Road");
        assert_eq!(b.breakdown[0].short_label, "Roads");
        assert_eq!(b.breakdown[0].percentage, "75.0");
        assert_eq!(b.breakdown[1].percentage, "25.0");
        assert!(s.spending_breakdown("missing").is_none());
    }

    #[test]
    fn breakdown_of_zero_total_reports_zero_percent() {
        let s = FundStore::from_records(vec![record("K/z_projects.json", "K", "Z", "Z", 0.0, &[("Road", 0.0)])]);
        let b = s.spending_breakdown("K/z_projects.json").expect("known id");
        assert_eq!(b.breakdown[0].percentage, "0.0");
    }

    #[test]
    fn comparison_unions_sectors() {
        let s = store();
        let c = s.compare("KOLLAM/a_projects.json", "TRIVANDRUM/b_projects.json").expect("both ids");
        let labels: Vec<&str> = c.sectors.iter().map(|x| x.label.as_str()).collect();
        assert_eq!(labels, ["Road", "Education", "Sports"]);
        assert_eq!(c.sectors[0].delta, 0.0);
        assert_eq!(c.sectors[1].delta, -100.0);
        assert_eq!(c.sectors[2].delta, 100.0);
    }

    #[test]
    fn district_summary_needs_geography_and_honours_baselines() {
        assert!(store().district_summary().is_none());

        let geo = GeographyIndex::from_json_str(
            r#"{"South": [{"district": "Kollam", "constituencies": ["Kundara", "Chavara"]}]}"#,
        )
        .expect("map");
        let s = store()
            .with_geography(geo)
            .with_baselines(UtilizationBaselines { per_district_seat: 10.0, per_constituency: 10.0 });
        let rows = s.district_summary().expect("geography attached");
        let kollam = rows.iter().find(|d| d.name == "Kollam").expect("district");
        assert_eq!(kollam.total_expenditure, 6.0);
        assert_eq!(kollam.utilization, 30.0);
        assert_eq!(kollam.constituencies[0].utilization, 40.0);
        assert_eq!(s.top_mlas(1)[0].name, "Smt B Devi");
        assert_eq!(s.top_mlas(10).len(), 3);
    }

    #[test]
    fn project_listing_helpers() {
        let s = store();
        let projects = s.mla_projects("KOLLAM/a_projects.json").expect("known id");
        assert_eq!(project_categories(projects), ["Road", "Education"]);
        assert_eq!(search_projects(projects, "pwd", None).len(), 1);
        assert_eq!(search_projects(projects, "", Some("Education")).len(), 1);
        assert_eq!(search_projects(projects, "", Some("all")).len(), 2);
    }

    #[test]
    fn pure_display_helpers() {
        assert_eq!(display_name("Shri  K Babu"), "K Babu");
        assert_eq!(display_name("Dr. M K Muneer"), "M K Muneer");
        assert_eq!(display_name("Shrinivasan"), "Shrinivasan");
        assert_eq!(initials("Smt Veena George"), "VG");
        assert_eq!(initials("Mani"), "MA");
        assert_eq!(initials(""), "ML");
        assert_eq!(category_color(9), category_color(0));
        assert_eq!(category_icon("Roads"), "directions_car");
        assert_eq!(category_icon("Tourism"), "category");
        assert_eq!(shorten_label("Drinking Water Supply Schemes"), "Drinking Water Suppl...");
    }
}
