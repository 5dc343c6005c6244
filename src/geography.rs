// Canonical geography: district codes, districts and their constituencies.
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

use crate::aggregate::{ConstituencyAggregate, DistrictAggregate};
use crate::error::{PipelineError, PipelineResult};
use crate::normalize::constituency_key;
use crate::types::CanonicalDistrict;

/// Directory codes used under the data root, mapped to display names.
/// `KOTTYAM` is spelled the way the source directories spell it.
pub const DISTRICT_CODES: &[(&str, &str)] = &[
    ("TRIVANDRUM", "Thiruvananthapuram"),
    ("KOLLAM", "Kollam"),
    ("PATHANAMTHITTA", "Pathanamthitta"),
    ("ALAPPUZHA", "Alappuzha"),
    ("KOTTYAM", "Kottayam"),
    ("IDUKKI", "Idukki"),
    ("ERNAKULAM", "Ernakulam"),
    ("THRISSUR", "Thrissur"),
    ("PALAKKAD", "Palakkad"),
    ("MALAPPURAM", "Malappuram"),
    ("KOZHIKODE", "Kozhikode"),
    ("WAYANAD", "Wayanad"),
    ("KANNUR", "Kannur"),
    ("KASARGOD", "Kasaragod"),
];

pub fn district_display_name(code: &str) -> Option<&'static str> {
    DISTRICT_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Display name for a district code, falling back to the code itself.
pub fn district_name_or_code(code: &str) -> String {
    district_display_name(code)
        .map(str::to_string)
        .unwrap_or_else(|| code.to_string())
}

/// Reverse lookup used by the query layer's district roll-up.
pub fn district_code_for(name: &str) -> Option<&'static str> {
    DISTRICT_CODES
        .iter()
        .find(|(_, n)| *n == name)
        .map(|(code, _)| *code)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeographyIndex {
    districts: Vec<CanonicalDistrict>,
}

impl GeographyIndex {
    pub fn new(districts: Vec<CanonicalDistrict>) -> Self {
        let mut index = Self::default();
        for d in districts {
            index.insert(d);
        }
        index
    }

    /// Parse the reference map: `{ <region>: [ {district, constituencies} ] }`.
    ///
    /// The published file wraps the regions in one more object
    /// (`{"Kerala_Districts_and_Constituencies": { <region>: [..] }}`); an
    /// object where a district list is expected is descended into once.
    /// Region names are dropped; district order follows the document.
    pub fn from_json_str(raw: &str) -> PipelineResult<Self> {
        let top: Map<String, Value> = serde_json::from_str(raw)
            .map_err(|e| PipelineError::Geography(format!("not a JSON object of regions: {e}")))?;
        let mut districts = Vec::new();
        for (key, value) in top {
            match value {
                Value::Object(regions) => {
                    debug!(wrapper = %key, "descending into wrapped region map");
                    for (region, list) in regions {
                        districts.extend(district_list(&region, list)?);
                    }
                }
                list => districts.extend(district_list(&key, list)?),
            }
        }
        Ok(Self::new(districts))
    }

    pub fn load(path: &Path) -> PipelineResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Geography(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    // A district listed under two regions is merged; repeated constituency
    // names (compared upper-cased) are kept once.
    fn insert(&mut self, district: CanonicalDistrict) {
        let pos = match self.districts.iter().position(|d| d.name == district.name) {
            Some(pos) => pos,
            None => {
                self.districts.push(CanonicalDistrict {
                    name: district.name.clone(),
                    constituencies: Vec::new(),
                });
                self.districts.len() - 1
            }
        };
        let target = &mut self.districts[pos];
        for c in district.constituencies {
            if target
                .constituencies
                .iter()
                .any(|existing| existing.to_uppercase() == c.to_uppercase())
            {
                debug!(district = %target.name, constituency = %c, "duplicate constituency in geography map");
                continue;
            }
            target.constituencies.push(c);
        }
    }

    pub fn all_districts(&self) -> &[CanonicalDistrict] {
        &self.districts
    }

    pub fn constituencies_of(&self, district: &str) -> Option<&[String]> {
        self.districts
            .iter()
            .find(|d| d.name == district)
            .map(|d| d.constituencies.as_slice())
    }

    /// Zeroed accumulators for every canonical district and constituency.
    pub fn seed(&self) -> Vec<DistrictAggregate> {
        self.districts
            .iter()
            .map(|d| {
                let mut agg = DistrictAggregate::new(&d.name);
                agg.constituencies = d
                    .constituencies
                    .iter()
                    .map(|c| ConstituencyAggregate::new(c.to_uppercase(), c.clone()))
                    .collect();
                agg
            })
            .collect()
    }

    /// Position of the constituency bucket in `district` that `raw_name`
    /// refers to.
    ///
    /// Bucket keys are upper-cased raw names, not pre-normalized keys, so
    /// each candidate is normalized on the fly and compared for equality
    /// with the normalized `raw_name`. The first match in insertion order
    /// wins; there is no scoring.
    pub fn resolve(district: &DistrictAggregate, raw_name: &str) -> Option<usize> {
        let key = constituency_key(raw_name);
        district
            .constituencies
            .iter()
            .position(|c| constituency_key(&c.key) == key)
    }
}

fn district_list(region: &str, value: Value) -> PipelineResult<Vec<CanonicalDistrict>> {
    serde_json::from_value(value).map_err(|e| {
        PipelineError::Geography(format!("region {region:?} is not a district list: {e}"))
    })
}
