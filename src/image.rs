// Matching legislators to known portrait identifiers.
//
// This is deliberately a separate, looser normalizer than
// `normalize::constituency_key`: identifiers are free-form upload names such
// as `mla_photos/nemom_v_sivankutty`, so the best we can do is lowercase
// containment with a small table of spelling fixes.
use std::path::Path;
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

/// Source spelling → spelling used in the identifier list.
const CONSTITUENCY_VARIANTS: &[(&str, &str)] = &[
    ("ambalapuzha", "ambalappuzha"),
    ("tirurangadi", "thirurangadi"),
    ("thiruvanpuram", "thiruvananthapuram"),
    ("perinthalmna", "perinthalmanna"),
    ("irinjalakkuda", "irijalakuda"),
    ("puthukkad", "pudukkad"),
    ("sulbathery", "sulthanbathery"),
    ("mannarkad", "mannarkkad"),
    ("shornur", "shoranur"),
    ("kunnamnglam", "kunnamangalam"),
    ("kozhis", "kozhikodesouth"),
    ("kozhin", "kozhikodenorth"),
    ("chadayamglm", "chadayamangalam"),
    ("chathannoor", "chathanoor"),
    ("thiruvambady", "thiruvambadi"),
];

const NAME_VARIANTS: &[(&str, &str)] = &[("kunhambu", "kunjambu")];

/// Names shorter than this are too ambiguous to search for on their own.
const MIN_NAME_MATCH_LEN: usize = 6;

/// Lowercase and keep only `a-z`.
pub fn image_key(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect()
}

fn variant<'a>(table: &[(&str, &'a str)], key: &str) -> Option<&'a str> {
    table.iter().find(|(from, _)| *from == key).map(|(_, to)| *to)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageIndex {
    ids: Vec<String>,
}

impl ImageIndex {
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids }
    }

    /// Load a JSON array of identifier strings.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let ids: Vec<String> = serde_json::from_str(&raw).map_err(|e| PipelineError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        debug!(count = ids.len(), "loaded image identifiers");
        Ok(Self::new(ids))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Best-effort identifier for a legislator.
    ///
    /// Priority:
    /// 1. `existing`, unless it is empty or a placeholder;
    /// 2. the first identifier containing the (variant-corrected)
    ///    constituency key;
    /// 3. the first identifier containing the (variant-corrected) name, when
    ///    the name key is long enough to be distinctive.
    ///
    /// Without a constituency nothing is searched.
    pub fn resolve(
        &self,
        constituency: Option<&str>,
        name: Option<&str>,
        existing: Option<&str>,
    ) -> Option<String> {
        if let Some(img) = existing.filter(|s| !s.is_empty() && !s.contains("placeholder")) {
            return Some(img.to_string());
        }
        let constituency = constituency?;

        let const_key = image_key(constituency);
        let name_key = image_key(name.unwrap_or_default());
        let search_term = variant(CONSTITUENCY_VARIANTS, &const_key)
            .map(str::to_string)
            .unwrap_or(const_key);
        let search_name = variant(NAME_VARIANTS, &name_key)
            .map(str::to_string)
            .unwrap_or(name_key);

        self.ids
            .iter()
            .find(|id| {
                let id_key = image_key(id);
                (!search_term.is_empty() && id_key.contains(&search_term))
                    || (search_name.len() >= MIN_NAME_MATCH_LEN && id_key.contains(&search_name))
            })
            .cloned()
    }
}
