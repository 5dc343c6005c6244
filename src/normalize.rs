// Constituency name normalization.
//
// Source documents spell constituencies however the data entry operator
// typed them ("Kunnamnglam", "KOZHIKODE S.", "Perinthalmna"). The canonical
// map uses a different set of spellings. Both sides are reduced to a key of
// plain A-Z letters and then pushed through a fixed list of rewrites that
// fold the known transliteration and abbreviation variants together. Two
// names refer to the same place iff their keys are equal.

/// One rewrite in the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rewrite {
    /// Replace every occurrence of `from` with `to`.
    Everywhere { from: &'static str, to: &'static str },
    /// Replace `from` only when the key ends with it.
    Suffix { from: &'static str, to: &'static str },
}

/// Ordered rewrite table. Later entries see the output of earlier ones, so
/// new rules go at the end unless a test shows they must run earlier.
pub const REWRITES: &[Rewrite] = &[
    Rewrite::Everywhere { from: "MANN", to: "MN" },
    Rewrite::Everywhere { from: "ERANA", to: "ERNA" },
    Rewrite::Everywhere { from: "KK", to: "K" },
    Rewrite::Everywhere { from: "PP", to: "P" },
    Rewrite::Everywhere { from: "OO", to: "U" },
    Rewrite::Suffix { from: "I", to: "Y" },
    Rewrite::Everywhere { from: "NGLAM", to: "ANGALAM" },
    Rewrite::Everywhere { from: "GLM", to: "ANGALAM" },
    Rewrite::Everywhere { from: "SULBATHERY", to: "SULTHANBATHERY" },
    Rewrite::Everywhere { from: "THIRUVANPURAM", to: "THIRUVANANTHAPURAM" },
    Rewrite::Everywhere { from: "SHORNUR", to: "SHORANUR" },
];

/// Whole-key special cases for truncated directional names that the
/// substring rules cannot tell apart.
pub const SPECIAL_CASES: &[(&[&str], &str)] = &[
    (&["KOZHIKODES", "KOZHIKODESOUTH"], "KOZHIKODESOUTH"),
    (&["KOZHIKODEN", "KOZHIKODENORTH"], "KOZHIKODENORTH"),
];

// The cascade settles in two passes for every name seen so far; the cap only
// guards against a future rule pair that feeds itself.
const MAX_PASSES: usize = 16;

/// Compute the join key for a raw constituency name.
///
/// Uppercases, drops every character outside `A-Z` (periods, spaces,
/// hyphens, digits), then applies `REWRITES` followed by `SPECIAL_CASES`
/// until the key stops changing. Re-running the cascade to a fixed point is
/// what makes the function idempotent: a single pass turns `KKK` into `KK`.
pub fn constituency_key(raw: &str) -> String {
    let mut key: String = raw
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase())
        .collect();

    for _ in 0..MAX_PASSES {
        let next = apply_cascade(&key);
        if next == key {
            break;
        }
        key = next;
    }
    key
}

fn apply_cascade(key: &str) -> String {
    let mut s = key.to_string();
    for rule in REWRITES {
        s = apply_rewrite(&s, *rule);
    }
    for (variants, canonical) in SPECIAL_CASES {
        if variants.contains(&s.as_str()) {
            return (*canonical).to_string();
        }
    }
    s
}

fn apply_rewrite(s: &str, rule: Rewrite) -> String {
    match rule {
        Rewrite::Everywhere { from, to } => s.replace(from, to),
        Rewrite::Suffix { from, to } => match s.strip_suffix(from) {
            Some(stem) => format!("{stem}{to}"),
            None => s.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn same_place(a: &str, b: &str) {
        assert_eq!(
            constituency_key(a),
            constituency_key(b),
            "{a:?} and {b:?} should share a key"
        );
    }

    #[test]
    fn strips_case_periods_and_non_letters() {
        assert_eq!(constituency_key("Nemom"), "NEMOM");
        assert_eq!(constituency_key("Kazhakuttam"), "KAZHAKUTTAM");
        assert_eq!(constituency_key("Vamanapuram-2 (S.C.)"), "VAMANAPURAMSC");
    }

    #[test]
    fn empty_input_gives_empty_key() {
        assert_eq!(constituency_key(""), "");
        assert_eq!(constituency_key(" .-12 "), "");
    }

    // One case per rewrite, in table order.

    #[test]
    fn rule_mann_to_mn() {
        same_place("Mannarkad", "Mnarkad");
        same_place("Perinthalmanna", "Perinthalmna");
    }

    #[test]
    fn rule_erana_to_erna() {
        same_place("Eranakulam", "Ernakulam");
    }

    #[test]
    fn rule_doubled_k_collapses() {
        same_place("Mannarkkad", "Mannarkad");
        same_place("Irinjalakkuda", "Irinjalakuda");
    }

    #[test]
    fn rule_doubled_p_collapses() {
        same_place("Ambalappuzha", "Ambalapuzha");
    }

    #[test]
    fn rule_oo_to_u() {
        same_place("Chathannoor", "Chathannur");
    }

    #[test]
    fn rule_trailing_i_to_y() {
        same_place("Thiruvambadi", "Thiruvambady");
        // Only the final letter is affected.
        assert_eq!(constituency_key("Idukki"), "IDUKY");
        assert!(constituency_key("Irikkur").starts_with('I'));
    }

    #[test]
    fn rule_nglam_expands() {
        same_place("Kunnamnglam", "Kunnamangalam");
    }

    #[test]
    fn rule_glm_expands() {
        same_place("Chadayamglm", "Chadayamangalam");
    }

    #[test]
    fn rule_sulbathery_expands() {
        same_place("Sul Bathery", "Sulthanbathery");
    }

    #[test]
    fn rule_thiruvanpuram_expands() {
        same_place("Thiruvanpuram", "Thiruvananthapuram");
    }

    #[test]
    fn rule_shornur_expands() {
        same_place("Shornur", "Shoranur");
    }

    #[test]
    fn special_cases_resolve_directional_abbreviations() {
        same_place("KOZHIKODE S.", "Kozhikode South");
        same_place("Kozhikode N", "Kozhikode North");
        assert_ne!(
            constituency_key("Kozhikode South"),
            constituency_key("Kozhikode North")
        );
    }

    #[test]
    fn repeated_runs_collapse_fully() {
        assert_eq!(constituency_key("KKK"), "K");
        assert_eq!(constituency_key(&constituency_key("Oooty")), constituency_key("Oooty"));
    }

    #[test]
    fn rule_table_order_is_fixed() {
        assert_eq!(REWRITES.len(), 11);
        assert_eq!(REWRITES[0], Rewrite::Everywhere { from: "MANN", to: "MN" });
        assert_eq!(REWRITES[5], Rewrite::Suffix { from: "I", to: "Y" });
    }
}
