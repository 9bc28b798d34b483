//! Ordered pattern → query-template fallback table.
//!
//! The deterministic safety net behind the generative path: the lower-cased
//! question is tested against each rule's regex in declaration order and the
//! first match wins. The table is static configuration compiled once at
//! construction; it is never mutated at runtime.
//!
//! Order matters: specific patterns (crop names, herb listing, counting)
//! must precede the general show-all pattern that would otherwise shadow
//! them.

use regex::Regex;

/// A single pattern → fixed SQL template pairing.
#[derive(Debug, Clone)]
struct TranslationRule {
    pattern: Regex,
    template: &'static str,
}

/// Totally ordered list of translation rules; evaluation stops at the first
/// match.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<TranslationRule>,
}

/// The built-in rule table, ordered from specific to general.
const BUILTIN_RULES: &[(&str, &str)] = &[
    (
        r"how many|total number|count of",
        "SELECT COUNT(*) as total_seed_packs FROM seed_packs;",
    ),
    (
        r"\bherbs?\b",
        "SELECT * FROM seed_packs WHERE plant_type = 'Herb';",
    ),
    (
        r"\bvegetables?\b|\bveggies\b",
        "SELECT * FROM seed_packs WHERE plant_type = 'Vegetable';",
    ),
    (
        r"\bflowers?\b",
        "SELECT * FROM seed_packs WHERE plant_type = 'Flower';",
    ),
    (
        r"\bfruits?\b",
        "SELECT * FROM seed_packs WHERE plant_type = 'Fruit';",
    ),
    (
        r"\btrees?\b|\bshrubs?\b",
        "SELECT * FROM seed_packs WHERE plant_type = 'Trees & Shrubs';",
    ),
    (
        r"\btomato(es)?\b",
        "SELECT * FROM seed_packs WHERE seed_name LIKE '%tomato%';",
    ),
    (
        r"\bbasil\b",
        "SELECT * FROM seed_packs WHERE seed_name LIKE '%basil%';",
    ),
    (
        r"\bpeppers?\b",
        "SELECT * FROM seed_packs WHERE seed_name LIKE '%pepper%';",
    ),
    (
        r"running low|low stock|almost out|need more",
        "SELECT * FROM seed_packs WHERE quantity IN ('Very Few', 'Few');",
    ),
    (
        r"\bnewest\b|\blatest\b|\brecent",
        "SELECT * FROM seed_packs ORDER BY date_acquired DESC LIMIT 10;",
    ),
    (
        r"\boldest\b",
        "SELECT * FROM seed_packs ORDER BY date_acquired ASC LIMIT 10;",
    ),
    (
        r"\bsources?\b|where .* from|came from",
        "SELECT seed_source, COUNT(*) as packs FROM seed_packs GROUP BY seed_source;",
    ),
    (
        r"\bstats\b|statistics|summary|overview|breakdown|by type",
        "SELECT plant_type, COUNT(*) as packs FROM seed_packs GROUP BY plant_type;",
    ),
    (
        r"\bshow\b|\blist\b|\beverything\b|\ball\b|what .* have",
        "SELECT * FROM seed_packs ORDER BY date_acquired DESC;",
    ),
];

impl RuleTable {
    /// The built-in table covering the anticipated question shapes.
    pub fn builtin() -> Self {
        Self::from_pairs(BUILTIN_RULES)
    }

    /// Build a table from ordered (pattern, template) pairs.
    ///
    /// Panics on an invalid pattern; rule patterns are compile-time
    /// constants, so a bad one is a programming error.
    pub fn from_pairs(pairs: &[(&str, &'static str)]) -> Self {
        let rules = pairs
            .iter()
            .map(|(pattern, template)| TranslationRule {
                pattern: Regex::new(pattern).expect("rule pattern must be a valid regex"),
                template,
            })
            .collect();
        Self { rules }
    }

    /// Return the template of the first rule matching the lower-cased
    /// question, if any.
    pub fn lookup(&self, question: &str) -> Option<&'static str> {
        let question = question.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(&question))
            .map(|rule| rule.template)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
