//! Two-tier query synthesis: generative model first, rule table as the
//! deterministic safety net.
//!
//! The generative backend generalizes to unseen phrasings but is unreliable
//! (availability, hallucinated columns, verbose output); the ordered pattern
//! table covers the anticipated question shapes and is auditable. An absent
//! or failing backend silently falls through to the table; only a question
//! matching no rule with no usable model output is a synthesis failure.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::rules::RuleTable;
use crate::schema::SchemaContext;

/// Verbs a candidate may lexically begin with. Anything else is discarded
/// before validation, the same as a failed call.
pub const READ_ONLY_VERBS: [&str; 4] = ["SELECT", "SHOW", "DESCRIBE", "EXPLAIN"];

/// Failures of the generative backend. All of them are swallowed by the
/// synthesizer's fall-through; none reaches the caller as an error.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("no generative backend configured")]
    Unavailable,

    #[error("generative call failed: {0}")]
    Failed(String),

    #[error("unusable model response: {0}")]
    UnusableResponse(String),
}

/// The optional late-bound generative capability: one prompt, one text
/// response per synthesis attempt. Implementations report their own absence
/// with [`GeneratorError::Unavailable`] rather than panicking.
#[async_trait]
pub trait SqlGenerator: Send + Sync {
    async fn generate(
        &self,
        question: &str,
        context: Option<&SchemaContext>,
    ) -> Result<String, GeneratorError>;
}

/// Synthesis failed: no rule matched and no usable model output.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("could not translate the question into a query")]
    NoMatch,
}

/// Which tier produced the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOrigin {
    Generative,
    Rule,
}

/// A candidate query string awaiting validation.
#[derive(Debug, Clone)]
pub struct QueryCandidate {
    pub sql: String,
    pub origin: CandidateOrigin,
}

/// Translates a question into a candidate query, consulting the generative
/// backend when one is attached and the rule table otherwise.
pub struct Synthesizer {
    rules: RuleTable,
    generator: Option<Box<dyn SqlGenerator>>,
}

impl Synthesizer {
    pub fn new(rules: RuleTable) -> Self {
        Self { rules, generator: None }
    }

    /// Attach a generative backend.
    pub fn with_generator(mut self, generator: Box<dyn SqlGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Produce a candidate query for the question, or `NoMatch`.
    pub async fn synthesize(
        &self,
        question: &str,
        context: Option<&SchemaContext>,
    ) -> Result<QueryCandidate, SynthesisError> {
        if let Some(generator) = &self.generator {
            match generator.generate(question, context).await {
                Ok(raw) => {
                    let sql = sanitize_sql(&raw);
                    if starts_with_read_only_verb(&sql) {
                        debug!(%sql, "generative candidate accepted for validation");
                        return Ok(QueryCandidate {
                            sql,
                            origin: CandidateOrigin::Generative,
                        });
                    }
                    warn!(
                        response = %raw,
                        "model response does not begin with a read-only verb, falling back to rule table"
                    );
                }
                Err(GeneratorError::Unavailable) => {
                    debug!("no generative backend available, using rule table");
                }
                Err(err) => {
                    warn!(error = %err, "generative synthesis failed, falling back to rule table");
                }
            }
        }

        match self.rules.lookup(question) {
            Some(template) => Ok(QueryCandidate {
                sql: template.to_string(),
                origin: CandidateOrigin::Rule,
            }),
            None => Err(SynthesisError::NoMatch),
        }
    }
}

/// Strip markdown code-fence markers and inline `--` comment tails from a
/// raw model response, collapsing it onto one line.
pub fn sanitize_sql(raw: &str) -> String {
    let mut parts = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.starts_with("```") {
            continue;
        }
        let line = match line.find("--") {
            Some(idx) => line[..idx].trim_end(),
            None => line,
        };
        if !line.is_empty() {
            parts.push(line);
        }
    }
    parts.join(" ").trim().to_string()
}

/// True when the first token is an approved read-only verb.
pub fn starts_with_read_only_verb(sql: &str) -> bool {
    sql.split_whitespace()
        .next()
        .map(|token| {
            let token = token.trim_end_matches(';').to_ascii_uppercase();
            READ_ONLY_VERBS.contains(&token.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedGenerator {
        response: Result<&'static str, &'static str>,
    }

    #[async_trait]
    impl SqlGenerator for CannedGenerator {
        async fn generate(
            &self,
            _question: &str,
            _context: Option<&SchemaContext>,
        ) -> Result<String, GeneratorError> {
            match self.response {
                Ok(text) => Ok(text.to_string()),
                Err(msg) => Err(GeneratorError::Failed(msg.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn generative_path_disabled_returns_rule_template() {
        let synth = Synthesizer::new(RuleTable::builtin());
        let candidate = synth.synthesize("how many seeds do I have?", None).await.unwrap();

        assert_eq!(candidate.origin, CandidateOrigin::Rule);
        assert_eq!(candidate.sql, "SELECT COUNT(*) as total_seed_packs FROM seed_packs;");
    }

    #[tokio::test]
    async fn generative_path_disabled_and_no_rule_is_no_match() {
        let synth = Synthesizer::new(RuleTable::builtin());
        let err = synth.synthesize("what is the meaning of life?", None).await.unwrap_err();

        assert_eq!(err, SynthesisError::NoMatch);
    }

    #[tokio::test]
    async fn usable_model_response_wins_over_rules() {
        let synth = Synthesizer::new(RuleTable::builtin()).with_generator(Box::new(
            CannedGenerator {
                response: Ok("SELECT seed_name FROM seed_packs LIMIT 3;"),
            },
        ));
        let candidate = synth.synthesize("show me all herbs", None).await.unwrap();

        assert_eq!(candidate.origin, CandidateOrigin::Generative);
        assert_eq!(candidate.sql, "SELECT seed_name FROM seed_packs LIMIT 3;");
    }

    #[tokio::test]
    async fn destructive_response_is_discarded_at_verb_check() {
        let synth = Synthesizer::new(RuleTable::builtin()).with_generator(Box::new(
            CannedGenerator {
                response: Ok("DROP TABLE seed_packs;"),
            },
        ));
        let candidate = synth.synthesize("show me all herbs", None).await.unwrap();

        // Falls through to the herb rule instead of the destructive statement.
        assert_eq!(candidate.origin, CandidateOrigin::Rule);
        assert_eq!(candidate.sql, "SELECT * FROM seed_packs WHERE plant_type = 'Herb';");
    }

    #[tokio::test]
    async fn failed_call_falls_through_to_rules() {
        let synth = Synthesizer::new(RuleTable::builtin()).with_generator(Box::new(
            CannedGenerator {
                response: Err("connection refused"),
            },
        ));
        let candidate = synth.synthesize("how many seeds do I have?", None).await.unwrap();

        assert_eq!(candidate.origin, CandidateOrigin::Rule);
    }

    #[tokio::test]
    async fn failed_call_with_no_rule_is_no_match() {
        let synth = Synthesizer::new(RuleTable::builtin()).with_generator(Box::new(
            CannedGenerator {
                response: Err("timeout"),
            },
        ));
        let err = synth.synthesize("what is the meaning of life?", None).await.unwrap_err();

        assert_eq!(err, SynthesisError::NoMatch);
    }

    #[test]
    fn sanitize_strips_fences_and_comment_tails() {
        let raw = "```sql\nSELECT * FROM seed_packs; -- every pack\n```";
        assert_eq!(sanitize_sql(raw), "SELECT * FROM seed_packs;");
    }

    #[test]
    fn sanitize_collapses_multiline_queries() {
        let raw = "SELECT seed_name\nFROM seed_packs\nWHERE plant_type = 'Herb';";
        assert_eq!(
            sanitize_sql(raw),
            "SELECT seed_name FROM seed_packs WHERE plant_type = 'Herb';",
        );
    }

    #[test]
    fn verb_check_accepts_each_approved_verb() {
        for verb in ["SELECT 1", "show tables", "DESCRIBE seed_packs", "explain select 1"] {
            assert!(starts_with_read_only_verb(verb), "{verb}");
        }
    }

    #[test]
    fn verb_check_rejects_writes_and_empty_input() {
        assert!(!starts_with_read_only_verb("DROP TABLE seed_packs;"));
        assert!(!starts_with_read_only_verb("INSERT INTO seed_packs VALUES (1)"));
        assert!(!starts_with_read_only_verb(""));
    }
}
