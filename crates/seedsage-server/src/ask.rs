//! One question-answering cycle.
//!
//! Received → Synthesizing → {Validating → {Accepted → Executed, Rejected →
//! Reported}, NoMatch → Reported}. Every path terminates; nothing is retried
//! and no state survives the cycle. A rejected or unmatched question returns
//! a descriptive message to the caller, never a process failure.

use thiserror::Error;
use tracing::{info, warn};

use seedsage_core::{
    validate, AllowList, CandidateOrigin, GateError, GeneratorError, SynthesisError, Synthesizer,
};
use seedsage_store::{SeedStore, StoreError};

use crate::llm::Narrator;

/// Question shapes answered from general gardening knowledge instead of the
/// record store.
const ADVICE_TRIGGERS: [&str; 6] = [
    "companion",
    "grow with",
    "plant with",
    "schedule",
    "when to plant",
    "season",
];

/// True when the question asks for general knowledge rather than data.
pub fn wants_general_advice(question: &str) -> bool {
    let question = question.to_lowercase();
    ADVICE_TRIGGERS.iter().any(|trigger| question.contains(trigger))
}

#[derive(Debug, Error)]
pub enum AskError {
    #[error("record store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("I couldn't understand that question. Please rephrase it.")]
    NoMatch,

    #[error("generated query was rejected: {0}. Please rephrase your question.")]
    Rejected(#[from] GateError),

    #[error("gardening advice requires a configured generative model")]
    AdviceUnavailable,

    #[error("advice generation failed: {0}")]
    Advice(#[from] GeneratorError),
}

/// A completed cycle: the accepted query, its results and an optional
/// narrative.
#[derive(Debug)]
pub struct Answer {
    pub sql: String,
    pub origin: CandidateOrigin,
    pub results: serde_json::Value,
    pub narrative: Option<String>,
}

/// Owns the collaborators of the question-answering cycle: the store, the
/// synthesizer with its optional generative backend, the allow-list and the
/// optional narrator.
pub struct Assistant {
    store: SeedStore,
    synthesizer: Synthesizer,
    allow: AllowList,
    narrator: Option<Narrator>,
}

impl Assistant {
    pub fn new(
        store: SeedStore,
        synthesizer: Synthesizer,
        allow: AllowList,
        narrator: Option<Narrator>,
    ) -> Self {
        Self {
            store,
            synthesizer,
            allow,
            narrator,
        }
    }

    pub fn store(&self) -> &SeedStore {
        &self.store
    }

    pub fn has_narrator(&self) -> bool {
        self.narrator.is_some()
    }

    /// Run one cycle: synthesize, validate, execute, narrate.
    pub async fn answer(&self, question: &str) -> Result<Answer, AskError> {
        // Schema context is an aid to synthesis, not a prerequisite; a store
        // that cannot be described still fails loudly at execution time.
        let context = match self.store.describe() {
            Ok(context) => Some(context),
            Err(err) => {
                warn!(error = %err, "schema description unavailable, synthesizing without context");
                None
            }
        };

        let candidate = self
            .synthesizer
            .synthesize(question, context.as_ref())
            .await
            .map_err(|_: SynthesisError| AskError::NoMatch)?;

        validate(&candidate.sql, &self.allow)?;
        info!(sql = %candidate.sql, origin = ?candidate.origin, "candidate query accepted");

        let results = self.store.execute_readonly(&candidate.sql)?.to_json();

        let narrative = match &self.narrator {
            Some(narrator) => match narrator.narrate(question, &results).await {
                Ok(text) => Some(text),
                Err(err) => {
                    warn!(error = %err, "narration failed, returning results only");
                    None
                }
            },
            None => None,
        };

        Ok(Answer {
            sql: candidate.sql,
            origin: candidate.origin,
            results,
            narrative,
        })
    }

    /// Answer a general-knowledge question with gardening advice, grounded
    /// in the schema context when the store is reachable.
    pub async fn advise(&self, question: &str) -> Result<String, AskError> {
        let narrator = self.narrator.as_ref().ok_or(AskError::AdviceUnavailable)?;
        let data_context = self
            .store
            .describe()
            .map(|context| context.to_prompt_block())
            .unwrap_or_default();
        Ok(narrator.advise(question, &data_context).await?)
    }

    /// Companion-planting guide for one plant from the collection.
    pub async fn companion_guide(&self, plant_name: &str) -> Result<String, AskError> {
        let narrator = self.narrator.as_ref().ok_or(AskError::AdviceUnavailable)?;
        let data_context = self
            .store
            .describe()
            .map(|context| context.to_prompt_block())
            .unwrap_or_default();
        Ok(narrator.companion_guide(plant_name, &data_context).await?)
    }
}
