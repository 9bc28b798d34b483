//! Bounded natural-language-to-SQL translation for the seed library.
//!
//! The translation layer is a pure function of (question, schema context,
//! rule table): it produces a candidate read-only query or a rejection. It
//! owns no rendering, persistence or network transport; those live behind
//! the [`SqlGenerator`] trait and the store/server crates.
//!
//! Control flow for one question:
//! question → [`Synthesizer`] → candidate SQL → [`gate::validate`] →
//! accept/reject → (if accepted) handed to the execution collaborator.

pub mod gate;
pub mod prompt;
pub mod rules;
pub mod schema;
pub mod synth;

pub use gate::{validate, AllowList, GateError};
pub use rules::RuleTable;
pub use schema::{ColumnInfo, SchemaContext};
pub use synth::{
    CandidateOrigin, GeneratorError, QueryCandidate, SqlGenerator, SynthesisError, Synthesizer,
};
