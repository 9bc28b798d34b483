//! Prompt templates for the generative collaborator.
//!
//! Static string assembly only; the server crate owns the actual model
//! calls. The SQL prompt pins the target table and column names and the
//! output format so responses survive [`crate::synth::sanitize_sql`] and the
//! verb check.

use crate::schema::SchemaContext;

/// System prompt for SQL generation.
pub const SQL_SYSTEM_PROMPT: &str = "\
You are a SQL expert for a personal seed library database.

SCHEMA:
Table: seed_packs
Columns: id, seed_name, variety, quantity, plant_type, seed_source, date_acquired

RULES:
1. Respond with plain SQL text only: no markdown fences, no comments, no explanations.
2. Use only read-only statements: SELECT, SHOW, DESCRIBE or EXPLAIN.
3. Reference only the table and columns listed above.
4. Return a single statement.";

/// User prompt for SQL generation, embedding the schema context when one is
/// available.
pub fn sql_user_prompt(question: &str, context: Option<&SchemaContext>) -> String {
    match context {
        Some(ctx) => format!(
            "{}\nUSER QUESTION: {}\n\nSQL QUERY:",
            ctx.to_prompt_block(),
            question
        ),
        None => format!("USER QUESTION: {}\n\nSQL QUERY:", question),
    }
}

/// Prompt for narrating query results with gardening advice.
pub fn advice_prompt(question: &str, data_context: &str) -> String {
    format!(
        "\
ROLE: Agricultural expert with seed database access

DATABASE CONTEXT (if relevant):
{data_context}

QUESTION: {question}

RESPONSE RULES:
1. FIRST check if the database context answers the question directly.
2. For general knowledge, begin with \"Agricultural Tip:\".
3. For companion planting, list good companions with benefits and plants to avoid with reasons.
4. For planting advice, include ideal season, sun requirements and water needs.
5. Flag assumptions with \"Note:\".

ANSWER:"
    )
}

/// Prompt for a companion-planting analysis of one plant.
pub fn companion_prompt(plant_name: &str, data_context: &str) -> String {
    format!(
        "\
Analyze companion plants for {plant_name} considering:

DATABASE CONTEXT:
{data_context}

OUTPUT FORMAT:
### Companion Planting for {plant_name}

**Ideal Partners**:
- [Plant]: [Benefits]

**Avoid Planting With**:
- [Plant]: [Reasons]

**Additional Tips**:
- [Tip]

Include specific varieties from the database if available."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_system_prompt_pins_table_and_format() {
        assert!(SQL_SYSTEM_PROMPT.contains("seed_packs"));
        assert!(SQL_SYSTEM_PROMPT.contains("date_acquired"));
        assert!(SQL_SYSTEM_PROMPT.contains("no markdown fences"));
    }

    #[test]
    fn sql_user_prompt_embeds_question_without_context() {
        let prompt = sql_user_prompt("how many seeds do I have?", None);
        assert!(prompt.contains("USER QUESTION: how many seeds do I have?"));
        assert!(!prompt.contains("DATABASE CONTEXT"));
    }

    #[test]
    fn companion_prompt_names_the_plant() {
        let prompt = companion_prompt("Basil", "");
        assert!(prompt.contains("Companion Planting for Basil"));
    }
}
