//! OpenAI-backed generative collaborators.
//!
//! Two concerns share the same model boundary: SQL generation (the
//! [`SqlGenerator`] implementation handed to the synthesizer) and narration
//! (gardening advice over schema context or query results). One request, one
//! response per call; no streaming, no multi-turn context between cycles.

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::debug;

use seedsage_core::{prompt, GeneratorError, SchemaContext, SqlGenerator};

/// Shared chat-completion plumbing.
async fn complete(
    client: &Client<OpenAIConfig>,
    model: &str,
    system: Option<&str>,
    user: String,
) -> Result<String, GeneratorError> {
    let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();
    if let Some(system) = system {
        messages.push(ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| GeneratorError::Failed(e.to_string()))?,
        ));
    }
    messages.push(ChatCompletionRequestMessage::User(
        ChatCompletionRequestUserMessageArgs::default()
            .content(user)
            .build()
            .map_err(|e| GeneratorError::Failed(e.to_string()))?,
    ));

    let request = CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages(messages)
        .temperature(0.0) // Deterministic output
        .build()
        .map_err(|e| GeneratorError::Failed(e.to_string()))?;

    let response = client
        .chat()
        .create(request)
        .await
        .map_err(|e| GeneratorError::Failed(e.to_string()))?;

    let content = response
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_ref())
        .ok_or_else(|| GeneratorError::UnusableResponse("empty model response".to_string()))?;

    Ok(content.trim().to_string())
}

/// SQL generation over the OpenAI chat API.
pub struct OpenAiSqlGenerator {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiSqlGenerator {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl SqlGenerator for OpenAiSqlGenerator {
    async fn generate(
        &self,
        question: &str,
        context: Option<&SchemaContext>,
    ) -> Result<String, GeneratorError> {
        debug!(model = %self.model, "requesting SQL generation");
        complete(
            &self.client,
            &self.model,
            Some(prompt::SQL_SYSTEM_PROMPT),
            prompt::sql_user_prompt(question, context),
        )
        .await
    }
}

/// Narration over the same model: gardening advice, result insights and
/// companion-planting analysis.
pub struct Narrator {
    client: Client<OpenAIConfig>,
    model: String,
}

impl Narrator {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Narrate query results in the context of the original question.
    pub async fn narrate(
        &self,
        question: &str,
        results: &serde_json::Value,
    ) -> Result<String, GeneratorError> {
        let head = results
            .get("rows")
            .and_then(|rows| rows.as_array())
            .map(|rows| {
                serde_json::Value::Array(rows.iter().take(3).cloned().collect()).to_string()
            })
            .unwrap_or_else(|| results.to_string());

        let user = prompt::advice_prompt(
            &format!("Analyze these results: {head}\nOriginal question: {question}"),
            "",
        );
        complete(&self.client, &self.model, None, user).await
    }

    /// General gardening advice, optionally grounded in the schema context.
    pub async fn advise(&self, question: &str, data_context: &str) -> Result<String, GeneratorError> {
        complete(
            &self.client,
            &self.model,
            None,
            prompt::advice_prompt(question, data_context),
        )
        .await
    }

    /// Companion-planting analysis for one plant.
    pub async fn companion_guide(
        &self,
        plant_name: &str,
        data_context: &str,
    ) -> Result<String, GeneratorError> {
        complete(
            &self.client,
            &self.model,
            None,
            prompt::companion_prompt(plant_name, data_context),
        )
        .await
    }
}
