//! Answer synthesis: wrap retrieved context around the question and ask the chat model.

use std::sync::Arc;

use reporag_llm::LlmError;
use reporag_llm::any::AnyProvider;
use reporag_llm::provider::{LlmProvider, Message, Role};

pub const SYSTEM_INSTRUCTION: &str = "You are an expert software assistant.";
pub const NO_CONTEXT_MESSAGE: &str = "No relevant context found.";
pub const COMPLETION_ERROR_PREFIX: &str = "Error during OpenAI API call: ";
pub const RETRIEVAL_ERROR_PREFIX: &str = "Error during RAG process: ";
pub const EMPTY_COMPLETION_MESSAGE: &str = "Error: No valid response received from OpenAI.";

const CONTEXT_SEPARATOR: &str = "\n---\n";

/// Prompt sent to the chat model for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AugmentedPrompt {
    pub system_instruction: &'static str,
    pub context: String,
    pub question: String,
}

impl AugmentedPrompt {
    #[must_use]
    pub fn new(question: &str, contexts: &[String]) -> Self {
        Self {
            system_instruction: SYSTEM_INSTRUCTION,
            context: contexts.join(CONTEXT_SEPARATOR),
            question: question.to_owned(),
        }
    }

    /// The user turn: the context block followed by the question.
    #[must_use]
    pub fn user_content(&self) -> String {
        format!(
            "<CONTEXT>\n{}\n</CONTEXT>\n\nQUESTION:\n{}",
            self.context, self.question
        )
    }

    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        vec![
            Message::new(Role::System, self.system_instruction),
            Message::new(Role::User, self.user_content()),
        ]
    }
}

/// Outcome of answering one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Completed(String),
    NoContext,
    /// The model answered without any usable text.
    EmptyCompletion,
    CompletionFailed(String),
    RetrievalFailed(String),
}

impl Answer {
    /// Render the string shown to the user.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Completed(text) => text,
            Self::NoContext => NO_CONTEXT_MESSAGE.to_owned(),
            Self::EmptyCompletion => EMPTY_COMPLETION_MESSAGE.to_owned(),
            Self::CompletionFailed(e) => format!("{COMPLETION_ERROR_PREFIX}{e}"),
            Self::RetrievalFailed(e) => format!("{RETRIEVAL_ERROR_PREFIX}{e}"),
        }
    }
}

#[derive(Clone)]
pub struct AnswerSynthesizer {
    provider: Arc<AnyProvider>,
}

impl AnswerSynthesizer {
    #[must_use]
    pub fn new(provider: Arc<AnyProvider>) -> Self {
        Self { provider }
    }

    /// Ask the chat model to answer `question` from `contexts`.
    ///
    /// Never calls the model when `contexts` is empty. A missing or blank reply is
    /// [`Answer::EmptyCompletion`]; other provider errors are folded into
    /// [`Answer::CompletionFailed`].
    pub async fn synthesize(&self, question: &str, contexts: &[String]) -> Answer {
        if contexts.is_empty() {
            return Answer::NoContext;
        }

        let prompt = AugmentedPrompt::new(question, contexts);
        tracing::debug!(
            contexts = contexts.len(),
            prompt_bytes = prompt.context.len() + prompt.question.len(),
            "requesting completion"
        );

        match self.provider.chat(&prompt.messages()).await {
            Ok(text) if text.trim().is_empty() => {
                tracing::warn!(provider = self.provider.name(), "completion has no text");
                Answer::EmptyCompletion
            }
            Ok(text) => Answer::Completed(text.trim().to_owned()),
            Err(LlmError::EmptyResponse { provider }) => {
                tracing::warn!(provider = %provider, "completion has no choices");
                Answer::EmptyCompletion
            }
            Err(e) => {
                tracing::error!(provider = self.provider.name(), "completion failed: {e}");
                Answer::CompletionFailed(e.to_string())
            }
        }
    }
}
