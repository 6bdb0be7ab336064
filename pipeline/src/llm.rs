use std::time::Duration;

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmRole {
    System,
    User,
}

#[derive(Debug, Clone)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

impl LlmMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: LlmRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: LlmRole::User, content: content.into() }
    }
}

/// The only surface the pipeline needs from an LLM provider. No concrete
/// implementation ships here; a vendor client lives at the composition
/// root and is handed in as `Arc<dyn Llm>`.
#[async_trait]
pub trait Llm: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<LlmMessage>,
        temperature: f64,
        max_tokens: u32,
        timeout: Duration,
    ) -> anyhow::Result<String>;

    /// A `GET /models`-style probe; returns the model identifiers the
    /// provider currently reports healthy.
    async fn health(&self) -> anyhow::Result<Vec<String>>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic LLM double for node unit tests: cycles through a
    /// fixed list of canned responses, one per call, wrapping around.
    pub struct MockLlm {
        responses: Vec<String>,
        calls: AtomicUsize,
    }

    impl MockLlm {
        pub fn new(responses: Vec<String>) -> Self {
            Self { responses, calls: AtomicUsize::new(0) }
        }

        pub fn always(response: impl Into<String>) -> Self {
            Self::new(vec![response.into()])
        }

        pub fn failing() -> FailingLlm {
            FailingLlm
        }
    }

    #[async_trait]
    impl Llm for MockLlm {
        async fn complete(&self, _messages: Vec<LlmMessage>, _temperature: f64, _max_tokens: u32, _timeout: Duration) -> anyhow::Result<String> {
            let i = self.calls.fetch_add(1, Ordering::SeqCst) % self.responses.len();
            Ok(self.responses[i].clone())
        }

        async fn health(&self) -> anyhow::Result<Vec<String>> {
            Ok(vec!["mock-model".to_string()])
        }
    }

    pub struct FailingLlm;

    #[async_trait]
    impl Llm for FailingLlm {
        async fn complete(&self, _messages: Vec<LlmMessage>, _temperature: f64, _max_tokens: u32, _timeout: Duration) -> anyhow::Result<String> {
            anyhow::bail!("llm provider unavailable")
        }

        async fn health(&self) -> anyhow::Result<Vec<String>> {
            anyhow::bail!("llm provider unavailable")
        }
    }
}
