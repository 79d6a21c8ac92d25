//! Scripted text generator for testing purposes.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{GenerationOptions, LlmError, TextGenerator};

/// A generator that replays predefined replies in order
///
/// Once the script runs out every call fails with [`LlmError::Unavailable`].
#[derive(Debug, Default)]
pub struct MockGenerator {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<(String, GenerationOptions)>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator whose replies are the given texts
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        for reply in replies {
            mock.push_reply(reply);
        }
        mock
    }

    /// Queue a successful reply
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.lock_replies().push_back(Ok(reply.into()));
    }

    /// Queue a failed call
    pub fn push_error(&self, error: LlmError) {
        self.lock_replies().push_back(Err(error));
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.lock_calls().iter().map(|(prompt, _)| prompt.clone()).collect()
    }

    /// Options received so far, in call order
    pub fn options(&self) -> Vec<GenerationOptions> {
        self.lock_calls().iter().map(|(_, options)| options.clone()).collect()
    }

    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, LlmError>>> {
        self.replies.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<(String, GenerationOptions)>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, LlmError> {
        self.lock_calls().push((prompt.to_string(), options.clone()));
        self.lock_replies()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Unavailable("mock script exhausted".to_string())))
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}
