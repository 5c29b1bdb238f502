pub mod openai;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::PromptMessage;

/// Sampling parameters for one completion call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionParams {
    /// Preset for visible narrative and character output
    pub fn creative() -> Self {
        Self {
            temperature: 0.85,
            max_tokens: 2000,
        }
    }

    /// Preset for the hidden state-update extraction call
    pub fn structured() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 1500,
        }
    }
}

/// The opaque text-completion service. Failures propagate; they are
/// never swallowed at this seam.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        params: CompletionParams,
    ) -> Result<String>;
}

pub use openai::OpenAiClient;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_the_two_call_shapes() {
        let creative = CompletionParams::creative();
        assert_eq!(creative.temperature, 0.85);
        assert_eq!(creative.max_tokens, 2000);

        let structured = CompletionParams::structured();
        assert_eq!(structured.temperature, 0.3);
        assert_eq!(structured.max_tokens, 1500);
    }
}
