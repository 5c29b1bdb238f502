use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::character::{transition, CharacterState, TurnContext};
use crate::error::EngineError;
use crate::llm::{CompletionParams, LlmClient};
use crate::parser;
use crate::prompts::{AssemblyMode, PromptBuilder};
use crate::store::WorldStore;
use crate::types::{PromptMessage, StoredMessage, User, World};
use crate::validator::{OutputValidator, ValidationReport};
use crate::world::WorldState;

/// How many stored messages the snapshot endpoint returns
const SNAPSHOT_MESSAGES: usize = 20;

/// Tunables for the turn pipeline, fixed at construction so both
/// assembly modes can be exercised side by side in tests.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub mode: AssemblyMode,
    /// Upper bound on creative completion calls per turn
    pub max_attempts: u32,
    /// Per-call deadline; expiry is fatal for the turn
    pub completion_timeout: Duration,
    /// How much stored history is loaded per turn
    pub history_window: usize,
    /// How many stored messages feed the state-update transcript
    pub transcript_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: AssemblyMode::Character,
            max_attempts: 3,
            completion_timeout: Duration::from_secs(60),
            history_window: 50,
            transcript_window: 10,
        }
    }
}

/// What one processed turn produced
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub user_id: Uuid,
    pub world_id: Uuid,
    /// The accepted visible reply
    pub reply: String,
    /// Creative calls spent (1 when the first attempt validated)
    pub attempts: u32,
    /// True when retries were exhausted and the reply was accepted
    /// with known issues
    pub degraded: bool,
    /// The final validation verdict's issues (empty on a clean accept)
    pub issues: Vec<String>,
    /// False when the structured update was unparseable and the prior
    /// document was kept
    pub state_updated: bool,
}

/// Read-only view for the state endpoint
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub user_id: Uuid,
    pub world_id: Uuid,
    pub messages: Vec<StoredMessage>,
    pub world_state: WorldState,
}

/// Result of the bounded generate/validate loop
struct Generation {
    text: String,
    attempts: u32,
    report: ValidationReport,
    degraded: bool,
}

/// States of the generation loop; attempt count travels with the state
enum GenerationPhase {
    Generate {
        prompt: Vec<PromptMessage>,
        attempt: u32,
    },
    Done(Generation),
}

/// The turn orchestrator: assembles the prompt, generates and validates
/// the reply inside a bounded retry loop, runs the hidden state-update
/// call, folds the character state machine, and persists the result.
///
/// Turns against one world serialize on a per-world lock; independent
/// worlds process concurrently.
pub struct TurnEngine {
    store: Arc<dyn WorldStore>,
    llm: Arc<dyn LlmClient>,
    prompts: PromptBuilder,
    validator: OutputValidator,
    config: EngineConfig,
    world_locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl TurnEngine {
    pub fn new(
        store: Arc<dyn WorldStore>,
        llm: Arc<dyn LlmClient>,
        prompts: PromptBuilder,
        validator: OutputValidator,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            llm,
            prompts,
            validator,
            config,
            world_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Process one user message against a world: the whole pipeline
    /// from input validation to persistence.
    pub async fn process_turn(
        &self,
        user_id: Option<Uuid>,
        world_id: Option<Uuid>,
        message: &str,
    ) -> Result<TurnOutcome, EngineError> {
        if message.trim().is_empty() {
            return Err(EngineError::EmptyMessage);
        }

        let (user, world) = self.resolve(user_id, world_id).await?;

        // Serialize turns per world; the guard is held until commit
        let lock = self.world_lock(world.id);
        let _turn_guard = lock.lock().await;

        let state = self
            .store
            .load_or_init_state(world.id)
            .await
            .map_err(EngineError::storage)?;
        let history = self
            .store
            .recent_messages(world.id, self.config.history_window)
            .await
            .map_err(EngineError::storage)?;
        let character = CharacterState::from_stored(state.character_state.as_deref());

        log::info!(
            "🌍 Turn for world {} ({} prior messages)",
            world.id,
            history.len()
        );

        // Visible reply, validated and retried within the bound
        let base_prompt = self
            .prompts
            .assemble(self.config.mode, &state, &character, message, &history)
            .map_err(EngineError::template)?;
        let generation = self.generate_with_retries(&base_prompt, message).await?;

        // Hidden state update; unparseable content keeps the prior
        // document, transport failure aborts the turn
        let (mut new_state, state_updated) = self
            .updated_world_state(&state, &history, message, &generation.text)
            .await?;

        if state_updated {
            let context = TurnContext {
                user_input: message,
                partner_reply: &generation.text,
                location: new_state.locations.partner,
                time_of_day: new_state.time.time_of_day,
            };
            let next_character = transition(&character, &context);
            new_state.character_state = Some(next_character.to_stored());
            new_state.normalize_time();
        }

        self.store
            .commit_turn(world.id, &new_state, message, &generation.text)
            .await
            .map_err(EngineError::storage)?;

        log::info!(
            "✅ Turn committed for world {} (attempts: {}, degraded: {}, state_updated: {})",
            world.id,
            generation.attempts,
            generation.degraded,
            state_updated
        );

        Ok(TurnOutcome {
            user_id: user.id,
            world_id: world.id,
            reply: generation.text,
            attempts: generation.attempts,
            degraded: generation.degraded,
            issues: generation.report.issues,
            state_updated,
        })
    }

    /// Current document plus the recent message tail, for display
    pub async fn state_snapshot(
        &self,
        user_id: Option<Uuid>,
        world_id: Option<Uuid>,
    ) -> Result<StateSnapshot, EngineError> {
        let (user, world) = self.resolve(user_id, world_id).await?;
        let world_state = self
            .store
            .load_or_init_state(world.id)
            .await
            .map_err(EngineError::storage)?;
        let messages = self
            .store
            .recent_messages(world.id, SNAPSHOT_MESSAGES)
            .await
            .map_err(EngineError::storage)?;
        Ok(StateSnapshot {
            user_id: user.id,
            world_id: world.id,
            messages,
            world_state,
        })
    }

    async fn resolve(
        &self,
        user_id: Option<Uuid>,
        world_id: Option<Uuid>,
    ) -> Result<(User, World), EngineError> {
        let user = self
            .store
            .get_or_create_user(user_id)
            .await
            .map_err(EngineError::storage)?;
        let world = self
            .store
            .get_or_create_world(user.id, world_id)
            .await
            .map_err(EngineError::storage)?;
        Ok((user, world))
    }

    fn world_lock(&self, world_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.world_locks.lock().unwrap();
        locks
            .entry(world_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// GENERATE → VALIDATE → (ACCEPT | RETRY) → DONE.
    ///
    /// Completion failure is fatal and distinct from validation
    /// failure; exhausting the bound accepts the last output with its
    /// issues rather than never answering.
    async fn generate_with_retries(
        &self,
        base_prompt: &[PromptMessage],
        user_input: &str,
    ) -> Result<Generation, EngineError> {
        let character_id = self.prompts.cast().partner_id.clone();
        let mut phase = GenerationPhase::Generate {
            prompt: base_prompt.to_vec(),
            attempt: 1,
        };

        loop {
            phase = match phase {
                GenerationPhase::Generate { prompt, attempt } => {
                    let text = self
                        .complete(&prompt, CompletionParams::creative())
                        .await?;
                    let report = self.validator.validate(&character_id, &text);

                    if report.valid {
                        log::info!("🎭 Reply accepted on attempt {}", attempt);
                        GenerationPhase::Done(Generation {
                            text,
                            attempts: attempt,
                            report,
                            degraded: false,
                        })
                    } else if attempt < self.config.max_attempts {
                        log::warn!(
                            "Validation failed on attempt {}: {}",
                            attempt,
                            report.issues.join("; ")
                        );
                        GenerationPhase::Generate {
                            prompt: corrective_prompt(base_prompt, &text, &report.issues, user_input),
                            attempt: attempt + 1,
                        }
                    } else {
                        log::warn!(
                            "⚠️ Accepting degraded reply after {} attempts; issues: {}",
                            attempt,
                            report.issues.join("; ")
                        );
                        GenerationPhase::Done(Generation {
                            text,
                            attempts: attempt,
                            report,
                            degraded: true,
                        })
                    }
                }
                GenerationPhase::Done(generation) => return Ok(generation),
            };
        }
    }

    /// Run the structured update call and parse the replacement
    /// document. Returns the prior document unchanged when the content
    /// cannot be parsed.
    async fn updated_world_state(
        &self,
        state: &WorldState,
        history: &[StoredMessage],
        user_message: &str,
        reply: &str,
    ) -> Result<(WorldState, bool), EngineError> {
        let template = self
            .prompts
            .loader()
            .load_state_update()
            .map_err(EngineError::template)?;
        let transcript = self.recent_transcript(history, user_message, reply);
        let state_json = serde_json::to_string_pretty(state)
            .map_err(|e| EngineError::Storage(e.to_string()))?;

        let prompt = vec![
            PromptMessage::system(template),
            PromptMessage::user(format!(
                "CURRENT WORLD STATE:\n```json\n{}\n```\n\nRECENT CONVERSATION:\n{}",
                state_json, transcript
            )),
        ];

        let raw = self
            .complete(&prompt, CompletionParams::structured())
            .await?;

        match parser::extract_json::<WorldState>(&raw) {
            Ok(updated) => Ok((updated, true)),
            Err(e) => {
                // World progression silently freezes if this keeps
                // happening, so it must be loud
                log::error!("📉 State update unparseable, keeping prior document: {}", e);
                log::debug!("Raw state update response: {}", raw);
                Ok((state.clone(), false))
            }
        }
    }

    /// Speaker-labelled transcript of the recent exchange for the
    /// state-update call
    fn recent_transcript(
        &self,
        history: &[StoredMessage],
        user_message: &str,
        reply: &str,
    ) -> String {
        let user_name = &self.prompts.cast().user_name;
        let start = history.len().saturating_sub(self.config.transcript_window);

        let mut transcript = String::new();
        for message in &history[start..] {
            let label = match message.role {
                crate::types::Role::User => user_name.as_str(),
                crate::types::Role::Assistant => "World",
            };
            transcript.push_str(&format!("{}: {}\n\n", label, message.content));
        }
        transcript.push_str(&format!("{}: {}\n\n", user_name, user_message));
        transcript.push_str(&format!("World: {}\n", reply));
        transcript
    }

    async fn complete(
        &self,
        prompt: &[PromptMessage],
        params: CompletionParams,
    ) -> Result<String, EngineError> {
        match tokio::time::timeout(
            self.config.completion_timeout,
            self.llm.complete(prompt, params),
        )
        .await
        {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(EngineError::completion(e)),
            Err(_) => Err(EngineError::CompletionTimeout(
                self.config.completion_timeout.as_secs(),
            )),
        }
    }
}

/// Base prompt extended with the correction instruction, the rejected
/// output as an assistant turn, and the original input re-asserted.
fn corrective_prompt(
    base_prompt: &[PromptMessage],
    invalid_output: &str,
    issues: &[String],
    user_input: &str,
) -> Vec<PromptMessage> {
    let mut prompt = base_prompt.to_vec();
    prompt.push(PromptMessage::system(format!(
        "CORRECTION REQUIRED: Your previous output had these issues: {}. \
         Rewrite it so every issue is resolved while preserving the scene facts. \
         NO generic phrases. NO world description. NO therapy-speak.",
        issues.join("; ")
    )));
    prompt.push(PromptMessage::assistant(invalid_output));
    prompt.push(PromptMessage::user(user_input));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrective_prompt_names_issues_and_reasserts_input() {
        let base = vec![PromptMessage::system("base"), PromptMessage::user("hello")];
        let issues = vec!["Contains generic pattern: X".to_string()];
        let prompt = corrective_prompt(&base, "bad output", &issues, "hello");

        assert_eq!(prompt.len(), 5);
        assert!(prompt[2].content.contains("Contains generic pattern: X"));
        assert!(prompt[2].content.contains("preserving the scene facts"));
        assert_eq!(prompt[3].role, crate::types::PromptRole::Assistant);
        assert_eq!(prompt[3].content, "bad output");
        assert_eq!(prompt[4].role, crate::types::PromptRole::User);
        assert_eq!(prompt[4].content, "hello");
    }

    #[test]
    fn default_config_matches_the_contract() {
        let config = EngineConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.mode, AssemblyMode::Character);
        assert_eq!(config.history_window, 50);
        assert_eq!(config.transcript_window, 10);
    }
}
