//! # Living World Library
//!
//! A complete turn-processing engine for persistent conversational world
//! simulations: one user, one LLM-driven partner character, one world
//! document that quietly evolves underneath the conversation.
//!
//! ## Features
//!
//! - **Turn Engine**: the full pipeline from user input to persisted turn
//! - **World Document**: time, locations, activities, relationship facts,
//!   replaced wholesale each turn
//! - **Character State Machine**: categorical mood/trust/intimacy labels
//!   evolved by an ordered rule sequence
//! - **Identity Validation**: pattern-based output checks with a bounded
//!   regenerate-on-failure loop
//! - **Prompt Assembly**: fixed-order role-tagged blocks with filesystem
//!   templates and built-in fallbacks
//! - **Pluggable Seams**: `LlmClient` and `WorldStore` traits with shipped
//!   OpenAI-compatible, in-memory, and file-backed implementations
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use living_world::{
//!     Cast, EngineConfig, MemoryStore, OpenAiClient, OutputValidator,
//!     PromptBuilder, TurnEngine,
//! };
//!
//! # async fn example() -> Result<(), living_world::EngineError> {
//! let engine = TurnEngine::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(OpenAiClient::new("api-key", "gpt-4o")),
//!     PromptBuilder::new("./data", Cast::default()),
//!     OutputValidator::with_defaults(),
//!     EngineConfig::default(),
//! );
//!
//! let outcome = engine.process_turn(None, None, "morning, you").await?;
//! println!("{}", outcome.reply);
//! # Ok(())
//! # }
//! ```

pub mod character;
pub mod engine;
pub mod error;
pub mod llm;
pub mod parser;
pub mod prompts;
pub mod store;
pub mod types;
pub mod validator;
pub mod world;

// Re-export main types for convenience
pub use character::{transition, CharacterState, TurnContext};
pub use engine::{EngineConfig, StateSnapshot, TurnEngine, TurnOutcome};
pub use error::EngineError;
pub use llm::{CompletionParams, LlmClient, OpenAiClient};
pub use prompts::{AssemblyMode, PromptBuilder};
pub use store::{FileStore, MemoryStore, WorldStore};
pub use types::{Cast, PromptMessage, PromptRole, Role, StoredMessage, User, World};
pub use validator::{OutputValidator, RulePack, ValidationReport};
pub use world::{Location, Person, TimeOfDay, WorldState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
