//! Line-oriented chat REPL over the turn engine.
//!
//! Thin glue only: reads a line, runs a turn, prints the reply. Type
//! `/state` for the current snapshot, `/quit` to leave. Requires
//! `OPENAI_API_KEY`; `LIVING_WORLD_DATA` overrides the data directory.

use std::io::{BufRead, Write};
use std::sync::Arc;
use uuid::Uuid;

use living_world::{
    Cast, EngineConfig, EngineError, FileStore, OpenAiClient, OutputValidator, PromptBuilder,
    TurnEngine,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let data_dir =
        std::env::var("LIVING_WORLD_DATA").unwrap_or_else(|_| "./data".to_string());
    let cast = Cast::default();

    let engine = TurnEngine::new(
        Arc::new(FileStore::new(&data_dir)?),
        Arc::new(OpenAiClient::from_env()?),
        PromptBuilder::new(&data_dir, cast.clone()),
        OutputValidator::with_defaults(),
        EngineConfig::default(),
    );

    let mut user_id: Option<Uuid> = None;
    let mut world_id: Option<Uuid> = None;

    println!(
        "Living World. Talk to {}; /state for the world, /quit to leave.",
        cast.partner_name
    );

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();

        match input {
            "" => {
                println!("(say something)");
                continue;
            }
            "/quit" => break,
            "/state" => {
                let snapshot = engine.state_snapshot(user_id, world_id).await?;
                user_id = Some(snapshot.user_id);
                world_id = Some(snapshot.world_id);
                println!(
                    "{}",
                    snapshot
                        .world_state
                        .world_context(&cast.user_name, &cast.partner_name)
                );
                continue;
            }
            _ => {}
        }

        match engine.process_turn(user_id, world_id, input).await {
            Ok(outcome) => {
                user_id = Some(outcome.user_id);
                world_id = Some(outcome.world_id);
                println!("\n{}\n", outcome.reply);
                if outcome.degraded {
                    log::warn!("reply accepted with issues: {}", outcome.issues.join("; "));
                }
            }
            Err(EngineError::EmptyMessage) => println!("(say something)"),
            Err(e) => {
                log::error!("turn failed: {}", e);
                println!("(the world stalled; try again)");
            }
        }
    }

    Ok(())
}
