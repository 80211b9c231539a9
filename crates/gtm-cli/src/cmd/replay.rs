use std::sync::Arc;

use gtm_core::workflow::WorkflowCoordinator;
use uuid::Uuid;

use crate::output::print_json;
use crate::wiring::{self, ConsoleNotifier, Env};

/// Republishes the stored log through freshly wired handlers. Stages run
/// again against whatever each event carries, so this is a mock-adapter
/// affair by default; duplicate-write rejections are logged per handler.
pub fn run(env: &Env, project_id: Uuid, mock: bool, json: bool) -> anyhow::Result<()> {
    let db = wiring::open_db(env)?;
    let store = wiring::open_store(env)?;
    let llm = wiring::build_llm(env, mock)?;

    let coordinator = WorkflowCoordinator::new(store);
    coordinator.register_default_stages(
        llm,
        wiring::build_channel(env),
        Arc::new(ConsoleNotifier),
        db,
    );
    let replayed = coordinator.replay(project_id)?;

    if json {
        #[derive(serde::Serialize)]
        struct ReplayOutput {
            project_id: Uuid,
            replayed: usize,
        }
        return print_json(&ReplayOutput {
            project_id,
            replayed,
        });
    }

    println!("Replayed {replayed} events for project {project_id}");
    Ok(())
}
