use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use gtm_core::project::Project;
use gtm_core::repo::ProjectRepo;
use gtm_core::store::EventStore;
use gtm_core::workflow::WorkflowCoordinator;
use uuid::Uuid;

use crate::output::print_json;
use crate::wiring::{self, ConsoleNotifier, Env};

pub struct SubmitArgs {
    pub name: String,
    pub owner: Option<Uuid>,
    pub prd: Option<PathBuf>,
    pub prd_text: Option<String>,
    pub industry: Option<String>,
    pub mock: bool,
}

pub fn run(env: &Env, args: SubmitArgs, json: bool) -> anyhow::Result<()> {
    let prd = match (&args.prd, &args.prd_text) {
        (Some(path), None) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read PRD from {}", path.display()))?,
        (None, Some(text)) => text.clone(),
        (Some(_), Some(_)) => bail!("pass either --prd or --prd-text, not both"),
        (None, None) => bail!("a PRD is required: pass --prd <file> or --prd-text <text>"),
    };
    if prd.trim().is_empty() {
        bail!("the PRD is empty");
    }

    let db = wiring::open_db(env)?;
    let store = wiring::open_store(env)?;
    let llm = wiring::build_llm(env, args.mock)?;

    let mut project = Project::new(args.owner.unwrap_or_else(Uuid::new_v4), &args.name, &prd);
    if let Some(industry) = &args.industry {
        project = project.with_industry(industry);
    }
    let project_id = db.create_project(&project)?;

    let coordinator = WorkflowCoordinator::new(store.clone());
    coordinator.register_default_stages(
        llm,
        wiring::build_channel(env),
        Arc::new(ConsoleNotifier),
        db,
    );
    coordinator.start_workflow(project_id, &prd)?;

    let state = coordinator.state(project_id)?;
    let events = store.events_for(project_id)?;

    if json {
        #[derive(serde::Serialize)]
        struct SubmitOutput {
            project_id: Uuid,
            step: gtm_core::state::WorkflowStep,
            events: usize,
        }
        return print_json(&SubmitOutput {
            project_id,
            step: state.step,
            events: events.len(),
        });
    }

    println!("Project: {} ({})", project.name, project_id);
    println!("Step:    {}", state.step);
    println!("Events:  {}", events.len());
    for event in &events {
        println!("  {}  {}", event.occurred_at.format("%H:%M:%S"), event.kind());
    }
    Ok(())
}
