use gtm_core::store::EventStore;
use gtm_core::workflow::fold_events;
use uuid::Uuid;

use crate::output::print_json;
use crate::wiring::{self, Env};

pub fn run(env: &Env, project_id: Uuid, json: bool) -> anyhow::Result<()> {
    let store = wiring::open_store(env)?;
    let events = store.events_for(project_id)?;
    let state = fold_events(project_id, &events)?;

    if json {
        return print_json(&state);
    }

    println!("Project: {project_id}");
    println!("Step:    {}", state.step);
    println!("Events:  {}", events.len());
    println!();
    println!("  analysis       {}", slot(state.analysis.is_some()));
    println!("  strategy       {}", slot(state.strategy.is_some()));
    println!("  content plan   {}", slot(state.content_plan.is_some()));
    println!("  content items  {}", slot(state.content_items.is_some()));
    println!("  engagements    {}", slot(state.engagements.is_some()));
    Ok(())
}

fn slot(filled: bool) -> &'static str {
    if filled {
        "done"
    } else {
        "pending"
    }
}
