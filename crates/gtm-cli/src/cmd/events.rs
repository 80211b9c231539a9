use gtm_core::store::EventStore;
use uuid::Uuid;

use crate::output::{print_json, Table};
use crate::wiring::{self, Env};

pub fn run(env: &Env, project_id: Uuid, json: bool) -> anyhow::Result<()> {
    let store = wiring::open_store(env)?;
    let events = store.events_for(project_id)?;

    if json {
        return print_json(&events);
    }

    if events.is_empty() {
        println!("No events for project {project_id}");
        return Ok(());
    }

    let mut table = Table::new(&["OCCURRED", "KIND", "EVENT ID"]);
    for e in &events {
        table.row(vec![
            e.occurred_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            e.kind().to_string(),
            e.id.to_string(),
        ]);
    }
    table.print();
    Ok(())
}
