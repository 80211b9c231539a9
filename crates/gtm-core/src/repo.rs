//! Entity repositories.
//!
//! One redb table per entity, uuid key, JSON-encoded value. Find-by-parent
//! queries are scan-and-filter: the data set per project is small and the
//! stores stay dumb — ancestry ordering is enforced by the stage layer via
//! not-found errors, not by the storage.

use std::path::Path;
use std::sync::Mutex;

use redb::{Database, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::Analysis;
use crate::content::{ContentItem, ContentPlan};
use crate::engagement::Engagement;
use crate::error::{GtmError, Result};
use crate::project::Project;
use crate::strategy::Strategy;

// ---------------------------------------------------------------------------
// Repository traits
// ---------------------------------------------------------------------------

pub trait ProjectRepo: Send + Sync {
    /// Persist and return the new id.
    fn create_project(&self, project: &Project) -> Result<Uuid>;
    fn project(&self, id: Uuid) -> Result<Project>;
    fn projects_by_owner(&self, owner_id: Uuid) -> Result<Vec<Project>>;
    fn update_project(&self, project: &Project) -> Result<()>;
    fn delete_project(&self, id: Uuid) -> Result<()>;
}

pub trait AnalysisRepo: Send + Sync {
    fn create_analysis(&self, analysis: &Analysis) -> Result<Uuid>;
    /// The single analysis for a project, or `AnalysisNotFound`.
    fn analysis_for_project(&self, project_id: Uuid) -> Result<Analysis>;
    fn update_analysis(&self, analysis: &Analysis) -> Result<()>;
    fn delete_analysis(&self, id: Uuid) -> Result<()>;
}

pub trait StrategyRepo: Send + Sync {
    fn create_strategy(&self, strategy: &Strategy) -> Result<Uuid>;
    fn strategy_for_project(&self, project_id: Uuid) -> Result<Strategy>;
    fn update_strategy(&self, strategy: &Strategy) -> Result<()>;
    fn delete_strategy(&self, id: Uuid) -> Result<()>;
}

pub trait ContentPlanRepo: Send + Sync {
    fn create_plan(&self, plan: &ContentPlan) -> Result<Uuid>;
    fn plan_for_project(&self, project_id: Uuid) -> Result<ContentPlan>;
    fn update_plan(&self, plan: &ContentPlan) -> Result<()>;
    fn delete_plan(&self, id: Uuid) -> Result<()>;
}

pub trait ContentItemRepo: Send + Sync {
    fn create_item(&self, item: &ContentItem) -> Result<Uuid>;
    fn items_for_plan(&self, plan_id: Uuid) -> Result<Vec<ContentItem>>;
    fn update_item(&self, item: &ContentItem) -> Result<()>;
    fn delete_item(&self, id: Uuid) -> Result<()>;
}

pub trait EngagementRepo: Send + Sync {
    fn create_engagement(&self, engagement: &Engagement) -> Result<Uuid>;
    fn engagements_for_item(&self, content_item_id: Uuid) -> Result<Vec<Engagement>>;
    fn update_engagement(&self, engagement: &Engagement) -> Result<()>;
    fn delete_engagement(&self, id: Uuid) -> Result<()>;
}

// ---------------------------------------------------------------------------
// RedbDb
// ---------------------------------------------------------------------------

const PROJECTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("projects");
const ANALYSES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("analyses");
const STRATEGIES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("strategies");
const CONTENT_PLANS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("content_plans");
const CONTENT_ITEMS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("content_items");
const ENGAGEMENTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("engagements");

const ALL_TABLES: &[TableDefinition<'static, &[u8], &[u8]>] = &[
    PROJECTS,
    ANALYSES,
    STRATEGIES,
    CONTENT_PLANS,
    CONTENT_ITEMS,
    ENGAGEMENTS,
];

/// Durable entity storage backing every repository capability.
pub struct RedbDb {
    db: Database,
}

impl RedbDb {
    /// Open or create the redb database at `path`, ensuring all tables exist.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path).map_err(|e| GtmError::Store(e.to_string()))?;
        let wt = db.begin_write().map_err(|e| GtmError::Store(e.to_string()))?;
        for table in ALL_TABLES {
            wt.open_table(*table)
                .map_err(|e| GtmError::Store(e.to_string()))?;
        }
        wt.commit().map_err(|e| GtmError::Store(e.to_string()))?;
        Ok(Self { db })
    }

    fn put<T: Serialize>(
        &self,
        table: TableDefinition<'static, &[u8], &[u8]>,
        id: Uuid,
        value: &T,
    ) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        let wt = self
            .db
            .begin_write()
            .map_err(|e| GtmError::Store(e.to_string()))?;
        {
            let mut t = wt
                .open_table(table)
                .map_err(|e| GtmError::Store(e.to_string()))?;
            t.insert(id.as_bytes().as_slice(), bytes.as_slice())
                .map_err(|e| GtmError::Store(e.to_string()))?;
        }
        wt.commit().map_err(|e| GtmError::Store(e.to_string()))?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(
        &self,
        table: TableDefinition<'static, &[u8], &[u8]>,
        id: Uuid,
    ) -> Result<Option<T>> {
        let rt = self
            .db
            .begin_read()
            .map_err(|e| GtmError::Store(e.to_string()))?;
        let t = rt
            .open_table(table)
            .map_err(|e| GtmError::Store(e.to_string()))?;
        match t
            .get(id.as_bytes().as_slice())
            .map_err(|e| GtmError::Store(e.to_string()))?
        {
            Some(v) => Ok(Some(serde_json::from_slice(v.value())?)),
            None => Ok(None),
        }
    }

    fn remove(&self, table: TableDefinition<'static, &[u8], &[u8]>, id: Uuid) -> Result<()> {
        let wt = self
            .db
            .begin_write()
            .map_err(|e| GtmError::Store(e.to_string()))?;
        {
            let mut t = wt
                .open_table(table)
                .map_err(|e| GtmError::Store(e.to_string()))?;
            t.remove(id.as_bytes().as_slice())
                .map_err(|e| GtmError::Store(e.to_string()))?;
        }
        wt.commit().map_err(|e| GtmError::Store(e.to_string()))?;
        Ok(())
    }

    fn scan<T, F>(
        &self,
        table: TableDefinition<'static, &[u8], &[u8]>,
        mut keep: F,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        F: FnMut(&T) -> bool,
    {
        let rt = self
            .db
            .begin_read()
            .map_err(|e| GtmError::Store(e.to_string()))?;
        let t = rt
            .open_table(table)
            .map_err(|e| GtmError::Store(e.to_string()))?;
        let mut result = Vec::new();
        for entry in t.iter().map_err(|e| GtmError::Store(e.to_string()))? {
            let (_, v) = entry.map_err(|e| GtmError::Store(e.to_string()))?;
            let value: T = serde_json::from_slice(v.value())?;
            if keep(&value) {
                result.push(value);
            }
        }
        Ok(result)
    }
}

impl ProjectRepo for RedbDb {
    fn create_project(&self, project: &Project) -> Result<Uuid> {
        self.put(PROJECTS, project.id, project)?;
        Ok(project.id)
    }

    fn project(&self, id: Uuid) -> Result<Project> {
        self.get(PROJECTS, id)?.ok_or(GtmError::ProjectNotFound(id))
    }

    fn projects_by_owner(&self, owner_id: Uuid) -> Result<Vec<Project>> {
        self.scan(PROJECTS, |p: &Project| p.owner_id == owner_id)
    }

    fn update_project(&self, project: &Project) -> Result<()> {
        // update is a keyed overwrite; the caller supplies a fresh snapshot
        self.project(project.id)?;
        self.put(PROJECTS, project.id, project)
    }

    fn delete_project(&self, id: Uuid) -> Result<()> {
        self.remove(PROJECTS, id)
    }
}

impl AnalysisRepo for RedbDb {
    fn create_analysis(&self, analysis: &Analysis) -> Result<Uuid> {
        self.put(ANALYSES, analysis.id, analysis)?;
        Ok(analysis.id)
    }

    fn analysis_for_project(&self, project_id: Uuid) -> Result<Analysis> {
        self.scan(ANALYSES, |a: &Analysis| a.project_id == project_id)?
            .into_iter()
            .next()
            .ok_or(GtmError::AnalysisNotFound(project_id))
    }

    fn update_analysis(&self, analysis: &Analysis) -> Result<()> {
        self.put(ANALYSES, analysis.id, analysis)
    }

    fn delete_analysis(&self, id: Uuid) -> Result<()> {
        self.remove(ANALYSES, id)
    }
}

impl StrategyRepo for RedbDb {
    fn create_strategy(&self, strategy: &Strategy) -> Result<Uuid> {
        self.put(STRATEGIES, strategy.id, strategy)?;
        Ok(strategy.id)
    }

    fn strategy_for_project(&self, project_id: Uuid) -> Result<Strategy> {
        self.scan(STRATEGIES, |s: &Strategy| s.project_id == project_id)?
            .into_iter()
            .next()
            .ok_or(GtmError::StrategyNotFound(project_id))
    }

    fn update_strategy(&self, strategy: &Strategy) -> Result<()> {
        self.put(STRATEGIES, strategy.id, strategy)
    }

    fn delete_strategy(&self, id: Uuid) -> Result<()> {
        self.remove(STRATEGIES, id)
    }
}

impl ContentPlanRepo for RedbDb {
    fn create_plan(&self, plan: &ContentPlan) -> Result<Uuid> {
        self.put(CONTENT_PLANS, plan.id, plan)?;
        Ok(plan.id)
    }

    fn plan_for_project(&self, project_id: Uuid) -> Result<ContentPlan> {
        self.scan(CONTENT_PLANS, |p: &ContentPlan| p.project_id == project_id)?
            .into_iter()
            .next()
            .ok_or(GtmError::ContentPlanNotFound(project_id))
    }

    fn update_plan(&self, plan: &ContentPlan) -> Result<()> {
        self.put(CONTENT_PLANS, plan.id, plan)
    }

    fn delete_plan(&self, id: Uuid) -> Result<()> {
        self.remove(CONTENT_PLANS, id)
    }
}

impl ContentItemRepo for RedbDb {
    fn create_item(&self, item: &ContentItem) -> Result<Uuid> {
        self.put(CONTENT_ITEMS, item.id, item)?;
        Ok(item.id)
    }

    fn items_for_plan(&self, plan_id: Uuid) -> Result<Vec<ContentItem>> {
        self.scan(CONTENT_ITEMS, |i: &ContentItem| i.plan_id == plan_id)
    }

    fn update_item(&self, item: &ContentItem) -> Result<()> {
        self.put(CONTENT_ITEMS, item.id, item)
    }

    fn delete_item(&self, id: Uuid) -> Result<()> {
        self.remove(CONTENT_ITEMS, id)
    }
}

impl EngagementRepo for RedbDb {
    fn create_engagement(&self, engagement: &Engagement) -> Result<Uuid> {
        self.put(ENGAGEMENTS, engagement.id, engagement)?;
        Ok(engagement.id)
    }

    fn engagements_for_item(&self, content_item_id: Uuid) -> Result<Vec<Engagement>> {
        self.scan(ENGAGEMENTS, |e: &Engagement| {
            e.content_item_id == content_item_id
        })
    }

    fn update_engagement(&self, engagement: &Engagement) -> Result<()> {
        self.put(ENGAGEMENTS, engagement.id, engagement)
    }

    fn delete_engagement(&self, id: Uuid) -> Result<()> {
        self.remove(ENGAGEMENTS, id)
    }
}

// ---------------------------------------------------------------------------
// MemoryDb
// ---------------------------------------------------------------------------

/// In-memory twin of [`RedbDb`] for tests and mock runs.
#[derive(Default)]
pub struct MemoryDb {
    projects: Mutex<Vec<Project>>,
    analyses: Mutex<Vec<Analysis>>,
    strategies: Mutex<Vec<Strategy>>,
    plans: Mutex<Vec<ContentPlan>>,
    items: Mutex<Vec<ContentItem>>,
    engagements: Mutex<Vec<Engagement>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectRepo for MemoryDb {
    fn create_project(&self, project: &Project) -> Result<Uuid> {
        self.projects.lock().unwrap().push(project.clone());
        Ok(project.id)
    }

    fn project(&self, id: Uuid) -> Result<Project> {
        self.projects
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(GtmError::ProjectNotFound(id))
    }

    fn projects_by_owner(&self, owner_id: Uuid) -> Result<Vec<Project>> {
        Ok(self
            .projects
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect())
    }

    fn update_project(&self, project: &Project) -> Result<()> {
        let mut projects = self.projects.lock().unwrap();
        let slot = projects
            .iter_mut()
            .find(|p| p.id == project.id)
            .ok_or(GtmError::ProjectNotFound(project.id))?;
        *slot = project.clone();
        Ok(())
    }

    fn delete_project(&self, id: Uuid) -> Result<()> {
        self.projects.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }
}

impl AnalysisRepo for MemoryDb {
    fn create_analysis(&self, analysis: &Analysis) -> Result<Uuid> {
        self.analyses.lock().unwrap().push(analysis.clone());
        Ok(analysis.id)
    }

    fn analysis_for_project(&self, project_id: Uuid) -> Result<Analysis> {
        self.analyses
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.project_id == project_id)
            .cloned()
            .ok_or(GtmError::AnalysisNotFound(project_id))
    }

    fn update_analysis(&self, analysis: &Analysis) -> Result<()> {
        let mut analyses = self.analyses.lock().unwrap();
        if let Some(slot) = analyses.iter_mut().find(|a| a.id == analysis.id) {
            *slot = analysis.clone();
        }
        Ok(())
    }

    fn delete_analysis(&self, id: Uuid) -> Result<()> {
        self.analyses.lock().unwrap().retain(|a| a.id != id);
        Ok(())
    }
}

impl StrategyRepo for MemoryDb {
    fn create_strategy(&self, strategy: &Strategy) -> Result<Uuid> {
        self.strategies.lock().unwrap().push(strategy.clone());
        Ok(strategy.id)
    }

    fn strategy_for_project(&self, project_id: Uuid) -> Result<Strategy> {
        self.strategies
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.project_id == project_id)
            .cloned()
            .ok_or(GtmError::StrategyNotFound(project_id))
    }

    fn update_strategy(&self, strategy: &Strategy) -> Result<()> {
        let mut strategies = self.strategies.lock().unwrap();
        if let Some(slot) = strategies.iter_mut().find(|s| s.id == strategy.id) {
            *slot = strategy.clone();
        }
        Ok(())
    }

    fn delete_strategy(&self, id: Uuid) -> Result<()> {
        self.strategies.lock().unwrap().retain(|s| s.id != id);
        Ok(())
    }
}

impl ContentPlanRepo for MemoryDb {
    fn create_plan(&self, plan: &ContentPlan) -> Result<Uuid> {
        self.plans.lock().unwrap().push(plan.clone());
        Ok(plan.id)
    }

    fn plan_for_project(&self, project_id: Uuid) -> Result<ContentPlan> {
        self.plans
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.project_id == project_id)
            .cloned()
            .ok_or(GtmError::ContentPlanNotFound(project_id))
    }

    fn update_plan(&self, plan: &ContentPlan) -> Result<()> {
        let mut plans = self.plans.lock().unwrap();
        if let Some(slot) = plans.iter_mut().find(|p| p.id == plan.id) {
            *slot = plan.clone();
        }
        Ok(())
    }

    fn delete_plan(&self, id: Uuid) -> Result<()> {
        self.plans.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }
}

impl ContentItemRepo for MemoryDb {
    fn create_item(&self, item: &ContentItem) -> Result<Uuid> {
        self.items.lock().unwrap().push(item.clone());
        Ok(item.id)
    }

    fn items_for_plan(&self, plan_id: Uuid) -> Result<Vec<ContentItem>> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.plan_id == plan_id)
            .cloned()
            .collect())
    }

    fn update_item(&self, item: &ContentItem) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        if let Some(slot) = items.iter_mut().find(|i| i.id == item.id) {
            *slot = item.clone();
        }
        Ok(())
    }

    fn delete_item(&self, id: Uuid) -> Result<()> {
        self.items.lock().unwrap().retain(|i| i.id != id);
        Ok(())
    }
}

impl EngagementRepo for MemoryDb {
    fn create_engagement(&self, engagement: &Engagement) -> Result<Uuid> {
        self.engagements.lock().unwrap().push(engagement.clone());
        Ok(engagement.id)
    }

    fn engagements_for_item(&self, content_item_id: Uuid) -> Result<Vec<Engagement>> {
        Ok(self
            .engagements
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.content_item_id == content_item_id)
            .cloned()
            .collect())
    }

    fn update_engagement(&self, engagement: &Engagement) -> Result<()> {
        let mut engagements = self.engagements.lock().unwrap();
        if let Some(slot) = engagements.iter_mut().find(|e| e.id == engagement.id) {
            *slot = engagement.clone();
        }
        Ok(())
    }

    fn delete_engagement(&self, id: Uuid) -> Result<()> {
        self.engagements.lock().unwrap().retain(|e| e.id != id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_tmp() -> (TempDir, RedbDb) {
        let dir = TempDir::new().unwrap();
        let db = RedbDb::open(&dir.path().join("gtm.redb")).unwrap();
        (dir, db)
    }

    #[test]
    fn project_roundtrip_and_owner_filter() {
        let (_dir, db) = open_tmp();
        let owner = Uuid::new_v4();
        let project = Project::new(owner, "launch", "prd text");
        db.create_project(&project).unwrap();
        db.create_project(&Project::new(Uuid::new_v4(), "other", "x"))
            .unwrap();

        assert_eq!(db.project(project.id).unwrap().name, "launch");
        assert_eq!(db.projects_by_owner(owner).unwrap().len(), 1);
    }

    #[test]
    fn missing_project_is_not_found() {
        let (_dir, db) = open_tmp();
        let id = Uuid::new_v4();
        assert!(matches!(db.project(id), Err(GtmError::ProjectNotFound(got)) if got == id));
    }

    #[test]
    fn analysis_lookup_by_project() {
        let (_dir, db) = open_tmp();
        let project_id = Uuid::new_v4();
        let analysis = Analysis::from_draft(
            project_id,
            crate::ports::AnalysisDraft {
                domain: "Creator SaaS".into(),
                personas: vec![],
                pains: vec![],
                solution_map: vec![],
                competitors: vec![],
            },
        );
        db.create_analysis(&analysis).unwrap();

        assert_eq!(
            db.analysis_for_project(project_id).unwrap().domain,
            "Creator SaaS"
        );
        assert!(matches!(
            db.analysis_for_project(Uuid::new_v4()),
            Err(GtmError::AnalysisNotFound(_))
        ));
    }

    #[test]
    fn update_project_requires_existing_row() {
        let (_dir, db) = open_tmp();
        let project = Project::new(Uuid::new_v4(), "launch", "v1");
        assert!(db.update_project(&project).is_err());

        db.create_project(&project).unwrap();
        let revised = project.with_prd("v2");
        db.update_project(&revised).unwrap();
        assert_eq!(db.project(project.id).unwrap().prd, "v2");
    }

    #[test]
    fn items_filter_by_plan() {
        let (_dir, db) = open_tmp();
        let plan_id = Uuid::new_v4();
        db.create_item(&ContentItem::draft(plan_id, "youtube", "copy a"))
            .unwrap();
        db.create_item(&ContentItem::draft(Uuid::new_v4(), "tiktok", "copy b"))
            .unwrap();

        let items = db.items_for_plan(plan_id).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].channel, "youtube");
    }

    #[test]
    fn memory_db_matches_redb_contract() {
        let db = MemoryDb::new();
        let project = Project::new(Uuid::new_v4(), "launch", "prd");
        db.create_project(&project).unwrap();
        assert_eq!(db.project(project.id).unwrap().id, project.id);
        db.delete_project(project.id).unwrap();
        assert!(db.project(project.id).is_err());
    }
}
