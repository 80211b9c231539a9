use crate::state::{Stage, StateKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GtmError {
    #[error("transport failure calling {capability}: {detail}")]
    Transport { capability: String, detail: String },

    #[error("{stage} stage returned an unparseable response: {detail}")]
    ResponseShape { stage: Stage, detail: String },

    #[error("{stage} stage wrote key '{key}' it does not own")]
    OwnershipViolation { stage: Stage, key: StateKey },

    #[error("{stage} stage attempted to overwrite already-written key '{key}'")]
    DuplicateWrite { stage: Stage, key: StateKey },

    #[error("project not found: {0}")]
    ProjectNotFound(uuid::Uuid),

    #[error("no analysis exists for project {0}")]
    AnalysisNotFound(uuid::Uuid),

    #[error("no strategy exists for project {0}")]
    StrategyNotFound(uuid::Uuid),

    #[error("no content plan exists for project {0}")]
    ContentPlanNotFound(uuid::Uuid),

    #[error("content item {0} has no external post id")]
    NotPublished(uuid::Uuid),

    #[error("no engagement metrics recorded for project {0}")]
    EngagementsNotFound(uuid::Uuid),

    #[error("workflow state missing for project {0}")]
    WorkflowNotFound(uuid::Uuid),

    #[error("invalid {what}: {value}")]
    InvalidEnum { what: &'static str, value: String },

    #[error("config file not found at {0}")]
    ConfigNotFound(String),

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error("event store error: {0}")]
    Store(String),

    #[error(transparent)]
    Llm(#[from] llm_client::LlmError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GtmError>;
