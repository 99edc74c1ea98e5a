// Errors surfaced by the use cases
use crate::application::sensor_gateway::UpstreamError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("instrument {0} not found")]
    InstrumentNotFound(String),

    #[error("project {0} not found")]
    ProjectNotFound(i64),

    #[error("not authorized")]
    Unauthorized,

    #[error("access to project {0} denied")]
    Forbidden(i64),

    #[error("{0}")]
    Unsupported(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("malformed upstream payload: {0}")]
    Decode(String),

    #[error(transparent)]
    Repository(#[from] anyhow::Error),
}
