// Repository traits for project metadata and identity
use crate::domain::project::{Instrument, Project};
use crate::domain::session::{PermissionGrant, User};
use async_trait::async_trait;

#[async_trait]
pub trait InstrumentRepository: Send + Sync {
    async fn list_projects(&self) -> anyhow::Result<Vec<Project>>;

    /// All instruments, or only those of one project
    async fn list_instruments(&self, project_id: Option<i64>) -> anyhow::Result<Vec<Instrument>>;

    async fn get_instrument(&self, instrument_id: &str) -> anyhow::Result<Option<Instrument>>;

    async fn permission_grants(&self, user_id: &str) -> anyhow::Result<Vec<PermissionGrant>>;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer token to its user; `None` when the token is rejected
    async fn user_for_token(&self, token: &str) -> anyhow::Result<Option<User>>;
}
