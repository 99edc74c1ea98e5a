// In-memory test doubles for the repository and gateway traits
use crate::application::monitor_repository::{IdentityProvider, InstrumentRepository};
use crate::application::sensor_gateway::{SensorGateway, UpstreamBody, UpstreamError, UpstreamRoute};
use crate::domain::project::{Instrument, Project};
use crate::domain::session::{PermissionGrant, User};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Serves canned bodies keyed by upstream path; unknown paths answer 404.
#[derive(Default)]
pub struct FakeGateway {
    bodies: HashMap<String, String>,
    failing: HashMap<String, u16>,
    pub calls: Mutex<Vec<UpstreamRoute>>,
}

impl FakeGateway {
    pub fn with_body(mut self, path: &str, body: &str) -> Self {
        self.bodies.insert(path.to_string(), body.to_string());
        self
    }

    pub fn with_status(mut self, path: &str, status: u16) -> Self {
        self.failing.insert(path.to_string(), status);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SensorGateway for FakeGateway {
    async fn fetch(&self, route: &UpstreamRoute) -> Result<UpstreamBody, UpstreamError> {
        self.calls.lock().unwrap().push(route.clone());
        let path = route.path();
        if let Some(status) = self.failing.get(&path) {
            return Err(UpstreamError::Status {
                status: *status,
                message: "unavailable".to_string(),
            });
        }
        match self.bodies.get(&path) {
            Some(body) => Ok(UpstreamBody {
                content_type: Some("application/json".to_string()),
                body: Bytes::from(body.clone()),
            }),
            None => Err(UpstreamError::Status {
                status: 404,
                message: format!("no such path {}", path),
            }),
        }
    }
}

#[derive(Default)]
pub struct FakeRepository {
    pub projects: Vec<Project>,
    pub instruments: Vec<Instrument>,
    pub grants: Vec<PermissionGrant>,
}

#[async_trait]
impl InstrumentRepository for FakeRepository {
    async fn list_projects(&self) -> anyhow::Result<Vec<Project>> {
        Ok(self.projects.clone())
    }

    async fn list_instruments(&self, project_id: Option<i64>) -> anyhow::Result<Vec<Instrument>> {
        Ok(self
            .instruments
            .iter()
            .filter(|i| project_id.is_none_or(|p| i.project_id == p))
            .cloned()
            .collect())
    }

    async fn get_instrument(&self, instrument_id: &str) -> anyhow::Result<Option<Instrument>> {
        Ok(self
            .instruments
            .iter()
            .find(|i| i.instrument_id == instrument_id)
            .cloned())
    }

    async fn permission_grants(&self, user_id: &str) -> anyhow::Result<Vec<PermissionGrant>> {
        Ok(self
            .grants
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect())
    }
}

/// Accepts a set of tokens, which tests may revoke, and counts lookups.
#[derive(Default)]
pub struct FakeIdentity {
    pub users: Mutex<HashMap<String, User>>,
    pub lookups: AtomicUsize,
}

impl FakeIdentity {
    pub fn with_user(mut self, token: &str, user_id: &str) -> Self {
        self.users.get_mut().unwrap().insert(
            token.to_string(),
            User {
                id: user_id.to_string(),
                email: Some(format!("{}@example.com", user_id)),
            },
        );
        self
    }

    pub fn revoke(&self, token: &str) {
        self.users.lock().unwrap().remove(token);
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn user_for_token(&self, token: &str) -> anyhow::Result<Option<User>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.lock().unwrap().get(token).cloned())
    }
}

pub fn instrument(id: &str, project_id: i64, sensor_type: &str) -> Instrument {
    serde_json::from_value(serde_json::json!({
        "instrument_id": id,
        "instrument_name": format!("{} name", id),
        "instrument_location": "45.5, -73.6",
        "project_id": project_id,
        "sensor_type": sensor_type,
        "syscom_device_id": format!("dev-{}", id),
        "alert_value": 0.8,
    }))
    .unwrap()
}

pub fn grant(user_id: &str, project_id: i64) -> PermissionGrant {
    PermissionGrant {
        user_id: user_id.to_string(),
        project_id: Some(project_id),
        is_admin: false,
    }
}
