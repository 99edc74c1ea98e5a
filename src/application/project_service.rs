// Project service - Map markers for the projects a session may see
use crate::application::error::ServiceError;
use crate::application::monitor_repository::InstrumentRepository;
use crate::domain::project::{build_markers, Project, ProjectMarker};
use crate::domain::session::Session;
use std::sync::Arc;

#[derive(Clone)]
pub struct ProjectService {
    repository: Arc<dyn InstrumentRepository>,
}

impl ProjectService {
    pub fn new(repository: Arc<dyn InstrumentRepository>) -> Self {
        Self { repository }
    }

    pub async fn map_markers(&self, session: &Session) -> Result<Vec<ProjectMarker>, ServiceError> {
        let projects: Vec<Project> = self
            .repository
            .list_projects()
            .await?
            .into_iter()
            .filter(|p| session.permissions.can_view_project(p.id))
            .collect();

        if projects.is_empty() {
            return Ok(Vec::new());
        }

        let instruments = self.repository.list_instruments(None).await?;
        let markers = build_markers(&projects, &instruments);

        tracing::debug!(
            "Built {} map markers for user {}",
            markers.len(),
            session.user.id
        );
        Ok(markers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fakes::{instrument, FakeRepository};
    use crate::domain::session::{Permissions, User};

    fn repository() -> Arc<FakeRepository> {
        Arc::new(FakeRepository {
            projects: vec![
                Project { id: 1, name: "Tunnel".into() },
                Project { id: 2, name: "Bridge".into() },
            ],
            instruments: vec![
                instrument("SMG-1", 1, "seismograph"),
                instrument("SMG-2", 2, "seismograph"),
                instrument("SMG-3", 2, "micromate"),
            ],
            ..Default::default()
        })
    }

    fn session(admin: bool, project_ids: Vec<i64>) -> Session {
        Session {
            user: User { id: "u1".into(), email: None },
            permissions: Permissions { admin, project_ids },
        }
    }

    #[tokio::test]
    async fn test_markers_filtered_by_permission() {
        let service = ProjectService::new(repository());
        let markers = service.map_markers(&session(false, vec![2])).await.unwrap();

        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].name, "Bridge");
        assert_eq!(markers[0].instruments.len(), 2);
        assert_eq!(markers[0].route.len(), 2);
    }

    #[tokio::test]
    async fn test_admin_sees_all_projects() {
        let service = ProjectService::new(repository());
        let markers = service.map_markers(&session(true, vec![])).await.unwrap();
        assert_eq!(markers.len(), 2);
    }

    #[tokio::test]
    async fn test_no_access_no_markers() {
        let service = ProjectService::new(repository());
        assert!(service.map_markers(&session(false, vec![])).await.unwrap().is_empty());
    }
}
