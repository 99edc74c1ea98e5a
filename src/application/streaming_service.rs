// Streaming dashboard service - Progressive loading of a project's vibration charts
use crate::application::error::ServiceError;
use crate::application::monitor_repository::InstrumentRepository;
use crate::application::sensor_gateway::TimeWindow;
use crate::application::vibration_service::{VibrationReport, VibrationService};
use crate::domain::project::InstrumentPin;
use crate::domain::session::Session;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardMessage {
    Skeleton {
        project_id: i64,
        name: String,
        instruments: Vec<InstrumentPin>,
    },
    Instrument {
        report: Box<VibrationReport>,
    },
    InstrumentError {
        instrument_id: String,
        error: String,
    },
    Complete {
        widgets: usize,
        duration_ms: u64,
    },
}

#[derive(Clone)]
pub struct StreamingDashboardService {
    repository: Arc<dyn InstrumentRepository>,
    vibration: VibrationService,
}

impl StreamingDashboardService {
    pub fn new(repository: Arc<dyn InstrumentRepository>, vibration: VibrationService) -> Self {
        Self {
            repository,
            vibration,
        }
    }

    /// Send the skeleton immediately, then one message per instrument as its
    /// report finishes, then a completion event once every task is done.
    pub async fn stream_project(
        &self,
        session: &Session,
        project_id: i64,
        window: TimeWindow,
    ) -> Result<mpsc::Receiver<DashboardMessage>, ServiceError> {
        if !session.permissions.can_view_project(project_id) {
            return Err(ServiceError::Forbidden(project_id));
        }

        let project = self
            .repository
            .list_projects()
            .await?
            .into_iter()
            .find(|p| p.id == project_id)
            .ok_or(ServiceError::ProjectNotFound(project_id))?;

        let instruments: Vec<_> = self
            .repository
            .list_instruments(Some(project_id))
            .await?
            .into_iter()
            .filter(|i| i.sensor_type.is_vibration())
            .collect();

        let (tx, rx) = mpsc::channel(100);
        let start_time = Instant::now();

        let skeleton = DashboardMessage::Skeleton {
            project_id,
            name: project.name,
            instruments: instruments
                .iter()
                .map(|i| InstrumentPin {
                    instrument_id: i.instrument_id.clone(),
                    name: i.display_name().to_string(),
                    sensor_type: i.sensor_type,
                    position: i.position(),
                })
                .collect(),
        };
        let _ = tx.send(skeleton).await;

        let widgets = instruments.len();
        let mut tasks = JoinSet::new();
        for instrument in instruments {
            let tx = tx.clone();
            let vibration = self.vibration.clone();
            let window = window.clone();

            tasks.spawn(async move {
                let msg = match vibration.report_for(&instrument, &window).await {
                    Ok(report) => DashboardMessage::Instrument {
                        report: Box::new(report),
                    },
                    Err(e) => {
                        tracing::warn!("Dashboard report for {} failed: {}", instrument.instrument_id, e);
                        DashboardMessage::InstrumentError {
                            instrument_id: instrument.instrument_id.clone(),
                            error: e.to_string(),
                        }
                    }
                };
                let _ = tx.send(msg).await;
            });
        }

        tokio::spawn(async move {
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    tracing::error!("Dashboard task panicked: {}", e);
                }
            }

            let duration_ms = start_time.elapsed().as_millis() as u64;
            tracing::debug!("Project {} dashboard finished in {}ms", project_id, duration_ms);
            let _ = tx
                .send(DashboardMessage::Complete {
                    widgets,
                    duration_ms,
                })
                .await;
        });

        Ok(rx)
    }
}

impl DashboardMessage {
    pub fn is_complete(&self) -> bool {
        matches!(self, DashboardMessage::Complete { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fakes::{instrument, FakeGateway, FakeRepository};
    use crate::application::vibration_service::ChartSettings;
    use crate::domain::overlay::OverlayStyle;
    use crate::domain::project::Project;
    use crate::domain::session::{Permissions, User};
    use futures::StreamExt;
    use tokio_stream::wrappers::ReceiverStream;

    fn admin() -> Session {
        Session {
            user: User {
                id: "admin".into(),
                email: None,
            },
            permissions: Permissions {
                admin: true,
                project_ids: vec![],
            },
        }
    }

    fn service() -> StreamingDashboardService {
        let repository: Arc<dyn InstrumentRepository> = Arc::new(FakeRepository {
            projects: vec![Project {
                id: 1,
                name: "Tunnel".into(),
            }],
            instruments: vec![
                instrument("SMG-1", 1, "seismograph"),
                instrument("SMG-2", 1, "seismograph"),
                instrument("TLT-1", 1, "tiltmeter"),
            ],
            ..Default::default()
        });
        let gateway = FakeGateway::default().with_body(
            "/devices/dev-SMG-1/data/background",
            r#"{"data": [["2024-01-01T00:00:00", 0.1, 0.2, 0.3]]}"#,
        );
        let vibration = VibrationService::new(
            repository.clone(),
            Arc::new(gateway),
            ChartSettings {
                max_points: 500,
                overlay: OverlayStyle::Lines,
            },
        );
        StreamingDashboardService::new(repository, vibration)
    }

    #[tokio::test]
    async fn test_stream_order() {
        let rx = service()
            .stream_project(&admin(), 1, TimeWindow::default())
            .await
            .unwrap();
        let messages: Vec<DashboardMessage> = ReceiverStream::new(rx).collect().await;

        assert_eq!(messages.len(), 4);
        match &messages[0] {
            DashboardMessage::Skeleton { instruments, .. } => assert_eq!(instruments.len(), 2),
            other => panic!("expected skeleton, got {:?}", other),
        }
        assert!(messages[3].is_complete());

        let ok = messages
            .iter()
            .filter(|m| matches!(m, DashboardMessage::Instrument { .. }))
            .count();
        let failed = messages
            .iter()
            .filter(|m| matches!(m, DashboardMessage::InstrumentError { .. }))
            .count();
        // SMG-2 has no canned upstream body
        assert_eq!((ok, failed), (1, 1));
    }

    #[tokio::test]
    async fn test_unknown_project() {
        let err = service()
            .stream_project(&admin(), 9, TimeWindow::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ProjectNotFound(9)));
    }

    #[tokio::test]
    async fn test_forbidden_project() {
        let mut session = admin();
        session.permissions.admin = false;
        let err = service()
            .stream_project(&session, 1, TimeWindow::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(1)));
    }
}
