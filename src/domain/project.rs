// Projects, instruments and their map markers
use crate::domain::thresholds::Thresholds;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Seismograph,
    Micromate,
    Um16368,
    Tiltmeter,
    #[serde(other)]
    Other,
}

impl SensorKind {
    pub fn is_vibration(&self) -> bool {
        matches!(self, SensorKind::Seismograph | SensorKind::Micromate | SensorKind::Um16368)
    }
}

/// A row of the `instruments` table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Instrument {
    pub instrument_id: String,
    #[serde(default)]
    pub instrument_name: Option<String>,
    #[serde(default)]
    pub instrument_location: Option<String>,
    pub project_id: i64,
    #[serde(default = "default_kind")]
    pub sensor_type: SensorKind,
    #[serde(default)]
    pub syscom_device_id: Option<String>,
    #[serde(default)]
    pub alert_value: Option<f64>,
    #[serde(default)]
    pub warning_value: Option<f64>,
    #[serde(default)]
    pub shutdown_value: Option<f64>,
}

fn default_kind() -> SensorKind {
    SensorKind::Other
}

impl Instrument {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds::new(self.alert_value, self.warning_value, self.shutdown_value)
    }

    pub fn display_name(&self) -> &str {
        self.instrument_name.as_deref().unwrap_or(&self.instrument_id)
    }

    pub fn position(&self) -> Option<LatLng> {
        self.instrument_location.as_deref().and_then(LatLng::parse)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Parse `"lat, lng"`. Out-of-range coordinates are rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let (lat, lng) = s.split_once(',')?;
        let lat = lat.trim().parse::<f64>().ok()?;
        let lng = lng.trim().parse::<f64>().ok()?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return None;
        }
        Some(Self { lat, lng })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentPin {
    pub instrument_id: String,
    pub name: String,
    pub sensor_type: SensorKind,
    pub position: Option<LatLng>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectMarker {
    pub project_id: i64,
    pub name: String,
    pub position: Option<LatLng>,
    pub instruments: Vec<InstrumentPin>,
    pub route: Vec<LatLng>,
}

/// Group instruments under their projects. The marker sits at the centroid of
/// the instruments that have a location; the route joins them in listing order.
pub fn build_markers(projects: &[Project], instruments: &[Instrument]) -> Vec<ProjectMarker> {
    let mut by_project: BTreeMap<i64, Vec<&Instrument>> = BTreeMap::new();
    for instrument in instruments {
        by_project.entry(instrument.project_id).or_default().push(instrument);
    }

    projects
        .iter()
        .map(|project| {
            let members = by_project.remove(&project.id).unwrap_or_default();
            let pins: Vec<InstrumentPin> = members
                .iter()
                .map(|i| InstrumentPin {
                    instrument_id: i.instrument_id.clone(),
                    name: i.display_name().to_string(),
                    sensor_type: i.sensor_type,
                    position: i.position(),
                })
                .collect();
            let route: Vec<LatLng> = pins.iter().filter_map(|p| p.position).collect();

            ProjectMarker {
                project_id: project.id,
                name: project.name.clone(),
                position: centroid(&route),
                instruments: pins,
                route,
            }
        })
        .collect()
}

fn centroid(points: &[LatLng]) -> Option<LatLng> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    Some(LatLng {
        lat: points.iter().map(|p| p.lat).sum::<f64>() / n,
        lng: points.iter().map(|p| p.lng).sum::<f64>() / n,
    })
}
