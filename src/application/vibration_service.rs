// Vibration service - Fetch an instrument's readings and shape them into charts
use crate::application::error::ServiceError;
use crate::application::monitor_repository::InstrumentRepository;
use crate::application::sensor_gateway::{ReadingsDevice, SensorGateway, TimeWindow, UpstreamRoute};
use crate::domain::chart::{ChartSeries, LineChart};
use crate::domain::downsample::{downsample, round3};
use crate::domain::overlay::OverlayStyle;
use crate::domain::project::{Instrument, SensorKind};
use crate::domain::reading::{
    to_samples, Axis, MicromateReading, Reading, Sample, SeismographRow, Um16368Reading,
};
use crate::domain::session::Session;
use crate::domain::thresholds::Thresholds;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct ChartSettings {
    pub max_points: usize,
    pub overlay: OverlayStyle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AxisPeaks {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VibrationReport {
    pub instrument_id: String,
    pub name: String,
    pub sensor_type: SensorKind,
    pub thresholds: Thresholds,
    pub sample_count: usize,
    pub peaks: AxisPeaks,
    pub combined: LineChart,
    pub x: LineChart,
    pub y: LineChart,
    pub z: LineChart,
}

#[derive(Deserialize)]
struct BackgroundResponse {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

#[derive(Clone)]
pub struct VibrationService {
    repository: Arc<dyn InstrumentRepository>,
    gateway: Arc<dyn SensorGateway>,
    settings: ChartSettings,
}

impl VibrationService {
    pub fn new(
        repository: Arc<dyn InstrumentRepository>,
        gateway: Arc<dyn SensorGateway>,
        settings: ChartSettings,
    ) -> Self {
        Self {
            repository,
            gateway,
            settings,
        }
    }

    pub async fn report(
        &self,
        session: &Session,
        instrument_id: &str,
        window: &TimeWindow,
    ) -> Result<VibrationReport, ServiceError> {
        let instrument = self
            .repository
            .get_instrument(instrument_id)
            .await?
            .ok_or_else(|| ServiceError::InstrumentNotFound(instrument_id.to_string()))?;

        if !session.permissions.can_view_project(instrument.project_id) {
            return Err(ServiceError::Forbidden(instrument.project_id));
        }

        self.report_for(&instrument, window).await
    }

    /// Build the report for an already-authorized instrument.
    pub async fn report_for(
        &self,
        instrument: &Instrument,
        window: &TimeWindow,
    ) -> Result<VibrationReport, ServiceError> {
        let readings = self.fetch_readings(instrument, window).await?;
        let samples = to_samples(&readings);

        let report = build_report(instrument, &samples, self.settings);
        tracing::debug!(
            "Instrument {}: {} readings, {} usable samples, {} plotted points",
            instrument.instrument_id,
            readings.len(),
            samples.len(),
            report.combined.point_count()
        );

        Ok(report)
    }

    async fn fetch_readings(
        &self,
        instrument: &Instrument,
        window: &TimeWindow,
    ) -> Result<Vec<Reading>, ServiceError> {
        match instrument.sensor_type {
            SensorKind::Seismograph => {
                let device_id = instrument.syscom_device_id.clone().ok_or_else(|| {
                    ServiceError::Unsupported(format!(
                        "instrument {} has no Syscom device",
                        instrument.instrument_id
                    ))
                })?;
                let route = UpstreamRoute::Background {
                    device_id,
                    window: window.clone(),
                };
                let body = self.gateway.fetch(&route).await?;
                let response: BackgroundResponse = serde_json::from_slice(&body.body)
                    .map_err(|e| ServiceError::Decode(e.to_string()))?;
                Ok(parse_rows::<SeismographRow>(response.data)
                    .into_iter()
                    .map(Reading::Seismograph)
                    .collect())
            }
            SensorKind::Micromate => {
                let values = self
                    .fetch_device_readings(ReadingsDevice::Micromate, instrument, window)
                    .await?;
                Ok(parse_rows::<MicromateReading>(values)
                    .into_iter()
                    .map(Reading::Micromate)
                    .collect())
            }
            SensorKind::Um16368 => {
                let values = self
                    .fetch_device_readings(ReadingsDevice::Um16368, instrument, window)
                    .await?;
                Ok(parse_rows::<Um16368Reading>(values)
                    .into_iter()
                    .map(Reading::Um16368)
                    .collect())
            }
            other => Err(ServiceError::Unsupported(format!(
                "sensor type {:?} has no vibration data",
                other
            ))),
        }
    }

    async fn fetch_device_readings(
        &self,
        device: ReadingsDevice,
        instrument: &Instrument,
        window: &TimeWindow,
    ) -> Result<Vec<serde_json::Value>, ServiceError> {
        let route = UpstreamRoute::Readings {
            device,
            instrument_id: instrument.instrument_id.clone(),
            window: window.clone(),
        };
        let body = self.gateway.fetch(&route).await?;
        let mut envelope: serde_json::Map<String, serde_json::Value> =
            serde_json::from_slice(&body.body).map_err(|e| ServiceError::Decode(e.to_string()))?;

        match envelope.remove(device.response_key()) {
            Some(serde_json::Value::Array(values)) => Ok(values),
            Some(_) => Err(ServiceError::Decode(format!(
                "{} is not an array",
                device.response_key()
            ))),
            None => Ok(Vec::new()),
        }
    }
}

/// Deserialize each row independently so one malformed row does not sink the batch.
fn parse_rows<T: DeserializeOwned>(values: Vec<serde_json::Value>) -> Vec<T> {
    let total = values.len();
    let rows: Vec<T> = values
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();
    if rows.len() < total {
        tracing::debug!("Skipped {} malformed rows", total - rows.len());
    }
    rows
}

fn axis_color(axis: Axis) -> &'static str {
    match axis {
        Axis::X => "#1f77b4",
        Axis::Y => "#2ca02c",
        Axis::Z => "#9467bd",
    }
}

fn peak(samples: &[Sample], axis: Axis) -> Option<f64> {
    samples
        .iter()
        .map(|s| s.axis(axis).abs())
        .filter(|v| v.is_finite())
        .reduce(f64::max)
        .map(round3)
}

pub fn build_report(instrument: &Instrument, samples: &[Sample], settings: ChartSettings) -> VibrationReport {
    let thresholds = instrument.thresholds();
    let series = downsample(samples, &thresholds, settings.max_points);
    let name = instrument.display_name().to_string();

    let combined_series = Axis::ALL
        .iter()
        .map(|&axis| {
            ChartSeries::new(
                axis.label(),
                Some(axis_color(axis)),
                series.combined.time.clone(),
                series.combined.values(axis).to_vec(),
            )
        })
        .collect();
    let combined = LineChart::build(name.clone(), combined_series, &thresholds, settings.overlay);

    let axis_chart = |axis: Axis| {
        let axis_series = series.axis(axis);
        LineChart::build(
            format!("{} {}", name, axis.label()),
            vec![ChartSeries::new(
                axis.label(),
                Some(axis_color(axis)),
                axis_series.time.clone(),
                axis_series.values.clone(),
            )],
            &thresholds,
            settings.overlay,
        )
    };

    VibrationReport {
        instrument_id: instrument.instrument_id.clone(),
        name: name.clone(),
        sensor_type: instrument.sensor_type,
        thresholds,
        sample_count: samples.len(),
        peaks: AxisPeaks {
            x: peak(samples, Axis::X),
            y: peak(samples, Axis::Y),
            z: peak(samples, Axis::Z),
        },
        x: axis_chart(Axis::X),
        y: axis_chart(Axis::Y),
        z: axis_chart(Axis::Z),
        combined,
    }
}
