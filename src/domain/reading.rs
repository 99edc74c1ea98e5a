// Sensor readings from the different instrument families, and the common Sample shape
use crate::domain::timestamp::WallClock;
use serde::{Deserialize, Deserializer, Serialize};

/// One vibration reading on three axes.
///
/// Axis values that could not be read as numbers are `NaN`; every consumer
/// relies on NaN comparisons being false to exclude them.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub time: WallClock,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Sample {
    pub fn new(time: WallClock, x: f64, y: f64, z: f64) -> Self {
        Self { time, x, y, z }
    }

    /// Largest axis magnitude, treating unreadable axes as 0.
    pub fn peak_magnitude(&self) -> f64 {
        [self.x, self.y, self.z]
            .into_iter()
            .map(|v| if v.is_nan() { 0.0 } else { v.abs() })
            .fold(0.0, f64::max)
    }

    pub fn axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn label(&self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }
}

/// Seismograph row as delivered by the Syscom background-data endpoint:
/// `[timestamp, x, y, z]`.
#[derive(Debug, Clone, Deserialize)]
pub struct SeismographRow(
    pub String,
    #[serde(deserialize_with = "lenient_f64")] pub f64,
    #[serde(deserialize_with = "lenient_f64")] pub f64,
    #[serde(deserialize_with = "lenient_f64")] pub f64,
);

/// Micromate reading. Longitudinal, transverse and vertical map to x, y, z.
#[derive(Debug, Clone, Deserialize)]
pub struct MicromateReading {
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Longitudinal", alias = "Longitudinal_PPV", default = "nan", deserialize_with = "lenient_f64")]
    pub longitudinal: f64,
    #[serde(rename = "Transverse", alias = "Transverse_PPV", default = "nan", deserialize_with = "lenient_f64")]
    pub transverse: f64,
    #[serde(rename = "Vertical", alias = "Vertical_PPV", default = "nan", deserialize_with = "lenient_f64")]
    pub vertical: f64,
    #[serde(rename = "Frequency", default, deserialize_with = "lenient_opt_f64")]
    pub frequency: Option<f64>,
    #[serde(rename = "Metric", default)]
    pub metric: Option<String>,
}

/// Instantel UM16368 reading. Transverse, vertical and longitudinal PPV map to
/// y, z and x so the axes line up with the Micromate family.
#[derive(Debug, Clone, Deserialize)]
pub struct Um16368Reading {
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Long_PPV", alias = "Longitudinal_PPV", default = "nan", deserialize_with = "lenient_f64")]
    pub longitudinal: f64,
    #[serde(rename = "Tran_PPV", alias = "Transverse_PPV", default = "nan", deserialize_with = "lenient_f64")]
    pub transverse: f64,
    #[serde(rename = "Vert_PPV", alias = "Vertical_PPV", default = "nan", deserialize_with = "lenient_f64")]
    pub vertical: f64,
    #[serde(rename = "Geophone_PVS", default, deserialize_with = "lenient_opt_f64")]
    pub geophone_pvs: Option<f64>,
}

#[derive(Debug, Clone)]
pub enum Reading {
    Seismograph(SeismographRow),
    Micromate(MicromateReading),
    Um16368(Um16368Reading),
}

impl Reading {
    fn timestamp(&self) -> &str {
        match self {
            Reading::Seismograph(row) => &row.0,
            Reading::Micromate(r) => &r.time,
            Reading::Um16368(r) => &r.time,
        }
    }

    /// Adapt to the common sample shape. Readings whose timestamp cannot be
    /// parsed cannot be bucketed and are dropped.
    pub fn to_sample(&self) -> Option<Sample> {
        let time = match WallClock::parse(self.timestamp()) {
            Ok(time) => time,
            Err(e) => {
                tracing::debug!("Dropping reading with unparseable time: {}", e);
                return None;
            }
        };

        let (x, y, z) = match self {
            Reading::Seismograph(row) => (row.1, row.2, row.3),
            Reading::Micromate(r) => (r.longitudinal, r.transverse, r.vertical),
            Reading::Um16368(r) => (r.longitudinal, r.transverse, r.vertical),
        };

        Some(Sample::new(time, x, y, z))
    }
}

pub fn to_samples(readings: &[Reading]) -> Vec<Sample> {
    readings.iter().filter_map(Reading::to_sample).collect()
}

fn nan() -> f64 {
    f64::NAN
}

/// Coerce a JSON value to a float the way a browser would: numbers pass,
/// numeric strings are parsed, everything else becomes NaN.
fn coerce(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        serde_json::Value::String(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce(&value))
}

fn lenient_opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let n = coerce(&value);
    Ok(if n.is_nan() { None } else { Some(n) })
}
