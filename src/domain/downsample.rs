// Hour-bucketed downsampling that keeps threshold violations
use crate::domain::reading::{Axis, Sample};
use crate::domain::thresholds::Thresholds;
use serde::Serialize;
use std::collections::HashMap;

pub const DEFAULT_MAX_POINTS: usize = 500;

/// Magnitudes at or below this are treated as "no reading" for a series.
pub const EPSILON: f64 = 1e-4;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CombinedSeries {
    pub time: Vec<String>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

impl CombinedSeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn values(&self, axis: Axis) -> &[f64] {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AxisSeries {
    pub time: Vec<String>,
    pub values: Vec<f64>,
}

impl AxisSeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DownsampledSeries {
    pub combined: CombinedSeries,
    pub x: AxisSeries,
    pub y: AxisSeries,
    pub z: AxisSeries,
}

impl DownsampledSeries {
    pub fn axis(&self, axis: Axis) -> &AxisSeries {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}

/// Whether any axis of the sample meets or exceeds a configured threshold.
pub fn is_violation(sample: &Sample, thresholds: &Thresholds) -> bool {
    Axis::ALL
        .iter()
        .any(|&axis| thresholds.is_exceeded_by(sample.axis(axis).abs()))
}

/// The pre-stride selection: the peak sample of every `date-hour` bucket plus
/// every threshold violation, de-duplicated by timestamp string (keeping the
/// louder row) and sorted by time. Samples with equal instants keep their input
/// order.
pub fn select_rows<'a>(samples: &'a [Sample], thresholds: &Thresholds) -> Vec<&'a Sample> {
    let mut peaks: HashMap<String, usize> = HashMap::new();
    for (idx, sample) in samples.iter().enumerate() {
        peaks
            .entry(sample.time.hour_bucket())
            .and_modify(|best| {
                if sample.peak_magnitude() > samples[*best].peak_magnitude() {
                    *best = idx;
                }
            })
            .or_insert(idx);
    }

    let mut keep: Vec<usize> = peaks
        .into_values()
        .chain(
            samples
                .iter()
                .enumerate()
                .filter(|(_, s)| is_violation(s, thresholds))
                .map(|(idx, _)| idx),
        )
        .collect();
    keep.sort_unstable();
    keep.dedup();
    keep.sort_by(|&a, &b| {
        samples[a]
            .time
            .naive()
            .cmp(&samples[b].time.naive())
            .then(a.cmp(&b))
    });

    // One row per timestamp string; the louder row wins, ties keep the earlier one.
    let mut winners: HashMap<&str, usize> = HashMap::new();
    for &idx in &keep {
        winners
            .entry(samples[idx].time.as_str())
            .and_modify(|best| {
                if samples[idx].peak_magnitude() > samples[*best].peak_magnitude() {
                    *best = idx;
                }
            })
            .or_insert(idx);
    }

    keep.into_iter()
        .filter(|idx| winners.get(samples[*idx].time.as_str()) == Some(idx))
        .map(|idx| &samples[idx])
        .collect()
}

/// Reduce raw samples to chart-sized series.
///
/// The combined series holds every selected row with at least one readable
/// axis above [`EPSILON`]. Each single-axis series holds the selected rows
/// whose own axis is above [`EPSILON`], strided down to roughly `max_points`
/// when longer. Violations are merged back after striding so that no
/// threshold crossing disappears from an axis chart.
pub fn downsample(samples: &[Sample], thresholds: &Thresholds, max_points: usize) -> DownsampledSeries {
    let selected = select_rows(samples, thresholds);

    let mut combined = CombinedSeries::default();
    for sample in selected
        .iter()
        .filter(|s| Axis::ALL.iter().any(|&a| s.axis(a).abs() > EPSILON))
    {
        combined.time.push(sample.time.as_str().to_string());
        combined.x.push(round3(sample.x));
        combined.y.push(round3(sample.y));
        combined.z.push(round3(sample.z));
    }

    DownsampledSeries {
        combined,
        x: axis_series(&selected, Axis::X, thresholds, max_points),
        y: axis_series(&selected, Axis::Y, thresholds, max_points),
        z: axis_series(&selected, Axis::Z, thresholds, max_points),
    }
}

fn axis_series(selected: &[&Sample], axis: Axis, thresholds: &Thresholds, max_points: usize) -> AxisSeries {
    let readable: Vec<&Sample> = selected
        .iter()
        .copied()
        .filter(|s| s.axis(axis).abs() > EPSILON)
        .collect();

    let stride = if max_points > 0 && readable.len() > max_points {
        readable.len() / max_points
    } else {
        1
    };

    let mut series = AxisSeries::default();
    for (idx, sample) in readable.into_iter().enumerate() {
        if idx % stride == 0 || is_violation(sample, thresholds) {
            series.time.push(sample.time.as_str().to_string());
            series.values.push(round3(sample.axis(axis)));
        }
    }

    tracing::trace!(axis = axis.label(), points = series.len(), stride, "Built axis series");
    series
}

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
