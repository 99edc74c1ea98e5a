// Chart payloads handed to the dashboard's charting layer
use crate::domain::overlay::{threshold_overlay, Annotation, OverlayStyle, Shape};
use crate::domain::thresholds::Thresholds;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl Default for AxisRange {
    fn default() -> Self {
        Self { min: -0.1, max: 0.1 }
    }
}

/// Padded y-axis range that always leaves room for the threshold lines.
///
/// Non-finite values are ignored. With nothing to plot the range is `±0.1`.
pub fn axis_range(values: &[f64], thresholds: &Thresholds) -> AxisRange {
    let mut finite = values.iter().copied().filter(|v| v.is_finite()).peekable();
    if finite.peek().is_none() {
        return AxisRange::default();
    }

    let (min_value, max_value) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    let padding = ((max_value - min_value) * 0.2).max(0.01);
    let threshold_max = thresholds.max();

    AxisRange {
        min: (min_value - padding).min(-threshold_max * 1.2),
        max: (max_value + padding).max(threshold_max * 1.2),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub color: Option<String>,
    pub time: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn new(name: impl Into<String>, color: Option<&str>, time: Vec<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            color: color.map(str::to_string),
            time,
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub title: String,
    pub series: Vec<ChartSeries>,
    pub y_range: AxisRange,
    pub shapes: Vec<Shape>,
    pub annotations: Vec<Annotation>,
}

impl LineChart {
    /// Assemble a chart whose range covers every series and the thresholds.
    pub fn build(
        title: impl Into<String>,
        series: Vec<ChartSeries>,
        thresholds: &Thresholds,
        style: OverlayStyle,
    ) -> Self {
        let values: Vec<f64> = series.iter().flat_map(|s| s.values.iter().copied()).collect();
        let y_range = axis_range(&values, thresholds);
        let overlay = threshold_overlay(thresholds, style, y_range);

        Self {
            title: title.into(),
            series,
            y_range,
            shapes: overlay.shapes,
            annotations: overlay.annotations,
        }
    }

    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.values.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_range_is_default() {
        assert_eq!(
            axis_range(&[], &Thresholds::default()),
            AxisRange { min: -0.1, max: 0.1 }
        );
        assert_eq!(
            axis_range(&[f64::NAN], &Thresholds::new(Some(5.0), None, None)),
            AxisRange::default()
        );
    }

    #[test]
    fn test_range_contains_values() {
        let values = [0.3, -1.2, 4.0, 0.0];
        let range = axis_range(&values, &Thresholds::default());
        assert!(range.min <= -1.2);
        assert!(range.max >= 4.0);
        // padding = 5.2 * 0.2
        assert!((range.max - 5.04).abs() < 1e-9);
        assert!((range.min + 2.24).abs() < 1e-9);
    }

    #[test]
    fn test_flat_series_gets_minimum_padding() {
        let range = axis_range(&[0.5, 0.5], &Thresholds::default());
        // Zero is always in range: the lower bound never exceeds -threshold * 1.2.
        assert_eq!(range.min, 0.0);
        assert!((range.max - 0.51).abs() < 1e-9);
    }

    #[test]
    fn test_thresholds_stay_visible() {
        let range = axis_range(&[0.1, 0.2], &Thresholds::new(Some(1.0), Some(0.5), None));
        assert!((range.max - 1.2).abs() < 1e-9);
        assert!((range.min + 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_line_chart_overlays_follow_range() {
        let series = ChartSeries::new(
            "X",
            Some("blue"),
            vec!["2024-01-01T00:00:00".into()],
            vec![0.2],
        );
        let chart = LineChart::build(
            "Seismograph X",
            vec![series],
            &Thresholds::new(None, Some(0.5), None),
            OverlayStyle::Lines,
        );

        assert_eq!(chart.point_count(), 1);
        assert!((chart.y_range.max - 0.6).abs() < 1e-9);
        assert_eq!(chart.shapes.len(), 2);
        assert_eq!(chart.annotations.len(), 2);
    }
}
