// Threshold overlays drawn on top of vibration charts
use crate::domain::chart::AxisRange;
use crate::domain::thresholds::{Thresholds, Tier};
use serde::{Deserialize, Serialize};

pub const ZONE_OPACITY: f64 = 0.15;
pub const LINE_WIDTH: f64 = 1.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayStyle {
    /// Shaded risk bands between tiers.
    #[default]
    Zones,
    /// Dashed reference lines at each tier.
    Lines,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Rect {
        y0: f64,
        y1: f64,
        color: &'static str,
        opacity: f64,
    },
    Line {
        y: f64,
        color: &'static str,
        width: f64,
        dash: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub y: f64,
    pub text: String,
    pub color: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Overlay {
    pub shapes: Vec<Shape>,
    pub annotations: Vec<Annotation>,
}

/// Build overlay primitives for the configured tiers, mirrored above and below zero.
///
/// Zones span from a tier's value to the next higher configured tier, the top
/// tier extending to the edge of `range`.
pub fn threshold_overlay(thresholds: &Thresholds, style: OverlayStyle, range: AxisRange) -> Overlay {
    let tiers = thresholds.active();
    let mut overlay = Overlay::default();

    for (idx, &(tier, value)) in tiers.iter().enumerate() {
        match style {
            OverlayStyle::Zones => {
                let upper = tiers
                    .get(idx + 1)
                    .map(|&(_, next)| next)
                    .unwrap_or_else(|| range.max.max(value));
                let lower = tiers
                    .get(idx + 1)
                    .map(|&(_, next)| -next)
                    .unwrap_or_else(|| range.min.min(-value));
                overlay.shapes.push(rect(tier, value, upper));
                overlay.shapes.push(rect(tier, lower, -value));
            }
            OverlayStyle::Lines => {
                overlay.shapes.push(line(tier, value));
                overlay.shapes.push(line(tier, -value));
            }
        }

        overlay.annotations.push(label(tier, value));
        overlay.annotations.push(label(tier, -value));
    }

    overlay
}

fn rect(tier: Tier, y0: f64, y1: f64) -> Shape {
    Shape::Rect {
        y0,
        y1,
        color: tier.color(),
        opacity: ZONE_OPACITY,
    }
}

fn line(tier: Tier, y: f64) -> Shape {
    Shape::Line {
        y,
        color: tier.color(),
        width: LINE_WIDTH,
        dash: "dash",
    }
}

fn label(tier: Tier, y: f64) -> Annotation {
    Annotation {
        y,
        text: tier.label().to_string(),
        color: tier.color(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANGE: AxisRange = AxisRange { min: -3.0, max: 3.0 };

    #[test]
    fn test_no_thresholds_no_shapes() {
        let overlay = threshold_overlay(&Thresholds::default(), OverlayStyle::Zones, RANGE);
        assert_eq!(overlay, Overlay::default());
    }

    #[test]
    fn test_zones_stack_between_tiers() {
        let thresholds = Thresholds::new(Some(1.0), Some(0.5), Some(2.0));
        let overlay = threshold_overlay(&thresholds, OverlayStyle::Zones, RANGE);

        assert_eq!(overlay.shapes.len(), 6);
        assert_eq!(
            overlay.shapes[0],
            Shape::Rect { y0: 0.5, y1: 1.0, color: "yellow", opacity: ZONE_OPACITY }
        );
        assert_eq!(
            overlay.shapes[1],
            Shape::Rect { y0: -1.0, y1: -0.5, color: "yellow", opacity: ZONE_OPACITY }
        );
        assert_eq!(
            overlay.shapes[4],
            Shape::Rect { y0: 2.0, y1: 3.0, color: "red", opacity: ZONE_OPACITY }
        );
        assert_eq!(
            overlay.shapes[5],
            Shape::Rect { y0: -3.0, y1: -2.0, color: "red", opacity: ZONE_OPACITY }
        );
    }

    #[test]
    fn test_lines_are_mirrored() {
        let thresholds = Thresholds::new(Some(0.8), None, None);
        let overlay = threshold_overlay(&thresholds, OverlayStyle::Lines, RANGE);

        let ys: Vec<f64> = overlay
            .shapes
            .iter()
            .map(|s| match s {
                Shape::Line { y, color, .. } => {
                    assert_eq!(*color, "orange");
                    *y
                }
                Shape::Rect { .. } => panic!("unexpected rect"),
            })
            .collect();
        assert_eq!(ys, vec![0.8, -0.8]);

        let labels: Vec<&str> = overlay.annotations.iter().map(|a| a.text.as_str()).collect();
        assert_eq!(labels, vec!["Alert", "Alert"]);
    }
}
