//! History → polyline points.
//!
//! Points are in screen coordinates: x grows to the right, y grows
//! downwards, so larger values get smaller y and are drawn higher. A
//! two-pixel margin is kept at the top and bottom of the plot.

use serde::{Deserialize, Serialize};

const MARGIN: f64 = 2.0;
const DEGENERATE_RANGE: f64 = 1e-9;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PlotSize {
    pub width: f64,
    pub height: f64,
}

impl Default for PlotSize {
    fn default() -> Self {
        Self {
            width: 320.0,
            height: 110.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Vertical range a series is normalised against.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    /// Min and max of the data itself.
    Auto,
    /// A fixed range regardless of the data, e.g. `0..=1` for a binary signal.
    Fixed { min: f64, max: f64 },
}

impl Scale {
    pub const UNIT: Scale = Scale::Fixed { min: 0.0, max: 1.0 };
}

/// Projects `values` (oldest first) onto a plot.
///
/// Fewer than two samples gives no points. Otherwise there is one point per
/// sample, evenly spaced across the width.
pub fn project(values: &[f64], scale: Scale, size: PlotSize) -> Vec<Point> {
    if values.len() < 2 {
        return Vec::new();
    }
    let (min, max) = match scale {
        Scale::Auto => bounds(values.iter().copied()),
        Scale::Fixed { min, max } => (min, max),
    };
    let (min, max) = widen_degenerate(min, max);
    points(values, min, max, size)
}

/// Projects three parallel series onto one shared vertical scale.
///
/// Used for X/Y/Z so the three lines stay comparable. Fewer than two
/// samples in the shortest series gives three empty point sets.
pub fn project_shared(series: [&[f64]; 3], size: PlotSize) -> [Vec<Point>; 3] {
    let n = series.iter().map(|s| s.len()).min().unwrap_or(0);
    if n < 2 {
        return [Vec::new(), Vec::new(), Vec::new()];
    }
    let (min, max) = bounds(series.iter().flat_map(|s| s[..n].iter().copied()));
    let (min, max) = widen_degenerate(min, max);
    series.map(|s| points(&s[..n], min, max, size))
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
        (min.min(v), max.max(v))
    })
}

fn widen_degenerate(min: f64, max: f64) -> (f64, f64) {
    if !min.is_finite() || !max.is_finite() || (max - min).abs() < DEGENERATE_RANGE {
        (min - 1.0, max + 1.0)
    } else {
        (min, max)
    }
}

fn points(values: &[f64], min: f64, max: f64, size: PlotSize) -> Vec<Point> {
    let step = size.width / (values.len() - 1) as f64;
    let span = size.height - 2.0 * MARGIN;
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let norm = (v - min) / (max - min);
            Point {
                x: i as f64 * step,
                y: (1.0 - norm) * span + MARGIN,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: PlotSize = PlotSize {
        width: 320.0,
        height: 110.0,
    };

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_fewer_than_two_samples_draws_nothing() {
        assert!(project(&[], Scale::Auto, SIZE).is_empty());
        assert!(project(&[1.0], Scale::Auto, SIZE).is_empty());
        assert!(project(&[1.0], Scale::UNIT, SIZE).is_empty());
    }

    #[test]
    fn test_min_max_normalisation() {
        let points = project(&[0.0, 5.0, 10.0], Scale::Auto, SIZE);
        assert_eq!(points.len(), 3);
        assert!(approx(points[0].x, 0.0));
        assert!(approx(points[1].x, 160.0));
        assert!(approx(points[2].x, 320.0));
        // Max at the top margin, min at the bottom margin.
        assert!(approx(points[0].y, 108.0));
        assert!(approx(points[1].y, 55.0));
        assert!(approx(points[2].y, 2.0));
    }

    #[test]
    fn test_higher_value_is_plotted_higher() {
        let values = [3.0, -1.0, 7.5, 2.0, 7.4];
        let points = project(&values, Scale::Auto, SIZE);
        assert_eq!(points.len(), values.len());
        for i in 0..values.len() {
            for j in 0..values.len() {
                if values[i] > values[j] {
                    assert!(points[i].y < points[j].y);
                }
            }
        }
        for p in &points {
            assert!(p.y >= 2.0 - 1e-9 && p.y <= 108.0 + 1e-9);
        }
    }

    #[test]
    fn test_constant_series_widens_range() {
        let points = project(&[4.2, 4.2, 4.2], Scale::Auto, SIZE);
        assert_eq!(points.len(), 3);
        // Range becomes 3.2..5.2, the constant sits mid-plot.
        for p in &points {
            assert!(p.y.is_finite());
            assert!(approx(p.y, 55.0));
        }
    }

    #[test]
    fn test_unit_scale_ignores_data_range() {
        let points = project(&[1.0, 1.0, 0.0], Scale::UNIT, SIZE);
        assert!(approx(points[0].y, 2.0));
        assert!(approx(points[1].y, 2.0));
        assert!(approx(points[2].y, 108.0));
    }

    #[test]
    fn test_width_is_a_parameter() {
        let size = PlotSize {
            width: 100.0,
            height: 20.0,
        };
        let points = project(&[1.0, 2.0, 3.0, 4.0, 5.0], Scale::Auto, size);
        assert!(approx(points[4].x, 100.0));
        assert!(approx(points[1].x, 25.0));
        assert!(approx(points[4].y, 2.0));
        assert!(approx(points[0].y, 18.0));
    }

    #[test]
    fn test_shared_scale_across_series() {
        let xs = [100.0, 110.0];
        let ys = [200.5, 200.5];
        let zs = [-30.25, -20.0];
        let [px, py, pz] = project_shared([&xs, &ys, &zs], SIZE);
        assert_eq!(px.len(), 2);
        assert_eq!(py.len(), 2);
        assert_eq!(pz.len(), 2);
        // Y holds the joint max, Z the joint min.
        assert!(approx(py[0].y, 2.0));
        assert!(approx(pz[0].y, 108.0));
        assert!(px[0].y > py[0].y && px[0].y < pz[0].y);
    }

    #[test]
    fn test_shared_constant_series() {
        let v = [1.0, 1.0, 1.0];
        let [px, py, pz] = project_shared([&v, &v, &v], SIZE);
        assert_eq!(px.len(), 3);
        assert!(px.iter().chain(&py).chain(&pz).all(|p| approx(p.y, 55.0)));
    }

    #[test]
    fn test_shared_needs_two_samples() {
        let one = [1.0];
        let [px, py, pz] = project_shared([&one, &one, &one], SIZE);
        assert!(px.is_empty() && py.is_empty() && pz.is_empty());
    }
}
