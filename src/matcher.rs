use clap::ValueEnum;
use geo::{Closest, ClosestPoint, Euclidean, Haversine, algorithm::Distance};
use geo_types::{LineString, Point};
use log::debug;

use crate::network::LineGeometry;

/// How point-to-polyline distances are measured when scoring candidates.
///
/// `Planar` works in raw coordinate space, matching the stored (lon, lat)
/// order. Scores are only comparable within a single selection, not across
/// regions of differing latitude; that approximation is accepted, and
/// `Haversine` exists for runs where metric distances matter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DistanceMetric {
    #[default]
    Planar,
    Haversine,
}

impl DistanceMetric {
    /// Minimum distance from a point to a polyline, or `None` when the
    /// geometry cannot be projected onto (fewer than 2 points).
    fn point_to_line(&self, point: Point<f64>, line: &LineString<f64>) -> Option<f64> {
        if line.0.len() < 2 {
            return None;
        }
        let projected = match line.closest_point(&point) {
            Closest::SinglePoint(p) | Closest::Intersection(p) => p,
            Closest::Indeterminate => return None,
        };
        match self {
            DistanceMetric::Planar => Some(Euclidean.distance(point, projected)),
            DistanceMetric::Haversine => Some(Haversine.distance(point, projected)),
        }
    }
}

/// The candidate chosen by [`select_best`], with its score (lower is better).
#[derive(Debug, Clone)]
pub struct MatchResult<'a> {
    pub geometry: &'a LineGeometry,
    pub score: f64,
}

/// Picks the candidate geometry closest to the two resolved endpoints.
///
/// Each candidate's score is the minimum distance from `start` to the
/// polyline plus the minimum distance from `end` to it. The globally minimal
/// score wins; ties keep the first-seen candidate, so selection is stable
/// and deterministic. Candidates that are not LineStrings or have fewer than
/// 2 points are skipped rather than failing the whole selection. Returns
/// `None` when no candidate survives.
pub fn select_best<'a>(
    candidates: &[&'a LineGeometry],
    start: Point<f64>,
    end: Point<f64>,
    metric: DistanceMetric,
) -> Option<MatchResult<'a>> {
    let mut best: Option<MatchResult<'a>> = None;

    for candidate in candidates {
        if !candidate.is_line_string() {
            debug!("Skipping candidate with geometry type {}", candidate.kind);
            continue;
        }
        let line = candidate.to_line_string();
        let Some(start_distance) = metric.point_to_line(start, &line) else {
            debug!(
                "Skipping malformed candidate with {} points",
                candidate.coordinates.len()
            );
            continue;
        };
        let Some(end_distance) = metric.point_to_line(end, &line) else {
            continue;
        };

        let score = start_distance + end_distance;
        // Strict comparison keeps the first-seen candidate on ties.
        if best.as_ref().is_none_or(|b| score < b.score) {
            best = Some(MatchResult {
                geometry: candidate,
                score,
            });
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geom(coords: Vec<[f64; 2]>) -> LineGeometry {
        LineGeometry {
            kind: "LineString".to_string(),
            coordinates: coords,
        }
    }

    #[test]
    fn empty_candidate_list_yields_none() {
        assert!(
            select_best(
                &[],
                Point::new(0.0, 0.0),
                Point::new(1.0, 1.0),
                DistanceMetric::Planar
            )
            .is_none()
        );
    }

    #[test]
    fn picks_candidate_nearest_both_endpoints() {
        let near = geom(vec![[0.0, 0.0], [0.0, 10.0]]);
        let far = geom(vec![[50.0, 0.0], [50.0, 10.0]]);
        let candidates = vec![&far, &near];

        let result = select_best(
            &candidates,
            Point::new(1.0, 2.0),
            Point::new(1.0, 8.0),
            DistanceMetric::Planar,
        )
        .unwrap();
        assert_eq!(result.geometry, &near);
        assert!((result.score - 2.0).abs() < 1e-9);
    }

    #[test]
    fn ties_keep_first_seen_candidate() {
        let a = geom(vec![[0.0, 0.0], [0.0, 10.0]]);
        let b = geom(vec![[0.0, 0.0], [0.0, 10.0]]);
        let candidates = vec![&a, &b];

        let result = select_best(
            &candidates,
            Point::new(0.0, 2.0),
            Point::new(0.0, 8.0),
            DistanceMetric::Planar,
        )
        .unwrap();
        assert!(std::ptr::eq(result.geometry, &a));
    }

    #[test]
    fn malformed_candidates_are_skipped() {
        let malformed = geom(vec![[0.0, 0.0]]);
        let valid = geom(vec![[5.0, 0.0], [5.0, 10.0]]);
        let candidates = vec![&malformed, &valid];

        let result = select_best(
            &candidates,
            Point::new(4.0, 5.0),
            Point::new(6.0, 5.0),
            DistanceMetric::Planar,
        )
        .unwrap();
        assert_eq!(result.geometry, &valid);
    }

    #[test]
    fn only_malformed_candidates_yield_none() {
        let point_only = geom(vec![[0.0, 0.0]]);
        let not_a_line = LineGeometry {
            kind: "Polygon".to_string(),
            coordinates: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
        };
        let candidates = vec![&point_only, &not_a_line];

        assert!(
            select_best(
                &candidates,
                Point::new(0.0, 0.0),
                Point::new(1.0, 1.0),
                DistanceMetric::Planar
            )
            .is_none()
        );
    }
}
