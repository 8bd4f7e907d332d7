use std::path::Path;

use anyhow::{Context, Result};
use geo_types::{Coord, LineString};
use log::info;
use serde::{Deserialize, Serialize};

/// GeoJSON-style LineString as it appears in the network and output files:
/// `{"type": "LineString", "coordinates": [[lon, lat], ...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<[f64; 2]>,
}

impl LineGeometry {
    pub fn is_line_string(&self) -> bool {
        self.kind == "LineString"
    }

    pub fn to_line_string(&self) -> LineString<f64> {
        LineString::from(
            self.coordinates
                .iter()
                .map(|c| Coord { x: c[0], y: c[1] })
                .collect::<Vec<_>>(),
        )
    }

    pub fn from_line_string(line: &LineString<f64>) -> Self {
        Self {
            kind: "LineString".to_string(),
            coordinates: line.coords().map(|c| [c.x, c.y]).collect(),
        }
    }
}

/// One road segment of the reference network, read-only once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSegment {
    #[serde(rename = "ref", default)]
    pub route_ref: String,
    #[serde(default)]
    pub name: String,
    pub geometry: LineGeometry,
}

/// Loads the reference network from a JSON array of `{ref, name, geometry}`
/// records. Missing or unreadable files are fatal.
pub fn load_network(path: &Path) -> Result<Vec<NetworkSegment>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read network file {}", path.display()))?;
    let segments: Vec<NetworkSegment> = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse network file {}", path.display()))?;
    info!("Loaded {} network segments", segments.len());
    Ok(segments)
}

/// Strips all whitespace and lowercases, so "NH 16", "nh16" and "NH16"
/// compare equal.
fn normalize_ref(route_ref: &str) -> String {
    route_ref
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Finds every network segment whose route reference matches the project's.
///
/// Matching is substring containment in both directions after normalization:
/// "16" matches "NH16" and a composite reference like "NH44;NH16" matches
/// "NH16". Returns an empty vec (never an error) when nothing matches.
pub fn find_candidates<'a>(
    segments: &'a [NetworkSegment],
    route_ref: &str,
) -> Vec<&'a LineGeometry> {
    let target = normalize_ref(route_ref);
    if target.is_empty() {
        return Vec::new();
    }

    segments
        .iter()
        .filter(|s| {
            let seg_ref = normalize_ref(&s.route_ref);
            !seg_ref.is_empty() && (seg_ref.contains(&target) || target.contains(&seg_ref))
        })
        .map(|s| &s.geometry)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(route_ref: &str, coords: Vec<[f64; 2]>) -> NetworkSegment {
        NetworkSegment {
            route_ref: route_ref.to_string(),
            name: String::new(),
            geometry: LineGeometry {
                kind: "LineString".to_string(),
                coordinates: coords,
            },
        }
    }

    #[test]
    fn containment_matches_in_both_directions() {
        let segments = vec![segment("NH16", vec![[0.0, 0.0], [1.0, 1.0]])];
        assert_eq!(find_candidates(&segments, "16").len(), 1);
        assert_eq!(find_candidates(&segments, "NH16 Extension").len(), 1);
    }

    #[test]
    fn matches_dashed_reference() {
        let segments = vec![segment("NH-716", vec![[0.0, 0.0], [1.0, 1.0]])];
        assert_eq!(find_candidates(&segments, "716").len(), 1);
    }

    #[test]
    fn normalization_ignores_whitespace_and_case() {
        let segments = vec![segment("nh 44", vec![[0.0, 0.0], [1.0, 1.0]])];
        assert_eq!(find_candidates(&segments, "NH44").len(), 1);
    }

    #[test]
    fn no_match_yields_empty_vec() {
        let segments = vec![segment("NH16", vec![[0.0, 0.0], [1.0, 1.0]])];
        assert!(find_candidates(&segments, "NH9").is_empty());
    }

    #[test]
    fn empty_project_reference_matches_nothing() {
        let segments = vec![segment("NH16", vec![[0.0, 0.0], [1.0, 1.0]])];
        assert!(find_candidates(&segments, "  ").is_empty());
    }

    #[test]
    fn geometry_round_trips_through_line_string() {
        let geom = LineGeometry {
            kind: "LineString".to_string(),
            coordinates: vec![[78.1, 17.2], [78.5, 17.9]],
        };
        let line = geom.to_line_string();
        assert_eq!(LineGeometry::from_line_string(&line), geom);
    }
}
