use std::path::Path;

use anyhow::{Context, Result};
use geo_types::LineString;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geocode::Geocoder;
use crate::matcher::{self, DistanceMetric};
use crate::network::{self, LineGeometry, NetworkSegment};
use crate::slicer;

/// One highway construction project, as parsed upstream from the award
/// listings. The pipeline mutates it exactly once, to attach `geometry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub sr_no: String,
    pub nh_number: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub description: String,
    pub start_location: Option<String>,
    pub end_location: Option<String>,
    pub total_length: Option<f64>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub concessionaire: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<LineGeometry>,
}

/// Why a project ended in the `NoGeometry` state. All of these are recovered
/// at the orchestrator boundary; none aborts the run.
#[derive(Debug, Error)]
pub enum MatchFailure {
    #[error("could not geocode {0} location")]
    GeocodeFailure(&'static str),
    #[error("no network segment matches route reference {0:?}")]
    NoCandidateMatch(String),
    #[error("matched geometry has too few points to slice")]
    MalformedGeometry,
    #[error("both endpoints project to the same spot on the matched segment")]
    DegenerateSlice,
}

/// Stages a project moves through; any failure drops it to `NoGeometry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Pending,
    ResolvedEndpoints,
    CandidatesFound,
    Matched,
    Sliced,
    NoGeometry,
}

#[derive(Debug, Default)]
struct RunStats {
    sliced: usize,
    no_geometry: usize,
}

/// Loads the project records from a JSON array.
pub fn load_projects(path: &Path) -> Result<Vec<ProjectRecord>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read projects file {}", path.display()))?;
    let projects: Vec<ProjectRecord> = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse projects file {}", path.display()))?;
    info!("Loaded {} project records", projects.len());
    Ok(projects)
}

/// Runs the matching pipeline over every project in order.
///
/// Projects are processed strictly sequentially; the geocoder's built-in
/// throttling is the only pacing concern. A failing project is logged,
/// marked by leaving its geometry absent, and never affects its neighbours.
/// The returned collection preserves input order and length, so callers can
/// persist it even after a partial run.
pub async fn run<G: Geocoder>(
    mut projects: Vec<ProjectRecord>,
    network: &[NetworkSegment],
    geocoder: &mut G,
    metric: DistanceMetric,
    limit: Option<usize>,
) -> Vec<ProjectRecord> {
    let take = limit.unwrap_or(projects.len()).min(projects.len());
    let mut stats = RunStats::default();

    for project in projects.iter_mut().take(take) {
        info!(
            "Processing project {}: {} ({:?} -> {:?})",
            project.sr_no, project.nh_number, project.start_location, project.end_location
        );

        match process_one(project, network, geocoder, metric).await {
            Ok(line) => {
                project.geometry = Some(LineGeometry::from_line_string(&line));
                stats.sliced += 1;
                debug!(
                    "Project {} reached {:?} with {} points",
                    project.sr_no,
                    Stage::Sliced,
                    line.0.len()
                );
            }
            Err(failure) => {
                stats.no_geometry += 1;
                warn!(
                    "Project {} ends {:?}: {}",
                    project.sr_no,
                    Stage::NoGeometry,
                    failure
                );
            }
        }
    }

    info!(
        "Pipeline finished: {} sliced, {} without geometry, {} untouched",
        stats.sliced,
        stats.no_geometry,
        projects.len() - take
    );
    projects
}

/// Takes a single project from `Pending` to `Sliced`, or reports the failure
/// that stopped it.
async fn process_one<G: Geocoder>(
    project: &ProjectRecord,
    network: &[NetworkSegment],
    geocoder: &mut G,
    metric: DistanceMetric,
) -> Result<LineString<f64>, MatchFailure> {
    let mut stage = Stage::Pending;
    debug!("Project {} at {:?}", project.sr_no, stage);

    let start_name = project.start_location.as_deref().unwrap_or("");
    let end_name = project.end_location.as_deref().unwrap_or("");
    let start = geocoder
        .resolve(start_name)
        .await
        .ok_or(MatchFailure::GeocodeFailure("start"))?;
    let end = geocoder
        .resolve(end_name)
        .await
        .ok_or(MatchFailure::GeocodeFailure("end"))?;
    stage = Stage::ResolvedEndpoints;
    debug!("Project {} at {:?}: {:?} -> {:?}", project.sr_no, stage, start, end);

    let candidates = network::find_candidates(network, &project.nh_number);
    if candidates.is_empty() {
        return Err(MatchFailure::NoCandidateMatch(project.nh_number.clone()));
    }
    stage = Stage::CandidatesFound;
    debug!(
        "Project {} at {:?}: {} candidates",
        project.sr_no,
        stage,
        candidates.len()
    );

    let best = matcher::select_best(&candidates, start, end, metric)
        .ok_or_else(|| MatchFailure::NoCandidateMatch(project.nh_number.clone()))?;
    stage = Stage::Matched;
    debug!(
        "Project {} at {:?}: score {}",
        project.sr_no, stage, best.score
    );

    let line = best.geometry.to_line_string();
    let sliced = slicer::slice(&line, start, end).ok_or(MatchFailure::MalformedGeometry)?;
    if sliced.0.len() < 2 {
        return Err(MatchFailure::DegenerateSlice);
    }

    Ok(sliced)
}
