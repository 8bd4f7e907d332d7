use anyhow::{Context, Result};
use log::{debug, info};
use regex::Regex;

use crate::pipeline::ProjectRecord;

/// States named in the award listings, used to tag each project.
const STATES: &[&str] = &[
    "Andhra Pradesh",
    "Bihar",
    "Gujarat",
    "Haryana",
    "Himachal Pradesh",
    "Jharkhand",
    "Karnataka",
    "Kerala",
    "Madhya Pradesh",
    "Maharashtra",
    "Meghalaya",
    "Odisha",
    "Punjab",
    "Rajasthan",
    "Tamil Nadu",
    "Telangana",
    "Uttar Pradesh",
    "Uttarakhand",
    "West Bengal",
];

/// Raw row of the listing: a serial number plus the text that follows it,
/// possibly spanning several physical lines.
struct RawProject {
    sr_no: String,
    text: String,
}

/// Parses a project-listing text dump (one numbered entry per project,
/// wrapped across lines, with repeated page headers) into project records.
///
/// The patterns here are heuristics over OCR-ish text. They miss things;
/// downstream stages must tolerate the absent fields this produces rather
/// than assume clean input.
pub fn parse_listing(text: &str) -> Result<Vec<ProjectRecord>> {
    let sr_no_re = Regex::new(r"^\s*(\d+)\s+(.*)").context("invalid serial number pattern")?;

    let mut raw = Vec::new();
    let mut current: Option<RawProject> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        // Page headers and footers repeat through the dump.
        if line.contains("Awarded But not Start")
            || line.contains("Status as on")
            || line.contains("Page")
        {
            continue;
        }

        if let Some(caps) = sr_no_re.captures(line) {
            if let Some(project) = current.take() {
                raw.push(project);
            }
            current = Some(RawProject {
                sr_no: caps[1].to_string(),
                text: format!("{} ", &caps[2]),
            });
        } else if let Some(project) = current.as_mut() {
            project.text.push_str(line);
            project.text.push(' ');
        }
    }
    if let Some(project) = current.take() {
        raw.push(project);
    }

    let projects = extract_details(&raw)?;
    info!("Parsed {} projects from listing", projects.len());
    Ok(projects)
}

/// Refines each raw row into route reference, state, endpoints and length.
fn extract_details(raw: &[RawProject]) -> Result<Vec<ProjectRecord>> {
    let nh_re = Regex::new(r"(?i)NH[-\s]?(\d+[A-Z]?)").context("invalid NH pattern")?;
    let from_to_re = Regex::new(r"from\s+([A-Z][a-zA-Z\s]+?)\s+to\s+([A-Z][a-zA-Z\s]+)")
        .context("invalid from/to pattern")?;
    let dash_re = Regex::new(r"([A-Z][a-zA-Z\s]+)\s?-\s?([A-Z][a-zA-Z\s]+)\s+section")
        .context("invalid section pattern")?;
    let length_re = Regex::new(r"(?i)(\d+\.?\d*)\s*km").context("invalid length pattern")?;

    let mut projects = Vec::with_capacity(raw.len());
    for row in raw {
        let text = row.text.trim();

        let nh_number = nh_re
            .captures(text)
            .map(|c| format!("NH {}", &c[1]))
            .unwrap_or_else(|| "Unknown".to_string());

        let state = STATES
            .iter()
            .find(|s| text.contains(*s))
            .copied()
            .unwrap_or("Unknown");

        // Prefer the explicit "from X to Y" phrasing, fall back to "X - Y
        // section".
        let (start_location, end_location) = match from_to_re.captures(text) {
            Some(c) => (Some(c[1].trim().to_string()), Some(c[2].trim().to_string())),
            None => match dash_re.captures(text) {
                Some(c) => (Some(c[1].trim().to_string()), Some(c[2].trim().to_string())),
                None => (None, None),
            },
        };

        let total_length = length_re
            .captures(text)
            .and_then(|c| c[1].parse::<f64>().ok());

        let project_name = if text.chars().count() > 100 {
            let prefix: String = text.chars().take(100).collect();
            format!("{}...", prefix)
        } else {
            text.to_string()
        };

        debug!(
            "Project {}: {} {:?} -> {:?}",
            row.sr_no, nh_number, start_location, end_location
        );

        projects.push(ProjectRecord {
            sr_no: row.sr_no.clone(),
            nh_number,
            state: state.to_string(),
            project_name,
            description: text.to_string(),
            start_location,
            end_location,
            total_length,
            status: "AWARDED".to_string(),
            concessionaire: "Unknown".to_string(),
            geometry: None,
        });
    }

    Ok(projects)
}
