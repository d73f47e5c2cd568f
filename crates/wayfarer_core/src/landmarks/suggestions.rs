use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use tracing::debug;

use crate::{
    error::SuggestionError,
    geopoint::{BBox, GeoPoint},
    types::NodeId,
};

/// Suggested points farther than this from every road are unresolved
pub const SUGGESTION_MAX_DISTANCE: f64 = 5_000.0;

const BBOX_PREFIX: &str = "#BBOX:";

/// Finds the graph node closest to a coordinate
pub trait NodeLocator {
    fn closest_node(&self, point: &GeoPoint, max_distance: f64) -> Option<NodeId>;
}

/// Landmarks picked by hand for the subnetwork whose start node lies in
/// `bbox`
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkSuggestion {
    pub nodes: Vec<NodeId>,
    pub bbox: BBox,
}

impl LandmarkSuggestion {
    pub fn new(nodes: Vec<NodeId>, bbox: BBox) -> Self {
        Self { nodes, bbox }
    }

    pub fn from_file<L: NodeLocator>(
        path: impl AsRef<Path>,
        locator: &L,
    ) -> Result<Self, SuggestionError> {
        let path = path.as_ref();
        debug!("Reading landmark suggestions from {}", path.display());
        let file = File::open(path)?;
        Self::parse(BufReader::new(file), locator, SUGGESTION_MAX_DISTANCE)
    }

    /// Reads one `longitude,latitude` pair per line. A `#BBOX:` line sets the
    /// box, which grows to contain every point.
    pub fn parse<R: BufRead, L: NodeLocator>(
        reader: R,
        locator: &L,
        max_distance: f64,
    ) -> Result<Self, SuggestionError> {
        let mut bbox = BBox::inverse();
        let mut nodes = Vec::new();
        let mut unresolved = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            let invalid_line = || SuggestionError::InvalidLine {
                line: index + 1,
                content: line.clone(),
            };

            if let Some(values) = trimmed.strip_prefix(BBOX_PREFIX) {
                let values = parse_numbers(values).ok_or_else(invalid_line)?;
                let [min_lat, min_lng, max_lat, max_lng] = values[..] else {
                    return Err(invalid_line());
                };
                bbox = BBox::new(min_lat, min_lng, max_lat, max_lng);
                continue;
            }

            if trimmed.chars().next().is_none_or(char::is_alphabetic) {
                continue;
            }

            let values = parse_numbers(trimmed).ok_or_else(invalid_line)?;
            let [lng, lat] = values[..] else {
                return Err(invalid_line());
            };

            let point = GeoPoint::new(lat, lng);
            bbox.extend(&point);
            match locator.closest_node(&point, max_distance) {
                Some(node) if !nodes.contains(&node) => nodes.push(node),
                Some(_) => {}
                None => unresolved.push((lng, lat)),
            }
        }

        if !unresolved.is_empty() {
            return Err(SuggestionError::UnresolvedPoints(unresolved));
        }

        debug!("Parsed {} landmark suggestions", nodes.len());
        Ok(Self { nodes, bbox })
    }
}

fn parse_numbers(values: &str) -> Option<Vec<f64>> {
    values
        .split(',')
        .map(|value| value.trim().parse::<f64>().ok())
        .collect()
}
