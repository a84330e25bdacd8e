//! Geographic seeding for zone-based crawls
//!
//! A zone crawl queries one listing search per postal code with a fixed
//! search radius. Neighbouring postal codes would return almost the same
//! listings, so the seed list is thinned greedily: a zone is kept only if it
//! lies at least `min_distance_km` from every zone kept before it.

mod seeds;

pub use seeds::load_seed_file;

use std::collections::HashSet;

/// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A postal-code zone centre
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(id: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            lat,
            lon,
        }
    }

    /// Returns a copy with both axes rounded to `decimals` places
    pub fn rounded(&self, decimals: u32) -> Self {
        Self {
            id: self.id.clone(),
            lat: round_to(self.lat, decimals),
            lon: round_to(self.lon, decimals),
        }
    }
}

/// Great-circle distance between two points in kilometres
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let p1 = lat1.to_radians();
    let p2 = lat2.to_radians();
    let d_phi = p2 - p1;
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + p1.cos() * p2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Rounds every coordinate and drops later duplicates of the same rounded pair
pub fn dedup_rounded(coords: &[Coordinate], decimals: u32) -> Vec<Coordinate> {
    let factor = 10f64.powi(decimals as i32);
    let mut seen = HashSet::new();

    coords
        .iter()
        .filter(|c| seen.insert(((c.lat * factor).round() as i64, (c.lon * factor).round() as i64)))
        .map(|c| c.rounded(decimals))
        .collect()
}

/// Greedy distance thinning in input order
///
/// The first coordinate is always kept; each later one is kept only if it is
/// at least `min_distance_km` from every coordinate kept so far. Selection
/// stops once `limit` coordinates are kept.
pub fn thin_by_distance(
    coords: &[Coordinate],
    min_distance_km: f64,
    limit: Option<usize>,
) -> Vec<Coordinate> {
    let mut selected: Vec<Coordinate> = Vec::new();

    for candidate in coords {
        if limit.is_some_and(|l| selected.len() >= l) {
            break;
        }

        let far_enough = selected
            .iter()
            .all(|s| haversine_km(candidate.lat, candidate.lon, s.lat, s.lon) >= min_distance_km);

        if far_enough {
            selected.push(candidate.clone());
        }
    }

    selected
}

/// Dedup by rounded position, then thin by distance
pub fn select_zones(
    coords: &[Coordinate],
    decimals: u32,
    min_distance_km: f64,
    limit: Option<usize>,
) -> Vec<Coordinate> {
    let unique = dedup_rounded(coords, decimals);
    let selected = thin_by_distance(&unique, min_distance_km, limit);
    tracing::info!(
        "Selected {} seed zones from {} coordinates ({} unique, min distance {} km)",
        selected.len(),
        coords.len(),
        unique.len(),
        min_distance_km
    );
    selected
}
