//! Geopoint parsing and the spherical geometry behind `distance()` and
//! `area()`.
//!
//! A geopoint is `"lat lon [alt [acc]]"`; traces and shapes join points
//! with `;`. Calculations use a sphere of radius 6 378 100 m, matching the
//! ODK form engines this library interoperates with.

const EARTH_RADIUS_M: f64 = 6_378_100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Parses `"lat lon [alt [acc]]"`. Out-of-range coordinates are
    /// rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split_whitespace();
        let latitude: f64 = parts.next()?.parse().ok()?;
        let longitude: f64 = parts.next()?.parse().ok()?;
        for _ in 0..2 {
            if let Some(extra) = parts.next() {
                let _: f64 = extra.parse().ok()?;
            }
        }
        if parts.next().is_some() {
            return None;
        }
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return None;
        }
        Some(Self {
            latitude,
            longitude,
        })
    }
}

/// Parses a `;`-joined geopoint list. `None` when any point is malformed.
pub fn parse_trace(s: &str) -> Option<Vec<GeoPoint>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .split(';')
        .map(|p| GeoPoint::parse(p.trim()))
        .collect()
}

/// Sum of the great-circle legs between consecutive points, in meters.
pub fn distance(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine(pair[0], pair[1]))
        .sum()
}

fn haversine(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let dphi = (b.latitude - a.latitude).to_radians();
    let dlambda = (b.longitude - a.longitude).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Enclosed area of the polygon described by the points, in square
/// meters, via the spherical-excess approximation
/// `|Σ (λ₂−λ₁)(2 + sin φ₁ + sin φ₂)| · R² / 2`. The ring is closed
/// implicitly when the first and last points differ.
pub fn area(points: &[GeoPoint]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut ring: Vec<GeoPoint> = points.to_vec();
    if ring.first() != ring.last() {
        if let Some(first) = ring.first().copied() {
            ring.push(first);
        }
    }
    let mut total = 0.0;
    for pair in ring.windows(2) {
        let l1 = pair[0].longitude.to_radians();
        let l2 = pair[1].longitude.to_radians();
        let f1 = pair[0].latitude.to_radians();
        let f2 = pair[1].latitude.to_radians();
        total += (l2 - l1) * (2.0 + f1.sin() + f2.sin());
    }
    (total * EARTH_RADIUS_M * EARTH_RADIUS_M / 2.0).abs()
}
