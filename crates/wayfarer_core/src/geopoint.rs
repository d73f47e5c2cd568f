use geo::{Distance, Haversine};
use rstar::AABB;
use serde::{Deserialize, Serialize};

/// Number of stored units in one degree, 100 nanodegrees like OpenStreetMap.
pub const COORD_SCALE_FACTOR: f64 = 10_000_000.0;

/// Elevation is stored in centimeters.
pub(crate) const ELEVATION_SCALE_FACTOR: f64 = 100.0;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn haversine_distance(&self, other: &GeoPoint) -> f64 {
        Haversine.distance(geo::Point::from(*self), geo::Point::from(*other))
    }

    /// Point at `fraction` of the way to `other`, interpolated linearly
    pub fn interpolate(&self, other: &GeoPoint, fraction: f64) -> GeoPoint {
        GeoPoint {
            lat: self.lat + (other.lat - self.lat) * fraction,
            lng: self.lng + (other.lng - self.lng) * fraction,
        }
    }

    pub(crate) fn to_fixed(value: f64) -> i32 {
        (value * COORD_SCALE_FACTOR).round() as i32
    }

    pub(crate) fn from_fixed(value: i32) -> f64 {
        value as f64 / COORD_SCALE_FACTOR
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(point: GeoPoint) -> Self {
        geo::Point::new(point.lng, point.lat)
    }
}

/// Axis-aligned box in degrees
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl BBox {
    pub fn new(min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            min_lng,
            max_lat,
            max_lng,
        }
    }

    /// A box that contains nothing and grows with [`BBox::extend`]
    pub fn inverse() -> Self {
        Self {
            min_lat: f64::MAX,
            min_lng: f64::MAX,
            max_lat: f64::MIN,
            max_lng: f64::MIN,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min_lat <= self.max_lat && self.min_lng <= self.max_lng
    }

    pub fn extend(&mut self, point: &GeoPoint) {
        self.min_lat = self.min_lat.min(point.lat);
        self.min_lng = self.min_lng.min(point.lng);
        self.max_lat = self.max_lat.max(point.lat);
        self.max_lng = self.max_lng.max(point.lng);
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lng >= self.min_lng
            && point.lng <= self.max_lng
    }

    pub(crate) fn aabb(&self) -> AABB<[f64; 2]> {
        AABB::from_corners([self.min_lng, self.min_lat], [self.max_lng, self.max_lat])
    }
}
