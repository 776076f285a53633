//! Geographic primitives used by the planner, the coordinator, and the backends.
//!
//! Coordinates are WGS 84 degrees. Conversions to `geo` types put longitude on the
//! x axis and latitude on the y axis.

use geo::{Intersects, Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TaskmapError};

/// A single map position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Convert to a `geo::Point` (x = lng, y = lat)
    pub fn to_point(&self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }
}

/// Axis-aligned map viewport.
///
/// Always satisfies `min_lat <= max_lat` and `min_lng <= max_lng`; construction
/// and deserialization both reject boxes that do not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawBoundingBox")]
pub struct BoundingBox {
    min_lat: f64,
    min_lng: f64,
    max_lat: f64,
    max_lng: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBoundingBox {
    min_lat: f64,
    min_lng: f64,
    max_lat: f64,
    max_lng: f64,
}

impl TryFrom<RawBoundingBox> for BoundingBox {
    type Error = TaskmapError;

    fn try_from(raw: RawBoundingBox) -> Result<Self> {
        Self::new(raw.min_lat, raw.min_lng, raw.max_lat, raw.max_lng)
    }
}

impl BoundingBox {
    /// Create a validated bounding box
    pub fn new(min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> Result<Self> {
        if ![min_lat, min_lng, max_lat, max_lng].iter().all(|v| v.is_finite()) {
            return Err(TaskmapError::InvalidBoundingBox {
                reason: "coordinates must be finite".to_string(),
            });
        }

        if min_lat > max_lat {
            return Err(TaskmapError::InvalidBoundingBox {
                reason: format!("min_lat {} is greater than max_lat {}", min_lat, max_lat),
            });
        }

        if min_lng > max_lng {
            return Err(TaskmapError::InvalidBoundingBox {
                reason: format!("min_lng {} is greater than max_lng {}", min_lng, max_lng),
            });
        }

        Ok(Self { min_lat, min_lng, max_lat, max_lng })
    }

    /// Smallest box containing both corners, in any order
    pub fn from_corners(a: LatLng, b: LatLng) -> Self {
        Self {
            min_lat: a.lat.min(b.lat),
            min_lng: a.lng.min(b.lng),
            max_lat: a.lat.max(b.lat),
            max_lng: a.lng.max(b.lng),
        }
    }

    pub fn min_lat(&self) -> f64 {
        self.min_lat
    }

    pub fn min_lng(&self) -> f64 {
        self.min_lng
    }

    pub fn max_lat(&self) -> f64 {
        self.max_lat
    }

    pub fn max_lng(&self) -> f64 {
        self.max_lng
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lng_span(&self) -> f64 {
        self.max_lng - self.min_lng
    }

    /// Larger of the latitude and longitude spans, in degrees
    pub fn degree_span(&self) -> f64 {
        self.lat_span().max(self.lng_span())
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// Check whether a position lies inside the box (edges included)
    pub fn contains(&self, position: LatLng) -> bool {
        self.to_rect().intersects(&position.to_point())
    }

    /// Convert to a `geo::Rect` (x = lng, y = lat)
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            geo::coord! { x: self.min_lng, y: self.min_lat },
            geo::coord! { x: self.max_lng, y: self.max_lat },
        )
    }

    /// West, south, east, north ordering used by tile and search services
    pub fn to_wsen(&self) -> [f64; 4] {
        [self.min_lng, self.min_lat, self.max_lng, self.max_lat]
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.min_lng, self.min_lat, self.max_lng, self.max_lat)
    }
}

impl FromStr for BoundingBox {
    type Err = TaskmapError;

    /// Parse `west,south,east,north` (i.e. `min_lng,min_lat,max_lng,max_lat`)
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| TaskmapError::InvalidBoundingBox {
                reason: format!("'{}' is not a list of numbers: {}", s, e),
            })?;

        let [west, south, east, north] = parts[..] else {
            return Err(TaskmapError::InvalidBoundingBox {
                reason: format!("expected 4 values (west,south,east,north), got {}", parts.len()),
            });
        };

        Self::new(south, west, north, east)
    }
}
