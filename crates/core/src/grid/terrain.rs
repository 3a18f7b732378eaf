//! Urban terrain context
//!
//! Buildings, roads and elevation around the blast, as supplied by an external
//! geospatial provider. The field synthesis never depends on terrain: it is
//! context for the renderer. A failed or absent provider degrades to flat,
//! empty terrain and the simulation carries on.

use crate::core_types::error::{BlastSimError, Result};
use crate::core_types::explosive::GeoPoint;
use crate::grid::geometry::METERS_PER_DEGREE_LAT;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{debug, warn};

/// Storey height used when only `building:levels` is tagged (m)
pub const METERS_PER_LEVEL: f32 = 3.5;

/// Height of a building with no usable tags (m)
pub const DEFAULT_BUILDING_HEIGHT: f32 = 10.0;

/// Feet to metres
const FEET_TO_METERS: f32 = 0.3048;

/// Geographic bounding box in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern latitude
    pub south: f64,
    /// Western longitude
    pub west: f64,
    /// Northern latitude
    pub north: f64,
    /// Eastern longitude
    pub east: f64,
}

impl BoundingBox {
    /// Create a validated bounding box
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::InvalidBoundingBox`] if a coordinate is
    /// non-finite, out of range, or the box is empty.
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Result<Self> {
        let bbox = Self {
            south,
            west,
            north,
            east,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Square box of half-size `radius_m` centered on `center`
    #[must_use]
    pub fn around(center: GeoPoint, radius_m: f32) -> Self {
        let dlat = f64::from(radius_m) / METERS_PER_DEGREE_LAT;
        let dlon = f64::from(radius_m)
            / (METERS_PER_DEGREE_LAT * center.lat.to_radians().cos().max(1e-6));
        Self {
            south: (center.lat - dlat).max(-90.0),
            west: (center.lon - dlon).max(-180.0),
            north: (center.lat + dlat).min(90.0),
            east: (center.lon + dlon).min(180.0),
        }
    }

    /// True when `point` lies inside the box (edges inclusive)
    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.south..=self.north).contains(&point.lat)
            && (self.west..=self.east).contains(&point.lon)
    }

    fn validate(&self) -> Result<()> {
        let fail = |message: &str| BlastSimError::InvalidBoundingBox {
            input: self.to_string(),
            message: message.to_string(),
        };
        let coords = [self.south, self.west, self.north, self.east];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(fail("coordinates must be finite"));
        }
        if !(-90.0..=90.0).contains(&self.south) || !(-90.0..=90.0).contains(&self.north) {
            return Err(fail("latitude out of range"));
        }
        if !(-180.0..=180.0).contains(&self.west) || !(-180.0..=180.0).contains(&self.east) {
            return Err(fail("longitude out of range"));
        }
        if self.south >= self.north || self.west >= self.east {
            return Err(fail("box is empty"));
        }
        Ok(())
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{},{}", self.south, self.west, self.north, self.east)
    }
}

impl FromStr for BoundingBox {
    type Err = BlastSimError;

    /// Parse the `"south,west,north,east"` form
    fn from_str(s: &str) -> Result<Self> {
        let fail = |message: String| BlastSimError::InvalidBoundingBox {
            input: s.to_string(),
            message,
        };
        let coords = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|e| fail(format!("'{}': {e}", part.trim())))
            })
            .collect::<Result<Vec<f64>>>()?;
        let [south, west, north, east] = coords[..] else {
            return Err(fail(format!("expected 4 coordinates, got {}", coords.len())));
        };
        Self::new(south, west, north, east)
    }
}

/// Building footprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    /// Provider identifier
    pub id: String,
    /// Closed footprint polygon
    pub footprint: Vec<GeoPoint>,
    /// Raw provider tags
    pub tags: BTreeMap<String, String>,
    /// Height (m), from tags or estimated
    pub height_m: f32,
}

impl Building {
    /// Create a building, estimating its height from `tags`
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        footprint: Vec<GeoPoint>,
        tags: BTreeMap<String, String>,
    ) -> Self {
        let height_m = estimate_building_height(&tags);
        Self {
            id: id.into(),
            footprint,
            tags,
            height_m,
        }
    }
}

/// Estimate a building's height from its tags
///
/// Order of preference:
/// 1. explicit `height` (metres, or feet when suffixed `ft`)
/// 2. `building:levels` × 3.5 m
/// 3. typical height for the `building` type
/// 4. 10 m
#[must_use]
pub fn estimate_building_height(tags: &BTreeMap<String, String>) -> f32 {
    if let Some(raw) = tags.get("height") {
        let in_feet = raw.contains("ft");
        let numeric = raw.replace("ft", "").replace('m', "");
        match numeric.trim().parse::<f32>() {
            Ok(h) if h.is_finite() && h > 0.0 => {
                return if in_feet { h * FEET_TO_METERS } else { h };
            }
            _ => debug!("Ignoring unparsable height tag '{}'", raw),
        }
    }

    if let Some(levels) = tags
        .get("building:levels")
        .and_then(|l| l.trim().parse::<u32>().ok())
    {
        return levels as f32 * METERS_PER_LEVEL;
    }

    match tags.get("building").map(String::as_str) {
        Some("house") => 8.0,
        Some("residential" | "industrial" | "school") => 12.0,
        Some("apartments") => 25.0,
        Some("commercial" | "church") => 15.0,
        Some("office") => 30.0,
        Some("warehouse") => 10.0,
        Some("hospital") => 20.0,
        _ => DEFAULT_BUILDING_HEIGHT,
    }
}

/// Road centerline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Road {
    /// Provider identifier
    pub id: String,
    /// Centerline polyline
    pub polyline: Vec<GeoPoint>,
    /// Raw provider tags
    pub tags: BTreeMap<String, String>,
}

/// Regular elevation grid over a bounding box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevationGrid {
    /// Elevations (m) in row-major order, row 0 at the southern edge
    pub data: Vec<f32>,
    /// Samples per row (west → east)
    pub width: usize,
    /// Number of rows (south → north)
    pub height: usize,
    /// Sample spacing (degrees)
    pub resolution_deg: f64,
}

impl ElevationGrid {
    /// Flat grid over `bbox` at a constant elevation
    #[must_use]
    pub fn flat(bbox: &BoundingBox, resolution_deg: f64, elevation_m: f32) -> Self {
        // Tolerance keeps exact multiples of the resolution from rounding up
        let samples = |span: f64| (span / resolution_deg - 1e-9).ceil().max(1.0) as usize;
        let width = samples(bbox.east - bbox.west);
        let height = samples(bbox.north - bbox.south);
        Self {
            data: vec![elevation_m; width * height],
            width,
            height,
            resolution_deg,
        }
    }

    /// Elevation at sample `(row, col)`, if in range
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        (row < self.height && col < self.width).then(|| self.data[row * self.width + col])
    }
}

/// Everything a terrain provider returns for one bounding box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrbanTerrain {
    /// Area covered
    pub bbox: BoundingBox,
    /// Building footprints
    pub buildings: Vec<Building>,
    /// Road network
    pub roads: Vec<Road>,
    /// Elevation samples; `None` means flat ground
    pub elevation: Option<ElevationGrid>,
}

impl UrbanTerrain {
    /// Flat, empty terrain over `bbox`
    #[must_use]
    pub fn flat(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            buildings: Vec::new(),
            roads: Vec::new(),
            elevation: None,
        }
    }

    /// True when no buildings, roads or elevation were supplied
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty() && self.roads.is_empty() && self.elevation.is_none()
    }

    /// Tallest building in the area (m), 0 with no buildings
    #[must_use]
    pub fn max_building_height(&self) -> f32 {
        self.buildings.iter().map(|b| b.height_m).fold(0.0, f32::max)
    }
}

/// Source of urban terrain for a bounding box
///
/// Implementations may hit the network, a cache or a fixture. They may fail or
/// return empty data; callers use [`fetch_or_flat`] to degrade gracefully.
pub trait TerrainProvider: Send + Sync {
    /// Fetch buildings, roads and elevation inside `bbox`
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::Terrain`] (or another variant) when the data is
    /// unavailable.
    fn fetch(&self, bbox: &BoundingBox) -> Result<UrbanTerrain>;
}

/// Provider that always returns flat, empty terrain at one elevation
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatTerrainProvider {
    /// Ground elevation (m); 0 leaves the elevation grid out entirely
    pub elevation_m: f32,
}

impl TerrainProvider for FlatTerrainProvider {
    fn fetch(&self, bbox: &BoundingBox) -> Result<UrbanTerrain> {
        let mut terrain = UrbanTerrain::flat(*bbox);
        if self.elevation_m != 0.0 {
            terrain.elevation = Some(ElevationGrid::flat(bbox, 0.001, self.elevation_m));
        }
        Ok(terrain)
    }
}

/// Fetch terrain, falling back to flat empty terrain on any provider failure
pub fn fetch_or_flat(provider: &dyn TerrainProvider, bbox: &BoundingBox) -> UrbanTerrain {
    match provider.fetch(bbox) {
        Ok(terrain) => {
            debug!(
                "Terrain for {}: {} buildings, {} roads",
                bbox,
                terrain.buildings.len(),
                terrain.roads.len()
            );
            terrain
        }
        Err(e) => {
            warn!("Terrain unavailable for {} ({}), using flat terrain", bbox, e);
            UrbanTerrain::flat(*bbox)
        }
    }
}
