//! Grid placement and terrain context

pub mod geometry;
pub mod terrain;

// Re-export main types
pub use geometry::GridGeometry;
pub use terrain::{
    estimate_building_height, fetch_or_flat, BoundingBox, Building, ElevationGrid,
    FlatTerrainProvider, Road, TerrainProvider, UrbanTerrain,
};
