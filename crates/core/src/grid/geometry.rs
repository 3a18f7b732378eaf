//! Physical placement of field grids
//!
//! Field cells are addressed in grid units. `GridGeometry` maps a cell to its
//! metric offset from the epicenter and to a geographic position, so a renderer
//! can overlay the fields on buildings, roads and elevation.
//!
//! The grid's half-extent is the characteristic blast radius from the scaling
//! law, so a 50×50 pressure grid around a 1000 kg TNT charge spans 200 m with
//! 4 m cells.

use crate::core_types::explosive::GeoPoint;
use crate::core_types::units::Meters;
use crate::physics::scaling::BlastScaling;
use crate::solver::GridShape;

/// Metres per degree of latitude (mean Earth radius)
pub const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// Placement of one field grid around the epicenter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    shape: GridShape,
    epicenter: GeoPoint,
    cell_size: Meters,
}

impl GridGeometry {
    /// Place `shape` around `epicenter` so its half-extent equals the blast radius
    #[must_use]
    pub fn new(shape: GridShape, epicenter: GeoPoint, scaling: &BlastScaling) -> Self {
        let half_cells = (shape.rows().max(shape.cols()) / 2).max(1) as f32;
        Self {
            shape,
            epicenter,
            cell_size: Meters::new(*scaling.blast_radius / half_cells),
        }
    }

    /// Grid shape this geometry places
    #[must_use]
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Edge length of one cell
    #[must_use]
    pub fn cell_size(&self) -> Meters {
        self.cell_size
    }

    /// Area of one cell (m²)
    #[must_use]
    pub fn cell_area_m2(&self) -> f32 {
        *self.cell_size * *self.cell_size
    }

    /// Offset of a cell center from the epicenter as `(east_m, north_m)`
    ///
    /// Columns grow eastward and rows grow southward.
    #[must_use]
    pub fn cell_offset_m(&self, row: usize, col: usize) -> (f32, f32) {
        let (center_row, center_col) = self.shape.center();
        let east = (col as f32 - center_col) * *self.cell_size;
        let north = (center_row - row as f32) * *self.cell_size;
        (east, north)
    }

    /// Geographic position of a cell center (equirectangular approximation)
    #[must_use]
    pub fn cell_location(&self, row: usize, col: usize) -> GeoPoint {
        let (east, north) = self.cell_offset_m(row, col);
        let lat = self.epicenter.lat + f64::from(north) / METERS_PER_DEGREE_LAT;
        let meters_per_degree_lon =
            METERS_PER_DEGREE_LAT * self.epicenter.lat.to_radians().cos().max(1e-6);
        let lon = self.epicenter.lon + f64::from(east) / meters_per_degree_lon;
        GeoPoint { lat, lon }
    }

    /// Convert a distance in grid units to metres
    #[must_use]
    pub fn grid_units_to_meters(&self, units: f32) -> f32 {
        units * *self.cell_size
    }
}
