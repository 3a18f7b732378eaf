//! Core types and utilities

pub mod error;
pub mod explosive;
pub mod units;

pub use error::{BlastSimError, Result};
pub use explosive::{ExplosiveSpec, ExplosiveType, GeoPoint};
pub use units::*;
