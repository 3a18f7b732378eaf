//! Explosive specification
//!
//! An `ExplosiveSpec` is the immutable input of a simulation run. Validation
//! happens here, once, so that the scaling law and everything downstream can
//! assume a finite positive mass.

use crate::core_types::error::{BlastSimError, Result};
use crate::core_types::units::Kilograms;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Explosive compound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExplosiveType {
    /// Trinitrotoluene, the reference compound
    #[default]
    Tnt,
    /// Composition C-4 (RDX-based plastic explosive)
    C4,
    /// Pentaerythritol tetranitrate
    Petn,
    /// Research Department eXplosive (cyclotrimethylenetrinitramine)
    Rdx,
    /// Ammonium nitrate / fuel oil
    Anfo,
}

impl ExplosiveType {
    /// All supported compounds, in declaration order
    pub const ALL: [ExplosiveType; 5] = [
        ExplosiveType::Tnt,
        ExplosiveType::C4,
        ExplosiveType::Petn,
        ExplosiveType::Rdx,
        ExplosiveType::Anfo,
    ];

    /// TNT-equivalence factor (energy relative to the same mass of TNT)
    ///
    /// Only C4 carries a calibrated factor; the remaining compounds default to
    /// 1.0 until calibrated values are supplied.
    #[must_use]
    pub const fn tnt_factor(self) -> f32 {
        match self {
            ExplosiveType::C4 => 1.34,
            ExplosiveType::Tnt
            | ExplosiveType::Petn
            | ExplosiveType::Rdx
            | ExplosiveType::Anfo => 1.0,
        }
    }

    /// Canonical upper-case name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ExplosiveType::Tnt => "TNT",
            ExplosiveType::C4 => "C4",
            ExplosiveType::Petn => "PETN",
            ExplosiveType::Rdx => "RDX",
            ExplosiveType::Anfo => "ANFO",
        }
    }
}

impl fmt::Display for ExplosiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExplosiveType {
    type Err = BlastSimError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "");
        ExplosiveType::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| BlastSimError::UnknownExplosive(s.to_string()))
    }
}

/// Geographic point in decimal degrees (WGS84)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, `[-90, 90]`
    pub lat: f64,
    /// Longitude in degrees, `[-180, 180]`
    pub lon: f64,
}

impl GeoPoint {
    /// Create a validated geographic point
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::InvalidEpicenter`] if either coordinate is
    /// non-finite or outside its valid range.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        if valid {
            Ok(Self { lat, lon })
        } else {
            Err(BlastSimError::InvalidEpicenter { lat, lon })
        }
    }
}

#[derive(Deserialize)]
struct RawExplosiveSpec {
    #[serde(rename = "type")]
    kind: ExplosiveType,
    mass_kg: f32,
    epicenter: GeoPoint,
}

/// Immutable description of the charge being simulated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawExplosiveSpec")]
pub struct ExplosiveSpec {
    #[serde(rename = "type")]
    kind: ExplosiveType,
    mass_kg: Kilograms,
    epicenter: GeoPoint,
}

impl TryFrom<RawExplosiveSpec> for ExplosiveSpec {
    type Error = BlastSimError;

    fn try_from(raw: RawExplosiveSpec) -> Result<Self> {
        let epicenter = GeoPoint::new(raw.epicenter.lat, raw.epicenter.lon)?;
        Self::new(raw.kind, raw.mass_kg, epicenter)
    }
}

impl ExplosiveSpec {
    /// Create a validated explosive specification
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::InvalidMass`] if `mass_kg` is zero, negative or
    /// non-finite. The scaling law never sees such a mass.
    pub fn new(kind: ExplosiveType, mass_kg: f32, epicenter: GeoPoint) -> Result<Self> {
        if !mass_kg.is_finite() || mass_kg <= 0.0 {
            return Err(BlastSimError::InvalidMass(mass_kg));
        }
        Ok(Self {
            kind,
            mass_kg: Kilograms::new(mass_kg),
            epicenter,
        })
    }

    /// Reference 1000 kg TNT charge at the origin
    #[must_use]
    pub fn reference() -> Self {
        Self {
            kind: ExplosiveType::Tnt,
            mass_kg: Kilograms::REFERENCE_CHARGE,
            epicenter: GeoPoint::default(),
        }
    }

    /// Explosive compound
    #[must_use]
    pub fn kind(&self) -> ExplosiveType {
        self.kind
    }

    /// Charge mass
    #[must_use]
    pub fn mass(&self) -> Kilograms {
        self.mass_kg
    }

    /// Detonation point
    #[must_use]
    pub fn epicenter(&self) -> GeoPoint {
        self.epicenter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tnt_factors() {
        assert_eq!(ExplosiveType::C4.tnt_factor(), 1.34);
        for kind in [
            ExplosiveType::Tnt,
            ExplosiveType::Petn,
            ExplosiveType::Rdx,
            ExplosiveType::Anfo,
        ] {
            assert_eq!(kind.tnt_factor(), 1.0, "{kind}");
        }
    }

    #[test]
    fn test_parse_explosive_type() {
        assert_eq!("c4".parse::<ExplosiveType>().unwrap(), ExplosiveType::C4);
        assert_eq!("C-4".parse::<ExplosiveType>().unwrap(), ExplosiveType::C4);
        assert_eq!(" anfo ".parse::<ExplosiveType>().unwrap(), ExplosiveType::Anfo);
        assert!(matches!(
            "semtex".parse::<ExplosiveType>(),
            Err(BlastSimError::UnknownExplosive(_))
        ));
    }

    #[test]
    fn test_mass_validation() {
        let origin = GeoPoint::default();
        assert!(ExplosiveSpec::new(ExplosiveType::Tnt, 1.0, origin).is_ok());
        for bad in [0.0, -10.0, f32::NAN, f32::INFINITY] {
            assert!(
                matches!(
                    ExplosiveSpec::new(ExplosiveType::Tnt, bad, origin),
                    Err(BlastSimError::InvalidMass(_))
                ),
                "mass {bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_epicenter_validation() {
        assert!(GeoPoint::new(51.5, -0.12).is_ok());
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -181.0).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok = r#"{"type":"C4","mass_kg":250.0,"epicenter":{"lat":40.7,"lon":-74.0}}"#;
        let spec: ExplosiveSpec = serde_json::from_str(ok).unwrap();
        assert_eq!(spec.kind(), ExplosiveType::C4);
        assert_eq!(*spec.mass(), 250.0);

        let zero_mass = r#"{"type":"TNT","mass_kg":0.0,"epicenter":{"lat":0.0,"lon":0.0}}"#;
        assert!(serde_json::from_str::<ExplosiveSpec>(zero_mass).is_err());
    }
}
