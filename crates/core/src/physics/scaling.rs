//! Cube-root (Hopkinson-Cranz) blast scaling
//!
//! Maps an explosive charge to its TNT-equivalent mass, and from there to the
//! dimensionless scale factor `λ = (W / W_ref)^(1/3)` with `W_ref = 1000 kg`.
//! Two charges produce the same overpressure at the same *scaled* distance
//! `R / λ` and *scaled* time `t / λ`.
//!
//! # References
//! - Hopkinson, B. (1915). British Ordnance Board Minutes 13565.
//! - Cranz, C. (1926). Lehrbuch der Ballistik. Springer, Berlin.
//! - Kinney, G.F., Graham, K.J. (1985). "Explosive Shocks in Air", 2nd ed. Springer.
//!
//! All functions here are total. The mass is validated once in
//! [`ExplosiveSpec::new`](crate::core_types::ExplosiveSpec::new) and is not
//! re-checked.

use crate::core_types::explosive::{ExplosiveSpec, ExplosiveType};
use crate::core_types::units::{Kilograms, Meters};

/// Characteristic blast radius of the reference charge (m)
pub const BASE_BLAST_RADIUS_M: f32 = 100.0;

/// Convert a charge mass to TNT-equivalent mass
///
/// # Example
/// ```
/// use blast_sim_core::physics::scaling::tnt_equivalent;
/// use blast_sim_core::core_types::{ExplosiveType, Kilograms};
///
/// let w = tnt_equivalent(ExplosiveType::C4, Kilograms::new(1000.0));
/// assert!((*w - 1340.0).abs() < 1e-3);
/// ```
#[must_use]
pub fn tnt_equivalent(kind: ExplosiveType, mass: Kilograms) -> Kilograms {
    Kilograms::new(*mass * kind.tnt_factor())
}

/// Cube-root scale factor `λ = (W / 1000)^(1/3)`
///
/// The reference charge of 1000 kg TNT has a scale factor of exactly 1.0.
#[must_use]
pub fn scaled_distance(equivalent_mass: Kilograms) -> f32 {
    (*equivalent_mass / *Kilograms::REFERENCE_CHARGE).cbrt()
}

/// Characteristic blast radius `base_radius × λ`
#[must_use]
pub fn blast_radius_m(scale_factor: f32, base_radius: Meters) -> Meters {
    Meters::new(*base_radius * scale_factor)
}

/// Scaling quantities derived once per simulation run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlastScaling {
    /// TNT-equivalent mass of the charge
    pub tnt_equivalent: Kilograms,
    /// Cube-root scale factor (dimensionless, 1.0 for 1000 kg TNT)
    pub scale_factor: f32,
    /// Characteristic blast radius
    pub blast_radius: Meters,
}

impl BlastScaling {
    /// Derive scaling for a validated explosive specification
    #[must_use]
    pub fn from_spec(spec: &ExplosiveSpec) -> Self {
        let tnt_equivalent = tnt_equivalent(spec.kind(), spec.mass());
        let scale_factor = scaled_distance(tnt_equivalent);
        Self {
            tnt_equivalent,
            scale_factor,
            blast_radius: blast_radius_m(scale_factor, Meters::new(BASE_BLAST_RADIUS_M)),
        }
    }

    /// Convert a physical time to the reference charge's time axis (`t / λ`)
    ///
    /// Heavier charges evolve more slowly: their waveform at `t` matches the
    /// reference waveform at `t / λ`. Detonation maps to detonation even when a
    /// vanishing charge underflows `λ` to zero.
    #[inline]
    #[must_use]
    pub fn scaled_time(&self, time_s: f32) -> f32 {
        if time_s == 0.0 {
            return 0.0;
        }
        time_s / self.scale_factor
    }
}
