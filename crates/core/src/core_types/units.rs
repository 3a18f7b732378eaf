//! Semantic unit types for blast quantities
//!
//! Newtype wrappers keep pressures, velocities, masses and times from being mixed
//! up at API boundaries. Field grids stay raw `f32` for throughput; the scalar
//! summaries that cross module boundaries use these types.
//!
//! # Design Philosophy
//! - All quantities are `f32`, matching the field grids
//! - Total ordering via `Ord` (`total_cmp`), so `min`/`max` work directly
//! - `Deref` to the raw value for arithmetic-heavy code
//! - Serde support for configuration and sample tables
//!
//! # Usage
//! ```
//! use blast_sim_core::core_types::units::{Bar, Seconds};
//!
//! let p = Bar::new(4.5);
//! assert_eq!(*p, 4.5);
//! assert_eq!(Seconds::new(1.0).max(Seconds::new(2.0)), Seconds::new(2.0));
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

/// Non-negative scalar quantity newtype with total ordering and a unit suffix.
macro_rules! non_negative_unit {
    ($(#[$meta:meta])* $name:ident, $suffix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(f32);

        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.total_cmp(&other.0)
            }
        }

        impl Deref for $name {
            type Target = f32;
            #[inline]
            fn deref(&self) -> &f32 {
                &self.0
            }
        }

        impl $name {
            /// Zero value
            pub const ZERO: $name = $name(0.0);

            #[doc = concat!("Create a new `", stringify!($name), "`. Asserts the value is non-negative (NaN is rejected).")]
            #[inline]
            #[must_use]
            #[track_caller]
            pub fn new(value: f32) -> Self {
                assert!(
                    value >= 0.0,
                    concat!(stringify!($name), "::new: negative value is invalid")
                );
                $name(value)
            }

            /// Get the raw f32 value
            #[inline]
            #[must_use]
            pub fn value(self) -> f32 {
                self.0
            }
        }

        impl From<$name> for f32 {
            fn from(v: $name) -> f32 {
                v.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if let Some(precision) = f.precision() {
                    write!(f, "{:.*} {}", precision, self.0, $suffix)
                } else {
                    write!(f, "{} {}", self.0, $suffix)
                }
            }
        }
    };
}

non_negative_unit!(
    /// Mass in kilograms (charge mass, TNT-equivalent mass)
    Kilograms,
    "kg"
);

non_negative_unit!(
    /// Time since detonation in seconds
    Seconds,
    "s"
);

non_negative_unit!(
    /// Overpressure in bar
    Bar,
    "bar"
);

non_negative_unit!(
    /// Particle velocity in metres per second
    MetersPerSecond,
    "m/s"
);

non_negative_unit!(
    /// Distance in metres
    Meters,
    "m"
);

impl Kilograms {
    /// Reference charge that defines unit scale for cube-root scaling (1 tonne TNT)
    pub const REFERENCE_CHARGE: Kilograms = Kilograms(1000.0);
}
