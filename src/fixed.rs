// src/fixed.rs
//
// 16.16 fixed-point scalar and full-circle binary angle, as used by the
// classic engines this crate stays save-compatible with.

use std::fmt;
use std::ops::{Add, Neg, Sub};

pub const FRACBITS: u32 = 16;
pub const FRACUNIT: i32 = 1 << FRACBITS;

/// A 16.16 fixed-point number.
///
/// Conversion to integer is an arithmetic shift (fraction bits dropped),
/// conversion to/from floating point scales by 65536; both match the
/// original engine bit for bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(pub i32);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(FRACUNIT);

    #[inline]
    pub fn from_int(v: i32) -> Fixed {
        Fixed(v << FRACBITS)
    }

    #[inline]
    pub fn to_int(self) -> i32 {
        self.0 >> FRACBITS
    }

    #[inline]
    pub fn from_float(v: f64) -> Fixed {
        Fixed((v * FRACUNIT as f64) as i32)
    }

    #[inline]
    pub fn to_float(self) -> f64 {
        self.0 as f64 / FRACUNIT as f64
    }

    /// Fixed-point multiply: (a * b) >> 16 over a 64-bit intermediate.
    #[inline]
    pub fn mul(self, other: Fixed) -> Fixed {
        Fixed(((self.0 as i64 * other.0 as i64) >> FRACBITS) as i32)
    }

    /// Fixed-point divide. Saturates on overflow like the original
    /// FixedDiv front-end check.
    #[inline]
    pub fn div(self, other: Fixed) -> Fixed {
        if (self.0.abs() >> 14) >= other.0.abs() {
            Fixed(if (self.0 ^ other.0) < 0 {
                i32::MIN
            } else {
                i32::MAX
            })
        } else {
            Fixed((((self.0 as i64) << FRACBITS) / other.0 as i64) as i32)
        }
    }
}

impl Add for Fixed {
    type Output = Fixed;
    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Fixed {
    type Output = Fixed;
    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.wrapping_sub(rhs.0))
    }
}

impl Neg for Fixed {
    type Output = Fixed;
    fn neg(self) -> Fixed {
        Fixed(self.0.wrapping_neg())
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_float())
    }
}

/// A binary angle: the full circle mapped onto the unsigned 32-bit range.
///
/// Angles deliberately have no arithmetic coercion to other numeric kinds;
/// wrap-around on add/sub is the point of the representation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Angle(pub u32);

impl Angle {
    pub const EAST: Angle = Angle(0);
    pub const NORTH: Angle = Angle(0x4000_0000);
    pub const WEST: Angle = Angle(0x8000_0000);
    pub const SOUTH: Angle = Angle(0xC000_0000);

    pub fn from_radians(rad: f64) -> Angle {
        let turns = rad / std::f64::consts::TAU;
        Angle((turns.rem_euclid(1.0) * 4294967296.0) as u64 as u32)
    }

    pub fn to_radians(self) -> f64 {
        self.0 as f64 / 4294967296.0 * std::f64::consts::TAU
    }

    /// Direction angle of the vector (dx, dy).
    pub fn from_vector(dx: f64, dy: f64) -> Angle {
        if dx == 0.0 && dy == 0.0 {
            Angle(0)
        } else {
            Angle::from_radians(dy.atan2(dx))
        }
    }
}

impl Add for Angle {
    type Output = Angle;
    fn add(self, rhs: Angle) -> Angle {
        Angle(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Angle {
    type Output = Angle;
    fn sub(self, rhs: Angle) -> Angle {
        Angle(self.0.wrapping_sub(rhs.0))
    }
}
