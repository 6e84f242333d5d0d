// src/dmu/value.rs
//
// The value kinds a property can carry, and the numeric coercion table
// applied when marshaling between a property's native representation and
// the caller's requested one. The table is the same in both directions;
// incompatible pairs are a hard error, never a silent zero.

use crate::errors::DmuError;
use crate::dmu::handle::ElementRef;
use crate::fixed::{Angle, Fixed, FRACBITS, FRACUNIT};

/// Tag for the wire representation of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Byte,
    Short,
    Int,
    Fixed,
    Float,
    Double,
    Angle,
    BlendMode,
    Element,
}

/// Surface blend modes. A bounded enumeration: writing one from an
/// out-of-range integer is a fatal error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum BlendMode {
    #[default]
    Normal = 0,
    Add = 1,
    Subtract = 2,
    ReverseSubtract = 3,
    Mul = 4,
    InverseMul = 5,
}

impl BlendMode {
    pub fn from_int(v: i32) -> Result<BlendMode, DmuError> {
        Ok(match v {
            0 => BlendMode::Normal,
            1 => BlendMode::Add,
            2 => BlendMode::Subtract,
            3 => BlendMode::ReverseSubtract,
            4 => BlendMode::Mul,
            5 => BlendMode::InverseMul,
            _ => return Err(DmuError::BadBlendMode(v)),
        })
    }
}

/// A single property value in some representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(u8),
    Short(i16),
    Int(i32),
    Fixed(Fixed),
    Float(f32),
    Double(f64),
    Angle(Angle),
    BlendMode(BlendMode),
    Element(ElementRef),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Byte(_) => ValueKind::Byte,
            Value::Short(_) => ValueKind::Short,
            Value::Int(_) => ValueKind::Int,
            Value::Fixed(_) => ValueKind::Fixed,
            Value::Float(_) => ValueKind::Float,
            Value::Double(_) => ValueKind::Double,
            Value::Angle(_) => ValueKind::Angle,
            Value::BlendMode(_) => ValueKind::BlendMode,
            Value::Element(_) => ValueKind::Element,
        }
    }

    fn bad(&self, to: ValueKind) -> DmuError {
        DmuError::BadCoercion {
            from: self.kind(),
            to,
        }
    }

    /// Truthiness is exact zero versus nonzero, for floats included.
    pub fn to_bool(&self) -> Result<bool, DmuError> {
        match *self {
            Value::Bool(v) => Ok(v),
            Value::Byte(v) => Ok(v != 0),
            Value::Short(v) => Ok(v != 0),
            Value::Int(v) => Ok(v != 0),
            Value::Float(v) => Ok(v != 0.0),
            Value::Double(v) => Ok(v != 0.0),
            _ => Err(self.bad(ValueKind::Bool)),
        }
    }

    pub fn to_byte(&self) -> Result<u8, DmuError> {
        match *self {
            Value::Bool(v) => Ok(v as u8),
            Value::Byte(v) => Ok(v),
            Value::Short(v) => Ok(v as u8),
            Value::Int(v) => Ok(v as u8),
            Value::Float(v) => Ok(v as u8),
            Value::Double(v) => Ok(v as u8),
            _ => Err(self.bad(ValueKind::Byte)),
        }
    }

    pub fn to_short(&self) -> Result<i16, DmuError> {
        match *self {
            Value::Bool(v) => Ok(v as i16),
            Value::Byte(v) => Ok(v as i16),
            Value::Short(v) => Ok(v),
            Value::Int(v) => Ok(v as i16),
            Value::Float(v) => Ok(v as i16),
            Value::Double(v) => Ok(v as i16),
            _ => Err(self.bad(ValueKind::Short)),
        }
    }

    pub fn to_int(&self) -> Result<i32, DmuError> {
        match *self {
            Value::Bool(v) => Ok(v as i32),
            Value::Byte(v) => Ok(v as i32),
            Value::Short(v) => Ok(v as i32),
            Value::Int(v) => Ok(v),
            Value::Fixed(v) => Ok(v.0 >> FRACBITS),
            Value::Float(v) => Ok(v as i32),
            Value::Double(v) => Ok(v as i32),
            Value::BlendMode(v) => Ok(v as i32),
            _ => Err(self.bad(ValueKind::Int)),
        }
    }

    pub fn to_fixed(&self) -> Result<Fixed, DmuError> {
        match *self {
            Value::Int(v) => Ok(Fixed(v << FRACBITS)),
            Value::Fixed(v) => Ok(v),
            Value::Float(v) => Ok(Fixed((v as f64 * FRACUNIT as f64) as i32)),
            Value::Double(v) => Ok(Fixed((v * FRACUNIT as f64) as i32)),
            _ => Err(self.bad(ValueKind::Fixed)),
        }
    }

    pub fn to_float(&self) -> Result<f32, DmuError> {
        match *self {
            Value::Bool(v) => Ok(v as u8 as f32),
            Value::Byte(v) => Ok(v as f32),
            Value::Short(v) => Ok(v as f32),
            Value::Int(v) => Ok(v as f32),
            Value::Fixed(v) => Ok(v.to_float() as f32),
            Value::Float(v) => Ok(v),
            Value::Double(v) => Ok(v as f32),
            _ => Err(self.bad(ValueKind::Float)),
        }
    }

    pub fn to_double(&self) -> Result<f64, DmuError> {
        match *self {
            Value::Bool(v) => Ok(v as u8 as f64),
            Value::Byte(v) => Ok(v as f64),
            Value::Short(v) => Ok(v as f64),
            Value::Int(v) => Ok(v as f64),
            Value::Fixed(v) => Ok(v.to_float()),
            Value::Float(v) => Ok(v as f64),
            Value::Double(v) => Ok(v),
            _ => Err(self.bad(ValueKind::Double)),
        }
    }

    /// Angles have no arithmetic coercion to any other kind.
    pub fn to_angle(&self) -> Result<Angle, DmuError> {
        match *self {
            Value::Angle(v) => Ok(v),
            _ => Err(self.bad(ValueKind::Angle)),
        }
    }

    pub fn to_blend_mode(&self) -> Result<BlendMode, DmuError> {
        match *self {
            Value::BlendMode(v) => Ok(v),
            Value::Int(v) => BlendMode::from_int(v),
            Value::Byte(v) => BlendMode::from_int(v as i32),
            _ => Err(self.bad(ValueKind::BlendMode)),
        }
    }

    /// Element references never come from bare integers here; the
    /// index-to-reference direction is the dispatcher's job because it
    /// needs the map's storage to validate the index.
    pub fn to_element(&self) -> Result<ElementRef, DmuError> {
        match *self {
            Value::Element(v) => Ok(v),
            _ => Err(self.bad(ValueKind::Element)),
        }
    }

    /// Re-expresses the value in the requested kind, applying the
    /// coercion table. `Element` to `Int` is handled by the dispatcher
    /// (it requires the element-to-index mapping) and is rejected here.
    pub fn coerce(&self, want: ValueKind) -> Result<Value, DmuError> {
        Ok(match want {
            ValueKind::Bool => Value::Bool(self.to_bool()?),
            ValueKind::Byte => Value::Byte(self.to_byte()?),
            ValueKind::Short => Value::Short(self.to_short()?),
            ValueKind::Int => Value::Int(self.to_int()?),
            ValueKind::Fixed => Value::Fixed(self.to_fixed()?),
            ValueKind::Float => Value::Float(self.to_float()?),
            ValueKind::Double => Value::Double(self.to_double()?),
            ValueKind::Angle => Value::Angle(self.to_angle()?),
            ValueKind::BlendMode => Value::BlendMode(self.to_blend_mode()?),
            ValueKind::Element => Value::Element(self.to_element()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_truthiness_is_exact_zero() {
        assert_eq!(Value::Double(0.0).to_bool(), Ok(false));
        assert_eq!(Value::Double(1e-300).to_bool(), Ok(true));
        assert_eq!(Value::Int(-1).to_bool(), Ok(true));
        assert_eq!(Value::Bool(true).to_int(), Ok(1));
    }

    #[test]
    fn test_fixed_int_shift() {
        // 1.5 in 16.16 truncates to 1.
        assert_eq!(Value::Fixed(Fixed(3 * FRACUNIT / 2)).to_int(), Ok(1));
        assert_eq!(Value::Int(2).to_fixed(), Ok(Fixed(2 * FRACUNIT)));
    }

    #[test]
    fn test_fixed_float_scale() {
        assert_eq!(Value::Double(1.5).to_fixed(), Ok(Fixed(98304)));
        assert_eq!(Value::Fixed(Fixed(98304)).to_double(), Ok(1.5));
    }

    #[test]
    fn test_angle_is_isolated() {
        let a = Value::Angle(Angle(0x4000_0000));
        assert_eq!(a.to_angle(), Ok(Angle(0x4000_0000)));
        assert_eq!(
            a.to_int(),
            Err(DmuError::BadCoercion {
                from: ValueKind::Angle,
                to: ValueKind::Int
            })
        );
        assert!(Value::Int(1).to_angle().is_err());
    }

    #[test]
    fn test_blend_mode_bounds() {
        assert_eq!(Value::Int(1).to_blend_mode(), Ok(BlendMode::Add));
        assert_eq!(Value::Int(9).to_blend_mode(), Err(DmuError::BadBlendMode(9)));
        assert_eq!(Value::Int(-1).to_blend_mode(), Err(DmuError::BadBlendMode(-1)));
    }

    #[test]
    fn test_element_rejects_numeric() {
        assert!(Value::Int(3).to_element().is_err());
        assert!(Value::Element(ElementRef::None).to_double().is_err());
    }

    #[test]
    fn test_narrowing_matches_cast_semantics() {
        assert_eq!(Value::Int(300).to_byte(), Ok(300i32 as u8));
        assert_eq!(Value::Double(-1.9).to_int(), Ok(-1));
    }
}
