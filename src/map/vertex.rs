// src/map/vertex.rs

use crate::dmu::handle::ElementType;
use crate::dmu::property::Property;
use crate::dmu::value::Value;
use crate::errors::DmuError;

/// A 2D point in map space. Owned by the map; lines reference vertices by
/// id and never own them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vertex {
    pub origin: [f64; 2],
}

impl Vertex {
    pub fn new(x: f64, y: f64) -> Self {
        Vertex { origin: [x, y] }
    }

    pub fn x(&self) -> f64 {
        self.origin[0]
    }

    pub fn y(&self) -> f64 {
        self.origin[1]
    }

    pub fn matches(&self, x: f64, y: f64) -> bool {
        self.origin[0] == x && self.origin[1] == y
    }

    pub(crate) fn property(&self, prop: Property) -> Result<Vec<Value>, DmuError> {
        Ok(match prop {
            Property::X => vec![Value::Double(self.origin[0])],
            Property::Y => vec![Value::Double(self.origin[1])],
            Property::Xy => vec![
                Value::Double(self.origin[0]),
                Value::Double(self.origin[1]),
            ],
            _ => {
                return Err(DmuError::UnknownProperty {
                    ty: ElementType::Vertex,
                    prop,
                })
            }
        })
    }

    pub(crate) fn set_property(
        &mut self,
        prop: Property,
        vals: &[Value],
    ) -> Result<bool, DmuError> {
        match prop {
            Property::X => self.origin[0] = vals[0].to_double()?,
            Property::Y => self.origin[1] = vals[0].to_double()?,
            Property::Xy => {
                self.origin[0] = vals[0].to_double()?;
                self.origin[1] = vals[1].to_double()?;
            }
            _ => {
                return Err(DmuError::UnknownProperty {
                    ty: ElementType::Vertex,
                    prop,
                })
            }
        }
        Ok(true)
    }
}
