// src/map/surface.rs

use crate::dmu::handle::{ElementRef, ElementType, MaterialId};
use crate::dmu::property::Property;
use crate::dmu::value::{BlendMode, Value};
use crate::errors::DmuError;

/// Surface flags (skip-drawing hints, texture fit modes and the like).
/// Stored verbatim; the renderer interprets them.
pub type SurfaceFlags = i32;

/// One drawable face: a wall section of a side, or the face of a plane.
///
/// Owned by exactly one plane or side section. Carries the material
/// reference and everything the renderer needs to shade it; the
/// `needs_update` flag is raised on every write so deferred recomputation
/// (decorations, reverb, bias lighting) can pick the surface up later.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub material: Option<MaterialId>,
    pub offset: [f64; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
    pub normal: [f32; 3],
    /// RGB tint plus alpha.
    pub color: [f32; 4],
    pub blend: BlendMode,
    pub flags: SurfaceFlags,
    pub needs_update: bool,
}

impl Default for Surface {
    fn default() -> Self {
        Surface {
            material: None,
            offset: [0.0, 0.0],
            tangent: [1.0, 0.0, 0.0],
            bitangent: [0.0, 1.0, 0.0],
            normal: [0.0, 0.0, 1.0],
            color: [1.0, 1.0, 1.0, 1.0],
            blend: BlendMode::Normal,
            flags: 0,
            needs_update: false,
        }
    }
}

impl Surface {
    fn material_ref(&self) -> ElementRef {
        match self.material {
            Some(id) => ElementRef::Material(id),
            None => ElementRef::None,
        }
    }

    pub(crate) fn property(&self, prop: Property) -> Result<Vec<Value>, DmuError> {
        Ok(match prop {
            Property::Material => vec![Value::Element(self.material_ref())],
            Property::OffsetX => vec![Value::Double(self.offset[0])],
            Property::OffsetY => vec![Value::Double(self.offset[1])],
            Property::OffsetXy => vec![
                Value::Double(self.offset[0]),
                Value::Double(self.offset[1]),
            ],
            Property::TangentX => vec![Value::Float(self.tangent[0])],
            Property::TangentY => vec![Value::Float(self.tangent[1])],
            Property::TangentZ => vec![Value::Float(self.tangent[2])],
            Property::Tangent => self.tangent.iter().map(|&c| Value::Float(c)).collect(),
            Property::BitangentX => vec![Value::Float(self.bitangent[0])],
            Property::BitangentY => vec![Value::Float(self.bitangent[1])],
            Property::BitangentZ => vec![Value::Float(self.bitangent[2])],
            Property::Bitangent => self.bitangent.iter().map(|&c| Value::Float(c)).collect(),
            Property::NormalX => vec![Value::Float(self.normal[0])],
            Property::NormalY => vec![Value::Float(self.normal[1])],
            Property::NormalZ => vec![Value::Float(self.normal[2])],
            Property::Normal => self.normal.iter().map(|&c| Value::Float(c)).collect(),
            Property::ColorRed => vec![Value::Float(self.color[0])],
            Property::ColorGreen => vec![Value::Float(self.color[1])],
            Property::ColorBlue => vec![Value::Float(self.color[2])],
            Property::Color => vec![
                Value::Float(self.color[0]),
                Value::Float(self.color[1]),
                Value::Float(self.color[2]),
            ],
            Property::Alpha => vec![Value::Float(self.color[3])],
            Property::BlendMode => vec![Value::BlendMode(self.blend)],
            Property::Flags => vec![Value::Int(self.flags)],
            _ => {
                return Err(DmuError::UnknownProperty {
                    ty: ElementType::Surface,
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
            Property::Material => {
                self.material = match vals[0].to_element()? {
                    ElementRef::Material(id) => Some(id),
                    ElementRef::None => None,
                    other => {
                        return Err(DmuError::InvalidType(other.embedded_type()));
                    }
                };
            }
            Property::OffsetX => self.offset[0] = vals[0].to_double()?,
            Property::OffsetY => self.offset[1] = vals[0].to_double()?,
            Property::OffsetXy => {
                self.offset[0] = vals[0].to_double()?;
                self.offset[1] = vals[1].to_double()?;
            }
            Property::ColorRed => self.color[0] = vals[0].to_float()?.clamp(0.0, 1.0),
            Property::ColorGreen => self.color[1] = vals[0].to_float()?.clamp(0.0, 1.0),
            Property::ColorBlue => self.color[2] = vals[0].to_float()?.clamp(0.0, 1.0),
            Property::Color => {
                for (i, v) in vals.iter().enumerate().take(3) {
                    self.color[i] = v.to_float()?.clamp(0.0, 1.0);
                }
            }
            Property::Alpha => self.color[3] = vals[0].to_float()?.clamp(0.0, 1.0),
            Property::BlendMode => self.blend = vals[0].to_blend_mode()?,
            Property::Flags => self.flags = vals[0].to_int()?,
            _ => {
                // Tangent space is derived from the owner's geometry, so
                // it reads but never writes.
                return Err(if self.property(prop).is_ok() {
                    DmuError::NotWritable {
                        ty: ElementType::Surface,
                        prop,
                    }
                } else {
                    DmuError::UnknownProperty {
                        ty: ElementType::Surface,
                        prop,
                    }
                });
            }
        }
        self.needs_update = true;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_get_set() {
        let mut s = Surface::default();
        assert_eq!(
            s.property(Property::Material).unwrap(),
            vec![Value::Element(ElementRef::None)]
        );

        s.set_property(
            Property::Material,
            &[Value::Element(ElementRef::Material(MaterialId(7)))],
        )
        .unwrap();
        assert_eq!(s.material, Some(MaterialId(7)));
        assert!(s.needs_update);
    }

    #[test]
    fn test_blend_mode_from_int_is_bounds_checked() {
        let mut s = Surface::default();
        s.set_property(Property::BlendMode, &[Value::Int(1)]).unwrap();
        assert_eq!(s.blend, BlendMode::Add);

        assert_eq!(
            s.set_property(Property::BlendMode, &[Value::Int(42)]),
            Err(DmuError::BadBlendMode(42))
        );
    }

    #[test]
    fn test_normal_is_read_only() {
        let mut s = Surface::default();
        assert_eq!(
            s.set_property(Property::NormalZ, &[Value::Float(0.5)]),
            Err(DmuError::NotWritable {
                ty: ElementType::Surface,
                prop: Property::NormalZ
            })
        );
    }

    #[test]
    fn test_alpha_clamps() {
        let mut s = Surface::default();
        s.set_property(Property::Alpha, &[Value::Float(2.5)]).unwrap();
        assert_eq!(s.color[3], 1.0);
    }
}
