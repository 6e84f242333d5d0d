// src/map/sector.rs

use crate::dmu::handle::{
    ElementRef, ElementType, LeafId, LineId, PlaneId, SectorId, PLANE_CEILING, PLANE_FLOOR,
};
use crate::dmu::property::Property;
use crate::dmu::value::Value;
use crate::errors::DmuError;
use crate::map::surface::Surface;
use crate::utils::Aabb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneKind {
    Floor,
    Ceiling,
    /// Extra planes for sloped / stacked-sector extensions.
    Extra,
}

/// A horizontal plane of a sector. Owns exactly one surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub kind: PlaneKind,
    pub height: f64,
    /// Where a plane mover is taking the height.
    pub target_height: f64,
    pub speed: f64,
    pub surface: Surface,
}

impl Plane {
    pub fn new(kind: PlaneKind, height: f64) -> Self {
        let mut surface = Surface::default();
        // Floors face up, ceilings face down.
        surface.normal = match kind {
            PlaneKind::Ceiling => [0.0, 0.0, -1.0],
            _ => [0.0, 0.0, 1.0],
        };
        Plane {
            kind,
            height,
            target_height: height,
            speed: 0.0,
            surface,
        }
    }

    /// Remaps a delegated surface error so the caller sees the type it
    /// actually addressed.
    fn as_plane_error(err: DmuError) -> DmuError {
        match err {
            DmuError::UnknownProperty { prop, .. } => DmuError::UnknownProperty {
                ty: ElementType::Plane,
                prop,
            },
            DmuError::NotWritable { prop, .. } => DmuError::NotWritable {
                ty: ElementType::Plane,
                prop,
            },
            other => other,
        }
    }

    pub(crate) fn property(&self, prop: Property) -> Result<Vec<Value>, DmuError> {
        match prop {
            Property::Height => Ok(vec![Value::Double(self.height)]),
            Property::TargetHeight => Ok(vec![Value::Double(self.target_height)]),
            Property::Speed => Ok(vec![Value::Double(self.speed)]),
            // Everything else is the plane's surface speaking.
            _ => self.surface.property(prop).map_err(Self::as_plane_error),
        }
    }

    pub(crate) fn set_property(
        &mut self,
        prop: Property,
        vals: &[Value],
    ) -> Result<bool, DmuError> {
        match prop {
            Property::Height => {
                self.height = vals[0].to_double()?;
                self.surface.needs_update = true;
                Ok(true)
            }
            Property::TargetHeight => {
                self.target_height = vals[0].to_double()?;
                Ok(false)
            }
            Property::Speed => {
                self.speed = vals[0].to_double()?;
                Ok(false)
            }
            _ => self
                .surface
                .set_property(prop, vals)
                .map_err(Self::as_plane_error),
        }
    }
}

/// A closed 2D region: two or more planes, a light, and the lines and BSP
/// leafs that bound and fill it. Line and leaf lists are derived state,
/// rebuilt by `Map::link`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sector {
    pub light_level: f32,
    pub light_color: [f32; 3],
    pub planes: Vec<Plane>,
    pub tag: i32,
    pub lines: Vec<LineId>,
    pub leafs: Vec<LeafId>,
    pub bounds: Aabb,
}

impl Sector {
    pub fn new(floor_height: f64, ceiling_height: f64, light_level: f32) -> Self {
        Sector {
            light_level,
            light_color: [1.0, 1.0, 1.0],
            planes: vec![
                Plane::new(PlaneKind::Floor, floor_height),
                Plane::new(PlaneKind::Ceiling, ceiling_height),
            ],
            tag: 0,
            lines: Vec::new(),
            leafs: Vec::new(),
            bounds: Aabb::new_empty(),
        }
    }

    pub fn floor(&self) -> &Plane {
        &self.planes[PLANE_FLOOR as usize]
    }

    pub fn ceiling(&self) -> &Plane {
        &self.planes[PLANE_CEILING as usize]
    }

    pub fn floor_height(&self) -> f64 {
        self.floor().height
    }

    pub fn ceiling_height(&self) -> f64 {
        self.ceiling().height
    }

    /// Vertical gap between floor and ceiling.
    pub fn headroom(&self) -> f64 {
        self.ceiling_height() - self.floor_height()
    }

    pub fn plane(&self, index: u16) -> Result<&Plane, DmuError> {
        self.planes
            .get(index as usize)
            .ok_or(DmuError::IndexOutOfRange {
                ty: ElementType::Plane,
                index: index as usize,
                count: self.planes.len(),
            })
    }

    pub fn plane_mut(&mut self, index: u16) -> Result<&mut Plane, DmuError> {
        let count = self.planes.len();
        self.planes
            .get_mut(index as usize)
            .ok_or(DmuError::IndexOutOfRange {
                ty: ElementType::Plane,
                index: index as usize,
                count,
            })
    }

    pub(crate) fn property(&self, self_id: SectorId, prop: Property) -> Result<Vec<Value>, DmuError> {
        Ok(match prop {
            Property::LightLevel => vec![Value::Float(self.light_level)],
            Property::ColorRed => vec![Value::Float(self.light_color[0])],
            Property::ColorGreen => vec![Value::Float(self.light_color[1])],
            Property::ColorBlue => vec![Value::Float(self.light_color[2])],
            Property::Color => vec![
                Value::Float(self.light_color[0]),
                Value::Float(self.light_color[1]),
                Value::Float(self.light_color[2]),
            ],
            Property::PlaneCount => vec![Value::Int(self.planes.len() as i32)],
            Property::Tag => vec![Value::Int(self.tag)],
            Property::FloorPlane => vec![Value::Element(ElementRef::Plane(PlaneId {
                sector: self_id,
                plane: PLANE_FLOOR,
            }))],
            Property::CeilingPlane => vec![Value::Element(ElementRef::Plane(PlaneId {
                sector: self_id,
                plane: PLANE_CEILING,
            }))],
            Property::BoundingBox => vec![
                Value::Double(self.bounds.min[0]),
                Value::Double(self.bounds.min[1]),
                Value::Double(self.bounds.max[0]),
                Value::Double(self.bounds.max[1]),
            ],
            _ => {
                return Err(DmuError::UnknownProperty {
                    ty: ElementType::Sector,
                    prop,
                })
            }
        })
    }

    pub(crate) fn set_property(
        &mut self,
        self_id: SectorId,
        prop: Property,
        vals: &[Value],
    ) -> Result<bool, DmuError> {
        match prop {
            Property::LightLevel => {
                self.light_level = vals[0].to_float()?.clamp(0.0, 1.0);
                Ok(true)
            }
            Property::ColorRed => {
                self.light_color[0] = vals[0].to_float()?.clamp(0.0, 1.0);
                Ok(true)
            }
            Property::ColorGreen => {
                self.light_color[1] = vals[0].to_float()?.clamp(0.0, 1.0);
                Ok(true)
            }
            Property::ColorBlue => {
                self.light_color[2] = vals[0].to_float()?.clamp(0.0, 1.0);
                Ok(true)
            }
            Property::Color => {
                for (i, v) in vals.iter().enumerate().take(3) {
                    self.light_color[i] = v.to_float()?.clamp(0.0, 1.0);
                }
                Ok(true)
            }
            Property::Tag => {
                self.tag = vals[0].to_int()?;
                Ok(false)
            }
            _ => Err(if self.property(self_id, prop).is_ok() {
                DmuError::NotWritable {
                    ty: ElementType::Sector,
                    prop,
                }
            } else {
                DmuError::UnknownProperty {
                    ty: ElementType::Sector,
                    prop,
                }
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sector_has_floor_and_ceiling() {
        let s = Sector::new(0.0, 128.0, 0.75);
        assert_eq!(s.planes.len(), 2);
        assert_eq!(s.floor().kind, PlaneKind::Floor);
        assert_eq!(s.ceiling().kind, PlaneKind::Ceiling);
        assert_eq!(s.headroom(), 128.0);
        assert_eq!(s.floor().surface.normal, [0.0, 0.0, 1.0]);
        assert_eq!(s.ceiling().surface.normal, [0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_plane_height_property() {
        let mut p = Plane::new(PlaneKind::Floor, 16.0);
        assert_eq!(p.property(Property::Height).unwrap(), vec![Value::Double(16.0)]);

        assert!(p.set_property(Property::Height, &[Value::Int(24)]).unwrap());
        assert_eq!(p.height, 24.0);
        // Target/speed changes do not dirty the owner.
        assert!(!p
            .set_property(Property::TargetHeight, &[Value::Double(64.0)])
            .unwrap());
    }

    #[test]
    fn test_plane_delegates_surface_properties() {
        let mut p = Plane::new(PlaneKind::Floor, 0.0);
        p.set_property(Property::Alpha, &[Value::Float(0.5)]).unwrap();
        assert_eq!(p.surface.color[3], 0.5);

        // Errors report the plane, not its surface.
        assert_eq!(
            p.property(Property::Length),
            Err(DmuError::UnknownProperty {
                ty: ElementType::Plane,
                prop: Property::Length
            })
        );
    }

    #[test]
    fn test_sector_plane_refs() {
        let s = Sector::new(0.0, 64.0, 1.0);
        let id = SectorId(5);
        assert_eq!(
            s.property(id, Property::FloorPlane).unwrap(),
            vec![Value::Element(ElementRef::Plane(PlaneId {
                sector: id,
                plane: PLANE_FLOOR
            }))]
        );
        assert_eq!(
            s.property(id, Property::PlaneCount).unwrap(),
            vec![Value::Int(2)]
        );
    }

    #[test]
    fn test_plane_count_is_read_only() {
        let mut s = Sector::new(0.0, 64.0, 1.0);
        assert_eq!(
            s.set_property(SectorId(0), Property::PlaneCount, &[Value::Int(3)]),
            Err(DmuError::NotWritable {
                ty: ElementType::Sector,
                prop: Property::PlaneCount
            })
        );
    }
}
