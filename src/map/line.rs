// src/map/line.rs

use crate::dmu::handle::{
    ElementRef, ElementType, LineId, SectorId, SideId, SideSection, VertexId,
};
use crate::dmu::property::Property;
use crate::dmu::value::Value;
use crate::errors::DmuError;
use crate::fixed::Angle;
use crate::map::surface::Surface;
use crate::utils::Aabb;

/// Classic line flags. Stored verbatim from the conversion step; only
/// BLOCKING and TWO_SIDED matter to this crate.
pub mod line_flags {
    pub const BLOCKING: i32 = 0x0001;
    pub const BLOCK_MONSTERS: i32 = 0x0002;
    pub const TWO_SIDED: i32 = 0x0004;
    pub const UPPER_UNPEGGED: i32 = 0x0008;
    pub const LOWER_UNPEGGED: i32 = 0x0010;
    pub const SECRET: i32 = 0x0020;
    pub const BLOCK_SOUND: i32 = 0x0040;
    pub const HIDDEN: i32 = 0x0080;
    pub const MAPPED: i32 = 0x0100;
}

/// Gradient classification of a line's direction, used by the classic
/// box-side tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlopeType {
    Horizontal,
    Vertical,
    Positive,
    Negative,
}

impl SlopeType {
    pub fn classify(dx: f64, dy: f64) -> SlopeType {
        if dx == 0.0 {
            SlopeType::Vertical
        } else if dy == 0.0 {
            SlopeType::Horizontal
        } else if dy / dx > 0.0 {
            SlopeType::Positive
        } else {
            SlopeType::Negative
        }
    }
}

/// One face of a line. Belongs to exactly one line and faces at most one
/// sector; owns the three wall surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSide {
    pub line: LineId,
    pub sector: Option<SectorId>,
    pub top: Surface,
    pub middle: Surface,
    pub bottom: Surface,
    pub flags: i32,
}

impl LineSide {
    pub fn new(line: LineId, sector: Option<SectorId>) -> Self {
        LineSide {
            line,
            sector,
            top: Surface::default(),
            middle: Surface::default(),
            bottom: Surface::default(),
            flags: 0,
        }
    }

    pub fn surface(&self, section: SideSection) -> &Surface {
        match section {
            SideSection::Top => &self.top,
            SideSection::Middle => &self.middle,
            SideSection::Bottom => &self.bottom,
        }
    }

    pub fn surface_mut(&mut self, section: SideSection) -> &mut Surface {
        match section {
            SideSection::Top => &mut self.top,
            SideSection::Middle => &mut self.middle,
            SideSection::Bottom => &mut self.bottom,
        }
    }

    fn sector_ref(&self) -> ElementRef {
        match self.sector {
            Some(id) => ElementRef::Sector(id),
            None => ElementRef::None,
        }
    }

    pub(crate) fn property(&self, prop: Property) -> Result<Vec<Value>, DmuError> {
        Ok(match prop {
            Property::Sector => vec![Value::Element(self.sector_ref())],
            Property::Line => vec![Value::Element(ElementRef::Line(self.line))],
            Property::Flags => vec![Value::Int(self.flags)],
            _ => {
                return Err(DmuError::UnknownProperty {
                    ty: ElementType::Side,
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
            Property::Flags => {
                self.flags = vals[0].to_int()?;
                Ok(true)
            }
            Property::Sector => {
                self.sector = match vals[0].to_element()? {
                    ElementRef::Sector(id) => Some(id),
                    ElementRef::None => None,
                    other => return Err(DmuError::InvalidType(other.embedded_type())),
                };
                Ok(true)
            }
            _ => Err(if self.property(prop).is_ok() {
                DmuError::NotWritable {
                    ty: ElementType::Side,
                    prop,
                }
            } else {
                DmuError::UnknownProperty {
                    ty: ElementType::Side,
                    prop,
                }
            }),
        }
    }
}

/// A line between two vertices. Owns up to two sides; a finished map
/// always gives it a front side, the back may be absent (one-sided wall).
///
/// Direction, length, angle, slope and bounds are caches over the vertex
/// positions, refreshed by the map when a vertex moves.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub v: [VertexId; 2],
    pub front: Option<SideId>,
    pub back: Option<SideId>,
    pub flags: i32,
    pub tag: i32,

    pub direction: [f64; 2],
    pub length: f64,
    pub angle: Angle,
    pub slope: SlopeType,
    pub bounds: Aabb,
}

impl Line {
    pub fn new(v0: VertexId, v1: VertexId) -> Self {
        Line {
            v: [v0, v1],
            front: None,
            back: None,
            flags: 0,
            tag: 0,
            direction: [0.0, 0.0],
            length: 0.0,
            angle: Angle(0),
            slope: SlopeType::Horizontal,
            bounds: Aabb::new_empty(),
        }
    }

    pub fn is_two_sided(&self) -> bool {
        self.front.is_some() && self.back.is_some()
    }

    pub fn is_zero_length(&self) -> bool {
        self.length == 0.0
    }

    pub fn side(&self, which: usize) -> Option<SideId> {
        if which == 0 {
            self.front
        } else {
            self.back
        }
    }

    /// Refreshes the geometry caches from the two endpoint positions.
    pub fn update_geometry(&mut self, v0: [f64; 2], v1: [f64; 2]) {
        self.direction = [v1[0] - v0[0], v1[1] - v0[1]];
        self.length = self.direction[0].hypot(self.direction[1]);
        self.angle = Angle::from_vector(self.direction[0], self.direction[1]);
        self.slope = SlopeType::classify(self.direction[0], self.direction[1]);
        self.bounds = Aabb::from_points(v0, v1);
    }

    fn side_ref(side: Option<SideId>) -> ElementRef {
        match side {
            Some(id) => ElementRef::Side(id),
            None => ElementRef::None,
        }
    }

    pub(crate) fn property(&self, prop: Property) -> Result<Vec<Value>, DmuError> {
        Ok(match prop {
            Property::Vertex0 => vec![Value::Element(ElementRef::Vertex(self.v[0]))],
            Property::Vertex1 => vec![Value::Element(ElementRef::Vertex(self.v[1]))],
            Property::Front => vec![Value::Element(Self::side_ref(self.front))],
            Property::Back => vec![Value::Element(Self::side_ref(self.back))],
            Property::Flags => vec![Value::Int(self.flags)],
            Property::Tag => vec![Value::Int(self.tag)],
            Property::Length => vec![Value::Double(self.length)],
            Property::Dx => vec![Value::Double(self.direction[0])],
            Property::Dy => vec![Value::Double(self.direction[1])],
            Property::Angle => vec![Value::Angle(self.angle)],
            Property::BoundingBox => vec![
                Value::Double(self.bounds.min[0]),
                Value::Double(self.bounds.min[1]),
                Value::Double(self.bounds.max[0]),
                Value::Double(self.bounds.max[1]),
            ],
            _ => {
                return Err(DmuError::UnknownProperty {
                    ty: ElementType::Line,
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
            Property::Flags => {
                self.flags = vals[0].to_int()?;
                Ok(true)
            }
            Property::Tag => {
                self.tag = vals[0].to_int()?;
                Ok(false)
            }
            Property::Vertex0 | Property::Vertex1 => {
                let which = (prop == Property::Vertex1) as usize;
                match vals[0].to_element()? {
                    ElementRef::Vertex(id) => self.v[which] = id,
                    other => return Err(DmuError::InvalidType(other.embedded_type())),
                }
                Ok(true)
            }
            _ => Err(if self.property(prop).is_ok() {
                DmuError::NotWritable {
                    ty: ElementType::Line,
                    prop,
                }
            } else {
                DmuError::UnknownProperty {
                    ty: ElementType::Line,
                    prop,
                }
            }),
        }
    }
}
