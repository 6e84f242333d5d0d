// src/dmu/property.rs
//
// The flat property-id namespace of the map-update protocol, plus the
// modifier flags that redirect a coarse element to one of its owned
// sub-elements before dispatch. A full property id is a base id in the
// low bits with modifier flags in a reserved high bit range.

use crate::dmu::handle::ElementType;

/// Base property ids. Each is tagged (implicitly, by its accessor) with a
/// native value kind; multi-component properties report their component
/// count through [`Property::component_count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Property {
    None = 0,

    // Position (vertices).
    X = 1,
    Y = 2,
    Xy = 3,

    // Line structure.
    Vertex0 = 4,
    Vertex1 = 5,
    Front = 6,
    Back = 7,
    Flags = 8,
    Length = 9,
    Dx = 10,
    Dy = 11,
    Angle = 12,

    // Side structure.
    Sector = 13,
    Line = 14,

    // Surface appearance.
    Material = 15,
    OffsetX = 16,
    OffsetY = 17,
    OffsetXy = 18,
    TangentX = 19,
    TangentY = 20,
    TangentZ = 21,
    Tangent = 22,
    BitangentX = 23,
    BitangentY = 24,
    BitangentZ = 25,
    Bitangent = 26,
    NormalX = 27,
    NormalY = 28,
    NormalZ = 29,
    Normal = 30,
    ColorRed = 31,
    ColorGreen = 32,
    ColorBlue = 33,
    Color = 34,
    Alpha = 35,
    BlendMode = 36,

    // Sector state.
    LightLevel = 37,
    PlaneCount = 38,
    FloorPlane = 39,
    CeilingPlane = 40,
    Tag = 41,

    // Plane state.
    Height = 42,
    TargetHeight = 43,
    Speed = 44,

    // Derived geometry.
    BoundingBox = 45,

    // Material dimensions.
    Width = 46,
}

impl Property {
    pub fn from_raw(raw: u32) -> Option<Property> {
        use Property::{
            Alpha, Angle, Back, Bitangent, BitangentX, BitangentY, BitangentZ, BlendMode,
            BoundingBox, CeilingPlane, Color, ColorBlue, ColorGreen, ColorRed, Dx, Dy, Flags,
            FloorPlane, Front, Height, Length, LightLevel, Line, Material, Normal, NormalX,
            NormalY, NormalZ, OffsetX, OffsetXy, OffsetY, PlaneCount, Sector, Speed, Tag, Tangent,
            TangentX, TangentY, TangentZ, TargetHeight, Vertex0, Vertex1, Width, X, Xy, Y,
        };
        Some(match raw {
            0 => Property::None,
            1 => X,
            2 => Y,
            3 => Xy,
            4 => Vertex0,
            5 => Vertex1,
            6 => Front,
            7 => Back,
            8 => Flags,
            9 => Length,
            10 => Dx,
            11 => Dy,
            12 => Angle,
            13 => Sector,
            14 => Line,
            15 => Material,
            16 => OffsetX,
            17 => OffsetY,
            18 => OffsetXy,
            19 => TangentX,
            20 => TangentY,
            21 => TangentZ,
            22 => Tangent,
            23 => BitangentX,
            24 => BitangentY,
            25 => BitangentZ,
            26 => Bitangent,
            27 => NormalX,
            28 => NormalY,
            29 => NormalZ,
            30 => Normal,
            31 => ColorRed,
            32 => ColorGreen,
            33 => ColorBlue,
            34 => Color,
            35 => Alpha,
            36 => BlendMode,
            37 => LightLevel,
            38 => PlaneCount,
            39 => FloorPlane,
            40 => CeilingPlane,
            41 => Tag,
            42 => Height,
            43 => TargetHeight,
            44 => Speed,
            45 => BoundingBox,
            46 => Width,
            _ => return Option::None,
        })
    }

    /// Number of scalar components carried by the property.
    pub fn component_count(self) -> usize {
        match self {
            Property::Xy | Property::OffsetXy => 2,
            Property::Tangent | Property::Bitangent | Property::Normal | Property::Color => 3,
            Property::BoundingBox => 4,
            _ => 1,
        }
    }

    /// For element-valued properties, the element type an integer value is
    /// resolved against when writing (the index-to-reference half of the
    /// element/index mapping).
    pub fn element_target(self) -> Option<ElementType> {
        match self {
            Property::Vertex0 | Property::Vertex1 => Some(ElementType::Vertex),
            Property::Front | Property::Back => Some(ElementType::Side),
            Property::Sector => Some(ElementType::Sector),
            Property::Line => Some(ElementType::Line),
            Property::Material => Some(ElementType::Material),
            Property::FloorPlane | Property::CeilingPlane => Some(ElementType::Plane),
            _ => None,
        }
    }
}

/// Modifier flags, kept clear of the base-id range.
pub mod modifier {
    pub const FLOOR_OF_SECTOR: u32 = 0x0100_0000;
    pub const CEILING_OF_SECTOR: u32 = 0x0200_0000;
    pub const SIDE0_OF_LINE: u32 = 0x0400_0000;
    pub const SIDE1_OF_LINE: u32 = 0x0800_0000;
    pub const TOP_OF_SIDE: u32 = 0x1000_0000;
    pub const MIDDLE_OF_SIDE: u32 = 0x2000_0000;
    pub const BOTTOM_OF_SIDE: u32 = 0x4000_0000;

    pub const SECTOR_GROUP: u32 = FLOOR_OF_SECTOR | CEILING_OF_SECTOR;
    pub const LINE_GROUP: u32 = SIDE0_OF_LINE | SIDE1_OF_LINE;
    pub const SIDE_GROUP: u32 = TOP_OF_SIDE | MIDDLE_OF_SIDE | BOTTOM_OF_SIDE;

    pub const MASK: u32 = SECTOR_GROUP | LINE_GROUP | SIDE_GROUP;
}

/// A combined property id: base property plus modifier flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyId(pub u32);

impl PropertyId {
    pub fn new(base: Property, modifiers: u32) -> PropertyId {
        debug_assert_eq!(modifiers & !modifier::MASK, 0);
        PropertyId(base as u32 | (modifiers & modifier::MASK))
    }

    /// Splits into base property and modifier mask. An unknown base id
    /// yields `None` for the property; the dispatcher treats that as a
    /// fatal error.
    pub fn split(self) -> (Option<Property>, u32) {
        let mods = self.0 & modifier::MASK;
        (Property::from_raw(self.0 & !modifier::MASK), mods)
    }
}

impl From<Property> for PropertyId {
    fn from(p: Property) -> PropertyId {
        PropertyId(p as u32)
    }
}
