// src/convert.rs
//
// Classic-lump geometry ingestion: raw VERTEXES/LINEDEFS/SIDEDEFS/SECTORS
// record arrays in, an assembled and linked `Map` out. Record layouts are
// the classic little-endian ones; texture names are 8 bytes, zero-padded.
//
// BSP trees and blockmaps are not read here; they are attached to the map
// separately.

use std::io::{self, Cursor, Read};

use byteorder::{ReadBytesExt, LE};
use log::warn;

use crate::dmu::handle::{MaterialId, SectorId, VertexId};
use crate::map::{Map, MaterialBank};

/// A VERTEXES record (4 bytes: x, y as i16).
#[derive(Debug, Clone, PartialEq)]
pub struct VertexRecord {
    pub x: i32,
    pub y: i32,
}

/// A LINEDEFS record (14 bytes). `right`/`left` are sidedef indices,
/// -1 for none.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRecord {
    pub v1: u16,
    pub v2: u16,
    pub flags: i32,
    pub special: i32,
    pub tag: i32,
    pub right: i32,
    pub left: i32,
}

/// A SIDEDEFS record (30 bytes). Texture names are trimmed of trailing
/// zeros and spaces; `sector` is -1 for none.
#[derive(Debug, Clone, PartialEq)]
pub struct SideRecord {
    pub offset: [i32; 2],
    pub upper: String,
    pub lower: String,
    pub middle: String,
    pub sector: i32,
}

/// A SECTORS record (26 bytes). Light is the classic 0..255 scale.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorRecord {
    pub floor_height: i32,
    pub ceiling_height: i32,
    pub floor_tex: String,
    pub ceiling_tex: String,
    pub light: i32,
    pub special: i32,
    pub tag: i32,
}

/// Reads exactly 8 bytes of texture name, trimming trailing `\0` and
/// spaces.
fn read_tex8<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    let raw = String::from_utf8_lossy(&buf);
    let trimmed = raw.trim_end_matches(|c: char| c == '\0' || c.is_whitespace());
    Ok(trimmed.to_string())
}

pub fn read_vertexes(data: &[u8]) -> io::Result<Vec<VertexRecord>> {
    let mut cursor = Cursor::new(data);
    let mut out = Vec::with_capacity(data.len() / 4);
    for _ in 0..data.len() / 4 {
        out.push(VertexRecord {
            x: cursor.read_i16::<LE>()? as i32,
            y: cursor.read_i16::<LE>()? as i32,
        });
    }
    Ok(out)
}

pub fn read_linedefs(data: &[u8]) -> io::Result<Vec<LineRecord>> {
    let mut cursor = Cursor::new(data);
    let mut out = Vec::with_capacity(data.len() / 14);
    for _ in 0..data.len() / 14 {
        out.push(LineRecord {
            v1: cursor.read_u16::<LE>()?,
            v2: cursor.read_u16::<LE>()?,
            flags: cursor.read_i16::<LE>()? as i32,
            special: cursor.read_i16::<LE>()? as i32,
            tag: cursor.read_i16::<LE>()? as i32,
            right: cursor.read_i16::<LE>()? as i32,
            left: cursor.read_i16::<LE>()? as i32,
        });
    }
    Ok(out)
}

pub fn read_sidedefs(data: &[u8]) -> io::Result<Vec<SideRecord>> {
    let mut cursor = Cursor::new(data);
    let mut out = Vec::with_capacity(data.len() / 30);
    for _ in 0..data.len() / 30 {
        let x = cursor.read_i16::<LE>()? as i32;
        let y = cursor.read_i16::<LE>()? as i32;
        out.push(SideRecord {
            offset: [x, y],
            upper: read_tex8(&mut cursor)?,
            lower: read_tex8(&mut cursor)?,
            middle: read_tex8(&mut cursor)?,
            sector: cursor.read_i16::<LE>()? as i32,
        });
    }
    Ok(out)
}

pub fn read_sectors(data: &[u8]) -> io::Result<Vec<SectorRecord>> {
    let mut cursor = Cursor::new(data);
    let mut out = Vec::with_capacity(data.len() / 26);
    for _ in 0..data.len() / 26 {
        out.push(SectorRecord {
            floor_height: cursor.read_i16::<LE>()? as i32,
            ceiling_height: cursor.read_i16::<LE>()? as i32,
            floor_tex: read_tex8(&mut cursor)?,
            ceiling_tex: read_tex8(&mut cursor)?,
            light: cursor.read_i16::<LE>()? as i32,
            special: cursor.read_i16::<LE>()? as i32,
            tag: cursor.read_i16::<LE>()? as i32,
        });
    }
    Ok(out)
}

/// "-" and the empty string mean "no material here"; anything else goes
/// through the bank, falling back to the placeholder with a warning.
fn material_for(materials: &MaterialBank, name: &str) -> Option<MaterialId> {
    if name.is_empty() || name == "-" {
        return None;
    }
    Some(materials.resolve_or_missing(name))
}

/// Builds a linked `Map` from decoded lump records. Records that point at
/// elements that do not exist are skipped with a warning; conversion
/// always produces a map from what remains.
pub fn assemble(
    vertexes: &[VertexRecord],
    linedefs: &[LineRecord],
    sidedefs: &[SideRecord],
    sectors: &[SectorRecord],
    materials: &MaterialBank,
) -> Map {
    let mut map = Map::new();

    for record in sectors {
        let id = map.add_sector(
            record.floor_height as f64,
            record.ceiling_height as f64,
            (record.light.clamp(0, 255) as f32) / 255.0,
        );
        let sector = map
            .sector_mut(id)
            .expect("sector just added");
        sector.tag = record.tag;
        sector.planes[0].surface.material = material_for(materials, &record.floor_tex);
        sector.planes[1].surface.material = material_for(materials, &record.ceiling_tex);
    }

    for record in vertexes {
        map.add_vertex(record.x as f64, record.y as f64);
    }

    for (index, record) in linedefs.iter().enumerate() {
        let v1 = record.v1 as usize;
        let v2 = record.v2 as usize;
        if v1 >= map.vertex_count() || v2 >= map.vertex_count() {
            warn!("linedef {} references a missing vertex, skipping", index);
            continue;
        }
        let line_id = map.add_line(VertexId(record.v1 as u32), VertexId(record.v2 as u32));
        {
            let line = map.line_mut(line_id).expect("line just added");
            line.flags = record.flags;
            line.tag = record.tag;
        }

        for (which, side_index) in [(0usize, record.right), (1, record.left)] {
            if side_index < 0 {
                continue;
            }
            let Some(side_record) = sidedefs.get(side_index as usize) else {
                warn!(
                    "linedef {} references missing sidedef {}, skipping side",
                    index, side_index
                );
                continue;
            };
            let sector = if side_record.sector >= 0
                && (side_record.sector as usize) < map.sector_count()
            {
                Some(SectorId(side_record.sector as u32))
            } else {
                if side_record.sector >= 0 {
                    warn!(
                        "sidedef {} references missing sector {}",
                        side_index, side_record.sector
                    );
                }
                None
            };
            let side_id = map
                .add_side(line_id, which, sector)
                .expect("line just added");
            let side = map.side_mut(side_id).expect("side just added");
            let offset = [side_record.offset[0] as f64, side_record.offset[1] as f64];
            for (surface, name) in [
                (&mut side.top, &side_record.upper),
                (&mut side.middle, &side_record.middle),
                (&mut side.bottom, &side_record.lower),
            ] {
                surface.material = material_for(materials, name);
                surface.offset = offset;
            }
        }
    }

    map.link();
    map
}
