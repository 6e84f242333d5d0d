// src/map/material.rs

use log::warn;
use parking_lot::RwLock;

use crate::dmu::handle::{ElementType, MaterialId};
use crate::dmu::property::Property;
use crate::dmu::value::Value;
use crate::errors::DmuError;

/// A renderable material. This crate only needs the identity and the
/// logical dimensions; composing the actual texture is the resource
/// system's business.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub width: f64,
    pub height: f64,
}

impl Material {
    pub(crate) fn property(&self, prop: Property) -> Result<Vec<Value>, DmuError> {
        Ok(match prop {
            Property::Width => vec![Value::Double(self.width)],
            Property::Height => vec![Value::Double(self.height)],
            _ => {
                return Err(DmuError::UnknownProperty {
                    ty: ElementType::Material,
                    prop,
                })
            }
        })
    }
}

/// Lookup service mapping numeric ids to materials. The bank is shared
/// read-mostly between the game and renderer threads, hence the lock;
/// registration happens during resource loading.
///
/// Slot 0 always holds the "missing" placeholder, so a failed name lookup
/// degrades to a visible checkerboard instead of an error.
#[derive(Debug)]
pub struct MaterialBank {
    inner: RwLock<Vec<Material>>,
}

impl Default for MaterialBank {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialBank {
    pub fn new() -> Self {
        MaterialBank {
            inner: RwLock::new(vec![Material {
                name: "-".to_string(),
                width: 64.0,
                height: 64.0,
            }]),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        // Slot 0 is always present.
        false
    }

    pub fn declare(&self, name: &str, width: f64, height: f64) -> MaterialId {
        let mut materials = self.inner.write();
        if let Some(pos) = materials.iter().position(|m| m.name.eq_ignore_ascii_case(name)) {
            return MaterialId(pos as u32);
        }
        materials.push(Material {
            name: name.to_uppercase(),
            width,
            height,
        });
        MaterialId((materials.len() - 1) as u32)
    }

    pub fn get(&self, id: MaterialId) -> Option<Material> {
        self.inner.read().get(id.index()).cloned()
    }

    pub fn find_by_name(&self, name: &str) -> Option<MaterialId> {
        self.inner
            .read()
            .iter()
            .position(|m| m.name.eq_ignore_ascii_case(name))
            .map(|pos| MaterialId(pos as u32))
    }

    /// Name lookup with the permissive fallback used during map
    /// conversion: a reference to a material nobody registered is logged
    /// and resolved to the placeholder.
    pub fn resolve_or_missing(&self, name: &str) -> MaterialId {
        // "-" is the conventional "no texture here" marker, not an error.
        if name.is_empty() || name == "-" {
            return MaterialId::MISSING;
        }
        match self.find_by_name(name) {
            Some(id) => id,
            None => {
                warn!("unknown material \"{}\", substituting placeholder", name);
                MaterialId::MISSING
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_seeds_placeholder() {
        let bank = MaterialBank::new();
        assert_eq!(bank.len(), 1);
        assert_eq!(bank.get(MaterialId::MISSING).unwrap().name, "-");
    }

    #[test]
    fn test_declare_and_find() {
        let bank = MaterialBank::new();
        let id = bank.declare("FLAT5", 64.0, 64.0);
        assert_eq!(bank.find_by_name("flat5"), Some(id));
        // Declaring an existing name returns the same id.
        assert_eq!(bank.declare("flat5", 64.0, 64.0), id);
    }

    #[test]
    fn test_resolve_missing_falls_back() {
        let bank = MaterialBank::new();
        assert_eq!(bank.resolve_or_missing("NOSUCH"), MaterialId::MISSING);
        assert_eq!(bank.resolve_or_missing("-"), MaterialId::MISSING);
    }

    #[test]
    fn test_material_properties() {
        let bank = MaterialBank::new();
        let id = bank.declare("STARTAN2", 128.0, 96.0);
        let mat = bank.get(id).unwrap();
        assert_eq!(mat.property(Property::Width).unwrap(), vec![Value::Double(128.0)]);
        assert_eq!(mat.property(Property::Height).unwrap(), vec![Value::Double(96.0)]);
        assert!(mat.property(Property::Flags).is_err());
    }
}
