//! Photoshop action descriptors
//!
//! Descriptors are the self-describing key/value trees embedded in layer
//! effects, type tool, solid color and vector stroke records. Items are
//! kept in file order; a repeated key replaces the earlier value.

use indexmap::IndexMap;
use serde::Serialize;

use crate::chunk::{into_keyed, read_counted, Chunk, ChunkReader, Context, Frame};
use crate::error::ChunkError;

/// A class-tagged map of descriptor items
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Descriptor {
    pub name: String,
    pub class_id: String,
    pub items: IndexMap<String, DescriptorValue>,
}

/// Class reference (`type`, `GlbC`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassType {
    pub name: String,
    pub class_id: String,
}

/// Descriptor value types
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DescriptorValue {
    Alias(String),
    Boolean(bool),
    LargeInteger(i64),
    Double(f64),
    Enum {
        type_id: String,
        value: String,
    },
    Class(ClassType),
    Descriptor(Descriptor),
    Integer(i32),
    Reference(Vec<ReferenceItem>),
    String(String),
    RawData(Vec<u8>),
    UnitFloat {
        unit: String,
        value: f32,
    },
    UnitDouble {
        unit: String,
        value: f64,
    },
    List(Vec<DescriptorValue>),
    /// Unrecognized type code; nothing after the code was consumed
    Unknown(String),
}

/// One element of an `obj ` reference
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ReferenceItem {
    Enumerated {
        class: ClassType,
        type_id: String,
        value: String,
    },
    Class(ClassType),
    Identifier(i32),
    Index(i32),
    Name {
        class: ClassType,
        name: String,
    },
    Property {
        class: ClassType,
        key_id: String,
    },
    Offset {
        class: ClassType,
        offset: i32,
    },
    Unknown(String),
}

impl Chunk for Descriptor {
    fn read(r: &mut ChunkReader<'_>, ctx: &mut Context) -> Result<Self, ChunkError> {
        ctx.scoped(Frame::Descriptor, |ctx| {
            let name = r.read_unicode_string()?;
            let class_id = r.read_minimum_string()?;
            let count = r.read_i32()?;
            if count < 0 {
                return Err(ChunkError::InvalidLength {
                    field: "descriptor item count",
                    length: count.into(),
                });
            }

            let items = read_counted(count as usize, |_| {
                let key = r.read_minimum_string()?;
                let type_code = r.read_key()?;
                let value = DescriptorValue::read_typed(r, ctx, &type_code)?;
                Ok((key, value))
            })?;

            Ok(Descriptor {
                name,
                class_id,
                items: into_keyed(items),
            })
        })
    }
}

impl ClassType {
    fn read(r: &mut ChunkReader<'_>) -> Result<Self, ChunkError> {
        Ok(ClassType {
            name: r.read_unicode_string()?,
            class_id: r.read_minimum_string()?,
        })
    }
}

impl DescriptorValue {
    /// Parse a value based on its type code
    pub fn read_typed(
        r: &mut ChunkReader<'_>,
        ctx: &mut Context,
        type_code: &str,
    ) -> Result<Self, ChunkError> {
        let value = match type_code {
            "alis" => {
                let len = r.read_u32()?;
                DescriptorValue::Alias(r.read_fixed_string(len.into())?)
            }
            "bool" => DescriptorValue::Boolean(r.read_u8()? != 0),
            "comp" => DescriptorValue::LargeInteger(r.read_i64()?),
            "doub" => DescriptorValue::Double(r.read_f64()?),
            "enum" => DescriptorValue::Enum {
                type_id: r.read_minimum_string()?,
                value: r.read_minimum_string()?,
            },
            "GlbC" | "type" => DescriptorValue::Class(ClassType::read(r)?),
            "GlbO" | "Objc" => DescriptorValue::Descriptor(Descriptor::read(r, ctx)?),
            "long" => DescriptorValue::Integer(r.read_i32()?),
            "obj " => {
                let count = r.read_i32()?.max(0) as usize;
                DescriptorValue::Reference(read_counted(count, |_| ReferenceItem::read(r))?)
            }
            "TEXT" => DescriptorValue::String(r.read_unicode_string()?),
            "tdta" => {
                let len = r.read_u32()?;
                DescriptorValue::RawData(r.read_bytes(len.into())?)
            }
            "UnFl" => DescriptorValue::UnitFloat {
                unit: r.read_key()?,
                value: r.read_f32()?,
            },
            "UntF" => DescriptorValue::UnitDouble {
                unit: r.read_key()?,
                value: r.read_f64()?,
            },
            "VlLs" => {
                let count = r.read_i32()?.max(0) as usize;
                DescriptorValue::List(read_counted(count, |_| {
                    let item_type = r.read_key()?;
                    DescriptorValue::read_typed(r, ctx, &item_type)
                })?)
            }
            _ => {
                tracing::warn!(
                    "Unknown descriptor value type {:?} at offset {}",
                    type_code,
                    r.position()
                );
                DescriptorValue::Unknown(type_code.to_string())
            }
        };
        Ok(value)
    }

    /// Numeric view of any scalar number type
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DescriptorValue::Double(v) => Some(*v),
            DescriptorValue::Integer(v) => Some(f64::from(*v)),
            DescriptorValue::LargeInteger(v) => Some(*v as f64),
            DescriptorValue::UnitFloat { value, .. } => Some(f64::from(*value)),
            DescriptorValue::UnitDouble { value, .. } => Some(*value),
            _ => None,
        }
    }
}

impl ReferenceItem {
    fn read(r: &mut ChunkReader<'_>) -> Result<Self, ChunkError> {
        let item_type = r.read_key()?;
        let item = match item_type.as_str() {
            "Enmr" => ReferenceItem::Enumerated {
                class: ClassType::read(r)?,
                type_id: r.read_minimum_string()?,
                value: r.read_minimum_string()?,
            },
            "Clss" => ReferenceItem::Class(ClassType::read(r)?),
            "Idnt" => ReferenceItem::Identifier(r.read_i32()?),
            "indx" => ReferenceItem::Index(r.read_i32()?),
            "name" => ReferenceItem::Name {
                class: ClassType::read(r)?,
                name: r.read_unicode_string()?,
            },
            "prop" => ReferenceItem::Property {
                class: ClassType::read(r)?,
                key_id: r.read_minimum_string()?,
            },
            "rele" => ReferenceItem::Offset {
                class: ClassType::read(r)?,
                offset: r.read_i32()?,
            },
            _ => {
                tracing::warn!("Skipping unknown reference type: {}", item_type);
                ReferenceItem::Unknown(item_type)
            }
        };
        Ok(item)
    }
}

/// Split a path segment such as `name[3]` into its key and index
pub(crate) fn split_index(segment: &str) -> (&str, Option<usize>) {
    if let Some(inner) = segment.strip_suffix(']') {
        if let Some(open) = inner.find('[') {
            if let Ok(index) = inner[open + 1..].parse() {
                return (&inner[..open], Some(index));
            }
        }
    }
    (segment, None)
}

impl Descriptor {
    /// Resolve a dotted path such as `boundingBox.Left` or `dropShadowMulti[1].Clr `
    ///
    /// Returns `None` on the first missing key, out-of-range index or
    /// non-container value along the way.
    pub fn get(&self, path: &str) -> Option<&DescriptorValue> {
        let mut current: Option<&DescriptorValue> = None;
        for segment in path.split('.') {
            let container = match current {
                None => self,
                Some(DescriptorValue::Descriptor(descriptor)) => descriptor,
                Some(_) => return None,
            };
            let (key, index) = split_index(segment);
            let mut value = container.items.get(key)?;
            if let Some(index) = index {
                value = match value {
                    DescriptorValue::List(items) => items.get(index)?,
                    _ => return None,
                };
            }
            current = Some(value);
        }
        current
    }

    /// Boolean flag; an absent flag counts as set
    pub fn get_bool(&self, path: &str) -> bool {
        match self.get(path) {
            Some(DescriptorValue::Boolean(value)) => *value,
            _ => true,
        }
    }

    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(DescriptorValue::as_f64)
    }

    /// Unit code and value of a unit float
    pub fn get_unit(&self, path: &str) -> Option<(&str, f64)> {
        match self.get(path)? {
            DescriptorValue::UnitFloat { unit, value } => Some((unit.as_str(), f64::from(*value))),
            DescriptorValue::UnitDouble { unit, value } => Some((unit.as_str(), *value)),
            _ => None,
        }
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        match self.get(path)? {
            DescriptorValue::String(value) | DescriptorValue::Alias(value) => Some(value),
            _ => None,
        }
    }

    /// Value half of an enumerated item
    pub fn get_enum(&self, path: &str) -> Option<&str> {
        match self.get(path)? {
            DescriptorValue::Enum { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn get_descriptor(&self, path: &str) -> Option<&Descriptor> {
        match self.get(path)? {
            DescriptorValue::Descriptor(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    pub fn get_list(&self, path: &str) -> Option<&[DescriptorValue]> {
        match self.get(path)? {
            DescriptorValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn get_raw(&self, path: &str) -> Option<&[u8]> {
        match self.get(path)? {
            DescriptorValue::RawData(data) => Some(data),
            _ => None,
        }
    }
}
