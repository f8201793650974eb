//! Type catalogue: the shapes a snapshot's bytes are interpreted through.
//!
//! Plays the part of the debug information a real debugger would consult.
//! Pointer types (`T *`) and fixed arrays (`T [N]`) are synthesized from their
//! spelling, so only named types need to be defined.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{InspectError, InspectResult};
use crate::types::signature::{canonicalize, strip_qualifiers};
use crate::types::ScalarKind;

/// Size of a pointer in the inspected process.
pub const POINTER_SIZE: u64 = 8;

/// What a named type is
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind
{
    /// Primitive value
    Scalar(ScalarKind),
    /// Aggregate with fields at fixed byte offsets
    Struct(Vec<FieldDef>),
    /// `len` consecutive elements
    Array
    {
        /// Element type name
        element: String,
        /// Element count
        len: u64,
    },
    /// Pointer to the named type
    Pointer(String),
    /// Integer with named values
    Enum
    {
        /// Storage kind
        underlying: ScalarKind,
        /// Enumerator names and values
        enumerators: Vec<(String, i64)>,
    },
    /// Alias of the named type
    Typedef(String),
    /// Reference to the named type (stored as a pointer)
    Reference(String),
}

/// One field of a struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef
{
    pub name: String,
    pub type_name: String,
    pub offset: u64,
}

/// A named type with its size
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef
{
    pub name: String,
    pub size: u64,
    pub kind: TypeKind,
}

/// Named type definitions
#[derive(Debug, Clone)]
pub struct TypeCatalog
{
    types: HashMap<String, Arc<TypeDef>>,
}

impl Default for TypeCatalog
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl TypeCatalog
{
    /// A catalogue holding the C++ fundamental types (LP64 sizes).
    #[must_use]
    pub fn new() -> Self
    {
        let mut catalog = Self { types: HashMap::new() };
        let fundamentals = [
            ("bool", ScalarKind::Bool),
            ("char", ScalarKind::Char),
            ("signed char", ScalarKind::I8),
            ("unsigned char", ScalarKind::U8),
            ("short", ScalarKind::I16),
            ("unsigned short", ScalarKind::U16),
            ("int", ScalarKind::I32),
            ("unsigned int", ScalarKind::U32),
            ("long", ScalarKind::I64),
            ("unsigned long", ScalarKind::U64),
            ("long long", ScalarKind::I64),
            ("unsigned long long", ScalarKind::U64),
            ("size_t", ScalarKind::U64),
            ("float", ScalarKind::F32),
            ("double", ScalarKind::F64),
        ];
        for (name, kind) in fundamentals {
            catalog.define_scalar(name, kind);
        }
        catalog.insert(TypeDef {
            name: "void".to_string(),
            size: 0,
            kind: TypeKind::Struct(Vec::new()),
        });
        catalog
    }

    fn insert(&mut self, def: TypeDef)
    {
        self.types.insert(canonicalize(&def.name), Arc::new(def));
    }

    /// Define (or redefine) a primitive type.
    pub fn define_scalar(&mut self, name: &str, kind: ScalarKind)
    {
        self.insert(TypeDef {
            name: canonicalize(name),
            size: kind.size() as u64,
            kind: TypeKind::Scalar(kind),
        });
    }

    /// Define a typedef.
    pub fn define_typedef(&mut self, name: &str, target: &str)
    {
        self.insert(TypeDef {
            name: canonicalize(name),
            size: 0,
            kind: TypeKind::Typedef(target.to_string()),
        });
    }

    /// Define an enum stored as `underlying`.
    pub fn define_enum(&mut self, name: &str, underlying: ScalarKind, enumerators: &[(&str, i64)])
    {
        self.insert(TypeDef {
            name: canonicalize(name),
            size: underlying.size() as u64,
            kind: TypeKind::Enum {
                underlying,
                enumerators: enumerators.iter().map(|(n, v)| ((*n).to_string(), *v)).collect(),
            },
        });
    }

    /// Define a struct with C layout: each field at the next offset aligned
    /// to its natural alignment, total size padded to the largest alignment.
    ///
    /// Returns the struct size.
    ///
    /// ## Errors
    ///
    /// `UnknownType` if a field type is not defined yet.
    pub fn define_struct(&mut self, name: &str, fields: &[(&str, &str)]) -> InspectResult<u64>
    {
        let mut offset = 0u64;
        let mut max_align = 1u64;
        let mut defs = Vec::with_capacity(fields.len());

        for (field, type_name) in fields {
            let size = self.size_of(type_name)?;
            let align = self.align_of(type_name)?;
            offset = offset.next_multiple_of(align);
            max_align = max_align.max(align);
            defs.push(FieldDef {
                name: (*field).to_string(),
                type_name: (*type_name).to_string(),
                offset,
            });
            offset += size;
        }

        let size = offset.next_multiple_of(max_align);
        self.insert(TypeDef {
            name: canonicalize(name),
            size,
            kind: TypeKind::Struct(defs),
        });
        Ok(size)
    }

    /// Define a struct with explicit field offsets and size.
    pub fn define_struct_at(&mut self, name: &str, size: u64, fields: &[(&str, &str, u64)])
    {
        let defs = fields
            .iter()
            .map(|(field, type_name, offset)| FieldDef {
                name: (*field).to_string(),
                type_name: (*type_name).to_string(),
                offset: *offset,
            })
            .collect();
        self.insert(TypeDef {
            name: canonicalize(name),
            size,
            kind: TypeKind::Struct(defs),
        });
    }

    /// Whether `name` resolves (named or synthesized).
    pub fn contains(&self, name: &str) -> bool
    {
        self.resolve(name).is_ok()
    }

    /// Look up a type by name, synthesizing pointers, references and arrays.
    ///
    /// ## Errors
    ///
    /// `UnknownType` if the name (or a synthesized type's target) is not defined.
    pub fn resolve(&self, name: &str) -> InspectResult<Arc<TypeDef>>
    {
        let trimmed = name.trim();
        if let Some(target) = trimmed.strip_suffix('&') {
            let target = target.trim_end_matches('&').trim();
            self.resolve(target)?;
            return Ok(Arc::new(TypeDef {
                name: canonicalize(trimmed),
                size: POINTER_SIZE,
                kind: TypeKind::Reference(target.to_string()),
            }));
        }

        let bare = strip_qualifiers(trimmed);
        if let Some(target) = bare.strip_suffix('*') {
            let target = target.trim();
            self.resolve(target)?;
            return Ok(Arc::new(TypeDef {
                name: canonicalize(bare),
                size: POINTER_SIZE,
                kind: TypeKind::Pointer(target.to_string()),
            }));
        }

        if let Some((element, len)) = parse_array(bare) {
            let element_size = self.size_of(element)?;
            return Ok(Arc::new(TypeDef {
                name: canonicalize(bare),
                size: element_size * len,
                kind: TypeKind::Array {
                    element: element.to_string(),
                    len,
                },
            }));
        }

        self.types
            .get(&canonicalize(bare))
            .cloned()
            .ok_or_else(|| InspectError::UnknownType(bare.to_string()))
    }

    /// Size in bytes, following typedefs.
    ///
    /// ## Errors
    ///
    /// `UnknownType` for undefined names, `AliasDepthExceeded` for typedef cycles.
    pub fn size_of(&self, name: &str) -> InspectResult<u64>
    {
        let def = self.concrete(name)?;
        Ok(def.size)
    }

    /// Natural alignment, following typedefs.
    ///
    /// ## Errors
    ///
    /// As [`TypeCatalog::size_of`].
    pub fn align_of(&self, name: &str) -> InspectResult<u64>
    {
        let def = self.concrete(name)?;
        let align = match &def.kind {
            TypeKind::Scalar(kind) => kind.size() as u64,
            TypeKind::Enum { underlying, .. } => underlying.size() as u64,
            TypeKind::Pointer(_) | TypeKind::Reference(_) => POINTER_SIZE,
            TypeKind::Array { element, .. } => self.align_of(element)?,
            TypeKind::Struct(fields) => {
                let mut align = 1;
                for field in fields {
                    align = align.max(self.align_of(&field.type_name)?);
                }
                align
            }
            TypeKind::Typedef(_) => 1,
        };
        Ok(align.max(1))
    }

    /// Byte offset and type of a dotted field path below `type_name`.
    ///
    /// ```rust
    /// use memscope_core::snapshot::TypeCatalog;
    ///
    /// let mut catalog = TypeCatalog::new();
    /// catalog.define_struct("Inner", &[("flag", "bool"), ("value", "double")])?;
    /// catalog.define_struct("Outer", &[("count", "int"), ("inner", "Inner")])?;
    /// assert_eq!(catalog.offset_of("Outer", "inner.value")?, (16, "double".to_string()));
    /// # Ok::<(), memscope_core::error::InspectError>(())
    /// ```
    ///
    /// ## Errors
    ///
    /// `FieldNotFound` if a path segment does not exist.
    pub fn offset_of(&self, type_name: &str, path: &str) -> InspectResult<(u64, String)>
    {
        let mut offset = 0u64;
        let mut current = type_name.to_string();
        for segment in path.split('.') {
            let def = self.concrete(&current)?;
            let TypeKind::Struct(fields) = &def.kind else {
                return Err(InspectError::FieldNotFound {
                    type_name: current,
                    field: segment.to_string(),
                });
            };
            let field = fields
                .iter()
                .find(|f| f.name == segment)
                .ok_or_else(|| InspectError::FieldNotFound {
                    type_name: current.clone(),
                    field: segment.to_string(),
                })?;
            offset += field.offset;
            current.clone_from(&field.type_name);
        }
        Ok((offset, current))
    }

    /// Follow typedefs to the underlying definition.
    ///
    /// ## Errors
    ///
    /// `UnknownType` or `AliasDepthExceeded`.
    pub fn concrete(&self, name: &str) -> InspectResult<Arc<TypeDef>>
    {
        let mut def = self.resolve(name)?;
        for _ in 0..crate::types::signature::MAX_ALIAS_DEPTH {
            match &def.kind {
                TypeKind::Typedef(target) => def = self.resolve(target)?,
                _ => return Ok(def),
            }
        }
        Err(InspectError::AliasDepthExceeded(name.to_string()))
    }
}

/// Split `T [N]` into `("T", N)`.
fn parse_array(name: &str) -> Option<(&str, u64)>
{
    let open = name.rfind('[')?;
    let len = name.strip_suffix(']')?[open + 1..].trim().parse().ok()?;
    Some((name[..open].trim(), len))
}
