//! [`ValueHandle`] over a [`Snapshot`] and a [`TypeCatalog`].

use std::fmt;
use std::sync::Arc;

use crate::error::{InspectError, InspectResult};
use crate::snapshot::catalog::{TypeCatalog, TypeDef, TypeKind};
use crate::snapshot::Snapshot;
use crate::types::signature::{template_arguments, MAX_ALIAS_DEPTH};
use crate::types::{Address, Scalar, ScalarKind};
use crate::value::{Handle, TypeLayer, ValueHandle};

/// Where a value's bytes come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location
{
    /// An object in the snapshot
    Memory(Address),
    /// A computed pointer (`p + n`) that exists only as a value
    Immediate(Address),
}

/// Typed view of one location in a snapshot
///
/// Cheap to clone: the snapshot and catalogue are shared.
#[derive(Clone)]
pub struct SnapshotValue
{
    memory: Arc<Snapshot>,
    catalog: Arc<TypeCatalog>,
    type_name: String,
    location: Location,
}

impl SnapshotValue
{
    /// The object of type `type_name` stored at `address`.
    pub fn new(memory: Arc<Snapshot>, catalog: Arc<TypeCatalog>, type_name: &str, address: Address) -> Self
    {
        Self {
            memory,
            catalog,
            type_name: type_name.to_string(),
            location: Location::Memory(address),
        }
    }

    /// [`SnapshotValue::new`], boxed as a [`Handle`].
    pub fn handle(memory: &Arc<Snapshot>, catalog: &Arc<TypeCatalog>, type_name: &str, address: Address) -> Handle
    {
        Box::new(Self::new(Arc::clone(memory), Arc::clone(catalog), type_name, address))
    }

    fn with(&self, type_name: &str, location: Location) -> Self
    {
        Self {
            memory: Arc::clone(&self.memory),
            catalog: Arc::clone(&self.catalog),
            type_name: type_name.to_string(),
            location,
        }
    }

    fn memory_address(&self) -> InspectResult<Address>
    {
        match self.location {
            Location::Memory(address) => Ok(address),
            Location::Immediate(_) => Err(InspectError::InvalidArgument(format!(
                "computed value of type '{}' has no address",
                self.type_name
            ))),
        }
    }

    /// Follow references (reading the stored pointer) and typedefs until a
    /// value of a concrete type is reached.
    fn resolved(&self) -> InspectResult<(Self, Arc<TypeDef>)>
    {
        let mut current = self.clone();
        for _ in 0..MAX_ALIAS_DEPTH {
            let def = self.catalog.concrete(&current.type_name)?;
            match &def.kind {
                TypeKind::Reference(target) => {
                    let referent = self.memory.read_pointer(current.memory_address()?)?;
                    current = current.with(target, Location::Memory(referent));
                }
                _ => return Ok((current, def)),
            }
        }
        Err(InspectError::AliasDepthExceeded(self.type_name.clone()))
    }

    fn read_pointer_value(&self) -> InspectResult<Address>
    {
        match self.location {
            Location::Memory(address) => self.memory.read_pointer(address),
            Location::Immediate(value) => Ok(value),
        }
    }

    fn enum_name(value: Scalar, enumerators: &[(String, i64)]) -> String
    {
        let raw = match value {
            Scalar::Signed(v) => Some(v),
            Scalar::Unsigned(v) => i64::try_from(v).ok(),
            _ => None,
        };
        raw.and_then(|raw| enumerators.iter().find(|(_, v)| *v == raw))
            .map_or_else(|| value.to_string(), |(name, _)| name.clone())
    }
}

impl fmt::Debug for SnapshotValue
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let mut s = f.debug_struct("SnapshotValue");
        s.field("type", &self.type_name);
        match self.location {
            Location::Memory(address) => s.field("address", &format_args!("{address}")),
            Location::Immediate(value) => s.field("value", &format_args!("{value}")),
        };
        s.finish()
    }
}

impl ValueHandle for SnapshotValue
{
    fn declared_type(&self) -> String
    {
        self.type_name.clone()
    }

    fn type_layer(&self, type_name: &str) -> TypeLayer
    {
        match self.catalog.resolve(type_name).map(|def| def.kind.clone()) {
            Ok(TypeKind::Typedef(target)) => TypeLayer::Typedef(target),
            Ok(TypeKind::Reference(target)) => TypeLayer::Reference(target),
            _ => TypeLayer::Concrete,
        }
    }

    fn address(&self) -> Option<Address>
    {
        match self.location {
            Location::Memory(address) => Some(address),
            Location::Immediate(_) => None,
        }
    }

    fn field(&self, name: &str) -> InspectResult<Handle>
    {
        let (value, def) = self.resolved()?;
        let not_found = || InspectError::FieldNotFound {
            type_name: def.name.clone(),
            field: name.to_string(),
        };

        match &def.kind {
            TypeKind::Struct(fields) => {
                let field = fields.iter().find(|f| f.name == name).ok_or_else(not_found)?;
                let address = value
                    .memory_address()?
                    .checked_add(field.offset)
                    .ok_or_else(not_found)?;
                Ok(Box::new(value.with(&field.type_name, Location::Memory(address))))
            }
            TypeKind::Array { element, len } => {
                let index: u64 = name.parse().map_err(|_| not_found())?;
                if index >= *len {
                    return Err(not_found());
                }
                let element_size = self.catalog.size_of(element)?;
                let address = value
                    .memory_address()?
                    .checked_add(index * element_size)
                    .ok_or_else(not_found)?;
                Ok(Box::new(value.with(element, Location::Memory(address))))
            }
            _ => Err(not_found()),
        }
    }

    fn field_names(&self) -> InspectResult<Vec<String>>
    {
        let (_, def) = self.resolved()?;
        Ok(match &def.kind {
            TypeKind::Struct(fields) => fields.iter().map(|f| f.name.clone()).collect(),
            TypeKind::Array { len, .. } => (0..*len).map(|i| i.to_string()).collect(),
            _ => Vec::new(),
        })
    }

    fn is_pointer(&self) -> bool
    {
        self.resolved()
            .is_ok_and(|(_, def)| matches!(def.kind, TypeKind::Pointer(_)))
    }

    fn pointer_value(&self) -> InspectResult<Address>
    {
        let (value, def) = self.resolved()?;
        match def.kind {
            TypeKind::Pointer(_) => value.read_pointer_value(),
            _ => Err(InspectError::NotAPointer(self.type_name.clone())),
        }
    }

    fn dereference(&self) -> InspectResult<Handle>
    {
        let (value, def) = self.resolved()?;
        let TypeKind::Pointer(target) = &def.kind else {
            return Err(InspectError::NotAPointer(self.type_name.clone()));
        };

        let address = value.read_pointer_value()?;
        let size = self.catalog.size_of(target)?;
        // touch the pointee now so a dangling pointer fails here, not later
        self.memory.read(address, size.max(1) as usize)?;
        Ok(Box::new(value.with(target, Location::Memory(address))))
    }

    fn offset(&self, elements: i64) -> InspectResult<Handle>
    {
        let (value, def) = self.resolved()?;
        let TypeKind::Pointer(target) = &def.kind else {
            return Err(InspectError::NotAPointer(self.type_name.clone()));
        };

        let element_size = self.catalog.size_of(target)?.max(1);
        let base = value.read_pointer_value()?;
        let moved = base.offset_elements(elements, element_size).ok_or_else(|| {
            InspectError::InvalidArgument(format!("{base} + {elements} elements leaves the address space"))
        })?;
        Ok(Box::new(value.with(&def.name, Location::Immediate(moved))))
    }

    fn cast(&self, type_name: &str) -> InspectResult<Handle>
    {
        let target = self.catalog.resolve(type_name)?;
        if let Location::Immediate(_) = self.location {
            if !matches!(target.kind, TypeKind::Pointer(_)) {
                return Err(InspectError::NotAPointer(type_name.to_string()));
            }
        }
        Ok(Box::new(self.with(type_name, self.location)))
    }

    fn scalar(&self) -> InspectResult<Scalar>
    {
        let (value, def) = self.resolved()?;
        match &def.kind {
            TypeKind::Scalar(kind) | TypeKind::Enum { underlying: kind, .. } => {
                self.memory.read_scalar(value.memory_address()?, *kind)
            }
            TypeKind::Pointer(_) => Ok(Scalar::Unsigned(value.read_pointer_value()?.value())),
            _ => Err(InspectError::NotAScalar(self.type_name.clone())),
        }
    }

    fn string(&self) -> InspectResult<String>
    {
        let (value, def) = self.resolved()?;
        let is_char = |name: &str| {
            self.catalog
                .concrete(name)
                .is_ok_and(|def| matches!(def.kind, TypeKind::Scalar(ScalarKind::Char | ScalarKind::I8 | ScalarKind::U8)))
        };

        match &def.kind {
            TypeKind::Enum {
                underlying,
                enumerators,
            } => {
                let raw = self.memory.read_scalar(value.memory_address()?, *underlying)?;
                Ok(Self::enum_name(raw, enumerators))
            }
            TypeKind::Pointer(target) if is_char(target.as_str()) => self.memory.read_cstring(value.read_pointer_value()?),
            TypeKind::Array { element, len } if is_char(element.as_str()) => {
                let bytes = self.memory.read(value.memory_address()?, *len as usize)?;
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
            }
            // std::string keeps its character pointer in _M_dataplus._M_p
            TypeKind::Struct(_) => value
                .field_path(&["_M_dataplus", "_M_p"])
                .and_then(|p| p.string())
                .map_err(|_| InspectError::NotAString(self.type_name.clone())),
            _ => Err(InspectError::NotAString(self.type_name.clone())),
        }
    }

    fn template_argument(&self, index: usize) -> InspectResult<String>
    {
        let (_, def) = self.resolved()?;
        template_arguments(&def.name)
            .into_iter()
            .nth(index)
            .ok_or(InspectError::MissingTemplateArgument {
                type_name: def.name.clone(),
                index,
            })
    }

    fn boxed_clone(&self) -> Handle
    {
        Box::new(self.clone())
    }
}
