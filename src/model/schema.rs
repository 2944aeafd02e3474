use indexmap::IndexMap;
use serde_json::{Map, Value};

/// A top-level QAPI definition that the translator understands.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaRecord {
    Struct(StructDecl),
    Enum(EnumDecl),
    Command(String),
    Event(String),
}

impl SchemaRecord {
    /// The declared name.
    pub fn name(&self) -> &str {
        match self {
            SchemaRecord::Struct(s) => &s.name,
            SchemaRecord::Enum(e) => &e.name,
            SchemaRecord::Command(name) | SchemaRecord::Event(name) => name,
        }
    }

    /// The QAPI keyword that introduced this record.
    pub fn kind(&self) -> &'static str {
        match self {
            SchemaRecord::Struct(_) => "struct",
            SchemaRecord::Enum(_) => "enum",
            SchemaRecord::Command(_) => "command",
            SchemaRecord::Event(_) => "event",
        }
    }
}

/// A `{ 'struct': ..., 'data': { ... } }` definition.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: String,
    /// Members in declaration order, keyed by name with any `*` optional
    /// marker removed.
    pub fields: IndexMap<String, Field>,
}

/// One member of a struct.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// The member was written as `'*name'`.
    pub optional: bool,
    pub ty: TypeDescriptor,
}

/// The type of a struct member, in one of the three shapes QAPI allows.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    /// `'member': 'type'`
    Name(String),
    /// `'member': { 'type': 'type', ... }`. Keys other than `type` (such as
    /// `if` or `features`) are kept in `qualifiers` but do not affect output.
    Qualified {
        name: String,
        qualifiers: Map<String, Value>,
    },
    /// `'member': [ 'type' ]`
    Repeated(String),
}

impl TypeDescriptor {
    /// The name of the (element) type.
    pub fn type_name(&self) -> &str {
        match self {
            TypeDescriptor::Name(name)
            | TypeDescriptor::Qualified { name, .. }
            | TypeDescriptor::Repeated(name) => name,
        }
    }

    pub fn is_repeated(&self) -> bool {
        matches!(self, TypeDescriptor::Repeated(_))
    }
}

/// A `{ 'enum': ..., 'data': [ ... ] }` definition.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: String,
    pub members: Vec<EnumMember>,
}

/// An enum value together with its numeric tag.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    /// Position of the value in the QAPI `data` list.
    pub tag: usize,
    pub value: ValueDescriptor,
}

/// An enum value, either bare or as an object carrying a `name`.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueDescriptor {
    Name(String),
    Qualified {
        name: String,
        qualifiers: Map<String, Value>,
    },
}

impl ValueDescriptor {
    pub fn name(&self) -> &str {
        match self {
            ValueDescriptor::Name(name) | ValueDescriptor::Qualified { name, .. } => name,
        }
    }
}
