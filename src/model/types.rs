//! Host value types, store attribute types and the mapping between them.

use serde::{Deserialize, Serialize};

/// The type of a value on the host side of the translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostType {
    Bool,
    Int32,
    Int64,
    Double,
    Decimal,
    String,
    Char,
    DateTime,
    /// A mapped entity type, by name.
    Entity(String),
    /// Anything the store has no native representation for (anonymous
    /// objects, untyped nulls).
    Object,
}

impl HostType {
    /// Value types and strings; everything a single attribute can hold.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, HostType::Entity(_) | HostType::Object)
    }
}

impl std::fmt::Display for HostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostType::Bool => write!(f, "bool"),
            HostType::Int32 => write!(f, "int32"),
            HostType::Int64 => write!(f, "int64"),
            HostType::Double => write!(f, "double"),
            HostType::Decimal => write!(f, "decimal"),
            HostType::String => write!(f, "string"),
            HostType::Char => write!(f, "char"),
            HostType::DateTime => write!(f, "date_time"),
            HostType::Entity(name) => write!(f, "{}", name),
            HostType::Object => write!(f, "object"),
        }
    }
}

/// Attribute data types understood by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeType {
    #[serde(rename = "S")]
    String,
    #[serde(rename = "N")]
    Number,
    #[serde(rename = "BOOL")]
    Boolean,
    #[serde(rename = "NULL")]
    Null,
    #[serde(rename = "SS")]
    StringSet,
    #[serde(rename = "NS")]
    NumberSet,
}

impl AttributeType {
    /// The store type a host value of `host_type` is written as.
    pub fn from_host_type(host_type: &HostType) -> Self {
        match host_type {
            HostType::Bool => AttributeType::Boolean,
            HostType::Int32 | HostType::Int64 | HostType::Double | HostType::Decimal => {
                AttributeType::Number
            }
            HostType::String | HostType::Char | HostType::DateTime => AttributeType::String,
            HostType::Entity(_) | HostType::Object => AttributeType::String,
        }
    }

    /// The wire descriptor (`S`, `N`, ...).
    pub fn descriptor(&self) -> &'static str {
        match self {
            AttributeType::String => "S",
            AttributeType::Number => "N",
            AttributeType::Boolean => "BOOL",
            AttributeType::Null => "NULL",
            AttributeType::StringSet => "SS",
            AttributeType::NumberSet => "NS",
        }
    }
}

impl std::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.descriptor())
    }
}

/// How values of one host type are (de)serialized to store attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeMapping {
    pub host_type: HostType,
    pub attribute_type: AttributeType,
}

impl TypeMapping {
    pub fn new(host_type: HostType) -> Self {
        let attribute_type = AttributeType::from_host_type(&host_type);
        Self {
            host_type,
            attribute_type,
        }
    }
}

/// Resolves type mappings for host types.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeMappingSource;

impl TypeMappingSource {
    /// Only primitives get a mapping; entities and objects are not storable
    /// as a single attribute.
    pub fn find_mapping(&self, host_type: &HostType) -> Option<TypeMapping> {
        if host_type.is_primitive() {
            Some(TypeMapping::new(host_type.clone()))
        } else {
            None
        }
    }
}
