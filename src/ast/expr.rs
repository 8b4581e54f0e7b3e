use crate::ast::{BinaryOp, Literal, UnaryOp};
use crate::model::{EntityType, HostType, Property, TypeMapping};
use serde::{Deserialize, Serialize};

/// The table source of a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FromRef {
    /// Entity type name, used for attribute resolution and display.
    pub entity: String,
    /// Store table the entity lives in.
    pub table: String,
}

impl FromRef {
    pub fn new(entity: &EntityType) -> Self {
        Self {
            entity: entity.name.clone(),
            table: entity.table_name().to_string(),
        }
    }
}

impl std::fmt::Display for FromRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"", self.entity)
    }
}

/// A resolved entity property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyRef {
    pub name: String,
    /// Store attribute name.
    pub attribute: String,
    pub host_type: HostType,
    pub type_mapping: Option<TypeMapping>,
}

impl From<&Property> for PropertyRef {
    fn from(property: &Property) -> Self {
        Self {
            name: property.name.clone(),
            attribute: property.attribute_name().to_string(),
            host_type: property.host_type.clone(),
            type_mapping: property.type_mapping(),
        }
    }
}

/// A named attribute read from the query source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeAccess {
    pub property: PropertyRef,
    pub source: FromRef,
}

impl AttributeAccess {
    pub fn new(property: &Property, source: FromRef) -> Self {
        Self {
            property: PropertyRef::from(property),
            source,
        }
    }
}

impl std::fmt::Display for AttributeAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.source, self.property.attribute)
    }
}

/// Every attribute of one entity. Per-property accesses are materialized
/// through [`QueryShape::get_or_create_attribute`](crate::ast::QueryShape::get_or_create_attribute).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityProjection {
    pub entity: String,
    pub source: FromRef,
}

impl std::fmt::Display for EntityProjection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.*", self.source)
    }
}

/// A node of the translated PartiQL expression tree.
///
/// Build these through [`ExpressionFactory`](crate::ast::ExpressionFactory),
/// which keeps `host_type` and `type_mapping` consistent with the operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PartiqlExpr {
    /// A literal; `value: None` is a null.
    Constant {
        value: Option<Literal>,
        host_type: HostType,
        type_mapping: Option<TypeMapping>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<PartiqlExpr>,
        host_type: HostType,
        type_mapping: Option<TypeMapping>,
    },
    Binary {
        op: BinaryOp,
        left: Box<PartiqlExpr>,
        right: Box<PartiqlExpr>,
        host_type: HostType,
        type_mapping: Option<TypeMapping>,
    },
    /// A built-in PartiQL function (BEGINS_WITH, CONTAINS, ...).
    FunctionCall {
        name: String,
        args: Vec<PartiqlExpr>,
        return_type: HostType,
        type_mapping: Option<TypeMapping>,
    },
    AttributeAccess(AttributeAccess),
    EntityProjection(EntityProjection),
}

impl PartiqlExpr {
    pub fn host_type(&self) -> HostType {
        match self {
            PartiqlExpr::Constant { host_type, .. }
            | PartiqlExpr::Unary { host_type, .. }
            | PartiqlExpr::Binary { host_type, .. } => host_type.clone(),
            PartiqlExpr::FunctionCall { return_type, .. } => return_type.clone(),
            PartiqlExpr::AttributeAccess(access) => access.property.host_type.clone(),
            PartiqlExpr::EntityProjection(projection) => {
                HostType::Entity(projection.entity.clone())
            }
        }
    }

    pub fn type_mapping(&self) -> Option<&TypeMapping> {
        match self {
            PartiqlExpr::Constant { type_mapping, .. }
            | PartiqlExpr::Unary { type_mapping, .. }
            | PartiqlExpr::Binary { type_mapping, .. }
            | PartiqlExpr::FunctionCall { type_mapping, .. } => type_mapping.as_ref(),
            PartiqlExpr::AttributeAccess(access) => access.property.type_mapping.as_ref(),
            PartiqlExpr::EntityProjection(_) => None,
        }
    }

    pub fn is_entity_projection(&self) -> bool {
        matches!(self, PartiqlExpr::EntityProjection(_))
    }

    /// Visit every attribute access in this tree, left to right.
    pub fn for_each_attribute<'a>(&'a self, f: &mut impl FnMut(&'a AttributeAccess)) {
        match self {
            PartiqlExpr::Constant { .. } | PartiqlExpr::EntityProjection(_) => {}
            PartiqlExpr::Unary { operand, .. } => operand.for_each_attribute(f),
            PartiqlExpr::Binary { left, right, .. } => {
                left.for_each_attribute(f);
                right.for_each_attribute(f);
            }
            PartiqlExpr::FunctionCall { args, .. } => {
                for arg in args {
                    arg.for_each_attribute(f);
                }
            }
            PartiqlExpr::AttributeAccess(access) => f(access),
        }
    }
}

impl From<AttributeAccess> for PartiqlExpr {
    fn from(access: AttributeAccess) -> Self {
        PartiqlExpr::AttributeAccess(access)
    }
}

impl From<EntityProjection> for PartiqlExpr {
    fn from(projection: EntityProjection) -> Self {
        PartiqlExpr::EntityProjection(projection)
    }
}

impl std::fmt::Display for PartiqlExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartiqlExpr::Constant { value, .. } => match value {
                Some(v) => write!(f, "{}", v),
                None => write!(f, "null"),
            },
            PartiqlExpr::Unary { op, operand, .. } => match op {
                UnaryOp::Not => write!(f, "NOT {}", operand),
                UnaryOp::Negate => write!(f, "-{}", operand),
            },
            PartiqlExpr::Binary {
                op, left, right, ..
            } => write!(f, "({} {} {})", left, op, right),
            PartiqlExpr::FunctionCall { name, args, .. } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            PartiqlExpr::AttributeAccess(access) => write!(f, "{}", access),
            PartiqlExpr::EntityProjection(projection) => write!(f, "{}", projection),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ExpressionFactory;
    use crate::model::AttributeType;

    fn person() -> EntityType {
        EntityType::builder("Person")
            .table("people")
            .property("Name", HostType::String)
            .property_as("Age", HostType::Int32, "age")
            .build()
    }

    fn attribute(entity: &EntityType, name: &str) -> PartiqlExpr {
        let property = entity.property(name).unwrap();
        AttributeAccess::new(property, FromRef::new(entity)).into()
    }

    #[test]
    fn test_types_follow_operands() {
        let entity = person();
        let f = ExpressionFactory::default();
        let age = attribute(&entity, "Age");
        assert_eq!(age.host_type(), HostType::Int32);
        assert_eq!(
            age.type_mapping().map(|m| m.attribute_type.clone()),
            Some(AttributeType::Number)
        );

        let negated = f.negate(age);
        assert_eq!(negated.host_type(), HostType::Int32);

        let projection = PartiqlExpr::from(EntityProjection {
            entity: entity.name.clone(),
            source: FromRef::new(&entity),
        });
        assert!(projection.is_entity_projection());
        assert_eq!(projection.host_type(), HostType::Entity("Person".to_string()));
        assert!(projection.type_mapping().is_none());
    }

    #[test]
    fn test_for_each_attribute_in_order() {
        let entity = person();
        let f = ExpressionFactory::default();
        let predicate = f.and_also(
            f.begins_with(
                attribute(&entity, "Name"),
                f.constant(Literal::String("A".into()), None),
            ),
            f.not(f.equal(attribute(&entity, "Age"), f.null(HostType::Int32))),
        );

        let mut seen = Vec::new();
        predicate.for_each_attribute(&mut |a| seen.push(a.property.attribute.as_str()));
        assert_eq!(seen, vec!["Name", "age"]);
    }

    #[test]
    fn test_display() {
        let entity = person();
        let f = ExpressionFactory::default();
        let predicate = f.not(f.equal(attribute(&entity, "Age"), f.null(HostType::Int32)));
        assert_eq!(predicate.to_string(), "NOT (\"Person\".age = null)");
        assert_eq!(
            f.contains(attribute(&entity, "Name"), attribute(&entity, "Name")).to_string(),
            "CONTAINS(\"Person\".Name, \"Person\".Name)"
        );
    }
}
