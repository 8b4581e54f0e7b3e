//! Smart constructors for [`PartiqlExpr`] nodes.

use crate::ast::operators::functions;
use crate::ast::{BinaryOp, Literal, PartiqlExpr, UnaryOp};
use crate::model::{HostType, TypeMapping, TypeMappingSource};

/// Creates PartiQL expression nodes.
///
/// Operand type mappings are propagated from the left (or only) operand.
/// Constants that have no mapping yet pick up their sibling's mapping first,
/// so `Age > 10` binds `10` with the `Age` attribute's mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionFactory {
    type_mapping_source: TypeMappingSource,
}

impl ExpressionFactory {
    pub fn new(type_mapping_source: TypeMappingSource) -> Self {
        Self {
            type_mapping_source,
        }
    }

    /// A constant with an explicit (or no) type mapping.
    pub fn constant(&self, value: Literal, type_mapping: Option<TypeMapping>) -> PartiqlExpr {
        PartiqlExpr::Constant {
            host_type: value.host_type(),
            value: Some(value),
            type_mapping,
        }
    }

    /// A null constant of the given host type.
    pub fn null(&self, host_type: HostType) -> PartiqlExpr {
        PartiqlExpr::Constant {
            value: None,
            host_type,
            type_mapping: None,
        }
    }

    /// Attach `type_mapping` to an unmapped constant. Every other node is
    /// returned unchanged: its mapping is already derived from its operands.
    pub fn apply_type_mapping(
        &self,
        expr: PartiqlExpr,
        type_mapping: Option<&TypeMapping>,
    ) -> PartiqlExpr {
        match (expr, type_mapping) {
            (
                PartiqlExpr::Constant {
                    value,
                    host_type,
                    type_mapping: None,
                },
                Some(mapping),
            ) => PartiqlExpr::Constant {
                value,
                host_type,
                type_mapping: Some(mapping.clone()),
            },
            (expr, _) => expr,
        }
    }

    fn infer_type_mappings(
        &self,
        left: PartiqlExpr,
        right: PartiqlExpr,
    ) -> (PartiqlExpr, PartiqlExpr) {
        let left_mapping = left.type_mapping().cloned();
        let right_mapping = right.type_mapping().cloned();
        (
            self.apply_type_mapping(left, right_mapping.as_ref()),
            self.apply_type_mapping(right, left_mapping.as_ref()),
        )
    }

    /// Comparisons bind unmapped constants to the sibling's mapping.
    /// `AND`/`OR` leave both operands as they are.
    pub fn binary(&self, op: BinaryOp, left: PartiqlExpr, right: PartiqlExpr) -> PartiqlExpr {
        let (left, right) = if op.is_logical() {
            (left, right)
        } else {
            self.infer_type_mappings(left, right)
        };
        PartiqlExpr::Binary {
            op,
            host_type: left.host_type(),
            type_mapping: left.type_mapping().cloned(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and_also(&self, left: PartiqlExpr, right: PartiqlExpr) -> PartiqlExpr {
        self.binary(BinaryOp::AndAlso, left, right)
    }

    pub fn or_else(&self, left: PartiqlExpr, right: PartiqlExpr) -> PartiqlExpr {
        self.binary(BinaryOp::OrElse, left, right)
    }

    pub fn equal(&self, left: PartiqlExpr, right: PartiqlExpr) -> PartiqlExpr {
        self.binary(BinaryOp::Equal, left, right)
    }

    pub fn not_equal(&self, left: PartiqlExpr, right: PartiqlExpr) -> PartiqlExpr {
        self.binary(BinaryOp::NotEqual, left, right)
    }

    pub fn less_than(&self, left: PartiqlExpr, right: PartiqlExpr) -> PartiqlExpr {
        self.binary(BinaryOp::LessThan, left, right)
    }

    pub fn less_than_or_equal(&self, left: PartiqlExpr, right: PartiqlExpr) -> PartiqlExpr {
        self.binary(BinaryOp::LessThanOrEqual, left, right)
    }

    pub fn greater_than(&self, left: PartiqlExpr, right: PartiqlExpr) -> PartiqlExpr {
        self.binary(BinaryOp::GreaterThan, left, right)
    }

    pub fn greater_than_or_equal(&self, left: PartiqlExpr, right: PartiqlExpr) -> PartiqlExpr {
        self.binary(BinaryOp::GreaterThanOrEqual, left, right)
    }

    pub fn unary(&self, op: UnaryOp, operand: PartiqlExpr) -> PartiqlExpr {
        PartiqlExpr::Unary {
            op,
            host_type: operand.host_type(),
            type_mapping: operand.type_mapping().cloned(),
            operand: Box::new(operand),
        }
    }

    pub fn not(&self, operand: PartiqlExpr) -> PartiqlExpr {
        self.unary(UnaryOp::Not, operand)
    }

    pub fn negate(&self, operand: PartiqlExpr) -> PartiqlExpr {
        self.unary(UnaryOp::Negate, operand)
    }

    /// A function call. Unmapped constant arguments take the first
    /// argument's mapping.
    pub fn function(
        &self,
        name: &str,
        args: Vec<PartiqlExpr>,
        return_type: HostType,
    ) -> PartiqlExpr {
        let first_mapping = args.first().and_then(|a| a.type_mapping()).cloned();
        let args = args
            .into_iter()
            .map(|a| self.apply_type_mapping(a, first_mapping.as_ref()))
            .collect();
        PartiqlExpr::FunctionCall {
            name: name.to_string(),
            args,
            type_mapping: self.type_mapping_source.find_mapping(&return_type),
            return_type,
        }
    }

    /// `BEGINS_WITH(left, right)`
    pub fn begins_with(&self, left: PartiqlExpr, right: PartiqlExpr) -> PartiqlExpr {
        self.function(functions::BEGINS_WITH, vec![left, right], HostType::Bool)
    }

    /// `CONTAINS(left, right)`
    pub fn contains(&self, left: PartiqlExpr, right: PartiqlExpr) -> PartiqlExpr {
        self.function(functions::CONTAINS, vec![left, right], HostType::Bool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AttributeAccess, FromRef};
    use crate::model::{AttributeType, EntityType, Property};

    fn age() -> PartiqlExpr {
        let person = EntityType::builder("Person")
            .property("Age", HostType::Int32)
            .build();
        let property = Property::new("Age", HostType::Int32);
        AttributeAccess::new(&property, FromRef::new(&person)).into()
    }

    #[test]
    fn test_binary_infers_constant_mapping() {
        let factory = ExpressionFactory::default();
        let expr = factory.greater_than(age(), factory.constant(Literal::from(10), None));

        let PartiqlExpr::Binary {
            right, type_mapping, host_type, ..
        } = &expr
        else {
            panic!("expected binary, got {:?}", expr);
        };
        assert_eq!(*host_type, HostType::Int32);
        assert_eq!(type_mapping.as_ref().unwrap().attribute_type, AttributeType::Number);
        assert_eq!(right.type_mapping(), age().type_mapping());
    }

    #[test]
    fn test_constant_on_left_takes_right_mapping() {
        let factory = ExpressionFactory::default();
        let expr = factory.less_than(factory.constant(Literal::from(10), None), age());
        let PartiqlExpr::Binary { left, .. } = &expr else {
            panic!("expected binary");
        };
        assert!(left.type_mapping().is_some());
        assert_eq!(expr.type_mapping(), age().type_mapping());
    }

    #[test]
    fn test_mapped_constant_is_left_alone() {
        let factory = ExpressionFactory::default();
        let mapping = TypeMapping::new(HostType::Int64);
        let constant = factory.constant(Literal::from(10), Some(mapping.clone()));
        let expr = factory.equal(age(), constant);
        let PartiqlExpr::Binary { right, .. } = &expr else {
            panic!("expected binary");
        };
        assert_eq!(right.type_mapping(), Some(&mapping));
    }

    #[test]
    fn test_logical_operators_leave_constants_unmapped() {
        let factory = ExpressionFactory::default();
        let comparison = factory.greater_than(age(), factory.constant(Literal::from(10), None));
        let flag = factory.constant(Literal::Bool(true), None);

        for expr in [
            factory.and_also(comparison.clone(), flag.clone()),
            factory.or_else(flag.clone(), comparison.clone()),
        ] {
            let PartiqlExpr::Binary { left, right, .. } = &expr else {
                panic!("expected binary, got {:?}", expr);
            };
            let operands = [left.as_ref(), right.as_ref()];
            assert!(operands.contains(&&comparison));
            assert!(operands.contains(&&flag));
        }
    }

    #[test]
    fn test_unary_carries_operand_mapping() {
        let factory = ExpressionFactory::default();
        let expr = factory.negate(age());
        assert_eq!(expr.type_mapping(), age().type_mapping());
        assert_eq!(expr.host_type(), HostType::Int32);
        assert_eq!(expr.to_string(), "-\"Person\".Age");
    }

    #[test]
    fn test_function_returns_bool() {
        let factory = ExpressionFactory::default();
        let expr = factory.begins_with(age(), factory.constant(Literal::from("A"), None));
        assert_eq!(expr.host_type(), HostType::Bool);
        assert_eq!(expr.type_mapping().unwrap().attribute_type, AttributeType::Boolean);
        assert_eq!(expr.to_string(), "BEGINS_WITH(\"Person\".Age, \"A\")");
    }
}
