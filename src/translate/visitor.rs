//! Host expression → PartiQL expression.

use crate::ast::{BinaryOp, ExpressionFactory, PartiqlExpr, QueryShape};
use crate::host::{HostBinaryOp, HostExpr, HostUnaryOp};
use crate::model::{AttributeType, HostType, Model};
use crate::translate::methods::MethodCallTranslatorProvider;

/// Translates host expressions bottom-up into [`PartiqlExpr`] trees.
///
/// `translate` returns `None` when the expression (or any part of it) has no
/// PartiQL equivalent; [`details`](Self::details) then describes the
/// innermost construct that failed.
pub struct PartiqlTranslator<'a> {
    model: &'a Model,
    provider: &'a dyn MethodCallTranslatorProvider,
    factory: ExpressionFactory,
    details: Option<String>,
}

impl<'a> PartiqlTranslator<'a> {
    pub fn new(model: &'a Model, provider: &'a dyn MethodCallTranslatorProvider) -> Self {
        Self {
            model,
            provider,
            factory: ExpressionFactory::default(),
            details: None,
        }
    }

    /// Why the last `translate` call failed, if it did.
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Translate `expr` against `shape`. Attribute accesses are memoized in
    /// `shape`.
    pub fn translate(&mut self, expr: &HostExpr, shape: &mut QueryShape) -> Option<PartiqlExpr> {
        self.details = None;
        self.visit(expr, shape)
    }

    fn fail(&mut self, details: String) -> Option<PartiqlExpr> {
        tracing::debug!("Untranslatable: {}", details);
        self.details = Some(details);
        None
    }

    fn visit(&mut self, expr: &HostExpr, shape: &mut QueryShape) -> Option<PartiqlExpr> {
        match expr {
            HostExpr::Constant {
                value: Some(value),
                ..
            } => Some(self.factory.constant(value.clone(), None)),
            HostExpr::Constant {
                value: None,
                host_type,
            } => Some(self.factory.null(host_type.clone())),
            HostExpr::Unary { op, operand } => self.visit_unary(expr, op, operand, shape),
            HostExpr::Binary { op, left, right } => {
                let left = self.visit(left, shape)?;
                let right = self.visit(right, shape)?;
                match binary_op(*op) {
                    Some(op) => Some(self.factory.binary(op, left, right)),
                    None => {
                        self.fail(format!("binary operator '{}' has no PartiQL equivalent", op))
                    }
                }
            }
            HostExpr::Member { target, member } => self.visit_member(expr, target, member, shape),
            HostExpr::ProjectionBinding(member) => match shape.get_projection(member) {
                Some(projection) if !projection.is_entity_projection() => Some(projection.clone()),
                Some(_) => self.fail(format!("projection '{}' is an entity, not a scalar", member)),
                None => self.fail(format!("projection '{}' was never bound", member)),
            },
            HostExpr::MethodCall {
                instance: None,
                method,
                ..
            } => self.fail(format!("static method '{}' has no translation", method)),
            HostExpr::MethodCall {
                instance: Some(instance),
                method,
                args,
            } => {
                let instance = self.visit(instance, shape)?;
                let args = args
                    .iter()
                    .map(|arg| self.visit(arg, shape))
                    .collect::<Option<Vec<_>>>()?;
                let (model, provider) = (self.model, self.provider);
                match provider.translate(model, &instance, method, &args) {
                    Some(translated) => Some(translated),
                    None => self.fail(format!(
                        "method '{}' on '{}' has no translation",
                        method,
                        instance.host_type()
                    )),
                }
            }
            HostExpr::EntityShaper { entity, .. } => {
                self.fail(format!("entity '{}' cannot be used as a scalar value", entity))
            }
            HostExpr::Parameter(name) => self.fail(format!("unbound parameter '{}'", name)),
            HostExpr::New { .. } | HostExpr::Conditional { .. } | HostExpr::Lambda(_) => {
                self.fail(format!("'{}' has no PartiQL equivalent", expr))
            }
        }
    }

    fn visit_unary(
        &mut self,
        expr: &HostExpr,
        op: &HostUnaryOp,
        operand: &HostExpr,
        shape: &mut QueryShape,
    ) -> Option<PartiqlExpr> {
        let operand = self.visit(operand, shape)?;
        match op {
            HostUnaryOp::Not => Some(self.factory.not(operand)),
            HostUnaryOp::Negate | HostUnaryOp::NegateChecked => Some(self.factory.negate(operand)),
            HostUnaryOp::UnaryPlus => Some(operand),
            HostUnaryOp::Convert(target) => {
                if same_attribute_type(&operand.host_type(), target) {
                    Some(operand)
                } else {
                    self.fail(format!(
                        "conversion from '{}' to '{}' changes the stored type",
                        operand.host_type(),
                        target
                    ))
                }
            }
            HostUnaryOp::OnesComplement | HostUnaryOp::ArrayLength => {
                self.fail(format!("unary operator '{}' in '{}' is not supported", op, expr))
            }
        }
    }

    fn visit_member(
        &mut self,
        expr: &HostExpr,
        target: &HostExpr,
        member: &str,
        shape: &mut QueryShape,
    ) -> Option<PartiqlExpr> {
        match resolve_object_member(target) {
            HostExpr::EntityShaper { entity, binding } => {
                let model = self.model;
                let Some(entity_type) = model.find_entity(entity) else {
                    return self.fail(format!("unknown entity '{}'", entity));
                };
                let Some(property) = entity_type.find_property(member) else {
                    return self.fail(format!("entity '{}' has no property '{}'", entity, member));
                };
                match shape.entity_projection(binding) {
                    Some(projection) if projection.entity == *entity => {
                        Some(shape.get_or_create_attribute(property).into())
                    }
                    _ => self.fail(format!("'{}' is not bound to entity '{}'", binding, entity)),
                }
            }
            HostExpr::New { members } => match members.iter().find(|(label, _)| label == member) {
                Some((_, selected)) => self.visit(selected, shape),
                None => self.fail(format!("'{}' has no member '{}'", target, member)),
            },
            _ => self.fail(format!("member access '{}' is not supported", expr)),
        }
    }
}

/// Look through member accesses on object constructions:
/// `new { A = x }.A` is `x`.
pub(crate) fn resolve_object_member(expr: &HostExpr) -> &HostExpr {
    if let HostExpr::Member { target, member } = expr {
        if let HostExpr::New { members } = resolve_object_member(target) {
            if let Some((_, selected)) = members.iter().find(|(label, _)| label == member) {
                return resolve_object_member(selected);
            }
        }
    }
    expr
}

fn binary_op(op: HostBinaryOp) -> Option<BinaryOp> {
    match op {
        HostBinaryOp::AndAlso => Some(BinaryOp::AndAlso),
        HostBinaryOp::OrElse => Some(BinaryOp::OrElse),
        HostBinaryOp::Equal => Some(BinaryOp::Equal),
        HostBinaryOp::NotEqual => Some(BinaryOp::NotEqual),
        HostBinaryOp::LessThan => Some(BinaryOp::LessThan),
        HostBinaryOp::LessThanOrEqual => Some(BinaryOp::LessThanOrEqual),
        HostBinaryOp::GreaterThan => Some(BinaryOp::GreaterThan),
        HostBinaryOp::GreaterThanOrEqual => Some(BinaryOp::GreaterThanOrEqual),
        HostBinaryOp::Add
        | HostBinaryOp::Subtract
        | HostBinaryOp::Multiply
        | HostBinaryOp::Divide
        | HostBinaryOp::Modulo
        | HostBinaryOp::Coalesce => None,
    }
}

/// A conversion is transparent when both sides are stored the same way.
fn same_attribute_type(from: &HostType, to: &HostType) -> bool {
    from.is_primitive()
        && to.is_primitive()
        && AttributeType::from_host_type(from) == AttributeType::from_host_type(to)
}
