use crate::ast::{Literal, ProjectionMember};
use crate::model::HostType;
use serde::Serialize;

/// Unary operators of the host expression language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HostUnaryOp {
    Not,
    Negate,
    NegateChecked,
    UnaryPlus,
    /// A type conversion (cast) to the given type.
    Convert(HostType),
    OnesComplement,
    ArrayLength,
}

impl std::fmt::Display for HostUnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostUnaryOp::Not => write!(f, "Not"),
            HostUnaryOp::Negate => write!(f, "Negate"),
            HostUnaryOp::NegateChecked => write!(f, "NegateChecked"),
            HostUnaryOp::UnaryPlus => write!(f, "UnaryPlus"),
            HostUnaryOp::Convert(ty) => write!(f, "Convert({})", ty),
            HostUnaryOp::OnesComplement => write!(f, "OnesComplement"),
            HostUnaryOp::ArrayLength => write!(f, "ArrayLength"),
        }
    }
}

/// Binary operators of the host expression language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HostBinaryOp {
    AndAlso,
    OrElse,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Coalesce,
}

impl HostBinaryOp {
    /// Source-level symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            HostBinaryOp::AndAlso => "&&",
            HostBinaryOp::OrElse => "||",
            HostBinaryOp::Equal => "==",
            HostBinaryOp::NotEqual => "!=",
            HostBinaryOp::LessThan => "<",
            HostBinaryOp::LessThanOrEqual => "<=",
            HostBinaryOp::GreaterThan => ">",
            HostBinaryOp::GreaterThanOrEqual => ">=",
            HostBinaryOp::Add => "+",
            HostBinaryOp::Subtract => "-",
            HostBinaryOp::Multiply => "*",
            HostBinaryOp::Divide => "/",
            HostBinaryOp::Modulo => "%",
            HostBinaryOp::Coalesce => "??",
        }
    }
}

impl std::fmt::Display for HostBinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Identifies a called method.
///
/// Instance methods are resolved against the receiver, so only static
/// methods carry their declaring type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MethodRef {
    pub declaring_type: Option<String>,
    pub name: String,
}

impl MethodRef {
    pub fn instance(name: impl Into<String>) -> Self {
        Self {
            declaring_type: None,
            name: name.into(),
        }
    }

    pub fn static_on(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            declaring_type: Some(declaring_type.into()),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for MethodRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.declaring_type {
            Some(ty) => write!(f, "{}.{}", ty, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A node of the host query expression tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum HostExpr {
    Constant {
        value: Option<Literal>,
        host_type: HostType,
    },
    /// A lambda parameter reference.
    Parameter(String),
    Member {
        target: Box<HostExpr>,
        member: String,
    },
    Unary {
        op: HostUnaryOp,
        operand: Box<HostExpr>,
    },
    Binary {
        op: HostBinaryOp,
        left: Box<HostExpr>,
        right: Box<HostExpr>,
    },
    MethodCall {
        /// `None` for static calls.
        instance: Option<Box<HostExpr>>,
        method: MethodRef,
        args: Vec<HostExpr>,
    },
    /// Anonymous object / tuple construction; members in declaration order.
    New { members: Vec<(String, HostExpr)> },
    Conditional {
        test: Box<HostExpr>,
        if_true: Box<HostExpr>,
        if_false: Box<HostExpr>,
    },
    Lambda(Box<Lambda>),
    /// A whole entity row, bound to a projection member of the query.
    EntityShaper {
        entity: String,
        binding: ProjectionMember,
    },
    /// A scalar produced by an earlier projection.
    ProjectionBinding(ProjectionMember),
}

impl HostExpr {
    pub fn constant(value: impl Into<Literal>) -> Self {
        let value = value.into();
        HostExpr::Constant {
            host_type: value.host_type(),
            value: Some(value),
        }
    }

    pub fn null(host_type: HostType) -> Self {
        HostExpr::Constant {
            value: None,
            host_type,
        }
    }

    pub fn param(name: impl Into<String>) -> Self {
        HostExpr::Parameter(name.into())
    }

    /// `self.member`
    pub fn member(self, member: impl Into<String>) -> Self {
        HostExpr::Member {
            target: Box::new(self),
            member: member.into(),
        }
    }

    /// `self.method(args)`
    pub fn call(self, method: impl Into<String>, args: Vec<HostExpr>) -> Self {
        HostExpr::MethodCall {
            instance: Some(Box::new(self)),
            method: MethodRef::instance(method),
            args,
        }
    }

    /// `declaring_type.method(args)`
    pub fn static_call(
        declaring_type: impl Into<String>,
        method: impl Into<String>,
        args: Vec<HostExpr>,
    ) -> Self {
        HostExpr::MethodCall {
            instance: None,
            method: MethodRef::static_on(declaring_type, method),
            args,
        }
    }

    pub fn unary(op: HostUnaryOp, operand: HostExpr) -> Self {
        HostExpr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: HostBinaryOp, left: HostExpr, right: HostExpr) -> Self {
        HostExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn new_object<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = (S, HostExpr)>,
        S: Into<String>,
    {
        HostExpr::New {
            members: members.into_iter().map(|(n, e)| (n.into(), e)).collect(),
        }
    }

    /// Replace every free occurrence of parameter `name` with `replacement`.
    /// Nested lambdas that rebind `name` shadow it.
    pub fn replace_parameter(&self, name: &str, replacement: &HostExpr) -> HostExpr {
        let replace = |e: &HostExpr| Box::new(e.replace_parameter(name, replacement));
        match self {
            HostExpr::Parameter(p) if p == name => replacement.clone(),
            HostExpr::Constant { .. }
            | HostExpr::Parameter(_)
            | HostExpr::EntityShaper { .. }
            | HostExpr::ProjectionBinding(_) => self.clone(),
            HostExpr::Member { target, member } => HostExpr::Member {
                target: replace(target),
                member: member.clone(),
            },
            HostExpr::Unary { op, operand } => HostExpr::Unary {
                op: op.clone(),
                operand: replace(operand),
            },
            HostExpr::Binary { op, left, right } => HostExpr::Binary {
                op: *op,
                left: replace(left),
                right: replace(right),
            },
            HostExpr::MethodCall {
                instance,
                method,
                args,
            } => HostExpr::MethodCall {
                instance: instance.as_deref().map(replace),
                method: method.clone(),
                args: args
                    .iter()
                    .map(|a| a.replace_parameter(name, replacement))
                    .collect(),
            },
            HostExpr::New { members } => HostExpr::New {
                members: members
                    .iter()
                    .map(|(label, e)| (label.clone(), e.replace_parameter(name, replacement)))
                    .collect(),
            },
            HostExpr::Conditional {
                test,
                if_true,
                if_false,
            } => HostExpr::Conditional {
                test: replace(test),
                if_true: replace(if_true),
                if_false: replace(if_false),
            },
            HostExpr::Lambda(lambda) if lambda.parameter == name => self.clone(),
            HostExpr::Lambda(lambda) => HostExpr::Lambda(Box::new(Lambda {
                parameter: lambda.parameter.clone(),
                body: lambda.body.replace_parameter(name, replacement),
            })),
        }
    }
}

impl std::fmt::Display for HostExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostExpr::Constant { value, .. } => match value {
                Some(v) => write!(f, "{}", v),
                None => write!(f, "null"),
            },
            HostExpr::Parameter(name) => write!(f, "{}", name),
            HostExpr::Member { target, member } => write!(f, "{}.{}", target, member),
            HostExpr::Unary { op, operand } => match op {
                HostUnaryOp::Not => write!(f, "!{}", operand),
                HostUnaryOp::Negate | HostUnaryOp::NegateChecked => write!(f, "-{}", operand),
                HostUnaryOp::UnaryPlus => write!(f, "+{}", operand),
                HostUnaryOp::Convert(ty) => write!(f, "({}){}", ty, operand),
                HostUnaryOp::OnesComplement => write!(f, "~{}", operand),
                HostUnaryOp::ArrayLength => write!(f, "{}.Length", operand),
            },
            HostExpr::Binary { op, left, right } => write!(f, "({} {} {})", left, op, right),
            HostExpr::MethodCall {
                instance,
                method,
                args,
            } => {
                match instance {
                    Some(instance) => write!(f, "{}.{}(", instance, method)?,
                    None => write!(f, "{}(", method)?,
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            HostExpr::New { members } => {
                write!(f, "new {{ ")?;
                for (i, (label, e)) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", label, e)?;
                }
                write!(f, " }}")
            }
            HostExpr::Conditional {
                test,
                if_true,
                if_false,
            } => write!(f, "({} ? {} : {})", test, if_true, if_false),
            HostExpr::Lambda(lambda) => write!(f, "{}", lambda),
            HostExpr::EntityShaper { entity, binding } => write!(f, "[{} @ {}]", entity, binding),
            HostExpr::ProjectionBinding(member) => write!(f, "[{}]", member),
        }
    }
}

/// A single-parameter lambda, the argument of `Where`/`Select`/...
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lambda {
    pub parameter: String,
    pub body: HostExpr,
}

impl Lambda {
    pub fn new(parameter: impl Into<String>, body: HostExpr) -> Self {
        Self {
            parameter: parameter.into(),
            body,
        }
    }

    /// The body with the parameter replaced by `argument`.
    pub fn apply(&self, argument: &HostExpr) -> HostExpr {
        self.body.replace_parameter(&self.parameter, argument)
    }
}

impl std::fmt::Display for Lambda {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} => {}", self.parameter, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_substitutes_parameter() {
        let lambda = Lambda::new(
            "p",
            HostExpr::binary(
                HostBinaryOp::GreaterThan,
                HostExpr::param("p").member("Age"),
                HostExpr::constant(10),
            ),
        );
        let shaper = HostExpr::EntityShaper {
            entity: "Person".into(),
            binding: ProjectionMember::root(),
        };
        assert_eq!(lambda.apply(&shaper).to_string(), "([Person @ <root>].Age > 10)");
    }

    #[test]
    fn test_nested_lambda_shadows_parameter() {
        let inner = HostExpr::Lambda(Box::new(Lambda::new("p", HostExpr::param("p"))));
        let replaced = inner.replace_parameter("p", &HostExpr::constant(1));
        assert_eq!(replaced, inner);
    }

    #[test]
    fn test_display() {
        let expr = HostExpr::param("p")
            .member("Name")
            .call("StartsWith", vec![HostExpr::constant("A")]);
        assert_eq!(expr.to_string(), "p.Name.StartsWith(\"A\")");

        let expr =
            HostExpr::static_call("Math", "Round", vec![HostExpr::param("p").member("Price")]);
        assert_eq!(expr.to_string(), "Math.Round(p.Price)");

        let expr = HostExpr::new_object([("Name", HostExpr::param("p").member("Name"))]);
        assert_eq!(expr.to_string(), "new { Name = p.Name }");
    }
}
