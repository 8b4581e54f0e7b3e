//! PartiQL renderer for a translated [`QueryShape`].
//!
//! Produces the statement text plus its positional parameters. Every
//! non-null constant becomes a `?` placeholder.

use crate::ast::*;
use crate::error::{QueryError, QueryResult};
use crate::model::AttributeType;
use serde::Serialize;

/// A positional statement parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartiqlParameter {
    pub attribute_type: AttributeType,
    pub value: serde_json::Value,
}

/// A rendered PartiQL statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartiqlQuery {
    pub statement: String,
    pub parameters: Vec<PartiqlParameter>,
}

impl std::fmt::Display for PartiqlQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.statement)
    }
}

/// Trait for rendering query models to PartiQL.
pub trait ToPartiql {
    fn to_partiql(&self) -> QueryResult<PartiqlQuery>;
}

impl ToPartiql for QueryShape {
    fn to_partiql(&self) -> QueryResult<PartiqlQuery> {
        let mut renderer = Renderer::default();
        let mut sql = String::from("SELECT ");

        // Projection
        sql.push_str(&projection_list(self));

        // FROM
        sql.push_str(" FROM ");
        sql.push_str(&quote(&self.from().table));

        // WHERE
        if let Some(filter) = self.filter() {
            sql.push_str(" WHERE ");
            sql.push_str(&renderer.render(filter, false)?);
        }

        // ORDER BY
        if !self.orderings().is_empty() {
            let mut terms = Vec::with_capacity(self.orderings().len());
            for ordering in self.orderings() {
                let mut term = renderer.render(&ordering.expression, false)?;
                if ordering.descending {
                    term.push_str(" DESC");
                }
                terms.push(term);
            }
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        Ok(PartiqlQuery {
            statement: sql,
            parameters: renderer.parameters,
        })
    }
}

/// `*` for whole entities (or when no attribute is referenced), otherwise
/// the referenced attributes in first-reference order.
fn projection_list(shape: &QueryShape) -> String {
    let map = shape.projection_map();
    if map.values().any(PartiqlExpr::is_entity_projection) {
        return "*".to_string();
    }

    let mut attributes: Vec<&str> = Vec::new();
    for expr in map.values() {
        expr.for_each_attribute(&mut |access| {
            let name = access.property.attribute.as_str();
            if !attributes.contains(&name) {
                attributes.push(name);
            }
        });
    }

    if attributes.is_empty() {
        "*".to_string()
    } else {
        attributes.iter().map(|a| quote(a)).collect::<Vec<_>>().join(", ")
    }
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[derive(Default)]
struct Renderer {
    parameters: Vec<PartiqlParameter>,
}

impl Renderer {
    /// `nested` wraps binary expressions in parentheses.
    fn render(&mut self, expr: &PartiqlExpr, nested: bool) -> QueryResult<String> {
        let sql = match expr {
            PartiqlExpr::Constant { value: None, .. } => "NULL".to_string(),
            PartiqlExpr::Constant {
                value: Some(value),
                type_mapping,
                ..
            } => {
                let attribute_type = match type_mapping {
                    Some(mapping) => mapping.attribute_type,
                    None => AttributeType::from_host_type(&value.host_type()),
                };
                self.parameters.push(PartiqlParameter {
                    attribute_type,
                    value: value.to_attribute_value(),
                });
                "?".to_string()
            }
            PartiqlExpr::Unary { op, operand, .. } => match op {
                UnaryOp::Not => format!("NOT {}", self.render(operand, true)?),
                UnaryOp::Negate => format!("-{}", self.render(operand, true)?),
            },
            PartiqlExpr::Binary {
                op, left, right, ..
            } => {
                let sql = match (op, is_null(left), is_null(right)) {
                    (BinaryOp::Equal, _, true) => format!("{} IS NULL", self.render(left, true)?),
                    (BinaryOp::Equal, true, _) => format!("{} IS NULL", self.render(right, true)?),
                    (BinaryOp::NotEqual, _, true) => {
                        format!("{} IS NOT NULL", self.render(left, true)?)
                    }
                    (BinaryOp::NotEqual, true, _) => {
                        format!("{} IS NOT NULL", self.render(right, true)?)
                    }
                    _ => {
                        let left = self.render(left, true)?;
                        let right = self.render(right, true)?;
                        format!("{} {} {}", left, op.token(), right)
                    }
                };
                if nested { format!("({})", sql) } else { sql }
            }
            PartiqlExpr::FunctionCall { name, args, .. } => {
                let args = args
                    .iter()
                    .map(|arg| self.render(arg, false))
                    .collect::<QueryResult<Vec<_>>>()?;
                format!("{}({})", name, args.join(", "))
            }
            PartiqlExpr::AttributeAccess(access) => quote(&access.property.attribute),
            PartiqlExpr::EntityProjection(projection) => {
                return Err(QueryError::Render(format!(
                    "entity '{}' cannot be used inside an expression",
                    projection.entity
                )));
            }
        };
        Ok(sql)
    }
}

fn is_null(expr: &PartiqlExpr) -> bool {
    matches!(expr, PartiqlExpr::Constant { value: None, .. })
}
