//! Query chain parser using nom.
//!
//! Parses the textual form of a host query into a [`QueryChain`].
//!
//! # Syntax Overview
//!
//! ```text
//! Person.Where(p => p.Age > 10 && p.Name.StartsWith("A")).Select(p => new { p.Name, p.Age })
//! ──┬─── ──┬── ───────────────────────┬───────────────────  ──────────────┬──────────────
//!   │      │                          │                                   │
//!   │      │                          │                                   └── Projection lambda
//!   │      │                          └── Predicate lambda
//!   │      └── Query operator
//!   └── Root entity
//! ```
//!
//! Calls on an identifier other than the lambda parameter are static calls
//! (`Math.Round(p.Price)`). Integer literals are `int32` unless they
//! overflow or carry an `L` suffix; `m` marks a decimal.

use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit1, multispace0, one_of, satisfy},
    combinator::{cut, map, not, opt, recognize},
    error::{ErrorKind, ParseError},
    multi::{many0, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use rust_decimal::Decimal;

use crate::ast::Literal;
use crate::error::{QueryError, QueryResult};
use crate::host::*;
use crate::model::HostType;

/// Parse error carrying the remaining input at the point of failure.
#[derive(Debug)]
struct SyntaxError<'a> {
    input: &'a str,
    message: String,
}

impl<'a> ParseError<&'a str> for SyntaxError<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        Self {
            input,
            message: format!("unexpected input ({})", kind.description()),
        }
    }

    fn append(_: &'a str, _: ErrorKind, other: Self) -> Self {
        other
    }

    fn from_char(input: &'a str, c: char) -> Self {
        Self {
            input,
            message: format!("expected '{}'", c),
        }
    }

    // Keep whichever branch got further.
    fn or(self, other: Self) -> Self {
        if other.input.len() < self.input.len() {
            other
        } else {
            self
        }
    }
}

type PResult<'a, T> = IResult<&'a str, T, SyntaxError<'a>>;

fn failure<T>(input: &str, message: impl Into<String>) -> PResult<'_, T> {
    Err(nom::Err::Failure(SyntaxError {
        input,
        message: message.into(),
    }))
}

/// Parse a complete query chain.
pub fn parse(input: &str) -> QueryResult<QueryChain> {
    run(input, chain)
}

/// Parse a single lambda, e.g. `p => p.Age > 10`.
pub fn parse_lambda(input: &str) -> QueryResult<Lambda> {
    run(input, lambda)
}

fn run<'a, T>(input: &'a str, mut parser: impl FnMut(&'a str) -> PResult<'a, T>) -> QueryResult<T> {
    match parser(input) {
        Ok((remaining, value)) => {
            let remaining = remaining.trim_start();
            if remaining.is_empty() {
                Ok(value)
            } else {
                Err(QueryError::parse(
                    input.len() - remaining.len(),
                    format!("Unexpected trailing content: '{}'", remaining),
                ))
            }
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(QueryError::parse(input.len() - e.input.len(), e.message))
        }
        Err(nom::Err::Incomplete(_)) => {
            Err(QueryError::parse(input.len(), "unexpected end of input"))
        }
    }
}

/// A token, after optional whitespace.
fn sym<'a>(token: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    preceded(multispace0, tag(token))
}

fn identifier(input: &str) -> PResult<'_, &str> {
    preceded(
        multispace0,
        recognize(pair(
            satisfy(|c: char| c.is_alphabetic() || c == '_'),
            take_while(|c: char| c.is_alphanumeric() || c == '_'),
        )),
    )(input)
}

fn primitive_type(name: &str) -> Option<HostType> {
    match name {
        "bool" | "Boolean" => Some(HostType::Bool),
        "int" | "Int32" => Some(HostType::Int32),
        "long" | "Int64" => Some(HostType::Int64),
        "double" | "Double" | "float" | "Single" => Some(HostType::Double),
        "decimal" | "Decimal" => Some(HostType::Decimal),
        "string" | "String" => Some(HostType::String),
        "char" | "Char" => Some(HostType::Char),
        "DateTime" => Some(HostType::DateTime),
        "object" | "Object" => Some(HostType::Object),
        _ => None,
    }
}

/// A type argument: a primitive or an entity name.
fn type_name(input: &str) -> PResult<'_, HostType> {
    map(identifier, |name| {
        primitive_type(name).unwrap_or_else(|| HostType::Entity(name.to_string()))
    })(input)
}

/// A cast target; only primitive types, so `(p)` stays a parenthesised
/// expression.
fn cast_type(input: &str) -> PResult<'_, HostType> {
    let (rest, name) = identifier(input)?;
    match primitive_type(name) {
        Some(ty) => Ok((rest, ty)),
        None => Err(nom::Err::Error(SyntaxError::from_error_kind(input, ErrorKind::Tag))),
    }
}

// ---------------------------------------------------------------------------
// Chains and operators
// ---------------------------------------------------------------------------

fn chain(input: &str) -> PResult<'_, QueryChain> {
    let (input, root) = identifier(input)?;
    let (input, operators) = many0(preceded(sym("."), operator))(input)?;
    let mut chain = QueryChain::from_entity(root);
    chain.operators.extend(operators);
    Ok((input, chain))
}

fn operator(input: &str) -> PResult<'_, QueryOperator> {
    let start = input.trim_start();
    let (input, name) = identifier(input)?;
    let (input, type_arg) = opt(delimited(sym("<"), type_name, cut(sym(">"))))(input)?;
    let (input, _) = cut(sym("("))(input)?;
    let or_default = name.ends_with("OrDefault");

    let (input, operator) = match name {
        "Where" => map(cut(lambda), QueryOperator::Where)(input)?,
        "Select" => map(cut(lambda), QueryOperator::Select)(input)?,
        "SelectMany" => map(cut(lambda), QueryOperator::SelectMany)(input)?,
        "SkipWhile" => map(cut(lambda), QueryOperator::SkipWhile)(input)?,
        "TakeWhile" => map(cut(lambda), QueryOperator::TakeWhile)(input)?,
        "All" => map(cut(lambda), QueryOperator::All)(input)?,
        "GroupBy" => map(cut(lambda), QueryOperator::GroupBy)(input)?,
        "OrderBy" | "OrderByDescending" => map(cut(lambda), |key_selector| QueryOperator::OrderBy {
            key_selector,
            ascending: name == "OrderBy",
        })(input)?,
        "ThenBy" | "ThenByDescending" => map(cut(lambda), |key_selector| QueryOperator::ThenBy {
            key_selector,
            ascending: name == "ThenBy",
        })(input)?,
        "Count" => map(opt(lambda), QueryOperator::Count)(input)?,
        "LongCount" => map(opt(lambda), QueryOperator::LongCount)(input)?,
        "Any" => map(opt(lambda), QueryOperator::Any)(input)?,
        "Sum" => map(opt(lambda), QueryOperator::Sum)(input)?,
        "Min" => map(opt(lambda), QueryOperator::Min)(input)?,
        "Max" => map(opt(lambda), QueryOperator::Max)(input)?,
        "Average" => map(opt(lambda), QueryOperator::Average)(input)?,
        "First" | "FirstOrDefault" => map(opt(lambda), |predicate| QueryOperator::First {
            predicate,
            or_default,
        })(input)?,
        "Single" | "SingleOrDefault" => map(opt(lambda), |predicate| QueryOperator::Single {
            predicate,
            or_default,
        })(input)?,
        "Last" | "LastOrDefault" => map(opt(lambda), |predicate| QueryOperator::Last {
            predicate,
            or_default,
        })(input)?,
        "ElementAt" | "ElementAtOrDefault" => map(cut(expr), |index| QueryOperator::ElementAt {
            index,
            or_default,
        })(input)?,
        "Skip" => map(cut(expr), QueryOperator::Skip)(input)?,
        "Take" => map(cut(expr), QueryOperator::Take)(input)?,
        "Contains" => map(cut(expr), QueryOperator::Contains)(input)?,
        "DefaultIfEmpty" => map(opt(expr), QueryOperator::DefaultIfEmpty)(input)?,
        "Distinct" => (input, QueryOperator::Distinct),
        "Reverse" => (input, QueryOperator::Reverse),
        "Union" => map(cut(chain), QueryOperator::Union)(input)?,
        "Concat" => map(cut(chain), QueryOperator::Concat)(input)?,
        "Intersect" => map(cut(chain), QueryOperator::Intersect)(input)?,
        "Except" => map(cut(chain), QueryOperator::Except)(input)?,
        "Join" | "GroupJoin" => {
            let (input, (inner, _, outer_key, _, inner_key, _, result)) = cut(tuple((
                chain,
                sym(","),
                lambda,
                sym(","),
                lambda,
                sym(","),
                lambda,
            )))(input)?;
            let operator = if name == "Join" {
                QueryOperator::Join {
                    inner,
                    outer_key,
                    inner_key,
                    result,
                }
            } else {
                QueryOperator::GroupJoin {
                    inner,
                    outer_key,
                    inner_key,
                    result,
                }
            };
            (input, operator)
        }
        "Cast" | "OfType" => {
            let Some(ty) = type_arg.clone() else {
                return failure(start, format!("{} requires a type argument", name));
            };
            let operator = if name == "Cast" {
                QueryOperator::Cast(ty)
            } else {
                QueryOperator::OfType(ty)
            };
            (input, operator)
        }
        _ => return failure(start, format!("unknown query operator '{}'", name)),
    };

    if type_arg.is_some()
        && !matches!(operator, QueryOperator::Cast(_) | QueryOperator::OfType(_))
    {
        return failure(start, format!("{} does not take a type argument", name));
    }

    let (input, _) = cut(sym(")"))(input)?;
    Ok((input, operator))
}

fn lambda(input: &str) -> PResult<'_, Lambda> {
    let (input, parameter) = identifier(input)?;
    let (input, _) = sym("=>")(input)?;
    let (input, body) = cut(expr)(input)?;
    Ok((input, Lambda::new(parameter, resolve_statics(body, parameter))))
}

/// Turn calls on identifiers other than `parameter` into static calls.
fn resolve_statics(node: HostExpr, parameter: &str) -> HostExpr {
    let resolve = |e: Box<HostExpr>| Box::new(resolve_statics(*e, parameter));
    match node {
        HostExpr::MethodCall {
            instance,
            method,
            args,
        } => {
            let args = args
                .into_iter()
                .map(|arg| resolve_statics(arg, parameter))
                .collect();
            match instance.map(|i| *i) {
                Some(HostExpr::Parameter(name)) if name != parameter => HostExpr::MethodCall {
                    instance: None,
                    method: MethodRef::static_on(name, method.name),
                    args,
                },
                instance => HostExpr::MethodCall {
                    instance: instance.map(|i| Box::new(resolve_statics(i, parameter))),
                    method,
                    args,
                },
            }
        }
        HostExpr::Member { target, member } => HostExpr::Member {
            target: resolve(target),
            member,
        },
        HostExpr::Unary { op, operand } => HostExpr::Unary {
            op,
            operand: resolve(operand),
        },
        HostExpr::Binary { op, left, right } => HostExpr::Binary {
            op,
            left: resolve(left),
            right: resolve(right),
        },
        HostExpr::New { members } => HostExpr::New {
            members: members
                .into_iter()
                .map(|(label, e)| (label, resolve_statics(e, parameter)))
                .collect(),
        },
        HostExpr::Conditional {
            test,
            if_true,
            if_false,
        } => HostExpr::Conditional {
            test: resolve(test),
            if_true: resolve(if_true),
            if_false: resolve(if_false),
        },
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Expressions, lowest precedence first
// ---------------------------------------------------------------------------

fn expr(input: &str) -> PResult<'_, HostExpr> {
    or_expr(input)
}

/// Left-associative fold of `operand (op operand)*`. Longer tokens must
/// come before their prefixes in `operators`.
fn fold_binary<'a>(
    input: &'a str,
    operand: fn(&'a str) -> PResult<'a, HostExpr>,
    operators: &[(&'static str, HostBinaryOp)],
) -> PResult<'a, HostExpr> {
    let (mut input, mut node) = operand(input)?;
    loop {
        let matched = operators
            .iter()
            .find_map(|(token, op)| sym(*token)(input).ok().map(|(rest, _)| (rest, *op)));
        let Some((rest, op)) = matched else {
            return Ok((input, node));
        };
        let (rest, right) = cut(operand)(rest)?;
        node = HostExpr::binary(op, node, right);
        input = rest;
    }
}

fn or_expr(input: &str) -> PResult<'_, HostExpr> {
    fold_binary(input, and_expr, &[("||", HostBinaryOp::OrElse)])
}

fn and_expr(input: &str) -> PResult<'_, HostExpr> {
    fold_binary(input, eq_expr, &[("&&", HostBinaryOp::AndAlso)])
}

fn eq_expr(input: &str) -> PResult<'_, HostExpr> {
    fold_binary(
        input,
        rel_expr,
        &[("==", HostBinaryOp::Equal), ("!=", HostBinaryOp::NotEqual)],
    )
}

fn rel_expr(input: &str) -> PResult<'_, HostExpr> {
    fold_binary(
        input,
        coalesce_expr,
        &[
            ("<=", HostBinaryOp::LessThanOrEqual),
            (">=", HostBinaryOp::GreaterThanOrEqual),
            ("<", HostBinaryOp::LessThan),
            (">", HostBinaryOp::GreaterThan),
        ],
    )
}

fn coalesce_expr(input: &str) -> PResult<'_, HostExpr> {
    fold_binary(input, add_expr, &[("??", HostBinaryOp::Coalesce)])
}

fn add_expr(input: &str) -> PResult<'_, HostExpr> {
    fold_binary(
        input,
        mul_expr,
        &[("+", HostBinaryOp::Add), ("-", HostBinaryOp::Subtract)],
    )
}

fn mul_expr(input: &str) -> PResult<'_, HostExpr> {
    fold_binary(
        input,
        unary_expr,
        &[
            ("*", HostBinaryOp::Multiply),
            ("/", HostBinaryOp::Divide),
            ("%", HostBinaryOp::Modulo),
        ],
    )
}

fn unary_expr(input: &str) -> PResult<'_, HostExpr> {
    alt((
        map(preceded(sym("!"), cut(unary_expr)), |e| {
            HostExpr::unary(HostUnaryOp::Not, e)
        }),
        map(preceded(sym("-"), cut(unary_expr)), negate),
        map(preceded(sym("+"), cut(unary_expr)), |e| {
            HostExpr::unary(HostUnaryOp::UnaryPlus, e)
        }),
        map(
            pair(delimited(sym("("), cast_type, sym(")")), unary_expr),
            |(ty, e)| HostExpr::unary(HostUnaryOp::Convert(ty), e),
        ),
        postfix,
    ))(input)
}

/// Fold `-literal` into a negative literal.
fn negate(operand: HostExpr) -> HostExpr {
    let negated = match &operand {
        HostExpr::Constant {
            value: Some(value), ..
        } => match value {
            Literal::Int32(n) => n.checked_neg().map(Literal::Int32),
            Literal::Int64(n) => n.checked_neg().map(Literal::Int64),
            Literal::Double(n) => Some(Literal::Double(-n)),
            Literal::Decimal(d) => Some(Literal::Decimal(-*d)),
            _ => None,
        },
        _ => None,
    };
    match negated {
        Some(literal) => HostExpr::constant(literal),
        None => HostExpr::unary(HostUnaryOp::Negate, operand),
    }
}

fn postfix(input: &str) -> PResult<'_, HostExpr> {
    let (mut input, mut node) = primary(input)?;
    loop {
        let Ok((rest, member)) = preceded(sym("."), identifier)(input) else {
            return Ok((input, node));
        };
        let (rest, args) = opt(delimited(
            sym("("),
            separated_list0(sym(","), expr),
            cut(sym(")")),
        ))(rest)?;
        node = match args {
            Some(args) => node.call(member, args),
            None => node.member(member),
        };
        input = rest;
    }
}

fn primary(input: &str) -> PResult<'_, HostExpr> {
    alt((
        number,
        string_literal,
        char_literal,
        delimited(sym("("), expr, cut(sym(")"))),
        word,
    ))(input)
}

/// Keywords, object construction and bare identifiers.
fn word(input: &str) -> PResult<'_, HostExpr> {
    let (rest, word) = identifier(input)?;
    match word {
        "true" => Ok((rest, HostExpr::constant(true))),
        "false" => Ok((rest, HostExpr::constant(false))),
        "null" => Ok((rest, HostExpr::null(HostType::Object))),
        "new" => object(rest),
        _ => Ok((rest, HostExpr::param(word))),
    }
}

/// `{ A = expr, p.B }` after `new`.
fn object(input: &str) -> PResult<'_, HostExpr> {
    let (input, members) = delimited(
        cut(sym("{")),
        separated_list1(sym(","), object_member),
        cut(sym("}")),
    )(input)?;
    Ok((input, HostExpr::New { members }))
}

fn member_label(input: &str) -> PResult<'_, &str> {
    terminated(identifier, terminated(sym("="), not(one_of("=>"))))(input)
}

fn object_member(input: &str) -> PResult<'_, (String, HostExpr)> {
    if let Ok((rest, label)) = member_label(input) {
        let (rest, value) = cut(expr)(rest)?;
        return Ok((rest, (label.to_string(), value)));
    }

    let start = input.trim_start();
    let (rest, value) = postfix(input)?;
    let label = match &value {
        HostExpr::Member { member, .. } => member.clone(),
        HostExpr::Parameter(name) => name.clone(),
        _ => return failure(start, "anonymous object member needs a name"),
    };
    Ok((rest, (label, value)))
}

// ---------------------------------------------------------------------------
// Literals
// ---------------------------------------------------------------------------

fn number(input: &str) -> PResult<'_, HostExpr> {
    let (input, _) = multispace0(input)?;
    let start = input;
    let (input, digits) = recognize(pair(digit1, opt(pair(char('.'), digit1))))(input)?;
    let (input, suffix) = opt(one_of("LlMmDdFf"))(input)?;
    let is_float = digits.contains('.');

    let literal = match suffix.map(|c| c.to_ascii_lowercase()) {
        Some('l') if !is_float => digits.parse::<i64>().ok().map(Literal::Int64),
        Some('m') => Decimal::from_str(digits).ok().map(Literal::Decimal),
        Some('d') | Some('f') => digits.parse::<f64>().ok().map(Literal::Double),
        None if is_float => digits.parse::<f64>().ok().map(Literal::Double),
        None => digits
            .parse::<i32>()
            .map(Literal::Int32)
            .or_else(|_| digits.parse::<i64>().map(Literal::Int64))
            .ok(),
        _ => None,
    };

    match literal {
        Some(literal) => Ok((input, HostExpr::constant(literal))),
        None => failure(start, format!("invalid numeric literal '{}'", digits)),
    }
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
    }
}

/// The body of a quoted literal up to the closing `quote`.
fn quoted(input: &str, quote: char) -> PResult<'_, String> {
    let (input, _) = multispace0(input)?;
    let (rest, _) = char(quote)(input)?;
    let mut value = String::new();
    let mut chars = rest.char_indices();
    loop {
        match chars.next() {
            Some((i, c)) if c == quote => return Ok((&rest[i + c.len_utf8()..], value)),
            Some((_, '\\')) => match chars.next() {
                Some((_, c)) => value.push(unescape(c)),
                None => break,
            },
            Some((_, c)) => value.push(c),
            None => break,
        }
    }
    failure(input, "unterminated literal")
}

fn string_literal(input: &str) -> PResult<'_, HostExpr> {
    let (rest, value) = quoted(input, '"')?;
    Ok((rest, HostExpr::constant(value)))
}

fn char_literal(input: &str) -> PResult<'_, HostExpr> {
    let start = input.trim_start();
    let (rest, value) = quoted(input, '\'')?;
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok((rest, HostExpr::constant(c))),
        _ => failure(start, "character literal must hold exactly one character"),
    }
}
