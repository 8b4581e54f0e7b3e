use crate::host::{HostExpr, Lambda};
use crate::model::HostType;
use serde::Serialize;

/// One query operator applied to the running sequence.
///
/// Only `FromEntity`, `Where` and `Select` translate; the rest are carried so
/// a chain can be parsed and reported faithfully.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum QueryOperator {
    /// Query root: all rows of one entity.
    FromEntity(String),
    Where(Lambda),
    Select(Lambda),
    OrderBy { key_selector: Lambda, ascending: bool },
    ThenBy { key_selector: Lambda, ascending: bool },
    Skip(HostExpr),
    Take(HostExpr),
    SkipWhile(Lambda),
    TakeWhile(Lambda),
    Distinct,
    Reverse,
    Count(Option<Lambda>),
    LongCount(Option<Lambda>),
    Any(Option<Lambda>),
    All(Lambda),
    Sum(Option<Lambda>),
    Min(Option<Lambda>),
    Max(Option<Lambda>),
    Average(Option<Lambda>),
    First { predicate: Option<Lambda>, or_default: bool },
    Single { predicate: Option<Lambda>, or_default: bool },
    Last { predicate: Option<Lambda>, or_default: bool },
    ElementAt { index: HostExpr, or_default: bool },
    GroupBy(Lambda),
    SelectMany(Lambda),
    Join {
        inner: QueryChain,
        outer_key: Lambda,
        inner_key: Lambda,
        result: Lambda,
    },
    GroupJoin {
        inner: QueryChain,
        outer_key: Lambda,
        inner_key: Lambda,
        result: Lambda,
    },
    Union(QueryChain),
    Concat(QueryChain),
    Intersect(QueryChain),
    Except(QueryChain),
    Cast(HostType),
    OfType(HostType),
    DefaultIfEmpty(Option<HostExpr>),
    Contains(HostExpr),
}

impl QueryOperator {
    /// The operator's method name, as written in a query.
    pub fn name(&self) -> &'static str {
        match self {
            QueryOperator::FromEntity(_) => "FromEntity",
            QueryOperator::Where(_) => "Where",
            QueryOperator::Select(_) => "Select",
            QueryOperator::OrderBy { ascending: true, .. } => "OrderBy",
            QueryOperator::OrderBy { ascending: false, .. } => "OrderByDescending",
            QueryOperator::ThenBy { ascending: true, .. } => "ThenBy",
            QueryOperator::ThenBy { ascending: false, .. } => "ThenByDescending",
            QueryOperator::Skip(_) => "Skip",
            QueryOperator::Take(_) => "Take",
            QueryOperator::SkipWhile(_) => "SkipWhile",
            QueryOperator::TakeWhile(_) => "TakeWhile",
            QueryOperator::Distinct => "Distinct",
            QueryOperator::Reverse => "Reverse",
            QueryOperator::Count(_) => "Count",
            QueryOperator::LongCount(_) => "LongCount",
            QueryOperator::Any(_) => "Any",
            QueryOperator::All(_) => "All",
            QueryOperator::Sum(_) => "Sum",
            QueryOperator::Min(_) => "Min",
            QueryOperator::Max(_) => "Max",
            QueryOperator::Average(_) => "Average",
            QueryOperator::First { or_default: false, .. } => "First",
            QueryOperator::First { or_default: true, .. } => "FirstOrDefault",
            QueryOperator::Single { or_default: false, .. } => "Single",
            QueryOperator::Single { or_default: true, .. } => "SingleOrDefault",
            QueryOperator::Last { or_default: false, .. } => "Last",
            QueryOperator::Last { or_default: true, .. } => "LastOrDefault",
            QueryOperator::ElementAt { or_default: false, .. } => "ElementAt",
            QueryOperator::ElementAt { or_default: true, .. } => "ElementAtOrDefault",
            QueryOperator::GroupBy(_) => "GroupBy",
            QueryOperator::SelectMany(_) => "SelectMany",
            QueryOperator::Join { .. } => "Join",
            QueryOperator::GroupJoin { .. } => "GroupJoin",
            QueryOperator::Union(_) => "Union",
            QueryOperator::Concat(_) => "Concat",
            QueryOperator::Intersect(_) => "Intersect",
            QueryOperator::Except(_) => "Except",
            QueryOperator::Cast(_) => "Cast",
            QueryOperator::OfType(_) => "OfType",
            QueryOperator::DefaultIfEmpty(_) => "DefaultIfEmpty",
            QueryOperator::Contains(_) => "Contains",
        }
    }
}

impl std::fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self.name();
        match self {
            QueryOperator::FromEntity(entity) => write!(f, "{}", entity),
            QueryOperator::Where(l)
            | QueryOperator::Select(l)
            | QueryOperator::SkipWhile(l)
            | QueryOperator::TakeWhile(l)
            | QueryOperator::All(l)
            | QueryOperator::GroupBy(l)
            | QueryOperator::SelectMany(l)
            | QueryOperator::OrderBy { key_selector: l, .. }
            | QueryOperator::ThenBy { key_selector: l, .. } => write!(f, "{}({})", name, l),
            QueryOperator::Count(l)
            | QueryOperator::LongCount(l)
            | QueryOperator::Any(l)
            | QueryOperator::Sum(l)
            | QueryOperator::Min(l)
            | QueryOperator::Max(l)
            | QueryOperator::Average(l)
            | QueryOperator::First { predicate: l, .. }
            | QueryOperator::Single { predicate: l, .. }
            | QueryOperator::Last { predicate: l, .. } => match l {
                Some(l) => write!(f, "{}({})", name, l),
                None => write!(f, "{}()", name),
            },
            QueryOperator::Skip(e)
            | QueryOperator::Take(e)
            | QueryOperator::Contains(e)
            | QueryOperator::ElementAt { index: e, .. } => write!(f, "{}({})", name, e),
            QueryOperator::DefaultIfEmpty(e) => match e {
                Some(e) => write!(f, "{}({})", name, e),
                None => write!(f, "{}()", name),
            },
            QueryOperator::Distinct | QueryOperator::Reverse => write!(f, "{}()", name),
            QueryOperator::Join {
                inner,
                outer_key,
                inner_key,
                result,
            }
            | QueryOperator::GroupJoin {
                inner,
                outer_key,
                inner_key,
                result,
            } => write!(f, "{}({}, {}, {}, {})", name, inner, outer_key, inner_key, result),
            QueryOperator::Union(other)
            | QueryOperator::Concat(other)
            | QueryOperator::Intersect(other)
            | QueryOperator::Except(other) => write!(f, "{}({})", name, other),
            QueryOperator::Cast(ty) | QueryOperator::OfType(ty) => write!(f, "{}<{}>()", name, ty),
        }
    }
}

/// An operator chain, innermost (the root) first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryChain {
    pub operators: Vec<QueryOperator>,
}

impl QueryChain {
    /// A chain rooted at all rows of `entity`.
    pub fn from_entity(entity: impl Into<String>) -> Self {
        Self {
            operators: vec![QueryOperator::FromEntity(entity.into())],
        }
    }

    pub fn push(mut self, operator: QueryOperator) -> Self {
        self.operators.push(operator);
        self
    }

    pub fn filter(self, predicate: Lambda) -> Self {
        self.push(QueryOperator::Where(predicate))
    }

    pub fn select(self, selector: Lambda) -> Self {
        self.push(QueryOperator::Select(selector))
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }
}

impl std::fmt::Display for QueryChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, op) in self.operators.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", op)?;
        }
        Ok(())
    }
}
