//! The SELECT model accumulated while an operator chain is translated.

use crate::ast::{AttributeAccess, EntityProjection, ExpressionFactory, FromRef, PartiqlExpr};
use crate::model::{EntityType, Property};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// A path to one leaf of a projected output shape.
///
/// The empty path is the root: the whole row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProjectionMember(Vec<String>);

impl ProjectionMember {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_path<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(path.into_iter().map(Into::into).collect())
    }

    /// This path extended by one member label.
    pub fn append(&self, label: impl Into<String>) -> Self {
        let mut path = self.0.clone();
        path.push(label.into());
        Self(path)
    }

    pub fn path(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The labels after `prefix`, if this path starts with it.
    pub fn strip_prefix(&self, prefix: &ProjectionMember) -> Option<&[String]> {
        self.0.strip_prefix(prefix.0.as_slice())
    }

    /// `self` followed by `rest`.
    pub fn join(&self, rest: &[String]) -> Self {
        let mut path = self.0.clone();
        path.extend_from_slice(rest);
        Self(path)
    }
}

impl std::fmt::Display for ProjectionMember {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.0.join("."))
        }
    }
}

impl Serialize for ProjectionMember {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ordering {
    pub expression: PartiqlExpr,
    pub descending: bool,
}

/// The SELECT/FROM/WHERE description of one query.
///
/// Created once per query root, mutated in place by each chained operator
/// and consumed by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryShape {
    from: FromRef,
    filter: Option<PartiqlExpr>,
    projection_map: IndexMap<ProjectionMember, PartiqlExpr>,
    orderings: Vec<Ordering>,
    /// Memoized attribute nodes, keyed by property name.
    #[serde(skip)]
    attributes: IndexMap<String, AttributeAccess>,
}

impl QueryShape {
    pub fn new(entity: &EntityType) -> Self {
        Self {
            from: FromRef::new(entity),
            filter: None,
            projection_map: IndexMap::new(),
            orderings: Vec::new(),
            attributes: IndexMap::new(),
        }
    }

    pub fn from(&self) -> &FromRef {
        &self.from
    }

    pub fn filter(&self) -> Option<&PartiqlExpr> {
        self.filter.as_ref()
    }

    pub fn projection_map(&self) -> &IndexMap<ProjectionMember, PartiqlExpr> {
        &self.projection_map
    }

    pub fn orderings(&self) -> &[Ordering] {
        &self.orderings
    }

    /// Set the filter, or AND it onto the existing one (existing first).
    pub fn apply_filter(&mut self, predicate: PartiqlExpr) {
        self.filter = Some(match self.filter.take() {
            None => predicate,
            Some(existing) => ExpressionFactory::default().and_also(existing, predicate),
        });
    }

    /// Replace the projection mapping wholesale.
    pub fn replace_projection_mapping<I>(&mut self, projection_map: I)
    where
        I: IntoIterator<Item = (ProjectionMember, PartiqlExpr)>,
    {
        self.projection_map.clear();
        self.projection_map.extend(projection_map);
    }

    pub fn get_projection(&self, member: &ProjectionMember) -> Option<&PartiqlExpr> {
        self.projection_map.get(member)
    }

    /// The entity projection bound at `member`.
    ///
    /// A shape whose projection was never replaced projects its whole
    /// source entity at the root.
    pub fn entity_projection(&self, member: &ProjectionMember) -> Option<EntityProjection> {
        match self.projection_map.get(member) {
            Some(PartiqlExpr::EntityProjection(projection)) => Some(projection.clone()),
            Some(_) => None,
            None if member.is_root() && self.projection_map.is_empty() => Some(EntityProjection {
                entity: self.from.entity.clone(),
                source: self.from.clone(),
            }),
            None => None,
        }
    }

    /// The attribute node for `property` on this shape's source. Repeated
    /// calls for the same property return equal nodes.
    pub fn get_or_create_attribute(&mut self, property: &Property) -> AttributeAccess {
        if let Some(access) = self.attributes.get(&property.name) {
            return access.clone();
        }
        let access = AttributeAccess::new(property, self.from.clone());
        self.attributes.insert(property.name.clone(), access.clone());
        access
    }

    /// Add an `ORDER BY` term after the existing ones.
    pub fn append_ordering(&mut self, ordering: Ordering) {
        self.orderings.push(ordering);
    }

    /// Memoized attributes, in creation order.
    pub fn attributes(&self) -> impl Iterator<Item = &AttributeAccess> {
        self.attributes.values()
    }

    pub(crate) fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Forget attributes created after the first `len`.
    pub(crate) fn truncate_attributes(&mut self, len: usize) {
        self.attributes.truncate(len);
    }
}

impl std::fmt::Display for QueryShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SELECT ")?;
        if self.projection_map.is_empty() {
            write!(f, "{}.*", self.from)?;
        } else {
            for (i, (member, expr)) in self.projection_map.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} AS {}", expr, member)?;
            }
        }
        write!(f, " FROM {}", self.from)?;
        if let Some(filter) = &self.filter {
            write!(f, " WHERE {}", filter)?;
        }
        if !self.orderings.is_empty() {
            write!(f, " ORDER BY ")?;
            for (i, ordering) in self.orderings.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", ordering.expression)?;
                if ordering.descending {
                    write!(f, " DESC")?;
                }
            }
        }
        Ok(())
    }
}
