//! Operator chain → [`QueryShape`].

use crate::ast::{PartiqlExpr, ProjectionMember, QueryShape};
use crate::error::{QueryError, QueryResult};
use crate::host::{HostExpr, Lambda, QueryChain, QueryOperator};
use crate::model::Model;
use crate::translate::methods::MethodCallTranslatorProvider;
use crate::translate::visitor::{resolve_object_member, PartiqlTranslator};
use indexmap::IndexMap;

/// A query under construction: the SELECT model plus the expression that
/// stands for one output row in the next operator's lambda.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedQuery {
    pub query: QueryShape,
    pub shaper: HostExpr,
}

/// Applies host query operators to a [`ShapedQuery`].
pub struct QueryableTranslator<'a> {
    model: &'a Model,
    translator: PartiqlTranslator<'a>,
}

impl<'a> QueryableTranslator<'a> {
    pub fn new(model: &'a Model, provider: &'a dyn MethodCallTranslatorProvider) -> Self {
        Self {
            model,
            translator: PartiqlTranslator::new(model, provider),
        }
    }

    /// Translate a whole chain. The chain must start with its only
    /// `FromEntity`.
    pub fn translate_chain(&mut self, chain: &QueryChain) -> QueryResult<ShapedQuery> {
        let mut operators = chain.operators.iter();
        let mut source = match operators.next() {
            Some(QueryOperator::FromEntity(entity)) => self.create_root(entity)?,
            Some(other) => {
                return Err(QueryError::InvalidChain(format!(
                    "expected FromEntity at the start of the chain, found {}",
                    other.name()
                )));
            }
            None => return Err(QueryError::InvalidChain("empty query chain".to_string())),
        };

        for operator in operators {
            self.apply(&mut source, operator)?;
        }
        Ok(source)
    }

    /// All rows of `entity`, shaped as whole entities.
    pub fn create_root(&self, entity: &str) -> QueryResult<ShapedQuery> {
        let entity_type = self.model.entity(entity)?;
        tracing::debug!("Query root: {} (table '{}')", entity_type.name, entity_type.table_name());
        Ok(ShapedQuery {
            query: QueryShape::new(entity_type),
            shaper: HostExpr::EntityShaper {
                entity: entity_type.name.clone(),
                binding: ProjectionMember::root(),
            },
        })
    }

    /// Apply one operator. On failure `source` is left as it was.
    pub fn apply(&mut self, source: &mut ShapedQuery, operator: &QueryOperator) -> QueryResult<()> {
        tracing::debug!("Applying {}", operator.name());
        match operator {
            QueryOperator::FromEntity(_) => Err(QueryError::InvalidChain(
                "FromEntity may only appear at the start of a chain".to_string(),
            )),
            QueryOperator::Where(predicate) => self.translate_where(source, predicate),
            QueryOperator::Select(selector) => self.translate_select(source, selector),
            other => Err(QueryError::UnsupportedOperator(other.name())),
        }
    }

    pub fn translate_where(
        &mut self,
        source: &mut ShapedQuery,
        predicate: &Lambda,
    ) -> QueryResult<()> {
        let body = predicate.apply(&source.shaper);
        let checkpoint = source.query.attribute_count();
        match self.translator.translate(&body, &mut source.query) {
            Some(filter) => {
                source.query.apply_filter(filter);
                Ok(())
            }
            None => {
                source.query.truncate_attributes(checkpoint);
                Err(self.untranslatable(predicate))
            }
        }
    }

    pub fn translate_select(
        &mut self,
        source: &mut ShapedQuery,
        selector: &Lambda,
    ) -> QueryResult<()> {
        let body = selector.apply(&source.shaper);
        let checkpoint = source.query.attribute_count();
        let mut projection = IndexMap::new();
        match self.project(&body, ProjectionMember::root(), &mut source.query, &mut projection) {
            Ok(shaper) => {
                source.query.replace_projection_mapping(projection);
                source.shaper = shaper;
                Ok(())
            }
            Err(err) => {
                source.query.truncate_attributes(checkpoint);
                Err(match err {
                    ProjectionError::Untranslatable => self.untranslatable(selector),
                    ProjectionError::Query(err) => err,
                })
            }
        }
    }

    /// Bind every leaf of `expr` to a projection member under `member`,
    /// returning the shaper for the projected rows.
    fn project(
        &mut self,
        expr: &HostExpr,
        member: ProjectionMember,
        shape: &mut QueryShape,
        projection: &mut IndexMap<ProjectionMember, PartiqlExpr>,
    ) -> Result<HostExpr, ProjectionError> {
        match resolve_object_member(expr) {
            HostExpr::New { members } => {
                let mut shaped = Vec::with_capacity(members.len());
                for (label, value) in members {
                    let leaf = self.project(value, member.append(label), shape, projection)?;
                    shaped.push((label.clone(), leaf));
                }
                Ok(HostExpr::New { members: shaped })
            }
            HostExpr::EntityShaper { entity, binding } => {
                let entity_projection = shape.entity_projection(binding).ok_or_else(|| {
                    QueryError::Internal(format!(
                        "entity '{}' has no projection recorded at '{}'",
                        entity, binding
                    ))
                })?;
                projection.insert(member.clone(), entity_projection.into());
                Ok(HostExpr::EntityShaper {
                    entity: entity.clone(),
                    binding: member,
                })
            }
            leaf => {
                let translated = self
                    .translator
                    .translate(leaf, shape)
                    .ok_or(ProjectionError::Untranslatable)?;
                projection.insert(member.clone(), translated);
                Ok(HostExpr::ProjectionBinding(member))
            }
        }
    }

    fn untranslatable(&self, lambda: &Lambda) -> QueryError {
        QueryError::untranslatable(lambda, self.translator.details().map(String::from))
    }
}

enum ProjectionError {
    Untranslatable,
    Query(QueryError),
}

impl From<QueryError> for ProjectionError {
    fn from(err: QueryError) -> Self {
        ProjectionError::Query(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostBinaryOp;
    use crate::model::{EntityType, HostType};
    use crate::translate::PartiqlMethodCallTranslatorProvider;
    use pretty_assertions::assert_eq;

    fn model() -> Model {
        Model::builder()
            .entity(
                EntityType::builder("Person")
                    .table("people")
                    .property("Name", HostType::String)
                    .property("Age", HostType::Int32)
                    .build(),
            )
            .build()
            .unwrap()
    }

    fn age_over(limit: i32) -> Lambda {
        Lambda::new(
            "p",
            HostExpr::binary(
                HostBinaryOp::GreaterThan,
                HostExpr::param("p").member("Age"),
                HostExpr::constant(limit),
            ),
        )
    }

    #[test]
    fn test_chain_must_start_with_root() {
        let model = model();
        let provider = PartiqlMethodCallTranslatorProvider::default();
        let mut translator = QueryableTranslator::new(&model, &provider);

        let chain = QueryChain {
            operators: vec![QueryOperator::Where(age_over(1))],
        };
        assert!(matches!(
            translator.translate_chain(&chain),
            Err(QueryError::InvalidChain(_))
        ));
        assert!(matches!(
            translator.translate_chain(&QueryChain::default()),
            Err(QueryError::InvalidChain(_))
        ));

        let chain =
            QueryChain::from_entity("Person").push(QueryOperator::FromEntity("Person".into()));
        assert!(matches!(
            translator.translate_chain(&chain),
            Err(QueryError::InvalidChain(_))
        ));
    }

    #[test]
    fn test_unknown_entity() {
        let model = model();
        let provider = PartiqlMethodCallTranslatorProvider::default();
        let mut translator = QueryableTranslator::new(&model, &provider);
        let err = translator
            .translate_chain(&QueryChain::from_entity("Order"))
            .unwrap_err();
        assert!(matches!(err, QueryError::UnknownEntity(name) if name == "Order"));
    }

    #[test]
    fn test_failed_where_leaves_shape_untouched() {
        let model = model();
        let provider = PartiqlMethodCallTranslatorProvider::default();
        let mut translator = QueryableTranslator::new(&model, &provider);
        let mut source = translator.create_root("Person").unwrap();
        translator.translate_where(&mut source, &age_over(3)).unwrap();
        let before = source.clone();

        let bad = Lambda::new(
            "p",
            HostExpr::binary(
                HostBinaryOp::AndAlso,
                HostExpr::binary(
                    HostBinaryOp::Equal,
                    HostExpr::param("p").member("Name"),
                    HostExpr::constant("A"),
                ),
                HostExpr::static_call("Math", "Round", vec![HostExpr::param("p").member("Age")]),
            ),
        );
        let err = translator.translate_where(&mut source, &bad).unwrap_err();
        assert!(matches!(err, QueryError::Untranslatable { .. }));
        assert_eq!(source, before);
        assert_eq!(source.query.attributes().count(), 1);
    }

    #[test]
    fn test_failed_select_leaves_shape_untouched() {
        let model = model();
        let provider = PartiqlMethodCallTranslatorProvider::default();
        let mut translator = QueryableTranslator::new(&model, &provider);
        let mut source = translator.create_root("Person").unwrap();
        translator.translate_where(&mut source, &age_over(3)).unwrap();
        let before = source.clone();

        let bad = Lambda::new(
            "p",
            HostExpr::new_object([
                ("N", HostExpr::param("p").member("Name")),
                (
                    "R",
                    HostExpr::static_call(
                        "Math",
                        "Round",
                        vec![HostExpr::param("p").member("Age")],
                    ),
                ),
            ]),
        );
        let err = translator.translate_select(&mut source, &bad).unwrap_err();
        assert!(matches!(err, QueryError::Untranslatable { .. }));
        assert_eq!(source, before);
        assert!(source.query.projection_map().is_empty());
        assert_eq!(source.query.attributes().count(), 1);
    }

    #[test]
    fn test_unbound_entity_shaper_is_internal_error() {
        let model = model();
        let provider = PartiqlMethodCallTranslatorProvider::default();
        let mut translator = QueryableTranslator::new(&model, &provider);
        let mut source = translator.create_root("Person").unwrap();
        source.shaper = HostExpr::EntityShaper {
            entity: "Person".into(),
            binding: ProjectionMember::from_path(["Missing"]),
        };
        let before = source.clone();

        let err = translator
            .translate_select(&mut source, &Lambda::new("p", HostExpr::param("p")))
            .unwrap_err();
        assert!(matches!(err, QueryError::Internal(ref message) if message.contains("Missing")));
        assert_eq!(source, before);
    }

    #[test]
    fn test_select_entity_pass_through() {
        let model = model();
        let provider = PartiqlMethodCallTranslatorProvider::default();
        let mut translator = QueryableTranslator::new(&model, &provider);
        let chain = QueryChain::from_entity("Person")
            .select(Lambda::new(
                "p",
                HostExpr::new_object([
                    ("P", HostExpr::param("p")),
                    ("Age", HostExpr::param("p").member("Age")),
                ]),
            ))
            .select(Lambda::new(
                "x",
                HostExpr::new_object([("Inner", HostExpr::param("x").member("P"))]),
            ));

        let shaped = translator.translate_chain(&chain).unwrap();
        let map = shaped.query.projection_map();
        assert_eq!(map.len(), 1);
        let inner = ProjectionMember::from_path(["Inner"]);
        assert!(map.get(&inner).unwrap().is_entity_projection());
        assert_eq!(
            shaped.shaper,
            HostExpr::new_object([(
                "Inner",
                HostExpr::EntityShaper {
                    entity: "Person".into(),
                    binding: inner
                }
            )])
        );
    }

    #[test]
    fn test_where_after_entity_pass_through() {
        let model = model();
        let provider = PartiqlMethodCallTranslatorProvider::default();
        let mut translator = QueryableTranslator::new(&model, &provider);
        let chain = QueryChain::from_entity("Person")
            .select(Lambda::new(
                "p",
                HostExpr::new_object([("P", HostExpr::param("p"))]),
            ))
            .filter(Lambda::new(
                "x",
                HostExpr::binary(
                    HostBinaryOp::LessThan,
                    HostExpr::param("x").member("P").member("Age"),
                    HostExpr::constant(30),
                ),
            ));

        let shaped = translator.translate_chain(&chain).unwrap();
        assert_eq!(
            shaped.query.filter().unwrap().to_string(),
            "(\"Person\".Age < 30)"
        );
    }

    #[test]
    fn test_unsupported_operator() {
        let model = model();
        let provider = PartiqlMethodCallTranslatorProvider::default();
        let mut translator = QueryableTranslator::new(&model, &provider);
        let chain = QueryChain::from_entity("Person")
            .filter(age_over(1))
            .push(QueryOperator::Distinct);
        let err = translator.translate_chain(&chain).unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedOperator("Distinct")));
    }
}
