//! The translation pipeline: operator chain → [`QueryShape`].
//!
//! [`QueryableTranslator`] walks the operator chain and feeds each lambda to
//! [`PartiqlTranslator`], which consults a [`MethodCallTranslatorProvider`]
//! for method calls.

pub mod methods;
pub mod queryable;
pub mod visitor;

pub use methods::{
    MethodCallTranslator, MethodCallTranslatorPlugin, MethodCallTranslatorProvider,
    PartiqlMethodCallTranslatorProvider, StringMethodsTranslator,
};
pub use queryable::{QueryableTranslator, ShapedQuery};
pub use visitor::PartiqlTranslator;

use crate::ast::QueryShape;
use crate::error::QueryResult;
use crate::host::QueryChain;
use crate::model::Model;

/// Translate `chain` with the built-in method translators.
pub fn translate(model: &Model, chain: &QueryChain) -> QueryResult<QueryShape> {
    translate_with(model, chain, &PartiqlMethodCallTranslatorProvider::default())
}

/// Translate `chain` with a caller-supplied method translator provider.
pub fn translate_with(
    model: &Model,
    chain: &QueryChain,
    provider: &dyn MethodCallTranslatorProvider,
) -> QueryResult<QueryShape> {
    let shaped = QueryableTranslator::new(model, provider).translate_chain(chain)?;
    Ok(shaped.query)
}
