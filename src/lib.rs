//! # dynamo-linq: query expression trees to PartiQL
//!
//! Translates host query operator chains (`Where`, `Select`, ...) over a
//! described entity model into PartiQL statements for a key/document store.
//!
//! ## Quick Example
//!
//! ```rust
//! use dynamo_linq::prelude::*;
//!
//! let model = Model::builder()
//!     .entity(
//!         EntityType::builder("Person")
//!             .table("people")
//!             .property("Name", HostType::String)
//!             .property_as("Age", HostType::Int32, "age")
//!             .build(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let chain = dynamo_linq::parse("Person.Where(p => p.Age > 10)").unwrap();
//! let shape = dynamo_linq::translate(&model, &chain).unwrap();
//! let query = shape.to_partiql().unwrap();
//! assert_eq!(query.statement, "SELECT * FROM \"people\" WHERE \"age\" > ?");
//! ```
//!
//! ## Pipeline
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Parse | [`parser`] | [`host::QueryChain`] |
//! | Translate | [`translate`] | [`ast::QueryShape`] |
//! | Render | [`transpiler`] | [`transpiler::PartiqlQuery`] |

pub mod ast;
pub mod error;
pub mod host;
pub mod model;
pub mod parser;
pub mod translate;
pub mod transpiler;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::error::*;
    pub use crate::host::*;
    pub use crate::model::*;
    pub use crate::parser::{parse, parse_lambda};
    pub use crate::translate::{
        MethodCallTranslator, MethodCallTranslatorPlugin, MethodCallTranslatorProvider,
        PartiqlMethodCallTranslatorProvider, QueryableTranslator, ShapedQuery,
    };
    pub use crate::transpiler::{PartiqlParameter, PartiqlQuery, ToPartiql};
}

pub use translate::{translate, translate_with};

/// Parse a textual query chain.
///
/// # Example
///
/// ```
/// use dynamo_linq::parse;
///
/// let chain = parse("Person.Where(p => p.Name.StartsWith(\"A\"))").unwrap();
/// assert_eq!(chain.operators.len(), 2);
/// ```
pub fn parse(input: &str) -> Result<host::QueryChain, error::QueryError> {
    parser::parse(input)
}
