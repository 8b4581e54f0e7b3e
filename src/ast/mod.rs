//! The PartiQL side of the translation: expression nodes, the SELECT model
//! and the factory that builds them.

pub mod expr;
pub mod factory;
pub mod operators;
pub mod select;
pub mod values;

pub use expr::*;
pub use factory::ExpressionFactory;
pub use operators::*;
pub use select::*;
pub use values::*;
