//! The host-side query representation: operator chains whose lambdas are
//! host expression trees.

mod chain;
mod expr;

pub use chain::{QueryChain, QueryOperator};
pub use expr::{HostBinaryOp, HostExpr, HostUnaryOp, Lambda, MethodRef};
