//! Expression model: columns, literals, operators, function calls, case
//! expressions, subqueries and predicates, plus the typed `Expression<T>`
//! layer used by client code.

pub mod literal;
pub use literal::*;

pub mod truth;
pub use truth::*;

pub mod operators;
pub use operators::*;

pub mod column;
pub use column::*;

pub mod function;
pub use function::*;

pub mod tree;
pub use tree::*;

pub mod predicate;
pub use predicate::*;

pub mod case_expr;
pub use case_expr::*;

pub mod order;
pub use order::*;

pub mod typed;
pub use typed::*;
