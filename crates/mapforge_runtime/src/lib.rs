//! Runtime support for generated mappers.
//!
//! Generated code never runs user factory bodies directly. Each mapper carries a [`MapPlan`]: translatable
//! expression trees ([`Expr`], [`Lambda`]) plus the residual statements ([`Stmt`]) a factory replays before its
//! stages. A [`Mapper`] turns that plan into the four call surfaces:
//!
//! - [`Mapper::map`]: eager, one source value to one target value
//! - [`Mapper::callable`]: the same function as a first-class value
//! - [`Mapper::project`]: a deferred [`Query`] built only from expression trees
//! - [`Mapper::map_iter`]: element-wise application over an in-memory iterator
//!
//! Rust types take part through the [`Reflect`] trait, usually derived with `#[derive(Reflect)]`.

// Lets `#[derive(Reflect)]` expand to `::mapforge_runtime::...` paths inside this crate's own tests.
extern crate self as mapforge_runtime;

pub mod error;
pub mod eval;
pub mod expr;
pub mod pipeline;
pub mod query;
pub mod reflect;
pub mod stmt;
pub mod value;

pub use error::{ConvertError, EvalError, MapError};
pub use eval::Scope;
pub use expr::{BinaryOp, Expr, Lambda, UnaryOp};
pub use mapforge_core::lang::builtins::BuiltinMethodId;
pub use mapforge_derive::Reflect;
pub use pipeline::{Args, FactoryPlan, MapFn, MapIter, MapPlan, Mapper, ParameterPlan, RecordShape, ShapeField, into_target};
pub use query::{InMemoryProvider, Query, QueryProvider};
pub use reflect::{CompiledMethod, CompiledParameter, CompiledProperty, CompiledType, FieldValue, Reflect};
pub use stmt::Stmt;
pub use value::{Record, Value};

/// Common imports for generated code.
pub mod prelude {
    pub use crate::{Args, FieldValue, Lambda, MapError, MapPlan, Mapper, Query, Reflect, Value};
}
