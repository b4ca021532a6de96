#![forbid(unsafe_code)]
//! Mapforge: a build-time mapping compiler.
//!
//! Mapping declarations (`*.map` files) describe target record types and the `map` factories that build them from
//! a source type. The compiler validates every factory, stages it into translatable expression trees and emits Rust
//! mappers whose call surfaces run on `mapforge_runtime`.
//!
//! ## Pipeline
//!
//! 1. [`compiler::compile`] parses the inputs (`mapforge_syntax`) and builds a [`resolve::Compilation`]
//! 2. [`discovery`] pairs `@map_from(Source)` decorators with their targets
//! 3. [`mapping`] builds the default property mapping and analyzes factories (SM0001-SM0004, SM0006, SM0007)
//! 4. [`backend`] lowers, stages (SM0005) and emits
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod backend;
pub mod cli;
pub mod compiler;
pub mod diagnostics;
pub mod digest;
pub mod discovery;
pub mod mapping;
pub mod model;
pub mod resolve;

pub use backend::EmitOptions;
pub use compiler::{CompileOutput, SourceInput, compile, compile_with};
pub use diagnostics::MapDiagnostic;
pub use mapping::{Map, MapFactory, build_map};
pub use resolve::Compilation;
