//! Provide the canonical vocabulary and naming conventions shared by the mapforge compiler and runtime.
//!
//! This crate is intentionally small and dependency-free. Both the compiler (lexer, parser, analyzer, emitter) and
//! the runtime (expression evaluator) consult it, so a spelling or a diagnostic code is defined exactly once.
//!
//! ## Notes
//!
//! - No IO, no global state, no AST types.
//! - Current scope: language vocabulary registries ([`lang`]) and identifier case conversion ([`naming`]).

pub mod lang;
pub mod naming;
