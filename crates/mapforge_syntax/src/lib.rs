//! Syntax frontend for mapforge mapping declarations: lexer, parser, AST, diagnostics.
//!
//! ## Notes
//! - This crate is syntax-only: it does not resolve names, infer types or analyze factories.
//! - Vocabulary identity (keywords/operators/punctuation) comes from `mapforge_core::lang` registries.
//!
//! ## Examples
//! ```rust,no_run
//! use mapforge_syntax::{lexer, parser};
//!
//! let tokens = lexer::lex("namespace app::models\n").unwrap();
//! let program = parser::parse(&tokens).unwrap();
//! assert_eq!(program.declarations.len(), 1);
//! ```
//!
//! ## See also
//! - `mapforge_core::lang` for registry-backed language vocabulary.

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod token_helpers;
