//! Parser for mapping declarations
//!
//! Converts a token stream into an AST: an optional namespace, imports, and classes whose `map` methods describe how
//! a target is built from a source.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use mapforge_syntax::{lexer, parser};
//!
//! let source = "namespace app\nclass User:\n    name: str\n";
//! let tokens = lexer::lex(source).unwrap();
//! let ast = parser::parse(&tokens).unwrap();
//! assert_eq!(ast.declarations.len(), 2);
//! ```

use crate::ast::*;
use crate::diagnostics::{CompileError, errors};
use crate::lexer::{Token, TokenKind};
use mapforge_core::lang::keywords::KeywordId;
use mapforge_core::lang::operators::OperatorId;
use mapforge_core::lang::punctuation::PunctuationId;

// NOTE: split across files with `include!` so every parser method lives in one module while no single file grows
// too large.

include!("parser/core.rs");
include!("parser/helpers.rs");
include!("parser/decl.rs");
include!("parser/types.rs");
include!("parser/stmts.rs");
include!("parser/expr.rs");
include!("parser/util.rs");
include!("parser/api.rs");
include!("parser/tests.rs");
