//! Mapping-language vocabulary registries.
//!
//! This module is the front door for language-level vocabulary: reserved keywords, operators, punctuation,
//! builtin methods, builtin types, diagnostic codes and the Rust keywords generated code must escape.
//!
//! Callers work with **stable IDs** (e.g. `KeywordId`, `BuiltinMethodId`) and look up spellings and metadata via
//! the const registry tables, instead of comparing strings all over the compiler.
//!
//! ## Notes
//! - Registries are **pure**: no AST types, no IO, no side effects.
//! - The lexer/parser enforce syntax; registries provide spellings and metadata for shared use.
//!
//! ## Examples
//! ```rust
//! use mapforge_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("new"), Some(KeywordId::New));
//! assert_eq!(keywords::as_str(KeywordId::New), "new");
//! ```

pub mod builtins;
pub mod conventions;
pub mod diagnostics;
pub mod keywords;
pub mod operators;
pub mod punctuation;
pub mod registry;
pub mod rust_keywords;
pub mod types;
