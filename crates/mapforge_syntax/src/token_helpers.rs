//! Small helper APIs for working with `Token` / `TokenKind`.
//!
//! These keep `matches!(...)` noise out of the parser when checking registry-backed tokens.

use crate::lexer::{Token, TokenKind};
use mapforge_core::lang::keywords::KeywordId;
use mapforge_core::lang::operators::OperatorId;
use mapforge_core::lang::punctuation::PunctuationId;

impl TokenKind {
    /// Return the keyword id, if this is a keyword token.
    pub fn keyword_id(&self) -> Option<KeywordId> {
        match self {
            TokenKind::Keyword(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_keyword(&self, id: KeywordId) -> bool {
        matches!(self, TokenKind::Keyword(k) if *k == id)
    }

    pub fn is_operator(&self, id: OperatorId) -> bool {
        matches!(self, TokenKind::Operator(o) if *o == id)
    }

    pub fn is_punctuation(&self, id: PunctuationId) -> bool {
        matches!(self, TokenKind::Punctuation(p) if *p == id)
    }

    /// `true` for tokens that only shape blocks (newline, indent, dedent).
    pub fn is_layout(&self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent)
    }

    /// Short human-readable description used in "expected X, found Y" errors.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Keyword(id) => format!("keyword '{}'", mapforge_core::lang::keywords::as_str(*id)),
            TokenKind::Operator(id) => format!("'{}'", mapforge_core::lang::operators::as_str(*id)),
            TokenKind::Punctuation(id) => format!("'{}'", mapforge_core::lang::punctuation::as_str(*id)),
            TokenKind::Ident(name) => format!("identifier '{name}'"),
            TokenKind::Int(_) | TokenKind::Float(_) => "number".to_string(),
            TokenKind::String(_) => "string".to_string(),
            TokenKind::Newline => "newline".to_string(),
            TokenKind::Indent => "indent".to_string(),
            TokenKind::Dedent => "dedent".to_string(),
            TokenKind::Eof => "end of file".to_string(),
        }
    }
}

impl Token {
    /// Convenience wrapper for `self.kind.keyword_id()`.
    pub fn keyword_id(&self) -> Option<KeywordId> {
        self.kind.keyword_id()
    }
}
