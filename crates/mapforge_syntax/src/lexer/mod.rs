//! Lexer for mapping declarations
//!
//! Handles tokenization including:
//! - Keywords (namespace, import, class, def, let, new, ...)
//! - Identifiers and literals (int, float, string)
//! - Operators and punctuation (`::`, `->`, `@`, `...`)
//! - Indentation-based blocks (INDENT/DEDENT tokens)
//!
//! ## Module Structure
//!
//! - `tokens` - Token types (TokenKind, Token)
//! - `strings` - String literal scanning
//! - `numbers` - Numeric literal scanning
//! - `indent` - INDENT/DEDENT handling

mod indent;
mod numbers;
mod strings;
pub mod tokens;

pub use tokens::{Token, TokenKind, keyword_id};

use crate::ast::Span;
use crate::diagnostics::CompileError;
use mapforge_core::lang::operators::OperatorId;
use mapforge_core::lang::punctuation::PunctuationId;

// ============================================================================
// LEXER STATE
// ----------------------------------------------------------------------------
// [Start of line] → count spaces → [Inside code]
//                                       ↓
//                                      see '(' or '[' → [bracket_depth++]
//                                       ↓
//                                      see '\n' → skip (inside brackets)
//                                       ↓
//                                      see ')' or ']' → [bracket_depth--]
// ============================================================================

/// Lexer for mapping sources.
///
/// Converts source text into a stream of tokens, handling Python-style indentation and implicit line continuation
/// inside brackets.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    indent_stack: Vec<usize>,
    pending_dedents: usize,
    at_line_start: bool,
    /// Bracket depth for implicit line continuation
    bracket_depth: usize,
    tokens: Vec<Token>,
    errors: Vec<CompileError>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            indent_stack: vec![0],
            pending_dedents: 0,
            at_line_start: true,
            bracket_depth: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Tokenize the entire source.
    ///
    /// The token stream always ends with `Newline?`, the remaining `Dedent`s, and `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<CompileError>> {
        while !self.is_at_end() || self.pending_dedents > 0 {
            self.scan_token();
        }

        // Close the last logical line so statement parsers see a terminator
        if !matches!(
            self.tokens.last().map(|t| &t.kind),
            None | Some(TokenKind::Newline) | Some(TokenKind::Dedent) | Some(TokenKind::Indent)
        ) {
            self.tokens.push(Token::new(
                TokenKind::Newline,
                Span::new(self.current_pos, self.current_pos),
            ));
        }

        if self.bracket_depth > 0 {
            self.errors.push(CompileError::syntax(
                "Unclosed bracket at end of file".to_string(),
                Span::new(self.current_pos, self.current_pos),
            ));
        }

        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.tokens.push(Token::new(
                TokenKind::Dedent,
                Span::new(self.current_pos, self.current_pos),
            ));
        }

        self.tokens.push(Token::new(
            TokenKind::Eof,
            Span::new(self.current_pos, self.current_pos),
        ));

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }

    // ========================================================================
    // Core character handling
    // ========================================================================

    fn is_at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.source[self.current_pos..].chars();
        iter.next();
        iter.next()
    }

    fn advance(&mut self) -> Option<char> {
        let (pos, c) = self.chars.next()?;
        self.current_pos = pos + c.len_utf8();
        Some(c)
    }

    // ========================================================================
    // Main scanning dispatch
    // ========================================================================

    fn scan_token(&mut self) {
        if self.pending_dedents > 0 {
            self.pending_dedents -= 1;
            self.tokens.push(Token::new(
                TokenKind::Dedent,
                Span::new(self.current_pos, self.current_pos),
            ));
            return;
        }

        if self.at_line_start && self.bracket_depth == 0 {
            self.handle_indentation();
            return;
        }

        while let Some(' ' | '\t') = self.peek() {
            self.advance();
        }

        let start = self.current_pos;
        let Some(c) = self.advance() else {
            return;
        };

        match c {
            '#' => {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            }

            '\n' => {
                if self.bracket_depth > 0 {
                    return;
                }
                if !self.at_line_start {
                    self.tokens
                        .push(Token::new(TokenKind::Newline, Span::new(start, self.current_pos)));
                }
                self.at_line_start = true;
            }

            '\r' => {}

            '+' => self.add_op(OperatorId::Plus, start),
            '-' => {
                if self.match_char('>') {
                    self.add_punct(PunctuationId::Arrow, start);
                } else {
                    self.add_op(OperatorId::Minus, start);
                }
            }
            '*' => self.add_op(OperatorId::Star, start),
            '/' => self.add_op(OperatorId::Slash, start),
            '%' => self.add_op(OperatorId::Percent, start),
            '@' => self.add_punct(PunctuationId::At, start),
            ',' => self.add_punct(PunctuationId::Comma, start),
            '(' => self.open_bracket(PunctuationId::LParen, start),
            ')' => self.close_bracket(PunctuationId::RParen, start),
            '[' => self.open_bracket(PunctuationId::LBracket, start),
            ']' => self.close_bracket(PunctuationId::RBracket, start),
            ':' => {
                if self.match_char(':') {
                    self.add_punct(PunctuationId::ColonColon, start);
                } else {
                    self.add_punct(PunctuationId::Colon, start);
                }
            }
            '=' => {
                if self.match_char('=') {
                    self.add_op(OperatorId::EqEq, start);
                } else {
                    self.add_op(OperatorId::Eq, start);
                }
            }
            '!' => {
                if self.match_char('=') {
                    self.add_op(OperatorId::NotEq, start);
                } else {
                    self.errors.push(CompileError::syntax(
                        "Unexpected character '!'".to_string(),
                        Span::new(start, self.current_pos),
                    ));
                }
            }
            '<' => self.operator(start, OperatorId::Lt, '=', OperatorId::LtEq),
            '>' => self.operator(start, OperatorId::Gt, '=', OperatorId::GtEq),
            '.' => {
                if self.peek() == Some('.') && self.peek_next() == Some('.') {
                    self.advance();
                    self.advance();
                    self.add_punct(PunctuationId::Ellipsis, start);
                } else {
                    self.add_punct(PunctuationId::Dot, start);
                }
            }

            '"' => self.scan_string(start, '"'),
            '\'' => self.scan_string(start, '\''),

            '0'..='9' => self.scan_number(start, c),

            _ if is_ident_start(c) => self.scan_identifier(start),

            _ => {
                self.errors.push(CompileError::syntax(
                    format!("Unexpected character '{c}'"),
                    Span::new(start, self.current_pos),
                ));
            }
        }
    }

    // ========================================================================
    // Operator helpers
    // ========================================================================

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn add_token(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token::new(kind, Span::new(start, self.current_pos)));
    }

    fn add_op(&mut self, id: OperatorId, start: usize) {
        self.add_token(TokenKind::Operator(id), start);
    }

    fn add_punct(&mut self, id: PunctuationId, start: usize) {
        self.add_token(TokenKind::Punctuation(id), start);
    }

    /// Match a two-character operator, falling back to the single-character one.
    fn operator(&mut self, start: usize, simple: OperatorId, second: char, compound: OperatorId) {
        if self.match_char(second) {
            self.add_op(compound, start);
        } else {
            self.add_op(simple, start);
        }
    }

    fn open_bracket(&mut self, kind: PunctuationId, start: usize) {
        self.bracket_depth += 1;
        self.add_punct(kind, start);
    }

    fn close_bracket(&mut self, kind: PunctuationId, start: usize) {
        if self.bracket_depth == 0 {
            self.errors.push(CompileError::syntax(
                "Unmatched closing bracket".to_string(),
                Span::new(start, self.current_pos),
            ));
        } else {
            self.bracket_depth -= 1;
        }
        self.add_punct(kind, start);
    }

    // ========================================================================
    // Identifier scanning
    // ========================================================================

    fn scan_identifier(&mut self, start: usize) {
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.advance();
            } else {
                break;
            }
        }

        let spelling = &self.source[start..self.current_pos];
        if let Some(id) = keyword_id(spelling) {
            self.add_token(TokenKind::Keyword(id), start);
        } else {
            self.add_token(TokenKind::Ident(spelling.to_string()), start);
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Check if a character can start an identifier (ASCII-only).
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Check if a character can continue an identifier (ASCII-only).
fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Convenience function to lex a source string.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn lex(source: &str) -> Result<Vec<Token>, Vec<CompileError>> {
    Lexer::new(source).tokenize()
}

// ============================================================================
// TESTS
// ============================================================================
