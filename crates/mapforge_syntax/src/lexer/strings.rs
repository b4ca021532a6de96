//! String literal scanning.

use super::Lexer;
use super::tokens::TokenKind;
use crate::ast::Span;
use crate::diagnostics::CompileError;

impl<'a> Lexer<'a> {
    /// Scan a single-line string literal. The opening quote has already been consumed.
    pub(super) fn scan_string(&mut self, start: usize, quote: char) {
        let mut value = String::new();

        loop {
            match self.peek() {
                None | Some('\n') => {
                    self.errors.push(CompileError::syntax(
                        "Unterminated string literal".to_string(),
                        Span::new(start, self.current_pos),
                    ));
                    return;
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some('\\') => value.push('\\'),
                        Some('0') => value.push('\0'),
                        Some(q) if q == '"' || q == '\'' => value.push(q),
                        Some(other) => {
                            // Unknown escapes are kept verbatim
                            value.push('\\');
                            value.push(other);
                        }
                        None => {
                            self.errors.push(CompileError::syntax(
                                "Unterminated string literal".to_string(),
                                Span::new(start, self.current_pos),
                            ));
                            return;
                        }
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        self.add_token(TokenKind::String(value), start);
    }
}
