//! Integer and floating-point literal scanning.

use super::Lexer;
use super::tokens::TokenKind;
use crate::ast::Span;
use crate::diagnostics::CompileError;

impl<'a> Lexer<'a> {
    pub(super) fn scan_number(&mut self, start: usize, first: char) {
        let mut value = String::from(first);
        let mut is_float = false;

        self.scan_digits(&mut value);

        // Decimal part; `1.upper()` style member access is not a float
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            value.push('.');
            self.advance();
            self.scan_digits(&mut value);
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            is_float = true;
            value.push('e');
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                value.push(sign);
                self.advance();
            }
            self.scan_digits(&mut value);
        }

        let span = Span::new(start, self.current_pos);
        if is_float {
            match value.parse::<f64>() {
                Ok(f) => self.add_token(TokenKind::Float(f), start),
                Err(_) => self
                    .errors
                    .push(CompileError::syntax(format!("Invalid float literal: {value}"), span)),
            }
        } else {
            match value.parse::<i64>() {
                Ok(i) => self.add_token(TokenKind::Int(i), start),
                Err(_) => self
                    .errors
                    .push(CompileError::syntax(format!("Invalid integer literal: {value}"), span)),
            }
        }
    }

    /// Consume digits and `_` separators, appending the digits to `value`.
    fn scan_digits(&mut self, value: &mut String) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                value.push(c);
                self.advance();
            } else if c == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }
}
