/// Token-stream helpers and error recovery.
///
/// Low-level primitives used throughout parsing:
/// - Peeking/consuming tokens (`peek`, `advance`)
/// - Matching / expecting keywords, operators, and punctuation
/// - Layout handling (`skip_newlines`, `skip_dedents`)
/// - Error recovery (`synchronize`)
impl<'a> Parser<'a> {
    // ========================================================================
    // Helpers
    // ========================================================================

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    /// Return the current token without consuming it.
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// Return the token after the current token without consuming it.
    fn peek_next(&self) -> &Token {
        if self.pos + 1 < self.tokens.len() {
            &self.tokens[self.pos + 1]
        } else {
            &self.tokens[self.tokens.len() - 1]
        }
    }

    /// Advance to the next token and return the token we just consumed.
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.pos += 1;
        }
        &self.tokens[self.pos.saturating_sub(1)]
    }

    /// Return `true` if the current token "matches" `kind`.
    ///
    /// ## Notes
    /// - For keywords, operators and punctuation the IDs must match.
    /// - For identifiers and literals only the variant is compared.
    fn check(&self, kind: &TokenKind) -> bool {
        match (kind, &self.peek().kind) {
            (TokenKind::Keyword(k1), TokenKind::Keyword(k2)) => k1 == k2,
            (TokenKind::Operator(o1), TokenKind::Operator(o2)) => o1 == o2,
            (TokenKind::Punctuation(p1), TokenKind::Punctuation(p2)) => p1 == p2,
            _ => std::mem::discriminant(kind) == std::mem::discriminant(&self.peek().kind),
        }
    }

    fn check_keyword(&self, id: KeywordId) -> bool {
        self.peek().kind.is_keyword(id)
    }

    fn check_punct(&self, id: PunctuationId) -> bool {
        self.peek().kind.is_punctuation(id)
    }

    fn check_op(&self, id: OperatorId) -> bool {
        self.peek().kind.is_operator(id)
    }

    /// If the current token matches `kind`, consume it and return `true`.
    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_keyword(&mut self, id: KeywordId) -> bool {
        if self.check_keyword(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_punct(&mut self, id: PunctuationId) -> bool {
        if self.check_punct(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_op(&mut self, id: OperatorId) -> bool {
        if self.check_op(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, msg: &str) -> CompileError {
        CompileError::syntax(
            format!("{}, found {}", msg, self.peek().kind.describe()),
            self.current_span(),
        )
    }

    fn expect(&mut self, kind: &TokenKind, msg: &str) -> Result<&Token, CompileError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(msg))
        }
    }

    fn expect_keyword(&mut self, id: KeywordId, msg: &str) -> Result<&Token, CompileError> {
        if self.check_keyword(id) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(msg))
        }
    }

    fn expect_punct(&mut self, id: PunctuationId, msg: &str) -> Result<&Token, CompileError> {
        if self.check_punct(id) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(msg))
        }
    }

    fn skip_newlines(&mut self) {
        while self.match_token(&TokenKind::Newline) {}
    }

    /// Skip stray DEDENT tokens at the current position (they can show up after error recovery).
    fn skip_dedents(&mut self) {
        while self.match_token(&TokenKind::Dedent) {}
    }

    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.check_keyword(KeywordId::Class)
                || self.check_keyword(KeywordId::Import)
                || self.check_keyword(KeywordId::Namespace)
                || self.check_punct(PunctuationId::At)
            {
                return;
            }
            if matches!(self.peek().kind, TokenKind::Newline) {
                self.advance();
                return;
            }
            self.advance();
        }
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }

    /// End offset of the most recently consumed token.
    fn previous_end(&self) -> usize {
        self.tokens[self.pos.saturating_sub(1)].span.end
    }
}
