/// Miscellaneous parser utilities.
impl<'a> Parser<'a> {
    // ========================================================================
    // Utilities
    // ========================================================================

    fn identifier(&mut self) -> Result<Ident, CompileError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("Expected identifier")),
        }
    }

    fn identifier_spanned(&mut self) -> Result<Spanned<Ident>, CompileError> {
        let span = self.current_span();
        let name = self.identifier()?;
        Ok(Spanned::new(name, span))
    }

    /// Comma-separated expressions up to (not including) `)`. A trailing comma is allowed.
    fn call_args(&mut self) -> Result<Vec<Spanned<Expr>>, CompileError> {
        let mut args = Vec::new();
        while !self.check_punct(PunctuationId::RParen) {
            args.push(self.expression()?);
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        Ok(args)
    }
}
