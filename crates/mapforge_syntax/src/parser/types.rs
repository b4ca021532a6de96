/// Type expression parsing.
///
/// Types are paths (`User`, `app::entities::User`) optionally applied to bracketed arguments (`List[int]`).
impl<'a> Parser<'a> {
    // ========================================================================
    // Types
    // ========================================================================

    /// Optional `[T, U]` after a class name.
    fn type_params(&mut self) -> Result<Vec<Ident>, CompileError> {
        if !self.match_punct(PunctuationId::LBracket) {
            return Ok(Vec::new());
        }
        let mut params = vec![self.identifier()?];
        while self.match_punct(PunctuationId::Comma) {
            params.push(self.identifier()?);
        }
        self.expect_punct(PunctuationId::RBracket, "Expected ']' after type parameters")?;
        Ok(params)
    }

    fn type_expr(&mut self) -> Result<Spanned<Type>, CompileError> {
        let start = self.current_span().start;
        let path = self.path()?;

        let ty = if self.match_punct(PunctuationId::LBracket) {
            let args = self.type_list()?;
            self.expect_punct(PunctuationId::RBracket, "Expected ']' after type arguments")?;
            Type::Generic(path, args)
        } else {
            Type::Named(path)
        };

        Ok(Spanned::new(ty, Span::new(start, self.previous_end())))
    }

    fn type_list(&mut self) -> Result<Vec<Spanned<Type>>, CompileError> {
        let mut types = vec![self.type_expr()?];
        while self.match_punct(PunctuationId::Comma) {
            types.push(self.type_expr()?);
        }
        Ok(types)
    }

    /// `a::b::c`
    fn path(&mut self) -> Result<Vec<Ident>, CompileError> {
        let mut segments = vec![self.identifier()?];
        while self.match_punct(PunctuationId::ColonColon) {
            segments.push(self.identifier()?);
        }
        Ok(segments)
    }
}
