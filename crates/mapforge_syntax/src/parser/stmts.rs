/// Statement parsing methods.
///
/// Parses `let`, assignments, `if`/`elif`/`else`, `while`, `return`, `pass` and expression statements, plus
/// indentation-based blocks.
///
/// ## Notes
/// - Block parsing relies on `Indent` / `Dedent` layout tokens produced by the lexer.
impl<'a> Parser<'a> {
    // ========================================================================
    // Statements
    // ========================================================================

    fn block(&mut self) -> Result<Vec<Spanned<Statement>>, CompileError> {
        let mut stmts = Vec::new();
        self.skip_newlines();
        while !self.check(&TokenKind::Dedent) && !self.is_at_end() {
            stmts.push(self.statement()?);
            self.skip_newlines();
        }
        Ok(stmts)
    }

    /// `:` NEWLINE INDENT block DEDENT
    fn indented_block(&mut self, after: &str) -> Result<Vec<Spanned<Statement>>, CompileError> {
        self.expect_punct(PunctuationId::Colon, &format!("Expected ':' after {after}"))?;
        self.expect(&TokenKind::Newline, "Expected newline after ':'")?;
        self.expect(&TokenKind::Indent, "Expected indented block")?;
        let body = self.block()?;
        self.expect(&TokenKind::Dedent, "Expected dedent after block")?;
        Ok(body)
    }

    fn statement(&mut self) -> Result<Spanned<Statement>, CompileError> {
        let start = self.current_span().start;

        let stmt = if self.check_keyword(KeywordId::If) {
            self.if_stmt()?
        } else if self.check_keyword(KeywordId::While) {
            self.while_stmt()?
        } else {
            let simple = if self.check_keyword(KeywordId::Return) {
                self.return_stmt()?
            } else if self.match_keyword(KeywordId::Pass) {
                Statement::Pass
            } else if self.check_keyword(KeywordId::Let) {
                self.let_stmt()?
            } else {
                self.assignment_or_expr_stmt()?
            };
            self.end_of_statement()?;
            simple
        };

        Ok(Spanned::new(stmt, Span::new(start, self.previous_end())))
    }

    /// A simple statement must be followed by a line break (or the end of its block).
    fn end_of_statement(&mut self) -> Result<(), CompileError> {
        if self.check(&TokenKind::Newline) || self.check(&TokenKind::Dedent) || self.is_at_end() {
            Ok(())
        } else {
            Err(self.unexpected("Expected end of statement"))
        }
    }

    fn return_stmt(&mut self) -> Result<Statement, CompileError> {
        self.expect_keyword(KeywordId::Return, "Expected 'return'")?;
        if self.check(&TokenKind::Newline) || self.check(&TokenKind::Dedent) || self.is_at_end() {
            Ok(Statement::Return(None))
        } else {
            Ok(Statement::Return(Some(self.expression()?)))
        }
    }

    /// `let a = e, b: T = e, c: T`
    fn let_stmt(&mut self) -> Result<Statement, CompileError> {
        self.expect_keyword(KeywordId::Let, "Expected 'let'")?;
        let mut bindings = Vec::new();
        loop {
            let name = self.identifier_spanned()?;
            let ty = if self.match_punct(PunctuationId::Colon) {
                Some(self.type_expr()?)
            } else {
                None
            };
            let value = if self.match_op(OperatorId::Eq) {
                Some(self.expression()?)
            } else {
                None
            };
            if ty.is_none() && value.is_none() {
                return Err(CompileError::syntax(
                    format!("Local '{}' needs a type annotation or an initializer", name.node),
                    name.span,
                ));
            }
            bindings.push(Binding { name, ty, value });
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        Ok(Statement::Let(LetStmt { bindings }))
    }

    fn if_stmt(&mut self) -> Result<Statement, CompileError> {
        self.expect_keyword(KeywordId::If, "Expected 'if'")?;
        let condition = self.expression()?;
        let then_body = self.indented_block("if condition")?;

        let mut elif_branches = Vec::new();
        while self.match_keyword(KeywordId::Elif) {
            let cond = self.expression()?;
            let body = self.indented_block("elif condition")?;
            elif_branches.push((cond, body));
        }

        let else_body = if self.match_keyword(KeywordId::Else) {
            Some(self.indented_block("'else'")?)
        } else {
            None
        };

        Ok(Statement::If(IfStmt {
            condition,
            then_body,
            elif_branches,
            else_body,
        }))
    }

    fn while_stmt(&mut self) -> Result<Statement, CompileError> {
        self.expect_keyword(KeywordId::While, "Expected 'while'")?;
        let condition = self.expression()?;
        let body = self.indented_block("while condition")?;
        Ok(Statement::While(WhileStmt { condition, body }))
    }

    /// `name = expr` or a bare expression.
    fn assignment_or_expr_stmt(&mut self) -> Result<Statement, CompileError> {
        if matches!(self.peek().kind, TokenKind::Ident(_)) && self.peek_next().kind.is_operator(OperatorId::Eq) {
            let target = self.identifier_spanned()?;
            self.advance();
            let value = self.expression()?;
            return Ok(Statement::Assign(AssignStmt { target, value }));
        }

        let expr = self.expression()?;
        if self.check_op(OperatorId::Eq) {
            return Err(CompileError::syntax(
                format!("Cannot assign to '{}'", expr.node),
                expr.span,
            )
            .with_hint("Only local names can be assigned"));
        }
        Ok(Statement::Expr(expr))
    }
}
