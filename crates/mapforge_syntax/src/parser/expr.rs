/// Expression parsing methods.
///
/// Precedence climbs from the conditional expression down to primaries:
///
/// ```text
/// conditional → or → and → not → comparison → additive → multiplicative → unary → postfix → primary
/// ```
///
/// ## Notes
/// - `and` / `or` / `not` arrive from the lexer as keywords.
/// - `a if c else b` binds looser than every binary operator.
impl<'a> Parser<'a> {
    // ========================================================================
    // Expressions
    // ========================================================================

    fn expression(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let then_branch = self.or_expr()?;
        if !self.match_keyword(KeywordId::If) {
            return Ok(then_branch);
        }
        let condition = self.or_expr()?;
        self.expect_keyword(KeywordId::Else, "Expected 'else' in conditional expression")?;
        let else_branch = self.expression()?;
        let span = then_branch.span.merge(else_branch.span);
        Ok(Spanned::new(
            Expr::If(IfExpr {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            }),
            span,
        ))
    }

    fn binary(lhs: Spanned<Expr>, op: BinaryOp, rhs: Spanned<Expr>) -> Spanned<Expr> {
        let span = lhs.span.merge(rhs.span);
        Spanned::new(Expr::Binary(Box::new(lhs), op, Box::new(rhs)), span)
    }

    fn or_expr(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut left = self.and_expr()?;
        while self.match_keyword(KeywordId::Or) {
            let right = self.and_expr()?;
            left = Self::binary(left, BinaryOp::Or, right);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut left = self.not_expr()?;
        while self.match_keyword(KeywordId::And) {
            let right = self.not_expr()?;
            left = Self::binary(left, BinaryOp::And, right);
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> Result<Spanned<Expr>, CompileError> {
        if self.check_keyword(KeywordId::Not) {
            let start = self.current_span().start;
            self.advance();
            let operand = self.not_expr()?;
            let span = Span::new(start, operand.span.end);
            return Ok(Spanned::new(Expr::Unary(UnaryOp::Not, Box::new(operand)), span));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut left = self.additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Operator(OperatorId::EqEq) => BinaryOp::Eq,
                TokenKind::Operator(OperatorId::NotEq) => BinaryOp::NotEq,
                TokenKind::Operator(OperatorId::Lt) => BinaryOp::Lt,
                TokenKind::Operator(OperatorId::LtEq) => BinaryOp::LtEq,
                TokenKind::Operator(OperatorId::Gt) => BinaryOp::Gt,
                TokenKind::Operator(OperatorId::GtEq) => BinaryOp::GtEq,
                _ => break,
            };
            self.advance();
            let right = self.additive()?;
            left = Self::binary(left, op, right);
        }
        Ok(left)
    }

    fn additive(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut left = self.multiplicative()?;
        loop {
            let op = if self.match_op(OperatorId::Plus) {
                BinaryOp::Add
            } else if self.match_op(OperatorId::Minus) {
                BinaryOp::Sub
            } else {
                break;
            };
            let right = self.multiplicative()?;
            left = Self::binary(left, op, right);
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut left = self.unary()?;
        loop {
            let op = if self.match_op(OperatorId::Star) {
                BinaryOp::Mul
            } else if self.match_op(OperatorId::Slash) {
                BinaryOp::Div
            } else if self.match_op(OperatorId::Percent) {
                BinaryOp::Mod
            } else {
                break;
            };
            let right = self.unary()?;
            left = Self::binary(left, op, right);
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Spanned<Expr>, CompileError> {
        if self.check_op(OperatorId::Minus) {
            let start = self.current_span().start;
            self.advance();
            let operand = self.unary()?;
            let span = Span::new(start, operand.span.end);
            return Ok(Spanned::new(Expr::Unary(UnaryOp::Neg, Box::new(operand)), span));
        }
        self.postfix()
    }

    /// Member access, method calls and calls: `a.b`, `a.b(x)`, `f(x)`.
    fn postfix(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut expr = self.primary()?;
        loop {
            if self.match_punct(PunctuationId::Dot) {
                let name = self.identifier()?;
                if self.match_punct(PunctuationId::LParen) {
                    let args = self.call_args()?;
                    self.expect_punct(PunctuationId::RParen, "Expected ')' after arguments")?;
                    let span = Span::new(expr.span.start, self.previous_end());
                    expr = Spanned::new(Expr::MethodCall(Box::new(expr), name, args), span);
                } else {
                    let span = Span::new(expr.span.start, self.previous_end());
                    expr = Spanned::new(Expr::Field(Box::new(expr), name), span);
                }
            } else if self.match_punct(PunctuationId::LParen) {
                let args = self.call_args()?;
                self.expect_punct(PunctuationId::RParen, "Expected ')' after arguments")?;
                let span = Span::new(expr.span.start, self.previous_end());
                expr = Spanned::new(Expr::Call(Box::new(expr), args), span);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let start = self.current_span().start;

        if let Some(lit) = self.try_literal() {
            return Ok(Spanned::new(Expr::Literal(lit), Span::new(start, self.previous_end())));
        }

        if let TokenKind::Ident(name) = &self.peek().kind {
            let name = name.clone();
            self.advance();
            return Ok(Spanned::new(Expr::Ident(name), Span::new(start, self.previous_end())));
        }

        if self.match_punct(PunctuationId::LParen) {
            let inner = self.expression()?;
            self.expect_punct(PunctuationId::RParen, "Expected ')' after expression")?;
            return Ok(Spanned::new(
                Expr::Paren(Box::new(inner)),
                Span::new(start, self.previous_end()),
            ));
        }

        if self.check_keyword(KeywordId::New) {
            return self.new_expr();
        }

        Err(self.unexpected("Expected expression"))
    }

    fn try_literal(&mut self) -> Option<Literal> {
        let lit = match &self.peek().kind {
            TokenKind::Int(n) => Literal::Int(*n),
            TokenKind::Float(x) => Literal::Float(*x),
            TokenKind::String(s) => Literal::String(s.clone()),
            TokenKind::Keyword(KeywordId::True) => Literal::Bool(true),
            TokenKind::Keyword(KeywordId::False) => Literal::Bool(false),
            TokenKind::Keyword(KeywordId::None) => Literal::None,
            _ => return None,
        };
        self.advance();
        Some(lit)
    }

    /// `new Type(name = value, ...)`
    fn new_expr(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let start = self.current_span().start;
        self.expect_keyword(KeywordId::New, "Expected 'new'")?;
        let ty = self.type_expr()?;
        self.expect_punct(PunctuationId::LParen, "Expected '(' after type in 'new' expression")?;

        let mut args = Vec::new();
        while !self.check_punct(PunctuationId::RParen) {
            let named = matches!(self.peek().kind, TokenKind::Ident(_))
                && self.peek_next().kind.is_operator(OperatorId::Eq);
            let name = if named {
                let name = self.identifier_spanned()?;
                self.advance();
                Some(name)
            } else {
                None
            };
            let value = self.expression()?;
            args.push(NewArg { name, value });
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        self.expect_punct(PunctuationId::RParen, "Expected ')' after initializers")?;

        Ok(Spanned::new(
            Expr::New(NewExpr { ty, args }),
            Span::new(start, self.previous_end()),
        ))
    }
}
