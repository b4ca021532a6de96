/// Declaration parsing methods.
///
/// Top-level declarations: `namespace`, `import`, and decorated `class`es with their fields and methods.
///
/// ## Notes
/// - Entrypoints return [`Spanned<T>`] to preserve source locations.
/// - Error recovery is handled by `Parser::synchronize()` (in `helpers.rs`).
impl<'a> Parser<'a> {
    // ========================================================================
    // Declarations
    // ========================================================================

    fn declaration(&mut self) -> Result<Spanned<Declaration>, CompileError> {
        let start = self.current_span().start;

        if let TokenKind::String(s) = &self.peek().kind {
            let doc = s.clone();
            self.advance();
            self.match_token(&TokenKind::Newline);
            return Ok(Spanned::new(Declaration::Docstring(doc), Span::new(start, self.previous_end())));
        }

        let decorators = self.decorators()?;

        let decl = if self.check_keyword(KeywordId::Namespace) {
            self.reject_decorators(&decorators, "namespace")?;
            Declaration::Namespace(self.namespace_decl()?)
        } else if self.check_keyword(KeywordId::Import) {
            self.reject_decorators(&decorators, "import")?;
            Declaration::Import(self.import_decl()?)
        } else if self.check_keyword(KeywordId::Class) {
            Declaration::Class(self.class_decl(decorators)?)
        } else {
            return Err(self.unexpected("Expected declaration"));
        };

        Ok(Spanned::new(decl, Span::new(start, self.previous_end())))
    }

    fn reject_decorators(&self, decorators: &[Spanned<Decorator>], what: &str) -> Result<(), CompileError> {
        match decorators.first() {
            Some(d) => Err(CompileError::syntax(
                format!("Decorators are not allowed on {what} declarations"),
                d.span,
            )),
            None => Ok(()),
        }
    }

    /// Parse zero or more `@name` / `@name(Type, ...)` lines.
    fn decorators(&mut self) -> Result<Vec<Spanned<Decorator>>, CompileError> {
        let mut decorators = Vec::new();
        while self.check_punct(PunctuationId::At) {
            let start = self.current_span().start;
            self.advance();
            let name = self.identifier()?;
            let args = if self.match_punct(PunctuationId::LParen) {
                let args = if self.check_punct(PunctuationId::RParen) {
                    Vec::new()
                } else {
                    self.type_list()?
                };
                self.expect_punct(PunctuationId::RParen, "Expected ')' after decorator arguments")?;
                args
            } else {
                Vec::new()
            };
            let end = self.previous_end();
            self.expect(&TokenKind::Newline, "Expected newline after decorator")?;
            decorators.push(Spanned::new(Decorator { name, args }, Span::new(start, end)));
        }
        Ok(decorators)
    }

    /// `namespace a::b::c`
    fn namespace_decl(&mut self) -> Result<NamespaceDecl, CompileError> {
        let keyword_span = self.current_span();
        self.expect_keyword(KeywordId::Namespace, "Expected 'namespace'")?;
        if self.seen_namespace {
            return Err(errors::duplicate_namespace(keyword_span));
        }
        self.seen_namespace = true;
        let path = self.path()?;
        Ok(NamespaceDecl { path })
    }

    /// `import a::b::Name [as Alias]` or `import a::b::*`
    fn import_decl(&mut self) -> Result<ImportDecl, CompileError> {
        self.expect_keyword(KeywordId::Import, "Expected 'import'")?;
        let mut path = vec![self.identifier()?];
        let mut glob = false;
        while self.match_punct(PunctuationId::ColonColon) {
            if self.match_op(OperatorId::Star) {
                glob = true;
                break;
            }
            path.push(self.identifier()?);
        }

        let kind = if glob {
            ImportKind::Glob
        } else if self.match_keyword(KeywordId::As) {
            ImportKind::Item {
                alias: Some(self.identifier()?),
            }
        } else {
            ImportKind::Item { alias: None }
        };

        if !glob && path.len() < 2 {
            return Err(CompileError::syntax(
                "Import path must name a namespace and a type".to_string(),
                self.current_span(),
            )
            .with_hint("Write it as `import namespace::Type` or `import namespace::*`"));
        }

        Ok(ImportDecl { path, kind })
    }

    // ========================================================================
    // Classes
    // ========================================================================

    fn class_decl(&mut self, decorators: Vec<Spanned<Decorator>>) -> Result<ClassDecl, CompileError> {
        self.expect_keyword(KeywordId::Class, "Expected 'class'")?;
        let name = self.identifier()?;
        let type_params = self.type_params()?;

        self.expect_punct(PunctuationId::Colon, "Expected ':' after class header")?;
        self.expect(&TokenKind::Newline, "Expected newline after ':'")?;
        self.expect(&TokenKind::Indent, "Expected indented block")?;

        let (fields, methods) = self.class_members(&name)?;

        self.expect(&TokenKind::Dedent, "Expected dedent after class body")?;

        Ok(ClassDecl {
            decorators,
            name,
            type_params,
            fields,
            methods,
        })
    }

    /// Parse the members of a class body until the closing dedent.
    fn class_members(&mut self, class: &str) -> Result<ClassMembers, CompileError> {
        let mut fields: Vec<Spanned<FieldDecl>> = Vec::new();
        let mut methods: Vec<Spanned<MethodDecl>> = Vec::new();

        self.skip_newlines();
        while !self.check(&TokenKind::Dedent) && !self.is_at_end() {
            if self.check_keyword(KeywordId::Def) {
                methods.push(self.method_decl()?);
            } else if self.match_keyword(KeywordId::Pass) {
                // Empty class body
            } else if let TokenKind::String(_) = self.peek().kind {
                // Member docstring
                self.advance();
            } else {
                let field = self.field_decl()?;
                if fields.iter().any(|f| f.node.name == field.node.name) {
                    return Err(errors::duplicate_member(class, &field.node.name, field.span));
                }
                fields.push(field);
            }
            self.skip_newlines();
        }

        Ok((fields, methods))
    }

    /// `[readonly|writeonly] name: Type`
    fn field_decl(&mut self) -> Result<Spanned<FieldDecl>, CompileError> {
        let start = self.current_span().start;
        let access = if self.match_keyword(KeywordId::Readonly) {
            FieldAccess::ReadOnly
        } else if self.match_keyword(KeywordId::Writeonly) {
            FieldAccess::WriteOnly
        } else {
            FieldAccess::ReadWrite
        };
        let name = self.identifier()?;
        self.expect_punct(PunctuationId::Colon, "Expected ':' after field name")?;
        let ty = self.type_expr()?;
        Ok(Spanned::new(
            FieldDecl { access, name, ty },
            Span::new(start, self.previous_end()),
        ))
    }

    /// `def name(params) [-> Type]: ...` or with an indented body.
    fn method_decl(&mut self) -> Result<Spanned<MethodDecl>, CompileError> {
        let start = self.current_span().start;
        self.expect_keyword(KeywordId::Def, "Expected 'def'")?;
        let name = self.identifier()?;
        self.expect_punct(PunctuationId::LParen, "Expected '(' after method name")?;
        let params = self.params()?;
        self.expect_punct(PunctuationId::RParen, "Expected ')' after parameters")?;

        let return_type = if self.match_punct(PunctuationId::Arrow) {
            Some(self.type_expr()?)
        } else {
            None
        };

        self.expect_punct(PunctuationId::Colon, "Expected ':' after method signature")?;
        let body = if self.match_punct(PunctuationId::Ellipsis) {
            None
        } else {
            self.expect(&TokenKind::Newline, "Expected newline after ':'")?;
            self.expect(&TokenKind::Indent, "Expected indented block")?;
            let b = self.block()?;
            self.expect(&TokenKind::Dedent, "Expected dedent after method body")?;
            Some(b)
        };

        Ok(Spanned::new(
            MethodDecl {
                name,
                params,
                return_type,
                body,
            },
            Span::new(start, self.previous_end()),
        ))
    }

    fn params(&mut self) -> Result<Vec<Spanned<Param>>, CompileError> {
        let mut params = Vec::new();
        if !self.check_punct(PunctuationId::RParen) {
            loop {
                params.push(self.param()?);
                if !self.match_punct(PunctuationId::Comma) || self.check_punct(PunctuationId::RParen) {
                    break;
                }
            }
        }
        Ok(params)
    }

    /// `name: Type [= default]`
    fn param(&mut self) -> Result<Spanned<Param>, CompileError> {
        let start = self.current_span().start;
        let name = self.identifier()?;
        self.expect_punct(PunctuationId::Colon, "Expected ':' after parameter name")?;
        let ty = self.type_expr()?;
        let default = if self.match_op(OperatorId::Eq) {
            Some(self.expression()?)
        } else {
            None
        };
        Ok(Spanned::new(
            Param { name, ty, default },
            Span::new(start, self.previous_end()),
        ))
    }
}
