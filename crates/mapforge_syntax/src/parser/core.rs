/// Parser core types and entrypoint.
///
/// This chunk defines the [`Parser`] type and its top-level `parse()` entrypoint.
///
/// ## Notes
/// - This file is `include!`'d into `crate::parser` to keep all parser methods in a single module.
type ClassMembers = (Vec<Spanned<FieldDecl>>, Vec<Spanned<MethodDecl>>);

/// Parser state.
///
/// ## Notes
/// - Single pass. After an error the parser synchronizes at the next declaration or line boundary so one run can
///   report several problems.
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    errors: Vec<CompileError>,
    seen_namespace: bool,
}

impl<'a> Parser<'a> {
    /// Create a new parser for a token stream produced by `mapforge_syntax::lexer`.
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            seen_namespace: false,
        }
    }

    /// Parse the entire token stream into a [`Program`].
    ///
    /// ## Errors
    /// Returns every [`CompileError`] collected while parsing.
    pub fn parse(mut self) -> Result<Program, Vec<CompileError>> {
        let mut declarations = Vec::new();

        self.skip_newlines();
        self.skip_dedents();

        while !self.is_at_end() {
            match self.declaration() {
                Ok(decl) => declarations.push(decl),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
            self.skip_newlines();
            self.skip_dedents();
        }

        if self.errors.is_empty() {
            Ok(Program { declarations })
        } else {
            Err(self.errors)
        }
    }
}
