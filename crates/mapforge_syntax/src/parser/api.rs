/// Parse a token stream into an AST [`Program`].
///
/// This is the main public entrypoint for parsing.
///
/// ## Errors
/// Returns `Err(Vec<CompileError>)` if parsing fails.
#[tracing::instrument(skip_all, fields(token_count = tokens.len()))]
pub fn parse(tokens: &[Token]) -> Result<Program, Vec<CompileError>> {
    Parser::new(tokens).parse()
}

/// Lex and parse `source` in one step.
///
/// ## Errors
/// Lexer errors are returned as-is; parsing only runs on a clean token stream.
pub fn parse_source(source: &str) -> Result<Program, Vec<CompileError>> {
    let tokens = crate::lexer::lex(source)?;
    parse(&tokens)
}
