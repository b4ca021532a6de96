//! Parsing of type strings found in compiled metadata (`List[app::entities::Tag]`).

use mapforge_core::lang::types;
use mapforge_core::naming;

use super::TypeRef;

/// Parse a written type from compiled metadata.
///
/// Single-segment names are builtins, type parameters of the owner, or types of the owner's namespace, in that
/// order. The parser is lenient: malformed brackets end the argument list instead of failing, since metadata is
/// produced by tooling rather than typed by hand.
pub fn parse_type_string(text: &str, owner_namespace: &str, type_params: &[String]) -> TypeRef {
    let mut cursor = Cursor { text, pos: 0 };
    cursor.parse(owner_namespace, type_params)
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn parse(&mut self, owner_namespace: &str, type_params: &[String]) -> TypeRef {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '[' | ']' | ',') {
                break;
            }
            self.bump();
        }
        let path = self.text[start..self.pos].trim();

        let mut args = Vec::new();
        if self.peek() == Some('[') {
            self.bump();
            loop {
                args.push(self.parse(owner_namespace, type_params));
                match self.peek() {
                    Some(',') => self.bump(),
                    Some(']') => {
                        self.bump();
                        break;
                    }
                    _ => break,
                }
            }
        }

        let base = if path.contains("::") {
            let (namespace, name) = naming::split_qualified(path);
            TypeRef::new(namespace, name)
        } else if let Some(id) = types::from_str(path) {
            TypeRef::builtin(id)
        } else if type_params.iter().any(|p| p == path) {
            TypeRef::new("", path)
        } else {
            TypeRef::new(owner_namespace, path)
        };
        base.with_args(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_canonical() {
        assert_eq!(parse_type_string("string", "app", &[]).to_string(), "str");
        assert_eq!(parse_type_string(" i64 ", "app", &[]).to_string(), "int");
    }

    #[test]
    fn test_nested_generics() {
        let ty = parse_type_string("Option[List[app::entities::Tag]]", "app::models", &[]);
        assert_eq!(ty.name, "Option");
        assert_eq!(ty.args[0].args[0], TypeRef::new("app::entities", "Tag"));
        assert_eq!(ty.to_string(), "Option[List[app::entities::Tag]]");
    }

    #[test]
    fn test_short_names_use_owner_namespace_unless_type_param() {
        let params = vec!["T".to_string()];
        let ty = parse_type_string("Pair[T, Address]", "app::entities", &params);
        assert_eq!(ty.args[0], TypeRef::new("", "T"));
        assert_eq!(ty.args[1], TypeRef::new("app::entities", "Address"));
    }

    #[test]
    fn test_unclosed_bracket_is_tolerated() {
        let ty = parse_type_string("List[int", "", &[]);
        assert_eq!(ty.to_string(), "List[int]");
    }
}
