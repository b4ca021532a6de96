//! Identifier case helpers used when deriving generated names.

/// Convert a `PascalCase` or `camelCase` identifier to `snake_case`.
///
/// Runs of capitals are kept together, so `HTTPServer` becomes `http_server`.
///
/// ## Examples
/// ```rust
/// use mapforge_core::naming::to_snake_case;
///
/// assert_eq!(to_snake_case("UserDto"), "user_dto");
/// assert_eq!(to_snake_case("UserDTOWithFactory"), "user_dto_with_factory");
/// assert_eq!(to_snake_case("already_snake"), "already_snake");
/// ```
pub fn to_snake_case(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Join a namespace and a type name into a qualified path (`a::b::Name`).
///
/// ## Examples
/// ```rust
/// use mapforge_core::naming::qualify;
///
/// assert_eq!(qualify("app::models", "UserDto"), "app::models::UserDto");
/// assert_eq!(qualify("", "UserDto"), "UserDto");
/// ```
pub fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}::{name}")
    }
}

/// Split a qualified path into `(namespace, name)`.
pub fn split_qualified(path: &str) -> (&str, &str) {
    match path.rfind("::") {
        Some(idx) => (&path[..idx], &path[idx + 2..]),
        None => ("", path),
    }
}
