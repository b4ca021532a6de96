//! Shareable metadata for `mapforge_core::lang` registries.
//!
//! Every vocabulary in [`crate::lang`] is a const table of small `Copy` records. This submodule holds the
//! dependency-free metadata types those tables reuse.
//!
//! ## Notes
//! - Metadata is meant for tooling, docs and diagnostics; enforcement of syntax rules lives in the lexer/parser.

/// Version of the mapping language an item has been available since, as `(major, minor)`.
///
/// ## Examples
/// ```rust
/// use mapforge_core::lang::registry::Since;
///
/// let since = Since(0, 1);
/// assert_eq!(since.to_string(), "0.1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Since(pub u8, pub u8);

impl std::fmt::Display for Since {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.0, self.1)
    }
}

/// Lifecycle status of a vocabulary item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stability {
    Stable,
    Draft,
    Deprecated,
}

/// A small example snippet for documentation.
#[derive(Debug, Clone, Copy)]
pub struct Example {
    pub code: &'static str,
    pub note: Option<&'static str>,
}

/// Shared metadata shape for registry-first vocabulary items.
///
/// Registries that need extra per-item data (operator precedence, builtin arity) wrap their own info type instead.
#[derive(Debug, Clone, Copy)]
pub struct LangItemInfo<Id> {
    pub id: Id,
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub since: Since,
    pub stability: Stability,
    pub examples: &'static [Example],
}

/// Find the entry for `spelling` in a [`LangItemInfo`] table, checking canonical spellings before aliases.
pub fn lookup<Id: Copy>(table: &[LangItemInfo<Id>], spelling: &str) -> Option<Id> {
    if let Some(item) = table.iter().find(|i| i.canonical == spelling) {
        return Some(item.id);
    }
    table
        .iter()
        .find(|i| {
            let aliases: &[&str] = i.aliases;
            aliases.contains(&spelling)
        })
        .map(|i| i.id)
}
