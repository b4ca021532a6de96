//! Define the reserved keyword vocabulary of the mapping language.
//!
//! This module is the single source of truth for reserved words: a stable identifier ([`KeywordId`]) plus a const
//! metadata table ([`KEYWORDS`]) that records canonical spellings, aliases, categories and usage hints.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive**, except where explicit aliases are defined.
//! - [`KEYWORDS`] is ordered exactly like [`KeywordId`], so [`info_for`] is a plain index. The guardrail tests in
//!   `tests/lang_registry_guardrails.rs` keep the two in sync.
//! - Some reserved words are also word operators (`and`, `or`, `not`). For precedence use
//!   [`crate::lang::operators`].
//!
//! ## Examples
//! ```rust
//! use mapforge_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("def"), Some(KeywordId::Def));
//! assert_eq!(keywords::from_str("fn"), Some(KeywordId::Def)); // alias
//! assert_eq!(keywords::as_str(KeywordId::Def), "def");
//! ```

use super::registry::{Since, Stability};

/// Stable identifier for every reserved keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordId {
    // Control flow / statements
    If,
    Elif,
    Else,
    While,
    Return,
    Pass,

    // Declarations
    Namespace,
    Import,
    As,
    Class,
    Def,
    Let,
    New,

    // Field modifiers
    Readonly,
    Writeonly,

    // Literals
    True,
    False,
    None,

    // Word operators
    And,
    Or,
    Not,
}

/// High-level grouping for documentation and tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordCategory {
    ControlFlow,
    Definition,
    Import,
    Modifier,
    Literal,
    Operator,
}

/// Usage context hints (not enforced here; the parser owns context).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordUsage {
    Statement,
    Expression,
    Declaration,
    Modifier,
    Operator,
}

/// Metadata for a keyword.
///
/// ## Notes
/// - `canonical` is the preferred spelling for docs and emission.
/// - `aliases` are additional spellings accepted by the lexer.
#[derive(Debug, Clone, Copy)]
pub struct KeywordInfo {
    pub id: KeywordId,
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
    pub category: KeywordCategory,
    pub usage: &'static [KeywordUsage],
    pub since: Since,
    pub stability: Stability,
}

/// Registry of all keywords, in [`KeywordId`] declaration order.
pub const KEYWORDS: &[KeywordInfo] = &[
    // Control flow / statements
    info(
        KeywordId::If,
        "if",
        &[],
        KeywordCategory::ControlFlow,
        &[KeywordUsage::Statement, KeywordUsage::Expression],
    ),
    info(KeywordId::Elif, "elif", &[], KeywordCategory::ControlFlow, &[KeywordUsage::Statement]),
    info(
        KeywordId::Else,
        "else",
        &[],
        KeywordCategory::ControlFlow,
        &[KeywordUsage::Statement, KeywordUsage::Expression],
    ),
    info(KeywordId::While, "while", &[], KeywordCategory::ControlFlow, &[KeywordUsage::Statement]),
    info(KeywordId::Return, "return", &[], KeywordCategory::ControlFlow, &[KeywordUsage::Statement]),
    info(KeywordId::Pass, "pass", &[], KeywordCategory::ControlFlow, &[KeywordUsage::Statement]),
    // Declarations
    info(
        KeywordId::Namespace,
        "namespace",
        &[],
        KeywordCategory::Import,
        &[KeywordUsage::Declaration],
    ),
    info(KeywordId::Import, "import", &[], KeywordCategory::Import, &[KeywordUsage::Declaration]),
    info(KeywordId::As, "as", &[], KeywordCategory::Import, &[KeywordUsage::Declaration]),
    info(KeywordId::Class, "class", &[], KeywordCategory::Definition, &[KeywordUsage::Declaration]),
    info(KeywordId::Def, "def", &["fn"], KeywordCategory::Definition, &[KeywordUsage::Declaration]),
    info(KeywordId::Let, "let", &["var"], KeywordCategory::Definition, &[KeywordUsage::Statement]),
    info(KeywordId::New, "new", &[], KeywordCategory::Definition, &[KeywordUsage::Expression]),
    // Field modifiers
    info(
        KeywordId::Readonly,
        "readonly",
        &[],
        KeywordCategory::Modifier,
        &[KeywordUsage::Modifier],
    ),
    info(
        KeywordId::Writeonly,
        "writeonly",
        &[],
        KeywordCategory::Modifier,
        &[KeywordUsage::Modifier],
    ),
    // Literals
    info(KeywordId::True, "true", &["True"], KeywordCategory::Literal, &[KeywordUsage::Expression]),
    info(KeywordId::False, "false", &["False"], KeywordCategory::Literal, &[KeywordUsage::Expression]),
    info(KeywordId::None, "none", &["None"], KeywordCategory::Literal, &[KeywordUsage::Expression]),
    // Word operators
    info(KeywordId::And, "and", &[], KeywordCategory::Operator, &[KeywordUsage::Operator]),
    info(KeywordId::Or, "or", &[], KeywordCategory::Operator, &[KeywordUsage::Operator]),
    info(KeywordId::Not, "not", &[], KeywordCategory::Operator, &[KeywordUsage::Operator]),
];

/// Canonical spelling.
pub fn as_str(id: KeywordId) -> &'static str {
    info_for(id).canonical
}

/// Accepted alias spellings.
pub fn aliases(id: KeywordId) -> &'static [&'static str] {
    info_for(id).aliases
}

/// Category.
pub fn category(id: KeywordId) -> KeywordCategory {
    info_for(id).category
}

/// Usage hints.
pub fn usage(id: KeywordId) -> &'static [KeywordUsage] {
    info_for(id).usage
}

/// Full metadata.
pub fn info_for(id: KeywordId) -> &'static KeywordInfo {
    &KEYWORDS[id as usize]
}

/// Lookup by spelling (canonical or alias).
///
/// ## Returns
/// - `Some(KeywordId)` if the spelling is reserved, `None` otherwise.
pub fn from_str(s: &str) -> Option<KeywordId> {
    if let Some(k) = KEYWORDS.iter().find(|k| k.canonical == s) {
        return Some(k.id);
    }
    KEYWORDS
        .iter()
        .find(|k| {
            let aliases: &[&str] = k.aliases;
            aliases.contains(&s)
        })
        .map(|k| k.id)
}

// --- helpers -----------------------------------------------------------------

const fn info(
    id: KeywordId,
    canonical: &'static str,
    aliases: &'static [&'static str],
    category: KeywordCategory,
    usage: &'static [KeywordUsage],
) -> KeywordInfo {
    KeywordInfo {
        id,
        canonical,
        aliases,
        category,
        usage,
        since: Since(0, 1),
        stability: Stability::Stable,
    }
}
