//! Guardrails for the registry tables.
//!
//! Every registry is indexed by `id as usize`, so table order must match enum declaration order. Spellings must be
//! unique across canonical forms and aliases, otherwise lookup becomes order-dependent.

use std::collections::HashMap;

use mapforge_core::lang::{builtins, diagnostics, keywords, operators, punctuation, types};

#[test]
fn keyword_table_is_indexed_by_id() {
    for (idx, info) in keywords::KEYWORDS.iter().enumerate() {
        assert_eq!(info.id as usize, idx, "keyword {:?} is out of order", info.id);
    }
}

#[test]
fn keywords_spellings_unique_and_resolvable() {
    let mut seen: HashMap<&'static str, keywords::KeywordId> = HashMap::new();

    for info in keywords::KEYWORDS {
        assert_eq!(
            keywords::from_str(info.canonical),
            Some(info.id),
            "keyword canonical spelling not resolvable: {}",
            info.canonical
        );
        assert_eq!(keywords::as_str(info.id), info.canonical);

        if let Some(prev) = seen.insert(info.canonical, info.id) {
            panic!("duplicate keyword spelling {:?}: {:?} and {:?}", info.canonical, prev, info.id);
        }
        for &alias in info.aliases {
            assert_eq!(keywords::from_str(alias), Some(info.id), "keyword alias not resolvable: {alias}");
            if let Some(prev) = seen.insert(alias, info.id) {
                panic!("duplicate keyword alias {:?}: {:?} and {:?}", alias, prev, info.id);
            }
        }
    }
}

#[test]
fn operator_table_is_indexed_by_id() {
    for (idx, info) in operators::OPERATORS.iter().enumerate() {
        assert_eq!(info.id as usize, idx, "operator {:?} is out of order", info.id);
        for &spelling in info.spellings {
            assert_eq!(operators::from_str(spelling), Some(info.id));
        }
    }
}

#[test]
fn word_operators_are_reserved_keywords() {
    for info in operators::OPERATORS.iter().filter(|o| o.is_keyword_spelling) {
        for &spelling in info.spellings {
            assert!(
                keywords::from_str(spelling).is_some(),
                "word operator {spelling:?} must also be a keyword"
            );
        }
    }
}

#[test]
fn punctuation_table_is_indexed_by_id() {
    let mut seen = HashMap::new();
    for (idx, info) in punctuation::PUNCTUATION.iter().enumerate() {
        assert_eq!(info.id as usize, idx, "punctuation {:?} is out of order", info.id);
        assert_eq!(punctuation::from_str(info.canonical), Some(info.id));
        assert!(seen.insert(info.canonical, info.id).is_none(), "duplicate {:?}", info.canonical);
    }
}

#[test]
fn builtin_methods_unique_and_resolvable() {
    let mut seen = HashMap::new();
    for (idx, info) in builtins::BUILTIN_METHODS.iter().enumerate() {
        assert_eq!(info.id as usize, idx, "builtin {:?} is out of order", info.id);
        assert_eq!(builtins::from_str(info.canonical), Some(info.id));
        assert!(seen.insert(info.canonical, info.id).is_none());
        for &alias in info.aliases {
            assert_eq!(builtins::from_str(alias), Some(info.id));
            assert!(seen.insert(alias, info.id).is_none(), "duplicate builtin alias {alias:?}");
        }
    }
}

#[test]
fn builtin_types_do_not_shadow_keywords() {
    for (idx, info) in types::BUILTIN_TYPES.iter().enumerate() {
        assert_eq!(info.id as usize, idx);
        assert_eq!(types::from_str(info.canonical), Some(info.id));
        assert!(keywords::from_str(info.canonical).is_none(), "{} is reserved", info.canonical);
    }
}

#[test]
fn diagnostic_codes_are_sequential() {
    for (idx, info) in diagnostics::DIAGNOSTICS.iter().enumerate() {
        assert_eq!(info.id as usize, idx);
        assert_eq!(info.code, format!("SM{:04}", idx + 1));
        assert_eq!(diagnostics::from_code(info.code), Some(info.id));
    }
}

#[test]
fn builtin_method_variant_names_match_the_enum() {
    for info in builtins::BUILTIN_METHODS {
        assert_eq!(info.id.variant_name(), format!("{:?}", info.id));
    }
}
