//! Emission errors.
//!
//! Emission fails on names and constants generated Rust cannot spell, on unusable emit options, or when the
//! assembled tokens do not parse (a compiler bug). Every message names the construct that failed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmitError {
    /// The assembled tokens are not a Rust file.
    #[error("generated code does not parse: {0}")]
    SynParse(#[from] syn::Error),

    #[error("{what} '{name}' cannot be spelled as a Rust identifier")]
    Identifier { what: String, name: String },

    #[error("float constant {value} in {place} has no Rust literal")]
    NonFiniteFloat { value: f64, place: String },

    #[error("invalid {option} '{value}': expected a Rust path such as `crate::domain`")]
    InvalidOption { option: &'static str, value: String },
}

impl EmitError {
    pub fn identifier(what: impl Into<String>, name: impl Into<String>) -> Self {
        EmitError::Identifier {
            what: what.into(),
            name: name.into(),
        }
    }

    /// Name the plan a constant belongs to.
    pub(crate) fn in_place(self, place: &str) -> Self {
        match self {
            EmitError::NonFiniteFloat { value, .. } => EmitError::NonFiniteFloat {
                value,
                place: place.to_string(),
            },
            other => other,
        }
    }
}
