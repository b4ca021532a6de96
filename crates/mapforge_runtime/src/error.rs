//! Runtime error types.

/// Failure while evaluating an expression tree or replaying residual statements.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("name '{0}' is not bound")]
    Unbound(String),
    #[error("'{type_name}' has no member '{member}'")]
    MissingMember { type_name: String, member: String },
    #[error("cannot read member '{member}' of a {found} value")]
    NotARecord { member: String, found: &'static str },
    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("{method}() takes {expected} argument(s), found {found}")]
    Arity {
        method: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow in '{0}'")]
    Overflow(String),
}

/// Failure of a mapper call surface.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error("no factory with digest '{0}'")]
    UnknownFactory(String),
    #[error("missing required argument '{name}' for {declaration}")]
    MissingArgument { name: String, declaration: String },
    #[error("{declaration} takes at most {expected} argument(s), found {found}")]
    TooManyArguments {
        declaration: String,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// Failure converting between a [`crate::Value`] and a Rust value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvertError {
    #[error("expected {expected}, found {found}")]
    Mismatch { expected: String, found: &'static str },
    #[error("record '{type_name}' is missing field '{field}'")]
    MissingField { type_name: String, field: String },
}
