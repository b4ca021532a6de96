//! Tree-walking evaluator for [`Expr`] and [`Lambda`].

use mapforge_core::lang::builtins::{self, BuiltinMethodId};

use crate::error::EvalError;
use crate::expr::{BinaryOp, Expr, Lambda, UnaryOp};
use crate::value::{Record, Value};

/// Flat name → value bindings.
///
/// Factories have a single scope: every `let` in a body, including inside `if` branches, binds here.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: Vec<(String, Value)>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.bind(name, value);
        self
    }

    /// Bind `name`, shadowing any previous binding.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.bindings.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.bindings.push((name, value)),
        }
    }

    /// Overwrite an existing binding.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), EvalError> {
        match self.bindings.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => {
                slot.1 = value;
                Ok(())
            }
            None => Err(EvalError::Unbound(name.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

impl Lambda {
    /// Apply the lambda to one argument.
    pub fn apply(&self, arg: Value) -> Result<Value, EvalError> {
        let scope = Scope::new().with(self.param.clone(), arg);
        eval(&self.body, &scope)
    }
}

/// Evaluate `expr` against `scope`.
pub fn eval(expr: &Expr, scope: &Scope) -> Result<Value, EvalError> {
    match expr {
        Expr::Constant(v) => Ok(v.clone()),
        Expr::Parameter(name) => scope
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::Unbound(name.clone())),
        Expr::Member(base, member) => {
            let base = eval(base, scope)?;
            read_member(&base, member)
        }
        Expr::Call(recv, method, args) => {
            let recv = eval(recv, scope)?;
            let args = args.iter().map(|a| eval(a, scope)).collect::<Result<Vec<_>, _>>()?;
            call_builtin(*method, recv, &args)
        }
        Expr::Conditional(test, then, otherwise) => {
            if expect_bool(eval(test, scope)?, "conditional test")? {
                eval(then, scope)
            } else {
                eval(otherwise, scope)
            }
        }
        Expr::Binary(BinaryOp::And, lhs, rhs) => {
            if expect_bool(eval(lhs, scope)?, "'&&'")? {
                Ok(Value::Bool(expect_bool(eval(rhs, scope)?, "'&&'")?))
            } else {
                Ok(Value::Bool(false))
            }
        }
        Expr::Binary(BinaryOp::Or, lhs, rhs) => {
            if expect_bool(eval(lhs, scope)?, "'||'")? {
                Ok(Value::Bool(true))
            } else {
                Ok(Value::Bool(expect_bool(eval(rhs, scope)?, "'||'")?))
            }
        }
        Expr::Binary(op, lhs, rhs) => {
            let lhs = eval(lhs, scope)?;
            let rhs = eval(rhs, scope)?;
            binary(*op, lhs, rhs)
        }
        Expr::Unary(op, operand) => {
            let value = eval(operand, scope)?;
            match (op, value) {
                (UnaryOp::Not, v) => Ok(Value::Bool(!expect_bool(v, "'!'")?)),
                (UnaryOp::Neg, Value::Int(i)) => i
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| EvalError::Overflow("-".to_string())),
                (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
                (UnaryOp::Neg, v) => Err(mismatch("'-'", "number", &v)),
            }
        }
        Expr::MemberInit(ty, bindings) => {
            let mut record = Record::new(ty.clone());
            for (name, value) in bindings {
                record.set(name.clone(), eval(value, scope)?);
            }
            Ok(Value::Record(record))
        }
    }
}

fn read_member(base: &Value, member: &str) -> Result<Value, EvalError> {
    match base {
        Value::Record(record) => record.get(member).cloned().ok_or_else(|| EvalError::MissingMember {
            type_name: record.type_name.clone(),
            member: member.to_string(),
        }),
        other => Err(EvalError::NotARecord {
            member: member.to_string(),
            found: other.kind(),
        }),
    }
}

fn mismatch(context: &str, expected: &'static str, found: &Value) -> EvalError {
    EvalError::TypeMismatch {
        context: context.to_string(),
        expected,
        found: found.kind(),
    }
}

fn expect_bool(value: Value, context: &str) -> Result<bool, EvalError> {
    value.as_bool().ok_or_else(|| mismatch(context, "bool", &value))
}

fn expect_str<'v>(value: &'v Value, context: &str) -> Result<&'v str, EvalError> {
    value.as_str().ok_or_else(|| mismatch(context, "str", value))
}

fn call_builtin(method: BuiltinMethodId, recv: Value, args: &[Value]) -> Result<Value, EvalError> {
    let info = builtins::info_for(method);
    if args.len() != info.arity {
        return Err(EvalError::Arity {
            method: info.canonical,
            expected: info.arity,
            found: args.len(),
        });
    }
    let ctx = format!("{}()", info.canonical);

    match method {
        BuiltinMethodId::ToStr => Ok(Value::Str(recv.to_plain_string())),
        BuiltinMethodId::Abs => match recv {
            Value::Int(i) => i
                .checked_abs()
                .map(Value::Int)
                .ok_or_else(|| EvalError::Overflow(ctx)),
            Value::Float(x) => Ok(Value::Float(x.abs())),
            other => Err(mismatch(&ctx, "number", &other)),
        },
        BuiltinMethodId::Upper => Ok(Value::Str(expect_str(&recv, &ctx)?.to_uppercase())),
        BuiltinMethodId::Lower => Ok(Value::Str(expect_str(&recv, &ctx)?.to_lowercase())),
        BuiltinMethodId::Trim => Ok(Value::Str(expect_str(&recv, &ctx)?.trim().to_string())),
        BuiltinMethodId::Len => Ok(Value::Int(expect_str(&recv, &ctx)?.chars().count() as i64)),
        BuiltinMethodId::Contains => {
            Ok(Value::Bool(expect_str(&recv, &ctx)?.contains(expect_str(&args[0], &ctx)?)))
        }
        BuiltinMethodId::StartsWith => {
            Ok(Value::Bool(expect_str(&recv, &ctx)?.starts_with(expect_str(&args[0], &ctx)?)))
        }
        BuiltinMethodId::EndsWith => {
            Ok(Value::Bool(expect_str(&recv, &ctx)?.ends_with(expect_str(&args[0], &ctx)?)))
        }
        BuiltinMethodId::Replace => Ok(Value::Str(
            expect_str(&recv, &ctx)?.replace(expect_str(&args[0], &ctx)?, expect_str(&args[1], &ctx)?),
        )),
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    let sym = op.symbol();
    match op {
        BinaryOp::Eq => Ok(Value::Bool(values_equal(&lhs, &rhs))),
        BinaryOp::NotEq => Ok(Value::Bool(!values_equal(&lhs, &rhs))),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            let ordering = match (&lhs, &rhs) {
                (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
                _ => match (lhs.as_f64(), rhs.as_f64()) {
                    (Some(a), Some(b)) => a.partial_cmp(&b),
                    _ => return Err(mismatch(sym, "two numbers or two strings", &rhs)),
                },
            };
            let Some(ordering) = ordering else {
                return Ok(Value::Bool(false));
            };
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::LtEq => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }
        BinaryOp::Add => match (lhs, rhs) {
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
            (a, b) => arithmetic(op, a, b),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => arithmetic(op, lhs, rhs),
        BinaryOp::And | BinaryOp::Or => {
            let a = expect_bool(lhs, sym)?;
            let b = expect_bool(rhs, sym)?;
            Ok(Value::Bool(if op == BinaryOp::And { a && b } else { a || b }))
        }
    }
}

fn arithmetic(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    let sym = op.symbol();
    match (&lhs, &rhs) {
        (Value::Int(a), Value::Int(b)) => {
            let (a, b) = (*a, *b);
            if matches!(op, BinaryOp::Div | BinaryOp::Mod) && b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            let result = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div => a.checked_div(b),
                _ => a.checked_rem(b),
            };
            result.map(Value::Int).ok_or_else(|| EvalError::Overflow(sym.to_string()))
        }
        _ => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Float(match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => a % b,
            })),
            (None, _) => Err(mismatch(sym, "number", &lhs)),
            (_, None) => Err(mismatch(sym, "number", &rhs)),
        },
    }
}

/// Equality with int/float promotion.
fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => (*a as f64) == *b,
        _ => lhs == rhs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> Value {
        Value::Record(Record::new("User").with("name", "Foo").with("username", "x_foo_x"))
    }

    #[test]
    fn test_member_and_builtin() {
        let e = Expr::param("u").member("name").call(BuiltinMethodId::Upper, vec![]);
        let scope = Scope::new().with("u", user());
        assert_eq!(eval(&e, &scope), Ok(Value::from("FOO")));
    }

    #[test]
    fn test_conditional_requires_bool() {
        let e = Expr::conditional(Expr::constant(1), Expr::constant("a"), Expr::constant("b"));
        let err = eval(&e, &Scope::new()).unwrap_err();
        assert!(matches!(err, EvalError::TypeMismatch { expected: "bool", found: "int", .. }));
    }

    #[test]
    fn test_short_circuit_skips_unbound() {
        let e = Expr::binary(BinaryOp::Or, Expr::constant(true), Expr::param("missing"));
        assert_eq!(eval(&e, &Scope::new()), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_arithmetic_promotion_and_concat() {
        let scope = Scope::new();
        let sum = Expr::binary(BinaryOp::Add, Expr::constant(1), Expr::constant(0.5));
        assert_eq!(eval(&sum, &scope), Ok(Value::Float(1.5)));
        let concat = Expr::binary(BinaryOp::Add, Expr::constant("a"), Expr::constant("b"));
        assert_eq!(eval(&concat, &scope), Ok(Value::from("ab")));
        let div = Expr::binary(BinaryOp::Div, Expr::constant(1), Expr::constant(0));
        assert_eq!(eval(&div, &scope), Err(EvalError::DivisionByZero));
        let eq = Expr::binary(BinaryOp::Eq, Expr::constant(2), Expr::constant(2.0));
        assert_eq!(eval(&eq, &scope), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_missing_member() {
        let e = Expr::param("u").member("email");
        let err = eval(&e, &Scope::new().with("u", user())).unwrap_err();
        assert_eq!(err.to_string(), "'User' has no member 'email'");
    }

    #[test]
    fn test_builtin_arity_and_args() {
        let scope = Scope::new();
        let ok = Expr::constant("a-b").call(
            BuiltinMethodId::Replace,
            vec![Expr::constant("-"), Expr::constant("+")],
        );
        assert_eq!(eval(&ok, &scope), Ok(Value::from("a+b")));
        let bad = Expr::constant("a").call(BuiltinMethodId::Contains, vec![]);
        assert!(matches!(eval(&bad, &scope), Err(EvalError::Arity { expected: 1, found: 0, .. })));
        let len = Expr::constant("héllo").call(BuiltinMethodId::Len, vec![]);
        assert_eq!(eval(&len, &scope), Ok(Value::Int(5)));
    }

    #[test]
    fn test_lambda_apply_builds_record() {
        let lambda = Lambda::new(
            "x",
            Expr::member_init("Dto", vec![("username".to_string(), Expr::param("x").member("username"))]),
        );
        let out = lambda.apply(user()).unwrap();
        assert_eq!(out, Value::Record(Record::new("Dto").with("username", "x_foo_x")));
    }

    #[test]
    fn test_scope_assign_requires_binding() {
        let mut scope = Scope::new().with("a", Value::Int(1));
        scope.assign("a", Value::Int(2)).unwrap();
        assert_eq!(scope.get("a"), Some(&Value::Int(2)));
        assert_eq!(scope.assign("b", Value::Null), Err(EvalError::Unbound("b".to_string())));
    }
}
