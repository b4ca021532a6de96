//! Mapping plans and the call surfaces built from them.
//!
//! A [`MapPlan`] is what the compiler emits for one (source, target) pair: the default projection as a single
//! [`Lambda`] plus one [`FactoryPlan`] per valid non-degenerate factory. A factory plan carries three stage lambdas:
//!
//! - **Params**: `x => new Params_<digest> { <source> = x, <arg> = <arg>, ... }`. The argument names are free and
//!   are replaced by constants when the plan is bound to concrete arguments.
//! - **Vars** (optional): copies the Params fields and adds one field per source-dependent local.
//! - **Final**: builds the target from the previous record.
//!
//! ## Notes
//! - Eager calls apply the bound stage lambdas directly. Projections append the very same lambdas to a [`Query`],
//!   so the two surfaces agree by construction.
//! - Residual statements run once per bind, before Stage P, with the arguments in scope. Only their captured locals
//!   reach the trees, as constants.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{ConvertError, MapError};
use crate::eval::{Scope, eval};
use crate::expr::{Expr, Lambda};
use crate::query::Query;
use crate::reflect::{FieldValue, Reflect};
use crate::stmt::{Stmt, exec_all};
use crate::value::{Record, Value};

// ============================================================================
// Plans
// ============================================================================

/// Field of an intermediate stage record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeField {
    pub name: String,
    pub ty: String,
}

impl ShapeField {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// Flat record type produced by a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordShape {
    pub type_name: String,
    pub fields: Vec<ShapeField>,
}

impl fmt::Display for RecordShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.type_name)?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, " {}: {}", field.name, field.ty)?;
        }
        if !self.fields.is_empty() {
            f.write_str(" ")?;
        }
        f.write_str("}")
    }
}

/// A factory parameter after the source parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterPlan {
    pub name: String,
    pub ty: String,
    /// Default value expression; may read earlier parameters.
    pub default: Option<Expr>,
}

/// Staged plan of one custom factory.
#[derive(Debug, Clone, PartialEq)]
pub struct FactoryPlan {
    /// Declaration text, e.g. `map(User user, bool show_name)`.
    pub declaration: String,
    pub digest: String,
    pub parameters: Vec<ParameterPlan>,
    pub residuals: Vec<Stmt>,
    /// Residual locals that the stages read.
    pub captures: Vec<ShapeField>,
    pub params_shape: RecordShape,
    pub vars_shape: Option<RecordShape>,
    pub params_stage: Lambda,
    pub vars_stage: Option<Lambda>,
    pub final_stage: Lambda,
}

impl FactoryPlan {
    /// Resolve `args`, replay residual statements and return the stage lambdas with every argument and capture
    /// replaced by a constant.
    pub fn bind(&self, args: &Args) -> Result<Vec<Lambda>, MapError> {
        if args.len() > self.parameters.len() {
            return Err(MapError::TooManyArguments {
                declaration: self.declaration.clone(),
                expected: self.parameters.len(),
                found: args.len(),
            });
        }

        let mut scope = Scope::new();
        for (i, param) in self.parameters.iter().enumerate() {
            let value = match (args.get(i), &param.default) {
                (Some(v), _) => v.clone(),
                (None, Some(default)) => eval(default, &scope)?,
                (None, None) => {
                    return Err(MapError::MissingArgument {
                        name: param.name.clone(),
                        declaration: self.declaration.clone(),
                    });
                }
            };
            scope.bind(param.name.clone(), value.coerce_to(&param.ty));
        }
        exec_all(&self.residuals, &mut scope)?;

        let own = self.params_stage.param.as_str();
        let bound = |name: &str| -> Option<Expr> {
            if name == own {
                return None;
            }
            let known = self.parameters.iter().any(|p| p.name == name) || self.captures.iter().any(|c| c.name == name);
            if known {
                scope.get(name).cloned().map(Expr::Constant)
            } else {
                None
            }
        };
        let params = Lambda::new(self.params_stage.param.clone(), self.params_stage.body.rewrite_parameters(&bound));

        let mut stages = vec![params];
        stages.extend(self.vars_stage.iter().cloned());
        stages.push(self.final_stage.clone());
        Ok(stages)
    }
}

/// Everything a mapper needs for one (source, target) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPlan {
    pub source: String,
    pub target: String,
    /// Name-matched projection, possibly extended by a degenerate factory's initializers.
    pub default_expression: Lambda,
    pub factories: Vec<FactoryPlan>,
}

impl MapPlan {
    pub fn factory(&self, digest: &str) -> Result<&FactoryPlan, MapError> {
        self.factories
            .iter()
            .find(|f| f.digest == digest)
            .ok_or_else(|| MapError::UnknownFactory(digest.to_string()))
    }
}

// ============================================================================
// Arguments
// ============================================================================

/// Positional factory arguments. An omitted position takes the parameter's declared default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(Vec<Option<Value>>);

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.0.push(Some(value.into()));
        self
    }

    /// Pass `Some(value)`, or leave the position to its default.
    pub fn optional<T: Into<Value>>(mut self, value: Option<T>) -> Self {
        self.0.push(value.map(Into::into));
        self
    }

    pub fn omit(mut self) -> Self {
        self.0.push(None);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Explicit value at `index`, if one was passed.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index).and_then(Option::as_ref)
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self(values.into_iter().map(Some).collect())
    }
}

impl<const N: usize> From<[Value; N]> for Args {
    fn from(values: [Value; N]) -> Self {
        Self(values.into_iter().map(Some).collect())
    }
}

// ============================================================================
// Surfaces
// ============================================================================

/// First-class mapping function.
pub type MapFn = Arc<dyn Fn(&Value) -> Result<Value, MapError> + Send + Sync>;

fn apply_stages(stages: &[Lambda], source: &Value) -> Result<Value, MapError> {
    let mut value = source.clone();
    for stage in stages {
        value = stage.apply(value)?;
    }
    Ok(value)
}

/// Convert a mapped record into `T`. Fields the mapping did not produce keep `T::default()` values.
pub fn into_target<T: Reflect + Default>(value: Value) -> Result<T, MapError> {
    let produced = match value {
        Value::Record(record) => record,
        other => {
            return Err(ConvertError::Mismatch {
                expected: T::type_name(),
                found: other.kind(),
            }
            .into());
        }
    };
    let mut record: Record = T::default().to_record();
    for (name, value) in produced.fields {
        record.set(name, value);
    }
    Ok(T::from_record(record)?)
}

fn identity(value: Value) -> Result<Value, MapError> {
    Ok(value)
}

/// The four call surfaces over a [`MapPlan`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Mapper {
    plan: Arc<MapPlan>,
}

impl Mapper {
    pub fn new(plan: MapPlan) -> Self {
        tracing::debug!(
            source = %plan.source,
            target = %plan.target,
            factories = plan.factories.len(),
            "mapper created"
        );
        Self { plan: Arc::new(plan) }
    }

    pub fn plan(&self) -> &MapPlan {
        &self.plan
    }

    /// The default projection tree.
    pub fn expression(&self) -> &Lambda {
        &self.plan.default_expression
    }

    // ---- eager -------------------------------------------------------------

    pub fn map(&self, source: &Value) -> Result<Value, MapError> {
        Ok(self.plan.default_expression.apply(source.clone())?)
    }

    pub fn map_with(&self, digest: &str, source: &Value, args: &Args) -> Result<Value, MapError> {
        let stages = self.plan.factory(digest)?.bind(args)?;
        apply_stages(&stages, source)
    }

    pub fn map_typed<S: FieldValue, T: Reflect + Default>(&self, source: &S) -> Result<T, MapError> {
        into_target(self.map(&source.to_value())?)
    }

    pub fn map_typed_with<S: FieldValue, T: Reflect + Default>(
        &self,
        digest: &str,
        source: &S,
        args: &Args,
    ) -> Result<T, MapError> {
        into_target(self.map_with(digest, &source.to_value(), args)?)
    }

    // ---- callable ----------------------------------------------------------

    pub fn callable(&self) -> MapFn {
        let plan = Arc::clone(&self.plan);
        Arc::new(move |source: &Value| -> Result<Value, MapError> {
            Ok(plan.default_expression.apply(source.clone())?)
        })
    }

    /// Bind `args` once and return the factory as a function. Argument errors surface here, not per call.
    pub fn callable_with(&self, digest: &str, args: &Args) -> Result<MapFn, MapError> {
        let stages = self.plan.factory(digest)?.bind(args)?;
        Ok(Arc::new(move |source: &Value| apply_stages(&stages, source)))
    }

    // ---- translatable projection ------------------------------------------

    pub fn project(&self, query: Query) -> Query {
        query.select(self.plan.default_expression.clone())
    }

    pub fn project_with(&self, digest: &str, query: Query, args: &Args) -> Result<Query, MapError> {
        let stages = self.plan.factory(digest)?.bind(args)?;
        Ok(stages.into_iter().fold(query, Query::select))
    }

    // ---- in-memory sequences ----------------------------------------------

    pub fn map_iter<I>(&self, source: I) -> MapIter<I::IntoIter>
    where
        I: IntoIterator,
        I::Item: FieldValue,
    {
        MapIter::new(source.into_iter(), self.callable(), identity)
    }

    pub fn map_iter_with<I>(&self, digest: &str, source: I, args: &Args) -> Result<MapIter<I::IntoIter>, MapError>
    where
        I: IntoIterator,
        I::Item: FieldValue,
    {
        Ok(MapIter::new(source.into_iter(), self.callable_with(digest, args)?, identity))
    }

    pub fn map_iter_typed<I, T>(&self, source: I) -> MapIter<I::IntoIter, T>
    where
        I: IntoIterator,
        I::Item: FieldValue,
        T: Reflect + Default,
    {
        MapIter::new(source.into_iter(), self.callable(), into_target::<T>)
    }

    pub fn map_iter_typed_with<I, T>(
        &self,
        digest: &str,
        source: I,
        args: &Args,
    ) -> Result<MapIter<I::IntoIter, T>, MapError>
    where
        I: IntoIterator,
        I::Item: FieldValue,
        T: Reflect + Default,
    {
        Ok(MapIter::new(
            source.into_iter(),
            self.callable_with(digest, args)?,
            into_target::<T>,
        ))
    }
}

/// Lazy element-wise application of a [`MapFn`].
///
/// Finite iff the input is finite; cloning restarts from the input's current position when the input is `Clone`.
pub struct MapIter<I, T = Value> {
    inner: I,
    map: MapFn,
    convert: fn(Value) -> Result<T, MapError>,
    _target: PhantomData<fn() -> T>,
}

impl<I, T> MapIter<I, T> {
    fn new(inner: I, map: MapFn, convert: fn(Value) -> Result<T, MapError>) -> Self {
        Self {
            inner,
            map,
            convert,
            _target: PhantomData,
        }
    }
}

impl<I: Clone, T> Clone for MapIter<I, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            map: Arc::clone(&self.map),
            convert: self.convert,
            _target: PhantomData,
        }
    }
}

impl<I: fmt::Debug, T> fmt::Debug for MapIter<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapIter").field("inner", &self.inner).finish_non_exhaustive()
    }
}

impl<I, T> Iterator for MapIter<I, T>
where
    I: Iterator,
    I::Item: FieldValue,
{
    type Item = Result<T, MapError>;

    fn next(&mut self) -> Option<Self::Item> {
        let source = self.inner.next()?;
        Some((self.map)(&source.to_value()).and_then(self.convert))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::BinaryOp;
    use mapforge_core::lang::builtins::BuiltinMethodId;

    fn user(name: &str, username: &str) -> Value {
        Value::Record(Record::new("User").with("name", name).with("username", username))
    }

    fn default_lambda() -> Lambda {
        Lambda::new(
            "x",
            Expr::member_init(
                "UserDto",
                vec![
                    ("username".to_string(), Expr::param("x").member("username")),
                    ("name".to_string(), Expr::param("x").member("name")),
                ],
            ),
        )
    }

    /// `map(User user, bool show_name, bool uppercase_name = false)` with one source-dependent local `name`.
    fn show_name_factory() -> FactoryPlan {
        let p = || Expr::param("_params");
        let params_fields = vec![
            ShapeField::new("user", "User"),
            ShapeField::new("show_name", "bool"),
            ShapeField::new("uppercase_name", "bool"),
        ];
        let mut vars_fields = params_fields.clone();
        vars_fields.push(ShapeField::new("name", "str"));
        FactoryPlan {
            declaration: "map(User user, bool show_name, bool uppercase_name = false)".to_string(),
            digest: "abc123".to_string(),
            parameters: vec![
                ParameterPlan {
                    name: "show_name".to_string(),
                    ty: "bool".to_string(),
                    default: None,
                },
                ParameterPlan {
                    name: "uppercase_name".to_string(),
                    ty: "bool".to_string(),
                    default: Some(Expr::constant(false)),
                },
            ],
            residuals: vec![],
            captures: vec![],
            params_shape: RecordShape {
                type_name: "Params_abc123".to_string(),
                fields: params_fields,
            },
            vars_shape: Some(RecordShape {
                type_name: "Vars_abc123".to_string(),
                fields: vars_fields,
            }),
            params_stage: Lambda::new(
                "x",
                Expr::member_init(
                    "Params_abc123",
                    vec![
                        ("user".to_string(), Expr::param("x")),
                        ("show_name".to_string(), Expr::param("show_name")),
                        ("uppercase_name".to_string(), Expr::param("uppercase_name")),
                    ],
                ),
            ),
            vars_stage: Some(Lambda::new(
                "_params",
                Expr::member_init(
                    "Vars_abc123",
                    vec![
                        ("user".to_string(), p().member("user")),
                        ("show_name".to_string(), p().member("show_name")),
                        ("uppercase_name".to_string(), p().member("uppercase_name")),
                        (
                            "name".to_string(),
                            Expr::conditional(
                                p().member("uppercase_name"),
                                p().member("user").member("name").call(BuiltinMethodId::Upper, vec![]),
                                p().member("user").member("name"),
                            ),
                        ),
                    ],
                ),
            )),
            final_stage: Lambda::new(
                "_params",
                Expr::member_init(
                    "UserDto",
                    vec![
                        ("username".to_string(), p().member("user").member("username")),
                        (
                            "name".to_string(),
                            Expr::conditional(
                                p().member("show_name"),
                                p().member("name"),
                                p().member("user").member("username"),
                            ),
                        ),
                    ],
                ),
            ),
        }
    }

    fn mapper() -> Mapper {
        Mapper::new(MapPlan {
            source: "User".to_string(),
            target: "UserDto".to_string(),
            default_expression: default_lambda(),
            factories: vec![show_name_factory()],
        })
    }

    #[test]
    fn test_default_surfaces_agree() {
        let m = mapper();
        let sources = vec![user("Foo", "x_foo_x"), user("Bar", "bar21")];
        let eager: Vec<_> = sources.iter().map(|s| m.map(s).unwrap()).collect();
        let callable = m.callable();
        let via_fn: Vec<_> = sources.iter().map(|s| callable(s).unwrap()).collect();
        let projected = m.project(Query::in_memory(sources.clone())).to_list().unwrap();
        let iterated: Vec<_> = m.map_iter(sources).collect::<Result<_, _>>().unwrap();
        assert_eq!(eager, via_fn);
        assert_eq!(eager, projected);
        assert_eq!(eager, iterated);
        assert_eq!(eager[1].to_string(), r#"UserDto { username: "bar21", name: "Bar" }"#);
    }

    #[test]
    fn test_factory_hides_name() {
        let m = mapper();
        let out = m.map_with("abc123", &user("Foo", "x_foo_x"), &Args::new().arg(false)).unwrap();
        assert_eq!(out.as_record().and_then(|r| r.get("name")), Some(&Value::from("x_foo_x")));
    }

    #[test]
    fn test_factory_uppercases_name() {
        let m = mapper();
        let out = m
            .map_with("abc123", &user("Foo", "x_foo_x"), &Args::new().arg(true).arg(true))
            .unwrap();
        assert_eq!(out.as_record().and_then(|r| r.get("name")), Some(&Value::from("FOO")));
    }

    #[test]
    fn test_omitted_optional_matches_explicit_default() {
        let m = mapper();
        let source = user("Foo", "x_foo_x");
        let omitted = m.map_with("abc123", &source, &Args::new().arg(true)).unwrap();
        let explicit = m.map_with("abc123", &source, &Args::new().arg(true).arg(false)).unwrap();
        let placeholder = m.map_with("abc123", &source, &Args::new().arg(true).omit()).unwrap();
        assert_eq!(omitted, explicit);
        assert_eq!(omitted, placeholder);
    }

    #[test]
    fn test_projection_is_bound_trees() {
        let m = mapper();
        let query = m
            .project_with("abc123", Query::in_memory([user("Foo", "x_foo_x")]), &Args::new().arg(false))
            .unwrap();
        assert_eq!(query.stages().len(), 3);
        insta::assert_snapshot!(
            query.stages()[0].to_string(),
            @"x => new Params_abc123 { user = x, show_name = false, uppercase_name = false }"
        );
        let eager = m.map_with("abc123", &user("Foo", "x_foo_x"), &Args::new().arg(false)).unwrap();
        assert_eq!(query.to_list().unwrap(), vec![eager]);
    }

    #[test]
    fn test_argument_errors() {
        let m = mapper();
        let source = user("Foo", "x_foo_x");
        assert!(matches!(
            m.map_with("abc123", &source, &Args::new()),
            Err(MapError::MissingArgument { ref name, .. }) if name == "show_name"
        ));
        assert!(matches!(
            m.map_with("abc123", &source, &Args::from([Value::Bool(true), Value::Bool(true), Value::Int(1)])),
            Err(MapError::TooManyArguments { expected: 2, found: 3, .. })
        ));
        assert!(matches!(
            m.map_with("ffffff", &source, &Args::new()),
            Err(MapError::UnknownFactory(_))
        ));
        // Callables validate arguments up front.
        assert!(m.callable_with("abc123", &Args::new()).is_err());
    }

    #[test]
    fn test_residual_captures_become_constants() {
        let mut plan = show_name_factory();
        plan.residuals = vec![Stmt::Let {
            name: "suffix".to_string(),
            ty: Some("str".to_string()),
            value: Some(Expr::conditional(
                Expr::param("show_name"),
                Expr::constant("!"),
                Expr::constant("?"),
            )),
        }];
        plan.captures = vec![ShapeField::new("suffix", "str")];
        plan.params_shape.fields.push(ShapeField::new("suffix", "str"));
        if let Expr::MemberInit(_, bindings) = &mut plan.params_stage.body {
            bindings.push(("suffix".to_string(), Expr::param("suffix")));
        }
        plan.vars_stage = None;
        plan.vars_shape = None;
        plan.final_stage = Lambda::new(
            "_params",
            Expr::member_init(
                "UserDto",
                vec![(
                    "name".to_string(),
                    Expr::binary(
                        BinaryOp::Add,
                        Expr::param("_params").member("user").member("name"),
                        Expr::param("_params").member("suffix"),
                    ),
                )],
            ),
        );
        let stages = plan.bind(&Args::new().arg(true)).unwrap();
        assert_eq!(stages.len(), 2);
        assert!(stages[0].to_string().contains(r#"suffix = "!""#));
        let out = apply_stages(&stages, &user("Foo", "x_foo_x")).unwrap();
        assert_eq!(out.to_string(), r#"UserDto { name: "Foo!" }"#);
    }

    #[test]
    fn test_iter_is_lazy_and_restartable() {
        let m = mapper();
        let sources = vec![user("Foo", "x_foo_x"), user("Bar", "bar21")];
        let iter = m.map_iter_with("abc123", sources.iter().cloned(), &Args::new().arg(true)).unwrap();
        let again = iter.clone();
        assert_eq!(iter.size_hint(), (2, Some(2)));
        let first: Vec<_> = iter.collect::<Result<_, _>>().unwrap();
        let second: Vec<_> = again.collect::<Result<_, _>>().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_record_shape_display() {
        let plan = show_name_factory();
        assert_eq!(
            plan.params_shape.to_string(),
            "Params_abc123 { user: User, show_name: bool, uppercase_name: bool }"
        );
    }
}
