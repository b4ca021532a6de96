//! Staging: turn an analyzed [`Map`] into a runtime [`MapPlan`].
//!
//! A factory becomes up to three lambdas over flat records:
//!
//! - **P** `x => new Params_<d> { <src> = x, <param> = <param>, <capture> = <capture> }`
//! - **V** `_params => new Vars_<d> { <P fields copied>, <var> = <init over _params> }` (only with variables)
//! - **F** `_params => new <Target> { <prop> = <init over _params> | _params.<src>.<prop> }`
//!
//! Parameter and capture names stay free in P; binding the plan to arguments replaces them by constants. Every
//! name an initializer reads is rewritten to a member of the previous stage record, so V and F are closed trees.
//!
//! Degenerate factories (no extra parameters, variables or residual statements) do not get their own plan. The
//! first one replaces the default projection; later ones are ignored with a warning.

use mapforge_core::lang::conventions::{PARAMS_RECORD_PREFIX, SOURCE_PARAMETER, STAGE_PARAMETER, VARS_RECORD_PREFIX};
use mapforge_runtime::{Expr, FactoryPlan, Lambda, MapPlan, ParameterPlan, RecordShape, ShapeField};

use crate::backend::lower::Lowerer;
use crate::diagnostics::{FactorySite, MapDiagnostic};
use crate::mapping::{Map, MapFactory};
use crate::model::TypeInfo;
use crate::resolve::Compilation;

/// Plan every surface of `map`. Factories that fail to lower are dropped and reported.
#[tracing::instrument(skip_all, fields(target = %map.target))]
pub fn plan_map(compilation: &Compilation, map: &Map) -> (MapPlan, Vec<MapDiagnostic>) {
    let generics: Vec<String> = map.target.args.iter().map(|a| a.name.clone()).collect();
    let mut diagnostics = Vec::new();
    let mut default_expression = default_lambda(map);
    let mut merged: Option<&str> = None;
    let mut factories = Vec::new();

    for factory in &map.factories {
        let site = FactorySite {
            target: &map.target.name,
            method: &factory.method.name,
            module: map.module,
        };
        let result = if factory.is_degenerate() {
            if let Some(first) = merged {
                tracing::warn!(
                    map = %map.target,
                    first = %first,
                    ignored = %factory.declaration,
                    "more than one degenerate factory; only the first is used"
                );
                continue;
            }
            degenerate_lambda(compilation, map, factory, site, &generics).map(|lambda| {
                default_expression = lambda;
                merged = Some(&factory.declaration);
            })
        } else {
            plan_factory(compilation, map, factory, site, &generics).map(|plan| factories.push(plan))
        };
        if let Err(found) = result {
            diagnostics.extend(found);
        }
    }

    let plan = MapPlan {
        source: map.source.to_string(),
        target: map.target.to_string(),
        default_expression,
        factories,
    };
    (plan, diagnostics)
}

/// `x => new T { p = x.p, ... }` over the name-matched properties.
pub fn default_lambda(map: &Map) -> Lambda {
    let bindings = map
        .properties
        .iter()
        .map(|p| (p.target.name.clone(), Expr::param(SOURCE_PARAMETER).member(p.source.name.clone())))
        .collect();
    Lambda::new(SOURCE_PARAMETER, Expr::member_init(map.target.qualified_name(), bindings))
}

/// Target construction in target property order: explicit initializers first choice, name-matched fallback second.
fn construction(
    compilation: &Compilation,
    map: &Map,
    explicit: Vec<(String, Expr)>,
    fallback: impl Fn(&str) -> Expr,
) -> Expr {
    let order: Vec<String> = match compilation.descriptor(&map.target) {
        Some(target) => target.properties().iter().map(|p| p.name.clone()).collect(),
        None => map.properties.iter().map(|p| p.target.name.clone()).collect(),
    };
    let mut bindings = Vec::new();
    for name in order {
        if let Some((_, init)) = explicit.iter().find(|(n, _)| *n == name) {
            bindings.push((name, init.clone()));
        } else if let Some(default) = map.properties.iter().find(|p| p.target.name == name) {
            bindings.push((name, fallback(&default.source.name)));
        }
    }
    Expr::member_init(map.target.qualified_name(), bindings)
}

fn degenerate_lambda(
    compilation: &Compilation,
    map: &Map,
    factory: &MapFactory,
    site: FactorySite<'_>,
    generics: &[String],
) -> Result<Lambda, Vec<MapDiagnostic>> {
    let mut lowerer = Lowerer::new(compilation, site, generics);
    lowerer.bind(factory.source_param.clone());
    let rename = |name: &str| (name == factory.source_param).then(|| Expr::param(SOURCE_PARAMETER));
    let explicit = factory
        .properties
        .iter()
        .map(|p| (p.target.name.clone(), lowerer.expr(&p.init).rewrite_parameters(&rename)))
        .collect();
    let diagnostics = lowerer.into_diagnostics();
    if !diagnostics.is_empty() {
        return Err(diagnostics);
    }
    let body = construction(compilation, map, explicit, |prop| Expr::param(SOURCE_PARAMETER).member(prop));
    Ok(Lambda::new(SOURCE_PARAMETER, body))
}

fn plan_factory(
    compilation: &Compilation,
    map: &Map,
    factory: &MapFactory,
    site: FactorySite<'_>,
    generics: &[String],
) -> Result<FactoryPlan, Vec<MapDiagnostic>> {
    let src = factory.source_param.as_str();
    let param_names: Vec<String> = factory.parameters.iter().map(|p| p.name.clone()).collect();
    let mut lowerer = Lowerer::new(compilation, site, generics);

    let parameters: Vec<ParameterPlan> = factory
        .parameters
        .iter()
        .enumerate()
        .map(|(i, p)| ParameterPlan {
            name: p.name.clone(),
            ty: p.ty.to_string(),
            default: p
                .default
                .as_ref()
                .and_then(|d| d.expr.as_ref())
                .map(|e| lowerer.scoped(&param_names[..i], |l| l.expr(e))),
        })
        .collect();

    let residuals = lowerer.scoped(&param_names, |l| l.block(&factory.residuals));

    let mut visible = vec![src.to_string()];
    visible.extend(param_names.iter().cloned());
    visible.extend(factory.residual_locals.iter().map(|l| l.name.clone()));
    let variables: Vec<(String, Expr)> = factory
        .variables
        .iter()
        .map(|v| (v.name.clone(), lowerer.scoped(&visible, |l| l.expr(&v.init))))
        .collect();
    visible.extend(factory.variables.iter().map(|v| v.name.clone()));
    let properties: Vec<(String, Expr)> = factory
        .properties
        .iter()
        .map(|p| (p.target.name.clone(), lowerer.scoped(&visible, |l| l.expr(&p.init))))
        .collect();

    let diagnostics = lowerer.into_diagnostics();
    if !diagnostics.is_empty() {
        return Err(diagnostics);
    }

    // Residual locals the stages read become Stage-P fields.
    let mut read: Vec<&str> = Vec::new();
    for (_, init) in variables.iter().chain(properties.iter()) {
        for name in init.parameters() {
            if !read.contains(&name) {
                read.push(name);
            }
        }
    }
    let mut captures: Vec<ShapeField> = Vec::new();
    for local in factory.residual_locals.iter().rev() {
        let shadowed = local.name == src || param_names.contains(&local.name);
        if read.contains(&local.name.as_str()) && !shadowed && !captures.iter().any(|c| c.name == local.name) {
            captures.push(ShapeField::new(local.name.clone(), local.ty.to_string()));
        }
    }
    captures.reverse();

    let source_ty = factory
        .method
        .parameters
        .first()
        .map_or_else(|| map.source.to_string(), |p| p.ty.to_string());
    let mut params_fields = vec![ShapeField::new(src, source_ty)];
    params_fields.extend(parameters.iter().map(|p| ShapeField::new(p.name.clone(), p.ty.clone())));
    params_fields.extend(captures.iter().cloned());
    let params_shape = RecordShape {
        type_name: format!("{PARAMS_RECORD_PREFIX}_{}", factory.digest),
        fields: params_fields,
    };

    let free: Vec<&str> = param_names
        .iter()
        .map(String::as_str)
        .chain(captures.iter().map(|c| c.name.as_str()))
        .collect();
    let lambda_param = unique_name(SOURCE_PARAMETER, &free);
    let params_stage = Lambda::new(
        lambda_param.clone(),
        Expr::member_init(
            params_shape.type_name.clone(),
            params_shape
                .fields
                .iter()
                .map(|f| {
                    let value = if f.name == src {
                        Expr::param(lambda_param.clone())
                    } else {
                        Expr::param(f.name.clone())
                    };
                    (f.name.clone(), value)
                })
                .collect(),
        ),
    );

    let field_access = |fields: &[ShapeField], init: &Expr| {
        init.rewrite_parameters(&|name: &str| {
            fields
                .iter()
                .any(|f| f.name == name)
                .then(|| Expr::param(STAGE_PARAMETER).member(name))
        })
    };

    let (vars_shape, vars_stage) = if factory.variables.is_empty() {
        (None, None)
    } else {
        let mut fields = params_shape.fields.clone();
        fields.extend(factory.variables.iter().map(|v| ShapeField::new(v.name.clone(), v.ty.to_string())));
        let shape = RecordShape {
            type_name: format!("{VARS_RECORD_PREFIX}_{}", factory.digest),
            fields,
        };
        let mut bindings: Vec<(String, Expr)> = params_shape
            .fields
            .iter()
            .map(|f| (f.name.clone(), Expr::param(STAGE_PARAMETER).member(f.name.clone())))
            .collect();
        bindings.extend(
            variables
                .iter()
                .map(|(name, init)| (name.clone(), field_access(&params_shape.fields, init))),
        );
        let stage = Lambda::new(STAGE_PARAMETER, Expr::member_init(shape.type_name.clone(), bindings));
        (Some(shape), Some(stage))
    };

    let last_fields = vars_shape.as_ref().map_or(&params_shape.fields, |s| &s.fields);
    let explicit = properties
        .iter()
        .map(|(name, init)| (name.clone(), field_access(last_fields, init)))
        .collect();
    let final_body = construction(compilation, map, explicit, |prop| {
        Expr::param(STAGE_PARAMETER).member(src).member(prop)
    });

    Ok(FactoryPlan {
        declaration: factory.declaration.clone(),
        digest: factory.digest.clone(),
        parameters,
        residuals,
        captures,
        params_shape,
        vars_shape,
        params_stage,
        vars_stage,
        final_stage: Lambda::new(STAGE_PARAMETER, final_body),
    })
}

/// `base`, or `base1`, `base2`, ... if taken.
fn unique_name(base: &str, taken: &[&str]) -> String {
    if !taken.contains(&base) {
        return base.to_string();
    }
    (1..)
        .map(|i| format!("{base}{i}"))
        .find(|candidate| !taken.contains(&candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::build_map;
    use crate::resolve::SourceModule;
    use mapforge_runtime::{Args, CompiledProperty, CompiledType, Mapper, Record, Value};
    use mapforge_syntax::parser::parse_source;

    fn user_type() -> CompiledType {
        let prop = |name: &str| CompiledProperty {
            name: name.to_string(),
            ty: "str".to_string(),
            readable: true,
            writable: true,
        };
        CompiledType {
            name: "User".to_string(),
            namespace: "app".to_string(),
            type_params: vec![],
            properties: vec![prop("name"), prop("username")],
            methods: vec![],
        }
    }

    fn plan(methods: &str) -> (MapPlan, Vec<MapDiagnostic>) {
        let source = format!("namespace app\n\nclass Dto:\n    username: str\n    name: str\n{methods}");
        let compilation = Compilation::new(
            vec![SourceModule {
                file: "dto.map".to_string(),
                program: parse_source(&source).unwrap(),
                source,
            }],
            vec![user_type()],
        );
        let user = compilation.descriptor_by_name("app::User").unwrap();
        let target = compilation.descriptor_by_name("app::Dto").and_then(|t| t.as_declared()).unwrap();
        let (map, diagnostics) = build_map(&compilation, user, target);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        plan_map(&compilation, &map)
    }

    fn foo() -> Value {
        Value::Record(Record::new("app::User").with("name", "Foo").with("username", "x_foo_x"))
    }

    #[test]
    fn test_default_projection() {
        let (plan, _) = plan("");
        assert_eq!(
            plan.default_expression.to_string(),
            "x => new app::Dto { username = x.username, name = x.name }"
        );
        assert!(plan.factories.is_empty());
    }

    #[test]
    fn test_degenerate_factory_replaces_default() {
        let (plan, diagnostics) = plan(
            "\n    def map(u: User) -> Dto:\n        return new Dto(name = u.name.upper())\n\n    def map(v: User) -> Dto:\n        return new Dto()\n",
        );
        assert!(diagnostics.is_empty());
        assert!(plan.factories.is_empty());
        assert_eq!(
            plan.default_expression.to_string(),
            "x => new app::Dto { username = x.username, name = x.name.upper() }"
        );
    }

    #[test]
    fn test_three_stages() {
        let (plan, _) = plan(
            "\n    def map(user: User, show_name: bool, uppercase_name: bool = false) -> Dto:\n        let name = user.name.upper() if uppercase_name else user.name\n        return new Dto(name = name if show_name else user.username)\n",
        );
        let factory = &plan.factories[0];
        let d = &factory.digest;
        assert_eq!(
            factory.params_stage.to_string(),
            format!("x => new Params_{d} {{ user = x, show_name = show_name, uppercase_name = uppercase_name }}")
        );
        assert_eq!(
            factory.vars_shape.as_ref().map(ToString::to_string),
            Some(format!(
                "Vars_{d} {{ user: app::User, show_name: bool, uppercase_name: bool, name: str }}"
            ))
        );
        assert_eq!(
            factory.vars_stage.as_ref().map(ToString::to_string),
            Some(format!(
                "_params => new Vars_{d} {{ user = _params.user, show_name = _params.show_name, uppercase_name = \
                 _params.uppercase_name, name = (_params.uppercase_name ? _params.user.name.upper() : _params.user.name) }}"
            ))
        );
        assert_eq!(
            factory.final_stage.to_string(),
            "_params => new app::Dto { username = _params.user.username, name = (_params.show_name ? _params.name : \
             _params.user.username) }"
        );

        let mapper = Mapper::new(plan.clone());
        let mapped = mapper.map_with(d, &foo(), &Args::new().arg(false)).unwrap();
        assert_eq!(mapped.as_record().and_then(|r| r.get("name")), Some(&Value::from("x_foo_x")));
        let mapped = mapper.map_with(d, &foo(), &Args::new().arg(true).arg(true)).unwrap();
        assert_eq!(mapped.as_record().and_then(|r| r.get("name")), Some(&Value::from("FOO")));
    }

    #[test]
    fn test_residual_locals_are_captured() {
        let (plan, _) = plan(
            "\n    def map(user: User, excited: bool) -> Dto:\n        let mark: str = \"\"\n        let unused = 1\n        if excited:\n            mark = \"!\"\n        return new Dto(name = user.name + mark)\n",
        );
        let factory = &plan.factories[0];
        assert_eq!(factory.captures, vec![ShapeField::new("mark", "str")]);
        assert!(factory.vars_stage.is_none());
        assert_eq!(factory.residuals.len(), 3);
        let mapper = Mapper::new(plan.clone());
        let mapped = mapper.map_with(&factory.digest, &foo(), &Args::new().arg(true)).unwrap();
        assert_eq!(mapped.as_record().and_then(|r| r.get("name")), Some(&Value::from("Foo!")));
    }

    #[test]
    fn test_lambda_parameter_avoids_argument_names() {
        let (plan, _) = plan("\n    def map(user: User, x: str) -> Dto:\n        return new Dto(name = x)\n");
        let factory = &plan.factories[0];
        assert_eq!(factory.params_stage.param, "x1");
        let mapper = Mapper::new(plan.clone());
        let mapped = mapper.map_with(&factory.digest, &foo(), &Args::new().arg("given")).unwrap();
        assert_eq!(mapped.as_record().and_then(|r| r.get("name")), Some(&Value::from("given")));
    }

    #[test]
    fn test_untranslatable_factory_is_dropped() {
        let (plan, diagnostics) = plan(
            "\n    def map(user: User, n: int) -> Dto:\n        return new Dto(name = format(user.name, n))\n\n    def map(user: User, s: str) -> Dto:\n        return new Dto(name = s)\n",
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), "SM0005");
        assert_eq!(plan.factories.len(), 1);
        assert_eq!(plan.factories[0].parameters[0].name, "s");
    }

    #[test]
    fn test_unique_name() {
        assert_eq!(unique_name("x", &[]), "x");
        assert_eq!(unique_name("x", &["x", "x1"]), "x2");
    }
}
