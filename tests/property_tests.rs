//! Property-based tests for the mapping compiler
//!
//! These tests use proptest to check the staging laws over generated users, arguments and identifier choices.

use mapforge::{CompileOutput, SourceInput, compile};
use mapforge_runtime::{Args, FieldValue, Mapper, Query, Reflect, Value};
use proptest::prelude::*;

#[derive(Debug, Clone, PartialEq, Default, mapforge_runtime::Reflect)]
#[reflect(namespace = "app::entities")]
struct User {
    name: String,
    username: String,
}

fn compile_dto(methods: &str) -> CompileOutput {
    let source = format!(
        "namespace app\n\nimport app::entities::User\n\n@map_from(User)\nclass Dto:\n    name: str\n    username: str\n{methods}"
    );
    compile(vec![SourceInput::new("dto.map", source)], vec![User::compiled_type()]).unwrap()
}

fn dto_mapper(methods: &str) -> Mapper {
    let output = compile_dto(methods);
    assert!(!output.has_errors(), "{:?}", output.diagnostics);
    Mapper::new(output.plan("app::entities::User", "app::Dto").unwrap().clone())
}

const SHOW_NAME: &str = r#"
    def map(user: User, show_name: bool, uppercase_name: bool = false) -> Dto:
        let name = user.name.upper() if uppercase_name else user.name
        return new Dto(name = name if show_name else user.username)
"#;

fn user_strategy() -> impl Strategy<Value = User> {
    ("[A-Za-z ]{0,8}", "[a-z0-9_]{0,8}").prop_map(|(name, username)| User { name, username })
}

fn field(value: &Value, name: &str) -> Value {
    value.as_record().and_then(|r| r.get(name)).cloned().unwrap_or_default()
}

// =============================================================================
// Degeneration
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// A factory without extra parameters behaves exactly like the default mapping plus its initializers.
    #[test]
    fn degenerate_factory_matches_default(user in user_strategy()) {
        let plain = dto_mapper("");
        let degenerate = dto_mapper("\n    def map(u: User) -> Dto:\n        return new Dto()\n");
        prop_assert!(degenerate.plan().factories.is_empty());
        prop_assert_eq!(plain.map(&user.to_value()).unwrap(), degenerate.map(&user.to_value()).unwrap());
    }

    /// With neutral arguments a factory reproduces the default mapping.
    #[test]
    fn neutral_arguments_match_default(user in user_strategy()) {
        let mapper = dto_mapper(SHOW_NAME);
        let digest = mapper.plan().factories[0].digest.clone();
        let source = user.to_value();
        prop_assert_eq!(
            mapper.map_with(&digest, &source, &Args::new().arg(true)).unwrap(),
            mapper.map(&source).unwrap()
        );
    }
}

// =============================================================================
// Arguments and surfaces
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn omitted_optional_equals_explicit_default(user in user_strategy(), show_name in any::<bool>()) {
        let mapper = dto_mapper(SHOW_NAME);
        let digest = mapper.plan().factories[0].digest.clone();
        let source = user.to_value();
        let omitted = mapper.map_with(&digest, &source, &Args::new().arg(show_name)).unwrap();
        let explicit = mapper.map_with(&digest, &source, &Args::new().arg(show_name).arg(false)).unwrap();
        prop_assert_eq!(omitted, explicit);
    }

    #[test]
    fn surfaces_agree(
        users in prop::collection::vec(user_strategy(), 0..5),
        show_name in any::<bool>(),
        uppercase_name in any::<bool>(),
    ) {
        let mapper = dto_mapper(SHOW_NAME);
        let digest = mapper.plan().factories[0].digest.clone();
        let args = Args::new().arg(show_name).arg(uppercase_name);
        let sources: Vec<Value> = users.iter().map(FieldValue::to_value).collect();

        let eager: Vec<Value> = sources.iter().map(|s| mapper.map_with(&digest, s, &args).unwrap()).collect();
        let callable = mapper.callable_with(&digest, &args).unwrap();
        let called: Vec<Value> = sources.iter().map(|s| callable(s).unwrap()).collect();
        let projected = mapper
            .project_with(&digest, Query::in_memory(sources.clone()), &args)
            .unwrap()
            .to_list()
            .unwrap();
        let iterated: Vec<Value> = mapper
            .map_iter_with(&digest, users.clone(), &args)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        prop_assert_eq!(&eager, &called);
        prop_assert_eq!(&eager, &projected);
        prop_assert_eq!(&eager, &iterated);

        for (user, mapped) in users.iter().zip(&eager) {
            let expected = match (show_name, uppercase_name) {
                (false, _) => user.username.clone(),
                (true, false) => user.name.clone(),
                (true, true) => user.name.to_uppercase(),
            };
            prop_assert_eq!(field(mapped, "name"), Value::from(expected));
            prop_assert_eq!(field(mapped, "username"), Value::from(user.username.clone()));
        }
    }
}

// =============================================================================
// Staging shape
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Whatever the factory's names, the variable and final stages only read the params record, and binding
    /// leaves the params stage reading nothing but its own parameter.
    #[test]
    fn later_stages_only_read_params(src in "[a-z]{1,6}", flag in "[a-z]{1,6}", var in "[a-z]{1,6}") {
        let (src, flag, var) = (format!("s_{src}"), format!("p_{flag}"), format!("v_{var}"));
        let methods = format!(
            "\n    def map({src}: User, {flag}: bool) -> Dto:\n        let {var} = {src}.name.lower()\n        return new Dto(name = {var} if {flag} else {src}.username)\n"
        );
        let mapper = dto_mapper(&methods);
        let factory = &mapper.plan().factories[0];

        let vars_stage = factory.vars_stage.as_ref().unwrap();
        prop_assert!(vars_stage.body.parameters().iter().all(|p| *p == vars_stage.param));
        prop_assert!(factory.final_stage.body.parameters().iter().all(|p| *p == factory.final_stage.param));
        prop_assert_eq!(vars_stage.param.as_str(), "_params");

        let stages = factory.bind(&Args::new().arg(true)).unwrap();
        prop_assert_eq!(stages.len(), 3);
        prop_assert!(stages[0].body.parameters().iter().all(|p| *p == stages[0].param));

        let user = User { name: "MiXeD".to_string(), username: "u".to_string() };
        let mapped = mapper.map_with(&factory.digest, &user.to_value(), &Args::new().arg(true)).unwrap();
        prop_assert_eq!(field(&mapped, "name"), Value::from("mixed"));
    }

    /// A source-derived variable read twice in the construction is always rejected.
    #[test]
    fn double_read_is_rejected(var in "[a-z]{1,6}") {
        let var = format!("v_{var}");
        let output = compile_dto(&format!(
            "\n    def map(user: User, flag: bool) -> Dto:\n        let {var} = user.name\n        return new Dto(name = {var}, username = {var})\n"
        ));
        let codes: Vec<&str> = output.diagnostics.iter().map(|d| d.code()).collect();
        prop_assert_eq!(codes, vec!["SM0004"]);
        let quoted = format!("'{var}'");
        prop_assert!(output.diagnostics[0].message.contains(&quoted));
    }
}
