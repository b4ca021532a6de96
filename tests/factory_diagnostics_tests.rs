//! Factory diagnostics through the whole pass.
//!
//! Each rejected factory must be reported with its code and a message naming the type, the method and the
//! offending identifier, and must leave the default mapping in place.

use mapforge::{CompileOutput, SourceInput, compile};
use mapforge_runtime::Reflect;

#[derive(Debug, Clone, PartialEq, Default, mapforge_runtime::Reflect)]
#[reflect(namespace = "app::entities")]
struct User {
    name: String,
    username: String,
}

/// Compile `Dto` (properties `name` and `username`, mapped from `User`) with the given methods.
fn compile_dto(methods: &str) -> CompileOutput {
    let source = format!(
        "namespace app\n\nimport app::entities::User\n\n@map_from(User)\nclass Dto:\n    name: str\n    username: str\n{methods}"
    );
    compile(vec![SourceInput::new("dto.map", source)], vec![User::compiled_type()]).unwrap()
}

fn diagnostic_messages(methods: &str) -> Vec<String> {
    let output = compile_dto(methods);
    assert!(output.errors.is_empty(), "{:?}", output.errors);
    let plan = output.plan("app::entities::User", "app::Dto").unwrap();
    assert!(plan.factories.is_empty(), "rejected factory must not be planned");
    assert!(output.code.is_some(), "diagnostics must not block emission");
    output.diagnostics.iter().map(ToString::to_string).collect()
}

#[test]
fn first_parameter_must_be_the_source_type() {
    let messages = diagnostic_messages(
        r#"
    def map(name: str) -> Dto:
        return new Dto(name = name)
"#,
    );
    assert_eq!(
        messages,
        vec!["SM0001: First parameter type of method 'Dto.map' should be the source type 'app::entities::User'"]
    );
}

#[test]
fn missing_terminal_construction() {
    let messages = diagnostic_messages(
        r#"
    def map(user: User, flag: bool) -> Dto:
        let n = user.name
"#,
    );
    insta::assert_snapshot!(messages.join("\n"), @"SM0002: Missing return statement in method 'Dto.map'");
}

#[test]
fn source_read_in_a_condition() {
    let messages = diagnostic_messages(
        r#"
    def map(user: User, flag: bool) -> Dto:
        let label: str = "x"
        if user.name == "Foo":
            label = "y"
        return new Dto(name = label)
"#,
    );
    assert_eq!(
        messages,
        vec!["SM0003: Invalid statement in method 'Dto.map': only variables can access the source parameter 'user'"]
    );
}

#[test]
fn source_variable_read_twice() {
    let messages = diagnostic_messages(
        r#"
    def map(user: User, flag: bool) -> Dto:
        let n = user.name
        return new Dto(name = n, username = n)
"#,
    );
    assert_eq!(
        messages,
        vec![
            "SM0004: Cannot access variable 'n' in method 'Dto.map': the variable uses the source parameter 'user', \
             which can only be accessed once"
        ]
    );
}

#[test]
fn free_function_call_cannot_be_translated() {
    let messages = diagnostic_messages(
        r#"
    def map(user: User, width: int) -> Dto:
        return new Dto(name = pad(user.name, width))
"#,
    );
    assert_eq!(
        messages,
        vec![
            "SM0005: Expression 'pad(user.name, width)' in method 'Dto.map' cannot be translated: only builtin \
             methods can be called"
        ]
    );
}

#[test]
fn loops_are_rejected() {
    let messages = diagnostic_messages(
        r#"
    def map(user: User, times: int) -> Dto:
        let suffix: str = ""
        while times > 0:
            suffix = suffix + "!"
        return new Dto(name = user.name + suffix)
"#,
    );
    assert_eq!(
        messages,
        vec!["SM0006: Unsupported control flow in method 'Dto.map': 'while' loops cannot be staged"]
    );
}

#[test]
fn local_changed_after_a_source_variable_read_it() {
    let messages = diagnostic_messages(
        r#"
    def map(user: User, excited: bool) -> Dto:
        let suffix: str = ""
        let name = user.name + suffix
        if excited:
            suffix = "!"
        return new Dto(name = name)
"#,
    );
    assert_eq!(
        messages,
        vec!["SM0007: Cannot change variable 'suffix' in method 'Dto.map': source variable 'name' already read it"]
    );
}

#[test]
fn local_read_before_its_declaration() {
    let messages = diagnostic_messages(
        r#"
    def map(user: User) -> Dto:
        let name = user.name + suffix
        let suffix: str = "!"
        return new Dto(name = name)
"#,
    );
    assert_eq!(
        messages,
        vec!["SM0007: Cannot access variable 'suffix' in method 'Dto.map': the variable is declared later in the method"]
    );
}

#[test]
fn every_problem_of_a_method_is_reported() {
    let messages = diagnostic_messages(
        r#"
    def map(user: User, flag: bool) -> Dto:
        let n = user.name
        if user.username == "":
            pass
        return new Dto(name = n, username = n)
"#,
    );
    let codes: Vec<&str> = messages.iter().map(|m| &m[..6]).collect();
    assert_eq!(codes, vec!["SM0003", "SM0004"]);
}

#[test]
fn one_bad_factory_does_not_affect_the_other() {
    let output = compile_dto(
        r#"
    def map(name: str) -> Dto:
        return new Dto(name = name)

    def map(user: User, upper: bool) -> Dto:
        return new Dto(name = user.name.upper() if upper else user.name)
"#,
    );
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].code(), "SM0001");
    let plan = output.plan("app::entities::User", "app::Dto").unwrap();
    assert_eq!(plan.factories.len(), 1);
    assert_eq!(plan.factories[0].declaration, "map(app::entities::User user, bool upper)");
}
