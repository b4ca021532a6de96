//! The generated mappers, compiled into this crate by its build script, called as a consumer would call them.

use mapforge_e2e::app::entities::User;
use mapforge_e2e::mappers::app::cards::{Card, CardMapper};
use mapforge_e2e::mappers::app::greetings::GreetingMapper;
use mapforge_e2e::mappers::app::models::{
    UserDto, UserDtoMapper, UserDtoWithFactoryMapper, UserDtoWithParams, UserDtoWithParamsMapper,
};
use mapforge_runtime::{CompiledType, FieldValue, Query, Reflect, Value};

fn foo() -> User {
    User {
        name: "Foo".to_string(),
        username: "x_foo_x".to_string(),
    }
}

fn bar() -> User {
    User {
        name: "Bar".to_string(),
        username: "bar21".to_string(),
    }
}

fn username(value: &Value) -> Value {
    value.as_record().and_then(|r| r.get("username")).cloned().unwrap_or_default()
}

#[test]
fn metadata_file_describes_the_compiled_user() {
    let types: Vec<CompiledType> = serde_json::from_str(include_str!("../metadata/types.json")).unwrap();
    assert_eq!(types, vec![User::compiled_type()]);
}

#[test]
fn default_mapping_copies_matching_properties() {
    let dto = UserDtoMapper::to_user_dto(&foo()).unwrap();
    assert_eq!(
        dto,
        UserDto {
            username: "x_foo_x".to_string()
        }
    );
    assert_eq!(UserDtoMapper::map(&bar()).unwrap().username, "bar21");

    // A factory without extra parameters folds into the default mapping.
    let folded = UserDtoWithFactoryMapper::to_user_dto_with_factory(&foo()).unwrap();
    assert_eq!((folded.name.as_str(), folded.username.as_str()), ("Foo", "x_foo_x"));
}

#[test]
fn default_surfaces_agree() {
    let users = vec![foo(), bar()];

    let iterated: Vec<UserDto> = UserDtoMapper::to_user_dto_iter(users.clone())
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(iterated.iter().map(|d| d.username.as_str()).collect::<Vec<_>>(), vec!["x_foo_x", "bar21"]);

    let query = UserDtoMapper::to_user_dto_query(Query::in_memory(users.iter().map(FieldValue::to_value)));
    let projected = query.to_list().unwrap();
    assert_eq!(projected.iter().map(username).collect::<Vec<_>>(), vec![Value::from("x_foo_x"), Value::from("bar21")]);

    let func = UserDtoMapper::new_func();
    assert_eq!(username(&func(&bar().to_value()).unwrap()), Value::from("bar21"));

    assert_eq!(
        UserDtoMapper::new_expression().to_string(),
        "x => new app::models::UserDto { username = x.username }"
    );
}

#[test]
fn factory_arguments_reach_the_mapping() {
    let upper = UserDtoWithParamsMapper::to_user_dto_with_params_f9d169(&foo(), true, Some(true)).unwrap();
    assert_eq!(
        upper,
        UserDtoWithParams {
            name: "FOO".to_string(),
            username: "x_foo_x".to_string(),
            created: String::new(),
        }
    );

    let hidden = UserDtoWithParamsMapper::map_f9d169(&foo(), false, None).unwrap();
    assert_eq!(hidden.name, "x_foo_x");

    let shown = UserDtoWithParamsMapper::to_user_dto_with_params_f9d169(&bar(), true, None).unwrap();
    assert_eq!(shown.name, "Bar");
}

#[test]
fn factory_surfaces_agree() {
    let users = vec![foo(), bar()];

    let iterated: Vec<UserDtoWithParams> =
        UserDtoWithParamsMapper::to_user_dto_with_params_iter_f9d169(users.clone(), true, Some(true))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
    assert_eq!(iterated.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(), vec!["FOO", "BAR"]);

    let query = Query::in_memory(users.iter().map(FieldValue::to_value));
    let projected = UserDtoWithParamsMapper::to_user_dto_with_params_query_f9d169(query, false, None)
        .unwrap()
        .to_list()
        .unwrap();
    let names: Vec<Value> = projected
        .iter()
        .map(|v| v.as_record().and_then(|r| r.get("name")).cloned().unwrap_or_default())
        .collect();
    assert_eq!(names, vec![Value::from("x_foo_x"), Value::from("bar21")]);
}

#[test]
fn residual_statements_run_before_the_mapping() {
    assert_eq!(GreetingMapper::to_greeting_110959(&foo(), true, Some(2)).unwrap().name, "Hi Foo!!");
    assert_eq!(GreetingMapper::to_greeting_110959(&foo(), true, None).unwrap().name, "Hi Foo!");
    assert_eq!(GreetingMapper::to_greeting_110959(&foo(), false, None).unwrap().name, "Hi Foo");
    // The default mapping copies the name without greeting.
    assert_eq!(GreetingMapper::map(&bar()).unwrap().name, "Bar");
}

#[test]
fn nested_constructions_and_aliased_sources() {
    let card: Card = CardMapper::to_card_261125(&foo(), None).unwrap();
    assert_eq!(card.username, "x_foo_x");
    assert_eq!(card.label.text, "@x_foo_x");
    assert_eq!(card.label.length, 1);

    let card = CardMapper::to_card_261125(&bar(), Some("user:".to_string())).unwrap();
    assert_eq!(card.label.text, "user:bar21");
    assert_eq!(card.label.length, 5);
}

#[test]
fn generated_plans_match_the_mappers() {
    let plan = GreetingMapper::plan();
    assert_eq!(plan.factories.len(), 1);
    assert_eq!(plan.factories[0].digest, "110959");
    assert_eq!(plan.factories[0].declaration, "map(app::entities::User user, bool excited, int times = 1)");
    assert!(UserDtoWithFactoryMapper::plan().factories.is_empty());
    assert!(std::ptr::eq(CardMapper::mapper(), CardMapper::mapper()));
}
