//! Generated-code tests: the emitted Rust is valid, stable and names every surface.

use std::collections::BTreeMap;
use std::fs;

use mapforge::{SourceInput, compile};
use mapforge_runtime::Reflect;
use quote::ToTokens;

#[derive(Debug, Clone, PartialEq, Default, mapforge_runtime::Reflect)]
#[reflect(namespace = "app::entities")]
struct User {
    name: String,
    username: String,
}

fn valid_inputs() -> Vec<SourceInput> {
    ["cards.map", "greetings.map", "user_dtos.map"]
        .iter()
        .map(|name| {
            let path = format!("tests/fixtures/valid/{name}");
            let source = fs::read_to_string(&path).unwrap();
            SourceInput::new(path, source)
        })
        .collect()
}

fn generate(inputs: Vec<SourceInput>) -> String {
    let output = compile(inputs, vec![User::compiled_type()]).unwrap();
    assert!(!output.has_errors(), "{:?}", output.diagnostics);
    output.code.unwrap()
}

/// Every method of the generated file, keyed `Owner::name`, with its inputs and generics spelled without spaces.
fn functions(code: &str) -> BTreeMap<String, (String, Vec<String>)> {
    fn walk(items: &[syn::Item], out: &mut BTreeMap<String, (String, Vec<String>)>) {
        for item in items {
            match item {
                syn::Item::Mod(module) => {
                    if let Some((_, items)) = &module.content {
                        walk(items, out);
                    }
                }
                syn::Item::Impl(imp) => {
                    let owner = imp.self_ty.to_token_stream().to_string();
                    for item in &imp.items {
                        if let syn::ImplItem::Fn(f) = item {
                            let generics = f.sig.generics.to_token_stream().to_string().replace(' ', "");
                            let inputs = f
                                .sig
                                .inputs
                                .iter()
                                .map(|i| i.to_token_stream().to_string().replace(' ', ""))
                                .collect();
                            out.insert(format!("{owner}::{}", f.sig.ident), (generics, inputs));
                        }
                    }
                }
                _ => {}
            }
        }
    }
    let mut out = BTreeMap::new();
    walk(&syn::parse_file(code).unwrap().items, &mut out);
    out
}

#[test]
fn generated_code_parses() {
    let code = generate(valid_inputs());
    let file = syn::parse_file(&code).unwrap();
    assert_eq!(file.items.len(), 1, "everything lives under the generated module");
    let syn::Item::Mod(root) = &file.items[0] else {
        panic!("expected a module, got {:?}", file.items[0].to_token_stream().to_string());
    };
    assert_eq!(root.ident, "mappers");
    insta::assert_snapshot!(code.lines().next().unwrap(), @"// @generated by mapforge. Do not edit.");
}

#[test]
fn generation_is_byte_identical_across_runs_and_input_order() {
    let first = generate(valid_inputs());
    assert_eq!(first, generate(valid_inputs()));

    let mut reversed = valid_inputs();
    reversed.reverse();
    assert_eq!(first, generate(reversed));
}

#[test]
fn declared_types_become_reflecting_structs() {
    let code = generate(valid_inputs());
    for name in ["Card", "Label", "Greeting", "UserDto", "UserDtoWithFactory", "UserDtoWithParams"] {
        assert!(code.contains(&format!("pub struct {name} {{")), "missing struct {name}");
    }
    assert!(code.contains("::mapforge_runtime::Reflect"));
    assert!(code.contains("#[reflect(namespace = \"app::cards\")]"));
    assert!(code.contains("#[reflect(readonly)]"));
    assert!(code.contains("pub label: Label"));
    assert!(code.contains("pub length: i64"));
}

#[test]
fn every_map_gets_a_mapper_with_all_surfaces() {
    let output = compile(valid_inputs(), vec![User::compiled_type()]).unwrap();
    let code = output.code.clone().unwrap();

    let fns = functions(&code);

    for (mapper, method) in [
        ("CardMapper", "to_card"),
        ("GreetingMapper", "to_greeting"),
        ("UserDtoMapper", "to_user_dto"),
        ("UserDtoWithFactoryMapper", "to_user_dto_with_factory"),
        ("UserDtoWithParamsMapper", "to_user_dto_with_params"),
    ] {
        assert!(code.contains(&format!("pub struct {mapper};")), "missing {mapper}");
        assert_eq!(fns[&format!("{mapper}::{method}")].1, vec!["source:&User"], "{mapper}");
        assert!(fns.contains_key(&format!("{mapper}::{method}_query")), "{mapper}");
        assert_eq!(fns[&format!("{mapper}::{method}_iter")].0, "<I>", "{mapper}");
    }

    // Degenerate factories fold into the default mapping and get no surfaces of their own.
    let plan = output
        .plan("app::entities::User", "app::models::UserDtoWithFactory")
        .unwrap();
    assert!(plan.factories.is_empty());

    let plan = output.plan("app::entities::User", "app::greetings::Greeting").unwrap();
    let digest = &plan.factories[0].digest;
    let surface = |name: &str| fns.get(&format!("GreetingMapper::{name}_{digest}")).cloned();
    let params: Vec<String> = ["source:&User", "excited:bool", "times:Option<i64>"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(surface("map").map(|(_, inputs)| inputs), Some(params.clone()));
    assert_eq!(surface("to_greeting").map(|(_, inputs)| inputs), Some(params));
    assert!(surface("to_greeting_query").is_some());
    assert_eq!(surface("to_greeting_iter").map(|(generics, _)| generics), Some("<I>".to_string()));
}

#[test]
fn foreign_namespaces_are_imported() {
    let code = generate(valid_inputs());
    assert!(code.contains("use crate::app::entities::*;"));
}

#[test]
fn shared_targets_name_mappers_by_source() {
    let source = "namespace app\n\nclass A:\n    x: int\n\nclass B:\n    x: int\n\n@map_from(A)\n@map_from(B)\nclass Dto:\n    x: int\n";
    let code = generate(vec![SourceInput::new("shared.map", source)]);
    assert!(code.contains("pub struct DtoFromAMapper;"));
    assert!(code.contains("pub struct DtoFromBMapper;"));
    assert!(!code.contains("pub struct DtoMapper;"));
    assert!(syn::parse_file(&code).is_ok());
}
