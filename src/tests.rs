use crate::ast::Element;
use crate::parser::parse;
use std::ffi::CStr;

// ── Shared fixture runners ──────────────────────────────────────────

/// Embed fixture files at compile time.
const COMPILE_FIXTURES: &str = include_str!("../test-data/fixtures/compile.json");
const TYPE_FIXTURES: &str = include_str!("../test-data/fixtures/types.json");
const PARSE_ERROR_FIXTURES: &str = include_str!("../test-data/fixtures/parse-errors.json");

fn load(fixtures: &str) -> Vec<serde_json::Value> {
    serde_json::from_str(fixtures).unwrap()
}

#[test]
fn test_fixture_compile() {
    for fixture in &load(COMPILE_FIXTURES) {
        let name = fixture["name"].as_str().unwrap();
        let message = fixture["message"].as_str().unwrap();
        let locale = fixture["locale"].as_str().unwrap();
        let expected = fixture["expected"].as_str().unwrap();

        let compiled = crate::compile(message, locale)
            .unwrap_or_else(|err| panic!("Fixture '{}': compile failed: {}", name, err));
        assert_eq!(
            compiled, expected,
            "Fixture '{}': compiled source mismatch\n  Got:      {}\n  Expected: {}",
            name, compiled, expected
        );
    }
}

#[test]
fn test_fixture_types() {
    for fixture in &load(TYPE_FIXTURES) {
        let name = fixture["name"].as_str().unwrap();
        let message = fixture["message"].as_str().unwrap();
        let expected = fixture["expected"].as_str().unwrap();

        let ty = crate::generate_type(message)
            .unwrap_or_else(|err| panic!("Fixture '{}': type generation failed: {}", name, err));
        assert_eq!(
            ty, expected,
            "Fixture '{}': type mismatch\n  Got:      {}\n  Expected: {}",
            name, ty, expected
        );
    }
}

#[test]
fn test_fixture_parse_errors() {
    for fixture in &load(PARSE_ERROR_FIXTURES) {
        let name = fixture["name"].as_str().unwrap();
        let input = fixture["input"].as_str().unwrap();
        let code = fixture["code"].as_str().unwrap();

        match parse(input) {
            Ok(elements) => panic!(
                "Fixture '{}': expected error '{}' for input '{}', got {:?}",
                name, code, input, elements
            ),
            Err(err) => assert_eq!(
                err.code, code,
                "Fixture '{}': error code mismatch for input '{}': {}",
                name, input, err
            ),
        }
    }
}

// ── Cross-module behaviour ──────────────────────────────────────────

#[test]
fn compile_and_types_agree_on_argument_names() {
    let messages = [
        "{a} {b, number} <t>{c, date, short}</t>",
        "{n, plural, one {{x}} other {{y, time}}}",
        "{g, select, a {<em>{z}</em>} other {}}",
    ];
    for message in messages {
        let elements = crate::parse_with_options(
            message,
            crate::ParserOptions {
                requires_other_clause: false,
                ..Default::default()
            },
        )
        .unwrap();
        let ty = crate::generate_type_ast(&elements);
        for name in crate::collect_argument_names(&elements) {
            assert!(
                ty.contains(&format!("{{ {}: ", name)),
                "type {} is missing argument {}",
                ty,
                name
            );
        }
    }
}

#[test]
fn ast_json_feeds_the_compilers() {
    let message = "{count, selectordinal, one {#st} two {#nd} few {#rd} other {#th}}";
    let elements = parse(message).unwrap();
    let from_wire = crate::from_json::from_json(&crate::json::to_json(&elements)).unwrap();
    assert_eq!(
        crate::compile_ast(&from_wire, "en").unwrap(),
        crate::compile(message, "en").unwrap()
    );
    assert_eq!(
        crate::generate_type_ast(&from_wire),
        crate::generate_type(message).unwrap()
    );
}

#[test]
fn pound_from_upstream_ast_outside_plural_fails() {
    let elements = crate::from_json::from_json(r#"[{"type":0,"value":"n = "},{"type":7}]"#).unwrap();
    assert_eq!(elements[1], Element::Pound);
    assert_eq!(
        crate::compile_ast(&elements, "en"),
        Err(crate::CompileError::PoundOutsideContext)
    );
}

// ── FFI ─────────────────────────────────────────────────────────────

/// Read and free a string returned by one of the `wasm_*` functions.
fn take_c_string(ptr: *const u8) -> String {
    let text = unsafe { CStr::from_ptr(ptr as *const std::ffi::c_char) }
        .to_str()
        .unwrap()
        .to_string();
    unsafe { crate::dealloc(ptr as *mut u8, text.len() + 1) };
    text
}

#[test]
fn ffi_compile_success() {
    let message = "Hello {name}";
    let locale = "en";
    let ptr = unsafe {
        crate::wasm_compile(message.as_ptr(), message.len(), locale.as_ptr(), locale.len())
    };
    let json: serde_json::Value = serde_json::from_str(&take_c_string(ptr)).unwrap();
    assert_eq!(json["ok"], "({name}) => `Hello ${name}`");
}

#[test]
fn ffi_compile_error() {
    let message = "Hello {name";
    let locale = "en";
    let ptr = unsafe {
        crate::wasm_compile(message.as_ptr(), message.len(), locale.as_ptr(), locale.len())
    };
    let json: serde_json::Value = serde_json::from_str(&take_c_string(ptr)).unwrap();
    assert_eq!(json["error"]["code"], "expect-argument-closing-brace");
    assert_eq!(json["error"]["begin"]["column"], 6);
}

#[test]
fn ffi_generate_type_and_parse() {
    let message = "<tag>{someArg}</tag>";
    let ty = take_c_string(unsafe { crate::wasm_generate_type(message.as_ptr(), message.len()) });
    let ty: serde_json::Value = serde_json::from_str(&ty).unwrap();
    assert_eq!(ty["ok"], "{ tag: string } & ({ someArg: string | number })");

    let ast = take_c_string(unsafe { crate::wasm_parse(message.as_ptr(), message.len()) });
    let ast: serde_json::Value = serde_json::from_str(&ast).unwrap();
    assert_eq!(ast["ok"][0]["type"], 8);
    assert_eq!(ast["ok"][0]["children"][0]["value"], "someArg");
}

#[test]
fn ffi_alloc_round_trip() {
    let ptr = crate::alloc(16);
    assert!(!ptr.is_null());
    unsafe { crate::dealloc(ptr, 16) };
}
