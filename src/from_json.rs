use crate::ast::*;
use crate::json::type_code;
use serde_json::{Map, Value};
use thiserror::Error;

/// Failure to read an AST from its JSON wire shape.
#[derive(Debug, Error)]
pub enum AstJsonError {
    #[error("invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("expected {expected} at {path}")]
    Shape { expected: &'static str, path: String },

    #[error("unknown element type {code} at {path}")]
    UnknownType { code: u64, path: String },

    #[error("missing field \"{field}\" at {path}")]
    MissingField { field: &'static str, path: String },
}

/// Parse an AST produced upstream (an array of elements with numeric
/// `type` codes) into elements. Option order follows the JSON object.
pub fn from_json(input: &str) -> Result<Vec<Element>, AstJsonError> {
    let value: Value = serde_json::from_str(input)?;
    elements_from_value(&value, "$")
}

pub fn elements_from_value(value: &Value, path: &str) -> Result<Vec<Element>, AstJsonError> {
    let items = value.as_array().ok_or_else(|| AstJsonError::Shape {
        expected: "an array of elements",
        path: path.to_string(),
    })?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| element_from_value(item, &format!("{}[{}]", path, i)))
        .collect()
}

fn element_from_value(value: &Value, path: &str) -> Result<Element, AstJsonError> {
    let obj = value.as_object().ok_or_else(|| AstJsonError::Shape {
        expected: "an element object",
        path: path.to_string(),
    })?;
    let code = obj
        .get("type")
        .ok_or_else(|| missing("type", path))?
        .as_u64()
        .ok_or_else(|| AstJsonError::Shape {
            expected: "a numeric type code",
            path: format!("{}.type", path),
        })?;

    let element = match code {
        type_code::LITERAL => Element::Literal {
            value: string_field(obj, "value", path)?,
        },
        type_code::ARGUMENT => Element::Argument {
            value: string_field(obj, "value", path)?,
        },
        type_code::NUMBER => Element::Number {
            value: string_field(obj, "value", path)?,
            style: optional_string_field(obj, "style"),
        },
        type_code::DATE => Element::Date {
            value: string_field(obj, "value", path)?,
            style: optional_string_field(obj, "style").and_then(|s| DateTimeStyle::parse(&s)),
        },
        type_code::TIME => Element::Time {
            value: string_field(obj, "value", path)?,
            style: optional_string_field(obj, "style").and_then(|s| DateTimeStyle::parse(&s)),
        },
        type_code::SELECT => Element::Select {
            value: string_field(obj, "value", path)?,
            options: options_field(obj, path)?,
        },
        type_code::PLURAL => Element::Plural {
            value: string_field(obj, "value", path)?,
            plural_type: match optional_string_field(obj, "pluralType").as_deref() {
                Some("ordinal") => PluralType::Ordinal,
                _ => PluralType::Cardinal,
            },
            offset: obj.get("offset").and_then(Value::as_i64).unwrap_or(0),
            options: options_field(obj, path)?,
        },
        type_code::POUND => Element::Pound,
        type_code::TAG => Element::Tag {
            value: string_field(obj, "value", path)?,
            children: elements_from_value(
                obj.get("children").ok_or_else(|| missing("children", path))?,
                &format!("{}.children", path),
            )?,
        },
        code => {
            return Err(AstJsonError::UnknownType {
                code,
                path: path.to_string(),
            })
        }
    };
    Ok(element)
}

fn missing(field: &'static str, path: &str) -> AstJsonError {
    AstJsonError::MissingField {
        field,
        path: path.to_string(),
    }
}

fn string_field(obj: &Map<String, Value>, field: &'static str, path: &str) -> Result<String, AstJsonError> {
    match obj.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(AstJsonError::Shape {
            expected: "a string",
            path: format!("{}.{}", path, field),
        }),
        None => Err(missing(field, path)),
    }
}

/// Absent, `null` and non-string values (e.g. parsed skeletons) all read
/// as no style.
fn optional_string_field(obj: &Map<String, Value>, field: &str) -> Option<String> {
    obj.get(field).and_then(Value::as_str).map(str::to_string)
}

/// `"options": {"key": {"value": [...]}}`
fn options_field(obj: &Map<String, Value>, path: &str) -> Result<Options, AstJsonError> {
    let options_path = format!("{}.options", path);
    let raw = obj
        .get("options")
        .ok_or_else(|| missing("options", path))?
        .as_object()
        .ok_or_else(|| AstJsonError::Shape {
            expected: "an options object",
            path: options_path.clone(),
        })?;

    let mut options = Options::new();
    for (key, option) in raw {
        let option_path = format!("{}.{}", options_path, key);
        let branch = option.get("value").ok_or_else(|| missing("value", &option_path))?;
        options.insert(
            key.clone(),
            elements_from_value(branch, &format!("{}.value", option_path))?,
        );
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::{to_json, to_json_pretty};
    use crate::parser::{parse_with_options, ParserOptions};

    fn lenient(message: &str) -> Vec<Element> {
        parse_with_options(
            message,
            ParserOptions {
                requires_other_clause: false,
                ..ParserOptions::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn reads_what_the_writer_emits() {
        let elements = lenient(
            "<b>{n, plural, offset:2 =0 {none} few {# of {total, number}} other {#}}</b> {d, time, long} {g, select, z {} a {A}}",
        );
        assert_eq!(from_json(&to_json(&elements)).unwrap(), elements);
        assert_eq!(from_json(&to_json_pretty(&elements)).unwrap(), elements);
    }

    #[test]
    fn keeps_option_order_from_json() {
        let json = r#"[{"type":5,"value":"g","options":{"z":{"value":[]},"other":{"value":[]},"a":{"value":[]}}}]"#;
        let elements = from_json(json).unwrap();
        let Element::Select { options, .. } = &elements[0] else {
            panic!("expected select");
        };
        let keys: Vec<_> = options.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "other", "a"]);
    }

    #[test]
    fn accepts_pound_anywhere() {
        let elements = from_json(r#"[{"type":7}]"#).unwrap();
        assert_eq!(elements, vec![Element::Pound]);
    }

    #[test]
    fn skeleton_style_reads_as_none() {
        let json = r#"[{"type":3,"value":"d","style":{"type":1,"pattern":"yyyy"}}]"#;
        assert_eq!(
            from_json(json).unwrap(),
            vec![Element::Date {
                value: "d".to_string(),
                style: None,
            }]
        );
    }

    #[test]
    fn reports_errors_with_paths() {
        assert!(matches!(from_json("[").unwrap_err(), AstJsonError::Syntax(_)));
        assert!(matches!(
            from_json(r#"{"type":0}"#).unwrap_err(),
            AstJsonError::Shape { .. }
        ));
        match from_json(r#"[{"type":0,"value":"a"},{"type":42}]"#).unwrap_err() {
            AstJsonError::UnknownType { code, path } => {
                assert_eq!(code, 42);
                assert_eq!(path, "$[1]");
            }
            other => panic!("unexpected error {other}"),
        }
        match from_json(r#"[{"type":8,"value":"b","children":[{"type":1}]}]"#).unwrap_err() {
            AstJsonError::MissingField { field, path } => {
                assert_eq!(field, "value");
                assert_eq!(path, "$[0].children[0]");
            }
            other => panic!("unexpected error {other}"),
        }
    }
}
