//! Type generator: describes the argument record a message needs as a
//! TypeScript type expression.
//!
//! Each element contributes an object-type fragment and the fragments of a
//! message are intersected:
//!
//! ```text
//! <tag>{someArg}</tag>  →  { tag: string } & ({ someArg: string | number })
//! ```

use crate::ast::*;
use crate::error::ParseError;
use crate::parser::{parse_with_options, ParserOptions};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// The type of a message that takes no arguments.
pub const EMPTY_TYPE: &str = "{}";

/// Names that can be written as bare property keys.
static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid identifier regex")
});

/// Generate the argument type of a message. A select or plural without an
/// `other` branch is accepted.
pub fn generate_type(message: &str) -> Result<String, ParseError> {
    let elements = parse_with_options(
        message,
        ParserOptions {
            requires_other_clause: false,
            ..ParserOptions::default()
        },
    )?;
    Ok(generate_type_ast(&elements))
}

/// Generate the argument type of an already parsed message.
pub fn generate_type_ast(elements: &[Element]) -> String {
    let ty = fragment(elements).unwrap_or_else(|| EMPTY_TYPE.to_string());
    debug!(ty = ty.as_str(), "generated message type");
    ty
}

/// Intersection of the fragments of `elements`, or `None` if no element
/// needs an argument.
fn fragment(elements: &[Element]) -> Option<String> {
    let parts: Vec<String> = elements.iter().filter_map(element_fragment).collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" & "))
    }
}

fn element_fragment(element: &Element) -> Option<String> {
    match element {
        Element::Literal { .. } | Element::Pound => None,
        Element::Argument { value } => Some(object(value, "string | number")),
        Element::Number { value, .. } => Some(object(value, "number")),
        Element::Date { value, .. } | Element::Time { value, .. } => Some(object(value, "Date")),
        Element::Tag { value, children } => {
            let own = object(value, "string");
            Some(match fragment(children) {
                Some(inner) => format!("{} & ({})", own, inner),
                None => own,
            })
        }
        Element::Plural { value, options, .. } => {
            Some(with_branches(object(value, "number"), options))
        }
        Element::Select { value, options } if options.contains_key(OTHER) => {
            let mut keys: Vec<String> = options
                .keys()
                .filter(|key| *key != OTHER)
                .map(|key| quote(key))
                .collect();
            keys.push("(string & {})".to_string());
            Some(with_branches(object(value, &keys.join(" | ")), options))
        }
        Element::Select { value, options } => Some(closed_select(value, options)),
    }
}

/// `own & (<branch> | <branch> ...)`, one member per option. Branches that
/// need nothing are `{}`; if none needs anything the union is dropped.
fn with_branches(own: String, options: &Options) -> String {
    let members: Vec<Option<String>> = options.values().map(|branch| fragment(branch)).collect();
    if members.iter().all(Option::is_none) {
        return own;
    }
    let union: Vec<String> = members
        .into_iter()
        .map(|member| match member {
            Some(ty) => format!("({})", ty),
            None => EMPTY_TYPE.to_string(),
        })
        .collect();
    format!("{} & ({})", own, union.join(" | "))
}

/// A select without `other`: one union member per declared key, each
/// pinning the selector to that key.
fn closed_select(name: &str, options: &Options) -> String {
    let members: Vec<String> = options
        .iter()
        .map(|(key, branch)| {
            let own = object(name, &quote(key));
            match fragment(branch) {
                Some(ty) => format!("({} & ({}))", own, ty),
                None => own,
            }
        })
        .collect();

    if members.len() == 1 {
        members.into_iter().next().unwrap_or_default()
    } else {
        format!("({})", members.join(" | "))
    }
}

fn object(name: &str, ty: &str) -> String {
    format!("{{ {}: {} }}", property_key(name), ty)
}

fn property_key(name: &str) -> String {
    if IDENTIFIER.is_match(name) {
        name.to_string()
    } else {
        quote(name)
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_message_has_empty_type() {
        assert_eq!(generate_type("Hello world").unwrap(), "{}");
        assert_eq!(generate_type("").unwrap(), "{}");
    }

    #[test]
    fn simple_arguments() {
        assert_eq!(
            generate_type("{a} {b, number} {c, date, short} {d, time}").unwrap(),
            "{ a: string | number } & { b: number } & { c: Date } & { d: Date }"
        );
    }

    #[test]
    fn tag_with_text() {
        assert_eq!(
            generate_type("<tag>Some text</tag>").unwrap(),
            "{ tag: string }"
        );
    }

    #[test]
    fn tag_with_argument() {
        assert_eq!(
            generate_type("<tag>{someArg}</tag>").unwrap(),
            "{ tag: string } & ({ someArg: string | number })"
        );
    }

    #[test]
    fn plural_with_empty_branches_collapses() {
        assert_eq!(
            generate_type("{numPhotos, plural, =0 {no photos} =1 {one photo} other {# photos}}")
                .unwrap(),
            "{ numPhotos: number }"
        );
        assert_eq!(
            generate_type("{numPhotos, plural, =0 {no photos} =1 {one photo}}").unwrap(),
            "{ numPhotos: number }"
        );
    }

    #[test]
    fn plural_with_arguments_in_branches() {
        assert_eq!(
            generate_type("{numObjects, plural, =0 {no {object}} =1 {one {object}}}").unwrap(),
            "{ numObjects: number } & (({ object: string | number }) | ({ object: string | number }))"
        );
    }

    #[test]
    fn plural_keeps_empty_branches_as_empty_members() {
        assert_eq!(
            generate_type("{n, plural, one {{x, number}} other {many}}").unwrap(),
            "{ n: number } & (({ x: number }) | {})"
        );
    }

    #[test]
    fn select_with_other_is_open() {
        assert_eq!(
            generate_type("{g, select, male {He} female {She} other {They}}").unwrap(),
            "{ g: \"male\" | \"female\" | (string & {}) }"
        );
    }

    #[test]
    fn select_with_other_and_branch_arguments() {
        assert_eq!(
            generate_type("{g, select, a {{x}} other {none}}").unwrap(),
            "{ g: \"a\" | (string & {}) } & (({ x: string | number }) | {})"
        );
    }

    #[test]
    fn select_without_other_is_closed() {
        assert_eq!(
            generate_type("{g, select, a {{x, number}} b {B}}").unwrap(),
            "(({ g: \"a\" } & ({ x: number })) | { g: \"b\" })"
        );
    }

    #[test]
    fn closed_select_with_single_key() {
        assert_eq!(
            generate_type("{g, select, only {text}}").unwrap(),
            "{ g: \"only\" }"
        );
    }

    #[test]
    fn fragments_intersect_at_top_level() {
        assert_eq!(
            generate_type("{a} and {g, select, x {X} y {Y}}").unwrap(),
            "{ a: string | number } & ({ g: \"x\" } | { g: \"y\" })"
        );
    }

    #[test]
    fn non_identifier_names_are_quoted() {
        assert_eq!(
            generate_type("{first-name}").unwrap(),
            "{ \"first-name\": string | number }"
        );
    }

    #[test]
    fn parse_errors_propagate() {
        assert_eq!(generate_type("{a").unwrap_err().code, "expect-argument-closing-brace");
    }
}
