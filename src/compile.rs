//! Template compiler: turns a message into the source text of a JavaScript
//! formatting function.
//!
//! Literal-only messages become `()=>`text``. Anything else becomes a
//! function destructuring every referenced argument and returning a single
//! template literal, e.g.
//!
//! ```text
//! Hello {name}!  →  ({name}) => `Hello ${name}!`
//! ```
//!
//! Number, date, time and plural rules are emitted as calls to the host's
//! `Intl` facility with the locale baked in.

use crate::ast::*;
use crate::error::CompileError;
use crate::parser::{parse_with_options, ParserOptions};
use indexmap::IndexSet;
use tracing::{debug, trace};

/// Compile a message for `locale` into JavaScript function source.
pub fn compile(message: &str, locale: &str) -> Result<String, CompileError> {
    let elements = parse_with_options(
        message,
        ParserOptions {
            requires_other_clause: false,
            ..ParserOptions::default()
        },
    )?;
    compile_ast(&elements, locale)
}

/// Compile an already parsed message.
pub fn compile_ast(elements: &[Element], locale: &str) -> Result<String, CompileError> {
    if elements.iter().all(Element::is_literal) {
        debug!(locale, "message has only literals, emitting constant function");
        let text: String = elements
            .iter()
            .filter_map(|el| match el {
                Element::Literal { value } => Some(value.as_str()),
                _ => None,
            })
            .collect();
        return Ok(format!("()=>`{}`", escape_template(&text)));
    }

    let args = collect_argument_names(elements);
    debug!(locale, arguments = args.len(), "compiling message");
    let params: Vec<&str> = args.iter().map(String::as_str).collect();
    let body = compile_elements(elements, locale, None)?;

    Ok(format!("({{{}}}) => `{}`", params.join(","), body))
}

/// Every argument name referenced anywhere in the tree, deduplicated, in
/// first-encounter order.
pub fn collect_argument_names(elements: &[Element]) -> IndexSet<String> {
    let mut names = IndexSet::new();
    walk_arguments(elements, &mut names);
    names
}

fn walk_arguments(elements: &[Element], names: &mut IndexSet<String>) {
    for element in elements {
        match element {
            Element::Argument { value }
            | Element::Number { value, .. }
            | Element::Date { value, .. }
            | Element::Time { value, .. } => insert_name(names, value),
            Element::Tag { value, children } => {
                insert_name(names, value);
                walk_arguments(children, names);
            }
            Element::Select { value, options } | Element::Plural { value, options, .. } => {
                insert_name(names, value);
                for branch in options.values() {
                    walk_arguments(branch, names);
                }
            }
            Element::Literal { .. } | Element::Pound => {}
        }
    }
}

fn insert_name(names: &mut IndexSet<String>, name: &str) {
    if !names.contains(name) {
        names.insert(name.to_string());
    }
}

// ── Emission ────────────────────────────────────────────────────────

/// Compile a run of elements into the inside of a template literal.
/// `pound` is the expression `#` stands for, if any plural is in scope.
fn compile_elements(
    elements: &[Element],
    locale: &str,
    pound: Option<&str>,
) -> Result<String, CompileError> {
    let mut out = String::new();
    for element in elements {
        out.push_str(&compile_element(element, locale, pound)?);
    }
    Ok(out)
}

fn compile_element(
    element: &Element,
    locale: &str,
    pound: Option<&str>,
) -> Result<String, CompileError> {
    match element {
        Element::Literal { value } => Ok(escape_template(value)),
        Element::Argument { value } => Ok(format!("${{{}}}", value)),
        Element::Number { value, style } => Ok(format!(
            "${{new Intl.NumberFormat(\"{}\"{}).format({})}}",
            locale,
            number_options(style.as_deref()),
            value
        )),
        Element::Date { value, style } => Ok(compile_date_time(value, "dateStyle", *style, locale)),
        Element::Time { value, style } => Ok(compile_date_time(value, "timeStyle", *style, locale)),
        Element::Tag { value, children } => Ok(format!(
            "<${{{0}}}>{1}</${{{0}}}>",
            value,
            compile_elements(children, locale, pound)?
        )),
        Element::Select { value, options } => compile_select(value, options, locale, pound),
        Element::Plural {
            value,
            plural_type,
            offset,
            options,
        } => compile_plural(value, *plural_type, *offset, options, locale),
        Element::Pound => match pound {
            Some(subject) => Ok(format!(
                "${{new Intl.NumberFormat(\"{}\").format({})}}",
                locale, subject
            )),
            None => Err(CompileError::PoundOutsideContext),
        },
    }
}

fn number_options(style: Option<&str>) -> &'static str {
    match style {
        Some("percent") => ", {style: \"percent\"}",
        Some("integer") => ", {maximumFractionDigits: 0}",
        _ => "",
    }
}

fn compile_date_time(
    value: &str,
    option: &str,
    style: Option<DateTimeStyle>,
    locale: &str,
) -> String {
    match style {
        Some(style) => format!(
            "${{new Intl.DateTimeFormat(\"{}\",{{{}: \"{}\"}}).format({})}}",
            locale,
            option,
            style.as_str(),
            value
        ),
        None => format!(
            "${{new Intl.DateTimeFormat(\"{}\").format({})}}",
            locale, value
        ),
    }
}

fn compile_branch(
    branch: &[Element],
    locale: &str,
    pound: Option<&str>,
) -> Result<String, CompileError> {
    Ok(format!("`{}`", compile_elements(branch, locale, pound)?))
}

/// `name === "a" ? `…` : name === "b" ? `…` : <other>`. Without an `other`
/// branch an unmatched value renders as the empty string.
fn compile_select(
    name: &str,
    options: &Options,
    locale: &str,
    pound: Option<&str>,
) -> Result<String, CompileError> {
    let mut fallback = "\"\"".to_string();
    let mut out = String::from("${");

    for (key, branch) in options {
        let compiled = compile_branch(branch, locale, pound)?;
        if key == OTHER {
            fallback = compiled;
        } else {
            out.push_str(&format!(
                "{} === \"{}\" ? {} : ",
                name,
                escape_js_string(key),
                compiled
            ));
        }
    }
    trace!(name, branches = options.len(), "compiled select");

    out.push_str(&fallback);
    out.push('}');
    Ok(out)
}

/// Exact `=N` branches are tested first, then plural categories, then
/// `other`, each group in declaration order.
fn compile_plural(
    name: &str,
    plural_type: PluralType,
    offset: i64,
    options: &Options,
    locale: &str,
) -> Result<String, CompileError> {
    let subject = if offset == 0 {
        name.to_string()
    } else {
        format!("({} - {})", name, offset)
    };

    let mut exact = Vec::new();
    let mut categories = Vec::new();
    let mut fallback = "\"\"".to_string();

    for (key, branch) in options {
        let compiled = compile_branch(branch, locale, Some(&subject))?;
        if let Some(selector) = key.strip_prefix('=') {
            exact.push((exact_value(selector), compiled));
        } else if key == OTHER {
            fallback = compiled;
        } else {
            categories.push((key.as_str(), compiled));
        }
    }
    trace!(
        name,
        exact = exact.len(),
        categories = categories.len(),
        "compiled plural"
    );

    let mut out = String::from("${");
    for (number, compiled) in &exact {
        out.push_str(&format!("{} == {} ? {} : ", name, number, compiled));
    }
    for (category, compiled) in &categories {
        out.push_str(&format!(
            "new Intl.PluralRules(\"{}\", {{type: \"{}\"}}).select({}) === \"{}\" ? {} : ",
            locale,
            plural_type.as_str(),
            subject,
            escape_js_string(category),
            compiled
        ));
    }
    out.push_str(&fallback);
    out.push('}');
    Ok(out)
}

/// JavaScript number literal for the value of an `=N` selector.
///
/// `=01`, `=+1` and `=1` all compare against `1`. A selector that is not a
/// finite number compares against `NaN` and so never matches.
fn exact_value(selector: &str) -> String {
    let selector = selector.trim();
    if let Ok(int) = selector.parse::<i64>() {
        return int.to_string();
    }
    match selector.parse::<f64>() {
        Ok(float) if float.is_finite() => float.to_string(),
        _ => "NaN".to_string(),
    }
}

/// Escape text for the inside of a JavaScript template literal.
pub fn escape_template(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '$' => out.push_str("\\$"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_js_string(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
