use crate::ast::*;
use crate::error::{CompileError, ParseError, Position};

/// Numeric `type` codes of the upstream AST wire format.
pub mod type_code {
    pub const LITERAL: u64 = 0;
    pub const ARGUMENT: u64 = 1;
    pub const NUMBER: u64 = 2;
    pub const DATE: u64 = 3;
    pub const TIME: u64 = 4;
    pub const SELECT: u64 = 5;
    pub const PLURAL: u64 = 6;
    pub const POUND: u64 = 7;
    pub const TAG: u64 = 8;
}

/// JSON formatting style.
#[derive(Clone, Copy)]
pub enum JsonStyle {
    /// Compact: no whitespace between tokens.
    Compact,
    /// Pretty: 2-space indented, one entry per line.
    Pretty,
}

struct JsonWriter {
    buf: String,
    style: JsonStyle,
    depth: usize,
}

impl JsonWriter {
    fn new(style: JsonStyle) -> Self {
        JsonWriter {
            buf: String::new(),
            style,
            depth: 0,
        }
    }

    fn is_pretty(&self) -> bool {
        matches!(self.style, JsonStyle::Pretty)
    }

    fn newline(&mut self) {
        if self.is_pretty() {
            self.buf.push('\n');
            for _ in 0..self.depth {
                self.buf.push_str("  ");
            }
        }
    }

    fn space(&mut self) {
        if self.is_pretty() {
            self.buf.push(' ');
        }
    }

    fn write_elements(&mut self, elements: &[Element]) {
        self.buf.push('[');
        self.depth += 1;

        for (i, element) in elements.iter().enumerate() {
            if i > 0 {
                self.buf.push(',');
            }
            self.newline();
            self.write_element(element);
        }

        self.depth -= 1;
        if !elements.is_empty() {
            self.newline();
        }
        self.buf.push(']');
    }

    fn write_element(&mut self, element: &Element) {
        self.buf.push('{');
        self.depth += 1;
        let mut first = true;

        match element {
            Element::Literal { value } => self.write_head(&mut first, type_code::LITERAL, value),
            Element::Argument { value } => self.write_head(&mut first, type_code::ARGUMENT, value),
            Element::Number { value, style } => {
                self.write_head(&mut first, type_code::NUMBER, value);
                self.entry_sep(&mut first);
                self.write_key("style");
                self.write_optional_string(style.as_deref());
            }
            Element::Date { value, style } => {
                self.write_head(&mut first, type_code::DATE, value);
                self.entry_sep(&mut first);
                self.write_key("style");
                self.write_optional_string(style.map(DateTimeStyle::as_str));
            }
            Element::Time { value, style } => {
                self.write_head(&mut first, type_code::TIME, value);
                self.entry_sep(&mut first);
                self.write_key("style");
                self.write_optional_string(style.map(DateTimeStyle::as_str));
            }
            Element::Tag { value, children } => {
                self.write_head(&mut first, type_code::TAG, value);
                self.entry_sep(&mut first);
                self.write_key("children");
                self.write_elements(children);
            }
            Element::Select { value, options } => {
                self.write_head(&mut first, type_code::SELECT, value);
                self.entry_sep(&mut first);
                self.write_key("options");
                self.write_options(options);
            }
            Element::Plural {
                value,
                plural_type,
                offset,
                options,
            } => {
                self.write_head(&mut first, type_code::PLURAL, value);
                self.entry_sep(&mut first);
                self.write_key("options");
                self.write_options(options);
                self.entry_sep(&mut first);
                self.write_key("offset");
                self.buf.push_str(&offset.to_string());
                self.entry_sep(&mut first);
                self.write_key("pluralType");
                self.write_string_value(plural_type.as_str());
            }
            Element::Pound => {
                self.entry_sep(&mut first);
                self.write_key("type");
                self.buf.push_str(&type_code::POUND.to_string());
            }
        }

        self.depth -= 1;
        self.newline();
        self.buf.push('}');
    }

    /// `"type": N, "value": "..."`
    fn write_head(&mut self, first: &mut bool, code: u64, value: &str) {
        self.entry_sep(first);
        self.write_key("type");
        self.buf.push_str(&code.to_string());
        self.entry_sep(first);
        self.write_key("value");
        self.write_string_value(value);
    }

    /// `{"key": {"value": [...]}, ...}` in declaration order.
    fn write_options(&mut self, options: &Options) {
        self.buf.push('{');
        self.depth += 1;

        let mut first = true;
        for (key, branch) in options {
            self.entry_sep(&mut first);
            self.write_key(key);
            self.buf.push('{');
            self.depth += 1;
            let mut inner_first = true;
            self.entry_sep(&mut inner_first);
            self.write_key("value");
            self.write_elements(branch);
            self.depth -= 1;
            self.newline();
            self.buf.push('}');
        }

        self.depth -= 1;
        self.newline();
        self.buf.push('}');
    }

    fn entry_sep(&mut self, first: &mut bool) {
        if *first {
            *first = false;
        } else {
            self.buf.push(',');
        }
        self.newline();
    }

    fn write_key(&mut self, key: &str) {
        self.write_string_value(key);
        self.buf.push(':');
        self.space();
    }

    fn write_optional_string(&mut self, s: Option<&str>) {
        match s {
            Some(s) => self.write_string_value(s),
            None => self.buf.push_str("null"),
        }
    }

    fn write_string_value(&mut self, s: &str) {
        self.buf.push('"');
        for ch in s.chars() {
            match ch {
                '"' => self.buf.push_str("\\\""),
                '\\' => self.buf.push_str("\\\\"),
                '\n' => self.buf.push_str("\\n"),
                '\r' => self.buf.push_str("\\r"),
                '\t' => self.buf.push_str("\\t"),
                '\u{0008}' => self.buf.push_str("\\b"),
                '\u{000C}' => self.buf.push_str("\\f"),
                c if c < '\u{0020}' => {
                    self.buf.push_str(&format!("\\u{:04x}", c as u32));
                }
                c => self.buf.push(c),
            }
        }
        self.buf.push('"');
    }

    fn write_position(&mut self, pos: &Position) {
        self.buf.push_str(&format!(
            "{{\"line\":{},\"column\":{},\"offset\":{}}}",
            pos.line, pos.column, pos.offset
        ));
    }

    fn write_parse_error(&mut self, err: &ParseError) {
        self.buf.push('{');
        self.write_key("code");
        self.write_string_value(err.code);
        self.buf.push(',');
        self.write_key("message");
        self.write_string_value(&err.message);
        self.buf.push(',');
        self.write_key("begin");
        self.write_position(&err.begin);
        self.buf.push(',');
        self.write_key("end");
        self.write_position(&err.end);
        self.buf.push('}');
    }
}

/// Serialize a message AST to compact JSON in the upstream wire shape.
pub fn to_json(elements: &[Element]) -> String {
    let mut w = JsonWriter::new(JsonStyle::Compact);
    w.write_elements(elements);
    w.buf
}

/// Serialize a message AST to pretty-printed JSON (2-space indent).
pub fn to_json_pretty(elements: &[Element]) -> String {
    let mut w = JsonWriter::new(JsonStyle::Pretty);
    w.write_elements(elements);
    w.buf
}

/// `{"ok": "<text>"}`, the success envelope of the FFI entry points.
pub fn ok_to_json(text: &str) -> String {
    let mut w = JsonWriter::new(JsonStyle::Compact);
    w.buf.push('{');
    w.write_key("ok");
    w.write_string_value(text);
    w.buf.push('}');
    w.buf
}

/// `{"ok": [...]}` carrying a parsed AST.
pub fn ast_to_json(elements: &[Element]) -> String {
    let mut w = JsonWriter::new(JsonStyle::Compact);
    w.buf.push('{');
    w.write_key("ok");
    w.write_elements(elements);
    w.buf.push('}');
    w.buf
}

/// `{"error": {...}}` for a compile failure. Parse errors carry their span.
pub fn error_to_json(err: &CompileError) -> String {
    let mut w = JsonWriter::new(JsonStyle::Compact);
    w.buf.push('{');
    w.write_key("error");
    match err {
        CompileError::Parse(parse) => w.write_parse_error(parse),
        other => {
            w.buf.push('{');
            w.write_key("code");
            w.write_string_value(other.code());
            w.buf.push(',');
            w.write_key("message");
            w.write_string_value(&other.to_string());
            w.buf.push('}');
        }
    }
    w.buf.push('}');
    w.buf
}
