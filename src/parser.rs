use crate::ast::*;
use crate::error::{ParseError, Position};

/// Parser switches, defaulting to the upstream parser's defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Reject `select`/`plural` arguments without an `other` branch.
    pub requires_other_clause: bool,
    /// Treat `<` as plain text instead of opening a tag.
    pub ignore_tag: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            requires_other_clause: true,
            ignore_tag: false,
        }
    }
}

/// The kind of the closest enclosing complex argument. Decides whether `#`
/// is a pound element or plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParentArg {
    None,
    Select,
    Plural,
}

/// Parser state: tracks position in the input string.
struct Parser<'a> {
    input: &'a str,
    pos: usize,
    options: ParserOptions,
}

/// Parse an ICU message with the default options.
pub fn parse(input: &str) -> Result<Vec<Element>, ParseError> {
    parse_with_options(input, ParserOptions::default())
}

/// Parse an ICU message into its element list.
pub fn parse_with_options(input: &str, options: ParserOptions) -> Result<Vec<Element>, ParseError> {
    let mut parser = Parser {
        input,
        pos: 0,
        options,
    };
    let elements = parser.parse_message(0, ParentArg::None, false)?;
    debug_assert!(parser.pos == parser.input.len());
    Ok(elements)
}

impl<'a> Parser<'a> {
    // ── Helpers ──────────────────────────────────────────────────────

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.remaining().chars().nth(1)
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    fn starts_with(&self, s: &str) -> bool {
        self.remaining().starts_with(s)
    }

    fn eat_char(&mut self, ch: char) -> bool {
        if self.peek_char() == Some(ch) {
            self.advance(ch.len_utf8());
            true
        } else {
            false
        }
    }

    fn expect_char(
        &mut self,
        ch: char,
        code: &'static str,
        begin: Position,
    ) -> Result<(), ParseError> {
        if self.eat_char(ch) {
            Ok(())
        } else {
            Err(self.error_span(code, format!("Expected '{}'", ch), begin))
        }
    }

    /// Current position in the source.
    fn position(&self) -> Position {
        let consumed = &self.input[..self.pos];
        let line = consumed.matches('\n').count();
        let last_newline = consumed.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = consumed[last_newline..].chars().count();
        Position {
            line,
            column,
            offset: self.pos,
        }
    }

    /// Create an error at a single point (current position).
    fn error_point(&self, code: &'static str, message: String) -> ParseError {
        let pos = self.position();
        ParseError::new(code, message, pos, pos)
    }

    /// Create an error spanning from `begin` to the current position.
    fn error_span(&self, code: &'static str, message: String, begin: Position) -> ParseError {
        ParseError::new(code, message, begin, self.position())
    }

    fn skip_ws(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance(ch.len_utf8());
            } else {
                break;
            }
        }
    }

    // ── Message ─────────────────────────────────────────────────────

    /// Parse a run of elements. Stops at end of input, at a `}` closing an
    /// enclosing argument (when nested), or at `</` when a closing tag is
    /// expected.
    fn parse_message(
        &mut self,
        nesting: usize,
        parent: ParentArg,
        expecting_close_tag: bool,
    ) -> Result<Vec<Element>, ParseError> {
        let mut elements = Vec::new();

        while let Some(ch) = self.peek_char() {
            match ch {
                '{' => elements.push(self.parse_argument(nesting)?),
                '}' if nesting > 0 => break,
                '#' if parent == ParentArg::Plural => {
                    self.advance(1);
                    elements.push(Element::Pound);
                }
                '<' if !self.options.ignore_tag && self.peek_second() == Some('/') => {
                    if expecting_close_tag {
                        break;
                    }
                    let begin = self.position();
                    self.advance(2);
                    let name = self.parse_tag_name();
                    return Err(self.error_span(
                        "unmatched-closing-tag",
                        format!("Closing tag </{}> has no matching opening tag", name),
                        begin,
                    ));
                }
                '<' if !self.options.ignore_tag && self.peek_second().map_or(false, is_alpha) => {
                    match self.parse_tag(nesting, parent)? {
                        Element::Literal { value } => push_literal(&mut elements, value),
                        tag => elements.push(tag),
                    }
                }
                _ => {
                    let text = self.parse_literal(nesting, parent);
                    push_literal(&mut elements, text);
                }
            }
        }

        Ok(elements)
    }

    /// Consume literal text, resolving apostrophe quoting.
    fn parse_literal(&mut self, nesting: usize, parent: ParentArg) -> String {
        let mut text = String::new();

        while let Some(ch) = self.peek_char() {
            match ch {
                '\'' => self.parse_quote(parent, &mut text),
                '{' => break,
                '}' if nesting > 0 => break,
                '#' if parent == ParentArg::Plural => break,
                '<' if !self.options.ignore_tag
                    && self
                        .peek_second()
                        .map_or(false, |next| next == '/' || is_alpha(next)) =>
                {
                    break
                }
                _ => {
                    text.push(ch);
                    self.advance(ch.len_utf8());
                }
            }
        }

        text
    }

    /// Apostrophe handling: `''` is a literal apostrophe; an apostrophe
    /// before a syntax character quotes everything up to the next single
    /// apostrophe; any other apostrophe is plain text.
    fn parse_quote(&mut self, parent: ParentArg, text: &mut String) {
        self.advance(1);
        let starts_quote = match self.peek_char() {
            Some('\'') => {
                self.advance(1);
                text.push('\'');
                return;
            }
            Some('{') | Some('}') | Some('<') | Some('>') => true,
            Some('#') => parent == ParentArg::Plural,
            _ => false,
        };
        if !starts_quote {
            text.push('\'');
            return;
        }

        // An unterminated quote runs to the end of input.
        while let Some(ch) = self.peek_char() {
            if ch == '\'' {
                if self.peek_second() == Some('\'') {
                    text.push('\'');
                    self.advance(2);
                    continue;
                }
                self.advance(1);
                return;
            }
            text.push(ch);
            self.advance(ch.len_utf8());
        }
    }

    // ── Tags ────────────────────────────────────────────────────────

    fn parse_tag_name(&mut self) -> String {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if is_tag_name_char(ch) {
                self.advance(ch.len_utf8());
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    /// `<name>children</name>`. A self-closing `<name/>` is kept as text.
    fn parse_tag(&mut self, nesting: usize, parent: ParentArg) -> Result<Element, ParseError> {
        let begin = self.position();
        self.advance(1);
        let name = self.parse_tag_name();
        self.skip_ws();

        if self.starts_with("/>") {
            self.advance(2);
            return Ok(Element::literal(format!("<{}/>", name)));
        }
        if !self.eat_char('>') {
            return Err(self.error_span(
                "invalid-tag",
                format!("Expected '>' to close opening tag <{}", name),
                begin,
            ));
        }

        let children = self.parse_message(nesting + 1, parent, true)?;

        let close_begin = self.position();
        if !self.starts_with("</") {
            return Err(self.error_span("unclosed-tag", format!("Unclosed tag <{}>", name), begin));
        }
        self.advance(2);
        let closing = self.parse_tag_name();
        if closing != name {
            return Err(self.error_span(
                "mismatched-closing-tag",
                format!("Expected </{}> but found </{}>", name, closing),
                close_begin,
            ));
        }
        self.skip_ws();
        if !self.eat_char('>') {
            return Err(self.error_span(
                "invalid-tag",
                format!("Expected '>' to close closing tag </{}", name),
                close_begin,
            ));
        }

        Ok(Element::Tag {
            value: name,
            children,
        })
    }

    // ── Arguments ───────────────────────────────────────────────────

    /// Argument names and selectors run until whitespace or ICU syntax.
    fn parse_identifier(&mut self) -> String {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() || is_pattern_syntax(ch) {
                break;
            }
            self.advance(ch.len_utf8());
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_argument(&mut self, nesting: usize) -> Result<Element, ParseError> {
        let begin = self.position();
        self.advance(1);
        self.skip_ws();

        match self.peek_char() {
            None => {
                return Err(self.error_span(
                    "expect-argument-closing-brace",
                    "Unterminated argument".to_string(),
                    begin,
                ))
            }
            Some('}') => {
                self.advance(1);
                return Err(self.error_span("empty-argument", "Empty argument".to_string(), begin));
            }
            _ => {}
        }

        let name = self.parse_identifier();
        if name.is_empty() {
            return Err(self.error_span(
                "malformed-argument",
                "Expected an argument name".to_string(),
                begin,
            ));
        }
        self.skip_ws();

        if self.eat_char('}') {
            return Ok(Element::Argument { value: name });
        }
        self.expect_char(',', "expect-argument-closing-brace", begin)?;
        self.skip_ws();

        let type_begin = self.position();
        let arg_type = self.parse_identifier();
        self.skip_ws();

        match arg_type.as_str() {
            "number" => {
                let style = self.parse_simple_style(begin)?;
                Ok(Element::Number { value: name, style })
            }
            "date" | "time" => {
                let style = self
                    .parse_simple_style(begin)?
                    .and_then(|s| DateTimeStyle::parse(&s));
                if arg_type == "date" {
                    Ok(Element::Date { value: name, style })
                } else {
                    Ok(Element::Time { value: name, style })
                }
            }
            "select" => {
                let options = self.parse_options(nesting, ParentArg::Select, &name, begin)?;
                Ok(Element::Select {
                    value: name,
                    options,
                })
            }
            "plural" | "selectordinal" => {
                let plural_type = if arg_type == "plural" {
                    PluralType::Cardinal
                } else {
                    PluralType::Ordinal
                };
                self.expect_char(',', "expect-options", begin)?;
                self.skip_ws();
                let offset = self.parse_offset()?;
                let options = self.parse_option_list(nesting, ParentArg::Plural, &name, begin)?;
                Ok(Element::Plural {
                    value: name,
                    plural_type,
                    offset,
                    options,
                })
            }
            _ => Err(self.error_span(
                "invalid-argument-type",
                format!("Unknown argument type \"{}\"", arg_type),
                type_begin,
            )),
        }
    }

    /// Optional `, style` after `number`, `date` or `time`, then `}`.
    /// Skeletons (`::...`) are kept verbatim.
    fn parse_simple_style(&mut self, begin: Position) -> Result<Option<String>, ParseError> {
        if self.eat_char('}') {
            return Ok(None);
        }
        self.expect_char(',', "expect-argument-closing-brace", begin)?;

        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if ch == '}' || ch == '{' {
                break;
            }
            self.advance(ch.len_utf8());
        }
        let style = self.input[start..self.pos].trim().to_string();
        if style.is_empty() {
            return Err(self.error_span(
                "expect-argument-style",
                "Expected an argument style".to_string(),
                begin,
            ));
        }
        self.expect_char('}', "expect-argument-closing-brace", begin)?;
        Ok(Some(style))
    }

    /// `offset:N` at the start of a plural option list.
    fn parse_offset(&mut self) -> Result<i64, ParseError> {
        if !self.starts_with("offset:") {
            return Ok(0);
        }
        let begin = self.position();
        self.advance("offset:".len());
        self.skip_ws();
        let digits = self.parse_signed_integer();
        let offset = digits.parse::<i64>().map_err(|_| {
            self.error_span(
                "invalid-offset",
                format!("Invalid plural offset \"{}\"", digits),
                begin,
            )
        })?;
        self.skip_ws();
        Ok(offset)
    }

    fn parse_signed_integer(&mut self) -> String {
        let start = self.pos;
        if matches!(self.peek_char(), Some('-') | Some('+')) {
            self.advance(1);
        }
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() {
                self.advance(1);
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_options(
        &mut self,
        nesting: usize,
        parent: ParentArg,
        name: &str,
        begin: Position,
    ) -> Result<Options, ParseError> {
        self.expect_char(',', "expect-options", begin)?;
        self.skip_ws();
        self.parse_option_list(nesting, parent, name, begin)
    }

    /// `key {message} key {message} ... }`, consuming the closing brace.
    fn parse_option_list(
        &mut self,
        nesting: usize,
        parent: ParentArg,
        name: &str,
        begin: Position,
    ) -> Result<Options, ParseError> {
        let mut options = Options::new();

        loop {
            self.skip_ws();
            match self.peek_char() {
                None => {
                    return Err(self.error_span(
                        "expect-argument-closing-brace",
                        format!("Unterminated options for \"{}\"", name),
                        begin,
                    ))
                }
                Some('}') => break,
                _ => {}
            }

            let key_begin = self.position();
            let key = if parent == ParentArg::Plural && self.eat_char('=') {
                let digits = self.parse_signed_integer();
                if digits.parse::<i64>().is_err() {
                    return Err(self.error_span(
                        "invalid-plural-selector",
                        format!("Invalid exact selector \"={}\"", digits),
                        key_begin,
                    ));
                }
                format!("={}", digits)
            } else {
                self.parse_identifier()
            };
            if key.is_empty() {
                return Err(self.error_point(
                    "expect-option-selector",
                    format!("Expected an option selector for \"{}\"", name),
                ));
            }
            if options.contains_key(&key) {
                return Err(self.error_span(
                    "duplicate-option",
                    format!("Duplicate option \"{}\" for \"{}\"", key, name),
                    key_begin,
                ));
            }

            self.skip_ws();
            let body_begin = self.position();
            self.expect_char('{', "expect-option-body", key_begin)?;
            let body = self.parse_message(nesting + 1, parent, false)?;
            self.expect_char('}', "expect-option-closing-brace", body_begin)?;

            options.insert(key, body);
        }

        if options.is_empty() {
            return Err(self.error_span(
                "expect-options",
                format!("Expected at least one option for \"{}\"", name),
                begin,
            ));
        }
        if self.options.requires_other_clause && !options.contains_key(OTHER) {
            return Err(self.error_span(
                "missing-other-clause",
                format!("Argument \"{}\" requires an \"other\" option", name),
                begin,
            ));
        }

        self.expect_char('}', "expect-argument-closing-brace", begin)?;
        Ok(options)
    }
}

/// Append text, merging with a preceding literal.
fn push_literal(elements: &mut Vec<Element>, text: String) {
    if text.is_empty() {
        return;
    }
    if let Some(Element::Literal { value }) = elements.last_mut() {
        value.push_str(&text);
    } else {
        elements.push(Element::Literal { value: text });
    }
}

fn is_alpha(ch: char) -> bool {
    ch.is_ascii_alphabetic()
}

fn is_tag_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '-' | '.' | '_')
}

fn is_pattern_syntax(ch: char) -> bool {
    matches!(
        ch,
        '{' | '}' | ',' | '#' | '<' | '>' | '\'' | '=' | '|' | '"' | ':'
    )
}
