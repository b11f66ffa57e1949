//! Message syntax tree produced by the parser and consumed by the compilers.
//! Mirrors the upstream `MessageFormatElement` types.

use indexmap::IndexMap;

/// Branches of a select or plural element, keyed by option selector.
/// Insertion order is significant: it is the branch precedence.
pub type Options = IndexMap<String, Vec<Element>>;

/// Key of the fallback branch in select and plural options.
pub const OTHER: &str = "other";

/// Predefined date/time styles accepted by `Intl.DateTimeFormat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeStyle {
    Short,
    Medium,
    Long,
    Full,
}

impl DateTimeStyle {
    pub fn parse(style: &str) -> Option<Self> {
        match style {
            "short" => Some(DateTimeStyle::Short),
            "medium" => Some(DateTimeStyle::Medium),
            "long" => Some(DateTimeStyle::Long),
            "full" => Some(DateTimeStyle::Full),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DateTimeStyle::Short => "short",
            DateTimeStyle::Medium => "medium",
            DateTimeStyle::Long => "long",
            DateTimeStyle::Full => "full",
        }
    }
}

/// `plural` is cardinal, `selectordinal` is ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluralType {
    Cardinal,
    Ordinal,
}

impl PluralType {
    /// The `type` option passed to `Intl.PluralRules`.
    pub fn as_str(self) -> &'static str {
        match self {
            PluralType::Cardinal => "cardinal",
            PluralType::Ordinal => "ordinal",
        }
    }
}

/// A single node of a parsed message.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// Plain text.
    Literal { value: String },
    /// `{name}`
    Argument { value: String },
    /// `{name, number}` or `{name, number, style}`
    Number { value: String, style: Option<String> },
    /// `{name, date}` or `{name, date, style}`
    Date {
        value: String,
        style: Option<DateTimeStyle>,
    },
    /// `{name, time}` or `{name, time, style}`
    Time {
        value: String,
        style: Option<DateTimeStyle>,
    },
    /// `<name>children</name>`
    Tag {
        value: String,
        children: Vec<Element>,
    },
    /// `{name, select, key {...} other {...}}`
    Select { value: String, options: Options },
    /// `{name, plural, offset:1 =0 {...} one {...} other {...}}`
    /// `{name, selectordinal, ...}` has `plural_type == Ordinal`.
    Plural {
        value: String,
        plural_type: PluralType,
        offset: i64,
        options: Options,
    },
    /// `#` inside a plural branch.
    Pound,
}

impl Element {
    pub fn literal(value: impl Into<String>) -> Self {
        Element::Literal {
            value: value.into(),
        }
    }

    pub fn argument(value: impl Into<String>) -> Self {
        Element::Argument {
            value: value.into(),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Element::Literal { .. })
    }

    /// The argument name this element binds, if any.
    pub fn argument_name(&self) -> Option<&str> {
        match self {
            Element::Argument { value }
            | Element::Number { value, .. }
            | Element::Date { value, .. }
            | Element::Time { value, .. }
            | Element::Tag { value, .. }
            | Element::Select { value, .. }
            | Element::Plural { value, .. } => Some(value),
            Element::Literal { .. } | Element::Pound => None,
        }
    }
}
