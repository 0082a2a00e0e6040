use chrono::{DateTime, Utc};
use serde::Serialize;

/// Severity of a [`LogEvent`], ordered from least to most severe.
///
/// The enum is non-exhaustive so the wire contract can grow without a
/// breaking release; anything a consumer does not recognize should be
/// treated as [`Level::Information`].
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Verbose,
    Debug,
    Information,
    Warning,
    Error,
    Fatal,
}

impl Level {
    /// Parse a level from its name, case-insensitively.
    ///
    /// Unknown names fall back to [`Level::Information`], so configuration
    /// sources (env vars, DSN query strings) can never produce an invalid
    /// level.
    pub fn from_name(name: &str) -> Level {
        match name.to_ascii_lowercase().as_str() {
            "verbose" | "trace" => Level::Verbose,
            "debug" => Level::Debug,
            "warning" | "warn" => Level::Warning,
            "error" => Level::Error,
            "fatal" | "critical" => Level::Fatal,
            _ => Level::Information,
        }
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Level {
        match level {
            tracing::Level::TRACE => Level::Verbose,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::WARN => Level::Warning,
            tracing::Level::ERROR => Level::Error,
            _ => Level::Information,
        }
    }
}

/// Primitive leaf of a [`PropertyValue`] tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
}

/// A structured property value attached to a [`LogEvent`].
///
/// Values form a finite tree: construction by value makes cycles
/// unrepresentable, so recursive serialization always terminates.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Scalar(Scalar),
    /// Ordered list; element order is preserved in the JSON rendering.
    Sequence(Vec<PropertyValue>),
    /// Key/value entries; non-string keys are stringified when rendered.
    Dictionary(Vec<(PropertyValue, PropertyValue)>),
    /// A typed structure. The tag is kept for diagnostics but is not
    /// emitted in the JSON rendering.
    Structure {
        type_tag: Option<String>,
        fields: Vec<(String, PropertyValue)>,
    },
}

impl PropertyValue {
    pub fn structure(
        type_tag: impl Into<String>,
        fields: Vec<(String, PropertyValue)>,
    ) -> PropertyValue {
        PropertyValue::Structure {
            type_tag: Some(type_tag.into()),
            fields,
        }
    }
}

impl From<Scalar> for PropertyValue {
    fn from(scalar: Scalar) -> PropertyValue {
        PropertyValue::Scalar(scalar)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> PropertyValue {
        PropertyValue::Scalar(Scalar::String(value.to_string()))
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> PropertyValue {
        PropertyValue::Scalar(Scalar::String(value))
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> PropertyValue {
        PropertyValue::Scalar(Scalar::Bool(value))
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> PropertyValue {
        PropertyValue::Scalar(Scalar::Int(value))
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> PropertyValue {
        PropertyValue::Scalar(Scalar::Int(value as i64))
    }
}

impl From<u64> for PropertyValue {
    fn from(value: u64) -> PropertyValue {
        PropertyValue::Scalar(Scalar::UInt(value))
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> PropertyValue {
        PropertyValue::Scalar(Scalar::Float(value))
    }
}

/// Serializable description of an error and its cause chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorInfo {
    #[serde(rename = "Type")]
    pub type_name: String,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "StackTrace", skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    #[serde(rename = "InnerException", skip_serializing_if = "Option::is_none")]
    pub inner: Option<Box<ErrorInfo>>,
}

impl ErrorInfo {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> ErrorInfo {
        ErrorInfo {
            type_name: type_name.into(),
            message: message.into(),
            stack_trace: None,
            inner: None,
        }
    }

    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> ErrorInfo {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    pub fn with_inner(mut self, inner: ErrorInfo) -> ErrorInfo {
        self.inner = Some(Box::new(inner));
        self
    }

    /// Build an [`ErrorInfo`] from any error, walking its `source()` chain
    /// into nested inner errors.
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> ErrorInfo {
        ErrorInfo {
            type_name: error_type_name(error),
            message: error.to_string(),
            stack_trace: None,
            inner: error.source().map(|source| Box::new(ErrorInfo::from_error(source))),
        }
    }
}

/// Best-effort type name for a `dyn Error`: the head token of its `Debug`
/// rendering, which for derived errors is the type or variant name.
fn error_type_name(error: &(dyn std::error::Error + 'static)) -> String {
    let debug = format!("{:?}", error);
    let head: String = debug
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if head.is_empty() {
        "Error".to_string()
    } else {
        head
    }
}

/// A structured log event as handed to the sink by the logging front end.
///
/// Properties keep their insertion order; serialization never sorts them.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message_template: String,
    pub properties: Vec<(String, PropertyValue)>,
    pub error: Option<ErrorInfo>,
}

impl LogEvent {
    pub fn new(level: Level, message_template: impl Into<String>) -> LogEvent {
        LogEvent {
            timestamp: Utc::now(),
            level,
            message_template: message_template.into(),
            properties: Vec::new(),
            error: None,
        }
    }

    pub fn with_property(
        mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> LogEvent {
        self.properties.push((name.into(), value.into()));
        self
    }

    pub fn with_error(mut self, error: ErrorInfo) -> LogEvent {
        self.error = Some(error);
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Render the message template, substituting `{name}` holes from the
    /// event's properties.
    ///
    /// String scalars are rendered quoted, other scalars as bare text and
    /// structured values as their JSON form. Destructuring hints (`{@user}`,
    /// `{$user}`) and format/alignment suffixes (`{count:000}`, `{name,10}`)
    /// are accepted and ignored for the lookup. `{{` and `}}` escape literal
    /// braces. Holes with no matching property are emitted verbatim.
    pub fn render_message(&self) -> String {
        let mut out = String::with_capacity(self.message_template.len());
        let mut rest = self.message_template.as_str();

        while let Some(open) = rest.find('{') {
            push_literal(&rest[..open], &mut out);
            let after = &rest[open + 1..];
            if let Some(stripped) = after.strip_prefix('{') {
                out.push('{');
                rest = stripped;
                continue;
            }
            match after.find('}') {
                Some(close) => {
                    let hole = &after[..close];
                    match self.property(hole_name(hole)) {
                        Some(value) => render_hole(value, &mut out),
                        None => {
                            out.push('{');
                            out.push_str(hole);
                            out.push('}');
                        }
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        push_literal(rest, &mut out);
        out
    }
}

/// Strip destructuring hints and format/alignment suffixes from a hole.
fn hole_name(hole: &str) -> &str {
    let end = hole
        .find(|c| c == ':' || c == ',')
        .unwrap_or(hole.len());
    hole[..end].trim_start_matches(|c| c == '@' || c == '$')
}

fn push_literal(text: &str, out: &mut String) {
    // "}}" escapes to "}" in literal text; "{{" never reaches here.
    let mut rest = text;
    while let Some(pos) = rest.find("}}") {
        out.push_str(&rest[..pos]);
        out.push('}');
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
}

fn render_hole(value: &PropertyValue, out: &mut String) {
    match value {
        PropertyValue::Scalar(Scalar::String(s)) => {
            out.push('"');
            out.push_str(s);
            out.push('"');
        }
        PropertyValue::Scalar(scalar) => out.push_str(&crate::formatter::scalar_text(scalar)),
        structured => out.push_str(&crate::formatter::value_to_json(structured)),
    }
}
