use crate::event::{LogEvent, PropertyValue, Scalar};

/// Error returned when a formatting call is made without an output sink.
///
/// This is the only validated precondition of the formatter; every other
/// input is handled by total, defaulting logic.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("no output sink was provided for the formatted document")]
pub struct NullSinkError;

/// Projects a [`LogEvent`] into a compact JSON document for the telemetry
/// backend.
///
/// Two modes share one wire shape: [`format_data`](Self::format_data)
/// produces the fragment attached as a `data` field alongside separately
/// carried level/message metadata, while [`format`](Self::format) is meant
/// to stand alone as the full serialized event. The `"Properties"` key is
/// omitted entirely when the event has no properties, so an event with no
/// properties and no error renders as exactly `{}`.
///
/// Stateless; each call writes only to its own output buffer, so a single
/// formatter is safe to share across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDataFormatter;

impl JsonDataFormatter {
    pub fn new() -> JsonDataFormatter {
        JsonDataFormatter
    }

    /// Write the data-only document for `event` into `output`.
    ///
    /// **Returns**
    /// - `Ok(())` once the full document has been appended to the buffer.
    /// - `Err(NullSinkError)` if `output` is `None`; nothing is written.
    pub fn format_data(
        &self,
        event: &LogEvent,
        output: Option<&mut String>,
    ) -> Result<(), NullSinkError> {
        let out = output.ok_or(NullSinkError)?;
        write_document(event, out);
        Ok(())
    }

    /// Write the full-event document for `event` into `output`.
    ///
    /// The output is byte-for-byte the shape produced by
    /// [`format_data`](Self::format_data); the separate entry point exists so
    /// callers can state whether the document stands alone or rides along as
    /// supplementary data.
    pub fn format(
        &self,
        event: &LogEvent,
        output: Option<&mut String>,
    ) -> Result<(), NullSinkError> {
        let out = output.ok_or(NullSinkError)?;
        write_document(event, out);
        Ok(())
    }
}

/// Render a property mapping as a JSON object literal, keys in insertion
/// order.
pub fn serialize_properties(
    properties: &[(String, PropertyValue)],
    output: Option<&mut String>,
) -> Result<(), NullSinkError> {
    let out = output.ok_or(NullSinkError)?;
    out.push('{');
    write_property_pairs(properties, out);
    out.push('}');
    Ok(())
}

fn write_document(event: &LogEvent, out: &mut String) {
    out.push('{');

    // Single comma-insertion flag shared by both sections.
    let mut delim = "";

    if !event.properties.is_empty() {
        out.push_str("\"Properties\":{");
        write_property_pairs(&event.properties, out);
        out.push('}');
        delim = ",";
    }

    if let Some(error) = &event.error {
        out.push_str(delim);
        out.push_str("\"Exception\":");
        out.push_str(
            &serde_json::to_string(error).unwrap_or_else(|_| "{}".to_string()),
        );
    }

    out.push('}');
}

fn write_property_pairs(properties: &[(String, PropertyValue)], out: &mut String) {
    for (i, (name, value)) in properties.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&json_string(name));
        out.push(':');
        write_value(value, out);
    }
}

pub(crate) fn write_value(value: &PropertyValue, out: &mut String) {
    match value {
        PropertyValue::Scalar(scalar) => write_scalar(scalar, out),
        PropertyValue::Sequence(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        PropertyValue::Dictionary(entries) => {
            out.push('{');
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&json_string(&dictionary_key(key)));
                out.push(':');
                write_value(value, out);
            }
            out.push('}');
        }
        PropertyValue::Structure { fields, .. } => {
            // The type tag is deliberately not part of the rendering.
            out.push('{');
            for (i, (name, value)) in fields.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&json_string(name));
                out.push(':');
                write_value(value, out);
            }
            out.push('}');
        }
    }
}

fn write_scalar(scalar: &Scalar, out: &mut String) {
    match scalar {
        Scalar::Null => out.push_str("null"),
        Scalar::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Scalar::Int(i) => out.push_str(&i.to_string()),
        Scalar::UInt(u) => out.push_str(&u.to_string()),
        // serde_json renders non-finite floats as null.
        Scalar::Float(f) => out.push_str(&serde_json::Value::from(*f).to_string()),
        Scalar::String(s) => out.push_str(&json_string(s)),
    }
}

/// Bare textual form of a scalar, used for dictionary keys and rendered
/// message holes.
pub(crate) fn scalar_text(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Null => "null".to_string(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Int(i) => i.to_string(),
        Scalar::UInt(u) => u.to_string(),
        Scalar::Float(f) => serde_json::Value::from(*f).to_string(),
        Scalar::String(s) => s.clone(),
    }
}

pub(crate) fn value_to_json(value: &PropertyValue) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

fn dictionary_key(key: &PropertyValue) -> String {
    match key {
        PropertyValue::Scalar(scalar) => scalar_text(scalar),
        structured => value_to_json(structured),
    }
}

fn json_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ErrorInfo, Level};

    fn data_of(event: &LogEvent) -> String {
        let mut out = String::new();
        JsonDataFormatter::new()
            .format_data(event, Some(&mut out))
            .expect("sink provided");
        out
    }

    #[test]
    fn empty_event_renders_as_empty_object() {
        let event = LogEvent::new(Level::Information, "nothing attached");
        assert_eq!(data_of(&event), "{}");
    }

    #[test]
    fn properties_keep_insertion_order() {
        let event = LogEvent::new(Level::Information, "ordered")
            .with_property("zulu", 1)
            .with_property("alpha", 2)
            .with_property("mike", 3);
        assert_eq!(
            data_of(&event),
            "{\"Properties\":{\"zulu\":1,\"alpha\":2,\"mike\":3}}"
        );
    }

    #[test]
    fn both_modes_produce_identical_documents() {
        let event = LogEvent::new(Level::Error, "compare")
            .with_property("iteration", 5)
            .with_error(ErrorInfo::new("ApplicationException", "Test error"));

        let mut data = String::new();
        let mut full = String::new();
        let formatter = JsonDataFormatter::new();
        formatter.format_data(&event, Some(&mut data)).expect("sink");
        formatter.format(&event, Some(&mut full)).expect("sink");
        assert_eq!(data, full);
    }

    #[test]
    fn exception_only_document_has_no_leading_comma() {
        let event = LogEvent::new(Level::Error, "boom")
            .with_error(ErrorInfo::new("ApplicationException", "Test error"));
        assert_eq!(
            data_of(&event),
            "{\"Exception\":{\"Type\":\"ApplicationException\",\"Message\":\"Test error\"}}"
        );
    }

    #[test]
    fn properties_and_exception_are_separated_by_a_single_comma() {
        let event = LogEvent::new(Level::Error, "boom")
            .with_property("iteration", 5)
            .with_error(ErrorInfo::new("ApplicationException", "Test error"));
        assert_eq!(
            data_of(&event),
            "{\"Properties\":{\"iteration\":5},\
             \"Exception\":{\"Type\":\"ApplicationException\",\"Message\":\"Test error\"}}"
        );
    }

    #[test]
    fn structure_fields_are_emitted_without_the_type_tag() {
        let event = LogEvent::new(Level::Information, "structured").with_property(
            "myobject",
            PropertyValue::structure(
                "AnonymousType",
                vec![("a".to_string(), 1.into()), ("b".to_string(), "x".into())],
            ),
        );
        assert_eq!(
            data_of(&event),
            "{\"Properties\":{\"myobject\":{\"a\":1,\"b\":\"x\"}}}"
        );
    }

    #[test]
    fn sequences_preserve_element_order() {
        let event = LogEvent::new(Level::Information, "seq").with_property(
            "values",
            PropertyValue::Sequence(vec![3.into(), 1.into(), 2.into()]),
        );
        assert_eq!(data_of(&event), "{\"Properties\":{\"values\":[3,1,2]}}");
    }

    #[test]
    fn dictionary_keys_are_stringified() {
        let event = LogEvent::new(Level::Information, "dict").with_property(
            "lookup",
            PropertyValue::Dictionary(vec![
                (5.into(), "five".into()),
                (true.into(), "yes".into()),
                ("plain".into(), 0.into()),
            ]),
        );
        assert_eq!(
            data_of(&event),
            "{\"Properties\":{\"lookup\":{\"5\":\"five\",\"true\":\"yes\",\"plain\":0}}}"
        );
    }

    #[test]
    fn strings_are_json_escaped() {
        let event = LogEvent::new(Level::Information, "escape")
            .with_property("text", "line\nwith \"quotes\"");
        assert_eq!(
            data_of(&event),
            "{\"Properties\":{\"text\":\"line\\nwith \\\"quotes\\\"\"}}"
        );
    }

    #[test]
    fn non_finite_floats_render_as_null() {
        let event = LogEvent::new(Level::Information, "nan")
            .with_property("bad", f64::NAN)
            .with_property("good", 1.5);
        assert_eq!(
            data_of(&event),
            "{\"Properties\":{\"bad\":null,\"good\":1.5}}"
        );
    }

    #[test]
    fn null_sink_is_rejected_before_any_write() {
        let event = LogEvent::new(Level::Error, "boom").with_property("iteration", 5);
        let formatter = JsonDataFormatter::new();
        assert_eq!(formatter.format_data(&event, None), Err(NullSinkError));
        assert_eq!(formatter.format(&event, None), Err(NullSinkError));
        assert_eq!(serialize_properties(&event.properties, None), Err(NullSinkError));
    }

    #[test]
    fn serialization_is_idempotent() {
        let event = LogEvent::new(Level::Error, "repeat")
            .with_property("iteration", 5)
            .with_property("name", "Emergency Broadcast")
            .with_error(ErrorInfo::new("ApplicationException", "Test error"));
        assert_eq!(data_of(&event), data_of(&event));
    }

    #[test]
    fn serialize_properties_renders_a_bare_object_fragment() {
        let properties = vec![
            ("a".to_string(), PropertyValue::from(1)),
            ("b".to_string(), PropertyValue::from("x")),
        ];
        let mut out = String::new();
        serialize_properties(&properties, Some(&mut out)).expect("sink");
        assert_eq!(out, "{\"a\":1,\"b\":\"x\"}");

        let mut empty = String::new();
        serialize_properties(&[], Some(&mut empty)).expect("sink");
        assert_eq!(empty, "{}");
    }

    #[test]
    fn nested_exception_chain_is_rendered() {
        let event = LogEvent::new(Level::Fatal, "cascade").with_error(
            ErrorInfo::new("OuterError", "outer failed")
                .with_inner(ErrorInfo::new("InnerError", "inner failed")),
        );
        assert_eq!(
            data_of(&event),
            "{\"Exception\":{\"Type\":\"OuterError\",\"Message\":\"outer failed\",\
             \"InnerException\":{\"Type\":\"InnerError\",\"Message\":\"inner failed\"}}}"
        );
    }
}
