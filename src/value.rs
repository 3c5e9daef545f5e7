use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Deserializer, de};
use std::sync::OnceLock;

/// A number that keeps the integer/float distinction of the source document,
/// so `42` is shown as `42` and `42.5` keeps its fraction.
#[derive(Debug, Clone, PartialEq)]
pub enum OdfNumber {
    I64(i64),
    U64(u64),
    F64(f64),
}

impl OdfNumber {
    fn write_text(&self, out: &mut String) {
        match self {
            OdfNumber::I64(v) => out.push_str(&v.to_string()),
            OdfNumber::U64(v) => out.push_str(&v.to_string()),
            OdfNumber::F64(v) => {
                if v.is_nan() {
                    out.push_str("NaN");
                } else if v.is_infinite() {
                    out.push_str(if v.is_sign_negative() {
                        "-Infinity"
                    } else {
                        "Infinity"
                    });
                } else if v.fract() == 0.0 && v.abs() < 1e15 {
                    // Whole floats print without a trailing ".0", like the web viewer did.
                    out.push_str(&(*v as i64).to_string());
                } else {
                    let mut buf = ryu::Buffer::new();
                    out.push_str(buf.format(*v));
                }
            }
        }
    }
}

/// A value in an ODF dataset document (JSON, parsed with the JSON5 superset).
/// Objects keep their source key order; category, record and property-group
/// order all derive from it.
#[derive(Debug, Clone, PartialEq)]
pub enum OdfValue {
    Null,
    Bool(bool),
    Number(OdfNumber),
    String(String),
    Array(Vec<OdfValue>),
    Object(IndexMap<String, OdfValue>),
}

impl OdfValue {
    pub fn as_object(&self) -> Option<&IndexMap<String, OdfValue>> {
        match self {
            OdfValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut IndexMap<String, OdfValue>> {
        match self {
            OdfValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[OdfValue]> {
        match self {
            OdfValue::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OdfValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&OdfValue> {
        self.as_object().and_then(|m| m.get(key))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            OdfValue::Null => "null",
            OdfValue::Bool(_) => "bool",
            OdfValue::Number(_) => "number",
            OdfValue::String(_) => "string",
            OdfValue::Array(_) => "array",
            OdfValue::Object(_) => "object",
        }
    }

    pub fn parse_json5(text: &str) -> anyhow::Result<OdfValue> {
        Ok(json5::from_str::<OdfValue>(text)?)
    }

    /// Single-line rendering used for previews and filter matching.
    pub fn to_compact_text(&self) -> String {
        let mut out = String::new();
        self.write_json(&mut out, 0, false);
        out
    }

    /// Multi-line rendering with 2-space indentation, used to show structured
    /// values verbatim.
    pub fn to_pretty_text(&self) -> String {
        let mut out = String::new();
        self.write_json(&mut out, 0, true);
        out
    }

    fn write_json(&self, out: &mut String, indent: usize, pretty: bool) {
        match self {
            OdfValue::Null => out.push_str("null"),
            OdfValue::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
            OdfValue::Number(n) => n.write_text(out),
            OdfValue::String(s) => write_escaped_string(out, s),
            OdfValue::Array(values) => {
                out.push('[');
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    if pretty {
                        out.push('\n');
                        out.push_str(&" ".repeat(indent + 2));
                    }
                    v.write_json(out, indent + 2, pretty);
                }
                if pretty && !values.is_empty() {
                    out.push('\n');
                    out.push_str(&" ".repeat(indent));
                }
                out.push(']');
            }
            OdfValue::Object(map) => {
                out.push('{');
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    if pretty {
                        out.push('\n');
                        out.push_str(&" ".repeat(indent + 2));
                    }
                    write_escaped_string(out, k);
                    out.push(':');
                    if pretty {
                        out.push(' ');
                    }
                    v.write_json(out, indent + 2, pretty);
                }
                if pretty && !map.is_empty() {
                    out.push('\n');
                    out.push_str(&" ".repeat(indent));
                }
                out.push('}');
            }
        }
    }
}

fn write_escaped_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write as _;
                write!(out, "\\u{:04x}", c as u32).ok();
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// How a property value is shown in a record card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyDisplay {
    /// Plain text (quotes already stripped).
    Text(String),
    /// Numeric literal, optionally followed by a unit suffix (`12.5`, `2m`, `1e-3`).
    Number { value: String, unit: Option<String> },
    /// A `.wav` file name that can be played from the audio library.
    Audio(String),
    /// Nested object/array, pretty-printed verbatim.
    Structured(String),
}

impl PropertyDisplay {
    pub fn text(&self) -> String {
        match self {
            PropertyDisplay::Text(s) | PropertyDisplay::Audio(s) | PropertyDisplay::Structured(s) => {
                s.clone()
            }
            PropertyDisplay::Number { value, unit: None } => value.clone(),
            PropertyDisplay::Number {
                value,
                unit: Some(unit),
            } => format!("{value}{unit}"),
        }
    }
}

fn numeric_literal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(-?\d*\.?\d+(?:[eE][-+]?\d+)?)\s*([A-Za-z%]+)?$")
            .expect("numeric literal pattern is valid")
    })
}

/// Strip one pair of surrounding double quotes, as ODF string literals are
/// stored with their quotes.
pub fn unquote(raw: &str) -> &str {
    raw.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw)
}

pub fn is_audio_reference(text: &str) -> bool {
    text.to_ascii_lowercase().ends_with(".wav")
}

/// Classify a raw string property value for display.
pub fn classify(raw: &str) -> PropertyDisplay {
    let text = unquote(raw);
    if is_audio_reference(text) {
        return PropertyDisplay::Audio(text.to_string());
    }
    if let Some(caps) = numeric_literal_re().captures(text) {
        return PropertyDisplay::Number {
            value: caps[1].to_string(),
            unit: caps.get(2).map(|m| m.as_str().to_string()),
        };
    }
    PropertyDisplay::Text(text.to_string())
}

pub fn classify_value(value: &OdfValue) -> PropertyDisplay {
    match value {
        OdfValue::String(s) => classify(s),
        OdfValue::Number(_) => PropertyDisplay::Number {
            value: value.to_compact_text(),
            unit: None,
        },
        OdfValue::Null | OdfValue::Bool(_) => PropertyDisplay::Text(value.to_compact_text()),
        OdfValue::Array(_) | OdfValue::Object(_) => {
            PropertyDisplay::Structured(value.to_pretty_text())
        }
    }
}

impl<'de> Deserialize<'de> for OdfValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> de::Visitor<'de> for ValueVisitor {
            type Value = OdfValue;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a JSON value")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(OdfValue::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(OdfValue::Null)
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(OdfValue::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(OdfValue::Number(OdfNumber::I64(v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                // Integers in i64 range compare equal however the parser reported them.
                Ok(OdfValue::Number(match i64::try_from(v) {
                    Ok(v) => OdfNumber::I64(v),
                    Err(_) => OdfNumber::U64(v),
                }))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(OdfValue::Number(OdfNumber::F64(v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(OdfValue::String(v.to_owned()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(OdfValue::String(v))
            }

            fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut values = Vec::new();
                while let Some(value) = seq.next_element::<OdfValue>()? {
                    values.push(value);
                }
                Ok(OdfValue::Array(values))
            }

            fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut values = IndexMap::new();
                while let Some((key, value)) = map.next_entry::<String, OdfValue>()? {
                    values.insert(key, value);
                }
                Ok(OdfValue::Object(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::{OdfNumber, OdfValue, PropertyDisplay, classify, classify_value};

    #[test]
    fn parse_keeps_key_order_and_number_kinds() {
        let v = OdfValue::parse_json5(r#"{ "z": 1, "a": 2.5, "m": "x" }"#).unwrap();
        let keys: Vec<_> = v.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["z", "a", "m"]);
        assert_eq!(v.get("z"), Some(&OdfValue::Number(OdfNumber::I64(1))));
        assert_eq!(v.get("a"), Some(&OdfValue::Number(OdfNumber::F64(2.5))));
    }

    #[test]
    fn only_integers_beyond_i64_stay_unsigned() {
        use serde::Deserialize;
        use serde::de::IntoDeserializer;
        use serde::de::value::{Error as DeError, U64Deserializer};

        let v = OdfValue::parse_json5("[7, -7]").unwrap();
        assert_eq!(
            v.as_array().unwrap(),
            [
                OdfValue::Number(OdfNumber::I64(7)),
                OdfValue::Number(OdfNumber::I64(-7)),
            ]
        );

        let small: U64Deserializer<DeError> = 7_u64.into_deserializer();
        assert_eq!(
            OdfValue::deserialize(small).unwrap(),
            OdfValue::Number(OdfNumber::I64(7))
        );
        let big: U64Deserializer<DeError> = u64::MAX.into_deserializer();
        assert_eq!(
            OdfValue::deserialize(big).unwrap(),
            OdfValue::Number(OdfNumber::U64(u64::MAX))
        );
    }

    #[test]
    fn pretty_text_matches_two_space_layout() {
        let v = OdfValue::parse_json5(r#"{ "a": [1, 2], "b": {} }"#).unwrap();
        assert_eq!(
            v.to_pretty_text(),
            "{\n  \"a\": [\n    1,\n    2\n  ],\n  \"b\": {}\n}"
        );
    }

    #[test]
    fn whole_floats_drop_fraction() {
        let v = OdfValue::Number(OdfNumber::F64(3.0));
        assert_eq!(v.to_compact_text(), "3");
        let v = OdfValue::Number(OdfNumber::F64(0.25));
        assert_eq!(v.to_compact_text(), "0.25");
    }

    #[test]
    fn classify_strips_quotes_before_detection() {
        assert_eq!(
            classify("\"Scout\""),
            PropertyDisplay::Text("Scout".to_string())
        );
        assert_eq!(
            classify("\"fire.WAV\""),
            PropertyDisplay::Audio("fire.WAV".to_string())
        );
        assert_eq!(
            classify("\"12.5\""),
            PropertyDisplay::Number {
                value: "12.5".to_string(),
                unit: None
            }
        );
    }

    #[test]
    fn classify_numbers_with_units_and_exponents() {
        assert_eq!(
            classify("-.5"),
            PropertyDisplay::Number {
                value: "-.5".to_string(),
                unit: None
            }
        );
        assert_eq!(
            classify("2.5e-3"),
            PropertyDisplay::Number {
                value: "2.5e-3".to_string(),
                unit: None
            }
        );
        assert_eq!(
            classify("40m"),
            PropertyDisplay::Number {
                value: "40".to_string(),
                unit: Some("m".to_string())
            }
        );
        assert_eq!(classify("1.2.3"), PropertyDisplay::Text("1.2.3".to_string()));
    }

    #[test]
    fn classify_audio_references() {
        assert_eq!(
            classify("\"avtank01.WAV\""),
            PropertyDisplay::Audio("avtank01.WAV".to_string())
        );
    }

    #[test]
    fn classify_value_renders_structured_verbatim() {
        let v = OdfValue::parse_json5("[1, 2]").unwrap();
        assert_eq!(
            classify_value(&v),
            PropertyDisplay::Structured("[\n  1,\n  2\n]".to_string())
        );
        assert_eq!(
            classify_value(&OdfValue::Bool(true)),
            PropertyDisplay::Text("true".to_string())
        );
    }
}
