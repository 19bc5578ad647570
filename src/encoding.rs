//! Byte-exact JSON encoding for license files.
//!
//! Signatures cover encoded bytes, so a license read from disk must encode back
//! to exactly what the issuer signed. Two rules make that hold:
//!
//! - Timestamps keep their UTC offset and are written as RFC 3339 with the
//!   fractional second trimmed of trailing zeros (`2026-03-01T09:15:30.1234+08:00`,
//!   `2026-03-01T01:15:30Z`). A zero offset is always written as `Z`.
//! - Strings escape `<`, `>`, `&`, U+2028 and U+2029 as `\uXXXX`.

use std::io;

use chrono::{DateTime, FixedOffset, Timelike};
use serde::Serialize;
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};
use serde_json::Serializer;

use crate::errors::{LicenseError, LicenseResult};

/// Render a timestamp the way license files store it.
pub fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    let mut out = ts.format("%Y-%m-%dT%H:%M:%S").to_string();

    // Leap seconds are carried as nanos >= 1e9.
    let nanos = ts.nanosecond() % 1_000_000_000;
    if nanos != 0 {
        let fraction = format!("{nanos:09}");
        out.push('.');
        out.push_str(fraction.trim_end_matches('0'));
    }

    let offset = ts.offset().local_minus_utc();
    if offset == 0 {
        out.push('Z');
    } else {
        let sign = if offset < 0 { '-' } else { '+' };
        let secs = offset.unsigned_abs();
        out.push_str(&format!("{sign}{:02}:{:02}", secs / 3600, secs % 3600 / 60));
    }
    out
}

/// Serde adapter for `DateTime<FixedOffset>` fields using [`format_timestamp`].
pub mod timestamp {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&text).map_err(serde::de::Error::custom)
    }
}

/// Wraps a JSON formatter and escapes HTML-significant characters in strings.
#[derive(Debug, Clone)]
pub struct HtmlSafe<F>(pub F);

impl<F: Formatter> Formatter for HtmlSafe<F> {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            let escaped = match c {
                '<' => "\\u003c",
                '>' => "\\u003e",
                '&' => "\\u0026",
                '\u{2028}' => "\\u2028",
                '\u{2029}' => "\\u2029",
                _ => continue,
            };
            writer.write_all(fragment[start..i].as_bytes())?;
            writer.write_all(escaped.as_bytes())?;
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }

    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_array(writer)
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_array(writer)
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_array_value(writer)
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object(writer)
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_object(writer)
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object_key(writer, first)
    }

    fn end_object_key<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_object_key(writer)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_object_value(writer)
    }
}

fn encode<T, F>(value: &T, formatter: F) -> LicenseResult<Vec<u8>>
where
    T: Serialize + ?Sized,
    F: Formatter,
{
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, HtmlSafe(formatter));
    value.serialize(&mut serializer)?;
    Ok(out)
}

/// Compact encoding; the form that gets signed.
pub fn to_compact_vec<T: Serialize + ?Sized>(value: &T) -> LicenseResult<Vec<u8>> {
    encode(value, CompactFormatter)
}

/// Two-space indented encoding; the form written to license files.
pub fn to_pretty_string<T: Serialize + ?Sized>(value: &T) -> LicenseResult<String> {
    let bytes = encode(value, PrettyFormatter::with_indent(b"  "))?;
    String::from_utf8(bytes).map_err(|e| LicenseError::SerializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn timestamp_trims_fraction_and_keeps_offset() {
        let ts = DateTime::parse_from_rfc3339("2026-03-01T09:15:30.123400000+08:00").unwrap();
        assert_eq!(format_timestamp(&ts), "2026-03-01T09:15:30.1234+08:00");

        let ts = DateTime::parse_from_rfc3339("2026-03-01T09:15:30-05:30").unwrap();
        assert_eq!(format_timestamp(&ts), "2026-03-01T09:15:30-05:30");

        let ts = DateTime::parse_from_rfc3339("2026-03-01T01:15:30.000000001+00:00").unwrap();
        assert_eq!(format_timestamp(&ts), "2026-03-01T01:15:30.000000001Z");
    }

    #[test]
    fn utc_timestamp_uses_z() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap().fixed_offset();
        assert_eq!(format_timestamp(&ts), "2026-01-02T03:04:05Z");
    }

    #[test]
    fn timestamp_text_survives_parse_and_format() {
        for text in [
            "2026-03-01T09:15:30.5+08:00",
            "2026-03-01T09:15:30.12345678Z",
            "1999-12-31T23:59:59.999999999-11:00",
        ] {
            let ts = DateTime::parse_from_rfc3339(text).unwrap();
            assert_eq!(format_timestamp(&ts), text);
        }
    }

    #[test]
    fn strings_escape_html_characters() {
        let value = json!({ "user": "R&D <lab>\u{2028}" });
        let bytes = to_compact_vec(&value).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"user":"R\u0026D \u003clab\u003e\u2028"}"#
        );
    }

    #[test]
    fn pretty_output_uses_two_space_indent() {
        let value = json!({ "a": [1], "b": null, "c": [] });
        let text = to_pretty_string(&value).unwrap();
        assert_eq!(text, "{\n  \"a\": [\n    1\n  ],\n  \"b\": null,\n  \"c\": []\n}");
    }

    #[test]
    fn standard_escapes_still_apply() {
        let bytes = to_compact_vec(&"line\n\"quoted\"").unwrap();
        assert_eq!(bytes, br#""line\n\"quoted\"""#);
    }
}
