use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use num_bigint::{BigInt, BigUint};
use serde_json::{json, Value};
use std::io::Write;
use uuid::Uuid;

use crate::engine::{Entry, Leaf};
use crate::reflect::{Kind, Reflect};
use crate::tabular::DbNull;
use crate::values::Decimal;

/// How entries are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One `{"address": .., "value": ..}` object per line
    #[default]
    JsonLines,
    /// One `address=value` line per entry; strings are written raw
    Text,
}

mode_names!(OutputFormat, "output format", {
    JsonLines => "jsonl",
    Text => "text",
});

/// Writes flattened entries to a single output
pub struct EntryWriter<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl<W: Write> EntryWriter<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        EntryWriter { writer, format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn write_entry(&mut self, entry: &Entry<'_>) -> Result<()> {
        let value = leaf_to_json(&entry.value);
        match self.format {
            OutputFormat::JsonLines => {
                let line = json!({ "address": entry.address, "value": value });
                let json = serde_json::to_string(&line).context("Failed to serialize entry")?;
                writeln!(self.writer, "{}", json).context("Failed to write entry")?;
            }
            OutputFormat::Text => {
                let text = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                writeln!(self.writer, "{}={}", entry.address, text)
                    .context("Failed to write entry")?;
            }
        }
        Ok(())
    }

    /// Writes entries as they are produced. Stops at the first flattening error,
    /// after the entries before it have been written.
    pub fn write_entries<'a, I>(&mut self, entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = crate::Result<Entry<'a>>>,
    {
        let mut written = 0;
        for entry in entries {
            let entry = entry.context("Failed to flatten value")?;
            self.write_entry(&entry)?;
            written += 1;
        }
        Ok(written)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush writer")
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// JSON form of a leaf: well-known leaf types map to their natural JSON value,
/// anything else to its `Debug` text.
pub fn leaf_to_json(leaf: &Leaf<'_>) -> Value {
    match leaf.get() {
        Some(value) => reflect_to_json(value),
        None => Value::Null,
    }
}

fn reflect_to_json(value: &dyn Reflect) -> Value {
    macro_rules! serialize_as {
        ($($ty:ty),+ $(,)?) => {
            $(
                if let Some(v) = value.downcast_ref::<$ty>() {
                    return serde_json::to_value(v).unwrap_or(Value::Null);
                }
            )+
        };
    }

    macro_rules! display_as {
        ($($ty:ty),+ $(,)?) => {
            $(
                if let Some(v) = value.downcast_ref::<$ty>() {
                    return Value::String(v.to_string());
                }
            )+
        };
    }

    if matches!(value.kind(), Kind::Null) || value.is::<DbNull>() {
        return Value::Null;
    }
    if let Some(v) = value.downcast_ref::<Value>() {
        return v.clone();
    }
    if let Some(bytes) = value.downcast_ref::<Vec<u8>>() {
        return Value::String(STANDARD.encode(bytes));
    }

    serialize_as!(
        String,
        &'static str,
        char,
        bool,
        i8,
        i16,
        i32,
        i64,
        isize,
        u8,
        u16,
        u32,
        u64,
        usize,
        f32,
        f64,
        Decimal,
        NaiveDate,
        NaiveTime,
        NaiveDateTime,
        DateTime<Utc>,
        DateTime<FixedOffset>,
        DateTime<Local>,
        Uuid,
    );
    display_as!(i128, u128, BigInt, BigUint, chrono::Duration);

    Value::String(format!("{:?}", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn text(entries: Vec<Entry<'_>>) -> String {
        let mut writer = EntryWriter::new(Vec::new(), OutputFormat::Text);
        writer.write_entries(entries.into_iter().map(Ok)).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_json_lines_output() {
        let mut buffer = Vec::new();
        let mut writer = EntryWriter::new(&mut buffer, OutputFormat::JsonLines);
        let written = writer
            .write_entries(vec![
                Ok(Entry::owned("a.b".to_string(), 2.5f64)),
                Ok(Entry::null("a.c".to_string())),
            ])
            .unwrap();
        assert_eq!(written, 2);

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(
            output,
            "{\"address\":\"a.b\",\"value\":2.5}\n{\"address\":\"a.c\",\"value\":null}\n"
        );
    }

    #[test]
    fn test_text_output_writes_strings_raw() {
        let output = text(vec![
            Entry::owned("name".to_string(), "Ada".to_string()),
            Entry::owned("ok".to_string(), true),
            Entry::owned("n".to_string(), 1.0f64),
        ]);
        assert_eq!(output, "name=Ada\nok=true\nn=1.0\n");
    }

    #[test]
    fn test_stops_at_first_error() {
        let mut writer = EntryWriter::new(Vec::new(), OutputFormat::Text);
        let result = writer.write_entries(vec![
            Ok(Entry::owned("a".to_string(), 1i32)),
            Err(crate::FlattenError::duplicate_name("t", "[x]")),
            Ok(Entry::owned("b".to_string(), 2i32)),
        ]);
        assert!(result.is_err());
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), "a=1\n");
    }

    #[test]
    fn test_leaf_conversions() {
        let decimal: Decimal = "1.50".parse().unwrap();
        assert_eq!(leaf_to_json(&Leaf::owned(decimal)), json!("1.50"));
        assert_eq!(leaf_to_json(&Leaf::owned(vec![1u8, 2, 3])), json!("AQID"));
        assert_eq!(leaf_to_json(&Leaf::owned(DbNull)), Value::Null);
        assert_eq!(leaf_to_json(&Leaf::owned(BigInt::from(-7))), json!("-7"));

        let stamp = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            leaf_to_json(&Leaf::owned(stamp)),
            json!("2024-01-02T03:04:05Z")
        );
    }

    #[test]
    fn test_unknown_leaf_uses_debug_text() {
        #[derive(Debug)]
        struct Opaque(u8);
        crate::reflect_value!(Opaque);

        assert_eq!(leaf_to_json(&Leaf::owned(Opaque(4))), json!("Opaque(4)"));
    }

    #[test]
    fn test_format_names() {
        assert_eq!("jsonl".parse::<OutputFormat>().unwrap(), OutputFormat::JsonLines);
        assert_eq!(OutputFormat::Text.to_string(), "text");
    }
}
