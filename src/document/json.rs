//! Flattening of JSON documents held as `serde_json::Value`.

use std::sync::Arc;

use base64::Engine as _;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Number, Value};
use tracing::debug;
use uuid::Uuid;

use crate::address;
use crate::engine::{empty, single, Entries, Entry, Flatten, Handler, Leaf};
use crate::error::{FlattenError, Result};
use crate::reflect::Reflect;
use crate::values::Decimal;

/// How JSON numbers are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberMode {
    #[default]
    F64,
    F32,
    Decimal,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    /// Delegate to the handler's number extraction function.
    Custom,
}

mode_names!(NumberMode, "number mode", {
    F64 => "f64",
    F32 => "f32",
    Decimal => "decimal",
    I8 => "i8",
    I16 => "i16",
    I32 => "i32",
    I64 => "i64",
    U8 => "u8",
    U16 => "u16",
    U32 => "u32",
    U64 => "u64",
    Custom => "custom",
});

/// How JSON strings are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringMode {
    #[default]
    String,
    /// A date and time without offset (`NaiveDateTime`).
    DateTime,
    /// A date and time with its UTC offset (`DateTime<FixedOffset>`).
    DateTimeOffset,
    Uuid,
    /// Standard base64, reported as `Vec<u8>`.
    Base64,
    /// Delegate to the handler's string extraction function.
    Custom,
}

mode_names!(StringMode, "string mode", {
    String => "string",
    DateTime => "date-time",
    DateTimeOffset => "date-time-offset",
    Uuid => "uuid",
    Base64 => "base64",
    Custom => "custom",
});

/// Turns a JSON scalar at an address into a leaf value.
pub type ExtractFn = Arc<dyn Fn(&str, &Value) -> Result<Box<dyn Reflect>> + Send + Sync>;

/// Flattens `serde_json::Value` trees.
///
/// Objects recurse per member as `prefix.name` in document order, arrays per element as
/// `prefix[i]`; both hand children back to the engine so other handlers can take part.
#[derive(Clone, Default)]
pub struct JsonHandler {
    number_mode: NumberMode,
    string_mode: StringMode,
    number_fn: Option<ExtractFn>,
    string_fn: Option<ExtractFn>,
}

#[derive(Default)]
pub struct JsonHandlerBuilder {
    number_mode: NumberMode,
    string_mode: StringMode,
    number_fn: Option<ExtractFn>,
    string_fn: Option<ExtractFn>,
}

impl JsonHandlerBuilder {
    pub fn number_mode(mut self, mode: NumberMode) -> Self {
        self.number_mode = mode;
        self
    }

    pub fn string_mode(mut self, mode: StringMode) -> Self {
        self.string_mode = mode;
        self
    }

    pub fn number_fn(
        mut self,
        extract: impl Fn(&str, &Value) -> Result<Box<dyn Reflect>> + Send + Sync + 'static,
    ) -> Self {
        self.number_fn = Some(Arc::new(extract));
        self
    }

    pub fn string_fn(
        mut self,
        extract: impl Fn(&str, &Value) -> Result<Box<dyn Reflect>> + Send + Sync + 'static,
    ) -> Self {
        self.string_fn = Some(Arc::new(extract));
        self
    }

    pub fn build(self) -> Result<JsonHandler> {
        if self.number_mode == NumberMode::Custom && self.number_fn.is_none() {
            return Err(FlattenError::configuration(
                "number mode 'custom' requires an extraction function",
            ));
        }
        if self.string_mode == StringMode::Custom && self.string_fn.is_none() {
            return Err(FlattenError::configuration(
                "string mode 'custom' requires an extraction function",
            ));
        }
        debug!(
            number_mode = %self.number_mode,
            string_mode = %self.string_mode,
            "Configured JSON handler"
        );
        Ok(JsonHandler {
            number_mode: self.number_mode,
            string_mode: self.string_mode,
            number_fn: self.number_fn,
            string_fn: self.string_fn,
        })
    }
}

impl JsonHandler {
    /// Numbers as `f64`, strings as `String`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> JsonHandlerBuilder {
        JsonHandlerBuilder::default()
    }

    pub fn number_mode(&self) -> NumberMode {
        self.number_mode
    }

    pub fn string_mode(&self) -> StringMode {
        self.string_mode
    }

    fn number(&self, address: &str, node: &Value, number: &Number) -> Result<Box<dyn Reflect>> {
        let fail = || FlattenError::interpretation(address, self.number_mode);

        let value: Box<dyn Reflect> = match self.number_mode {
            NumberMode::F64 => Box::new(number.as_f64().ok_or_else(fail)?),
            NumberMode::F32 => {
                let wide = number.as_f64().ok_or_else(fail)?;
                let narrow = wide as f32;
                if narrow.is_infinite() {
                    return Err(fail());
                }
                Box::new(narrow)
            }
            NumberMode::Decimal => Box::new(
                number
                    .to_string()
                    .parse::<Decimal>()
                    .map_err(|_| fail())?,
            ),
            NumberMode::I8 => Box::new(signed::<i8>(number).ok_or_else(fail)?),
            NumberMode::I16 => Box::new(signed::<i16>(number).ok_or_else(fail)?),
            NumberMode::I32 => Box::new(signed::<i32>(number).ok_or_else(fail)?),
            NumberMode::I64 => Box::new(number.as_i64().ok_or_else(fail)?),
            NumberMode::U8 => Box::new(unsigned::<u8>(number).ok_or_else(fail)?),
            NumberMode::U16 => Box::new(unsigned::<u16>(number).ok_or_else(fail)?),
            NumberMode::U32 => Box::new(unsigned::<u32>(number).ok_or_else(fail)?),
            NumberMode::U64 => Box::new(number.as_u64().ok_or_else(fail)?),
            NumberMode::Custom => match &self.number_fn {
                Some(extract) => extract(address, node)?,
                None => {
                    return Err(FlattenError::configuration(
                        "number mode 'custom' requires an extraction function",
                    ))
                }
            },
        };
        Ok(value)
    }

    fn string<'a>(&self, address: &str, node: &'a Value, text: &'a String) -> Result<Leaf<'a>> {
        let fail = || FlattenError::interpretation(address, self.string_mode);

        let value: Box<dyn Reflect> = match self.string_mode {
            StringMode::String => return Ok(Leaf::Ref(text)),
            StringMode::DateTime => Box::new(parse_date_time(text).ok_or_else(fail)?),
            StringMode::DateTimeOffset => {
                Box::new(DateTime::parse_from_rfc3339(text).map_err(|_| fail())?)
            }
            StringMode::Uuid => Box::new(Uuid::parse_str(text).map_err(|_| fail())?),
            StringMode::Base64 => Box::new(
                base64::engine::general_purpose::STANDARD
                    .decode(text)
                    .map_err(|_| fail())?,
            ),
            StringMode::Custom => match &self.string_fn {
                Some(extract) => extract(address, node)?,
                None => {
                    return Err(FlattenError::configuration(
                        "string mode 'custom' requires an extraction function",
                    ))
                }
            },
        };
        Ok(Leaf::Owned(value))
    }
}

fn signed<T: TryFrom<i64>>(number: &Number) -> Option<T> {
    number.as_i64().and_then(|v| T::try_from(v).ok())
}

fn unsigned<T: TryFrom<u64>>(number: &Number) -> Option<T> {
    number.as_u64().and_then(|v| T::try_from(v).ok())
}

/// ISO 8601 date-time without offset, an RFC 3339 timestamp (normalised to UTC) or a
/// plain date at midnight.
fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    if let Ok(value) = text.parse::<NaiveDateTime>() {
        return Some(value);
    }
    if let Ok(value) = DateTime::parse_from_rfc3339(text) {
        return Some(value.naive_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

impl Handler for JsonHandler {
    fn can_handle(&self, _prefix: &str, value: &dyn Reflect) -> bool {
        value.is::<Value>()
    }

    fn process<'a>(
        &'a self,
        engine: &'a dyn Flatten,
        prefix: String,
        value: &'a dyn Reflect,
    ) -> Entries<'a> {
        let Some(node) = value.downcast_ref::<Value>() else {
            return empty();
        };

        match node {
            Value::Null => single(Entry::null(prefix)),
            Value::Bool(flag) => single(Entry::borrowed(prefix, flag)),
            Value::Number(number) => {
                let leaf = self.number(&prefix, node, number).map(Leaf::Owned);
                Box::new(std::iter::once(leaf.map(|leaf| Entry::new(prefix, leaf))))
            }
            Value::String(text) => {
                let leaf = self.string(&prefix, node, text);
                Box::new(std::iter::once(leaf.map(|leaf| Entry::new(prefix, leaf))))
            }
            Value::Array(items) => Box::new(
                items
                    .iter()
                    .enumerate()
                    .flat_map(move |(i, item)| engine.flatten(address::index(&prefix, i), item)),
            ),
            Value::Object(members) => Box::new(
                members
                    .iter()
                    .flat_map(move |(name, item)| engine.flatten(address::member(&prefix, name), item)),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Flattener;
    use chrono::{FixedOffset, NaiveTime};
    use serde_json::json;

    fn engine(handler: JsonHandler) -> Flattener {
        Flattener::new().with_handler(handler)
    }

    #[test]
    fn test_objects_and_arrays() {
        let doc = json!({
            "name": "widget",
            "tags": ["a", "b"],
            "dims": {"w": 2, "h": 3.5},
            "gone": null,
            "ok": true
        });
        let flattener = engine(JsonHandler::new());
        let entries = flattener.collect("", &doc).unwrap();

        let addresses: Vec<_> = entries.iter().map(|e| e.address.as_str()).collect();
        assert_eq!(
            addresses,
            vec!["name", "tags[0]", "tags[1]", "dims.w", "dims.h", "gone", "ok"]
        );
        assert_eq!(entries[0].value.downcast_ref::<String>().map(String::as_str), Some("widget"));
        assert_eq!(entries[3].value.downcast_ref::<f64>(), Some(&2.0));
        assert!(entries[5].value.is_null());
        assert_eq!(entries[6].value.downcast_ref::<bool>(), Some(&true));
    }

    #[test]
    fn test_top_level_array_with_prefix() {
        let doc = json!([[1], [2, 3]]);
        let engine_ = engine(JsonHandler::new());
        let entries = engine_.collect("rows", &doc).unwrap();
        let addresses: Vec<_> = entries.iter().map(|e| e.address.as_str()).collect();
        assert_eq!(addresses, vec!["rows[0][0]", "rows[1][0]", "rows[1][1]"]);
    }

    #[test]
    fn test_integer_modes() {
        let doc = json!({"v": 200});

        let flattener = engine(JsonHandler::builder().number_mode(NumberMode::U8).build().unwrap());
        let entries = flattener.collect("", &doc).unwrap();
        assert_eq!(entries[0].value.downcast_ref::<u8>(), Some(&200));

        let flattener = engine(JsonHandler::builder().number_mode(NumberMode::I8).build().unwrap());
        let err = flattener.collect("", &doc).unwrap_err();
        assert_eq!(
            err,
            FlattenError::Interpretation {
                address: "v".to_string(),
                mode: "i8".to_string()
            }
        );
    }

    #[test]
    fn test_fractional_value_rejected_by_integer_mode() {
        let doc = json!({"a": 1, "b": 2.5});
        let flattener = engine(JsonHandler::builder().number_mode(NumberMode::I32).build().unwrap());
        let results: Vec<_> = flattener.flatten(String::new(), &doc).collect();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().value.downcast_ref::<i32>(), Some(&1));
        assert!(matches!(results[1], Err(FlattenError::Interpretation { .. })));
    }

    #[test]
    fn test_decimal_mode_keeps_literal_scale() {
        let doc = json!({"price": 12.50});
        let flattener = engine(JsonHandler::builder().number_mode(NumberMode::Decimal).build().unwrap());
        let entries = flattener.collect("", &doc).unwrap();
        let price = entries[0].value.downcast_ref::<Decimal>().unwrap();
        assert_eq!(price.to_f64(), 12.5);
    }

    #[test]
    fn test_f32_mode() {
        let doc = json!(0.5);
        let flattener = engine(JsonHandler::builder().number_mode(NumberMode::F32).build().unwrap());
        let entries = flattener.collect("x", &doc).unwrap();
        assert_eq!(entries[0].value.downcast_ref::<f32>(), Some(&0.5f32));

        let doc = json!(1e300);
        assert!(flattener.collect("x", &doc).is_err());
    }

    #[test]
    fn test_date_time_modes() {
        let doc = json!(["2021-03-04T05:06:07", "2021-03-04"]);
        let flattener = engine(JsonHandler::builder().string_mode(StringMode::DateTime).build().unwrap());
        let entries = flattener.collect("d", &doc).unwrap();

        let expected = NaiveDate::from_ymd_opt(2021, 3, 4)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(5, 6, 7).unwrap());
        assert_eq!(entries[0].value.downcast_ref::<NaiveDateTime>(), Some(&expected));
        assert_eq!(
            entries[1].value.downcast_ref::<NaiveDateTime>(),
            NaiveDate::from_ymd_opt(2021, 3, 4).unwrap().and_hms_opt(0, 0, 0).as_ref()
        );

        let doc = json!("2021-03-04T05:06:07+02:00");
        let flattener =
            engine(JsonHandler::builder().string_mode(StringMode::DateTimeOffset).build().unwrap());
        let entries = flattener.collect("d", &doc).unwrap();
        let stamp = entries[0].value.downcast_ref::<DateTime<FixedOffset>>().unwrap();
        assert_eq!(stamp.offset().local_minus_utc(), 7200);
    }

    #[test]
    fn test_uuid_and_base64_modes() {
        let doc = json!("67e55044-10b1-426f-9247-bb680e5fe0c8");
        let flattener = engine(JsonHandler::builder().string_mode(StringMode::Uuid).build().unwrap());
        let entries = flattener.collect("id", &doc).unwrap();
        assert_eq!(
            entries[0].value.downcast_ref::<Uuid>().map(|u| u.to_string()),
            Some("67e55044-10b1-426f-9247-bb680e5fe0c8".to_string())
        );

        let doc = json!({"blob": "aGVsbG8="});
        let flattener = engine(JsonHandler::builder().string_mode(StringMode::Base64).build().unwrap());
        let entries = flattener.collect("", &doc).unwrap();
        assert_eq!(entries[0].value.downcast_ref::<Vec<u8>>(), Some(&b"hello".to_vec()));

        let doc = json!({"blob": "not base64!"});
        let err = flattener.collect("", &doc).unwrap_err();
        assert_eq!(err.to_string(), "Unable to interpret 'blob' as base64");
    }

    #[test]
    fn test_custom_extraction() {
        let handler = JsonHandler::builder()
            .number_mode(NumberMode::Custom)
            .number_fn(|address, node| {
                let raw = node.as_f64().unwrap_or_default();
                Ok(Box::new(format!("{}={}", address, raw * 2.0)) as Box<dyn Reflect>)
            })
            .build()
            .unwrap();
        let doc = json!({"n": 4});
        let engine_ = engine(handler);
        let entries = engine_.collect("", &doc).unwrap();
        assert_eq!(entries[0].value.downcast_ref::<String>().map(String::as_str), Some("n=8"));
    }

    #[test]
    fn test_custom_modes_require_functions() {
        assert!(JsonHandler::builder().number_mode(NumberMode::Custom).build().is_err());
        assert!(JsonHandler::builder().string_mode(StringMode::Custom).build().is_err());
    }

    #[test]
    fn test_mode_names() {
        assert_eq!("u16".parse::<NumberMode>().unwrap(), NumberMode::U16);
        assert_eq!("date-time-offset".parse::<StringMode>().unwrap(), StringMode::DateTimeOffset);
        assert_eq!(
            "int32".parse::<NumberMode>().unwrap_err().to_string(),
            "Unsupported number mode 'int32'"
        );
    }
}
