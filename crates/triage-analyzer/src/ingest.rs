//! Conversion of input documents into typed series batches.
//!
//! The fetcher hands over JSON; this module turns it into a [`SeriesBatch`]
//! while isolating failures per series. A malformed series becomes a
//! [`ValidationError`] entry in the batch and never prevents its neighbours
//! from being analyzed. Only a document that cannot be read at all fails the
//! whole call.
//!
//! Two shapes are accepted:
//!
//! ```json
//! { "series": { "cpu{host:a}": { "metric": "cpu", "scope": "host:a",
//!                                "samples": [{"timestamp": 1, "value": 2.0}] } } }
//! ```
//!
//! and the metrics query response of the monitoring backend:
//!
//! ```json
//! { "series": [ { "metric": "cpu", "scope": "host:a", "pointlist": [[1, 2.0]] } ] }
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::value::RawValue;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{AnalysisError, Result, ValidationError};
use crate::types::{Sample, Series, SeriesId};

/// One slot of a batch: either a usable series or the reason it is unusable.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    /// Zero-based position in the input.
    pub position: usize,
    /// The validated series, or why validation failed.
    pub result: std::result::Result<Series, ValidationError>,
}

/// An ordered batch of series to analyze.
///
/// Order is the input order and is preserved through analysis. Identifiers
/// are unique within a batch: a repeated identifier turns the later entry
/// into a validation error.
#[derive(Debug, Clone, Default)]
pub struct SeriesBatch {
    entries: Vec<BatchEntry>,
    seen: HashSet<SeriesId>,
}

impl SeriesBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a series.
    pub fn push(&mut self, series: Series) {
        let position = self.entries.len();
        let result = if self.seen.insert(series.id.clone()) {
            Ok(series)
        } else {
            Err(ValidationError::new(
                series.id.as_str(),
                position,
                "duplicate series identifier",
            ))
        };
        self.entries.push(BatchEntry { position, result });
    }

    /// Appends a series that already failed validation.
    pub fn push_invalid(&mut self, error: ValidationError) {
        let position = self.entries.len();
        self.entries.push(BatchEntry {
            position,
            result: Err(error.at(position)),
        });
    }

    /// Appends the outcome of validating one series.
    pub fn push_result(&mut self, result: std::result::Result<Series, ValidationError>) {
        match result {
            Ok(series) => self.push(series),
            Err(error) => self.push_invalid(error),
        }
    }

    /// Returns the entries in input order.
    #[must_use]
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    /// Returns the number of entries, valid or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the batch has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Series> for SeriesBatch {
    fn from_iter<I: IntoIterator<Item = Series>>(iter: I) -> Self {
        let mut batch = Self::new();
        for series in iter {
            batch.push(series);
        }
        batch
    }
}

impl Extend<Series> for SeriesBatch {
    fn extend<I: IntoIterator<Item = Series>>(&mut self, iter: I) {
        for series in iter {
            self.push(series);
        }
    }
}

/// Parses an input document into a batch.
///
/// # Errors
///
/// Returns [`AnalysisError::Document`] if the text is not JSON or has no
/// `series` object or array. Problems inside individual series are recorded
/// in the batch instead.
pub fn parse_document(json: &str) -> Result<SeriesBatch> {
    let document: Document =
        serde_json::from_str(json).map_err(|e| AnalysisError::document(e.to_string()))?;

    let mut batch = SeriesBatch::new();
    match document.series {
        SeriesField::Keyed(entries) => {
            debug!(count = entries.len(), shape = "keyed", "parsed input document");
            for (position, (key, raw)) in entries.iter().enumerate() {
                let result = entry_value(raw)
                    .map_err(|reason| ValidationError::new(key.as_str(), 0, reason))
                    .and_then(|value| keyed_series(key, &value));
                batch.push_result(result.map_err(|e| e.at(position)));
            }
        }
        SeriesField::Listed(values) => {
            debug!(count = values.len(), shape = "query_response", "parsed input document");
            for (position, raw) in values.iter().enumerate() {
                let result = entry_value(raw)
                    .map_err(|reason| ValidationError::new("", 0, reason))
                    .and_then(|value| query_series(&value));
                batch.push_result(result.map_err(|e| e.at(position)));
            }
        }
    }

    Ok(batch)
}

#[derive(Deserialize)]
struct Document {
    series: SeriesField,
}

enum SeriesField {
    Keyed(Vec<(String, Box<RawValue>)>),
    Listed(Vec<Box<RawValue>>),
}

impl<'de> Deserialize<'de> for SeriesField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(SeriesFieldVisitor)
    }
}

struct SeriesFieldVisitor;

impl<'de> Visitor<'de> for SeriesFieldVisitor {
    type Value = SeriesField;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object of series keyed by identifier, or an array of query series")
    }

    // Collected by hand so that key order (and repeated keys) survive.
    fn visit_map<A: MapAccess<'de>>(
        self,
        mut map: A,
    ) -> std::result::Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Box<RawValue>>()? {
            entries.push((key, value));
        }
        Ok(SeriesField::Keyed(entries))
    }

    fn visit_seq<A: SeqAccess<'de>>(
        self,
        mut seq: A,
    ) -> std::result::Result<Self::Value, A::Error> {
        let mut values = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(value) = seq.next_element::<Box<RawValue>>()? {
            values.push(value);
        }
        Ok(SeriesField::Listed(values))
    }
}

type Validated<T> = std::result::Result<T, ValidationError>;

// Entries are kept raw until here so that a number serde_json cannot
// represent (`1e400`) invalidates only the series containing it.
fn entry_value(raw: &RawValue) -> std::result::Result<Value, String> {
    serde_json::from_str(raw.get()).map_err(|e| format!("unreadable series entry: {e}"))
}

fn keyed_series(key: &str, value: &Value) -> Validated<Series> {
    let id = SeriesId::new(key)?;
    let fail = |reason: String| ValidationError::new(key, 0, reason);

    let object = value
        .as_object()
        .ok_or_else(|| fail("series entry must be an object".to_string()))?;

    let metric = optional_string(object, "metric")
        .map_err(fail)?
        .unwrap_or_else(|| key.to_string());
    let scope = optional_string(object, "scope").map_err(fail)?.unwrap_or_default();
    let unit = optional_string(object, "unit").map_err(fail)?;
    let display_name = optional_string(object, "display_name").map_err(fail)?;
    let tags = string_list(object, "tags").map_err(fail)?;

    let raw = object
        .get("samples")
        .or_else(|| object.get("pointlist"))
        .ok_or_else(|| fail("missing 'samples' list".to_string()))?;
    let samples = parse_samples(raw).map_err(fail)?;

    let mut series = Series::new(id, metric, samples)?.with_scope(scope);
    series.unit = unit;
    series.display_name = display_name;
    series.tags = tags;
    Ok(series)
}

fn query_series(value: &Value) -> Validated<Series> {
    let Some(object) = value.as_object() else {
        return Err(ValidationError::new(
            "",
            0,
            "query series must be an object",
        ));
    };

    let metric = optional_string(object, "metric")
        .map_err(|reason| ValidationError::new("", 0, reason))?
        .unwrap_or_default();
    let scope = optional_string(object, "scope")
        .map_err(|reason| ValidationError::new(metric.as_str(), 0, reason))?
        .unwrap_or_default();

    let id = SeriesId::from_metric_scope(&metric, &scope)?;
    let fail = |reason: String| ValidationError::new(id.as_str(), 0, reason);

    let display_name = optional_string(object, "display_name").map_err(fail)?;
    let tags = string_list(object, "tag_set").map_err(fail)?;
    let unit = query_unit(object.get("unit"));

    let raw = object
        .get("pointlist")
        .ok_or_else(|| fail("missing 'pointlist'".to_string()))?;
    let samples = parse_samples(raw).map_err(fail)?;

    let mut series = Series::new(id, metric, samples)?.with_scope(scope);
    series.unit = unit;
    series.display_name = display_name;
    series.tags = tags;
    Ok(series)
}

fn optional_string(
    object: &Map<String, Value>,
    field: &str,
) -> std::result::Result<Option<String>, String> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(format!("'{field}' must be a string")),
    }
}

fn string_list(
    object: &Map<String, Value>,
    field: &str,
) -> std::result::Result<Vec<String>, String> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| format!("'{field}' must contain only strings"))
            })
            .collect(),
        Some(_) => Err(format!("'{field}' must be an array of strings")),
    }
}

// The query API reports units as `[numerator, denominator]`, either of which
// may be null.
fn query_unit(raw: Option<&Value>) -> Option<String> {
    match raw? {
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => parts.iter().find_map(|part| {
            part.get("short_name")
                .or_else(|| part.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string)
        }),
        _ => None,
    }
}

fn parse_samples(raw: &Value) -> std::result::Result<Vec<Sample>, String> {
    let items = raw
        .as_array()
        .ok_or_else(|| "samples must be an array".to_string())?;

    let mut samples = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let (timestamp, value) = match item {
            Value::Object(point) => (point.get("timestamp"), point.get("value")),
            Value::Array(pair) if pair.len() == 2 => (pair.first(), pair.get(1)),
            _ => {
                return Err(format!(
                    "sample {index} must be an object or a [timestamp, value] pair"
                ))
            }
        };

        let timestamp = timestamp
            .and_then(timestamp_millis)
            .ok_or_else(|| format!("sample {index} has a missing or non-numeric timestamp"))?;

        match value {
            // Gaps in the window are reported as null and carry no information.
            Some(Value::Null) => continue,
            None => return Err(format!("sample {index} has no value")),
            Some(Value::Number(n)) => {
                let value = n
                    .as_f64()
                    .ok_or_else(|| format!("sample {index} has an unrepresentable value"))?;
                samples.push(Sample::new(timestamp, value));
            }
            Some(_) => return Err(format!("sample {index} has a non-numeric value")),
        }
    }

    Ok(samples)
}

fn timestamp_millis(raw: &Value) -> Option<i64> {
    let Value::Number(number) = raw else {
        return None;
    };
    if let Some(ts) = number.as_i64() {
        return Some(ts);
    }
    let ts = number.as_f64()?.round();
    // i64::MAX is not representable as f64; the cast rounds it up to 2^63.
    let in_range = ts >= i64::MIN as f64 && ts < i64::MAX as f64;
    in_range.then(|| ts as i64)
}
