//! Write feature records from a JSON Lines file
//!
//! Each non-empty line is one record:
//!
//! ```json
//! {"entity": {"driver_id": 1001}, "values": {"conv_rate": 0.5}, "event_timestamp": "2021-01-01T00:00:00Z"}
//! ```
//!
//! `created_timestamp` is optional. Timestamps without an offset are taken as UTC.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use featurekv_core::{make_tzaware, EntityKey, EntityValue, FeatureRecord, FeatureValue, OnlineStore};
use featurekv_online::RepoConfig;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Instant;

use super::create_store;
use crate::config::resolve_view;
use crate::output::{format_count, print_info, print_output, print_success, OutputFormat};

#[derive(Debug, Deserialize)]
struct InputLine {
    entity: BTreeMap<String, Value>,
    values: BTreeMap<String, Value>,
    event_timestamp: String,
    #[serde(default)]
    created_timestamp: Option<String>,
}

#[derive(Debug, Serialize)]
struct WriteReport {
    project: String,
    feature_view: String,
    store_type: String,
    records_written: usize,
    keys_written: usize,
    duration_ms: u64,
}

pub async fn run(config: &RepoConfig, view_name: &str, input: &str, output_format: OutputFormat) -> Result<()> {
    let contents = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input))?;
    let records = parse_records(&contents).with_context(|| format!("Invalid input file: {}", input))?;

    let view = resolve_view(config, view_name);
    let store = create_store(config)?;

    print_info(&format!(
        "Writing {} records to '{}' in project '{}' ({})",
        format_count(records.len() as u64),
        view_name,
        config.project,
        store.store_type()
    ));

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} records ({eta})")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let mut on_progress = |n: usize| pb.inc(n as u64);
    let result = store
        .online_write_batch(&config.project, &view, &records, Some(&mut on_progress))
        .await;
    pb.finish_and_clear();
    result.with_context(|| format!("Write to '{}' failed", view_name))?;

    let report = WriteReport {
        project: config.project.clone(),
        feature_view: view_name.to_string(),
        store_type: store.store_type().to_string(),
        records_written: records.len(),
        keys_written: records.iter().map(|r| r.values.len() + 2).sum(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    match output_format {
        OutputFormat::Table => {
            print_success(&format!(
                "Wrote {} records ({} keys) to '{}' in {:.2}s",
                format_count(report.records_written as u64),
                format_count(report.keys_written as u64),
                view_name,
                start.elapsed().as_secs_f64()
            ));
        }
        format => print_output(&report, format)?,
    }

    Ok(())
}

/// Parses every non-empty line of a JSON Lines document
fn parse_records(contents: &str) -> Result<Vec<FeatureRecord>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_line(line).with_context(|| format!("line {}", i + 1)))
        .collect()
}

fn parse_line(line: &str) -> Result<FeatureRecord> {
    let input: InputLine = serde_json::from_str(line)?;

    if input.entity.is_empty() {
        bail!("entity has no join keys");
    }
    let mut entity_key = EntityKey {
        join_keys: Vec::with_capacity(input.entity.len()),
        entity_values: Vec::with_capacity(input.entity.len()),
    };
    for (name, value) in input.entity {
        let value = entity_value(&name, value)?;
        entity_key.join_keys.push(name);
        entity_key.entity_values.push(value);
    }

    let mut record = FeatureRecord::new(entity_key, parse_timestamp(&input.event_timestamp)?);
    if let Some(created) = input.created_timestamp.as_deref() {
        record = record.with_created_timestamp(parse_timestamp(created)?);
    }
    for (name, value) in input.values {
        let value = feature_value(value).with_context(|| format!("feature '{}'", name))?;
        record = record.with_feature(name, value);
    }
    Ok(record)
}

fn entity_value(name: &str, value: Value) -> Result<EntityValue> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(EntityValue::Int64)
            .ok_or_else(|| anyhow!("join key '{}' must be an integer, got {}", name, n)),
        Value::String(s) => Ok(EntityValue::String(s)),
        other => bail!("join key '{}' must be an integer or string, got {}", name, other),
    }
}

/// Maps plain JSON onto feature values
///
/// Objects are read as explicitly tagged values (`{"Date": "2021-01-01"}`,
/// `{"Bytes": [1, 2]}`).
fn feature_value(value: Value) -> Result<FeatureValue> {
    Ok(match value {
        Value::Null => FeatureValue::Null,
        Value::Bool(b) => FeatureValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => FeatureValue::Int(i),
            None => FeatureValue::Float(
                n.as_f64()
                    .ok_or_else(|| anyhow!("number {} is out of range", n))?,
            ),
        },
        Value::String(s) => FeatureValue::String(s),
        Value::Array(items) => array_value(items)?,
        object @ Value::Object(_) => serde_json::from_value(object)?,
    })
}

fn array_value(items: Vec<Value>) -> Result<FeatureValue> {
    if items.iter().all(Value::is_i64) {
        return Ok(FeatureValue::ArrayInt(
            items.iter().filter_map(Value::as_i64).collect(),
        ));
    }
    if items.iter().all(Value::is_number) {
        return Ok(FeatureValue::ArrayFloat(
            items.iter().filter_map(Value::as_f64).collect(),
        ));
    }
    if items.iter().all(Value::is_string) {
        return Ok(FeatureValue::ArrayString(
            items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ));
    }
    bail!("arrays must hold only integers, only numbers or only strings")
}

/// Parses RFC 3339, or a naive date/time taken as UTC
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(make_tzaware(naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(make_tzaware(midnight));
        }
    }

    bail!("invalid timestamp '{}'. Use RFC 3339 or YYYY-MM-DD[THH:MM:SS]", s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_driver_stats_line() {
        let line = r#"{"entity": {"driver_id": 1001}, "values": {"conv_rate": 0.5, "acc_rate": 0.9, "trips": 12}, "event_timestamp": "2021-01-01T00:00:00Z"}"#;
        let record = parse_line(line).unwrap();

        assert_eq!(record.entity_key, EntityKey::new("driver_id", 1001_i64));
        assert_eq!(
            record.event_timestamp,
            Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
        );
        assert!(record.created_timestamp.is_none());
        assert_eq!(record.values["conv_rate"], FeatureValue::Float(0.5));
        assert_eq!(record.values["trips"], FeatureValue::Int(12));
    }

    #[test]
    fn test_parse_value_types() {
        assert_eq!(feature_value(Value::Null).unwrap(), FeatureValue::Null);
        assert_eq!(
            feature_value(serde_json::json!([1, 2])).unwrap(),
            FeatureValue::ArrayInt(vec![1, 2])
        );
        assert_eq!(
            feature_value(serde_json::json!([1, 2.5])).unwrap(),
            FeatureValue::ArrayFloat(vec![1.0, 2.5])
        );
        assert_eq!(
            feature_value(serde_json::json!(["a"])).unwrap(),
            FeatureValue::ArrayString(vec!["a".into()])
        );
        assert_eq!(
            feature_value(serde_json::json!({"Date": "2021-01-01"})).unwrap(),
            FeatureValue::Date(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap())
        );
        assert!(feature_value(serde_json::json!([1, "a"])).is_err());
    }

    #[test]
    fn test_parse_entity_values() {
        assert_eq!(
            entity_value("id", serde_json::json!("abc")).unwrap(),
            EntityValue::String("abc".into())
        );
        assert!(entity_value("id", serde_json::json!(1.5)).is_err());
        assert!(entity_value("id", serde_json::json!(true)).is_err());
    }

    #[test]
    fn test_parse_timestamps() {
        let expected = Utc.with_ymd_and_hms(2021, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2021-01-01T12:00:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2021-01-01T14:00:00+02:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2021-01-01T12:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2021-01-01 12:00:00").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2021-01-01").unwrap(),
            Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
        );
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_parse_records_reports_line_numbers() {
        let contents = concat!(
            r#"{"entity": {"id": 1}, "values": {"a": 1}, "event_timestamp": "2021-01-01"}"#,
            "\n\n",
            r#"{"entity": {}, "values": {"a": 1}, "event_timestamp": "2021-01-01"}"#,
        );
        let err = parse_records(contents).unwrap_err();
        assert!(format!("{:#}", err).contains("line 3"));
    }

    #[test]
    fn test_created_timestamp_is_optional() {
        let line = r#"{"entity": {"id": "x"}, "values": {"a": true}, "event_timestamp": "2021-01-02", "created_timestamp": "2021-01-03T00:00:00Z"}"#;
        let record = parse_line(line).unwrap();
        assert_eq!(
            record.created_timestamp,
            Some(Utc.with_ymd_and_hms(2021, 1, 3, 0, 0, 0).unwrap())
        );
    }
}
