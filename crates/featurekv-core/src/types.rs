//! Core data types for featurekv
//!
//! This module defines the structures that flow between the host feature store
//! and the key-value substrate: entity keys, typed feature values, the records
//! written per feature view, and the rows read back.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Typed value of a single join key (e.g. `driver_id = 1001`)
///
/// Entity keys are part of every storage key, so only types with an exact,
/// deterministic byte representation are allowed here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EntityValue {
    Int32(i32),
    Int64(i64),
    String(String),
    Bytes(Vec<u8>),
}

impl fmt::Display for EntityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityValue::Int32(v) => write!(f, "{}", v),
            EntityValue::Int64(v) => write!(f, "{}", v),
            EntityValue::String(v) => write!(f, "{}", v),
            EntityValue::Bytes(v) => {
                write!(f, "0x")?;
                for b in v {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }
    }
}

impl From<i32> for EntityValue {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for EntityValue {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<String> for EntityValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for EntityValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<u8>> for EntityValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

/// Identifies one entity instance (e.g. a driver, or a (user, product) pair)
///
/// An entity key is an ordered sequence of join-key names with one typed value
/// per name. The two vectors are kept parallel, which mirrors how feature
/// stores ship entity keys over the wire; a length mismatch is reported as an
/// encoding error when the key is serialized.
///
/// Serialization sorts pairs by join-key name, so the same logical key always
/// produces the same storage bytes no matter the order the caller used.
///
/// # Examples
///
/// ```
/// use featurekv_core::EntityKey;
///
/// let driver = EntityKey::new("driver_id", 1001_i64);
/// let pair = EntityKey::new("user_id", "u-1").with_key("product_id", 42_i64);
/// assert_eq!(pair.len(), 2);
/// assert_eq!(driver.to_string(), "{driver_id:1001}");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EntityKey {
    /// Join-key names (e.g. `["driver_id"]`)
    pub join_keys: Vec<String>,

    /// One value per join key, same order as `join_keys`
    pub entity_values: Vec<EntityValue>,
}

impl EntityKey {
    /// Creates a single-column entity key
    pub fn new(name: impl Into<String>, value: impl Into<EntityValue>) -> Self {
        Self {
            join_keys: vec![name.into()],
            entity_values: vec![value.into()],
        }
    }

    /// Adds another join key (builder pattern)
    pub fn with_key(mut self, name: impl Into<String>, value: impl Into<EntityValue>) -> Self {
        self.join_keys.push(name.into());
        self.entity_values.push(value.into());
        self
    }

    /// Number of join keys
    pub fn len(&self) -> usize {
        self.join_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.join_keys.is_empty()
    }

    /// Iterates `(name, value)` pairs in caller order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityValue)> {
        self.join_keys
            .iter()
            .map(String::as_str)
            .zip(self.entity_values.iter())
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}:{}", name, value)?;
        }
        write!(f, "}}")
    }
}

/// Represents a feature value that can be of different types
///
/// Values are serialized with an explicit type tag so that decoding gives
/// back exactly what was written (an empty `ArrayFloat` stays an
/// `ArrayFloat`, `1.0` stays a `Float`).
///
/// `Null` is the zero/empty value: it is what a read returns for a feature
/// whose key was never written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub enum FeatureValue {
    /// Null/missing value
    #[default]
    Null,

    /// Integer value (e.g. trip counts)
    Int(i64),

    /// Floating point value (e.g. conversion rate)
    Float(f64),

    /// String value (e.g. vehicle type)
    String(String),

    /// Boolean value (e.g. is_active)
    Bool(bool),

    /// Raw bytes (e.g. a pre-serialized model input)
    Bytes(Vec<u8>),

    /// Array of integers (e.g. recent trip IDs)
    ArrayInt(Vec<i64>),

    /// Array of floats (e.g. embeddings)
    ArrayFloat(Vec<f64>),

    /// Array of strings (e.g. tags)
    ArrayString(Vec<String>),

    /// Date-only value (e.g. signup_date)
    Date(NaiveDate),
}

impl FeatureValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FeatureValue::Null)
    }
}

/// Interprets a naive timestamp as UTC
///
/// Timestamps handed to the writer must be timezone-aware; naive ones coming
/// from files or dataframes are treated as already being in UTC.
pub fn make_tzaware(ts: NaiveDateTime) -> DateTime<Utc> {
    ts.and_utc()
}

/// Drops the timezone of a UTC timestamp
pub fn to_naive_utc(ts: DateTime<Utc>) -> NaiveDateTime {
    ts.naive_utc()
}

/// The unit written per (entity key, feature view)
///
/// # Examples
///
/// ```
/// use featurekv_core::{EntityKey, FeatureRecord, FeatureValue};
/// use chrono::{TimeZone, Utc};
///
/// let record = FeatureRecord::new(
///     EntityKey::new("driver_id", 1001_i64),
///     Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
/// )
/// .with_feature("conv_rate", FeatureValue::Float(0.5));
///
/// // Created timestamp falls back to the event timestamp
/// assert_eq!(record.created_or_event_timestamp(), record.event_timestamp);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureRecord {
    /// Entity the values belong to
    pub entity_key: EntityKey,

    /// Feature name -> value mapping
    pub values: HashMap<String, FeatureValue>,

    /// When the values were true in the world
    pub event_timestamp: DateTime<Utc>,

    /// When the values were computed/ingested (defaults to `event_timestamp`)
    pub created_timestamp: Option<DateTime<Utc>>,
}

impl FeatureRecord {
    /// Creates a record with no features yet
    pub fn new(entity_key: EntityKey, event_timestamp: DateTime<Utc>) -> Self {
        Self {
            entity_key,
            values: HashMap::new(),
            event_timestamp,
            created_timestamp: None,
        }
    }

    /// Adds a feature (builder pattern)
    pub fn with_feature(mut self, name: impl Into<String>, value: FeatureValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Sets the ingestion timestamp (builder pattern)
    pub fn with_created_timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.created_timestamp = Some(ts);
        self
    }

    /// Timestamp stored under the `_ex` marker
    pub fn created_or_event_timestamp(&self) -> DateTime<Utc> {
        self.created_timestamp.unwrap_or(self.event_timestamp)
    }
}

/// A row read back for one entity key
///
/// `features` holds an entry for every requested feature; features that were
/// never written are [`FeatureValue::Null`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureRow {
    /// Entity identifier for this row
    pub entity_key: EntityKey,

    /// Event timestamp stored with the record (second precision)
    pub event_timestamp: DateTime<Utc>,

    /// Feature name -> value mapping
    pub features: HashMap<String, FeatureValue>,
}

impl FeatureRow {
    /// Creates a new empty row
    pub fn new(entity_key: EntityKey, event_timestamp: DateTime<Utc>) -> Self {
        Self {
            entity_key,
            event_timestamp,
            features: HashMap::new(),
        }
    }

    /// Adds a feature to this row (builder pattern)
    pub fn with_feature(mut self, name: impl Into<String>, value: FeatureValue) -> Self {
        self.features.insert(name.into(), value);
        self
    }

    /// Gets a feature value by name
    pub fn get_feature(&self, name: &str) -> Option<&FeatureValue> {
        self.features.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_entity_key_builder() {
        let key = EntityKey::new("user_id", "u-1").with_key("product_id", 42_i64);
        assert_eq!(key.len(), 2);
        assert!(!key.is_empty());

        let pairs: Vec<_> = key.iter().collect();
        assert_eq!(pairs[0], ("user_id", &EntityValue::String("u-1".into())));
        assert_eq!(pairs[1], ("product_id", &EntityValue::Int64(42)));
    }

    #[test]
    fn test_entity_key_display() {
        let key = EntityKey::new("driver_id", 1001_i64).with_key("blob", vec![0xab_u8, 0x01]);
        assert_eq!(key.to_string(), "{driver_id:1001,blob:0xab01}");
    }

    #[test]
    fn test_feature_value_default_is_null() {
        assert_eq!(FeatureValue::default(), FeatureValue::Null);
        assert!(FeatureValue::default().is_null());
        assert!(!FeatureValue::Int(0).is_null());
    }

    #[test]
    fn test_feature_value_json_keeps_type_tag() {
        let json = serde_json::to_string(&FeatureValue::Float(1.0)).unwrap();
        assert_eq!(json, r#"{"Float":1.0}"#);
        let back: FeatureValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FeatureValue::Float(1.0));
    }

    #[test]
    fn test_record_created_timestamp_defaults_to_event() {
        let event = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let created = Utc.with_ymd_and_hms(2021, 1, 2, 0, 0, 0).unwrap();

        let record = FeatureRecord::new(EntityKey::new("driver_id", 1_i64), event);
        assert_eq!(record.created_or_event_timestamp(), event);

        let record = record.with_created_timestamp(created);
        assert_eq!(record.created_or_event_timestamp(), created);
    }

    #[test]
    fn test_make_tzaware_treats_naive_as_utc() {
        let naive = NaiveDate::from_ymd_opt(2021, 1, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        let aware = make_tzaware(naive);
        assert_eq!(aware, Utc.with_ymd_and_hms(2021, 1, 1, 12, 30, 0).unwrap());
        assert_eq!(to_naive_utc(aware), naive);
    }

    #[test]
    fn test_feature_row_builder() {
        let ts = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let row = FeatureRow::new(EntityKey::new("driver_id", 1_i64), ts)
            .with_feature("conv_rate", FeatureValue::Float(0.5));
        assert_eq!(row.get_feature("conv_rate"), Some(&FeatureValue::Float(0.5)));
        assert_eq!(row.get_feature("acc_rate"), None);
    }
}
