//! Value codecs
//!
//! The substrate only sees bytes. A [`ValueCodec`] turns feature values and
//! timestamp markers into bytes and back, and must round-trip exactly.
//!
//! Absence is handled outside the codec: a missing or zero-length value never
//! reaches `decode_*`, it becomes the type's default (see
//! [`decode_value_or_default`]). Anything the codec fails to parse is a
//! [`Error::DecodeError`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{Error, FeatureValue, Result};

/// Stored form of the `_ts` / `_ex` markers (seconds since the Unix epoch)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TimestampMarker {
    pub seconds: i64,
}

impl TimestampMarker {
    /// Truncates to whole seconds
    pub fn from_datetime(ts: DateTime<Utc>) -> Self {
        Self {
            seconds: ts.timestamp(),
        }
    }

    pub fn to_datetime(self) -> Result<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, 0).ok_or_else(|| {
            Error::decode(format!(
                "timestamp marker {} seconds is out of range",
                self.seconds
            ))
        })
    }
}

/// Serializes feature values and timestamp markers
pub trait ValueCodec: Send + Sync {
    /// Short name for logging
    fn name(&self) -> &'static str;

    fn encode_value(&self, value: &FeatureValue) -> Result<Vec<u8>>;

    fn decode_value(&self, bytes: &[u8]) -> Result<FeatureValue>;

    fn encode_marker(&self, marker: TimestampMarker) -> Result<Vec<u8>>;

    fn decode_marker(&self, bytes: &[u8]) -> Result<TimestampMarker>;

    /// Encodes a timestamp at second precision
    fn encode_timestamp(&self, ts: DateTime<Utc>) -> Result<Vec<u8>> {
        self.encode_marker(TimestampMarker::from_datetime(ts))
    }

    fn decode_timestamp(&self, bytes: &[u8]) -> Result<DateTime<Utc>> {
        self.decode_marker(bytes)?.to_datetime()
    }
}

/// Decodes a stored feature value, mapping absence to [`FeatureValue::Null`]
pub fn decode_value_or_default(codec: &dyn ValueCodec, bytes: Option<&[u8]>) -> Result<FeatureValue> {
    match bytes {
        Some(b) if !b.is_empty() => codec.decode_value(b),
        _ => Ok(FeatureValue::default()),
    }
}

/// Decodes a stored timestamp marker, mapping absence to the Unix epoch
pub fn decode_timestamp_or_default(
    codec: &dyn ValueCodec,
    bytes: Option<&[u8]>,
) -> Result<DateTime<Utc>> {
    match bytes {
        Some(b) if !b.is_empty() => codec.decode_timestamp(b),
        _ => TimestampMarker::default().to_datetime(),
    }
}

/// Compact binary codec (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl ValueCodec for BincodeCodec {
    fn name(&self) -> &'static str {
        "bincode"
    }

    fn encode_value(&self, value: &FeatureValue) -> Result<Vec<u8>> {
        bincode::serialize(value).map_err(|e| Error::encoding(format!("bincode: {}", e)))
    }

    fn decode_value(&self, bytes: &[u8]) -> Result<FeatureValue> {
        bincode::deserialize(bytes).map_err(|e| Error::decode(format!("bincode feature value: {}", e)))
    }

    fn encode_marker(&self, marker: TimestampMarker) -> Result<Vec<u8>> {
        bincode::serialize(&marker).map_err(|e| Error::encoding(format!("bincode: {}", e)))
    }

    fn decode_marker(&self, bytes: &[u8]) -> Result<TimestampMarker> {
        bincode::deserialize(bytes).map_err(|e| Error::decode(format!("bincode timestamp: {}", e)))
    }
}

/// Human-readable JSON codec, handy when inspecting the keyspace by hand
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ValueCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode_value(&self, value: &FeatureValue) -> Result<Vec<u8>> {
        // serde_json writes NaN and infinities as `null`, which then fails to decode
        let finite = match value {
            FeatureValue::Float(v) => v.is_finite(),
            FeatureValue::ArrayFloat(vs) => vs.iter().all(|v| v.is_finite()),
            _ => true,
        };
        if !finite {
            return Err(Error::encoding(
                "json: non-finite floats cannot be stored, use the bincode codec",
            ));
        }
        serde_json::to_vec(value).map_err(|e| Error::encoding(format!("json: {}", e)))
    }

    fn decode_value(&self, bytes: &[u8]) -> Result<FeatureValue> {
        serde_json::from_slice(bytes).map_err(|e| Error::decode(format!("json feature value: {}", e)))
    }

    fn encode_marker(&self, marker: TimestampMarker) -> Result<Vec<u8>> {
        serde_json::to_vec(&marker).map_err(|e| Error::encoding(format!("json: {}", e)))
    }

    fn decode_marker(&self, bytes: &[u8]) -> Result<TimestampMarker> {
        serde_json::from_slice(bytes).map_err(|e| Error::decode(format!("json timestamp: {}", e)))
    }
}

/// Codec selector used in configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    #[default]
    Bincode,
    Json,
}

impl CodecKind {
    pub fn build(self) -> Arc<dyn ValueCodec> {
        match self {
            CodecKind::Bincode => Arc::new(BincodeCodec),
            CodecKind::Json => Arc::new(JsonCodec),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn samples() -> Vec<FeatureValue> {
        vec![
            FeatureValue::Null,
            FeatureValue::Int(-42),
            FeatureValue::Float(1.0),
            FeatureValue::String("sedan".into()),
            FeatureValue::Bool(true),
            FeatureValue::Bytes(vec![0, 1, 2]),
            FeatureValue::ArrayInt(vec![]),
            FeatureValue::ArrayFloat(vec![]),
            FeatureValue::ArrayString(vec!["a".into(), "b".into()]),
            FeatureValue::Date(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()),
        ]
    }

    #[test]
    fn test_codecs_preserve_value_types() {
        for codec in [CodecKind::Bincode.build(), CodecKind::Json.build()] {
            for value in samples() {
                let bytes = codec.encode_value(&value).unwrap();
                assert!(!bytes.is_empty(), "{} produced empty bytes", codec.name());
                assert_eq!(codec.decode_value(&bytes).unwrap(), value, "{}", codec.name());
            }
        }
    }

    #[test]
    fn test_non_finite_floats() {
        let values = [
            FeatureValue::Float(f64::NAN),
            FeatureValue::Float(f64::NEG_INFINITY),
            FeatureValue::ArrayFloat(vec![1.0, f64::INFINITY]),
        ];

        let bincode = BincodeCodec;
        for value in &values {
            let decoded = bincode.decode_value(&bincode.encode_value(value).unwrap()).unwrap();
            match (value, decoded) {
                (FeatureValue::Float(v), FeatureValue::Float(d)) => {
                    assert_eq!(v.to_bits(), d.to_bits())
                }
                (FeatureValue::ArrayFloat(v), FeatureValue::ArrayFloat(d)) => assert_eq!(*v, d),
                (_, other) => panic!("unexpected variant {:?}", other),
            }
        }

        let json = JsonCodec;
        for value in &values {
            assert!(matches!(json.encode_value(value), Err(Error::EncodingError(_))));
        }
        assert!(json.encode_value(&FeatureValue::ArrayFloat(vec![0.5, -2.0])).is_ok());
    }

    #[test]
    fn test_timestamp_truncates_to_seconds() {
        let ts = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::milliseconds(750);
        let codec = BincodeCodec;
        let bytes = codec.encode_timestamp(ts).unwrap();
        assert_eq!(bytes.len(), 8);
        assert_eq!(
            codec.decode_timestamp(&bytes).unwrap(),
            Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_absent_and_empty_decode_to_defaults() {
        let codec = BincodeCodec;
        assert_eq!(decode_value_or_default(&codec, None).unwrap(), FeatureValue::Null);
        assert_eq!(decode_value_or_default(&codec, Some(&[][..])).unwrap(), FeatureValue::Null);
        assert_eq!(
            decode_timestamp_or_default(&codec, None).unwrap(),
            Utc.timestamp_opt(0, 0).unwrap()
        );
        assert_eq!(
            decode_timestamp_or_default(&codec, Some(&[][..])).unwrap(),
            Utc.timestamp_opt(0, 0).unwrap()
        );
    }

    #[test]
    fn test_corrupt_bytes_are_decode_errors() {
        let codec = BincodeCodec;
        let bytes = codec.encode_value(&FeatureValue::Float(0.5)).unwrap();
        let truncated = &bytes[..bytes.len() - 3];
        assert!(matches!(
            decode_value_or_default(&codec, Some(truncated)),
            Err(Error::DecodeError(_))
        ));
        assert!(matches!(
            codec.decode_value(&[0xff, 0xff, 0xff, 0xff]),
            Err(Error::DecodeError(_))
        ));
        assert!(matches!(
            decode_timestamp_or_default(&codec, Some(&[1u8, 2, 3][..])),
            Err(Error::DecodeError(_))
        ));

        let json = JsonCodec;
        assert!(matches!(
            json.decode_value(b"{\"Float\":"),
            Err(Error::DecodeError(_))
        ));
    }

    #[test]
    fn test_out_of_range_marker_is_decode_error() {
        let marker = TimestampMarker { seconds: i64::MAX };
        assert!(matches!(marker.to_datetime(), Err(Error::DecodeError(_))));
    }

    #[test]
    fn test_codec_kind_from_yaml_name() {
        let kind: CodecKind = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(kind, CodecKind::Json);
        assert_eq!(CodecKind::default(), CodecKind::Bincode);
    }
}
