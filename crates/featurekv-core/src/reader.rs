//! Batch reader
//!
//! For every entity key the reader issues one point get per requested feature
//! and one for the `_ts` marker, then assembles a [`FeatureRow`]. An entity
//! none of whose requested features holds a non-empty value reads as `None`.

use std::collections::HashMap;
use std::time::Instant;

use crate::codec::{decode_timestamp_or_default, decode_value_or_default, ValueCodec};
use crate::key::{is_reserved, EntityKeyspace, Field};
use crate::kv::RawKv;
use crate::{EntityKey, Error, FeatureRow, Result};

/// Reads the requested features of a feature view for each entity key
///
/// The output has one entry per input key, in the same order. Features that
/// were never written come back as [`crate::FeatureValue::Null`]; stored bytes
/// that fail to decode are a [`Error::DecodeError`].
pub async fn read_batch(
    kv: &dyn RawKv,
    codec: &dyn ValueCodec,
    project: &str,
    feature_view: &str,
    entity_keys: &[EntityKey],
    requested_features: &[String],
) -> Result<Vec<Option<FeatureRow>>> {
    if let Some(name) = requested_features.iter().find(|name| is_reserved(name)) {
        return Err(Error::invalid_input(format!(
            "'{}' is a reserved field, not a feature of '{}'",
            name, feature_view
        )));
    }

    let start = Instant::now();
    let mut result = Vec::with_capacity(entity_keys.len());
    let mut hits = 0usize;

    for entity_key in entity_keys {
        let keyspace = EntityKeyspace::new(project, entity_key, feature_view)?;

        let mut features = HashMap::with_capacity(requested_features.len());
        let mut found_any = false;
        for name in requested_features {
            let stored = kv.get(&keyspace.key(Field::Feature(name))).await?;
            // Zero-length values count as absent
            found_any |= stored.as_deref().is_some_and(|b| !b.is_empty());
            let value = decode_value_or_default(codec, stored.as_deref())?;
            features.insert(name.clone(), value);
        }

        let ts_stored = kv.get(&keyspace.key(Field::EventTimestamp)).await?;

        if !found_any {
            result.push(None);
            continue;
        }

        let event_timestamp = decode_timestamp_or_default(codec, ts_stored.as_deref())?;
        hits += 1;
        result.push(Some(FeatureRow {
            entity_key: entity_key.clone(),
            event_timestamp,
            features,
        }));
    }

    tracing::debug!(
        project = project,
        feature_view = feature_view,
        entities = entity_keys.len(),
        hits = hits,
        features = requested_features.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Online read complete"
    );

    Ok(result)
}
