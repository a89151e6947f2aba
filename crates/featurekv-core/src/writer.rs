//! Batch writer
//!
//! Each [`FeatureRecord`] becomes `values.len() + 2` independent point writes:
//!
//! 1. `_ts` -> event timestamp marker
//! 2. `_ex` -> created timestamp marker (event timestamp if absent)
//! 3. one key per feature -> encoded value
//!
//! There is no transaction around a record or a batch. A failing put aborts
//! the batch immediately; puts that already landed stay in place (last write
//! wins on the next attempt).

use std::time::Instant;

use crate::codec::ValueCodec;
use crate::key::{is_reserved, EntityKeyspace, Field};
use crate::kv::RawKv;
use crate::{Error, FeatureRecord, Result};

/// Progress callback, called with `1` once per completed record
pub type Progress<'a> = &'a mut (dyn FnMut(usize) + Send);

/// Encodes every key/value pair of one record, in write order
///
/// Everything is encoded before the first put so that an encoding failure
/// never leaves a half-written record.
pub fn encode_record(
    codec: &dyn ValueCodec,
    project: &str,
    feature_view: &str,
    record: &FeatureRecord,
) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
    let keyspace = EntityKeyspace::new(project, &record.entity_key, feature_view)?;

    let ts_value = codec.encode_timestamp(record.event_timestamp)?;
    let ex_value = match record.created_timestamp {
        Some(created) => codec.encode_timestamp(created)?,
        None => ts_value.clone(),
    };

    let mut pairs = Vec::with_capacity(record.values.len() + 2);
    pairs.push((keyspace.key(Field::EventTimestamp), ts_value));
    pairs.push((keyspace.key(Field::CreatedTimestamp), ex_value));
    for (name, value) in &record.values {
        pairs.push((keyspace.key(Field::Feature(name)), codec.encode_value(value)?));
    }
    Ok(pairs)
}

/// Checks the whole batch before any I/O
fn validate_records(feature_view: &str, records: &[FeatureRecord]) -> Result<()> {
    for (i, record) in records.iter().enumerate() {
        if record.values.is_empty() {
            return Err(Error::invalid_input(format!(
                "record {} for entity {} in feature view '{}' has no feature values",
                i, record.entity_key, feature_view
            )));
        }
        if let Some(name) = record.values.keys().find(|name| is_reserved(name)) {
            return Err(Error::invalid_input(format!(
                "feature name '{}' in feature view '{}' is reserved",
                name, feature_view
            )));
        }
    }
    Ok(())
}

/// Writes a batch of records for one feature view
///
/// Returns the number of records written. `progress`, if supplied, is called
/// with `1` after all puts of a record have been issued.
pub async fn write_batch(
    kv: &dyn RawKv,
    codec: &dyn ValueCodec,
    project: &str,
    feature_view: &str,
    records: &[FeatureRecord],
    mut progress: Option<Progress<'_>>,
) -> Result<usize> {
    validate_records(feature_view, records)?;

    let start = Instant::now();
    let mut keys_written = 0usize;

    for record in records {
        let pairs = encode_record(codec, project, feature_view, record)?;
        for (key, value) in pairs {
            kv.put(key, value).await?;
            keys_written += 1;
        }
        if let Some(progress) = progress.as_deref_mut() {
            progress(1);
        }
    }

    tracing::debug!(
        project = project,
        feature_view = feature_view,
        records = records.len(),
        keys_written = keys_written,
        codec = codec.name(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Online write batch complete"
    );

    Ok(records.len())
}
