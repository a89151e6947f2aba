//! Storage key encoding
//!
//! Every value the online store persists lives under one flat key:
//!
//! ```text
//! <project> ':' <serialized entity key> ':' <feature view> ':' <field>
//! ```
//!
//! `field` is a feature name or one of the two reserved markers, `_ts` (event
//! timestamp) and `_ex` (ingestion timestamp).
//!
//! ## Entity key layout
//!
//! All integers are little-endian. Pairs are sorted by join-key name first.
//!
//! ```text
//! | n: u32 | n x (name_len: u32 | name) | n x (tag: u8 | len: u32 | payload) |
//! ```
//!
//! The entity key is self-delimiting, and `project` / `feature_view` may not
//! contain `:`, so a key can always be split back into its four parts and no
//! two distinct addresses share a key.

use bytes::{Buf, BufMut};

use crate::{EntityKey, EntityValue, Error, Result};

/// Reserved field holding the event timestamp marker
pub const EVENT_TIMESTAMP_FIELD: &str = "_ts";

/// Reserved field holding the ingestion (created) timestamp marker
pub const CREATED_TIMESTAMP_FIELD: &str = "_ex";

const SEPARATOR: u8 = b':';

const TAG_INT32: u8 = 1;
const TAG_INT64: u8 = 2;
const TAG_STRING: u8 = 3;
const TAG_BYTES: u8 = 4;

/// The last component of a storage key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field<'a> {
    /// `_ts`
    EventTimestamp,
    /// `_ex`
    CreatedTimestamp,
    /// A real feature name
    Feature(&'a str),
}

impl<'a> Field<'a> {
    /// Maps a raw field name, recognizing the reserved markers
    pub fn parse(name: &'a str) -> Self {
        match name {
            EVENT_TIMESTAMP_FIELD => Field::EventTimestamp,
            CREATED_TIMESTAMP_FIELD => Field::CreatedTimestamp,
            other => Field::Feature(other),
        }
    }

    pub fn as_str(&self) -> &'a str {
        match self {
            Field::EventTimestamp => EVENT_TIMESTAMP_FIELD,
            Field::CreatedTimestamp => CREATED_TIMESTAMP_FIELD,
            Field::Feature(name) => name,
        }
    }
}

/// True if `name` collides with a reserved marker
pub fn is_reserved(name: &str) -> bool {
    name == EVENT_TIMESTAMP_FIELD || name == CREATED_TIMESTAMP_FIELD
}

/// Serializes an entity key into its canonical, self-delimiting form
pub fn serialize_entity_key(entity_key: &EntityKey) -> Result<Vec<u8>> {
    if entity_key.join_keys.len() != entity_key.entity_values.len() {
        return Err(Error::encoding(format!(
            "entity key has {} join keys but {} values",
            entity_key.join_keys.len(),
            entity_key.entity_values.len()
        )));
    }
    if entity_key.is_empty() {
        return Err(Error::encoding("entity key has no join keys"));
    }

    let mut pairs: Vec<(&str, &EntityValue)> = entity_key.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    if let Some(dup) = pairs.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(Error::encoding(format!(
            "join key '{}' appears more than once",
            dup[0].0
        )));
    }

    let mut buf = Vec::with_capacity(4 + pairs.len() * 24);
    buf.put_u32_le(len_u32(pairs.len())?);
    for (name, _) in &pairs {
        put_len_prefixed(&mut buf, name.as_bytes())?;
    }
    for (_, value) in &pairs {
        match value {
            EntityValue::Int32(v) => {
                buf.put_u8(TAG_INT32);
                buf.put_u32_le(4);
                buf.put_i32_le(*v);
            }
            EntityValue::Int64(v) => {
                buf.put_u8(TAG_INT64);
                buf.put_u32_le(8);
                buf.put_i64_le(*v);
            }
            EntityValue::String(v) => {
                buf.put_u8(TAG_STRING);
                put_len_prefixed(&mut buf, v.as_bytes())?;
            }
            EntityValue::Bytes(v) => {
                buf.put_u8(TAG_BYTES);
                put_len_prefixed(&mut buf, v)?;
            }
        }
    }
    Ok(buf)
}

/// Parses a serialized entity key from the front of `bytes`
///
/// Returns the key (in canonical, name-sorted order) and the number of bytes
/// consumed.
pub fn deserialize_entity_key(bytes: &[u8]) -> Result<(EntityKey, usize)> {
    let mut buf = bytes;

    let n = get_u32(&mut buf)? as usize;
    if n == 0 {
        return Err(Error::decode("entity key has no join keys"));
    }

    let mut join_keys = Vec::new();
    for _ in 0..n {
        let raw = get_len_prefixed(&mut buf)?;
        let name = String::from_utf8(raw.to_vec())
            .map_err(|e| Error::decode(format!("join key name is not utf8: {}", e)))?;
        join_keys.push(name);
    }

    let mut entity_values = Vec::with_capacity(join_keys.len());
    for _ in 0..n {
        if !buf.has_remaining() {
            return Err(Error::decode("entity key truncated before value tag"));
        }
        let tag = buf.get_u8();
        let payload = get_len_prefixed(&mut buf)?;
        let value = match tag {
            TAG_INT32 => EntityValue::Int32(i32::from_le_bytes(fixed(payload, "int32")?)),
            TAG_INT64 => EntityValue::Int64(i64::from_le_bytes(fixed(payload, "int64")?)),
            TAG_STRING => EntityValue::String(
                String::from_utf8(payload.to_vec())
                    .map_err(|e| Error::decode(format!("string join value is not utf8: {}", e)))?,
            ),
            TAG_BYTES => EntityValue::Bytes(payload.to_vec()),
            other => {
                return Err(Error::decode(format!(
                    "unknown entity value tag 0x{:02x}",
                    other
                )))
            }
        };
        entity_values.push(value);
    }

    let consumed = bytes.len() - buf.remaining();
    Ok((
        EntityKey {
            join_keys,
            entity_values,
        },
        consumed,
    ))
}

/// Shared key prefix of one (project, entity key, feature view)
///
/// A record expands into N+2 keys that differ only in their field. Building
/// the keyspace once serializes the entity key once per record instead of once
/// per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityKeyspace {
    prefix: Vec<u8>,
}

impl EntityKeyspace {
    pub fn new(project: &str, entity_key: &EntityKey, feature_view: &str) -> Result<Self> {
        validate_identifier("project", project)?;
        validate_identifier("feature view", feature_view)?;

        let entity_bin = serialize_entity_key(entity_key)?;
        let mut prefix = Vec::with_capacity(project.len() + entity_bin.len() + feature_view.len() + 3);
        prefix.put_slice(project.as_bytes());
        prefix.put_u8(SEPARATOR);
        prefix.put_slice(&entity_bin);
        prefix.put_u8(SEPARATOR);
        prefix.put_slice(feature_view.as_bytes());
        prefix.put_u8(SEPARATOR);
        Ok(Self { prefix })
    }

    /// Full storage key for `field`
    pub fn key(&self, field: Field<'_>) -> Vec<u8> {
        let name = field.as_str();
        let mut key = Vec::with_capacity(self.prefix.len() + name.len());
        key.put_slice(&self.prefix);
        key.put_slice(name.as_bytes());
        key
    }

    /// The bytes every key of this entity starts with
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }
}

/// Encodes a single storage key
///
/// # Example
///
/// ```
/// use featurekv_core::key::{encode_key, decode_key, Field};
/// use featurekv_core::EntityKey;
///
/// let entity = EntityKey::new("driver_id", 1001_i64);
/// let key = encode_key("demo", &entity, "driver_stats", Field::Feature("conv_rate")).unwrap();
///
/// let decoded = decode_key(&key).unwrap();
/// assert_eq!(decoded.project, "demo");
/// assert_eq!(decoded.entity_key, entity);
/// assert_eq!(decoded.field(), Field::Feature("conv_rate"));
/// ```
pub fn encode_key(
    project: &str,
    entity_key: &EntityKey,
    feature_view: &str,
    field: Field<'_>,
) -> Result<Vec<u8>> {
    Ok(EntityKeyspace::new(project, entity_key, feature_view)?.key(field))
}

/// A storage key split back into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedKey {
    pub project: String,
    /// Join keys in canonical (name-sorted) order
    pub entity_key: EntityKey,
    pub feature_view: String,
    pub field: String,
}

impl DecodedKey {
    pub fn field(&self) -> Field<'_> {
        Field::parse(&self.field)
    }
}

/// Splits a storage key produced by [`encode_key`]
pub fn decode_key(key: &[u8]) -> Result<DecodedKey> {
    let project_end = key
        .iter()
        .position(|b| *b == SEPARATOR)
        .ok_or_else(|| Error::decode("key has no project separator"))?;
    let project = utf8(&key[..project_end], "project")?;

    let rest = &key[project_end + 1..];
    let (entity_key, used) = deserialize_entity_key(rest)?;
    let rest = &rest[used..];
    if rest.first() != Some(&SEPARATOR) {
        return Err(Error::decode("missing separator after entity key"));
    }
    let rest = &rest[1..];

    let view_end = rest
        .iter()
        .position(|b| *b == SEPARATOR)
        .ok_or_else(|| Error::decode("key has no feature view separator"))?;
    let feature_view = utf8(&rest[..view_end], "feature view")?;
    let field = utf8(&rest[view_end + 1..], "field")?;

    Ok(DecodedKey {
        project,
        entity_key,
        feature_view,
        field,
    })
}

fn validate_identifier(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::encoding(format!("{} name is empty", kind)));
    }
    if value.as_bytes().contains(&SEPARATOR) {
        return Err(Error::encoding(format!(
            "{} name '{}' contains ':'",
            kind, value
        )));
    }
    Ok(())
}

fn len_u32(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::encoding(format!("length {} exceeds u32", len)))
}

fn put_len_prefixed(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
    buf.put_u32_le(len_u32(bytes.len())?);
    buf.put_slice(bytes);
    Ok(())
}

fn get_u32(buf: &mut &[u8]) -> Result<u32> {
    if buf.remaining() < 4 {
        return Err(Error::decode(format!(
            "entity key truncated: need 4 bytes for length, have {}",
            buf.remaining()
        )));
    }
    Ok(buf.get_u32_le())
}

fn get_len_prefixed<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8]> {
    let len = get_u32(buf)? as usize;
    if buf.len() < len {
        return Err(Error::decode(format!(
            "entity key truncated: need {} bytes, have {}",
            len,
            buf.len()
        )));
    }
    let (head, tail) = buf.split_at(len);
    *buf = tail;
    Ok(head)
}

fn fixed<const N: usize>(payload: &[u8], kind: &str) -> Result<[u8; N]> {
    payload.try_into().map_err(|_| {
        Error::decode(format!(
            "{} join value must be {} bytes, got {}",
            kind,
            N,
            payload.len()
        ))
    })
}

fn utf8(bytes: &[u8], part: &str) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| Error::decode(format!("{} is not utf8: {}", part, e)))
}
