//! Versioned record encoding.
//!
//! Records are persisted as `{ "version": N, "data": ... }`. A bare JSON
//! object without that envelope is a version 0 record, as written by
//! clients that predate schema versioning. Loading upgrades older records
//! in memory, one version at a time, through [`Record::migrate`]; the next
//! save writes them back at [`SCHEMA_VERSION`]. Migrations are forward-only.

use crate::backend::KeyValueBackend;
use crate::error::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

/// A top-level record stored under a fixed key.
pub trait Record: Serialize + DeserializeOwned {
    /// Storage key.
    const KEY: &'static str;

    /// Upgrades `data` from `from_version` to `from_version + 1`.
    ///
    /// # Errors
    ///
    /// Returns an error if the old data cannot be upgraded.
    fn migrate(from_version: u32, data: Value) -> StoreResult<Value>;
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    data: Value,
}

fn is_envelope(value: &Value) -> bool {
    value.as_object().is_some_and(|obj| {
        obj.len() == 2
            && obj.get("version").is_some_and(Value::is_u64)
            && obj.contains_key("data")
    })
}

/// Loads and upgrades the record stored under `T::KEY`.
///
/// Returns `None` if nothing has been stored yet.
///
/// # Errors
///
/// Returns an error if the record cannot be read, is corrupted, or was
/// written by a newer schema.
pub fn load_record<T, B>(backend: &B) -> StoreResult<Option<T>>
where
    T: Record,
    B: KeyValueBackend + ?Sized,
{
    let Some(bytes) = backend.get(T::KEY)? else {
        return Ok(None);
    };

    let raw: Value = serde_json::from_slice(&bytes)?;
    let (mut version, mut data) = if is_envelope(&raw) {
        let envelope: Envelope = serde_json::from_value(raw)?;
        (envelope.version, envelope.data)
    } else if raw.is_object() {
        (0, raw)
    } else {
        return Err(StoreError::Corrupted(format!(
            "record {} is not a JSON object",
            T::KEY
        )));
    };

    if version > SCHEMA_VERSION {
        return Err(StoreError::UnsupportedVersion {
            key: T::KEY.to_string(),
            found: version,
            supported: SCHEMA_VERSION,
        });
    }

    while version < SCHEMA_VERSION {
        debug!(key = T::KEY, from = version, "migrating record");
        data = T::migrate(version, data)?;
        version += 1;
    }

    Ok(Some(serde_json::from_value(data)?))
}

/// Saves `record` under `T::KEY` at [`SCHEMA_VERSION`].
///
/// # Errors
///
/// Returns an error if encoding or the backend write fails.
pub fn save_record<T, B>(backend: &B, record: &T) -> StoreResult<()>
where
    T: Record,
    B: KeyValueBackend + ?Sized,
{
    let bytes = serde_json::to_vec(&EnvelopeRef {
        version: SCHEMA_VERSION,
        data: record,
    })?;
    backend.put(T::KEY, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Counter {
        count: u32,
    }

    impl Record for Counter {
        const KEY: &'static str = "counter";

        fn migrate(from_version: u32, mut data: Value) -> StoreResult<Value> {
            if from_version == 0 {
                if let Some(obj) = data.as_object_mut() {
                    if let Some(old) = obj.remove("n") {
                        obj.insert("count".into(), old);
                    }
                }
            }
            Ok(data)
        }
    }

    #[test]
    fn missing_record_is_none() {
        let backend = InMemoryBackend::new();
        assert_eq!(load_record::<Counter, _>(&backend).unwrap(), None);
    }

    #[test]
    fn save_writes_envelope() {
        let backend = InMemoryBackend::new();
        save_record(&backend, &Counter { count: 3 }).unwrap();

        let raw: Value = serde_json::from_slice(&backend.raw("counter").unwrap()).unwrap();
        assert_eq!(raw, json!({"version": 1, "data": {"count": 3}}));
        assert_eq!(
            load_record::<Counter, _>(&backend).unwrap(),
            Some(Counter { count: 3 })
        );
    }

    #[test]
    fn unversioned_record_is_migrated() {
        let backend = InMemoryBackend::with_entry("counter", br#"{"n": 7}"#);
        assert_eq!(
            load_record::<Counter, _>(&backend).unwrap(),
            Some(Counter { count: 7 })
        );
    }

    #[test]
    fn newer_version_is_rejected() {
        let backend =
            InMemoryBackend::with_entry("counter", br#"{"version": 9, "data": {"count": 1}}"#);
        assert!(matches!(
            load_record::<Counter, _>(&backend),
            Err(StoreError::UnsupportedVersion { found: 9, .. })
        ));
    }

    #[test]
    fn non_object_is_corrupted() {
        let backend = InMemoryBackend::with_entry("counter", b"[1, 2]");
        assert!(matches!(
            load_record::<Counter, _>(&backend),
            Err(StoreError::Corrupted(_))
        ));
    }
}
