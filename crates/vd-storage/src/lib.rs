use anyhow::{Context, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, warn};
use vd_api_types::NetId;

/// Key shared by the session and durable slots.
pub const NET_ID_KEY: &str = "netId";

/// String key/value storage in the shape of the browser's Web Storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Durable store backed by a flat JSON object on disk.
///
/// The whole file is rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RefCell<BTreeMap<String, String>>,
}

impl JsonFileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("read state file {}", path.display()))?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)
                    .with_context(|| format!("parse state file {}", path.display()))?
            }
        } else {
            debug!("state file {} not found, starting empty", path.display());
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: RefCell::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let serialized = {
            let mut entries = self.entries.borrow_mut();
            entries.insert(key.to_owned(), value.to_owned());
            serde_json::to_vec_pretty(&*entries)?
        };
        std::fs::write(&self.path, serialized)
            .with_context(|| format!("write state file {}", self.path.display()))?;
        Ok(())
    }
}

/// The two `netId` slots: session-scoped and durable.
#[derive(Clone)]
pub struct NetIdSlots {
    session: Rc<dyn KeyValueStore>,
    durable: Rc<dyn KeyValueStore>,
}

impl NetIdSlots {
    pub fn new(session: Rc<dyn KeyValueStore>, durable: Rc<dyn KeyValueStore>) -> Self {
        Self { session, durable }
    }

    /// Id chosen earlier in this session, if the slot holds a number.
    pub fn session_net_id(&self) -> Result<Option<NetId>> {
        let raw = self.session.get(NET_ID_KEY)?;
        Ok(raw.and_then(|value| match value.parse::<NetId>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!("ignoring malformed session netId {value:?}");
                None
            }
        }))
    }

    /// Raw durable slot value; trusted only after a registry check.
    pub fn durable_net_id(&self) -> Result<Option<String>> {
        self.durable.get(NET_ID_KEY)
    }

    pub fn persist(&self, net_id: NetId) -> Result<()> {
        let value = net_id.to_string();
        self.durable.set(NET_ID_KEY, &value)?;
        self.session.set(NET_ID_KEY, &value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persist_writes_both_slots() -> Result<()> {
        let session = Rc::new(MemoryStore::new());
        let durable = Rc::new(MemoryStore::with_entry(NET_ID_KEY, "42"));
        let slots = NetIdSlots::new(session.clone(), durable.clone());

        assert_eq!(slots.session_net_id()?, None);
        assert_eq!(slots.durable_net_id()?.as_deref(), Some("42"));

        slots.persist(NetId(77))?;
        assert_eq!(session.get(NET_ID_KEY)?.as_deref(), Some("77"));
        assert_eq!(durable.get(NET_ID_KEY)?.as_deref(), Some("77"));
        assert_eq!(slots.session_net_id()?, Some(NetId(77)));
        Ok(())
    }

    #[test]
    fn malformed_session_slot_reads_as_empty() -> Result<()> {
        let slots = NetIdSlots::new(
            Rc::new(MemoryStore::with_entry(NET_ID_KEY, "undefined")),
            Rc::new(MemoryStore::new()),
        );
        assert_eq!(slots.session_net_id()?, None);
        Ok(())
    }

    #[test]
    fn file_store_survives_reopen() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("state.json");

        {
            let store = JsonFileStore::open(&path)?;
            assert_eq!(store.get(NET_ID_KEY)?, None);
            store.set(NET_ID_KEY, "99")?;
        }

        let reopened = JsonFileStore::open(&path)?;
        assert_eq!(reopened.get(NET_ID_KEY)?.as_deref(), Some("99"));
        Ok(())
    }

    #[test]
    fn file_store_rejects_corrupt_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json")?;

        assert!(JsonFileStore::open(&path).is_err());
        Ok(())
    }
}
