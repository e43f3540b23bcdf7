use crate::*;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Append-only key/value record store.
///
/// This is the seam to whatever actually persists election state; the core
/// treats it as nothing more than a latest-value/history store and depends on
/// no consensus guarantee. Infrastructure failures surface as `Error::Ledger`
/// unmodified; the core performs no retries.
pub trait Ledger {
    /// Fetch the records stored under `key`: the full history when `history`
    /// is set, otherwise just the latest value (empty if the key is unset).
    fn fetch(&self, key: &str, history: bool) -> Result<Vec<String>, Error>;

    /// Append a value under `key`.
    fn put(&self, key: &str, value: String) -> Result<(), Error>;

    /// Append several records as one unit of work.
    ///
    /// The default implementation loops over `put`; transactional backends
    /// should override it so a vote's tally update and vote record commit
    /// atomically.
    fn put_many(&self, entries: Vec<(String, String)>) -> Result<(), Error> {
        for (key, value) in entries {
            self.put(&key, value)?;
        }
        Ok(())
    }
}

/// A simple in-memory ledger backed by a BTreeMap, for tests and embedding.
#[derive(Default)]
pub struct MemLedger {
    inner: Mutex<BTreeMap<String, Vec<String>>>,
}

impl MemLedger {
    pub fn new() -> Self {
        MemLedger::default()
    }
}

impl Ledger for MemLedger {
    fn fetch(&self, key: &str, history: bool) -> Result<Vec<String>, Error> {
        let inner = self.inner.lock().unwrap();
        let records = match inner.get(key) {
            Some(records) => records,
            None => return Ok(vec![]),
        };
        if history {
            Ok(records.clone())
        } else {
            Ok(records.last().cloned().into_iter().collect())
        }
    }

    fn put(&self, key: &str, value: String) -> Result<(), Error> {
        let mut inner = self.inner.lock().unwrap();
        inner.entry(key.to_string()).or_default().push(value);
        Ok(())
    }
}
