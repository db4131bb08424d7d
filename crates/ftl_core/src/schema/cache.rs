use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::error::Result;

/// Id-keyed, load-once store of parsed schemas.
///
/// Lookups of an already loaded id only take the read lock. Loading holds a separate
/// mutex across the check-parse-insert sequence so each id is parsed once and every
/// caller gets the same `Arc`.
#[derive(Debug)]
pub struct SchemaCache<T> {
    loaded: RwLock<HashMap<String, Arc<T>>>,
    populate: Mutex<()>,
}

impl<T> Default for SchemaCache<T> {
    fn default() -> Self {
        Self {
            loaded: RwLock::new(HashMap::new()),
            populate: Mutex::new(()),
        }
    }
}

impl<T> SchemaCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Arc<T>> {
        self.loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn get_or_load(&self, id: &str, load: impl FnOnce() -> Result<T>) -> Result<Arc<T>> {
        if let Some(hit) = self.get(id) {
            return Ok(hit);
        }
        let _populating = self.populate.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = self.get(id) {
            return Ok(hit);
        }
        let value = Arc::new(load()?);
        self.loaded
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), Arc::clone(&value));
        log::debug!("cached schema {id}");
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
