use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use sandbox_protocol::{SandboxField, SandboxRecord};

use super::{ProfileStore, StoreError, StoreResult, User, session_verifier};

#[derive(Debug, Default)]
struct Profiles {
    next_id: i64,
    emails: HashMap<String, i64>,
    sessions: HashMap<String, i64>,
    meta: HashMap<i64, HashMap<String, String>>,
}

/// In-memory profile store; contents are lost on drop.
#[derive(Debug, Clone, Default)]
pub struct MemProfileStore {
    inner: Arc<Mutex<Profiles>>,
}

impl MemProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Profiles>> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl ProfileStore for MemProfileStore {
    fn put_user(&self, email: &str) -> StoreResult<User> {
        let mut profiles = self.lock()?;
        let id = match profiles.emails.get(email) {
            Some(id) => *id,
            None => {
                profiles.next_id += 1;
                let id = profiles.next_id;
                profiles.emails.insert(email.to_string(), id);
                id
            }
        };
        Ok(User {
            id,
            email: email.to_string(),
        })
    }

    fn put_session(&self, token: &str, user_id: i64) -> StoreResult<()> {
        self.lock()?
            .sessions
            .insert(session_verifier(token), user_id);
        Ok(())
    }

    fn user_for_session(&self, token: &str) -> StoreResult<Option<User>> {
        let profiles = self.lock()?;
        let Some(id) = profiles.sessions.get(&session_verifier(token)).copied() else {
            return Ok(None);
        };
        Ok(profiles
            .emails
            .iter()
            .find(|(_, uid)| **uid == id)
            .map(|(email, _)| User {
                id,
                email: email.clone(),
            }))
    }

    fn put_sandbox(&self, user_id: i64, record: &SandboxRecord) -> StoreResult<()> {
        let mut profiles = self.lock()?;
        let meta = profiles.meta.entry(user_id).or_default();
        for (key, value) in record.meta_entries() {
            meta.insert(key.to_string(), value);
        }
        Ok(())
    }

    fn sandbox_meta(&self, user_id: i64) -> StoreResult<HashMap<String, String>> {
        let profiles = self.lock()?;
        let Some(meta) = profiles.meta.get(&user_id) else {
            return Ok(HashMap::new());
        };
        Ok(SandboxField::all_meta_keys()
            .filter_map(|key| meta.get(key).map(|v| (key.to_string(), v.clone())))
            .collect())
    }

    fn delete_sandbox(&self, user_id: i64) -> StoreResult<()> {
        let mut profiles = self.lock()?;
        if let Some(meta) = profiles.meta.get_mut(&user_id) {
            for key in SandboxField::all_meta_keys() {
                meta.remove(key);
            }
        }
        Ok(())
    }
}
