use std::collections::HashMap;
use std::sync::Mutex;

use rand::Rng;

/// Recipient → thread-id mapping used by the email executor. Injected so
/// call sites never care whether the backing store is this process-lifetime
/// map or something persistent.
pub trait ThreadStore: Send + Sync {
    fn get(&self, recipient: &str) -> Option<String>;
    fn put(&self, recipient: &str, thread_id: String);
}

/// Process-lifetime store: entries survive for as long as the process and
/// are lost on restart. No eviction.
#[derive(Debug, Default)]
pub struct MemoryThreadStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl ThreadStore for MemoryThreadStore {
    fn get(&self, recipient: &str) -> Option<String> {
        self.lock().get(recipient).cloned()
    }

    fn put(&self, recipient: &str, thread_id: String) {
        self.lock().insert(recipient.to_string(), thread_id);
    }
}

/// First send to a recipient allocates a fresh id; every later send within
/// the same process reuses it.
pub fn resolve_thread_id(store: &dyn ThreadStore, recipient: &str) -> String {
    if let Some(existing) = store.get(recipient) {
        return existing;
    }

    let thread_id = new_thread_id();
    store.put(recipient, thread_id.clone());
    thread_id
}

/// Opaque `thread-<16 hex chars>` identifier.
fn new_thread_id() -> String {
    let mut bytes = [0_u8; 8];
    rand::thread_rng().fill(&mut bytes);

    let mut id = String::with_capacity(7 + bytes.len() * 2);
    id.push_str("thread-");
    for byte in bytes {
        id.push_str(&format!("{byte:02x}"));
    }
    id
}
