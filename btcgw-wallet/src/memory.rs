//! In-memory wallet backend for tests and development.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::error::{Result, WalletError};
use crate::{Utxo, Wallet};

/// A process-local stand-in for the document collection: one entry per
/// address. Clones share state, so a fresh [`MemoryWallet`] opened on the
/// same backend observes previously persisted queues.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    docs: Arc<RwLock<HashMap<String, Vec<Utxo>>>>,
    fail_saves: Arc<AtomicBool>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent save fail, for exercising failure semantics.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    fn load(&self, address: &str) -> Vec<Utxo> {
        self.docs.read().get(address).cloned().unwrap_or_default()
    }

    fn save(&self, address: &str, utxos: Vec<Utxo>) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(WalletError::FailedToSave("save failure injected".into()));
        }
        self.docs.write().insert(address.to_string(), utxos);
        Ok(())
    }
}

/// A [`Wallet`] over a [`MemoryBackend`].
#[derive(Debug)]
pub struct MemoryWallet {
    address: String,
    backend: MemoryBackend,
    queue: Mutex<VecDeque<Utxo>>,
}

impl MemoryWallet {
    /// Open the queue for `address`, loading any previously saved state.
    pub fn open(backend: MemoryBackend, address: impl Into<String>) -> Self {
        let address = address.into();
        let queue = backend.load(&address).into();
        Self {
            address,
            backend,
            queue: Mutex::new(queue),
        }
    }

    /// Open an empty queue on a throwaway backend.
    pub fn empty(address: impl Into<String>) -> Self {
        Self::open(MemoryBackend::new(), address)
    }

    /// Current queue depth.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    fn persist(&self, queue: &VecDeque<Utxo>) -> Result<()> {
        self.backend
            .save(&self.address, queue.iter().cloned().collect())
    }
}

#[async_trait]
impl Wallet for MemoryWallet {
    async fn peek_next(&self) -> Result<Utxo> {
        self.queue.lock().front().cloned().ok_or(WalletError::Empty)
    }

    async fn next(&self) -> Result<Utxo> {
        let mut queue = self.queue.lock();
        let head = queue.pop_front().ok_or(WalletError::Empty)?;
        self.persist(&queue)
            .map_err(|e| WalletError::CouldNotGetNext(e.to_string()))?;
        Ok(head)
    }

    async fn add(&self, txid: &[u8], address: &str) -> Result<()> {
        let mut queue = self.queue.lock();
        queue.push_back(Utxo::new(txid, address));
        self.persist(&queue)
            .map_err(|e| WalletError::CouldNotAdd(e.to_string()))?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let queue = self.queue.lock();
        self.persist(&queue)
            .map_err(|e| WalletError::FailedToClose(e.to_string()))
    }
}
