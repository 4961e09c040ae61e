// src/storage/state_store.rs
//! File-backed snapshots of the root chain state
//!
//! Layout: `b"PLRC" | version (1 byte) | sha256(payload) (32 bytes) | payload`,
//! where the payload is the Borsh encoding of `RootChainState`. Snapshots are
//! written to a sibling temporary file and renamed over the target, so a
//! reader sees either the old or the new snapshot.

use borsh::{BorshDeserialize, BorshSerialize};
use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error_handling::{RootChainError, RootChainResult};
use crate::root_chain::{RootChain, RootChainState};
use crate::RootChainConfig;

/// Leading bytes of every snapshot
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"PLRC";

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u8 = 2;

const HEADER_LENGTH: usize = SNAPSHOT_MAGIC.len() + 1 + 32;

/// Snapshot file store
#[derive(Debug, Clone)]
pub struct StateStore {
    /// Snapshot path
    path: PathBuf,
}

impl StateStore {
    /// Create a store writing to `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Snapshot path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encode a state into snapshot bytes
    pub fn encode(state: &RootChainState) -> RootChainResult<Vec<u8>> {
        let payload = state
            .try_to_vec()
            .map_err(|e| RootChainError::Storage(format!("cannot encode state: {}", e)))?;
        let checksum = Sha256::digest(&payload);

        let mut bytes = Vec::with_capacity(HEADER_LENGTH + payload.len());
        bytes.extend_from_slice(&SNAPSHOT_MAGIC);
        bytes.push(SNAPSHOT_VERSION);
        bytes.extend_from_slice(&checksum);
        bytes.extend_from_slice(&payload);

        Ok(bytes)
    }

    /// Decode and verify snapshot bytes
    pub fn decode(bytes: &[u8]) -> RootChainResult<RootChainState> {
        if bytes.len() < HEADER_LENGTH {
            return Err(RootChainError::Storage(format!(
                "snapshot of {} bytes is shorter than its header",
                bytes.len()
            )));
        }

        let (magic, rest) = bytes.split_at(SNAPSHOT_MAGIC.len());
        if magic != SNAPSHOT_MAGIC {
            return Err(RootChainError::Storage("not a root chain snapshot".to_string()));
        }

        let (version, rest) = rest.split_at(1);
        if version[0] != SNAPSHOT_VERSION {
            return Err(RootChainError::Storage(format!(
                "unsupported snapshot version {}",
                version[0]
            )));
        }

        let (checksum, payload) = rest.split_at(32);
        if Sha256::digest(payload).as_slice() != checksum {
            return Err(RootChainError::Storage("snapshot checksum mismatch".to_string()));
        }

        RootChainState::try_from_slice(payload)
            .map_err(|e| RootChainError::Storage(format!("cannot decode state: {}", e)))
    }

    /// Atomically replace the snapshot with `state`
    pub fn save(&self, state: &RootChainState) -> RootChainResult<()> {
        let bytes = Self::encode(state)?;
        let temp_path = self.temp_path();

        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;

        info!(
            "Saved root chain snapshot of {} bytes to {}",
            bytes.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Load the snapshot, or `None` if none was saved yet
    pub fn load(&self) -> RootChainResult<Option<RootChainState>> {
        if !self.path.exists() {
            debug!("No snapshot at {}", self.path.display());
            return Ok(None);
        }

        let bytes = fs::read(&self.path)?;
        match Self::decode(&bytes) {
            Ok(state) => {
                info!("Loaded root chain snapshot from {}", self.path.display());
                Ok(Some(state))
            }
            Err(error) => {
                warn!("Rejected snapshot {}: {}", self.path.display(), error);
                Err(error)
            }
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RootChain {
    /// Resume from the snapshot in `store`, or start fresh if there is none
    pub fn open(config: RootChainConfig, store: &StateStore) -> RootChainResult<Self> {
        match store.load()? {
            Some(state) => RootChain::restore(config, state),
            None => RootChain::new(config),
        }
    }

    /// Write the current state to `store`
    pub fn save(&self, store: &StateStore) -> RootChainResult<()> {
        store.save(&self.state)
    }
}
