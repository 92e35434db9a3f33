//! Where trained networks are kept between runs.

use crate::network::NeuralNetwork;
use fxhash::FxHashMap;
use std::{fs, io, path::PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not encode network: {0}")]
    Encode(String),
    #[error("store i/o failed: {0}")]
    Io(#[from] io::Error),
}

/// A key-value home for networks.
///
/// Loading never fails outright: a missing entry is `None`, and an entry that won't parse
/// is logged and treated as missing.
pub trait NetworkStore {
    fn save(&mut self, key: &str, network: &NeuralNetwork) -> Result<(), StoreError>;
    fn load(&self, key: &str) -> Option<NeuralNetwork>;
}

fn encode(network: &NeuralNetwork) -> Result<String, StoreError> {
    network
        .to_string()
        .map_err(|err| StoreError::Encode(err.to_string()))
}

fn decode(key: &str, payload: &str) -> Option<NeuralNetwork> {
    NeuralNetwork::from_str(payload)
        .inspect_err(|err| warn!("discarding stored network {key:?}: {err}"))
        .ok()
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: FxHashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a raw payload under `key`, valid or not
    pub fn insert_raw(&mut self, key: &str, payload: String) {
        self.entries.insert(key.to_string(), payload);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl NetworkStore for MemoryStore {
    fn save(&mut self, key: &str, network: &NeuralNetwork) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), encode(network)?);
        Ok(())
    }

    fn load(&self, key: &str) -> Option<NeuralNetwork> {
        decode(key, self.entries.get(key)?)
    }
}

/// One `<key>.json` file per network, in `dir`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl NetworkStore for FileStore {
    fn save(&mut self, key: &str, network: &NeuralNetwork) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), encode(network)?)?;
        Ok(())
    }

    fn load(&self, key: &str) -> Option<NeuralNetwork> {
        match fs::read_to_string(self.path(key)) {
            Ok(payload) => decode(key, &payload),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!("could not read stored network {key:?}: {err}");
                None
            }
        }
    }
}
