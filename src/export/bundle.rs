//! Model artifact bundle and its checksummed on-disk envelope

use crate::error::{AdvisorError, Result};
use crate::feature_engineering::{FeatureTransformer, RAW_FEATURE_NAMES};
use crate::preprocessing::LabelEncoder;
use crate::training::{ForestParams, RandomForestClassifier};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything the serving side needs to reproduce a prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub model: RandomForestClassifier,
    pub label_encoder: LabelEncoder,
    /// Engineered feature columns, in model input order
    pub feature_columns: Vec<String>,
    /// Raw input columns expected from callers
    pub raw_features: Vec<String>,
    pub best_params: ForestParams,
    /// Accuracy on the held-out split
    pub accuracy: f64,
}

impl ModelBundle {
    pub fn new(
        model: RandomForestClassifier,
        label_encoder: LabelEncoder,
        best_params: ForestParams,
        accuracy: f64,
    ) -> Self {
        Self {
            model,
            label_encoder,
            feature_columns: FeatureTransformer::feature_columns(),
            raw_features: RAW_FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            best_params,
            accuracy,
        }
    }

    pub fn classes(&self) -> &[String] {
        self.label_encoder.classes()
    }

    /// Encode into envelope bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(self)
            .map_err(|e| AdvisorError::SerializationError(format!("Failed to serialize bundle: {}", e)))?;
        let envelope = Envelope::new(payload);
        bincode::serialize(&envelope)
            .map_err(|e| AdvisorError::SerializationError(format!("Failed to serialize envelope: {}", e)))
    }

    /// Decode envelope bytes, verifying magic, version and checksum
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let envelope: Envelope = bincode::deserialize(bytes)
            .map_err(|e| AdvisorError::SerializationError(format!("Not a model bundle: {}", e)))?;
        envelope.verify()?;
        bincode::deserialize(&envelope.payload)
            .map_err(|e| AdvisorError::SerializationError(format!("Failed to deserialize bundle: {}", e)))
    }

    /// Save to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        fs::write(path, bytes).map_err(|e| {
            AdvisorError::SerializationError(format!("Failed to write {}: {}", path.display(), e))
        })
    }

    /// Load from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            AdvisorError::SerializationError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_bytes(&bytes)
    }
}

/// On-disk wrapper around the bincode payload
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Envelope {
    magic: [u8; 4],
    format_version: u32,
    payload: Vec<u8>,
    checksum: u64,
}

impl Envelope {
    const MAGIC: [u8; 4] = [b'C', b'R', b'P', b'M'];
    const VERSION: u32 = 1;

    fn new(payload: Vec<u8>) -> Self {
        let checksum = fnv1a(&payload);
        Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            payload,
            checksum,
        }
    }

    fn verify(&self) -> Result<()> {
        if self.magic != Self::MAGIC {
            return Err(AdvisorError::SerializationError(
                "Bad magic bytes, not a crop model bundle".to_string(),
            ));
        }
        if self.format_version != Self::VERSION {
            return Err(AdvisorError::SerializationError(format!(
                "Unsupported bundle format version {} (expected {})",
                self.format_version,
                Self::VERSION
            )));
        }
        if fnv1a(&self.payload) != self.checksum {
            return Err(AdvisorError::SerializationError(
                "Checksum verification failed - file may be corrupted".to_string(),
            ));
        }
        Ok(())
    }
}

/// FNV-1a 64-bit hash
fn fnv1a(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 14695981039346656037;
    const FNV_PRIME: u64 = 1099511628211;

    let mut hash = FNV_OFFSET;
    for byte in data {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
