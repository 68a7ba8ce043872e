//! Tree serialization and deserialization via bincode.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::CartError;
use crate::tree::CartTree;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope for a serialized tree.
#[derive(serde::Serialize, serde::Deserialize)]
struct ModelEnvelope {
    /// Format version for compatibility checking.
    format_version: u32,
    /// Number of nodes in the tree.
    n_nodes: usize,
    /// Number of terminal nodes.
    n_terminals: usize,
    /// Dimensionality the tree was grown on.
    n_features: usize,
    /// The serialized tree.
    tree: CartTree,
}

impl CartTree {
    /// Save the tree to a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CartError::SerializeModel`] | bincode encoding failed |
    /// | [`CartError::WriteModel`] | file write failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CartError> {
        let path = path.as_ref();

        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            n_nodes: self.n_nodes(),
            n_terminals: self.n_terminals(),
            n_features: self.n_features,
            tree: self.clone(),
        };

        let bytes = bincode::serialize(&envelope)
            .map_err(|e| CartError::SerializeModel { source: e })?;

        std::fs::write(path, &bytes).map_err(|e| CartError::WriteModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(size_bytes = bytes.len(), n_nodes = self.n_nodes(), "tree saved");

        Ok(())
    }

    /// Load a tree from a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CartError::ReadModel`] | file read failed |
    /// | [`CartError::DeserializeModel`] | bincode decoding failed |
    /// | [`CartError::IncompatibleModelVersion`] | format version mismatch |
    /// | [`CartError::BrokenInvariant`] | decoded maps do not form a valid tree |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CartError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| CartError::ReadModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        let envelope: ModelEnvelope =
            bincode::deserialize(&bytes).map_err(|e| CartError::DeserializeModel {
                path: path.to_path_buf(),
                source: e,
            })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(CartError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        envelope.tree.check_invariants()?;

        debug!(
            n_nodes = envelope.n_nodes,
            n_terminals = envelope.n_terminals,
            n_features = envelope.n_features,
            "tree loaded"
        );

        Ok(envelope.tree)
    }
}
