//! In-memory index encoding via bincode.

use tracing::{debug, instrument};

use crate::error::IndexError;
use crate::index::TreeIndex;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope written by [`TreeIndex::to_bytes`].
#[derive(serde::Serialize)]
struct IndexEnvelopeRef<'a> {
    /// Format version, always the leading field.
    format_version: u32,
    /// Number of nodes in the arena.
    node_count: usize,
    /// Number of corpus sequences.
    corpus_len: usize,
    index: &'a TreeIndex,
}

/// Owned counterpart of [`IndexEnvelopeRef`] read by [`TreeIndex::from_bytes`].
#[derive(serde::Deserialize)]
struct IndexEnvelope {
    format_version: u32,
    node_count: usize,
    corpus_len: usize,
    index: TreeIndex,
}

impl TreeIndex {
    /// Encode the index into bytes.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IndexError::Encode`] | bincode encoding failed |
    #[instrument(skip(self), fields(nodes = self.node_count()))]
    pub fn to_bytes(&self) -> Result<Vec<u8>, IndexError> {
        let envelope = IndexEnvelopeRef {
            format_version: FORMAT_VERSION,
            node_count: self.node_count(),
            corpus_len: self.corpus.len(),
            index: self,
        };
        let bytes = bincode::serialize(&envelope).map_err(|e| IndexError::Encode { source: e })?;
        debug!(size_bytes = bytes.len(), "index encoded");
        Ok(bytes)
    }

    /// Decode an index written by [`TreeIndex::to_bytes`].
    ///
    /// The format version is checked before the body is decoded, and the
    /// decoded tree is checked before it is returned: every child and member
    /// position must resolve, children come after their parent in the arena,
    /// each non-root node has exactly one parent and a centroid.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IndexError::Decode`] | bincode decoding failed |
    /// | [`IndexError::IncompatibleFormat`] | format version mismatch |
    /// | [`IndexError::CorruptIndex`] | the decoded tree is malformed |
    #[instrument(skip(bytes), fields(size_bytes = bytes.len()))]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IndexError> {
        let found: u32 =
            bincode::deserialize(bytes).map_err(|e| IndexError::Decode { source: e })?;
        if found != FORMAT_VERSION {
            return Err(IndexError::IncompatibleFormat {
                expected: FORMAT_VERSION,
                found,
            });
        }

        let envelope: IndexEnvelope =
            bincode::deserialize(bytes).map_err(|e| IndexError::Decode { source: e })?;
        debug!(
            format_version = envelope.format_version,
            node_count = envelope.node_count,
            corpus_len = envelope.corpus_len,
            "index decoded"
        );
        envelope.check_structure()?;
        Ok(envelope.index)
    }
}

fn corrupt(reason: String) -> IndexError {
    IndexError::CorruptIndex { reason }
}

impl IndexEnvelope {
    fn check_structure(&self) -> Result<(), IndexError> {
        let nodes = &self.index.nodes;
        let corpus_len = self.index.corpus.len();
        if self.node_count != nodes.len() || self.corpus_len != corpus_len {
            return Err(corrupt(format!(
                "header declares {} nodes and {} sequences, body holds {} and {corpus_len}",
                self.node_count,
                self.corpus_len,
                nodes.len()
            )));
        }
        if nodes.is_empty() {
            return Err(corrupt("no root node".to_string()));
        }

        let mut parents = vec![0usize; nodes.len()];
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 && node.centroid.is_none() {
                return Err(corrupt(format!("node {i} has no centroid")));
            }
            if let Some(&position) = node.members.iter().find(|&&p| p >= corpus_len) {
                return Err(corrupt(format!(
                    "node {i} references position {position} of a {corpus_len}-sequence corpus"
                )));
            }
            for child in &node.children {
                let c = child.index();
                if c <= i || c >= nodes.len() {
                    return Err(corrupt(format!("node {i} has invalid child {c}")));
                }
                parents[c] += 1;
            }
        }
        if let Some(i) = (1..nodes.len()).find(|&i| parents[i] != 1) {
            return Err(corrupt(format!("node {i} has {} parents", parents[i])));
        }
        Ok(())
    }
}
