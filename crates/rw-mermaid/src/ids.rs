//! Render identifier computation.
//!
//! Identifiers are derived per component instance from a random instance id,
//! the request sequence number and the diagram text, so they never collide
//! across instances or requests and need no process-wide counter.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::consts::{RENDER_ID_HASH_LEN, RENDER_ID_PREFIX};

/// Inputs to a render identifier.
#[derive(Debug)]
pub struct RenderKey<'a> {
    /// Component instance.
    pub instance: Uuid,
    /// Request sequence number within the instance.
    pub sequence: u64,
    /// Diagram source text.
    pub chart: &'a str,
}

impl RenderKey<'_> {
    /// Compute the identifier for this key.
    ///
    /// # Format
    ///
    /// `mermaid-` followed by the first 16 hex characters of
    /// SHA-256 over `instance || sequence (big-endian) || chart`.
    #[must_use]
    pub fn compute_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.instance.as_bytes());
        hasher.update(self.sequence.to_be_bytes());
        hasher.update(self.chart.as_bytes());
        let digest = hex::encode(hasher.finalize());
        format!("{RENDER_ID_PREFIX}-{}", &digest[..RENDER_ID_HASH_LEN])
    }
}
