//! Per-form verification session.
//!
//! At most one attempt matters at a time: every upload bumps a generation
//! counter, and an attempt that finishes after a newer one started reports
//! itself as superseded instead of delivering its outcome.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::decision::DocumentVerifier;
use super::types::{DocumentImage, VerificationOutcome};
use super::VerificationError;

/// What a submitted attempt resolved to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionOutcome {
    /// The attempt was still the latest when it finished.
    Completed(VerificationOutcome),
    /// A newer upload started while this attempt was running; its result
    /// must not overwrite the newer state.
    Superseded { generation: u64 },
}

/// Shared handle for one registration form. Cheap to clone.
#[derive(Clone)]
pub struct VerificationSession {
    verifier: Arc<DocumentVerifier>,
    generation: Arc<AtomicU64>,
}

impl VerificationSession {
    pub fn new(verifier: DocumentVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start a new attempt, superseding any attempt still in flight.
    pub fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Supersede the in-flight attempt without starting a new one
    /// (e.g. the user cleared the upload).
    pub fn invalidate(&self) {
        let generation = self.begin();
        info!(generation, "Verification session invalidated");
    }

    /// Verify on the blocking pool.
    ///
    /// Errors from a superseded attempt are swallowed into `Superseded` as
    /// well: nothing from a stale upload reaches the caller.
    pub async fn submit(
        &self,
        image: DocumentImage,
        claimed: String,
    ) -> Result<SessionOutcome, VerificationError> {
        let generation = self.begin();
        info!(generation, "Verification attempt started");

        let verifier = Arc::clone(&self.verifier);
        let joined =
            tokio::task::spawn_blocking(move || verifier.verify(&image, &claimed)).await;

        if !self.is_current(generation) {
            warn!(generation, "Verification attempt superseded by a newer upload");
            return Ok(SessionOutcome::Superseded { generation });
        }

        let outcome = joined.map_err(|e| VerificationError::TaskJoin(e.to_string()))??;
        info!(generation, status = outcome.status(), "Verification attempt completed");
        Ok(SessionOutcome::Completed(outcome))
    }
}
