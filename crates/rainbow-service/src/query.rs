//! The query service facade.
//!
//! One [`QueryService`] wraps one store handle opened for queries and is
//! shared across all transport tasks; every operation is a read.

use std::sync::Arc;

use tracing::{debug, error};

use rainbow_core::{ClientLabelSet, LabelHash, RainbowResult};
use rainbow_storage::{RainbowDb, DB_SCHEMA_VERSION};

use crate::resolver::{resolve, HealOutcome};
use crate::response::{
    CountResponse, HealResponse, HealthResponse, LabelSetSummary, VersionInfo, VersionResponse,
};

/// Protocol-agnostic facade exposing heal / count / version / health.
pub struct QueryService {
    db: Arc<RainbowDb>,
}

impl QueryService {
    /// Wrap a store handle that already passed the startup gates
    /// (see [`RainbowDb::open_for_queries`]).
    pub fn new(db: Arc<RainbowDb>) -> Self {
        Self { db }
    }

    /// Heal from wire inputs: parse and validate first, look up second.
    ///
    /// Malformed inputs produce a `BadRequest` envelope without ever touching
    /// storage.
    pub fn heal(
        &self,
        labelhash: &str,
        label_set_id: Option<&str>,
        label_set_version: Option<&str>,
    ) -> HealResponse {
        let hash = match LabelHash::from_hex(labelhash) {
            Ok(hash) => hash,
            Err(e) => return HealResponse::bad_request(e.to_string()),
        };
        let constraint = match ClientLabelSet::from_wire(label_set_id, label_set_version) {
            Ok(constraint) => constraint,
            Err(e) => return HealResponse::bad_request(e.to_string()),
        };
        self.heal_parsed(&hash, &constraint)
    }

    /// Heal already-validated inputs.
    pub fn heal_parsed(&self, hash: &LabelHash, constraint: &ClientLabelSet) -> HealResponse {
        match self.db.get_label(hash) {
            Ok(record) => match resolve(record, constraint) {
                HealOutcome::Healed(label) => {
                    debug!(labelhash = %hash, "healed");
                    HealResponse::healed(label)
                }
                HealOutcome::NotFound => {
                    debug!(labelhash = %hash, "not found");
                    HealResponse::not_found()
                }
            },
            Err(e) => {
                error!(labelhash = %hash, error = %e, "heal lookup failed");
                HealResponse::server_error()
            }
        }
    }

    /// Number of distinct healed hashes.
    pub fn label_count(&self) -> CountResponse {
        match self.db.label_count() {
            Ok(count) => CountResponse::counted(count),
            Err(e) => {
                error!(error = %e, "label count failed");
                CountResponse::server_error()
            }
        }
    }

    /// Highest known version per label set.
    pub fn server_label_sets(&self) -> RainbowResult<Vec<LabelSetSummary>> {
        Ok(self
            .db
            .list_label_sets()?
            .into_iter()
            .map(|(label_set_id, highest_label_set_version)| LabelSetSummary {
                label_set_id,
                highest_label_set_version,
            })
            .collect())
    }

    /// Version information: server version, store schema version, and the
    /// label sets the store currently holds.
    pub fn version(&self) -> RainbowResult<VersionResponse> {
        Ok(VersionResponse::new(VersionInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
            db_schema_version: DB_SCHEMA_VERSION,
            label_set: self.server_label_sets()?,
        }))
    }

    /// Liveness check.
    pub fn health_check(&self) -> HealthResponse {
        HealthResponse::ok()
    }
}
