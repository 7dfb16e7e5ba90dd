use super::types::BulkReport;
use crate::config::PipelineSettings;
use crate::error::Result;
use crate::index::MembershipIndex;
use crate::storage::UserStore;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Owns the collaborators shared by both bulk jobs.
pub struct BulkPipeline {
    pub(super) users: Arc<dyn UserStore>,
    pub(super) index: MembershipIndex,
    pub(super) settings: PipelineSettings,
    /// Cancelled on shutdown; each job runs under a child token.
    shutdown: CancellationToken,
}

impl BulkPipeline {
    pub fn new(
        users: Arc<dyn UserStore>,
        index: MembershipIndex,
        settings: PipelineSettings,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            users,
            index,
            settings,
            shutdown,
        }
    }

    /// Generates and stores the configured number of synthetic users.
    pub async fn dump_users(&self) -> Result<BulkReport> {
        let token = self.shutdown.child_token();
        self.dump_users_with(self.settings.generate_count, &token)
            .await
    }

    /// Rebuilds the Membership Index from the durable store.
    pub async fn load_index(&self) -> Result<BulkReport> {
        let token = self.shutdown.child_token();
        self.load_index_with(&token).await
    }
}
