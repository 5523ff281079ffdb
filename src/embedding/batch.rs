use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::{interval, Interval, MissedTickBehavior};

use super::document::LookupSnapshot;
use super::sync::{EmbeddingSync, SyncOutcome};
use super::SyncError;
use crate::database::models::Member;
use crate::database::{LookupKind, LookupTables, MemberRepository};

/// Counters for one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub total: usize,
    pub upserted: usize,
    pub removed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SyncReport {
    fn record(&mut self, result: &Result<SyncOutcome, SyncError>) {
        self.total += 1;
        match result {
            Ok(SyncOutcome::Upserted) => self.upserted += 1,
            Ok(SyncOutcome::Removed) => self.removed += 1,
            Ok(SyncOutcome::Skipped) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Batch driver: enumerates members and syncs them with bounded concurrency,
/// starting at most one member per tick of a fixed-interval ticker.
pub struct BatchSync {
    members: MemberRepository,
    lookups: LookupTables,
    pipeline: EmbeddingSync,
    concurrency: usize,
    pace: Duration,
}

impl BatchSync {
    pub fn new(members: MemberRepository, lookups: LookupTables, pipeline: EmbeddingSync) -> Self {
        Self {
            members,
            lookups,
            pipeline,
            concurrency: 1,
            pace: Duration::ZERO,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    pub async fn load_lookups(&self) -> Result<LookupSnapshot, SyncError> {
        Ok(LookupSnapshot {
            classes: self.lookups.list(LookupKind::Classes).await?,
            races: self.lookups.list(LookupKind::Races).await?,
            groups: self.lookups.list(LookupKind::Groups).await?,
        })
    }

    /// Sync every member. Per-member failures are logged and counted.
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let lookups = self.load_lookups().await?;
        let members = self.members.list_all().await?;
        tracing::info!(
            "Syncing {} members (concurrency {}, pace {:?})",
            members.len(),
            self.concurrency,
            self.pace
        );
        Ok(self.run_members(members, &lookups).await)
    }

    /// Sync a single member by id
    pub async fn run_one(&self, member_id: &str) -> Result<SyncOutcome, SyncError> {
        let member = self
            .members
            .find(member_id)
            .await?
            .ok_or_else(|| SyncError::MemberNotFound(member_id.to_string()))?;
        let lookups = self.load_lookups().await?;
        self.pipeline.sync_member(&member, &lookups).await
    }

    pub async fn run_members(&self, members: Vec<Member>, lookups: &LookupSnapshot) -> SyncReport {
        let ticker = self.ticker();

        let results: Vec<(String, Result<SyncOutcome, SyncError>)> = stream::iter(members)
            .map(|member| {
                let ticker = ticker.clone();
                async move {
                    if let Some(ticker) = ticker {
                        ticker.lock().await.tick().await;
                    }
                    let result = self.pipeline.sync_member(&member, lookups).await;
                    (member.id, result)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = SyncReport::default();
        for (member_id, result) in &results {
            if let Err(err) = result {
                tracing::error!("Embedding sync failed for member {}: {}", member_id, err);
            }
            report.record(result);
        }

        tracing::info!(
            "Embedding sync finished: {} total, {} upserted, {} removed, {} skipped, {} failed",
            report.total,
            report.upserted,
            report.removed,
            report.skipped,
            report.failed
        );
        report
    }

    fn ticker(&self) -> Option<Arc<Mutex<Interval>>> {
        if self.pace.is_zero() {
            return None;
        }
        let mut ticker = interval(self.pace);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Some(Arc::new(Mutex::new(ticker)))
    }
}
