use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use super::document::{compose_document, truncate_chars, LookupSnapshot, ResolvedNames};
use super::{Embedder, SyncError, VectorIndex, VectorRecord};
use crate::config::EmbeddingConfig;
use crate::database::models::Member;

/// Vector id for a member
pub fn vector_id(member_id: &str) -> String {
    format!("member_{}", member_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOutcome {
    /// A fresh vector was published
    Upserted,
    /// The member is soft-deleted; any vector was removed
    Removed,
    /// Nothing to embed
    Skipped,
}

/// Publishes one member's search document to the vector index
#[derive(Clone)]
pub struct EmbeddingSync {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    config: EmbeddingConfig,
}

impl EmbeddingSync {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, config: EmbeddingConfig) -> Self {
        Self {
            embedder,
            index,
            config,
        }
    }

    pub async fn sync_member(&self, member: &Member, lookups: &LookupSnapshot) -> Result<SyncOutcome, SyncError> {
        let id = vector_id(&member.id);

        if member.is_deleted() {
            self.index.delete(&id).await?;
            tracing::info!("Removed vector {} for deleted member", id);
            return Ok(SyncOutcome::Removed);
        }

        let names = ResolvedNames::resolve(member, lookups);
        let document = compose_document(member, &names);
        if document.trim().is_empty() {
            tracing::debug!("Skipping {}: empty search document", id);
            return Ok(SyncOutcome::Skipped);
        }

        let text = truncate_chars(&document, self.config.max_chars);
        let vector = self.embedder.embed(&text).await?;
        let metadata = self.metadata(member, &names, &text);

        self.index.delete(&id).await?;
        self.index.upsert(VectorRecord { id: id.clone(), vector, metadata }).await?;

        tracing::info!("Upserted vector {} ({} chars)", id, text.chars().count());
        Ok(SyncOutcome::Upserted)
    }

    fn metadata(&self, member: &Member, names: &ResolvedNames, text: &str) -> Value {
        json!({
            "member_id": member.id,
            "name": member.name,
            "pseudonym": member.pseudonym,
            "title": member.title,
            "owner": member.owner,
            "born": member.born,
            "died": member.died,
            "level": member.level,
            "image": member.image,
            "classes": names.classes,
            "races": names.races,
            "groups": names.groups,
            "text": truncate_chars(text, self.config.metadata_text_chars),
            "synced_at": Utc::now().to_rfc3339(),
        })
    }
}
