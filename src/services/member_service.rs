use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::sanitize::{sanitize_create, sanitize_update};
use super::ServiceError;
use crate::database::models::{LookupEntity, Member, MemberSummary, Session};
use crate::database::{LookupKind, LookupTables, MemberRepository, SessionRepository};
use crate::media::{ImagePipeline, Upload, UploadTarget};

/// Session count for one member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionCount {
    pub member_id: String,
    pub count: usize,
}

/// Member operations. Every failure comes back as a `ServiceError`.
#[derive(Clone)]
pub struct MemberService {
    members: MemberRepository,
    lookups: LookupTables,
    sessions: SessionRepository,
    media: ImagePipeline,
}

fn require_id<'a>(value: &'a str, what: &str) -> Result<&'a str, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ServiceError::Validation(format!("{} is required", what)))
    } else {
        Ok(trimmed)
    }
}

impl MemberService {
    pub fn new(
        members: MemberRepository,
        lookups: LookupTables,
        sessions: SessionRepository,
        media: ImagePipeline,
    ) -> Self {
        Self {
            members,
            lookups,
            sessions,
            media,
        }
    }

    /// Create a member. With an image the upload happens first; if the member
    /// write then fails the object is left behind.
    pub async fn create(&self, input: &Value, image: Option<Upload>) -> Result<Member, ServiceError> {
        let request = sanitize_create(input);
        if request.name.is_empty() {
            return Err(ServiceError::Validation("Name is required".into()));
        }

        let image_key = match image {
            Some(upload) => Some(self.media.store(upload, UploadTarget::Create).await?.key),
            None => None,
        };

        let member = request.into_member(Uuid::new_v4().to_string(), image_key.clone(), Utc::now());
        if let Err(err) = self.members.insert(&member).await {
            if let Some(key) = image_key {
                tracing::warn!("Member write failed after image upload; object {} is orphaned", key);
            }
            return Err(err.into());
        }

        tracing::info!("Created member {} ({})", member.id, member.name);
        Ok(member)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Member, ServiceError> {
        let id = require_id(id, "Member id")?;
        self.members
            .find(id)
            .await?
            .ok_or_else(|| ServiceError::MemberNotFound(format!("Member {} not found", id)))
    }

    /// Roster listing with the restricted projection; deleted members included
    pub async fn get_all(&self) -> Result<Vec<MemberSummary>, ServiceError> {
        Ok(self.members.list_summaries().await?)
    }

    pub async fn get_by_owner(&self, owner_id: &str) -> Result<Vec<Member>, ServiceError> {
        let owner_id = require_id(owner_id, "Owner id")?;
        Ok(self.members.find_by_owner(owner_id).await?)
    }

    /// Sparse update of the provided fields. A payload with nothing to change
    /// returns the stored record untouched.
    pub async fn update(&self, id: &str, input: &Value, image: Option<Upload>) -> Result<Member, ServiceError> {
        let id = require_id(id, "Member id")?;
        let mut patch = sanitize_update(input);
        if matches!(patch.name.as_deref(), Some("")) {
            return Err(ServiceError::Validation("Name cannot be empty".into()));
        }

        let existing = self
            .members
            .find(id)
            .await?
            .ok_or_else(|| ServiceError::MemberNotFound(format!("Member {} not found", id)))?;

        if let Some(upload) = image {
            let target = match &existing.image {
                Some(key) => UploadTarget::Replace(key.clone()),
                None => UploadTarget::Create,
            };
            let stored = self.media.store(upload, target).await?;
            if existing.image.as_deref() != Some(stored.key.as_str()) {
                patch.image = Some(stored.key);
            }
        }

        if patch.is_empty() {
            tracing::debug!("Update of member {} carried no changes", id);
            return Ok(existing);
        }

        patch.updated_at = Some(Utc::now());
        let updated = self.members.update(id, &patch).await?;
        tracing::info!("Updated member {}", id);
        Ok(updated)
    }

    /// Replace only the member's image
    pub async fn replace_image(&self, id: &str, upload: Upload) -> Result<Member, ServiceError> {
        self.update(id, &Value::Object(Default::default()), Some(upload)).await
    }

    /// Delete a member. Image removal is best effort and never blocks the delete.
    pub async fn delete(&self, id: &str) -> Result<Member, ServiceError> {
        let id = require_id(id, "Member id")?;
        let existing = self
            .members
            .find(id)
            .await?
            .ok_or_else(|| ServiceError::MemberNotFound(format!("Member {} not found", id)))?;

        if let Some(key) = &existing.image {
            if let Err(err) = self.media.delete(key).await {
                tracing::warn!("Failed to delete image {} for member {}: {}", key, id, err);
            }
        }

        self.members.delete(id).await?;
        tracing::info!("Deleted member {}", id);
        Ok(existing)
    }

    pub async fn get_lookup(&self, kind: LookupKind) -> Result<Vec<LookupEntity>, ServiceError> {
        Ok(self.lookups.list(kind).await?)
    }

    pub async fn get_classes(&self) -> Result<Vec<LookupEntity>, ServiceError> {
        self.get_lookup(LookupKind::Classes).await
    }

    pub async fn get_races(&self) -> Result<Vec<LookupEntity>, ServiceError> {
        self.get_lookup(LookupKind::Races).await
    }

    pub async fn get_auras(&self) -> Result<Vec<LookupEntity>, ServiceError> {
        self.get_lookup(LookupKind::Auras).await
    }

    pub async fn get_groups(&self) -> Result<Vec<LookupEntity>, ServiceError> {
        self.get_lookup(LookupKind::Groups).await
    }

    pub async fn get_sessions_by_member_id(&self, member_id: &str) -> Result<Vec<Session>, ServiceError> {
        let member_id = require_id(member_id, "Member id")?;
        Ok(self.sessions.find_by_member(member_id).await?)
    }

    pub async fn count_sessions_by_member_id(&self, member_id: &str) -> Result<SessionCount, ServiceError> {
        let member_id = require_id(member_id, "Member id")?;
        let count = self.sessions.count_by_member(member_id).await?;
        Ok(SessionCount {
            member_id: member_id.to_string(),
            count,
        })
    }
}
