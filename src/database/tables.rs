use std::sync::Arc;

use crate::config::TableConfig;
use crate::database::models::{LookupEntity, Member, MemberPatch, MemberSummary, Session, SUMMARY_ATTRIBUTES};
use crate::database::repository::Repository;
use crate::database::store::{key_of, KeyValueStore, StoreError};

/// Member table, keyed by `id`, with a secondary index on `owner`
#[derive(Clone)]
pub struct MemberRepository {
    repo: Repository<Member>,
    owner_index: String,
}

impl MemberRepository {
    pub fn new(table: &str, owner_index: &str, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            repo: Repository::new(table, store),
            owner_index: owner_index.to_string(),
        }
    }

    pub async fn find(&self, id: &str) -> Result<Option<Member>, StoreError> {
        self.repo.select_one(key_of("id", id)).await
    }

    pub async fn list_all(&self) -> Result<Vec<Member>, StoreError> {
        self.repo.select_all().await
    }

    pub async fn list_summaries(&self) -> Result<Vec<MemberSummary>, StoreError> {
        self.repo.select_projected(&SUMMARY_ATTRIBUTES).await
    }

    pub async fn find_by_owner(&self, owner: &str) -> Result<Vec<Member>, StoreError> {
        self.repo.query_all(Some(&self.owner_index), "owner", owner).await
    }

    pub async fn insert(&self, member: &Member) -> Result<(), StoreError> {
        self.repo.insert(member).await
    }

    pub async fn update(&self, id: &str, patch: &MemberPatch) -> Result<Member, StoreError> {
        let changes = patch.changes()?;
        self.repo.update(key_of("id", id), changes).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.repo.delete(key_of("id", id)).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Classes,
    Races,
    Auras,
    Groups,
}

impl LookupKind {
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "classes" => Some(LookupKind::Classes),
            "races" => Some(LookupKind::Races),
            "auras" => Some(LookupKind::Auras),
            "groups" => Some(LookupKind::Groups),
            _ => None,
        }
    }
}

/// The four small reference tables, always loaded in full
#[derive(Clone)]
pub struct LookupTables {
    classes: Repository<LookupEntity>,
    races: Repository<LookupEntity>,
    auras: Repository<LookupEntity>,
    groups: Repository<LookupEntity>,
}

impl LookupTables {
    pub fn new(tables: &TableConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            classes: Repository::new(&tables.classes, store.clone()),
            races: Repository::new(&tables.races, store.clone()),
            auras: Repository::new(&tables.auras, store.clone()),
            groups: Repository::new(&tables.groups, store),
        }
    }

    pub async fn list(&self, kind: LookupKind) -> Result<Vec<LookupEntity>, StoreError> {
        let repo = match kind {
            LookupKind::Classes => &self.classes,
            LookupKind::Races => &self.races,
            LookupKind::Auras => &self.auras,
            LookupKind::Groups => &self.groups,
        };
        repo.select_all().await
    }
}

/// Session table, partitioned by `member_id` and sorted by `report_id`
#[derive(Clone)]
pub struct SessionRepository {
    repo: Repository<Session>,
}

impl SessionRepository {
    pub fn new(table: &str, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            repo: Repository::new(table, store),
        }
    }

    pub async fn find_by_member(&self, member_id: &str) -> Result<Vec<Session>, StoreError> {
        self.repo.query_all(None, "member_id", member_id).await
    }

    pub async fn count_by_member(&self, member_id: &str) -> Result<usize, StoreError> {
        self.repo.count(None, "member_id", member_id).await
    }
}
