use std::sync::Arc;

use aws_config::BehaviorVersion;

use crate::api::Dispatcher;
use crate::config::{AppConfig, SecurityConfig, TableConfig};
use crate::database::{
    DynamoStore, KeyValueStore, LookupTables, MemberRepository, MemoryStore, SessionRepository, TableSchema,
};
use crate::embedding::{BatchSync, EmbeddingSync, HttpVectorIndex, OpenAiEmbedder};
use crate::media::{ImagePipeline, MemoryObjectStore, ObjectStore, S3ObjectStore};
use crate::services::MemberService;

/// Storage client handles, constructed once by the entry point
#[derive(Clone)]
pub struct Backends {
    pub store: Arc<dyn KeyValueStore>,
    pub objects: Arc<dyn ObjectStore>,
}

impl Backends {
    pub fn new(store: Arc<dyn KeyValueStore>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { store, objects }
    }

    /// DynamoDB and S3 clients from the ambient AWS configuration
    pub async fn from_config(config: &AppConfig) -> Self {
        let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        tracing::info!(
            "Using DynamoDB table {} and S3 bucket {}",
            config.tables.members,
            config.media.bucket
        );
        Self {
            store: Arc::new(DynamoStore::from_sdk_config(&sdk_config)),
            objects: Arc::new(S3ObjectStore::from_sdk_config(&sdk_config, config.media.bucket.clone())),
        }
    }

    /// In-process tables and bucket, returned alongside the concrete fakes
    pub fn in_memory(tables: &TableConfig, page_size: usize) -> (Self, Arc<MemoryStore>, Arc<MemoryObjectStore>) {
        let store = Arc::new(roster_memory_store(tables, page_size));
        let objects = Arc::new(MemoryObjectStore::new());
        let backends = Self::new(store.clone(), objects.clone());
        (backends, store, objects)
    }

    pub fn members(&self, tables: &TableConfig) -> MemberRepository {
        MemberRepository::new(&tables.members, &tables.owner_index, self.store.clone())
    }

    pub fn lookups(&self, tables: &TableConfig) -> LookupTables {
        LookupTables::new(tables, self.store.clone())
    }

    pub fn sessions(&self, tables: &TableConfig) -> SessionRepository {
        SessionRepository::new(&tables.sessions, self.store.clone())
    }

    pub fn member_service(&self, config: &AppConfig) -> MemberService {
        MemberService::new(
            self.members(&config.tables),
            self.lookups(&config.tables),
            self.sessions(&config.tables),
            ImagePipeline::new(self.objects.clone(), config.media.clone()),
        )
    }

    /// Batch embedding driver against the configured model and vector index
    pub fn batch_sync(&self, config: &AppConfig) -> BatchSync {
        let pipeline = EmbeddingSync::new(
            Arc::new(OpenAiEmbedder::new(&config.embedding)),
            Arc::new(HttpVectorIndex::new(&config.vector)),
            config.embedding.clone(),
        );
        BatchSync::new(self.members(&config.tables), self.lookups(&config.tables), pipeline)
    }
}

/// Memory store with the roster's key schemas and owner index
pub fn roster_memory_store(tables: &TableConfig, page_size: usize) -> MemoryStore {
    let store = MemoryStore::with_page_size(page_size);
    store.create_table(&tables.members, TableSchema::hash("id"));
    for lookup in [&tables.classes, &tables.races, &tables.auras, &tables.groups] {
        store.create_table(lookup, TableSchema::hash("id"));
    }
    store.create_table(&tables.sessions, TableSchema::composite("member_id", "report_id"));
    store.create_index(&tables.owner_index, "owner");
    store
}

/// Shared state of the HTTP adapter
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub security: SecurityConfig,
    pub max_request_size: usize,
}

impl AppState {
    pub fn new(config: &AppConfig, backends: &Backends) -> Self {
        Self {
            dispatcher: Dispatcher::new(backends.member_service(config), config.security.cors_origin.clone()),
            security: config.security.clone(),
            max_request_size: config.server.max_request_size_bytes,
        }
    }
}
