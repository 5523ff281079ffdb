use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub tables: TableConfig,
    pub media: MediaConfig,
    pub embedding: EmbeddingConfig,
    pub vector: VectorConfig,
    pub sync: SyncConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub members: String,
    pub classes: String,
    pub races: String,
    pub auras: String,
    pub groups: String,
    pub sessions: String,
    pub owner_index: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub bucket: String,
    pub image_width: u32,
    pub image_height: u32,
    pub jpeg_quality: u8,
    pub max_video_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub dimensions: u32,
    pub max_chars: usize,
    pub metadata_text_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    pub url: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub concurrency: usize,
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origin: String,
    pub jwt_secret: Option<String>,
    pub verify_jwt: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(v) = env::var("ROSTER_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.server.max_request_size_bytes = v.parse().unwrap_or(self.server.max_request_size_bytes);
        }

        // Table overrides
        override_string(&mut self.tables.members, "MEMBERS_TABLE");
        override_string(&mut self.tables.classes, "CLASSES_TABLE");
        override_string(&mut self.tables.races, "RACES_TABLE");
        override_string(&mut self.tables.auras, "AURAS_TABLE");
        override_string(&mut self.tables.groups, "GROUPS_TABLE");
        override_string(&mut self.tables.sessions, "SESSIONS_TABLE");
        override_string(&mut self.tables.owner_index, "MEMBERS_OWNER_INDEX");

        // Media overrides
        override_string(&mut self.media.bucket, "MEDIA_BUCKET");
        if let Ok(v) = env::var("MEDIA_JPEG_QUALITY") {
            self.media.jpeg_quality = v.parse().unwrap_or(self.media.jpeg_quality);
        }
        if let Ok(v) = env::var("MEDIA_MAX_VIDEO_BYTES") {
            self.media.max_video_bytes = v.parse().unwrap_or(self.media.max_video_bytes);
        }

        // Embedding overrides
        override_string(&mut self.embedding.base_url, "EMBEDDING_BASE_URL");
        override_string(&mut self.embedding.api_key, "EMBEDDING_API_KEY");
        override_string(&mut self.embedding.model, "EMBEDDING_MODEL");
        if let Ok(v) = env::var("EMBEDDING_DIMENSIONS") {
            self.embedding.dimensions = v.parse().unwrap_or(self.embedding.dimensions);
        }
        if let Ok(v) = env::var("EMBEDDING_MAX_CHARS") {
            self.embedding.max_chars = v.parse().unwrap_or(self.embedding.max_chars);
        }

        // Vector index overrides
        override_string(&mut self.vector.url, "VECTOR_INDEX_URL");
        override_string(&mut self.vector.token, "VECTOR_INDEX_TOKEN");

        // Sync overrides
        if let Ok(v) = env::var("SYNC_CONCURRENCY") {
            self.sync.concurrency = v.parse().unwrap_or(self.sync.concurrency);
        }
        if let Ok(v) = env::var("SYNC_INTERVAL_MS") {
            self.sync.interval_ms = v.parse().unwrap_or(self.sync.interval_ms);
        }

        // Security overrides
        override_string(&mut self.security.cors_origin, "SECURITY_CORS_ORIGIN");
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("SECURITY_VERIFY_JWT") {
            self.security.verify_jwt = v.parse().unwrap_or(self.security.verify_jwt);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            tables: TableConfig::default(),
            media: MediaConfig::default(),
            embedding: EmbeddingConfig::default(),
            vector: VectorConfig {
                url: "http://localhost:8080".to_string(),
                token: String::new(),
            },
            sync: SyncConfig {
                concurrency: 1,
                interval_ms: 250,
            },
            security: SecurityConfig {
                cors_origin: "*".to_string(),
                jwt_secret: None,
                verify_jwt: false,
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                max_request_size_bytes: 6 * 1024 * 1024, // 6MB
            },
            tables: TableConfig::default(),
            media: MediaConfig::default(),
            embedding: EmbeddingConfig::default(),
            vector: VectorConfig {
                url: String::new(),
                token: String::new(),
            },
            sync: SyncConfig {
                concurrency: 1,
                interval_ms: 500,
            },
            security: SecurityConfig {
                cors_origin: "*".to_string(),
                jwt_secret: None,
                verify_jwt: true,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                max_request_size_bytes: 6 * 1024 * 1024, // 6MB, gateway payload ceiling
            },
            tables: TableConfig::default(),
            media: MediaConfig::default(),
            embedding: EmbeddingConfig::default(),
            vector: VectorConfig {
                url: String::new(),
                token: String::new(),
            },
            sync: SyncConfig {
                concurrency: 1,
                interval_ms: 1000,
            },
            security: SecurityConfig {
                cors_origin: "*".to_string(),
                jwt_secret: None,
                verify_jwt: true,
            },
        }
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            members: "members".to_string(),
            classes: "classes".to_string(),
            races: "races".to_string(),
            auras: "auras".to_string(),
            groups: "groups".to_string(),
            sessions: "sessions".to_string(),
            owner_index: "owner-index".to_string(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            bucket: "roster-media".to_string(),
            image_width: 300,
            image_height: 500,
            jpeg_quality: 85,
            max_video_bytes: 1024 * 1024,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1024,
            max_chars: 8000,
            metadata_text_chars: 1000,
        }
    }
}

fn override_string(target: &mut String, key: &str) {
    if let Ok(v) = env::var(key) {
        if !v.trim().is_empty() {
            *target = v.trim().to_string();
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
