use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use uuid::Uuid;

use super::{MediaError, ObjectStore};
use crate::config::MediaConfig;

const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "webp", "bmp", "avif"];
const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "mov", "webm", "m4v", "avi", "mkv"];

/// Raw file as received in a multipart body
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Bytes,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedType {
    pub kind: MediaKind,
    pub extension: String,
    pub content_type: String,
}

/// Where an upload goes: a fresh random key, or overwrite an existing object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadTarget {
    Create,
    Replace(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub content_type: String,
    pub size: usize,
}

/// Normalizes uploads and writes them to the object store
#[derive(Clone)]
pub struct ImagePipeline {
    store: Arc<dyn ObjectStore>,
    config: MediaConfig,
}

impl ImagePipeline {
    pub fn new(store: Arc<dyn ObjectStore>, config: MediaConfig) -> Self {
        Self { store, config }
    }

    /// Classify by byte signature; the filename extension is only consulted
    /// when the content is not recognised.
    pub fn detect(upload: &Upload) -> Result<DetectedType, MediaError> {
        if let Some(kind) = infer::get(&upload.bytes) {
            let media_kind = match kind.matcher_type() {
                infer::MatcherType::Image => Some(MediaKind::Image),
                infer::MatcherType::Video => Some(MediaKind::Video),
                _ => None,
            };
            if let Some(media_kind) = media_kind {
                return Ok(DetectedType {
                    kind: media_kind,
                    extension: kind.extension().to_string(),
                    content_type: kind.mime_type().to_string(),
                });
            }
        }

        let extension = Path::new(&upload.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            let content_type = format!("image/{}", if extension == "jpg" { "jpeg" } else { extension.as_str() });
            Ok(DetectedType {
                kind: MediaKind::Image,
                extension,
                content_type,
            })
        } else if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
            let content_type = match extension.as_str() {
                "mov" => "video/quicktime".to_string(),
                "m4v" => "video/x-m4v".to_string(),
                "avi" => "video/x-msvideo".to_string(),
                "mkv" => "video/x-matroska".to_string(),
                other => format!("video/{}", other),
            };
            Ok(DetectedType {
                kind: MediaKind::Video,
                extension,
                content_type,
            })
        } else {
            Err(MediaError::UnsupportedType(upload.filename.clone()))
        }
    }

    /// Center-crop and resize to the configured frame, re-encoded as JPEG
    pub fn normalize_image(&self, bytes: &[u8]) -> Result<Vec<u8>, MediaError> {
        let source = image::load_from_memory(bytes).map_err(|e| MediaError::Decode(e.to_string()))?;
        let framed = source
            .resize_to_fill(self.config.image_width, self.config.image_height, FilterType::Triangle)
            .to_rgb8();

        let mut out = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut out, self.config.jpeg_quality);
        framed
            .write_with_encoder(encoder)
            .map_err(|e| MediaError::Decode(e.to_string()))?;
        Ok(out.into_inner())
    }

    /// Produce the bytes and metadata that will be written for an upload
    async fn prepare(&self, upload: Upload) -> Result<(Bytes, &'static str, String), MediaError> {
        let detected = Self::detect(&upload)?;
        match detected.kind {
            MediaKind::Image => {
                let pipeline = self.clone();
                let bytes = upload.bytes;
                let encoded = tokio::task::spawn_blocking(move || pipeline.normalize_image(&bytes))
                    .await
                    .map_err(|e| MediaError::Decode(e.to_string()))??;
                Ok((Bytes::from(encoded), "jpg", "image/jpeg".to_string()))
            }
            MediaKind::Video => {
                let limit = self.config.max_video_bytes;
                if upload.bytes.len() > limit {
                    return Err(MediaError::TooLarge {
                        size: upload.bytes.len(),
                        limit,
                    });
                }
                let extension = match detected.extension.as_str() {
                    "mp4" => "mp4",
                    "mov" => "mov",
                    "webm" => "webm",
                    "m4v" => "m4v",
                    "avi" => "avi",
                    "mkv" => "mkv",
                    _ => "bin",
                };
                Ok((upload.bytes, extension, detected.content_type))
            }
        }
    }

    /// Normalize and write an upload. Replacing requires the object to exist.
    pub async fn store(&self, upload: Upload, target: UploadTarget) -> Result<StoredObject, MediaError> {
        let filename = upload.filename.clone();
        let (body, extension, content_type) = self.prepare(upload).await?;

        let key = match target {
            UploadTarget::Create => format!("{}.{}", Uuid::new_v4(), extension),
            UploadTarget::Replace(key) => {
                if !self.store.exists(&key).await? {
                    return Err(MediaError::NotFound(key));
                }
                key
            }
        };

        let size = body.len();
        self.store.put(&key, body, &content_type).await?;
        tracing::info!("Stored {} as {} ({} bytes)", filename, key, size);

        Ok(StoredObject {
            key,
            content_type,
            size,
        })
    }

    pub async fn delete(&self, key: &str) -> Result<(), MediaError> {
        self.store.delete(key).await
    }
}
