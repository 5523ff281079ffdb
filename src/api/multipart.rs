use std::convert::Infallible;

use bytes::Bytes;
use futures::stream;
use serde_json::{Map, Value};

use super::request::ApiRequest;
use crate::error::ApiError;
use crate::media::Upload;

const DATA_FIELD: &str = "data";
const IMAGE_FIELD: &str = "image";

/// Decoded write payload: the record fields plus an optional file
#[derive(Debug, Default)]
pub struct Payload {
    pub data: Value,
    pub image: Option<Upload>,
}

fn is_multipart(content_type: &str) -> bool {
    content_type
        .trim_start()
        .to_ascii_lowercase()
        .starts_with("multipart/form-data")
}

/// Read a JSON or multipart body. An empty JSON body reads as `{}`.
pub async fn read_payload(request: &ApiRequest) -> Result<Payload, ApiError> {
    let body = request.body.clone();

    match request.content_type() {
        Some(content_type) if is_multipart(content_type) => read_multipart(content_type, body).await,
        _ => {
            if body.iter().all(u8::is_ascii_whitespace) {
                return Ok(Payload {
                    data: Value::Object(Map::new()),
                    image: None,
                });
            }
            Ok(Payload {
                data: serde_json::from_slice(&body)?,
                image: None,
            })
        }
    }
}

/// The body is already buffered and bounded by the transport, so the parser
/// runs without a stream size limit of its own.
async fn read_multipart(content_type: &str, body: Bytes) -> Result<Payload, ApiError> {
    let boundary = multer::parse_boundary(content_type)
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart request: {}", e)))?;
    let stream = stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut payload = Payload {
        data: Value::Object(Map::new()),
        image: None,
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(DATA_FIELD) => {
                let text = field.text().await.map_err(multipart_error)?;
                if !text.trim().is_empty() {
                    payload.data = serde_json::from_str(&text)?;
                }
            }
            Some(IMAGE_FIELD) => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if !bytes.is_empty() {
                    payload.image = Some(Upload::new(filename, bytes));
                }
            }
            other => tracing::debug!("Ignoring multipart field {:?}", other),
        }
    }

    Ok(payload)
}

fn multipart_error(err: multer::Error) -> ApiError {
    ApiError::bad_request(format!("Invalid multipart body: {}", err))
}
