#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use roster_api::api::{app, Dispatcher};
use roster_api::auth::{generate_jwt, Claims};
use roster_api::config::AppConfig;
use roster_api::database::{Item, KeyValueStore, MemoryStore};
use roster_api::media::MemoryObjectStore;
use roster_api::state::{AppState, Backends};

pub const BOUNDARY: &str = "rosterTestBoundary";

/// In-process application backed by the memory fakes
pub struct TestApp {
    pub config: AppConfig,
    pub router: Router,
    pub dispatcher: Dispatcher,
    pub store: Arc<MemoryStore>,
    pub objects: Arc<MemoryObjectStore>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::with_page_size(100)
    }

    /// Small page sizes force the repositories through several pages
    pub fn with_page_size(page_size: usize) -> Self {
        Self::build(AppConfig::development(), page_size)
    }

    /// Run against another profile, e.g. one that verifies token signatures
    pub fn with_config(config: AppConfig) -> Self {
        Self::build(config, 100)
    }

    fn build(config: AppConfig, page_size: usize) -> Self {
        let (backends, store, objects) = Backends::in_memory(&config.tables, page_size);
        let state = AppState::new(&config, &backends);
        Self {
            dispatcher: state.dispatcher.clone(),
            router: app(state),
            config,
            store,
            objects,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).with_context(|| format!("non-JSON body: {:?}", bytes))?
        };
        Ok(TestResponse { status, headers, body })
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<TestResponse> {
        self.send(request(Method::GET, path, token, None)?).await
    }

    pub async fn post_json(&self, path: &str, token: Option<&str>, body: &Value) -> Result<TestResponse> {
        self.send(request(Method::POST, path, token, Some(body))?).await
    }

    pub async fn put_json(&self, path: &str, token: Option<&str>, body: &Value) -> Result<TestResponse> {
        self.send(request(Method::PUT, path, token, Some(body))?).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<TestResponse> {
        self.send(request(Method::DELETE, path, token, None)?).await
    }

    pub async fn seed(&self, table: &str, item: Value) -> Result<()> {
        let item: Item = match item {
            Value::Object(map) => map,
            other => anyhow::bail!("seed item must be an object, got {}", other),
        };
        self.store.put_item(table, item).await?;
        Ok(())
    }

    pub async fn seed_member(&self, item: Value) -> Result<()> {
        let table = self.config.tables.members.clone();
        self.seed(&table, item).await
    }
}

pub fn request(method: Method, path: &str, token: Option<&str>, body: Option<&Value>) -> Result<Request<Body>> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(json)?)
        }
        None => Body::empty(),
    };
    Ok(builder.body(body)?)
}

/// Multipart request with a JSON `data` field and an optional `image` file
pub fn multipart_request(
    method: Method,
    path: &str,
    token: &str,
    data: &Value,
    image: Option<(&str, &[u8])>,
) -> Result<Request<Body>> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"data\"\r\n\r\n");
    body.extend_from_slice(serde_json::to_string(data)?.as_bytes());
    body.extend_from_slice(b"\r\n");
    if let Some((filename, bytes)) = image {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Ok(Request::builder()
        .method(method)
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))?)
}

/// Bearer token carrying the given subject and roles. The development profile
/// trusts token claims without checking the signature.
pub fn token(sub: &str, roles: &[&str]) -> String {
    generate_jwt(&Claims::new(sub, roles), "test-secret").expect("sign test token")
}

pub fn admin() -> String {
    token("admin-1", &["Administrator"])
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([20, 120, 200]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Jpeg).expect("encode jpeg");
    out.into_inner()
}

/// JPEG of pseudo-random pixels; noise defeats compression, so the file size
/// grows with the pixel count
pub fn noise_jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut seed: u32 = 0x2545_f491;
    let img = image::RgbImage::from_fn(width, height, |_, _| {
        let mut channel = || {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (seed >> 24) as u8
        };
        image::Rgb([channel(), channel(), channel()])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Jpeg).expect("encode jpeg");
    out.into_inner()
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).expect("encode png");
    out.into_inner()
}
