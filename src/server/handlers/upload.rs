//! Image upload API handler.

use axum::{
    Json,
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use super::{ApiError, error_response, reject};
use crate::error::PixxelError;
use crate::render::{self, ExportFormat};
use crate::server::auth::authenticate;
use crate::server::state::AppState;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "gif"];

/// Bounding box of generated thumbnails.
const THUMBNAIL_SIZE: (u32, u32) = (400, 300);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub thumbnail_url: String,
    pub width: u32,
    pub height: u32,
}

/// Lowercased extension of `file_name` if it is an accepted image type.
pub fn allowed_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

struct Decoded {
    width: u32,
    height: u32,
    thumbnail: Vec<u8>,
}

fn decode_and_thumbnail(bytes: &[u8]) -> Result<Decoded, PixxelError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| PixxelError::Validation(format!("Failed to decode image: {}", e)))?;
    let thumb = img.thumbnail(THUMBNAIL_SIZE.0, THUMBNAIL_SIZE.1);
    let thumbnail = render::encode(&thumb.to_rgba8(), ExportFormat::Jpeg80)?;
    Ok(Decoded {
        width: img.width(),
        height: img.height(),
        thumbnail,
    })
}

/// POST /api/upload - Store an image and a thumbnail.
///
/// Multipart fields: `file` (the image) and optionally `fileName`, which
/// overrides the part's own file name.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    authenticate(&state, &headers).await?;

    let mut data: Option<Vec<u8>> = None;
    let mut part_name: Option<String> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, format!("Multipart error: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                part_name = field.file_name().map(String::from);
                let bytes = field.bytes().await.map_err(|e| {
                    error_response(StatusCode::BAD_REQUEST, format!("Failed to read file: {}", e))
                })?;
                data = Some(bytes.to_vec());
            }
            "fileName" => {
                let text = field.text().await.map_err(|e| {
                    error_response(StatusCode::BAD_REQUEST, format!("Invalid fileName: {}", e))
                })?;
                file_name = Some(text);
            }
            _ => {}
        }
    }

    let data = data.ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "No file provided"))?;
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            "File too large (max 20MB)",
        ));
    }
    let name = file_name.or(part_name).unwrap_or_default();
    let ext = allowed_extension(&name).ok_or_else(|| {
        error_response(
            StatusCode::BAD_REQUEST,
            "Unsupported file type. Use PNG, JPG, WEBP or GIF.",
        )
    })?;

    let (decoded, data) =
        tokio::task::spawn_blocking(move || decode_and_thumbnail(&data).map(|d| (d, data)))
            .await
            .map_err(|e| {
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Processing error: {}", e),
                )
            })?
            .map_err(reject)?;

    let id = Uuid::new_v4();
    let stored = format!("{}.{}", id, ext);
    let thumb = format!("{}_thumb.jpg", id);
    let dir = &state.config.media_dir;
    let write = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(dir.join(&stored), &data).await?;
        tokio::fs::write(dir.join(&thumb), &decoded.thumbnail).await
    };
    write.await.map_err(|e| reject(e.into()))?;

    tracing::info!(
        file = %stored,
        width = decoded.width,
        height = decoded.height,
        bytes = data.len(),
        "Stored upload"
    );
    Ok(Json(UploadResponse {
        success: true,
        url: state.media_url(&stored),
        thumbnail_url: state.media_url(&thumb),
        width: decoded.width,
        height: decoded.height,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_extension() {
        assert_eq!(allowed_extension("photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(allowed_extension("a.b.webp").as_deref(), Some("webp"));
        assert_eq!(allowed_extension("doc.pdf"), None);
        assert_eq!(allowed_extension("noext"), None);
    }

    #[test]
    fn test_thumbnail_fits_box() {
        let img = image::RgbaImage::from_pixel(800, 200, image::Rgba([1, 2, 3, 255]));
        let png = render::encode(&img, ExportFormat::Png).unwrap();
        let decoded = decode_and_thumbnail(&png).unwrap();
        assert_eq!((decoded.width, decoded.height), (800, 200));
        let thumb = image::load_from_memory(&decoded.thumbnail).unwrap();
        assert_eq!(thumb.width(), 400);
        assert_eq!(thumb.height(), 100);
    }
}
