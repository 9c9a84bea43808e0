use axum::extract::{Extension, Multipart};
use axum::Json;
use serde_json::{json, Value};

use crate::common::ApiError;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

/// POST /api/identify
///
/// Standalone species identification: upload an image, get back the best
/// match (or `identified: false` when the recognizer finds nothing).
pub async fn identify_handler(
    _auth: AuthUser,
    Extension(state): Extension<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut image: Option<(Vec<u8>, String, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::invalid(format!("Malformed form data: {}", e)))?
    {
        if field.name() == Some("image") {
            let file_name = field.file_name().unwrap_or("upload.jpg").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            if !content_type.starts_with("image/") {
                return Err(ApiError::invalid("Only image files are allowed"));
            }
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::invalid(format!("Failed to read image: {}", e)))?;
            image = Some((bytes.to_vec(), file_name, content_type));
        }
    }

    let Some((bytes, file_name, content_type)) = image else {
        return Err(ApiError::invalid("Image is required"));
    };

    // The recognizer cannot process WebP uploads
    if content_type == "image/webp" || file_name.to_lowercase().ends_with(".webp") {
        return Err(ApiError::invalid(
            "WebP format is not supported. Please use JPG or PNG.",
        ));
    }

    let species = state
        .deps
        .plant_identifier
        .identify(bytes, &file_name, &content_type)
        .await
        .map_err(ApiError::Internal)?;

    match species {
        Some(s) => Ok(Json(json!({
            "identified": true,
            "plant": {
                "commonName": s.common_name,
                "scientificName": s.scientific_name,
                "confidence": s.confidence,
                "family": s.family,
                "genus": s.genus,
                "alternativeNames": s.alternative_names,
            },
        }))),
        None => Ok(Json(json!({
            "identified": false,
            "error": "No plant could be identified from the image",
        }))),
    }
}
