use axum::extract::{Extension, Multipart, Path, Query};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::common::{ApiError, PageArgs, PlantId};
use crate::domains::plants::data::PlantData;
use crate::domains::plants::models::{NewPlant, Plant};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;
use crate::server::routes::{load_user_summaries, unknown_user};

const PLANTS_FOLDER: &str = "green-guard/plants";

#[derive(Deserialize)]
pub struct ListArgs {
    pub available: Option<bool>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/plants
pub async fn list_plants_handler(
    Query(args): Query<ListArgs>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let page = PageArgs {
        page: args.page,
        limit: args.limit,
    }
    .validate();

    let plants = Plant::list(
        args.available.unwrap_or(false),
        page.limit,
        page.offset(),
        &state.db_pool,
    )
    .await
    .map_err(ApiError::Internal)?;

    let owner_ids: Vec<_> = plants.iter().map(|p| p.owner_id).collect();
    let owners = load_user_summaries(&owner_ids, &state.db_pool).await?;

    let plants: Vec<PlantData> = plants
        .into_iter()
        .map(|plant| {
            let owner = owners
                .get(&plant.owner_id)
                .cloned()
                .unwrap_or_else(unknown_user);
            PlantData::from_plant(plant, owner)
        })
        .collect();

    Ok(Json(json!({ "plants": plants })))
}

/// GET /api/plants/:id
pub async fn get_plant_handler(
    Path(plant_id): Path<PlantId>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let plant = Plant::find_by_id(plant_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Plant not found"))?;

    let owners = load_user_summaries(&[plant.owner_id], &state.db_pool).await?;
    let owner = owners
        .get(&plant.owner_id)
        .cloned()
        .unwrap_or_else(unknown_user);

    Ok(Json(json!({ "plant": PlantData::from_plant(plant, owner) })))
}

#[derive(Default)]
struct CreatePlantForm {
    species_common_name: Option<String>,
    species_scientific_name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    description: Option<String>,
    image: Option<(Vec<u8>, String, String)>,
}

/// POST /api/plants
pub async fn create_plant_handler(
    auth: AuthUser,
    Extension(state): Extension<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut form = CreatePlantForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::invalid(format!("Malformed form data: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let file_name = field.file_name().unwrap_or("plant.jpg").to_string();
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
                form.image = Some((bytes.to_vec(), file_name, content_type));
            }
            "speciesCommonName" | "species_common_name" => {
                form.species_common_name = Some(text(field).await?)
            }
            "speciesScientificName" | "species_scientific_name" => {
                form.species_scientific_name = Some(text(field).await?)
            }
            "latitude" => form.latitude = Some(number(field).await?),
            "longitude" => form.longitude = Some(number(field).await?),
            "description" => form.description = Some(text(field).await?),
            _ => {}
        }
    }

    let Some((bytes, file_name, content_type)) = form.image else {
        return Err(ApiError::invalid("Image is required"));
    };
    let Some(species_common_name) = form.species_common_name.filter(|s| !s.trim().is_empty())
    else {
        return Err(ApiError::invalid("Species name is required"));
    };
    let (Some(latitude), Some(longitude)) = (form.latitude, form.longitude) else {
        return Err(ApiError::invalid("Location coordinates are required"));
    };

    let image_url = state
        .deps
        .image_store
        .upload(bytes, &file_name, &content_type, PLANTS_FOLDER)
        .await
        .map_err(ApiError::Internal)?;

    let plant = Plant::create(
        NewPlant {
            owner_id: auth.user_id,
            species_common_name: species_common_name.trim().to_string(),
            species_scientific_name: form.species_scientific_name,
            image_url,
            latitude,
            longitude,
            description: form.description,
        },
        &state.db_pool,
    )
    .await
    .map_err(ApiError::Internal)?;

    let owners = load_user_summaries(&[plant.owner_id], &state.db_pool).await?;
    let owner = owners
        .get(&plant.owner_id)
        .cloned()
        .unwrap_or_else(unknown_user);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Plant listed",
            "plant": PlantData::from_plant(plant, owner),
        })),
    ))
}

/// DELETE /api/plants/:id
pub async fn delete_plant_handler(
    auth: AuthUser,
    Path(plant_id): Path<PlantId>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let plant = Plant::find_by_id(plant_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Plant not found"))?;

    if plant.owner_id != auth.user_id {
        return Err(ApiError::forbidden("Not authorized to delete this plant"));
    }

    Plant::delete(plant_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;

    if let Err(e) = state.deps.image_store.delete(&plant.image_url).await {
        warn!(url = %plant.image_url, error = %e, "image cleanup failed");
    }

    Ok(Json(json!({ "message": "Plant deleted" })))
}

async fn text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::invalid(format!("Malformed form data: {}", e)))
}

async fn number(field: axum::extract::multipart::Field<'_>) -> Result<f64, ApiError> {
    let value = text(field).await?;
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::invalid("Invalid coordinate"))
}
