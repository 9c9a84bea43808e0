//! API data types for plant listings.

use serde::Serialize;

use crate::domains::plants::models::Plant;
use crate::domains::users::data::UserSummary;

#[derive(Debug, Clone, Serialize)]
pub struct PlantData {
    pub id: String,
    pub owner: UserSummary,
    pub species_common_name: String,
    pub species_scientific_name: Option<String>,
    pub image_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub adoption_status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl PlantData {
    pub fn from_plant(plant: Plant, owner: UserSummary) -> Self {
        Self {
            id: plant.id.to_string(),
            owner,
            species_common_name: plant.species_common_name,
            species_scientific_name: plant.species_scientific_name,
            image_url: plant.image_url,
            latitude: plant.latitude,
            longitude: plant.longitude,
            description: plant.description,
            adoption_status: plant.adoption_status,
            created_at: plant.created_at,
        }
    }
}
