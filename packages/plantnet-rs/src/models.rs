use serde::{Deserialize, Serialize};

/// Top-level response of the PlantNet v2 identify endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyResponse {
    #[serde(default)]
    pub results: Vec<IdentifyResult>,
    #[serde(rename = "bestMatch", default)]
    pub best_match: Option<String>,
}

/// One candidate species with its confidence score (0.0 - 1.0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyResult {
    pub score: f64,
    pub species: Species,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    #[serde(rename = "scientificNameWithoutAuthor")]
    pub scientific_name: String,
    #[serde(rename = "commonNames", default)]
    pub common_names: Vec<String>,
    #[serde(default)]
    pub family: Option<Taxon>,
    #[serde(default)]
    pub genus: Option<Taxon>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Taxon {
    #[serde(rename = "scientificNameWithoutAuthor")]
    pub scientific_name: String,
}

impl IdentifyResult {
    /// Preferred display name: first common name, falling back to the
    /// scientific name.
    pub fn display_name(&self) -> &str {
        self.species
            .common_names
            .first()
            .map(String::as_str)
            .unwrap_or(self.species.scientific_name.as_str())
    }
}
