// Client for the PlantNet identification API
// https://my.plantnet.org/doc/openapi

pub mod models;

use reqwest::multipart::{Form, Part};
use reqwest::Client;

use crate::models::IdentifyResponse;

const BASE_URL: &str = "https://my-api.plantnet.org/v2/identify/all";

#[derive(Debug, Clone)]
pub struct PlantNetOptions {
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct PlantNetService {
    options: PlantNetOptions,
    client: Client,
}

impl PlantNetService {
    pub fn new(options: PlantNetOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    /// Identify the plant on an image.
    ///
    /// `organ` selects the plant organ hint ("auto", "leaf", "flower", ...);
    /// "auto" lets the API detect it. PlantNet does not accept WebP uploads,
    /// so those are rejected before the request is made.
    pub async fn identify(
        &self,
        image: Vec<u8>,
        file_name: &str,
        content_type: &str,
        organ: &str,
    ) -> Result<IdentifyResponse, &'static str> {
        if content_type == "image/webp" || file_name.to_lowercase().ends_with(".webp") {
            return Err("WebP format not supported by PlantNet API");
        }

        let url = format!("{}?api-key={}", BASE_URL, self.options.api_key);

        let part = Part::bytes(image)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|_| "Invalid image content type")?;

        let form = Form::new()
            .text("organs", organ.to_string())
            .part("images", part);

        let res = self.client.post(url).multipart(form).send().await;

        match res {
            Ok(response) => {
                let status = response.status();
                if status == reqwest::StatusCode::NOT_FOUND {
                    // PlantNet answers 404 when no species matches
                    return Ok(IdentifyResponse {
                        results: Vec::new(),
                        best_match: None,
                    });
                }
                if !status.is_success() {
                    let error_body = response.text().await.unwrap_or_default();
                    eprintln!("PlantNet error ({}): {}", status, error_body);
                    return Err("PlantNet returned an error");
                }

                match response.json::<IdentifyResponse>().await {
                    Ok(data) => Ok(data),
                    Err(e) => {
                        eprintln!("Failed to parse PlantNet response: {}", e);
                        Err("Error parsing identification response")
                    }
                }
            }
            Err(e) => {
                eprintln!("Request to PlantNet failed: {}", e);
                Err("Error calling identification service")
            }
        }
    }
}
