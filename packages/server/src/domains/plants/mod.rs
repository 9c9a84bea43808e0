//! Plants domain - standalone adoption listings

pub mod data;
pub mod models;

pub use data::PlantData;
pub use models::Plant;
