// Infrastructure: dependency container, service traits, external API clients

pub mod cloudinary;
pub mod deps;
pub mod traits;

pub use cloudinary::{CloudinaryOptions, CloudinaryStore};
pub use deps::{LogOtpSender, PlantNetAdapter, ServerDeps};
pub use traits::{BaseImageStore, BaseOtpSender, BasePlantIdentifier, IdentifiedSpecies};
