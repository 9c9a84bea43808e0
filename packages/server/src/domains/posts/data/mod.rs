pub mod post;

pub use post::{CommentData, LocationData, PlantInfoData, PostData};
