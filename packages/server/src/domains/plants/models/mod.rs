pub mod plant;

pub use plant::{NewPlant, Plant};
