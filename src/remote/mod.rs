//! # Remote Collaborators
//!
//! - [`transform`]: `?tr=` URL grammar for the image transformation host
//! - [`loader`]: fetch and decode images referenced by the scene
//! - [`stock`]: stock-photo search and download tracking

pub mod loader;
pub mod stock;
pub mod transform;

pub use loader::{HttpImageSource, ImageSource, MemoryImageSource};
pub use stock::{StockPhoto, StockPhotoClient};
pub use transform::{Direction, TransformUrl};
