//! Hosted media storage.

mod cloudinary;

pub use cloudinary::{CloudinaryConfig, CloudinaryStorage};
