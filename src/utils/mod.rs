//! Utility functions for the scoresheet pipeline.

pub mod image;

pub use image::{crop_region, dynamic_to_rgb, load_image, to_gray};
