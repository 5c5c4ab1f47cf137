//! CLI commands

pub mod inspect;
pub mod inspect_image;
pub mod validate;
