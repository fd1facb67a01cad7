// lib.rs

/// Contains the importers.
pub mod io;

/// Contains the imported data types: meshes, scenes, materials, textures,
/// images and animations.
pub mod core;

#[macro_use]
pub(crate) mod utils;
