/// Defines the configuration trait and small shared helpers.
pub mod shared;

/// Defines the little-endian byte reader used by the binary container parser.
pub mod bit_coder;

/// Defines accessor component types, shapes and vertex formats.
pub mod format;

pub mod mesh;
pub mod scene;
pub mod material;
pub mod texture;
pub mod image;
pub mod animation;
