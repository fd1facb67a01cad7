/// glTF 2.0 and binary glTF import.
pub mod gltf;
