use super::Matrix4;

#[derive(Debug, Clone, PartialEq)]
pub struct SkinData {
    /// Joint objects, that is glTF node indices.
    pub joints: Vec<u32>,
    /// One matrix per joint.
    pub inverse_bind_matrices: Vec<Matrix4>,
}
