use crate::core::format::{ComponentType, Shape, VertexFormat};
use crate::core::scene::{Matrix4, SkinData};
use crate::io::gltf::json;
use crate::io::gltf::resolver::{self, Resolver};
use crate::utils::read_f32s;

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Err {
    #[error(transparent)]
    Accessor(#[from] resolver::Err),
    #[error("{0}")]
    InvalidProperty(String),
    #[error("{0}")]
    Unsupported(String),
}

/// Imports skin `id`. Joints without inverse bind matrices get identities.
pub(crate) fn import(resolver: &mut Resolver, id: usize) -> Result<SkinData, Err> {
    let document = resolver.document;
    let skin = &document.skins.items[id];

    let joints = json::get(skin, "joints", json::as_u32_array)
        .ok_or_else(|| Err::InvalidProperty("missing or invalid joints property".to_string()))?;
    if joints.is_empty() {
        return Err(Err::InvalidProperty("skin has no joints".to_string()));
    }
    let node_count = document.nodes.len();
    if let Some(joint) = joints.iter().find(|j| **j as usize >= node_count) {
        return Err(Err::InvalidProperty(format!(
            "joint index {} out of range for {} nodes", joint, node_count
        )));
    }

    let Some(accessor_id) = json::find(skin, "inverseBindMatrices", json::as_u32)
        .map_err(|_| Err::InvalidProperty("invalid inverseBindMatrices property".to_string()))?
    else {
        let inverse_bind_matrices = vec![Matrix4::identity(); joints.len()];
        return Ok(SkinData { joints, inverse_bind_matrices });
    };

    let accessor = resolver.accessor(accessor_id)?;
    if accessor.buffer_view.is_none() {
        return Err(Err::Unsupported(format!(
            "accessor {} has no buffer view, which is unsupported", accessor_id
        )));
    }
    if accessor.sparse.is_some() {
        return Err(Err::Unsupported(format!(
            "accessor {} is using sparse storage, which is unsupported", accessor_id
        )));
    }
    if accessor.format != VertexFormat::new(ComponentType::Float, Shape::Mat4, false) {
        return Err(Err::Unsupported(format!(
            "inverse bind matrices have unexpected type {}", accessor.format
        )));
    }
    if accessor.count != joints.len() {
        return Err(Err::InvalidProperty(format!(
            "invalid inverse bind matrix count, expected {} but got {}", joints.len(), accessor.count
        )));
    }

    let floats = read_f32s(&resolver.contiguous(&accessor));
    let inverse_bind_matrices = floats.chunks_exact(16).map(|column_major| {
        let mut matrix = [0.0; 16];
        matrix.copy_from_slice(column_major);
        Matrix4::from_column_major(&matrix)
    }).collect();
    Ok(SkinData { joints, inverse_bind_matrices })
}
