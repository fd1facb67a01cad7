use crate::core::format::{IndexType, VertexFormat};

/// Primitive topology, the glTF `mode` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshPrimitive {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl MeshPrimitive {
    pub fn from_gltf(mode: u32) -> Option<Self> {
        match mode {
            0 => Some(Self::Points),
            1 => Some(Self::Lines),
            2 => Some(Self::LineLoop),
            3 => Some(Self::LineStrip),
            4 => Some(Self::Triangles),
            5 => Some(Self::TriangleStrip),
            6 => Some(Self::TriangleFan),
            _ => None,
        }
    }
}

/// Semantic of a mesh attribute. Attributes that are not recognized are
/// imported as `Custom`, identified by their index in the importer's
/// attribute name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshAttribute {
    Position,
    Normal,
    Tangent,
    TextureCoordinates,
    Color,
    JointIds,
    Weights,
    ObjectId,
    Custom(u32),
}

/// One attribute of an assembled mesh. `offset` and `stride` are relative to
/// the mesh vertex arena.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshAttributeData {
    pub name: MeshAttribute,
    pub format: VertexFormat,
    pub offset: usize,
    pub stride: usize,
    /// Number of components of an array attribute, 0 for non-array attributes.
    pub array_size: u16,
    /// Morph target the attribute belongs to, -1 for the base mesh.
    pub morph_target_id: i32,
}

impl MeshAttributeData {
    /// Byte size of one element of this attribute.
    pub fn element_size(&self) -> usize {
        self.format.size() * (self.array_size.max(1) as usize)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshIndexData {
    pub index_type: IndexType,
    pub data: Vec<u8>,
}

impl MeshIndexData {
    pub fn count(&self) -> usize {
        self.data.len() / self.index_type.size()
    }

    pub fn to_u32(&self) -> Vec<u32> {
        (0..self.count()).map(|i| self.index_type.read(&self.data, i)).collect()
    }
}

/// A single drawable primitive with its vertex arena and optional indices.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    primitive: MeshPrimitive,
    indices: Option<MeshIndexData>,
    vertex_data: Vec<u8>,
    attributes: Vec<MeshAttributeData>,
    vertex_count: usize,
}

impl MeshData {
    pub fn new(
        primitive: MeshPrimitive,
        indices: Option<MeshIndexData>,
        vertex_data: Vec<u8>,
        attributes: Vec<MeshAttributeData>,
        vertex_count: usize,
    ) -> Self {
        Self { primitive, indices, vertex_data, attributes, vertex_count }
    }

    pub fn get_primitive(&self) -> MeshPrimitive { self.primitive }
    pub fn get_indices(&self) -> Option<&MeshIndexData> { self.indices.as_ref() }
    pub fn get_vertex_data(&self) -> &[u8] { &self.vertex_data }
    pub fn get_attributes(&self) -> &[MeshAttributeData] { &self.attributes }
    pub fn get_vertex_count(&self) -> usize { self.vertex_count }

    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Number of attributes with given name in given morph target.
    pub fn attribute_count(&self, name: MeshAttribute, morph_target_id: i32) -> usize {
        self.attributes.iter()
            .filter(|a| a.name == name && a.morph_target_id == morph_target_id)
            .count()
    }

    /// Position of the `nth` attribute with given name and morph target.
    pub fn attribute_id(&self, name: MeshAttribute, nth: usize, morph_target_id: i32) -> Option<usize> {
        self.attributes.iter()
            .enumerate()
            .filter(|(_, a)| a.name == name && a.morph_target_id == morph_target_id)
            .nth(nth)
            .map(|(i, _)| i)
    }

    /// Bytes of vertex `vertex` of attribute `id`.
    pub fn element(&self, id: usize, vertex: usize) -> &[u8] {
        let attribute = &self.attributes[id];
        let begin = attribute.offset + vertex * attribute.stride;
        &self.vertex_data[begin..begin + attribute.element_size()]
    }

    /// Reads a float attribute as arrays of `N` components. Returns `None` if
    /// the attribute is not a float attribute with `N` components.
    pub fn float_elements<const N: usize>(&self, id: usize) -> Option<Vec<[f32; N]>> {
        let attribute = self.attributes.get(id)?;
        if attribute.format.component != crate::core::format::ComponentType::Float
            || attribute.format.component_count() * (attribute.array_size.max(1) as usize) != N
        {
            return None;
        }
        Some((0..self.vertex_count).map(|v| {
            let bytes = self.element(id, v);
            let mut out = [0.0f32; N];
            for (i, c) in bytes.chunks_exact(4).take(N).enumerate() {
                out[i] = f32::from_le_bytes([c[0], c[1], c[2], c[3]]);
            }
            out
        }).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::format::{ComponentType, Shape};

    #[test]
    fn test_float_elements() {
        let mut vertex_data = Vec::new();
        for v in [1.0f32, 2.0, 3.0, 4.0] {
            vertex_data.extend_from_slice(&v.to_le_bytes());
        }
        let mesh = MeshData::new(
            MeshPrimitive::Points,
            None,
            vertex_data,
            vec![MeshAttributeData {
                name: MeshAttribute::TextureCoordinates,
                format: VertexFormat::new(ComponentType::Float, Shape::Vec2, false),
                offset: 0,
                stride: 8,
                array_size: 0,
                morph_target_id: -1,
            }],
            2,
        );
        assert_eq!(mesh.float_elements::<2>(0), Some(vec![[1.0, 2.0], [3.0, 4.0]]));
        assert_eq!(mesh.float_elements::<3>(0), None);
        assert_eq!(mesh.attribute_count(MeshAttribute::TextureCoordinates, -1), 1);
        assert_eq!(mesh.attribute_id(MeshAttribute::TextureCoordinates, 0, -1), Some(0));
        assert_eq!(mesh.attribute_id(MeshAttribute::Position, 0, -1), None);
    }
}
