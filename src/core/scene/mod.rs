mod math;
mod camera;
mod light;
mod skin;

pub use math::{Matrix3, Matrix4, Quaternion};
pub use camera::{CameraData, CameraType};
pub use light::{LightData, LightType};
pub use skin::SkinData;

/// Field of a scene. Builtin fields are fixed, custom fields come from node
/// extras and are identified by their index in the importer's scene field
/// name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneField {
    Parent,
    Transformation,
    Translation,
    Rotation,
    Scaling,
    Mesh,
    MeshMaterial,
    Light,
    Camera,
    Skin,
    Custom(u32),
}

/// Type of a custom scene field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneFieldType {
    Bit,
    Float,
    UnsignedInt,
    Int,
    String,
}

/// Data column of a scene field.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneFieldValues {
    Bit(Vec<bool>),
    Float(Vec<f32>),
    UnsignedInt(Vec<u32>),
    Int(Vec<i32>),
    String(Vec<String>),
    Vector3(Vec<[f32; 3]>),
    Quaternion(Vec<Quaternion>),
    Matrix4(Vec<Matrix4>),
}

impl SceneFieldValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Bit(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::UnsignedInt(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::String(v) => v.len(),
            Self::Vector3(v) => v.len(),
            Self::Quaternion(v) => v.len(),
            Self::Matrix4(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One column of a scene: `mapping[i]` is the object that `values[i]`
/// belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneFieldData {
    pub name: SceneField,
    pub mapping: Vec<u32>,
    pub values: SceneFieldValues,
    /// Set for fields where one object can have more than one entry.
    pub multi_entry: bool,
}

/// A flattened scene. Objects are glTF node indices. The `Parent` field lists
/// objects in breadth-first order, and `children_offsets` partitions that
/// order: entries `children_offsets[0]..children_offsets[1]` are the roots,
/// entries `children_offsets[i + 1]..children_offsets[i + 2]` are the children
/// of the `i`-th object in that order.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneData {
    mapping_bound: u32,
    fields: Vec<SceneFieldData>,
    children_offsets: Vec<u32>,
}

impl SceneData {
    pub fn new(mapping_bound: u32, fields: Vec<SceneFieldData>, children_offsets: Vec<u32>) -> Self {
        Self { mapping_bound, fields, children_offsets }
    }

    /// One more than the largest object index referenced by the scene.
    pub fn get_mapping_bound(&self) -> u32 { self.mapping_bound }
    pub fn get_fields(&self) -> &[SceneFieldData] { &self.fields }
    pub fn get_children_offsets(&self) -> &[u32] { &self.children_offsets }

    pub fn field(&self, name: SceneField) -> Option<&SceneFieldData> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: SceneField) -> bool {
        self.field(name).is_some()
    }

    /// Parent of `object`, `None` if the object is not part of the scene,
    /// `Some(-1)` for root objects.
    pub fn parent_for(&self, object: u32) -> Option<i32> {
        let field = self.field(SceneField::Parent)?;
        let i = field.mapping.iter().position(|o| *o == object)?;
        match &field.values {
            SceneFieldValues::Int(parents) => parents.get(i).copied(),
            _ => None,
        }
    }

    /// Children of `object` in breadth-first order. Passing `None` returns the
    /// root objects.
    pub fn children_for(&self, object: Option<u32>) -> Vec<u32> {
        let Some(parents) = self.field(SceneField::Parent) else {
            return Vec::new();
        };
        let range = match object {
            None => 0,
            Some(object) => match parents.mapping.iter().position(|o| *o == object) {
                Some(i) => i + 1,
                None => return Vec::new(),
            },
        };
        let begin = self.children_offsets[range] as usize;
        let end = self.children_offsets[range + 1] as usize;
        parents.mapping[begin..end].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_and_children_lookup() {
        // node 2 is the root with children 0 and 3, node 0 has child 1
        let scene = SceneData::new(
            4,
            vec![SceneFieldData {
                name: SceneField::Parent,
                mapping: vec![2, 0, 3, 1],
                values: SceneFieldValues::Int(vec![-1, 2, 2, 0]),
                multi_entry: false,
            }],
            vec![0, 1, 3, 4, 4, 4],
        );
        assert_eq!(scene.children_for(None), vec![2]);
        assert_eq!(scene.children_for(Some(2)), vec![0, 3]);
        assert_eq!(scene.children_for(Some(0)), vec![1]);
        assert_eq!(scene.children_for(Some(1)), Vec::<u32>::new());
        assert_eq!(scene.parent_for(1), Some(0));
        assert_eq!(scene.parent_for(2), Some(-1));
        assert_eq!(scene.parent_for(7), None);
    }
}
