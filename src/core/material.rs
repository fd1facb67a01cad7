use crate::core::scene::Matrix3;

/// Attribute name and value together must fit into this many bytes.
pub const MATERIAL_ATTRIBUTE_SIZE: usize = 64;

/// Set of material types a material can be interpreted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MaterialTypes(u8);

impl MaterialTypes {
    pub const FLAT: Self = Self(1 << 0);
    pub const PHONG: Self = Self(1 << 1);
    pub const PBR_METALLIC_ROUGHNESS: Self = Self(1 << 2);
    pub const PBR_SPECULAR_GLOSSINESS: Self = Self(1 << 3);
    pub const PBR_CLEAR_COAT: Self = Self(1 << 4);

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for MaterialTypes {
    type Output = Self;
    fn bitor(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaterialAttributeValue {
    Bool(bool),
    Float(f32),
    UnsignedInt(u32),
    Vector2([f32; 2]),
    Vector3([f32; 3]),
    Vector4([f32; 4]),
    Matrix3x3(Matrix3),
    String(String),
    /// Channel selection of a texture, for example `"G"`.
    TextureSwizzle(String),
}

impl MaterialAttributeValue {
    /// Bytes the value occupies inside an attribute. Strings are stored
    /// together with a size byte and a null terminator.
    pub fn size(&self) -> usize {
        match self {
            Self::Bool(_) => 1,
            Self::Float(_) | Self::UnsignedInt(_) | Self::TextureSwizzle(_) => 4,
            Self::Vector2(_) => 8,
            Self::Vector3(_) => 12,
            Self::Vector4(_) => 16,
            Self::Matrix3x3(_) => 36,
            Self::String(s) => s.len() + 2,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "Bool",
            Self::Float(_) => "Float",
            Self::UnsignedInt(_) => "UnsignedInt",
            Self::Vector2(_) => "Vector2",
            Self::Vector3(_) => "Vector3",
            Self::Vector4(_) => "Vector4",
            Self::Matrix3x3(_) => "Matrix3x3",
            Self::String(_) => "String",
            Self::TextureSwizzle(_) => "TextureSwizzle",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialAttributeData {
    pub name: String,
    pub value: MaterialAttributeValue,
}

impl MaterialAttributeData {
    pub fn new(name: impl Into<String>, value: MaterialAttributeValue) -> Self {
        Self { name: name.into(), value }
    }

    /// Whether name and value fit into [`MATERIAL_ATTRIBUTE_SIZE`], counting a
    /// null terminator of the name and a type byte.
    pub fn fits(name: &str, value: &MaterialAttributeValue) -> bool {
        value.size() + name.len() + 1 + 1 <= MATERIAL_ATTRIBUTE_SIZE
    }
}

/// Name of the attribute holding the layer name.
pub const LAYER_NAME: &str = "$LayerName";

/// Material as an ordered list of attributes split into layers.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialData {
    types: MaterialTypes,
    attributes: Vec<MaterialAttributeData>,
    /// `layer_offsets[i]..layer_offsets[i + 1]` is the attribute range of
    /// layer `i`. Always starts with 0 and has at least two entries.
    layer_offsets: Vec<u32>,
}

impl MaterialData {
    pub fn new(types: MaterialTypes, attributes: Vec<MaterialAttributeData>, layer_offsets: Vec<u32>) -> Self {
        Self { types, attributes, layer_offsets }
    }

    pub fn get_types(&self) -> MaterialTypes { self.types }
    pub fn get_attributes(&self) -> &[MaterialAttributeData] { &self.attributes }
    pub fn get_layer_offsets(&self) -> &[u32] { &self.layer_offsets }

    pub fn layer_count(&self) -> usize {
        self.layer_offsets.len() - 1
    }

    pub fn layer(&self, layer: usize) -> &[MaterialAttributeData] {
        let begin = self.layer_offsets[layer] as usize;
        let end = self.layer_offsets[layer + 1] as usize;
        &self.attributes[begin..end]
    }

    pub fn layer_name(&self, layer: usize) -> Option<&str> {
        match self.attribute_in(layer, LAYER_NAME) {
            Some(MaterialAttributeValue::String(name)) => Some(name),
            _ => None,
        }
    }

    /// Finds the first layer with given name.
    pub fn layer_id(&self, name: &str) -> Option<usize> {
        (1..self.layer_count()).find(|i| self.layer_name(*i) == Some(name))
    }

    pub fn attribute_in(&self, layer: usize, name: &str) -> Option<&MaterialAttributeValue> {
        self.layer(layer).iter().find(|a| a.name == name).map(|a| &a.value)
    }

    /// Attribute of the base layer.
    pub fn attribute(&self, name: &str) -> Option<&MaterialAttributeValue> {
        self.attribute_in(0, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types() {
        let mut types = MaterialTypes::PBR_METALLIC_ROUGHNESS;
        assert!(!types.contains(MaterialTypes::PHONG));
        types.insert(MaterialTypes::PHONG);
        assert!(types.contains(MaterialTypes::PHONG | MaterialTypes::PBR_METALLIC_ROUGHNESS));
        assert!(MaterialTypes::empty().is_empty());
    }

    #[test]
    fn test_attribute_fits() {
        let long = "a".repeat(58);
        assert!(MaterialAttributeData::fits(&long, &MaterialAttributeValue::Float(1.0)));
        let longer = "a".repeat(59);
        assert!(!MaterialAttributeData::fits(&longer, &MaterialAttributeValue::Float(1.0)));
        assert!(!MaterialAttributeData::fits("name", &MaterialAttributeValue::String("x".repeat(57))));
    }

    #[test]
    fn test_layers() {
        let material = MaterialData::new(
            MaterialTypes::PBR_CLEAR_COAT,
            vec![
                MaterialAttributeData::new("DoubleSided", MaterialAttributeValue::Bool(true)),
                MaterialAttributeData::new(LAYER_NAME, MaterialAttributeValue::String("ClearCoat".into())),
                MaterialAttributeData::new("LayerFactor", MaterialAttributeValue::Float(0.5)),
            ],
            vec![0, 1, 3],
        );
        assert_eq!(material.layer_count(), 2);
        assert_eq!(material.layer_name(1), Some("ClearCoat"));
        assert_eq!(material.layer_id("ClearCoat"), Some(1));
        assert_eq!(material.attribute_in(1, "LayerFactor"), Some(&MaterialAttributeValue::Float(0.5)));
        assert_eq!(material.attribute("LayerFactor"), None);
    }
}
