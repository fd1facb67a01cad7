use serde_json::{Map, Value};

use crate::core::material::{
    MaterialAttributeData, MaterialAttributeValue, MaterialData, MaterialTypes, LAYER_NAME,
};
use crate::core::scene::Matrix3;
use crate::io::gltf::document::{Document, KHR_TEXTURE_KTX};
use crate::io::gltf::{json, Config};

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Err {
    #[error("{0}")]
    InvalidProperty(String),
    #[error("{0}")]
    InvalidTexture(String),
    #[error("unrecognized alphaMode {0}")]
    UnrecognizedAlphaMode(String),
}

/// Attributes a base color texture contributes, mirrored as diffuse
/// attributes for Phong consumers.
const DIFFUSE_FALLBACK: [(&str, &str); 6] = [
    ("BaseColor", "DiffuseColor"),
    ("BaseColorTexture", "DiffuseTexture"),
    ("BaseColorTextureMatrix", "DiffuseTextureMatrix"),
    ("BaseColorTextureCoordinates", "DiffuseTextureCoordinates"),
    ("BaseColorTextureLayer", "DiffuseTextureLayer"),
    ("BaseColorTextureSwizzle", "DiffuseTextureSwizzle"),
];

fn float(object: &Value, key: &str, message: impl FnOnce() -> String) -> Result<Option<f32>, Err> {
    json::find(object, key, json::as_f32).map_err(|_| Err::InvalidProperty(message()))
}

fn vector<const N: usize>(object: &Value, key: &str, message: impl FnOnce() -> String) -> Result<Option<[f32; N]>, Err> {
    json::find(object, key, json::as_f32_array::<N>).map_err(|_| Err::InvalidProperty(message()))
}

/// Appends an attribute if it fits, warns and skips it otherwise.
fn push_checked(attributes: &mut Vec<MaterialAttributeData>, quiet: bool, name: &str, value: MaterialAttributeValue) {
    if MaterialAttributeData::fits(name, &value) {
        attributes.push(MaterialAttributeData::new(name, value));
    } else {
        crate::quiet_warn!(
            quiet,
            "property {} is too large with {} bytes, skipping",
            name, value.size() + name.len()
        );
    }
}

struct Builder<'a> {
    document: &'a Document,
    config: &'a Config,
    attributes: Vec<MaterialAttributeData>,
}

impl<'a> Builder<'a> {
    fn push(&mut self, name: &str, value: MaterialAttributeValue) {
        self.attributes.push(MaterialAttributeData::new(name, value));
    }

    fn has(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }

    /// Parses a texture info object found under `property`. `attribute` is
    /// the name of the texture id attribute, or `None` when only the
    /// matrix, coordinates and layer attributes prefixed with `prefix` are
    /// wanted.
    fn texture(
        &self,
        texture: &Value,
        property: &str,
        attribute: Option<&str>,
        prefix: &str,
    ) -> Result<Vec<MaterialAttributeData>, Err> {
        let quiet = self.config.quiet;
        if !texture.is_object() {
            return Err(Err::InvalidTexture(format!("invalid {} property", property)));
        }
        let index = json::get(texture, "index", json::as_u32)
            .ok_or_else(|| Err::InvalidTexture(format!("missing or invalid {} index property", property)))?;
        let count = self.document.textures.len();
        if index as usize >= count {
            return Err(Err::InvalidTexture(format!(
                "{} index {} out of range for {} textures", property, index, count
            )));
        }
        let unique = self.document.unique_texture_for_gltf[index as usize];

        let mut out = Vec::new();
        let matrix_attribute = format!("{}Matrix", prefix);
        let coordinate_attribute = format!("{}Coordinates", prefix);
        let layer_attribute = format!("{}Layer", prefix);

        if self.config.experimental_khr_texture_ktx {
            let layer = self.document.textures.items[index as usize]
                .get("extensions")
                .and_then(|e| e.get(KHR_TEXTURE_KTX))
                .and_then(|k| k.get("layer"));
            if let Some(layer) = layer {
                let layer = json::as_u32(layer)
                    .ok_or_else(|| Err::InvalidTexture(format!("invalid {} layer property", KHR_TEXTURE_KTX)))?;
                push_checked(&mut out, quiet, &layer_attribute, MaterialAttributeValue::UnsignedInt(layer));
            }
        }

        let mut coordinates = json::find(texture, "texCoord", json::as_u32)
            .map_err(|_| Err::InvalidTexture(format!("invalid {} texcoord property", property)))?;

        let mut transform = None;
        if let Some(extensions) = texture.get("extensions") {
            if !extensions.is_object() {
                return Err(Err::InvalidTexture(format!("invalid {} extensions property", property)));
            }
            transform = extensions.get("KHR_texture_transform");
        }
        match transform {
            Some(transform) => {
                let invalid = |what: &str| Err::InvalidTexture(format!(
                    "invalid {} KHR_texture_transform {}", property, what
                ));
                if !transform.is_object() {
                    return Err(invalid("extension"));
                }
                // Images are imported with Y up, so coordinates get unflipped,
                // transformed and flipped again. The flip is skipped if the
                // mesh coordinates weren't flipped in the first place.
                let mut matrix = if self.document.texture_coordinate_y_flip_in_material {
                    Matrix3::identity()
                } else {
                    Matrix3::y_flip()
                };
                if let Some(t) = json::find(transform, "texCoord", json::as_u32)
                    .map_err(|_| invalid("texcoord property"))?
                {
                    coordinates = Some(t);
                }
                let scaling = json::find(transform, "scale", json::as_f32_array::<2>)
                    .map_err(|_| invalid("scale property"))?;
                matrix = Matrix3::scaling(scaling.unwrap_or([1.0; 2])) * matrix;
                let rotation = json::find(transform, "rotation", json::as_f32)
                    .map_err(|_| invalid("rotation property"))?;
                // Counterclockwise becomes clockwise with Y flipped
                matrix = Matrix3::rotation(-rotation.unwrap_or(0.0)) * matrix;
                let offset = json::find(transform, "offset", json::as_f32_array::<2>)
                    .map_err(|_| invalid("offset property"))?;
                matrix = Matrix3::translation(offset.unwrap_or([0.0; 2])) * matrix;
                matrix = Matrix3::y_flip() * matrix;
                push_checked(&mut out, quiet, &matrix_attribute, MaterialAttributeValue::Matrix3x3(matrix));
            }
            None if self.document.texture_coordinate_y_flip_in_material => {
                push_checked(&mut out, quiet, &matrix_attribute, MaterialAttributeValue::Matrix3x3(Matrix3::y_flip()));
            }
            None => {}
        }

        if let Some(coordinates) = coordinates {
            push_checked(&mut out, quiet, &coordinate_attribute, MaterialAttributeValue::UnsignedInt(coordinates));
        }
        if let Some(attribute) = attribute {
            push_checked(&mut out, quiet, attribute, MaterialAttributeValue::UnsignedInt(unique));
        }
        Ok(out)
    }

    /// Texture whose id attribute and extra attributes share a name.
    fn add_texture(&mut self, texture: &Value, property: &str, attribute: &str) -> Result<(), Err> {
        let attributes = self.texture(texture, property, Some(attribute), attribute)?;
        self.attributes.extend(attributes);
        Ok(())
    }

    /// Packed texture, one texture id and two sets of extra attributes.
    fn add_packed_texture(&mut self, texture: &Value, property: &str, attribute: &str, first: &str, second: &str) -> Result<(), Err> {
        let attributes = self.texture(texture, property, Some(attribute), first)?;
        self.attributes.extend(attributes);
        let attributes = self.texture(texture, property, None, second)?;
        self.attributes.extend(attributes);
        Ok(())
    }
}

/// Converts one free-form extras or extension property, `None` with a
/// warning if it has no representation.
fn parse_attribute(name: &str, value: &Value, quiet: bool) -> Option<MaterialAttributeData> {
    if name.is_empty() {
        crate::quiet_warn!(quiet, "property with an empty name, skipping");
        return None;
    }
    let value = match value {
        Value::Object(_) => {
            crate::quiet_warn!(quiet, "property {} is an object, skipping", name);
            return None;
        }
        Value::Null => {
            crate::quiet_warn!(quiet, "property {} is a null, skipping", name);
            return None;
        }
        Value::Array(array) => {
            if !array.iter().all(Value::is_number) {
                crate::quiet_warn!(quiet, "property {} is not a numeric array, skipping", name);
                return None;
            }
            // Numbers are always floats, integer-ness depends on the exporter
            let floats: Option<Vec<f32>> = array.iter().map(json::as_f32).collect();
            match floats.as_deref() {
                Some(&[x]) => MaterialAttributeValue::Float(x),
                Some(&[x, y]) => MaterialAttributeValue::Vector2([x, y]),
                Some(&[x, y, z]) => MaterialAttributeValue::Vector3([x, y, z]),
                Some(&[x, y, z, w]) => MaterialAttributeValue::Vector4([x, y, z, w]),
                _ => {
                    crate::quiet_warn!(quiet, "property {} is an invalid or unrepresentable numeric vector, skipping", name);
                    return None;
                }
            }
        }
        Value::Bool(b) => MaterialAttributeValue::Bool(*b),
        Value::Number(_) => match json::as_f32(value) {
            Some(f) => MaterialAttributeValue::Float(f),
            None => {
                crate::quiet_warn!(quiet, "property {} is invalid, skipping", name);
                return None;
            }
        },
        Value::String(s) => MaterialAttributeValue::String(s.clone()),
    };
    if !MaterialAttributeData::fits(name, &value) {
        crate::quiet_warn!(quiet, "property {} is too large with {} bytes, skipping", name, value.size() + name.len());
        return None;
    }

    // Names starting with an uppercase letter are reserved for builtin attributes
    let mut chars = name.chars();
    let name = match chars.next() {
        Some(first) if first.is_ascii_uppercase() => format!("{}{}", first.to_ascii_lowercase(), chars.as_str()),
        _ => name.to_string(),
    };
    Some(MaterialAttributeData::new(name, value))
}

/// Imports material `id` into a base layer and one layer for the clear coat
/// and for each unrecognized extension.
pub(crate) fn import(document: &Document, config: &Config, id: usize) -> Result<MaterialData, Err> {
    let material = &document.materials.items[id];
    let quiet = config.quiet;
    let mut builder = Builder { document, config, attributes: Vec::new() };
    let mut types = MaterialTypes::empty();
    let mut layer_offsets = vec![0];

    if let Some(mode) = material.get("alphaMode") {
        let mode = json::as_str(mode).ok_or_else(|| Err::InvalidProperty("invalid alphaMode property".to_string()))?;
        match mode {
            "BLEND" => builder.push("AlphaBlend", MaterialAttributeValue::Bool(true)),
            "MASK" => {
                let cutoff = float(material, "alphaCutoff", || "invalid alphaCutoff property".to_string())?;
                builder.push("AlphaMask", MaterialAttributeValue::Float(cutoff.unwrap_or(0.5)));
            }
            "OPAQUE" => builder.push("AlphaBlend", MaterialAttributeValue::Bool(false)),
            other => return Err(Err::UnrecognizedAlphaMode(other.to_string())),
        }
    }

    if let Some(double_sided) = json::find(material, "doubleSided", json::as_bool)
        .map_err(|_| Err::InvalidProperty("invalid doubleSided property".to_string()))?
    {
        builder.push("DoubleSided", MaterialAttributeValue::Bool(double_sided));
    }

    if let Some(pbr) = material.get("pbrMetallicRoughness") {
        if !pbr.is_object() {
            return Err(Err::InvalidProperty("invalid pbrMetallicRoughness property".to_string()));
        }
        types.insert(MaterialTypes::PBR_METALLIC_ROUGHNESS);
        if let Some(color) = vector::<4>(pbr, "baseColorFactor", || {
            "invalid pbrMetallicRoughness baseColorFactor property".to_string()
        })? {
            builder.push("BaseColor", MaterialAttributeValue::Vector4(color));
        }
        if let Some(metalness) = float(pbr, "metallicFactor", || {
            "invalid pbrMetallicRoughness metallicFactor property".to_string()
        })? {
            builder.push("Metalness", MaterialAttributeValue::Float(metalness));
        }
        if let Some(roughness) = float(pbr, "roughnessFactor", || {
            "invalid pbrMetallicRoughness roughnessFactor property".to_string()
        })? {
            builder.push("Roughness", MaterialAttributeValue::Float(roughness));
        }
        if let Some(texture) = pbr.get("baseColorTexture") {
            builder.add_texture(texture, "baseColorTexture", "BaseColorTexture")?;
        }
        if let Some(texture) = pbr.get("metallicRoughnessTexture") {
            builder.add_packed_texture(
                texture,
                "metallicRoughnessTexture",
                "NoneRoughnessMetallicTexture",
                "MetalnessTexture",
                "RoughnessTexture",
            )?;
        }
    }

    let mut specular_glossiness = None;
    let mut unlit = false;
    let mut clear_coat = None;
    let mut other_extensions: Vec<(&String, &Map<String, Value>)> = Vec::new();
    if let Some(extensions) = material.get("extensions") {
        let extensions = extensions.as_object()
            .ok_or_else(|| Err::InvalidProperty("invalid extensions property".to_string()))?;
        for (name, extension) in extensions {
            let extension_object = extension.as_object()
                .ok_or_else(|| Err::InvalidProperty(format!("invalid {} extension property", name)))?;
            match name.as_str() {
                "KHR_materials_pbrSpecularGlossiness" => specular_glossiness = Some(extension),
                "KHR_materials_unlit" => unlit = true,
                "KHR_materials_clearcoat" => clear_coat = Some(extension),
                _ => other_extensions.push((name, extension_object)),
            }
        }
    }

    if let Some(sg) = specular_glossiness {
        types.insert(MaterialTypes::PBR_SPECULAR_GLOSSINESS);
        let message = |what: &str| format!("invalid KHR_materials_pbrSpecularGlossiness {} property", what);
        if let Some(diffuse) = vector::<4>(sg, "diffuseFactor", || message("diffuseFactor"))? {
            builder.push("DiffuseColor", MaterialAttributeValue::Vector4(diffuse));
        }
        if let Some([r, g, b]) = vector::<3>(sg, "specularFactor", || message("specularFactor"))? {
            // Zero alpha to not affect transparent materials
            builder.push("SpecularColor", MaterialAttributeValue::Vector4([r, g, b, 0.0]));
        }
        if let Some(glossiness) = float(sg, "glossinessFactor", || message("glossinessFactor"))? {
            builder.push("Glossiness", MaterialAttributeValue::Float(glossiness));
        }
        if let Some(texture) = sg.get("diffuseTexture") {
            builder.add_texture(texture, "diffuseTexture", "DiffuseTexture")?;
        }
        if let Some(texture) = sg.get("specularGlossinessTexture") {
            builder.add_packed_texture(
                texture,
                "specularGlossinessTexture",
                "SpecularGlossinessTexture",
                "SpecularTexture",
                "GlossinessTexture",
            )?;
        }
    }

    if unlit {
        types = MaterialTypes::FLAT;
    }

    if let Some(texture) = material.get("normalTexture") {
        builder.add_texture(texture, "normalTexture", "NormalTexture")?;
        if let Some(scale) = float(texture, "scale", || "invalid normalTexture scale property".to_string())? {
            builder.push("NormalTextureScale", MaterialAttributeValue::Float(scale));
        }
    }
    if let Some(texture) = material.get("occlusionTexture") {
        builder.add_texture(texture, "occlusionTexture", "OcclusionTexture")?;
        if let Some(strength) = float(texture, "strength", || "invalid occlusionTexture strength property".to_string())? {
            builder.push("OcclusionTextureStrength", MaterialAttributeValue::Float(strength));
        }
    }
    if let Some(color) = vector::<3>(material, "emissiveFactor", || "invalid emissiveFactor property".to_string())? {
        builder.push("EmissiveColor", MaterialAttributeValue::Vector3(color));
    }
    if let Some(texture) = material.get("emissiveTexture") {
        builder.add_texture(texture, "emissiveTexture", "EmissiveTexture")?;
    }

    if config.phong_material_fallback {
        // Added to flat materials as well
        types.insert(MaterialTypes::PHONG);
        let mirrored: Vec<MaterialAttributeData> = DIFFUSE_FALLBACK.iter()
            .filter(|(_, diffuse)| !builder.has(diffuse))
            .filter_map(|(base, diffuse)| {
                builder.attributes.iter()
                    .rfind(|a| a.name == *base)
                    .map(|a| MaterialAttributeData::new(*diffuse, a.value.clone()))
            })
            .collect();
        builder.attributes.extend(mirrored);
    }

    match material.get("extras") {
        None => {}
        Some(Value::Object(extras)) => {
            for (name, value) in extras {
                if let Some(attribute) = parse_attribute(name, value, quiet) {
                    builder.attributes.push(attribute);
                }
            }
        }
        Some(_) => crate::quiet_warn!(quiet, "extras property is not an object, skipping"),
    }

    if let Some(clear_coat) = clear_coat {
        types.insert(MaterialTypes::PBR_CLEAR_COAT);
        layer_offsets.push(builder.attributes.len() as u32);
        builder.push(LAYER_NAME, MaterialAttributeValue::String("ClearCoat".to_string()));

        // Both factors default to zero in the extension
        let factor = float(clear_coat, "clearcoatFactor", || {
            "invalid KHR_materials_clearcoat clearcoatFactor property".to_string()
        })?;
        builder.push("LayerFactor", MaterialAttributeValue::Float(factor.unwrap_or(0.0)));
        if let Some(texture) = clear_coat.get("clearcoatTexture") {
            builder.add_texture(texture, "clearcoatTexture", "LayerFactorTexture")?;
        }
        let roughness = float(clear_coat, "clearcoatRoughnessFactor", || {
            "invalid KHR_materials_clearcoat roughnessFactor property".to_string()
        })?;
        builder.push("Roughness", MaterialAttributeValue::Float(roughness.unwrap_or(0.0)));
        if let Some(texture) = clear_coat.get("clearcoatRoughnessTexture") {
            builder.add_texture(texture, "clearcoatRoughnessTexture", "RoughnessTexture")?;
            builder.push("RoughnessTextureSwizzle", MaterialAttributeValue::TextureSwizzle("G".to_string()));
        }
        if let Some(texture) = clear_coat.get("clearcoatNormalTexture") {
            builder.add_texture(texture, "clearcoatNormalTexture", "NormalTexture")?;
            if let Some(scale) = float(texture, "scale", || {
                "invalid KHR_materials_clearcoat normalTexture scale property".to_string()
            })? {
                builder.push("NormalTextureScale", MaterialAttributeValue::Float(scale));
            }
        }
    }

    for (name, extension) in other_extensions {
        if name.is_empty() {
            crate::quiet_warn!(quiet, "extension with an empty name, skipping");
            continue;
        }
        // Layer name attribute with a '#' prefix has to fit
        if LAYER_NAME.len() + 1 + name.len() + 3 + 1 > crate::core::material::MATERIAL_ATTRIBUTE_SIZE {
            crate::quiet_warn!(quiet, "extension name {} is too long with {} characters, skipping", name, name.len());
            continue;
        }
        layer_offsets.push(builder.attributes.len() as u32);
        builder.push(LAYER_NAME, MaterialAttributeValue::String(format!("#{}", name)));
        for (key, value) in extension {
            if key.is_empty() {
                crate::quiet_warn!(quiet, "property with an empty name, skipping");
                continue;
            }
            if !value.is_object() {
                if let Some(attribute) = parse_attribute(key, value, quiet) {
                    builder.attributes.push(attribute);
                }
                continue;
            }
            if key.len() < 8 || !key.ends_with("Texture") {
                crate::quiet_warn!(quiet, "property {} has a non-texture object type, skipping", key);
                continue;
            }
            match builder.texture(value, key, Some(key), key) {
                Ok(attributes) => builder.attributes.extend(attributes),
                Err(e) => {
                    crate::quiet_warn!(quiet, "{}", e);
                    crate::quiet_warn!(quiet, "property {} has an invalid texture object, skipping", key);
                    continue;
                }
            }
            if let Some(scale) = value.get("scale") {
                match json::as_f32(scale) {
                    Some(scale) => push_checked(
                        &mut builder.attributes,
                        quiet,
                        &format!("{}Scale", key),
                        MaterialAttributeValue::Float(scale),
                    ),
                    None => crate::quiet_warn!(quiet, "invalid {} {} scale property, skipping", name, key),
                }
            }
        }
    }

    layer_offsets.push(builder.attributes.len() as u32);
    Ok(MaterialData::new(types, builder.attributes, layer_offsets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared::ConfigType;
    use serde_json::json;

    fn import_material(material: Value, config: &Config) -> Result<MaterialData, Err> {
        let value = json!({
            "asset": {"version": "2.0"},
            "images": [{"uri": "a.png"}, {"uri": "b.png"}],
            "textures": [{"source": 0}, {"source": 1}],
            "materials": [material],
        });
        let document = Document::open(serde_json::to_vec(&value).unwrap(), None, config).unwrap();
        import(&document, config, 0)
    }

    fn no_fallback() -> Config {
        let mut config = Config::default();
        config.phong_material_fallback = false;
        config
    }

    #[test]
    fn test_alpha_and_double_sided() {
        let config = no_fallback();
        let material = import_material(json!({"alphaMode": "MASK", "doubleSided": true}), &config).unwrap();
        assert_eq!(material.attribute("AlphaMask"), Some(&MaterialAttributeValue::Float(0.5)));
        assert_eq!(material.attribute("DoubleSided"), Some(&MaterialAttributeValue::Bool(true)));
        assert!(material.get_types().is_empty());

        let material = import_material(json!({"alphaMode": "OPAQUE"}), &config).unwrap();
        assert_eq!(material.attribute("AlphaBlend"), Some(&MaterialAttributeValue::Bool(false)));

        let err = import_material(json!({"alphaMode": "ADDITIVE"}), &config).unwrap_err();
        assert_eq!(err.to_string(), "unrecognized alphaMode ADDITIVE");
    }

    #[test]
    fn test_metallic_roughness() {
        let material = import_material(json!({
            "pbrMetallicRoughness": {
                "baseColorFactor": [1, 0.5, 0.25, 1],
                "metallicFactor": 0.0,
                "baseColorTexture": {"index": 1, "texCoord": 2},
                "metallicRoughnessTexture": {"index": 0},
            },
        }), &Config::default()).unwrap();
        assert!(material.get_types().contains(MaterialTypes::PBR_METALLIC_ROUGHNESS | MaterialTypes::PHONG));
        assert_eq!(material.attribute("BaseColor"), Some(&MaterialAttributeValue::Vector4([1.0, 0.5, 0.25, 1.0])));
        assert_eq!(material.attribute("BaseColorTexture"), Some(&MaterialAttributeValue::UnsignedInt(1)));
        assert_eq!(material.attribute("BaseColorTextureCoordinates"), Some(&MaterialAttributeValue::UnsignedInt(2)));
        assert_eq!(material.attribute("NoneRoughnessMetallicTexture"), Some(&MaterialAttributeValue::UnsignedInt(0)));
        assert_eq!(material.attribute("MetalnessTexture"), None, "the packed texture id is added once");

        // Phong fallback mirrors the base color
        assert_eq!(material.attribute("DiffuseColor"), material.attribute("BaseColor"));
        assert_eq!(material.attribute("DiffuseTexture"), Some(&MaterialAttributeValue::UnsignedInt(1)));
        assert_eq!(material.attribute("DiffuseTextureCoordinates"), Some(&MaterialAttributeValue::UnsignedInt(2)));
    }

    #[test]
    fn test_fallback_skips_specular_glossiness_attributes() {
        let material = import_material(json!({
            "pbrMetallicRoughness": {"baseColorFactor": [1, 1, 1, 1], "baseColorTexture": {"index": 0}},
            "extensions": {"KHR_materials_pbrSpecularGlossiness": {
                "diffuseFactor": [0, 1, 0, 1],
                "specularFactor": [1, 1, 1],
            }},
        }), &Config::default()).unwrap();
        assert_eq!(material.attribute("DiffuseColor"), Some(&MaterialAttributeValue::Vector4([0.0, 1.0, 0.0, 1.0])));
        assert_eq!(material.attribute("SpecularColor"), Some(&MaterialAttributeValue::Vector4([1.0, 1.0, 1.0, 0.0])));
        assert_eq!(material.attribute("DiffuseTexture"), Some(&MaterialAttributeValue::UnsignedInt(0)));
        let diffuse_colors = material.get_attributes().iter().filter(|a| a.name == "DiffuseColor").count();
        assert_eq!(diffuse_colors, 1);
    }

    #[test]
    fn test_unlit_resets_types() {
        let material = import_material(json!({
            "pbrMetallicRoughness": {},
            "extensions": {"KHR_materials_unlit": {}},
        }), &no_fallback()).unwrap();
        assert_eq!(material.get_types(), MaterialTypes::FLAT);
    }

    #[test]
    fn test_texture_transform() {
        let material = import_material(json!({
            "emissiveTexture": {
                "index": 0,
                "texCoord": 1,
                "extensions": {"KHR_texture_transform": {"offset": [0, 1], "texCoord": 3}},
            },
        }), &no_fallback()).unwrap();
        assert_eq!(
            material.attribute("EmissiveTextureMatrix"),
            Some(&MaterialAttributeValue::Matrix3x3(Matrix3::translation([0.0, -1.0])))
        );
        assert_eq!(material.attribute("EmissiveTextureCoordinates"), Some(&MaterialAttributeValue::UnsignedInt(3)));

        let err = import_material(json!({
            "normalTexture": {"index": 0, "extensions": {"KHR_texture_transform": {"rotation": "a"}}},
        }), &no_fallback()).unwrap_err();
        assert_eq!(err.to_string(), "invalid normalTexture KHR_texture_transform rotation property");
    }

    #[test]
    fn test_y_flip_in_material() {
        let mut config = no_fallback();
        config.texture_coordinate_y_flip_in_material = true;
        let material = import_material(json!({"occlusionTexture": {"index": 0, "strength": 0.5}}), &config).unwrap();
        assert_eq!(
            material.attribute("OcclusionTextureMatrix"),
            Some(&MaterialAttributeValue::Matrix3x3(Matrix3::y_flip()))
        );
        assert_eq!(material.attribute("OcclusionTextureStrength"), Some(&MaterialAttributeValue::Float(0.5)));
    }

    #[test]
    fn test_texture_errors() {
        let err = import_material(json!({"normalTexture": {"index": 2}}), &no_fallback()).unwrap_err();
        assert_eq!(err.to_string(), "normalTexture index 2 out of range for 2 textures");
        let err = import_material(json!({"emissiveTexture": {}}), &no_fallback()).unwrap_err();
        assert_eq!(err.to_string(), "missing or invalid emissiveTexture index property");
    }

    #[test]
    fn test_extras() {
        let material = import_material(json!({
            "extras": {
                "Highlight": [1, 2, 3],
                "flag": true,
                "label": "wood",
                "nested": {"a": 1},
                "long": [1, 2, 3, 4, 5],
                "mixed": [1, "a"],
                "nothing": null,
            },
        }), &no_fallback()).unwrap();
        let names: Vec<&str> = material.get_attributes().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["highlight", "flag", "label"]);
        assert_eq!(material.attribute("highlight"), Some(&MaterialAttributeValue::Vector3([1.0, 2.0, 3.0])));
        assert_eq!(material.attribute("label"), Some(&MaterialAttributeValue::String("wood".to_string())));
    }

    #[test]
    fn test_extension_layers_in_declaration_order() {
        let data = br#"{
            "asset": {"version": "2.0"},
            "materials": [{
                "extensions": {
                    "KHR_materials_volume": {"thicknessFactor": 2},
                    "KHR_materials_anisotropy": {"anisotropyStrength": 0.5, "anisotropyRotation": 1}
                },
                "extras": {"zeta": 1, "alpha": 2}
            }]
        }"#;
        let config = no_fallback();
        let document = Document::open(data.to_vec(), None, &config).unwrap();
        let material = import(&document, &config, 0).unwrap();
        assert_eq!(material.layer_count(), 3);
        assert_eq!(material.layer_name(1), Some("#KHR_materials_volume"));
        assert_eq!(material.layer_name(2), Some("#KHR_materials_anisotropy"));
        let names: Vec<&str> = material.layer(2).iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec![LAYER_NAME, "anisotropyStrength", "anisotropyRotation"]);
        let names: Vec<&str> = material.layer(0).iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_layers() {
        let material = import_material(json!({
            "extensions": {
                "KHR_materials_clearcoat": {
                    "clearcoatFactor": 0.5,
                    "clearcoatRoughnessTexture": {"index": 1},
                },
                "KHR_materials_sheen": {
                    "sheenColorFactor": [1, 0, 0],
                    "sheenColorTexture": {"index": 0, "scale": 2},
                    "sheenRoughnessTexture": {"index": 7},
                    "sheenInfo": {},
                },
            },
        }), &no_fallback()).unwrap();
        assert!(material.get_types().contains(MaterialTypes::PBR_CLEAR_COAT));
        assert_eq!(material.layer_count(), 3);
        assert_eq!(material.layer(0).len(), 0);

        let clear_coat = material.layer_id("ClearCoat").unwrap();
        assert_eq!(material.attribute_in(clear_coat, "LayerFactor"), Some(&MaterialAttributeValue::Float(0.5)));
        assert_eq!(material.attribute_in(clear_coat, "Roughness"), Some(&MaterialAttributeValue::Float(0.0)));
        assert_eq!(material.attribute_in(clear_coat, "RoughnessTexture"), Some(&MaterialAttributeValue::UnsignedInt(1)));
        assert_eq!(
            material.attribute_in(clear_coat, "RoughnessTextureSwizzle"),
            Some(&MaterialAttributeValue::TextureSwizzle("G".to_string()))
        );

        let sheen = material.layer_id("#KHR_materials_sheen").unwrap();
        assert_eq!(material.attribute_in(sheen, "sheenColorFactor"), Some(&MaterialAttributeValue::Vector3([1.0, 0.0, 0.0])));
        assert_eq!(material.attribute_in(sheen, "sheenColorTexture"), Some(&MaterialAttributeValue::UnsignedInt(0)));
        assert_eq!(material.attribute_in(sheen, "sheenColorTextureScale"), Some(&MaterialAttributeValue::Float(2.0)));
        assert_eq!(material.attribute_in(sheen, "sheenRoughnessTexture"), None, "invalid texture is skipped");
        assert_eq!(material.attribute_in(sheen, "sheenInfo"), None);
    }
}
