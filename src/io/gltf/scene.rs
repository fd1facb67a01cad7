use serde_json::Value;

use crate::core::scene::{
    Matrix4, Quaternion, SceneData, SceneField, SceneFieldData, SceneFieldType, SceneFieldValues,
};
use crate::io::gltf::document::Document;
use crate::io::gltf::{json, Config};

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone)]
pub enum Err {
    #[error("{0}")]
    InvalidNode(String),
    #[error("{0}")]
    OutOfRange(String),
}

/// Object references of one node, validated in the first pass.
#[derive(Default)]
struct NodeRefs {
    mesh: Option<u32>,
    camera: Option<u32>,
    skin: Option<u32>,
    light: Option<u32>,
}

fn index_property(node: &Value, i: u32, key: &str, plural: &str, count: usize) -> Result<Option<u32>, Err> {
    let index = json::find(node, key, json::as_u32)
        .map_err(|_| Err::InvalidNode(format!("invalid {} property of node {}", key, i)))?;
    match index {
        Some(index) if index as usize >= count => Err(Err::OutOfRange(format!(
            "{} index {} in node {} out of range for {} {}", key, index, i, count, plural
        ))),
        other => Ok(other),
    }
}

fn node_light(node: &Value, i: u32, count: usize) -> Result<Option<u32>, Err> {
    let Some(extensions) = node.get("extensions") else {
        return Ok(None);
    };
    if !extensions.is_object() {
        return Err(Err::InvalidNode(format!("invalid node {} extensions property", i)));
    }
    let Some(lights) = extensions.get("KHR_lights_punctual") else {
        return Ok(None);
    };
    if !lights.is_object() {
        return Err(Err::InvalidNode(format!("invalid node {} KHR_lights_punctual extension", i)));
    }
    let light = json::get(lights, "light", json::as_u32).ok_or_else(|| Err::InvalidNode(format!(
        "missing or invalid KHR_lights_punctual light property of node {}", i
    )))?;
    if light as usize >= count {
        return Err(Err::OutOfRange(format!(
            "light index {} in node {} out of range for {} lights", light, i, count
        )));
    }
    Ok(Some(light))
}

/// Validates the material references of every primitive of a mesh.
fn check_mesh_materials(document: &Document, mesh: u32) -> Result<(), Err> {
    let count = document.materials.len();
    let begin = document.mesh_size_offsets[mesh as usize];
    let end = document.mesh_size_offsets[mesh as usize + 1];
    for flattened in begin..end {
        let primitive = document.primitive(flattened as usize);
        let p = flattened - begin;
        let material = json::find(primitive, "material", json::as_u32).map_err(|_| Err::InvalidNode(format!(
            "invalid material property of mesh {} primitive {}", mesh, p
        )))?;
        if let Some(material) = material.filter(|m| *m as usize >= count) {
            return Err(Err::OutOfRange(format!(
                "material index {} in mesh {} primitive {} out of range for {} materials", material, mesh, p, count
            )));
        }
    }
    Ok(())
}

/// Builds scene `id`: a breadth-first list of its objects with parent links
/// and one column per field used by any of them.
pub(crate) fn import(document: &Document, config: &Config, id: usize) -> Result<SceneData, Err> {
    let gltf_scene = &document.scenes.items[id];
    let mut objects = gltf_scene.get("nodes").and_then(json::as_u32_array).unwrap_or_default();

    let mut children_offsets = vec![0, objects.len() as u32];
    let mut i = 0;
    while i < objects.len() {
        let node = &document.nodes.items[objects[i] as usize];
        if let Some(children) = node.get("children").and_then(json::as_u32_array) {
            objects.extend(children);
        }
        children_offsets.push(objects.len() as u32);
        i += 1;
    }
    let mapping_bound = objects.iter().max().map_or(0, |max| max + 1);

    let mut parents = vec![-1i32; objects.len()];
    for (i, object) in objects.iter().enumerate() {
        let begin = children_offsets[i + 1] as usize;
        let end = children_offsets[i + 2] as usize;
        for parent in &mut parents[begin..end] {
            *parent = *object as i32;
        }
    }

    // First pass, validating references and deciding which columns exist
    let mut refs = Vec::with_capacity(objects.len());
    let mut trs_count = 0;
    let mut transformation_count = 0;
    let (mut has_translation, mut has_rotation, mut has_scaling) = (false, false, false);
    for &object in &objects {
        let node = &document.nodes.items[object as usize];
        let (t, r, s) = (node.get("translation").is_some(), node.get("rotation").is_some(), node.get("scale").is_some());
        if t || r || s {
            trs_count += 1;
            transformation_count += 1;
        } else if node.get("matrix").is_some() {
            transformation_count += 1;
        }
        has_translation |= t;
        has_rotation |= r;
        has_scaling |= s;

        let mesh = index_property(node, object, "mesh", "meshes", document.meshes.len())?;
        if let Some(mesh) = mesh {
            check_mesh_materials(document, mesh)?;
        }
        refs.push(NodeRefs {
            mesh,
            camera: index_property(node, object, "camera", "cameras", document.cameras.len())?,
            skin: index_property(node, object, "skin", "skins", document.skins.len())?,
            light: node_light(node, object, document.lights.len())?,
        });
    }

    let mut fields = vec![SceneFieldData {
        name: SceneField::Parent,
        mapping: objects.clone(),
        values: SceneFieldValues::Int(parents),
        multi_entry: false,
    }];

    // A separate matrix column only if some object isn't described by TRS
    let has_transformation = transformation_count != trs_count;
    let mut transformations = (Vec::new(), Vec::new());
    let mut translations = (Vec::new(), Vec::new());
    let mut rotations = (Vec::new(), Vec::new());
    let mut scalings = (Vec::new(), Vec::new());
    for &object in &objects {
        let node = &document.nodes.items[object as usize];
        let translation = json::find(node, "translation", json::as_f32_array::<3>)
            .map_err(|_| Err::InvalidNode(format!("invalid translation property of node {}", object)))?;
        let rotation = json::find(node, "rotation", json::as_f32_array::<4>)
            .map_err(|_| Err::InvalidNode(format!("invalid rotation property of node {}", object)))?
            .map(|r| {
                let rotation = Quaternion::from_xyzw(r);
                if config.normalize_quaternions && !rotation.is_normalized() {
                    crate::quiet_warn!(config.quiet, "rotation quaternion of node {} was renormalized", object);
                    rotation.normalized()
                } else {
                    rotation
                }
            });
        let scaling = json::find(node, "scale", json::as_f32_array::<3>)
            .map_err(|_| Err::InvalidNode(format!("invalid scale property of node {}", object)))?;
        let matrix = json::find(node, "matrix", json::as_f32_array::<16>)
            .map_err(|_| Err::InvalidNode(format!("invalid matrix property of node {}", object)))?;
        let has_trs = translation.is_some() || rotation.is_some() || scaling.is_some();

        if has_transformation && (has_trs || matrix.is_some()) {
            let transformation = match matrix {
                Some(matrix) => Matrix4::from_column_major(&matrix),
                None => Matrix4::translation(translation.unwrap_or([0.0; 3]))
                    * rotation.unwrap_or_default().to_matrix4()
                    * Matrix4::scaling(scaling.unwrap_or([1.0; 3])),
            };
            transformations.0.push(object);
            transformations.1.push(transformation);
        }
        if has_trs {
            if has_translation {
                translations.0.push(object);
                translations.1.push(translation.unwrap_or([0.0; 3]));
            }
            if has_rotation {
                rotations.0.push(object);
                rotations.1.push(rotation.unwrap_or_default());
            }
            if has_scaling {
                scalings.0.push(object);
                scalings.1.push(scaling.unwrap_or([1.0; 3]));
            }
        }
    }
    if has_transformation {
        fields.push(field(SceneField::Transformation, transformations.0, SceneFieldValues::Matrix4(transformations.1)));
    }
    if has_translation {
        fields.push(field(SceneField::Translation, translations.0, SceneFieldValues::Vector3(translations.1)));
    }
    if has_rotation {
        fields.push(field(SceneField::Rotation, rotations.0, SceneFieldValues::Quaternion(rotations.1)));
    }
    if has_scaling {
        fields.push(field(SceneField::Scaling, scalings.0, SceneFieldValues::Vector3(scalings.1)));
    }

    // Every primitive of a multi-primitive mesh is a separate mesh
    let mut meshes = (Vec::new(), Vec::new(), Vec::new());
    let mut has_material = false;
    for (&object, node_refs) in objects.iter().zip(&refs) {
        let Some(mesh) = node_refs.mesh else { continue };
        let begin = document.mesh_size_offsets[mesh as usize];
        let end = document.mesh_size_offsets[mesh as usize + 1];
        for flattened in begin..end {
            let material = json::get(document.primitive(flattened as usize), "material", json::as_u32);
            has_material |= material.is_some();
            meshes.0.push(object);
            meshes.1.push(flattened);
            meshes.2.push(material.map_or(-1, |m| m as i32));
        }
    }
    if !meshes.0.is_empty() {
        fields.push(field(SceneField::Mesh, meshes.0.clone(), SceneFieldValues::UnsignedInt(meshes.1)));
        if has_material {
            fields.push(field(SceneField::MeshMaterial, meshes.0, SceneFieldValues::Int(meshes.2)));
        }
    }

    for (name, get) in [
        (SceneField::Camera, (|r: &NodeRefs| r.camera) as fn(&NodeRefs) -> Option<u32>),
        (SceneField::Skin, |r: &NodeRefs| r.skin),
        (SceneField::Light, |r: &NodeRefs| r.light),
    ] {
        let (mapping, values): (Vec<u32>, Vec<u32>) = objects.iter().zip(&refs)
            .filter_map(|(&object, r)| get(r).map(|v| (object, v)))
            .unzip();
        if !mapping.is_empty() {
            fields.push(field(name, mapping, SceneFieldValues::UnsignedInt(values)));
        }
    }

    fields.extend(custom_fields(document, config, &objects));

    Ok(SceneData::new(mapping_bound, fields, children_offsets))
}

fn field(name: SceneField, mapping: Vec<u32>, values: SceneFieldValues) -> SceneFieldData {
    SceneFieldData { name, mapping, values, multi_entry: false }
}

/// Scalar value of a custom field.
enum Scalar {
    Bit(bool),
    Float(f32),
    UnsignedInt(u32),
    Int(i32),
    String(String),
}

fn parse_scalar(field_type: SceneFieldType, value: &Value) -> Option<Scalar> {
    match field_type {
        SceneFieldType::Bit => value.as_bool().map(Scalar::Bit),
        SceneFieldType::Float => json::as_f32(value).map(Scalar::Float),
        SceneFieldType::UnsignedInt => json::as_u32(value).map(Scalar::UnsignedInt),
        SceneFieldType::Int => value.as_i64().and_then(|v| i32::try_from(v).ok()).map(Scalar::Int),
        SceneFieldType::String => value.as_str().map(|s| Scalar::String(s.to_string())),
    }
}

fn push_scalar(values: &mut SceneFieldValues, scalar: Scalar) {
    match (values, scalar) {
        (SceneFieldValues::Bit(v), Scalar::Bit(s)) => v.push(s),
        (SceneFieldValues::Float(v), Scalar::Float(s)) => v.push(s),
        (SceneFieldValues::UnsignedInt(v), Scalar::UnsignedInt(s)) => v.push(s),
        (SceneFieldValues::Int(v), Scalar::Int(s)) => v.push(s),
        (SceneFieldValues::String(v), Scalar::String(s)) => v.push(s),
        _ => {}
    }
}

/// Collects custom fields from node extras. Values that don't match the
/// field discovered when opening the file are skipped with a warning.
fn custom_fields(document: &Document, config: &Config, objects: &[u32]) -> Vec<SceneFieldData> {
    let mut columns: Vec<SceneFieldData> = document.scene_fields.values().enumerate().map(|(i, info)| {
        let values = match info.field_type {
            SceneFieldType::Bit => SceneFieldValues::Bit(Vec::new()),
            SceneFieldType::Float => SceneFieldValues::Float(Vec::new()),
            SceneFieldType::UnsignedInt => SceneFieldValues::UnsignedInt(Vec::new()),
            SceneFieldType::Int => SceneFieldValues::Int(Vec::new()),
            SceneFieldType::String => SceneFieldValues::String(Vec::new()),
        };
        SceneFieldData {
            name: SceneField::Custom(i as u32),
            mapping: Vec::new(),
            values,
            multi_entry: info.multi_entry,
        }
    }).collect();

    for &object in objects {
        match document.nodes.items[object as usize].get("extras") {
            None => {}
            Some(Value::Object(extras)) => {
                for (key, value) in extras {
                    collect_extra(document, config, &mut columns, object, key.clone(), value);
                }
            }
            Some(other) => crate::quiet_warn!(
                config.quiet,
                "node {} extras property is {}, skipping",
                object, json::type_name(other)
            ),
        }
    }

    columns.retain(|c| !c.mapping.is_empty());
    columns
}

fn collect_extra(
    document: &Document,
    config: &Config,
    columns: &mut [SceneFieldData],
    object: u32,
    key: String,
    value: &Value,
) {
    let quiet = config.quiet;
    match value {
        Value::Object(nested) => {
            for (nested_key, nested_value) in nested {
                collect_extra(document, config, columns, object, format!("{}.{}", key, nested_key), nested_value);
            }
        }
        Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            let Some((id, _, info)) = document.scene_fields.get_full(&key) else { return };
            if info.multi_entry {
                crate::quiet_warn!(quiet, "node {} extras {} property was expected to be an array, skipping", object, key);
                return;
            }
            match parse_scalar(info.field_type, value) {
                Some(scalar) => {
                    columns[id].mapping.push(object);
                    push_scalar(&mut columns[id].values, scalar);
                }
                None => crate::quiet_warn!(quiet, "invalid node {} extras {} property, skipping", object, key),
            }
        }
        Value::Array(array) => {
            if array.is_empty() {
                return;
            }
            let Some(array_type) = json::common_array_type(array) else {
                crate::quiet_warn!(quiet, "node {} extras {} property is a heterogeneous array, skipping", object, key);
                return;
            };
            if !matches!(array_type, "bool" | "number" | "string") {
                crate::quiet_warn!(quiet, "node {} extras property is an array of {}, skipping", object, array_type);
                return;
            }
            let Some((id, _, info)) = document.scene_fields.get_full(&key) else { return };
            if !info.multi_entry {
                crate::quiet_warn!(quiet, "node {} extras {} property was not expected to be an array, skipping", object, key);
                return;
            }
            match array.iter().map(|v| parse_scalar(info.field_type, v)).collect::<Option<Vec<_>>>() {
                Some(scalars) => {
                    for scalar in scalars {
                        columns[id].mapping.push(object);
                        push_scalar(&mut columns[id].values, scalar);
                    }
                }
                None => crate::quiet_warn!(quiet, "invalid node {} extras {} array property, skipping", object, key),
            }
        }
        Value::Null => crate::quiet_warn!(quiet, "node {} extras {} property is null, skipping", object, key),
    }
}
