use serde_json::Value;

use crate::core::format::{ComponentType, IndexType, Shape, VertexFormat};
use crate::core::mesh::{MeshAttribute, MeshAttributeData, MeshData, MeshIndexData, MeshPrimitive};
use crate::io::gltf::document::split_numbered;
use crate::io::gltf::resolver::{self, Accessor, Resolver};
use crate::io::gltf::{json, sparse};
use crate::utils::ranges::{self, SourceRange};

const MAX_MORPH_TARGETS: usize = 128;

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone)]
pub enum Err {
    #[error("{0}")]
    Accessor(#[from] resolver::Err),
    #[error("{0}")]
    InvalidIndices(String),
    #[error("{0}")]
    InvalidPrimitive(String),
    #[error("{0}")]
    Sparse(#[from] sparse::Err),
    #[error("{0}")]
    Strict(String),
    #[error("{0}")]
    UnsupportedFormat(String),
    #[error("{0}")]
    VertexCount(String),
}

/// Attribute reference as declared in the primitive.
struct Declared<'a> {
    name: &'a str,
    accessor: u32,
    morph_target_id: i32,
}

/// Attribute after its accessor was resolved and its semantic decided.
struct Resolved {
    accessor_id: u32,
    accessor: Accessor,
    data: MeshAttributeData,
}

fn morph_suffix(morph_target_id: i32) -> String {
    if morph_target_id == -1 {
        String::new()
    } else {
        format!(" in morph target {}", morph_target_id)
    }
}

/// Assembles flattened mesh `id` into a single vertex arena.
pub(crate) fn import(resolver: &mut Resolver, id: usize) -> Result<MeshData, Err> {
    let document = resolver.document;
    let config = resolver.config;
    let gltf_primitive = document.primitive(id);

    let primitive = match json::find(gltf_primitive, "mode", json::as_u32) {
        Err(_) => return Err(Err::InvalidPrimitive("invalid primitive mode property".to_string())),
        Ok(None) => MeshPrimitive::Triangles,
        Ok(Some(mode)) => MeshPrimitive::from_gltf(mode)
            .ok_or_else(|| Err::InvalidPrimitive(format!("unrecognized primitive {}", mode)))?,
    };

    let declared = declared_attributes(gltf_primitive, config.strict)?;

    let mut last_numbered: Option<(&str, u32)> = None;
    let mut resolved: Vec<Resolved> = Vec::with_capacity(declared.len());
    let mut vertex_count = 0;
    let mut joint_count = 0;
    let mut weight_count = 0;
    for attribute in &declared {
        // Numbered attributes are expected to be contiguous
        let base = match split_numbered(attribute.name) {
            Some((base, number)) => {
                let expected = match last_numbered {
                    Some((last, n)) if last == base => n + 1,
                    _ => 0,
                };
                if number != expected {
                    crate::quiet_warn!(
                        config.quiet,
                        "found attribute {} but expected {}_{}",
                        attribute.name, base, expected
                    );
                }
                last_numbered = Some((base, number));
                base
            }
            None => {
                last_numbered = None;
                attribute.name
            }
        };

        let accessor = resolver.accessor(attribute.accessor)?;
        let is_object_id = attribute.name == config.object_id_attribute;

        if config.strict && accessor.format.component == ComponentType::UnsignedInt {
            return Err(Err::Strict(format!(
                "strict mode enabled, disallowing {} with a 32-bit integer vertex format {}",
                attribute.name, accessor.format
            )));
        }
        if attribute.morph_target_id != -1 && (base == "JOINTS" || base == "WEIGHTS" || is_object_id) {
            let kind = if is_object_id { "object ID attribute " } else { "" };
            return Err(Err::InvalidPrimitive(format!(
                "{}{} is not allowed to be a morph target", kind, attribute.name
            )));
        }

        let custom = || {
            document.attribute_names.get_index_of(attribute.name)
                .map(|i| MeshAttribute::Custom(i as u32))
                .ok_or_else(|| Err::InvalidPrimitive(format!("unknown attribute {}", attribute.name)))
        };
        let (name, format, array_size) = match classify(base, is_object_id, accessor.format) {
            Classified::Builtin(name, format, array_size) => {
                match name {
                    MeshAttribute::JointIds => joint_count += 1,
                    MeshAttribute::Weights => weight_count += 1,
                    _ => {}
                }
                (name, format, array_size)
            }
            Classified::Custom => (custom()?, accessor.format, 0),
            Classified::Unsupported => {
                let kind = if is_object_id { "object ID attribute " } else { "" };
                let message = format!(
                    "unsupported {}{} format {}{}",
                    kind, attribute.name, accessor.format, morph_suffix(attribute.morph_target_id)
                );
                if config.strict {
                    return Err(Err::UnsupportedFormat(format!(
                        "{}, set strict=false to import as a custom attribute", message
                    )));
                }
                crate::quiet_warn!(config.quiet, "{}, importing as a custom attribute", message);
                (custom()?, accessor.format, 0)
            }
        };

        if resolved.is_empty() {
            vertex_count = accessor.count;
        } else if accessor.count != vertex_count {
            return Err(Err::VertexCount(format!(
                "mismatched vertex count for attribute {}{}, expected {} but got {}",
                attribute.name, morph_suffix(attribute.morph_target_id), vertex_count, accessor.count
            )));
        }

        resolved.push(Resolved {
            accessor_id: attribute.accessor,
            accessor,
            data: MeshAttributeData {
                name,
                format,
                offset: 0,
                stride: 0,
                array_size,
                morph_target_id: attribute.morph_target_id,
            },
        });
    }

    if vertex_count == 0 && config.strict {
        return Err(Err::Strict("strict mode enabled, disallowing a mesh with no vertices".to_string()));
    }
    if joint_count != weight_count {
        return Err(Err::InvalidPrimitive(format!(
            "the mesh has {} JOINTS_n attributes but {} WEIGHTS_n attributes", joint_count, weight_count
        )));
    }

    let mut vertex_data = assemble(resolver, &mut resolved, vertex_count)?;
    if !document.texture_coordinate_y_flip_in_material {
        for attribute in &resolved {
            if attribute.data.name == MeshAttribute::TextureCoordinates {
                flip_texture_coordinates(&mut vertex_data, &attribute.data, vertex_count);
            }
        }
    }

    let indices = match gltf_primitive.get("indices") {
        None => None,
        Some(value) => Some(import_indices(resolver, value)?),
    };

    let attributes = resolved.into_iter().map(|a| a.data).collect();
    Ok(MeshData::new(primitive, indices, vertex_data, attributes, vertex_count))
}

/// Collects base and morph target attributes ordered by morph target and
/// name. Of duplicate names only the last one is kept.
fn declared_attributes(gltf_primitive: &Value, strict: bool) -> Result<Vec<Declared<'_>>, Err> {
    let mut declared = Vec::new();
    if let Some(attributes) = gltf_primitive.get("attributes").and_then(Value::as_object) {
        for (name, value) in attributes {
            let accessor = json::as_u32(value)
                .ok_or_else(|| Err::InvalidPrimitive(format!("invalid attribute {}", name)))?;
            declared.push(Declared { name, accessor, morph_target_id: -1 });
        }
    }

    if declared.is_empty() && strict {
        return Err(Err::Strict("strict mode enabled, disallowing a mesh with no attributes".to_string()));
    }

    if let Some(targets) = gltf_primitive.get("targets").and_then(Value::as_array) {
        for (t, target) in targets.iter().enumerate() {
            let Some(target) = target.as_object() else { continue };
            for (name, value) in target {
                let accessor = json::as_u32(value)
                    .ok_or_else(|| Err::InvalidPrimitive(format!("invalid morph target attribute {}", name)))?;
                if t >= MAX_MORPH_TARGETS {
                    return Err(Err::InvalidPrimitive(format!(
                        "only {} morph targets are supported at most", MAX_MORPH_TARGETS
                    )));
                }
                declared.push(Declared { name, accessor, morph_target_id: t as i32 });
            }
        }
    }

    // Stable, so equal keys stay in declaration order and the last one wins
    declared.sort_by(|a, b| (a.morph_target_id, a.name).cmp(&(b.morph_target_id, b.name)));
    let mut unique: Vec<Declared> = Vec::with_capacity(declared.len());
    for attribute in declared {
        match unique.last_mut() {
            Some(last) if last.morph_target_id == attribute.morph_target_id && last.name == attribute.name => {
                *last = attribute;
            }
            _ => unique.push(attribute),
        }
    }
    Ok(unique)
}

enum Classified {
    Builtin(MeshAttribute, VertexFormat, u16),
    Custom,
    Unsupported,
}

/// Decides the semantic of an attribute from its base name and checks its
/// format against what the semantic allows.
fn classify(base: &str, is_object_id: bool, format: VertexFormat) -> Classified {
    use ComponentType::*;
    let VertexFormat { component, shape, normalized } = format;
    let float_or_signed_normalized = component == Float || (normalized && matches!(component, Byte | Short));
    let float_or_unsigned_normalized = component == Float || (normalized && matches!(component, UnsignedByte | UnsignedShort));
    let unsigned_integer = !normalized && matches!(component, UnsignedByte | UnsignedShort | UnsignedInt);

    let builtin = |ok: bool, name: MeshAttribute| {
        if ok { Classified::Builtin(name, format, 0) } else { Classified::Unsupported }
    };
    match base {
        "POSITION" => builtin(shape == Shape::Vec3 && component != UnsignedInt, MeshAttribute::Position),
        "NORMAL" => builtin(shape == Shape::Vec3 && float_or_signed_normalized, MeshAttribute::Normal),
        "TANGENT" => builtin(shape == Shape::Vec4 && float_or_signed_normalized, MeshAttribute::Tangent),
        "TEXCOORD" => builtin(shape == Shape::Vec2 && component != UnsignedInt, MeshAttribute::TextureCoordinates),
        "COLOR" => builtin(
            matches!(shape, Shape::Vec3 | Shape::Vec4) && float_or_unsigned_normalized,
            MeshAttribute::Color,
        ),
        // Joints and weights become arrays of their component format
        "JOINTS" if shape == Shape::Vec4 && unsigned_integer => {
            Classified::Builtin(MeshAttribute::JointIds, VertexFormat::scalar(component), 4)
        }
        "JOINTS" => Classified::Unsupported,
        "WEIGHTS" if shape == Shape::Vec4 && float_or_unsigned_normalized => Classified::Builtin(
            MeshAttribute::Weights,
            VertexFormat::new(component, Shape::Scalar, normalized),
            4,
        ),
        "WEIGHTS" => Classified::Unsupported,
        _ if is_object_id => builtin(shape == Shape::Scalar && unsigned_integer, MeshAttribute::ObjectId),
        _ => Classified::Custom,
    }
}

/// Copies all attribute data into one arena, merging attributes that share
/// memory, and points the attributes to it. Sparse accessors are applied on
/// top.
fn assemble(resolver: &Resolver, resolved: &mut [Resolved], vertex_count: usize) -> Result<Vec<u8>, Err> {
    let source_ranges = resolved.iter().enumerate().map(|(i, a)| {
        let size = a.accessor.element_size();
        if a.accessor.buffer_view.is_none() || a.accessor.sparse.is_some() {
            SourceRange { attribute: i, buffer: None, begin: 0, end: vertex_count * size }
        } else {
            SourceRange {
                attribute: i,
                buffer: Some(a.accessor.buffer),
                begin: a.accessor.offset,
                end: a.accessor.offset + a.accessor.span(),
            }
        }
    }).collect();
    let layout = ranges::layout(source_ranges);

    let mut arena = vec![0u8; layout.size];
    for placement in &layout.placements {
        if let Some(buffer) = placement.buffer {
            let source = &resolver.buffer_bytes(buffer)[placement.begin..placement.end];
            arena[placement.arena_offset..placement.arena_offset + source.len()].copy_from_slice(source);
        }
    }

    for (i, attribute) in resolved.iter_mut().enumerate() {
        attribute.data.offset = layout.offsets[i];
        let accessor = &attribute.accessor;
        let synthetic = accessor.buffer_view.is_none() || accessor.sparse.is_some();
        attribute.data.stride = if synthetic { accessor.element_size() } else { accessor.stride };

        if let Some(sparse) = &accessor.sparse {
            let size = accessor.element_size();
            let begin = attribute.data.offset;
            let destination = &mut arena[begin..begin + vertex_count * size];
            destination.copy_from_slice(&resolver.contiguous(accessor));
            sparse::apply(
                attribute.accessor_id,
                sparse.index_type,
                resolver.sparse_indices(sparse),
                resolver.sparse_values(sparse, size),
                size,
                destination,
            )?;
        }
    }
    Ok(arena)
}

/// Flips texture coordinates vertically where the format allows it.
/// Non-normalized and signed formats are flipped in the material instead.
fn flip_texture_coordinates(arena: &mut [u8], attribute: &MeshAttributeData, vertex_count: usize) {
    let format = attribute.format;
    for v in 0..vertex_count {
        let begin = attribute.offset + v * attribute.stride;
        match (format.component, format.normalized) {
            (ComponentType::Float, _) => {
                let y = &mut arena[begin + 4..begin + 8];
                let value = 1.0 - f32::from_le_bytes([y[0], y[1], y[2], y[3]]);
                y.copy_from_slice(&value.to_le_bytes());
            }
            (ComponentType::UnsignedByte, true) => {
                arena[begin + 1] = 255 - arena[begin + 1];
            }
            (ComponentType::UnsignedShort, true) => {
                let y = &mut arena[begin + 2..begin + 4];
                let value = 65535 - u16::from_le_bytes([y[0], y[1]]);
                y.copy_from_slice(&value.to_le_bytes());
            }
            _ => return,
        }
    }
}

fn import_indices(resolver: &mut Resolver, value: &Value) -> Result<MeshIndexData, Err> {
    let id = json::as_u32(value)
        .ok_or_else(|| Err::InvalidIndices("invalid indices property".to_string()))?;
    let accessor = resolver.accessor(id)?;
    let Some(view) = accessor.buffer_view else {
        return Err(Err::InvalidIndices(format!(
            "index accessor {} has no buffer view, which is unsupported", id
        )));
    };
    if accessor.sparse.is_some() {
        return Err(Err::InvalidIndices(format!(
            "index accessor {} is using sparse storage, which is unsupported", id
        )));
    }
    let index_type = Some(accessor.format)
        .filter(|f| f.shape == Shape::Scalar && !f.normalized)
        .and_then(|f| IndexType::from_component(f.component))
        .ok_or_else(|| Err::InvalidIndices(format!("unsupported index type {}", accessor.format)))?;
    if !accessor.is_contiguous() {
        return Err(Err::InvalidIndices(format!("index buffer view {} is not contiguous", view)));
    }
    Ok(MeshIndexData { index_type, data: resolver.accessor_bytes(&accessor).to_vec() })
}
