use std::collections::HashMap;
use std::ops::Range;

use serde_json::Value;

use crate::core::animation::{
    AnimationData, AnimationTrackData, CubicHermite, Extrapolation, Interpolation, TrackTarget,
    TrackValues,
};
use crate::core::format::{ComponentType, Shape, VertexFormat};
use crate::core::scene::Quaternion;
use crate::io::gltf::json;
use crate::io::gltf::resolver::{self, Accessor, Resolver};
use crate::utils::read_f32s;

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Err {
    #[error(transparent)]
    Accessor(#[from] resolver::Err),
    #[error("{0}")]
    InvalidProperty(String),
    #[error("{0}")]
    OutOfRange(String),
    #[error("{0}")]
    Unsupported(String),
}

struct SamplerInfo {
    input: u32,
    output: u32,
    interpolation: Interpolation,
}

/// Accessor contents shared by all samplers referencing the accessor.
struct TrackSource {
    accessor: Accessor,
    values: Vec<f32>,
    /// Time track a spline was scaled with, set once the tangents are scaled.
    spline_time_track: Option<u32>,
}

fn parse_sampler(sampler: &Value, index: usize) -> Result<SamplerInfo, Err> {
    if !sampler.is_object() {
        return Err(Err::InvalidProperty(format!("invalid sampler {}", index)));
    }
    let input = json::get(sampler, "input", json::as_u32).ok_or_else(|| Err::InvalidProperty(
        format!("missing or invalid sampler {} input property", index)
    ))?;
    let output = json::get(sampler, "output", json::as_u32).ok_or_else(|| Err::InvalidProperty(
        format!("missing or invalid sampler {} output property", index)
    ))?;
    let interpolation = json::find(sampler, "interpolation", json::as_str)
        .map_err(|_| Err::InvalidProperty(format!("invalid sampler {} interpolation property", index)))?;
    let interpolation = match interpolation.unwrap_or("LINEAR") {
        "LINEAR" => Interpolation::Linear,
        "STEP" => Interpolation::Constant,
        "CUBICSPLINE" => Interpolation::Spline,
        other => return Err(Err::InvalidProperty(format!(
            "unrecognized sampler {} interpolation {}", index, other
        ))),
    };
    Ok(SamplerInfo { input, output, interpolation })
}

fn load_source(resolver: &mut Resolver, id: u32, what: &str) -> Result<TrackSource, Err> {
    let accessor = resolver.accessor(id)?;
    if accessor.buffer_view.is_none() {
        return Err(Err::Unsupported(format!(
            "{} accessor {} has no buffer view, which is unsupported", what, id
        )));
    }
    if accessor.sparse.is_some() {
        return Err(Err::Unsupported(format!(
            "{} accessor {} is using sparse storage, which is unsupported", what, id
        )));
    }
    // Non-float accessors are rejected before their values are used
    let values = read_f32s(&resolver.contiguous(&accessor));
    Ok(TrackSource { accessor, values, spline_time_track: None })
}

/// Multiplies the tangents of a spline by the duration of the adjacent key
/// interval. `width` is the component count of one value.
fn scale_spline_tangents(keys: &[f32], values: &mut [f32], width: usize) {
    let stride = width * 3;
    for i in 0..keys.len().saturating_sub(1) {
        let dt = keys[i + 1] - keys[i];
        let out_tangent = i * stride + 2 * width;
        let in_tangent = (i + 1) * stride;
        for v in &mut values[out_tangent..out_tangent + width] {
            *v *= dt;
        }
        for v in &mut values[in_tangent..in_tangent + width] {
            *v *= dt;
        }
    }
}

fn vector3(values: &[f32]) -> Vec<[f32; 3]> {
    values.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
}

fn quaternions(values: &[f32]) -> Vec<Quaternion> {
    values.chunks_exact(4).map(|c| Quaternion::from_xyzw([c[0], c[1], c[2], c[3]])).collect()
}

fn hermite<T: Copy>(values: Vec<T>) -> Vec<CubicHermite<T>> {
    values.chunks_exact(3)
        .map(|c| CubicHermite { in_tangent: c[0], point: c[1], out_tangent: c[2] })
        .collect()
}

/// Flips quaternions so consecutive keys are never more than half a turn
/// apart.
fn shortest_path(values: &mut [Quaternion]) {
    let mut flip = 1.0;
    for j in 1..values.len() {
        if values[j - 1].dot(&values[j].scaled(flip)) < 0.0 {
            flip = -flip;
        }
        values[j] = values[j].scaled(flip);
    }
}

/// Imports glTF animations `animations` as one animation. A single clip is
/// imported with a one-element range, merged clips with the full range.
pub(crate) fn import(resolver: &mut Resolver, animations: Range<usize>) -> Result<AnimationData, Err> {
    let document = resolver.document;
    let config = resolver.config;
    let gltf_animations = &document.animations.items[animations];

    let mut samplers = Vec::with_capacity(gltf_animations.len());
    let mut sources: HashMap<u32, TrackSource> = HashMap::new();
    for animation in gltf_animations {
        let gltf_samplers = animation.get("samplers").and_then(Value::as_array)
            .ok_or_else(|| Err::InvalidProperty("missing or invalid samplers property".to_string()))?;
        let mut parsed = Vec::with_capacity(gltf_samplers.len());
        for (index, sampler) in gltf_samplers.iter().enumerate() {
            let sampler = parse_sampler(sampler, index)?;
            for (id, what) in [(sampler.input, "input"), (sampler.output, "output")] {
                if !sources.contains_key(&id) {
                    let source = load_source(resolver, id, what)?;
                    sources.insert(id, source);
                }
            }
            parsed.push(sampler);
        }
        samplers.push(parsed);
    }

    let mut channels = Vec::with_capacity(gltf_animations.len());
    for animation in gltf_animations {
        let gltf_channels = animation.get("channels").and_then(Value::as_array)
            .ok_or_else(|| Err::InvalidProperty("missing or invalid channels property".to_string()))?;
        for (index, channel) in gltf_channels.iter().enumerate() {
            if !channel.is_object() {
                return Err(Err::InvalidProperty(format!("invalid channel {}", index)));
            }
            if !channel.get("target").is_some_and(Value::is_object) {
                return Err(Err::InvalidProperty(format!("missing or invalid channel {} target property", index)));
            }
        }
        channels.push(gltf_channels);
    }

    let time_format = VertexFormat::new(ComponentType::Float, Shape::Scalar, false);
    let vector3_format = VertexFormat::new(ComponentType::Float, Shape::Vec3, false);
    let vector4_format = VertexFormat::new(ComponentType::Float, Shape::Vec4, false);

    let mut tracks = Vec::new();
    let mut renormalized = false;
    for (animation_samplers, gltf_channels) in samplers.iter().zip(channels) {
        for (index, channel) in gltf_channels.iter().enumerate() {
            let sampler_id = json::get(channel, "sampler", json::as_u32).ok_or_else(|| Err::InvalidProperty(
                format!("missing or invalid channel {} sampler property", index)
            ))?;
            let sampler = animation_samplers.get(sampler_id as usize).ok_or_else(|| Err::OutOfRange(format!(
                "sampler index {} in channel {} out of range for {} samplers",
                sampler_id, index, animation_samplers.len()
            )))?;

            // Channels animating anything but nodes are skipped
            let target = &channel["target"];
            let Some(node) = target.get("node") else {
                continue;
            };
            let node = json::as_u32(node).ok_or_else(|| Err::InvalidProperty(
                format!("invalid channel {} target node property", index)
            ))?;
            if node as usize >= document.nodes.len() {
                return Err(Err::OutOfRange(format!(
                    "target node index {} in channel {} out of range for {} nodes",
                    node, index, document.nodes.len()
                )));
            }

            let input = &sources[&sampler.input];
            if input.accessor.format != time_format {
                return Err(Err::Unsupported(format!(
                    "channel {} time track has unexpected type {}", index, input.accessor.format
                )));
            }
            let keys = input.values.clone();
            let key_count = input.accessor.count;

            let is_spline = sampler.interpolation == Interpolation::Spline;
            let values_per_key = if is_spline { 3 } else { 1 };
            let output_count = sources[&sampler.output].accessor.count;
            if key_count * values_per_key != output_count {
                return Err(Err::InvalidProperty(format!(
                    "channel {} target track size doesn't match time track size, expected {} but got {}",
                    index, output_count, key_count * values_per_key
                )));
            }

            let path = json::get(target, "path", json::as_str).ok_or_else(|| Err::InvalidProperty(
                format!("missing or invalid channel {} target path property", index)
            ))?;
            let (track_target, expected_format, width, name) = match path {
                "translation" => (TrackTarget::Translation3D, vector3_format, 3, "translation"),
                "rotation" => (TrackTarget::Rotation3D, vector4_format, 4, "rotation"),
                "scale" => (TrackTarget::Scaling3D, vector3_format, 3, "scaling"),
                other => return Err(Err::Unsupported(format!("unsupported track target {}", other))),
            };

            let output = sources.get_mut(&sampler.output).ok_or_else(|| Err::OutOfRange(format!(
                "accessor {} was not loaded", sampler.output
            )))?;
            if output.accessor.format != expected_format {
                return Err(Err::Unsupported(format!(
                    "{} track has unexpected type {}", name, output.accessor.format
                )));
            }

            // Spline tangents are scaled in place once, so a spline output
            // can only be shared by samplers with the same time track
            if is_spline {
                match output.spline_time_track {
                    None => {
                        scale_spline_tangents(&keys, &mut output.values, width);
                        output.spline_time_track = Some(sampler.input);
                    }
                    Some(time_track) if time_track != sampler.input => {
                        return Err(Err::Unsupported(
                            "spline track is shared with different time tracks, which is unsupported".to_string()
                        ));
                    }
                    Some(_) => {}
                }
            }

            let values = match (track_target, is_spline) {
                (TrackTarget::Rotation3D, true) => TrackValues::CubicHermiteQuaternion(hermite(quaternions(&output.values))),
                (TrackTarget::Rotation3D, false) => {
                    let mut values = quaternions(&output.values);
                    if config.optimize_quaternion_shortest_path {
                        shortest_path(&mut values);
                    }
                    if config.normalize_quaternions {
                        for q in values.iter_mut().filter(|q| !q.is_normalized()) {
                            *q = q.normalized();
                            renormalized = true;
                        }
                    }
                    TrackValues::Quaternion(values)
                }
                (_, true) => TrackValues::CubicHermite3D(hermite(vector3(&output.values))),
                (_, false) => TrackValues::Vector3(vector3(&output.values)),
            };

            tracks.push(AnimationTrackData {
                target: track_target,
                target_object: node,
                interpolation: sampler.interpolation,
                extrapolation: Extrapolation::Constant,
                keys,
                values,
            });
        }
    }

    if renormalized {
        crate::quiet_warn!(config.quiet, "quaternions in some rotation tracks were renormalized");
    }
    log::debug!("imported {} animation tracks", tracks.len());
    Ok(AnimationData::new(tracks))
}
