use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::path::PathBuf;

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use crate::core::scene::SceneFieldType;
use crate::io::gltf::{container, json, Config};

lazy_static::lazy_static! {
    /// Extensions that may appear in `extensionsRequired`.
    static ref SUPPORTED_EXTENSIONS: HashSet<&'static str> = [
        "KHR_lights_punctual",
        "KHR_materials_clearcoat",
        "KHR_materials_pbrSpecularGlossiness",
        "KHR_materials_unlit",
        "KHR_mesh_quantization",
        "KHR_texture_basisu",
        "KHR_texture_transform",
        "GOOGLE_texture_basis",
        "MSFT_texture_dds",
        "EXT_texture_webp",
    ].into_iter().collect();
}

pub(crate) const KHR_TEXTURE_KTX: &str = "KHR_texture_ktx";

/// Texture extensions providing an alternative 2D image source.
pub(crate) const IMAGE_SOURCE_EXTENSIONS: [&str; 4] = [
    "KHR_texture_basisu",
    "GOOGLE_texture_basis",
    "MSFT_texture_dds",
    "EXT_texture_webp",
];

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone)]
pub enum Err {
    #[error("{0}")]
    Container(#[from] container::Err),
    #[error("{0}")]
    InvalidAsset(String),
    #[error("{0}")]
    InvalidConfig(String),
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("{0}")]
    InvalidProperty(String),
    #[error("{0}")]
    NodeHierarchy(String),
    #[error("{0}")]
    TextureDimension(String),
    #[error("{0}")]
    UnsupportedExtension(String),
    #[error("{0}")]
    UnsupportedVersion(String),
}

/// Objects of one top-level array together with their names. Objects without
/// a name have an empty one.
#[derive(Debug, Default)]
pub(crate) struct Named {
    pub items: Vec<Value>,
    pub names: Vec<String>,
    for_name: OnceCell<HashMap<String, u32>>,
}

impl Named {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn name(&self, id: usize) -> &str {
        &self.names[id]
    }

    /// First object with given name. The lookup table is built on first use.
    pub fn for_name(&self, name: &str) -> Option<u32> {
        self.for_name.get_or_init(|| {
            let mut map = HashMap::with_capacity(self.names.len());
            for (i, n) in self.names.iter().enumerate() {
                if !n.is_empty() {
                    map.entry(n.clone()).or_insert(i as u32);
                }
            }
            map
        }).get(name).copied()
    }
}

/// Custom scene field discovered in node extras.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SceneFieldInfo {
    pub field_type: SceneFieldType,
    pub multi_entry: bool,
}

/// Validated, indexed view of one opened glTF file. Never changes after
/// opening; lazily resolved data lives in the resolver cache.
#[derive(Debug)]
pub(crate) struct Document {
    /// The whole input file.
    pub data: Vec<u8>,
    /// Binary chunk of a binary glTF, a range of `data`.
    pub bin: Option<Range<usize>>,
    /// Directory of the opened file, for resolving external URIs.
    pub base_path: Option<PathBuf>,

    pub buffers: Vec<Value>,
    pub buffer_views: Vec<Value>,
    pub accessors: Vec<Value>,
    pub samplers: Vec<Value>,
    pub nodes: Named,
    pub meshes: Named,
    pub cameras: Named,
    pub lights: Named,
    pub animations: Named,
    pub skins: Named,
    pub images: Named,
    pub textures: Named,
    pub materials: Named,
    pub scenes: Named,

    /// Original mesh and primitive index for every flattened mesh.
    pub mesh_primitives: Vec<(u32, u32)>,
    /// `mesh_size_offsets[m]..mesh_size_offsets[m + 1]` are the flattened
    /// meshes of original mesh `m`.
    pub mesh_size_offsets: Vec<u32>,

    /// Every mesh attribute name in the file, a custom attribute id is an
    /// index into this set.
    pub attribute_names: IndexSet<String>,
    /// Custom scene fields from node extras, a custom field id is an index
    /// into this map.
    pub scene_fields: IndexMap<String, SceneFieldInfo>,
    pub texture_coordinate_y_flip_in_material: bool,

    /// Unique texture id for every glTF texture.
    pub unique_texture_for_gltf: Vec<u32>,
    /// glTF texture each unique texture was created from.
    pub unique_textures: Vec<u32>,
    /// glTF images ordered with all 2D images first, then array images.
    pub images_by_dimension: Vec<u32>,
    /// Position of each glTF image in `images_by_dimension`.
    pub image_by_dimension_rev: Vec<u32>,
    pub image_2d_count: usize,

    pub default_scene: Option<u32>,
}

impl Document {
    /// Splits, parses and validates the input. Everything that later object
    /// imports rely on being valid is checked here.
    pub(crate) fn open(data: Vec<u8>, base_path: Option<PathBuf>, config: &Config) -> Result<Self, Err> {
        let split = container::split(&data, config.quiet)?;
        let mut root: Value = serde_json::from_slice(&data[split.json.clone()])
            .map_err(|e| Err::InvalidJson(e.to_string()))?;
        if !root.is_object() {
            return Err(Err::InvalidJson("expected an object at the top level".to_string()));
        }

        check_asset(&root)?;
        check_extensions(&root, config)?;

        let buffers = populate(&mut root, "buffers", "buffer")?;
        let buffer_views = populate(&mut root, "bufferViews", "buffer view")?;
        let accessors = populate(&mut root, "accessors", "accessor")?;
        let samplers = populate(&mut root, "samplers", "sampler")?;
        let nodes = populate_with_name(&mut root, "nodes", "node")?;
        let meshes = populate_with_name(&mut root, "meshes", "mesh")?;
        let cameras = populate_with_name(&mut root, "cameras", "camera")?;
        let animations = populate_with_name(&mut root, "animations", "animation")?;
        let skins = populate_with_name(&mut root, "skins", "skin")?;
        let images = populate_with_name(&mut root, "images", "image")?;
        let textures = populate_with_name(&mut root, "textures", "texture")?;
        let materials = populate_with_name(&mut root, "materials", "material")?;
        let scenes = populate_with_name(&mut root, "scenes", "scene")?;
        let lights = populate_lights(&mut root)?;

        check_node_hierarchy(&nodes.items, &scenes.items)?;
        let scene_fields = discover_scene_fields(&nodes.items, config)?;
        let (mesh_primitives, mesh_size_offsets) = flatten_meshes(&meshes.items)?;

        let mut document = Self {
            data,
            bin: split.bin,
            base_path,
            buffers,
            buffer_views,
            accessors,
            samplers,
            nodes,
            meshes,
            cameras,
            lights,
            animations,
            skins,
            images,
            textures,
            materials,
            scenes,
            mesh_primitives,
            mesh_size_offsets,
            attribute_names: IndexSet::new(),
            scene_fields,
            texture_coordinate_y_flip_in_material: config.texture_coordinate_y_flip_in_material,
            unique_texture_for_gltf: Vec::new(),
            unique_textures: Vec::new(),
            images_by_dimension: Vec::new(),
            image_by_dimension_rev: Vec::new(),
            image_2d_count: 0,
            default_scene: None,
        };
        document.scan_attributes(config)?;
        document.partition_textures(config)?;
        document.default_scene = default_scene(&root, document.scenes.len())?;
        Ok(document)
    }

    /// JSON object of a flattened mesh.
    pub(crate) fn primitive(&self, mesh: usize) -> &Value {
        let (m, p) = self.mesh_primitives[mesh];
        &self.meshes.items[m as usize]["primitives"][p as usize]
    }

    /// Interns every mesh attribute name and decides whether texture
    /// coordinates need to be flipped in the material instead of the data.
    fn scan_attributes(&mut self, config: &Config) -> Result<(), Err> {
        for i in 0..self.mesh_primitives.len() {
            let mesh = self.mesh_primitives[i].0;
            let primitive = self.primitive(i).clone();
            if let Some(attributes) = primitive.get("attributes") {
                let attributes = attributes.as_object().ok_or_else(|| Err::InvalidProperty(format!(
                    "invalid primitive attributes property in mesh {}", mesh
                )))?;
                self.scan_attribute_set(attributes, -1, mesh, config)?;
            }
            if let Some(targets) = primitive.get("targets") {
                let targets = targets.as_array().ok_or_else(|| Err::InvalidProperty(format!(
                    "invalid primitive targets property in mesh {}", mesh
                )))?;
                for (t, target) in targets.iter().enumerate() {
                    let target = target.as_object().ok_or_else(|| Err::InvalidProperty(format!(
                        "invalid morph target {} in mesh {}", t, mesh
                    )))?;
                    self.scan_attribute_set(target, t as i32, mesh, config)?;
                }
            }
        }
        Ok(())
    }

    fn scan_attribute_set(
        &mut self,
        attributes: &serde_json::Map<String, Value>,
        morph_target: i32,
        mesh: u32,
        config: &Config,
    ) -> Result<(), Err> {
        for (name, value) in attributes {
            if name.starts_with("TEXCOORD_") && is_builtin_numbered(name) && !self.texture_coordinate_y_flip_in_material {
                let accessor = json::as_u32(value).ok_or_else(|| {
                    let target = if morph_target == -1 { String::new() } else { format!(" in morph target {}", morph_target) };
                    Err::InvalidProperty(format!("invalid attribute {}{} in mesh {}", name, target, mesh))
                })?;
                let gltf_accessor = self.accessors.get(accessor as usize).ok_or_else(|| Err::InvalidProperty(format!(
                    "accessor index {} out of range for {} accessors", accessor, self.accessors.len()
                )))?;
                let component_type = json::get(gltf_accessor, "componentType", json::as_u32).ok_or_else(|| Err::InvalidProperty(format!(
                    "accessor {} has missing or invalid componentType property", accessor
                )))?;
                let normalized = json::find(gltf_accessor, "normalized", json::as_bool).map_err(|_| Err::InvalidProperty(format!(
                    "accessor {} has invalid normalized property", accessor
                )))?.unwrap_or(false);
                if component_type == 5120 || component_type == 5122 || ((component_type == 5121 || component_type == 5123) && !normalized) {
                    log::debug!("file contains non-normalized texture coordinates, implicitly enabling textureCoordinateYFlipInMaterial");
                    self.texture_coordinate_y_flip_in_material = true;
                }
            }

            if self.attribute_names.insert(name.clone())
                && !is_builtin_attribute(name, &config.object_id_attribute)
                && !name.starts_with('_')
            {
                crate::quiet_warn!(config.quiet, "unknown attribute {}, importing as custom attribute", name);
            }
        }
        Ok(())
    }

    /// Assigns unique texture ids and orders images by dimensionality. With
    /// array textures disabled every glTF texture is unique and every image is
    /// 2D.
    fn partition_textures(&mut self, config: &Config) -> Result<(), Err> {
        let image_count = self.images.len();
        if !config.experimental_khr_texture_ktx {
            self.unique_texture_for_gltf = (0..self.textures.len() as u32).collect();
            self.unique_textures = self.unique_texture_for_gltf.clone();
            self.images_by_dimension = (0..image_count as u32).collect();
            self.image_by_dimension_rev = self.images_by_dimension.clone();
            self.image_2d_count = image_count;
            return Ok(());
        }

        // 0 = not referenced yet, 2 = plain 2D, 3 = array layer
        let mut image_dimension = vec![0u8; image_count];
        let mut unique_for_array_image: HashMap<u32, u32> = HashMap::new();
        for (i, texture) in self.textures.items.iter().enumerate() {
            let (image, is_layer) = texture_source(texture, i, true)?;
            if image as usize >= image_count {
                return Err(Err::InvalidProperty(format!(
                    "index {} in texture {} out of range for {} images", image, i, image_count
                )));
            }
            let dimension = &mut image_dimension[image as usize];
            if is_layer {
                if *dimension == 2 {
                    return Err(Err::TextureDimension(format!(
                        "texture {} references image {} as a 2D array layer but an earlier texture referenced it as 2D", i, image
                    )));
                }
                *dimension = 3;
                let next = self.unique_textures.len() as u32;
                let unique = *unique_for_array_image.entry(image).or_insert(next);
                if unique == next {
                    self.unique_textures.push(i as u32);
                }
                self.unique_texture_for_gltf.push(unique);
            } else {
                if *dimension == 3 {
                    return Err(Err::TextureDimension(format!(
                        "texture {} references image {} as 2D but an earlier texture referenced it as a 2D array layer", i, image
                    )));
                }
                *dimension = 2;
                self.unique_texture_for_gltf.push(self.unique_textures.len() as u32);
                self.unique_textures.push(i as u32);
            }
        }

        let (images_2d, images_3d): (Vec<u32>, Vec<u32>) = (0..image_count as u32)
            .partition(|i| image_dimension[*i as usize] != 3);
        self.image_2d_count = images_2d.len();
        self.images_by_dimension = images_2d.into_iter().chain(images_3d).collect();
        self.image_by_dimension_rev = vec![0; image_count];
        for (position, image) in self.images_by_dimension.iter().enumerate() {
            self.image_by_dimension_rev[*image as usize] = position as u32;
        }
        Ok(())
    }
}

/// Finds the image a texture samples and whether it's used as an array
/// layer. Recognized extensions are preferred over the core `source`.
pub(crate) fn texture_source(texture: &Value, id: usize, experimental_ktx: bool) -> Result<(u32, bool), Err> {
    if let Some(extensions) = texture.get("extensions") {
        let extensions = extensions.as_object().ok_or_else(|| Err::InvalidProperty(format!(
            "invalid extensions property in texture {}", id
        )))?;
        let found = extensions.iter().find(|(name, _)| {
            (experimental_ktx && name.as_str() == KHR_TEXTURE_KTX) || IMAGE_SOURCE_EXTENSIONS.contains(&name.as_str())
        });
        if let Some((name, extension)) = found {
            if !extension.is_object() {
                return Err(Err::InvalidProperty(format!("invalid {} extension in texture {}", name, id)));
            }
            let source = json::get(extension, "source", json::as_u32).ok_or_else(|| Err::InvalidProperty(format!(
                "missing or invalid {} source property in texture {}", name, id
            )))?;
            let is_layer = name == KHR_TEXTURE_KTX && extension.get("layer").is_some();
            return Ok((source, is_layer));
        }
    }
    let source = json::get(texture, "source", json::as_u32).ok_or_else(|| Err::InvalidProperty(format!(
        "missing or invalid source property in texture {}", id
    )))?;
    Ok((source, false))
}

/// `TEXCOORD_n`, `COLOR_n`, `JOINTS_n` or `WEIGHTS_n` with a single digit.
pub(crate) fn is_builtin_numbered(name: &str) -> bool {
    split_numbered(name).is_some()
}

/// Splits a builtin numbered attribute name into its base and number.
pub(crate) fn split_numbered(name: &str) -> Option<(&str, u32)> {
    let (base, number) = name.split_once('_')?;
    if !matches!(base, "TEXCOORD" | "COLOR" | "JOINTS" | "WEIGHTS") {
        return None;
    }
    let mut digits = number.chars();
    match (digits.next(), digits.next()) {
        (Some(d), None) => d.to_digit(10).map(|n| (base, n)),
        _ => None,
    }
}

fn is_builtin_attribute(name: &str, object_id_attribute: &str) -> bool {
    matches!(name, "POSITION" | "NORMAL" | "TANGENT" | "COLOR")
        || name == object_id_attribute
        || is_builtin_numbered(name)
}

fn check_asset(root: &Value) -> Result<(), Err> {
    let asset = root.get("asset").filter(|a| a.is_object())
        .ok_or_else(|| Err::InvalidAsset("missing or invalid asset property".to_string()))?;
    let version = json::get(asset, "version", json::as_str)
        .ok_or_else(|| Err::InvalidAsset("missing or invalid asset version property".to_string()))?;
    if let Some(min_version) = asset.get("minVersion") {
        let min_version = json::as_str(min_version)
            .ok_or_else(|| Err::InvalidAsset("invalid asset minVersion property".to_string()))?;
        if min_version != "2.0" {
            return Err(Err::UnsupportedVersion(format!("unsupported minVersion {}, expected 2.0", min_version)));
        }
    } else if !version.starts_with("2.") {
        return Err(Err::UnsupportedVersion(format!("unsupported version {}, expected 2.x", version)));
    }
    Ok(())
}

fn string_array<'a>(root: &'a Value, key: &str) -> Result<Vec<&'a str>, Err> {
    match root.get(key) {
        None => Ok(Vec::new()),
        Some(value) => value.as_array()
            .and_then(|a| a.iter().map(json::as_str).collect::<Option<Vec<_>>>())
            .ok_or_else(|| Err::InvalidProperty(format!("invalid {} property", key))),
    }
}

fn check_extensions(root: &Value, config: &Config) -> Result<(), Err> {
    for extension in string_array(root, "extensionsUsed")? {
        if extension == KHR_TEXTURE_KTX && !config.experimental_khr_texture_ktx {
            crate::quiet_warn!(
                config.quiet,
                "used extension {} is experimental, enable experimentalKhrTextureKtx to use it",
                extension
            );
        }
    }
    for extension in string_array(root, "extensionsRequired")? {
        let supported = SUPPORTED_EXTENSIONS.contains(extension)
            || (extension == KHR_TEXTURE_KTX && config.experimental_khr_texture_ktx);
        if supported {
            continue;
        }
        if config.ignore_required_extensions {
            crate::quiet_warn!(config.quiet, "required extension {} not supported, ignoring", extension);
        } else {
            return Err(Err::UnsupportedExtension(format!(
                "required extension {} not supported, enable ignoreRequiredExtensions to ignore", extension
            )));
        }
    }
    Ok(())
}

/// Moves a top-level array out of `parent`, checking that every item is an
/// object.
fn populate(parent: &mut Value, key: &str, item: &str) -> Result<Vec<Value>, Err> {
    let items = match parent.get_mut(key).map(Value::take) {
        None => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(Err::InvalidProperty(format!("invalid {} property", key))),
    };
    if let Some(i) = items.iter().position(|v| !v.is_object()) {
        return Err(Err::InvalidProperty(format!("invalid {} {}", item, i)));
    }
    Ok(items)
}

fn populate_with_name(parent: &mut Value, key: &str, item: &str) -> Result<Named, Err> {
    let items = populate(parent, key, item)?;
    let names = items.iter().enumerate().map(|(i, v)| match v.get("name") {
        None => Ok(String::new()),
        Some(Value::String(name)) => Ok(name.clone()),
        Some(_) => Err(Err::InvalidProperty(format!("invalid {} {} name property", item, i))),
    }).collect::<Result<Vec<_>, _>>()?;
    Ok(Named { items, names, for_name: OnceCell::new() })
}

fn populate_lights(root: &mut Value) -> Result<Named, Err> {
    let Some(extensions) = root.get_mut("extensions") else {
        return Ok(Named::default());
    };
    if !extensions.is_object() {
        return Err(Err::InvalidProperty("invalid extensions property".to_string()));
    }
    let Some(lights_punctual) = extensions.get_mut("KHR_lights_punctual") else {
        return Ok(Named::default());
    };
    if !lights_punctual.is_object() {
        return Err(Err::InvalidProperty("invalid KHR_lights_punctual extension".to_string()));
    }
    populate_with_name(lights_punctual, "lights", "light")
}

/// Checks that every node has at most one parent, that no root node is also a
/// child, and that the parent links contain no cycles.
pub(crate) fn check_node_hierarchy(nodes: &[Value], scenes: &[Value]) -> Result<(), Err> {
    const UNSEEN: i64 = -2;
    const ROOT: i64 = -1;
    let mut parents = vec![UNSEEN; nodes.len()];

    for (i, scene) in scenes.iter().enumerate() {
        let Some(roots) = scene.get("nodes") else { continue };
        let roots = json::as_u32_array(roots)
            .ok_or_else(|| Err::InvalidProperty(format!("invalid nodes property of scene {}", i)))?;
        for node in roots {
            if node as usize >= nodes.len() {
                return Err(Err::InvalidProperty(format!(
                    "node index {} in scene {} out of range for {} nodes", node, i, nodes.len()
                )));
            }
            parents[node as usize] = ROOT;
        }
    }

    for (i, node) in nodes.iter().enumerate() {
        let Some(children) = node.get("children") else { continue };
        let children = json::as_u32_array(children)
            .ok_or_else(|| Err::InvalidProperty(format!("invalid children property of node {}", i)))?;
        for child in children {
            let Some(parent) = parents.get_mut(child as usize) else {
                return Err(Err::InvalidProperty(format!(
                    "child index {} in node {} out of range for {} nodes", child, i, nodes.len()
                )));
            };
            match *parent {
                ROOT => return Err(Err::NodeHierarchy(format!(
                    "node {} is both a root node and a child of node {}", child, i
                ))),
                UNSEEN => *parent = i as i64,
                _ => return Err(Err::NodeHierarchy(format!("node {} has multiple parents", child))),
            }
        }
    }

    // Tortoise and hare over the parent links of every node
    let parent_of = |n: i64| if n < 0 { ROOT } else { parents[n as usize] };
    for i in 0..nodes.len() {
        let mut slow = parents[i];
        let mut fast = parent_of(slow);
        while slow >= 0 && fast >= 0 {
            if slow == fast {
                return Err(Err::NodeHierarchy(format!("node tree contains cycle starting at node {}", i)));
            }
            slow = parents[slow as usize];
            fast = parent_of(parent_of(fast));
        }
    }
    Ok(())
}

/// Splits every mesh into one mesh per primitive.
fn flatten_meshes(meshes: &[Value]) -> Result<(Vec<(u32, u32)>, Vec<u32>), Err> {
    let mut primitives = Vec::with_capacity(meshes.len());
    let mut offsets = Vec::with_capacity(meshes.len() + 1);
    offsets.push(0);
    for (i, mesh) in meshes.iter().enumerate() {
        let mesh_primitives = json::get(mesh, "primitives", Value::as_array).ok_or_else(|| Err::InvalidProperty(format!(
            "missing or invalid primitives property in mesh {}", i
        )))?;
        if mesh_primitives.is_empty() {
            return Err(Err::InvalidProperty(format!("mesh {} has no primitives", i)));
        }
        for (j, primitive) in mesh_primitives.iter().enumerate() {
            if !primitive.is_object() {
                return Err(Err::InvalidProperty(format!("invalid mesh {} primitive {}", i, j)));
            }
            primitives.push((i as u32, j as u32));
        }
        offsets.push(primitives.len() as u32);
    }
    Ok((primitives, offsets))
}

/// Registers every custom scene field found in node extras. Field names of
/// nested objects are joined with dots.
fn discover_scene_fields(nodes: &[Value], config: &Config) -> Result<IndexMap<String, SceneFieldInfo>, Err> {
    let mut fields = IndexMap::new();
    for node in nodes {
        // Non-object extras are reported when importing the scene
        let Some(Value::Object(extras)) = node.get("extras") else { continue };
        for (key, value) in extras {
            discover_scene_field(&mut fields, config, key.clone(), value)?;
        }
    }
    Ok(fields)
}

fn discover_scene_field(
    fields: &mut IndexMap<String, SceneFieldInfo>,
    config: &Config,
    key: String,
    value: &Value,
) -> Result<(), Err> {
    let (value_type, multi_entry) = match value {
        Value::Object(object) => {
            for (nested, value) in object {
                discover_scene_field(fields, config, format!("{}.{}", key, nested), value)?;
            }
            return Ok(());
        }
        Value::Array(array) => match json::common_array_type(array) {
            Some(t) => (t, true),
            None => return Ok(()),
        },
        other => (json::type_name(other), false),
    };
    let default_type = match value_type {
        "bool" => SceneFieldType::Bit,
        "number" => SceneFieldType::Float,
        "string" => SceneFieldType::String,
        _ => return Ok(()),
    };
    if fields.contains_key(&key) {
        return Ok(());
    }
    let field_type = match config.custom_scene_field_types.get(&key).map(String::as_str) {
        None | Some("") => default_type,
        Some("Float") => SceneFieldType::Float,
        Some("UnsignedInt") => SceneFieldType::UnsignedInt,
        Some("Int") => SceneFieldType::Int,
        Some(other) => return Err(Err::InvalidConfig(format!(
            "invalid type {} specified for custom scene field {}", other, key
        ))),
    };
    fields.insert(key, SceneFieldInfo { field_type, multi_entry });
    Ok(())
}

fn default_scene(root: &Value, scene_count: usize) -> Result<Option<u32>, Err> {
    let scene = json::find(root, "scene", json::as_u32)
        .map_err(|_| Err::InvalidProperty("invalid scene property".to_string()))?;
    match scene {
        Some(scene) if scene as usize >= scene_count => Err(Err::InvalidProperty(format!(
            "scene index {} out of range for {} scenes", scene, scene_count
        ))),
        other => Ok(other),
    }
}
