//! glTF 2.0 importer. A document is split, parsed and validated once on open,
//! after which meshes, scenes, materials and the other objects are imported
//! on demand by index.

pub(crate) mod json;
pub(crate) mod container;
pub(crate) mod document;
pub(crate) mod resolver;
pub(crate) mod sparse;
pub(crate) mod mesh;
pub(crate) mod scene;
pub(crate) mod material;
pub(crate) mod texture;
pub(crate) mod image;
pub(crate) mod animation;
pub(crate) mod camera;
pub(crate) mod light;
pub(crate) mod skin;

use std::collections::HashMap;
use std::path::Path;

use crate::core::animation::AnimationData;
use crate::core::image::{ImageData2D, ImageData3D};
use crate::core::material::MaterialData;
use crate::core::mesh::MeshData;
use crate::core::scene::{CameraData, LightData, SceneData, SkinData};
use crate::core::shared::ConfigType;
use crate::core::texture::TextureData;
use self::document::Document;
use self::resolver::{Cache, Resolver};

pub use self::image::{DefaultImageDecoder, ImageDecoder};
pub use self::resolver::FileCallback;

/// Importer options. Deserializable from JSON with camelCase keys, missing
/// keys keep their defaults.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase", default = "default_config")]
pub struct Config {
    /// Only warn about unsupported extensions in `extensionsRequired`.
    pub ignore_required_extensions: bool,
    /// Imports `KHR_texture_ktx` array layers as 2D array textures.
    pub experimental_khr_texture_ktx: bool,
    /// Expresses the texture coordinate Y flip as a material texture
    /// transform instead of flipping the vertex data.
    pub texture_coordinate_y_flip_in_material: bool,
    /// Fails on inputs that would otherwise only be warned about.
    pub strict: bool,
    /// Imports all animation clips as a single animation.
    pub merge_animation_clips: bool,
    /// Attribute imported as the object id.
    pub object_id_attribute: String,
    /// Adds Phong diffuse attributes to PBR materials.
    pub phong_material_fallback: bool,
    pub optimize_quaternion_shortest_path: bool,
    pub normalize_quaternions: bool,
    /// Type of custom scene fields by name, one of `Float`, `UnsignedInt`
    /// or `Int`. Other fields get their type inferred.
    pub custom_scene_field_types: HashMap<String, String>,
    /// Suppresses warnings.
    pub quiet: bool,
}

impl ConfigType for Config {
    fn default() -> Self {
        Self {
            ignore_required_extensions: false,
            experimental_khr_texture_ktx: false,
            texture_coordinate_y_flip_in_material: false,
            strict: false,
            merge_animation_clips: false,
            object_id_attribute: "_OBJECT_ID".to_string(),
            phong_material_fallback: true,
            optimize_quaternion_shortest_path: true,
            normalize_quaternions: true,
            custom_scene_field_types: HashMap::new(),
            quiet: false,
        }
    }
}

fn default_config() -> Config {
    <Config as ConfigType>::default()
}

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone)]
pub enum Err {
    #[error("animation: {0}")]
    Animation(#[from] animation::Err),
    #[error("camera: {0}")]
    Camera(#[from] camera::Err),
    #[error("image: {0}")]
    Image(#[from] image::Err),
    #[error("{0}")]
    Io(String),
    #[error("light: {0}")]
    Light(#[from] light::Err),
    #[error("material: {0}")]
    Material(#[from] material::Err),
    #[error("mesh: {0}")]
    Mesh(#[from] mesh::Err),
    #[error("no file opened")]
    NotOpened,
    #[error("open: {0}")]
    Open(#[from] document::Err),
    #[error("{0}")]
    OutOfRange(String),
    #[error("scene: {0}")]
    Scene(#[from] scene::Err),
    #[error("skin: {0}")]
    Skin(#[from] skin::Err),
    #[error("texture: {0}")]
    Texture(#[from] texture::Err),
}

struct Opened {
    document: Document,
    cache: Cache,
}

/// Imports glTF files and binary glTF containers.
///
/// ```no_run
/// use gltf_oxide::core::shared::ConfigType;
/// use gltf_oxide::io::gltf::{Config, Importer};
///
/// let mut importer = Importer::new(Config::default());
/// importer.open_file("scene.glb").unwrap();
/// for id in 0..importer.mesh_count().unwrap() {
///     let mesh = importer.mesh(id).unwrap();
///     println!("{}: {} vertices", importer.mesh_name(id).unwrap(), mesh.get_vertex_count());
/// }
/// ```
pub struct Importer {
    config: Config,
    opened: Option<Opened>,
    file_callback: Option<FileCallback>,
    image_decoder: Box<dyn ImageDecoder>,
}

fn check(id: u32, count: usize, kind: &str) -> Result<usize, Err> {
    if id as usize >= count {
        return Err(Err::OutOfRange(format!("index {} out of range for {} {}", id, count, kind)));
    }
    Ok(id as usize)
}

fn resolver<'a>(
    opened: &'a mut Option<Opened>,
    config: &'a Config,
    file_callback: &'a mut Option<FileCallback>,
) -> Result<Resolver<'a>, Err> {
    let Opened { document, cache } = opened.as_mut().ok_or(Err::NotOpened)?;
    Ok(Resolver { document, config, cache, file_callback: file_callback.as_mut() })
}

impl Importer {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            opened: None,
            file_callback: None,
            image_decoder: Box::new(DefaultImageDecoder),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sets the callback loading external buffers and images, and the file
    /// itself in [`Importer::open_file()`]. Without a callback files are read
    /// from the filesystem.
    pub fn set_file_callback(&mut self, callback: Option<FileCallback>) {
        self.file_callback = callback;
    }

    pub fn set_image_decoder(&mut self, decoder: Box<dyn ImageDecoder>) {
        self.image_decoder = decoder;
    }

    /// Opens a glTF or binary glTF from memory. External files are loaded
    /// only through the file callback. Any previously opened file is closed
    /// first, also if opening fails.
    pub fn open_data(&mut self, data: Vec<u8>) -> Result<(), Err> {
        self.open(data, None)
    }

    /// Opens a file. External files are resolved relative to its directory.
    pub fn open_file(&mut self, path: impl AsRef<Path>) -> Result<(), Err> {
        let path = path.as_ref();
        self.close();
        let data = match self.file_callback.as_mut() {
            Some(callback) => callback(&path.to_string_lossy())
                .ok_or_else(|| Err::Io(format!("can't read {}", path.display())))?,
            None => std::fs::read(path)
                .map_err(|e| Err::Io(format!("can't read {}: {}", path.display(), e)))?,
        };
        let base_path = path.parent().map(Path::to_path_buf).unwrap_or_default();
        self.open(data, Some(base_path))
    }

    fn open(&mut self, data: Vec<u8>, base_path: Option<std::path::PathBuf>) -> Result<(), Err> {
        self.close();
        let document = Document::open(data, base_path, &self.config)?;
        log::debug!(
            "opened glTF with {} nodes, {} meshes, {} materials and {} images",
            document.nodes.len(), document.mesh_primitives.len(), document.materials.len(), document.images.len()
        );
        let cache = Cache::new(&document);
        self.opened = Some(Opened { document, cache });
        Ok(())
    }

    pub fn close(&mut self) {
        self.opened = None;
    }

    pub fn is_opened(&self) -> bool {
        self.opened.is_some()
    }

    fn document(&self) -> Result<&Document, Err> {
        self.opened.as_ref().map(|o| &o.document).ok_or(Err::NotOpened)
    }

    fn resolver(&mut self) -> Result<Resolver<'_>, Err> {
        resolver(&mut self.opened, &self.config, &mut self.file_callback)
    }

    /// Default scene, if the file specifies one.
    pub fn default_scene(&self) -> Result<Option<u32>, Err> {
        Ok(self.document()?.default_scene)
    }

    pub fn scene_count(&self) -> Result<u32, Err> {
        Ok(self.document()?.scenes.len() as u32)
    }

    pub fn scene_name(&self, id: u32) -> Result<&str, Err> {
        let document = self.document()?;
        Ok(document.scenes.name(check(id, document.scenes.len(), "scenes")?))
    }

    pub fn scene_for_name(&self, name: &str) -> Option<u32> {
        self.document().ok()?.scenes.for_name(name)
    }

    pub fn scene(&self, id: u32) -> Result<SceneData, Err> {
        let document = self.document()?;
        let id = check(id, document.scenes.len(), "scenes")?;
        Ok(scene::import(document, &self.config, id)?)
    }

    /// Objects are glTF nodes.
    pub fn object_count(&self) -> Result<u32, Err> {
        Ok(self.document()?.nodes.len() as u32)
    }

    pub fn object_name(&self, id: u32) -> Result<&str, Err> {
        let document = self.document()?;
        Ok(document.nodes.name(check(id, document.nodes.len(), "objects")?))
    }

    pub fn object_for_name(&self, name: &str) -> Option<u32> {
        self.document().ok()?.nodes.for_name(name)
    }

    /// Number of meshes. Every primitive of a glTF mesh is a separate mesh.
    pub fn mesh_count(&self) -> Result<u32, Err> {
        Ok(self.document()?.mesh_primitives.len() as u32)
    }

    /// Name of the glTF mesh the primitive comes from.
    pub fn mesh_name(&self, id: u32) -> Result<&str, Err> {
        let document = self.document()?;
        let id = check(id, document.mesh_primitives.len(), "meshes")?;
        Ok(document.meshes.name(document.mesh_primitives[id].0 as usize))
    }

    /// First primitive of the first glTF mesh with given name.
    pub fn mesh_for_name(&self, name: &str) -> Option<u32> {
        let document = self.document().ok()?;
        let mesh = document.meshes.for_name(name)?;
        Some(document.mesh_size_offsets[mesh as usize])
    }

    pub fn mesh(&mut self, id: u32) -> Result<MeshData, Err> {
        let mut resolver = self.resolver()?;
        let id = check(id, resolver.document.mesh_primitives.len(), "meshes")?;
        Ok(mesh::import(&mut resolver, id)?)
    }

    /// Name of a custom mesh attribute.
    pub fn mesh_attribute_name(&self, id: u32) -> Option<&str> {
        let document = self.document().ok()?;
        document.attribute_names.get_index(id as usize).map(String::as_str)
    }

    pub fn mesh_attribute_for_name(&self, name: &str) -> Option<u32> {
        let document = self.document().ok()?;
        document.attribute_names.get_index_of(name).map(|i| i as u32)
    }

    /// Name of a custom scene field.
    pub fn scene_field_name(&self, id: u32) -> Option<&str> {
        let document = self.document().ok()?;
        document.scene_fields.get_index(id as usize).map(|(name, _)| name.as_str())
    }

    pub fn scene_field_for_name(&self, name: &str) -> Option<u32> {
        let document = self.document().ok()?;
        document.scene_fields.get_index_of(name).map(|i| i as u32)
    }

    pub fn material_count(&self) -> Result<u32, Err> {
        Ok(self.document()?.materials.len() as u32)
    }

    pub fn material_name(&self, id: u32) -> Result<&str, Err> {
        let document = self.document()?;
        Ok(document.materials.name(check(id, document.materials.len(), "materials")?))
    }

    pub fn material_for_name(&self, name: &str) -> Option<u32> {
        self.document().ok()?.materials.for_name(name)
    }

    pub fn material(&self, id: u32) -> Result<MaterialData, Err> {
        let document = self.document()?;
        let id = check(id, document.materials.len(), "materials")?;
        Ok(material::import(document, &self.config, id)?)
    }

    /// Number of textures. With `experimental_khr_texture_ktx`, glTF textures
    /// referencing layers of the same image are a single texture.
    pub fn texture_count(&self) -> Result<u32, Err> {
        Ok(self.document()?.unique_textures.len() as u32)
    }

    pub fn texture_name(&self, id: u32) -> Result<&str, Err> {
        let document = self.document()?;
        let id = check(id, document.unique_textures.len(), "textures")?;
        Ok(document.textures.name(document.unique_textures[id] as usize))
    }

    pub fn texture_for_name(&self, name: &str) -> Option<u32> {
        let document = self.document().ok()?;
        let gltf_id = document.textures.for_name(name)?;
        Some(document.unique_texture_for_gltf[gltf_id as usize])
    }

    pub fn texture(&mut self, id: u32) -> Result<TextureData, Err> {
        let mut resolver = self.resolver()?;
        let id = check(id, resolver.document.unique_textures.len(), "textures")?;
        Ok(texture::import(&mut resolver, id)?)
    }

    pub fn image_2d_count(&self) -> Result<u32, Err> {
        Ok(self.document()?.image_2d_count as u32)
    }

    pub fn image_2d_name(&self, id: u32) -> Result<&str, Err> {
        let document = self.document()?;
        let id = check(id, document.image_2d_count, "2D images")?;
        Ok(document.images.name(document.images_by_dimension[id] as usize))
    }

    pub fn image_2d_for_name(&self, name: &str) -> Option<u32> {
        let document = self.document().ok()?;
        document.images_by_dimension[..document.image_2d_count].iter()
            .position(|i| document.images.name(*i as usize) == name)
            .map(|i| i as u32)
    }

    /// Imports a 2D image. glTF images have a single level.
    pub fn image_2d(&mut self, id: u32, level: u32) -> Result<ImageData2D, Err> {
        let mut resolver = resolver(&mut self.opened, &self.config, &mut self.file_callback)?;
        let id = check(id, resolver.document.image_2d_count, "2D images")?;
        check(level, 1, "levels")?;
        Ok(image::import_2d(&mut resolver, self.image_decoder.as_mut(), id)?)
    }

    /// Number of 2D array images, referenced as `KHR_texture_ktx` layers.
    pub fn image_3d_count(&self) -> Result<u32, Err> {
        let document = self.document()?;
        Ok((document.images.len() - document.image_2d_count) as u32)
    }

    pub fn image_3d_name(&self, id: u32) -> Result<&str, Err> {
        let document = self.document()?;
        let id = check(id, document.images.len() - document.image_2d_count, "3D images")?;
        Ok(document.images.name(document.images_by_dimension[document.image_2d_count + id] as usize))
    }

    pub fn image_3d_for_name(&self, name: &str) -> Option<u32> {
        let document = self.document().ok()?;
        document.images_by_dimension[document.image_2d_count..].iter()
            .position(|i| document.images.name(*i as usize) == name)
            .map(|i| i as u32)
    }

    pub fn image_3d(&mut self, id: u32, level: u32) -> Result<ImageData3D, Err> {
        let mut resolver = resolver(&mut self.opened, &self.config, &mut self.file_callback)?;
        let count = resolver.document.images.len() - resolver.document.image_2d_count;
        let id = check(id, count, "3D images")?;
        check(level, 1, "levels")?;
        Ok(image::import_3d(&mut resolver, self.image_decoder.as_mut(), id)?)
    }

    /// Number of animations, at most one with `merge_animation_clips`.
    pub fn animation_count(&self) -> Result<u32, Err> {
        let count = self.document()?.animations.len() as u32;
        Ok(if self.config.merge_animation_clips { count.min(1) } else { count })
    }

    /// Animation name. Merged animations have no name.
    pub fn animation_name(&self, id: u32) -> Result<&str, Err> {
        let count = self.animation_count()? as usize;
        let id = check(id, count, "animations")?;
        if self.config.merge_animation_clips {
            return Ok("");
        }
        Ok(self.document()?.animations.name(id))
    }

    pub fn animation_for_name(&self, name: &str) -> Option<u32> {
        if self.config.merge_animation_clips {
            return None;
        }
        self.document().ok()?.animations.for_name(name)
    }

    pub fn animation(&mut self, id: u32) -> Result<AnimationData, Err> {
        let count = self.animation_count()? as usize;
        let id = check(id, count, "animations")?;
        let merge = self.config.merge_animation_clips;
        let mut resolver = self.resolver()?;
        let range = if merge { 0..resolver.document.animations.len() } else { id..id + 1 };
        Ok(animation::import(&mut resolver, range)?)
    }

    pub fn skin_count(&self) -> Result<u32, Err> {
        Ok(self.document()?.skins.len() as u32)
    }

    pub fn skin_name(&self, id: u32) -> Result<&str, Err> {
        let document = self.document()?;
        Ok(document.skins.name(check(id, document.skins.len(), "skins")?))
    }

    pub fn skin_for_name(&self, name: &str) -> Option<u32> {
        self.document().ok()?.skins.for_name(name)
    }

    pub fn skin(&mut self, id: u32) -> Result<SkinData, Err> {
        let mut resolver = self.resolver()?;
        let id = check(id, resolver.document.skins.len(), "skins")?;
        Ok(skin::import(&mut resolver, id)?)
    }

    pub fn camera_count(&self) -> Result<u32, Err> {
        Ok(self.document()?.cameras.len() as u32)
    }

    pub fn camera_name(&self, id: u32) -> Result<&str, Err> {
        let document = self.document()?;
        Ok(document.cameras.name(check(id, document.cameras.len(), "cameras")?))
    }

    pub fn camera_for_name(&self, name: &str) -> Option<u32> {
        self.document().ok()?.cameras.for_name(name)
    }

    pub fn camera(&self, id: u32) -> Result<CameraData, Err> {
        let document = self.document()?;
        let id = check(id, document.cameras.len(), "cameras")?;
        Ok(camera::import(document, id)?)
    }

    pub fn light_count(&self) -> Result<u32, Err> {
        Ok(self.document()?.lights.len() as u32)
    }

    pub fn light_name(&self, id: u32) -> Result<&str, Err> {
        let document = self.document()?;
        Ok(document.lights.name(check(id, document.lights.len(), "lights")?))
    }

    pub fn light_for_name(&self, name: &str) -> Option<u32> {
        self.document().ok()?.lights.for_name(name)
    }

    pub fn light(&self, id: u32) -> Result<LightData, Err> {
        let document = self.document()?;
        let id = check(id, document.lights.len(), "lights")?;
        Ok(light::import(document, id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn open(value: serde_json::Value) -> Importer {
        let mut importer = Importer::new(Config::default());
        importer.open_data(serde_json::to_vec(&value).unwrap()).unwrap();
        importer
    }

    #[test]
    fn test_config_from_json() {
        let config: Config = serde_json::from_value(json!({
            "mergeAnimationClips": true,
            "objectIdAttribute": "_ID",
            "customSceneFieldTypes": {"level": "Int"},
        })).unwrap();
        assert!(config.merge_animation_clips);
        assert_eq!(config.object_id_attribute, "_ID");
        assert_eq!(config.custom_scene_field_types["level"], "Int");
        assert!(config.phong_material_fallback, "missing keys keep defaults");
        assert!(config.normalize_quaternions);
    }

    #[test]
    fn test_not_opened() {
        let mut importer = Importer::new(Config::default());
        assert!(!importer.is_opened());
        assert!(matches!(importer.mesh_count(), Err(Err::NotOpened)));
        assert!(matches!(importer.mesh(0), Err(Err::NotOpened)));
        assert_eq!(importer.mesh_for_name("a"), None);
        assert!(importer.open_data(b"{".to_vec()).is_err());
        assert!(!importer.is_opened(), "failed open leaves the importer closed");
    }

    #[test]
    fn test_names() {
        let mut importer = open(json!({
            "asset": {"version": "2.0"},
            "scene": 1,
            "scenes": [{"name": "a"}, {"name": "b"}],
            "nodes": [{"name": "root"}, {"name": "child"}, {"name": "root"}],
            "cameras": [{"name": "cam", "type": "orthographic",
                "orthographic": {"xmag": 1, "ymag": 1, "znear": 0, "zfar": 1}}],
        }));
        assert_eq!(importer.default_scene().unwrap(), Some(1));
        assert_eq!(importer.scene_for_name("b"), Some(1));
        assert_eq!(importer.object_count().unwrap(), 3);
        assert_eq!(importer.object_for_name("root"), Some(0), "first occurrence wins");
        assert_eq!(importer.object_name(1).unwrap(), "child");
        assert_eq!(importer.object_name(3).unwrap_err().to_string(), "index 3 out of range for 3 objects");
        assert_eq!(importer.camera_for_name("cam"), Some(0));
        assert_eq!(importer.camera(0).unwrap().far, 1.0);
        assert_eq!(importer.camera(1).unwrap_err().to_string(), "index 1 out of range for 1 cameras");
        importer.close();
        assert_eq!(importer.object_for_name("root"), None);
    }

    #[test]
    fn test_merged_animation_names() {
        let value = json!({
            "asset": {"version": "2.0"},
            "animations": [
                {"name": "walk", "samplers": [], "channels": []},
                {"name": "run", "samplers": [], "channels": []},
            ],
        });
        let importer = open(value.clone());
        assert_eq!(importer.animation_count().unwrap(), 2);
        assert_eq!(importer.animation_for_name("run"), Some(1));

        let mut config = Config::default();
        config.merge_animation_clips = true;
        let mut importer = Importer::new(config);
        importer.open_data(serde_json::to_vec(&value).unwrap()).unwrap();
        assert_eq!(importer.animation_count().unwrap(), 1);
        assert_eq!(importer.animation_name(0).unwrap(), "");
        assert_eq!(importer.animation_for_name("run"), None);
        assert!(importer.animation(0).unwrap().get_tracks().is_empty());
    }
}
