use serde_json::Value;

use crate::core::texture::{
    min_filter_from_gl, Sampler, SamplerFilter, SamplerWrapping, TextureData, TextureType,
};
use crate::io::gltf::document::texture_source;
use crate::io::gltf::json;
use crate::io::gltf::resolver::Resolver;

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Err {
    #[error("{0}")]
    InvalidSampler(String),
    #[error("{0}")]
    InvalidTexture(String),
}

fn gl_property(sampler: &Value, key: &str) -> Result<Option<u32>, Err> {
    json::find(sampler, key, json::as_u32).map_err(|_| Err::InvalidSampler(format!("invalid {} property", key)))
}

/// Decodes a glTF sampler. Absent properties keep the defaults of
/// [`Sampler::default()`].
pub(crate) fn parse_sampler(sampler: &Value) -> Result<Sampler, Err> {
    let mut out = Sampler::default();
    if let Some(filter) = gl_property(sampler, "magFilter")? {
        out.mag_filter = SamplerFilter::from_gl(filter)
            .ok_or_else(|| Err::InvalidSampler(format!("unrecognized magFilter {}", filter)))?;
    }
    if let Some(filter) = gl_property(sampler, "minFilter")? {
        (out.min_filter, out.mipmap_filter) = min_filter_from_gl(filter)
            .ok_or_else(|| Err::InvalidSampler(format!("unrecognized minFilter {}", filter)))?;
    }
    for (i, key) in ["wrapS", "wrapT"].into_iter().enumerate() {
        if let Some(wrap) = gl_property(sampler, key)? {
            out.wrapping[i] = SamplerWrapping::from_gl(wrap)
                .ok_or_else(|| Err::InvalidSampler(format!("unrecognized {} {}", key, wrap)))?;
        }
    }
    Ok(out)
}

/// Imports unique texture `id`. Array textures reference an image in the 3D
/// image list, all others one in the 2D list.
pub(crate) fn import(resolver: &mut Resolver, id: usize) -> Result<TextureData, Err> {
    let document = resolver.document;
    let gltf_id = document.unique_textures[id] as usize;
    let texture = &document.textures.items[gltf_id];

    let (source, _) = texture_source(texture, gltf_id, resolver.config.experimental_khr_texture_ktx)
        .map_err(|e| Err::InvalidTexture(e.to_string()))?;
    let image_count = document.images.len();
    if source as usize >= image_count {
        return Err(Err::InvalidTexture(format!(
            "index {} out of range for {} images", source, image_count
        )));
    }

    let mut image = document.image_by_dimension_rev[source as usize];
    let mut texture_type = TextureType::Texture2D;
    if image as usize >= document.image_2d_count {
        image -= document.image_2d_count as u32;
        texture_type = TextureType::Texture2DArray;
    }

    let sampler = match json::find(texture, "sampler", json::as_u32)
        .map_err(|_| Err::InvalidTexture("invalid sampler property".to_string()))?
    {
        Some(sampler) => resolver.sampler(sampler, parse_sampler)?,
        None => Sampler::default(),
    };

    Ok(TextureData { texture_type, sampler, image })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::texture::SamplerMipmap;
    use crate::io::gltf::resolver::tests::with_resolver;
    use serde_json::json;

    #[test]
    fn test_sampler_defaults_and_overrides() {
        assert_eq!(parse_sampler(&json!({})), Ok(Sampler::default()));
        let sampler = parse_sampler(&json!({"magFilter": 9728, "minFilter": 9985, "wrapT": 33071})).unwrap();
        assert_eq!(sampler.mag_filter, SamplerFilter::Nearest);
        assert_eq!((sampler.min_filter, sampler.mipmap_filter), (SamplerFilter::Linear, SamplerMipmap::Nearest));
        assert_eq!(sampler.wrapping, [SamplerWrapping::Repeat, SamplerWrapping::ClampToEdge, SamplerWrapping::Repeat]);

        assert_eq!(parse_sampler(&json!({"wrapS": 1})).unwrap_err().to_string(), "unrecognized wrapS 1");
        assert_eq!(parse_sampler(&json!({"minFilter": "a"})).unwrap_err().to_string(), "invalid minFilter property");
    }

    #[test]
    fn test_texture_import() {
        let value = json!({
            "asset": {"version": "2.0"},
            "images": [{"uri": "a.png"}, {"uri": "b.webp"}],
            "samplers": [{"magFilter": 9728}, {"magFilter": 5}],
            "textures": [
                {"source": 0, "sampler": 0},
                {"source": 0, "extensions": {"EXT_texture_webp": {"source": 1}}},
                {"source": 0, "sampler": 1},
                {"source": 0, "sampler": 2},
                {"source": 4},
            ],
        });
        with_resolver(value, |r| {
            let texture = import(r, 0).unwrap();
            assert_eq!(texture.texture_type, TextureType::Texture2D);
            assert_eq!(texture.image, 0);
            assert_eq!(texture.sampler.mag_filter, SamplerFilter::Nearest);

            let texture = import(r, 1).unwrap();
            assert_eq!(texture.image, 1, "extension source is preferred");
            assert_eq!(texture.sampler, Sampler::default());

            assert_eq!(import(r, 2).unwrap_err().to_string(), "unrecognized magFilter 5");
            assert_eq!(import(r, 2).unwrap_err().to_string(), "unrecognized magFilter 5", "failure is cached");
            assert_eq!(import(r, 3).unwrap_err().to_string(), "index 2 out of range for 2 samplers");
            assert_eq!(import(r, 4).unwrap_err().to_string(), "index 4 out of range for 2 images");
        });
    }
}
