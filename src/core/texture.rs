#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    Texture2D,
    /// Image is a layer of a 2D array texture, referenced through the
    /// `KHR_texture_ktx` extension.
    Texture2DArray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerFilter {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerMipmap {
    /// Only the base level is sampled.
    Base,
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerWrapping {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
}

impl SamplerFilter {
    pub(crate) fn from_gl(value: u32) -> Option<Self> {
        match value {
            9728 => Some(Self::Nearest),
            9729 => Some(Self::Linear),
            _ => None,
        }
    }
}

/// Splits a GL minification filter into the filter and the mipmap selection.
pub(crate) fn min_filter_from_gl(value: u32) -> Option<(SamplerFilter, SamplerMipmap)> {
    match value {
        9728 => Some((SamplerFilter::Nearest, SamplerMipmap::Base)),
        9729 => Some((SamplerFilter::Linear, SamplerMipmap::Base)),
        9984 => Some((SamplerFilter::Nearest, SamplerMipmap::Nearest)),
        9985 => Some((SamplerFilter::Linear, SamplerMipmap::Nearest)),
        9986 => Some((SamplerFilter::Nearest, SamplerMipmap::Linear)),
        9987 => Some((SamplerFilter::Linear, SamplerMipmap::Linear)),
        _ => None,
    }
}

impl SamplerWrapping {
    pub(crate) fn from_gl(value: u32) -> Option<Self> {
        match value {
            33071 => Some(Self::ClampToEdge),
            33648 => Some(Self::MirroredRepeat),
            10497 => Some(Self::Repeat),
            _ => None,
        }
    }
}

/// Sampler state of a glTF sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sampler {
    pub min_filter: SamplerFilter,
    pub mag_filter: SamplerFilter,
    pub mipmap_filter: SamplerMipmap,
    pub wrapping: [SamplerWrapping; 3],
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            min_filter: SamplerFilter::Linear,
            mag_filter: SamplerFilter::Linear,
            mipmap_filter: SamplerMipmap::Linear,
            wrapping: [SamplerWrapping::Repeat; 3],
        }
    }
}

/// A texture referencing an image by its id in the importer's 2D image
/// list, or in the 3D image list for array textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureData {
    pub texture_type: TextureType,
    pub sampler: Sampler,
    pub image: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gl_filters() {
        assert_eq!(min_filter_from_gl(9986), Some((SamplerFilter::Nearest, SamplerMipmap::Linear)));
        assert_eq!(min_filter_from_gl(1), None);
        assert_eq!(SamplerFilter::from_gl(9728), Some(SamplerFilter::Nearest));
        assert_eq!(SamplerWrapping::from_gl(33648), Some(SamplerWrapping::MirroredRepeat));
    }
}
