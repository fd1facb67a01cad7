/// Pixel format of decoded image data. Normalized formats are stored as
/// unsigned integers, float formats as 32-bit floats, all little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    R8Unorm,
    RG8Unorm,
    RGB8Unorm,
    RGBA8Unorm,
    R16Unorm,
    RG16Unorm,
    RGB16Unorm,
    RGBA16Unorm,
    RGB32F,
    RGBA32F,
}

impl PixelFormat {
    pub fn pixel_size(self) -> usize {
        match self {
            Self::R8Unorm => 1,
            Self::RG8Unorm | Self::R16Unorm => 2,
            Self::RGB8Unorm => 3,
            Self::RGBA8Unorm | Self::RG16Unorm => 4,
            Self::RGB16Unorm => 6,
            Self::RGBA16Unorm => 8,
            Self::RGB32F => 12,
            Self::RGBA32F => 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageData2D {
    pub format: PixelFormat,
    pub size: [u32; 2],
    pub data: Vec<u8>,
}

/// Image with layers, used for 2D array textures.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData3D {
    pub format: PixelFormat,
    pub size: [u32; 3],
    pub data: Vec<u8>,
}
