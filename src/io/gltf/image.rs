use image::DynamicImage;

use crate::core::image::{ImageData2D, ImageData3D, PixelFormat};
use crate::io::gltf::json;
use crate::io::gltf::resolver::{self, Resolver};

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Err {
    #[error("{0}")]
    Decode(String),
    #[error("{0}")]
    InvalidImage(String),
    #[error(transparent)]
    Resolver(#[from] resolver::Err),
}

/// Decodes image files referenced by a glTF. Decoded images have their
/// origin at the bottom left, matching the flipped texture coordinates.
pub trait ImageDecoder {
    fn decode_2d(&mut self, data: &[u8]) -> Result<ImageData2D, String>;

    /// Decodes a file containing a 2D array image.
    fn decode_3d(&mut self, _data: &[u8]) -> Result<ImageData3D, String> {
        Err("decoding 2D array images requires a custom image decoder".to_string())
    }
}

/// Decoder for the formats supported by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultImageDecoder;

fn u16_bytes(data: &[u16]) -> Vec<u8> {
    data.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn f32_bytes(data: &[f32]) -> Vec<u8> {
    data.iter().flat_map(|v| v.to_le_bytes()).collect()
}

impl ImageDecoder for DefaultImageDecoder {
    fn decode_2d(&mut self, data: &[u8]) -> Result<ImageData2D, String> {
        let image = image::load_from_memory(data).map_err(|e| e.to_string())?.flipv();
        let size = [image.width(), image.height()];
        let (format, data) = match image {
            DynamicImage::ImageLuma8(i) => (PixelFormat::R8Unorm, i.into_raw()),
            DynamicImage::ImageLumaA8(i) => (PixelFormat::RG8Unorm, i.into_raw()),
            DynamicImage::ImageRgb8(i) => (PixelFormat::RGB8Unorm, i.into_raw()),
            DynamicImage::ImageRgba8(i) => (PixelFormat::RGBA8Unorm, i.into_raw()),
            DynamicImage::ImageLuma16(i) => (PixelFormat::R16Unorm, u16_bytes(i.as_raw())),
            DynamicImage::ImageLumaA16(i) => (PixelFormat::RG16Unorm, u16_bytes(i.as_raw())),
            DynamicImage::ImageRgb16(i) => (PixelFormat::RGB16Unorm, u16_bytes(i.as_raw())),
            DynamicImage::ImageRgba16(i) => (PixelFormat::RGBA16Unorm, u16_bytes(i.as_raw())),
            DynamicImage::ImageRgb32F(i) => (PixelFormat::RGB32F, f32_bytes(i.as_raw())),
            DynamicImage::ImageRgba32F(i) => (PixelFormat::RGBA32F, f32_bytes(i.as_raw())),
            other => (PixelFormat::RGBA8Unorm, other.to_rgba8().into_raw()),
        };
        Ok(ImageData2D { format, size, data })
    }
}

/// Loads the encoded file of glTF image `id`, either embedded in a buffer
/// view or referenced by a URI.
pub(crate) fn load(resolver: &mut Resolver, id: usize) -> Result<Vec<u8>, Err> {
    let document = resolver.document;
    let gltf_image = &document.images.items[id];

    let uri = json::find(gltf_image, "uri", json::as_str)
        .map_err(|_| Err::InvalidImage("invalid uri property".to_string()))?;
    let buffer_view = json::find(gltf_image, "bufferView", json::as_u32)
        .map_err(|_| Err::InvalidImage("invalid bufferView property".to_string()))?;

    match (uri, buffer_view) {
        (Some(uri), None) => Ok(resolver.load_uri(uri, "image")?),
        (None, Some(view_id)) => {
            let view = resolver.buffer_view(view_id)?;
            if view.stride != 0 {
                return Err(Err::InvalidImage(format!("buffer view {} is strided", view_id)));
            }
            Ok(resolver.view_bytes(&view).to_vec())
        }
        _ => Err(Err::InvalidImage("expected exactly one of uri or bufferView properties defined".to_string())),
    }
}

pub(crate) fn import_2d(resolver: &mut Resolver, decoder: &mut dyn ImageDecoder, id: usize) -> Result<ImageData2D, Err> {
    let gltf_id = resolver.document.images_by_dimension[id] as usize;
    let data = load(resolver, gltf_id)?;
    log::debug!("decoding 2D image {} from {} bytes", gltf_id, data.len());
    decoder.decode_2d(&data).map_err(Err::Decode)
}

pub(crate) fn import_3d(resolver: &mut Resolver, decoder: &mut dyn ImageDecoder, id: usize) -> Result<ImageData3D, Err> {
    let document = resolver.document;
    let gltf_id = document.images_by_dimension[document.image_2d_count + id] as usize;
    let data = load(resolver, gltf_id)?;
    log::debug!("decoding 2D array image {} from {} bytes", gltf_id, data.len());
    decoder.decode_3d(&data).map_err(Err::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::gltf::resolver::tests::{data_uri, with_resolver};
    use image::{ImageFormat, Rgba, RgbaImage};
    use serde_json::json;
    use std::io::Cursor;

    fn png() -> Vec<u8> {
        let mut image = RgbaImage::new(1, 2);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(0, 1, Rgba([0, 255, 0, 255]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(image).write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_flips_rows() {
        let image = DefaultImageDecoder.decode_2d(&png()).unwrap();
        assert_eq!(image.format, PixelFormat::RGBA8Unorm);
        assert_eq!(image.size, [1, 2]);
        assert_eq!(image.data, vec![0, 255, 0, 255, 255, 0, 0, 255], "bottom row comes first");
        assert!(DefaultImageDecoder.decode_2d(b"not an image").is_err());
        assert!(DefaultImageDecoder.decode_3d(&png()).is_err());
    }

    #[test]
    fn test_image_sources() {
        let png = png();
        let mut buffer = png.clone();
        buffer.resize(png.len() + 4, 0);
        let value = json!({
            "asset": {"version": "2.0"},
            "buffers": [{"byteLength": buffer.len(), "uri": data_uri(&buffer)}],
            "bufferViews": [
                {"buffer": 0, "byteLength": png.len()},
                {"buffer": 0, "byteLength": png.len(), "byteStride": 4},
            ],
            "images": [
                {"uri": data_uri(&png)},
                {"bufferView": 0, "mimeType": "image/png"},
                {"bufferView": 1},
                {"uri": "a.png", "bufferView": 0},
                {},
            ],
        });
        with_resolver(value, |r| {
            let mut decoder = DefaultImageDecoder;
            assert_eq!(import_2d(r, &mut decoder, 0).unwrap().size, [1, 2]);
            assert_eq!(import_2d(r, &mut decoder, 1), import_2d(r, &mut decoder, 0));
            assert_eq!(import_2d(r, &mut decoder, 2).unwrap_err().to_string(), "buffer view 1 is strided");
            let both = import_2d(r, &mut decoder, 3).unwrap_err().to_string();
            assert_eq!(both, "expected exactly one of uri or bufferView properties defined");
            assert_eq!(import_2d(r, &mut decoder, 4).unwrap_err().to_string(), both);
        });
    }
}
