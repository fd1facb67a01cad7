use serde_json::Value;

use crate::core::scene::{CameraData, CameraType};
use crate::io::gltf::document::Document;
use crate::io::gltf::json;

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Err {
    #[error("{0}")]
    InvalidProperty(String),
    #[error("{0}")]
    OutOfBounds(String),
    #[error("unrecognized type {0}")]
    UnrecognizedType(String),
}

fn required(object: &Value, projection: &str, key: &str) -> Result<f32, Err> {
    json::get(object, key, json::as_f32).ok_or_else(|| Err::InvalidProperty(format!(
        "missing or invalid {} {} property", projection, key
    )))
}

fn projection<'a>(camera: &'a Value, projection: &str) -> Result<&'a Value, Err> {
    camera.get(projection).filter(|p| p.is_object())
        .ok_or_else(|| Err::InvalidProperty(format!("missing or invalid {} property", projection)))
}

pub(crate) fn import(document: &Document, id: usize) -> Result<CameraData, Err> {
    let camera = &document.cameras.items[id];
    let camera_type = json::get(camera, "type", json::as_str)
        .ok_or_else(|| Err::InvalidProperty("missing or invalid type property".to_string()))?;

    match camera_type {
        "perspective" => {
            let perspective = projection(camera, "perspective")?;
            let aspect_ratio = json::find(perspective, "aspectRatio", json::as_f32)
                .map_err(|_| Err::InvalidProperty("invalid perspective aspectRatio property".to_string()))?;
            if let Some(aspect_ratio) = aspect_ratio.filter(|a| *a <= 0.0) {
                return Err(Err::OutOfBounds(format!("expected positive perspective aspectRatio, got {}", aspect_ratio)));
            }
            let yfov = required(perspective, "perspective", "yfov")?;
            if yfov <= 0.0 {
                return Err(Err::OutOfBounds(format!("expected positive perspective yfov, got {}", yfov)));
            }
            let near = required(perspective, "perspective", "znear")?;
            if near <= 0.0 {
                return Err(Err::OutOfBounds(format!("expected positive perspective znear, got {}", near)));
            }
            let far = json::find(perspective, "zfar", json::as_f32)
                .map_err(|_| Err::InvalidProperty("invalid perspective zfar property".to_string()))?;
            if let Some(far) = far.filter(|f| *f <= near) {
                return Err(Err::OutOfBounds(format!(
                    "expected perspective zfar larger than znear of {}, got {}", near, far
                )));
            }

            // Near plane size from the vertical field of view, 1:1 if the
            // aspect ratio is left to the viewport
            let height = 2.0 * near * (yfov * 0.5).tan();
            Ok(CameraData {
                camera_type: CameraType::Perspective3D,
                size: [height * aspect_ratio.unwrap_or(1.0), height],
                near,
                far: far.unwrap_or(f32::INFINITY),
            })
        }
        "orthographic" => {
            let orthographic = projection(camera, "orthographic")?;
            let xmag = required(orthographic, "orthographic", "xmag")?;
            if xmag == 0.0 {
                return Err(Err::OutOfBounds("expected non-zero orthographic xmag".to_string()));
            }
            let ymag = required(orthographic, "orthographic", "ymag")?;
            if ymag == 0.0 {
                return Err(Err::OutOfBounds("expected non-zero orthographic ymag".to_string()));
            }
            let near = required(orthographic, "orthographic", "znear")?;
            if near < 0.0 {
                return Err(Err::OutOfBounds(format!("expected non-negative orthographic znear, got {}", near)));
            }
            let far = required(orthographic, "orthographic", "zfar")?;
            if far <= near {
                return Err(Err::OutOfBounds(format!(
                    "expected orthographic zfar larger than znear of {}, got {}", near, far
                )));
            }
            // Magnification is half the view size
            Ok(CameraData {
                camera_type: CameraType::Orthographic3D,
                size: [xmag * 2.0, ymag * 2.0],
                near,
                far,
            })
        }
        other => Err(Err::UnrecognizedType(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared::ConfigType;
    use crate::io::gltf::Config;
    use serde_json::json;

    fn cameras(cameras: Value) -> Document {
        let value = json!({"asset": {"version": "2.0"}, "cameras": cameras});
        Document::open(serde_json::to_vec(&value).unwrap(), None, &Config::default()).unwrap()
    }

    #[test]
    fn test_perspective() {
        let document = cameras(json!([
            {"type": "perspective", "perspective": {"yfov": std::f32::consts::FRAC_PI_2, "znear": 0.5, "aspectRatio": 2.0}},
            {"type": "perspective", "perspective": {"yfov": 1.0, "znear": 0.1, "zfar": 100}},
        ]));
        let camera = import(&document, 0).unwrap();
        assert_eq!(camera.camera_type, CameraType::Perspective3D);
        assert!((camera.size[1] - 1.0).abs() < 1e-6);
        assert!((camera.aspect_ratio() - 2.0).abs() < 1e-6);
        assert_eq!(camera.far, f32::INFINITY);
        assert_eq!(import(&document, 1).unwrap().far, 100.0);
    }

    #[test]
    fn test_orthographic() {
        let document = cameras(json!([
            {"type": "orthographic", "orthographic": {"xmag": 2, "ymag": 1.5, "znear": 0, "zfar": 10}},
        ]));
        let camera = import(&document, 0).unwrap();
        assert_eq!(camera, CameraData {
            camera_type: CameraType::Orthographic3D,
            size: [4.0, 3.0],
            near: 0.0,
            far: 10.0,
        });
    }

    #[test]
    fn test_errors() {
        let document = cameras(json!([
            {"type": "fisheye"},
            {"type": "perspective"},
            {"type": "perspective", "perspective": {"yfov": 1.0, "znear": 1.0, "zfar": 0.5}},
            {"type": "orthographic", "orthographic": {"xmag": 0, "ymag": 1, "znear": 0, "zfar": 1}},
            {"type": "orthographic", "orthographic": {"xmag": 1, "ymag": 1, "znear": 0}},
        ]));
        let messages: Vec<String> = (0..5).map(|i| import(&document, i).unwrap_err().to_string()).collect();
        assert_eq!(messages, vec![
            "unrecognized type fisheye",
            "missing or invalid perspective property",
            "expected perspective zfar larger than znear of 1, got 0.5",
            "expected non-zero orthographic xmag",
            "missing or invalid orthographic zfar property",
        ]);
    }
}
