use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::core::scene::{LightData, LightType};
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

/// Imports a `KHR_lights_punctual` light. Cone angles are reported as full
/// angles, twice the half-angles glTF stores.
pub(crate) fn import(document: &Document, id: usize) -> Result<LightData, Err> {
    let light = &document.lights.items[id];

    let color = json::find(light, "color", json::as_f32_array::<3>)
        .map_err(|_| Err::InvalidProperty("invalid color property".to_string()))?
        .unwrap_or([1.0; 3]);
    let intensity = json::find(light, "intensity", json::as_f32)
        .map_err(|_| Err::InvalidProperty("invalid intensity property".to_string()))?
        .unwrap_or(1.0);
    let range = json::find(light, "range", json::as_f32)
        .map_err(|_| Err::InvalidProperty("invalid range property".to_string()))?;
    if let Some(range) = range.filter(|r| *r <= 0.0) {
        return Err(Err::OutOfBounds(format!("expected positive range, got {}", range)));
    }

    let light_type = match json::get(light, "type", json::as_str) {
        Some("point") => LightType::Point,
        Some("spot") => LightType::Spot,
        Some("directional") => LightType::Directional,
        Some(other) => return Err(Err::UnrecognizedType(other.to_string())),
        None => return Err(Err::InvalidProperty("missing or invalid type property".to_string())),
    };

    let (inner, outer) = if light_type == LightType::Spot {
        let spot = light.get("spot").filter(|s| s.is_object())
            .ok_or_else(|| Err::InvalidProperty("missing or invalid spot property".to_string()))?;
        let inner = json::find(spot, "innerConeAngle", json::as_f32)
            .map_err(|_| Err::InvalidProperty("invalid spot innerConeAngle property".to_string()))?
            .unwrap_or(0.0);
        let outer = json::find(spot, "outerConeAngle", json::as_f32)
            .map_err(|_| Err::InvalidProperty("invalid spot outerConeAngle property".to_string()))?
            .unwrap_or(FRAC_PI_4);
        if inner < 0.0 || inner >= outer || outer > FRAC_PI_2 {
            return Err(Err::OutOfBounds(format!(
                "spot inner and outer cone angle {} and {} out of allowed bounds",
                inner.to_degrees(), outer.to_degrees()
            )));
        }
        (inner, outer)
    } else {
        (PI, PI)
    };

    if light_type == LightType::Directional && range.is_some() {
        return Err(Err::InvalidProperty("range can't be defined for a directional light".to_string()));
    }

    Ok(LightData {
        light_type,
        color,
        intensity,
        range: range.unwrap_or(f32::INFINITY),
        inner_cone_angle: inner * 2.0,
        outer_cone_angle: outer * 2.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared::ConfigType;
    use crate::io::gltf::Config;
    use serde_json::{json, Value};

    fn lights(lights: Value) -> Document {
        let value = json!({
            "asset": {"version": "2.0"},
            "extensionsUsed": ["KHR_lights_punctual"],
            "extensions": {"KHR_lights_punctual": {"lights": lights}},
        });
        Document::open(serde_json::to_vec(&value).unwrap(), None, &Config::default()).unwrap()
    }

    #[test]
    fn test_light_types() {
        let document = lights(json!([
            {"type": "point", "color": [1, 0, 0], "range": 5},
            {"type": "spot", "spot": {}, "intensity": 3},
            {"type": "directional"},
        ]));
        let point = import(&document, 0).unwrap();
        assert_eq!(point.light_type, LightType::Point);
        assert_eq!(point.color, [1.0, 0.0, 0.0]);
        assert_eq!(point.range, 5.0);
        assert_eq!(point.outer_cone_angle, 2.0 * PI);

        let spot = import(&document, 1).unwrap();
        assert_eq!(spot.intensity, 3.0);
        assert_eq!((spot.inner_cone_angle, spot.outer_cone_angle), (0.0, FRAC_PI_2));
        assert_eq!(spot.range, f32::INFINITY);

        assert_eq!(import(&document, 2).unwrap().color, [1.0; 3]);
    }

    #[test]
    fn test_errors() {
        let document = lights(json!([
            {"type": "directional", "range": 2},
            {"type": "spot", "spot": {"innerConeAngle": 1.0, "outerConeAngle": 0.5}},
            {"type": "point", "range": 0},
            {"type": "area"},
            {"type": "spot"},
        ]));
        let messages: Vec<String> = (0..5).map(|i| import(&document, i).unwrap_err().to_string()).collect();
        assert_eq!(messages[0], "range can't be defined for a directional light");
        assert!(messages[1].starts_with("spot inner and outer cone angle"));
        assert_eq!(messages[2], "expected positive range, got 0");
        assert_eq!(messages[3], "unrecognized type area");
        assert_eq!(messages[4], "missing or invalid spot property");
    }
}
