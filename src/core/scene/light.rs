#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightType {
    Point,
    Spot,
    Directional,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightData {
    pub light_type: LightType,
    pub color: [f32; 3],
    pub intensity: f32,
    /// `f32::INFINITY` if the light has no range limit.
    pub range: f32,
    /// Full cone angles in radians. Lights other than spot lights have both
    /// set to a full circle.
    pub inner_cone_angle: f32,
    pub outer_cone_angle: f32,
}
