#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraType {
    Perspective3D,
    Orthographic3D,
}

/// Camera projection described by its near plane size and clip distances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraData {
    pub camera_type: CameraType,
    /// Size of the near plane for perspective cameras, full view size for
    /// orthographic cameras.
    pub size: [f32; 2],
    pub near: f32,
    /// `f32::INFINITY` for an infinite perspective projection.
    pub far: f32,
}

impl CameraData {
    pub fn aspect_ratio(&self) -> f32 {
        self.size[0] / self.size[1]
    }
}
