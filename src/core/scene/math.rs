/// 4x4 matrix with `data[row][column]` layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4 {
    pub data: [[f32; 4]; 4],
}

impl Matrix4 {
    pub fn new(data: [[f32; 4]; 4]) -> Self {
        Self { data }
    }

    pub fn identity() -> Self {
        Self {
            data: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a matrix from 16 floats in column-major order, the layout glTF
    /// uses for node matrices and inverse bind matrices.
    pub fn from_column_major(values: &[f32; 16]) -> Self {
        let mut data = [[0.0; 4]; 4];
        for (c, column) in values.chunks_exact(4).enumerate() {
            for (r, value) in column.iter().enumerate() {
                data[r][c] = *value;
            }
        }
        Self { data }
    }

    pub fn translation(v: [f32; 3]) -> Self {
        let mut out = Self::identity();
        out.data[0][3] = v[0];
        out.data[1][3] = v[1];
        out.data[2][3] = v[2];
        out
    }

    pub fn scaling(v: [f32; 3]) -> Self {
        let mut out = Self::identity();
        out.data[0][0] = v[0];
        out.data[1][1] = v[1];
        out.data[2][2] = v[2];
        out
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Matrix4 {
    type Output = Self;

    fn mul(self, other: Self) -> Self::Output {
        let mut result = Self::new([[0.0; 4]; 4]);
        for i in 0..4 {
            for j in 0..4 {
                result.data[i][j] = self.data[i][0] * other.data[0][j]
                    + self.data[i][1] * other.data[1][j]
                    + self.data[i][2] * other.data[2][j]
                    + self.data[i][3] * other.data[3][j];
            }
        }
        result
    }
}

/// 3x3 matrix with `data[row][column]` layout, used for 2D texture
/// coordinate transformations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix3 {
    pub data: [[f32; 3]; 3],
}

impl Matrix3 {
    pub fn identity() -> Self {
        Self {
            data: [
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn translation(v: [f32; 2]) -> Self {
        let mut out = Self::identity();
        out.data[0][2] = v[0];
        out.data[1][2] = v[1];
        out
    }

    pub fn scaling(v: [f32; 2]) -> Self {
        let mut out = Self::identity();
        out.data[0][0] = v[0];
        out.data[1][1] = v[1];
        out
    }

    /// Counterclockwise rotation by `angle` radians.
    pub fn rotation(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        let mut out = Self::identity();
        out.data[0][0] = cos;
        out.data[0][1] = -sin;
        out.data[1][0] = sin;
        out.data[1][1] = cos;
        out
    }

    /// Matrix flipping the Y coordinate of the unit square, `y -> 1 - y`.
    pub fn y_flip() -> Self {
        Self::translation([0.0, 1.0]) * Self::scaling([1.0, -1.0])
    }

    pub fn transform_point(&self, p: [f32; 2]) -> [f32; 2] {
        [
            self.data[0][0] * p[0] + self.data[0][1] * p[1] + self.data[0][2],
            self.data[1][0] * p[0] + self.data[1][1] * p[1] + self.data[1][2],
        ]
    }
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Matrix3 {
    type Output = Self;

    fn mul(self, other: Self) -> Self::Output {
        let mut result = Self { data: [[0.0; 3]; 3] };
        for i in 0..3 {
            for j in 0..3 {
                result.data[i][j] = self.data[i][0] * other.data[0][j]
                    + self.data[i][1] * other.data[1][j]
                    + self.data[i][2] * other.data[2][j];
            }
        }
        result
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quaternion {
    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// Creates a quaternion from glTF's `[x, y, z, w]` order.
    pub fn from_xyzw(v: [f32; 4]) -> Self {
        Self::new(v[3], v[0], v[1], v[2])
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    pub fn dot(&self, other: &Self) -> f32 {
        self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn is_normalized(&self) -> bool {
        (self.dot(self) - 1.0).abs() < 2.0e-5
    }

    /// Unit quaternion in the same direction. A zero quaternion has none and
    /// becomes the identity.
    pub fn normalized(&self) -> Self {
        let length = self.dot(self).sqrt();
        if length == 0.0 || !length.is_finite() {
            return Self::identity();
        }
        self.scaled(1.0 / length)
    }

    pub fn scaled(&self, s: f32) -> Self {
        Self::new(self.w * s, self.x * s, self.y * s, self.z * s)
    }

    pub fn to_matrix4(&self) -> Matrix4 {
        let (w, x, y, z) = (self.w, self.x, self.y, self.z);

        let xx = x * x;
        let yy = y * y;
        let zz = z * z;
        let xy = x * y;
        let xz = x * z;
        let xw = x * w;
        let yz = y * z;
        let yw = y * w;
        let zw = z * w;

        Matrix4 {
            data: [
                [1.0 - 2.0 * (yy + zz), 2.0 * (xy - zw), 2.0 * (xz + yw), 0.0],
                [2.0 * (xy + zw), 1.0 - 2.0 * (xx + zz), 2.0 * (yz - xw), 0.0],
                [2.0 * (xz - yw), 2.0 * (yz + xw), 1.0 - 2.0 * (xx + yy), 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: [f32; 2], b: [f32; 2]) {
        assert!((a[0] - b[0]).abs() < 1e-6 && (a[1] - b[1]).abs() < 1e-6, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_column_major() {
        let values = [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            5.0, 6.0, 7.0, 1.0,
        ];
        assert_eq!(Matrix4::from_column_major(&values), Matrix4::translation([5.0, 6.0, 7.0]));
    }

    #[test]
    fn test_trs_composition() {
        let m = Matrix4::translation([1.0, 2.0, 3.0])
            * Quaternion::identity().to_matrix4()
            * Matrix4::scaling([2.0, 2.0, 2.0]);
        assert_eq!(m.data[0][0], 2.0);
        assert_eq!(m.data[2][3], 3.0);
    }

    #[test]
    fn test_y_flip() {
        let flip = Matrix3::y_flip();
        assert_close(flip.transform_point([0.25, 0.0]), [0.25, 1.0]);
        assert_close(flip.transform_point([0.25, 0.75]), [0.25, 0.25]);
        assert_close((flip * flip).transform_point([0.3, 0.6]), [0.3, 0.6]);
    }

    #[test]
    fn test_rotation() {
        let r = Matrix3::rotation(std::f32::consts::FRAC_PI_2);
        assert_close(r.transform_point([1.0, 0.0]), [0.0, 1.0]);
    }

    #[test]
    fn test_quaternion_normalization() {
        let q = Quaternion::new(2.0, 0.0, 0.0, 0.0);
        assert!(!q.is_normalized());
        assert_eq!(q.normalized(), Quaternion::identity());
        assert_eq!(Quaternion::from_xyzw([0.0, 0.0, 0.0, 1.0]), Quaternion::identity());
        assert_eq!(Quaternion::new(0.0, 0.0, 0.0, 0.0).normalized(), Quaternion::identity());
    }
}
