use std::fmt;

/// Component type of an accessor, identified in glTF by a GL enum value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    UnsignedInt,
    Float,
}

impl ComponentType {
    pub fn from_gl(value: u32) -> Option<Self> {
        match value {
            5120 => Some(Self::Byte),
            5121 => Some(Self::UnsignedByte),
            5122 => Some(Self::Short),
            5123 => Some(Self::UnsignedShort),
            5125 => Some(Self::UnsignedInt),
            5126 => Some(Self::Float),
            _ => None,
        }
    }

    pub fn size(self) -> usize {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort => 2,
            Self::UnsignedInt | Self::Float => 4,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::Byte => "b",
            Self::UnsignedByte => "ub",
            Self::Short => "s",
            Self::UnsignedShort => "us",
            Self::UnsignedInt => "ui",
            Self::Float => "",
        }
    }
}

/// Element shape of an accessor, the glTF `type` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl Shape {
    pub fn from_gltf(value: &str) -> Option<Self> {
        match value {
            "SCALAR" => Some(Self::Scalar),
            "VEC2" => Some(Self::Vec2),
            "VEC3" => Some(Self::Vec3),
            "VEC4" => Some(Self::Vec4),
            "MAT2" => Some(Self::Mat2),
            "MAT3" => Some(Self::Mat3),
            "MAT4" => Some(Self::Mat4),
            _ => None,
        }
    }

    pub fn is_matrix(self) -> bool {
        matches!(self, Self::Mat2 | Self::Mat3 | Self::Mat4)
    }

    /// Number of columns. Vectors and scalars have one column.
    pub fn columns(self) -> usize {
        match self {
            Self::Mat2 => 2,
            Self::Mat3 => 3,
            Self::Mat4 => 4,
            _ => 1,
        }
    }

    /// Number of rows, that is the component count of one column.
    pub fn rows(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 | Self::Mat2 => 2,
            Self::Vec3 | Self::Mat3 => 3,
            Self::Vec4 | Self::Mat4 => 4,
        }
    }
}

/// Unified format of one accessor element: component type, shape and the
/// normalization flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexFormat {
    pub component: ComponentType,
    pub shape: Shape,
    pub normalized: bool,
}

impl VertexFormat {
    pub fn new(component: ComponentType, shape: Shape, normalized: bool) -> Self {
        Self { component, shape, normalized }
    }

    pub fn scalar(component: ComponentType) -> Self {
        Self::new(component, Shape::Scalar, false)
    }

    /// Byte size of one element. Matrix columns are padded to four bytes.
    pub fn size(&self) -> usize {
        let column = self.shape.rows() * self.component.size();
        if self.shape.is_matrix() {
            self.shape.columns() * ((column + 3) & !3)
        } else {
            column
        }
    }

    pub fn component_count(&self) -> usize {
        self.shape.rows() * self.shape.columns()
    }
}

impl fmt::Display for VertexFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shape {
            Shape::Scalar => match self.component {
                ComponentType::Byte => write!(f, "Byte")?,
                ComponentType::UnsignedByte => write!(f, "UnsignedByte")?,
                ComponentType::Short => write!(f, "Short")?,
                ComponentType::UnsignedShort => write!(f, "UnsignedShort")?,
                ComponentType::UnsignedInt => write!(f, "UnsignedInt")?,
                ComponentType::Float => write!(f, "Float")?,
            },
            Shape::Vec2 | Shape::Vec3 | Shape::Vec4 => {
                write!(f, "Vector{}{}", self.shape.rows(), self.component.suffix())?
            }
            Shape::Mat2 | Shape::Mat3 | Shape::Mat4 => write!(
                f,
                "Matrix{}x{}{}",
                self.shape.columns(),
                self.shape.rows(),
                self.component.suffix()
            )?,
        }
        if self.normalized {
            write!(f, "Normalized")?;
        }
        Ok(())
    }
}

/// Type of mesh indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    UnsignedByte,
    UnsignedShort,
    UnsignedInt,
}

impl IndexType {
    pub fn size(self) -> usize {
        match self {
            Self::UnsignedByte => 1,
            Self::UnsignedShort => 2,
            Self::UnsignedInt => 4,
        }
    }

    pub fn from_component(component: ComponentType) -> Option<Self> {
        match component {
            ComponentType::UnsignedByte => Some(Self::UnsignedByte),
            ComponentType::UnsignedShort => Some(Self::UnsignedShort),
            ComponentType::UnsignedInt => Some(Self::UnsignedInt),
            _ => None,
        }
    }

    /// Reads the index at position `i` of a tightly packed little-endian array.
    pub fn read(self, data: &[u8], i: usize) -> u32 {
        match self {
            Self::UnsignedByte => data[i] as u32,
            Self::UnsignedShort => u16::from_le_bytes([data[2 * i], data[2 * i + 1]]) as u32,
            Self::UnsignedInt => u32::from_le_bytes([
                data[4 * i],
                data[4 * i + 1],
                data[4 * i + 2],
                data[4 * i + 3],
            ]),
        }
    }
}
