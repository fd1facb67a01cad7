use crate::core::scene::Quaternion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interpolation {
    /// glTF `STEP`.
    Constant,
    Linear,
    /// glTF `CUBICSPLINE`, values are cubic Hermite triples.
    Spline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extrapolation {
    Constant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackTarget {
    Translation3D,
    Rotation3D,
    Scaling3D,
}

/// Key value of a spline track. Tangents are already multiplied by the
/// duration of the adjacent key interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicHermite<T> {
    pub in_tangent: T,
    pub point: T,
    pub out_tangent: T,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackValues {
    Vector3(Vec<[f32; 3]>),
    Quaternion(Vec<Quaternion>),
    CubicHermite3D(Vec<CubicHermite<[f32; 3]>>),
    CubicHermiteQuaternion(Vec<CubicHermite<Quaternion>>),
}

impl TrackValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Vector3(v) => v.len(),
            Self::Quaternion(v) => v.len(),
            Self::CubicHermite3D(v) => v.len(),
            Self::CubicHermiteQuaternion(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationTrackData {
    pub target: TrackTarget,
    /// Animated object, a glTF node index.
    pub target_object: u32,
    pub interpolation: Interpolation,
    pub extrapolation: Extrapolation,
    pub keys: Vec<f32>,
    pub values: TrackValues,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationData {
    tracks: Vec<AnimationTrackData>,
}

impl AnimationData {
    pub fn new(tracks: Vec<AnimationTrackData>) -> Self {
        Self { tracks }
    }

    pub fn get_tracks(&self) -> &[AnimationTrackData] { &self.tracks }

    /// Time range covered by all tracks, `None` if there are no keys.
    pub fn duration(&self) -> Option<(f32, f32)> {
        self.tracks.iter()
            .flat_map(|t| t.keys.first().zip(t.keys.last()))
            .fold(None, |acc, (begin, end)| match acc {
                None => Some((*begin, *end)),
                Some((b, e)) => Some((f32::min(b, *begin), f32::max(e, *end))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(keys: Vec<f32>) -> AnimationTrackData {
        AnimationTrackData {
            target: TrackTarget::Translation3D,
            target_object: 0,
            interpolation: Interpolation::Linear,
            extrapolation: Extrapolation::Constant,
            values: TrackValues::Vector3(vec![[0.0; 3]; keys.len()]),
            keys,
        }
    }

    #[test]
    fn test_duration() {
        assert_eq!(AnimationData::new(Vec::new()).duration(), None);
        let animation = AnimationData::new(vec![track(vec![0.5, 1.0]), track(vec![0.25, 0.75])]);
        assert_eq!(animation.duration(), Some((0.25, 1.0)));
    }
}
