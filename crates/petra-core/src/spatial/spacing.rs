//! Voxel spacing type.

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Physical distance between voxel centers along each axis (mm).
///
/// Spacing is strictly positive on every axis; use [`Spacing::checked`] when
/// the values come from untrusted input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacing<const D: usize>(pub [f64; D]);

// serde does not implement Serialize/Deserialize for const-generic arrays
// `[f64; D]`, so provide the impls manually (as a sequence of f64).
impl<const D: usize> Serialize for Spacing<D> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0[..].serialize(serializer)
    }
}

impl<'de, const D: usize> Deserialize<'de> for Spacing<D> {
    fn deserialize<De: serde::Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        let values = Vec::<f64>::deserialize(deserializer)?;
        if values.len() != D {
            return Err(serde::de::Error::invalid_length(values.len(), &"D elements"));
        }
        let mut arr = [0.0f64; D];
        arr.copy_from_slice(&values);
        Ok(Spacing(arr))
    }
}

impl<const D: usize> Spacing<D> {
    pub fn new(values: [f64; D]) -> Self {
        Self(values)
    }

    /// Same spacing on every axis.
    pub fn uniform(value: f64) -> Self {
        Self([value; D])
    }

    /// Validate that every axis is strictly positive.
    pub fn checked(values: [f64; D]) -> Result<Self, GeometryError> {
        for (axis, &value) in values.iter().enumerate() {
            if value <= 0.0 {
                return Err(GeometryError::NonPositiveSpacing { axis, value });
            }
        }
        Ok(Self(values))
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }

    /// True when the difference to `other` is below `tolerance` on all axes.
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (0..D).all(|i| (self.0[i] - other.0[i]).abs() <= tolerance)
    }
}

impl<const D: usize> std::ops::Index<usize> for Spacing<D> {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<const D: usize> std::ops::IndexMut<usize> for Spacing<D> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}
