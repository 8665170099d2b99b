//! Physical-space image: tensor data plus origin, spacing, and direction.

use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};

use crate::spatial::{Direction, Point, Spacing, Vector};

/// A volume with physical-space metadata.
///
/// The voxel data is stored `[Z, Y, X]` for 3D images; the metadata maps
/// voxel indices `(x, y, z)` to physical coordinates via
/// `point = origin + direction · (index ∘ spacing)`.
///
/// # Type parameters
/// * `B` - tensor backend
/// * `D` - spatial dimensionality
#[derive(Debug, Clone)]
pub struct Image<B: Backend, const D: usize> {
    data: Tensor<B, D>,
    origin: Point<D>,
    spacing: Spacing<D>,
    direction: Direction<D>,
}

impl<B: Backend, const D: usize> Image<B, D> {
    pub fn new(
        data: Tensor<B, D>,
        origin: Point<D>,
        spacing: Spacing<D>,
        direction: Direction<D>,
    ) -> Self {
        Self {
            data,
            origin,
            spacing,
            direction,
        }
    }

    pub fn data(&self) -> &Tensor<B, D> {
        &self.data
    }

    pub fn origin(&self) -> &Point<D> {
        &self.origin
    }

    pub fn spacing(&self) -> &Spacing<D> {
        &self.spacing
    }

    pub fn direction(&self) -> &Direction<D> {
        &self.direction
    }

    pub fn shape(&self) -> [usize; D] {
        self.data.dims()
    }

    /// Total number of voxels.
    pub fn num_voxels(&self) -> usize {
        self.shape().iter().product()
    }

    /// A new image with the same geometry but different data.
    pub fn with_data(&self, data: Tensor<B, D>) -> Self {
        Self::new(data, self.origin, self.spacing, self.direction)
    }

    /// Map a physical point to a continuous voxel index.
    ///
    /// `index = direction⁻¹ · (point - origin) / spacing`
    pub fn world_to_index(&self, point: &Point<D>) -> Point<D> {
        let diff = *point - self.origin;
        let inv_dir = self
            .direction
            .try_inverse()
            .expect("direction matrix must be invertible");
        let rotated = inv_dir * diff;

        let mut index = Point::<D>::origin();
        for i in 0..D {
            index[i] = rotated[i] / self.spacing[i];
        }
        index
    }

    /// Map a continuous voxel index to a physical point.
    ///
    /// `point = origin + direction · (index ∘ spacing)`
    pub fn index_to_world(&self, index: &Point<D>) -> Point<D> {
        let mut scaled = Vector::<D>::zeros();
        for i in 0..D {
            scaled[i] = index[i] * self.spacing[i];
        }
        self.origin + self.direction * scaled
    }

    /// Physical point at the continuous center of the voxel grid.
    pub fn center(&self) -> Point<D> {
        let shape = self.shape();
        let mut index = Point::<D>::origin();
        for i in 0..D {
            // Index axis order is (x, y, .., ), data axis order is reversed.
            index[i] = (shape[D - 1 - i] as f64 - 1.0) / 2.0;
        }
        self.index_to_world(&index)
    }

    /// Largest physical distance from `center` to any corner of the grid.
    pub fn max_radius(&self, center: &Point<D>) -> f64 {
        let shape = self.shape();
        let corners = 1usize << D;
        let mut radius: f64 = 0.0;
        for mask in 0..corners {
            let mut index = Point::<D>::origin();
            for i in 0..D {
                let extent = shape[D - 1 - i] as f64 - 1.0;
                index[i] = if mask & (1 << i) != 0 { extent } else { 0.0 };
            }
            let corner = self.index_to_world(&index);
            radius = radius.max((corner - *center).norm());
        }
        radius
    }

    /// Map a `[N, D]` batch of physical points to continuous indices.
    pub fn world_to_index_batch(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = points.device();

        let origin_vec: Vec<f32> = (0..D).map(|i| self.origin[i] as f32).collect();
        let origin = Tensor::<B, 1>::from_data(
            TensorData::new(origin_vec, Shape::new([D])),
            &device,
        )
        .reshape([1, D]);

        // index = (point - origin) @ T with T[r, c] = dir⁻¹[c, r] / spacing[c]
        let inv_dir = self
            .direction
            .try_inverse()
            .expect("direction matrix must be invertible");
        let mut t_data = Vec::with_capacity(D * D);
        for r in 0..D {
            for c in 0..D {
                t_data.push((inv_dir[(c, r)] / self.spacing[c]) as f32);
            }
        }
        let t = Tensor::<B, 2>::from_data(TensorData::new(t_data, Shape::new([D, D])), &device);

        (points - origin).matmul(t)
    }

    /// Map a `[N, D]` batch of continuous indices to physical points.
    pub fn index_to_world_batch(&self, indices: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = indices.device();

        let origin_vec: Vec<f32> = (0..D).map(|i| self.origin[i] as f32).collect();
        let origin = Tensor::<B, 1>::from_data(
            TensorData::new(origin_vec, Shape::new([D])),
            &device,
        )
        .reshape([1, D]);

        // point = origin + index @ M with M[r, c] = spacing[r] * dir[c, r]
        let mut m_data = Vec::with_capacity(D * D);
        for r in 0..D {
            for c in 0..D {
                m_data.push((self.spacing[r] * self.direction[(c, r)]) as f32);
            }
        }
        let m = Tensor::<B, 2>::from_data(TensorData::new(m_data, Shape::new([D, D])), &device);

        indices.matmul(m) + origin
    }
}
