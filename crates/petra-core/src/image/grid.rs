use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};

/// Generate the full grid of voxel indices for a 3D volume.
///
/// Returns a `[N, 3]` tensor of `(x, y, z)` index triples, ordered to match a
/// flattened `[Z, Y, X]` data layout: the returned row `k` corresponds to the
/// `k`-th element of `data.reshape([N])`.
pub fn index_grid_3d<B: Backend>(shape: [usize; 3], device: &B::Device) -> Tensor<B, 2> {
    let (nz, ny, nx) = (shape[0], shape[1], shape[2]);
    let total = nz * ny * nx;

    let mut grid = Vec::with_capacity(total * 3);
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                grid.push(x as f32);
                grid.push(y as f32);
                grid.push(z as f32);
            }
        }
    }

    Tensor::<B, 1>::from_data(TensorData::new(grid, Shape::new([total * 3])), device)
        .reshape([total, 3])
}
