use cubecl::prelude::*;
use cubecl::wgpu::{WgpuDevice, WgpuRuntime};
use cubecl::Runtime;
use serde::{Deserialize, Serialize};

use despeckle_image::GrayImage;

use crate::{
    error::FilterError,
    filter::{interior_rows, prepare_output, FilterKind},
    parallel::{validate_tile_size, FilterExecutor, MAX_TILE_SIZE},
};

#[derive(CubeLaunch, Deserialize, Serialize)]
struct WindowArgs {
    cols: u32,
    rows: u32,
    radius: u32,
}

#[cube(launch_unchecked)]
fn gaussian_cl_kernel<F: Float>(
    src: &Array<F>,
    weights: &Array<F>,
    dst: &mut Array<u32>,
    args: WindowArgs,
) {
    let x = CUBE_POS_X * CUBE_DIM_X + UNIT_POS_X;
    let y = CUBE_POS_Y * CUBE_DIM_Y + UNIT_POS_Y;

    let cols = args.cols;
    let rows = args.rows;
    let radius = args.radius;
    let size = radius * 2 + 1;

    if x >= radius && y >= radius && x + radius < cols && y + radius < rows {
        let mut acc = F::new(0.0);
        for k in 0..size {
            for l in 0..size {
                let idx = (y + k - radius) * cols + (x + l - radius);
                acc += src[idx] * weights[k * size + l];
            }
        }

        let clamped = F::min(F::max(acc, F::new(0.0)), F::new(255.0));
        dst[y * cols + x] = u32::cast_from(F::floor(clamped + F::new(0.5)));
    }
}

#[cube(launch_unchecked)]
fn local_mean_cl_kernel(src: &Array<u32>, dst: &mut Array<u32>, args: WindowArgs) {
    let x = CUBE_POS_X * CUBE_DIM_X + UNIT_POS_X;
    let y = CUBE_POS_Y * CUBE_DIM_Y + UNIT_POS_Y;

    let cols = args.cols;
    let rows = args.rows;
    let radius = args.radius;
    let size = radius * 2 + 1;

    if x >= radius && y >= radius && x + radius < cols && y + radius < rows {
        let mut sum = 0u32;
        for k in 0..size {
            for l in 0..size {
                sum += src[(y + k - radius) * cols + (x + l - radius)];
            }
        }
        dst[y * cols + x] = sum / (size * size);
    }
}

/// Largest local mean window whose sum of 8-bit samples fits the `u32`
/// accumulator of the gpu kernel.
pub const MAX_GPU_LOCAL_MEAN_SIZE: usize = 4103;

/// Evaluate each interior output pixel on its own gpu compute unit.
///
/// The grid is made of `tile_size × tile_size` cubes. The source image is
/// uploaded for every pass and the interior read back; the border is copied on
/// the host.
///
/// The gaussian pass accumulates in `f32`, so its output may differ from the cpu
/// executors by one intensity level. The local mean pass is exact.
#[derive(Debug, Clone)]
pub struct GpuExecutor {
    device: WgpuDevice,
    tile_size: u32,
}

impl GpuExecutor {
    /// Create an executor on the default wgpu device.
    ///
    /// # Arguments
    ///
    /// * `tile_size` - The side length of a cube, in compute units. At most
    ///   [`MAX_TILE_SIZE`] so a cube stays within the workgroup limit.
    pub fn new(tile_size: u32) -> Result<Self, FilterError> {
        validate_tile_size(tile_size)?;
        Ok(Self {
            device: WgpuDevice::DefaultDevice,
            tile_size,
        })
    }

    /// Side length of a cube, in compute units.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }
}

fn to_device_dim(value: usize) -> Result<u32, FilterError> {
    u32::try_from(value)
        .map_err(|_| FilterError::DeviceTransfer(format!("dimension {value} exceeds u32")))
}

impl FilterExecutor for GpuExecutor {
    fn apply(&self, kind: &FilterKind, src: &GrayImage) -> Result<GrayImage, FilterError> {
        let mut dst = prepare_output(kind, src)?;
        let Some(interior) = interior_rows(src.size(), kind.radius()) else {
            return Ok(dst);
        };

        if let FilterKind::LocalMean { kernel_size } = kind {
            if *kernel_size > MAX_GPU_LOCAL_MEAN_SIZE {
                return Err(FilterError::InvalidKernelSize(*kernel_size));
            }
        }

        let cols = to_device_dim(src.cols())?;
        let rows = to_device_dim(src.rows())?;
        let radius = to_device_dim(kind.radius())?;
        let numel = src.as_slice().len();
        to_device_dim(numel * std::mem::size_of::<u32>())?;

        type R = WgpuRuntime;
        let client = R::client(&self.device);

        let output_handle = client.empty(numel * std::mem::size_of::<u32>());

        let tile = self.tile_size;
        let cube_dim = CubeDim::new_2d(tile, tile);
        let cube_count = CubeCount::new_2d(cols.div_ceil(tile), rows.div_ceil(tile));

        match kind {
            FilterKind::Gaussian(kernel) => {
                let src_vec = src.as_slice().iter().map(|&v| v as f32).collect::<Vec<_>>();
                let weights = kernel
                    .as_slice()
                    .iter()
                    .map(|&w| w as f32)
                    .collect::<Vec<_>>();

                let input_handle = client.create(f32::as_bytes(&src_vec));
                let weights_handle = client.create(f32::as_bytes(&weights));

                unsafe {
                    gaussian_cl_kernel::launch_unchecked::<f32, R>(
                        &client,
                        cube_count,
                        cube_dim,
                        ArrayArg::from_raw_parts::<f32>(&input_handle, numel, 1),
                        ArrayArg::from_raw_parts::<f32>(&weights_handle, weights.len(), 1),
                        ArrayArg::from_raw_parts::<u32>(&output_handle, numel, 1),
                        WindowArgsLaunch::new(
                            ScalarArg::new(cols),
                            ScalarArg::new(rows),
                            ScalarArg::new(radius),
                        ),
                    );
                }
            }
            FilterKind::LocalMean { .. } => {
                let src_vec = src.as_slice().iter().map(|&v| v as u32).collect::<Vec<_>>();
                let input_handle = client.create(u32::as_bytes(&src_vec));

                unsafe {
                    local_mean_cl_kernel::launch_unchecked::<R>(
                        &client,
                        cube_count,
                        cube_dim,
                        ArrayArg::from_raw_parts::<u32>(&input_handle, numel, 1),
                        ArrayArg::from_raw_parts::<u32>(&output_handle, numel, 1),
                        WindowArgsLaunch::new(
                            ScalarArg::new(cols),
                            ScalarArg::new(rows),
                            ScalarArg::new(radius),
                        ),
                    );
                }
            }
        }

        // put the interior back into the dst
        let out_bytes = client.read_one(output_handle.binding());
        let out = u32::from_bytes(&out_bytes);
        if out.len() < numel {
            return Err(FilterError::DeviceTransfer(format!(
                "read back {} of {numel} samples",
                out.len()
            )));
        }

        let cols = src.cols();
        let radius = kind.radius();
        for row in interior {
            let start = row * cols;
            dst.as_slice_mut()[start + radius..start + cols - radius]
                .iter_mut()
                .zip(&out[start + radius..start + cols - radius])
                .for_each(|(d, &v)| *d = v.min(255) as u8);
        }

        Ok(dst)
    }

    fn name(&self) -> &'static str {
        "gpu-parallel"
    }

    fn worker_threads(&self) -> Option<usize> {
        None
    }
}
