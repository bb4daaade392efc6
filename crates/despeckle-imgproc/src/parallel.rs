use std::{fmt, str::FromStr};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use despeckle_image::GrayImage;

use crate::{
    error::FilterError,
    filter::{interior_rows, prepare_output, FilterKind},
};

/// Evaluates a filter pass over every interior pixel of an image.
///
/// Implementations must produce the same output for the same input and filter,
/// up to the tolerance documented on the implementation. The border of the
/// output is always a copy of the input border.
pub trait FilterExecutor: Send + Sync {
    /// Apply one filter pass and return the filtered image.
    ///
    /// # Arguments
    ///
    /// * `kind` - The filter to apply.
    /// * `src` - The source image. It is only read.
    ///
    /// # Returns
    ///
    /// A new image with the same size as `src`.
    fn apply(&self, kind: &FilterKind, src: &GrayImage) -> Result<GrayImage, FilterError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Number of cpu threads evaluating a pass, `None` when a device does the work.
    fn worker_threads(&self) -> Option<usize>;
}

/// Run sequentially on the current thread, in row-major order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialExecutor;

impl FilterExecutor for SerialExecutor {
    fn apply(&self, kind: &FilterKind, src: &GrayImage) -> Result<GrayImage, FilterError> {
        let mut dst = prepare_output(kind, src)?;
        let Some(rows) = interior_rows(src.size(), kind.radius()) else {
            return Ok(dst);
        };

        let cols = src.cols();
        let src_data = src.as_slice();
        dst.as_slice_mut()[rows.start * cols..rows.end * cols]
            .chunks_exact_mut(cols)
            .zip(rows)
            .for_each(|(dst_row, row)| kind.filter_row(src_data, cols, row, dst_row));

        Ok(dst)
    }

    fn name(&self) -> &'static str {
        "serial"
    }

    fn worker_threads(&self) -> Option<usize> {
        Some(1)
    }
}

/// Partition the interior rows across a fixed size rayon thread pool.
///
/// Each task writes only its own output rows and reads the shared source image.
/// The output is bit-identical to [`SerialExecutor`].
pub struct CpuParallelExecutor {
    pool: rayon::ThreadPool,
}

impl CpuParallelExecutor {
    /// Create the executor with its own thread pool.
    ///
    /// # Arguments
    ///
    /// * `num_threads` - The pool size, or `None` for one thread per core.
    pub fn new(num_threads: Option<usize>) -> Result<Self, FilterError> {
        if let Some(0) = num_threads {
            return Err(FilterError::InvalidThreadCount(0));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads.unwrap_or(0))
            .thread_name(|i| format!("despeckle-worker-{i}"))
            .build()
            .map_err(|e| FilterError::ThreadPool(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Number of worker threads in the pool.
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl fmt::Debug for CpuParallelExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CpuParallelExecutor")
            .field("num_threads", &self.num_threads())
            .finish()
    }
}

impl FilterExecutor for CpuParallelExecutor {
    fn apply(&self, kind: &FilterKind, src: &GrayImage) -> Result<GrayImage, FilterError> {
        let mut dst = prepare_output(kind, src)?;
        let Some(rows) = interior_rows(src.size(), kind.radius()) else {
            return Ok(dst);
        };

        let cols = src.cols();
        let src_data = src.as_slice();
        let first_row = rows.start;
        let interior = &mut dst.as_slice_mut()[rows.start * cols..rows.end * cols];

        // returns once every row is written
        self.pool.install(|| {
            interior
                .par_chunks_exact_mut(cols)
                .enumerate()
                .for_each(|(i, dst_row)| kind.filter_row(src_data, cols, first_row + i, dst_row));
        });

        Ok(dst)
    }

    fn name(&self) -> &'static str {
        "cpu-parallel"
    }

    fn worker_threads(&self) -> Option<usize> {
        Some(self.num_threads())
    }
}

/// Largest gpu tile side length. A tile of 32 x 32 units is the 1024 unit
/// workgroup limit of wgpu.
pub const MAX_TILE_SIZE: u32 = 32;

/// Check that a gpu tile side length is in `1..=MAX_TILE_SIZE`.
pub fn validate_tile_size(tile_size: u32) -> Result<(), FilterError> {
    if tile_size == 0 || tile_size > MAX_TILE_SIZE {
        return Err(FilterError::InvalidTileSize(tile_size));
    }
    Ok(())
}

/// Options used to build an executor from an [`ExecutionStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorOptions {
    /// Worker threads for the cpu strategy, `None` for one per core.
    pub num_threads: Option<usize>,
    /// Side length of a gpu tile, in compute units.
    pub tile_size: u32,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            num_threads: None,
            tile_size: 16,
        }
    }
}

/// Controls how a filter pass is scheduled over the pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionStrategy {
    /// Run sequentially on the current thread.
    #[default]
    Serial,

    /// Split the rows across a cpu thread pool.
    CpuParallel,

    /// One gpu compute unit per output pixel. Requires the `gpu` feature.
    GpuParallel,
}

impl ExecutionStrategy {
    /// Build the executor for this strategy.
    ///
    /// # Errors
    ///
    /// Invalid options, a thread pool that fails to build, or
    /// [`FilterError::GpuUnavailable`] when the `gpu` feature is disabled.
    pub fn build_executor(
        self,
        options: &ExecutorOptions,
    ) -> Result<Box<dyn FilterExecutor>, FilterError> {
        let executor: Box<dyn FilterExecutor> = match self {
            ExecutionStrategy::Serial => Box::new(SerialExecutor),
            ExecutionStrategy::CpuParallel => {
                Box::new(CpuParallelExecutor::new(options.num_threads)?)
            }
            ExecutionStrategy::GpuParallel => build_gpu_executor(options)?,
        };
        log::debug!("built {} executor", executor.name());
        Ok(executor)
    }
}

#[cfg(feature = "gpu")]
fn build_gpu_executor(options: &ExecutorOptions) -> Result<Box<dyn FilterExecutor>, FilterError> {
    Ok(Box::new(crate::gpu::GpuExecutor::new(options.tile_size)?))
}

#[cfg(not(feature = "gpu"))]
fn build_gpu_executor(options: &ExecutorOptions) -> Result<Box<dyn FilterExecutor>, FilterError> {
    validate_tile_size(options.tile_size)?;
    Err(FilterError::GpuUnavailable(
        "built without the `gpu` feature".to_string(),
    ))
}

impl fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionStrategy::Serial => "serial",
            ExecutionStrategy::CpuParallel => "cpu-parallel",
            ExecutionStrategy::GpuParallel => "gpu-parallel",
        };
        f.write_str(name)
    }
}

impl FromStr for ExecutionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "serial" | "sequential" => Ok(ExecutionStrategy::Serial),
            "cpu-parallel" | "cpu" => Ok(ExecutionStrategy::CpuParallel),
            "gpu-parallel" | "gpu" => Ok(ExecutionStrategy::GpuParallel),
            _ => Err(format!(
                "invalid strategy `{s}`, expected one of: serial, cpu-parallel, gpu-parallel"
            )),
        }
    }
}
