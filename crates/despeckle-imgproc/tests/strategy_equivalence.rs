use rand::{rngs::StdRng, Rng, SeedableRng};

use despeckle_image::GrayImage;
use despeckle_imgproc::{
    filter::{DenoisePipeline, FilterKind},
    parallel::{
        CpuParallelExecutor, ExecutionStrategy, ExecutorOptions, FilterExecutor, SerialExecutor,
    },
    FilterError,
};

fn random_image(rng: &mut StdRng, cols: usize, rows: usize) -> GrayImage {
    let data = (0..cols * rows).map(|_| rng.random::<u8>()).collect();
    GrayImage::new([cols, rows].into(), data).unwrap()
}

fn checkerboard(cols: usize, rows: usize) -> GrayImage {
    let data = (0..rows)
        .flat_map(|r| (0..cols).map(move |c| if (r + c) % 2 == 0 { 255 } else { 0 }))
        .collect();
    GrayImage::new([cols, rows].into(), data).unwrap()
}

fn executors() -> Vec<Box<dyn FilterExecutor>> {
    let mut executors: Vec<Box<dyn FilterExecutor>> = vec![Box::new(SerialExecutor)];
    for num_threads in [1, 2, 3, 8] {
        executors.push(Box::new(CpuParallelExecutor::new(Some(num_threads)).unwrap()));
    }
    executors
}

#[test]
fn serial_and_cpu_parallel_are_identical() -> Result<(), FilterError> {
    let mut rng = StdRng::seed_from_u64(42);
    let executors = executors();

    for (cols, rows) in [(1, 1), (4, 4), (5, 5), (6, 17), (64, 48), (101, 7)] {
        let src = random_image(&mut rng, cols, rows);
        for kind in [
            FilterKind::gaussian(3, 0.8)?,
            FilterKind::gaussian(5, 1.5)?,
            FilterKind::local_mean(3)?,
            FilterKind::local_mean(5)?,
        ] {
            let expected = SerialExecutor.apply(&kind, &src)?;
            for executor in &executors {
                let result = executor.apply(&kind, &src)?;
                assert_eq!(
                    result,
                    expected,
                    "{} with {} on {cols}x{rows}",
                    kind.name(),
                    executor.name()
                );
            }
        }
    }
    Ok(())
}

#[test]
fn pipeline_identical_across_cpu_strategies() -> Result<(), FilterError> {
    let mut rng = StdRng::seed_from_u64(7);
    let src = random_image(&mut rng, 80, 60);
    let pipeline = DenoisePipeline::new(5, 1.5)?;

    let options = ExecutorOptions {
        num_threads: Some(4),
        ..Default::default()
    };
    let serial = ExecutionStrategy::Serial.build_executor(&options)?;
    let parallel = ExecutionStrategy::CpuParallel.build_executor(&options)?;

    let expected = pipeline.run(serial.as_ref(), src.clone())?;
    let result = pipeline.run(parallel.as_ref(), src)?;
    assert_eq!(result, expected);
    Ok(())
}

#[test]
fn border_is_copied_by_every_executor() -> Result<(), FilterError> {
    let mut rng = StdRng::seed_from_u64(3);
    let src = random_image(&mut rng, 23, 19);
    let radius = 2;

    for executor in executors() {
        for kind in [FilterKind::gaussian(5, 1.5)?, FilterKind::local_mean(5)?] {
            let dst = executor.apply(&kind, &src)?;
            assert_eq!(dst.size(), src.size());
            for r in 0..src.rows() {
                for c in 0..src.cols() {
                    let is_border = r < radius
                        || r >= src.rows() - radius
                        || c < radius
                        || c >= src.cols() - radius;
                    if is_border {
                        assert_eq!(dst.get([r, c, 0]), src.get([r, c, 0]));
                    }
                }
            }
        }
    }
    Ok(())
}

#[test]
fn checkerboard_stays_in_range_and_blurs() -> Result<(), FilterError> {
    let src = checkerboard(32, 32);
    let kind = FilterKind::gaussian(5, 1.5)?;

    for executor in executors() {
        let dst = executor.apply(&kind, &src)?;
        // interior samples move towards the mean of the two levels
        for r in 2..30 {
            for c in 2..30 {
                let v = dst.get([r, c, 0]).copied().unwrap_or_default();
                assert!((100..=155).contains(&v), "pixel ({r}, {c}) = {v}");
            }
        }
    }
    Ok(())
}

#[test]
fn uniform_image_is_a_fixed_point() -> Result<(), FilterError> {
    let pipeline = DenoisePipeline::new(5, 1.5)?;
    for executor in executors() {
        for value in [0u8, 1, 128, 254, 255] {
            let src = GrayImage::from_size_val([10, 10].into(), value)?;
            let dst = pipeline.run(executor.as_ref(), src)?;
            assert!(dst.as_slice().iter().all(|&v| v == value));
        }
    }
    Ok(())
}
