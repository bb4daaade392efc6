use std::path::PathBuf;

use argh::FromArgs;
use indicatif::{ProgressBar, ProgressStyle};

use despeckle::dataset::{DatasetProcessor, DenoiseConfig, Manifest};
use despeckle::imgproc::parallel::ExecutionStrategy;

#[derive(FromArgs, Debug)]
/// Denoise the images listed in a COCO style manifest.
struct Args {
    /// path to the manifest, e.g. `_annotations.coco.json`
    #[argh(option, short = 'm')]
    manifest: Option<PathBuf>,

    /// directory the manifest file names are relative to [default: manifest directory]
    #[argh(option, short = 's')]
    source_dir: Option<PathBuf>,

    /// directory to write the denoised images to [default: <source-dir>/processed_images]
    #[argh(option, short = 'o')]
    output_dir: Option<PathBuf>,

    /// execution strategy: serial, cpu-parallel or gpu-parallel [default: serial]
    #[argh(option)]
    strategy: Option<ExecutionStrategy>,

    /// side length of the filters, must be odd [default: 5]
    #[argh(option, short = 'k')]
    kernel_size: Option<usize>,

    /// standard deviation of the gaussian [default: 1.5]
    #[argh(option)]
    sigma: Option<f64>,

    /// number of threads for cpu-parallel [default: all cores]
    #[argh(option, short = 'n')]
    num_threads: Option<usize>,

    /// gpu tile side length, at most 32 [default: 16]
    #[argh(option)]
    tile_size: Option<u32>,

    /// json file with the same fields, overridden by the flags above
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<DenoiseConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => DenoiseConfig::from_json_file(path)?,
            None => DenoiseConfig::default(),
        };

        if let Some(manifest) = self.manifest {
            config.manifest = Some(manifest);
        }
        if let Some(source_dir) = self.source_dir {
            config.source_dir = Some(source_dir);
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = Some(output_dir);
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(kernel_size) = self.kernel_size {
            config.kernel_size = kernel_size;
        }
        if let Some(sigma) = self.sigma {
            config.sigma = sigma;
        }
        if let Some(num_threads) = self.num_threads {
            config.num_threads = Some(num_threads);
        }
        if let Some(tile_size) = self.tile_size {
            config.tile_size = tile_size;
        }

        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Args = argh::from_env();
    let config = args.into_config()?;

    let manifest_path = config
        .manifest
        .clone()
        .ok_or("a manifest is required, pass --manifest or set it in --config")?;

    // fail on bad parameters before reading anything
    let processor = DatasetProcessor::new(&config)?;
    let manifest = Manifest::load(&manifest_path)?;

    if manifest.is_empty() {
        println!("No images listed in {}", manifest_path.display());
    } else {
        println!(
            "Found {} images. Denoising with the {} executor into {}",
            manifest.len(),
            processor.executor_name(),
            processor.output_dir().display()
        );
        if let Some(num_threads) = processor.worker_threads() {
            println!("Processing with {num_threads} threads");
        }
    }

    // Create a progress bar
    let pb = ProgressBar::new(manifest.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>7}/{len:7} {percent:>3}% ({eta}) {per_sec}",
            )?
            .progress_chars("##>-"),
    );

    let stats = processor.run(&manifest, |stats| {
        pb.set_position(stats.completed() as u64);
    });
    pb.finish_and_clear();
    let stats = stats?;

    println!("{stats}");
    if stats.failed > 0 {
        log::warn!(
            "{} of {} images could not be processed, see the warnings above",
            stats.failed,
            stats.total
        );
    }

    Ok(())
}
