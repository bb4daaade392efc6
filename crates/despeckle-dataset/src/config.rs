use std::path::{Path, PathBuf};

use despeckle_imgproc::{
    filter::DenoisePipeline,
    parallel::{ExecutionStrategy, ExecutorOptions},
};
use serde::{Deserialize, Serialize};

use crate::error::DatasetError;

/// Name of the output directory created next to the source images by default.
pub const DEFAULT_OUTPUT_DIR_NAME: &str = "processed_images";

/// Configuration of a denoising run.
///
/// Every field has a default, so a JSON configuration file only needs the
/// fields it changes.
///
/// # Example
///
/// ```
/// use despeckle_dataset::config::DenoiseConfig;
///
/// let config: DenoiseConfig = serde_json::from_str(
///     r#"{"manifest": "data/_annotations.coco.json", "strategy": "cpu-parallel"}"#,
/// ).unwrap();
///
/// assert_eq!(config.kernel_size, 5);
/// assert_eq!(config.sigma, 1.5);
/// assert_eq!(config.source_dir(), std::path::Path::new("data"));
/// assert_eq!(
///     config.output_dir(),
///     std::path::Path::new("data").join("processed_images"),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DenoiseConfig {
    /// Path of the COCO style manifest.
    pub manifest: Option<PathBuf>,
    /// Directory the manifest file names are relative to. Defaults to the
    /// directory of the manifest.
    pub source_dir: Option<PathBuf>,
    /// Root of the output tree. Defaults to `<source_dir>/processed_images`.
    pub output_dir: Option<PathBuf>,
    /// How each filter pass is executed.
    pub strategy: ExecutionStrategy,
    /// Side length of both filters. Must be odd.
    pub kernel_size: usize,
    /// Standard deviation of the gaussian. Must be > 0.
    pub sigma: f64,
    /// Worker threads for `cpu-parallel`. `None` uses one per core.
    pub num_threads: Option<usize>,
    /// Tile side length for `gpu-parallel`, at most 32.
    pub tile_size: u32,
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        let options = ExecutorOptions::default();
        Self {
            manifest: None,
            source_dir: None,
            output_dir: None,
            strategy: ExecutionStrategy::default(),
            kernel_size: 5,
            sigma: 1.5,
            num_threads: options.num_threads,
            tile_size: options.tile_size,
        }
    }
}

impl DenoiseConfig {
    /// Load a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// [`DatasetError::Config`] if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let config_error = |reason: String| DatasetError::Config {
            path: path.to_path_buf(),
            reason,
        };

        let json = std::fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        serde_json::from_str(&json).map_err(|e| config_error(e.to_string()))
    }

    /// The directory manifest file names are resolved against.
    pub fn source_dir(&self) -> PathBuf {
        if let Some(dir) = &self.source_dir {
            return dir.clone();
        }
        self.manifest
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// The root of the output tree.
    pub fn output_dir(&self) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.clone(),
            None => self.source_dir().join(DEFAULT_OUTPUT_DIR_NAME),
        }
    }

    /// The executor options of this configuration.
    pub fn executor_options(&self) -> ExecutorOptions {
        ExecutorOptions {
            num_threads: self.num_threads,
            tile_size: self.tile_size,
        }
    }

    /// Build the filter pipeline, checking the kernel size and sigma.
    pub fn pipeline(&self) -> Result<DenoisePipeline, DatasetError> {
        Ok(DenoisePipeline::new(self.kernel_size, self.sigma)?)
    }

    /// Check every parameter without touching the filesystem or a device.
    ///
    /// # Errors
    ///
    /// [`DatasetError::InvalidParameter`] on an even or zero kernel size, a
    /// sigma that is not a positive number, zero worker threads or a tile
    /// size outside `1..=32`.
    pub fn validate(&self) -> Result<(), DatasetError> {
        use despeckle_imgproc::{parallel::validate_tile_size, FilterError};

        self.pipeline()?;
        if self.num_threads == Some(0) {
            return Err(FilterError::InvalidThreadCount(0).into());
        }
        validate_tile_size(self.tile_size)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use despeckle_imgproc::FilterError;

    #[test]
    fn defaults() -> Result<(), DatasetError> {
        let config = DenoiseConfig::default();
        assert_eq!(config.strategy, ExecutionStrategy::Serial);
        assert_eq!(config.kernel_size, 5);
        assert_eq!(config.sigma, 1.5);
        assert_eq!(config.num_threads, None);
        assert_eq!(config.tile_size, 16);
        config.validate()
    }

    #[test]
    fn output_dir_resolution() {
        let mut config = DenoiseConfig {
            manifest: Some(PathBuf::from("/data/sar/_annotations.coco.json")),
            ..Default::default()
        };
        assert_eq!(config.source_dir(), PathBuf::from("/data/sar"));
        assert_eq!(
            config.output_dir(),
            PathBuf::from("/data/sar/processed_images")
        );

        config.source_dir = Some(PathBuf::from("/images"));
        assert_eq!(config.output_dir(), PathBuf::from("/images/processed_images"));

        config.output_dir = Some(PathBuf::from("/out"));
        assert_eq!(config.output_dir(), PathBuf::from("/out"));
    }

    #[test]
    fn bare_manifest_name_resolves_to_current_dir() {
        let config = DenoiseConfig {
            manifest: Some(PathBuf::from("manifest.json")),
            ..Default::default()
        };
        assert_eq!(config.source_dir(), PathBuf::new());
        assert_eq!(config.output_dir(), PathBuf::from("processed_images"));
    }

    #[test]
    fn validate_rejects_invalid_parameters() {
        let cases = [
            (
                DenoiseConfig {
                    kernel_size: 4,
                    ..Default::default()
                },
                FilterError::InvalidKernelSize(4),
            ),
            (
                DenoiseConfig {
                    sigma: 0.0,
                    ..Default::default()
                },
                FilterError::InvalidSigma(0.0),
            ),
            (
                DenoiseConfig {
                    num_threads: Some(0),
                    ..Default::default()
                },
                FilterError::InvalidThreadCount(0),
            ),
            (
                DenoiseConfig {
                    tile_size: 0,
                    ..Default::default()
                },
                FilterError::InvalidTileSize(0),
            ),
            (
                DenoiseConfig {
                    tile_size: 48,
                    ..Default::default()
                },
                FilterError::InvalidTileSize(48),
            ),
        ];

        for (config, expected) in cases {
            match config.validate() {
                Err(DatasetError::InvalidParameter(e)) => assert_eq!(e, expected),
                other => panic!("expected {expected:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn from_json_file() -> Result<(), Box<dyn std::error::Error>> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"strategy": "cpu-parallel", "num_threads": 2, "sigma": 2.0}"#,
        )?;

        let config = DenoiseConfig::from_json_file(&path)?;
        assert_eq!(config.strategy, ExecutionStrategy::CpuParallel);
        assert_eq!(config.num_threads, Some(2));
        assert_eq!(config.sigma, 2.0);
        assert_eq!(config.kernel_size, 5);
        Ok(())
    }

    #[test]
    fn from_json_file_errors() -> Result<(), Box<dyn std::error::Error>> {
        let tmp_dir = tempfile::tempdir()?;

        let res = DenoiseConfig::from_json_file(tmp_dir.path().join("missing.json"));
        assert!(matches!(res, Err(DatasetError::Config { .. })));

        let path = tmp_dir.path().join("config.json");
        std::fs::write(&path, r#"{"kernel": 5}"#)?;
        let res = DenoiseConfig::from_json_file(&path);
        assert!(matches!(res, Err(DatasetError::Config { .. })));
        Ok(())
    }
}
