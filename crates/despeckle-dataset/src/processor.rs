use std::{
    collections::HashSet,
    path::{Component, Path, PathBuf},
    time::Instant,
};

use despeckle_imgproc::{filter::DenoisePipeline, parallel::FilterExecutor};
use despeckle_io::{ensure_dir, read_image_any_gray8, write_image_png_gray8};

use crate::{
    config::DenoiseConfig,
    error::{DatasetError, EntryError},
    manifest::{Manifest, ManifestEntry},
    stats::RunStatistics,
};

/// Denoise every image listed in a manifest.
///
/// Images are handled one at a time in manifest order. Only the filter passes
/// run concurrently, as chosen by the execution strategy.
pub struct DatasetProcessor {
    pipeline: DenoisePipeline,
    executor: Box<dyn FilterExecutor>,
    source_dir: PathBuf,
    output_dir: PathBuf,
}

impl DatasetProcessor {
    /// Validate the configuration and build the executor.
    ///
    /// No image is read and no directory is created here.
    ///
    /// # Errors
    ///
    /// [`DatasetError::InvalidParameter`] if a parameter is invalid or the
    /// executor cannot be built.
    pub fn new(config: &DenoiseConfig) -> Result<Self, DatasetError> {
        config.validate()?;
        let pipeline = config.pipeline()?;
        let executor = config
            .strategy
            .build_executor(&config.executor_options())?;

        Ok(Self {
            pipeline,
            executor,
            source_dir: config.source_dir(),
            output_dir: config.output_dir(),
        })
    }

    /// The directory manifest file names are resolved against.
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// The root of the output tree.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Name of the executor running the filter passes.
    pub fn executor_name(&self) -> &'static str {
        self.executor.name()
    }

    /// Number of cpu threads running the filter passes, `None` on a gpu.
    pub fn worker_threads(&self) -> Option<usize> {
        self.executor.worker_threads()
    }

    /// Process every entry of the manifest.
    ///
    /// Entries that fail are logged and counted, and the run goes on with the
    /// next one.
    ///
    /// # Arguments
    ///
    /// * `manifest` - The images to process.
    /// * `on_progress` - Called after each entry with the running statistics.
    ///
    /// # Returns
    ///
    /// The final statistics.
    ///
    /// # Errors
    ///
    /// [`DatasetError::OutputDirectory`] if the output root cannot be created.
    pub fn run<F>(
        &self,
        manifest: &Manifest,
        mut on_progress: F,
    ) -> Result<RunStatistics, DatasetError>
    where
        F: FnMut(&RunStatistics),
    {
        let start = Instant::now();
        let mut stats = RunStatistics::new(manifest.len());

        ensure_dir(&self.output_dir).map_err(|source| DatasetError::OutputDirectory {
            path: self.output_dir.clone(),
            source,
        })?;

        log::info!(
            "denoising {} images from {} into {} with the {} executor",
            manifest.len(),
            self.source_dir.display(),
            self.output_dir.display(),
            self.executor.name()
        );

        // outputs written so far, a later entry may not overwrite them
        let mut written = HashSet::new();

        for (index, entry) in manifest.iter().enumerate() {
            let result = self.resolve_paths(entry).and_then(|(input_path, output_path)| {
                if written.contains(&output_path) {
                    return Err(EntryError::DuplicateOutput(output_path));
                }
                self.process_paths(&input_path, &output_path)?;
                Ok(output_path)
            });

            match result {
                Ok(output_path) => {
                    log::debug!("[{index}] wrote {}", output_path.display());
                    written.insert(output_path);
                    stats.record_processed();
                }
                Err(err) => {
                    log::warn!("[{index}] skipping {}: {err}", describe(entry));
                    stats.record_failed();
                }
            }
            stats.elapsed = start.elapsed();
            on_progress(&stats);
        }

        stats.elapsed = start.elapsed();
        log::info!("{stats}");
        Ok(stats)
    }

    /// Read, filter and write a single entry.
    ///
    /// The output mirrors the entry's relative path below the output root,
    /// file name included.
    ///
    /// # Returns
    ///
    /// The path of the written image.
    pub fn process_entry(&self, entry: &ManifestEntry) -> Result<PathBuf, EntryError> {
        let (input_path, output_path) = self.resolve_paths(entry)?;
        self.process_paths(&input_path, &output_path)?;
        Ok(output_path)
    }

    /// The source and output paths of an entry.
    fn resolve_paths(&self, entry: &ManifestEntry) -> Result<(PathBuf, PathBuf), EntryError> {
        let file_name = entry
            .file_name
            .as_deref()
            .ok_or(EntryError::MissingFileName)?;
        let relative = validate_relative_path(file_name)?;

        Ok((
            self.source_dir.join(&relative),
            self.output_dir.join(&relative),
        ))
    }

    fn process_paths(&self, input_path: &Path, output_path: &Path) -> Result<(), EntryError> {
        let image = read_image_any_gray8(input_path).map_err(|source| EntryError::Decode {
            path: input_path.to_path_buf(),
            source,
        })?;
        log::debug!("read {} ({})", input_path.display(), image.size());

        let denoised = self.pipeline.run(self.executor.as_ref(), image)?;

        if let Some(parent) = output_path.parent() {
            ensure_dir(parent).map_err(|source| EntryError::Directory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        write_image_png_gray8(output_path, &denoised).map_err(|source| EntryError::Encode {
            path: output_path.to_path_buf(),
            source,
        })
    }
}

fn describe(entry: &ManifestEntry) -> String {
    match (&entry.file_name, entry.id) {
        (Some(name), _) => name.clone(),
        (None, Some(id)) => format!("record with id {id}"),
        (None, None) => "record without id".to_string(),
    }
}

/// Accept only relative paths that stay below the directory they are joined to.
///
/// `.` components are dropped, so `./a.jpg` and `a.jpg` resolve to the same path.
fn validate_relative_path(file_name: &str) -> Result<PathBuf, EntryError> {
    let mut relative = PathBuf::new();
    for component in Path::new(file_name).components() {
        match component {
            Component::Normal(name) => relative.push(name),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(EntryError::InvalidPath(file_name.to_string()));
            }
        }
    }
    if relative.as_os_str().is_empty() {
        return Err(EntryError::InvalidPath(file_name.to_string()));
    }
    Ok(relative)
}
