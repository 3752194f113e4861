use crate::command::ConversionCommand;
use crate::error::{ConversionError, ExportError};
use crate::progress::{ProgressSink, ProgressTracker};
use crate::recipe::RecipeOptions;
use crate::runner::ProcessRunner;
use crate::source::SourceImage;
use log::{error, info, warn};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A source that converted successfully and where its output was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub source: SourceImage,
    pub output: PathBuf,
}

#[derive(Debug)]
pub struct FailedConversion {
    pub source: SourceImage,
    pub error: ConversionError,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub total: usize,
    pub converted: Vec<Conversion>,
    pub failed: Vec<FailedConversion>,
    /// Set when the cancel flag stopped the batch before every image ran.
    pub cancelled: bool,
}

impl BatchReport {
    pub fn outputs(&self) -> Vec<PathBuf> {
        self.converted.iter().map(|c| c.output.clone()).collect()
    }
}

/// Converts a selection one image at a time with a fixed recipe.
pub struct BatchProcessor {
    recipe: RecipeOptions,
    temp_dir: PathBuf,
    cancel: Arc<AtomicBool>,
    dry_run: bool,
}

impl BatchProcessor {
    pub fn new(recipe: RecipeOptions, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            recipe,
            temp_dir: temp_dir.into(),
            cancel: Arc::new(AtomicBool::new(false)),
            dry_run: false,
        }
    }

    /// Share a cancel flag. It is checked before each image starts; a
    /// running conversion is never interrupted.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Leave the filesystem alone: the temp directory is not created. Pair
    /// with a runner that does not execute anything.
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Run the batch. `locate` resolves the converter and is only called
    /// when there is something to convert; its failure aborts the batch
    /// before any image runs. Individual conversion failures are recorded
    /// and the loop moves on.
    pub fn run<L>(
        &self,
        images: &[SourceImage],
        locate: L,
        runner: &mut dyn ProcessRunner,
        progress: &mut dyn ProgressSink,
    ) -> Result<BatchReport, ExportError>
    where
        L: FnOnce() -> Result<PathBuf, ExportError>,
    {
        let mut report = BatchReport {
            total: images.len(),
            ..Default::default()
        };

        if images.is_empty() {
            info!("No images selected, nothing to convert");
            return Ok(report);
        }

        let executable = locate().map_err(|e| {
            error!("Conversion aborted: {}", e);
            e
        })?;

        if !self.dry_run {
            fs::create_dir_all(&self.temp_dir).map_err(|source| ExportError::TempDir {
                path: self.temp_dir.clone(),
                source,
            })?;
        }

        info!(
            "Converting {} image(s) with {} [{}]",
            images.len(),
            executable.display(),
            self.recipe.argument_string()
        );

        let mut tracker = ProgressTracker::new(progress, images.len());

        for (index, image) in images.iter().enumerate() {
            if self.cancel.load(Ordering::SeqCst) {
                warn!(
                    "Conversion cancelled, {} of {} image(s) not started",
                    images.len() - index,
                    images.len()
                );
                report.cancelled = true;
                break;
            }

            let command = ConversionCommand::new(&executable, &self.recipe, image, &self.temp_dir);

            match runner.run(&command) {
                Ok(()) => {
                    info!("Converted {} -> {}", image.filename(), command.output.display());
                    report.converted.push(Conversion {
                        source: image.clone(),
                        output: command.output,
                    });
                }
                Err(error) => {
                    warn!("Skipping {}: {}", image.filename(), error);
                    report.failed.push(FailedConversion {
                        source: image.clone(),
                        error,
                    });
                }
            }

            tracker.advance(&image.filename());
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use std::cell::Cell;
    use std::path::Path;

    /// Fails the conversions whose 1-based position is listed.
    struct ScriptedRunner {
        fail_on: Vec<usize>,
        calls: Vec<ConversionCommand>,
    }

    impl ScriptedRunner {
        fn failing_on(fail_on: &[usize]) -> Self {
            Self {
                fail_on: fail_on.to_vec(),
                calls: Vec::new(),
            }
        }
    }

    impl ProcessRunner for ScriptedRunner {
        fn run(&mut self, command: &ConversionCommand) -> Result<(), ConversionError> {
            self.calls.push(command.clone());
            if self.fail_on.contains(&self.calls.len()) {
                Err(ConversionError::ExitStatus(2))
            } else {
                Ok(())
            }
        }
    }

    #[derive(Default)]
    struct LastFraction(f64, usize);

    impl ProgressSink for LastFraction {
        fn report(&mut self, fraction: f64, _message: &str) {
            self.0 = fraction;
            self.1 += 1;
        }
    }

    fn images(names: &[&str]) -> Vec<SourceImage> {
        names
            .iter()
            .map(|n| SourceImage::new(Path::new("/photos").join(n)))
            .collect()
    }

    #[test]
    fn test_middle_failure_does_not_stop_batch() {
        let tmp = tempfile::tempdir().unwrap();
        let processor = BatchProcessor::new(RecipeOptions::default(), tmp.path());
        let mut runner = ScriptedRunner::failing_on(&[2]);
        let mut progress = LastFraction::default();

        let report = processor
            .run(
                &images(&["A.RAF", "B.RAF", "C.RAF"]),
                || Ok(PathBuf::from("rawji")),
                &mut runner,
                &mut progress,
            )
            .unwrap();

        assert_eq!(runner.calls.len(), 3);
        assert_eq!(
            report.outputs(),
            vec![tmp.path().join("A_rawji.jpg"), tmp.path().join("C_rawji.jpg")]
        );
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].source.filename(), "B.RAF");
        assert!(matches!(report.failed[0].error, ConversionError::ExitStatus(2)));
        assert!(!report.cancelled);
        assert_eq!(progress.1, 3);
        assert!((progress.0 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_selection_does_no_work() {
        let tmp = tempfile::tempdir().unwrap();
        let work = tmp.path().join("never-created");
        let processor = BatchProcessor::new(RecipeOptions::default(), &work);
        let mut runner = ScriptedRunner::failing_on(&[]);
        let mut progress = LastFraction::default();
        let located = Cell::new(false);

        let report = processor
            .run(
                &[],
                || {
                    located.set(true);
                    Ok(PathBuf::from("rawji"))
                },
                &mut runner,
                &mut progress,
            )
            .unwrap();

        assert!(!located.get());
        assert!(runner.calls.is_empty());
        assert_eq!(progress.1, 0);
        assert_eq!(report.total, 0);
        assert!(!work.exists());
    }

    #[test]
    fn test_missing_executable_aborts_before_any_image() {
        let tmp = tempfile::tempdir().unwrap();
        let processor = BatchProcessor::new(RecipeOptions::default(), tmp.path());
        let mut runner = ScriptedRunner::failing_on(&[]);

        let err = processor
            .run(
                &images(&["A.RAF"]),
                || Err(ExportError::ExecutableNotFound("rawji".to_string())),
                &mut runner,
                &mut NoProgress,
            )
            .unwrap_err();

        assert!(matches!(err, ExportError::ExecutableNotFound(_)));
        assert!(runner.calls.is_empty());
    }

    #[test]
    fn test_cancel_flag_stops_before_next_image() {
        let tmp = tempfile::tempdir().unwrap();
        let cancel = Arc::new(AtomicBool::new(false));
        let processor = BatchProcessor::new(RecipeOptions::default(), tmp.path())
            .with_cancel_flag(Arc::clone(&cancel));

        struct CancelAfterFirst(Arc<AtomicBool>, usize);
        impl ProcessRunner for CancelAfterFirst {
            fn run(&mut self, _command: &ConversionCommand) -> Result<(), ConversionError> {
                self.1 += 1;
                self.0.store(true, Ordering::SeqCst);
                Ok(())
            }
        }

        let mut runner = CancelAfterFirst(Arc::clone(&cancel), 0);
        let report = processor
            .run(
                &images(&["A.RAF", "B.RAF", "C.RAF"]),
                || Ok(PathBuf::from("rawji")),
                &mut runner,
                &mut NoProgress,
            )
            .unwrap();

        assert_eq!(runner.1, 1);
        assert!(report.cancelled);
        assert_eq!(report.converted.len(), 1);
        assert!(report.failed.is_empty());
    }

    #[test]
    fn test_commands_carry_recipe_and_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let recipe = RecipeOptions {
            color: 2.0,
            ..Default::default()
        };
        let processor = BatchProcessor::new(recipe, tmp.path());
        let mut runner = ScriptedRunner::failing_on(&[]);

        processor
            .run(
                &images(&["DSCF7.RAF"]),
                || Ok(PathBuf::from("/usr/bin/rawji")),
                &mut runner,
                &mut NoProgress,
            )
            .unwrap();

        let call = &runner.calls[0];
        assert_eq!(call.executable, PathBuf::from("/usr/bin/rawji"));
        assert_eq!(call.arguments, vec!["--color".to_string(), "2".to_string()]);
        assert_eq!(call.input, PathBuf::from("/photos/DSCF7.RAF"));
        assert_eq!(call.output, tmp.path().join("DSCF7_rawji.jpg"));
    }

    #[test]
    fn test_dry_run_does_not_create_temp_dir() {
        use crate::runner::DryRunner;

        let tmp = tempfile::tempdir().unwrap();
        let work = tmp.path().join("work");
        let processor = BatchProcessor::new(RecipeOptions::default(), &work).dry_run();
        let mut runner = DryRunner::default();

        let report = processor
            .run(
                &images(&["A.RAF", "B.RAF"]),
                || Ok(PathBuf::from("rawji")),
                &mut runner,
                &mut NoProgress,
            )
            .unwrap();

        assert_eq!(runner.commands.len(), 2);
        assert_eq!(report.converted.len(), 2);
        assert!(!work.exists());
    }

    #[test]
    fn test_real_run_creates_temp_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let work = tmp.path().join("work");
        let processor = BatchProcessor::new(RecipeOptions::default(), &work);

        processor
            .run(
                &images(&["A.RAF"]),
                || Ok(PathBuf::from("rawji")),
                &mut ScriptedRunner::failing_on(&[]),
                &mut NoProgress,
            )
            .unwrap();

        assert!(work.is_dir());
    }
}
