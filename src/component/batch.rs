use crate::component::registration::{RegistrationOutcome, RegistrationPipeline};
use crate::component::storyboard_builder::{StoryboardBuilder, StoryboardOutcome};
use crate::error::{IngestError, Result};
use indicatif::ProgressBar;
use log::{error, warn};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

/// Outcome of one input path.
#[derive(Debug)]
pub struct BatchItem<T> {
    pub path: PathBuf,
    pub result: Result<T>,
}

/// Results of a running batch, in completion order.
///
/// Iterating blocks until the next item finishes and ends once every
/// dispatched item has reported. Dropping the run stops feeding new paths and
/// waits for the in-flight ones.
pub struct BatchRun<T> {
    receiver: Receiver<BatchItem<T>>,
    completed: Arc<AtomicUsize>,
    stop: Arc<AtomicBool>,
    aborted: Arc<AtomicBool>,
    feeder: Option<JoinHandle<()>>,
}

impl<T> BatchRun<T> {
    /// Items finished so far. Never decreases.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// True once an item failed with a run-fatal error and feeding stopped.
    #[must_use]
    pub fn aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

impl<T> Iterator for BatchRun<T> {
    type Item = BatchItem<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.receiver.recv().ok()
    }
}

impl<T> Drop for BatchRun<T> {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(feeder) = self.feeder.take()
            && feeder.join().is_err()
        {
            warn!("Batch feeder thread panicked");
        }
    }
}

/// Runs a per-file job over many paths on a fixed-size worker pool.
///
/// One file's failure never stops the others. A run-fatal error (see
/// [`IngestError::is_run_fatal`]) or the shutdown flag stops feeding new
/// paths; items already started always run to completion.
pub struct BatchOrchestrator {
    concurrency: usize,
    shutdown: Arc<AtomicBool>,
    progress: Option<ProgressBar>,
}

impl BatchOrchestrator {
    #[must_use]
    pub fn new(concurrency: usize, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            concurrency: concurrency.max(1),
            shutdown,
            progress: None,
        }
    }

    /// Ticks `bar` once per finished item.
    #[must_use]
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Starts `work` over `paths`. `paths` is pulled lazily, so it may still be
    /// producing (e.g. a channel) while the first results come in.
    pub fn run<I, T, F>(&self, paths: I, work: F) -> Result<BatchRun<T>>
    where
        I: IntoIterator<Item = PathBuf>,
        I::IntoIter: Send + 'static,
        T: Send + 'static,
        F: Fn(&Path) -> Result<T> + Send + Sync + 'static,
    {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .thread_name(|i| format!("ingest-worker-{i}"))
            .build()
            .map_err(|e| IngestError::Config(format!("cannot start worker pool: {e}")))?;

        let (sender, receiver) = mpsc::channel();
        let completed = Arc::new(AtomicUsize::new(0));
        let stop = Arc::new(AtomicBool::new(false));
        let aborted = Arc::new(AtomicBool::new(false));

        let feed_stop = Arc::clone(&stop);
        let shutdown = Arc::clone(&self.shutdown);
        let inputs = paths.into_iter().take_while(move |_| {
            !feed_stop.load(Ordering::SeqCst) && !shutdown.load(Ordering::SeqCst)
        });

        let worker_stop = Arc::clone(&stop);
        let worker_aborted = Arc::clone(&aborted);
        let worker_completed = Arc::clone(&completed);
        let progress = self.progress.clone();

        let feeder = thread::Builder::new()
            .name("batch-feeder".to_string())
            .spawn(move || {
                pool.install(|| {
                    inputs.par_bridge().for_each(|path| {
                        let result = work(&path);

                        if let Err(e) = &result {
                            error!("{}: {e}", path.display());
                            if e.is_run_fatal() {
                                worker_aborted.store(true, Ordering::SeqCst);
                                worker_stop.store(true, Ordering::SeqCst);
                            }
                        }

                        worker_completed.fetch_add(1, Ordering::SeqCst);
                        if let Some(bar) = &progress {
                            bar.inc(1);
                        }

                        // Nobody is listening any more.
                        if sender.send(BatchItem { path, result }).is_err() {
                            worker_stop.store(true, Ordering::SeqCst);
                        }
                    });
                });

                if let Some(bar) = &progress {
                    if worker_aborted.load(Ordering::SeqCst) {
                        bar.abandon();
                    } else {
                        bar.finish();
                    }
                }
            })
            .map_err(|e| IngestError::Config(format!("cannot start batch: {e}")))?;

        Ok(BatchRun {
            receiver,
            completed,
            stop,
            aborted,
            feeder: Some(feeder),
        })
    }

    pub fn register_all<I>(
        &self,
        pipeline: Arc<RegistrationPipeline>,
        paths: I,
    ) -> Result<BatchRun<RegistrationOutcome>>
    where
        I: IntoIterator<Item = PathBuf>,
        I::IntoIter: Send + 'static,
    {
        self.run(paths, move |path| pipeline.register(path))
    }

    pub fn storyboard_all<I>(
        &self,
        builder: Arc<StoryboardBuilder>,
        paths: I,
        force: bool,
    ) -> Result<BatchRun<StoryboardOutcome>>
    where
        I: IntoIterator<Item = PathBuf>,
        I::IntoIter: Send + 'static,
    {
        self.run(paths, move |path| builder.build(path, force))
    }
}
