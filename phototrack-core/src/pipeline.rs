//! Concurrent photo matching pipeline
//!
//! A fixed pool of worker threads drains a shared backlog of photo records,
//! positioning each against the shared read-only [`TrackStore`] and
//! partitioning the outcomes into matched and failed collections. The
//! calling thread acts as coordinator: it samples an atomic completion
//! counter on a short interval for advisory progress reporting, then joins
//! every worker before computing the final counts.
//!
//! The backlog is a channel filled completely before the pool starts, with
//! the sender dropped immediately after; a worker's `recv` therefore
//! returns `Err` exactly when no work remains, giving clean completion
//! semantics without polling for queue emptiness.
//!
//! Fault isolation is per record: a search error, a missing capture time or
//! a panic inside record processing marks that one record failed and the
//! worker moves on. The final counts account for every record that entered
//! the backlog regardless of scheduling.

use core::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use log::{debug, error, info, warn};
use serde::Serialize;

use crate::io::ThumbnailRenderer;
use crate::photo::PhotoRecord;
use crate::progress::ProgressSink;
use crate::track::TrackStore;

/// Interval at which the coordinator samples completion for progress
/// reporting.
const PROGRESS_POLL: Duration = Duration::from_millis(100);

/// Default matching tolerance in milliseconds.
pub const DEFAULT_TOLERANCE_MILLIS: i64 = 2000;

/// Worker pool parameters.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of worker threads draining the backlog
    pub workers: usize,
    /// Maximum distance from the query time to each bracketing fix
    pub tolerance_millis: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            workers: default_workers(),
            tolerance_millis: DEFAULT_TOLERANCE_MILLIS,
        }
    }
}

/// Available parallelism, falling back to one worker.
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Final counts for a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub matched_count: usize,
    pub failed_count: usize,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.matched_count + self.failed_count
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Georeferenced: [{}] photos and rejected: [{}] photos",
            self.matched_count, self.failed_count
        )
    }
}

/// The matched/failed partition produced by a pipeline run.
///
/// Membership and counts are deterministic for fixed inputs. Workers append
/// in scheduling order, so each partition is re-sorted by calibrated time
/// before it is returned, keeping logs and exports stable across runs.
#[derive(Debug)]
pub struct MatchReport {
    pub matched: Vec<PhotoRecord>,
    pub failed: Vec<PhotoRecord>,
    pub summary: Summary,
}

/// The worker pool, bound to one store and one set of collaborators.
pub struct MatchingPipeline<'a> {
    store: &'a TrackStore,
    config: PipelineConfig,
    thumbnails: &'a dyn ThumbnailRenderer,
    progress: &'a dyn ProgressSink,
}

impl<'a> MatchingPipeline<'a> {
    pub fn new(
        store: &'a TrackStore,
        config: PipelineConfig,
        thumbnails: &'a dyn ThumbnailRenderer,
        progress: &'a dyn ProgressSink,
    ) -> Self {
        MatchingPipeline {
            store,
            config,
            thumbnails,
            progress,
        }
    }

    /// Drain the given records through the worker pool.
    ///
    /// Records are pre-sorted by calibrated time before the pool starts;
    /// this keeps logs and exports readable but has no bearing on
    /// correctness.
    pub fn run(&self, mut photos: Vec<PhotoRecord>) -> MatchReport {
        photos.sort_by_key(|photo| photo.calibrated_time());

        let total = photos.len();
        let workers = self.config.workers.max(1);

        info!(
            "processing [{}] photos using [{}] workers with tolerance: [{}] milliseconds",
            total, workers, self.config.tolerance_millis
        );

        let (sender, receiver) = crossbeam::channel::unbounded();
        for photo in photos {
            sender.send(photo).expect("backlog receiver alive");
        }
        drop(sender);

        let matched = Mutex::new(Vec::new());
        let failed = Mutex::new(Vec::new());
        let processed = AtomicUsize::new(0);

        thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let receiver = receiver.clone();
                    let matched = &matched;
                    let failed = &failed;
                    let processed = &processed;
                    scope.spawn(move || {
                        while let Ok(mut photo) = receiver.recv() {
                            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                                self.process_record(&mut photo)
                            }));
                            match outcome {
                                Ok(true) => matched.lock().unwrap().push(photo),
                                Ok(false) => failed.lock().unwrap().push(photo),
                                Err(_) => {
                                    error!(
                                        "unexpected fault positioning photo: [{}]",
                                        photo.source().display()
                                    );
                                    failed.lock().unwrap().push(photo);
                                }
                            }
                            processed.fetch_add(1, Ordering::SeqCst);
                        }
                    })
                })
                .collect();

            // Coordinator: advisory progress until the pool drains. The
            // worker-liveness guard keeps this loop from spinning forever
            // should a worker die outside per-record isolation.
            while processed.load(Ordering::SeqCst) < total
                && handles.iter().any(|handle| !handle.is_finished())
            {
                let done = processed.load(Ordering::SeqCst);
                self.progress.progress(done as f64 / total as f64);
                thread::sleep(PROGRESS_POLL);
            }

            for handle in handles {
                if handle.join().is_err() {
                    error!("pipeline worker exited abnormally");
                }
            }
        });

        self.progress.progress(1.0);

        let mut matched = matched.into_inner().unwrap();
        let mut failed = failed.into_inner().unwrap();
        matched.sort_by_key(|p| (p.calibrated_time(), p.source().to_path_buf()));
        failed.sort_by_key(|p| (p.calibrated_time(), p.source().to_path_buf()));
        let summary = Summary {
            matched_count: matched.len(),
            failed_count: failed.len(),
        };

        info!("{}", summary);

        MatchReport {
            matched,
            failed,
            summary,
        }
    }

    /// Position one record. Returns whether it matched.
    fn process_record(&self, photo: &mut PhotoRecord) -> bool {
        let Some(query) = photo.calibrated_time() else {
            warn!(
                "photo has no calibrated capture time: [{}]",
                photo.source().display()
            );
            return false;
        };

        match self.store.locate(query, self.config.tolerance_millis) {
            Ok(Some(coordinates)) => {
                photo.resolve(coordinates);
                if let Some(target) = photo.thumbnail_target() {
                    // Best-effort: the coordinates are already determined,
                    // so neither a render error nor a render crash demotes
                    // the match
                    let rendered = panic::catch_unwind(AssertUnwindSafe(|| {
                        self.thumbnails.render(photo.source(), target)
                    }));
                    match rendered {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => warn!(
                            "failed to render thumbnail for [{}]: {}",
                            photo.source().display(),
                            e
                        ),
                        Err(_) => warn!(
                            "thumbnail renderer crashed for [{}]",
                            photo.source().display()
                        ),
                    }
                }
                true
            }
            Ok(None) => {
                debug!(
                    "did not find a match for photo: [{}]",
                    photo.source().display()
                );
                false
            }
            Err(e) => {
                error!(
                    "track search failed for photo [{}]: {}",
                    photo.source().display(),
                    e
                );
                false
            }
        }
    }
}
