//! Index lifecycle: owns the published snapshot and the rebuild worker.
//!
//! # States
//!
//! | State | Snapshot published | Rebuild in flight |
//! |-------|--------------------|-------------------|
//! | [`IndexState::Building`] | no | yes or queued |
//! | [`IndexState::Ready`] | yes | no |
//! | [`IndexState::Stale`] | yes | yes |
//!
//! A single worker task performs rebuilds. Requests are numbered; the worker
//! reads the latest request number before it starts building and, once done,
//! reports that number as covered. Any requests that arrive during a build
//! therefore collapse into one follow-up build.
//!
//! Readers clone an `Arc<Snapshot>` out of a `watch` channel. Records and
//! index live in the same snapshot, so a reader sees either the old pair or
//! the new pair, never a mixture.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use crate::error::{LibraryError, Result};
use crate::extract::TextExtractor;
use crate::index::{DocumentIndex, IndexSettings};
use crate::models::DocumentRecord;
use crate::rebuild::{self, SkippedDocument};

/// One published, immutable (records, index) pair.
#[derive(Debug)]
pub struct Snapshot {
    pub generation: u64,
    pub built_at: DateTime<Utc>,
    pub records: Vec<DocumentRecord>,
    pub index: DocumentIndex,
    pub skipped: Vec<SkippedDocument>,
}

impl Snapshot {
    pub fn record(&self, id: &str) -> Option<&DocumentRecord> {
        self.records.iter().find(|r| r.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexState {
    Building,
    Ready,
    Stale,
}

/// Summary of one successful rebuild.
#[derive(Debug, Clone, Serialize)]
pub struct RebuildReport {
    pub generation: u64,
    pub documents: usize,
    pub indexed: usize,
    pub terms: usize,
    pub skipped: Vec<SkippedDocument>,
    pub elapsed_ms: u64,
}

/// Observable lifecycle status.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    pub state: IndexState,
    pub generation: Option<u64>,
    pub built_at: Option<String>,
    pub documents: usize,
    pub indexed: usize,
    pub last_error: Option<String>,
}

type Outcome = std::result::Result<RebuildReport, Arc<LibraryError>>;

#[derive(Debug, Clone, Default)]
struct RebuildStatus {
    /// Highest request number a finished rebuild has covered.
    covers: u64,
    outcome: Option<Outcome>,
    /// Set once the worker has exited; no further request will be covered.
    stopped: bool,
}

struct Inner {
    root: PathBuf,
    settings: IndexSettings,
    extractor: Arc<dyn TextExtractor>,
    snapshot: watch::Sender<Option<Arc<Snapshot>>>,
    status: watch::Sender<RebuildStatus>,
    requested: AtomicU64,
    in_flight: AtomicBool,
    shutting_down: AtomicBool,
    wake: Notify,
}

/// Owner of the process-wide index.
///
/// Created with [`IndexManager::start`], which spawns the rebuild worker and
/// queues the initial build, or with [`IndexManager::lazy`], which leaves the
/// initial build to the first [`IndexManager::wait_until_ready`] or rebuild
/// request. Must be created from within a tokio runtime.
pub struct IndexManager {
    inner: Arc<Inner>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl IndexManager {
    pub fn start(
        root: impl Into<PathBuf>,
        settings: IndexSettings,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        let manager = Self::lazy(root, settings, extractor);
        manager.request_rebuild();
        manager
    }

    pub fn lazy(
        root: impl Into<PathBuf>,
        settings: IndexSettings,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        let (snapshot, _) = watch::channel(None);
        let (status, _) = watch::channel(RebuildStatus::default());
        let inner = Arc::new(Inner {
            root: root.into(),
            settings,
            extractor,
            snapshot,
            status,
            requested: AtomicU64::new(0),
            in_flight: AtomicBool::new(false),
            shutting_down: AtomicBool::new(false),
            wake: Notify::new(),
        });

        let handle = tokio::spawn(run_worker(Arc::clone(&inner)));
        Self {
            inner,
            worker: Mutex::new(Some(handle)),
        }
    }

    /// Current snapshot, if any build has completed.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.snapshot.borrow().clone()
    }

    /// Current snapshot or [`LibraryError::IndexNotReady`].
    pub fn ready_snapshot(&self) -> Result<Arc<Snapshot>> {
        self.snapshot().ok_or(LibraryError::IndexNotReady)
    }

    pub fn state(&self) -> IndexState {
        let published = self.inner.snapshot.borrow().is_some();
        let busy = self.inner.in_flight.load(Ordering::SeqCst)
            || self.inner.requested.load(Ordering::SeqCst) > self.inner.status.borrow().covers;
        match (published, busy) {
            (false, _) => IndexState::Building,
            (true, true) => IndexState::Stale,
            (true, false) => IndexState::Ready,
        }
    }

    pub fn status(&self) -> IndexStatus {
        let snapshot = self.snapshot();
        let last_error = match &self.inner.status.borrow().outcome {
            Some(Err(e)) => Some(e.to_string()),
            _ => None,
        };
        IndexStatus {
            state: self.state(),
            generation: snapshot.as_ref().map(|s| s.generation),
            built_at: snapshot
                .as_ref()
                .map(|s| crate::models::format_ts_iso(s.built_at)),
            documents: snapshot.as_ref().map_or(0, |s| s.records.len()),
            indexed: snapshot.as_ref().map_or(0, |s| s.index.len()),
            last_error,
        }
    }

    /// Queue a rebuild without waiting for it. Returns the request number.
    ///
    /// The outcome is logged by the worker either way.
    pub fn request_rebuild(&self) -> u64 {
        let ticket = self.inner.requested.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.wake.notify_one();
        tracing::debug!(ticket, "rebuild requested");
        ticket
    }

    /// Queue a rebuild and wait for one that started after this call.
    pub async fn rebuild(&self) -> Result<RebuildReport> {
        if self.inner.shutting_down.load(Ordering::SeqCst) {
            return Err(LibraryError::WorkerStopped);
        }
        let mut rx = self.inner.status.subscribe();
        let ticket = self.request_rebuild();
        let status = rx
            .wait_for(|s| s.stopped || s.covers >= ticket)
            .await
            .map_err(|_| LibraryError::WorkerStopped)?;
        if status.covers < ticket {
            return Err(LibraryError::WorkerStopped);
        }
        match &status.outcome {
            Some(Ok(report)) => Ok(report.clone()),
            Some(Err(e)) => Err(LibraryError::RebuildFailed(Arc::clone(e))),
            None => Err(LibraryError::WorkerStopped),
        }
    }

    /// Wait for the initial build to finish.
    ///
    /// Returns the published snapshot, or the initial build's error when it
    /// failed and nothing has been published since.
    pub async fn wait_until_ready(&self) -> Result<Arc<Snapshot>> {
        if let Some(snapshot) = self.snapshot() {
            return Ok(snapshot);
        }
        let mut rx = self.inner.status.subscribe();
        // A lazily started manager builds on first use.
        if self
            .inner
            .requested
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.inner.wake.notify_one();
            tracing::debug!("initial build requested");
        }
        let status = rx
            .wait_for(|s| s.stopped || s.covers >= 1)
            .await
            .map_err(|_| LibraryError::WorkerStopped)?;
        if status.covers == 0 {
            return Err(LibraryError::WorkerStopped);
        }
        let failure = match &status.outcome {
            Some(Err(e)) => Some(Arc::clone(e)),
            _ => None,
        };
        drop(status);
        match (self.snapshot(), failure) {
            (Some(snapshot), _) => Ok(snapshot),
            (None, Some(e)) => Err(LibraryError::RebuildFailed(e)),
            (None, None) => Err(LibraryError::IndexNotReady),
        }
    }

    /// Stop the worker after it drains queued requests. Waiters on requests
    /// the worker never picked up get [`LibraryError::WorkerStopped`].
    pub async fn shutdown(&self) {
        self.inner.shutting_down.store(true, Ordering::SeqCst);
        self.inner.wake.notify_one();
        let handle = self
            .worker
            .lock()
            .map(|mut guard| guard.take())
            .unwrap_or_else(|poisoned| poisoned.into_inner().take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "rebuild worker terminated abnormally");
            }
        }
    }
}

impl Drop for IndexManager {
    fn drop(&mut self) {
        self.inner.shutting_down.store(true, Ordering::SeqCst);
        self.inner.wake.notify_one();
    }
}

async fn run_worker(inner: Arc<Inner>) {
    let mut covered = 0u64;
    loop {
        let target = inner.requested.load(Ordering::SeqCst);
        if target == covered {
            if inner.shutting_down.load(Ordering::SeqCst) {
                break;
            }
            inner.wake.notified().await;
            continue;
        }

        inner.in_flight.store(true, Ordering::SeqCst);
        let outcome = rebuild_once(&inner).await;
        covered = target;
        match &outcome {
            Ok(report) => tracing::info!(
                generation = report.generation,
                documents = report.documents,
                indexed = report.indexed,
                skipped = report.skipped.len(),
                elapsed_ms = report.elapsed_ms,
                "index published"
            ),
            Err(e) => tracing::error!(error = %e, "rebuild failed; keeping previous index"),
        }
        inner.in_flight.store(false, Ordering::SeqCst);
        inner.status.send_replace(RebuildStatus {
            covers: target,
            outcome: Some(outcome),
            stopped: false,
        });
    }
    inner.status.send_modify(|s| s.stopped = true);
    tracing::debug!("rebuild worker stopped");
}

async fn rebuild_once(inner: &Arc<Inner>) -> Outcome {
    let started = Instant::now();
    let job = Arc::clone(inner);
    let built = tokio::task::spawn_blocking(move || {
        rebuild::build(&job.root, job.extractor.as_ref(), job.settings)
    })
    .await;

    let output = match built {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(Arc::new(e)),
        Err(join) => return Err(Arc::new(LibraryError::Internal(join.to_string()))),
    };

    let generation = inner
        .snapshot
        .borrow()
        .as_ref()
        .map_or(1, |s| s.generation + 1);
    let report = RebuildReport {
        generation,
        documents: output.records.len() + output.skipped.len(),
        indexed: output.index.len(),
        terms: output.index.term_count(),
        skipped: output.skipped.clone(),
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    let snapshot = Snapshot {
        generation,
        built_at: Utc::now(),
        records: output.records,
        index: output.index,
        skipped: output.skipped,
    };
    inner.snapshot.send_replace(Some(Arc::new(snapshot)));
    Ok(report)
}
