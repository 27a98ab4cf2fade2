//! Crawl scheduler
//!
//! A fixed pool of workers consuming one work queue. Workers are also the
//! producers: every link a visit turns up goes back through [`submit`], which
//! derives the page's filename and reserves it before queuing a task.
//!
//! A counter of queued and running tasks tells the scheduler when the frontier
//! is exhausted. It is incremented before a task is queued and decremented only
//! after the task's links have been submitted, so it cannot reach zero while
//! work is still being discovered.
//!
//! [`submit`]: CrawlScheduler::submit

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinSet;
use tracing::{debug, error, trace, warn};
use url::Url;

use crate::core::{CaptureTask, DifferError, Result};
use crate::crawl::registry::Reservation;
use crate::crawl::session::CrawlSession;
use crate::render::{BrowserLauncher, PageRenderer};

/// A page handed to a task, kept by the worker so it can be closed afterwards
type SharedPage = Arc<Mutex<Box<dyn PageRenderer>>>;

/// Counters for one scheduler run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// Tasks queued
    pub submitted: usize,
    /// Tasks that ran to completion
    pub completed: usize,
    /// Tasks that failed or panicked
    pub failed: usize,
}

enum Job {
    Capture(CaptureTask),
    Shutdown,
}

struct SchedulerState {
    session: Arc<CrawlSession>,
    launcher: Arc<dyn BrowserLauncher>,
    queue: mpsc::UnboundedSender<Job>,
    pending: AtomicUsize,
    idle: Notify,
    submitted: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// Bounded-concurrency driver for one session's crawl
pub struct CrawlScheduler {
    state: Arc<SchedulerState>,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<Job>>>,
    concurrency: usize,
}

impl CrawlScheduler {
    /// Create a scheduler for `session`, opening pages from `launcher`
    pub fn new(session: Arc<CrawlSession>, launcher: Arc<dyn BrowserLauncher>) -> Result<Self> {
        let concurrency = session.options().concurrency;
        if concurrency == 0 {
            return Err(DifferError::config("concurrency must be at least 1"));
        }

        let (queue, receiver) = mpsc::unbounded_channel();

        Ok(Self {
            state: Arc::new(SchedulerState {
                session,
                launcher,
                queue,
                pending: AtomicUsize::new(0),
                idle: Notify::new(),
                submitted: AtomicUsize::new(0),
                completed: AtomicUsize::new(0),
                failed: AtomicUsize::new(0),
            }),
            receiver: Arc::new(Mutex::new(receiver)),
            concurrency,
        })
    }

    /// Reserve and queue `url`. Returns whether a task was queued.
    pub fn submit(&self, url: Url) -> bool {
        self.state.submit(url)
    }

    /// Crawl from the session's root URL until no work is left.
    ///
    /// Workers and the launcher are shut down before this returns.
    pub async fn run(self) -> CrawlStats {
        let mut workers = JoinSet::new();
        for worker in 0..self.concurrency {
            workers.spawn(worker_loop(
                Arc::clone(&self.state),
                Arc::clone(&self.receiver),
                worker,
            ));
        }

        self.state.submit(self.state.session.root_url().clone());
        self.state.wait_idle().await;

        for _ in 0..self.concurrency {
            let _ = self.state.queue.send(Job::Shutdown);
        }
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "crawl worker stopped abnormally");
            }
        }

        if let Err(e) = self.state.launcher.shutdown().await {
            warn!(launcher = self.state.launcher.name(), error = %e, "failed to shut down browser");
        }

        self.state.stats()
    }
}

impl SchedulerState {
    fn submit(&self, mut url: Url) -> bool {
        url.set_fragment(None);

        let session = &self.session;
        let name = session.filename_deriver().derive(&url, session.root_path());

        match session.registry().reserve(
            &name.visit_key,
            name.artifact_filenames(),
            session.options().screenshot_limit,
        ) {
            Reservation::Reserved => {}
            Reservation::AlreadyVisited => {
                trace!(%url, "already visited");
                return false;
            }
            Reservation::LimitReached => {
                debug!(%url, "screenshot limit reached, not queuing");
                return false;
            }
        }

        let task = CaptureTask {
            url,
            base_filename: name.base,
            root_path: session.root_path().to_string(),
            storage_dir: session.storage_dir().to_path_buf(),
        };

        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.queue.send(Job::Capture(task)).is_err() {
            self.finish_task();
            return false;
        }
        self.submitted.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Visit one page and queue what it links to. Returns the number of new
    /// tasks queued.
    async fn run_task(self: Arc<Self>, page: SharedPage, task: CaptureTask) -> Result<usize> {
        let visit = {
            let mut page = page.lock().await;
            self.session
                .visitor()
                .visit(&mut **page, &task, self.session.bad_urls())
                .await?
        };

        let queued = visit
            .links
            .into_iter()
            .filter(|link| self.submit(link.clone()))
            .count();

        Ok(queued)
    }

    fn finish_task(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_one();
        }
    }

    async fn wait_idle(&self) {
        while self.pending.load(Ordering::SeqCst) > 0 {
            self.idle.notified().await;
        }
    }

    fn stats(&self) -> CrawlStats {
        CrawlStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

async fn worker_loop(
    state: Arc<SchedulerState>,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<Job>>>,
    worker: usize,
) {
    loop {
        let job = receiver.lock().await.recv().await;
        let task = match job {
            Some(Job::Capture(task)) => task,
            Some(Job::Shutdown) | None => break,
        };

        let url = task.url.clone();

        let page: SharedPage = match state.launcher.new_page(worker).await {
            Ok(page) => Arc::new(Mutex::new(page)),
            Err(e) => {
                state.failed.fetch_add(1, Ordering::Relaxed);
                error!(%url, worker, error = %e, "failed to open page");
                state.finish_task();
                continue;
            }
        };

        // Run each task on its own tokio task so a panic stays inside it
        let outcome = tokio::spawn(Arc::clone(&state).run_task(Arc::clone(&page), task)).await;

        // The page lock is released even when the task panicked
        if let Err(e) = page.lock().await.close().await {
            debug!(%url, worker, error = %e, "failed to close page");
        }

        match outcome {
            Ok(Ok(queued)) => {
                state.completed.fetch_add(1, Ordering::Relaxed);
                debug!(%url, worker, queued, "page done");
            }
            Ok(Err(e)) => {
                state.failed.fetch_add(1, Ordering::Relaxed);
                error!(%url, worker, error = %e, "error crawling page");
            }
            Err(e) => {
                state.failed.fetch_add(1, Ordering::Relaxed);
                error!(%url, worker, error = %e, "crawl task panicked");
            }
        }

        state.finish_task();
    }
}
