use nr_core::{Article, Result};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::search::{SearchPipeline, SearchQuery};
use crate::sequence::RequestSequencer;

const SEARCH_KEY: &str = "search";

#[derive(Debug)]
pub struct SearchOutcome {
    pub query: SearchQuery,
    pub result: Result<Vec<Article>>,
}

/// Runs a search only once input has been quiet for the window. A newer
/// query cancels the scheduled run of an older one; a run already in flight
/// is left alone and its outcome dropped.
pub struct SearchDebouncer {
    pipeline: SearchPipeline,
    window: Duration,
    sequencer: RequestSequencer,
    pending: Mutex<Option<JoinHandle<()>>>,
    outcomes: Arc<watch::Sender<Option<Arc<SearchOutcome>>>>,
}

impl SearchDebouncer {
    pub fn new(pipeline: SearchPipeline, window: Duration) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            pipeline,
            window,
            sequencer: RequestSequencer::new(),
            pending: Mutex::new(None),
            outcomes: Arc::new(tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<SearchOutcome>>> {
        self.outcomes.subscribe()
    }

    /// Drops the scheduled run, if any.
    pub fn cancel(&self) {
        if let Some(handle) = self.pending.lock().unwrap_or_else(|e| e.into_inner()).take() {
            handle.abort();
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn submit(&self, query: SearchQuery) {
        self.cancel();
        let ticket = self.sequencer.issue(SEARCH_KEY);

        if query.is_blank() {
            self.outcomes.send_replace(Some(Arc::new(SearchOutcome { query, result: Ok(Vec::new()) })));
            return;
        }

        let pipeline = self.pipeline.clone();
        let sequencer = self.sequencer.clone();
        let outcomes = self.outcomes.clone();
        let window = self.window;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            // detached so that a later submit cannot abort the request itself
            tokio::spawn(async move {
                let result = pipeline.run_search(&query).await;
                if sequencer.is_current(&ticket) {
                    outcomes.send_replace(Some(Arc::new(SearchOutcome { query, result })));
                } else {
                    debug!("Dropping superseded search for {:?}", query.text);
                }
            });
        });
        *self.pending.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
