use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use super::{DocumentSource, LoadError, SourceDocument, load_document};

type LoadFn = fn(&DocumentSource) -> Result<SourceDocument, LoadError>;

pub struct LoadOutcome {
    pub generation: u64,
    pub source: DocumentSource,
    pub result: Result<SourceDocument, LoadError>,
}

struct PendingLoad {
    generation: u64,
    source: DocumentSource,
    rx: Receiver<LoadOutcome>,
}

/// Runs document loads on background workers. Only the most recent request
/// is ever delivered; issuing a new one supersedes whatever is in flight.
/// Each request owns its channel, so dropping the previous receiver is what
/// discards a superseded result.
pub struct DocumentLoader {
    load: LoadFn,
    last_generation: u64,
    pending: Option<PendingLoad>,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::with_load_fn(load_document)
    }
}

impl DocumentLoader {
    pub fn with_load_fn(load: LoadFn) -> Self {
        Self {
            load,
            last_generation: 0,
            pending: None,
        }
    }

    pub fn request(&mut self, source: DocumentSource) -> u64 {
        self.last_generation += 1;
        let generation = self.last_generation;
        let load = self.load;
        let (tx, rx) = mpsc::channel();

        if let Some(previous) = self.pending.take() {
            tracing::debug!(
                superseded = previous.generation,
                generation,
                "superseding in-flight document load, its result will be dropped"
            );
        }

        tracing::info!(generation, source = %source.describe(), "loading document");
        let worker_source = source.clone();
        thread::spawn(move || {
            let result = load(&worker_source);
            // The receiver is gone when a newer request superseded this one.
            let _ = tx.send(LoadOutcome {
                generation,
                source: worker_source,
                result,
            });
        });

        self.pending = Some(PendingLoad {
            generation,
            source,
            rx,
        });
        generation
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn poll(&mut self) -> Option<LoadOutcome> {
        let pending = self.pending.take()?;
        match pending.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => {
                self.pending = Some(pending);
                None
            }
            Err(TryRecvError::Disconnected) => Some(LoadOutcome {
                generation: pending.generation,
                source: pending.source,
                result: Err(LoadError::WorkerDisconnected),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::document::ModuleEntry;

    fn fake_load(source: &DocumentSource) -> Result<SourceDocument, LoadError> {
        let DocumentSource::File(path) = source else {
            return Err(LoadError::Shape("unsupported".into()));
        };
        if path.as_os_str() == "slow" {
            thread::sleep(Duration::from_millis(150));
        }
        if path.as_os_str() == "broken" {
            return Err(LoadError::Shape("broken".into()));
        }

        Ok(SourceDocument {
            modules: vec![ModuleEntry {
                module: path.display().to_string(),
                declarations: Vec::new(),
            }],
        })
    }

    fn wait_for(loader: &mut DocumentLoader) -> LoadOutcome {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(outcome) = loader.poll() {
                return outcome;
            }
            assert!(Instant::now() < deadline, "load never completed");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn delivers_completed_load() {
        let mut loader = DocumentLoader::with_load_fn(fake_load);
        let generation = loader.request(DocumentSource::File(PathBuf::from("fast")));
        assert!(loader.is_loading());

        let outcome = wait_for(&mut loader);
        assert_eq!(outcome.generation, generation);
        assert_eq!(outcome.result.unwrap().modules[0].module, "fast");
        assert!(!loader.is_loading());
    }

    #[test]
    fn latest_request_wins() {
        let mut loader = DocumentLoader::with_load_fn(fake_load);
        let stale = loader.request(DocumentSource::File(PathBuf::from("slow")));
        let latest = loader.request(DocumentSource::File(PathBuf::from("fast")));
        assert!(latest > stale);

        let outcome = wait_for(&mut loader);
        assert_eq!(outcome.generation, latest);
        assert_eq!(outcome.result.unwrap().modules[0].module, "fast");

        thread::sleep(Duration::from_millis(250));
        assert!(loader.poll().is_none());
    }

    #[test]
    fn failures_are_reported_not_swallowed() {
        let mut loader = DocumentLoader::with_load_fn(fake_load);
        loader.request(DocumentSource::File(PathBuf::from("broken")));
        let outcome = wait_for(&mut loader);
        assert!(matches!(outcome.result, Err(LoadError::Shape(_))));
    }

    #[test]
    fn superseded_load_that_finishes_first_is_never_delivered() {
        let mut loader = DocumentLoader::with_load_fn(fake_load);
        let superseded = loader.request(DocumentSource::File(PathBuf::from("fast")));
        let latest = loader.request(DocumentSource::File(PathBuf::from("slow")));
        assert!(latest > superseded);

        let outcome = wait_for(&mut loader);
        assert_eq!(outcome.generation, latest);
        assert_eq!(outcome.result.unwrap().modules[0].module, "slow");
        assert!(!loader.is_loading());
    }
}
