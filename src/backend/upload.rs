use futures::future::{FutureExt, LocalBoxFuture};
use std::time::Duration;
use thiserror::Error;

use crate::backend::store::{ContentStore, Gateway, StoreError, StoredContent};
use crate::backend::{poll_slot, sleep};
use crate::config::UploadConfig;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UploadError {
    #[error("file is {size} bytes, the limit is {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("expected an image, got {mime_type:?}")]
    InvalidFileType { mime_type: String },
    #[error("another upload is still in progress")]
    UploadInProgress,
    #[error("upload failed: {0}")]
    UploadFailed(String),
}

impl From<StoreError> for UploadError {
    fn from(e: StoreError) -> Self {
        UploadError::UploadFailed(e.to_string())
    }
}

/// A file picked in the browser. `bytes` stays empty when the picker
/// skipped reading a file already known to be over the limit.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSelection {
    pub name: String,
    pub mime_type: String,
    pub reported_size: u64,
    pub bytes: Vec<u8>,
}

impl FileSelection {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), mime_type: mime_type.into(), reported_size: bytes.len() as u64, bytes }
    }

    /// Metadata only, for a file that was never read.
    pub fn unread(name: impl Into<String>, mime_type: impl Into<String>, reported_size: u64) -> Self {
        Self { name: name.into(), mime_type: mime_type.into(), reported_size, bytes: Vec::new() }
    }

    pub fn size(&self) -> u64 {
        self.reported_size.max(self.bytes.len() as u64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub name: String,
    pub hash: String,
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    Validating,
    Uploading,
    Completed,
    Rejected,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    pub images_only: bool,
}

impl UploadPolicy {
    pub fn general(limits: &UploadConfig) -> Self {
        Self { max_bytes: limits.max_file_bytes, images_only: false }
    }

    pub fn profile_photo(limits: &UploadConfig) -> Self {
        Self { max_bytes: limits.max_photo_bytes, images_only: true }
    }

    /// Size is checked before type.
    pub fn validate(&self, file: &FileSelection) -> Result<(), UploadError> {
        if file.size() > self.max_bytes {
            return Err(UploadError::FileTooLarge { size: file.size(), limit: self.max_bytes });
        }
        if self.images_only && !file.mime_type.starts_with("image/") {
            return Err(UploadError::InvalidFileType { mime_type: file.mime_type.clone() });
        }
        Ok(())
    }
}

const MAX_SIMULATED_PROGRESS: u8 = 99;

/// Percentage in [0, 100]. Only `reset` moves it down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress(u8);

impl Progress {
    pub fn value(self) -> u8 {
        self.0
    }

    /// Returns true if the value moved.
    pub fn advance(&mut self, step: u8, ceiling: u8) -> bool {
        let ceiling = ceiling.min(100);
        let next = self.0.saturating_add(step).min(ceiling).max(self.0);
        let moved = next != self.0;
        self.0 = next;
        moved
    }

    pub fn complete(&mut self) {
        self.0 = 100;
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    Phase(UploadPhase),
    Progress(u8),
    Completed(UploadedFile),
    Failed(UploadError),
}

struct InFlight {
    name: String,
    size: u64,
}

enum Wake {
    Transfer(Result<StoredContent, StoreError>),
    Tick,
    DisplayElapsed,
}

/// Single-slot upload state machine.
///
/// Progress shown while a transfer is in flight is simulated: it climbs by
/// `progress_step` every `tick_interval_ms` up to `progress_ceiling` and has
/// no relation to bytes actually sent. Only a finished transfer sets 100.
pub struct UploadPipeline<S> {
    store: S,
    gateway: Gateway,
    limits: UploadConfig,
    phase: UploadPhase,
    progress: Progress,
    files: Vec<UploadedFile>,
    current: Option<InFlight>,
    transfer: Option<LocalBoxFuture<'static, Result<StoredContent, StoreError>>>,
    ticker: Option<LocalBoxFuture<'static, ()>>,
    display: Option<LocalBoxFuture<'static, ()>>,
}

impl<S: ContentStore> UploadPipeline<S> {
    pub fn new(store: S, gateway: Gateway, limits: UploadConfig) -> Self {
        Self {
            store,
            gateway,
            limits,
            phase: UploadPhase::Idle,
            progress: Progress::default(),
            files: Vec::new(),
            current: None,
            transfer: None,
            ticker: None,
            display: None,
        }
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    pub fn progress(&self) -> u8 {
        self.progress.value()
    }

    /// Most recent first.
    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, UploadPhase::Validating | UploadPhase::Uploading)
    }

    /// Whether `next_events` has anything to wait on.
    pub fn is_active(&self) -> bool {
        self.transfer.is_some() || self.ticker.is_some() || self.display.is_some()
    }

    /// Validates `file` and hands it to the store. Returns the transitions
    /// taken; the transfer itself completes through `next_events`.
    pub fn begin(&mut self, file: FileSelection) -> Result<Vec<UploadEvent>, UploadError> {
        if self.is_busy() {
            tracing::warn!(name = %file.name, "upload rejected, another upload is in flight");
            return Err(UploadError::UploadInProgress);
        }

        // A new upload supersedes a finished one still on display.
        self.display = None;
        self.phase = UploadPhase::Validating;

        if let Err(e) = UploadPolicy::general(&self.limits).validate(&file) {
            tracing::info!(name = %file.name, error = %e, "upload rejected");
            self.phase = UploadPhase::Rejected;
            self.progress.reset();
            return Err(e);
        }

        tracing::info!(name = %file.name, size = file.size(), "upload started");
        self.phase = UploadPhase::Uploading;
        self.progress.reset();
        self.current = Some(InFlight { name: file.name.clone(), size: file.size() });
        self.transfer = Some(self.store.put(&file.name, file.bytes));
        self.ticker = Some(self.tick_timer());

        Ok(vec![
            UploadEvent::Phase(UploadPhase::Validating),
            UploadEvent::Phase(UploadPhase::Uploading),
            UploadEvent::Progress(0),
        ])
    }

    /// Waits for the next transfer completion, progress tick or end of the
    /// completion display window. Returns nothing when idle.
    pub async fn next_events(&mut self) -> Vec<UploadEvent> {
        if !self.is_active() {
            return Vec::new();
        }

        // Transfer first: completion overrides any tick that fired with it.
        let wake = tokio::select! {
            biased;
            result = poll_slot(&mut self.transfer) => Wake::Transfer(result),
            _ = poll_slot(&mut self.ticker) => Wake::Tick,
            _ = poll_slot(&mut self.display) => Wake::DisplayElapsed,
        };

        match wake {
            Wake::Transfer(result) => {
                self.transfer = None;
                self.ticker = None;
                let current = self.current.take();
                match (result, current) {
                    (Ok(stored), Some(current)) => self.finish(stored, current),
                    (Ok(_), None) => Vec::new(),
                    (Err(e), current) => self.fail(e, current),
                }
            }
            Wake::Tick => {
                self.ticker = None;
                let ceiling = self.simulated_ceiling();
                let mut events = Vec::new();
                if self.progress.advance(self.limits.progress_step, ceiling) {
                    events.push(UploadEvent::Progress(self.progress.value()));
                }
                if self.progress.value() < ceiling {
                    self.ticker = Some(self.tick_timer());
                }
                events
            }
            Wake::DisplayElapsed => {
                self.display = None;
                self.progress.reset();
                self.phase = UploadPhase::Idle;
                vec![UploadEvent::Progress(0), UploadEvent::Phase(UploadPhase::Idle)]
            }
        }
    }

    fn finish(&mut self, stored: StoredContent, current: InFlight) -> Vec<UploadEvent> {
        let file = UploadedFile {
            url: self.gateway.url_for(&stored.hash),
            name: current.name,
            hash: stored.hash,
            size: current.size,
        };
        tracing::info!(name = %file.name, hash = %file.hash, "upload complete");

        self.progress.complete();
        self.files.insert(0, file.clone());
        self.phase = UploadPhase::Completed;
        self.display = Some(sleep(Duration::from_millis(self.limits.completion_display_ms)).boxed_local());

        vec![
            UploadEvent::Progress(100),
            UploadEvent::Phase(UploadPhase::Completed),
            UploadEvent::Completed(file),
        ]
    }

    fn fail(&mut self, e: StoreError, current: Option<InFlight>) -> Vec<UploadEvent> {
        let name = current.map(|c| c.name).unwrap_or_default();
        tracing::error!(%name, error = %e, "upload failed");

        self.progress.reset();
        self.phase = UploadPhase::Failed;

        vec![
            UploadEvent::Progress(0),
            UploadEvent::Phase(UploadPhase::Failed),
            UploadEvent::Failed(e.into()),
        ]
    }

    /// 100 is reserved for a finished transfer.
    fn simulated_ceiling(&self) -> u8 {
        self.limits.progress_ceiling.min(MAX_SIMULATED_PROGRESS)
    }

    fn tick_timer(&self) -> LocalBoxFuture<'static, ()> {
        sleep(Duration::from_millis(self.limits.tick_interval_ms)).boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::store::MemoryStore;
    use futures::future;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tokio::sync::oneshot;

    const GATEWAY: &str = "https://gateway.test/ipfs";

    /// Store whose `put` resolves only when the test says so.
    #[derive(Clone, Default)]
    struct ManualStore {
        pending: Rc<RefCell<Vec<oneshot::Sender<Result<StoredContent, StoreError>>>>>,
    }

    impl ManualStore {
        fn resolve(&self, result: Result<StoredContent, StoreError>) {
            let tx = self.pending.borrow_mut().remove(0);
            let _ = tx.send(result);
        }
    }

    impl ContentStore for ManualStore {
        fn put(&self, _name: &str, _bytes: Vec<u8>) -> LocalBoxFuture<'static, Result<StoredContent, StoreError>> {
            let (tx, rx) = oneshot::channel();
            self.pending.borrow_mut().push(tx);
            async move {
                rx.await.unwrap_or_else(|_| Err(StoreError::Malformed("dropped".to_string())))
            }
            .boxed_local()
        }

        fn get(&self, hash: &str) -> LocalBoxFuture<'static, Result<Vec<u8>, StoreError>> {
            Box::pin(future::ready(Err(StoreError::NotFound(hash.to_string()))))
        }
    }

    fn file(name: &str, size: usize, mime_type: &str) -> FileSelection {
        FileSelection::new(name, mime_type, vec![7u8; size])
    }

    fn stored(hash: &str, size: u64) -> StoredContent {
        StoredContent { hash: hash.to_string(), size }
    }

    fn pipeline<S: ContentStore>(store: S) -> UploadPipeline<S> {
        UploadPipeline::new(store, Gateway::new(GATEWAY), UploadConfig::default())
    }

    /// Drives the pipeline until `done` matches one of the emitted events.
    async fn drive_until<S: ContentStore>(
        pipeline: &mut UploadPipeline<S>,
        seen: &mut Vec<UploadEvent>,
        done: impl Fn(&UploadEvent) -> bool,
    ) {
        loop {
            let events = pipeline.next_events().await;
            assert!(!events.is_empty() || pipeline.is_active(), "pipeline went idle early");
            let hit = events.iter().any(&done);
            seen.extend(events);
            if hit {
                return;
            }
        }
    }

    #[test]
    fn test_policy_limits() {
        let limits = UploadConfig::default();
        let general = UploadPolicy::general(&limits);
        assert!(general.validate(&file("a.bin", 10 * 1024 * 1024, "")).is_ok());
        assert_eq!(
            general.validate(&file("a.bin", 10 * 1024 * 1024 + 1, "")),
            Err(UploadError::FileTooLarge { size: 10 * 1024 * 1024 + 1, limit: 10 * 1024 * 1024 })
        );
        assert!(general.validate(&file("notes.txt", 10, "text/plain")).is_ok());

        let photo = UploadPolicy::profile_photo(&limits);
        assert!(photo.validate(&file("me.png", 1024, "image/png")).is_ok());
        assert_eq!(
            photo.validate(&file("notes.txt", 10, "text/plain")),
            Err(UploadError::InvalidFileType { mime_type: "text/plain".to_string() })
        );
        assert!(matches!(
            photo.validate(&file("huge.txt", 5 * 1024 * 1024 + 1, "text/plain")),
            Err(UploadError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn test_progress_is_bounded_and_monotonic() {
        let mut progress = Progress::default();
        let mut last = 0;
        for _ in 0..20 {
            progress.advance(10, 90);
            assert!(progress.value() >= last);
            assert!(progress.value() <= 90);
            last = progress.value();
        }
        assert_eq!(progress.value(), 90);
        assert!(!progress.advance(10, 90));

        progress.advance(250, 255);
        assert_eq!(progress.value(), 100);

        progress.complete();
        assert_eq!(progress.value(), 100);
        progress.reset();
        assert_eq!(progress.value(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_upload_prepends_record() {
        let store = ManualStore::default();
        let mut pipeline = pipeline(store.clone());

        pipeline.begin(file("first.txt", 3, "text/plain")).expect("Failed to begin");
        store.resolve(Ok(stored("bafyfirst", 3)));
        let mut seen = Vec::new();
        drive_until(&mut pipeline, &mut seen, |e| matches!(e, UploadEvent::Completed(_))).await;

        pipeline.begin(file("report.pdf", 1024, "application/pdf")).expect("Failed to begin");
        store.resolve(Ok(stored("bafy123", 1079)));
        let mut seen = Vec::new();
        drive_until(&mut pipeline, &mut seen, |e| matches!(e, UploadEvent::Completed(_))).await;

        let expected = UploadedFile {
            name: "report.pdf".to_string(),
            hash: "bafy123".to_string(),
            size: 1024,
            url: format!("{}/bafy123", GATEWAY),
        };
        assert_eq!(pipeline.files().len(), 2);
        assert_eq!(pipeline.files()[0], expected);
        assert_eq!(pipeline.files()[1].hash, "bafyfirst");
        assert!(seen.contains(&UploadEvent::Completed(expected)));
        assert_eq!(pipeline.phase(), UploadPhase::Completed);
        assert_eq!(pipeline.progress(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_ticks_then_completes_then_resets() {
        let store = ManualStore::default();
        let mut pipeline = pipeline(store.clone());
        pipeline.begin(file("slow.bin", 64, "")).unwrap();

        // 200ms ticks of 10 points, capped at 90.
        let mut seen = Vec::new();
        drive_until(&mut pipeline, &mut seen, |e| *e == UploadEvent::Progress(90)).await;
        let ticks: Vec<u8> = seen
            .iter()
            .filter_map(|e| if let UploadEvent::Progress(p) = e { Some(*p) } else { None })
            .collect();
        assert_eq!(ticks, vec![10, 20, 30, 40, 50, 60, 70, 80, 90]);

        // Stays at the ceiling while the transfer hangs.
        assert!(pipeline.transfer.is_some());
        assert!(pipeline.ticker.is_none());
        assert_eq!(pipeline.phase(), UploadPhase::Uploading);

        store.resolve(Ok(stored("bafyslow", 64)));
        let events = pipeline.next_events().await;
        assert_eq!(events[0], UploadEvent::Progress(100));
        assert_eq!(events[1], UploadEvent::Phase(UploadPhase::Completed));

        let start = tokio::time::Instant::now();
        let events = pipeline.next_events().await;
        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert_eq!(events, vec![UploadEvent::Progress(0), UploadEvent::Phase(UploadPhase::Idle)]);
        assert_eq!(pipeline.progress(), 0);
        assert!(!pipeline.is_active());
        assert_eq!(pipeline.files().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_never_decreases_before_reset() {
        let store = MemoryStore::new();
        let mut pipeline = pipeline(store);
        pipeline.begin(file("quick.txt", 10, "text/plain")).unwrap();

        let mut last = 0u8;
        let mut seen_reset = false;
        while pipeline.is_active() {
            for event in pipeline.next_events().await {
                if let UploadEvent::Progress(p) = event {
                    assert!(p <= 100);
                    if p == 0 && last == 100 {
                        seen_reset = true;
                    } else {
                        assert!(p >= last, "progress went from {} to {}", last, p);
                    }
                    last = p;
                }
            }
        }
        assert!(seen_reset);
        assert_eq!(pipeline.phase(), UploadPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_file_is_rejected() {
        let store = MemoryStore::new();
        let mut pipeline = pipeline(store.clone());

        let result = pipeline.begin(file("big.iso", 10 * 1024 * 1024 + 1, ""));
        assert!(matches!(result, Err(UploadError::FileTooLarge { .. })));
        assert_eq!(pipeline.phase(), UploadPhase::Rejected);
        assert!(pipeline.files().is_empty());
        assert!(!pipeline.is_active());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_reported_size_is_validated_without_bytes() {
        let limits = UploadConfig::default();
        let huge = FileSelection::unread("movie.mkv", "video/x-matroska", 2 * 1024 * 1024 * 1024);
        assert_eq!(huge.size(), 2 * 1024 * 1024 * 1024);
        assert_eq!(
            UploadPolicy::general(&limits).validate(&huge),
            Err(UploadError::FileTooLarge { size: 2 * 1024 * 1024 * 1024, limit: 10 * 1024 * 1024 })
        );

        let photo = FileSelection::unread("me.png", "image/png", 6 * 1024 * 1024);
        assert!(matches!(
            UploadPolicy::profile_photo(&limits).validate(&photo),
            Err(UploadError::FileTooLarge { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unread_oversized_file_never_reaches_store() {
        let store = ManualStore::default();
        let mut pipeline = pipeline(store.clone());

        let result = pipeline.begin(FileSelection::unread("big.iso", "", 10 * 1024 * 1024 + 1));
        assert!(matches!(result, Err(UploadError::FileTooLarge { .. })));
        assert_eq!(pipeline.phase(), UploadPhase::Rejected);
        assert!(store.pending.borrow().is_empty());
        assert!(!pipeline.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ceiling_above_hundred_stops_short_of_complete() {
        let store = ManualStore::default();
        let limits = UploadConfig { progress_ceiling: 150, progress_step: 40, ..UploadConfig::default() };
        let mut pipeline = UploadPipeline::new(store.clone(), Gateway::new(GATEWAY), limits);
        pipeline.begin(file("slow.bin", 8, "")).unwrap();

        let mut seen = Vec::new();
        drive_until(&mut pipeline, &mut seen, |e| *e == UploadEvent::Progress(99)).await;
        assert!(seen.contains(&UploadEvent::Progress(40)));
        assert!(seen.contains(&UploadEvent::Progress(80)));
        assert!(!seen.contains(&UploadEvent::Progress(100)));
        assert!(pipeline.ticker.is_none());
        assert_eq!(pipeline.phase(), UploadPhase::Uploading);

        store.resolve(Ok(stored("bafyslow", 8)));
        let events = pipeline.next_events().await;
        assert_eq!(events[0], UploadEvent::Progress(100));
        assert_eq!(events[1], UploadEvent::Phase(UploadPhase::Completed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_transfer_keeps_list() {
        let store = ManualStore::default();
        let mut pipeline = pipeline(store.clone());

        pipeline.begin(file("ok.txt", 3, "")).unwrap();
        store.resolve(Ok(stored("bafyok", 3)));
        let mut seen = Vec::new();
        drive_until(&mut pipeline, &mut seen, |e| matches!(e, UploadEvent::Completed(_))).await;

        pipeline.begin(file("doomed.txt", 3, "")).unwrap();
        let mut seen = Vec::new();
        drive_until(&mut pipeline, &mut seen, |e| *e == UploadEvent::Progress(30)).await;
        store.resolve(Err(StoreError::Status { status: 502, body: "bad gateway".to_string() }));
        let events = pipeline.next_events().await;

        assert_eq!(events[0], UploadEvent::Progress(0));
        assert_eq!(events[1], UploadEvent::Phase(UploadPhase::Failed));
        assert!(matches!(events[2], UploadEvent::Failed(UploadError::UploadFailed(_))));
        assert_eq!(pipeline.phase(), UploadPhase::Failed);
        assert_eq!(pipeline.progress(), 0);
        assert_eq!(pipeline.files().len(), 1);
        assert!(!pipeline.is_active());

        // Failure is not terminal.
        assert!(pipeline.begin(file("retry.txt", 3, "")).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_upload_while_uploading_is_rejected() {
        let store = ManualStore::default();
        let mut pipeline = pipeline(store.clone());
        pipeline.begin(file("one.txt", 3, "")).unwrap();

        assert_eq!(pipeline.begin(file("two.txt", 3, "")), Err(UploadError::UploadInProgress));
        assert_eq!(pipeline.phase(), UploadPhase::Uploading);
        assert_eq!(store.pending.borrow().len(), 1);

        store.resolve(Ok(stored("bafyone", 3)));
        let mut seen = Vec::new();
        drive_until(&mut pipeline, &mut seen, |e| matches!(e, UploadEvent::Completed(_))).await;
        assert_eq!(pipeline.files()[0].name, "one.txt");
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_upload_cancels_display_window() {
        let store = MemoryStore::new();
        let mut pipeline = pipeline(store);
        pipeline.begin(file("a.txt", 1, "")).unwrap();
        let mut seen = Vec::new();
        drive_until(&mut pipeline, &mut seen, |e| matches!(e, UploadEvent::Completed(_))).await;
        assert!(pipeline.display.is_some());

        let events = pipeline.begin(file("b.txt", 2, "")).unwrap();
        assert!(pipeline.display.is_none());
        assert_eq!(events.last(), Some(&UploadEvent::Progress(0)));
        assert_eq!(pipeline.phase(), UploadPhase::Uploading);
    }
}
