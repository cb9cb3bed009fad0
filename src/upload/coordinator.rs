use super::batch::{BatchSummary, UploadBatch};
use super::types::{BatchId, Collection, SelectedFile, UploadOutcome};
use crate::api::CollectionApi;
use crate::error::ApiError;
use crate::notify::Notifications;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use tokio::runtime::Handle;

pub const EMPTY_SELECTION_MESSAGE: &str = "Please select at least one file";

#[derive(Debug)]
struct UploadCompletion {
    batch: BatchId,
    outcome: UploadOutcome,
}

/// A batch whose last request just settled. The caller refreshes the
/// collection listing and clears the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedBatch {
    pub id: BatchId,
    pub summary: BatchSummary,
}

/// Fans a file selection out into one upload request per file and tallies the
/// results as they come back, in whatever order they arrive.
///
/// Requests run on the tokio runtime; their completions are only applied in
/// [`BatchCoordinator::poll`], which the UI calls once per frame.
pub struct BatchCoordinator<A> {
    api: Arc<A>,
    runtime: Handle,
    next_id: u64,
    batches: HashMap<BatchId, UploadBatch>,
    sender: Sender<UploadCompletion>,
    receiver: Receiver<UploadCompletion>,
}

impl<A: CollectionApi + 'static> BatchCoordinator<A> {
    pub fn new(api: Arc<A>, runtime: Handle) -> Self {
        let (sender, receiver) = channel();
        Self {
            api,
            runtime,
            next_id: 0,
            batches: HashMap::new(),
            sender,
            receiver,
        }
    }

    /// Starts a new batch. An empty selection is reported to the user and
    /// issues no requests.
    pub fn submit_batch(
        &mut self,
        files: Vec<SelectedFile>,
        collection: Collection,
        notifications: &mut Notifications,
    ) -> Option<BatchId> {
        let Some(total) = NonZeroUsize::new(files.len()) else {
            notifications.error(EMPTY_SELECTION_MESSAGE);
            return None;
        };

        let id = BatchId(self.next_id);
        self.next_id += 1;
        self.batches.insert(id, UploadBatch::new(collection, total));
        tracing::info!("Uploading {} file(s) to {} as {}", total, collection, id);

        for file in files {
            let api = Arc::clone(&self.api);
            let sender = self.sender.clone();
            let name = file.name.clone();
            // A panicking upload still has to settle its slot in the batch.
            let upload = self
                .runtime
                .spawn(async move { api.upload(collection, &file).await });
            self.runtime.spawn(async move {
                let result = upload.await.unwrap_or_else(|e| {
                    Err(ApiError::Transport(format!("upload task failed: {}", e)))
                });
                if let Err(e) = &result {
                    tracing::debug!("Upload of {} failed: {:?}", name, e);
                }
                let outcome = UploadOutcome::from_result(name, result);
                sender
                    .send(UploadCompletion { batch: id, outcome })
                    .unwrap_or_default();
            });
        }

        Some(id)
    }

    /// Applies every completion received since the last call. Each one emits
    /// its per-file notification; the one that settles a batch also emits the
    /// aggregate notifications and yields the batch in the returned list.
    pub fn poll(&mut self, notifications: &mut Notifications) -> Vec<CompletedBatch> {
        let mut completed = Vec::new();

        while let Ok(completion) = self.receiver.try_recv() {
            let Some(batch) = self.batches.get_mut(&completion.batch) else {
                tracing::warn!(
                    "Completion for unknown {} ({})",
                    completion.batch,
                    completion.outcome.name
                );
                continue;
            };

            let summary = batch.record(&completion.outcome);
            notifications.push(completion.outcome.notification());

            if let Some(summary) = summary {
                self.batches.remove(&completion.batch);
                tracing::info!(
                    "{} settled: {} of {} succeeded, {} failed",
                    completion.batch,
                    summary.succeeded,
                    summary.total,
                    summary.failed
                );
                for message in summary.notifications() {
                    notifications.push(message);
                }
                completed.push(CompletedBatch {
                    id: completion.batch,
                    summary,
                });
            }
        }

        completed
    }

    pub fn in_flight(&self) -> usize {
        self.batches.len()
    }

    /// `(settled, total)` summed over the pending batches for `collection`.
    pub fn progress(&self, collection: Collection) -> Option<(usize, usize)> {
        self.batches
            .values()
            .filter(|batch| batch.collection() == collection)
            .fold(None, |acc, batch| {
                let (settled, total) = acc.unwrap_or((0, 0));
                Some((settled + batch.settled(), total + batch.total()))
            })
    }
}
