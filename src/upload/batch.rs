use super::types::{Collection, UploadOutcome};
use crate::notify::Message;
use std::num::NonZeroUsize;

/// Counters for one in-flight upload batch.
///
/// `settled == succeeded + failed` holds after every call to [`UploadBatch::record`],
/// and `settled` never exceeds `total`.
#[derive(Debug, Clone)]
pub struct UploadBatch {
    collection: Collection,
    total: usize,
    settled: usize,
    succeeded: usize,
    failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub collection: Collection,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl UploadBatch {
    pub fn new(collection: Collection, total: NonZeroUsize) -> Self {
        Self {
            collection,
            total: total.get(),
            settled: 0,
            succeeded: 0,
            failed: 0,
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn settled(&self) -> usize {
        self.settled
    }

    pub fn is_complete(&self) -> bool {
        self.settled == self.total
    }

    /// Counts one settled request. Returns the summary only for the completion
    /// that brings `settled` up to `total`.
    pub fn record(&mut self, outcome: &UploadOutcome) -> Option<BatchSummary> {
        if self.is_complete() {
            tracing::warn!(
                "Ignoring extra completion for {} in an already settled batch",
                outcome.name
            );
            return None;
        }

        self.settled += 1;
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        debug_assert_eq!(self.settled, self.succeeded + self.failed);

        if self.settled == self.total {
            Some(BatchSummary {
                collection: self.collection,
                total: self.total,
                succeeded: self.succeeded,
                failed: self.failed,
            })
        } else {
            None
        }
    }
}

impl BatchSummary {
    pub fn notifications(&self) -> Vec<Message> {
        let mut messages = Vec::new();
        if self.succeeded > 0 {
            messages.push(Message::success(format!(
                "{} file(s) uploaded successfully!",
                self.succeeded
            )));
        }
        if self.failed > 0 {
            messages.push(Message::error(format!(
                "{} file(s) failed to upload",
                self.failed
            )));
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    fn ok(name: &str) -> UploadOutcome {
        UploadOutcome::from_result(name.into(), Ok(()))
    }

    fn failed(name: &str) -> UploadOutcome {
        UploadOutcome::from_result(name.into(), Err(ApiError::Transport("reset".into())))
    }

    fn batch(total: usize) -> UploadBatch {
        UploadBatch::new(
            Collection::WorkspaceTemplates,
            NonZeroUsize::new(total).unwrap(),
        )
    }

    #[test]
    fn summary_fires_only_on_last_completion() {
        let mut batch = batch(3);

        assert_eq!(batch.record(&ok("a")), None);
        assert_eq!(batch.settled(), 1);
        assert_eq!(batch.record(&failed("b")), None);
        assert_eq!(batch.settled(), 2);

        let summary = batch.record(&failed("c")).unwrap();
        assert_eq!(
            summary,
            BatchSummary {
                collection: Collection::WorkspaceTemplates,
                total: 3,
                succeeded: 1,
                failed: 2,
            }
        );
        assert!(batch.is_complete());
    }

    #[test]
    fn settled_never_exceeds_total() {
        let mut batch = batch(1);
        assert!(batch.record(&ok("a")).is_some());
        assert_eq!(batch.record(&ok("a")), None);
        assert_eq!(batch.settled(), 1);
    }

    #[test]
    fn aggregate_messages_depend_on_counts() {
        let mixed = BatchSummary {
            collection: Collection::SharedResources,
            total: 3,
            succeeded: 1,
            failed: 2,
        };
        assert_eq!(
            mixed.notifications(),
            vec![
                Message::success("1 file(s) uploaded successfully!"),
                Message::error("2 file(s) failed to upload"),
            ]
        );

        let all_ok = BatchSummary {
            failed: 0,
            succeeded: 3,
            ..mixed
        };
        assert_eq!(
            all_ok.notifications(),
            vec![Message::success("3 file(s) uploaded successfully!")]
        );

        let all_failed = BatchSummary {
            failed: 3,
            succeeded: 0,
            ..mixed
        };
        assert_eq!(
            all_failed.notifications(),
            vec![Message::error("3 file(s) failed to upload")]
        );
    }
}
