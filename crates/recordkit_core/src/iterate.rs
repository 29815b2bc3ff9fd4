//! Paged iteration over a model's records.
//!
//! Records are pulled from the adapter one page at a time, so memory use is
//! bounded by the page size regardless of how many records match. Within a
//! page, items are handed to the worker strictly one after another, or all
//! at once when the iteration is concurrent. The next page is fetched only
//! after every item of the current page settled.

use crate::completion::Next;
use crate::config::IterateOptions;
use crate::error::{CoreError, CoreResult};
use crate::instance::Instance;
use crate::model::Model;
use futures::future::{Future, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use recordkit_adapter::{Filter, Order, ID_ATTRIBUTE};

/// What an iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IterationSummary {
    /// Items whose worker completed successfully.
    pub processed: usize,
    /// Pages fetched from the adapter.
    pub pages: usize,
}

/// Offset cursor for one iteration.
#[derive(Debug)]
struct IterationCursor {
    offset: usize,
    batch_size: usize,
    limit: Option<usize>,
    exhausted: bool,
}

impl IterationCursor {
    fn new(options: &IterateOptions) -> Self {
        Self {
            offset: 0,
            batch_size: options.batch_size,
            limit: options.limit,
            exhausted: false,
        }
    }

    /// Size of the next page to request, or `None` when done.
    fn next_page_size(&self) -> Option<usize> {
        if self.exhausted {
            return None;
        }
        let size = match self.limit {
            Some(limit) => self.batch_size.min(limit.saturating_sub(self.offset)),
            None => self.batch_size,
        };
        (size > 0).then_some(size)
    }

    /// Records a fetched page. A short page means the data ran out.
    fn advance(&mut self, requested: usize, received: usize) {
        self.offset += received;
        if received < requested {
            self.exhausted = true;
        }
    }
}

fn worker_error(index: usize, err: CoreError) -> CoreError {
    match err.continuation_message() {
        Some(message) => CoreError::WorkerFailed { index, message },
        None => err,
    }
}

impl Model {
    /// Visits matching records page by page.
    ///
    /// `worker` receives each instance with its 0-based position in the
    /// overall sequence. Records are ordered by the filter, or by ascending
    /// id when it has no order. The filter's own skip and limit are
    /// replaced by the cursor.
    ///
    /// # Errors
    ///
    /// - `InvalidOptions` if the page size is zero
    /// - the first adapter or worker error; no further pages are fetched and
    ///   already processed items are not undone
    pub async fn iterate<W, Fut>(
        &self,
        options: IterateOptions,
        mut worker: W,
    ) -> CoreResult<IterationSummary>
    where
        W: FnMut(Instance, usize) -> Fut,
        Fut: Future<Output = CoreResult<()>>,
    {
        options.validate()?;
        let base = base_filter(&options.filter);
        let mut cursor = IterationCursor::new(&options);
        let mut summary = IterationSummary::default();

        while let Some(size) = cursor.next_page_size() {
            let page_filter = Filter {
                skip: cursor.offset,
                limit: Some(size),
                ..base.clone()
            };
            let mut page = match self.adapter().all(self.name(), &page_filter).await {
                Ok(page) => page,
                Err(err) => {
                    tracing::warn!(
                        model = %self.name(),
                        offset = cursor.offset,
                        error = %err,
                        "iteration aborted"
                    );
                    return Err(err.into());
                }
            };
            page.truncate(size);
            let start = cursor.offset;
            cursor.advance(size, page.len());
            summary.pages += 1;
            tracing::trace!(
                model = %self.name(),
                offset = start,
                requested = size,
                received = page.len(),
                "fetched page"
            );

            let items = page
                .into_iter()
                .enumerate()
                .map(|(i, stored)| (start + i, Instance::load(self.clone(), stored)));

            let outcome = if options.concurrent {
                let mut running: FuturesUnordered<_> = items
                    .map(|(index, instance)| worker(instance, index).map(move |r| (index, r)))
                    .collect();
                let mut first_error = None;
                while let Some((index, result)) = running.next().await {
                    match result {
                        Ok(()) => summary.processed += 1,
                        Err(err) => {
                            first_error.get_or_insert_with(|| worker_error(index, err));
                        }
                    }
                }
                first_error.map_or(Ok(()), Err)
            } else {
                let mut outcome = Ok(());
                for (index, instance) in items {
                    if let Err(err) = worker(instance, index).await {
                        outcome = Err(worker_error(index, err));
                        break;
                    }
                    summary.processed += 1;
                }
                outcome
            };

            if let Err(err) = outcome {
                tracing::warn!(
                    model = %self.name(),
                    processed = summary.processed,
                    error = %err,
                    "iteration aborted"
                );
                return Err(err);
            }
        }

        tracing::debug!(
            model = %self.name(),
            processed = summary.processed,
            pages = summary.pages,
            "iteration finished"
        );
        Ok(summary)
    }

    /// Continuation form of [`Model::iterate`].
    ///
    /// The worker gets a [`Next`] that it must invoke once the item is
    /// handled; it may move it into spawned work. Failing or dropping it
    /// stops the iteration with `WorkerFailed`.
    ///
    /// # Errors
    ///
    /// As [`Model::iterate`].
    pub async fn iterate_next<W>(
        &self,
        options: IterateOptions,
        mut worker: W,
    ) -> CoreResult<IterationSummary>
    where
        W: FnMut(Instance, Next, usize),
    {
        self.iterate(options, move |instance, index| {
            let (next, pending) = Next::pair();
            worker(instance, next, index);
            pending
        })
        .await
    }
}

fn base_filter(filter: &Filter) -> Filter {
    let base = filter.unwindowed();
    if base.order.is_empty() {
        base.order_by(Order::asc(ID_ATTRIBUTE))
    } else {
        base
    }
}
