//! Callback-style entry points.
//!
//! Every operation is an `async fn`; the `*_with` methods here spawn that
//! future on the current tokio runtime and report its outcome to a
//! callback exactly once. Instance operations hand the instance back to
//! the callback alongside the error, if any.
//!
//! All `*_with` methods call [`tokio::spawn`] and therefore panic when
//! used outside a tokio runtime.

use crate::config::{CreateOptions, IterateOptions, SaveOptions};
use crate::error::{CoreError, CoreResult, Rejected};
use crate::instance::Instance;
use crate::iterate::IterationSummary;
use crate::model::Model;
use crate::validation::ValidationErrors;
use futures::future::Future;
use recordkit_adapter::{Filter, RecordId};
use recordkit_value::{Record, Value};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Continuation handed to continuation-style hooks and workers.
///
/// Call [`Next::done`] or [`Next::fail`] exactly once. Dropping it without
/// calling either counts as a failure.
#[derive(Debug)]
pub struct Next {
    tx: oneshot::Sender<CoreResult<()>>,
}

impl Next {
    /// Creates a continuation and the future that resolves when it is used.
    pub(crate) fn pair() -> (Self, impl Future<Output = CoreResult<()>> + Send + 'static) {
        let (tx, rx) = oneshot::channel();
        let pending = async move {
            match rx.await {
                Ok(result) => result,
                Err(_) => Err(CoreError::ContinuationDropped),
            }
        };
        (Self { tx }, pending)
    }

    /// Resumes successfully.
    pub fn done(self) {
        self.finish(Ok(()));
    }

    /// Resumes with a failure.
    pub fn fail(self, message: impl Into<String>) {
        self.finish(Err(CoreError::aborted(message)));
    }

    /// Resumes with the given result.
    pub fn finish(self, result: CoreResult<()>) {
        // The waiting side is gone only if the operation was itself dropped.
        let _ = self.tx.send(result);
    }
}

/// Spawns `future` and passes its output to `callback`.
pub fn spawn_completion<Fut, F>(future: Fut, callback: F) -> JoinHandle<()>
where
    Fut: Future + Send + 'static,
    Fut::Output: Send + 'static,
    F: FnOnce(Fut::Output) + Send + 'static,
{
    tokio::spawn(async move { callback(future.await) })
}

fn report<F>(result: CoreResult<()>, instance: Instance, callback: F)
where
    F: FnOnce(Option<CoreError>, Instance),
{
    callback(result.err(), instance);
}

impl Model {
    /// Callback form of [`Model::create_with_options`].
    pub fn create_with<F>(
        &self,
        data: Record,
        options: CreateOptions,
        callback: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(Option<CoreError>, Instance) + Send + 'static,
    {
        let model = self.clone();
        spawn_completion(
            async move { model.create_with_options(data, options).await },
            move |result| match result {
                Ok(instance) => callback(None, instance),
                Err(rejected) => {
                    let (instance, error) = rejected.into_parts();
                    callback(Some(error), instance);
                }
            },
        )
    }

    /// Callback form of [`Model::create_many`].
    ///
    /// The callback receives `None` when every element succeeded, otherwise
    /// the per-element errors aligned with the input.
    pub fn create_many_with<F>(&self, data: Vec<Record>, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Option<Vec<Option<CoreError>>>, Vec<Instance>) + Send + 'static,
    {
        let model = self.clone();
        spawn_completion(async move { model.create_many(data).await }, move |outcome| {
            let failed = !outcome.is_ok();
            let (instances, errors) = outcome.into_parts();
            callback(failed.then_some(errors), instances);
        })
    }

    /// Callback form of [`Model::all`].
    pub fn all_with<F>(&self, filter: Filter, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(CoreResult<Vec<Instance>>) + Send + 'static,
    {
        let model = self.clone();
        spawn_completion(async move { model.all(&filter).await }, callback)
    }

    /// Callback form of [`Model::find`].
    pub fn find_with<F>(&self, id: RecordId, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(CoreResult<Option<Instance>>) + Send + 'static,
    {
        let model = self.clone();
        spawn_completion(async move { model.find(id).await }, callback)
    }

    /// Callback form of [`Model::find_one`].
    pub fn find_one_with<F>(&self, filter: Filter, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(CoreResult<Option<Instance>>) + Send + 'static,
    {
        let model = self.clone();
        spawn_completion(async move { model.find_one(&filter).await }, callback)
    }

    /// Callback form of [`Model::count`].
    pub fn count_with<F>(&self, filter: Filter, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(CoreResult<usize>) + Send + 'static,
    {
        let model = self.clone();
        spawn_completion(async move { model.count(&filter).await }, callback)
    }

    /// Callback form of [`Model::exists`].
    pub fn exists_with<F>(&self, id: RecordId, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(CoreResult<bool>) + Send + 'static,
    {
        let model = self.clone();
        spawn_completion(async move { model.exists(id).await }, callback)
    }

    /// Callback form of [`Model::destroy_all`].
    pub fn destroy_all_with<F>(&self, filter: Filter, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(CoreResult<()>) + Send + 'static,
    {
        let model = self.clone();
        spawn_completion(async move { model.destroy_all(&filter).await }, callback)
    }

    /// Callback form of [`Model::iterate_next`].
    ///
    /// `on_done` runs exactly once, after the last item settled or with the
    /// first error observed.
    pub fn iterate_with<W, D>(&self, options: IterateOptions, worker: W, on_done: D) -> JoinHandle<()>
    where
        W: FnMut(Instance, Next, usize) + Send + 'static,
        D: FnOnce(CoreResult<IterationSummary>) + Send + 'static,
    {
        let model = self.clone();
        spawn_completion(
            async move { model.iterate_next(options, worker).await },
            on_done,
        )
    }
}

impl Instance {
    /// Callback form of [`Instance::validate`].
    pub fn validate_with<F>(self, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(CoreResult<ValidationErrors>, Instance) + Send + 'static,
    {
        tokio::spawn(async move {
            let result = self.validate().await;
            callback(result, self);
        })
    }

    /// Callback form of [`Instance::is_valid`].
    ///
    /// The instance handed back carries the recorded `errors()`.
    pub fn is_valid_with<F>(self, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(CoreResult<bool>, Instance) + Send + 'static,
    {
        let mut instance = self;
        tokio::spawn(async move {
            let result = instance.is_valid().await;
            callback(result, instance);
        })
    }

    /// Callback form of [`Instance::save_with_options`].
    ///
    /// With `options.throws` unset, every outcome goes to the callback.
    /// With it set, a validation failure skips the callback and the
    /// returned handle resolves to `Err(Rejected)` instead.
    pub fn save_with<F>(self, options: SaveOptions, callback: F) -> JoinHandle<Result<(), Rejected>>
    where
        F: FnOnce(Option<CoreError>, Instance) + Send + 'static,
    {
        let mut instance = self;
        tokio::spawn(async move {
            let result = instance.save_with_options(options).await;
            match result {
                Err(error) if options.throws && error.is_validation() => {
                    Err(Rejected::new(instance, error))
                }
                result => {
                    report(result, instance, callback);
                    Ok(())
                }
            }
        })
    }

    /// Callback form of [`Instance::update_attribute`].
    pub fn update_attribute_with<F>(
        self,
        name: impl Into<String>,
        value: impl Into<Value>,
        callback: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(Option<CoreError>, Instance) + Send + 'static,
    {
        let mut instance = self;
        let name = name.into();
        let value = value.into();
        tokio::spawn(async move {
            let result = instance.update_attribute(&name, value).await;
            report(result, instance, callback);
        })
    }

    /// Callback form of [`Instance::update_attributes`].
    pub fn update_attributes_with<F>(self, data: Record, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Option<CoreError>, Instance) + Send + 'static,
    {
        let mut instance = self;
        tokio::spawn(async move {
            let result = instance.update_attributes(data).await;
            report(result, instance, callback);
        })
    }

    /// Callback form of [`Instance::destroy`].
    pub fn destroy_with<F>(self, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Option<CoreError>, Instance) + Send + 'static,
    {
        let mut instance = self;
        tokio::spawn(async move {
            let result = instance.destroy().await;
            report(result, instance, callback);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Property, PropertyKind};
    use recordkit_adapter::MemoryAdapter;
    use recordkit_value::record;
    use std::sync::Arc;

    fn person() -> Model {
        Model::new(
            "Person",
            vec![Property::new("name", PropertyKind::String)],
            Arc::new(MemoryAdapter::new()),
        )
    }

    #[tokio::test]
    async fn next_done_and_fail() {
        let (next, pending) = Next::pair();
        next.done();
        assert!(pending.await.is_ok());

        let (next, pending) = Next::pair();
        next.fail("boom");
        assert_eq!(pending.await.unwrap_err().to_string(), "aborted: boom");

        let (next, pending) = Next::pair();
        drop(next);
        assert!(matches!(
            pending.await.unwrap_err(),
            CoreError::ContinuationDropped
        ));
    }

    #[tokio::test]
    async fn spawn_completion_delivers_output() {
        let (tx, rx) = oneshot::channel();
        spawn_completion(async { 41 + 1 }, move |n| tx.send(n).unwrap())
            .await
            .unwrap();
        assert_eq!(rx.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn create_with_reports_instance() {
        let model = person();
        let (tx, rx) = oneshot::channel();
        model.create_with(
            record! { "name" => "Ann" },
            CreateOptions::new(),
            move |err, instance| {
                tx.send((err.is_none(), instance.id())).unwrap();
            },
        );
        let (ok, id) = rx.await.unwrap();
        assert!(ok);
        assert!(id.is_some());
    }

    #[tokio::test]
    async fn create_with_honors_options() {
        let model = person();
        model.validates_presence_of("name");

        let (tx, rx) = oneshot::channel();
        model.create_with(record! {}, CreateOptions::new(), move |err, instance| {
            tx.send((err.map(|e| e.is_validation()), instance.is_new_record()))
                .unwrap();
        });
        assert_eq!(rx.await.unwrap(), (Some(true), true));

        let (tx, rx) = oneshot::channel();
        model.create_with(
            record! {},
            CreateOptions::new().validate(false),
            move |err, instance| {
                tx.send((err.is_none(), instance.is_new_record())).unwrap();
            },
        );
        assert_eq!(rx.await.unwrap(), (true, false));
    }

    #[tokio::test]
    async fn validation_callbacks_hand_back_instance() {
        let model = person();
        model.validates_presence_of("name");

        let (tx, rx) = oneshot::channel();
        model
            .new_instance(record! {})
            .validate_with(move |result, instance| {
                tx.send((result.unwrap(), instance.errors().is_none()))
                    .unwrap();
            });
        let (errors, untouched) = rx.await.unwrap();
        assert_eq!(errors.get("name"), ["can't be blank"]);
        assert!(untouched);

        let (tx, rx) = oneshot::channel();
        model
            .new_instance(record! {})
            .is_valid_with(move |result, instance| {
                tx.send((result.unwrap(), instance)).unwrap();
            });
        let (valid, instance) = rx.await.unwrap();
        assert!(!valid);
        assert!(instance.errors().unwrap().contains("name"));
    }

    #[tokio::test]
    async fn save_with_routes_validation_errors() {
        let model = person();
        model.validates_presence_of("name");

        let (tx, rx) = oneshot::channel();
        let handle = model
            .new_instance(record! {})
            .save_with(SaveOptions::new(), move |err, _| {
                tx.send(err.map(|e| e.is_validation())).unwrap();
            });
        assert!(handle.await.unwrap().is_ok());
        assert_eq!(rx.await.unwrap(), Some(true));

        let handle = model
            .new_instance(record! {})
            .save_with(SaveOptions::new().throws(true), |_, _| {
                panic!("callback must be skipped");
            });
        let rejected = handle.await.unwrap().unwrap_err();
        assert!(rejected.error.is_validation());
        assert!(rejected.instance.is_new_record());
    }
}
