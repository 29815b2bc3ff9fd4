//! Lifecycle hooks.
//!
//! Each model has one optional hook per [`HookSlot`]. Installing a hook
//! replaces the previous one. The dispatcher awaits the hook before the
//! surrounding operation continues.

use crate::completion::Next;
use crate::error::{CoreError, CoreResult};
use crate::instance::Instance;
use futures::future::{self, BoxFuture, FutureExt};
use std::fmt;
use std::sync::Arc;

/// Points in the instance lifecycle where a hook may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookSlot {
    /// Before validation and the adapter `create`.
    BeforeCreate,
    /// After a successful create.
    AfterCreate,
    /// Before the adapter write of a save.
    BeforeSave,
    /// After a successful save.
    AfterSave,
    /// Before the adapter `destroy`.
    BeforeDestroy,
    /// After a successful destroy.
    AfterDestroy,
}

impl HookSlot {
    /// Every slot, in lifecycle order.
    pub const ALL: [HookSlot; 6] = [
        HookSlot::BeforeCreate,
        HookSlot::AfterCreate,
        HookSlot::BeforeSave,
        HookSlot::AfterSave,
        HookSlot::BeforeDestroy,
        HookSlot::AfterDestroy,
    ];

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for HookSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookSlot::BeforeCreate => "beforeCreate",
            HookSlot::AfterCreate => "afterCreate",
            HookSlot::BeforeSave => "beforeSave",
            HookSlot::AfterSave => "afterSave",
            HookSlot::BeforeDestroy => "beforeDestroy",
            HookSlot::AfterDestroy => "afterDestroy",
        };
        f.write_str(name)
    }
}

type HookFn = dyn for<'a> Fn(&'a mut Instance) -> BoxFuture<'a, CoreResult<()>> + Send + Sync;

/// A lifecycle hook.
///
/// Hooks may inspect and modify the instance. Returning an error aborts
/// the surrounding operation.
#[derive(Clone)]
pub struct Hook(Arc<HookFn>);

impl Hook {
    /// Creates a hook from an async function.
    ///
    /// ```rust
    /// use futures::FutureExt;
    /// use recordkit_core::Hook;
    ///
    /// let hook = Hook::new(|instance| async move { instance.set("touched", true) }.boxed());
    /// # drop(hook);
    /// ```
    pub fn new<F>(hook: F) -> Self
    where
        F: for<'a> Fn(&'a mut Instance) -> BoxFuture<'a, CoreResult<()>> + Send + Sync + 'static,
    {
        Self(Arc::new(hook))
    }

    /// Creates a hook from a synchronous function.
    pub fn sync<F>(hook: F) -> Self
    where
        F: Fn(&mut Instance) -> CoreResult<()> + Send + Sync + 'static,
    {
        Self::new(move |instance| future::ready(hook(instance)).boxed())
    }

    /// Creates a continuation-style hook.
    ///
    /// The hook receives a [`Next`] that must be invoked to resume the
    /// operation. It may be moved into spawned work. Failing or dropping
    /// it aborts the operation with `HookFailed`.
    pub fn with_next<F>(hook: F) -> Self
    where
        F: Fn(&mut Instance, Next) + Send + Sync + 'static,
    {
        Self::new(move |instance| {
            let (next, pending) = Next::pair();
            hook(instance, next);
            pending.boxed()
        })
    }

    pub(crate) fn call<'a>(&self, instance: &'a mut Instance) -> BoxFuture<'a, CoreResult<()>> {
        (self.0)(instance)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hook(..)")
    }
}

/// One optional hook per slot.
#[derive(Debug, Clone, Default)]
pub struct HookTable {
    slots: [Option<Hook>; 6],
}

impl HookTable {
    /// Installs or clears the hook for a slot.
    pub fn set(&mut self, slot: HookSlot, hook: Option<Hook>) {
        self.slots[slot.index()] = hook;
    }

    /// Returns the hook for a slot.
    pub fn get(&self, slot: HookSlot) -> Option<Hook> {
        self.slots[slot.index()].clone()
    }
}

/// Runs the model's hook for `slot`, if any.
///
/// Continuation failures are reported as `HookFailed`. Any other error the
/// hook returns is passed through unchanged.
pub(crate) async fn dispatch(slot: HookSlot, instance: &mut Instance) -> CoreResult<()> {
    let Some(hook) = instance.model().hook(slot) else {
        return Ok(());
    };
    tracing::trace!(model = %instance.model().name(), %slot, "dispatching hook");
    hook.call(instance).await.map_err(|err| match err.continuation_message() {
        Some(message) => CoreError::HookFailed { slot, message },
        None => err,
    })
}
