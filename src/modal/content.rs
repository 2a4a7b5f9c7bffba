//! Embedded content contract
//!
//! Whatever is shown inside a dialog answers four signals. Each answer is a
//! typed value: a veto keeps the dialog as it is, anything else lets the
//! navigator close the dialog or move to another one, possibly after a
//! [`Completion`] resolves.

use super::types::DialogId;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;

/// A one-shot completion signal awaited before a deferred transition
pub struct Completion {
    inner: BoxFuture<'static, bool>,

    /// Known to be resolved without polling
    ready: bool,
}

impl Completion {
    /// A completion that is already resolved
    pub fn resolved() -> Self {
        Self {
            inner: futures::future::ready(true).boxed(),
            ready: true,
        }
    }

    /// A completion resolved by hand through the returned [`Resolver`]
    ///
    /// Dropping the resolver without calling [`Resolver::resolve`] abandons
    /// the transition waiting on it.
    pub fn channel() -> (Resolver, Self) {
        let (tx, rx) = oneshot::channel();
        let inner = async move { rx.await.is_ok() }.boxed();
        (Resolver { tx }, Self { inner, ready: false })
    }

    /// A completion that resolves when `future` finishes
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            inner: future.map(|()| true).boxed(),
            ready: false,
        }
    }

    /// Resolves after `delay` on the tokio timer
    ///
    /// Creating the completion and handing it to the controller is fine
    /// anywhere; the timer only starts on the first poll.
    ///
    /// # Panics
    ///
    /// Polling panics outside a tokio runtime with the time driver enabled.
    /// The controller polls completions in `pump`, `step` and `settle`, so
    /// call those from within a runtime.
    pub fn after(delay: Duration) -> Self {
        Self::from_future(async move { tokio::time::sleep(delay).await })
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.ready
    }

    /// `true` once resolved, `false` if abandoned
    pub(crate) fn into_future(self) -> BoxFuture<'static, bool> {
        self.inner
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Completion")
    }
}

/// Resolving half of [`Completion::channel`]
#[derive(Debug)]
pub struct Resolver {
    tx: oneshot::Sender<()>,
}

impl Resolver {
    pub fn resolve(self) {
        // the waiting side may already be gone, which is fine
        let _ = self.tx.send(());
    }
}

/// Answer to `submit` and `reject`
#[derive(Debug)]
pub enum Verdict {
    Veto,
    Proceed,
    /// Proceed once the completion resolves. Only `submit` waits; `reject`
    /// proceeds straight away.
    ProceedAsync(Completion),
}

/// Answer to `next` and `previous`
#[derive(Debug)]
pub enum Navigation {
    Veto,
    Switch(DialogId),
    /// Switch once the completion resolves. Only `next` waits; `previous`
    /// switches straight away.
    SwitchAfter(DialogId, Completion),
}

/// Capability required of whatever is embedded inside a dialog
///
/// Answers are taken synchronously. Completions returned from `submit` or
/// `next` are only polled by the controller's `pump`, `step` and `settle`;
/// timer-based ones ([`Completion::after`]) need those to run inside a
/// tokio runtime.
pub trait DialogContent: Send {
    fn submit(&mut self) -> Verdict {
        Verdict::Proceed
    }

    fn reject(&mut self) -> Verdict {
        Verdict::Proceed
    }

    fn next(&mut self) -> Navigation {
        Navigation::Veto
    }

    fn previous(&mut self) -> Navigation {
        Navigation::Veto
    }

    /// Text a renderer can show inside the dialog
    fn body(&self) -> String {
        String::new()
    }
}

/// Plain message content with the default answers
#[derive(Debug, Clone, Default)]
pub struct StaticContent {
    body: String,
}

impl StaticContent {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

impl DialogContent for StaticContent {
    fn body(&self) -> String {
        self.body.clone()
    }
}

/// A canned answer for [`ScriptedContent`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptedResponse {
    Veto,
    Proceed,
    /// Proceed after this many milliseconds
    Delay(u64),
    Goto(DialogId),
    GotoAfter { id: DialogId, delay_ms: u64 },
}

impl ScriptedResponse {
    fn into_verdict(self) -> Verdict {
        match self {
            Self::Veto => Verdict::Veto,
            Self::Delay(ms) | Self::GotoAfter { delay_ms: ms, .. } => {
                Verdict::ProceedAsync(Completion::after(Duration::from_millis(ms)))
            }
            Self::Proceed | Self::Goto(_) => Verdict::Proceed,
        }
    }

    // answers without a destination cannot navigate anywhere
    fn into_navigation(self) -> Navigation {
        match self {
            Self::Goto(id) => Navigation::Switch(id),
            Self::GotoAfter { id, delay_ms } => {
                Navigation::SwitchAfter(id, Completion::after(Duration::from_millis(delay_ms)))
            }
            Self::Veto | Self::Proceed | Self::Delay(_) => Navigation::Veto,
        }
    }
}

/// Content answering from per-signal queues, falling back to the trait
/// defaults once a queue runs dry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptedContent {
    pub body: String,
    pub submit: VecDeque<ScriptedResponse>,
    pub reject: VecDeque<ScriptedResponse>,
    pub next: VecDeque<ScriptedResponse>,
    pub previous: VecDeque<ScriptedResponse>,
}

impl DialogContent for ScriptedContent {
    fn submit(&mut self) -> Verdict {
        self.submit
            .pop_front()
            .map_or(Verdict::Proceed, ScriptedResponse::into_verdict)
    }

    fn reject(&mut self) -> Verdict {
        self.reject
            .pop_front()
            .map_or(Verdict::Proceed, ScriptedResponse::into_verdict)
    }

    fn next(&mut self) -> Navigation {
        self.next
            .pop_front()
            .map_or(Navigation::Veto, ScriptedResponse::into_navigation)
    }

    fn previous(&mut self) -> Navigation {
        self.previous
            .pop_front()
            .map_or(Navigation::Veto, ScriptedResponse::into_navigation)
    }

    fn body(&self) -> String {
        self.body.clone()
    }
}
