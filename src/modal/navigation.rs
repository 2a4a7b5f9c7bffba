//! Dialog navigation state machine
//!
//! Turns content signals into commands for the controller. Each record is
//! either idle or waiting on exactly one completion; while it waits, further
//! content signals on that record are dropped. An external close always goes
//! through and makes the outstanding completion stale.

use super::content::{Completion, Navigation, Verdict};
use super::registry::DialogRegistry;
use super::types::{DialogId, Signal, Transition};
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Navigation state of a single record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NavState {
    #[default]
    Idle,
    AwaitingSubmit { ticket: u64 },
    AwaitingSwitch { ticket: u64, destination: DialogId },
}

impl NavState {
    fn ticket(&self) -> Option<u64> {
        match self {
            Self::Idle => None,
            Self::AwaitingSubmit { ticket } | Self::AwaitingSwitch { ticket, .. } => Some(*ticket),
        }
    }
}

/// Work deferred until a completion resolves
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Deferred {
    Close,
    Switch(DialogId),
}

/// A resolved (or abandoned) completion, ready to be applied
#[derive(Debug)]
pub(crate) struct Settled {
    id: DialogId,
    ticket: u64,
    action: Deferred,
    resolved: bool,
}

pub(crate) type PendingTransition = BoxFuture<'static, Settled>;

/// What the controller has to do next
pub(crate) enum Command {
    Done(Transition),
    Close(DialogId),
    Switch { from: DialogId, to: DialogId },
    Await(PendingTransition),
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Done(transition) => f.debug_tuple("Done").field(transition).finish(),
            Self::Close(id) => f.debug_tuple("Close").field(id).finish(),
            Self::Switch { from, to } => f
                .debug_struct("Switch")
                .field("from", from)
                .field("to", to)
                .finish(),
            Self::Await(_) => f.write_str("Await"),
        }
    }
}

/// Per-record navigation bookkeeping
#[derive(Debug, Default)]
pub struct Navigator {
    states: HashMap<DialogId, NavState>,
    next_ticket: u64,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, id: &DialogId) -> NavState {
        self.states.get(id).cloned().unwrap_or_default()
    }

    pub fn is_pending(&self, id: &DialogId) -> bool {
        self.state(id) != NavState::Idle
    }

    /// Drop the state of a removed record
    pub fn forget(&mut self, id: &DialogId) {
        if let Some(state) = self.states.remove(id) {
            if state != NavState::Idle {
                debug!(dialog_id = %id, ?state, "pending transition discarded");
            }
        }
    }

    /// Interpret a signal raised on `id`
    pub(crate) fn signal(
        &mut self,
        registry: &mut DialogRegistry,
        id: &DialogId,
        signal: Signal,
    ) -> Command {
        if signal == Signal::Close {
            return if registry.contains(id) {
                Command::Close(id.clone())
            } else {
                Command::Done(Transition::Ignored)
            };
        }

        if self.is_pending(id) {
            debug!(dialog_id = %id, %signal, "dialog busy, signal dropped");
            return Command::Done(Transition::Busy);
        }

        let Some(record) = registry.get_mut(id) else {
            return Command::Done(Transition::Ignored);
        };
        let content = record.content_mut();

        match signal {
            Signal::Submit => match content.submit() {
                Verdict::Veto => vetoed(id, signal),
                Verdict::Proceed => Command::Close(id.clone()),
                Verdict::ProceedAsync(completion) => {
                    self.wait(id, Deferred::Close, completion)
                }
            },
            Signal::Reject => match content.reject() {
                Verdict::Veto => vetoed(id, signal),
                Verdict::Proceed | Verdict::ProceedAsync(_) => Command::Close(id.clone()),
            },
            Signal::Next => match content.next() {
                Navigation::Veto => vetoed(id, signal),
                Navigation::Switch(to) => Command::Switch {
                    from: id.clone(),
                    to,
                },
                Navigation::SwitchAfter(to, completion) => {
                    self.wait(id, Deferred::Switch(to), completion)
                }
            },
            Signal::Previous => match content.previous() {
                Navigation::Veto => vetoed(id, signal),
                Navigation::Switch(to) | Navigation::SwitchAfter(to, _) => Command::Switch {
                    from: id.clone(),
                    to,
                },
            },
            Signal::Close => Command::Close(id.clone()),
        }
    }

    /// Apply a settled completion, ignoring it when stale
    pub(crate) fn settle(&mut self, registry: &DialogRegistry, settled: Settled) -> Command {
        let Settled {
            id,
            ticket,
            action,
            resolved,
        } = settled;

        if self.state(&id).ticket() != Some(ticket) || !registry.contains(&id) {
            debug!(dialog_id = %id, ticket, "stale completion ignored");
            return Command::Done(Transition::Ignored);
        }
        self.states.remove(&id);

        if !resolved {
            warn!(dialog_id = %id, "completion abandoned, dialog left as is");
            return Command::Done(Transition::Ignored);
        }

        match action {
            Deferred::Close => Command::Close(id),
            Deferred::Switch(to) => Command::Switch { from: id, to },
        }
    }

    fn wait(
        &mut self,
        id: &DialogId,
        action: Deferred,
        completion: Completion,
    ) -> Command {
        // never polled here: timed completions need a runtime to poll
        if completion.is_ready() {
            return match action {
                Deferred::Close => Command::Close(id.clone()),
                Deferred::Switch(to) => Command::Switch {
                    from: id.clone(),
                    to,
                },
            };
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let state = match &action {
            Deferred::Close => NavState::AwaitingSubmit { ticket },
            Deferred::Switch(destination) => NavState::AwaitingSwitch {
                ticket,
                destination: destination.clone(),
            },
        };
        debug!(dialog_id = %id, ?state, "waiting on completion");
        self.states.insert(id.clone(), state);

        let id = id.clone();
        Command::Await(
            completion
                .into_future()
                .map(move |resolved| Settled {
                    id,
                    ticket,
                    action,
                    resolved,
                })
                .boxed(),
        )
    }
}

fn vetoed(id: &DialogId, signal: Signal) -> Command {
    debug!(dialog_id = %id, %signal, "transition vetoed by content");
    Command::Done(Transition::Vetoed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::content::{DialogContent, Resolver};
    use crate::modal::types::{DialogRecord, NewDialog};

    #[derive(Default)]
    struct Answers {
        submit: Option<Verdict>,
        reject: Option<Verdict>,
        next: Option<Navigation>,
        previous: Option<Navigation>,
    }

    impl DialogContent for Answers {
        fn submit(&mut self) -> Verdict {
            self.submit.take().unwrap_or(Verdict::Proceed)
        }

        fn reject(&mut self) -> Verdict {
            self.reject.take().unwrap_or(Verdict::Proceed)
        }

        fn next(&mut self) -> Navigation {
            self.next.take().unwrap_or(Navigation::Veto)
        }

        fn previous(&mut self) -> Navigation {
            self.previous.take().unwrap_or(Navigation::Veto)
        }
    }

    fn registry_with(id: &str, answers: Answers) -> DialogRegistry {
        let mut registry = DialogRegistry::new();
        registry
            .add(DialogRecord::from_new(NewDialog::new(answers).with_id(id)))
            .unwrap();
        registry
    }

    fn pending_submit() -> (Resolver, Answers) {
        let (resolver, completion) = Completion::channel();
        let answers = Answers {
            submit: Some(Verdict::ProceedAsync(completion)),
            ..Default::default()
        };
        (resolver, answers)
    }

    #[test]
    fn test_veto_yields_no_command() {
        let answers = Answers {
            submit: Some(Verdict::Veto),
            reject: Some(Verdict::Veto),
            next: Some(Navigation::Veto),
            previous: Some(Navigation::Veto),
        };
        let mut registry = registry_with("a", answers);
        let mut navigator = Navigator::new();
        let id = DialogId::from("a");

        for signal in [Signal::Submit, Signal::Reject, Signal::Next, Signal::Previous] {
            let command = navigator.signal(&mut registry, &id, signal);
            assert!(matches!(command, Command::Done(Transition::Vetoed)));
        }
    }

    #[test]
    fn test_submit_and_reject_close() {
        let mut registry = registry_with("a", Answers::default());
        let mut navigator = Navigator::new();
        let id = DialogId::from("a");

        assert!(matches!(
            navigator.signal(&mut registry, &id, Signal::Submit),
            Command::Close(closed) if closed == id
        ));
        assert!(matches!(
            navigator.signal(&mut registry, &id, Signal::Reject),
            Command::Close(closed) if closed == id
        ));
    }

    #[test]
    fn test_reject_does_not_wait() {
        let (_resolver, completion) = Completion::channel();
        let answers = Answers {
            reject: Some(Verdict::ProceedAsync(completion)),
            ..Default::default()
        };
        let mut registry = registry_with("a", answers);
        let mut navigator = Navigator::new();
        let id = DialogId::from("a");

        assert!(matches!(
            navigator.signal(&mut registry, &id, Signal::Reject),
            Command::Close(_)
        ));
        assert!(!navigator.is_pending(&id));
    }

    #[test]
    fn test_resolved_completion_proceeds_immediately() {
        let answers = Answers {
            submit: Some(Verdict::ProceedAsync(Completion::resolved())),
            next: Some(Navigation::SwitchAfter(
                DialogId::from("b"),
                Completion::resolved(),
            )),
            ..Default::default()
        };
        let mut registry = registry_with("a", answers);
        let mut navigator = Navigator::new();
        let id = DialogId::from("a");

        assert!(matches!(
            navigator.signal(&mut registry, &id, Signal::Next),
            Command::Switch { to, .. } if to.as_str() == "b"
        ));
        assert!(matches!(
            navigator.signal(&mut registry, &id, Signal::Submit),
            Command::Close(_)
        ));
    }

    #[test]
    fn test_previous_ignores_completion() {
        let (_resolver, completion) = Completion::channel();
        let answers = Answers {
            previous: Some(Navigation::SwitchAfter(DialogId::from("b"), completion)),
            ..Default::default()
        };
        let mut registry = registry_with("a", answers);
        let mut navigator = Navigator::new();

        assert!(matches!(
            navigator.signal(&mut registry, &DialogId::from("a"), Signal::Previous),
            Command::Switch { .. }
        ));
    }

    #[tokio::test]
    async fn test_pending_submit_blocks_other_signals() {
        let (resolver, answers) = pending_submit();
        let mut registry = registry_with("a", answers);
        let mut navigator = Navigator::new();
        let id = DialogId::from("a");

        let Command::Await(pending) = navigator.signal(&mut registry, &id, Signal::Submit) else {
            panic!("expected a pending transition");
        };
        assert!(matches!(navigator.state(&id), NavState::AwaitingSubmit { .. }));
        assert!(matches!(
            navigator.signal(&mut registry, &id, Signal::Reject),
            Command::Done(Transition::Busy)
        ));

        resolver.resolve();
        let settled = pending.await;
        assert!(matches!(
            navigator.settle(&registry, settled),
            Command::Close(closed) if closed == id
        ));
        assert_eq!(navigator.state(&id), NavState::Idle);
    }

    #[tokio::test]
    async fn test_close_is_never_blocked() {
        let (_resolver, answers) = pending_submit();
        let mut registry = registry_with("a", answers);
        let mut navigator = Navigator::new();
        let id = DialogId::from("a");

        let _pending = navigator.signal(&mut registry, &id, Signal::Submit);
        assert!(matches!(
            navigator.signal(&mut registry, &id, Signal::Close),
            Command::Close(_)
        ));
    }

    #[tokio::test]
    async fn test_settle_after_forget_is_stale() {
        let (resolver, answers) = pending_submit();
        let mut registry = registry_with("a", answers);
        let mut navigator = Navigator::new();
        let id = DialogId::from("a");

        let Command::Await(pending) = navigator.signal(&mut registry, &id, Signal::Submit) else {
            panic!("expected a pending transition");
        };
        registry.destroy(&id);
        navigator.forget(&id);

        resolver.resolve();
        let settled = pending.await;
        assert!(matches!(
            navigator.settle(&registry, settled),
            Command::Done(Transition::Ignored)
        ));
    }

    #[tokio::test]
    async fn test_abandoned_completion_returns_to_idle() {
        let (resolver, answers) = pending_submit();
        let mut registry = registry_with("a", answers);
        let mut navigator = Navigator::new();
        let id = DialogId::from("a");

        let Command::Await(pending) = navigator.signal(&mut registry, &id, Signal::Submit) else {
            panic!("expected a pending transition");
        };
        drop(resolver);

        let settled = pending.await;
        assert!(matches!(
            navigator.settle(&registry, settled),
            Command::Done(Transition::Ignored)
        ));
        assert!(!navigator.is_pending(&id));
        assert!(registry.contains(&id));
    }

    #[test]
    fn test_unknown_record_is_ignored() {
        let mut registry = DialogRegistry::new();
        let mut navigator = Navigator::new();
        let id = DialogId::from("ghost");

        assert!(matches!(
            navigator.signal(&mut registry, &id, Signal::Submit),
            Command::Done(Transition::Ignored)
        ));
        assert!(matches!(
            navigator.signal(&mut registry, &id, Signal::Close),
            Command::Done(Transition::Ignored)
        ));
    }

    #[test]
    fn test_timed_completion_is_not_polled_on_signal() {
        let answers = Answers {
            submit: Some(Verdict::ProceedAsync(Completion::after(
                std::time::Duration::from_millis(5),
            ))),
            ..Default::default()
        };
        let mut registry = registry_with("a", answers);
        let mut navigator = Navigator::new();
        let id = DialogId::from("a");

        assert!(matches!(
            navigator.signal(&mut registry, &id, Signal::Submit),
            Command::Await(_)
        ));
        assert!(matches!(navigator.state(&id), NavState::AwaitingSubmit { .. }));
    }
}
