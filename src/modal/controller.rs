//! Modal controller
//!
//! The controller is the entry point for host code:
//! - adding dialogs and applying the activation policy
//! - routing submit/reject/next/previous signals through the navigator
//! - closing dialogs by id
//! - listening to a host bus for global submit/reject
//! - driving completions that dialogs asked to wait on
//!
//! Registry changes are forwarded to the presenter and, when an event sender
//! is set, to the host as [`ModalEvent`]s.
//!
//! A switch only moves activation away from the dialog that asked for it while
//! that dialog is still active. If another dialog took over in the meantime
//! (an explicitly active add, or a raise on an inactive record) the switch is
//! dropped with `Transition::Ignored` and the interrupting dialog stays put.

use super::{
    bus::{BusPoll, BusSignal, BusSubscription},
    navigation::{Command, NavState, Navigator, PendingTransition, Settled},
    presenter::Presenter,
    registry::{DialogRegistry, RegistryChange},
    types::*,
};
use crate::config::{ConfigureOptions, ModalSettings};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub struct ModalController {
    registry: DialogRegistry,

    navigator: Navigator,

    presenter: Box<dyn Presenter>,

    /// Current settings snapshot
    settings: Arc<ModalSettings>,

    /// Listener on the host bus, if one was configured
    bus: Option<BusSubscription>,

    /// Event sender for host notifications
    event_sender: Option<mpsc::UnboundedSender<ModalEvent>>,

    /// Transitions waiting on a completion
    pending: FuturesUnordered<PendingTransition>,

    container_visible: bool,
}

enum Wake {
    Settled(Settled),
    Bus(Option<BusSignal>),
    Idle,
}

impl ModalController {
    pub fn new(settings: ModalSettings, presenter: impl Presenter + 'static) -> Self {
        Self {
            registry: DialogRegistry::new(),
            navigator: Navigator::new(),
            presenter: Box::new(presenter),
            settings: Arc::new(settings),
            bus: None,
            event_sender: None,
            pending: FuturesUnordered::new(),
            container_visible: false,
        }
    }

    /// Set the event sender for host notifications
    pub fn set_event_sender(&mut self, sender: mpsc::UnboundedSender<ModalEvent>) {
        self.event_sender = Some(sender);
    }

    pub fn settings(&self) -> Arc<ModalSettings> {
        Arc::clone(&self.settings)
    }

    pub fn registry(&self) -> &DialogRegistry {
        &self.registry
    }

    pub fn nav_state(&self, id: &DialogId) -> NavState {
        self.navigator.state(id)
    }

    /// Whether any transition is waiting on a completion
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_listening(&self) -> bool {
        self.bus.is_some()
    }

    /// Add one dialog or several, in order
    ///
    /// Returns the ids of the added dialogs. Stops at the first duplicate id;
    /// dialogs added before it stay.
    pub fn add(&mut self, items: impl Into<DialogBatch>) -> ModalResult<Vec<DialogId>> {
        let mut ids = Vec::new();

        for dialog in items.into() {
            match self.registry.add(DialogRecord::from_new(dialog)) {
                Ok(id) => ids.push(id),
                Err(e) => {
                    self.flush(None);
                    return Err(e);
                }
            }
        }

        self.flush(None);
        Ok(ids)
    }

    /// Raise `submit` on the active dialog
    pub fn on_submit(&mut self) -> ModalResult<Transition> {
        self.raise_on_active(Signal::Submit)
    }

    /// Raise `reject` on the active dialog
    pub fn on_reject(&mut self) -> ModalResult<Transition> {
        self.raise_on_active(Signal::Reject)
    }

    /// Raise a signal on a specific dialog
    ///
    /// Fails only when a switch names a dialog that does not exist.
    pub fn raise(&mut self, id: &DialogId, signal: Signal) -> ModalResult<Transition> {
        debug!(dialog_id = %id, %signal, "signal raised");
        let command = self.navigator.signal(&mut self.registry, id, signal);
        self.apply(command)
    }

    /// Force a dialog closed, ignoring its content; unknown ids are a no-op
    pub fn close(&mut self, id: &DialogId) -> Transition {
        match self.navigator.signal(&mut self.registry, id, Signal::Close) {
            Command::Close(id) => self.close_record(&id),
            _ => Transition::Ignored,
        }
    }

    /// Apply new presentation defaults and optionally rebind the bus
    ///
    /// Returns the new settings snapshot; earlier snapshots are untouched.
    pub fn configure(&mut self, mut options: ConfigureOptions) -> Arc<ModalSettings> {
        if let Some(bus) = options.bus.take() {
            if self.bus.take().is_some() {
                debug!("Detached previous modal bus");
            }
            self.bus = Some(BusSubscription::subscribe(&bus));
        }

        self.settings = Arc::new(self.settings.merged(&options));
        info!(
            default_effect = %self.settings.default_effect,
            listening = self.bus.is_some(),
            "Modal controller configured"
        );
        self.settings()
    }

    /// Apply queued bus signals and finished completions without waiting
    ///
    /// Returns how many were applied.
    pub fn pump(&mut self) -> ModalResult<usize> {
        let mut applied = 0;

        while let Some(subscription) = self.bus.as_mut() {
            match subscription.poll() {
                BusPoll::Signal(signal) => {
                    self.dispatch_bus(signal)?;
                    applied += 1;
                }
                BusPoll::Empty => break,
                BusPoll::Closed => {
                    debug!("Modal bus closed");
                    self.bus = None;
                }
            }
        }

        while let Some(Some(settled)) = self.pending.next().now_or_never() {
            self.apply_settled(settled)?;
            applied += 1;
        }

        Ok(applied)
    }

    /// Wait for the next bus signal or completion and apply it
    ///
    /// Returns `None` when there is nothing left to wait on.
    pub async fn step(&mut self) -> ModalResult<Option<Transition>> {
        loop {
            let has_pending = !self.pending.is_empty();
            if !has_pending && self.bus.is_none() {
                return Ok(None);
            }

            let wake = {
                let pending = &mut self.pending;
                let bus = &mut self.bus;
                tokio::select! {
                    Some(settled) = pending.next(), if has_pending => Wake::Settled(settled),
                    signal = next_bus_signal(bus) => Wake::Bus(signal),
                    else => Wake::Idle,
                }
            };

            match wake {
                Wake::Settled(settled) => return self.apply_settled(settled).map(Some),
                Wake::Bus(Some(signal)) => return self.dispatch_bus(signal).map(Some),
                Wake::Bus(None) => {
                    debug!("Modal bus closed");
                    self.bus = None;
                }
                Wake::Idle => return Ok(None),
            }
        }
    }

    /// Drive every outstanding completion to the end
    pub async fn settle(&mut self) -> ModalResult<()> {
        while let Some(settled) = self.pending.next().await {
            self.apply_settled(settled)?;
        }
        Ok(())
    }

    fn raise_on_active(&mut self, signal: Signal) -> ModalResult<Transition> {
        match self.registry.active_id().cloned() {
            Some(id) => self.raise(&id, signal),
            None => Ok(Transition::Ignored),
        }
    }

    fn dispatch_bus(&mut self, signal: BusSignal) -> ModalResult<Transition> {
        match signal {
            BusSignal::Submit => self.on_submit(),
            BusSignal::Reject => self.on_reject(),
        }
    }

    fn apply_settled(&mut self, settled: Settled) -> ModalResult<Transition> {
        let command = self.navigator.settle(&self.registry, settled);
        self.apply(command)
    }

    fn apply(&mut self, command: Command) -> ModalResult<Transition> {
        match command {
            Command::Done(transition) => Ok(transition),
            Command::Close(id) => Ok(self.close_record(&id)),
            Command::Switch { from, to } => {
                if !self.registry.switch(&from, &to)? {
                    warn!(
                        from = %from,
                        to = %to,
                        "switch dropped, source dialog is no longer active"
                    );
                    return Ok(Transition::Ignored);
                }
                self.flush(None);
                Ok(Transition::Switched { from, to })
            }
            Command::Await(pending) => {
                self.pending.push(pending);
                Ok(Transition::Deferred)
            }
        }
    }

    /// Hide, then destroy with group cascade and reactivation
    fn close_record(&mut self, id: &DialogId) -> Transition {
        let Some(view) = self.registry.get(id).map(DialogRecord::view) else {
            return Transition::Ignored;
        };
        self.presenter.hide(&view, &self.settings);

        let removed: Vec<DialogId> = self
            .registry
            .destroy(id)
            .into_iter()
            .map(|record| record.id)
            .collect();
        for removed_id in &removed {
            self.navigator.forget(removed_id);
        }

        self.flush(Some(id));
        Transition::Closed(removed)
    }

    /// Forward drained registry changes to the presenter and the host
    fn flush(&mut self, already_hidden: Option<&DialogId>) {
        let mut membership_changed = false;

        for change in self.registry.take_changes() {
            match change {
                RegistryChange::Inserted(id) => {
                    membership_changed = true;
                    self.send_event(ModalEvent::Opened(id));
                }
                RegistryChange::Activated(id) => {
                    if let Some(view) = self.registry.get(&id).map(DialogRecord::view) {
                        self.presenter.show(&view, &self.settings);
                    }
                    self.send_event(ModalEvent::Activated(id));
                }
                RegistryChange::Deactivated(id) => {
                    if let Some(view) = self.registry.get(&id).map(DialogRecord::view) {
                        self.presenter.hide(&view, &self.settings);
                    }
                }
                RegistryChange::Removed(view) => {
                    membership_changed = true;
                    if already_hidden != Some(&view.id) {
                        self.presenter.hide(&view, &self.settings);
                    }
                    self.send_event(ModalEvent::Closed(view.id));
                }
            }
        }

        if membership_changed {
            self.toggle_container();
        }
    }

    fn toggle_container(&mut self) {
        let visible = !self.registry.is_empty();
        self.presenter.toggle_container_visible(visible);

        if visible != self.container_visible {
            self.container_visible = visible;
            self.send_event(if visible {
                ModalEvent::ContainerShown
            } else {
                ModalEvent::ContainerHidden
            });
        }
    }

    /// Send an event if event sender is configured
    fn send_event(&self, event: ModalEvent) {
        if let Some(sender) = &self.event_sender {
            let _ = sender.send(event);
        }
    }
}

async fn next_bus_signal(bus: &mut Option<BusSubscription>) -> Option<BusSignal> {
    match bus {
        Some(subscription) => subscription.recv().await,
        None => std::future::pending().await,
    }
}

impl std::fmt::Debug for ModalController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalController")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .field("listening", &self.bus.is_some())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
