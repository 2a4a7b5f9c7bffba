//! Interactive demo: a small wizard and a confirmation stacked on top of it

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event as CrosstermEvent, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use super::keys::{KeyAction, KeyMap};
use super::presenter::TerminalPresenter;
use crate::config::{ConfigureOptions, ModalSettings};
use crate::modal::{
    event_bus, BusSignal, Completion, DialogContent, DialogId, Effect, ModalController,
    ModalEvent, Navigation, NewDialog, Verdict,
};

/// Delay before a submitted wizard step closes
const SUBMIT_DELAY: Duration = Duration::from_millis(400);

/// One page of a wizard, linked to its neighbours by id
#[derive(Debug, Clone)]
pub struct WizardStep {
    body: String,
    previous: Option<DialogId>,
    next: Option<DialogId>,
}

impl WizardStep {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            previous: None,
            next: None,
        }
    }

    pub fn with_previous(mut self, id: impl Into<DialogId>) -> Self {
        self.previous = Some(id.into());
        self
    }

    pub fn with_next(mut self, id: impl Into<DialogId>) -> Self {
        self.next = Some(id.into());
        self
    }
}

impl DialogContent for WizardStep {
    fn submit(&mut self) -> Verdict {
        Verdict::ProceedAsync(Completion::after(SUBMIT_DELAY))
    }

    fn next(&mut self) -> Navigation {
        match &self.next {
            Some(id) => Navigation::Switch(id.clone()),
            None => Navigation::Veto,
        }
    }

    fn previous(&mut self) -> Navigation {
        match &self.previous {
            Some(id) => Navigation::Switch(id.clone()),
            None => Navigation::Veto,
        }
    }

    fn body(&self) -> String {
        self.body.clone()
    }
}

/// Dialogs shown by the demo
pub fn demo_dialogs() -> Vec<NewDialog> {
    vec![
        NewDialog::new(
            WizardStep::new("Step 1 of 3\n\nTab: next step").with_next("step-2"),
        )
        .with_id("step-1")
        .with_group("wizard"),
        NewDialog::new(
            WizardStep::new("Step 2 of 3\n\nTab: next, Shift+Tab: back")
                .with_previous("step-1")
                .with_next("step-3"),
        )
        .with_id("step-2")
        .with_group("wizard"),
        NewDialog::new(
            WizardStep::new("Step 3 of 3\n\nEnter: finish, Esc: cancel").with_previous("step-2"),
        )
        .with_id("step-3")
        .with_group("wizard")
        .with_effect(Effect::Fade),
        NewDialog::new(WizardStep::new("Start the wizard?\n\nEnter: yes, Esc: no"))
            .with_id("confirm")
            .with_class_name("confirm")
            .active(true),
    ]
}

pub struct App {
    controller: ModalController,
    presenter: TerminalPresenter,
    bus: broadcast::Sender<BusSignal>,
    events: mpsc::UnboundedReceiver<ModalEvent>,
    keys: KeyMap,
    status: String,
}

impl App {
    pub fn new(settings: ModalSettings) -> Result<Self> {
        let presenter = TerminalPresenter::new();
        let mut controller = ModalController::new(settings, presenter.clone());

        let (sender, events) = mpsc::unbounded_channel();
        controller.set_event_sender(sender);

        let bus = event_bus(16);
        controller.configure(ConfigureOptions::new().with_bus(bus.clone()));
        controller.add(demo_dialogs())?;

        Ok(Self {
            controller,
            presenter,
            bus,
            events,
            keys: KeyMap::default(),
            status: "q: quit".to_string(),
        })
    }

    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(frame.size());

        self.presenter.render(frame, chunks[0]);

        let status = Paragraph::new(self.status.as_str()).style(Style::default().fg(Color::Gray));
        frame.render_widget(status, chunks[1]);
    }

    /// Handle one terminal event; returns true when the app should exit
    pub fn handle_event(&mut self, event: CrosstermEvent) -> Result<bool> {
        let CrosstermEvent::Key(key) = event else {
            return Ok(false);
        };
        if key.kind != KeyEventKind::Press {
            return Ok(false);
        }
        if key.code == KeyCode::Char('q') {
            return Ok(true);
        }

        match self.keys.action(&key) {
            Some(KeyAction::Bus(signal)) => {
                if self.bus.send(signal).is_err() {
                    warn!("No modal listener for {:?}", signal);
                }
            }
            Some(KeyAction::Content(signal)) => {
                if let Some(id) = self.controller.registry().active_id().cloned() {
                    let transition = self.controller.raise(&id, signal)?;
                    debug!(dialog_id = %id, ?transition, "key signal applied");
                }
            }
            None => {}
        }
        Ok(false)
    }

    /// Apply queued work and advance effects; returns true once every dialog is gone
    pub fn update(&mut self) -> Result<bool> {
        self.controller.pump()?;
        self.presenter.tick();

        while let Ok(event) = self.events.try_recv() {
            self.status = match event {
                ModalEvent::Opened(id) => format!("opened {id}"),
                ModalEvent::Closed(id) => format!("closed {id}"),
                ModalEvent::Activated(id) => format!("activated {id}"),
                ModalEvent::ContainerShown => "dialogs shown".to_string(),
                ModalEvent::ContainerHidden => "all dialogs closed".to_string(),
            };
        }

        Ok(self.controller.registry().is_empty())
    }
}
