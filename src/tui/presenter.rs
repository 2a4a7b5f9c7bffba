//! Terminal presenter
//!
//! The controller owns its presenter, so [`TerminalPresenter`] keeps its layer
//! state behind a shared handle: clone it before handing it over and use the
//! clone to tick effects and render.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use tracing::debug;

use super::layer::{DialogLayer, LayerStack};
use crate::config::ModalSettings;
use crate::modal::{DialogId, DialogView, Effect, Presenter};

/// Effect progress added per tick
const TICK_STEP: f32 = 0.25;

/// Colors used for dialogs
#[derive(Debug, Clone)]
pub struct ModalTheme {
    pub border: Color,
    pub border_active: Color,
    pub text: Color,
    pub muted: Color,
    pub backdrop: Color,
}

impl Default for ModalTheme {
    fn default() -> Self {
        Self {
            border: Color::DarkGray,
            border_active: Color::Cyan,
            text: Color::White,
            muted: Color::Gray,
            backdrop: Color::Black,
        }
    }
}

#[derive(Debug, Default)]
struct PresenterState {
    layers: LayerStack,
    container_visible: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TerminalPresenter {
    state: Arc<Mutex<PresenterState>>,
    theme: ModalTheme,
}

impl TerminalPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_theme(mut self, theme: ModalTheme) -> Self {
        self.theme = theme;
        self
    }

    fn state(&self) -> MutexGuard<'_, PresenterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_container_visible(&self) -> bool {
        self.state().container_visible
    }

    /// Ids of the shown dialogs, oldest first
    pub fn visible_ids(&self) -> Vec<DialogId> {
        self.state()
            .layers
            .layers()
            .iter()
            .map(|layer| layer.dialog_id().clone())
            .collect()
    }

    pub fn layer(&self, id: &DialogId) -> Option<DialogLayer> {
        self.state().layers.get(id).cloned()
    }

    /// Advance every effect by one frame
    ///
    /// Returns true while some effect is still running.
    pub fn tick(&self) -> bool {
        let mut state = self.state();
        state.layers.advance(TICK_STEP);
        state.layers.layers().iter().any(|layer| !layer.is_settled())
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let state = self.state();
        if !state.container_visible || state.layers.is_empty() {
            return;
        }

        self.render_modal_background(frame, area);

        let top = state.layers.topmost().map(|layer| layer.dialog_id().clone());
        for layer in state.layers.layers() {
            let is_top = top.as_ref() == Some(layer.dialog_id());
            self.render_layer(frame, area, layer, is_top);
        }
    }

    fn render_layer(&self, frame: &mut Frame, area: Rect, layer: &DialogLayer, is_top: bool) {
        let dialog_area = layer.effective_area(area);
        if dialog_area.width == 0 || dialog_area.height == 0 {
            return;
        }

        let mut border_style = Style::default().fg(if is_top {
            self.theme.border_active
        } else {
            self.theme.border
        });
        let mut text_style = Style::default().fg(self.theme.text);

        if layer.effect() == Effect::Fade && !layer.is_settled() {
            border_style = border_style.add_modifier(Modifier::DIM);
            text_style = text_style.add_modifier(Modifier::DIM);
        }

        let title = Line::from(vec![
            Span::styled(format!(" {} ", layer.dialog_id()), border_style),
            Span::styled(
                format!("[{}] ", layer.classes().join(" ")),
                Style::default().fg(self.theme.muted),
            ),
        ]);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(title);

        let body = Paragraph::new(layer.view().body.clone())
            .style(text_style)
            .block(block)
            .wrap(Wrap { trim: false });

        frame.render_widget(Clear, dialog_area);
        frame.render_widget(body, dialog_area);
    }

    fn render_modal_background(&self, frame: &mut Frame, area: Rect) {
        frame.render_widget(Clear, area);

        let dim_style = Style::default()
            .bg(self.theme.backdrop)
            .fg(self.theme.text)
            .add_modifier(Modifier::DIM);

        frame.render_widget(Block::default().style(dim_style), area);
    }
}

impl Presenter for TerminalPresenter {
    fn show(&mut self, view: &DialogView, settings: &ModalSettings) {
        let layer = DialogLayer::new(
            view.clone(),
            settings.effect_for(view),
            settings.classes_for(view),
        );
        debug!(dialog_id = %view.id, effect = %layer.effect(), "show dialog layer");
        self.state().layers.show(layer);
    }

    fn hide(&mut self, view: &DialogView, _settings: &ModalSettings) {
        if self.state().layers.remove(&view.id).is_none() {
            debug!(dialog_id = %view.id, "hide for a dialog that was not shown");
        }
    }

    fn toggle_container_visible(&mut self, has_dialogs: bool) {
        let mut state = self.state();
        state.container_visible = has_dialogs;
        if !has_dialogs {
            state.layers.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::{ModalController, NewDialog, StaticContent};
    use ratatui::{backend::TestBackend, Terminal};

    fn dialog(id: &str) -> NewDialog {
        NewDialog::new(StaticContent::new(format!("body of {id}"))).with_id(id)
    }

    #[test]
    fn test_follows_controller() {
        let presenter = TerminalPresenter::new();
        let mut controller = ModalController::new(ModalSettings::default(), presenter.clone());

        controller.add(dialog("a")).unwrap();
        assert!(presenter.is_container_visible());
        assert_eq!(presenter.visible_ids(), vec![DialogId::from("a")]);

        controller.add(dialog("b").active(true)).unwrap();
        assert_eq!(presenter.visible_ids(), vec![DialogId::from("b")]);

        controller.close(&DialogId::from("b"));
        assert_eq!(presenter.visible_ids(), vec![DialogId::from("a")]);

        controller.close(&DialogId::from("a"));
        assert!(!presenter.is_container_visible());
        assert!(presenter.visible_ids().is_empty());
    }

    #[test]
    fn test_layer_uses_settings() {
        let presenter = TerminalPresenter::new();
        let settings = ModalSettings {
            default_effect: Effect::Fade,
            default_class: Some("wide".to_string()),
        };
        let mut controller = ModalController::new(settings, presenter.clone());
        controller.add(dialog("a").with_class_name("confirm")).unwrap();

        let layer = presenter.layer(&DialogId::from("a")).unwrap();
        assert_eq!(layer.effect(), Effect::Fade);
        assert_eq!(layer.classes(), ["effect-fade", "wide", "confirm"]);
    }

    #[test]
    fn test_tick_settles_effects() {
        let presenter = TerminalPresenter::new();
        let mut controller = ModalController::new(ModalSettings::default(), presenter.clone());
        controller.add(dialog("a")).unwrap();

        let mut ticks = 0;
        while presenter.tick() {
            ticks += 1;
            assert!(ticks < 10);
        }
        assert!(presenter.layer(&DialogId::from("a")).unwrap().is_settled());
    }

    #[test]
    fn test_render_does_not_panic() {
        let presenter = TerminalPresenter::new();
        let mut controller = ModalController::new(ModalSettings::default(), presenter.clone());
        controller.add(dialog("a")).unwrap();

        let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();
        terminal
            .draw(|frame| presenter.render(frame, frame.size()))
            .unwrap();
        presenter.tick();
        terminal
            .draw(|frame| presenter.render(frame, Rect::new(0, 0, 2, 1)))
            .unwrap();
    }
}
