//! Dialog layers for terminal rendering
//!
//! A layer is the on-screen state of one shown dialog: where it goes, which
//! effect brings it in and how far along that effect is.

use crate::modal::{DialogId, DialogView, Effect};
use ratatui::layout::Rect;

/// Width of a dialog as a percentage of the screen
const DIALOG_WIDTH_PCT: u16 = 60;

/// Borders plus one line of padding
const CHROME_HEIGHT: u16 = 4;

/// A shown dialog
#[derive(Debug, Clone)]
pub struct DialogLayer {
    view: DialogView,

    effect: Effect,

    classes: Vec<String>,

    /// Effect progress (0.0 = just shown, 1.0 = fully in)
    animation_progress: f32,
}

impl DialogLayer {
    pub fn new(view: DialogView, effect: Effect, classes: Vec<String>) -> Self {
        Self {
            view,
            effect,
            classes,
            animation_progress: 0.0,
        }
    }

    pub fn dialog_id(&self) -> &DialogId {
        &self.view.id
    }

    pub fn view(&self) -> &DialogView {
        &self.view
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn animation_progress(&self) -> f32 {
        self.animation_progress
    }

    pub fn set_animation_progress(&mut self, progress: f32) {
        self.animation_progress = progress.clamp(0.0, 1.0);
    }

    pub fn advance(&mut self, step: f32) {
        self.set_animation_progress(self.animation_progress + step);
    }

    pub fn is_settled(&self) -> bool {
        self.animation_progress >= 1.0
    }

    /// Final, centered area of the dialog
    pub fn dialog_area(&self, available: Rect) -> Rect {
        let width = (u32::from(available.width) * u32::from(DIALOG_WIDTH_PCT) / 100) as u16;
        let body_lines = self.view.body.lines().count().max(1);
        let height = u16::try_from(body_lines)
            .unwrap_or(u16::MAX)
            .saturating_add(CHROME_HEIGHT)
            .min(available.height);

        Rect {
            x: available.x + available.width.saturating_sub(width) / 2,
            y: available.y + available.height.saturating_sub(height) / 2,
            width,
            height,
        }
    }

    /// Area considering the effect progress
    ///
    /// `SlideTop` starts flush with the top edge and moves down to its final
    /// place; `Fade` does not move.
    pub fn effective_area(&self, available: Rect) -> Rect {
        let area = self.dialog_area(available);
        if self.is_settled() || self.effect == Effect::Fade {
            return area;
        }

        let travel = f32::from(area.y.saturating_sub(available.y));
        let offset = (travel * (1.0 - self.animation_progress)) as u16;

        Rect {
            y: area.y.saturating_sub(offset),
            ..area
        }
    }
}

/// Shown dialogs in the order they were shown
#[derive(Debug, Default)]
pub struct LayerStack {
    layers: Vec<DialogLayer>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a dialog, restarting its effect if it was already shown
    pub fn show(&mut self, layer: DialogLayer) {
        self.remove(layer.dialog_id());
        self.layers.push(layer);
    }

    pub fn remove(&mut self, dialog_id: &DialogId) -> Option<DialogLayer> {
        let index = self
            .layers
            .iter()
            .position(|layer| layer.dialog_id() == dialog_id)?;
        Some(self.layers.remove(index))
    }

    pub fn get(&self, dialog_id: &DialogId) -> Option<&DialogLayer> {
        self.layers.iter().find(|layer| layer.dialog_id() == dialog_id)
    }

    pub fn layers(&self) -> &[DialogLayer] {
        &self.layers
    }

    /// The most recently shown layer
    pub fn topmost(&self) -> Option<&DialogLayer> {
        self.layers.last()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn advance(&mut self, step: f32) {
        for layer in &mut self.layers {
            layer.advance(step);
        }
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }
}
