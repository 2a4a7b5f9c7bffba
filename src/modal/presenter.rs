//! Presentation adapter contract
//!
//! The controller never renders anything itself; it tells a [`Presenter`]
//! which dialog became visible or hidden and whether the container holding
//! the dialogs should be shown at all.

use super::types::DialogView;
use crate::config::ModalSettings;
use tracing::debug;

pub trait Presenter: Send {
    fn show(&mut self, view: &DialogView, settings: &ModalSettings);

    fn hide(&mut self, view: &DialogView, settings: &ModalSettings);

    fn toggle_container_visible(&mut self, has_dialogs: bool);
}

/// Presenter that only logs what it is asked to do
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPresenter;

impl Presenter for TracingPresenter {
    fn show(&mut self, view: &DialogView, settings: &ModalSettings) {
        debug!(dialog_id = %view.id, classes = ?settings.classes_for(view), "show dialog");
    }

    fn hide(&mut self, view: &DialogView, _settings: &ModalSettings) {
        debug!(dialog_id = %view.id, "hide dialog");
    }

    fn toggle_container_visible(&mut self, has_dialogs: bool) {
        debug!(visible = has_dialogs, "toggle modal container");
    }
}
