//! Modal dialog management
//!
//! Dialog records live in a [`DialogRegistry`] that keeps exactly one of them
//! active. Content embedded in a dialog answers submit/reject/next/previous
//! signals; the [`Navigator`] turns those answers into closes and switches,
//! and the [`ModalController`] applies them and keeps the presenter in sync.

pub mod bus;
pub mod content;
pub mod controller;
pub mod navigation;
pub mod presenter;
pub mod registry;
pub mod types;

pub use bus::{event_bus, BusSignal, BusSubscription, EventBus};
pub use content::{
    Completion, DialogContent, Navigation, Resolver, ScriptedContent, ScriptedResponse,
    StaticContent, Verdict,
};
pub use controller::ModalController;
pub use navigation::{NavState, Navigator};
pub use presenter::{Presenter, TracingPresenter};
pub use registry::{DialogRegistry, DialogSummary, RegistryChange, RegistrySnapshot};
pub use types::*;
