//! Stacked modal dialogs with a single active dialog, group cascades and
//! step-by-step navigation.
//!
//! The [`modal`] module is the core and knows nothing about terminals;
//! [`tui`] renders it with ratatui and [`cli`] drives it from the command line.

pub mod cli;
pub mod config;
pub mod modal;
pub mod tui;

pub use config::{ConfigureOptions, ModalSettings};
pub use modal::{ModalController, ModalError, ModalResult};
