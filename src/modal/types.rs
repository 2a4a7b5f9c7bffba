//! Core modal types
//!
//! Identifiers, records, notifications and errors shared by the registry,
//! the navigator and the controller.

use super::content::DialogContent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for dialog records
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DialogId(pub String);

impl DialogId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh identifier for records added without one
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DialogId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DialogId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for DialogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visual transition used when a dialog is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Effect {
    /// Slide in from the top edge
    #[default]
    SlideTop,
    /// Fade in
    Fade,
}

impl Effect {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SlideTop => "slide-top",
            Self::Fade => "fade",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Effect {
    type Err = ModalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slide-top" | "slidetop" | "slide_top" => Ok(Self::SlideTop),
            "fade" => Ok(Self::Fade),
            other => Err(ModalError::UnknownEffect(other.to_string())),
        }
    }
}

/// A dialog as handed to [`ModalController::add`](super::ModalController::add)
pub struct NewDialog {
    pub id: Option<DialogId>,
    /// Request activation on insert, deactivating whatever is active now
    pub active: bool,
    pub group: Option<String>,
    pub effect: Option<Effect>,
    pub class_name: Option<String>,
    pub content: Box<dyn DialogContent>,
}

impl NewDialog {
    pub fn new(content: impl DialogContent + 'static) -> Self {
        Self {
            id: None,
            active: false,
            group: None,
            effect: None,
            class_name: None,
            content: Box::new(content),
        }
    }

    pub fn with_id(mut self, id: impl Into<DialogId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }
}

impl fmt::Debug for NewDialog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewDialog")
            .field("id", &self.id)
            .field("active", &self.active)
            .field("group", &self.group)
            .field("effect", &self.effect)
            .finish_non_exhaustive()
    }
}

/// One or several dialogs for a single `add` call
#[derive(Debug)]
pub enum DialogBatch {
    One(NewDialog),
    Many(Vec<NewDialog>),
}

impl From<NewDialog> for DialogBatch {
    fn from(dialog: NewDialog) -> Self {
        Self::One(dialog)
    }
}

impl From<Vec<NewDialog>> for DialogBatch {
    fn from(dialogs: Vec<NewDialog>) -> Self {
        Self::Many(dialogs)
    }
}

impl IntoIterator for DialogBatch {
    type Item = NewDialog;
    type IntoIter = std::vec::IntoIter<NewDialog>;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            Self::One(dialog) => vec![dialog].into_iter(),
            Self::Many(dialogs) => dialogs.into_iter(),
        }
    }
}

/// A live dialog held by the registry
pub struct DialogRecord {
    pub(crate) id: DialogId,
    pub(crate) is_active: bool,
    pub(crate) group: Option<String>,
    pub(crate) effect: Option<Effect>,
    pub(crate) class_name: Option<String>,
    pub(crate) content: Box<dyn DialogContent>,
}

impl DialogRecord {
    pub(crate) fn from_new(dialog: NewDialog) -> Self {
        Self {
            id: dialog.id.unwrap_or_else(DialogId::generate),
            is_active: dialog.active,
            group: dialog.group,
            effect: dialog.effect,
            class_name: dialog.class_name,
            content: dialog.content,
        }
    }

    pub fn id(&self) -> &DialogId {
        &self.id
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn effect(&self) -> Option<Effect> {
        self.effect
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn content(&self) -> &dyn DialogContent {
        self.content.as_ref()
    }

    pub(crate) fn content_mut(&mut self) -> &mut dyn DialogContent {
        self.content.as_mut()
    }

    /// Snapshot handed to presenters
    pub fn view(&self) -> DialogView {
        DialogView {
            id: self.id.clone(),
            group: self.group.clone(),
            effect: self.effect,
            class_name: self.class_name.clone(),
            body: self.content.body(),
        }
    }
}

impl fmt::Debug for DialogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogRecord")
            .field("id", &self.id)
            .field("is_active", &self.is_active)
            .field("group", &self.group)
            .field("effect", &self.effect)
            .finish_non_exhaustive()
    }
}

/// Presentation snapshot of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogView {
    pub id: DialogId,
    pub group: Option<String>,
    pub effect: Option<Effect>,
    pub class_name: Option<String>,
    pub body: String,
}

/// Content signals a dialog can receive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Submit,
    Reject,
    Next,
    Previous,
    /// Forced close that bypasses the content
    Close,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Submit => "submit",
            Self::Reject => "reject",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::Close => "close",
        };
        f.write_str(name)
    }
}

/// What a signal did to the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Content refused the transition
    Vetoed,
    /// Records removed, the closed one first, then its group
    Closed(Vec<DialogId>),
    Switched { from: DialogId, to: DialogId },
    /// Waiting on a completion before closing or switching
    Deferred,
    /// Dropped because the record is still waiting on a completion
    Busy,
    /// No record to act on
    Ignored,
}

/// Notifications sent to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalEvent {
    Opened(DialogId),
    Closed(DialogId),
    Activated(DialogId),
    /// Dialog count went from zero to one
    ContainerShown,
    /// Dialog count went back to zero
    ContainerHidden,
}

/// Result type for modal operations
pub type ModalResult<T> = std::result::Result<T, ModalError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModalError {
    #[error("modal dialog with id \"{0}\" not found")]
    NotFound(DialogId),

    #[error("modal dialog with id \"{0}\" already exists")]
    AlreadyExists(DialogId),

    #[error("unknown effect: {0}")]
    UnknownEffect(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_parsing() {
        assert_eq!("slide-top".parse::<Effect>().unwrap(), Effect::SlideTop);
        assert_eq!(" Fade ".parse::<Effect>().unwrap(), Effect::Fade);
        assert_eq!(
            "zoom".parse::<Effect>(),
            Err(ModalError::UnknownEffect("zoom".to_string()))
        );
    }

    #[test]
    fn test_effect_serde_names() {
        let json = serde_json::to_string(&Effect::SlideTop).unwrap();
        assert_eq!(json, "\"slide-top\"");
        let effect: Effect = serde_json::from_str("\"fade\"").unwrap();
        assert_eq!(effect, Effect::Fade);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(DialogId::generate(), DialogId::generate());
    }

    #[test]
    fn test_batch_iterates_single_and_many() {
        use crate::modal::content::StaticContent;

        let one: DialogBatch = NewDialog::new(StaticContent::default()).into();
        assert_eq!(one.into_iter().count(), 1);

        let many: DialogBatch = vec![
            NewDialog::new(StaticContent::default()),
            NewDialog::new(StaticContent::default()),
        ]
        .into();
        assert_eq!(many.into_iter().count(), 2);
    }
}
