//! Replay command: drive a modal controller from a JSON scenario

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use crate::config::{ConfigureOptions, ModalSettings};
use crate::modal::{
    BusSignal, DialogId, Effect, ModalController, NewDialog, RegistrySnapshot, ScriptedContent,
    Signal, TracingPresenter, Transition,
};
use crate::tui::{parse_key, KeyAction, KeyMap};

/// Replay a modal scenario and print the registry after every step
#[derive(Debug, Args)]
pub struct ReplayCommand {
    /// Scenario file (JSON)
    pub file: PathBuf,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// A scenario file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Overrides applied through `configure` before the first step
    pub settings: Option<SettingsOverride>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SettingsOverride {
    pub default_effect: Option<Effect>,
    pub default_class: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Add { dialogs: Vec<DialogEntry> },
    Signal { id: DialogId, signal: Signal },
    Submit,
    Reject,
    Close { id: DialogId },
    /// A key press routed through the default key map
    Key { key: String },
    Settle,
}

#[derive(Debug, Deserialize)]
pub struct DialogEntry {
    pub id: Option<DialogId>,
    #[serde(default)]
    pub active: bool,
    pub group: Option<String>,
    pub effect: Option<Effect>,
    pub class_name: Option<String>,
    #[serde(default)]
    pub content: ScriptedContent,
}

impl From<DialogEntry> for NewDialog {
    fn from(entry: DialogEntry) -> Self {
        let mut dialog = NewDialog::new(entry.content).active(entry.active);
        if let Some(id) = entry.id {
            dialog = dialog.with_id(id);
        }
        if let Some(group) = entry.group {
            dialog = dialog.with_group(group);
        }
        if let Some(effect) = entry.effect {
            dialog = dialog.with_effect(effect);
        }
        if let Some(class_name) = entry.class_name {
            dialog = dialog.with_class_name(class_name);
        }
        dialog
    }
}

/// Outcome of one replayed step
#[derive(Debug, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub op: &'static str,
    pub outcome: String,
    pub registry: RegistrySnapshot,
}

impl ReplayCommand {
    pub async fn execute(&self, settings: ModalSettings) -> Result<()> {
        let raw = fs::read_to_string(&self.file)
            .await
            .with_context(|| format!("Failed to read scenario {}", self.file.display()))?;
        let scenario: Scenario = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse scenario {}", self.file.display()))?;

        info!(file = %self.file.display(), steps = scenario.steps.len(), "Replaying scenario");

        for report in replay(scenario, settings).await? {
            match self.format {
                OutputFormat::Json => println!("{}", serde_json::to_string(&report)?),
                OutputFormat::Text => print_text(&report),
            }
        }
        Ok(())
    }
}

/// Run every step of a scenario against a fresh controller
pub async fn replay(scenario: Scenario, settings: ModalSettings) -> Result<Vec<StepReport>> {
    let mut controller = ModalController::new(settings, TracingPresenter);
    if let Some(overrides) = scenario.settings {
        let mut options = ConfigureOptions::new();
        options.default_effect = overrides.default_effect;
        options.default_class = overrides.default_class;
        controller.configure(options);
    }

    let keys = KeyMap::default();
    let mut reports = Vec::with_capacity(scenario.steps.len());

    for (index, step) in scenario.steps.into_iter().enumerate() {
        let step_number = index + 1;
        let (op, outcome) = run_step(&mut controller, &keys, step)
            .await
            .with_context(|| format!("Step {step_number} failed"))?;

        // Completions that resolved on their own are applied before the snapshot
        controller.pump()?;

        debug!(step = step_number, op, %outcome, "step replayed");
        reports.push(StepReport {
            step: step_number,
            op,
            outcome,
            registry: controller.registry().snapshot(),
        });
    }

    Ok(reports)
}

async fn run_step(
    controller: &mut ModalController,
    keys: &KeyMap,
    step: Step,
) -> Result<(&'static str, String)> {
    let result = match step {
        Step::Add { dialogs } => {
            let dialogs: Vec<NewDialog> = dialogs.into_iter().map(NewDialog::from).collect();
            let ids = controller.add(dialogs)?;
            let ids: Vec<&str> = ids.iter().map(DialogId::as_str).collect();
            ("add", format!("added {}", ids.join(", ")))
        }
        Step::Signal { id, signal } => ("signal", describe(&controller.raise(&id, signal)?)),
        Step::Submit => ("submit", describe(&controller.on_submit()?)),
        Step::Reject => ("reject", describe(&controller.on_reject()?)),
        Step::Close { id } => ("close", describe(&controller.close(&id))),
        Step::Key { key } => {
            let Some(event) = parse_key(&key) else {
                bail!("Unknown key '{key}'");
            };
            let transition = match keys.action(&event) {
                Some(KeyAction::Bus(BusSignal::Submit)) => controller.on_submit()?,
                Some(KeyAction::Bus(BusSignal::Reject)) => controller.on_reject()?,
                Some(KeyAction::Content(signal)) => match controller.registry().active_id().cloned() {
                    Some(id) => controller.raise(&id, signal)?,
                    None => Transition::Ignored,
                },
                None => Transition::Ignored,
            };
            ("key", describe(&transition))
        }
        Step::Settle => {
            controller.settle().await?;
            ("settle", "settled".to_string())
        }
    };
    Ok(result)
}

fn describe(transition: &Transition) -> String {
    match transition {
        Transition::Vetoed => "vetoed".to_string(),
        Transition::Closed(ids) => {
            let ids: Vec<&str> = ids.iter().map(DialogId::as_str).collect();
            format!("closed {}", ids.join(", "))
        }
        Transition::Switched { from, to } => format!("switched {from} -> {to}"),
        Transition::Deferred => "deferred".to_string(),
        Transition::Busy => "busy".to_string(),
        Transition::Ignored => "ignored".to_string(),
    }
}

fn print_text(report: &StepReport) {
    println!("#{} {}: {}", report.step, report.op, report.outcome);
    if report.registry.dialogs.is_empty() {
        println!("   (no dialogs)");
    }
    for dialog in &report.registry.dialogs {
        let marker = if dialog.active { '*' } else { ' ' };
        match &dialog.group {
            Some(group) => println!("  {marker} {} [{group}]", dialog.id),
            None => println!("  {marker} {}", dialog.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(json: &str) -> Scenario {
        serde_json::from_str(json).unwrap()
    }

    fn active(report: &StepReport) -> Option<&str> {
        report
            .registry
            .dialogs
            .iter()
            .find(|dialog| dialog.active)
            .map(|dialog| dialog.id.as_str())
    }

    #[tokio::test]
    async fn test_next_then_reject_reactivates_first() {
        let scenario = scenario(
            r#"{
                "steps": [
                    {"op": "add", "dialogs": [
                        {"id": "a", "content": {"next": [{"goto": "b"}]}},
                        {"id": "b"}
                    ]},
                    {"op": "key", "key": "tab"},
                    {"op": "reject"}
                ]
            }"#,
        );

        let reports = replay(scenario, ModalSettings::default()).await.unwrap();

        assert_eq!(active(&reports[0]), Some("a"));
        assert_eq!(reports[1].outcome, "switched a -> b");
        assert_eq!(active(&reports[1]), Some("b"));
        assert_eq!(reports[2].outcome, "closed b");
        assert_eq!(active(&reports[2]), Some("a"));
    }

    #[tokio::test]
    async fn test_group_submit_empties_registry() {
        let scenario = scenario(
            r#"{
                "steps": [
                    {"op": "add", "dialogs": [
                        {"id": "a", "group": "g1"},
                        {"id": "c", "group": "g1"}
                    ]},
                    {"op": "submit"}
                ]
            }"#,
        );

        let reports = replay(scenario, ModalSettings::default()).await.unwrap();

        assert_eq!(reports[1].outcome, "closed a, c");
        assert!(reports[1].registry.dialogs.is_empty());
    }

    #[tokio::test]
    async fn test_delayed_submit_closes_after_settle() {
        let scenario = scenario(
            r#"{
                "steps": [
                    {"op": "add", "dialogs": [{"id": "a", "content": {"submit": [{"delay": 50}]}}]},
                    {"op": "submit"},
                    {"op": "submit"},
                    {"op": "settle"}
                ]
            }"#,
        );

        let reports = replay(scenario, ModalSettings::default()).await.unwrap();

        assert_eq!(reports[1].outcome, "deferred");
        assert_eq!(reports[1].registry.dialogs.len(), 1);
        assert_eq!(reports[2].outcome, "busy");
        assert!(reports[3].registry.dialogs.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_key_fails_step() {
        let scenario = scenario(r#"{"steps": [{"op": "key", "key": "f13"}]}"#);
        let err = replay(scenario, ModalSettings::default()).await.unwrap_err();
        assert!(err.to_string().contains("Step 1"));
    }

    #[tokio::test]
    async fn test_execute_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.json");
        std::fs::write(
            &path,
            r#"{"settings": {"default_effect": "fade"}, "steps": [{"op": "add", "dialogs": [{"id": "a"}]}]}"#,
        )
        .unwrap();

        let command = ReplayCommand {
            file: path,
            format: OutputFormat::Json,
        };
        command.execute(ModalSettings::default()).await.unwrap();

        let missing = ReplayCommand {
            file: dir.path().join("missing.json"),
            format: OutputFormat::Text,
        };
        assert!(missing.execute(ModalSettings::default()).await.is_err());
    }
}
