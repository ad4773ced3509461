//! Page composition
//!
//! Groups one control per declared field into sections by role, and wires
//! the outcome buttons and user input to the host bridge. Rendering is a
//! plain-text preview of the page; no UI toolkit is involved.

use std::fmt;

use serde::Serialize;

use crate::controls::{FieldControl, RenderedControl};
use crate::error::{ActionFormError, Result};
use crate::host::{Completion, HostBridge};
use crate::schema::{ActionSchema, FieldRole};
use crate::store::{FormView, SetOutcome};

/// Shown until the first host envelope arrives
pub const PREVIEW_BANNER: &str = "Preview: showing default data until the host connects";

const SECTION_ORDER: [FieldRole; 3] = [FieldRole::Input, FieldRole::InOut, FieldRole::Output];

#[derive(Debug, Clone)]
pub struct PageSection {
    pub title: &'static str,
    pub role: FieldRole,
    pub controls: Vec<FieldControl>,
}

#[derive(Debug, Clone)]
pub struct Page {
    sections: Vec<PageSection>,
    outcomes: Vec<String>,
}

fn section_title(role: FieldRole) -> &'static str {
    match role {
        FieldRole::Input => "Task details",
        FieldRole::InOut => "Review",
        FieldRole::Output => "Response",
    }
}

impl Page {
    /// One section per role that declares at least one field
    pub fn compose(schema: &ActionSchema) -> Self {
        let sections = SECTION_ORDER
            .iter()
            .map(|role| PageSection {
                title: section_title(*role),
                role: *role,
                controls: schema
                    .fields_with_role(*role)
                    .map(FieldControl::for_field)
                    .collect(),
            })
            .filter(|s| !s.controls.is_empty())
            .collect();
        Self {
            sections,
            outcomes: schema.outcomes().to_vec(),
        }
    }

    pub fn sections(&self) -> &[PageSection] {
        &self.sections
    }

    pub fn outcomes(&self) -> &[String] {
        &self.outcomes
    }

    pub fn control(&self, name: &str) -> Option<&FieldControl> {
        self.sections
            .iter()
            .flat_map(|s| s.controls.iter())
            .find(|c| c.name() == name)
    }

    /// Raw user input for one field, coerced by its control
    pub async fn apply_input(
        &self,
        bridge: &mut HostBridge,
        name: &str,
        raw: &str,
    ) -> Result<SetOutcome> {
        let control = self
            .control(name)
            .ok_or_else(|| ActionFormError::UnknownField {
                name: name.to_string(),
            })?;
        let value = control.parse(raw)?;
        bridge.update_field(name, value).await
    }

    /// Outcome button pressed
    pub async fn press(&self, bridge: &mut HostBridge, outcome: &str) -> Result<Completion> {
        bridge.complete_task(outcome).await
    }

    pub fn render(&self, view: &FormView, theme: &str, language: &str) -> RenderedPage {
        let sections = self
            .sections
            .iter()
            .map(|section| RenderedSection {
                title: section.title.to_string(),
                controls: section
                    .controls
                    .iter()
                    .map(|c| c.render(view.values.get(c.name()), view.is_read_only))
                    .collect(),
            })
            .collect();
        let buttons = self
            .outcomes
            .iter()
            .map(|label| OutcomeButton {
                label: label.clone(),
                enabled: !view.is_read_only,
            })
            .collect();

        RenderedPage {
            banner: (!view.has_host_data).then(|| PREVIEW_BANNER.to_string()),
            theme: theme.to_string(),
            language: language.to_string(),
            sections,
            buttons,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeButton {
    pub label: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedSection {
    pub title: String,
    pub controls: Vec<RenderedControl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedPage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    pub theme: String,
    pub language: String,
    pub sections: Vec<RenderedSection>,
    pub buttons: Vec<OutcomeButton>,
}

impl fmt::Display for RenderedPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(banner) = &self.banner {
            writeln!(f, "({})", banner)?;
        }
        writeln!(f, "[theme: {}, language: {}]", self.theme, self.language)?;
        for section in &self.sections {
            writeln!(f)?;
            writeln!(f, "== {} ==", section.title)?;
            for control in &section.controls {
                let marker = if control.required { "*" } else { "" };
                let lock = if control.enabled { "" } else { " (locked)" };
                writeln!(
                    f,
                    "  {}{} [{}]{}: {}",
                    control.name,
                    marker,
                    control.kind.label(),
                    lock,
                    control.display
                )?;
            }
        }
        writeln!(f)?;
        let buttons: Vec<String> = self
            .buttons
            .iter()
            .map(|b| {
                if b.enabled {
                    format!("[{}]", b.label)
                } else {
                    format!("[{} (disabled)]", b.label)
                }
            })
            .collect();
        write!(f, "{}", buttons.join(" "))
    }
}
