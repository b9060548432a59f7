//! Route card: one route's inputs, previews and expansion state.
//!
//! Cards never expand themselves; the [`Playground`](crate::controller::Playground)
//! that owns them issues every expand/collapse so that at most one card is
//! open at a time. Cards never touch the network either: sending hands the
//! captured [`Params`] back to the controller.

use std::path::Path;
use std::time::{Duration, Instant};

use playground_client::model::display_value;
use playground_client::{FileUpload, InputKind, ParameterDescriptor, RouteDescriptor};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::integrations::Clipboard;
use crate::params::{ParamValue, Params};
use crate::preview;

/// How long the copy affordance stays highlighted after a successful copy
pub const COPY_FLASH: Duration = Duration::from_millis(500);

/// Input edits the card refuses
#[derive(Debug, Error)]
pub enum CardError {
    #[error("No parameter named `{0}`")]
    UnknownParameter(String),

    #[error("Parameter `{name}` is not a {expected} input")]
    WrongKind { name: String, expected: &'static str },

    #[error("Only {accept} files are accepted, got `{file}`")]
    RejectedFile { accept: &'static str, file: String },

    #[error("Failed to read `{file}`: {source}")]
    Unreadable {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

/// Current value of one input
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Checked(bool),
    Text(String),
    File(Option<FileUpload>),
}

/// One rendered parameter input
#[derive(Debug, Clone, PartialEq)]
pub struct ParamInput {
    pub descriptor: ParameterDescriptor,
    pub value: InputValue,
}

impl ParamInput {
    /// Input seeded from the parameter's default
    pub fn new(descriptor: ParameterDescriptor) -> Self {
        let value = match descriptor.kind {
            InputKind::Checkbox => InputValue::Checked(matches!(descriptor.default, Some(Value::Bool(true)))),
            InputKind::File { .. } => InputValue::File(None),
            InputKind::Number | InputKind::Text => {
                InputValue::Text(descriptor.default.as_ref().map(display_value).unwrap_or_default())
            }
        };
        Self { descriptor, value }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn kind(&self) -> InputKind {
        self.descriptor.kind
    }

    /// Captured value, if this input contributes one
    fn captured(&self) -> Option<ParamValue> {
        match &self.value {
            InputValue::Checked(b) => Some(ParamValue::Bool(*b)),
            InputValue::File(file) => file.clone().map(ParamValue::File),
            InputValue::Text(text) if !text.is_empty() => Some(ParamValue::Text(text.clone())),
            InputValue::Text(_) => None,
        }
    }
}

/// UI state of one route
#[derive(Debug, Clone)]
pub struct RouteCard {
    route: RouteDescriptor,
    base_url: String,
    inputs: Vec<ParamInput>,
    collapsed: bool,
    url_preview: String,
    requests_preview: String,
    copied_at: Option<Instant>,
}

impl RouteCard {
    /// Card for `route`, previews resolved against `base_url`
    pub fn new(route: RouteDescriptor, base_url: impl Into<String>) -> Self {
        let inputs = route.parameters.iter().cloned().map(ParamInput::new).collect();
        let mut card = Self {
            route,
            base_url: base_url.into(),
            inputs,
            collapsed: true,
            url_preview: String::new(),
            requests_preview: String::new(),
            copied_at: None,
        };
        card.refresh_previews();
        card
    }

    pub fn path(&self) -> &str {
        &self.route.path
    }

    pub fn route(&self) -> &RouteDescriptor {
        &self.route
    }

    pub fn inputs(&self) -> &[ParamInput] {
        &self.inputs
    }

    pub fn input(&self, name: &str) -> Option<&ParamInput> {
        self.inputs.iter().find(|i| i.name() == name)
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub(crate) fn expand(&mut self) {
        self.collapsed = false;
    }

    pub(crate) fn collapse(&mut self) {
        self.collapsed = true;
    }

    pub fn url_preview(&self) -> &str {
        &self.url_preview
    }

    pub fn requests_preview(&self) -> &str {
        &self.requests_preview
    }

    /// Current input values as a name→value mapping
    pub fn get_params(&self) -> Params {
        self.inputs
            .iter()
            .filter_map(|input| input.captured().map(|v| (input.name().to_string(), v)))
            .collect()
    }

    /// Reseed inputs from restored link state
    pub fn set_params(&mut self, data: &Map<String, Value>) {
        for (name, value) in data {
            let Some(input) = self.inputs.iter_mut().find(|i| i.descriptor.name == *name) else {
                continue;
            };
            match &mut input.value {
                InputValue::Checked(checked) => match value {
                    Value::Bool(b) => *checked = *b,
                    Value::String(s) if s == "true" || s == "false" => *checked = s == "true",
                    _ => tracing::debug!(%name, "Ignoring non-boolean value for checkbox"),
                },
                InputValue::Text(text) => *text = display_value(value),
                InputValue::File(_) => {}
            }
        }
        self.refresh_previews();
    }

    /// Replace the text of a text or numeric input
    pub fn set_text(&mut self, name: &str, text: impl Into<String>) -> Result<(), CardError> {
        let input = self.input_mut(name)?;
        match &mut input.value {
            InputValue::Text(current) => *current = text.into(),
            _ => {
                return Err(CardError::WrongKind {
                    name: name.to_string(),
                    expected: "text",
                })
            }
        }
        self.refresh_previews();
        Ok(())
    }

    /// Append one typed character to a text or numeric input
    pub fn push_char(&mut self, name: &str, c: char) -> Result<(), CardError> {
        let input = self.input_mut(name)?;
        match (&mut input.value, input.descriptor.kind) {
            (InputValue::Text(_), InputKind::Number) if !(c.is_ascii_digit() || "+-.eE".contains(c)) => {}
            (InputValue::Text(current), _) => current.push(c),
            _ => {
                return Err(CardError::WrongKind {
                    name: name.to_string(),
                    expected: "text",
                })
            }
        }
        self.refresh_previews();
        Ok(())
    }

    /// Remove the last character of a text or numeric input
    pub fn pop_char(&mut self, name: &str) -> Result<(), CardError> {
        let input = self.input_mut(name)?;
        match &mut input.value {
            InputValue::Text(current) => {
                current.pop();
            }
            _ => {
                return Err(CardError::WrongKind {
                    name: name.to_string(),
                    expected: "text",
                })
            }
        }
        self.refresh_previews();
        Ok(())
    }

    /// Flip a checkbox
    pub fn toggle_checkbox(&mut self, name: &str) -> Result<bool, CardError> {
        let input = self.input_mut(name)?;
        let checked = match &mut input.value {
            InputValue::Checked(checked) => {
                *checked = !*checked;
                *checked
            }
            _ => {
                return Err(CardError::WrongKind {
                    name: name.to_string(),
                    expected: "checkbox",
                })
            }
        };
        self.refresh_previews();
        Ok(checked)
    }

    /// Choose the file for a file input, enforcing its accepted extension
    pub fn select_file(&mut self, name: &str, path: &Path) -> Result<(), CardError> {
        let input = self.input_mut(name)?;
        let InputKind::File { accept } = input.descriptor.kind else {
            return Err(CardError::WrongKind {
                name: name.to_string(),
                expected: "file",
            });
        };

        let file = path.display().to_string();
        let extension_ok = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()).eq_ignore_ascii_case(accept))
            .unwrap_or(false);
        if !extension_ok {
            return Err(CardError::RejectedFile { accept, file });
        }

        let upload = FileUpload::from_path(path).map_err(|source| CardError::Unreadable { file, source })?;
        tracing::debug!(param = %name, file = %upload.file_name, size = upload.bytes.len(), "File selected");
        input.value = InputValue::File(Some(upload));
        self.refresh_previews();
        Ok(())
    }

    /// Copy the requests snippet, flashing the affordance on success
    pub fn copy_requests_preview(&mut self, clipboard: &mut dyn Clipboard) {
        match clipboard.write_text(&self.requests_preview) {
            Ok(()) => self.copied_at = Some(Instant::now()),
            Err(e) => tracing::error!(route = %self.route.path, error = %e, "Failed to copy text"),
        }
    }

    /// Whether the copy affordance is still highlighted at `now`
    pub fn copy_flash_active(&self, now: Instant) -> bool {
        self.copied_at
            .map(|at| now.saturating_duration_since(at) < COPY_FLASH)
            .unwrap_or(false)
    }

    fn input_mut(&mut self, name: &str) -> Result<&mut ParamInput, CardError> {
        self.inputs
            .iter_mut()
            .find(|i| i.descriptor.name == name)
            .ok_or_else(|| CardError::UnknownParameter(name.to_string()))
    }

    fn refresh_previews(&mut self) {
        let params = self.get_params();
        self.url_preview = preview::url_preview(&self.base_url, &self.route, &params);
        self.requests_preview = preview::requests_preview(&self.base_url, &self.route, &params);
    }
}
