use super::fields::Control;
use crate::error::ValidationWarning;
use std::fmt;

/// Actions the form offers to the editor shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Save,
    Close,
}

impl FormAction {
    pub fn label(&self) -> &'static str {
        match self {
            FormAction::Save => "Save",
            FormAction::Close => "Close",
        }
    }
}

/// One visible property, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedField {
    pub key: String,
    pub label: String,
    pub control: Control,
}

/// The rendered state of a settings form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormView {
    /// Shown for node types the registry does not know.
    Fallback {
        message: String,
        actions: Vec<FormAction>,
    },
    Form {
        title: String,
        fields: Vec<RenderedField>,
        warnings: Vec<ValidationWarning>,
        /// A dismissible message from a failed upstream request.
        error: Option<String>,
        actions: Vec<FormAction>,
    },
}

impl FormView {
    pub fn actions(&self) -> &[FormAction] {
        match self {
            FormView::Fallback { actions, .. } | FormView::Form { actions, .. } => actions,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, FormView::Fallback { .. })
    }

    pub fn field(&self, key: &str) -> Option<&RenderedField> {
        match self {
            FormView::Form { fields, .. } => fields.iter().find(|f| f.key == key),
            FormView::Fallback { .. } => None,
        }
    }
}

/// Renders the form as plain text, one line per field.
impl fmt::Display for FormView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormView::Fallback { message, actions } => {
                writeln!(f, "{}", message)?;
                write_actions(f, actions)
            }
            FormView::Form {
                title,
                fields,
                warnings,
                error,
                actions,
            } => {
                writeln!(f, "== {} ==", title)?;
                for field in fields {
                    writeln!(f, "{}: {}", field.label, format_control(&field.control))?;
                }
                for warning in warnings {
                    let marker = if warning.blocking { "!" } else { "?" };
                    writeln!(f, "[{}] {}", marker, warning)?;
                }
                if let Some(error) = error {
                    writeln!(f, "[error] {}", error)?;
                }
                write_actions(f, actions)
            }
        }
    }
}

fn write_actions(f: &mut fmt::Formatter<'_>, actions: &[FormAction]) -> fmt::Result {
    let labels: Vec<&str> = actions.iter().map(FormAction::label).collect();
    write!(f, "[{}]", labels.join("] ["))
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn quoted(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("{:?}", s)).collect();
    format!("[{}]", quoted.join(", "))
}

fn format_control(control: &Control) -> String {
    match control {
        Control::TextInput { value, .. } | Control::TextArea { value, .. } => format!("{:?}", value),
        Control::NumberInput { value, .. } => value.to_string(),
        Control::Checkbox { checked } => (if *checked { "[x]" } else { "[ ]" }).to_string(),
        Control::Select { selected, options } | Control::Radio { selected, options } => {
            let label = options
                .iter()
                .find(|o| &o.value == selected)
                .map(|o| o.label.as_str())
                .unwrap_or(selected.as_str());
            format!("{} ({} options)", label, options.len())
        }
        Control::Slider { value, min, max, .. } => format!(
            "{} in {}..{}",
            format_number(*value),
            format_number(*min),
            format_number(*max)
        ),
        Control::Upload { assets, selected, .. } => {
            let names: Vec<String> = assets.iter().map(|a| a.name.clone()).collect();
            match selected {
                Some(id) => format!("{} (selected {})", quoted(&names), id),
                None => quoted(&names),
            }
        }
        Control::TextList { items, .. } => quoted(items),
        Control::TestCases(cases) => {
            let cases: Vec<String> = cases
                .iter()
                .map(|c| format!("{} -> {:?}", quoted(&c.parameters), c.expected_result))
                .collect();
            format!("{} test case(s) {}", cases.len(), cases.join("; "))
        }
        Control::Questions(questions) => format!("{} question(s)", questions.len()),
        Control::SubmissionPrompts(prompts) => format!("{} prompt(s)", prompts.len()),
        Control::LivePrompts { prompts, .. } => format!("{} statement(s)", prompts.len()),
        Control::Variables(variables) => {
            let names: Vec<String> = variables.iter().map(|v| v.name.clone()).collect();
            quoted(&names)
        }
        Control::MultiSelect { options, selected } => {
            format!("{} of {} selected", selected.len(), options.len())
        }
    }
}
