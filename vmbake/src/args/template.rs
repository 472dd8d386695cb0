//! Template expansion for override rows.
//!
//! Fragments use Go text/template syntax, e.g.
//! `"-fw_cfg", "string=http://{{ .HTTPIP }}:{{ .HTTPPort }}/ks.cfg"`.
//!
//! Fields available to templates:
//!
//! | Field       | Value                                   |
//! |-------------|-----------------------------------------|
//! | `HTTPIP`    | host address seen from the guest        |
//! | `HTTPPort`  | port of the build HTTP server           |
//! | `HTTPDir`   | directory served by the HTTP server     |
//! | `OutputDir` | build output directory                  |
//! | `Name`      | VM name                                 |
//! | `Vars`      | user variables (`{{ .Vars.key }}`)      |

use std::collections::{BTreeMap, HashMap};

use gtmpl_value::Value;

use super::FlagRow;
use crate::config::QemuConfig;
use crate::constants::qemu as const_qemu;
use crate::errors::RenderError;
use crate::facts::RuntimeFacts;

/// Renders one fragment against the template data.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, fragment: &str, data: &TemplateData) -> Result<String, RenderError>;
}

/// Values exposed to `qemuargs` templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateData {
    pub http_ip: String,
    pub http_port: u16,
    pub http_dir: String,
    pub output_dir: String,
    pub name: String,
    pub vars: BTreeMap<String, String>,
}

impl TemplateData {
    pub fn new(config: &QemuConfig, facts: &RuntimeFacts) -> Self {
        Self {
            http_ip: const_qemu::HTTP_GUEST_IP.to_string(),
            http_port: facts.http_port,
            http_dir: config.http_directory.clone(),
            output_dir: config.output_directory.to_string_lossy().to_string(),
            name: config.vm_name.clone(),
            vars: config.variables.clone(),
        }
    }

    fn to_value(&self) -> Value {
        let vars: HashMap<String, Value> = self
            .vars
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.clone())))
            .collect();

        let mut fields = HashMap::new();
        fields.insert("HTTPIP".to_string(), Value::from(self.http_ip.clone()));
        fields.insert("HTTPPort".to_string(), Value::from(u64::from(self.http_port)));
        fields.insert("HTTPDir".to_string(), Value::from(self.http_dir.clone()));
        fields.insert("OutputDir".to_string(), Value::from(self.output_dir.clone()));
        fields.insert("Name".to_string(), Value::from(self.name.clone()));
        fields.insert("Vars".to_string(), Value::Map(vars));
        Value::Object(fields)
    }
}

/// Go text/template renderer backed by `gtmpl`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoTemplateRenderer;

/// What gtmpl prints for a missing map entry instead of failing.
const MISSING_VALUE: &str = "<no value>";

impl TemplateRenderer for GoTemplateRenderer {
    fn render(&self, fragment: &str, data: &TemplateData) -> Result<String, RenderError> {
        // Text without actions renders as itself.
        if !fragment.contains("{{") {
            return Ok(fragment.to_string());
        }

        if let Some(key) = missing_var(fragment, data) {
            return Err(RenderError::new(
                fragment,
                format!("no variable named {key:?}"),
            ));
        }

        let rendered = gtmpl::template(fragment, data.to_value())
            .map_err(|e| RenderError::new(fragment, redact(&e.to_string(), data)))?;

        if rendered.contains(MISSING_VALUE) && !fragment.contains(MISSING_VALUE) {
            return Err(RenderError::new(fragment, "template references an undefined value"));
        }
        Ok(rendered)
    }
}

/// First `.Vars.<key>` reference whose key is not defined.
fn missing_var<'a>(fragment: &'a str, data: &TemplateData) -> Option<&'a str> {
    const PREFIX: &str = ".Vars.";

    let mut rest = fragment;
    while let Some(idx) = rest.find(PREFIX) {
        rest = &rest[idx + PREFIX.len()..];
        let end = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let key = &rest[..end];
        if !key.is_empty() && !data.vars.contains_key(key) {
            return Some(key);
        }
        rest = &rest[end..];
    }
    None
}

/// Drop the context dump gtmpl appends to field errors and mask variable values.
fn redact(message: &str, data: &TemplateData) -> String {
    let mut message = match message.find(" for {") {
        Some(idx) => message[..idx].to_string(),
        None => message.to_string(),
    };
    for value in data.vars.values().filter(|v| !v.is_empty()) {
        message = message.replace(value.as_str(), "***");
    }
    message
}

/// Render every fragment of every row.
///
/// The result has exactly the shape of the input. The first failure aborts
/// the whole expansion.
pub fn expand_overrides(
    rows: &[FlagRow],
    renderer: &dyn TemplateRenderer,
    data: &TemplateData,
) -> Result<Vec<FlagRow>, RenderError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    rows.iter()
        .map(|row| {
            row.iter()
                .map(|fragment| renderer.render(fragment, data))
                .collect::<Result<FlagRow, _>>()
        })
        .collect()
}
