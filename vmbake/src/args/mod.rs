//! QEMU command-line synthesis.
//!
//! ## Pipeline
//!
//! ```text
//! qemuargs ──→ template::expand_overrides ──┐
//!                                           ├──→ merge::MultiValueMap ──→ tokens
//! config + facts ──→ defaults::build ───────┘
//! ```
//!
//! Override rows win over defaults by switch name. A switch repeated in the
//! overrides is emitted once per value, which QEMU accepts for `-device`,
//! `-drive`, `-netdev` and friends.

pub mod defaults;
pub mod merge;
pub mod template;

pub use defaults::DefaultArgs;
pub use merge::MultiValueMap;
pub use template::{GoTemplateRenderer, TemplateData, TemplateRenderer};

use crate::config::QemuConfig;
use crate::constants::step as const_step;
use crate::errors::ArgumentSynthesisError;
use crate::facts::RuntimeFacts;
use crate::ui::Ui;

/// One override row: the switch followed by fragments that are concatenated
/// without separator into its value.
pub type FlagRow = Vec<String>;

/// Build the full QEMU argument list for one launch.
///
/// Defaults are computed first, then `qemuargs` are rendered and merged on
/// top. Nothing is cached between calls.
pub fn synthesize(
    config: &QemuConfig,
    boot_drive: &str,
    facts: &RuntimeFacts,
    ui: &dyn Ui,
    renderer: &dyn TemplateRenderer,
) -> Result<Vec<String>, ArgumentSynthesisError> {
    let defaults = defaults::build(config, boot_drive, facts, ui);

    let overrides = if config.qemuargs.is_empty() {
        Vec::new()
    } else {
        ui.say(const_step::OVERRIDE_NOTICE);
        let data = TemplateData::new(config, facts);
        template::expand_overrides(&config.qemuargs, renderer, &data)?
    };

    let tokens = merge::merge(&overrides, &defaults);
    tracing::debug!(args = ?tokens, "Synthesized QEMU arguments");
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::TracingUi;
    use std::path::PathBuf;

    fn facts() -> RuntimeFacts {
        RuntimeFacts {
            iso_path: PathBuf::from("/cache/debian.iso"),
            vnc_port: 5901,
            ssh_host_port: 3222,
            http_port: 8123,
            floppy_path: None,
        }
    }

    fn value_of<'a>(tokens: &'a [String], key: &str) -> Vec<&'a str> {
        tokens
            .windows(2)
            .filter(|w| w[0] == key)
            .map(|w| w[1].as_str())
            .collect()
    }

    #[test]
    fn test_synthesize_without_overrides() {
        let config = QemuConfig {
            vm_name: "debian".into(),
            ..Default::default()
        };
        let tokens = synthesize(&config, "once=d", &facts(), &TracingUi, &GoTemplateRenderer).unwrap();

        assert_eq!(value_of(&tokens, "-name"), vec!["debian"]);
        assert_eq!(value_of(&tokens, "-vnc"), vec!["0.0.0.0:1"]);
        assert_eq!(value_of(&tokens, "-boot"), vec!["once=d"]);
        assert_eq!(value_of(&tokens, "-m"), vec!["512M"]);
    }

    #[test]
    fn test_synthesize_renders_and_overrides() {
        let config = QemuConfig {
            vm_name: "debian".into(),
            qemuargs: vec![
                vec!["-m".into(), "1024M".into()],
                vec![
                    "-fw_cfg".into(),
                    "name=opt/url,string=http://{{ .HTTPIP }}:{{ .HTTPPort }}/preseed.cfg".into(),
                ],
            ],
            ..Default::default()
        };
        let tokens = synthesize(&config, "once=d", &facts(), &TracingUi, &GoTemplateRenderer).unwrap();

        assert_eq!(value_of(&tokens, "-m"), vec!["1024M"]);
        assert_eq!(
            value_of(&tokens, "-fw_cfg"),
            vec!["name=opt/url,string=http://10.0.2.2:8123/preseed.cfg"]
        );
    }

    #[test]
    fn test_synthesize_fails_on_bad_template() {
        let config = QemuConfig {
            qemuargs: vec![vec!["-name".into(), "{{ .Name".into()]],
            ..Default::default()
        };
        let err = synthesize(&config, "once=d", &facts(), &TracingUi, &GoTemplateRenderer).unwrap_err();
        assert_eq!(err.source.fragment, "{{ .Name");
    }
}
