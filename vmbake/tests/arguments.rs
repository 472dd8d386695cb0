//! Integration tests for QEMU argument synthesis.

use std::collections::BTreeMap;
use std::path::PathBuf;

use proptest::prelude::*;
use vmbake::args::{self, DefaultArgs, GoTemplateRenderer, MultiValueMap};
use vmbake::errors::ArgumentSynthesisError;
use vmbake::{QemuConfig, RuntimeFacts};
use vmbake_test_utils::{RecordingUi, row, sample_config, sample_facts};

// ============================================================================
// HELPERS
// ============================================================================

/// Regroup a flat token list as switch → ordered values.
///
/// A token starting with `-` opens a bucket; the following non-switch token,
/// if any, is its value.
fn buckets(tokens: &[String]) -> BTreeMap<String, Vec<String>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut i = 0;
    while i < tokens.len() {
        let key = tokens[i].clone();
        let bucket = out.entry(key).or_default();
        match tokens.get(i + 1) {
            Some(next) if !next.starts_with('-') => {
                bucket.push(next.clone());
                i += 2;
            }
            _ => i += 1,
        }
    }
    out
}

fn synth(config: &QemuConfig, facts: &RuntimeFacts) -> Vec<String> {
    let ui = RecordingUi::new();
    args::synthesize(config, "once=d", facts, ui.as_ref(), &GoTemplateRenderer).unwrap()
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn defaults_pass_through_when_no_overrides() {
    let defaults: DefaultArgs = [("-m", "512M"), ("-boot", "dc")].into_iter().collect();
    let tokens = args::merge::merge(&[], &defaults);

    let got = buckets(&tokens);
    assert_eq!(got.len(), 2);
    assert_eq!(got["-m"], vec!["512M"]);
    assert_eq!(got["-boot"], vec!["dc"]);
}

#[test]
fn override_drops_default_for_same_switch() {
    let defaults: DefaultArgs = [("-machine", "type=pc")].into_iter().collect();
    let tokens = args::merge::merge(&[row(&["-machine", "type=pc,accel=kvm"])], &defaults);

    assert_eq!(tokens, vec!["-machine", "type=pc,accel=kvm"]);
}

#[test]
fn repeated_device_rows_emit_one_pair_each() {
    let rows = vec![row(&["-device", "virtio-net"]), row(&["-device", "e1000"])];
    let tokens = args::merge::merge(&rows, &DefaultArgs::new());

    assert_eq!(tokens, vec!["-device", "virtio-net", "-device", "e1000"]);
}

fn synthesize_overrides(rows: Vec<Vec<String>>) -> Result<Vec<String>, ArgumentSynthesisError> {
    let mut config = QemuConfig {
        qemuargs: rows,
        ..sample_config()
    };
    config
        .variables
        .insert("root_password".to_string(), "hunter2".to_string());
    let ui = RecordingUi::new();
    args::synthesize(&config, "once=d", &sample_facts(), ui.as_ref(), &GoTemplateRenderer)
}

#[test]
fn undefined_placeholder_fails_synthesis() {
    let err = synthesize_overrides(vec![
        row(&["-device", "e1000"]),
        row(&["-name", "{{ .Missing }}"]),
    ])
    .unwrap_err();

    assert_eq!(err.source.fragment, "{{ .Missing }}");
    assert!(err.to_string().starts_with("while processing override arguments"));
    assert!(!err.to_string().contains("hunter2"));
}

#[test]
fn undefined_variable_fails_synthesis() {
    let err = synthesize_overrides(vec![row(&["-append", "mirror={{ .Vars.mirror }}"])])
        .unwrap_err();

    assert_eq!(err.source.fragment, "mirror={{ .Vars.mirror }}");
    assert!(!err.to_string().contains("hunter2"));
}

#[test]
fn defined_variable_renders() {
    let tokens = synthesize_overrides(vec![row(&["-append", "pw={{ .Vars.root_password }}"])])
        .unwrap();

    assert!(tokens.contains(&"pw=hunter2".to_string()));
}

#[test]
fn malformed_template_fails_with_go_renderer() {
    let config = QemuConfig {
        qemuargs: vec![row(&["-device", "e1000"]), row(&["-name", "{{ .Name"])],
        ..sample_config()
    };
    let ui = RecordingUi::new();
    let result = args::synthesize(&config, "once=d", &sample_facts(), ui.as_ref(), &GoTemplateRenderer);

    assert!(result.is_err());
}

#[test]
fn headless_has_no_display_and_warns_once() {
    let config = QemuConfig {
        headless: true,
        ..sample_config()
    };
    let ui = RecordingUi::new();
    let defaults = args::defaults::build(&config, "once=d", &sample_facts(), ui.as_ref());

    assert!(!defaults.contains_key("-display"));
    let warnings: Vec<_> = ui
        .messages()
        .into_iter()
        .filter(|m| m.contains("headless"))
        .collect();
    assert_eq!(warnings.len(), 1);
}

#[test]
fn empty_override_yields_bare_flag_without_default() {
    let config = QemuConfig {
        qemuargs: vec![row(&["-display", "{{ .HTTPDir }}"])],
        http_directory: String::new(),
        ..sample_config()
    };
    let got = buckets(&synth(&config, &sample_facts()));

    assert_eq!(got["-display"], Vec::<String>::new());
}

#[test]
fn templates_resolve_runtime_facts() {
    let config = QemuConfig {
        qemuargs: vec![
            row(&["-drive", "file={{ .OutputDir }}/{{ .Name }}-data.qcow2", ",if=virtio"]),
            row(&["-append", "ks=http://{{ .HTTPIP }}:{{ .HTTPPort }}/ks.cfg"]),
        ],
        ..sample_config()
    };
    let got = buckets(&synth(&config, &sample_facts()));

    assert_eq!(
        got["-drive"],
        vec!["file=/builds/output-debian/debian-12-data.qcow2,if=virtio"]
    );
    assert_eq!(got["-append"], vec!["ks=http://10.0.2.2:8765/ks.cfg"]);
    // untouched defaults survive
    assert_eq!(got["-m"], vec!["512M"]);
    assert_eq!(got["-vnc"], vec!["0.0.0.0:32"]);
}

#[test]
fn override_notice_only_with_overrides() {
    let ui = RecordingUi::new();
    args::synthesize(&sample_config(), "once=d", &sample_facts(), ui.as_ref(), &GoTemplateRenderer)
        .unwrap();
    assert!(ui.says().is_empty());

    let config = QemuConfig {
        qemuargs: vec![row(&["-snapshot"])],
        ..sample_config()
    };
    args::synthesize(&config, "once=d", &sample_facts(), ui.as_ref(), &GoTemplateRenderer).unwrap();
    assert_eq!(ui.says().len(), 1);
}

#[test]
fn floppy_only_when_discovered() {
    let without = buckets(&synth(&sample_config(), &sample_facts()));
    assert!(!without.contains_key("-fda"));

    let facts = RuntimeFacts {
        floppy_path: Some(PathBuf::from("/tmp/floppy.vfd")),
        ..sample_facts()
    };
    let with = buckets(&synth(&sample_config(), &facts));
    assert_eq!(with["-fda"], vec!["/tmp/floppy.vfd"]);
}

// ============================================================================
// PROPERTIES
// ============================================================================

fn switch() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "-m", "-boot", "-device", "-drive", "-netdev", "-machine", "-vnc", "-name", "-snapshot",
    ])
    .prop_map(|s| s.to_string())
}

fn value() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), "[a-z0-9=,.]{1,12}"]
}

fn overrides() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(
        (switch(), prop::collection::vec(value(), 0..3)).prop_map(|(k, vs)| {
            let mut row = vec![k];
            row.extend(vs);
            row
        }),
        0..8,
    )
}

fn defaults() -> impl Strategy<Value = DefaultArgs> {
    prop::collection::btree_map(switch(), "[a-z0-9=,.]{1,12}", 0..6)
        .prop_map(|m| m.into_iter().collect())
}

proptest! {
    #[test]
    fn default_survives_iff_switch_not_overridden(o in overrides(), d in defaults()) {
        let map = {
            let mut map = MultiValueMap::from_overrides(&o);
            map.backfill(&d);
            map
        };
        for (key, value) in d.iter() {
            let overridden = o.iter().any(|r| r[0] == key);
            let bucket = map.get(key).unwrap();
            if overridden {
                let expected: Vec<String> = o
                    .iter()
                    .filter(|r| r[0] == key)
                    .map(|r| r[1..].concat())
                    .filter(|v| !v.is_empty())
                    .collect();
                prop_assert_eq!(bucket, expected.as_slice());
            } else {
                prop_assert_eq!(bucket, &[value.to_string()][..]);
            }
        }
    }

    #[test]
    fn each_override_value_is_one_pair(o in overrides(), d in defaults()) {
        let tokens = args::merge::merge(&o, &d);
        let map = {
            let mut map = MultiValueMap::from_overrides(&o);
            map.backfill(&d);
            map
        };

        let expected_len: usize = map
            .iter()
            .map(|(_, values)| if values.is_empty() { 1 } else { values.len() * 2 })
            .sum();
        prop_assert_eq!(tokens.len(), expected_len);

        for (key, values) in map.iter() {
            let emitted: Vec<&String> = tokens
                .windows(2)
                .filter(|w| w[0] == key && values.contains(&w[1]))
                .map(|w| &w[1])
                .collect();
            if !values.is_empty() {
                prop_assert_eq!(emitted.len(), values.len());
            }
        }
    }

    #[test]
    fn merge_is_deterministic(o in overrides(), d in defaults()) {
        prop_assert_eq!(args::merge::merge(&o, &d), args::merge::merge(&o, &d));
    }
}
