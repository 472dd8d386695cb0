//! Default QEMU arguments derived from config and runtime facts.

use std::collections::BTreeMap;

use crate::config::QemuConfig;
use crate::constants::{flags, qemu as const_qemu};
use crate::facts::RuntimeFacts;
use crate::ui::Ui;

const HEADLESS_WARNING: &str = "WARNING: The VM will be started in headless mode, as configured.\n\
     In headless mode, errors during the boot sequence or OS setup\n\
     won't be easily visible. Use at your own discretion.";

const NO_ACCEL_WARNING: &str = "WARNING: The VM will be started with no hardware acceleration.\n\
     The installation may take considerably longer to finish.\n";

/// Computed baseline: each switch maps to exactly one value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultArgs {
    args: BTreeMap<String, String>,
}

impl DefaultArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a switch, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.args.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.args.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.args.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.args.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DefaultArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut defaults = Self::new();
        for (k, v) in iter {
            defaults.set(k, v);
        }
        defaults
    }
}

/// Build the default switch map for one launch.
///
/// Warnings about headless mode and missing acceleration go to `ui`.
pub fn build(
    config: &QemuConfig,
    boot_drive: &str,
    facts: &RuntimeFacts,
    ui: &dyn Ui,
) -> DefaultArgs {
    let mut defaults = DefaultArgs::new();

    if config.headless {
        ui.message(HEADLESS_WARNING);
    } else {
        defaults.set(flags::DISPLAY, const_qemu::DEFAULT_DISPLAY);
    }

    let mut machine = format!("type={}", config.machine_type);
    if config.is_accelerated() {
        machine.push_str(&format!(",accel={}", config.accelerator));
    } else {
        ui.message(NO_ACCEL_WARNING);
    }

    defaults.set(flags::NAME, config.vm_name.as_str());
    defaults.set(flags::MACHINE, machine);
    defaults.set(
        flags::NETDEV,
        format!(
            "user,id={},hostfwd=tcp::{}-:22",
            const_qemu::NETDEV_ID,
            facts.ssh_host_port
        ),
    );
    defaults.set(
        flags::DEVICE,
        format!("{},netdev={}", config.net_device, const_qemu::NETDEV_ID),
    );
    defaults.set(
        flags::DRIVE,
        format!(
            "file={},if={},cache={},discard={}",
            config.disk_image_path().display(),
            config.disk_interface,
            config.disk_cache,
            config.disk_discard
        ),
    );
    if !config.disk_image {
        defaults.set(flags::CDROM, facts.iso_path.to_string_lossy());
    }
    defaults.set(flags::BOOT, boot_drive);
    defaults.set(flags::MEMORY, const_qemu::DEFAULT_MEMORY);
    defaults.set(
        flags::VNC,
        format!("{}:{}", const_qemu::VNC_BIND_ADDRESS, facts.vnc_display()),
    );

    match &facts.floppy_path {
        Some(floppy) => defaults.set(flags::FLOPPY, floppy.to_string_lossy()),
        None => tracing::debug!("No floppy files, not attaching a floppy"),
    }

    defaults
}
