//! Configuration for the QEMU builder.

use crate::args::FlagRow;
use crate::constants::qemu as const_qemu;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

mod validate;

/// User-facing build configuration.
///
/// Every field has a default so a config file only needs to name what it
/// changes. Call [`QemuConfig::validate`] before handing it to a step.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QemuConfig {
    /// VM name, also the disk image base name.
    #[serde(default = "default_vm_name")]
    pub vm_name: String,

    /// QEMU machine type (`-machine type=...`).
    #[serde(default = "default_machine_type")]
    pub machine_type: String,

    /// Hardware accelerator appended to the machine type.
    ///
    /// `none` launches without acceleration.
    #[serde(default = "default_accelerator")]
    pub accelerator: String,

    #[serde(default = "default_disk_interface")]
    pub disk_interface: String,

    #[serde(default = "default_disk_cache")]
    pub disk_cache: String,

    #[serde(default = "default_disk_discard")]
    pub disk_discard: String,

    /// NIC model for `-device`.
    #[serde(default = "default_net_device")]
    pub net_device: String,

    /// Output disk format (qcow2 or raw).
    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,

    /// Directory served over HTTP to the guest, exposed to templates as `HTTPDir`.
    #[serde(default)]
    pub http_directory: String,

    /// Run without a display window.
    #[serde(default)]
    pub headless: bool,

    /// Boot a pre-built disk image instead of installing from the ISO.
    #[serde(default)]
    pub disk_image: bool,

    /// Raw override rows: `[["-device", "e1000"], ["-m", "{{ .Name }}"]]`.
    #[serde(default)]
    pub qemuargs: Vec<FlagRow>,

    #[serde(default = "default_qemu_binary")]
    pub qemu_binary: String,

    /// User variables, exposed to templates as `{{ .Vars.key }}`.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

fn default_vm_name() -> String {
    "vmbake-qemu".to_string()
}

fn default_machine_type() -> String {
    "pc".to_string()
}

fn default_accelerator() -> String {
    "kvm".to_string()
}

fn default_disk_interface() -> String {
    "virtio".to_string()
}

fn default_disk_cache() -> String {
    "writeback".to_string()
}

fn default_disk_discard() -> String {
    "ignore".to_string()
}

fn default_net_device() -> String {
    "virtio-net".to_string()
}

fn default_format() -> String {
    "qcow2".to_string()
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("output-qemu")
}

fn default_qemu_binary() -> String {
    const_qemu::DEFAULT_BINARY.to_string()
}

impl Default for QemuConfig {
    fn default() -> Self {
        Self {
            vm_name: default_vm_name(),
            machine_type: default_machine_type(),
            accelerator: default_accelerator(),
            disk_interface: default_disk_interface(),
            disk_cache: default_disk_cache(),
            disk_discard: default_disk_discard(),
            net_device: default_net_device(),
            format: default_format(),
            output_directory: default_output_directory(),
            http_directory: String::new(),
            headless: false,
            disk_image: false,
            qemuargs: Vec::new(),
            qemu_binary: default_qemu_binary(),
            variables: BTreeMap::new(),
        }
    }
}

impl QemuConfig {
    /// Parse a JSON config document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&raw)?;
        config.validate()?;

        tracing::debug!(
            path = %path.display(),
            vm_name = %config.vm_name,
            overrides = config.qemuargs.len(),
            "Loaded QEMU config"
        );
        Ok(config)
    }

    /// Disk image path: `<output_directory>/<vm_name>.<format>`, format lowercased.
    pub fn disk_image_path(&self) -> PathBuf {
        self.output_directory.join(format!(
            "{}.{}",
            self.vm_name,
            self.format.to_lowercase()
        ))
    }

    /// Whether hardware acceleration is requested.
    pub fn is_accelerated(&self) -> bool {
        self.accelerator != const_qemu::NO_ACCELERATOR
    }
}
