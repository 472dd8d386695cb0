use super::QemuConfig;
use crate::errors::ConfigError;

const ACCELERATORS: &[&str] = &["kvm", "tcg", "xen", "hax", "hvf", "whpx", "none"];

const FORMATS: &[&str] = &["qcow2", "raw"];

const DISK_INTERFACES: &[&str] = &["ide", "scsi", "virtio", "virtio-scsi"];

const DISK_CACHE_MODES: &[&str] = &["writethrough", "writeback", "none", "unsafe", "directsync"];

const DISK_DISCARD_MODES: &[&str] = &["unmap", "ignore"];

const NET_DEVICES: &[&str] = &[
    "ne2k_pci",
    "i82551",
    "i82557b",
    "i82559er",
    "rtl8139",
    "e1000",
    "pcnet",
    "virtio",
    "virtio-net",
    "virtio-net-pci",
    "usb-net",
    "i82559a",
    "i82559b",
    "i82559c",
    "i82550",
    "i82562",
    "i82557a",
    "i82557c",
    "i82801",
    "vmxnet3",
    "i82558a",
    "i82558b",
    "i82558c",
    "i82558d",
    "i82562a",
    "i82562b",
    "i82562c",
    "i82562d",
];

impl QemuConfig {
    /// Check every enumerated field and override row.
    ///
    /// All problems are collected so the user can fix them in one pass.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.vm_name.is_empty() {
            problems.push("vm_name must not be empty".to_string());
        }

        check_one_of(&mut problems, "accelerator", &self.accelerator, ACCELERATORS);
        check_one_of(
            &mut problems,
            "format",
            &self.format.to_lowercase(),
            FORMATS,
        );
        check_one_of(
            &mut problems,
            "disk_interface",
            &self.disk_interface,
            DISK_INTERFACES,
        );
        check_one_of(&mut problems, "disk_cache", &self.disk_cache, DISK_CACHE_MODES);
        check_one_of(
            &mut problems,
            "disk_discard",
            &self.disk_discard,
            DISK_DISCARD_MODES,
        );
        check_one_of(&mut problems, "net_device", &self.net_device, NET_DEVICES);

        for (idx, row) in self.qemuargs.iter().enumerate() {
            if row.is_empty() {
                problems.push(format!("qemuargs[{}] is empty, expected a switch", idx));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation { problems })
        }
    }
}

fn check_one_of(problems: &mut Vec<String>, field: &str, value: &str, allowed: &[&str]) {
    if !allowed.contains(&value) {
        problems.push(format!(
            "unrecognized {} '{}', expected one of: {}",
            field,
            value,
            allowed.join(", ")
        ));
    }
}
