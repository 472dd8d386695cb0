//! Runtime facts discovered by earlier pipeline steps.

use std::path::PathBuf;

/// Values produced upstream of the launch step (ISO download, port
/// allocation, floppy creation) that the argument builder consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeFacts {
    /// Install media passed as `-cdrom` unless booting a disk image.
    pub iso_path: PathBuf,
    /// Host TCP port reserved for VNC (5900 + display).
    pub vnc_port: u16,
    /// Host port forwarded to guest port 22.
    pub ssh_host_port: u16,
    /// Port of the HTTP server serving `http_directory`.
    pub http_port: u16,
    /// Floppy image, present only if floppy files were configured.
    pub floppy_path: Option<PathBuf>,
}

impl RuntimeFacts {
    /// VNC display number for the reserved port.
    ///
    /// Ports below the VNC base saturate to display 0.
    pub fn vnc_display(&self) -> u16 {
        let base = crate::constants::qemu::VNC_BASE_PORT;
        if self.vnc_port < base {
            tracing::warn!(
                vnc_port = self.vnc_port,
                "VNC port below {}, using display 0",
                base
            );
        }
        self.vnc_port.saturating_sub(base)
    }
}
