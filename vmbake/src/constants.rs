//! Constants for vmbake
//!
//! Centralized location for hardcoded values: QEMU switch names, fixed
//! defaults, and environment variable names.

/// QEMU command-line switches emitted by the default argument builder.
pub mod flags {
    pub const NAME: &str = "-name";
    pub const MACHINE: &str = "-machine";
    pub const NETDEV: &str = "-netdev";
    pub const DEVICE: &str = "-device";
    pub const DRIVE: &str = "-drive";
    pub const CDROM: &str = "-cdrom";
    pub const BOOT: &str = "-boot";
    pub const MEMORY: &str = "-m";
    pub const VNC: &str = "-vnc";
    pub const DISPLAY: &str = "-display";
    pub const FLOPPY: &str = "-fda";
}

/// Fixed launch defaults.
pub mod qemu {
    /// VNC display N listens on TCP port 5900 + N.
    pub const VNC_BASE_PORT: u16 = 5900;

    /// VNC is always bound on every interface.
    pub const VNC_BIND_ADDRESS: &str = "0.0.0.0";

    /// Guest memory size.
    pub const DEFAULT_MEMORY: &str = "512M";

    /// Display backend used when not headless.
    pub const DEFAULT_DISPLAY: &str = "sdl";

    /// Host address as seen from the guest on QEMU user-mode networking.
    pub const HTTP_GUEST_IP: &str = "10.0.2.2";

    /// Netdev id shared by `-netdev` and `-device`.
    pub const NETDEV_ID: &str = "user.0";

    pub const DEFAULT_BINARY: &str = "qemu-system-x86_64";

    /// Accelerator value that disables hardware acceleration.
    pub const NO_ACCELERATOR: &str = "none";
}

/// Run step defaults.
pub mod step {
    pub const DEFAULT_BOOT_DRIVE: &str = "once=d";
    pub const DEFAULT_MESSAGE: &str = "Starting VM, booting from CD-ROM";
    pub const OVERRIDE_NOTICE: &str = "Overriding defaults Qemu arguments with QemuArgs...";
}

pub mod envs {
    /// Explicit path to the QEMU binary, checked before `$PATH`.
    pub const VMBAKE_QEMU_PATH: &str = "VMBAKE_QEMU_PATH";
}
