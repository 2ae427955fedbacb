use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the external executable, without any platform suffix.
pub const BINARY_NAME: &str = "triangle";

/// `(os, arch)` pairs for which a prebuilt binary is shipped in the vendor directory.
const BUNDLED_TARGETS: &[(&str, &str)] = &[
    ("linux", "x86_64"),
    ("linux", "aarch64"),
    ("linux", "arm"),
    ("macos", "x86_64"),
    ("macos", "aarch64"),
    ("windows", "x86_64"),
    ("windows", "x86"),
    ("windows", "aarch64"),
    ("freebsd", "x86_64"),
];

/// Broad operating system family, which decides naming and lookup conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    Posix,
}

/// Operating system and CPU architecture, using the names of `std::env::consts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The platform this crate was compiled for.
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    pub fn family(&self) -> OsFamily {
        if self.os == "windows" {
            OsFamily::Windows
        } else {
            OsFamily::Posix
        }
    }

    /// File name of the executable on this platform.
    pub fn binary_file_name(&self) -> String {
        match self.family() {
            OsFamily::Windows => format!("{BINARY_NAME}.exe"),
            OsFamily::Posix => BINARY_NAME.to_string(),
        }
    }

    /// Whether a prebuilt binary is shipped for this platform.
    pub fn is_bundled_target(&self) -> bool {
        BUNDLED_TARGETS
            .iter()
            .any(|(os, arch)| *os == self.os && *arch == self.arch)
    }

    /// Location of the bundled binary inside `vendor_dir`, if one is shipped for this platform.
    pub fn bundled_binary_path(&self, vendor_dir: &Path) -> Option<PathBuf> {
        if !self.is_bundled_target() {
            return None;
        }
        Some(
            vendor_dir
                .join(format!("{}-{}", self.os, self.arch))
                .join(self.binary_file_name()),
        )
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}
