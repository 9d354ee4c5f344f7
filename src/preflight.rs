//! Preflight checks: privilege, kernel family, and distribution dialect

use std::fmt;
use std::path::Path;

use crate::ui::Reporter;

/// Location of the OS identification file
pub const OS_RELEASE: &str = "/etc/os-release";

/// Conditions under which the run must not start
#[derive(Debug, thiserror::Error)]
pub enum PreflightError {
    #[error("this installer needs root privileges (effective uid is {euid})")]
    NotRoot { euid: u32 },

    #[error("this installer only supports Linux (detected {kernel})")]
    UnsupportedKernel { kernel: String },
}

impl PreflightError {
    /// What the operator should do about it
    pub fn guidance(&self) -> String {
        match self {
            Self::NotRoot { .. } => {
                let exe = std::env::args()
                    .next()
                    .unwrap_or_else(|| "hostprep".to_string());
                format!("Run it again with sudo:\n  sudo {exe}")
            }
            Self::UnsupportedKernel { .. } => {
                "Run it on a Debian/Ubuntu or RHEL/CentOS/Fedora host.".to_string()
            }
        }
    }
}

/// Package-manager dialect of the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Debian,
    Rhel,
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debian => f.write_str("Ubuntu/Debian"),
            Self::Rhel => f.write_str("CentOS/RHEL/Fedora"),
        }
    }
}

/// Effective uid of this process
pub fn current_euid() -> u32 {
    // SAFETY: geteuid takes no arguments and cannot fail
    unsafe { libc::geteuid() }
}

pub fn verify_privilege(euid: u32) -> Result<(), PreflightError> {
    if euid == 0 {
        Ok(())
    } else {
        Err(PreflightError::NotRoot { euid })
    }
}

/// `kernel` is a `std::env::consts::OS` value
pub fn verify_kernel(kernel: &str) -> Result<(), PreflightError> {
    if kernel == "linux" {
        Ok(())
    } else {
        Err(PreflightError::UnsupportedKernel {
            kernel: kernel.to_string(),
        })
    }
}

/// Classify an os-release document; `None` if no known distribution matches
pub fn classify(os_release: &str) -> Option<OsFamily> {
    let content = os_release.to_lowercase();

    if ["ubuntu", "debian"].iter().any(|d| content.contains(d)) {
        Some(OsFamily::Debian)
    } else if ["centos", "rhel", "fedora"].iter().any(|d| content.contains(d)) {
        Some(OsFamily::Rhel)
    } else {
        None
    }
}

/// Read `path` and pick a dialect, defaulting to Debian with a warning
pub fn detect_os_family(path: &Path, reporter: &dyn Reporter) -> OsFamily {
    let detected = match std::fs::read_to_string(path) {
        Ok(content) => classify(&content),
        Err(e) => {
            log::debug!("could not read {}: {e}", path.display());
            None
        }
    };

    match detected {
        Some(family) => {
            reporter.success(&format!("Operating system: {family}"));
            family
        }
        None => {
            reporter.warn("Distribution not recognized, using Debian commands");
            OsFamily::Debian
        }
    }
}
