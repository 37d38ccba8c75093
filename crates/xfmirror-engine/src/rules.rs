//! Package rule lookup

use std::fmt;
use xfmirror_config::AreaConfig;
use xfmirror_types::NamingConvention;

/// How a package's listing turns into download tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageRule {
    /// Download only the lexicographically-last file
    Config,
    /// Download every file verbatim
    Installer,
    /// Latest flag, latest snapshot and the changes since it
    Standard(NamingConvention),
}

impl PackageRule {
    /// Rule for `package` inside `area`
    ///
    /// Config packages win over installer packages when a name is listed as both.
    pub fn for_package(area: &AreaConfig, package: &str) -> Self {
        if area.is_config_package(package) {
            Self::Config
        } else if area.is_installer_package(package) {
            Self::Installer
        } else {
            Self::Standard(area.convention)
        }
    }
}

impl fmt::Display for PackageRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "config"),
            Self::Installer => write!(f, "installer"),
            Self::Standard(convention) => write!(f, "standard/{}", convention),
        }
    }
}
