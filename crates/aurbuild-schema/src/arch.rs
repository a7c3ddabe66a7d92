//! Target architectures.

/// Target architecture of a pacman repository.
///
/// Each architecture gets its own directory under the build root
/// (`build/x86_64/`, `build/aarch64/`) holding the built packages and the
/// repository database.
///
/// # Example
///
/// ```
/// use aurbuild_schema::Arch;
///
/// let arch: Arch = "arm64".parse().unwrap();
/// assert_eq!(arch.as_str(), "aarch64");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// 64-bit Intel/AMD, the default for AUR repositories.
    #[default]
    X86_64,
    /// 64-bit ARM (Arch Linux ARM).
    Aarch64,
}

impl Arch {
    /// Pacman architecture name, as used in package file names and
    /// repository paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x86_64" | "amd64" => Ok(Self::X86_64),
            "aarch64" | "arm64" => Ok(Self::Aarch64),
            _ => Err(format!("Unknown architecture: {s}")),
        }
    }
}
