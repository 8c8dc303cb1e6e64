//! CPU architecture classification
//!
//! Maps the raw ABI string found in build props to the architecture classes
//! a TWRP device tree understands, and derives the kernel image name.

use serde::Serialize;

/// Architecture class of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Architecture {
    #[serde(rename = "arm")]
    Arm,
    #[serde(rename = "arm64")]
    Arm64,
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Architecture {
    /// Classify a raw ABI string (`ro.product.cpu.abi` or an abilist).
    ///
    /// Longer prefixes are checked first: `x86_64` also starts with `x86`.
    pub fn classify(raw_abi: &str) -> Self {
        if raw_abi.starts_with("arm64") {
            Architecture::Arm64
        } else if raw_abi.starts_with("armeabi") {
            Architecture::Arm
        } else if raw_abi.starts_with("x86_64") {
            Architecture::X86_64
        } else if raw_abi.starts_with("x86") {
            Architecture::X86
        } else {
            Architecture::Unknown
        }
    }

    /// Common kernel image name for this architecture
    pub fn kernel_name(self) -> &'static str {
        match self {
            Architecture::Arm => "zImage",
            Architecture::Arm64 => "Image.gz",
            Architecture::X86 | Architecture::X86_64 => "bzImage",
            Architecture::Unknown => "zImage",
        }
    }

    pub fn is_64bit(self) -> bool {
        matches!(self, Architecture::Arm64 | Architecture::X86_64)
    }

    /// Whether the kernel must carry an appended DTB (`-dtb` suffix)
    pub fn needs_dtb_suffix(self, has_dt_image: bool, has_dtb_image: bool) -> bool {
        matches!(self, Architecture::Arm | Architecture::Arm64) && !has_dt_image && !has_dtb_image
    }

    /// File name the kernel gets in the prebuilt directory
    pub fn kernel_file_name(self, has_dt_image: bool, has_dtb_image: bool) -> String {
        if self.needs_dtb_suffix(has_dt_image, has_dtb_image) {
            format!("{}-dtb", self.kernel_name())
        } else {
            self.kernel_name().to_string()
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Architecture::Arm => write!(f, "arm"),
            Architecture::Arm64 => write!(f, "arm64"),
            Architecture::X86 => write!(f, "x86"),
            Architecture::X86_64 => write!(f, "x86_64"),
            Architecture::Unknown => write!(f, "unknown"),
        }
    }
}
