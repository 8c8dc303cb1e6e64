use std::path::PathBuf;

use super::fstab::UnknownPartitionPolicy;
use super::locations::SearchLocations;

/// Public AIK mirror cloned when no local checkout is configured
pub const DEFAULT_AIK_URL: &str = "https://github.com/SebaUbuntu/AIK-Linux-mirror";

/// Images the device tree is generated from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A recovery image, or a boot image on A/B devices
    Single(PathBuf),
    /// Huawei/Honor Kirin devices split recovery over three partitions
    Huawei {
        kernel: PathBuf,
        ramdisk: PathBuf,
        vendor: PathBuf,
    },
}

impl ImageSource {
    pub fn paths(&self) -> Vec<&PathBuf> {
        match self {
            ImageSource::Single(image) => vec![image],
            ImageSource::Huawei {
                kernel,
                ramdisk,
                vendor,
            } => vec![kernel, ramdisk, vendor],
        }
    }
}

/// Options for running the external image unpacker (AIK)
#[derive(Debug, Clone)]
pub struct UnpackOptions {
    /// Local AIK checkout; cloned from `aik_url` when unset
    pub aik_path: Option<PathBuf>,
    pub aik_url: String,
    /// Keep the extraction directory after generation
    pub keep_workdir: bool,
    pub timeout_secs: u64,
}

impl Default for UnpackOptions {
    fn default() -> Self {
        Self {
            aik_path: None,
            aik_url: DEFAULT_AIK_URL.to_string(),
            keep_workdir: false,
            timeout_secs: 600,
        }
    }
}

/// Options for the git snapshot of the generated tree
#[derive(Debug, Clone)]
pub struct GitOptions {
    pub enabled: bool,
    pub git_path: String,
    pub timeout_secs: u64,
}

impl Default for GitOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            git_path: "git".to_string(),
            timeout_secs: 300,
        }
    }
}

/// Options for a full device tree generation
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub images: ImageSource,
    /// Trees land in `<output>/<manufacturer>/<codename>`
    pub output: PathBuf,
    pub unpack: UnpackOptions,
    pub git: GitOptions,
    pub locations: SearchLocations,
    pub partition_policy: UnknownPartitionPolicy,
}

impl GenerateOptions {
    pub fn new(images: ImageSource, output: PathBuf) -> Self {
        Self {
            images,
            output,
            unpack: UnpackOptions::default(),
            git: GitOptions::default(),
            locations: SearchLocations::default(),
            partition_policy: UnknownPartitionPolicy::default(),
        }
    }
}
