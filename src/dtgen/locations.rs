//! Where to look for metadata inside an unpacked ramdisk
//!

use std::path::{Path, PathBuf};

/// Relative paths searched inside the ramdisk
pub mod paths {
    pub const BUILD_PROPS: &[&str] = &[
        "default.prop",
        "prop.default",
        "system/build.prop",
        "vendor/build.prop",
        "system/etc/build.prop",
        "vendor/etc/build.prop",
    ];

    pub const FSTABS: &[&str] = &[
        "etc/recovery.fstab",
        "system/etc/recovery.fstab",
        "vendor/etc/recovery.fstab",
    ];

    /// A fstab already in TWRP syntax, copied verbatim
    pub const TWRP_FSTAB: &str = "etc/twrp.fstab";

    /// Directories holding init rc files; "" is the ramdisk root
    pub const INIT_RC_DIRS: &[&str] = &["", "system/etc/init", "vendor/etc/init"];
}

/// Ordered candidate locations, passed explicitly to the generator
#[derive(Debug, Clone)]
pub struct SearchLocations {
    pub build_props: Vec<PathBuf>,
    pub fstabs: Vec<PathBuf>,
    pub twrp_fstab: PathBuf,
    pub init_rc_dirs: Vec<PathBuf>,
}

impl Default for SearchLocations {
    fn default() -> Self {
        Self {
            build_props: to_paths(paths::BUILD_PROPS),
            fstabs: to_paths(paths::FSTABS),
            twrp_fstab: PathBuf::from(paths::TWRP_FSTAB),
            init_rc_dirs: to_paths(paths::INIT_RC_DIRS),
        }
    }
}

impl SearchLocations {
    pub fn find_build_prop(&self, root: &Path) -> Option<PathBuf> {
        find_first(root, &self.build_props)
    }

    pub fn find_fstab(&self, root: &Path) -> Option<PathBuf> {
        find_first(root, &self.fstabs)
    }

    pub fn find_twrp_fstab(&self, root: &Path) -> Option<PathBuf> {
        let path = root.join(&self.twrp_fstab);
        path.is_file().then_some(path)
    }
}

fn to_paths(list: &[&str]) -> Vec<PathBuf> {
    list.iter().map(|p| PathBuf::from(*p)).collect()
}

/// First candidate that exists as a regular file under `root`; never merges
pub fn find_first(root: &Path, candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|candidate| root.join(candidate))
        .inspect(|path| tracing::debug!("Checking {}", path.display()))
        .find(|path| path.is_file())
}
