// Module declarations
pub mod arch;
pub mod build_prop;
pub(crate) mod command;
pub mod device_info;
pub mod device_tree;
mod error;
pub mod fstab;
pub mod fstab_format;
mod git;
pub mod image_info;
pub mod locations;
mod options;
pub mod templates;
mod unpack;

// Public re-exports
pub use arch::Architecture;
pub use build_prop::PropertyStore;
pub use device_info::DeviceInfo;
pub use device_tree::{
    generate_device_tree, inspect_ramdisk, write_device_tree, DeviceTree, FstabSource, RamdiskInfo,
};
pub use error::{DtgenError, Result};
pub use fstab::{FstabEntry, UnknownPartitionPolicy};
pub use image_info::ImageInfo;
pub use locations::SearchLocations;
pub use options::{GenerateOptions, GitOptions, ImageSource, UnpackOptions, DEFAULT_AIK_URL};
pub use unpack::{unpack, UnpackedImage, WorkDir};
