//! Boot image header values and blobs left in `split_img` by the unpacker
//!
//! Every piece is stored as `<image name>-<suffix>`; text files hold a single
//! value on their first line.

use std::path::{Path, PathBuf};

use super::error::{DtgenError, Result};

/// Name the image is copied under before unpacking
pub const IMAGE_FILE_NAME: &str = "recovery.img";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageInfo {
    pub kernel: Option<PathBuf>,
    pub dt_image: Option<PathBuf>,
    pub dtb_image: Option<PathBuf>,
    pub dtbo_image: Option<PathBuf>,
    pub base_address: Option<String>,
    pub board_name: Option<String>,
    pub cmdline: Option<String>,
    pub header_version: String,
    pub recovery_size: Option<String>,
    pub pagesize: Option<String>,
    pub ramdisk_compression: Option<String>,
    pub ramdisk_offset: Option<String>,
    pub tags_offset: Option<String>,
}

impl ImageInfo {
    /// Collect everything the unpacker extracted into `split_img`
    pub fn read(split_img: &Path) -> Result<Self> {
        let entry = |suffix: &str| split_img.join(format!("{}-{}", IMAGE_FILE_NAME, suffix));
        let blob = |suffix: &str| Some(entry(suffix)).filter(|path| path.is_file());

        // Newer unpackers name the recovery dtbo differently; the last match wins
        let dtbo_image = ["dtbo", "recovery_dtbo"]
            .into_iter()
            .filter_map(|suffix| blob(suffix))
            .last();

        let info = Self {
            kernel: blob("zImage"),
            dt_image: blob("dt"),
            dtb_image: blob("dtb"),
            dtbo_image,
            base_address: read_first_line(&entry("base"))?,
            board_name: read_first_line(&entry("board"))?,
            cmdline: read_first_line(&entry("cmdline"))?,
            header_version: read_first_line(&entry("header_version"))?
                .unwrap_or_else(|| "0".to_string()),
            recovery_size: read_first_line(&entry("origsize"))?,
            pagesize: read_first_line(&entry("pagesize"))?,
            ramdisk_compression: read_first_line(&entry("ramdiskcomp"))?,
            ramdisk_offset: read_first_line(&entry("ramdisk_offset"))?,
            tags_offset: read_first_line(&entry("tags_offset"))?,
        };

        tracing::debug!("Image info: {:?}", info);
        Ok(info)
    }

    pub fn has_dt_image(&self) -> bool {
        self.dt_image.is_some()
    }

    pub fn has_dtb_image(&self) -> bool {
        self.dtb_image.is_some()
    }

    /// Flash block size used by BoardConfig, 64 pages
    pub fn flash_block_size(&self) -> Option<u64> {
        self.pagesize
            .as_deref()
            .and_then(|size| size.trim().parse::<u64>().ok())
            .map(|size| size * 64)
    }
}

/// First line of a text file; `None` if the file doesn't exist
fn read_first_line(path: &Path) -> Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|e| DtgenError::io(path, e))?;
    Ok(Some(content.lines().next().unwrap_or_default().to_string()))
}
