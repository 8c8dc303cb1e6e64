//! Image extraction through Android Image Kitchen (AIK)
//!
//! AIK is run as an opaque subprocess: the image is copied into an AIK
//! checkout and `unpackimg.sh` leaves `ramdisk/` and `split_img/` next to it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::command::{run_command, CommandError};
use super::error::{DtgenError, Result};
use super::image_info::IMAGE_FILE_NAME;
use super::options::{ImageSource, UnpackOptions};

const UNPACK_SCRIPT: &str = "unpackimg.sh";

static WORKDIR_SEQ: AtomicU64 = AtomicU64::new(0);

fn temp_base_dir() -> Result<PathBuf> {
    let base = std::env::var("DTGEN_TMP_DIR")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);

    fs::create_dir_all(&base).map_err(|e| DtgenError::io(&base, e))?;
    Ok(base)
}

/// Extraction directory, removed on drop unless kept for debugging
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    keep: bool,
}

impl WorkDir {
    pub fn new(prefix: &str, keep: bool) -> Result<Self> {
        let base = temp_base_dir()?;
        let pid = std::process::id();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = WORKDIR_SEQ.fetch_add(1, Ordering::Relaxed);
        let dir = base.join(format!("{}-{}-{}-{}", prefix, pid, timestamp, seq));
        fs::create_dir(&dir).map_err(|e| DtgenError::io(&dir, e))?;
        Ok(Self { path: dir, keep })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if self.keep {
            tracing::info!("Keeping extraction directory {}", self.path.display());
        } else {
            let _ = fs::remove_dir_all(&self.path);
        }
    }
}

/// Directories produced by the unpacker
#[derive(Debug)]
pub struct UnpackedImage {
    pub ramdisk: PathBuf,
    pub split_img: PathBuf,
    _workdir: WorkDir,
}

/// Recursively copy a directory, recreating symlinks instead of following them
fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).map_err(|e| DtgenError::io(dst, e))?;

    for entry in fs::read_dir(src).map_err(|e| DtgenError::io(src, e))? {
        let entry = entry.map_err(|e| DtgenError::io(src, e))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| DtgenError::io(&from, e))?;

        if file_type.is_dir() {
            copy_dir_all(&from, &to)?;
        } else if file_type.is_symlink() {
            copy_symlink(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|e| DtgenError::io(&from, e))?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> Result<()> {
    let target = fs::read_link(from).map_err(|e| DtgenError::io(from, e))?;
    std::os::unix::fs::symlink(&target, to).map_err(|e| DtgenError::io(to, e))
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to).map_err(|e| DtgenError::io(from, e))?;
    Ok(())
}

/// Remove whatever sits at `path`: directory, file or dangling symlink
fn remove_path(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path).map_err(|e| DtgenError::io(path, e)),
        Ok(_) => fs::remove_file(path).map_err(|e| DtgenError::io(path, e)),
        Err(_) => Ok(()),
    }
}

/// Get a usable AIK checkout into `dest`
async fn prepare_aik(dest: &Path, options: &UnpackOptions, git_path: &str) -> Result<()> {
    match &options.aik_path {
        Some(aik_path) => {
            tracing::debug!("Copying AIK from {}", aik_path.display());
            copy_dir_all(aik_path, dest)?;
        }
        None => {
            tracing::info!("Cloning AIK from {}", options.aik_url);
            let args = vec![
                "clone".to_string(),
                "--depth".to_string(),
                "1".to_string(),
                options.aik_url.clone(),
                dest.display().to_string(),
            ];
            run_command(
                git_path,
                &args,
                None,
                Duration::from_secs(options.timeout_secs),
            )
            .await
            .map_err(|e| DtgenError::Unpack(format!("Failed to clone AIK: {}", e)))?;
        }
    }

    if !dest.join(UNPACK_SCRIPT).is_file() {
        return Err(DtgenError::Unpack(format!(
            "{} not found in AIK directory {}",
            UNPACK_SCRIPT,
            dest.display()
        )));
    }

    Ok(())
}

/// Unpack a single boot or recovery image
pub async fn unpack_image(
    image: &Path,
    options: &UnpackOptions,
    git_path: &str,
) -> Result<UnpackedImage> {
    if !image.is_file() {
        return Err(DtgenError::ImageNotFound(image.to_path_buf()));
    }

    let workdir = WorkDir::new("dtgen-aik", options.keep_workdir)?;
    let aik_dir = workdir.path().join("aik");
    prepare_aik(&aik_dir, options, git_path).await?;

    let image_copy = aik_dir.join(IMAGE_FILE_NAME);
    fs::copy(image, &image_copy).map_err(|e| DtgenError::io(image, e))?;

    tracing::info!("Extracting {}...", image.display());
    let script = aik_dir.join(UNPACK_SCRIPT);
    let args = vec!["--nosudo".to_string(), IMAGE_FILE_NAME.to_string()];
    run_command(
        &script.display().to_string(),
        &args,
        Some(&aik_dir),
        Duration::from_secs(options.timeout_secs),
    )
    .await
    .map_err(|e| match e {
        CommandError::Timeout => DtgenError::UnpackTimeout,
        other => DtgenError::Unpack(other.to_string()),
    })?;

    let unpacked = UnpackedImage {
        ramdisk: aik_dir.join("ramdisk"),
        split_img: aik_dir.join("split_img"),
        _workdir: workdir,
    };
    if !unpacked.split_img.is_dir() {
        return Err(DtgenError::Unpack(format!(
            "{} produced no split_img directory",
            UNPACK_SCRIPT
        )));
    }

    Ok(unpacked)
}

/// Unpack Huawei's split recovery into a single ramdisk view.
///
/// The kernel image provides the kernel, the ramdisk image replaces its
/// ramdisk and the vendor image's `vendor/` directory is overlaid on top.
pub async fn unpack_huawei(
    kernel: &Path,
    ramdisk: &Path,
    vendor: &Path,
    options: &UnpackOptions,
    git_path: &str,
) -> Result<UnpackedImage> {
    let kernel_unpacked = unpack_image(kernel, options, git_path).await?;
    let helper_options = UnpackOptions {
        keep_workdir: false,
        ..options.clone()
    };
    let ramdisk_unpacked = unpack_image(ramdisk, &helper_options, git_path).await?;
    let vendor_unpacked = unpack_image(vendor, &helper_options, git_path).await?;

    remove_path(&kernel_unpacked.ramdisk)?;
    copy_dir_all(&ramdisk_unpacked.ramdisk, &kernel_unpacked.ramdisk)?;

    let old_vendor = vendor_unpacked.ramdisk.join("vendor");
    let new_vendor = kernel_unpacked.ramdisk.join("vendor");
    remove_path(&new_vendor)?;
    if old_vendor.is_dir() {
        copy_dir_all(&old_vendor, &new_vendor)?;
    } else {
        tracing::warn!("{} has no vendor directory", vendor.display());
    }

    Ok(kernel_unpacked)
}

/// Unpack whatever the image source describes
pub async fn unpack(source: &ImageSource, options: &UnpackOptions, git_path: &str) -> Result<UnpackedImage> {
    match source {
        ImageSource::Single(image) => unpack_image(image, options, git_path).await,
        ImageSource::Huawei {
            kernel,
            ramdisk,
            vendor,
        } => unpack_huawei(kernel, ramdisk, vendor, options, git_path).await,
    }
}
