//! Device tree generation
//!
//! Everything that can fail on bad input (device facts, fstab) is resolved
//! before the output directory is touched.

use std::fs;
use std::path::{Path, PathBuf};

use super::build_prop::PropertyStore;
use super::device_info::{self, DeviceInfo};
use super::error::{DtgenError, Result};
use super::fstab::{self, FstabEntry, UnknownPartitionPolicy};
use super::fstab_format;
use super::git;
use super::image_info::ImageInfo;
use super::locations::SearchLocations;
use super::options::{GenerateOptions, GitOptions};
use super::templates::{self, TreeContext};
use super::unpack;

/// Where the tree's `recovery.fstab` comes from
#[derive(Debug, Clone)]
pub enum FstabSource {
    /// Ramdisk already ships a TWRP fstab, copied verbatim
    Twrp(PathBuf),
    /// Stock fstab converted to TWRP format
    Converted {
        source: PathBuf,
        entries: Vec<FstabEntry>,
    },
}

impl FstabSource {
    pub fn path(&self) -> &Path {
        match self {
            FstabSource::Twrp(path) => path,
            FstabSource::Converted { source, .. } => source,
        }
    }

    /// Contents of the tree's `recovery.fstab`
    pub fn render(&self) -> Result<String> {
        match self {
            FstabSource::Twrp(path) => {
                fs::read_to_string(path).map_err(|e| DtgenError::io(path, e))
            }
            FstabSource::Converted { entries, .. } => Ok(fstab_format::format(entries)),
        }
    }
}

/// Metadata extracted from an unpacked ramdisk
#[derive(Debug, Clone)]
pub struct RamdiskInfo {
    pub build_prop: PathBuf,
    pub device: DeviceInfo,
    pub fstab: FstabSource,
    /// Init scripts to ship in `recovery/root`
    pub init_rcs: Vec<PathBuf>,
}

/// A device tree written to disk
#[derive(Debug, Clone)]
pub struct DeviceTree {
    pub path: PathBuf,
    pub device: DeviceInfo,
}

fn find_fstab(
    ramdisk: &Path,
    locations: &SearchLocations,
    policy: UnknownPartitionPolicy,
) -> Result<FstabSource> {
    if let Some(path) = locations.find_twrp_fstab(ramdisk) {
        tracing::debug!("Found a TWRP fstab at {}, copying it", path.display());
        return Ok(FstabSource::Twrp(path));
    }

    let source = locations
        .find_fstab(ramdisk)
        .ok_or_else(|| DtgenError::NoUsableFstab(ramdisk.to_path_buf()))?;
    tracing::debug!("Generating fstab using {} as reference", source.display());
    let text = fs::read_to_string(&source).map_err(|e| DtgenError::io(&source, e))?;
    let entries = fstab::parse(&text, policy);

    Ok(FstabSource::Converted { source, entries })
}

fn find_init_rcs(ramdisk: &Path, locations: &SearchLocations) -> Result<Vec<PathBuf>> {
    let mut init_rcs = Vec::new();

    for dir in &locations.init_rc_dirs {
        let dir = ramdisk.join(dir);
        if !dir.is_dir() {
            continue;
        }

        let paths = fs::read_dir(&dir)
            .map_err(|e| DtgenError::io(&dir, e))?
            .map(|entry| entry.map(|e| e.path()).map_err(|e| DtgenError::io(&dir, e)))
            .collect::<Result<Vec<_>>>()?;
        let mut found: Vec<PathBuf> = paths
            .into_iter()
            .filter(|path| {
                path.is_file()
                    && path.extension().is_some_and(|ext| ext == "rc")
                    && path.file_name().is_some_and(|name| name != "init.rc")
            })
            .collect();
        found.sort();
        init_rcs.extend(found);
    }

    Ok(init_rcs)
}

/// Resolve device facts, fstab and init scripts from an unpacked ramdisk
pub fn inspect_ramdisk(
    ramdisk: &Path,
    locations: &SearchLocations,
    policy: UnknownPartitionPolicy,
) -> Result<RamdiskInfo> {
    let build_prop = locations
        .find_build_prop(ramdisk)
        .ok_or_else(|| DtgenError::NoBuildProp(ramdisk.to_path_buf()))?;
    tracing::debug!("Using {} as build.prop", build_prop.display());

    let store = PropertyStore::from_file(&build_prop)?;
    let device = device_info::resolve(&store)?;
    let fstab = find_fstab(ramdisk, locations, policy)?;
    let init_rcs = find_init_rcs(ramdisk, locations)?;

    Ok(RamdiskInfo {
        build_prop,
        device,
        fstab,
        init_rcs,
    })
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| DtgenError::io(path, e))
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to).map_err(|e| DtgenError::io(from, e))?;
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| DtgenError::io(path, e))
}

/// Write the tree for an already unpacked image into `output`
pub async fn write_device_tree(
    ramdisk_info: &RamdiskInfo,
    image: &ImageInfo,
    output: &Path,
    git_options: &GitOptions,
) -> Result<DeviceTree> {
    let device = &ramdisk_info.device;
    let kernel_name = device
        .architecture
        .kernel_file_name(image.has_dt_image(), image.has_dtb_image());
    let fstab_text = ramdisk_info.fstab.render()?;

    let tree = output.join(&device.manufacturer).join(&device.codename);
    let prebuilt = tree.join("prebuilt");
    let recovery_root = tree.join("recovery").join("root");

    tracing::info!("Creating device tree folders...");
    if tree.is_dir() {
        fs::remove_dir_all(&tree).map_err(|e| DtgenError::io(&tree, e))?;
    }
    create_dir(&prebuilt)?;
    create_dir(&recovery_root)?;

    tracing::info!("Copying kernel...");
    match &image.kernel {
        Some(kernel) => copy_file(kernel, &prebuilt.join(&kernel_name))?,
        None => tracing::warn!("Image has no kernel, skipping prebuilt kernel"),
    }
    let blobs = [
        (&image.dt_image, "dt.img"),
        (&image.dtb_image, "dtb.img"),
        (&image.dtbo_image, "dtbo.img"),
    ];
    for (blob, name) in blobs {
        if let Some(blob) = blob {
            copy_file(blob, &prebuilt.join(name))?;
        }
    }

    tracing::info!("Copying fstab...");
    write_file(&tree.join("recovery.fstab"), &fstab_text)?;

    tracing::info!("Copying init scripts...");
    for init_rc in &ramdisk_info.init_rcs {
        if let Some(name) = init_rc.file_name() {
            copy_file(init_rc, &recovery_root.join(name))?;
        }
    }

    let ctx = TreeContext::new(device, image, &kernel_name);
    for (name, contents) in templates::render_all(&ctx) {
        tracing::info!("Creating {}...", name);
        write_file(&tree.join(&name), &contents)?;
    }

    if git_options.enabled {
        git::commit_all(git_options, &tree, &templates::commit_message(&ctx)).await?;
    }

    Ok(DeviceTree {
        path: tree,
        device: device.clone(),
    })
}

/// Unpack the images and generate a complete device tree
pub async fn generate_device_tree(options: &GenerateOptions) -> Result<DeviceTree> {
    for image in options.images.paths() {
        if !image.is_file() {
            return Err(DtgenError::ImageNotFound(image.clone()));
        }
    }

    let unpacked = unpack::unpack(&options.images, &options.unpack, &options.git.git_path).await?;

    tracing::info!("Getting device infos...");
    let ramdisk_info = inspect_ramdisk(
        &unpacked.ramdisk,
        &options.locations,
        options.partition_policy,
    )?;
    let image = ImageInfo::read(&unpacked.split_img)?;

    let tree = write_device_tree(&ramdisk_info, &image, &options.output, &options.git).await?;
    tracing::info!("Device tree written to {}", tree.path.display());
    Ok(tree)
}
