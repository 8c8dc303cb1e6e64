//! Recovery fstab parser
//!
//! Accepts both the TWRP column order (`mount_point fstype device [flags]`)
//! and the AOSP one (`device mount_point fstype mnt_flags fs_mgr_flags`),
//! normalizes mount points and computes the TWRP flags of every entry.

/// Filesystem types recognized in the second column of a TWRP-syntax line
pub const TWRP_LAYOUT_FSTYPES: &[&str] = &["auto", "emmc", "ext4", "f2fs", "vfat", "squashfs"];

/// Partitions used during the boot process
pub const BOOTLOADER_PARTITIONS: &[&str] = &["boot", "vendor_boot", "recovery", "dtbo", "misc"];

/// Partitions containing Android userspace libs and apps
pub const SYSTEM_PARTITIONS: &[&str] = &["system", "system_ext", "vendor", "product", "odm"];

/// Partitions containing user data
pub const USER_DATA_PARTITIONS: &[&str] = &["cache", "data"];

/// Partitions containing OEM or platform files, like firmwares
pub const OEM_PARTITIONS: &[&str] = &["cust", "firmware", "persist"];

/// Partitions outside [`SYSTEM_PARTITIONS`] that also get a raw image entry
const EXTRA_IMAGE_ENTRY_PARTITIONS: &[&str] = &["cust", "persist"];

const ALTERNATIVE_MOUNT_POINTS: &[(&str, &str)] = &[
    ("/", "/system"),
    ("/system_root", "/system"),
    ("/sdcard", "/sdcard1"),
];

const IMAGE_SUFFIX: &str = "_image";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionClass {
    Bootloader,
    System,
    UserData,
    Oem,
    Other,
}

impl PartitionClass {
    pub fn of(name: &str) -> Self {
        if BOOTLOADER_PARTITIONS.contains(&name) {
            PartitionClass::Bootloader
        } else if SYSTEM_PARTITIONS.contains(&name) {
            PartitionClass::System
        } else if USER_DATA_PARTITIONS.contains(&name) {
            PartitionClass::UserData
        } else if OEM_PARTITIONS.contains(&name) {
            PartitionClass::Oem
        } else {
            PartitionClass::Other
        }
    }

    fn can_be_backed_up(self) -> bool {
        matches!(self, PartitionClass::Bootloader | PartitionClass::System)
    }
}

/// Whether a partition gets an extra `<name>_image` raw entry
pub fn needs_image_entry(name: &str) -> bool {
    SYSTEM_PARTITIONS.contains(&name) || EXTRA_IMAGE_ENTRY_PARTITIONS.contains(&name)
}

/// What to do with partitions outside every known class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownPartitionPolicy {
    /// Keep them with only display/logical flags
    #[default]
    PassThrough,
    /// Leave them out of the generated fstab
    Drop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FstabEntry {
    pub mount_point: String,
    pub fstype: String,
    pub device: String,
    pub name: String,
    pub display_name: String,
    pub is_image_variant: bool,
    pub flags: Vec<String>,
}

impl FstabEntry {
    /// Build an entry from already-split columns
    pub fn new(mount_point: &str, fstype: &str, device: &str, slotselect: bool) -> Self {
        let mount_point = normalize_mount_point(mount_point);
        let name = mount_point
            .strip_prefix('/')
            .unwrap_or(&mount_point)
            .to_string();
        let class = PartitionClass::of(&name);

        let is_image_variant = name.ends_with(IMAGE_SUFFIX) || class == PartitionClass::Bootloader;
        let mut display_name = capitalize(&name);
        if is_image_variant && class != PartitionClass::Bootloader {
            display_name = display_name.replace(IMAGE_SUFFIX, " image");
        }

        let mut flags = vec![format!("display=\"{}\"", display_name)];
        if is_image_variant || class.can_be_backed_up() {
            flags.push("backup=1".to_string());
        }
        if is_image_variant {
            flags.push("flashimg=1".to_string());
        }
        if !device.starts_with('/') {
            flags.push("logical".to_string());
        }
        if slotselect {
            flags.push("slotselect".to_string());
        }

        Self {
            mount_point,
            fstype: fstype.to_string(),
            device: device.to_string(),
            name,
            display_name,
            is_image_variant,
            flags,
        }
    }

    /// Parse one fstab line; `None` for comments and malformed lines
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.starts_with('#') {
            return None;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 2 {
            return None;
        }

        if TWRP_LAYOUT_FSTYPES.contains(&fields[1]) {
            let device = fields.get(2)?;
            Some(Self::new(fields[0], fields[1], device, false))
        } else {
            let fstype = fields.get(2)?;
            let slotselect = fields[3..]
                .iter()
                .any(|field| field.contains("slotselect"));
            Some(Self::new(fields[1], fstype, fields[0], slotselect))
        }
    }

    pub fn is_known_partition(&self) -> bool {
        PartitionClass::of(&self.name) != PartitionClass::Other
    }

    /// Raw `emmc` counterpart of this entry, mapped to the same device
    pub fn raw_image(&self) -> Self {
        Self::new(
            &format!("{}{}", self.mount_point, IMAGE_SUFFIX),
            "emmc",
            &self.device,
            false,
        )
    }
}

fn normalize_mount_point(mount_point: &str) -> String {
    let mount_point = ALTERNATIVE_MOUNT_POINTS
        .iter()
        .find(|(from, _)| *from == mount_point)
        .map_or(mount_point, |(_, to)| *to);

    if mount_point.matches('/').count() > 1 {
        let last = mount_point.rsplit('/').next().unwrap_or_default();
        format!("/{}", last)
    } else {
        mount_point.to_string()
    }
}

/// First character upper-cased, the rest lower-cased
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Parse a whole fstab into entries, raw image variants interleaved.
///
/// A raw image entry already listed right after its source (as in a
/// previously formatted fstab) is kept once, never synthesized twice.
pub fn parse(text: &str, policy: UnknownPartitionPolicy) -> Vec<FstabEntry> {
    let mut entries = Vec::new();
    let mut pending_image: Option<FstabEntry> = None;

    for line in text.lines() {
        let Some(entry) = FstabEntry::parse_line(line) else {
            if !line.trim().is_empty() && !line.trim_start().starts_with('#') {
                tracing::debug!("Skipping malformed fstab line: {}", line.trim());
            }
            continue;
        };

        if policy == UnknownPartitionPolicy::Drop && !entry.is_known_partition() {
            tracing::debug!("Dropping unknown partition {}", entry.name);
            continue;
        }

        if let Some(image) = pending_image.take() {
            if image.name == entry.name && image.device == entry.device {
                tracing::debug!("{} is already listed", image.name);
            } else {
                entries.push(image);
            }
        }

        pending_image = needs_image_entry(&entry.name).then(|| entry.raw_image());
        entries.push(entry);
    }

    entries.extend(pending_image);
    entries
}
