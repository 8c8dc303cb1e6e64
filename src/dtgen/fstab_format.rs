use super::fstab::FstabEntry;

pub const FSTAB_HEADER: &str =
    "# mount point       fstype    device                                                                flags";

/// Spaces left after the longest value of each column
const COLUMN_PADDING: usize = 5;

fn column_width(entries: &[FstabEntry], column: fn(&FstabEntry) -> &str) -> usize {
    entries
        .iter()
        .map(|entry| column(entry).len())
        .max()
        .unwrap_or(0)
        + COLUMN_PADDING
}

/// Serialize entries into a column-aligned TWRP fstab
pub fn format(entries: &[FstabEntry]) -> String {
    let mount_point_width = column_width(entries, |e| e.mount_point.as_str());
    let fstype_width = column_width(entries, |e| e.fstype.as_str());
    let device_width = column_width(entries, |e| e.device.as_str());

    let mut out = String::with_capacity(FSTAB_HEADER.len() + 1 + entries.len() * 128);
    out.push_str(FSTAB_HEADER);
    out.push('\n');

    for entry in entries {
        out.push_str(&format!(
            "{:<mount_point_width$}{:<fstype_width$}{:<device_width$}flags={}\n",
            entry.mount_point,
            entry.fstype,
            entry.device,
            entry.flags.join(";"),
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtgen::fstab::{parse, UnknownPartitionPolicy};

    const SAMPLE: &str = "\
/dev/block/bootdevice/by-name/boot /boot emmc defaults defaults
system /system ext4 ro wait,logical,first_stage_mount
/dev/block/bootdevice/by-name/userdata /data f2fs nosuid wait
";

    #[test]
    fn test_format_columns() {
        let entries = parse(SAMPLE, UnknownPartitionPolicy::default());
        let text = format(&entries);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], FSTAB_HEADER);
        assert_eq!(lines.len(), entries.len() + 1);

        // "/system_image" is the longest mount point (13), "/dev/block/bootdevice/by-name/userdata" the longest device (38)
        assert_eq!(
            lines[1],
            format!(
                "{:<18}{:<9}{:<43}flags=display=\"Boot\";backup=1;flashimg=1",
                "/boot", "emmc", "/dev/block/bootdevice/by-name/boot"
            )
        );
        assert_eq!(
            lines[3],
            format!(
                "{:<18}{:<9}{:<43}flags=display=\"System image\";backup=1;flashimg=1;logical",
                "/system_image", "emmc", "system"
            )
        );
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_image_entry_follows_source() {
        let text = format(&parse(SAMPLE, UnknownPartitionPolicy::default()));
        let lines: Vec<&str> = text.lines().collect();
        let system = lines.iter().position(|l| l.starts_with("/system ")).unwrap();
        let next: Vec<&str> = lines[system + 1].split_whitespace().collect();
        assert_eq!(next[0], "/system_image");
        assert_eq!(next[1], "emmc");
        assert_eq!(next[2], "system");
        assert!(lines[system + 1].contains("backup=1;flashimg=1"));
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format(&[]), format!("{}\n", FSTAB_HEADER));
    }

    #[test]
    fn test_format_is_stable() {
        let entries = parse(SAMPLE, UnknownPartitionPolicy::default());
        assert_eq!(format(&entries), format(&entries));
    }

    #[test]
    fn test_round_trip_preserves_entries() {
        let entries = parse(SAMPLE, UnknownPartitionPolicy::default());
        let text = format(&entries);
        let reparsed = parse(&text, UnknownPartitionPolicy::default());

        assert_eq!(reparsed, entries);
        assert_eq!(format(&reparsed), text);
    }
}
