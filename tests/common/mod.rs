// Shared test utilities
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Stand-in for AIK's `unpackimg.sh`. Test "images" are text files listing
/// `path=line` entries; each line is appended to `path` under the AIK dir.
#[allow(dead_code)]
pub const FAKE_UNPACK_SCRIPT: &str = r#"#!/bin/sh
[ "$1" = "--nosudo" ] || exit 2
mkdir -p ramdisk split_img
while IFS= read -r line; do
  [ -z "$line" ] && continue
  path="${line%%=*}"
  content="${line#*=}"
  mkdir -p "$(dirname "$path")"
  printf '%s\n' "$content" >> "$path"
done < "$2"
echo "Done!"
"#;

/// Stand-in for git: logs every invocation next to itself and reports no
/// configured identity
#[allow(dead_code)]
pub const FAKE_GIT: &str = r#"#!/bin/sh
here="$(dirname "$0")"
echo "$@" >> "$here/git.log"
[ "$1" = "config" ] && exit 1
exit 0
"#;

#[allow(dead_code)]
pub const GINKGO_PROPS: &[&str] = &[
    "# begin build properties",
    "ro.product.vendor.device=ginkgo",
    "ro.product.vendor.manufacturer=Xiaomi",
    "ro.product.vendor.brand=xiaomi",
    "ro.product.vendor.model=Redmi Note 8",
    "ro.product.cpu.abi=arm64-v8a",
    "ro.board.platform=trinket",
    "ro.build.ab_update=false",
];

#[allow(dead_code)]
pub const GINKGO_FSTAB: &[&str] = &[
    "# Android fstab file.",
    "/dev/block/bootdevice/by-name/system /system ext4 ro,barrier=1 wait",
    "/dev/block/bootdevice/by-name/vendor /vendor ext4 ro,barrier=1 wait",
    "/dev/block/bootdevice/by-name/userdata /data f2fs nosuid,nodev wait,check,fileencryption=ice",
    "/dev/block/bootdevice/by-name/boot /boot emmc defaults defaults",
    "/dev/block/bootdevice/by-name/misc /misc emmc defaults defaults",
    "/dev/block/bootdevice/by-name/persist /persist ext4 noatime wait",
];

/// Write an executable shell script
#[allow(dead_code)]
pub fn write_script(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write script");
    let mut perms = fs::metadata(&path)
        .expect("read script metadata")
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("set script permissions");
    path
}

/// Create a fake AIK checkout under `dir`
#[allow(dead_code)]
pub fn fake_aik(dir: &Path) -> PathBuf {
    let aik = dir.join("aik");
    fs::create_dir_all(&aik).expect("create aik dir");
    write_script(&aik, "unpackimg.sh", FAKE_UNPACK_SCRIPT);
    aik
}

/// Fake image builder for [`FAKE_UNPACK_SCRIPT`]
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeImage {
    lines: Vec<String>,
}

#[allow(dead_code)]
impl FakeImage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with the given lines
    pub fn file(mut self, path: &str, lines: &[&str]) -> Self {
        for line in lines {
            self.lines.push(format!("{}={}", path, line));
        }
        self
    }

    /// A stock recovery image for ginkgo
    pub fn ginkgo() -> Self {
        Self::new()
            .file("ramdisk/prop.default", GINKGO_PROPS)
            .file("ramdisk/etc/recovery.fstab", GINKGO_FSTAB)
            .file("ramdisk/init.rc", &["on init"])
            .file("ramdisk/init.recovery.qcom.rc", &["on boot"])
            .file("split_img/recovery.img-zImage", &["kernel"])
            .file("split_img/recovery.img-dtbo", &["dtbo"])
            .file("split_img/recovery.img-pagesize", &["4096"])
            .file("split_img/recovery.img-origsize", &["67108864"])
            .file("split_img/recovery.img-header_version", &["2"])
    }

    pub fn write(&self, path: &Path) -> PathBuf {
        let mut text = self.lines.join("\n");
        text.push('\n');
        fs::write(path, text).expect("write fake image");
        path.to_path_buf()
    }
}
