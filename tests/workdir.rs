mod common;

use common::{fake_aik, FakeImage};
use recovery_dtgen::dtgen::{generate_device_tree, GenerateOptions, ImageSource};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Restores an environment variable when dropped
struct EnvVarGuard {
    key: &'static str,
    previous: Option<String>,
}

impl EnvVarGuard {
    fn set(key: &'static str, value: &Path) -> Self {
        let previous = std::env::var(key).ok();
        std::env::set_var(key, value);
        Self { key, previous }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match &self.previous {
            Some(value) => std::env::set_var(self.key, value),
            None => std::env::remove_var(self.key),
        }
    }
}

fn entries(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

// Both cases live in one test: the environment is process-wide
#[tokio::test]
async fn test_workdir_under_tmp_dir_override() {
    let dir = tempdir().unwrap();
    let tmp = dir.path().join("tmp");
    let _guard = EnvVarGuard::set("DTGEN_TMP_DIR", &tmp);

    let image = FakeImage::ginkgo().write(&dir.path().join("recovery.img"));
    let mut options = GenerateOptions::new(ImageSource::Single(image), dir.path().join("output"));
    options.unpack.aik_path = Some(fake_aik(dir.path()));
    options.git.enabled = false;

    generate_device_tree(&options).await.unwrap();
    assert!(tmp.is_dir(), "override directory should be created");
    assert!(entries(&tmp).is_empty(), "work dir should be removed");

    options.unpack.keep_workdir = true;
    generate_device_tree(&options).await.unwrap();
    let kept = entries(&tmp);
    assert_eq!(kept.len(), 1);
    assert!(kept[0].starts_with("dtgen-aik-"));
    assert!(tmp.join(&kept[0]).join("aik/ramdisk/prop.default").is_file());
}
