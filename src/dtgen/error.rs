use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DtgenError>;

#[derive(Debug, Error)]
pub enum DtgenError {
    /// A required device fact is absent from every candidate property
    #[error("Device {0} could not be found in build.prop")]
    MissingProperty(&'static str),
    /// A fact used as a path component is empty or not a single plain name
    #[error("Device {fact} '{value}' is not usable as a directory name")]
    InvalidProperty { fact: &'static str, value: String },
    /// None of the candidate property files exist in the ramdisk
    #[error("No usable build.prop found in {}", .0.display())]
    NoBuildProp(PathBuf),
    /// None of the candidate fstab files exist and there is no TWRP fstab
    #[error("No usable fstab found in {}", .0.display())]
    NoUsableFstab(PathBuf),
    /// Raw ABI string with no known prefix; reported, never propagated
    #[error("Unsupported architecture '{0}', falling back to defaults")]
    UnsupportedArchitecture(String),
    #[error("Image {} doesn't exist", .0.display())]
    ImageNotFound(PathBuf),
    #[error("Image extraction failed: {0}")]
    Unpack(String),
    #[error("Image extraction timed out")]
    UnpackTimeout,
    #[error("Git error: {0}")]
    Git(String),
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("JSON error")]
    Json(#[from] serde_json::Error),
}

impl DtgenError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        DtgenError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error must abort device tree generation
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DtgenError::UnsupportedArchitecture(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_property_names_fact() {
        let error = DtgenError::MissingProperty("codename");
        assert_eq!(
            error.to_string(),
            "Device codename could not be found in build.prop"
        );
        assert!(error.is_fatal());
    }

    #[test]
    fn test_invalid_property_is_fatal() {
        let error = DtgenError::InvalidProperty {
            fact: "codename",
            value: "../x".to_string(),
        };
        assert!(error.is_fatal());
        assert_eq!(
            error.to_string(),
            "Device codename '../x' is not usable as a directory name"
        );
    }

    #[test]
    fn test_unsupported_architecture_is_not_fatal() {
        let error = DtgenError::UnsupportedArchitecture("mips".to_string());
        assert!(!error.is_fatal());
        assert!(error.to_string().contains("'mips'"));
    }

    #[test]
    fn test_no_usable_fstab_is_fatal() {
        let error = DtgenError::NoUsableFstab(PathBuf::from("/tmp/ramdisk"));
        assert!(error.is_fatal());
        assert_eq!(error.to_string(), "No usable fstab found in /tmp/ramdisk");
    }

    #[test]
    fn test_io_error_includes_path() {
        let error = DtgenError::io(
            "/tmp/missing.prop",
            io::Error::new(io::ErrorKind::NotFound, "not found"),
        );
        let formatted = error.to_string();
        assert!(formatted.contains("/tmp/missing.prop"));
        assert!(formatted.contains("not found"));
    }

    #[test]
    fn test_error_trait() {
        let error = DtgenError::UnpackTimeout;
        let _: &dyn std::error::Error = &error;
    }
}
