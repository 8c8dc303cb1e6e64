//! Device facts resolved from build props
//!
//! Each fact is looked up through an ordered list of candidate property
//! names; the first one present in the store wins.

use serde::Serialize;

use super::arch::Architecture;
use super::build_prop::PropertyStore;
use super::error::{DtgenError, Result};

/// Partitions whose `ro.product.<partition>.*` props are tried after the
/// unprefixed one
const PRODUCT_PARTITIONS: &[&str] = &["odm", "product", "system", "system_ext", "vendor"];

pub const ARCH_PROPS: &[&str] = &["ro.product.cpu.abi", "ro.product.cpu.abilist"];
pub const AB_UPDATE_PROPS: &[&str] = &["ro.build.ab_update"];
pub const PLATFORM_PROPS: &[&str] = &["ro.board.platform"];
pub const PIXEL_FORMAT_PROPS: &[&str] = &["ro.minui.pixel_format"];

/// `ro.product.<value>` followed by every partition-prefixed variant
pub fn product_props(value: &str) -> Vec<String> {
    std::iter::once(format!("ro.product.{}", value))
        .chain(
            PRODUCT_PARTITIONS
                .iter()
                .map(|partition| format!("ro.product.{}.{}", partition, value)),
        )
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub codename: String,
    pub manufacturer: String,
    pub brand: Option<String>,
    pub model: String,
    pub architecture: Architecture,
    /// ABI string the architecture was derived from, kept for diagnostics
    pub raw_arch: Option<String>,
    pub is_ab_device: bool,
    pub platform: String,
    pub pixel_format: Option<String>,
}

impl DeviceInfo {
    pub fn device_has_64bit_arch(&self) -> bool {
        self.architecture.is_64bit()
    }

    /// Brand for product makefiles; falls back to the manufacturer
    pub fn brand_or_manufacturer(&self) -> &str {
        self.brand.as_deref().unwrap_or(&self.manufacturer)
    }
}

/// Return the value of the first candidate key present in `store`.
///
/// With no match, `default` is returned if given; otherwise a required fact
/// fails with [`DtgenError::MissingProperty`] and an optional one is `None`.
pub fn resolve_fact<K: AsRef<str>>(
    store: &PropertyStore,
    fact: &'static str,
    candidate_keys: &[K],
    required: bool,
    default: Option<&str>,
) -> Result<Option<String>> {
    for key in candidate_keys {
        if let Some(value) = store.get(key.as_ref()) {
            tracing::debug!("Resolved {} from {}: {}", fact, key.as_ref(), value);
            return Ok(Some(value.to_string()));
        }
    }

    match default {
        Some(default) => Ok(Some(default.to_string())),
        None if required => Err(DtgenError::MissingProperty(fact)),
        None => Ok(None),
    }
}

fn required_fact<K: AsRef<str>>(
    store: &PropertyStore,
    fact: &'static str,
    candidate_keys: &[K],
) -> Result<String> {
    resolve_fact(store, fact, candidate_keys, true, None)?
        .ok_or(DtgenError::MissingProperty(fact))
}

/// Codename and manufacturer name the tree directory, so each must be a
/// single plain path component
fn path_component(fact: &'static str, value: String) -> Result<String> {
    let plain = !value.is_empty()
        && value != "."
        && value != ".."
        && !value.contains(['/', '\\']);
    if plain {
        Ok(value)
    } else {
        Err(DtgenError::InvalidProperty { fact, value })
    }
}

/// Resolve every device fact from a property store
pub fn resolve(store: &PropertyStore) -> Result<DeviceInfo> {
    let codename = path_component(
        "codename",
        required_fact(store, "codename", &product_props("device"))?,
    )?;

    // Some vendors set e.g. "Qualcomm Technologies, Inc"; keep the first word
    let manufacturer = required_fact(store, "manufacturer", &product_props("manufacturer"))?
        .split_whitespace()
        .next()
        .map(str::to_lowercase)
        .ok_or(DtgenError::MissingProperty("manufacturer"))
        .and_then(|manufacturer| path_component("manufacturer", manufacturer))?;

    let brand = resolve_fact(store, "brand", &product_props("brand"), false, None)?;
    let model = required_fact(store, "model", &product_props("model"))?;

    let raw_arch = resolve_fact(store, "architecture", ARCH_PROPS, false, None)?;
    let architecture = raw_arch
        .as_deref()
        .map(Architecture::classify)
        .unwrap_or(Architecture::Unknown);
    if architecture == Architecture::Unknown {
        let raw = raw_arch.clone().unwrap_or_default();
        tracing::warn!("{}", DtgenError::UnsupportedArchitecture(raw));
    }

    let is_ab_device = resolve_fact(store, "A/B flag", AB_UPDATE_PROPS, false, Some("false"))?
        .is_some_and(|value| value == "true");
    let platform = resolve_fact(store, "platform", PLATFORM_PROPS, false, Some("default"))?
        .unwrap_or_else(|| "default".to_string());
    let pixel_format = resolve_fact(store, "pixel format", PIXEL_FORMAT_PROPS, false, None)?;

    Ok(DeviceInfo {
        codename,
        manufacturer,
        brand,
        model,
        architecture,
        raw_arch,
        is_ab_device,
        platform,
        pixel_format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC_PROPS: &str = "\
ro.product.vendor.device=ginkgo
ro.product.vendor.manufacturer=Xiaomi
ro.product.vendor.brand=xiaomi
ro.product.vendor.model=Redmi Note 8
ro.product.cpu.abi=arm64-v8a
ro.board.platform=trinket
";

    #[test]
    fn test_product_props_order() {
        assert_eq!(
            product_props("device"),
            vec![
                "ro.product.device",
                "ro.product.odm.device",
                "ro.product.product.device",
                "ro.product.system.device",
                "ro.product.system_ext.device",
                "ro.product.vendor.device",
            ]
        );
    }

    #[test]
    fn test_resolve_fact_first_candidate_wins() {
        let store = PropertyStore::parse("ro.b=second\nro.a=first\n");
        let value = resolve_fact(&store, "fact", &["ro.a", "ro.b"], true, None).unwrap();
        assert_eq!(value.as_deref(), Some("first"));

        let value = resolve_fact(&store, "fact", &["ro.b", "ro.a"], true, None).unwrap();
        assert_eq!(value.as_deref(), Some("second"));
    }

    #[test]
    fn test_resolve_fact_default_and_absence() {
        let store = PropertyStore::parse("");
        let value = resolve_fact(&store, "platform", &["ro.board.platform"], false, Some("default"));
        assert_eq!(value.unwrap().as_deref(), Some("default"));

        let value = resolve_fact(&store, "pixel format", &["ro.minui.pixel_format"], false, None);
        assert_eq!(value.unwrap(), None);

        let err = resolve_fact(&store, "codename", &["ro.product.device"], true, None).unwrap_err();
        assert!(matches!(err, DtgenError::MissingProperty("codename")));
    }

    #[test]
    fn test_resolve_basic_device() {
        let info = resolve(&PropertyStore::parse(BASIC_PROPS)).unwrap();
        assert_eq!(info.codename, "ginkgo");
        assert_eq!(info.manufacturer, "xiaomi");
        assert_eq!(info.brand.as_deref(), Some("xiaomi"));
        assert_eq!(info.model, "Redmi Note 8");
        assert_eq!(info.architecture, Architecture::Arm64);
        assert!(info.device_has_64bit_arch());
        assert!(!info.is_ab_device);
        assert_eq!(info.platform, "trinket");
        assert_eq!(info.pixel_format, None);
    }

    #[test]
    fn test_unprefixed_prop_beats_partition_props() {
        let props = format!("{}ro.product.device=willow\n", BASIC_PROPS);
        let info = resolve(&PropertyStore::parse(&props)).unwrap();
        assert_eq!(info.codename, "willow");
    }

    #[test]
    fn test_manufacturer_first_token_lowercased() {
        let props = "\
ro.product.device=msmnile
ro.product.manufacturer=Qualcomm Technologies, Inc
ro.product.model=QRD
";
        let info = resolve(&PropertyStore::parse(props)).unwrap();
        assert_eq!(info.manufacturer, "qualcomm");
        assert_eq!(info.brand, None);
        assert_eq!(info.brand_or_manufacturer(), "qualcomm");
    }

    #[test]
    fn test_missing_required_facts() {
        let err = resolve(&PropertyStore::parse("ro.product.model=X\n")).unwrap_err();
        assert!(matches!(err, DtgenError::MissingProperty("codename")));

        let err = resolve(&PropertyStore::parse("ro.product.device=x\nro.product.model=X\n"))
            .unwrap_err();
        assert!(matches!(err, DtgenError::MissingProperty("manufacturer")));

        let err = resolve(&PropertyStore::parse(
            "ro.product.device=x\nro.product.manufacturer=Y\n",
        ))
        .unwrap_err();
        assert!(matches!(err, DtgenError::MissingProperty("model")));
    }

    #[test]
    fn test_blank_manufacturer_is_missing() {
        let props = "ro.product.device=x\nro.product.manufacturer=  \nro.product.model=X\n";
        let err = resolve(&PropertyStore::parse(props)).unwrap_err();
        assert!(matches!(err, DtgenError::MissingProperty("manufacturer")));
    }

    #[test]
    fn test_codename_must_be_a_plain_directory_name() {
        for value in ["", ".", "..", "../x", "/abs", "a/b", "a\\b"] {
            let props = format!("{}ro.product.device={}\n", BASIC_PROPS, value);
            let err = resolve(&PropertyStore::parse(&props)).unwrap_err();
            match err {
                DtgenError::InvalidProperty { fact, value: got } => {
                    assert_eq!(fact, "codename");
                    assert_eq!(got, value);
                }
                other => panic!("Unexpected error for {:?}: {:?}", value, other),
            }
        }
    }

    #[test]
    fn test_manufacturer_must_be_a_plain_directory_name() {
        for value in ["..", "/abs", "../x", "Vendor/Sub"] {
            let props = format!(
                "ro.product.device=x\nro.product.manufacturer={}\nro.product.model=X\n",
                value
            );
            let err = resolve(&PropertyStore::parse(&props)).unwrap_err();
            assert!(
                matches!(err, DtgenError::InvalidProperty { fact: "manufacturer", .. }),
                "value {:?}: {:?}",
                value,
                err
            );
        }
    }

    #[test]
    fn test_ab_flag_coercion() {
        for (value, expected) in [("true", true), ("false", false), ("1", false), ("", false)] {
            let props = format!("{}ro.build.ab_update={}\n", BASIC_PROPS, value);
            let info = resolve(&PropertyStore::parse(&props)).unwrap();
            assert_eq!(info.is_ab_device, expected, "value {:?}", value);
        }
    }

    #[test]
    fn test_defaults_and_optional_facts() {
        let props = "\
ro.product.device=x
ro.product.manufacturer=Y
ro.product.model=Z
ro.minui.pixel_format=RGBX_8888
";
        let info = resolve(&PropertyStore::parse(props)).unwrap();
        assert_eq!(info.platform, "default");
        assert_eq!(info.pixel_format.as_deref(), Some("RGBX_8888"));
        assert_eq!(info.architecture, Architecture::Unknown);
        assert_eq!(info.raw_arch, None);
    }

    #[test]
    fn test_abilist_fallback_and_unknown_arch() {
        let props = "\
ro.product.device=x
ro.product.manufacturer=Y
ro.product.model=Z
ro.product.cpu.abilist=x86_64,x86
";
        let info = resolve(&PropertyStore::parse(props)).unwrap();
        assert_eq!(info.architecture, Architecture::X86_64);

        let props = props.replace("x86_64,x86", "mips");
        let info = resolve(&PropertyStore::parse(&props)).unwrap();
        assert_eq!(info.architecture, Architecture::Unknown);
        assert_eq!(info.raw_arch.as_deref(), Some("mips"));
    }
}
