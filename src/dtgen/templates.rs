//! Build files of the generated tree, rendered from fixed text

use super::arch::Architecture;
use super::device_info::DeviceInfo;
use super::image_info::ImageInfo;

const COPYRIGHT_HEADER: &str = "\
#
# Copyright (C) 2024 The Android Open Source Project
#
# SPDX-License-Identifier: Apache-2.0
#
";

/// Everything the templates are rendered from
#[derive(Debug, Clone, Copy)]
pub struct TreeContext<'a> {
    pub device: &'a DeviceInfo,
    pub image: &'a ImageInfo,
    /// Name of the kernel under `prebuilt/`
    pub kernel_name: &'a str,
}

impl<'a> TreeContext<'a> {
    pub fn new(device: &'a DeviceInfo, image: &'a ImageInfo, kernel_name: &'a str) -> Self {
        Self {
            device,
            image,
            kernel_name,
        }
    }

    fn device_path(&self) -> String {
        format!(
            "device/{}/{}",
            self.device.manufacturer, self.device.codename
        )
    }

    /// File name of the product makefile
    pub fn product_makefile_name(&self) -> String {
        format!("twrp_{}.mk", self.device.codename)
    }
}

/// Every file to write into the tree root, as (name, contents)
pub fn render_all(ctx: &TreeContext<'_>) -> Vec<(String, String)> {
    vec![
        ("Android.mk".to_string(), android_mk(ctx)),
        ("AndroidProducts.mk".to_string(), android_products_mk(ctx)),
        ("BoardConfig.mk".to_string(), board_config_mk(ctx)),
        ("device.mk".to_string(), device_mk(ctx)),
        (ctx.product_makefile_name(), product_mk(ctx)),
        ("vendorsetup.sh".to_string(), vendorsetup_sh(ctx)),
    ]
}

pub fn android_mk(ctx: &TreeContext<'_>) -> String {
    format!(
        "{header}
LOCAL_PATH := $(call my-dir)

ifeq ($(TARGET_DEVICE),{codename})
include $(call all-subdir-makefiles,$(LOCAL_PATH))
endif
",
        header = COPYRIGHT_HEADER,
        codename = ctx.device.codename,
    )
}

pub fn android_products_mk(ctx: &TreeContext<'_>) -> String {
    format!(
        "{header}
PRODUCT_MAKEFILES := \\
    $(LOCAL_DIR)/twrp_{codename}.mk

COMMON_LUNCH_CHOICES := \\
    twrp_{codename}-user \\
    twrp_{codename}-userdebug \\
    twrp_{codename}-eng
",
        header = COPYRIGHT_HEADER,
        codename = ctx.device.codename,
    )
}

fn arch_section(ctx: &TreeContext<'_>) -> String {
    match ctx.device.architecture {
        Architecture::Arm64 => "\
# Architecture
TARGET_ARCH := arm64
TARGET_ARCH_VARIANT := armv8-a
TARGET_CPU_ABI := arm64-v8a
TARGET_CPU_ABI2 :=
TARGET_CPU_VARIANT := generic

TARGET_2ND_ARCH := arm
TARGET_2ND_ARCH_VARIANT := armv7-a-neon
TARGET_2ND_CPU_ABI := armeabi-v7a
TARGET_2ND_CPU_ABI2 := armeabi
TARGET_2ND_CPU_VARIANT := generic
"
        .to_string(),
        Architecture::X86_64 => "\
# Architecture
TARGET_ARCH := x86_64
TARGET_ARCH_VARIANT := x86_64
TARGET_CPU_ABI := x86_64
TARGET_CPU_VARIANT := generic

TARGET_2ND_ARCH := x86
TARGET_2ND_ARCH_VARIANT := x86
TARGET_2ND_CPU_ABI := x86
TARGET_2ND_CPU_VARIANT := generic
"
        .to_string(),
        Architecture::X86 => "\
# Architecture
TARGET_ARCH := x86
TARGET_ARCH_VARIANT := generic
TARGET_CPU_ABI := x86
TARGET_CPU_ABI2 := armeabi-v7a
TARGET_CPU_ABI_LIST := x86,armeabi-v7a,armeabi
TARGET_CPU_ABI_LIST_32_BIT := x86,armeabi-v7a,armeabi
TARGET_CPU_VARIANT := generic
"
        .to_string(),
        Architecture::Arm | Architecture::Unknown => "\
# Architecture
TARGET_ARCH := arm
TARGET_ARCH_VARIANT := armv7-a-neon
TARGET_CPU_ABI := armeabi-v7a
TARGET_CPU_ABI2 := armeabi
TARGET_CPU_VARIANT := generic
"
        .to_string(),
    }
}

/// `KEY := value` line, empty when the value is absent
fn optional_var(key: &str, value: Option<&str>) -> String {
    value
        .map(|value| format!("{} := {}\n", key, value))
        .unwrap_or_default()
}

pub fn board_config_mk(ctx: &TreeContext<'_>) -> String {
    let device = ctx.device;
    let image = ctx.image;

    let ab_section = if device.is_ab_device {
        "\
# A/B
AB_OTA_UPDATER := true
BOARD_USES_RECOVERY_AS_BOOT := true
TW_INCLUDE_REPACKTOOLS := true

"
    } else {
        ""
    };

    let board_name = image
        .board_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(&device.codename);

    let kernel_vars = [
        optional_var("BOARD_KERNEL_BASE", image.base_address.as_deref()),
        optional_var("BOARD_KERNEL_CMDLINE", image.cmdline.as_deref()),
        optional_var("BOARD_KERNEL_PAGESIZE", image.pagesize.as_deref()),
        optional_var("BOARD_RAMDISK_OFFSET", image.ramdisk_offset.as_deref()),
        optional_var("BOARD_KERNEL_TAGS_OFFSET", image.tags_offset.as_deref()),
    ]
    .concat();

    let mut mkbootimg_args =
        String::from("BOARD_MKBOOTIMG_ARGS += --header_version $(BOARD_BOOTIMG_HEADER_VERSION)\n");
    if image.ramdisk_offset.is_some() {
        mkbootimg_args.push_str("BOARD_MKBOOTIMG_ARGS += --ramdisk_offset $(BOARD_RAMDISK_OFFSET)\n");
    }
    if image.tags_offset.is_some() {
        mkbootimg_args.push_str("BOARD_MKBOOTIMG_ARGS += --tags_offset $(BOARD_KERNEL_TAGS_OFFSET)\n");
    }

    let mut prebuilt_blobs = String::new();
    if image.has_dt_image() {
        prebuilt_blobs.push_str(
            "\
TARGET_PREBUILT_DT := $(DEVICE_PATH)/prebuilt/dt.img
BOARD_MKBOOTIMG_ARGS += --dt $(TARGET_PREBUILT_DT)
BOARD_INCLUDE_DTB_IN_BOOTIMG :=
",
        );
    }
    if image.has_dtb_image() {
        prebuilt_blobs.push_str(
            "\
TARGET_PREBUILT_DTB := $(DEVICE_PATH)/prebuilt/dtb.img
BOARD_MKBOOTIMG_ARGS += --dtb $(TARGET_PREBUILT_DTB)
BOARD_INCLUDE_DTB_IN_BOOTIMG :=
",
        );
    }
    if image.dtbo_image.is_some() {
        prebuilt_blobs.push_str(
            "\
BOARD_PREBUILT_DTBOIMAGE := $(DEVICE_PATH)/prebuilt/dtbo.img
BOARD_KERNEL_SEPARATED_DTBO :=
",
        );
    }

    let flash_block_size = image
        .flash_block_size()
        .map(|size| format!("BOARD_FLASH_BLOCK_SIZE := {} # (BOARD_KERNEL_PAGESIZE * 64)\n", size))
        .unwrap_or_default();
    let partition_size_key = if device.is_ab_device {
        "BOARD_BOOTIMAGE_PARTITION_SIZE"
    } else {
        "BOARD_RECOVERYIMAGE_PARTITION_SIZE"
    };
    let partition_size = optional_var(partition_size_key, image.recovery_size.as_deref());
    let pixel_format = optional_var("TARGET_RECOVERY_PIXEL_FORMAT", device.pixel_format.as_deref());

    format!(
        "{header}
DEVICE_PATH := {device_path}

# For building with minimal manifest
ALLOW_MISSING_DEPENDENCIES := true

{ab_section}{arch_section}
# Bootloader
TARGET_BOOTLOADER_BOARD_NAME := {board_name}
TARGET_NO_BOOTLOADER := true

# Kernel
BOARD_BOOTIMG_HEADER_VERSION := {header_version}
{kernel_vars}{mkbootimg_args}BOARD_KERNEL_IMAGE_NAME := {kernel_name}
TARGET_KERNEL_ARCH := {arch}
TARGET_KERNEL_HEADER_ARCH := {arch}
TARGET_KERNEL_SOURCE := kernel/{manufacturer}/{codename}
TARGET_KERNEL_CONFIG := {codename}_defconfig

# Kernel - prebuilt
TARGET_FORCE_PREBUILT_KERNEL := true
ifeq ($(TARGET_FORCE_PREBUILT_KERNEL),true)
TARGET_PREBUILT_KERNEL := $(DEVICE_PATH)/prebuilt/{kernel_name}
{prebuilt_blobs}endif

# Partitions
{flash_block_size}{partition_size}BOARD_HAS_LARGE_FILESYSTEM := true
BOARD_SYSTEMIMAGE_PARTITION_TYPE := ext4
BOARD_USERDATAIMAGE_FILE_SYSTEM_TYPE := ext4
BOARD_VENDORIMAGE_FILE_SYSTEM_TYPE := ext4
TARGET_COPY_OUT_VENDOR := vendor

# Platform
TARGET_BOARD_PLATFORM := {platform}

# Recovery
{pixel_format}TARGET_USERIMAGES_USE_EXT4 := true
TARGET_USERIMAGES_USE_F2FS := true

# TWRP Configuration
TW_THEME := portrait_hdpi
TW_EXTRA_LANGUAGES := true
TW_SCREEN_BLANK_ON_BOOT := true
TW_INPUT_BLACKLIST := \"hbtp_vm\"
TW_USE_TOOLBOX := true
",
        header = COPYRIGHT_HEADER,
        device_path = ctx.device_path(),
        ab_section = ab_section,
        arch_section = arch_section(ctx),
        board_name = board_name,
        header_version = image.header_version,
        kernel_vars = kernel_vars,
        mkbootimg_args = mkbootimg_args,
        kernel_name = ctx.kernel_name,
        arch = device.architecture,
        manufacturer = device.manufacturer,
        codename = device.codename,
        prebuilt_blobs = prebuilt_blobs,
        flash_block_size = flash_block_size,
        partition_size = partition_size,
        platform = device.platform,
        pixel_format = pixel_format,
    )
}

pub fn device_mk(ctx: &TreeContext<'_>) -> String {
    let ab_section = if ctx.device.is_ab_device {
        format!(
            "
# A/B
AB_OTA_POSTINSTALL_CONFIG += \\
    RUN_POSTINSTALL_system=true \\
    POSTINSTALL_PATH_system=system/bin/otapreopt_script \\
    FILESYSTEM_TYPE_system=ext4 \\
    POSTINSTALL_OPTIONAL_system=true

# Boot control HAL
PRODUCT_PACKAGES += \\
    android.hardware.boot@1.0-impl \\
    android.hardware.boot@1.0-service

PRODUCT_PACKAGES += \\
    bootctrl.{platform}

PRODUCT_STATIC_BOOT_CONTROL_HAL := \\
    bootctrl.{platform} \\
    libgptutils \\
    libz \\
    libcutils

PRODUCT_PACKAGES += \\
    otapreopt_script \\
    cppreopts.sh \\
    update_engine \\
    update_verifier \\
    update_engine_sideload
",
            platform = ctx.device.platform,
        )
    } else {
        String::new()
    };

    format!(
        "{header}
LOCAL_PATH := {device_path}
{ab_section}",
        header = COPYRIGHT_HEADER,
        device_path = ctx.device_path(),
        ab_section = ab_section,
    )
}

pub fn product_mk(ctx: &TreeContext<'_>) -> String {
    let device = ctx.device;
    let core_config = if device.device_has_64bit_arch() {
        "core_64_bit.mk"
    } else {
        "core.mk"
    };

    format!(
        "{header}
# Inherit from those products. Most specific first.
$(call inherit-product, $(SRC_TARGET_DIR)/product/{core_config})
$(call inherit-product, $(SRC_TARGET_DIR)/product/full_base_telephony.mk)

# Inherit some common TWRP stuff.
$(call inherit-product, vendor/twrp/config/common.mk)

# Inherit from {codename} device
$(call inherit-product, device/{manufacturer}/{codename}/device.mk)

PRODUCT_DEVICE := {codename}
PRODUCT_NAME := twrp_{codename}
PRODUCT_BRAND := {brand}
PRODUCT_MODEL := {model}
PRODUCT_MANUFACTURER := {manufacturer}

PRODUCT_GMS_CLIENTID_BASE := android-{manufacturer}
",
        header = COPYRIGHT_HEADER,
        core_config = core_config,
        codename = device.codename,
        manufacturer = device.manufacturer,
        brand = device.brand_or_manufacturer(),
        model = device.model,
    )
}

pub fn vendorsetup_sh(ctx: &TreeContext<'_>) -> String {
    format!(
        "{header}
add_lunch_combo twrp_{codename}-user
add_lunch_combo twrp_{codename}-userdebug
add_lunch_combo twrp_{codename}-eng
",
        header = COPYRIGHT_HEADER,
        codename = ctx.device.codename,
    )
}

pub fn commit_message(ctx: &TreeContext<'_>) -> String {
    let device = ctx.device;
    format!(
        "{codename}: Initial TWRP device tree

Brand: {brand}
Manufacturer: {manufacturer}
Model: {model}
Architecture: {arch}

Generated with {name} {version}
",
        codename = device.codename,
        brand = device.brand_or_manufacturer(),
        manufacturer = device.manufacturer,
        model = device.model,
        arch = device.architecture,
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
    )
}
