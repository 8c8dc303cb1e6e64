use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::prelude::*;

// Use the library module
use recovery_dtgen::dtgen;

#[derive(Parser)]
#[command(name = "recovery-dtgen")]
#[command(about = "Generate a TWRP device tree from a recovery or boot image")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Unpack an image and generate a device tree from it
    Generate {
        /// Recovery image (or boot image on A/B devices)
        #[arg(required_unless_present = "huawei_kernel")]
        image: Option<PathBuf>,
        /// Huawei recovery_kernel image (requires --huawei-ramdisk and --huawei-vendor)
        #[arg(
            long,
            conflicts_with = "image",
            requires_all = ["huawei_ramdisk", "huawei_vendor"]
        )]
        huawei_kernel: Option<PathBuf>,
        /// Huawei recovery_ramdisk image
        #[arg(long, requires = "huawei_kernel")]
        huawei_ramdisk: Option<PathBuf>,
        /// Huawei recovery_vendor image
        #[arg(long, requires = "huawei_kernel")]
        huawei_vendor: Option<PathBuf>,
        /// Output directory; the tree lands in <output>/<manufacturer>/<codename>
        #[arg(short = 'o', long, default_value = "output")]
        output: PathBuf,
        /// Local Android Image Kitchen checkout (cloned when unset)
        #[arg(long, env = "DTGEN_AIK_PATH")]
        aik_path: Option<PathBuf>,
        /// Git URL AIK is cloned from
        #[arg(long, default_value = dtgen::DEFAULT_AIK_URL)]
        aik_url: String,
        /// Image extraction timeout in seconds (default: 600)
        #[arg(long, default_value = "600")]
        unpack_timeout: u64,
        /// Don't create a git repository in the generated tree
        #[arg(long)]
        no_git: bool,
        /// Keep the extraction directory for inspection
        #[arg(long)]
        keep_workdir: bool,
        /// Leave partitions of unknown kind out of the generated fstab
        #[arg(long)]
        drop_unknown_partitions: bool,
        /// Enable debug output
        #[arg(long)]
        debug: bool,
    },
    /// Print device info and the converted fstab of an unpacked ramdisk
    Info {
        /// Ramdisk directory produced by unpackimg.sh
        ramdisk: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
        /// Leave partitions of unknown kind out of the converted fstab
        #[arg(long)]
        drop_unknown_partitions: bool,
        /// Enable debug output
        #[arg(long)]
        debug: bool,
    },
}

fn init_logging(debug: bool) {
    let filter = if debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn partition_policy(drop_unknown: bool) -> dtgen::UnknownPartitionPolicy {
    if drop_unknown {
        dtgen::UnknownPartitionPolicy::Drop
    } else {
        dtgen::UnknownPartitionPolicy::PassThrough
    }
}

fn print_info(info: &dtgen::RamdiskInfo, json: bool) -> dtgen::Result<()> {
    let fstab = info.fstab.render()?;

    if json {
        let value = serde_json::json!({
            "build_prop": info.build_prop,
            "device": info.device,
            "fstab_source": info.fstab.path(),
            "fstab": fstab,
            "init_rcs": info.init_rcs,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let device = &info.device;
    println!("Device info:");
    println!("  Build prop: {}", info.build_prop.display());
    println!("  Codename: {}", device.codename);
    println!("  Manufacturer: {}", device.manufacturer);
    println!("  Brand: {}", device.brand_or_manufacturer());
    println!("  Model: {}", device.model);
    println!("  Architecture: {}", device.architecture);
    println!("  A/B device: {}", device.is_ab_device);
    println!("  Platform: {}", device.platform);
    if let Some(ref pixel_format) = device.pixel_format {
        println!("  Pixel format: {}", pixel_format);
    }
    println!();
    println!("fstab (from {}):", info.fstab.path().display());
    print!("{}", fstab);
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            image,
            huawei_kernel,
            huawei_ramdisk,
            huawei_vendor,
            output,
            aik_path,
            aik_url,
            unpack_timeout,
            no_git,
            keep_workdir,
            drop_unknown_partitions,
            debug,
        } => {
            init_logging(debug);

            let images = match (image, huawei_kernel, huawei_ramdisk, huawei_vendor) {
                (Some(image), None, None, None) => dtgen::ImageSource::Single(image),
                (None, Some(kernel), Some(ramdisk), Some(vendor)) => dtgen::ImageSource::Huawei {
                    kernel,
                    ramdisk,
                    vendor,
                },
                _ => {
                    eprintln!("Error: pass either an image or all three --huawei-* images");
                    std::process::exit(1);
                }
            };

            println!("Generate command:");
            for path in images.paths() {
                println!("  Image: {}", path.display());
            }
            println!("  Output: {}", output.display());
            match aik_path {
                Some(ref path) => println!("  AIK: {}", path.display()),
                None => println!("  AIK: {}", aik_url),
            }
            println!("  Git: {}", !no_git);
            println!("  Debug: {}", debug);
            println!();

            let mut options = dtgen::GenerateOptions::new(images, output);
            options.unpack = dtgen::UnpackOptions {
                aik_path,
                aik_url,
                keep_workdir,
                timeout_secs: unpack_timeout,
            };
            options.git.enabled = !no_git;
            options.partition_policy = partition_policy(drop_unknown_partitions);

            match dtgen::generate_device_tree(&options).await {
                Ok(tree) => {
                    println!("Device tree generated in {}", tree.path.display());
                    println!("Result: GENERATION_COMPLETED");
                    std::process::exit(0);
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    println!("Result: GENERATION_FAILED");
                    std::process::exit(1);
                }
            }
        }
        Commands::Info {
            ramdisk,
            json,
            drop_unknown_partitions,
            debug,
        } => {
            init_logging(debug);

            let result = dtgen::inspect_ramdisk(
                &ramdisk,
                &dtgen::SearchLocations::default(),
                partition_policy(drop_unknown_partitions),
            )
            .and_then(|info| print_info(&info, json));

            if let Err(e) = result {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
