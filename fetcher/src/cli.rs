//! CLI argument definitions for bootpull.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::config::{FetchConfig, TransferBackend};
use crate::provider::ProviderKind;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Download, verify, and unpack vendor firmware to obtain a device boot image.
#[derive(Parser, Debug, Default)]
#[command(name = "bootpull")]
#[command(version, about)]
#[command(long_about = concat!(
    "Download, verify, and unpack vendor firmware to obtain a device boot image.\n\n",
    "bootpull finds the newest firmware build for your device from the selected ",
    "ROM provider, checks it against the published SHA-256 checksum, and extracts ",
    "boot.img into the current directory, ready for patching and flashing.\n\n",
    "Downloads are cached in ./dl and reused while they still match the published ",
    "checksum. Firmware that ships a payload.bin is unpacked with a payload dumper ",
    "container, so Docker must be available for those devices.",
))]
#[command(after_help = concat!(
    "ENVIRONMENT:\n",
    "  DL_URL    Override the LineageOS for microG download host\n\n",
    "EXAMPLES:\n",
    "  Answer the device and ROM questions interactively:\n",
    "    $ bootpull\n\n",
    "  Fetch the newest LineageOS for microG build for a Pixel 4a:\n",
    "    $ bootpull --device sunfish --provider lineage-microg\n\n",
    "  Replace an existing boot.img without asking:\n",
    "    $ bootpull -d oriole -p 1 --yes\n\n",
    "  List the supported ROM providers:\n",
    "    $ bootpull providers",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Fetch arguments (used when no subcommand is given).
    #[command(flatten)]
    pub fetch: FetchArgs,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fetch a boot image (default when no subcommand given).
    Fetch(FetchArgs),

    /// List the supported ROM providers.
    Providers,
}

/// Arguments for the fetch command.
#[derive(Parser, Debug, Clone, Default)]
pub struct FetchArgs {
    /// Device code name, case sensitive [default: ask].
    #[arg(short, long, value_name = "CODE")]
    pub device: Option<String>,

    /// ROM provider, by menu number or name [default: ask].
    #[arg(short, long, value_name = "N|NAME")]
    pub provider: Option<ProviderKind>,

    /// Download cache directory [default: dl].
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<Utf8PathBuf>,

    /// Scratch directory for unpacking [default: wd].
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<Utf8PathBuf>,

    /// Where to write the boot image [default: boot.img].
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<Utf8PathBuf>,

    /// How to download firmware archives [default: http].
    #[arg(long, value_enum, value_name = "BACKEND")]
    pub transfer: Option<TransferBackend>,

    /// Container image used to unpack payload.bin [default: vm03/payload_dumper].
    #[arg(long, value_name = "IMAGE")]
    pub dumper_image: Option<String>,

    /// Overwrite an existing boot image without asking.
    #[arg(short, long)]
    pub yes: bool,

    /// Suppress progress output (errors still shown).
    #[arg(short, long)]
    pub quiet: bool,
}

impl FetchArgs {
    /// Overlay the command-line values onto `base`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bootpull::cli::FetchArgs;
    /// use bootpull::config::FetchConfig;
    ///
    /// let args = FetchArgs {
    ///     quiet: true,
    ///     ..FetchArgs::default()
    /// };
    /// let config = args.apply(FetchConfig::default());
    /// assert!(config.quiet);
    /// assert_eq!(config.cache_dir, "dl");
    /// ```
    #[must_use]
    pub fn apply(&self, base: FetchConfig) -> FetchConfig {
        FetchConfig {
            cache_dir: self.cache_dir.clone().unwrap_or(base.cache_dir),
            work_dir: self.work_dir.clone().unwrap_or(base.work_dir),
            output_path: self.output.clone().unwrap_or(base.output_path),
            dumper_image: self.dumper_image.clone().unwrap_or(base.dumper_image),
            transfer: self.transfer.unwrap_or(base.transfer),
            quiet: self.quiet || base.quiet,
            ..base
        }
    }
}

impl Cli {
    /// Returns the effective fetch arguments.
    ///
    /// If a `Fetch` subcommand was provided, returns those arguments.
    /// Otherwise returns the flattened arguments.
    #[must_use]
    pub fn fetch_args(&self) -> &FetchArgs {
        match &self.command {
            Some(Command::Fetch(args)) => args,
            Some(Command::Providers) | None => &self.fetch,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
