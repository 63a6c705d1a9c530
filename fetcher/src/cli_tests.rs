//! Tests for CLI parsing and configuration overlay.

use super::*;
use rstest::rstest;

#[test]
fn cli_parses_defaults() {
    let cli = Cli::parse_from(["bootpull"]);
    assert!(cli.command.is_none());
    assert!(cli.fetch.device.is_none());
    assert!(cli.fetch.provider.is_none());
    assert!(cli.fetch.transfer.is_none());
    assert!(!cli.fetch.yes);
    assert!(!cli.fetch.quiet);
}

#[test]
fn cli_parses_device_and_provider() {
    let cli = Cli::parse_from(["bootpull", "-d", "sunfish", "-p", "lineage-microg"]);
    assert_eq!(cli.fetch.device.as_deref(), Some("sunfish"));
    assert_eq!(cli.fetch.provider, Some(ProviderKind::LineageMicrog));
}

#[rstest]
#[case("1", ProviderKind::CalyxOs)]
#[case("2", ProviderKind::LineageMicrog)]
#[case("calyxos", ProviderKind::CalyxOs)]
fn cli_accepts_menu_numbers_and_names(#[case] value: &str, #[case] expected: ProviderKind) {
    let cli = Cli::parse_from(["bootpull", "--provider", value]);
    assert_eq!(cli.fetch.provider, Some(expected));
}

#[test]
fn cli_rejects_unknown_provider() {
    let result = Cli::try_parse_from(["bootpull", "--provider", "7"]);
    assert!(result.is_err());
}

#[rstest]
#[case("http", TransferBackend::Http)]
#[case("wget", TransferBackend::Wget)]
fn cli_parses_transfer_backend(#[case] value: &str, #[case] expected: TransferBackend) {
    let cli = Cli::parse_from(["bootpull", "--transfer", value]);
    assert_eq!(cli.fetch.transfer, Some(expected));
}

#[test]
fn cli_parses_providers_subcommand() {
    let cli = Cli::parse_from(["bootpull", "providers"]);
    assert!(matches!(cli.command, Some(Command::Providers)));
}

#[test]
fn fetch_subcommand_arguments_take_precedence() {
    let cli = Cli::parse_from(["bootpull", "fetch", "--device", "oriole", "--yes"]);
    let args = cli.fetch_args();
    assert_eq!(args.device.as_deref(), Some("oriole"));
    assert!(args.yes);
}

#[test]
fn apply_overrides_only_given_values() {
    let cli = Cli::parse_from([
        "bootpull",
        "--cache-dir",
        "/var/cache/bootpull",
        "--output",
        "out/boot.img",
        "--dumper-image",
        "example/dumper:2",
        "--transfer",
        "wget",
    ]);
    let base = FetchConfig {
        microg_base_url: "http://mirror.test".to_owned(),
        ..FetchConfig::default()
    };

    let config = cli.fetch_args().apply(base);

    assert_eq!(config.cache_dir, Utf8PathBuf::from("/var/cache/bootpull"));
    assert_eq!(config.work_dir, Utf8PathBuf::from("wd"));
    assert_eq!(config.output_path, Utf8PathBuf::from("out/boot.img"));
    assert_eq!(config.dumper_image, "example/dumper:2");
    assert_eq!(config.transfer, TransferBackend::Wget);
    assert_eq!(config.microg_base_url, "http://mirror.test");
}

#[test]
fn quiet_flag_is_applied() {
    let cli = Cli::parse_from(["bootpull", "-q"]);
    assert!(cli.fetch_args().apply(FetchConfig::default()).quiet);
}
