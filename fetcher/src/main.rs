//! bootpull CLI entrypoint.
//!
//! This binary asks for the device and ROM provider when they are not given
//! as flags, then downloads, verifies, and unpacks the newest firmware build
//! until `boot.img` sits at the output path.

use bootpull::cli::{Cli, Command, FetchArgs};
use bootpull::config::FetchConfig;
use bootpull::device::DeviceId;
use bootpull::error::Result;
use bootpull::output::write_stderr_line;
use bootpull::pipeline;
use bootpull::prompt::{AssumeYes, Confirm, TerminalPrompt};
use bootpull::provider::ProviderKind;
use clap::Parser;
use env_logger::Env;
use std::io::{BufRead, Write};

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    let prompt = TerminalPrompt::stdio();
    let run_result = run(&cli, &prompt, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run<R: BufRead, W: Write>(
    cli: &Cli,
    prompt: &TerminalPrompt<R, W>,
    stderr: &mut dyn Write,
) -> Result<()> {
    if matches!(cli.command, Some(Command::Providers)) {
        list_providers(stderr);
        return Ok(());
    }

    let args = cli.fetch_args();
    let config = args.apply(FetchConfig::from_env());
    let device = resolve_device(args, prompt)?;
    let kind = resolve_provider(args, prompt)?;
    let provider = kind.build(&config);

    let confirm: &dyn Confirm = if args.yes { &AssumeYes } else { prompt };
    pipeline::run(&config, &device, provider.as_ref(), confirm, stderr)?;
    Ok(())
}

/// Prints the provider menu with the names accepted by `--provider`.
fn list_providers(stderr: &mut dyn Write) {
    for (index, kind) in ProviderKind::ALL.iter().enumerate() {
        write_stderr_line(
            stderr,
            format_args!("{}. {} ({})", index + 1, kind.label(), kind.slug()),
        );
    }
}

/// Takes the device from `--device`, asking for it otherwise.
fn resolve_device<R: BufRead, W: Write>(
    args: &FetchArgs,
    prompt: &TerminalPrompt<R, W>,
) -> Result<DeviceId> {
    match args.device.as_deref() {
        Some(code) => DeviceId::parse(code),
        None => prompt.ask_device(),
    }
}

/// Takes the provider from `--provider`, showing the menu otherwise.
fn resolve_provider<R: BufRead, W: Write>(
    args: &FetchArgs,
    prompt: &TerminalPrompt<R, W>,
) -> Result<ProviderKind> {
    match args.provider {
        Some(kind) => {
            log::debug!("provider {kind} chosen on the command line");
            Ok(kind)
        }
        None => prompt.choose_provider(),
    }
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format_args!("error: {err}"));
            1
        }
    }
}
