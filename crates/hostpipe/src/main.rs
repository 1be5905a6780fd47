mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "hostpipe", version, about = "Native messaging host driver")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_with_repeated_payloads() {
        let cli = Cli::try_parse_from([
            "hostpipe",
            "send",
            "com.example.echo",
            "--origin",
            "app://example/",
            "--json",
            "{\"a\":1}",
            "--json",
            "{\"b\":2}",
            "--manifest-dir",
            "/etc/hostpipe",
            "--wait",
            "2",
        ])
        .expect("send args should parse");

        let Command::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.json.len(), 2);
        assert_eq!(args.wait, 2);
        assert_eq!(args.manifest_dirs.len(), 1);
    }

    #[test]
    fn send_requires_an_origin() {
        let err = Cli::try_parse_from(["hostpipe", "send", "com.example.echo"])
            .expect_err("missing origin should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn rejects_waiting_for_zero_replies() {
        let err = Cli::try_parse_from([
            "hostpipe",
            "send",
            "com.example.echo",
            "--origin",
            "app://example/",
            "--wait",
            "0",
        ])
        .expect_err("zero should be rejected");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn echo_accepts_the_launcher_origin_argument() {
        let cli = Cli::try_parse_from(["hostpipe", "echo", "--wrap", "app://example/"])
            .expect("echo args should parse");
        let Command::Echo(args) = cli.command else {
            panic!("expected echo");
        };
        assert_eq!(args.origin.as_deref(), Some("app://example/"));
        assert!(args.wrap);
    }
}
