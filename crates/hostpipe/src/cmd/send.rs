use std::time::Duration;

use hostpipe_host::{CloseReason, HostEvent, HostEvents, HostHandle, NativeMessageHost};
use hostpipe_launcher::ManifestLauncher;
use tracing::{debug, info};

use crate::cmd::{launcher_config, parse_duration, runtime, SendArgs};
use crate::exit::{
    close_error, host_error, CliError, CliResult, INTERNAL, INTERRUPTED, SUCCESS, TIMEOUT, USAGE,
};
use crate::output::{print_message, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    validate_payloads(&args.json)?;
    let launcher = ManifestLauncher::new(launcher_config(&args.manifest_dirs));

    runtime()?.block_on(session(args, launcher, timeout, format))
}

async fn session(
    args: SendArgs,
    launcher: ManifestLauncher,
    timeout: Duration,
    format: OutputFormat,
) -> CliResult<i32> {
    let (handle, events) = NativeMessageHost::new(&args.origin, &args.host_name, launcher).spawn();
    for payload in &args.json {
        handle
            .send(payload)
            .map_err(|err| host_error("send failed", err))?;
    }
    debug!(queued = args.json.len(), host = %args.host_name, "messages queued");

    exchange(&handle, events, &args, timeout, format).await
}

/// Payloads are checked here so a typo never reaches the host.
fn validate_payloads(payloads: &[String]) -> CliResult<()> {
    for (index, json) in payloads.iter().enumerate() {
        serde_json::from_str::<serde_json::Value>(json).map_err(|err| {
            CliError::new(USAGE, format!("--json #{} is not valid JSON: {err}", index + 1))
        })?;
    }
    Ok(())
}

async fn exchange(
    handle: &HostHandle,
    mut events: HostEvents,
    args: &SendArgs,
    timeout: Duration,
    format: OutputFormat,
) -> CliResult<i32> {
    let wanted = usize::try_from(args.wait).unwrap_or(usize::MAX);
    let mut received = 0usize;

    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(HostEvent::Message(payload)) => {
                    if received < wanted {
                        print_message(&payload, received, &args.host_name, format);
                    }
                    received += 1;
                    if received == wanted {
                        handle.close();
                    }
                }
                Some(HostEvent::Closed(reason)) => return finish(reason, received, wanted),
                None => {
                    return Err(CliError::new(
                        INTERNAL,
                        "host task ended without reporting a close",
                    ))
                }
            },
            _ = &mut deadline => {
                handle.close();
                return Err(CliError::new(
                    TIMEOUT,
                    format!(
                        "timed out after {timeout:?} with {received} of {wanted} replies"
                    ),
                ));
            }
            _ = &mut interrupted => {
                handle.close();
                info!("interrupted");
                return Err(CliError::new(INTERRUPTED, "interrupted"));
            }
        }
    }
}

/// A host that exits right after answering is fine; one that closes early is not.
fn finish(reason: CloseReason, received: usize, wanted: usize) -> CliResult<i32> {
    if received >= wanted {
        debug!(%reason, received, "channel closed after all replies");
        return Ok(SUCCESS);
    }
    Err(close_error(reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::{NOT_FOUND, TRANSPORT_ERROR};

    #[test]
    fn invalid_json_is_a_usage_error() {
        let payloads = vec![r#"{"ok":true}"#.to_string(), "{oops".to_string()];
        let err = validate_payloads(&payloads).unwrap_err();
        assert_eq!(err.code, USAGE);
        assert!(err.message.contains("#2"), "{}", err.message);
    }

    #[test]
    fn close_after_all_replies_succeeds() {
        assert_eq!(finish(CloseReason::HostExited, 2, 2).unwrap(), SUCCESS);
        assert_eq!(finish(CloseReason::ClosedByClient, 1, 1).unwrap(), SUCCESS);
    }

    #[test]
    fn early_close_reports_the_reason() {
        let err = finish(CloseReason::HostExited, 0, 1).unwrap_err();
        assert_eq!(err.code, TRANSPORT_ERROR);
        assert_eq!(err.message, "Native host has exited.");

        assert_eq!(finish(CloseReason::NotFound, 0, 1).unwrap_err().code, NOT_FOUND);
    }
}
