use std::io::{Read, Write};

use hostpipe_frame::{FrameConfig, FrameReader, FrameWriter};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::cmd::EchoArgs;
use crate::exit::{frame_error, CliResult, SUCCESS};

pub fn run(args: EchoArgs) -> CliResult<i32> {
    let stdin = std::io::stdin().lock();
    let stdout = std::io::stdout().lock();
    let echoed = echo_frames(stdin, stdout, &args)?;
    info!(echoed, "echo host exiting");
    Ok(SUCCESS)
}

/// Echo frames from `input` to `output` until EOF (or `--count` is reached).
fn echo_frames<R: Read, W: Write>(input: R, output: W, args: &EchoArgs) -> CliResult<u64> {
    let config = FrameConfig::default();
    let mut reader = FrameReader::with_config(input, config.clone());
    let mut writer = FrameWriter::with_config(output, config);
    info!(origin = args.origin.as_deref().unwrap_or("-"), "echo host started");

    let mut echoed = 0u64;
    while args.count.is_none_or(|count| echoed < count) {
        let Some(message) = reader
            .read_message()
            .map_err(|err| frame_error("read failed", err))?
        else {
            break;
        };
        debug!(size = message.len(), "echoing message");

        let wrapped;
        let reply: &[u8] = if args.wrap {
            wrapped = wrap(&message, args.origin.as_deref());
            &wrapped
        } else {
            &message
        };
        writer
            .write_message(reply)
            .map_err(|err| frame_error("write failed", err))?;
        echoed += 1;
    }
    Ok(echoed)
}

fn wrap(message: &[u8], origin: Option<&str>) -> Vec<u8> {
    let echo = serde_json::from_slice::<Value>(message)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(message).into_owned()));
    json!({ "echo": echo, "origin": origin }).to_string().into_bytes()
}
