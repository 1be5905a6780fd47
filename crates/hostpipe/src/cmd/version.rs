use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    println!("hostpipe {}", env!("CARGO_PKG_VERSION"));
    if !args.extended {
        return Ok(SUCCESS);
    }

    println!(
        "target: {}",
        option_env!("HOSTPIPE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("os: {}", std::env::consts::OS);
    println!("arch: {}", std::env::consts::ARCH);
    println!("max_message_size: {}", hostpipe_frame::MAX_MESSAGE_SIZE);
    println!("manifest_dirs_env: {}", hostpipe_launcher::MANIFEST_DIRS_ENV);
    println!("features: async={}, cli=true", cfg!(feature = "async"));

    Ok(SUCCESS)
}
