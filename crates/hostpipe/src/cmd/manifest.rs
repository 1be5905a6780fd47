use hostpipe_launcher::ManifestLauncher;

use crate::cmd::{launcher_config, runtime, ManifestArgs};
use crate::exit::{launch_error, CliResult, SUCCESS};
use crate::output::{print_manifest, OutputFormat};

pub fn run(args: ManifestArgs, format: OutputFormat) -> CliResult<i32> {
    let launcher = ManifestLauncher::new(launcher_config(&args.manifest_dirs));

    let resolved = runtime()?.block_on(async {
        match &args.origin {
            Some(origin) => launcher.resolve(origin, &args.host_name).await,
            None => launcher.load(&args.host_name).await,
        }
    });
    let resolved = resolved.map_err(|err| launch_error("manifest lookup failed", err))?;

    print_manifest(&resolved, args.origin.as_deref(), format);
    Ok(SUCCESS)
}
