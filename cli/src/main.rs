//! Sanitize an SVG/SVGZ file from the command line.
//!
//! Usage: `svgward-cli [--config <file>] <input> [output]`. Without `output`
//! the sanitized bytes go to stdout. The config path can also come from
//! `SVGWARD_CONFIG`, logging is controlled by `RUST_LOG`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use svgward_upload::{dimensions, SvgConfig, UpResult};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(version, about = "Sanitize an SVG or SVGZ file", long_about = None)]
struct Args {
	/// File to sanitize
	#[arg(value_hint = clap::ValueHint::FilePath)]
	input: PathBuf,

	/// Where to write the result, stdout when omitted
	#[arg(value_hint = clap::ValueHint::FilePath)]
	output: Option<PathBuf>,

	/// JSON config with `allowList` and `upload` sections
	#[arg(short, long, env = "SVGWARD_CONFIG", value_hint = clap::ValueHint::FilePath)]
	config: Option<PathBuf>,
}

async fn run(config: &SvgConfig, input: &Path, output: Option<&Path>) -> UpResult<()> {
	let sanitizer = config.sanitizer()?;
	let bytes = tokio::fs::read(input).await?;
	let sanitized = sanitizer.sanitize(&bytes)?;
	let dim = dimensions::dimensions_or_default(&sanitized, &config.upload);
	info!(
		"{}: {} -> {} bytes, {}x{}",
		input.display(),
		bytes.len(),
		sanitized.len(),
		dim.width,
		dim.height
	);

	match output {
		Some(path) => tokio::fs::write(path, &sanitized).await?,
		None => {
			let mut stdout = std::io::stdout().lock();
			stdout.write_all(&sanitized)?;
			stdout.flush()?;
		}
	}
	Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_target(false)
		.with_writer(std::io::stderr)
		.init();

	let args = match Args::try_parse() {
		Ok(args) => args,
		Err(err) => {
			// --help and --version land here too
			let _ = err.print();
			return if err.use_stderr() { ExitCode::from(2) } else { ExitCode::SUCCESS };
		}
	};

	let config = match &args.config {
		Some(path) => match SvgConfig::load(path).await {
			Ok(config) => config,
			Err(err) => {
				error!("{}: {}", path.display(), err);
				return ExitCode::from(2);
			}
		},
		None => SvgConfig::default(),
	};

	match run(&config, &args.input, args.output.as_deref()).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			error!("{}: {}", args.input.display(), err);
			ExitCode::from(1)
		}
	}
}


// vim: ts=4
