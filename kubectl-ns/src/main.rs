use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use nskube::{ConfigLoader, ConfigSource, InvocationRequest, NamespaceController};

const EXAMPLES: &str = "EXAMPLES:
    # view the current namespace alongside all available namespaces
    kubectl ns

    # switch namespace to foo
    kubectl ns foo";

/// Display/Switch current namespace
#[derive(Parser, Debug)]
#[clap(name = "kubectl-ns", version, after_help = EXAMPLES)]
struct Cli {
    /// Path to the kubeconfig file to use
    #[clap(long, value_name = "PATH")]
    kubeconfig: Option<PathBuf>,

    /// Log what is happening to stderr
    #[clap(short, long)]
    verbose: bool,

    /// Namespace to switch to
    #[clap(value_name = "NAMESPACE")]
    args: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let request = InvocationRequest::validate(cli.args)?;
    let source = ConfigSource::resolve(cli.kubeconfig)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Starting runtime")?;
    let loaded = runtime.block_on(ConfigLoader::new(source).load())?;

    let mut controller = NamespaceController::new(loaded);
    let stdout = io::stdout();
    controller.run(&request, &mut stdout.lock(), console::colors_enabled())?;

    Ok(())
}
