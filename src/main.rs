use argh::FromArgs;
use tracing_subscriber::EnvFilter;
use workspace_x::{HandledError, RunOptions, Runner};

#[derive(FromArgs)]
/// Execute a bin script from any package in the workspace.
#[argh(
    example = "Run the TypeScript compiler from any package:\n$ {command_name} tsc --noEmit",
    example = "Preview which jest would be executed:\n$ {command_name} --dry-run jest"
)]
struct Cli {
    #[argh(switch, short = 'd')]
    /// show what would be executed without running it.
    dry_run: bool,

    #[argh(positional)]
    /// name of the bin script to execute.
    script_name: String,

    #[argh(positional, greedy)]
    /// arguments passed to the script as-is.
    args: Vec<String>,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli: Cli = argh::from_env();

    let code = match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            match err.downcast_ref::<HandledError>() {
                Some(handled) => eprintln!("Error: {handled}"),
                None => eprintln!("Unexpected error: {err:?}"),
            }
            1
        }
    };
    std::process::exit(code)
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let cwd = std::env::current_dir()?;
    let options = RunOptions {
        dry_run: cli.dry_run,
        ..RunOptions::default()
    };
    Runner::default().run(&cwd, &cli.script_name, &cli.args, &options, &mut std::io::stdout())
}
