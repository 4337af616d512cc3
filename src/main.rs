use clap::Parser;
use gatepass::cli::{Cli, Commands};
use miette::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head` or `grep -q` panics on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    init_tracing(global.verbose);

    match cli.command {
        Commands::Product(cmd) => gatepass::cli::commands::product::run(cmd, &global),
        Commands::GatePass(cmd) => gatepass::cli::commands::gatepass::run(cmd, &global),
        Commands::Config(cmd) => gatepass::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => gatepass::cli::commands::completions::run(args),
    }
}

/// Logs go to stderr so stdout stays clean for piping.
/// RUST_LOG wins over --verbose when set.
fn init_tracing(verbose: bool) {
    let default = if verbose { "gatepass=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
