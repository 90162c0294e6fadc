use clap::Parser;
use eggcarton::cli::{Cli, Commands};
use eggcarton::errors::CartonError;

fn main() {
    let cli = Cli::parse();

    eggcarton::logging::init(&cli.log_level);

    let result = match cli.command {
        Commands::Init => eggcarton::cli::commands::init::execute(&cli),
        Commands::Add {
            ref secret_id,
            ref value,
        } => eggcarton::cli::commands::add::execute(&cli, secret_id, value.as_deref()),
        Commands::Get {
            ref secret_id,
            ref owner,
        } => eggcarton::cli::commands::get::execute(&cli, secret_id, owner.as_deref()),
        Commands::List { ref owner } => {
            eggcarton::cli::commands::list::execute(&cli, owner.as_deref())
        }
        Commands::Break {
            ref secret_id,
            ref owner,
            force,
        } => eggcarton::cli::commands::delete::execute(&cli, secret_id, owner.as_deref(), force),
        Commands::Run { ref command } => eggcarton::cli::commands::run::execute(&cli, command),
        Commands::Inspect {
            ref secret_id,
            ref owner,
        } => eggcarton::cli::commands::inspect::execute(&cli, secret_id, owner.as_deref()),
    };

    match result {
        Ok(()) => {}
        // `egg run` exits with whatever code the child exited with.
        Err(CartonError::ChildProcessFailed(code)) => std::process::exit(code),
        Err(e) => {
            eggcarton::cli::output::error(&e.to_string());
            std::process::exit(1);
        }
    }
}
