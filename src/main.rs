use clap::Parser;
use pwvault::cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    pwvault::logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Generate { ref options } => {
            pwvault::cli::commands::generate::execute(&cli, options)
        }
        Commands::Add {
            ref account,
            ref password,
            generate,
            ref options,
            ref note,
        } => pwvault::cli::commands::add::execute(
            &cli,
            account,
            password.as_deref(),
            generate,
            options,
            note,
        ),
        Commands::List {
            ref search,
            show,
        } => pwvault::cli::commands::list::execute(&cli, search.as_deref(), show),
        Commands::Delete { id, force } => pwvault::cli::commands::delete::execute(&cli, id, force),
        Commands::Clear { force } => pwvault::cli::commands::clear::execute(&cli, force),
        Commands::Export { ref file } => pwvault::cli::commands::export::execute(&cli, file),
        Commands::Import { ref file } => pwvault::cli::commands::import_cmd::execute(&cli, file),
        Commands::RotateKey { force } => pwvault::cli::commands::rotate::execute(&cli, force),
        Commands::Completions { ref shell } => pwvault::cli::commands::completions::execute(shell),
    };

    if let Err(e) = result {
        pwvault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
