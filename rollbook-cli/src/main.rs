//! rollbook CLI - student records in PostgreSQL
//!
//! Entry point for the `rollbook` command-line tool:
//! - Table setup and demo data (`init`, `seed`)
//! - Student operations (`list`, `add`, `update-email`, `remove`)
//! - Raw parameterized statements (`query`)
//! - The fixed walkthrough of every operation (`demo`)

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

mod commands;
mod config;
mod output;
mod tracing_setup;

use config::ConnectionArgs;
use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "rollbook",
    author,
    version,
    about = "Student record store backed by PostgreSQL",
    long_about = "Create the students table and add, list, update and delete student \
                  records over a single PostgreSQL connection."
)]
struct Cli {
    /// Enable debug logging (SQL statements included)
    #[arg(long, global = true)]
    debug: bool,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the students table if it does not exist
    Init,
    /// Insert the three demo students
    Seed,
    /// List all students
    List(commands::students::ListArgs),
    /// Add a student
    Add(commands::students::AddArgs),
    /// Change a student's email
    UpdateEmail(commands::students::UpdateEmailArgs),
    /// Delete a student
    Remove(commands::students::RemoveArgs),
    /// Run a SQL statement with positional parameters
    Query(commands::query::QueryArgs),
    /// Run the full walkthrough: create, seed, add, update, delete
    Demo,
    /// Show config file path or effective settings
    Config(config::ConfigArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_files = config::load_dotenv();
    let cli = Cli::parse();
    tracing_setup::init(&TracingConfig { debug: cli.debug })?;

    for path in &env_files {
        info!("Loaded environment from {}", path.display());
    }

    match cli.command {
        Commands::Init => commands::run_init(cli.connection.resolve()?).await?,
        Commands::Seed => commands::run_seed(cli.connection.resolve()?).await?,
        Commands::List(args) => commands::run_list(cli.connection.resolve()?, args).await?,
        Commands::Add(args) => commands::run_add(cli.connection.resolve()?, args).await?,
        Commands::UpdateEmail(args) => {
            commands::run_update_email(cli.connection.resolve()?, args).await?
        }
        Commands::Remove(args) => commands::run_remove(cli.connection.resolve()?, args).await?,
        Commands::Query(args) => commands::run_query(cli.connection.resolve()?, args).await?,
        Commands::Demo => commands::run_demo(cli.connection.resolve()?).await?,
        Commands::Config(args) => config::run_config(args, &cli.connection)?,
        Commands::Completions(args) => run_completions(args)?,
    }
    Ok(())
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}
