use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use studygo_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "studygo", version, about = "StudyGo study-time tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Focus timer
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Subject catalog
    Subject {
        #[command(subcommand)]
        action: commands::subject::SubjectAction,
    },
    /// Topics under a subject
    Topic {
        #[command(subcommand)]
        action: commands::topic::TopicAction,
    },
    /// Logged sessions
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Activity statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// User settings (weekly goal, theme)
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print a shell completion script
    Completions { shell: Shell },
}

/// `STUDYGO_LOG` wins over `log.filter`; logs go to stderr so stdout stays JSON.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_env("STUDYGO_LOG")
        .or_else(|_| EnvFilter::try_new(&config.log.filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    init_tracing(&config);

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action, &config).await,
        Commands::Subject { action } => commands::subject::run(action, &config),
        Commands::Topic { action } => commands::topic::run(action, &config),
        Commands::Session { action } => commands::session::run(action, &config),
        Commands::Stats { action } => commands::stats::run(action, &config),
        Commands::Settings { action } => commands::settings::run(action, &config),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "studygo", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
