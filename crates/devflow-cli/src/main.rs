mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    chat::ChatSubcommand, code::CodeSubcommand, config::ConfigSubcommand,
    project::ProjectSubcommand, task::TaskSubcommand, Context,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "devflow",
    about = "AI-assisted project command center: plan tasks, generate code, preview and export",
    version,
    propagate_version = true
)]
struct Cli {
    /// Data root (default: auto-detect from .devflow/)
    #[arg(long, global = true, env = "DEVFLOW_ROOT")]
    root: Option<PathBuf>,

    /// User whose projects the command works on
    #[arg(long, global = true, env = "DEVFLOW_USER", default_value = "local")]
    user: String,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .devflow/ with a default config and an empty store
    Init,

    /// Start the HTTP service
    Serve {
        /// Port to listen on (default: from config; 0 = OS-assigned)
        #[arg(long)]
        port: Option<u16>,

        /// Open the browser once listening
        #[arg(long)]
        open: bool,
    },

    /// Inspect and validate configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Manage projects
    Project {
        #[command(subcommand)]
        subcommand: ProjectSubcommand,
    },

    /// Manage the task board
    Task {
        #[command(subcommand)]
        subcommand: TaskSubcommand,
    },

    /// Inspect and edit generated code
    Code {
        #[command(subcommand)]
        subcommand: CodeSubcommand,
    },

    /// Run a code tool: review, tests, docs, complexity, commit, run-review
    Tool {
        /// Tool name
        name: String,

        /// Read input from this file (default: stdin)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Language for run-review
        #[arg(long)]
        language: Option<String>,
    },

    /// Project chat and the memory agent
    Chat {
        #[command(subcommand)]
        subcommand: ChatSubcommand,
    },

    /// Replace the project's code with a generated starter file set
    Scaffold {
        #[arg(long)]
        project: Option<String>,

        /// Override the project description as the scaffold input
        #[arg(long)]
        description: Option<String>,
    },

    /// Print a Mermaid architecture diagram of the project
    Architecture {
        #[arg(long)]
        project: Option<String>,
    },

    /// Run a multi-agent simulation toward a goal
    Simulate {
        #[arg(required = true)]
        goal: Vec<String>,

        #[arg(long)]
        project: Option<String>,

        /// Apply the simulated file set to the project
        #[arg(long)]
        approve: bool,
    },

    /// Build the static preview and print the rewritten entry document
    Preview {
        #[arg(long)]
        project: Option<String>,

        /// Write the entry document here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Package the generated code as a zip archive
    Export {
        #[arg(long)]
        project: Option<String>,

        /// Archive path (default: derived from the project name)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = Context {
        root: root::resolve_root(cli.root.as_deref()),
        user: cli.user,
        json: cli.json,
    };

    let result = match cli.command {
        Commands::Init => cmd::init::run(&ctx),
        Commands::Serve { port, open } => cmd::serve::run(&ctx, port, open),
        Commands::Config { subcommand } => cmd::config::run(&ctx, subcommand),
        Commands::Project { subcommand } => cmd::project::run(&ctx, subcommand),
        Commands::Task { subcommand } => cmd::task::run(&ctx, subcommand),
        Commands::Code { subcommand } => cmd::code::run(&ctx, subcommand),
        Commands::Tool {
            name,
            file,
            language,
        } => cmd::tool::run(&ctx, &name, file.as_deref(), language.as_deref()),
        Commands::Chat { subcommand } => cmd::chat::run(&ctx, subcommand),
        Commands::Scaffold {
            project,
            description,
        } => cmd::generate::scaffold(&ctx, project.as_deref(), description.as_deref()),
        Commands::Architecture { project } => cmd::generate::architecture(&ctx, project.as_deref()),
        Commands::Simulate {
            goal,
            project,
            approve,
        } => cmd::generate::simulate(&ctx, project.as_deref(), &goal.join(" "), approve),
        Commands::Preview { project, out } => {
            cmd::preview::run(&ctx, project.as_deref(), out.as_deref())
        }
        Commands::Export { project, out } => {
            cmd::export::run(&ctx, project.as_deref(), out.as_deref())
        }
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
