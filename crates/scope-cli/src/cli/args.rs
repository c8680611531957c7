use super::*;

#[derive(Parser, Debug)]
#[command(
    name = "git-scope",
    author,
    version,
    about = "Dashboard for the git repositories under your project directories",
    subcommand_precedence_over_arg = true
)]
pub(super) struct Cli {
    #[arg(long, global = true, value_name = "PATH", help = "Config file to use")]
    pub(super) config: Option<PathBuf>,
    #[arg(long, global = true, help = "Ignore the cached scan and rescan now")]
    pub(super) refresh: bool,
    #[command(subcommand)]
    pub(super) command: Option<Commands>,
    #[arg(value_name = "DIR", help = "Directories to scan instead of the configured roots")]
    pub(super) dirs: Vec<String>,
}

#[derive(clap::Subcommand, Debug)]
pub(super) enum Commands {
    #[command(about = "Launch the dashboard (default)")]
    Tui(DirsArgs),
    #[command(about = "Scan once and print the repositories as JSON")]
    Scan(DirsArgs),
}

#[derive(Parser, Debug)]
pub(super) struct DirsArgs {
    #[arg(value_name = "DIR")]
    pub(super) dirs: Vec<String>,
}

impl Cli {
    /// Directories given either bare or after a subcommand.
    pub(super) fn dirs(&self) -> &[String] {
        match &self.command {
            Some(Commands::Tui(args)) | Some(Commands::Scan(args)) => &args.dirs,
            None => &self.dirs,
        }
    }
}
