use super::*;

pub(super) fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_buffer = logging::LogBuffer::new(200);
    init_tracing(&cli.command, &log_buffer);
    info!(command = command_label(&cli.command), "Running command");

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let mut config = AppConfig::load_or_detect(&config_path)
        .with_context(|| format!("load config {}", config_path.display()))?;
    config.override_roots(cli.dirs());
    let cache_path = default_cache_path()?;

    match cli.command {
        Some(Commands::Scan(_)) => handle_scan(&config, cache_path, cli.refresh),
        Some(Commands::Tui(_)) | None => tui::run_tui(tui::TuiOptions {
            config,
            cache_path,
            force_refresh: cli.refresh,
            log_buffer,
        }),
    }
}

/// The dashboard owns the terminal, so its logs go to the in-app panel only.
/// `scan` writes JSON to stdout and logs to stderr.
fn init_tracing(command: &Option<Commands>, log_buffer: &logging::LogBuffer) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match command {
        Some(Commands::Scan(_)) => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        _ => registry
            .with(logging::LogLayer::new(log_buffer.clone()))
            .init(),
    }
}

pub(super) fn command_label(command: &Option<Commands>) -> &'static str {
    match command {
        Some(Commands::Scan(_)) => "scan",
        Some(Commands::Tui(_)) | None => "tui",
    }
}
