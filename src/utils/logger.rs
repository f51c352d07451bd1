use colored::Colorize;
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the logging system
pub fn init_logger(verbose: bool) {
    // RUST_LOG wins; otherwise warn, or debug when --verbose is set
    let default_level = if verbose { "pantrypal=debug,info" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr) // Keep stdout clean for command output
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .try_init();
}

/// Transient success notification
pub fn notify_success(message: impl std::fmt::Display) {
    eprintln!("{} {}", "✓".green().bold(), message);
}

/// Transient error notification, the CLI's equivalent of an error toast
pub fn notify_error(message: impl std::fmt::Display) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Informational notice that is not part of command output
pub fn notify_info(message: impl std::fmt::Display) {
    eprintln!("{} {}", "•".cyan(), message);
}
