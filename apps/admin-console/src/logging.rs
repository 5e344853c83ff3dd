use tracing_subscriber::{EnvFilter, fmt};

/// Filter directive for a `-v` count: warn by default, then info, debug and trace.
fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// `RUST_LOG` applies only when no `-v` flag was given. Output goes to stderr
/// so stdout stays clean for tables and `--json`.
fn filter(verbose: u8) -> EnvFilter {
    if verbose == 0
        && let Ok(filter) = EnvFilter::try_from_default_env()
    {
        return filter;
    }
    EnvFilter::new(level_for(verbose))
}

pub fn init(verbose: u8, json: bool) {
    let builder = fmt()
        .with_env_filter(filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        tracing::warn!(error = %e, "tracing init failed");
    }
}
