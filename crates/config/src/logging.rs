//! Tracing subscriber setup shared by every binary that embeds hospinav.

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `debug` when `verbose`, else `info`.
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing(verbose: bool) -> bool {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_harmless() {
        init_tracing(false);
        assert!(!init_tracing(true));
    }
}
