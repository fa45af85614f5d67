//! Logging setup.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global `tracing` subscriber.
///
/// `default_level` applies to every Lobbyforge crate when `RUST_LOG` is
/// unset; `RUST_LOG` replaces it entirely. Calling this twice is harmless:
/// the second call leaves the first subscriber in place.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(default_level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

fn default_directives(level: &str) -> String {
    [
        "lobbyforge",
        "lobbyforge_transport",
        "lobbyforge_protocol",
        "lobbyforge_room",
        "lobbyforge_store",
    ]
    .iter()
    .map(|target| format!("{target}={level}"))
    .collect::<Vec<_>>()
    .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_cover_every_crate() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("lobbyforge=debug,"));
        assert!(directives.contains("lobbyforge_room=debug"));
        assert_eq!(directives.split(',').count(), 5);
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init("info");
        init("debug");
    }
}
