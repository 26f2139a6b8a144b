//! Logging setup utilities for the Kokuban whiteboard backend.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// This function sets up logging for the library crates and the binary.
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "kokuban-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use kokuban_shared::logger::setup_logger;
///
/// setup_logger("kokuban-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into());

    // A second initialization (e.g. from tests) is not an error worth dying for.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Build the default filter directive used when `RUST_LOG` is not set.
fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    format!(
        "kokuban_shared={level},kokuban_server={level},{bin}={level},tower_http={level}",
        level = default_log_level,
        bin = binary_name.replace('-', "_"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_replaces_dashes_in_binary_name() {
        // テスト項目: バイナリ名のダッシュはアンダースコアに置き換えられる
        // given (前提条件):
        let binary_name = "kokuban-seed";

        // when (操作):
        let filter = default_filter(binary_name, "info");

        // then (期待する結果):
        assert!(filter.contains("kokuban_seed=info"));
        assert!(!filter.contains("kokuban-seed"));
    }

    #[test]
    fn test_default_filter_covers_crates_and_binary() {
        // テスト項目: デフォルトのフィルタにライブラリとバイナリの両方が含まれる
        // given (前提条件):
        let binary_name = "kokuban-server";

        // when (操作):
        let filter = default_filter(binary_name, "debug");

        // then (期待する結果):
        assert!(filter.contains("kokuban_server=debug"));
        assert!(filter.contains("kokuban_shared=debug"));
        assert!(filter.contains("tower_http=debug"));
    }
}
