use std::sync::Arc;

use crate::transport::Transport;

/// Supported transport kinds that can be selected via DSN or config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Http,
    Noop,
}

/// High-level transport configuration built from a DSN.
///
/// It only stores the target kind and the raw DSN string; kind-specific
/// parsing happens when the transport is constructed.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Selected transport implementation.
    pub kind: BackendKind,
    /// Raw DSN that was used to construct this config.
    pub dsn: String,
}

impl BackendConfig {
    pub fn new(kind: BackendKind, dsn: impl Into<String>) -> Self {
        BackendConfig { kind, dsn: dsn.into() }
    }
}

/// Parse a DSN string and infer the transport kind from its scheme.
///
/// Examples:
/// - "https://0a1b2c@collector.example.com/payments-api"
/// - "http://127.0.0.1:9880/checkout"
/// - "noop://"
///
/// For HTTP(S) DSNs the userinfo part is the API key and the first path
/// segment is the application name; both are optional.
pub fn parse_dsn(dsn: &str) -> Result<BackendConfig, DsnError> {
    let lower = dsn.to_ascii_lowercase();

    if lower.starts_with("https://") || lower.starts_with("http://") {
        Ok(BackendConfig::new(BackendKind::Http, dsn))
    } else if lower.starts_with("noop://") {
        Ok(BackendConfig::new(BackendKind::Noop, dsn))
    } else {
        Err(DsnError::UnknownScheme)
    }
}

/// Error type returned when parsing a DSN.
#[derive(thiserror::Error, Debug)]
pub enum DsnError {
    #[error("unknown or unsupported DSN scheme")]
    UnknownScheme,
}

/// Error type returned when building a transport from configuration.
#[derive(thiserror::Error, Debug)]
pub enum BackendBuildError {
    #[error("http feature is not enabled")]
    HttpFeatureDisabled,
}

/// Create a concrete [`Transport`] implementation from a [`BackendConfig`].
///
/// This is the main entry point for applications that want to select the
/// delivery transport using a single DSN string instead of constructing it
/// manually.
pub fn make_transport_from_config(
    cfg: &BackendConfig,
) -> Result<Arc<dyn Transport>, BackendBuildError> {
    match cfg.kind {
        BackendKind::Http => {
            #[cfg(feature = "http")]
            {
                use crate::http::{HttpConfig, HttpTransport};

                let (scheme, rest) = match cfg.dsn.split_once("://") {
                    Some(parts) => parts,
                    None => ("https", cfg.dsn.as_str()),
                };

                // "key@host/app" -> api key, host, application name.
                let (api_key, rest) = match rest.split_once('@') {
                    Some((key, rest)) if !key.is_empty() => (Some(key.to_string()), rest),
                    _ => (None, rest),
                };
                let (host, path) = match rest.split_once('/') {
                    Some((host, path)) => (host, path),
                    None => (rest, ""),
                };
                let app_name = path
                    .split('/')
                    .next()
                    .filter(|segment| !segment.is_empty())
                    .map(|segment| segment.to_string());

                let config = HttpConfig {
                    url: format!("{}://{}", scheme, host),
                    api_key,
                    app_name,
                };

                let transport = HttpTransport::new(config);
                Ok(Arc::new(transport) as Arc<dyn Transport>)
            }

            #[cfg(not(feature = "http"))]
            {
                let _ = cfg; // silence unused warning when feature is disabled
                Err(BackendBuildError::HttpFeatureDisabled)
            }
        }
        BackendKind::Noop => {
            use crate::noop::NoopTransport;
            Ok(Arc::new(NoopTransport) as Arc<dyn Transport>)
        }
    }
}
