//! Proxy environment projection

use authop_common::ProxyStatus;
use k8s_openapi::api::core::v1::EnvVar;

/// Env var carrying the no-proxy list
pub const NO_PROXY_ENV: &str = "NO_PROXY";
/// Env var carrying the HTTP proxy URL
pub const HTTP_PROXY_ENV: &str = "HTTP_PROXY";
/// Env var carrying the HTTPS proxy URL
pub const HTTPS_PROXY_ENV: &str = "HTTPS_PROXY";

/// Env vars for every proxy setting that is present and non-empty.
///
/// Order is fixed: `NO_PROXY`, `HTTP_PROXY`, `HTTPS_PROXY`.
pub fn proxy_env_vars(proxy: &ProxyStatus) -> Vec<EnvVar> {
    [
        (NO_PROXY_ENV, &proxy.no_proxy),
        (HTTP_PROXY_ENV, &proxy.http_proxy),
        (HTTPS_PROXY_ENV, &proxy.https_proxy),
    ]
    .into_iter()
    .filter_map(|(name, value)| match value.as_deref() {
        Some(v) if !v.is_empty() => Some(EnvVar {
            name: name.to_string(),
            value: Some(v.to_string()),
            ..Default::default()
        }),
        _ => None,
    })
    .collect()
}
