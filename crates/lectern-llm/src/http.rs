//! Shared HTTP client construction for consistent timeout and TLS configuration.

use std::time::Duration;

/// Create the HTTP client used by every remote provider.
///
/// Config: 30s connect timeout, 60s request timeout, rustls TLS,
/// `lectern/{version}` user-agent, redirect limit 10.
#[must_use]
pub fn default_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(60))
        .user_agent(concat!("lectern/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .expect("default HTTP client construction must not fail")
}

/// Strip trailing slashes so endpoint paths can be appended with `format!`.
pub(crate) fn trim_base_url(mut base_url: String) -> String {
    while base_url.ends_with('/') {
        base_url.pop();
    }
    base_url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_base_url_removes_all_trailing_slashes() {
        assert_eq!(
            trim_base_url("https://api.openai.com/v1//".into()),
            "https://api.openai.com/v1"
        );
        assert_eq!(trim_base_url("http://x".into()), "http://x");
    }
}
