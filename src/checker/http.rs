// src/checker/http.rs
// =============================================================================
// This module checks if URLs are alive by making HTTP requests.
//
// Key functionality:
// - Makes HTTP HEAD requests (lightweight, no body download)
// - Falls back to GET when the server does not allow HEAD
// - Sorts request failures into transient (retry) and permanent ones
// - Builds the shared reqwest client (timeouts, redirects, headers)
// =============================================================================

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, PRAGMA};
use reqwest::{Client, StatusCode};
use std::time::Duration;

use super::validate::LinkProbe;
use crate::config::{MAX_REDIRECTS, USER_AGENT};
use crate::error::ProbeError;

// Identifies the workflow run in target servers' logs when we run in CI
#[derive(Debug, Clone, Default)]
struct WorkflowIdentity {
    run_id: Option<String>,
    workflow: Option<String>,
    repository: Option<String>,
}

impl WorkflowIdentity {
    fn from_env() -> Self {
        Self {
            run_id: std::env::var("GITHUB_RUN_ID").ok(),
            workflow: std::env::var("GITHUB_WORKFLOW").ok(),
            repository: std::env::var("GITHUB_REPOSITORY").ok(),
        }
    }

    fn user_agent(&self) -> String {
        match (&self.run_id, &self.workflow, &self.repository) {
            (None, None, None) => USER_AGENT.to_string(),
            (run, workflow, repo) => format!(
                "{} (Run:{}; Workflow:{}; Repo:{})",
                USER_AGENT,
                run.as_deref().unwrap_or("unknown"),
                workflow.as_deref().unwrap_or("unknown"),
                repo.as_deref().unwrap_or("unknown"),
            ),
        }
    }
}

// Browser-like headers; some servers answer bare clients with 403
fn default_headers(identity: &WorkflowIdentity) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

    let extra = [
        ("x-github-action-run", &identity.run_id),
        ("x-workflow-source", &identity.workflow),
        ("x-github-repository", &identity.repository),
    ];
    for (name, value) in extra {
        let Some(value) = value else { continue };
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(HeaderName::from_static(name), value);
        }
    }

    headers
}

/// The client shared by page fetches and link probes.
///
/// Connection pooling lives inside `Client`, so clone it rather than
/// building another.
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let identity = WorkflowIdentity::from_env();

    Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .user_agent(identity.user_agent())
        .default_headers(default_headers(&identity))
        .build()
}

/// Probes links over real HTTP.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LinkProbe for HttpProbe {
    // HEAD first; the final status after redirects is what counts
    async fn probe(&self, url: &str) -> Result<u16, ProbeError> {
        let response = self.client.head(url).send().await.map_err(categorize_error)?;
        let status = response.status();

        if needs_get_fallback(status) {
            debug!("HEAD {} answered {}, retrying with GET", url, status.as_u16());
            let response = self.client.get(url).send().await.map_err(categorize_error)?;
            return Ok(response.status().as_u16());
        }

        Ok(status.as_u16())
    }
}

fn needs_get_fallback(status: StatusCode) -> bool {
    matches!(status, StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED)
}

// Categorizes reqwest failures
//
// Transient: the network might behave next time (timeouts, refused
// connections, DNS hiccups). Permanent: the request itself is wrong.
fn categorize_error(error: reqwest::Error) -> ProbeError {
    let error_string = error.to_string();
    let lowered = error_string.to_lowercase();

    if error.is_timeout() {
        ProbeError::Transient("Request timed out".to_string())
    } else if error.is_redirect() {
        ProbeError::Permanent("Too many redirects".to_string())
    } else if error.is_builder() {
        ProbeError::Permanent(format!("Invalid request: {}", error_string))
    } else if error.is_connect() {
        if lowered.contains("dns") || lowered.contains("resolve") {
            ProbeError::Transient("Could not resolve hostname".to_string())
        } else {
            ProbeError::Transient("Connection failed".to_string())
        }
    } else if lowered.contains("certificate") || lowered.contains("ssl") || lowered.contains("tls") {
        ProbeError::Permanent("SSL certificate error".to_string())
    } else if error.is_request() {
        ProbeError::Transient(error_string)
    } else {
        ProbeError::Permanent(error_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_fallback_only_for_unsupported_head() {
        assert!(needs_get_fallback(StatusCode::METHOD_NOT_ALLOWED));
        assert!(needs_get_fallback(StatusCode::NOT_IMPLEMENTED));
        assert!(!needs_get_fallback(StatusCode::NOT_FOUND));
        assert!(!needs_get_fallback(StatusCode::OK));
    }

    #[test]
    fn test_user_agent_without_workflow() {
        let identity = WorkflowIdentity::default();
        assert_eq!(identity.user_agent(), USER_AGENT);
    }

    #[test]
    fn test_user_agent_with_workflow() {
        let identity = WorkflowIdentity {
            run_id: Some("42".into()),
            workflow: Some("links".into()),
            repository: None,
        };
        assert_eq!(
            identity.user_agent(),
            format!("{} (Run:42; Workflow:links; Repo:unknown)", USER_AGENT)
        );
        let headers = default_headers(&identity);
        assert_eq!(headers.get("x-github-action-run").unwrap(), "42");
        assert!(headers.get("x-github-repository").is_none());
    }

    #[tokio::test]
    async fn test_invalid_url_is_permanent() {
        let probe = HttpProbe::new(build_client(Duration::from_secs(1)).unwrap());
        let outcome = probe.probe("not a url").await;
        assert!(matches!(outcome, Err(ProbeError::Permanent(_))));
    }
}
