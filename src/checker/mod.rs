// src/checker/mod.rs
// =============================================================================
// This module contains all link checking logic.
//
// Submodules:
// - html: Extracts links from HTML pages
// - http: Probes links with real HTTP requests
// - validate: The Link Validator (skip, probe, retry, classify)
// - retry: Backoff policy for transient failures
// - skip: Skip patterns (URLs never requested)
// =============================================================================

mod html;
mod http;
mod retry;
mod skip;
mod validate;

pub use html::{extract_html_links, is_in_domain};
pub use http::{build_client, HttpProbe};
pub use retry::RetryPolicy;
pub use skip::SkipPatterns;
pub use validate::{validate_links, LinkProbe};
