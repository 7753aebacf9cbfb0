//! Request pipeline: URL building, rate limiting, retry and classification.

mod client;
pub mod rate_limit;
pub mod retry;
pub mod url;

pub use client::{BodyExtractor, Client, Request, USER_AGENT_VALUE};
pub use rate_limit::{Admission, RateLimiter, SlidingWindow};
pub use retry::{Backoff, Classified, RETRIABLE_STATUSES, RequestAttempt, classify};
pub use url::{AuthedUrl, build_auth_url, urlencode_params};
