use std::num::NonZeroUsize;

/// Endpoint hammered by the default load generator.
pub const DEFAULT_TARGET_URL: &str = "http://127.0.0.1:8080/request";

/// Number of iterations in the default run.
// NOTE: The target rate-limits; raise with care or pair with a TPS limit.
pub const DEFAULT_REPETITIONS: usize = 500;

/// Upper bound on in-flight iterations for parallel runs.
pub const DEFAULT_CONCURRENCY: NonZeroUsize = unsafe { NonZeroUsize::new_unchecked(64) };

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

pub const DEFAULT_FORM_BODY: &str = "salt=benchmark";

/// Maximum number of error messages kept on a report.
pub const MAX_REPORTED_ERRORS: usize = 10;
