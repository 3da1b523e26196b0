//! Load generator for the captcha `/request` endpoint.
use crate::error::{IterationError, SuiteError};
use crate::suite::{Benchmark, Report};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
use std::sync::Arc;
use tracing::{debug, trace};
use volley_core::{SuiteConfig, DEFAULT_FORM_BODY, FORM_CONTENT_TYPE};

const BENCHMARK_NAME: &str = "request";

/// The request sent on every iteration. Built once and shared read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: String,
}

impl Default for RequestDescriptor {
    fn default() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));

        Self {
            method: Method::POST,
            headers,
            body: DEFAULT_FORM_BODY.to_string(),
        }
    }
}

/// Repeatedly POSTs a [`RequestDescriptor`] to a fixed URL and checks for success.
#[derive(Debug, Clone)]
pub struct LoadGenerator {
    client: Client,
    url: Url,
    descriptor: Arc<RequestDescriptor>,
}

impl LoadGenerator {
    pub fn new(url: &str) -> Result<Self, SuiteError> {
        Ok(Self::with_client(Client::new(), Url::parse(url)?))
    }

    pub fn with_client(client: Client, url: Url) -> Self {
        Self {
            client,
            url,
            descriptor: Arc::new(RequestDescriptor::default()),
        }
    }

    pub fn with_descriptor(mut self, descriptor: RequestDescriptor) -> Self {
        self.descriptor = Arc::new(descriptor);
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    /// Send one request and require a 2xx response, draining its body.
    ///
    /// Transport failures are returned as [`IterationError::Http`]; any other status yields
    /// [`IterationError::Assertion`]. No retries are attempted.
    pub async fn run_iteration(&self) -> Result<(), IterationError> {
        let response = self
            .client
            .request(self.descriptor.method.clone(), self.url.clone())
            .headers(self.descriptor.headers.clone())
            .body(self.descriptor.body.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "Unexpected response status");
            return Err(IterationError::Assertion { status });
        }

        let body = response.bytes().await?;
        trace!(%status, len = body.len(), "Response drained");
        Ok(())
    }

    /// Run `repetitions` iterations, overlapping them when `parallel` is set.
    pub async fn run(&self, repetitions: usize, parallel: bool) -> Report {
        self.run_with(SuiteConfig::new().parallel(parallel), repetitions)
            .await
    }

    pub async fn run_with(&self, config: SuiteConfig, repetitions: usize) -> Report {
        self.benchmark(repetitions).run(&config).await
    }

    /// A [`Benchmark`] performing one [`run_iteration`](Self::run_iteration) per repetition.
    pub fn benchmark(&self, repetitions: usize) -> Benchmark {
        let generator = self.clone();
        Benchmark::new(BENCHMARK_NAME, repetitions, move || {
            let generator = generator.clone();
            async move { generator.run_iteration().await }
        })
    }
}
