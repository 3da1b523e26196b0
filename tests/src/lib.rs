//! Shared helpers for the integration tests.
use mock_service::{MockConfig, MockHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use volley::LoadGenerator;

/// Install a test subscriber and panic hook once per test binary.
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        let _ = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("volley=debug,mock_service=debug")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Start a stub service on a free local port.
pub async fn mock(config: MockConfig) -> anyhow::Result<MockHandle> {
    let addr: SocketAddr = "127.0.0.1:0".parse()?;
    mock_service::spawn(addr, config).await
}

/// A load generator aimed at `handle`.
pub fn generator_for(handle: &MockHandle) -> anyhow::Result<LoadGenerator> {
    Ok(LoadGenerator::new(&handle.url())?)
}

/// A URL on which nothing is listening.
pub async fn unreachable_url() -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{addr}/request"))
}
