use std::{path::Path, time::Duration};

use anyhow::{Result, anyhow};
use movieshub_server::config::{Parser, ServerConfig};
use rand::Rng as _;
use reqwest::Url;
use tempfile::TempDir;
use tokio::{sync::oneshot, task::JoinHandle};
use tracing::info;

pub mod rest;

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(3030..4030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) => retries -= 1,
            Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

pub struct ConfigGuard {
    #[allow(dead_code)]
    data_dir: TempDir,
}

pub fn test_config(test_name: &str, base_dir: &Path) -> Result<(ServerConfig, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix_in(format!("{}_", test_name), base_dir)?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let port = random_port()?.to_string();
    let args = &[
        "movieshub-e2e-tests",
        "--data-dir",
        &data_dir,
        "--port",
        &port,
        "--default-page-size",
        "10",
    ];
    let config = ServerConfig::try_parse_from(args)?;
    Ok((
        config,
        ConfigGuard {
            data_dir: tmp_data_dir,
        },
    ))
}

pub async fn prepare_env(test_name: &str) -> Result<(ServerConfig, ConfigGuard)> {
    let base_dir = std::env::temp_dir();
    test_config(test_name, &base_dir)
}

pub fn base_url(args: &ServerConfig) -> Result<Url> {
    Ok(format!("http://127.0.0.1:{}/", args.port).parse()?)
}

/// Running server, stopped when dropped or by [`TestServer::stop`].
pub struct TestServer {
    pub base_url: Url,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<movieshub_server::Result<()>>>,
}

impl TestServer {
    pub async fn stop(mut self) -> Result<()> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.await??;
        }
        Ok(())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

pub async fn spawn_server(args: ServerConfig) -> Result<TestServer> {
    let base_url = base_url(&args)?;
    let state = movieshub_server::build_state(&args).await?;
    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(movieshub_server::run::run_graceful_with_state(
        args,
        state,
        async move {
            let _ = rx.await;
        },
    ));

    let client = reqwest::Client::new();
    let health_url = base_url.join("health")?;
    let mut retries = 50;
    loop {
        match client.get(health_url.clone()).send().await {
            Ok(response) if response.status().is_success() => break,
            _ if retries > 0 => {
                retries -= 1;
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            _ => return Err(anyhow!("Server did not start at {base_url}")),
        }
    }
    info!("Test server running at {base_url}");

    Ok(TestServer {
        base_url,
        shutdown: Some(tx),
        handle: Some(handle),
    })
}
