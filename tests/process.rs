//! Exit status of the whole process, driven through `launch`.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use tokio::net::TcpStream;

use twinport::config::Mode;
use twinport::lifecycle::{launch, EXIT_FAILURE, EXIT_SUCCESS};

mod common;

use common::{FailAt, FakeHandlers, FakeInitializer, PanickingHandlers};

const LAUNCH_TIMEOUT: Duration = Duration::from_secs(15);

fn never() -> std::future::Pending<()> {
    std::future::pending()
}

#[tokio::test]
async fn missing_config_exits_with_failure() {
    let init = FakeInitializer::healthy();

    let status = launch(
        Path::new("/nonexistent/twinport/configs.toml"),
        Mode::Development,
        init.clone(),
        FakeHandlers,
        never(),
    )
    .await;

    assert_eq!(status, EXIT_FAILURE);
    assert_eq!(init.calls(), 0);
}

#[tokio::test]
async fn malformed_config_exits_with_failure() {
    let init = FakeInitializer::healthy();
    let path = common::write_config("[DB.dev\nURL =");

    let status = launch(&path, Mode::Development, init.clone(), FakeHandlers, never()).await;

    assert_eq!(status, EXIT_FAILURE);
    assert_eq!(init.calls(), 0);
}

#[tokio::test]
async fn resource_failure_exits_with_failure() {
    let config = common::test_config();
    let rest_addr = SocketAddr::from(([127, 0, 0, 1], config.server.rest_port));
    let path = common::write_app_config(&config);
    let init = FakeInitializer::failing_at(FailAt::Mail);

    let status = tokio::time::timeout(
        LAUNCH_TIMEOUT,
        launch(&path, Mode::Development, init.clone(), FakeHandlers, never()),
    )
    .await
    .unwrap();

    assert_eq!(status, EXIT_FAILURE);
    assert_eq!(init.calls(), 3);
    assert!(TcpStream::connect(rest_addr).await.is_err());
}

#[tokio::test]
async fn termination_request_exits_with_success() {
    let config = common::test_config();
    let rest_addr = SocketAddr::from(([127, 0, 0, 1], config.server.rest_port));
    let path = common::write_app_config(&config);

    // Resolves once the gateway has answered one request.
    let stop = async move {
        let url = format!("http://{rest_addr}/v1/users/1");
        loop {
            if let Ok(response) = reqwest::get(&url).await {
                assert!(response.status().is_success());
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    };

    let status = tokio::time::timeout(
        LAUNCH_TIMEOUT,
        launch(&path, Mode::Development, FakeInitializer::healthy(), FakeHandlers, stop),
    )
    .await
    .expect("process stops after the termination request");

    assert_eq!(status, EXIT_SUCCESS);
    assert!(TcpStream::connect(rest_addr).await.is_err());
}

#[tokio::test]
async fn fault_outside_request_handling_exits_with_failure() {
    let config = common::test_config();
    let path = common::write_app_config(&config);

    let status = tokio::time::timeout(
        LAUNCH_TIMEOUT,
        launch(
            &path,
            Mode::Development,
            FakeInitializer::healthy(),
            PanickingHandlers,
            never(),
        ),
    )
    .await
    .unwrap();

    assert_eq!(status, EXIT_FAILURE);
}
