use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;
use std::process::Stdio;

fn worker_command(bin: &Path, data_dir: &Path, env: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(bin);
    cmd.arg("--env")
        .arg(env)
        .arg("--data-dir")
        .arg(data_dir)
        .env_remove("TEST_ENV")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

#[tokio::test]
async fn concurrent_worker_processes_never_share_a_fixture() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let bin = assert_cmd::cargo::cargo_bin("testpool");

    let mut children = Vec::new();
    for worker in 0..8 {
        let child = worker_command(&bin, dir.path(), "qa")
            .arg("acquire")
            .arg("--type")
            .arg("users")
            .arg("--holder")
            .arg(format!("worker-{worker}"))
            .spawn()?;
        children.push(child);
    }

    let mut ids = HashSet::new();
    let mut exhausted = 0;
    for child in children {
        let output = child.wait_with_output().await?;
        if output.status.success() {
            let record: serde_json::Value = serde_json::from_slice(&output.stdout)?;
            let id = record["id"].as_str().expect("record id").to_string();
            assert!(ids.insert(id), "two workers received the same fixture");
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            assert!(
                stderr.contains("no available users"),
                "unexpected failure: {stderr}"
            );
            exhausted += 1;
        }
    }

    // qa seeds five users: five winners, three exhausted losers.
    assert_eq!(ids.len(), 5);
    assert_eq!(exhausted, 3);

    let status = worker_command(&bin, dir.path(), "qa")
        .arg("status")
        .arg("--json")
        .output()
        .await?;
    assert!(status.status.success());
    let status: serde_json::Value = serde_json::from_slice(&status.stdout)?;
    assert_eq!(status["users"]["available"], 0);
    assert_eq!(status["users"]["in_use"], 5);
    Ok(())
}

#[tokio::test]
async fn a_fixture_acquired_in_one_process_can_be_released_in_another() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let bin = assert_cmd::cargo::cargo_bin("testpool");

    let acquire = worker_command(&bin, dir.path(), "prod")
        .arg("acquire")
        .arg("--type")
        .arg("products")
        .arg("--holder")
        .arg("worker-a")
        .output()
        .await?;
    assert!(acquire.status.success());
    let record: serde_json::Value = serde_json::from_slice(&acquire.stdout)?;
    let id = record["id"].as_str().expect("record id");

    let release = worker_command(&bin, dir.path(), "prod")
        .arg("release")
        .arg("--type")
        .arg("products")
        .arg("--id")
        .arg(id)
        .output()
        .await?;
    assert!(release.status.success());

    let reacquire = worker_command(&bin, dir.path(), "prod")
        .arg("acquire")
        .arg("--type")
        .arg("products")
        .arg("--holder")
        .arg("worker-b")
        .output()
        .await?;
    assert!(reacquire.status.success());
    let record: serde_json::Value = serde_json::from_slice(&reacquire.stdout)?;
    assert_eq!(record["id"].as_str(), Some(id));
    assert_eq!(record["holder"], "worker-b");
    Ok(())
}
