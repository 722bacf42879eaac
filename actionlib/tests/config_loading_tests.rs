/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! Loading `ActionlibConfig` from TOML files.

use std::fs;
use std::path::Path;

use actionlib::prelude::*;
use actionlib_test::prelude::*;
use tempfile::TempDir;

use crate::setup::*;

mod setup;

fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
    let config_dir = dir.join("actionlib");
    fs::create_dir_all(&config_dir).unwrap();
    let path = config_dir.join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

/// Test that a full configuration file overrides every default
#[actionlib_test]
async fn test_custom_configuration_override() -> anyhow::Result<()> {
    initialize_tracing();
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(
        temp_dir.path(),
        r#"
        [timeouts]
        status_tick_delay_ms = 50
        status_tick_period_ms = 100
        topic_shutdown_grace_ms = 1000
        server_wait_poll_ms = 20

        [limits]
        subscription_queue_capacity = 64

        [defaults]
        node_name = "arm_controller"

        [tracing]
        level = "debug"
        log_to_file = true

        [paths]
        log_directory = "/var/log/actionlib"

        [behavior]
        strict_server_transitions = true
        prune_terminal_goals = true
    "#,
    );

    let config = ActionlibConfig::load_from_path(&path);
    assert_eq!(config.status_tick_delay().as_millis(), 50);
    assert_eq!(config.status_tick_period().as_millis(), 100);
    assert_eq!(config.topic_shutdown_grace().as_millis(), 1000);
    assert_eq!(config.server_wait_poll().as_millis(), 20);
    assert_eq!(config.subscription_queue_capacity(), 64);
    assert_eq!(config.defaults.node_name, "arm_controller");
    assert_eq!(config.tracing.level, "debug");
    assert!(config.tracing.log_to_file);
    assert_eq!(config.paths.log_directory, "/var/log/actionlib");
    assert!(config.behavior.strict_server_transitions);
    assert!(config.behavior.prune_terminal_goals);

    temp_dir.close().unwrap();
    Ok(())
}

/// Test that sections left out of the file keep their defaults
#[actionlib_test]
async fn test_partial_configuration() -> anyhow::Result<()> {
    initialize_tracing();
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(
        temp_dir.path(),
        r"
        [timeouts]
        status_tick_period_ms = 500
    ",
    );

    let config = ActionlibConfig::load_from_path(&path);
    let defaults = ActionlibConfig::default();
    assert_eq!(config.timeouts.status_tick_period_ms, 500);
    assert_eq!(config.timeouts.status_tick_delay_ms, defaults.timeouts.status_tick_delay_ms);
    assert_eq!(config.limits, defaults.limits);
    assert_eq!(config.defaults, defaults.defaults);
    assert_eq!(config.behavior, defaults.behavior);

    temp_dir.close().unwrap();
    Ok(())
}

/// Test error handling for malformed configuration files
#[actionlib_test]
async fn test_malformed_config_handling() -> anyhow::Result<()> {
    initialize_tracing();
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(
        temp_dir.path(),
        r#"
        [timeouts]
        status_tick_period_ms = "not_a_number"
    "#,
    );

    assert_eq!(ActionlibConfig::load_from_path(&path), ActionlibConfig::default());
    assert_eq!(
        ActionlibConfig::load_from_path(&temp_dir.path().join("missing.toml")),
        ActionlibConfig::default()
    );

    temp_dir.close().unwrap();
    Ok(())
}

/// Test XDG directory resolution works correctly
#[actionlib_test]
async fn test_xdg_directory_resolution() -> anyhow::Result<()> {
    initialize_tracing();
    let temp_dir = TempDir::new().unwrap();
    write_config(
        temp_dir.path(),
        r#"
        [defaults]
        node_name = "from_xdg"
    "#,
    );

    // The only test in this binary that touches the environment
    std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    let config = ActionlibConfig::load();
    assert_eq!(config.defaults.node_name, "from_xdg");

    temp_dir.close().unwrap();
    Ok(())
}

/// Test that a loaded configuration drives a client and server
#[actionlib_test]
async fn test_loaded_configuration_runs_an_action() -> anyhow::Result<()> {
    initialize_tracing();
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(
        temp_dir.path(),
        r#"
        [timeouts]
        status_tick_delay_ms = 5
        status_tick_period_ms = 5
        topic_shutdown_grace_ms = 200

        [defaults]
        node_name = "configured"
    "#,
    );
    let config = ActionlibConfig::load_from_path(&path);

    let harness = Harness::start_with("configured_action", config).await?;
    harness.server.add_listener(RecordingServerListener::accepting());
    let future = harness
        .client
        .send_goal(FibonacciGoal { order: 1 }, None)
        .await?;
    let goal_id = future.goal_id().id.clone();
    assert!(goal_id.starts_with("configured-"), "{goal_id}");
    assert!(harness.server_reaches(&goal_id, GoalStatus::Active).await);

    harness.shutdown().await?;
    temp_dir.close().unwrap();
    Ok(())
}
