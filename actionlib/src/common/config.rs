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

use std::path::Path;
use std::time::Duration;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Configuration for action clients and servers.
///
/// Loaded from TOML in XDG-compliant directories. Every section and field is optional in
/// the file; anything left out keeps its default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionlibConfig {
    /// Timer and wait configuration
    pub timeouts: TimeoutConfig,
    /// Capacity configuration
    pub limits: LimitsConfig,
    /// Default values configuration
    pub defaults: DefaultsConfig,
    /// Tracing and logging configuration
    pub tracing: TracingConfig,
    /// Path configuration
    pub paths: PathsConfig,
    /// Behavioral switches
    pub behavior: BehaviorConfig,
}

/// Timer and wait configuration values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Delay before the server's first status tick, in milliseconds
    pub status_tick_delay_ms: u64,
    /// Period between status ticks, in milliseconds
    pub status_tick_period_ms: u64,
    /// Bounded wait when releasing a publisher or subscriber, in milliseconds
    pub topic_shutdown_grace_ms: u64,
    /// Poll interval of `wait_for_action_server_to_start`, in milliseconds
    pub server_wait_poll_ms: u64,
}

/// Capacity configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Mailbox size of each in-process subscription
    pub subscription_queue_capacity: usize,
}

/// Default values configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Node name used as the goal id prefix when none is given
    pub node_name: String,
}

/// Tracing and logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
    /// Also write logs to a daily rolling file under `paths.log_directory`
    pub log_to_file: bool,
}

/// Path configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory for log files
    pub log_directory: String,
}

/// Behavioral switches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Return an error instead of logging when a server goal receives an invalid event
    pub strict_server_transitions: bool,
    /// Drop terminal goals from the registry after each status tick
    pub prune_terminal_goals: bool,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            status_tick_delay_ms: 200,
            status_tick_period_ms: 200,
            topic_shutdown_grace_ms: 5_000,
            server_wait_poll_ms: 10,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            subscription_queue_capacity: 255,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            node_name: "actionlib_node".to_string(),
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_directory: "~/.local/share/actionlib/logs".to_string(),
        }
    }
}

impl ActionlibConfig {
    /// Delay before the first status tick.
    pub const fn status_tick_delay(&self) -> Duration {
        Duration::from_millis(self.timeouts.status_tick_delay_ms)
    }

    /// Period of the status heartbeat. Never zero.
    pub fn status_tick_period(&self) -> Duration {
        Duration::from_millis(self.timeouts.status_tick_period_ms.max(1))
    }

    /// Grace period for releasing topic registrations.
    pub const fn topic_shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.timeouts.topic_shutdown_grace_ms)
    }

    /// Poll interval while waiting for a server. Never zero.
    pub fn server_wait_poll(&self) -> Duration {
        Duration::from_millis(self.timeouts.server_wait_poll_ms.max(1))
    }

    /// Mailbox capacity of a subscription. Never zero.
    pub fn subscription_queue_capacity(&self) -> usize {
        self.limits.subscription_queue_capacity.max(1)
    }

    /// Load configuration from XDG-compliant locations.
    ///
    /// Looks for `actionlib/config.toml` under `$XDG_CONFIG_HOME` and then the XDG
    /// config search path. If no file is found the defaults are returned. A file that
    /// cannot be read or parsed is logged and the defaults are used instead.
    pub fn load() -> Self {
        let xdg_dirs = match xdg::BaseDirectories::with_prefix("actionlib") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        match xdg_dirs.find_config_file("config.toml") {
            Some(path) => Self::load_from_path(&path),
            None => {
                info!("No configuration file found, using defaults");
                Self::default()
            }
        }
    }

    /// Load configuration from an explicit file, falling back to defaults on failure.
    pub fn load_from_path(path: &Path) -> Self {
        info!("Loading configuration from: {}", path.display());
        match std::fs::read_to_string(path) {
            Ok(config_str) => match toml::from_str::<Self>(&config_str) {
                Ok(config) => {
                    info!("Successfully loaded configuration");
                    config
                }
                Err(e) => {
                    error!("Failed to parse configuration file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                error!("Failed to read configuration file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

lazy_static! {
    /// Global configuration loaded from XDG-compliant locations on first use
    pub static ref CONFIG: ActionlibConfig = ActionlibConfig::load();
}
