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

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

use crate::common::ActionlibConfig;

/// Installs a global `tracing` subscriber for applications built on actionlib.
///
/// The filter comes from `RUST_LOG` when set, otherwise from `tracing.level`. With
/// `tracing.log_to_file` enabled, output goes to a daily rolling file under
/// `paths.log_directory` and the returned guard must be held for as long as logs should
/// be flushed. Does nothing if a global subscriber is already installed.
pub fn init_tracing(config: &ActionlibConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.tracing.level.as_str()));

    if config.tracing.log_to_file {
        let directory = expand_home(&config.paths.log_directory);
        if std::fs::create_dir_all(&directory).is_ok() {
            let appender = RollingFileAppender::new(Rotation::DAILY, directory, "actionlib.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            return tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .compact()
                .try_init()
                .ok()
                .map(|()| guard);
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .try_init();
    None
}

/// Expands a leading `~` using `$HOME`.
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_paths_are_untouched() {
        assert_eq!(expand_home("/var/log/actionlib"), PathBuf::from("/var/log/actionlib"));
    }

    #[test]
    fn tilde_expands_against_home() {
        if let Some(home) = std::env::var_os("HOME") {
            assert_eq!(expand_home("~/logs"), PathBuf::from(home).join("logs"));
        }
    }
}
