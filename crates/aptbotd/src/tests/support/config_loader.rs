//! Configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};

use aptbot_config::Config;

use crate::bootstrap::ConfigLoader;

/// Loader pointing the daemon at a local chat service and channel root.
#[derive(Debug, Clone)]
pub struct TestConfigLoader {
    config: Config,
}

impl TestConfigLoader {
    pub fn new(server: String, channels_dir: Utf8PathBuf, control_port: u16) -> Self {
        Self {
            config: Config {
                nick: Some("aptbot".to_owned()),
                pass: Some("oauth:secret".to_owned()),
                server: Some(server),
                control_port: Some(control_port),
                channels_dir: Some(channels_dir),
                reconnect_attempts: Some(1),
                reconnect_base_delay_ms: Some(1),
                handler_workers: Some(2),
                control_poll_ms: Some(5),
                exit_grace_ms: Some(0),
                ..Config::default()
            },
        }
    }

    /// Same configuration with a longer reconnect budget.
    pub fn with_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.config.reconnect_attempts = Some(attempts);
        self
    }

    /// Same configuration with the account credentials removed.
    pub fn without_credentials(mut self) -> Self {
        self.config.nick = None;
        self.config.pass = None;
        self
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Loader that intentionally fails by passing invalid CLI arguments.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("aptbotd"),
            OsString::from("--control-port"),
            OsString::from("not-a-port"),
        ];
        Config::load_from_iter(args)
    }
}
