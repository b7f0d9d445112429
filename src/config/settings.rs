use std::time::Duration;

use config::{
    builder::{ConfigBuilder, DefaultState},
    Config, ConfigError, Environment,
};
use serde::Deserialize;

use crate::orchestrator::RunOptions;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub address: String,
    pub topic_count: usize,
    pub subscriber_count: usize,
    pub send_interval_ms: u64,
    pub receive_timeout_ms: u64,
    pub settle_delay_ms: u64,
    pub send_high_water_mark: usize,
    pub receive_high_water_mark: usize,
}

impl Settings {
    /// Reference cadence as defaults.
    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("address", "tcp://127.0.0.1:12345")?
            .set_default("topic_count", 10)?
            .set_default("subscriber_count", 10)?
            .set_default("send_interval_ms", 50)?
            .set_default("receive_timeout_ms", 2000)?
            .set_default("settle_delay_ms", 1000)?
            .set_default("send_high_water_mark", 1000)?
            .set_default("receive_high_water_mark", 1000)
    }

    pub fn load() -> Result<Self, ConfigError> {
        let cfg = Self::defaults()?
            // Environment variables with the TOPICBUS_ prefix win
            .add_source(Environment::with_prefix("TOPICBUS"))
            .build()?;

        // Deserialize the configuration into our structure.
        cfg.try_deserialize()
    }

    /// Maps the flat settings onto run options.
    pub fn run_options(&self) -> RunOptions {
        let mut options = RunOptions::new(self.address.clone(), self.topic_count);
        options.subscribers = self.subscriber_count;
        options.send_interval = Duration::from_millis(self.send_interval_ms);
        options.receive_timeout = Duration::from_millis(self.receive_timeout_ms);
        options.settle_delay = Duration::from_millis(self.settle_delay_ms);
        options.send_high_water_mark = self.send_high_water_mark;
        options.receive_high_water_mark = self.receive_high_water_mark;
        options
    }
}
