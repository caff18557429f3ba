//! Server configuration.
//!
//! Defaults are usable as-is. [`ServerConfig::load_or_default`] overrides
//! them from the environment:
//!
//! | Variable | Field |
//! |---|---|
//! | `PARTYROOM_BIND` | `bind` |
//! | `PARTYROOM_TICK_RATE` | `room.tick_rate` |
//! | `PARTYROOM_MAX_MEMBERS` | `room.max_members` |
//! | `PARTYROOM_OUTBOX_CAPACITY` | `outbox_capacity` |
//!
//! A variable that does not parse is logged and ignored.

use std::str::FromStr;

use partyroom_room::RoomConfig;
use partyroom_tick::TickConfig;
use serde::{Deserialize, Serialize};

use crate::PartyroomError;

pub const ENV_BIND: &str = "PARTYROOM_BIND";
pub const ENV_TICK_RATE: &str = "PARTYROOM_TICK_RATE";
pub const ENV_MAX_MEMBERS: &str = "PARTYROOM_MAX_MEMBERS";
pub const ENV_OUTBOX_CAPACITY: &str = "PARTYROOM_OUTBOX_CAPACITY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind: String,

    /// Messages buffered per connection before new ones are dropped.
    pub outbox_capacity: usize,

    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
            // A few seconds of state updates at the default tick rate.
            outbox_capacity: 256,
            room: RoomConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `PARTYROOM_*` environment variables.
    pub fn load_or_default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`load_or_default`](Self::load_or_default) with a custom
    /// variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(bind) = lookup(ENV_BIND) {
            let bind = bind.trim();
            if bind.is_empty() {
                tracing::warn!(var = ENV_BIND, "empty bind address, using default");
            } else {
                config.bind = bind.to_string();
            }
        }
        if let Some(rate) = parse_positive::<u32>(&lookup, ENV_TICK_RATE) {
            config.room.tick_rate = rate;
        }
        if let Some(max) = parse_positive::<usize>(&lookup, ENV_MAX_MEMBERS) {
            config.room.max_members = max;
        }
        if let Some(capacity) = parse_positive::<usize>(&lookup, ENV_OUTBOX_CAPACITY) {
            config.outbox_capacity = capacity;
        }

        config
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<(), PartyroomError> {
        if self.bind.trim().is_empty() {
            return Err(PartyroomError::Config("bind address is empty".into()));
        }
        if self.outbox_capacity == 0 {
            return Err(PartyroomError::Config(
                "outbox_capacity must be at least 1".into(),
            ));
        }
        if self.room.max_members == 0 {
            return Err(PartyroomError::Config(
                "max_members must be at least 1".into(),
            ));
        }
        if self.room.min_players > self.room.max_members {
            return Err(PartyroomError::Config(format!(
                "min_players ({}) cannot exceed max_members ({})",
                self.room.min_players, self.room.max_members
            )));
        }
        if !(1..=TickConfig::MAX_TICK_RATE_HZ).contains(&self.room.tick_rate) {
            return Err(PartyroomError::Config(format!(
                "tick_rate must be 1-{} Hz, got {}",
                TickConfig::MAX_TICK_RATE_HZ,
                self.room.tick_rate
            )));
        }
        if self.room.command_buffer == 0 {
            return Err(PartyroomError::Config(
                "command_buffer must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn parse_positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr + PartialOrd + Default,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Some(value),
        Ok(_) => {
            tracing::warn!(var = key, "must be greater than 0, using default");
            None
        }
        Err(_) => {
            tracing::warn!(var = key, value = %raw, "invalid value, using default");
            None
        }
    }
}
