//! # Provider Entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{ChannelCount, Priority, ProviderId};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Registered AI backend. Registered at startup from config, mutated only
/// through explicit admin operations (`RegisterProvider`, `SetStrategy`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    id: ProviderId,
    provider_key: String,
    display_name: String,
    enabled: bool,
    channels: ChannelCount,
    priority: Priority,
    circuit_state: CircuitState,
    consecutive_failures: u32,
    cooldown_until: Option<DateTime<Utc>>,
    last_request_at: Option<DateTime<Utc>>,
}

impl Provider {
    pub fn new(provider_key: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: ProviderId::new(),
            provider_key: provider_key.into(),
            display_name: display_name.into(),
            enabled: true,
            channels: ChannelCount::default(),
            priority: Priority::default(),
            circuit_state: CircuitState::Closed,
            consecutive_failures: 0,
            cooldown_until: None,
            last_request_at: None,
        }
    }

    /// Reconstructs a provider from stored state, for repository adapters
    /// reading a row back.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: ProviderId,
        provider_key: String,
        display_name: String,
        enabled: bool,
        channels: ChannelCount,
        priority: Priority,
        circuit_state: CircuitState,
        consecutive_failures: u32,
        cooldown_until: Option<DateTime<Utc>>,
        last_request_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            provider_key,
            display_name,
            enabled,
            channels,
            priority,
            circuit_state,
            consecutive_failures,
            cooldown_until,
            last_request_at,
        }
    }

    pub fn id(&self) -> ProviderId {
        self.id
    }

    pub fn provider_key(&self) -> &str {
        &self.provider_key
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn channels(&self) -> ChannelCount {
        self.channels
    }

    pub fn set_channels(&mut self, channels: ChannelCount) {
        self.channels = channels;
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn cooldown_until(&self) -> Option<DateTime<Utc>> {
        self.cooldown_until
    }

    pub fn last_request_at(&self) -> Option<DateTime<Utc>> {
        self.last_request_at
    }

    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        if !self.enabled {
            return false;
        }
        match self.circuit_state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => self.cooldown_until.is_none_or(|until| now >= until),
        }
    }

    pub fn mark_request(&mut self, at: DateTime<Utc>) {
        self.last_request_at = Some(at);
    }

    /// Records a successful call, resetting the failure streak and
    /// closing the circuit if it was half-open.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.circuit_state = CircuitState::Closed;
        self.cooldown_until = None;
    }

    /// Records a failed call. Trips the circuit open with the given
    /// cooldown once `threshold` consecutive failures are reached.
    pub fn record_failure(&mut self, threshold: u32, cooldown_until: DateTime<Utc>) {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= threshold {
            self.circuit_state = CircuitState::Open;
            self.cooldown_until = Some(cooldown_until);
        }
    }

    /// Moves an open circuit whose cooldown has elapsed into half-open,
    /// allowing a single trial request through.
    pub fn try_half_open(&mut self, now: DateTime<Utc>) {
        if self.circuit_state == CircuitState::Open && self.cooldown_until.is_none_or(|until| now >= until) {
            self.circuit_state = CircuitState::HalfOpen;
        }
    }
}
