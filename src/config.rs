// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client timing configuration

/// Silence after the last received byte that ends a frame.
pub const INTER_FRAME_TIMEOUT_MS: u32 = 2;

/// How long to wait for a device to answer.
pub const DEFAULT_UNICAST_TIMEOUT_MS: u32 = 10_000;

/// How long a broadcast occupies the bus before the next request is sent.
pub const DEFAULT_BROADCAST_DELAY_MS: u32 = 1_000;

/// Baud rate above which the inter-frame gap is fixed.
const FIXED_GAP_BAUD_RATE: u32 = 19_200;

/// 3.5 characters of 11 bits, in bit milliseconds.
const INTER_FRAME_BITS_MS: u32 = 38_500;

/// Timing of a [`SerialClient`](crate::SerialClient).
///
/// # Example
///
/// ```rust
/// use modbus_rtu_master::Config;
///
/// let config = Config::from_baud_rate(9600).with_default_broadcast_delay_ms(100);
///
/// assert_eq!(config.inter_frame_timeout_ms, 5);
/// assert_eq!(config.default_broadcast_delay_ms, 100);
/// ```
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Silence that completes a received frame.
    pub inter_frame_timeout_ms: u32,
    /// Response timeout used when a request does not specify one.
    pub default_unicast_timeout_ms: u32,
    /// Delay after a broadcast write used when the request does not specify one.
    pub default_broadcast_delay_ms: u32,
}

impl Config {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inter_frame_timeout_ms: INTER_FRAME_TIMEOUT_MS,
            default_unicast_timeout_ms: DEFAULT_UNICAST_TIMEOUT_MS,
            default_broadcast_delay_ms: DEFAULT_BROADCAST_DELAY_MS,
        }
    }

    /// Derive the inter-frame gap from the line speed.
    ///
    /// Up to 19200 baud the gap is 3.5 character times, rounded up to whole
    /// milliseconds. Faster lines use the fixed 1.75 ms gap, rounded up.
    #[must_use]
    pub const fn from_baud_rate(baud_rate: u32) -> Self {
        let inter_frame_timeout_ms = if baud_rate == 0 || baud_rate > FIXED_GAP_BAUD_RATE {
            INTER_FRAME_TIMEOUT_MS
        } else {
            INTER_FRAME_BITS_MS.div_ceil(baud_rate)
        };
        Self::new().with_inter_frame_timeout_ms(inter_frame_timeout_ms)
    }

    #[must_use]
    pub const fn with_inter_frame_timeout_ms(mut self, ms: u32) -> Self {
        self.inter_frame_timeout_ms = ms;
        self
    }

    #[must_use]
    pub const fn with_default_unicast_timeout_ms(mut self, ms: u32) -> Self {
        self.default_unicast_timeout_ms = ms;
        self
    }

    #[must_use]
    pub const fn with_default_broadcast_delay_ms(mut self, ms: u32) -> Self {
        self.default_broadcast_delay_ms = ms;
        self
    }

    /// Effective timeout of a request, `0` selects the default.
    pub(crate) const fn request_timeout_ms(&self, broadcast: bool, timeout_ms: u32) -> u32 {
        match (timeout_ms, broadcast) {
            (0, true) => self.default_broadcast_delay_ms,
            (0, false) => self.default_unicast_timeout_ms,
            (ms, _) => ms,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
