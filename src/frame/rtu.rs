// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::*;

/// Slave ID
pub type SlaveId = u8;

/// Address that every device accepts and none answers.
pub const BROADCAST_ADDRESS: SlaveId = 0;

/// Lowest individually addressable device.
pub const MIN_UNICAST_ADDRESS: SlaveId = 1;

/// Highest individually addressable device, `248..=255` are reserved.
pub const MAX_UNICAST_ADDRESS: SlaveId = 247;

/// RTU header
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub slave: SlaveId,
}

impl Header {
    /// `true` if the request goes to every device on the bus.
    #[must_use]
    pub const fn is_broadcast(&self) -> bool {
        self.slave == BROADCAST_ADDRESS
    }
}

/// RTU Request ADU
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestAdu {
    pub hdr: Header,
    pub pdu: Request,
}

impl RequestAdu {
    #[must_use]
    pub fn function(&self) -> FunctionCode {
        self.pdu.into()
    }
}
