// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus RTU

use super::*;

pub mod client;
pub use crate::frame::rtu::*;

// [MODBUS over Serial Line Specification and Implementation Guide V1.02](http://modbus.org/docs/Modbus_over_serial_line_V1_02.pdf), page 13
// "The maximum size of a MODBUS RTU frame is 256 bytes."
pub const MAX_FRAME_LEN: usize = 256;

/// Size of the trailing CRC.
pub const CRC_LEN: usize = 2;

/// Address, function code and CRC.
pub const MIN_FRAME_LEN: usize = 2 + CRC_LEN;

/// A received RTU frame with a verified CRC.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFrame<'a> {
    pub slave: SlaveId,
    /// Raw function code, including the exception flag.
    pub function: u8,
    /// Address, function code and payload; the CRC is stripped.
    pub adu: &'a [u8],
}

impl DecodedFrame<'_> {
    /// `true` if the device answered with an exception.
    #[must_use]
    pub const fn is_exception(&self) -> bool {
        self.function & EXCEPTION_FLAG != 0
    }

    /// Function code without the exception flag.
    #[must_use]
    pub const fn function_code(&self) -> u8 {
        self.function & !EXCEPTION_FLAG
    }
}

/// Check the length and CRC of a complete frame.
///
/// `buf` must hold every byte received between two inter-frame gaps.
pub fn decode_frame(buf: &[u8]) -> Result<DecodedFrame<'_>> {
    if buf.len() < MIN_FRAME_LEN {
        return Err(Error::FrameTooShort(buf.len()));
    }
    if buf.len() > MAX_FRAME_LEN {
        return Err(Error::FrameTooLong(buf.len()));
    }
    let (adu, crc_buf) = buf.split_at(buf.len() - CRC_LEN);
    let received_crc = LittleEndian::read_u16(crc_buf);
    let calculated_crc = crc16(adu);
    if received_crc != calculated_crc {
        return Err(Error::Crc(received_crc, calculated_crc));
    }
    Ok(DecodedFrame {
        slave: adu[0],
        function: adu[1],
        adu,
    })
}

/// Calculate the CRC (Cyclic Redundancy Check) sum.
///
/// The result goes on the wire in little-endian byte order.
#[must_use]
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0xFFFF;
    for x in data {
        crc ^= u16::from(*x);
        for _ in 0..8 {
            // if we followed clippy's suggestion to move out the crc >>= 1, the condition may not be met any more
            // the recommended action therefore makes no sense and it is better to allow this lint
            #[allow(clippy::branches_sharing_code)]
            if (crc & 0x0001) != 0 {
                crc >>= 1;
                crc ^= 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}
