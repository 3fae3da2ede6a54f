// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt;

/// modbus-rtu-master Error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Invalid buffer size
    BufferSize,
    /// Device address not allowed for this request
    SlaveId(u8),
    /// Invalid register quantity
    Quantity(u16),
    /// Invalid exception code
    ExceptionCode(u8),
    /// Frame shorter than address, function and CRC
    FrameTooShort(usize),
    /// Frame longer than the maximum RTU frame
    FrameTooLong(usize),
    /// Invalid CRC (received, calculated)
    Crc(u16, u16),
    /// Length Mismatch (expected, actual)
    LengthMismatch(usize, usize),
    /// Message ends before its mandatory fields (minimum, actual)
    Truncated(usize, usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Error::*;

        match self {
            BufferSize => write!(f, "Invalid buffer size"),
            SlaveId(id) => write!(f, "Invalid device address: {id}"),
            Quantity(cnt) => write!(f, "Invalid register quantity: {cnt}"),
            ExceptionCode(code) => write!(f, "Invalid exception code: 0x{code:0>2X}"),
            FrameTooShort(len) => write!(f, "Frame too short: {len} byte(s)"),
            FrameTooLong(len) => write!(f, "Frame too long: {len} byte(s)"),
            Crc(received, calculated) => write!(
                f,
                "Invalid CRC: received = 0x{received:0>4X}, calculated = 0x{calculated:0>4X}"
            ),
            LengthMismatch(expected, actual) => {
                write!(f, "Length Mismatch: expected {expected}, received {actual}")
            }
            Truncated(min, actual) => {
                write!(f, "Truncated message: expected {min}+, received {actual}")
            }
        }
    }
}
