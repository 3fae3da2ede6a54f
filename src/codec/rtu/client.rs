// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus RTU client (master) specific functions.
use super::*;

/// Encode an RTU request.
///
/// Writes address, PDU and CRC; the whole frame must fit into `buf`.
pub fn encode_request(adu: RequestAdu, buf: &mut [u8]) -> Result<usize> {
    let RequestAdu { hdr, pdu } = adu;
    if buf.len() < 2 {
        return Err(Error::BufferSize);
    }
    let len = pdu.encode(&mut buf[1..])?;
    if buf.len() < len + 1 + CRC_LEN {
        return Err(Error::BufferSize);
    }
    buf[0] = hdr.slave;
    let crc = crc16(&buf[0..=len]);
    LittleEndian::write_u16(&mut buf[len + 1..], crc);
    Ok(len + 1 + CRC_LEN)
}

/// Check that a request may be queued at all.
///
/// Reads and diagnostics need a unicast address, register writes may also
/// be broadcast. Reads are limited to [`MAX_READ_REGISTERS`].
pub fn check_request(adu: &RequestAdu) -> Result<()> {
    let RequestAdu { hdr, pdu } = *adu;
    let min_slave = match pdu {
        Request::WriteSingleRegister(_, _) => BROADCAST_ADDRESS,
        _ => MIN_UNICAST_ADDRESS,
    };
    if !(min_slave..=MAX_UNICAST_ADDRESS).contains(&hdr.slave) {
        return Err(Error::SlaveId(hdr.slave));
    }
    match pdu {
        Request::ReadHoldingRegisters(_, quantity) | Request::ReadInputRegisters(_, quantity)
            if !(1..=MAX_READ_REGISTERS).contains(&quantity) =>
        {
            Err(Error::Quantity(quantity))
        }
        _ => Ok(()),
    }
}

fn check_length(adu: &[u8], expected: usize) -> Result<()> {
    if adu.len() != expected {
        return Err(Error::LengthMismatch(expected, adu.len()));
    }
    Ok(())
}

/// Decode the register values of a read response.
///
/// Byte 2 holds the number of registers that follow.
pub fn decode_register_data(adu: &[u8]) -> Result<Vec<Word>> {
    if adu.len() < 3 {
        return Err(Error::Truncated(3, adu.len()));
    }
    let quantity = usize::from(adu[2]);
    check_length(adu, 3 + 2 * quantity)?;
    Ok(adu[3..].chunks_exact(2).map(BigEndian::read_u16).collect())
}

/// Decode the echoed address and value of a single register write.
pub fn decode_register_write(adu: &[u8]) -> Result<(Address, Word)> {
    check_length(adu, 6)?;
    Ok((
        BigEndian::read_u16(&adu[2..4]),
        BigEndian::read_u16(&adu[4..6]),
    ))
}

/// Decode the output data byte of an exception status response.
pub fn decode_exception_status(adu: &[u8]) -> Result<u8> {
    check_length(adu, 3)?;
    Ok(adu[2])
}

/// Decode the exception code of an exception response.
pub fn decode_exception(adu: &[u8]) -> Result<u8> {
    if adu.len() < 3 {
        return Err(Error::Truncated(3, adu.len()));
    }
    Ok(adu[2])
}
