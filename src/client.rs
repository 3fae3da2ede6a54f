// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Poll-driven Modbus RTU client (master)

use alloc::collections::VecDeque;

use log::{Level, Log};

use crate::{
    codec::rtu::{
        MAX_FRAME_LEN,
        client::{check_request, decode_exception, encode_request},
        decode_frame,
    },
    config::Config,
    error::Error,
    frame::{FunctionCode, Header, Request, RequestAdu, SlaveId},
    io::{Clock, Stream},
    response::{
        ExceptionStatusResponse, PendingResponse, RegisterDataResponse, RegisterWriteResponse,
        ResponseStatus,
    },
    trace::{GlobalLogger, emit, log_frame},
};

/// One byte more than the largest frame, so oversized frames can be told
/// apart from frames of maximum length.
const FRAME_BUF_LEN: usize = MAX_FRAME_LEN + 1;

#[derive(Debug)]
struct QueuedRequest {
    adu: RequestAdu,
    timeout_ms: u32,
    response: PendingResponse,
}

/// A Modbus RTU master on a half-duplex serial bus.
///
/// Requests are queued by the submission methods, which return a
/// [`Response`](crate::Response) handle immediately. The bus is only ever
/// touched from [`SerialClient::step`], which has to be called on every
/// iteration of the application's main loop. Requests are processed one at
/// a time in submission order.
#[derive(Debug)]
pub struct SerialClient<S, C, L = GlobalLogger> {
    stream: S,
    clock: C,
    logger: L,
    config: Config,
    requests: VecDeque<QueuedRequest>,
    frame: [u8; FRAME_BUF_LEN],
    /// Transmit cursor or number of received bytes.
    frame_pos: usize,
    tx_frame_len: usize,
    last_tx_ms: u32,
    last_rx_ms: u32,
    /// Bytes that nobody asked for are being received.
    idle_frame: bool,
}

impl<S, C> SerialClient<S, C>
where
    S: Stream,
    C: Clock,
{
    pub fn new(stream: S, clock: C) -> Self {
        Self::with_config(stream, clock, Config::default())
    }

    pub fn with_config(stream: S, clock: C, config: Config) -> Self {
        Self::with_logger(stream, clock, config, GlobalLogger)
    }
}

impl<S, C, L> SerialClient<S, C, L>
where
    S: Stream,
    C: Clock,
    L: Log,
{
    /// Create a client that reports to `logger` instead of the global logger.
    pub fn with_logger(stream: S, clock: C, config: Config, logger: L) -> Self {
        Self {
            stream,
            clock,
            logger,
            config,
            requests: VecDeque::new(),
            frame: [0; FRAME_BUF_LEN],
            frame_pos: 0,
            tx_frame_len: 0,
            last_tx_ms: 0,
            last_rx_ms: 0,
            idle_frame: false,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Delay after broadcast writes submitted without a timeout.
    pub fn default_broadcast_delay_ms(&mut self, ms: u32) {
        self.config.default_broadcast_delay_ms = ms;
    }

    #[must_use]
    pub const fn stream(&self) -> &S {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Number of requests that have not completed yet.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.requests.len()
    }

    /// Nothing is queued and no unsolicited frame is being received.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.requests.is_empty() && !self.idle_frame
    }

    /// Read `count` holding registers starting at `address`.
    ///
    /// `device` must be a unicast address and `count` within `1..=125`,
    /// otherwise the response fails immediately. A `timeout_ms` of `0`
    /// selects the configured default.
    pub fn read_holding_registers(
        &mut self,
        device: SlaveId,
        address: u16,
        count: u16,
        timeout_ms: u32,
    ) -> RegisterDataResponse {
        let response = RegisterDataResponse::new();
        self.submit(
            device,
            Request::ReadHoldingRegisters(address, count),
            timeout_ms,
            PendingResponse::RegisterData(response.clone()),
        );
        response
    }

    /// Read `count` input registers starting at `address`.
    ///
    /// Same constraints as [`SerialClient::read_holding_registers`].
    pub fn read_input_registers(
        &mut self,
        device: SlaveId,
        address: u16,
        count: u16,
        timeout_ms: u32,
    ) -> RegisterDataResponse {
        let response = RegisterDataResponse::new();
        self.submit(
            device,
            Request::ReadInputRegisters(address, count),
            timeout_ms,
            PendingResponse::RegisterData(response.clone()),
        );
        response
    }

    /// Write a single holding register.
    ///
    /// Device `0` broadcasts the write. No device answers a broadcast, the
    /// response succeeds once `timeout_ms` (or the default broadcast delay)
    /// has passed.
    pub fn write_holding_register(
        &mut self,
        device: SlaveId,
        address: u16,
        value: u16,
        timeout_ms: u32,
    ) -> RegisterWriteResponse {
        let response = RegisterWriteResponse::new();
        self.submit(
            device,
            Request::WriteSingleRegister(address, value),
            timeout_ms,
            PendingResponse::RegisterWrite(response.clone()),
        );
        response
    }

    /// Read the eight exception status outputs of a device.
    pub fn read_exception_status(
        &mut self,
        device: SlaveId,
        timeout_ms: u32,
    ) -> ExceptionStatusResponse {
        let response = ExceptionStatusResponse::new();
        self.submit(
            device,
            Request::ReadExceptionStatus,
            timeout_ms,
            PendingResponse::ExceptionStatus(response.clone()),
        );
        response
    }

    fn submit(&mut self, slave: SlaveId, pdu: Request, timeout_ms: u32, response: PendingResponse) {
        let adu = RequestAdu {
            hdr: Header { slave },
            pdu,
        };
        if let Err(err) = check_request(&adu) {
            emit!(
                self.logger,
                Level::Debug,
                "Invalid request for function {} to device {}: {err}",
                adu.function(),
                slave
            );
            response.set_status(ResponseStatus::FailureInvalid);
            return;
        }
        let timeout_ms = self
            .config
            .request_timeout_ms(adu.hdr.is_broadcast(), timeout_ms);
        self.requests.push_back(QueuedRequest {
            adu,
            timeout_ms,
            response,
        });
    }

    /// Advance the client by one tick.
    ///
    /// Never blocks: only as many bytes as the stream reports are read or
    /// written.
    pub fn step(&mut self) {
        if self.requests.is_empty() || self.idle_frame {
            self.idle();
            return;
        }

        if self.front_status() == Some(ResponseStatus::Queued) {
            if self.idle() {
                return;
            }
            self.encode();
        }

        if self.front_status() == Some(ResponseStatus::Transmit) {
            self.transmit();
        }

        if self.front_status() == Some(ResponseStatus::Waiting) {
            self.receive();
        }

        if self.front_status().is_some_and(ResponseStatus::is_done) {
            self.requests.pop_front();
            self.frame_pos = 0;
        }
    }

    fn front_status(&self) -> Option<ResponseStatus> {
        self.requests.front().map(|r| r.response.status())
    }

    /// Receive and discard frames while no request is waiting for one.
    ///
    /// Returns `true` while such a frame is still incomplete.
    fn idle(&mut self) -> bool {
        let now = self.clock.now_ms();
        self.read_available(now);

        if self.frame_pos == 0 {
            return false;
        }

        if now.wrapping_sub(self.last_rx_ms) >= self.config.inter_frame_timeout_ms {
            let frame = &self.frame[..self.frame_pos];
            log_frame(&self.logger, "<-", frame);
            emit!(
                self.logger,
                Level::Warn,
                "Received unexpected frame while idle from device {}",
                frame[0]
            );
            self.frame_pos = 0;
            self.idle_frame = false;
            return false;
        }

        self.idle_frame = true;
        true
    }

    fn encode(&mut self) {
        let Some(request) = self.requests.front() else {
            return;
        };
        match encode_request(request.adu, &mut self.frame[..MAX_FRAME_LEN]) {
            Ok(len) => {
                self.tx_frame_len = len;
                self.frame_pos = 0;
                request.response.set_status(ResponseStatus::Transmit);
                log_frame(&self.logger, "->", &self.frame[..len]);
            }
            Err(err) => {
                emit!(
                    self.logger,
                    Level::Error,
                    "Unable to encode function {} for device {}: {err}",
                    request.adu.function(),
                    request.adu.hdr.slave
                );
                request.response.set_status(ResponseStatus::FailureInvalid);
            }
        }
    }

    /// Hand as much of the frame to the stream as it accepts.
    fn transmit(&mut self) {
        while self.frame_pos < self.tx_frame_len {
            let available = self.stream.bytes_available_to_write();
            if available == 0 {
                return;
            }
            let end = self.frame_pos + available.min(self.tx_frame_len - self.frame_pos);
            let written = self.stream.write(&self.frame[self.frame_pos..end]);
            if written == 0 {
                return;
            }
            self.frame_pos += written.min(end - self.frame_pos);
        }

        self.last_tx_ms = self.clock.now_ms();
        self.frame_pos = 0;
        if let Some(request) = self.requests.front() {
            request.response.set_status(ResponseStatus::Waiting);
        }
    }

    fn receive(&mut self) {
        let now = self.clock.now_ms();
        self.read_available(now);

        let Some(request) = self.requests.front() else {
            return;
        };

        if self.frame_pos == 0 {
            if now.wrapping_sub(self.last_tx_ms) < request.timeout_ms {
                return;
            }
            if request.adu.hdr.is_broadcast() {
                request.response.set_status(ResponseStatus::Success);
            } else {
                emit!(
                    self.logger,
                    Level::Info,
                    "Timeout waiting for response to function {} from device {}",
                    request.adu.function(),
                    request.adu.hdr.slave
                );
                request.response.set_status(ResponseStatus::FailureTimeout);
            }
        } else if now.wrapping_sub(self.last_rx_ms) >= self.config.inter_frame_timeout_ms {
            let frame = &self.frame[..self.frame_pos];
            log_frame(&self.logger, "<-", frame);
            let status = complete(&self.logger, request, frame);
            request.response.set_status(status);
        }
    }

    /// Move every available byte into the frame buffer.
    ///
    /// Bytes beyond the buffer are dropped, the frame is rejected as too
    /// long anyway.
    fn read_available(&mut self, now: u32) {
        loop {
            let available = self.stream.bytes_available_to_read();
            if available == 0 {
                return;
            }
            for _ in 0..available {
                let Some(byte) = self.stream.read_byte() else {
                    return;
                };
                if let Some(slot) = self.frame.get_mut(self.frame_pos) {
                    *slot = byte;
                    self.frame_pos += 1;
                }
                self.last_rx_ms = now;
            }
        }
    }
}

/// Check a received frame against its request.
///
/// The first failing check determines the status.
fn complete<L: Log>(logger: &L, request: &QueuedRequest, buf: &[u8]) -> ResponseStatus {
    let device = buf.first().copied().unwrap_or_default();
    let function = FunctionCode::new(buf.get(1).copied().unwrap_or_default());

    let frame = match decode_frame(buf) {
        Ok(frame) => frame,
        Err(Error::FrameTooLong(_)) => {
            emit!(logger, Level::Error, "Received oversized frame from device {device}");
            return ResponseStatus::FailureTooLong;
        }
        Err(Error::Crc(received, calculated)) => {
            emit!(
                logger,
                Level::Error,
                "Received frame with invalid CRC {received:04X} from device {device} with function {function}, expected {calculated:04X}"
            );
            return ResponseStatus::FailureCrc;
        }
        Err(_) => {
            emit!(logger, Level::Error, "Received short frame from device {device}");
            return ResponseStatus::FailureTooShort;
        }
    };

    let expected_device = request.adu.hdr.slave;
    let expected_function = request.adu.function();

    if request.adu.hdr.is_broadcast() {
        emit!(
            logger,
            Level::Error,
            "Received unexpected response from device {device} to broadcast function {function}"
        );
        return ResponseStatus::FailureUnexpected;
    }

    if frame.slave != expected_device {
        emit!(
            logger,
            Level::Error,
            "Received function {function} from device {device}, expected device {expected_device}"
        );
        return ResponseStatus::FailureAddress;
    }

    if FunctionCode::new(frame.function_code()) != expected_function {
        emit!(
            logger,
            Level::Error,
            "Received function {function} from device {device}, expected function {expected_function}"
        );
        return ResponseStatus::FailureFunction;
    }

    if frame.is_exception() {
        return match decode_exception(frame.adu) {
            Ok(code) => {
                emit!(
                    logger,
                    Level::Info,
                    "Exception code {code:02X} for function {expected_function} from device {device}"
                );
                request.response.set_exception(code);
                ResponseStatus::Exception
            }
            Err(err) => {
                log_payload_error(logger, function, device, err);
                ResponseStatus::FailureLength
            }
        };
    }

    match request.response.parse(frame.adu) {
        Ok(()) => ResponseStatus::Success,
        Err(err) => {
            log_payload_error(logger, function, device, err);
            ResponseStatus::FailureLength
        }
    }
}

fn log_payload_error<L: Log>(logger: &L, function: FunctionCode, device: SlaveId, err: Error) {
    match err {
        Error::LengthMismatch(expected, actual) => emit!(
            logger,
            Level::Error,
            "Length mismatch for function {function} from device {device}, expected {expected} received {actual}"
        ),
        Error::Truncated(min, actual) => emit!(
            logger,
            Level::Error,
            "Incomplete message for function {function} from device {device}, expected {min}+ received {actual}"
        ),
        err => emit!(
            logger,
            Level::Error,
            "Invalid response for function {function} from device {device}: {err}"
        ),
    }
}
