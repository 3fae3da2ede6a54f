// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted bus, clock and logger for driving the client in tests.

#![allow(dead_code)]

use std::{
    cell::Cell,
    collections::VecDeque,
    rc::Rc,
    sync::{Arc, Mutex},
};

use log::{Level, LevelFilter, Log, Metadata, Record};
use modbus_rtu_master::{Clock, Config, INTER_FRAME_TIMEOUT_MS, SerialClient, Stream};

pub const GAP: u32 = INTER_FRAME_TIMEOUT_MS;

/// A device on the other end of the bus.
///
/// `rx` holds bytes the device sends to the client; `None` entries make a
/// read fail while still being counted as available.
#[derive(Debug)]
pub struct MockDevice {
    pub rx: VecDeque<Option<u8>>,
    pub written: Vec<u8>,
    /// Free space in the transmit FIFO, used up by writes.
    pub available_write: usize,
    /// Bytes accepted by a single write call.
    pub write_chunk: usize,
}

impl Default for MockDevice {
    fn default() -> Self {
        Self {
            rx: VecDeque::new(),
            written: Vec::new(),
            available_write: usize::MAX,
            write_chunk: usize::MAX,
        }
    }
}

impl MockDevice {
    pub fn send(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied().map(Some));
    }

    pub fn send_read_error(&mut self) {
        self.rx.push_back(None);
    }

    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.written)
    }
}

impl Stream for MockDevice {
    fn bytes_available_to_read(&mut self) -> usize {
        self.rx.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front().flatten()
    }

    fn bytes_available_to_write(&mut self) -> usize {
        self.available_write
    }

    fn write(&mut self, buf: &[u8]) -> usize {
        let len = buf.len().min(self.available_write).min(self.write_chunk);
        self.written.extend_from_slice(&buf[..len]);
        self.available_write -= len;
        len
    }
}

/// Manually advanced millisecond counter.
#[derive(Debug, Clone, Default)]
pub struct MockClock(Rc<Cell<u32>>);

impl MockClock {
    pub fn advance(&self, ms: u32) {
        self.0.set(self.0.get().wrapping_add(ms));
    }

    pub fn set(&self, ms: u32) {
        self.0.set(ms);
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u32 {
        self.0.get()
    }
}

/// Records every message up to `max_level`.
#[derive(Debug, Clone)]
pub struct CapturingLogger {
    max_level: LevelFilter,
    records: Arc<Mutex<Vec<(Level, String)>>>,
}

impl CapturingLogger {
    pub fn new(max_level: LevelFilter) -> Self {
        Self {
            max_level,
            records: Arc::default(),
        }
    }

    pub fn records(&self) -> Vec<(Level, String)> {
        self.records.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records().into_iter().map(|(_, msg)| msg).collect()
    }

    pub fn clear(&self) {
        self.records.lock().unwrap().clear();
    }
}

impl Default for CapturingLogger {
    fn default() -> Self {
        Self::new(LevelFilter::Trace)
    }
}

impl Log for CapturingLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.max_level && metadata.target() == modbus_rtu_master::LOG_TARGET
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            self.records
                .lock()
                .unwrap()
                .push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

pub type TestClient = SerialClient<MockDevice, MockClock, CapturingLogger>;

pub struct Harness {
    pub client: TestClient,
    pub clock: MockClock,
    pub logger: CapturingLogger,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let clock = MockClock::default();
        let logger = CapturingLogger::default();
        let client =
            SerialClient::with_logger(MockDevice::default(), clock.clone(), config, logger.clone());
        Self {
            client,
            clock,
            logger,
        }
    }

    pub fn device(&mut self) -> &mut MockDevice {
        self.client.stream_mut()
    }

    pub fn step(&mut self) {
        self.client.step();
    }

    /// Step, then let the inter-frame gap pass.
    pub fn step_and_wait_gap(&mut self) {
        self.client.step();
        self.clock.advance(GAP);
    }

    /// Messages except frame dumps.
    pub fn notices(&self) -> Vec<String> {
        self.logger
            .records()
            .into_iter()
            .filter(|(level, _)| *level != Level::Trace)
            .map(|(_, msg)| msg)
            .collect()
    }
}

/// Append the CRC to `adu`.
pub fn with_crc(adu: &[u8]) -> Vec<u8> {
    let crc = modbus_rtu_master::rtu::crc16(adu);
    let mut frame = adu.to_vec();
    frame.extend_from_slice(&crc.to_le_bytes());
    frame
}
