// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborators the client is driven by.

/// A non-blocking serial byte stream.
///
/// None of the methods may block. A UART driver with software FIFOs is the
/// typical implementation.
pub trait Stream {
    /// Number of received bytes that can be read right now.
    fn bytes_available_to_read(&mut self) -> usize;

    /// Read one received byte, `None` if nothing could be read.
    fn read_byte(&mut self) -> Option<u8>;

    /// Number of bytes that can be written right now without blocking.
    fn bytes_available_to_write(&mut self) -> usize;

    /// Queue bytes for transmission, returns how many were accepted.
    fn write(&mut self, buf: &[u8]) -> usize;
}

impl<T: Stream + ?Sized> Stream for &mut T {
    fn bytes_available_to_read(&mut self) -> usize {
        (**self).bytes_available_to_read()
    }

    fn read_byte(&mut self) -> Option<u8> {
        (**self).read_byte()
    }

    fn bytes_available_to_write(&mut self) -> usize {
        (**self).bytes_available_to_write()
    }

    fn write(&mut self, buf: &[u8]) -> usize {
        (**self).write(buf)
    }
}

/// A monotonic millisecond counter.
///
/// The counter may wrap around, intervals are computed with wrapping
/// subtraction.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

impl<F> Clock for F
where
    F: Fn() -> u32,
{
    fn now_ms(&self) -> u32 {
        self()
    }
}

/// [`Clock`] measuring the time since its creation.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    #[allow(clippy::cast_possible_truncation)]
    fn now_ms(&self) -> u32 {
        // Truncation wraps the counter after ~49 days.
        self.start.elapsed().as_millis() as u32
    }
}
