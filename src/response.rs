// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared response handles
//!
//! A response is handed to the caller when a request is submitted and is
//! filled in by the [`SerialClient`](crate::SerialClient) once the exchange
//! on the bus has finished.

use alloc::{rc::Rc, vec::Vec};
use core::{
    cell::{Cell, Ref, RefCell},
    fmt,
};

use crate::{
    codec::rtu::client::{decode_exception_status, decode_register_data, decode_register_write},
    error::Error,
    frame::{Exception, Word},
};

/// Progress of a request.
///
/// Variants are ordered: everything from [`ResponseStatus::Success`] onwards
/// is terminal.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResponseStatus {
    Queued,
    Transmit,
    Waiting,
    Success,
    /// The device answered with an exception code.
    Exception,
    /// The request parameters were rejected before anything was sent.
    FailureInvalid,
    FailureCrc,
    FailureTimeout,
    FailureTooShort,
    FailureTooLong,
    FailureAddress,
    FailureFunction,
    FailureLength,
    /// A response was received for a broadcast request.
    FailureUnexpected,
}

impl ResponseStatus {
    #[must_use]
    pub fn is_done(self) -> bool {
        self >= Self::Success
    }

    #[must_use]
    pub fn is_failure(self) -> bool {
        self > Self::Exception
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Transmit => "transmit",
            Self::Waiting => "waiting",
            Self::Success => "success",
            Self::Exception => "exception",
            Self::FailureInvalid => "invalid request",
            Self::FailureCrc => "invalid CRC",
            Self::FailureTimeout => "timeout",
            Self::FailureTooShort => "frame too short",
            Self::FailureTooLong => "frame too long",
            Self::FailureAddress => "wrong device address",
            Self::FailureFunction => "wrong function code",
            Self::FailureLength => "length mismatch",
            Self::FailureUnexpected => "unexpected response",
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug)]
struct Inner<P> {
    status: Cell<ResponseStatus>,
    exception_code: Cell<u8>,
    payload: RefCell<P>,
}

/// Handle to the outcome of a submitted request.
///
/// Clones share the same state. The client keeps its own clone until the
/// request has completed, so dropping the caller's handle early is fine.
#[derive(Debug)]
pub struct Response<P> {
    inner: Rc<Inner<P>>,
}

impl<P> Clone for Response<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P: Default> Response<P> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                status: Cell::new(ResponseStatus::Queued),
                exception_code: Cell::new(0),
                payload: RefCell::new(P::default()),
            }),
        }
    }
}

impl<P> Response<P> {
    #[must_use]
    pub fn status(&self) -> ResponseStatus {
        self.inner.status.get()
    }

    /// The request has reached a terminal status.
    #[must_use]
    pub fn done(&self) -> bool {
        self.status().is_done()
    }

    #[must_use]
    pub fn pending(&self) -> bool {
        !self.done()
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.status() == ResponseStatus::Success
    }

    #[must_use]
    pub fn exception(&self) -> bool {
        self.status() == ResponseStatus::Exception
    }

    /// Any `Failure*` status. A device exception is not a failure.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.status().is_failure()
    }

    /// Raw exception code, only meaningful with [`ResponseStatus::Exception`].
    #[must_use]
    pub fn exception_code(&self) -> u8 {
        self.inner.exception_code.get()
    }

    /// Decoded exception code, `None` unless the device answered with a
    /// known exception.
    #[must_use]
    pub fn exception_kind(&self) -> Option<Exception> {
        if !self.exception() {
            return None;
        }
        Exception::try_from(self.exception_code()).ok()
    }

    /// Terminal states are final, later updates are ignored.
    pub(crate) fn set_status(&self, status: ResponseStatus) {
        if !self.done() {
            self.inner.status.set(status);
        }
    }

    pub(crate) fn set_exception(&self, code: u8) {
        if !self.done() {
            self.inner.exception_code.set(code);
            self.inner.status.set(ResponseStatus::Exception);
        }
    }

    fn payload(&self) -> Ref<'_, P> {
        self.inner.payload.borrow()
    }

    fn replace_payload(&self, payload: P) {
        if !self.done() {
            *self.inner.payload.borrow_mut() = payload;
        }
    }
}

/// Registers returned by a read request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterData {
    data: Vec<Word>,
}

/// Echo of a single register write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterWrite {
    address: u16,
    data: Vec<Word>,
}

/// Output data of a read exception status request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExceptionStatus {
    data: u8,
}

pub type RegisterDataResponse = Response<RegisterData>;
pub type RegisterWriteResponse = Response<RegisterWrite>;
pub type ExceptionStatusResponse = Response<ExceptionStatus>;

impl Response<RegisterData> {
    /// Register values in the order they were received.
    #[must_use]
    pub fn data(&self) -> Ref<'_, [Word]> {
        Ref::map(self.payload(), |p| p.data.as_slice())
    }
}

impl Response<RegisterWrite> {
    /// Register address echoed by the device.
    #[must_use]
    pub fn address(&self) -> u16 {
        self.payload().address
    }

    /// Register value echoed by the device.
    ///
    /// Empty unless the write has been confirmed, which never happens for
    /// broadcasts.
    #[must_use]
    pub fn data(&self) -> Ref<'_, [Word]> {
        Ref::map(self.payload(), |p| p.data.as_slice())
    }
}

impl Response<ExceptionStatus> {
    #[must_use]
    pub fn data(&self) -> u8 {
        self.payload().data
    }
}

/// A response as seen by the client while its request is queued.
#[derive(Debug, Clone)]
pub(crate) enum PendingResponse {
    RegisterData(RegisterDataResponse),
    RegisterWrite(RegisterWriteResponse),
    ExceptionStatus(ExceptionStatusResponse),
}

impl PendingResponse {
    pub(crate) fn status(&self) -> ResponseStatus {
        match self {
            Self::RegisterData(r) => r.status(),
            Self::RegisterWrite(r) => r.status(),
            Self::ExceptionStatus(r) => r.status(),
        }
    }

    pub(crate) fn set_status(&self, status: ResponseStatus) {
        match self {
            Self::RegisterData(r) => r.set_status(status),
            Self::RegisterWrite(r) => r.set_status(status),
            Self::ExceptionStatus(r) => r.set_status(status),
        }
    }

    pub(crate) fn set_exception(&self, code: u8) {
        match self {
            Self::RegisterData(r) => r.set_exception(code),
            Self::RegisterWrite(r) => r.set_exception(code),
            Self::ExceptionStatus(r) => r.set_exception(code),
        }
    }

    /// Decode the payload of a verified frame.
    ///
    /// `adu` is the frame without its CRC. On success the payload is stored;
    /// the status is left to the caller.
    pub(crate) fn parse(&self, adu: &[u8]) -> Result<(), Error> {
        match self {
            Self::RegisterData(r) => {
                let data = decode_register_data(adu)?;
                r.replace_payload(RegisterData { data });
            }
            Self::RegisterWrite(r) => {
                let (address, value) = decode_register_write(adu)?;
                r.replace_payload(RegisterWrite {
                    address,
                    data: alloc::vec![value],
                });
            }
            Self::ExceptionStatus(r) => {
                let data = decode_exception_status(adu)?;
                r.replace_payload(ExceptionStatus { data });
            }
        }
        Ok(())
    }
}
