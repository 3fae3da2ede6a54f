// SPDX-FileCopyrightText: Copyright (c) 2018-2024 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

#![doc = include_str!("../README.md")]
#![no_std]

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod client;
mod codec;
mod config;
mod error;
mod frame;
mod io;
mod response;
mod trace;

pub use client::SerialClient;
pub use codec::rtu;
pub use config::*;
pub use error::*;
pub use frame::*;
pub use io::*;
pub use response::*;
pub use trace::{GlobalLogger, TARGET as LOG_TARGET};
