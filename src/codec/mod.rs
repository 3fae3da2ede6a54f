// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{error::*, frame::*};
use alloc::vec::Vec;
use byteorder::{BigEndian, ByteOrder, LittleEndian};

pub mod rtu;

type Result<T> = core::result::Result<T, Error>;
