// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Malformed responses

mod common;

use common::Harness;
use modbus_rtu_master::{RegisterDataResponse, ResponseStatus};

fn submit(h: &mut Harness) -> RegisterDataResponse {
    let resp = h.client.read_input_registers(7, 0x1234, 1, 0);
    h.step();
    assert_eq!(resp.status(), ResponseStatus::Waiting);
    h.device().take_written();
    h.logger.clear();
    resp
}

/// Deliver `frame` as a whole and let it complete.
fn respond(h: &mut Harness, resp: &RegisterDataResponse, frame: &[u8]) {
    h.device().send(frame);
    h.step_and_wait_gap();
    assert_eq!(resp.status(), ResponseStatus::Waiting);
    h.step();
    assert!(resp.done());
    assert!(resp.failed());
    assert!(!resp.success());
    assert!(resp.data().is_empty());
}

#[test]
fn short_response_waits_for_the_gap() {
    let mut h = Harness::new();
    let resp = submit(&mut h);

    h.device().send(&[0x07]);
    for _ in 0..100 {
        h.step();
        assert_eq!(resp.status(), ResponseStatus::Waiting);
        assert!(resp.pending());
    }

    h.step_and_wait_gap();
    assert_eq!(resp.status(), ResponseStatus::Waiting);
    h.step();
    assert_eq!(resp.status(), ResponseStatus::FailureTooShort);
    assert_eq!(h.notices(), ["Received short frame from device 7"]);
    assert_eq!(h.logger.messages()[0], "<- 07");
}

#[test]
fn short_responses() {
    for frame in [&[0x07, 0x04][..], &[0x07, 0x04, 0xFF][..]] {
        let mut h = Harness::new();
        let resp = submit(&mut h);
        respond(&mut h, &resp, frame);
        assert_eq!(resp.status(), ResponseStatus::FailureTooShort);
    }
}

fn long_response(registers: u8) -> Vec<u8> {
    let mut frame = vec![0x07, 0x04, 0x7D];
    for i in 1..=registers {
        frame.extend_from_slice(&[0x00, i]);
    }
    frame.extend_from_slice(&[0xFF, 0xFF]);
    frame
}

#[test]
fn response_one_byte_too_long() {
    let mut h = Harness::new();
    let resp = submit(&mut h);
    let frame = long_response(126);
    assert_eq!(frame.len(), 257);
    respond(&mut h, &resp, &frame);
    assert_eq!(resp.status(), ResponseStatus::FailureTooLong);
    assert_eq!(h.notices(), ["Received oversized frame from device 7"]);
}

#[test]
fn response_two_bytes_too_long() {
    let mut h = Harness::new();
    let resp = submit(&mut h);
    let mut frame = long_response(126);
    frame.insert(frame.len() - 2, 0x00);
    assert_eq!(frame.len(), 258);
    respond(&mut h, &resp, &frame);
    assert_eq!(resp.status(), ResponseStatus::FailureTooLong);
}

#[test]
fn response_far_too_long() {
    let mut h = Harness::new();
    let resp = submit(&mut h);
    let mut frame = vec![0x07, 0x04, 0x7D];
    frame.resize(998, 0x42);
    frame.extend_from_slice(&[0xFF, 0xFF]);
    assert_eq!(frame.len(), 1000);
    respond(&mut h, &resp, &frame);
    assert_eq!(resp.status(), ResponseStatus::FailureTooLong);
    assert!(h.device().rx.is_empty());
}

#[test]
fn invalid_crc() {
    let mut h = Harness::new();
    let resp = submit(&mut h);
    respond(&mut h, &resp, &[0x07, 0x04, 0x00, 0xFF, 0xFF]);
    assert_eq!(resp.status(), ResponseStatus::FailureCrc);
    assert_eq!(
        h.notices(),
        ["Received frame with invalid CRC FFFF from device 7 with function 04, expected C1C2"]
    );
}

#[test]
fn wrong_device_address() {
    let mut h = Harness::new();
    let resp = submit(&mut h);
    respond(&mut h, &resp, &[0x08, 0x04, 0x00, 0xF2, 0xC2]);
    assert_eq!(resp.status(), ResponseStatus::FailureAddress);
    assert_eq!(
        h.notices(),
        ["Received function 04 from device 8, expected device 7"]
    );
}

#[test]
fn wrong_function_code() {
    let mut h = Harness::new();
    let resp = submit(&mut h);
    respond(&mut h, &resp, &[0x07, 0x05, 0x00, 0xC3, 0x51]);
    assert_eq!(resp.status(), ResponseStatus::FailureFunction);
    assert_eq!(
        h.notices(),
        ["Received function 05 from device 7, expected function 04"]
    );
}

#[test]
fn exception_for_another_function() {
    let mut h = Harness::new();
    let resp = submit(&mut h);
    respond(&mut h, &resp, &common::with_crc(&[0x07, 0x83, 0x02]));
    assert_eq!(resp.status(), ResponseStatus::FailureFunction);
    assert_eq!(resp.exception_code(), 0);
    assert_eq!(
        h.notices(),
        ["Received function 83 from device 7, expected function 04"]
    );
}

#[test]
fn client_continues_after_failure() {
    let mut h = Harness::new();
    let failed = submit(&mut h);
    let next = h.client.read_input_registers(7, 0x1234, 1, 0);

    respond(&mut h, &failed, &[0x07, 0x04, 0x00, 0xFF, 0xFF]);
    assert_eq!(next.status(), ResponseStatus::Queued);

    h.step();
    assert_eq!(next.status(), ResponseStatus::Waiting);
    h.device().send(&[0x07, 0x04, 0x01, 0x56, 0x78, 0xFE, 0xB2]);
    h.step_and_wait_gap();
    h.step();
    assert!(next.success());
    assert_eq!(&*next.data(), &[0x5678]);
}
