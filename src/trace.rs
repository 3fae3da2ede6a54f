// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Diagnostic output of the client

use core::fmt;

use log::{Level, Log, Metadata, Record};

/// Log target of all client messages.
pub const TARGET: &str = "modbus";

const BYTES_PER_LINE: usize = 16;

/// Log through an explicit [`log::Log`] handle.
macro_rules! emit {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let metadata = ::log::Metadata::builder()
            .level($level)
            .target($crate::trace::TARGET)
            .build();
        if $logger.enabled(&metadata) {
            $logger.log(
                &::log::Record::builder()
                    .metadata(metadata)
                    .args(format_args!($($arg)+))
                    .module_path_static(Some(module_path!()))
                    .file_static(Some(file!()))
                    .line(Some(line!()))
                    .build(),
            );
        }
    }};
}

pub(crate) use emit;

/// One line of a frame dump.
///
/// A `'` precedes the payload (offset 2) and the CRC (last two bytes).
struct HexLine<'a> {
    frame: &'a [u8],
    start: usize,
    end: usize,
}

impl fmt::Display for HexLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.frame.len();
        for (i, byte) in self
            .frame
            .iter()
            .enumerate()
            .take(self.end)
            .skip(self.start)
        {
            let mark = if i == 2 || i + 2 == len { '\'' } else { ' ' };
            write!(f, "{mark}{byte:02X}")?;
        }
        Ok(())
    }
}

/// Dump a frame at trace level, 16 bytes per line.
///
/// Nothing is formatted unless trace output is enabled.
pub(crate) fn log_frame<L: Log + ?Sized>(logger: &L, prefix: &str, frame: &[u8]) {
    let metadata = Metadata::builder()
        .level(Level::Trace)
        .target(TARGET)
        .build();
    if !logger.enabled(&metadata) {
        return;
    }
    let mut prefix = prefix;
    for start in (0..frame.len()).step_by(BYTES_PER_LINE) {
        let line = HexLine {
            frame,
            start,
            end: (start + BYTES_PER_LINE).min(frame.len()),
        };
        emit!(logger, Level::Trace, "{prefix}{line}");
        prefix = "  ";
    }
}

/// Forwards to the logger installed with the `log` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalLogger;

impl Log for GlobalLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level() && log::logger().enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            log::logger().log(record);
        }
    }

    fn flush(&self) {
        log::logger().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::{format, string::String, vec::Vec};
    use log::LevelFilter;
    use std::sync::Mutex;

    struct Lines {
        max_level: LevelFilter,
        lines: Mutex<Vec<(Level, String)>>,
    }

    impl Lines {
        fn new(max_level: LevelFilter) -> Self {
            Self {
                max_level,
                lines: Mutex::default(),
            }
        }

        fn take(&self) -> Vec<(Level, String)> {
            core::mem::take(&mut *self.lines.lock().unwrap())
        }
    }

    impl Log for Lines {
        fn enabled(&self, metadata: &Metadata<'_>) -> bool {
            metadata.level() <= self.max_level
        }

        fn log(&self, record: &Record<'_>) {
            assert_eq!(record.target(), TARGET);
            self.lines
                .lock()
                .unwrap()
                .push((record.level(), format!("{}", record.args())));
        }

        fn flush(&self) {}
    }

    fn dump(prefix: &str, frame: &[u8]) -> Vec<String> {
        let logger = Lines::new(LevelFilter::Trace);
        log_frame(&logger, prefix, frame);
        logger.take().into_iter().map(|(_, line)| line).collect()
    }

    #[test]
    fn dump_response_frame() {
        assert_eq!(
            dump("<-", &[0x07, 0x04, 0x01, 0x56, 0x78, 0xFE, 0xB2]),
            ["<- 07 04'01 56 78'FE B2"]
        );
    }

    #[test]
    fn dump_short_frames() {
        assert!(dump("<-", &[]).is_empty());
        assert_eq!(dump("<-", &[0x07]), ["<- 07"]);
        assert_eq!(dump("<-", &[0x07, 0x04]), ["<-'07 04"]);
        assert_eq!(dump("->", &[0x02, 0x07, 0x41, 0x12]), ["-> 02 07'41 12"]);
    }

    #[test]
    fn dump_wraps_after_16_bytes() {
        let frame: Vec<u8> = (0..20).collect();
        assert_eq!(
            dump("->", &frame),
            [
                "-> 00 01'02 03 04 05 06 07 08 09 0A 0B 0C 0D 0E 0F",
                "   10 11'12 13"
            ]
        );
    }

    #[test]
    fn dump_is_skipped_without_trace() {
        let logger = Lines::new(LevelFilter::Debug);
        log_frame(&logger, "<-", &[0x07, 0x04, 0x01]);
        assert!(logger.take().is_empty());
    }

    #[test]
    fn emit_honours_level() {
        let logger = Lines::new(LevelFilter::Warn);
        emit!(logger, Level::Info, "device {}", 7);
        emit!(logger, Level::Warn, "device {}", 8);
        assert_eq!(logger.take(), [(Level::Warn, String::from("device 8"))]);
    }
}
