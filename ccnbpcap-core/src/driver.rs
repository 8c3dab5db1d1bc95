//! Per-buffer dispatch: split, select payload, frame, write

use crate::capture::CaptureWriter;
use crate::content::extract_content;
use crate::error::{Error, FailureKind};
use crate::frame::{encode_frame, FrameConfig};
use crate::scanner::{LocatedRecord, RecordIter};
use serde::{Deserialize, Serialize};
use std::io::Write;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Which bytes of a record become the frame payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadMode {
    /// The whole encoded record
    #[default]
    WholeRecord,
    /// Only the `Content` value of a ContentObject
    ContentOnly,
}

/// Settings fixed for a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Payload selection
    pub mode: PayloadMode,
    /// Addressing of every frame
    pub frame: FrameConfig,
}

/// Where the driver is in a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Looking for the record that starts at this offset
    Scanning(usize),
    /// A record was found and is being framed and written
    Emitting(LocatedRecord),
    /// Every record was written
    Done,
    /// Processing stopped
    Failed(FailureKind),
}

impl DriverState {
    /// Whether no further steps will happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, DriverState::Done | DriverState::Failed(_))
    }
}

/// What happened to one buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferStats {
    /// Buffer length
    pub total_len: usize,
    /// Records framed and written
    pub records: usize,
    /// Buffer bytes covered by those records
    pub bytes_consumed: usize,
    /// Frame bytes handed to the capture writer
    pub frame_bytes: usize,
}

/// Runs one buffer through the pipeline into a capture writer
pub struct Driver<'a, W: Write> {
    data: &'a [u8],
    config: DriverConfig,
    writer: &'a mut CaptureWriter<W>,
    records: RecordIter<'a>,
    state: DriverState,
    stats: BufferStats,
}

impl<'a, W: Write> Driver<'a, W> {
    /// Prepare to process `data`
    pub fn new(data: &'a [u8], config: DriverConfig, writer: &'a mut CaptureWriter<W>) -> Self {
        Self {
            data,
            config,
            writer,
            records: RecordIter::new(data),
            state: DriverState::Scanning(0),
            stats: BufferStats {
                total_len: data.len(),
                ..Default::default()
            },
        }
    }

    /// Current state
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Progress so far
    pub fn stats(&self) -> BufferStats {
        self.stats
    }

    /// Make one state transition
    ///
    /// Once the state is terminal this is a no-op.
    pub fn step(&mut self) -> Result<DriverState, Error> {
        let next = match self.state {
            DriverState::Done | DriverState::Failed(_) => return Ok(self.state),
            DriverState::Scanning(offset) => {
                debug_assert_eq!(offset, self.records.offset());
                match self.records.next() {
                    None => DriverState::Done,
                    Some(Ok(record)) => DriverState::Emitting(record),
                    Some(Err(e)) => return Err(self.fail(e)),
                }
            }
            DriverState::Emitting(record) => match self.emit(record) {
                Ok(()) => DriverState::Scanning(record.end()),
                Err(e) => return Err(self.fail(e)),
            },
        };
        self.state = next;
        Ok(next)
    }

    /// Step until the buffer is done or fails
    pub fn run(mut self) -> Result<BufferStats, Error> {
        while !self.state.is_terminal() {
            self.step()?;
        }

        #[cfg(feature = "logging")]
        debug!(
            "Buffer done: {} records, {} frame bytes from {} input bytes",
            self.stats.records, self.stats.frame_bytes, self.stats.total_len
        );

        Ok(self.stats)
    }

    fn fail(&mut self, e: Error) -> Error {
        #[cfg(feature = "logging")]
        warn!("Buffer failed ({}): {}", e.kind(), e);

        self.state = DriverState::Failed(e.kind());
        e
    }

    fn emit(&mut self, record: LocatedRecord) -> Result<(), Error> {
        let bytes = record.bytes(self.data);
        let payload = match self.config.mode {
            PayloadMode::WholeRecord => bytes,
            PayloadMode::ContentOnly => {
                let range = extract_content(bytes).map_err(|source| Error::ContentParse {
                    offset: record.offset,
                    source,
                })?;
                &bytes[range]
            }
        };

        let frame = encode_frame(payload, &self.config.frame)?;
        self.writer.write_frame(&frame)?;

        #[cfg(feature = "logging")]
        debug!(
            "Record at {} ({} bytes): wrote {} byte frame",
            record.offset,
            record.size,
            frame.len()
        );

        self.stats.records += 1;
        self.stats.bytes_consumed += record.size;
        self.stats.frame_bytes += frame.len();
        Ok(())
    }
}

/// Process one buffer into `writer`
pub fn process_buffer<W: Write>(
    data: &[u8],
    config: &DriverConfig,
    writer: &mut CaptureWriter<W>,
) -> Result<BufferStats, Error> {
    Driver::new(data, *config, writer).run()
}
