//! Sequential reader for length-framed trace records.
//!
//! A trace file has no global header. It is a plain sequence of frames, each a
//! 4-byte big-endian body length followed by the body bytes, which are handed
//! to a [`RecordDecoder`]. End of file exactly at a frame boundary is the
//! normal end of the stream; end of file anywhere else is a truncated record.

use std::io::{self, Read, Seek, SeekFrom};

use super::{Record, RecordDecoder};
use crate::error::{DecodeError, TraceError};
use crate::trace::constants::{DEFAULT_MAX_RECORD_LEN, RECORD_BUFFER_CAPACITY};

const LENGTH_PREFIX_LEN: u64 = 4;

/// Result of reading at a record boundary.
#[derive(Debug)]
pub enum ReadOutcome {
    Record { record: Record, next_offset: u64 },
    EndOfStream,
}

/// Decodes one framed record at a time from a byte source.
///
/// The reader keeps no position of its own: the caller passes the offset the
/// source is currently at and continues from the returned `next_offset`.
pub struct RecordReader<'a> {
    decoder: &'a dyn RecordDecoder,
    buffer: Vec<u8>,
    max_record_len: u64,
}

impl<'a> RecordReader<'a> {
    pub fn new(decoder: &'a dyn RecordDecoder) -> Self {
        Self {
            decoder,
            buffer: Vec::with_capacity(RECORD_BUFFER_CAPACITY),
            max_record_len: DEFAULT_MAX_RECORD_LEN,
        }
    }

    /// Reject records whose declared length exceeds `max` bytes.
    pub fn with_max_record_len(mut self, max: u64) -> Self {
        self.max_record_len = max;
        self
    }

    /// Read the record starting at `offset`, which must be the current
    /// position of `source`.
    ///
    /// After an error the position of `source` is unspecified.
    pub fn read_next<R: Read>(
        &mut self,
        source: &mut R,
        offset: u64,
    ) -> Result<ReadOutcome, TraceError> {
        let mut prefix = [0u8; LENGTH_PREFIX_LEN as usize];
        let filled = read_fully(source, &mut prefix).map_err(|source| TraceError::Io {
            offset,
            source,
        })?;
        match filled {
            0 => return Ok(ReadOutcome::EndOfStream),
            n if (n as u64) < LENGTH_PREFIX_LEN => {
                return Err(decode_error(
                    offset,
                    DecodeError::Truncated {
                        expected: LENGTH_PREFIX_LEN,
                        available: n as u64,
                    },
                ));
            }
            _ => {}
        }

        let len = u32::from_be_bytes(prefix) as u64;
        if len > self.max_record_len {
            return Err(decode_error(
                offset,
                DecodeError::Oversized {
                    len,
                    max: self.max_record_len,
                },
            ));
        }

        self.buffer.clear();
        self.buffer.resize(len as usize, 0);
        let filled = read_fully(source, &mut self.buffer).map_err(|source| TraceError::Io {
            offset,
            source,
        })?;
        if (filled as u64) < len {
            return Err(decode_error(
                offset,
                DecodeError::Truncated {
                    expected: len,
                    available: filled as u64,
                },
            ));
        }

        let record = self
            .decoder
            .decode(&self.buffer)
            .map_err(|source| decode_error(offset, source))?;

        Ok(ReadOutcome::Record {
            record,
            next_offset: offset + LENGTH_PREFIX_LEN + len,
        })
    }

    /// Seek to `offset` and read the record there.
    ///
    /// Used to re-fetch a call's full record after the initial pass.
    pub fn read_at<R: Read + Seek>(
        &mut self,
        source: &mut R,
        offset: u64,
    ) -> Result<ReadOutcome, TraceError> {
        source
            .seek(SeekFrom::Start(offset))
            .map_err(|source| TraceError::Io { offset, source })?;
        self.read_next(source, offset)
    }
}

fn decode_error(offset: u64, source: DecodeError) -> TraceError {
    TraceError::Decode { offset, source }
}

/// Fill `buf` from `reader`, stopping early only at end of file.
///
/// Returns the number of bytes read, which is less than `buf.len()` only if
/// the reader ran out of data.
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
