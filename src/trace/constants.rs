//! Shared constants for trace reading.

/// Upper bound on a single record's declared length.
///
/// A corrupt length prefix would otherwise drive a huge allocation before the
/// short read is noticed.
pub const DEFAULT_MAX_RECORD_LEN: u64 = 256 * 1024 * 1024;

/// Initial capacity of the reader's record buffer.
pub const RECORD_BUFFER_CAPACITY: usize = 64 * 1024;

/// Default bounding box for framebuffer thumbnails.
pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 256;
pub const DEFAULT_THUMBNAIL_HEIGHT: u32 = 256;

/// Task name reported to progress sinks.
pub const PARSE_TASK_NAME: &str = "Parsing GL trace file";
