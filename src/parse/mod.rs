//! Parsing a trace file into a [`Trace`].
//!
//! [`TraceParser`] makes a single sequential pass over the file. Each record is
//! decoded, enriched by the configured collaborators (state deltas, display
//! text, thumbnail) and accumulated. At end of file the calls are normalized
//! to start at time 0, put in global time order when more than one GL context
//! was active, reindexed and split into frames.
//!
//! A pass ends in exactly one of three ways: a complete [`Trace`],
//! [`ParseOutcome::Cancelled`], or a [`TraceError`]. Nothing partial is ever
//! returned.
//!
//! # Example
//!
//! ```no_run
//! use gltrace::{CancellationToken, NoProgress, ParseOutcome, TraceParser};
//! use std::path::Path;
//!
//! let parser = TraceParser::new();
//! let outcome = parser
//!     .parse(Path::new("capture.gltrace"), &mut NoProgress, &CancellationToken::new())
//!     .expect("Failed to parse trace");
//! if let ParseOutcome::Complete(trace) = outcome {
//!     println!("{} calls in {} frames", trace.calls().len(), trace.frames().len());
//! }
//! ```

mod builder;
mod frames;
pub mod progress;
pub mod task;

pub use progress::{CancellationToken, NoProgress, ProgressSink, SpinnerProgress};
pub use task::ParseTask;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::TraceError;
use crate::format::{fallback_display_text, CallFormatter, GlCallFormatter};
use crate::record::{ProtoRecordDecoder, ReadOutcome, Record, RecordDecoder, RecordReader};
use crate::state::{GlStateTransforms, StateTransformer};
use crate::thumbnail::ThumbnailScaler;
use crate::trace::constants::{
    DEFAULT_MAX_RECORD_LEN, DEFAULT_THUMBNAIL_HEIGHT, DEFAULT_THUMBNAIL_WIDTH, PARSE_TASK_NAME,
};
use crate::trace::{Call, Trace, TraceFileInfo};
use builder::TraceBuilder;
use progress::ProgressGuard;

const READ_BUFFER_CAPACITY: usize = 256 * 1024;

/// Tunables for a parse pass.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Bounding box for thumbnails, when a thumbnail scaler is configured.
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,

    /// Largest record body accepted before the file is treated as corrupt.
    pub max_record_len: u64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            thumbnail_width: DEFAULT_THUMBNAIL_WIDTH,
            thumbnail_height: DEFAULT_THUMBNAIL_HEIGHT,
            max_record_len: DEFAULT_MAX_RECORD_LEN,
        }
    }
}

/// How a parse pass that did not fail ended.
#[derive(Debug)]
pub enum ParseOutcome {
    Complete(Trace),
    Cancelled,
}

impl ParseOutcome {
    pub fn into_trace(self) -> Option<Trace> {
        match self {
            ParseOutcome::Complete(trace) => Some(trace),
            ParseOutcome::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ParseOutcome::Cancelled)
    }
}

/// Builds [`Trace`]s from trace files.
///
/// Collaborators default to the protobuf decoder, [`GlStateTransforms`] and
/// [`GlCallFormatter`]. Thumbnails are only produced once a scaler is set with
/// [`TraceParser::with_thumbnails`].
pub struct TraceParser {
    config: ParserConfig,
    decoder: Box<dyn RecordDecoder + Send + Sync>,
    state: Box<dyn StateTransformer + Send + Sync>,
    formatter: Box<dyn CallFormatter + Send + Sync>,
    thumbnails: Option<Box<dyn ThumbnailScaler + Send + Sync>>,
}

impl Default for TraceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceParser {
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
            decoder: Box::new(ProtoRecordDecoder),
            state: Box::new(GlStateTransforms),
            formatter: Box::new(GlCallFormatter),
            thumbnails: None,
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_decoder(mut self, decoder: impl RecordDecoder + Send + Sync + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    pub fn with_state_transformer(
        mut self,
        state: impl StateTransformer + Send + Sync + 'static,
    ) -> Self {
        self.state = Box::new(state);
        self
    }

    pub fn with_formatter(mut self, formatter: impl CallFormatter + Send + Sync + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    pub fn with_thumbnails(mut self, scaler: impl ThumbnailScaler + Send + Sync + 'static) -> Self {
        self.thumbnails = Some(Box::new(scaler));
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// The decoder used by this parser, for re-reading records with
    /// [`Trace::load_record`].
    pub fn decoder(&self) -> &dyn RecordDecoder {
        &*self.decoder
    }

    /// Parse the whole file at `path`.
    ///
    /// `cancel` is polled after every record; once set, the pass stops and
    /// returns [`ParseOutcome::Cancelled`].
    pub fn parse(
        &self,
        path: &Path,
        progress: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ParseOutcome, TraceError> {
        let mut progress = ProgressGuard::begin(progress, PARSE_TASK_NAME);

        let file = File::open(path).map_err(|source| TraceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut source = BufReader::with_capacity(READ_BUFFER_CAPACITY, file);
        let mut reader =
            RecordReader::new(&*self.decoder).with_max_record_len(self.config.max_record_len);

        debug!(path = %path.display(), "parsing trace file");

        let mut builder = TraceBuilder::new();
        let mut offset = 0u64;
        loop {
            let (record, next_offset) = match reader.read_next(&mut source, offset)? {
                ReadOutcome::Record {
                    record,
                    next_offset,
                } => (record, next_offset),
                ReadOutcome::EndOfStream => break,
            };

            let call = self.build_call(builder.len(), offset, &record);
            let deltas = self.state.transforms_for(&record);
            builder.push(call, deltas);
            offset = next_offset;
            progress.pulse(builder.len() as u64, offset);

            if cancel.is_cancelled() {
                info!(records = builder.len(), offset, "trace parse cancelled");
                return Ok(ParseOutcome::Cancelled);
            }
        }
        drop(source);

        if builder.needs_reorder() {
            debug!("multiple GL contexts present, ordering calls by start time");
        }

        let metadata = std::fs::metadata(path).map_err(|source| TraceError::Metadata {
            path: path.to_path_buf(),
            source,
        })?;
        let info = TraceFileInfo {
            path: path.to_path_buf(),
            size: metadata.len(),
            modified: metadata.modified().ok(),
        };

        let trace = builder.finish(info);
        info!(
            calls = trace.calls().len(),
            frames = trace.frames().len(),
            contexts = trace.context_ids().len(),
            "parsed trace {}",
            path.display()
        );
        Ok(ParseOutcome::Complete(trace))
    }

    fn build_call(&self, index: usize, offset: u64, record: &Record) -> Call {
        let display_text = match self.formatter.format(record) {
            Ok(text) => text,
            Err(e) => {
                debug!(offset, "formatting {} failed: {e:#}", record.function);
                fallback_display_text(record.function)
            }
        };

        let thumbnail = match (&self.thumbnails, &record.framebuffer) {
            (Some(scaler), Some(fb)) => {
                match scaler.scale(fb, self.config.thumbnail_width, self.config.thumbnail_height) {
                    Ok(image) => Some(image),
                    Err(e) => {
                        warn!(offset, "failed to create thumbnail: {e:#}");
                        None
                    }
                }
            }
            _ => None,
        };

        Call {
            index,
            start_time: record.start_time,
            trace_offset: offset,
            function: record.function,
            duration: record.duration,
            context_id: record.context_id,
            has_framebuffer: record.has_framebuffer,
            display_text,
            thumbnail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protos::gltrace::Function;
    use crate::test_utils::{message, write_trace};
    use anyhow::bail;
    use tempfile::TempDir;

    struct FailingFormatter;

    impl CallFormatter for FailingFormatter {
        fn format(&self, _record: &Record) -> anyhow::Result<String> {
            bail!("formatter unavailable")
        }
    }

    /// Cancels its token as soon as it sees the first pulse.
    struct CancelOnPulse(CancellationToken, u32);

    impl ProgressSink for CancelOnPulse {
        fn begin(&mut self, _task: &str) {}

        fn pulse(&mut self, _records: u64, _offset: u64) {
            self.0.cancel();
        }

        fn done(&mut self) {
            self.1 += 1;
        }
    }

    fn parse(parser: &TraceParser, path: &Path) -> Trace {
        parser
            .parse(path, &mut NoProgress, &CancellationToken::new())
            .expect("Failed to parse trace")
            .into_trace()
            .expect("Parse was cancelled")
    }

    #[test]
    fn test_trace_offsets_and_metadata() {
        let dir = TempDir::new().unwrap();
        let path = write_trace(
            dir.path(),
            "offsets.gltrace",
            &[
                message(Function::glClear, 0, 100),
                message(Function::eglSwapBuffers, 0, 150),
            ],
        );

        let trace = parse(&TraceParser::new(), &path);
        assert_eq!(trace.calls().len(), 2);
        assert_eq!(trace.calls()[0].trace_offset(), 0);
        assert!(trace.calls()[1].trace_offset() > 0);
        assert_eq!(trace.info().size, std::fs::metadata(&path).unwrap().len());
        assert_eq!(trace.path(), path.as_path());
        assert!(!trace.source_changed().unwrap());
    }

    #[test]
    fn test_format_failure_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = write_trace(
            dir.path(),
            "fallback.gltrace",
            &[message(Function::glFlush, 0, 0)],
        );

        let trace = parse(&TraceParser::new().with_formatter(FailingFormatter), &path);
        assert_eq!(trace.calls()[0].display_text(), "glFlush()");
    }

    #[test]
    fn test_cancel_after_first_record() {
        let dir = TempDir::new().unwrap();
        let messages: Vec<_> = (0..10).map(|i| message(Function::glClear, 0, i)).collect();
        let path = write_trace(dir.path(), "cancel.gltrace", &messages);

        let token = CancellationToken::new();
        let mut sink = CancelOnPulse(token.clone(), 0);
        let outcome = TraceParser::new().parse(&path, &mut sink, &token).unwrap();
        assert!(outcome.is_cancelled());
        assert_eq!(sink.1, 1);
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let dir = TempDir::new().unwrap();
        let err = TraceParser::new()
            .parse(
                &dir.path().join("missing.gltrace"),
                &mut NoProgress,
                &CancellationToken::new(),
            )
            .unwrap_err();
        assert!(matches!(err, TraceError::Open { .. }));
    }

    #[test]
    fn test_load_record_refetches_full_message() {
        let dir = TempDir::new().unwrap();
        let path = write_trace(
            dir.path(),
            "refetch.gltrace",
            &[
                message(Function::glClear, 0, 10),
                message(Function::glDrawArrays, 0, 20),
            ],
        );

        let parser = TraceParser::new();
        let trace = parse(&parser, &path);
        let call = trace.call(1).unwrap();
        let record = trace.load_record(call, parser.decoder()).unwrap();
        assert_eq!(record.function, call.function());
        assert_eq!(record.start_time, 20);
    }
}
