//! Running a parse on a background thread.

use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use super::{CancellationToken, ParseOutcome, ProgressSink, TraceParser};
use crate::error::TraceError;

/// A parse running on its own thread.
///
/// The caller keeps its thread free to watch progress or to cancel, then
/// collects the outcome with [`ParseTask::join`].
pub struct ParseTask {
    handle: JoinHandle<Result<ParseOutcome, TraceError>>,
    cancel: CancellationToken,
}

impl ParseTask {
    pub fn spawn<P>(
        parser: TraceParser,
        path: impl Into<PathBuf>,
        mut progress: P,
    ) -> Result<Self, TraceError>
    where
        P: ProgressSink + Send + 'static,
    {
        let path = path.into();
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();

        let handle = thread::Builder::new()
            .name("gltrace-parse".to_string())
            .spawn(move || parser.parse(&path, &mut progress, &worker_cancel))
            .map_err(TraceError::Spawn)?;

        Ok(Self { handle, cancel })
    }

    /// Token that cancels this task; can be handed to a signal handler.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the parse to end.
    pub fn join(self) -> Result<ParseOutcome, TraceError> {
        self.handle.join().map_err(|_| TraceError::WorkerPanicked)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::NoProgress;
    use crate::protos::gltrace::Function;
    use crate::record::Record;
    use crate::state::{StateDelta, StateTransformer};
    use crate::test_utils::{message, write_trace};
    use tempfile::TempDir;

    struct Panics;

    impl StateTransformer for Panics {
        fn transforms_for(&self, _record: &Record) -> Vec<StateDelta> {
            panic!("state transformer exploded");
        }
    }

    #[test]
    fn test_background_parse_completes() {
        let dir = TempDir::new().unwrap();
        let path = write_trace(
            dir.path(),
            "task.gltrace",
            &[
                message(Function::glClear, 0, 0),
                message(Function::eglSwapBuffers, 0, 5),
            ],
        );

        let task = ParseTask::spawn(TraceParser::new(), path.clone(), NoProgress).unwrap();
        let trace = task.join().unwrap().into_trace().unwrap();
        assert_eq!(trace.calls().len(), 2);
        assert_eq!(trace.frames().len(), 1);
    }

    #[test]
    fn test_worker_panic_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = write_trace(
            dir.path(),
            "panic.gltrace",
            &[message(Function::glClear, 0, 0)],
        );

        let parser = TraceParser::new().with_state_transformer(Panics);
        let task = ParseTask::spawn(parser, path.clone(), NoProgress).unwrap();
        assert!(matches!(task.join(), Err(TraceError::WorkerPanicked)));
    }
}
