//! Chainable streaming stages.
//!
//! Every transformation in this crate (compression, decompression,
//! checksumming, length accounting, encryption) is built from the same
//! primitive: a [`Stage`] that receives chunks, may transform, hold, or
//! emit them, and is composed into a linear [`Pipeline`].
//!
//! Execution is single-threaded, cooperative, and push-driven: the owner
//! calls [`Pipeline::push`] as chunks become available and
//! [`Pipeline::finish`] when no more input is coming. There is no blocking
//! wait inside the core; scheduling is the surrounding driver's concern.
//!
//! Chains are built bottom-up before any data flows. [`Pipeline::pipe`]
//! takes ownership of each stage, so a stage that has been piped cannot be
//! attached to a second chain.
//!
//! # Example
//!
//! ```rust
//! use zipstream::stream::{DataLengthProbe, Pipeline};
//!
//! let mut chain = Pipeline::new().pipe(Box::new(DataLengthProbe::new("data_length")));
//! chain.push(b"hello ").unwrap();
//! chain.push(b"world").unwrap();
//! chain.finish().unwrap();
//! assert_eq!(chain.drain(), b"hello world");
//! assert_eq!(chain.info().u64("data_length"), Some(11));
//! ```

mod decrypt;
mod encrypt;
mod probe;

pub use decrypt::{DecryptOptions, DecryptStage};
pub use encrypt::{EncryptOptions, EncryptStage};
pub use probe::{Crc32Probe, DataLengthProbe};

use std::collections::VecDeque;

use crate::{Error, Result};

/// A metadata value attached to a stream.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    /// A 32-bit value (checksums).
    U32(u32),
    /// A 64-bit value (sizes, counts).
    U64(u64),
    /// A string value (codec names and the like).
    Str(String),
}

impl MetaValue {
    /// Returns the value as a `u32`, if it is one.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::U32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value widened to a `u64`, if numeric.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::U32(v) => Some(*v as u64),
            Self::U64(v) => Some(*v),
            Self::Str(_) => None,
        }
    }

    /// Returns the value as a string slice, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Ordered metadata accumulated along a chain.
///
/// Values set by an upstream stage are visible to every downstream stage at
/// or after the point of writing; propagation is forward only. Insertion
/// order is preserved; setting an existing key overwrites in place.
#[derive(Debug, Clone, Default)]
pub struct StreamInfo {
    entries: Vec<(String, MetaValue)>,
}

impl StreamInfo {
    /// Creates an empty metadata map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, overwriting any previous value in place.
    pub fn set(&mut self, key: &str, value: MetaValue) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key.to_string(), value));
        }
    }

    /// Returns the value for `key`, if set.
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Returns the value for `key` widened to a `u64`.
    pub fn u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(MetaValue::as_u64)
    }

    /// Returns the value for `key` as a `u32`.
    pub fn u32(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(MetaValue::as_u32)
    }

    /// Returns the value for `key` as a string slice.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(MetaValue::as_str)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no metadata has been set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lifecycle state of a [`Pipeline`].
///
/// A finished or errored pipeline accepts no further chunks. There is no
/// "attached" state: piping moves the stage, so reuse is a compile error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Constructed, no data pushed yet.
    Idle,
    /// Data has flowed and more is accepted.
    Running,
    /// Suspended; pushed chunks queue without loss until resume.
    Paused,
    /// End of stream processed; terminal.
    Finished,
    /// A stage raised an error; terminal.
    Errored,
}

/// One link in a streaming transformation chain.
///
/// A stage receives input chunks through [`process`](Self::process) and may
/// append zero or more output bytes per call; a stage that buffers (the
/// encrypt adapter, a compressor) emits its held output in
/// [`finish`](Self::finish). Errors returned from either method are
/// terminal for the whole chain.
pub trait Stage {
    /// Debug identity of this stage.
    fn name(&self) -> &'static str;

    /// Processes one input chunk, appending any output to `out`.
    fn process(&mut self, input: &[u8], info: &mut StreamInfo, out: &mut Vec<u8>) -> Result<()>;

    /// Signals that no more input is coming; emits any buffered output and
    /// final metadata.
    fn finish(&mut self, info: &mut StreamInfo, out: &mut Vec<u8>) -> Result<()> {
        let _ = (info, out);
        Ok(())
    }
}

/// Hook run when a pipeline finishes, after all stages have flushed.
type EndHook = Box<dyn FnMut(&StreamInfo) -> Result<()>>;

/// An owned, linear chain of stages.
///
/// Built fluently bottom-up with [`pipe`](Self::pipe); chunks pushed into
/// the head flow through every stage in order, and bytes emitted by the
/// tail accumulate until taken with [`drain`](Self::drain). Chains are
/// strictly linear: no branching or merging.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    info: StreamInfo,
    state: State,
    pending: VecDeque<Vec<u8>>,
    output: Vec<u8>,
    end_hooks: Vec<EndHook>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name())
            .field("state", &self.state)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Creates an empty pipeline (pass-through until stages are piped).
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            info: StreamInfo::new(),
            state: State::Idle,
            pending: VecDeque::new(),
            output: Vec::new(),
            end_hooks: Vec::new(),
        }
    }

    /// Attaches `stage` downstream of everything piped so far.
    ///
    /// Takes ownership: a piped stage belongs to this chain and cannot be
    /// attached elsewhere. Returns the chain for fluent construction.
    pub fn pipe(mut self, stage: Box<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Pre-sets a metadata value, visible to all stages and future pushes.
    pub fn with_info(mut self, key: &str, value: MetaValue) -> Self {
        self.info.set(key, value);
        self
    }

    /// Registers a hook to run once all stages have flushed at finish.
    pub fn on_end<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&StreamInfo) -> Result<()> + 'static,
    {
        self.end_hooks.push(Box::new(hook));
        self
    }

    /// Debug identity: the piped stage names joined in chain order.
    pub fn name(&self) -> String {
        if self.stages.is_empty() {
            return "source".to_string();
        }
        let names: Vec<&str> = self.stages.iter().map(|s| s.name()).collect();
        names.join(" -> ")
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.state
    }

    /// The chain's accumulated metadata.
    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    /// Delivers one chunk into the head of the chain.
    ///
    /// While paused, chunks queue in order without loss. Once finished or
    /// errored, pushes are rejected with [`Error::PipelineClosed`].
    pub fn push(&mut self, chunk: &[u8]) -> Result<()> {
        match self.state {
            State::Finished | State::Errored => {
                return Err(Error::PipelineClosed { state: self.state });
            }
            State::Paused => {
                self.pending.push_back(chunk.to_vec());
                return Ok(());
            }
            State::Idle | State::Running => {}
        }
        self.state = State::Running;
        self.dispatch_from(0, chunk.to_vec())
    }

    /// Suspends forwarding. Buffered stage state is untouched; chunks
    /// pushed while paused are queued.
    pub fn pause(&mut self) {
        if matches!(self.state, State::Idle | State::Running) {
            self.state = State::Paused;
        }
    }

    /// Resumes a paused pipeline, replaying queued chunks in order.
    pub fn resume(&mut self) -> Result<()> {
        if self.state != State::Paused {
            return Ok(());
        }
        self.state = State::Running;
        while let Some(chunk) = self.pending.pop_front() {
            self.dispatch_from(0, chunk)?;
        }
        Ok(())
    }

    /// Signals end of input: flushes every stage in chain order, cascading
    /// emitted bytes downstream, then runs end hooks.
    ///
    /// A paused pipeline is implicitly resumed first so no queued chunk is
    /// lost. Finishing twice is a no-op; finishing an errored pipeline is
    /// rejected.
    pub fn finish(&mut self) -> Result<()> {
        match self.state {
            State::Finished => return Ok(()),
            State::Errored => {
                return Err(Error::PipelineClosed { state: self.state });
            }
            _ => {}
        }
        if self.state == State::Paused {
            self.state = State::Running;
        }
        while let Some(chunk) = self.pending.pop_front() {
            self.dispatch_from(0, chunk)?;
        }

        for i in 0..self.stages.len() {
            let mut out = Vec::new();
            if let Err(e) = self.stages[i].finish(&mut self.info, &mut out) {
                self.state = State::Errored;
                return Err(e);
            }
            if !out.is_empty() {
                self.dispatch_from(i + 1, out)?;
            }
        }

        let mut hooks = std::mem::take(&mut self.end_hooks);
        for hook in &mut hooks {
            if let Err(e) = hook(&self.info) {
                self.state = State::Errored;
                return Err(e);
            }
        }

        self.state = State::Finished;
        Ok(())
    }

    /// Marks the chain as terminally failed.
    ///
    /// Cancellation is modeled as the error path: an aborted pipeline is
    /// indistinguishable from one that failed, and accepts no more input.
    pub fn abort(&mut self) {
        self.state = State::Errored;
        self.pending.clear();
    }

    /// Takes the bytes emitted by the tail of the chain since the last
    /// drain. May be called repeatedly while streaming.
    pub fn drain(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    /// Pushes `data` in [`crate::DEFAULT_CHUNK_SIZE`] chunks, finishes, and
    /// returns the full output.
    pub fn run(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        for chunk in data.chunks(crate::DEFAULT_CHUNK_SIZE) {
            self.push(chunk)?;
        }
        self.finish()?;
        Ok(self.drain())
    }

    fn dispatch_from(&mut self, start: usize, chunk: Vec<u8>) -> Result<()> {
        let mut current = chunk;
        for i in start..self.stages.len() {
            let mut out = Vec::new();
            if let Err(e) = self.stages[i].process(&current, &mut self.info, &mut out) {
                self.state = State::Errored;
                return Err(e);
            }
            if out.is_empty() {
                // Stage held everything; nothing to forward yet.
                return Ok(());
            }
            current = out;
        }
        self.output.extend_from_slice(&current);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Doubles every byte; used to observe stage ordering.
    struct Doubler;

    impl Stage for Doubler {
        fn name(&self) -> &'static str {
            "Doubler"
        }

        fn process(
            &mut self,
            input: &[u8],
            _info: &mut StreamInfo,
            out: &mut Vec<u8>,
        ) -> Result<()> {
            for &b in input {
                out.push(b);
                out.push(b);
            }
            Ok(())
        }
    }

    /// Holds everything until finish.
    struct Holder {
        buffer: Vec<u8>,
    }

    impl Stage for Holder {
        fn name(&self) -> &'static str {
            "Holder"
        }

        fn process(
            &mut self,
            input: &[u8],
            _info: &mut StreamInfo,
            _out: &mut Vec<u8>,
        ) -> Result<()> {
            self.buffer.extend_from_slice(input);
            Ok(())
        }

        fn finish(&mut self, _info: &mut StreamInfo, out: &mut Vec<u8>) -> Result<()> {
            out.append(&mut self.buffer);
            Ok(())
        }
    }

    /// Fails on the first processed byte.
    struct Failing;

    impl Stage for Failing {
        fn name(&self) -> &'static str {
            "Failing"
        }

        fn process(
            &mut self,
            _input: &[u8],
            _info: &mut StreamInfo,
            _out: &mut Vec<u8>,
        ) -> Result<()> {
            Err(Error::Codec("boom".into()))
        }
    }

    #[test]
    fn test_empty_pipeline_passes_through() {
        let mut p = Pipeline::new();
        p.push(b"abc").unwrap();
        p.finish().unwrap();
        assert_eq!(p.drain(), b"abc");
        assert_eq!(p.state(), State::Finished);
    }

    #[test]
    fn test_stage_ordering() {
        let mut p = Pipeline::new()
            .pipe(Box::new(Doubler))
            .pipe(Box::new(Doubler));
        p.push(b"a").unwrap();
        p.finish().unwrap();
        assert_eq!(p.drain(), b"aaaa");
    }

    #[test]
    fn test_holding_stage_emits_at_finish() {
        let mut p = Pipeline::new()
            .pipe(Box::new(Holder { buffer: Vec::new() }))
            .pipe(Box::new(Doubler));
        p.push(b"ab").unwrap();
        assert!(p.drain().is_empty());
        p.finish().unwrap();
        assert_eq!(p.drain(), b"aabb");
    }

    #[test]
    fn test_push_after_finish_rejected() {
        let mut p = Pipeline::new();
        p.finish().unwrap();
        let err = p.push(b"late").unwrap_err();
        assert!(matches!(
            err,
            Error::PipelineClosed {
                state: State::Finished
            }
        ));
    }

    #[test]
    fn test_error_is_terminal() {
        let mut p = Pipeline::new().pipe(Box::new(Failing));
        assert!(p.push(b"x").is_err());
        assert_eq!(p.state(), State::Errored);
        assert!(matches!(
            p.push(b"y"),
            Err(Error::PipelineClosed {
                state: State::Errored
            })
        ));
        assert!(p.finish().is_err());
    }

    #[test]
    fn test_abort_is_terminal() {
        let mut p = Pipeline::new();
        p.push(b"x").unwrap();
        p.abort();
        assert_eq!(p.state(), State::Errored);
        assert!(p.push(b"y").is_err());
    }

    #[test]
    fn test_pause_queues_and_resume_replays_in_order() {
        let mut p = Pipeline::new().pipe(Box::new(Doubler));
        p.push(b"a").unwrap();
        p.pause();
        assert_eq!(p.state(), State::Paused);
        p.push(b"b").unwrap();
        p.push(b"c").unwrap();
        assert_eq!(p.drain(), b"aa");
        p.resume().unwrap();
        assert_eq!(p.drain(), b"bbcc");
        p.finish().unwrap();
    }

    #[test]
    fn test_finish_while_paused_replays_pending() {
        let mut p = Pipeline::new();
        p.pause();
        p.push(b"queued").unwrap();
        p.finish().unwrap();
        assert_eq!(p.drain(), b"queued");
    }

    #[test]
    fn test_with_info_visible_to_stages() {
        let mut p = Pipeline::new().with_info("compression", MetaValue::Str("STORE".into()));
        p.finish().unwrap();
        assert_eq!(p.info().str("compression"), Some("STORE"));
    }

    #[test]
    fn test_stream_info_overwrites_in_place() {
        let mut info = StreamInfo::new();
        info.set("a", MetaValue::U32(1));
        info.set("b", MetaValue::U32(2));
        info.set("a", MetaValue::U32(3));
        assert_eq!(info.u32("a"), Some(3));
        let keys: Vec<&str> = info.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn test_end_hook_error_marks_pipeline() {
        let mut p = Pipeline::new().on_end(|_| {
            Err(Error::SizeMismatch {
                expected: 1,
                actual: 2,
            })
        });
        assert!(p.finish().is_err());
        assert_eq!(p.state(), State::Errored);
    }

    #[test]
    fn test_name_joins_stage_names() {
        let p = Pipeline::new()
            .pipe(Box::new(Doubler))
            .pipe(Box::new(Holder { buffer: Vec::new() }));
        assert_eq!(p.name(), "Doubler -> Holder");
        assert_eq!(Pipeline::new().name(), "source");
    }

    #[test]
    fn test_finish_twice_is_noop() {
        let mut p = Pipeline::new();
        p.push(b"x").unwrap();
        p.finish().unwrap();
        p.finish().unwrap();
        assert_eq!(p.drain(), b"x");
    }

    #[test]
    fn test_meta_value_accessors() {
        assert_eq!(MetaValue::U32(7).as_u64(), Some(7));
        assert_eq!(MetaValue::U64(7).as_u32(), None);
        assert_eq!(MetaValue::Str("x".into()).as_str(), Some("x"));
        assert_eq!(MetaValue::Str("x".into()).as_u64(), None);
    }
}
