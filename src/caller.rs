//! Caller resolution via stack introspection
//!
//! This module captures the current thread's call stack with the `backtrace`
//! crate and resolves the call site that invoked the public logging API.
//!
//! Two strategies are supported:
//! - Fixed-depth offset: index into the captured stack at a configured depth.
//!   This matches the historical contract but is brittle across calling
//!   conventions, so the offset is configuration rather than a constant.
//! - First-external scan: walk the captured stack and report the first frame
//!   that lies outside this component's own modules.

use std::fmt;
use std::path::PathBuf;

use backtrace::Backtrace;

/// Sentinel reported when the caller cannot be resolved
pub const MSG_NOT_FOUND: &str = "<Not Found>";

/// Default fixed-depth offset: capture, resolve, trace_log, then the caller
pub const DEFAULT_STACK_DEPTH: usize = 3;

/// Maximum number of frames retained from a capture (prevent unbounded walks)
const MAX_CAPTURE_DEPTH: usize = 64;

/// Module paths considered part of the resolver itself; the first-external
/// scan never reports frames from these.
const INTERNAL_MODULES: [&str; 2] = ["calltrace::caller", "calltrace::logger"];

/// Runtime namespaces skipped by the first-external scan
const RUNTIME_PREFIXES: [&str; 4] = ["std::", "core::", "alloc::", "backtrace::"];

/// A resolved call site: symbol name plus source location when available
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerDescriptor {
    /// Demangled symbol name, hash suffix stripped
    pub symbol: String,
    /// Source file, when debug info is available
    pub file: Option<PathBuf>,
    /// Source line, when debug info is available
    pub line: Option<u32>,
}

impl fmt::Display for CallerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => {
                write!(f, "{} ({}:{})", self.symbol, file.display(), line)
            }
            (Some(file), None) => write!(f, "{} ({})", self.symbol, file.display()),
            _ => write!(f, "{}", self.symbol),
        }
    }
}

/// How the caller's frame is selected from the captured stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStrategy {
    /// Index into the captured stack at a fixed depth
    FixedDepth(usize),
    /// Report the first frame outside this component's modules
    FirstExternal,
}

impl Default for ResolveStrategy {
    fn default() -> Self {
        Self::FirstExternal
    }
}

/// Resolve the call site that invoked the public API
///
/// Returns `None` when the selected frame does not exist (stack shorter than
/// the fixed offset, or no external frame found). Callers substitute
/// [`MSG_NOT_FOUND`] rather than surfacing an error.
#[inline(never)]
pub fn resolve(strategy: ResolveStrategy) -> Option<CallerDescriptor> {
    let frames = capture_frames();
    match strategy {
        ResolveStrategy::FixedDepth(depth) => select_fixed(&frames, depth).cloned(),
        ResolveStrategy::FirstExternal => select_first_external(&frames).cloned(),
    }
}

/// Capture the current thread's stack as resolved symbol frames
///
/// Frames belonging to the `backtrace` crate itself are dropped, so index 0
/// is this function. Frames with no resolvable symbol name are skipped.
#[inline(never)]
fn capture_frames() -> Vec<CallerDescriptor> {
    let bt = Backtrace::new();
    let mut frames = Vec::with_capacity(16);

    for frame in bt.frames() {
        for symbol in frame.symbols() {
            let name = match symbol.name() {
                Some(name) => name.to_string(),
                None => continue,
            };
            if name.starts_with("backtrace::") {
                continue;
            }
            frames.push(CallerDescriptor {
                symbol: strip_symbol_hash(&name).to_string(),
                file: symbol.filename().map(PathBuf::from),
                line: symbol.lineno(),
            });
            if frames.len() == MAX_CAPTURE_DEPTH {
                return frames;
            }
        }
    }

    frames
}

/// Select the frame at a fixed depth; out-of-range yields `None`, never a panic
fn select_fixed(frames: &[CallerDescriptor], depth: usize) -> Option<&CallerDescriptor> {
    frames.get(depth)
}

/// Select the first frame outside the resolver's own modules
fn select_first_external(frames: &[CallerDescriptor]) -> Option<&CallerDescriptor> {
    frames.iter().find(|frame| !is_internal(&frame.symbol))
}

/// Whether a symbol belongs to the resolver machinery or the runtime
fn is_internal(symbol: &str) -> bool {
    INTERNAL_MODULES
        .iter()
        .any(|module| symbol.contains(module))
        || RUNTIME_PREFIXES
            .iter()
            .any(|prefix| symbol.starts_with(prefix))
}

/// Strip the trailing `::h<16 hex>` disambiguator rustc appends to symbols
fn strip_symbol_hash(symbol: &str) -> &str {
    if let Some((head, tail)) = symbol.rsplit_once("::") {
        let is_hash = tail.len() == 17
            && tail.starts_with('h')
            && tail[1..].bytes().all(|b| b.is_ascii_hexdigit());
        if is_hash {
            return head;
        }
    }
    symbol
}
