//! Call-site capture for error instances.
//!
//! A [`StackTrace`] is captured when an error is stamped. Frames belonging to
//! the capture machinery and to this crate's stamping entry points are
//! dropped, so the first frame is the code that created the error.
//!
//! Two process-wide settings in [`defaults`](crate::defaults) shape a capture:
//!
//! - [`StackTraceMode`] picks which parts of each frame are kept
//! - the package prefix, when non-empty, keeps only frames whose function path
//!   or file path contains it
//!
//! Each frame renders as `file:line (function)`, or the subset the mode kept.

use crate::defaults::{self, StackTraceMode};
use std::fmt;
use std::slice;

/// Leading frames with these symbol prefixes are capture internals.
const INTERNAL_FRAMES: &[&str] = &[
    "backtrace::",
    "stamped_errors::stack::StackTrace::capture",
    "stamped_errors::wrapper::WrappedError::stamp",
    "stamped_errors::definition::ErrorDefinition::new_error",
    "stamped_errors::convert::convert",
];

/// One call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StackFrame {
    file: Option<String>,
    line: Option<u32>,
    function: Option<String>,
}

impl StackFrame {
    /// Frame from its parts.
    pub fn new(file: Option<String>, line: Option<u32>, function: Option<String>) -> Self {
        Self {
            file,
            line,
            function,
        }
    }

    /// Source file, when resolved and kept.
    #[inline]
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Line number, when resolved and kept.
    #[inline]
    pub fn line(&self) -> Option<u32> {
        self.line
    }

    /// Demangled function path, when resolved and kept.
    #[inline]
    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    /// Keep only the parts `mode` asks for.
    pub fn project(self, mode: StackTraceMode) -> Self {
        match mode {
            StackTraceMode::Full => self,
            StackTraceMode::LineOnly => Self {
                function: None,
                ..self
            },
            StackTraceMode::FuncOnly => Self {
                file: None,
                line: None,
                ..self
            },
        }
    }

    /// Whether the function path or file path contains `prefix`.
    ///
    /// An empty prefix matches every frame.
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        prefix.is_empty()
            || self.function.as_deref().is_some_and(|f| f.contains(prefix))
            || self.file.as_deref().is_some_and(|f| f.contains(prefix))
    }

    fn is_internal(&self) -> bool {
        self.function
            .as_deref()
            .is_some_and(|f| INTERNAL_FRAMES.iter().any(|p| f.starts_with(p)))
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, &self.function) {
            (Some(file), function) => {
                f.write_str(file)?;
                if let Some(line) = self.line {
                    write!(f, ":{line}")?;
                }
                if let Some(function) = function {
                    write!(f, " ({function})")?;
                }
                Ok(())
            }
            (None, Some(function)) => f.write_str(function),
            (None, None) => f.write_str("<unknown>"),
        }
    }
}

/// Ordered call sites, innermost first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackTrace {
    frames: Vec<StackFrame>,
}

impl StackTrace {
    /// Capture the current stack using the process-wide mode and prefix.
    #[inline(never)]
    pub fn capture() -> Self {
        Self::capture_with(defaults::stack_trace_mode(), &defaults::package_prefix())
    }

    /// Capture the current stack with an explicit mode and prefix.
    #[inline(never)]
    pub fn capture_with(mode: StackTraceMode, prefix: &str) -> Self {
        let mut raw = Vec::new();
        backtrace::trace(|frame| {
            backtrace::resolve_frame(frame, |symbol| {
                raw.push(StackFrame {
                    file: symbol.filename().map(|p| p.display().to_string()),
                    line: symbol.lineno(),
                    function: symbol.name().map(|n| format!("{n:#}")),
                });
            });
            true
        });

        let start = raw
            .iter()
            .rposition(StackFrame::is_internal)
            .map_or(0, |i| i + 1);

        raw.drain(start..)
            .filter(|frame| frame.matches_prefix(prefix))
            .map(|frame| frame.project(mode))
            .collect()
    }

    /// Frames, innermost first.
    #[inline]
    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    /// Number of frames.
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no frame was kept.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Iterate over frames, innermost first.
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, StackFrame> {
        self.frames.iter()
    }

    /// Each frame rendered on its own.
    pub fn lines(&self) -> Vec<String> {
        self.frames.iter().map(ToString::to_string).collect()
    }
}

impl FromIterator<StackFrame> for StackTrace {
    fn from_iter<I: IntoIterator<Item = StackFrame>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a StackTrace {
    type Item = &'a StackFrame;
    type IntoIter = slice::Iter<'a, StackFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

impl fmt::Display for StackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, frame) in self.frames.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{frame}")?;
        }
        Ok(())
    }
}
