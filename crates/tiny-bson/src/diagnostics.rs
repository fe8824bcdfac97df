//! Recoverable decode conditions and the policy that decides their fate.

use std::fmt;

use crate::error::DecodeError;

/// How recoverable conditions are treated during decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Record a diagnostic, keep the field at its default and continue.
    #[default]
    Lenient,
    /// Fail the decode at the first recoverable condition.
    Strict,
}

/// One step into a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Location of a value inside the top-level document.
///
/// Renders as `$` for the root, `address.city` for nested keys and `tags[2]`
/// for sequence positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_key(&mut self, key: impl Into<String>) {
        self.segments.push(Segment::Key(key.into()));
    }

    pub fn push_index(&mut self, index: usize) {
        self.segments.push(Segment::Index(index));
    }

    pub fn pop(&mut self) {
        self.segments.pop();
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("$");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if i == 0 => f.write_str(key)?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    /// The same element name appeared twice; the later value was kept.
    DuplicateKey { key: String },
    /// A wire key matched no field of the target type.
    UnknownField { key: String, type_name: &'static str },
    /// A wire key named a field excluded from serialization.
    TransientField { key: String, type_name: &'static str },
    /// A value could not be coerced; the target kept its default.
    FieldFailed { reason: String },
    /// A null arrived for a non-nullable sequence element.
    NullElement { element: &'static str },
    /// Array keys were not the dense run `"0".."n-1"`.
    SparseArray { expected: String, found: String },
    /// A fixed-size sequence received a different number of entries.
    LengthMismatch { expected: usize, found: usize },
    /// Bytes remained after the top-level document.
    TrailingBytes { count: usize },
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey { key } => write!(f, "duplicate key {key:?}, later value kept"),
            Self::UnknownField { key, type_name } => {
                write!(f, "no field {key:?} on {type_name}")
            }
            Self::TransientField { key, type_name } => {
                write!(f, "field {key:?} of {type_name} is not serializable")
            }
            Self::FieldFailed { reason } => write!(f, "left at default: {reason}"),
            Self::NullElement { element } => {
                write!(f, "null element for non-nullable {element}, default used")
            }
            Self::SparseArray { expected, found } => {
                write!(f, "array key {found:?} where {expected:?} was expected")
            }
            Self::LengthMismatch { expected, found } => {
                write!(f, "expected {expected} elements, found {found}")
            }
            Self::TrailingBytes { count } => {
                write!(f, "{count} trailing bytes after document")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub path: String,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

/// Collects diagnostics for one decode call.
#[derive(Debug, Default)]
pub struct Diagnostics {
    policy: DecodePolicy,
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new(policy: DecodePolicy) -> Self {
        Self {
            policy,
            entries: Vec::new(),
        }
    }

    pub fn policy(&self) -> DecodePolicy {
        self.policy
    }

    /// Records a recoverable condition, or rejects it under the strict
    /// policy.
    pub fn report(&mut self, path: &Path, kind: DiagnosticKind) -> Result<(), DecodeError> {
        let diagnostic = Diagnostic {
            path: path.to_string(),
            kind,
        };
        match self.policy {
            DecodePolicy::Strict => Err(DecodeError::Rejected(Box::new(diagnostic))),
            DecodePolicy::Lenient => {
                tracing::warn!(
                    target: "tiny_bson::decode",
                    path = %diagnostic.path,
                    "{}",
                    diagnostic.kind
                );
                self.entries.push(diagnostic);
                Ok(())
            }
        }
    }

    /// Absorbs a mapping failure at `path`.
    ///
    /// Lenient: recorded as [`DiagnosticKind::FieldFailed`]. Strict: returned
    /// as [`DecodeError::Field`], unless it already carries a location.
    pub fn recover(&mut self, path: &Path, err: DecodeError) -> Result<(), DecodeError> {
        match self.policy {
            DecodePolicy::Strict => Err(match err {
                err @ (DecodeError::Field { .. } | DecodeError::Rejected(_)) => err,
                err => DecodeError::Field {
                    path: path.to_string(),
                    source: Box::new(err),
                },
            }),
            DecodePolicy::Lenient => self.report(
                path,
                DiagnosticKind::FieldFailed {
                    reason: err.to_string(),
                },
            ),
        }
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
