use alloc::borrow::Cow;
use alloc::boxed::Box;

use thiserror::Error;

// -----------------------------------------------------------------------------
// ErrorKind

/// The flat classification of an [`RttiError`].
///
/// [`RttiError::Field`] wraps another error with the schema location it
/// happened in; [`RttiError::kind`] looks through those wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    UnknownType,
    AbstractType,
    TruncatedStream,
    SizeMismatch,
    CodecVersionUnsupported,
    TypeMismatch,
    UnresolvedSlot,
    DuplicateSlot,
    InvalidData,
    BlockTooLarge,
    TrailingBytes,
    Hook,
}

// -----------------------------------------------------------------------------
// RttiError

/// Failure of an encode or decode call.
///
/// Unknown fields are never reported: the decoder skips them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RttiError {
    #[error("type id {type_id} is not registered")]
    UnknownType { type_id: u32 },

    #[error("type `{type_name}` ({type_id}) has no factory and cannot be instantiated")]
    AbstractType {
        type_id: u32,
        type_name: &'static str,
    },

    #[error("stream truncated at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    TruncatedStream {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("encoded size mismatch: predicted {expected} bytes, wrote {actual}")]
    SizeMismatch { expected: u32, actual: u32 },

    #[error("codec `{codec}` cannot read version {found} (supports up to {supported})")]
    CodecVersionUnsupported {
        codec: &'static str,
        found: u32,
        supported: u32,
    },

    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("shared object slot {slot} is referenced before it was decoded")]
    UnresolvedSlot { slot: u32 },

    #[error("shared object slot {slot} is defined twice")]
    DuplicateSlot { slot: u32 },

    #[error("invalid data at offset {offset}: {reason}")]
    InvalidData {
        offset: usize,
        reason: Cow<'static, str>,
    },

    #[error("block of {len} bytes exceeds the 4 GiB length limit")]
    BlockTooLarge { len: usize },

    #[error("{remaining} trailing bytes after the root object")]
    TrailingBytes { remaining: usize },

    #[error("hook of `{type_name}` failed: {message}")]
    Hook {
        type_name: &'static str,
        message: Cow<'static, str>,
    },

    #[error("field {field_id} of `{type_name}`: {source}")]
    Field {
        type_name: &'static str,
        field_id: u32,
        #[source]
        source: Box<RttiError>,
    },
}

impl RttiError {
    /// Create a hook failure for `type_name`.
    #[inline]
    pub fn hook(type_name: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self::Hook {
            type_name,
            message: message.into(),
        }
    }

    /// Wrap `self` with the schema location it happened in.
    #[inline]
    pub(crate) fn in_field(self, type_name: &'static str, field_id: u32) -> Self {
        Self::Field {
            type_name,
            field_id,
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping [`RttiError::Field`] wrappers.
    pub fn root_cause(&self) -> &RttiError {
        let mut err = self;
        while let Self::Field { source, .. } = err {
            err = &**source;
        }
        err
    }

    /// Returns the error classification.
    pub fn kind(&self) -> ErrorKind {
        match self.root_cause() {
            Self::UnknownType { .. } => ErrorKind::UnknownType,
            Self::AbstractType { .. } => ErrorKind::AbstractType,
            Self::TruncatedStream { .. } => ErrorKind::TruncatedStream,
            Self::SizeMismatch { .. } => ErrorKind::SizeMismatch,
            Self::CodecVersionUnsupported { .. } => ErrorKind::CodecVersionUnsupported,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::UnresolvedSlot { .. } => ErrorKind::UnresolvedSlot,
            Self::DuplicateSlot { .. } => ErrorKind::DuplicateSlot,
            Self::InvalidData { .. } => ErrorKind::InvalidData,
            Self::BlockTooLarge { .. } => ErrorKind::BlockTooLarge,
            Self::TrailingBytes { .. } => ErrorKind::TrailingBytes,
            Self::Hook { .. } => ErrorKind::Hook,
            Self::Field { .. } => unreachable!("`root_cause` never returns a field wrapper"),
        }
    }

    /// Returns the innermost field id the error was raised in, if any.
    pub fn field_id(&self) -> Option<u32> {
        let mut err = self;
        let mut found = None;
        while let Self::Field {
            field_id, source, ..
        } = err
        {
            found = Some(*field_id);
            err = &**source;
        }
        found
    }

    /// Returns the type id carried by the error, if any.
    pub fn offending_type_id(&self) -> Option<u32> {
        match self.root_cause() {
            Self::UnknownType { type_id } | Self::AbstractType { type_id, .. } => Some(*type_id),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// RegistryError

/// Failure to register a schema.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("type id {type_id} is already used by `{existing}`, cannot register `{rejected}`")]
    DuplicateTypeId {
        type_id: u32,
        existing: &'static str,
        rejected: &'static str,
    },

    #[error("type name `{type_name}` already belongs to type id {existing}, not {rejected}")]
    DuplicateTypeName {
        type_name: &'static str,
        existing: u32,
        rejected: u32,
    },

    #[error("the global type registry is already initialized")]
    AlreadyInitialized,
}
