//! Crate-wide error type and result alias.
//!
//! Every operation of the algebra fails synchronously with one of the variants
//! below; there is no partial-failure or retry semantics anywhere in the crate.
//! Two generic operations deliberately never fail: `inhabits` treats an unknown
//! (value, type) pair as "does not inhabit", and `compare` degrades to an
//! unspecified-but-stable order instead of erroring. Both behaviors are
//! documented on the functions themselves.
use strum::EnumIs;
use thiserror::Error;

#[derive(Debug, Error, EnumIs)]
pub enum Error {
    /// No implementation was found for a required operation/tag combination.
    ///
    /// This is always a configuration defect (a capability that was never
    /// registered), never a recoverable runtime condition.
    #[error("no `{capability}` capability is registered for `{operand}`")]
    UnregisteredCapability {
        capability: &'static str,
        operand: String,
    },

    /// A structural container's declared constraint was violated by its
    /// contents at construction or mutation time.
    #[error("constraint violation: {reason}")]
    ConstraintViolation { reason: String },

    /// An index was outside the valid bounds of a container: a positional
    /// index (including a failed negative wraparound) or a map key that is
    /// not a member of the map.
    #[error("index {index} is out of range for a container of length {len}")]
    IndexOutOfRange { index: String, len: usize },

    /// A symbol could not be resolved anywhere in a symbol-table chain.
    #[error("unresolved symbol `{name}`")]
    UnresolvedSymbol { name: String },

    /// A symbol was already defined in the table that `define` targeted.
    /// Shadowing a parent table's binding is allowed; redefining within the
    /// same table is not.
    #[error("symbol `{name}` is already defined in this table")]
    DuplicateSymbol { name: String },

    /// The byte stream being decoded is truncated or syntactically invalid.
    #[error("malformed stream: {reason}")]
    MalformedStream { reason: String },

    /// A strict type conversion would lose information.
    #[error("lossy conversion from `{from}` to `{to}` rejected for value {value}")]
    LossyConversionRejected {
        from: &'static str,
        to: &'static str,
        value: String,
    },

    /// A type object was applied as a constructor to an argument that does not
    /// inhabit it.
    #[error("cannot construct an inhabitant of `{ty}` from `{argument}`")]
    ConstructionFailed { ty: String, argument: String },

    /// An I/O failure while reading or writing a serialized stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
