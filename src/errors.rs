//! Various error types for different kinds of failures.

use std::error::Error;
use std::fmt;

/// Returned when aggregating a list of x-only public keys fails.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum KeyAggError {
    /// At least one public key is required for aggregation.
    EmptyKeyList,

    /// The public key at the given position in the input list is not a
    /// 32-byte serialization of a valid x-coordinate on the curve.
    InvalidKeyEncoding {
        /// Index of the offending key in the input list.
        index: usize,
    },

    /// The weighted sum of the public keys was the point at infinity.
    /// This happens with negligible probability for honestly generated
    /// keys, and indicates a doctored key set or an arithmetic bug.
    PointAtInfinity,
}

impl fmt::Display for KeyAggError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::EmptyKeyList => f.write_str("cannot aggregate an empty list of public keys"),
            Self::InvalidKeyEncoding { index } => {
                write!(f, "public key at index {} is not a valid x-only key", index)
            }
            Self::PointAtInfinity => {
                f.write_str("computed an invalid aggregated key from a collection of public keys")
            }
        }
    }
}
impl Error for KeyAggError {}
impl From<secp::errors::InfinityPointError> for KeyAggError {
    fn from(_: secp::errors::InfinityPointError) -> Self {
        KeyAggError::PointAtInfinity
    }
}

/// Returned when tweaking a [`KeyAggCache`][crate::KeyAggCache] fails.
///
/// A failed tweak never modifies the cache.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TweakError {
    /// The cache was never initialized by key aggregation, or its serialized
    /// form could not be decoded (e.g. the magic tag is wrong).
    UninitializedCache,

    /// A key aggregation cache can be tweaked at most once.
    AlreadyTweaked,

    /// The 32-byte tweak is not less than the curve order.
    TweakOverflow,

    /// Adding the tweak resulted in the point at infinity. Only possible if
    /// the tweak is the negation of the aggregated secret key.
    PointAtInfinity,
}

impl fmt::Display for TweakError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "failed to tweak aggregated key: {}",
            match self {
                Self::UninitializedCache => "key aggregation cache is not initialized",
                Self::AlreadyTweaked => "key aggregation cache has already been tweaked",
                Self::TweakOverflow => "tweak value exceeds the curve order",
                Self::PointAtInfinity => "tweaked key is the point at infinity",
            }
        )
    }
}
impl Error for TweakError {}
impl From<secp::errors::InfinityPointError> for TweakError {
    fn from(_: secp::errors::InfinityPointError) -> Self {
        TweakError::PointAtInfinity
    }
}
impl From<secp::errors::InvalidScalarBytes> for TweakError {
    fn from(_: secp::errors::InvalidScalarBytes) -> Self {
        TweakError::TweakOverflow
    }
}

/// Enumerates the various reasons why binary or hex decoding
/// could fail.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum DecodeFailureReason {
    /// The hex string's format was incorrect, which could mean
    /// it either was the wrong length or held invalid characters.
    BadHexFormat(base16ct::Error),

    /// The byte slice we tried to deserialize had the wrong length.
    BadLength(usize),

    /// The bytes contained coordinates to a point that is not on
    /// the secp256k1 curve.
    InvalidPoint,

    /// The bytes slice contained a representation of a scalar which
    /// is outside the required finite field's range.
    InvalidScalar,

    /// The magic tag which marks an initialized key aggregation cache
    /// was missing.
    UninitializedCache,

    /// Custom error reason.
    Custom(String),
}

/// Returned when decoding a certain data structure of type `T` fails.
///
/// The type `T` only serves as a compile-time safety check; no
/// data of type `T` is actually owned by this error.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DecodeError<T> {
    /// The reason for the decoding failure.
    pub reason: DecodeFailureReason,
    phantom: std::marker::PhantomData<T>,
}

impl<T> DecodeError<T> {
    /// Construct a new decoding error for type `T` given a cause
    /// for the failure.
    pub fn new(reason: DecodeFailureReason) -> Self {
        DecodeError {
            reason,
            phantom: std::marker::PhantomData,
        }
    }

    /// Create a decoding error caused by an incorrect input byte
    /// slice length.
    pub fn bad_length(size: usize) -> Self {
        let reason = DecodeFailureReason::BadLength(size);
        DecodeError::new(reason)
    }

    /// Create a custom decoding failure.
    pub fn custom(s: impl fmt::Display) -> Self {
        let reason = DecodeFailureReason::Custom(s.to_string());
        DecodeError::new(reason)
    }
}

impl<T> fmt::Display for DecodeError<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use DecodeFailureReason::*;

        write!(
            f,
            "error decoding {}: {}",
            std::any::type_name::<T>(),
            match &self.reason {
                BadHexFormat(e) => format!("hex decoding error: {}", e),
                BadLength(size) => format!("unexpected length {}", size),
                InvalidPoint => secp::errors::InvalidPointBytes.to_string(),
                InvalidScalar => secp::errors::InvalidScalarBytes.to_string(),
                UninitializedCache => "missing key aggregation cache magic".to_string(),
                Custom(s) => s.to_string(),
            }
        )
    }
}

impl<T: fmt::Debug> Error for DecodeError<T> {}

impl<T> From<secp::errors::InvalidPointBytes> for DecodeError<T> {
    fn from(_: secp::errors::InvalidPointBytes) -> Self {
        DecodeError::new(DecodeFailureReason::InvalidPoint)
    }
}

impl<T> From<secp::errors::InvalidScalarBytes> for DecodeError<T> {
    fn from(_: secp::errors::InvalidScalarBytes) -> Self {
        DecodeError::new(DecodeFailureReason::InvalidScalar)
    }
}

impl<T> From<base16ct::Error> for DecodeError<T> {
    fn from(e: base16ct::Error) -> Self {
        DecodeError::new(DecodeFailureReason::BadHexFormat(e))
    }
}
