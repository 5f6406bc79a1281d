use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use fuel_slips_batch::{SlipJob, WorkerSlice};

/// Format name leading every slice string.
const SLICE_DOMAIN: &str = "fuel-slips";
/// Version of the slice payload layout.
const SLICE_VERSION: &str = "v1";
/// Delimiter used to separate the prefix, slice position and payload.
const FIELD_DELIMITER: &str = ":";
/// Separates the slice index from the worker count.
const POSITION_DELIMITER: &str = "of";

/// Encodes a worker slice into a single line a worker can be started with.
pub(crate) fn encode(slice: &WorkerSlice) -> Result<String, SliceTransferError> {
    let json = serde_json::to_vec(&slice.job).map_err(SliceTransferError::Serialization)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    let position = format!("{}{POSITION_DELIMITER}{}", slice.index, slice.workers);
    Ok([SLICE_DOMAIN, SLICE_VERSION, &position, &encoded].join(FIELD_DELIMITER))
}

/// Decodes a worker slice from its single-line representation.
pub(crate) fn decode(value: &str) -> Result<WorkerSlice, SliceTransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SliceTransferError::EmptyPayload);
    }

    let mut parts = trimmed.split(FIELD_DELIMITER);
    let domain = parts.next().ok_or(SliceTransferError::MissingPrefix)?;
    let version = parts.next().ok_or(SliceTransferError::MissingVersion)?;
    let position = parts.next().ok_or(SliceTransferError::MissingPosition)?;
    let payload = parts.next().ok_or(SliceTransferError::MissingPayload)?;

    if domain != SLICE_DOMAIN {
        return Err(SliceTransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != SLICE_VERSION {
        return Err(SliceTransferError::UnsupportedVersion(version.to_owned()));
    }

    let (index, workers) = parse_position(position)?;
    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(SliceTransferError::InvalidEncoding)?;
    let job: SlipJob =
        serde_json::from_slice(&bytes).map_err(SliceTransferError::InvalidPayload)?;

    Ok(WorkerSlice {
        index,
        workers,
        job,
    })
}

/// Errors that can occur while moving slices between processes.
#[derive(Debug)]
pub(crate) enum SliceTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing.
    MissingPrefix,
    /// The version segment was missing.
    MissingVersion,
    /// The slice position segment was missing.
    MissingPosition,
    /// The payload segment was missing.
    MissingPayload,
    /// The prefix segment named another format.
    InvalidPrefix(String),
    /// The version segment is not understood.
    UnsupportedVersion(String),
    /// The slice position could not be parsed or was out of range.
    InvalidPosition(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload could not be deserialised.
    InvalidPayload(serde_json::Error),
    /// The slice could not be serialised.
    Serialization(serde_json::Error),
}

impl fmt::Display for SliceTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "slice string was empty"),
            Self::MissingPrefix => write!(f, "slice string is missing the prefix"),
            Self::MissingVersion => write!(f, "slice string is missing the version"),
            Self::MissingPosition => write!(f, "slice string is missing the slice position"),
            Self::MissingPayload => write!(f, "slice string is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "slice prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "slice version '{version}' is not supported")
            }
            Self::InvalidPosition(position) => {
                write!(f, "could not parse slice position '{position}'")
            }
            Self::InvalidEncoding(error) => write!(f, "could not decode slice payload: {error}"),
            Self::InvalidPayload(error) => write!(f, "could not parse slice payload: {error}"),
            Self::Serialization(error) => write!(f, "could not serialise slice: {error}"),
        }
    }
}

impl Error for SliceTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) | Self::Serialization(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_position(position: &str) -> Result<(usize, usize), SliceTransferError> {
    let invalid = || SliceTransferError::InvalidPosition(position.to_owned());
    let (index, workers) = position
        .split_once(POSITION_DELIMITER)
        .ok_or_else(invalid)?;

    let index = index.trim().parse::<usize>().map_err(|_| invalid())?;
    let workers = workers.trim().parse::<usize>().map_err(|_| invalid())?;

    if workers == 0 || index >= workers {
        return Err(invalid());
    }

    Ok((index, workers))
}
