use thiserror::Error;

/// Errors raised by the SunSpec layer, the aggregator and the export controller.
///
/// These travel inside `anyhow::Error`; use `downcast_ref::<SunSpecError>()` to
/// tell a protocol mismatch apart from a transport hiccup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SunSpecError {
    #[error("expected {expected} registers, got {actual}")]
    RegisterLength { expected: usize, actual: usize },

    #[error("failed to decode field {field} from raw registers {raw:04X?}: {reason}")]
    FieldDecode {
        field: &'static str,
        raw: Vec<u16>,
        reason: String,
    },

    #[error("failed to encode field {field}: {reason}")]
    FieldEncode { field: &'static str, reason: String },

    #[error("not a SunSpec device, signature at {address} was {signature:#010X}")]
    InvalidSignature { address: u16, signature: u32 },

    #[error("model {id} at address {address} has invalid length {length}")]
    InvalidModelLength { id: u16, address: u16, length: u16 },

    #[error("model chain at address {address} runs past the end of the address space")]
    AddressOverflow { address: u16 },

    #[error("model {ids:?} not found in device address map")]
    ModelNotFound { ids: Vec<u16> },

    #[error("wrong model at address {address}: expected one of {expected:?}, found {actual}")]
    WrongModel {
        address: u16,
        expected: Vec<u16>,
        actual: u16,
    },

    #[error("unsupported manufacturer {0:?}")]
    UnsupportedBrand(String),

    #[error("{model} model is not implemented for brand {brand}")]
    BrandModelNotImplemented {
        brand: &'static str,
        model: &'static str,
    },

    #[error("write verification failed for {field}: expected {expected}, got {actual}")]
    WriteVerification {
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("{topology} device is missing required {quantity} on phase {phase}")]
    MissingPhaseValue {
        topology: &'static str,
        quantity: &'static str,
        phase: char,
    },

    #[error("cannot aggregate metrics with mixed phase topologies: {0:?}")]
    MixedTopology(Vec<&'static str>),

    #[error("cannot aggregate an empty set of {0} metrics")]
    EmptyAggregation(&'static str),

    #[error("unknown {family} model id {id}")]
    UnknownModelId { family: &'static str, id: u16 },

    #[error("{operation} rejected with Modbus exception code {code:#04X}")]
    ModbusException { operation: String, code: u8 },

    #[error("transport error: {0}")]
    Transport(String),
}

impl SunSpecError {
    /// Recovers the typed error from an `anyhow::Error`, or files it under
    /// `Transport` when it came from below the SunSpec layer.
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        match err.downcast::<SunSpecError>() {
            Ok(e) => e,
            Err(e) => SunSpecError::Transport(format!("{:#}", e)),
        }
    }
}
