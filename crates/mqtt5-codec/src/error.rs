use thiserror::Error;

pub type Result<T> = std::result::Result<T, MqttError>;

#[derive(Debug, Clone, Error)]
pub enum MqttError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Invalid UTF-8 string: {0}")]
    Utf8Invalid(String),

    #[error("Payload format invalid")]
    PayloadFormatInvalid,

    #[error("Packet too large: size {size} exceeds maximum {max}")]
    PacketTooLarge { size: usize, max: usize },

    #[error("Packet ID exhausted")]
    PacketIdExhausted,

    #[error("Packet identifier already in use: {0}")]
    PacketIdInUse(u16),

    #[error("Packet identifier not found: {0}")]
    PacketIdNotFound(u16),

    #[error("Invalid QoS: {0}")]
    InvalidQoS(u8),

    #[error("Invalid packet type: {0}")]
    InvalidPacketType(u8),

    #[error("Invalid reason code: {0}")]
    InvalidReasonCode(u8),

    #[error("Invalid property ID: {0}")]
    InvalidPropertyId(u8),

    #[error("Duplicate property ID: {0}")]
    DuplicatePropertyId(u8),

    #[error("String too long: {0} bytes exceeds maximum of 65535")]
    StringTooLong(usize),

    #[error("Unsupported protocol version")]
    UnsupportedProtocolVersion,
}

impl MqttError {
    /// Whether this error maps onto the wire-level Malformed Packet class.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedPacket(_)
                | Self::InvalidPacketType(_)
                | Self::InvalidPropertyId(_)
                | Self::Utf8Invalid(_)
        )
    }

    /// Whether this error maps onto the wire-level Protocol Error class.
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::ProtocolError(_)
                | Self::DuplicatePropertyId(_)
                | Self::InvalidQoS(_)
                | Self::InvalidReasonCode(_)
        )
    }
}

impl From<std::io::Error> for MqttError {
    fn from(err: std::io::Error) -> Self {
        MqttError::Io(err.to_string())
    }
}

impl From<String> for MqttError {
    fn from(msg: String) -> Self {
        MqttError::MalformedPacket(msg)
    }
}

impl From<&str> for MqttError {
    fn from(msg: &str) -> Self {
        MqttError::MalformedPacket(msg.to_string())
    }
}
