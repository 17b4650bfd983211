//! Protocol-level constants shared across the codec.

/// Largest value representable by a variable byte integer.
pub const MAX_REMAINING_LENGTH: u32 = 268_435_455;

/// Largest encoded packet: fixed header byte, four length bytes and the
/// maximum remaining length.
pub const MAX_PACKET_SIZE: usize = 268_435_460;

/// Length-prefixed strings and binary fields carry a u16 length.
pub const MAX_STRING_LENGTH: usize = 65_535;

/// Protocol name carried in the CONNECT variable header.
pub const PROTOCOL_NAME: &str = "MQTT";

/// Protocol level for MQTT v5.0.
pub const PROTOCOL_LEVEL: u8 = 5;

pub mod publish {
    pub const RETAIN_MASK: u8 = 0x01;
    pub const QOS_MASK: u8 = 0x06;
    pub const QOS_SHIFT: u8 = 1;
    pub const DUP_MASK: u8 = 0x08;
}

pub mod connect {
    pub const RESERVED_MASK: u8 = 0x01;
    pub const CLEAN_START_MASK: u8 = 0x02;
    pub const WILL_FLAG_MASK: u8 = 0x04;
    pub const WILL_QOS_MASK: u8 = 0x18;
    pub const WILL_QOS_SHIFT: u8 = 3;
    pub const WILL_RETAIN_MASK: u8 = 0x20;
    pub const PASSWORD_MASK: u8 = 0x40;
    pub const USERNAME_MASK: u8 = 0x80;
}

pub mod connack {
    pub const SESSION_PRESENT_MASK: u8 = 0x01;
    pub const RESERVED_MASK: u8 = 0xFE;
}

pub mod subscription {
    pub const QOS_MASK: u8 = 0x03;
    pub const NO_LOCAL_MASK: u8 = 0x04;
    pub const RETAIN_AS_PUBLISHED_MASK: u8 = 0x08;
    pub const RETAIN_HANDLING_SHIFT: u8 = 4;
    pub const RESERVED_BITS_MASK: u8 = 0xC0;
}
