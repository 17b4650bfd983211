pub mod ack_common;
pub mod auth;
pub mod connack;
pub mod connect;
pub mod disconnect;
pub mod ping;
pub mod puback;
pub mod pubcomp;
pub mod publish;
pub mod pubrec;
pub mod pubrel;
pub mod suback;
pub mod subscribe;
pub mod subscribe_options;
pub mod unsuback;
pub mod unsubscribe;

use crate::constants::publish::{QOS_MASK, QOS_SHIFT};
use crate::constants::{MAX_PACKET_SIZE, MAX_REMAINING_LENGTH};
use crate::encoding::{decode_variable_int, encode_variable_int, variable_int_len};
use crate::error::{MqttError, Result};
use crate::protocol::v5::reason_codes::ReasonCode;
use bebytes::BeBytes;
use bytes::{Buf, BufMut, Bytes, BytesMut};

pub use auth::AuthPacket;
pub use connack::ConnAckPacket;
pub use connect::ConnectPacket;
pub use disconnect::DisconnectPacket;
pub use ping::{PingReqPacket, PingRespPacket};
pub use puback::PubAckPacket;
pub use pubcomp::PubCompPacket;
pub use publish::PublishPacket;
pub use pubrec::PubRecPacket;
pub use pubrel::PubRelPacket;
pub use suback::SubAckPacket;
pub use subscribe::{SubscribePacket, TopicFilter};
pub use subscribe_options::{RetainHandling, SubscriptionOptions};
pub use unsuback::UnsubAckPacket;
pub use unsubscribe::UnsubscribePacket;

/// Control packet type, the upper nibble of the fixed header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    Connect = 1,
    ConnAck = 2,
    Publish = 3,
    PubAck = 4,
    PubRec = 5,
    PubRel = 6,
    PubComp = 7,
    Subscribe = 8,
    SubAck = 9,
    Unsubscribe = 10,
    UnsubAck = 11,
    PingReq = 12,
    PingResp = 13,
    Disconnect = 14,
    Auth = 15,
}

impl PacketType {
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Connect),
            2 => Some(Self::ConnAck),
            3 => Some(Self::Publish),
            4 => Some(Self::PubAck),
            5 => Some(Self::PubRec),
            6 => Some(Self::PubRel),
            7 => Some(Self::PubComp),
            8 => Some(Self::Subscribe),
            9 => Some(Self::SubAck),
            10 => Some(Self::Unsubscribe),
            11 => Some(Self::UnsubAck),
            12 => Some(Self::PingReq),
            13 => Some(Self::PingResp),
            14 => Some(Self::Disconnect),
            15 => Some(Self::Auth),
            _ => None,
        }
    }

    /// Fixed-header flags required for this type. `None` for PUBLISH, whose
    /// flag bits carry data instead.
    #[must_use]
    pub fn required_flags(self) -> Option<u8> {
        match self {
            Self::Publish => None,
            Self::Subscribe | Self::Unsubscribe | Self::PubRel => Some(0x02),
            _ => Some(0x00),
        }
    }
}

/// First byte of every packet plus the decoded remaining length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedHeader {
    pub packet_type: PacketType,
    pub flags: u8,
    pub remaining_length: u32,
}

impl FixedHeader {
    #[must_use]
    pub fn new(packet_type: PacketType, flags: u8, remaining_length: u32) -> Self {
        Self {
            packet_type,
            flags,
            remaining_length,
        }
    }

    pub fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        buf.put_u8(((self.packet_type as u8) << 4) | (self.flags & 0x0F));
        encode_variable_int(buf, self.remaining_length)
    }

    /// # Errors
    /// `InvalidPacketType` for type nibble 0, `MalformedPacket` for reserved
    /// flag violations (including PUBLISH QoS bits = 3) and a bad length
    /// field.
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        if !buf.has_remaining() {
            return Err(MqttError::MalformedPacket(
                "Missing fixed header".to_string(),
            ));
        }
        let byte = buf.get_u8();
        let packet_type = PacketType::from_u8(byte >> 4)
            .ok_or(MqttError::InvalidPacketType(byte >> 4))?;
        let flags = byte & 0x0F;

        match packet_type.required_flags() {
            Some(required) if flags != required => {
                return Err(MqttError::MalformedPacket(format!(
                    "Invalid {packet_type:?} flags: expected 0x{required:02X}, got 0x{flags:02X}"
                )));
            }
            None if (flags & QOS_MASK) >> QOS_SHIFT == 3 => {
                return Err(MqttError::MalformedPacket(
                    "PUBLISH QoS bits must not be 3".to_string(),
                ));
            }
            _ => {}
        }

        let remaining_length = decode_variable_int(buf)?;

        Ok(Self {
            packet_type,
            flags,
            remaining_length,
        })
    }

    /// Encoded size of the fixed header itself.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        1 + variable_int_len(self.remaining_length)
    }
}

/// Variable header common to the four publish acknowledgement packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BeBytes)]
pub struct AckPacketHeader {
    pub packet_id: u16,
    pub reason_code: u8,
}

impl AckPacketHeader {
    #[must_use]
    pub fn create(packet_id: u16, reason_code: ReasonCode) -> Self {
        Self {
            packet_id,
            reason_code: reason_code.into(),
        }
    }

    #[must_use]
    pub fn get_reason_code(&self) -> Option<ReasonCode> {
        ReasonCode::from_u8(self.reason_code)
    }
}

/// Common shape of every control packet codec.
///
/// `decode_body` operates on a buffer holding exactly the packet body; the
/// [`Packet`] dispatcher slices the body out of the stream first.
pub trait MqttPacket {
    fn packet_type(&self) -> PacketType;

    fn flags(&self) -> u8 {
        0x00
    }

    /// Byte length of the variable header and payload.
    fn body_len(&self) -> usize;

    fn encode_body<B: BufMut>(&self, buf: &mut B) -> Result<()>;

    fn decode_body<B: Buf>(buf: &mut B, fixed_header: &FixedHeader) -> Result<Self>
    where
        Self: Sized;

    /// Total encoded size: fixed header byte, length field and body.
    fn encoded_len(&self) -> usize {
        let body = self.body_len();
        1 + variable_int_len(u32::try_from(body).unwrap_or(u32::MAX)) + body
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        let body = self.body_len();
        if body > MAX_REMAINING_LENGTH as usize {
            return Err(MqttError::PacketTooLarge {
                size: body,
                max: MAX_PACKET_SIZE,
            });
        }

        let header = FixedHeader::new(self.packet_type(), self.flags(), body as u32);
        header.encode(buf)?;
        self.encode_body(buf)
    }

    /// Encodes into a buffer reserved to the exact final size.
    fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }
}

/// Any of the fifteen v5 control packets.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Connect(ConnectPacket),
    ConnAck(ConnAckPacket),
    Publish(PublishPacket),
    PubAck(PubAckPacket),
    PubRec(PubRecPacket),
    PubRel(PubRelPacket),
    PubComp(PubCompPacket),
    Subscribe(SubscribePacket),
    SubAck(SubAckPacket),
    Unsubscribe(UnsubscribePacket),
    UnsubAck(UnsubAckPacket),
    PingReq(PingReqPacket),
    PingResp(PingRespPacket),
    Disconnect(DisconnectPacket),
    Auth(AuthPacket),
}

macro_rules! for_each_packet {
    ($self:ident, $p:ident => $body:expr) => {
        match $self {
            Packet::Connect($p) => $body,
            Packet::ConnAck($p) => $body,
            Packet::Publish($p) => $body,
            Packet::PubAck($p) => $body,
            Packet::PubRec($p) => $body,
            Packet::PubRel($p) => $body,
            Packet::PubComp($p) => $body,
            Packet::Subscribe($p) => $body,
            Packet::SubAck($p) => $body,
            Packet::Unsubscribe($p) => $body,
            Packet::UnsubAck($p) => $body,
            Packet::PingReq($p) => $body,
            Packet::PingResp($p) => $body,
            Packet::Disconnect($p) => $body,
            Packet::Auth($p) => $body,
        }
    };
}

impl Packet {
    #[must_use]
    pub fn packet_type(&self) -> PacketType {
        for_each_packet!(self, p => p.packet_type())
    }

    /// Decodes one complete packet from the front of `buf`.
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        let fixed_header = FixedHeader::decode(buf)?;
        let body_len = fixed_header.remaining_length as usize;

        if buf.remaining() < body_len {
            return Err(MqttError::MalformedPacket(format!(
                "Remaining length {body_len} exceeds available {} bytes",
                buf.remaining()
            )));
        }

        let mut body = buf.copy_to_bytes(body_len);

        let packet = match fixed_header.packet_type {
            PacketType::Connect => {
                Packet::Connect(ConnectPacket::decode_body(&mut body, &fixed_header)?)
            }
            PacketType::ConnAck => {
                Packet::ConnAck(ConnAckPacket::decode_body(&mut body, &fixed_header)?)
            }
            PacketType::Publish => {
                Packet::Publish(PublishPacket::decode_body(&mut body, &fixed_header)?)
            }
            PacketType::PubAck => {
                Packet::PubAck(PubAckPacket::decode_body(&mut body, &fixed_header)?)
            }
            PacketType::PubRec => {
                Packet::PubRec(PubRecPacket::decode_body(&mut body, &fixed_header)?)
            }
            PacketType::PubRel => {
                Packet::PubRel(PubRelPacket::decode_body(&mut body, &fixed_header)?)
            }
            PacketType::PubComp => {
                Packet::PubComp(PubCompPacket::decode_body(&mut body, &fixed_header)?)
            }
            PacketType::Subscribe => {
                Packet::Subscribe(SubscribePacket::decode_body(&mut body, &fixed_header)?)
            }
            PacketType::SubAck => {
                Packet::SubAck(SubAckPacket::decode_body(&mut body, &fixed_header)?)
            }
            PacketType::Unsubscribe => {
                Packet::Unsubscribe(UnsubscribePacket::decode_body(&mut body, &fixed_header)?)
            }
            PacketType::UnsubAck => {
                Packet::UnsubAck(UnsubAckPacket::decode_body(&mut body, &fixed_header)?)
            }
            PacketType::PingReq => {
                Packet::PingReq(PingReqPacket::decode_body(&mut body, &fixed_header)?)
            }
            PacketType::PingResp => {
                Packet::PingResp(PingRespPacket::decode_body(&mut body, &fixed_header)?)
            }
            PacketType::Disconnect => {
                Packet::Disconnect(DisconnectPacket::decode_body(&mut body, &fixed_header)?)
            }
            PacketType::Auth => Packet::Auth(AuthPacket::decode_body(&mut body, &fixed_header)?),
        };

        if body.has_remaining() {
            return Err(MqttError::MalformedPacket(format!(
                "{:?} body has {} trailing bytes",
                fixed_header.packet_type,
                body.remaining()
            )));
        }

        Ok(packet)
    }

    pub fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        for_each_packet!(self, p => p.encode(buf))
    }

    #[must_use]
    pub fn encoded_len(&self) -> usize {
        for_each_packet!(self, p => p.encoded_len())
    }

    pub fn to_bytes(&self) -> Result<Bytes> {
        for_each_packet!(self, p => p.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_type_from_u8() {
        assert_eq!(PacketType::from_u8(1), Some(PacketType::Connect));
        assert_eq!(PacketType::from_u8(3), Some(PacketType::Publish));
        assert_eq!(PacketType::from_u8(15), Some(PacketType::Auth));
        assert_eq!(PacketType::from_u8(0), None);
        assert_eq!(PacketType::from_u8(16), None);
    }

    #[test]
    fn test_required_flags() {
        assert_eq!(PacketType::Publish.required_flags(), None);
        assert_eq!(PacketType::Subscribe.required_flags(), Some(0x02));
        assert_eq!(PacketType::PubRel.required_flags(), Some(0x02));
        assert_eq!(PacketType::Connect.required_flags(), Some(0x00));
    }

    #[test]
    fn test_fixed_header_round_trip() {
        let header = FixedHeader::new(PacketType::Publish, 0x03, 300);
        let mut buf = BytesMut::new();
        header.encode(&mut buf).unwrap();
        assert_eq!(header.encoded_len(), buf.len());

        let decoded = FixedHeader::decode(&mut buf).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_fixed_header_rejects_type_zero() {
        let mut buf = Bytes::from_static(&[0x00, 0x00]);
        assert!(matches!(
            FixedHeader::decode(&mut buf),
            Err(MqttError::InvalidPacketType(0))
        ));
    }

    #[test]
    fn test_fixed_header_rejects_reserved_flags() {
        // CONNECT with flag bits set
        let mut buf = Bytes::from_static(&[0x11, 0x00]);
        assert!(FixedHeader::decode(&mut buf).is_err());

        // SUBSCRIBE without the 0b0010 flags
        let mut buf = Bytes::from_static(&[0x80, 0x00]);
        assert!(FixedHeader::decode(&mut buf).is_err());
    }

    #[test]
    fn test_fixed_header_rejects_publish_qos3() {
        let mut buf = Bytes::from_static(&[0x36, 0x00]);
        let result = FixedHeader::decode(&mut buf);
        assert!(matches!(result, Err(MqttError::MalformedPacket(_))));
    }

    #[test]
    fn test_ack_header_bebytes_round_trip() {
        let header = AckPacketHeader::create(456, ReasonCode::QuotaExceeded);
        let bytes = header.to_be_bytes();
        assert_eq!(bytes.len(), 3);

        let (decoded, consumed) = AckPacketHeader::try_from_be_bytes(&bytes).unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(decoded, header);
        assert_eq!(decoded.get_reason_code(), Some(ReasonCode::QuotaExceeded));
    }

    #[test]
    fn test_packet_decode_rejects_truncated_body() {
        // PUBACK claiming 2 body bytes but supplying none
        let mut buf = Bytes::from_static(&[0x40, 0x02]);
        assert!(Packet::decode(&mut buf).is_err());
    }
}
