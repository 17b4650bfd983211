use super::ack_common::is_valid_connack_reason_code;
use crate::constants::connack;
use crate::error::{MqttError, Result};
use crate::packet::{FixedHeader, MqttPacket, PacketType};
use crate::protocol::v5::properties::Properties;
use crate::protocol::v5::reason_codes::ReasonCode;
use bytes::{Buf, BufMut};

/// MQTT CONNACK packet.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnAckPacket {
    pub session_present: bool,
    pub reason_code: ReasonCode,
    pub properties: Properties,
}

impl ConnAckPacket {
    #[must_use]
    pub fn new(session_present: bool, reason_code: ReasonCode) -> Self {
        Self {
            session_present,
            reason_code,
            properties: Properties::default(),
        }
    }
}

impl MqttPacket for ConnAckPacket {
    fn packet_type(&self) -> PacketType {
        PacketType::ConnAck
    }

    fn body_len(&self) -> usize {
        2 + self.properties.encoded_len()
    }

    fn encode_body<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        if !is_valid_connack_reason_code(self.reason_code) {
            return Err(MqttError::MalformedPacket(format!(
                "Invalid CONNACK reason code: {:?}",
                self.reason_code
            )));
        }

        buf.put_u8(u8::from(self.session_present));
        buf.put_u8(self.reason_code.into());
        self.properties.encode(buf)
    }

    fn decode_body<B: Buf>(buf: &mut B, _fixed_header: &FixedHeader) -> Result<Self> {
        if buf.remaining() < 2 {
            return Err(MqttError::MalformedPacket(
                "CONNACK missing acknowledge flags or reason code".to_string(),
            ));
        }

        let ack_flags = buf.get_u8();
        if ack_flags & connack::RESERVED_MASK != 0 {
            return Err(MqttError::MalformedPacket(format!(
                "CONNACK reserved acknowledge flags must be 0, got 0x{ack_flags:02X}"
            )));
        }
        let session_present = ack_flags & connack::SESSION_PRESENT_MASK != 0;

        let reason_byte = buf.get_u8();
        let reason_code = ReasonCode::from_u8(reason_byte)
            .filter(|code| is_valid_connack_reason_code(*code))
            .ok_or_else(|| {
                MqttError::MalformedPacket(format!(
                    "Invalid CONNACK reason code: 0x{reason_byte:02X}"
                ))
            })?;

        let properties = Properties::decode(buf)?;

        Ok(Self {
            session_present,
            reason_code,
            properties,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Packet;
    use bytes::{Bytes, BytesMut};

    #[test]
    fn test_connack_round_trip() {
        let mut packet = ConnAckPacket::new(true, ReasonCode::Success);
        packet.properties.set_receive_maximum(10);
        packet
            .properties
            .add(
                crate::protocol::v5::properties::PropertyId::AssignedClientIdentifier,
                crate::protocol::v5::properties::PropertyValue::Utf8String("auto-1".to_string()),
            )
            .unwrap();

        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        assert_eq!(packet.encoded_len(), buf.len());

        let decoded = match Packet::decode(&mut buf).unwrap() {
            Packet::ConnAck(p) => p,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(decoded, packet);
        assert!(decoded.session_present);
    }

    #[test]
    fn test_connack_refusal() {
        let packet = ConnAckPacket::new(false, ReasonCode::BadUsernameOrPassword);
        let bytes = packet.to_bytes().unwrap();
        assert_eq!(&bytes[..], &[0x20, 0x03, 0x00, 0x86, 0x00]);
    }

    #[test]
    fn test_connack_reserved_flags_rejected() {
        let mut buf = Bytes::from_static(&[0x20, 0x03, 0x02, 0x00, 0x00]);
        assert!(matches!(
            Packet::decode(&mut buf),
            Err(MqttError::MalformedPacket(_))
        ));
    }

    #[test]
    fn test_connack_invalid_reason_code() {
        let mut buf = Bytes::from_static(&[0x20, 0x03, 0x00, 0x03, 0x00]);
        assert!(Packet::decode(&mut buf).is_err());
    }
}
