use super::ack_common::is_valid_auth_reason_code;
use crate::error::{MqttError, Result};
use crate::packet::{FixedHeader, MqttPacket, PacketType};
use crate::protocol::v5::properties::Properties;
use crate::protocol::v5::reason_codes::ReasonCode;
use bytes::{Buf, BufMut};

/// MQTT AUTH packet, used by enhanced authentication exchanges.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthPacket {
    pub reason_code: ReasonCode,
    pub properties: Properties,
}

impl AuthPacket {
    #[must_use]
    pub fn new(reason_code: ReasonCode) -> Self {
        Self {
            reason_code,
            properties: Properties::default(),
        }
    }

    #[must_use]
    pub fn success() -> Self {
        Self::new(ReasonCode::Success)
    }
}

impl MqttPacket for AuthPacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Auth
    }

    fn body_len(&self) -> usize {
        if self.reason_code == ReasonCode::Success && self.properties.is_empty() {
            0
        } else {
            1 + self.properties.encoded_len()
        }
    }

    fn encode_body<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        if !is_valid_auth_reason_code(self.reason_code) {
            return Err(MqttError::MalformedPacket(format!(
                "Invalid AUTH reason code: {:?}",
                self.reason_code
            )));
        }

        if self.reason_code != ReasonCode::Success || !self.properties.is_empty() {
            buf.put_u8(self.reason_code.into());
            self.properties.encode(buf)?;
        }

        Ok(())
    }

    fn decode_body<B: Buf>(buf: &mut B, fixed_header: &FixedHeader) -> Result<Self> {
        if fixed_header.remaining_length == 0 {
            return Ok(Self::success());
        }

        if !buf.has_remaining() {
            return Err(MqttError::MalformedPacket(
                "AUTH missing reason code".to_string(),
            ));
        }
        let byte = buf.get_u8();
        let reason_code = ReasonCode::from_u8(byte)
            .filter(|code| is_valid_auth_reason_code(*code))
            .ok_or_else(|| {
                MqttError::MalformedPacket(format!("Invalid AUTH reason code: 0x{byte:02X}"))
            })?;

        let properties = if fixed_header.remaining_length > 1 {
            Properties::decode(buf)?
        } else {
            Properties::default()
        };

        Ok(Self {
            reason_code,
            properties,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Packet;
    use crate::protocol::v5::properties::{PropertyId, PropertyValue};
    use bytes::{Bytes, BytesMut};

    #[test]
    fn test_auth_success_short_form() {
        let packet = AuthPacket::success();
        let bytes = packet.to_bytes().unwrap();
        assert_eq!(&bytes[..], &[0xF0, 0x00]);

        let decoded = match Packet::decode(&mut bytes.clone()).unwrap() {
            Packet::Auth(p) => p,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(decoded.reason_code, ReasonCode::Success);
    }

    #[test]
    fn test_auth_continue_with_method() {
        let mut packet = AuthPacket::new(ReasonCode::ContinueAuthentication);
        packet
            .properties
            .add(
                PropertyId::AuthenticationMethod,
                PropertyValue::Utf8String("SCRAM-SHA-256".to_string()),
            )
            .unwrap();
        packet
            .properties
            .add(
                PropertyId::AuthenticationData,
                PropertyValue::BinaryData(Bytes::from_static(b"client-first")),
            )
            .unwrap();

        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        assert_eq!(packet.encoded_len(), buf.len());

        let decoded = match Packet::decode(&mut buf).unwrap() {
            Packet::Auth(p) => p,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_auth_invalid_reason_code() {
        let mut buf = Bytes::from_static(&[0xF0, 0x01, 0x87]);
        assert!(Packet::decode(&mut buf).is_err());
    }
}
