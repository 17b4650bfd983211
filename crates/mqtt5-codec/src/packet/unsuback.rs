use super::ack_common::is_valid_unsuback_reason_code;
use crate::error::{MqttError, Result};
use crate::packet::{FixedHeader, MqttPacket, PacketType};
use crate::protocol::v5::properties::Properties;
use crate::protocol::v5::reason_codes::ReasonCode;
use bytes::{Buf, BufMut};

/// MQTT UNSUBACK packet.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsubAckPacket {
    pub packet_id: u16,
    pub properties: Properties,
    pub reason_codes: Vec<ReasonCode>,
}

impl UnsubAckPacket {
    #[must_use]
    pub fn new(packet_id: u16, reason_codes: Vec<ReasonCode>) -> Self {
        Self {
            packet_id,
            properties: Properties::default(),
            reason_codes,
        }
    }
}

impl MqttPacket for UnsubAckPacket {
    fn packet_type(&self) -> PacketType {
        PacketType::UnsubAck
    }

    fn body_len(&self) -> usize {
        2 + self.properties.encoded_len() + self.reason_codes.len()
    }

    fn encode_body<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        if self.reason_codes.is_empty() {
            return Err(MqttError::ProtocolError(
                "UNSUBACK packet must contain at least one reason code".to_string(),
            ));
        }

        buf.put_u16(self.packet_id);
        self.properties.encode(buf)?;

        for code in &self.reason_codes {
            if !is_valid_unsuback_reason_code(*code) {
                return Err(MqttError::MalformedPacket(format!(
                    "Invalid UNSUBACK reason code: {code:?}"
                )));
            }
            buf.put_u8((*code).into());
        }

        Ok(())
    }

    fn decode_body<B: Buf>(buf: &mut B, _fixed_header: &FixedHeader) -> Result<Self> {
        if buf.remaining() < 2 {
            return Err(MqttError::MalformedPacket(
                "UNSUBACK missing packet identifier".to_string(),
            ));
        }
        let packet_id = buf.get_u16();

        let properties = Properties::decode(buf)?;

        if !buf.has_remaining() {
            return Err(MqttError::ProtocolError(
                "UNSUBACK packet must contain at least one reason code".to_string(),
            ));
        }

        let mut reason_codes = Vec::with_capacity(buf.remaining());
        while buf.has_remaining() {
            let byte = buf.get_u8();
            let code = ReasonCode::from_u8(byte)
                .filter(|code| is_valid_unsuback_reason_code(*code))
                .ok_or_else(|| {
                    MqttError::MalformedPacket(format!(
                        "Invalid UNSUBACK reason code: 0x{byte:02X}"
                    ))
                })?;
            reason_codes.push(code);
        }

        Ok(Self {
            packet_id,
            properties,
            reason_codes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Packet;
    use bytes::BytesMut;

    #[test]
    fn test_unsuback_round_trip() {
        let packet = UnsubAckPacket::new(
            8,
            vec![ReasonCode::Success, ReasonCode::NoSubscriptionExisted],
        );

        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        assert_eq!(packet.encoded_len(), buf.len());

        let decoded = match Packet::decode(&mut buf).unwrap() {
            Packet::UnsubAck(p) => p,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_unsuback_empty_codes_rejected() {
        let packet = UnsubAckPacket::new(8, vec![]);
        let mut buf = BytesMut::new();
        assert!(packet.encode(&mut buf).is_err());
    }
}
