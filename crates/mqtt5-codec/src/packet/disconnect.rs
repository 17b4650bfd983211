use super::ack_common::is_valid_disconnect_reason_code;
use crate::error::{MqttError, Result};
use crate::packet::{FixedHeader, MqttPacket, PacketType};
use crate::protocol::v5::properties::Properties;
use crate::protocol::v5::reason_codes::ReasonCode;
use bytes::{Buf, BufMut};

/// MQTT DISCONNECT packet.
///
/// A remaining length of 0 stands for a normal disconnection with no
/// properties.
#[derive(Debug, Clone, PartialEq)]
pub struct DisconnectPacket {
    pub reason_code: ReasonCode,
    pub properties: Properties,
}

impl DisconnectPacket {
    #[must_use]
    pub fn new(reason_code: ReasonCode) -> Self {
        Self {
            reason_code,
            properties: Properties::default(),
        }
    }

    #[must_use]
    pub fn normal() -> Self {
        Self::new(ReasonCode::Success)
    }
}

impl Default for DisconnectPacket {
    fn default() -> Self {
        Self::normal()
    }
}

impl MqttPacket for DisconnectPacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Disconnect
    }

    fn body_len(&self) -> usize {
        if self.reason_code == ReasonCode::Success && self.properties.is_empty() {
            0
        } else {
            1 + self.properties.encoded_len()
        }
    }

    fn encode_body<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        if !is_valid_disconnect_reason_code(self.reason_code) {
            return Err(MqttError::MalformedPacket(format!(
                "Invalid DISCONNECT reason code: {:?}",
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
            return Ok(Self::normal());
        }

        if !buf.has_remaining() {
            return Err(MqttError::MalformedPacket(
                "DISCONNECT missing reason code".to_string(),
            ));
        }
        let byte = buf.get_u8();
        let reason_code = ReasonCode::from_u8(byte)
            .filter(|code| is_valid_disconnect_reason_code(*code))
            .ok_or_else(|| {
                MqttError::MalformedPacket(format!(
                    "Invalid DISCONNECT reason code: 0x{byte:02X}"
                ))
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
