use crate::constants::publish::{DUP_MASK, QOS_MASK, QOS_SHIFT, RETAIN_MASK};
use crate::encoding::{decode_string, encode_string, string_len};
use crate::error::{MqttError, Result};
use crate::packet::{FixedHeader, MqttPacket, PacketType};
use crate::protocol::v5::properties::Properties;
use crate::types::QoS;
use crate::validation::validate_utf8;
use bytes::{Buf, BufMut, Bytes};

/// MQTT PUBLISH packet.
///
/// The payload is a [`Bytes`] view: decoded packets point into the receive
/// buffer without copying, and a cloned packet shares the same storage.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishPacket {
    pub topic_name: String,
    pub packet_id: Option<u16>,
    pub qos: QoS,
    pub dup: bool,
    pub retain: bool,
    pub properties: Properties,
    pub payload: Bytes,
}

impl PublishPacket {
    #[must_use]
    pub fn new(topic_name: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic_name: topic_name.into(),
            packet_id: None,
            qos: QoS::AtMostOnce,
            dup: false,
            retain: false,
            properties: Properties::default(),
            payload: payload.into(),
        }
    }

    #[must_use]
    pub fn with_qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }

    #[must_use]
    pub fn with_packet_id(mut self, packet_id: u16) -> Self {
        self.packet_id = Some(packet_id);
        self
    }

    #[must_use]
    pub fn with_retain(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }

    /// Checks the payload against a declared payload format indicator.
    ///
    /// # Errors
    /// `PayloadFormatInvalid` when the indicator claims UTF-8 but the payload
    /// is not a well-formed MQTT UTF-8 string.
    pub fn validate_payload_format(&self) -> Result<()> {
        if self.properties.get_payload_format_indicator() == Some(true)
            && !validate_utf8(&self.payload).is_well_formed()
        {
            return Err(MqttError::PayloadFormatInvalid);
        }
        Ok(())
    }
}

impl MqttPacket for PublishPacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Publish
    }

    fn flags(&self) -> u8 {
        let mut flags = (self.qos as u8) << QOS_SHIFT;
        if self.dup {
            flags |= DUP_MASK;
        }
        if self.retain {
            flags |= RETAIN_MASK;
        }
        flags
    }

    fn body_len(&self) -> usize {
        let packet_id_len = if self.qos == QoS::AtMostOnce { 0 } else { 2 };
        string_len(&self.topic_name)
            + packet_id_len
            + self.properties.encoded_len()
            + self.payload.len()
    }

    fn encode_body<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        if self.dup && self.qos == QoS::AtMostOnce {
            return Err(MqttError::MalformedPacket(
                "DUP must be 0 for QoS 0 PUBLISH".to_string(),
            ));
        }

        if self.topic_name.is_empty() && self.properties.get_topic_alias().is_none() {
            return Err(MqttError::ProtocolError(
                "PUBLISH topic name may be empty only with a topic alias".to_string(),
            ));
        }

        encode_string(buf, &self.topic_name)?;

        if self.qos != QoS::AtMostOnce {
            let packet_id = self.packet_id.ok_or_else(|| {
                MqttError::ProtocolError(
                    "QoS > 0 PUBLISH requires a packet identifier".to_string(),
                )
            })?;
            if packet_id == 0 {
                return Err(MqttError::ProtocolError(
                    "Packet identifier must not be 0".to_string(),
                ));
            }
            buf.put_u16(packet_id);
        }

        self.properties.encode(buf)?;
        buf.put_slice(&self.payload);
        Ok(())
    }

    fn decode_body<B: Buf>(buf: &mut B, fixed_header: &FixedHeader) -> Result<Self> {
        let flags = fixed_header.flags;
        let qos = QoS::from_bits((flags & QOS_MASK) >> QOS_SHIFT).ok_or_else(|| {
            MqttError::MalformedPacket("PUBLISH QoS bits must not be 3".to_string())
        })?;
        let dup = flags & DUP_MASK != 0;
        let retain = flags & RETAIN_MASK != 0;

        if dup && qos == QoS::AtMostOnce {
            return Err(MqttError::MalformedPacket(
                "DUP must be 0 for QoS 0 PUBLISH".to_string(),
            ));
        }

        let topic_name = decode_string(buf)?;

        let packet_id = if qos == QoS::AtMostOnce {
            None
        } else {
            if buf.remaining() < 2 {
                return Err(MqttError::MalformedPacket(
                    "PUBLISH missing packet identifier".to_string(),
                ));
            }
            let packet_id = buf.get_u16();
            if packet_id == 0 {
                return Err(MqttError::ProtocolError(
                    "Packet identifier must not be 0".to_string(),
                ));
            }
            Some(packet_id)
        };

        let properties = Properties::decode(buf)?;

        if topic_name.is_empty() && properties.get_topic_alias().is_none() {
            return Err(MqttError::ProtocolError(
                "PUBLISH topic name may be empty only with a topic alias".to_string(),
            ));
        }

        let payload = buf.copy_to_bytes(buf.remaining());

        Ok(Self {
            topic_name,
            packet_id,
            qos,
            dup,
            retain,
            properties,
            payload,
        })
    }
}
