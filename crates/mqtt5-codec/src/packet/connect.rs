use crate::constants::{connect, PROTOCOL_LEVEL, PROTOCOL_NAME};
use crate::encoding::{
    binary_len, decode_binary, decode_string, encode_binary, encode_string, string_len,
};
use crate::error::{MqttError, Result};
use crate::packet::{FixedHeader, MqttPacket, PacketType};
use crate::protocol::v5::properties::Properties;
use crate::types::{QoS, WillMessage};
use bytes::{Buf, BufMut, Bytes};

/// MQTT CONNECT packet.
///
/// An empty client identifier asks the server to assign one; the assignment
/// comes back in the CONNACK `AssignedClientIdentifier` property.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectPacket {
    pub client_id: String,
    pub clean_start: bool,
    pub keep_alive: u16,
    pub properties: Properties,
    pub will: Option<WillMessage>,
    pub username: Option<String>,
    pub password: Option<Bytes>,
}

impl ConnectPacket {
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            clean_start: true,
            keep_alive: 60,
            properties: Properties::default(),
            will: None,
            username: None,
            password: None,
        }
    }

    #[must_use]
    pub fn with_clean_start(mut self, clean_start: bool) -> Self {
        self.clean_start = clean_start;
        self
    }

    #[must_use]
    pub fn with_keep_alive(mut self, seconds: u16) -> Self {
        self.keep_alive = seconds;
        self
    }

    #[must_use]
    pub fn with_will(mut self, will: WillMessage) -> Self {
        self.will = Some(will);
        self
    }

    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<Bytes>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    fn connect_flags(&self) -> u8 {
        let mut flags = 0u8;
        if self.clean_start {
            flags |= connect::CLEAN_START_MASK;
        }
        if let Some(will) = &self.will {
            flags |= connect::WILL_FLAG_MASK;
            flags |= (will.qos as u8) << connect::WILL_QOS_SHIFT;
            if will.retain {
                flags |= connect::WILL_RETAIN_MASK;
            }
        }
        if self.password.is_some() {
            flags |= connect::PASSWORD_MASK;
        }
        if self.username.is_some() {
            flags |= connect::USERNAME_MASK;
        }
        flags
    }
}

impl MqttPacket for ConnectPacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Connect
    }

    fn body_len(&self) -> usize {
        let mut len = string_len(PROTOCOL_NAME) + 1 + 1 + 2 + self.properties.encoded_len();
        len += string_len(&self.client_id);
        if let Some(will) = &self.will {
            len += will.properties.encoded_len()
                + string_len(&will.topic)
                + binary_len(&will.payload);
        }
        if let Some(username) = &self.username {
            len += string_len(username);
        }
        if let Some(password) = &self.password {
            len += binary_len(password);
        }
        len
    }

    fn encode_body<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        encode_string(buf, PROTOCOL_NAME)?;
        buf.put_u8(PROTOCOL_LEVEL);
        buf.put_u8(self.connect_flags());
        buf.put_u16(self.keep_alive);
        self.properties.encode(buf)?;

        encode_string(buf, &self.client_id)?;

        if let Some(will) = &self.will {
            will.properties.encode(buf)?;
            encode_string(buf, &will.topic)?;
            encode_binary(buf, &will.payload)?;
        }

        if let Some(username) = &self.username {
            encode_string(buf, username)?;
        }
        if let Some(password) = &self.password {
            encode_binary(buf, password)?;
        }

        Ok(())
    }

    fn decode_body<B: Buf>(buf: &mut B, _fixed_header: &FixedHeader) -> Result<Self> {
        let protocol_name = decode_string(buf)?;
        if protocol_name != PROTOCOL_NAME {
            return Err(MqttError::MalformedPacket(format!(
                "Invalid protocol name: {protocol_name:?}"
            )));
        }

        if !buf.has_remaining() {
            return Err(MqttError::MalformedPacket(
                "CONNECT missing protocol level".to_string(),
            ));
        }
        let level = buf.get_u8();
        if level != PROTOCOL_LEVEL {
            return Err(MqttError::UnsupportedProtocolVersion);
        }

        if buf.remaining() < 3 {
            return Err(MqttError::MalformedPacket(
                "CONNECT missing connect flags or keep alive".to_string(),
            ));
        }
        let flags = buf.get_u8();
        if flags & connect::RESERVED_MASK != 0 {
            return Err(MqttError::MalformedPacket(
                "CONNECT reserved flag bit must be 0".to_string(),
            ));
        }

        let clean_start = flags & connect::CLEAN_START_MASK != 0;
        let will_flag = flags & connect::WILL_FLAG_MASK != 0;
        let will_qos_bits = (flags & connect::WILL_QOS_MASK) >> connect::WILL_QOS_SHIFT;
        let will_retain = flags & connect::WILL_RETAIN_MASK != 0;
        let has_password = flags & connect::PASSWORD_MASK != 0;
        let has_username = flags & connect::USERNAME_MASK != 0;

        if !will_flag && (will_qos_bits != 0 || will_retain) {
            return Err(MqttError::MalformedPacket(
                "Will QoS and retain must be 0 without a will".to_string(),
            ));
        }
        let will_qos = QoS::from_bits(will_qos_bits).ok_or_else(|| {
            MqttError::MalformedPacket("Will QoS must not be 3".to_string())
        })?;

        let keep_alive = buf.get_u16();
        let properties = Properties::decode(buf)?;

        let client_id = decode_string(buf)?;

        let will = if will_flag {
            let will_properties = Properties::decode(buf)?;
            let topic = decode_string(buf)?;
            let payload = decode_binary(buf)?;
            Some(WillMessage {
                topic,
                payload,
                qos: will_qos,
                retain: will_retain,
                properties: will_properties,
            })
        } else {
            None
        };

        let username = if has_username {
            Some(decode_string(buf)?)
        } else {
            None
        };
        let password = if has_password {
            Some(decode_binary(buf)?)
        } else {
            None
        };

        Ok(Self {
            client_id,
            clean_start,
            keep_alive,
            properties,
            will,
            username,
            password,
        })
    }
}
