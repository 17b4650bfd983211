use crate::encoding::{decode_string, encode_string, string_len};
use crate::error::{MqttError, Result};
use crate::packet::{FixedHeader, MqttPacket, PacketType};
use crate::protocol::v5::properties::Properties;
use crate::types::QoS;
use bytes::{Buf, BufMut};

pub use super::subscribe_options::{RetainHandling, SubscriptionOptions};

#[derive(Debug, Clone, PartialEq)]
pub struct TopicFilter {
    pub filter: String,
    pub options: SubscriptionOptions,
}

impl TopicFilter {
    #[must_use]
    pub fn new(filter: impl Into<String>, qos: QoS) -> Self {
        Self {
            filter: filter.into(),
            options: SubscriptionOptions::new(qos),
        }
    }

    #[must_use]
    pub fn with_options(filter: impl Into<String>, options: SubscriptionOptions) -> Self {
        Self {
            filter: filter.into(),
            options,
        }
    }
}

/// MQTT SUBSCRIBE packet.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscribePacket {
    pub packet_id: u16,
    pub filters: Vec<TopicFilter>,
    pub properties: Properties,
}

impl SubscribePacket {
    #[must_use]
    pub fn new(packet_id: u16) -> Self {
        Self {
            packet_id,
            filters: Vec::new(),
            properties: Properties::default(),
        }
    }

    #[must_use]
    pub fn add_filter(mut self, filter: impl Into<String>, qos: QoS) -> Self {
        self.filters.push(TopicFilter::new(filter, qos));
        self
    }

    #[must_use]
    pub fn add_filter_with_options(mut self, filter: TopicFilter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn with_subscription_identifier(mut self, id: u32) -> Self {
        self.properties.set_subscription_identifier(id);
        self
    }

    #[must_use]
    pub fn with_user_property(mut self, key: String, value: String) -> Self {
        self.properties.add_user_property(key, value);
        self
    }
}

impl MqttPacket for SubscribePacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Subscribe
    }

    fn flags(&self) -> u8 {
        0x02
    }

    fn body_len(&self) -> usize {
        2 + self.properties.encoded_len()
            + self
                .filters
                .iter()
                .map(|f| string_len(&f.filter) + 1)
                .sum::<usize>()
    }

    fn encode_body<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        if self.filters.is_empty() {
            return Err(MqttError::ProtocolError(
                "SUBSCRIBE packet must contain at least one topic filter".to_string(),
            ));
        }

        buf.put_u16(self.packet_id);
        self.properties.encode(buf)?;

        for filter in &self.filters {
            encode_string(buf, &filter.filter)?;
            buf.put_u8(filter.options.encode());
        }

        Ok(())
    }

    fn decode_body<B: Buf>(buf: &mut B, fixed_header: &FixedHeader) -> Result<Self> {
        if fixed_header.flags != 0x02 {
            return Err(MqttError::MalformedPacket(format!(
                "Invalid SUBSCRIBE flags: expected 0x02, got 0x{:02X}",
                fixed_header.flags
            )));
        }

        if buf.remaining() < 2 {
            return Err(MqttError::MalformedPacket(
                "SUBSCRIBE missing packet identifier".to_string(),
            ));
        }
        let packet_id = buf.get_u16();

        let properties = Properties::decode(buf)?;

        if !buf.has_remaining() {
            return Err(MqttError::ProtocolError(
                "SUBSCRIBE packet must contain at least one topic filter".to_string(),
            ));
        }

        let mut filters = Vec::new();
        while buf.has_remaining() {
            let filter = decode_string(buf)?;

            if !buf.has_remaining() {
                return Err(MqttError::MalformedPacket(
                    "Missing subscription options for topic filter".to_string(),
                ));
            }

            let options = SubscriptionOptions::decode(buf.get_u8())?;
            filters.push(TopicFilter { filter, options });
        }

        Ok(Self {
            packet_id,
            filters,
            properties,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Packet;
    use crate::protocol::v5::properties::PropertyId;
    use bytes::BytesMut;

    #[test]
    fn test_subscribe_basic() {
        let packet = SubscribePacket::new(123)
            .add_filter("temperature/+", QoS::AtLeastOnce)
            .add_filter("humidity/#", QoS::ExactlyOnce);

        assert_eq!(packet.packet_id, 123);
        assert_eq!(packet.filters.len(), 2);
        assert_eq!(packet.filters[0].options.qos, QoS::AtLeastOnce);
        assert_eq!(packet.filters[1].options.qos, QoS::ExactlyOnce);
    }

    #[test]
    fn test_subscribe_encode_decode() {
        let options = SubscriptionOptions {
            qos: QoS::AtLeastOnce,
            no_local: true,
            retain_as_published: false,
            retain_handling: RetainHandling::DoNotSend,
        };

        let packet = SubscribePacket::new(789)
            .add_filter("sensor/temp", QoS::AtMostOnce)
            .add_filter_with_options(TopicFilter::with_options("sensor/humidity", options))
            .with_subscription_identifier(42);

        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        assert_eq!(packet.encoded_len(), buf.len());
        assert_eq!(buf[0], 0x82);

        let decoded = match Packet::decode(&mut buf).unwrap() {
            Packet::Subscribe(p) => p,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(decoded, packet);
        assert!(decoded
            .properties
            .contains(PropertyId::SubscriptionIdentifier));
    }

    #[test]
    fn test_subscribe_invalid_flags() {
        let mut buf = BytesMut::new();
        buf.put_u16(123);

        let fixed_header = FixedHeader::new(PacketType::Subscribe, 0x00, 2);
        let result = SubscribePacket::decode_body(&mut buf, &fixed_header);
        assert!(result.is_err());
    }

    #[test]
    fn test_subscribe_empty_filters() {
        let packet = SubscribePacket::new(123);

        let mut buf = BytesMut::new();
        assert!(matches!(
            packet.encode(&mut buf),
            Err(MqttError::ProtocolError(_))
        ));
    }

    #[test]
    fn test_subscribe_empty_entry_list_on_decode() {
        // pid + empty property block, no filter entries
        let mut buf = BytesMut::new();
        buf.put_u16(5);
        buf.put_u8(0);

        let fixed_header = FixedHeader::new(PacketType::Subscribe, 0x02, 3);
        assert!(matches!(
            SubscribePacket::decode_body(&mut buf, &fixed_header),
            Err(MqttError::ProtocolError(_))
        ));
    }

    #[test]
    fn test_subscribe_missing_options_byte() {
        let mut buf = BytesMut::new();
        buf.put_u16(5);
        buf.put_u8(0);
        encode_string(&mut buf, "a/b").unwrap();

        let fixed_header = FixedHeader::new(PacketType::Subscribe, 0x02, 8);
        assert!(matches!(
            SubscribePacket::decode_body(&mut buf, &fixed_header),
            Err(MqttError::MalformedPacket(_))
        ));
    }
}
