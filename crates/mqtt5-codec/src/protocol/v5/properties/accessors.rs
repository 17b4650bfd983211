//! Typed convenience accessors over the raw property list.

use super::{Properties, PropertyId, PropertyValue};
use bytes::Bytes;

impl Properties {
    pub fn set_payload_format_indicator(&mut self, is_utf8: bool) {
        self.entries.push((
            PropertyId::PayloadFormatIndicator,
            PropertyValue::Byte(u8::from(is_utf8)),
        ));
    }

    #[must_use]
    pub fn get_payload_format_indicator(&self) -> Option<bool> {
        match self.get(PropertyId::PayloadFormatIndicator) {
            Some(PropertyValue::Byte(v)) => Some(*v != 0),
            _ => None,
        }
    }

    pub fn set_message_expiry_interval(&mut self, seconds: u32) {
        self.entries.push((
            PropertyId::MessageExpiryInterval,
            PropertyValue::FourByteInteger(seconds),
        ));
    }

    #[must_use]
    pub fn get_message_expiry_interval(&self) -> Option<u32> {
        match self.get(PropertyId::MessageExpiryInterval) {
            Some(PropertyValue::FourByteInteger(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn set_session_expiry_interval(&mut self, seconds: u32) {
        self.entries.push((
            PropertyId::SessionExpiryInterval,
            PropertyValue::FourByteInteger(seconds),
        ));
    }

    #[must_use]
    pub fn get_session_expiry_interval(&self) -> Option<u32> {
        match self.get(PropertyId::SessionExpiryInterval) {
            Some(PropertyValue::FourByteInteger(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn set_topic_alias(&mut self, alias: u16) {
        self.entries.push((
            PropertyId::TopicAlias,
            PropertyValue::TwoByteInteger(alias),
        ));
    }

    #[must_use]
    pub fn get_topic_alias(&self) -> Option<u16> {
        match self.get(PropertyId::TopicAlias) {
            Some(PropertyValue::TwoByteInteger(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn set_receive_maximum(&mut self, maximum: u16) {
        self.entries.push((
            PropertyId::ReceiveMaximum,
            PropertyValue::TwoByteInteger(maximum),
        ));
    }

    #[must_use]
    pub fn get_receive_maximum(&self) -> Option<u16> {
        match self.get(PropertyId::ReceiveMaximum) {
            Some(PropertyValue::TwoByteInteger(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn set_maximum_packet_size(&mut self, size: u32) {
        self.entries.push((
            PropertyId::MaximumPacketSize,
            PropertyValue::FourByteInteger(size),
        ));
    }

    #[must_use]
    pub fn get_maximum_packet_size(&self) -> Option<u32> {
        match self.get(PropertyId::MaximumPacketSize) {
            Some(PropertyValue::FourByteInteger(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn set_response_topic(&mut self, topic: String) {
        self.entries
            .push((PropertyId::ResponseTopic, PropertyValue::Utf8String(topic)));
    }

    pub fn set_content_type(&mut self, content_type: String) {
        self.entries.push((
            PropertyId::ContentType,
            PropertyValue::Utf8String(content_type),
        ));
    }

    pub fn set_correlation_data(&mut self, data: Bytes) {
        self.entries.push((
            PropertyId::CorrelationData,
            PropertyValue::BinaryData(data),
        ));
    }

    pub fn set_reason_string(&mut self, reason: String) {
        self.entries
            .push((PropertyId::ReasonString, PropertyValue::Utf8String(reason)));
    }

    pub fn set_subscription_identifier(&mut self, id: u32) {
        self.entries.push((
            PropertyId::SubscriptionIdentifier,
            PropertyValue::VariableByteInteger(id),
        ));
    }

    pub fn add_user_property(&mut self, key: String, value: String) {
        self.entries.push((
            PropertyId::UserProperty,
            PropertyValue::Utf8StringPair(key, value),
        ));
    }

    pub fn remove_user_property_by_key(&mut self, key: &str) {
        self.entries.retain(|(_, v)| {
            if let PropertyValue::Utf8StringPair(k, _) = v {
                k != key
            } else {
                true
            }
        });
    }

    #[must_use]
    pub fn get_user_property_value(&self, key: &str) -> Option<&str> {
        self.get_all(PropertyId::UserProperty).find_map(|v| {
            if let PropertyValue::Utf8StringPair(k, val) = v {
                if k == key {
                    return Some(val.as_str());
                }
            }
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessors() {
        let mut props = Properties::new();
        props.set_topic_alias(7);
        props.set_message_expiry_interval(120);
        props.set_payload_format_indicator(true);

        assert_eq!(props.get_topic_alias(), Some(7));
        assert_eq!(props.get_message_expiry_interval(), Some(120));
        assert_eq!(props.get_payload_format_indicator(), Some(true));
        assert_eq!(props.get_session_expiry_interval(), None);
    }

    #[test]
    fn test_user_property_lookup() {
        let mut props = Properties::new();
        props.add_user_property("env".to_string(), "prod".to_string());
        props.add_user_property("region".to_string(), "eu".to_string());

        assert_eq!(props.get_user_property_value("region"), Some("eu"));
        assert_eq!(props.get_user_property_value("missing"), None);
    }

    #[test]
    fn test_remove_user_property_by_key() {
        let mut props = Properties::new();
        props.add_user_property("keep".to_string(), "1".to_string());
        props.add_user_property("drop".to_string(), "2".to_string());
        props.add_user_property("drop".to_string(), "3".to_string());

        props.remove_user_property_by_key("drop");

        assert_eq!(props.get_all(PropertyId::UserProperty).count(), 1);
        assert_eq!(props.get_user_property_value("keep"), Some("1"));
    }
}
