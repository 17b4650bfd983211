mod accessors;
mod codec;

use crate::error::{MqttError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyId {
    PayloadFormatIndicator = 0x01,
    RequestProblemInformation = 0x17,
    RequestResponseInformation = 0x19,
    MaximumQoS = 0x24,
    RetainAvailable = 0x25,
    WildcardSubscriptionAvailable = 0x28,
    SubscriptionIdentifierAvailable = 0x29,
    SharedSubscriptionAvailable = 0x2A,

    ServerKeepAlive = 0x13,
    ReceiveMaximum = 0x21,
    TopicAliasMaximum = 0x22,
    TopicAlias = 0x23,

    MessageExpiryInterval = 0x02,
    SessionExpiryInterval = 0x11,
    WillDelayInterval = 0x18,
    MaximumPacketSize = 0x27,

    SubscriptionIdentifier = 0x0B,

    ContentType = 0x03,
    ResponseTopic = 0x08,
    AssignedClientIdentifier = 0x12,
    AuthenticationMethod = 0x15,
    ResponseInformation = 0x1A,
    ServerReference = 0x1C,
    ReasonString = 0x1F,

    CorrelationData = 0x09,
    AuthenticationData = 0x16,

    UserProperty = 0x26,
}

impl PropertyId {
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::PayloadFormatIndicator),
            0x02 => Some(Self::MessageExpiryInterval),
            0x03 => Some(Self::ContentType),
            0x08 => Some(Self::ResponseTopic),
            0x09 => Some(Self::CorrelationData),
            0x0B => Some(Self::SubscriptionIdentifier),
            0x11 => Some(Self::SessionExpiryInterval),
            0x12 => Some(Self::AssignedClientIdentifier),
            0x13 => Some(Self::ServerKeepAlive),
            0x15 => Some(Self::AuthenticationMethod),
            0x16 => Some(Self::AuthenticationData),
            0x17 => Some(Self::RequestProblemInformation),
            0x18 => Some(Self::WillDelayInterval),
            0x19 => Some(Self::RequestResponseInformation),
            0x1A => Some(Self::ResponseInformation),
            0x1C => Some(Self::ServerReference),
            0x1F => Some(Self::ReasonString),
            0x21 => Some(Self::ReceiveMaximum),
            0x22 => Some(Self::TopicAliasMaximum),
            0x23 => Some(Self::TopicAlias),
            0x24 => Some(Self::MaximumQoS),
            0x25 => Some(Self::RetainAvailable),
            0x26 => Some(Self::UserProperty),
            0x27 => Some(Self::MaximumPacketSize),
            0x28 => Some(Self::WildcardSubscriptionAvailable),
            0x29 => Some(Self::SubscriptionIdentifierAvailable),
            0x2A => Some(Self::SharedSubscriptionAvailable),
            _ => None,
        }
    }

    #[must_use]
    pub fn allows_multiple(&self) -> bool {
        matches!(self, Self::UserProperty | Self::SubscriptionIdentifier)
    }

    #[must_use]
    pub fn value_type(&self) -> PropertyValueType {
        match self {
            Self::PayloadFormatIndicator
            | Self::RequestProblemInformation
            | Self::RequestResponseInformation
            | Self::MaximumQoS
            | Self::RetainAvailable
            | Self::WildcardSubscriptionAvailable
            | Self::SubscriptionIdentifierAvailable
            | Self::SharedSubscriptionAvailable => PropertyValueType::Byte,

            Self::ServerKeepAlive
            | Self::ReceiveMaximum
            | Self::TopicAliasMaximum
            | Self::TopicAlias => PropertyValueType::TwoByteInteger,

            Self::MessageExpiryInterval
            | Self::SessionExpiryInterval
            | Self::WillDelayInterval
            | Self::MaximumPacketSize => PropertyValueType::FourByteInteger,

            Self::SubscriptionIdentifier => PropertyValueType::VariableByteInteger,

            Self::ContentType
            | Self::ResponseTopic
            | Self::AssignedClientIdentifier
            | Self::AuthenticationMethod
            | Self::ResponseInformation
            | Self::ServerReference
            | Self::ReasonString => PropertyValueType::Utf8String,

            Self::CorrelationData | Self::AuthenticationData => PropertyValueType::BinaryData,

            Self::UserProperty => PropertyValueType::Utf8StringPair,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyValueType {
    Byte,
    TwoByteInteger,
    FourByteInteger,
    VariableByteInteger,
    BinaryData,
    Utf8String,
    Utf8StringPair,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Byte(u8),
    TwoByteInteger(u16),
    FourByteInteger(u32),
    VariableByteInteger(u32),
    BinaryData(bytes::Bytes),
    Utf8String(String),
    Utf8StringPair(String, String),
}

impl PropertyValue {
    #[must_use]
    pub fn value_type(&self) -> PropertyValueType {
        match self {
            Self::Byte(_) => PropertyValueType::Byte,
            Self::TwoByteInteger(_) => PropertyValueType::TwoByteInteger,
            Self::FourByteInteger(_) => PropertyValueType::FourByteInteger,
            Self::VariableByteInteger(_) => PropertyValueType::VariableByteInteger,
            Self::BinaryData(_) => PropertyValueType::BinaryData,
            Self::Utf8String(_) => PropertyValueType::Utf8String,
            Self::Utf8StringPair(_, _) => PropertyValueType::Utf8StringPair,
        }
    }

    #[must_use]
    pub fn matches_type(&self, expected: PropertyValueType) -> bool {
        self.value_type() == expected
    }
}

/// A property block.
///
/// Entries keep their insertion order: the wire contract requires that a
/// decoded block re-encodes to the exact original bytes, so the container is
/// an ordered list rather than a map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    pub(crate) entries: Vec<(PropertyId, PropertyValue)>,
}

impl Properties {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// # Errors
    /// Returns an error if the value shape doesn't match the identifier, the
    /// identifier is a singleton already present, or the value violates its
    /// range constraint.
    pub fn add(&mut self, id: PropertyId, value: PropertyValue) -> Result<()> {
        if !value.matches_type(id.value_type()) {
            return Err(MqttError::ProtocolError(format!(
                "Property {:?} expects type {:?}, got {:?}",
                id,
                id.value_type(),
                value.value_type()
            )));
        }

        if !id.allows_multiple() && self.contains(id) {
            return Err(MqttError::DuplicatePropertyId(id as u8));
        }

        validate_value(id, &value)?;

        self.entries.push((id, value));
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: PropertyId) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, value)| value)
    }

    pub fn get_all(&self, id: PropertyId) -> impl Iterator<Item = &PropertyValue> + '_ {
        self.entries
            .iter()
            .filter(move |(entry_id, _)| *entry_id == id)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn contains(&self, id: PropertyId) -> bool {
        self.entries.iter().any(|(entry_id, _)| *entry_id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PropertyId, &PropertyValue)> + '_ {
        self.entries.iter().map(|(id, value)| (*id, value))
    }
}

/// Range constraints on individual property values. Violations on the parse
/// path surface as protocol errors.
fn validate_value(id: PropertyId, value: &PropertyValue) -> Result<()> {
    match (id, value) {
        (
            PropertyId::PayloadFormatIndicator
            | PropertyId::RequestProblemInformation
            | PropertyId::RequestResponseInformation
            | PropertyId::RetainAvailable
            | PropertyId::WildcardSubscriptionAvailable
            | PropertyId::SubscriptionIdentifierAvailable
            | PropertyId::SharedSubscriptionAvailable,
            PropertyValue::Byte(v),
        ) if *v > 1 => Err(MqttError::ProtocolError(format!(
            "Property {id:?} must be 0 or 1, got {v}"
        ))),
        (PropertyId::MaximumQoS, PropertyValue::Byte(v)) if *v > 1 => Err(
            MqttError::ProtocolError(format!("Maximum QoS must be 0 or 1, got {v}")),
        ),
        (PropertyId::ReceiveMaximum, PropertyValue::TwoByteInteger(0)) => Err(
            MqttError::ProtocolError("Receive maximum must not be 0".to_string()),
        ),
        (PropertyId::TopicAlias, PropertyValue::TwoByteInteger(0)) => Err(
            MqttError::ProtocolError("Topic alias must not be 0".to_string()),
        ),
        (PropertyId::MaximumPacketSize, PropertyValue::FourByteInteger(0)) => Err(
            MqttError::ProtocolError("Maximum packet size must not be 0".to_string()),
        ),
        (PropertyId::SubscriptionIdentifier, PropertyValue::VariableByteInteger(0)) => Err(
            MqttError::ProtocolError("Subscription identifier must not be 0".to_string()),
        ),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{Bytes, BytesMut};

    #[test]
    fn test_property_id_from_u8() {
        assert_eq!(
            PropertyId::from_u8(0x01),
            Some(PropertyId::PayloadFormatIndicator)
        );
        assert_eq!(PropertyId::from_u8(0x26), Some(PropertyId::UserProperty));
        assert_eq!(
            PropertyId::from_u8(0x2A),
            Some(PropertyId::SharedSubscriptionAvailable)
        );
        assert_eq!(PropertyId::from_u8(0xFF), None);
        assert_eq!(PropertyId::from_u8(0x00), None);
    }

    #[test]
    fn test_property_allows_multiple() {
        assert!(PropertyId::UserProperty.allows_multiple());
        assert!(PropertyId::SubscriptionIdentifier.allows_multiple());
        assert!(!PropertyId::PayloadFormatIndicator.allows_multiple());
        assert!(!PropertyId::SessionExpiryInterval.allows_multiple());
    }

    #[test]
    fn test_property_value_type() {
        assert_eq!(
            PropertyId::PayloadFormatIndicator.value_type(),
            PropertyValueType::Byte
        );
        assert_eq!(
            PropertyId::TopicAlias.value_type(),
            PropertyValueType::TwoByteInteger
        );
        assert_eq!(
            PropertyId::SessionExpiryInterval.value_type(),
            PropertyValueType::FourByteInteger
        );
        assert_eq!(
            PropertyId::SubscriptionIdentifier.value_type(),
            PropertyValueType::VariableByteInteger
        );
        assert_eq!(
            PropertyId::ContentType.value_type(),
            PropertyValueType::Utf8String
        );
        assert_eq!(
            PropertyId::CorrelationData.value_type(),
            PropertyValueType::BinaryData
        );
        assert_eq!(
            PropertyId::UserProperty.value_type(),
            PropertyValueType::Utf8StringPair
        );
    }

    #[test]
    fn test_properties_add_valid() {
        let mut props = Properties::new();

        props
            .add(PropertyId::PayloadFormatIndicator, PropertyValue::Byte(1))
            .unwrap();
        props
            .add(
                PropertyId::SessionExpiryInterval,
                PropertyValue::FourByteInteger(3600),
            )
            .unwrap();
        props
            .add(
                PropertyId::UserProperty,
                PropertyValue::Utf8StringPair("key1".to_string(), "value1".to_string()),
            )
            .unwrap();
        props
            .add(
                PropertyId::UserProperty,
                PropertyValue::Utf8StringPair("key2".to_string(), "value2".to_string()),
            )
            .unwrap();

        assert_eq!(props.len(), 4);
    }

    #[test]
    fn test_properties_add_type_mismatch() {
        let mut props = Properties::new();

        let result = props.add(
            PropertyId::PayloadFormatIndicator,
            PropertyValue::FourByteInteger(100),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_properties_add_duplicate_singleton() {
        let mut props = Properties::new();

        props
            .add(PropertyId::PayloadFormatIndicator, PropertyValue::Byte(0))
            .unwrap();

        match props.add(PropertyId::PayloadFormatIndicator, PropertyValue::Byte(1)) {
            Err(MqttError::DuplicatePropertyId(0x01)) => {}
            other => panic!("expected DuplicatePropertyId, got {other:?}"),
        }
    }

    #[test]
    fn test_properties_value_constraints() {
        let mut props = Properties::new();

        assert!(props
            .add(PropertyId::PayloadFormatIndicator, PropertyValue::Byte(2))
            .is_err());
        assert!(props
            .add(PropertyId::MaximumQoS, PropertyValue::Byte(2))
            .is_err());
        assert!(props
            .add(PropertyId::ReceiveMaximum, PropertyValue::TwoByteInteger(0))
            .is_err());
        assert!(props
            .add(PropertyId::TopicAlias, PropertyValue::TwoByteInteger(0))
            .is_err());
        assert!(props
            .add(
                PropertyId::SubscriptionIdentifier,
                PropertyValue::VariableByteInteger(0)
            )
            .is_err());

        assert!(props
            .add(PropertyId::MaximumQoS, PropertyValue::Byte(1))
            .is_ok());
        assert!(props
            .add(PropertyId::ReceiveMaximum, PropertyValue::TwoByteInteger(1))
            .is_ok());
    }

    #[test]
    fn test_properties_get() {
        let mut props = Properties::new();
        props
            .add(
                PropertyId::ContentType,
                PropertyValue::Utf8String("text/html".to_string()),
            )
            .unwrap();

        match props.get(PropertyId::ContentType).unwrap() {
            PropertyValue::Utf8String(s) => assert_eq!(s, "text/html"),
            _ => panic!("Wrong value type"),
        }

        assert!(props.get(PropertyId::ResponseTopic).is_none());
    }

    #[test]
    fn test_properties_get_all() {
        let mut props = Properties::new();

        props
            .add(
                PropertyId::UserProperty,
                PropertyValue::Utf8StringPair("k1".to_string(), "v1".to_string()),
            )
            .unwrap();
        props
            .add(
                PropertyId::UserProperty,
                PropertyValue::Utf8StringPair("k2".to_string(), "v2".to_string()),
            )
            .unwrap();

        assert_eq!(props.get_all(PropertyId::UserProperty).count(), 2);
    }

    #[test]
    fn test_properties_preserve_insertion_order() {
        let mut props = Properties::new();
        props.add_user_property("b".to_string(), "2".to_string());
        props
            .add(PropertyId::TopicAlias, PropertyValue::TwoByteInteger(5))
            .unwrap();
        props.add_user_property("a".to_string(), "1".to_string());

        let ids: Vec<PropertyId> = props.iter().map(|(id, _)| id).collect();
        assert_eq!(
            ids,
            vec![
                PropertyId::UserProperty,
                PropertyId::TopicAlias,
                PropertyId::UserProperty
            ]
        );
    }

    #[test]
    fn test_properties_encode_decode_round_trip() {
        let mut props = Properties::new();
        props
            .add(PropertyId::PayloadFormatIndicator, PropertyValue::Byte(1))
            .unwrap();
        props
            .add(PropertyId::TopicAlias, PropertyValue::TwoByteInteger(100))
            .unwrap();
        props
            .add(
                PropertyId::SubscriptionIdentifier,
                PropertyValue::VariableByteInteger(123),
            )
            .unwrap();
        props
            .add(
                PropertyId::ContentType,
                PropertyValue::Utf8String("text/plain".to_string()),
            )
            .unwrap();
        props
            .add(
                PropertyId::CorrelationData,
                PropertyValue::BinaryData(Bytes::from(vec![1, 2, 3, 4])),
            )
            .unwrap();
        props
            .add(
                PropertyId::UserProperty,
                PropertyValue::Utf8StringPair("key".to_string(), "value".to_string()),
            )
            .unwrap();

        let mut buf = BytesMut::new();
        props.encode(&mut buf).unwrap();
        let encoded = buf.clone().freeze();

        let decoded = Properties::decode(&mut buf).unwrap();
        assert_eq!(decoded, props);

        // Re-encoding reproduces the original bytes.
        let mut buf2 = BytesMut::new();
        decoded.encode(&mut buf2).unwrap();
        assert_eq!(buf2.freeze(), encoded);
    }
}
