use crate::protocol::v5::reason_codes::ReasonCode;

pub fn is_valid_publish_ack_reason_code(code: ReasonCode) -> bool {
    matches!(
        code,
        ReasonCode::Success
            | ReasonCode::NoMatchingSubscribers
            | ReasonCode::UnspecifiedError
            | ReasonCode::ImplementationSpecificError
            | ReasonCode::NotAuthorized
            | ReasonCode::TopicNameInvalid
            | ReasonCode::PacketIdentifierInUse
            | ReasonCode::QuotaExceeded
            | ReasonCode::PayloadFormatInvalid
    )
}

pub fn is_valid_pubrel_reason_code(code: ReasonCode) -> bool {
    matches!(
        code,
        ReasonCode::Success | ReasonCode::PacketIdentifierNotFound
    )
}

pub fn is_valid_connack_reason_code(code: ReasonCode) -> bool {
    matches!(
        code,
        ReasonCode::Success
            | ReasonCode::UnspecifiedError
            | ReasonCode::MalformedPacket
            | ReasonCode::ProtocolError
            | ReasonCode::ImplementationSpecificError
            | ReasonCode::UnsupportedProtocolVersion
            | ReasonCode::ClientIdentifierNotValid
            | ReasonCode::BadUsernameOrPassword
            | ReasonCode::NotAuthorized
            | ReasonCode::ServerUnavailable
            | ReasonCode::ServerBusy
            | ReasonCode::Banned
            | ReasonCode::BadAuthenticationMethod
            | ReasonCode::TopicNameInvalid
            | ReasonCode::PacketTooLarge
            | ReasonCode::QuotaExceeded
            | ReasonCode::PayloadFormatInvalid
            | ReasonCode::RetainNotSupported
            | ReasonCode::QoSNotSupported
            | ReasonCode::UseAnotherServer
            | ReasonCode::ServerMoved
            | ReasonCode::ConnectionRateExceeded
    )
}

pub fn is_valid_suback_reason_code(code: ReasonCode) -> bool {
    matches!(
        code,
        ReasonCode::Success
            | ReasonCode::GrantedQoS1
            | ReasonCode::GrantedQoS2
            | ReasonCode::UnspecifiedError
            | ReasonCode::ImplementationSpecificError
            | ReasonCode::NotAuthorized
            | ReasonCode::TopicFilterInvalid
            | ReasonCode::PacketIdentifierInUse
            | ReasonCode::QuotaExceeded
            | ReasonCode::SharedSubscriptionsNotSupported
            | ReasonCode::SubscriptionIdentifiersNotSupported
            | ReasonCode::WildcardSubscriptionsNotSupported
    )
}

pub fn is_valid_unsuback_reason_code(code: ReasonCode) -> bool {
    matches!(
        code,
        ReasonCode::Success
            | ReasonCode::NoSubscriptionExisted
            | ReasonCode::UnspecifiedError
            | ReasonCode::ImplementationSpecificError
            | ReasonCode::NotAuthorized
            | ReasonCode::TopicFilterInvalid
            | ReasonCode::PacketIdentifierInUse
    )
}

pub fn is_valid_disconnect_reason_code(code: ReasonCode) -> bool {
    matches!(
        code,
        ReasonCode::Success
            | ReasonCode::DisconnectWithWillMessage
            | ReasonCode::UnspecifiedError
            | ReasonCode::MalformedPacket
            | ReasonCode::ProtocolError
            | ReasonCode::ImplementationSpecificError
            | ReasonCode::NotAuthorized
            | ReasonCode::ServerBusy
            | ReasonCode::ServerShuttingDown
            | ReasonCode::KeepAliveTimeout
            | ReasonCode::SessionTakenOver
            | ReasonCode::TopicFilterInvalid
            | ReasonCode::TopicNameInvalid
            | ReasonCode::ReceiveMaximumExceeded
            | ReasonCode::TopicAliasInvalid
            | ReasonCode::PacketTooLarge
            | ReasonCode::MessageRateTooHigh
            | ReasonCode::QuotaExceeded
            | ReasonCode::AdministrativeAction
            | ReasonCode::PayloadFormatInvalid
            | ReasonCode::RetainNotSupported
            | ReasonCode::QoSNotSupported
            | ReasonCode::UseAnotherServer
            | ReasonCode::ServerMoved
            | ReasonCode::SharedSubscriptionsNotSupported
            | ReasonCode::ConnectionRateExceeded
            | ReasonCode::MaximumConnectTime
            | ReasonCode::SubscriptionIdentifiersNotSupported
            | ReasonCode::WildcardSubscriptionsNotSupported
    )
}

pub fn is_valid_auth_reason_code(code: ReasonCode) -> bool {
    matches!(
        code,
        ReasonCode::Success | ReasonCode::ContinueAuthentication | ReasonCode::ReAuthenticate
    )
}

/// Defines one of the four publish acknowledgement packets. They share the
/// same variable header (packet identifier, optional reason code, optional
/// properties) and differ only in type, flags and reason-code table.
macro_rules! define_ack_packet {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
        packet_type = $ptype:expr;
        validator = $validator:path;
        error_prefix = $prefix:literal;
    ) => {
        $crate::packet::ack_common::define_ack_packet! {
            $(#[$meta])*
            pub struct $name;
            packet_type = $ptype;
            validator = $validator;
            error_prefix = $prefix;
            flags = 0x00;
            validate_flags = false;
        }
    };
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
        packet_type = $ptype:expr;
        validator = $validator:path;
        error_prefix = $prefix:literal;
        flags = $flags:expr;
        validate_flags = $validate_flags:expr;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            pub packet_id: u16,
            pub reason_code: $crate::protocol::v5::reason_codes::ReasonCode,
            pub properties: $crate::protocol::v5::properties::Properties,
        }

        impl $name {
            #[must_use]
            pub fn new(packet_id: u16) -> Self {
                Self {
                    packet_id,
                    reason_code: $crate::protocol::v5::reason_codes::ReasonCode::Success,
                    properties: $crate::protocol::v5::properties::Properties::default(),
                }
            }

            #[must_use]
            pub fn new_with_reason(
                packet_id: u16,
                reason_code: $crate::protocol::v5::reason_codes::ReasonCode,
            ) -> Self {
                Self {
                    packet_id,
                    reason_code,
                    properties: $crate::protocol::v5::properties::Properties::default(),
                }
            }

            #[must_use]
            pub fn with_reason_string(mut self, reason: String) -> Self {
                self.properties.set_reason_string(reason);
                self
            }

            #[must_use]
            pub fn with_user_property(mut self, key: String, value: String) -> Self {
                self.properties.add_user_property(key, value);
                self
            }

            #[must_use]
            pub fn create_header(&self) -> $crate::packet::AckPacketHeader {
                $crate::packet::AckPacketHeader::create(self.packet_id, self.reason_code)
            }

            /// # Errors
            /// Returns an error if the reason code in the header is invalid.
            pub fn from_header(
                header: $crate::packet::AckPacketHeader,
                properties: $crate::protocol::v5::properties::Properties,
            ) -> $crate::error::Result<Self> {
                let reason_code = header.get_reason_code().ok_or_else(|| {
                    $crate::error::MqttError::MalformedPacket(format!(
                        concat!("Invalid ", $prefix, " reason code: 0x{:02X}"),
                        header.reason_code
                    ))
                })?;

                if !$validator(reason_code) {
                    return Err($crate::error::MqttError::MalformedPacket(format!(
                        concat!("Invalid ", $prefix, " reason code: {:?}"),
                        reason_code
                    )));
                }

                Ok(Self {
                    packet_id: header.packet_id,
                    reason_code,
                    properties,
                })
            }
        }

        impl $crate::packet::MqttPacket for $name {
            fn packet_type(&self) -> $crate::packet::PacketType {
                $ptype
            }

            fn flags(&self) -> u8 {
                $flags
            }

            fn body_len(&self) -> usize {
                if self.reason_code == $crate::protocol::v5::reason_codes::ReasonCode::Success
                    && self.properties.is_empty()
                {
                    2
                } else {
                    3 + self.properties.encoded_len()
                }
            }

            fn encode_body<B: ::bytes::BufMut>(&self, buf: &mut B) -> $crate::error::Result<()> {
                if !$validator(self.reason_code) {
                    return Err($crate::error::MqttError::MalformedPacket(format!(
                        concat!("Invalid ", $prefix, " reason code: {:?}"),
                        self.reason_code
                    )));
                }

                buf.put_u16(self.packet_id);

                // Reason code and properties are omitted entirely for a
                // plain success with no properties.
                if self.reason_code != $crate::protocol::v5::reason_codes::ReasonCode::Success
                    || !self.properties.is_empty()
                {
                    buf.put_u8(self.reason_code.into());
                    self.properties.encode(buf)?;
                }

                Ok(())
            }

            fn decode_body<B: ::bytes::Buf>(
                buf: &mut B,
                fixed_header: &$crate::packet::FixedHeader,
            ) -> $crate::error::Result<Self> {
                if $validate_flags && fixed_header.flags != $flags {
                    return Err($crate::error::MqttError::MalformedPacket(format!(
                        concat!("Invalid ", $prefix, " flags: expected 0x{:02X}, got 0x{:02X}"),
                        $flags, fixed_header.flags
                    )));
                }

                if buf.remaining() < 2 {
                    return Err($crate::error::MqttError::MalformedPacket(
                        concat!($prefix, " missing packet identifier").to_string(),
                    ));
                }
                let packet_id = buf.get_u16();

                if fixed_header.remaining_length <= 2 {
                    return Ok(Self::new(packet_id));
                }

                if !buf.has_remaining() {
                    return Err($crate::error::MqttError::MalformedPacket(
                        concat!($prefix, " missing reason code").to_string(),
                    ));
                }
                let reason_byte = buf.get_u8();
                let header = $crate::packet::AckPacketHeader {
                    packet_id,
                    reason_code: reason_byte,
                };

                let properties = if fixed_header.remaining_length > 3 {
                    $crate::protocol::v5::properties::Properties::decode(buf)?
                } else {
                    $crate::protocol::v5::properties::Properties::default()
                };

                Self::from_header(header, properties)
            }
        }
    };
}

pub(crate) use define_ack_packet;
