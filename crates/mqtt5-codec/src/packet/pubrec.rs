use super::ack_common::{define_ack_packet, is_valid_publish_ack_reason_code};
use crate::packet::PacketType;

define_ack_packet! {
    /// MQTT PUBREC packet (`QoS` 2 publish received, part 1)
    pub struct PubRecPacket;
    packet_type = PacketType::PubRec;
    validator = is_valid_publish_ack_reason_code;
    error_prefix = "PUBREC";
}
