use crate::error::{MqttError, Result};
use crate::packet::{FixedHeader, MqttPacket, PacketType};
use bytes::{Buf, BufMut};

/// MQTT PINGREQ packet. Fixed header only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PingReqPacket;

/// MQTT PINGRESP packet. Fixed header only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PingRespPacket;

macro_rules! impl_ping_packet {
    ($name:ident, $ptype:expr, $prefix:literal) => {
        impl MqttPacket for $name {
            fn packet_type(&self) -> PacketType {
                $ptype
            }

            fn body_len(&self) -> usize {
                0
            }

            fn encode_body<B: BufMut>(&self, _buf: &mut B) -> Result<()> {
                Ok(())
            }

            fn decode_body<B: Buf>(buf: &mut B, fixed_header: &FixedHeader) -> Result<Self> {
                if fixed_header.remaining_length != 0 || buf.has_remaining() {
                    return Err(MqttError::MalformedPacket(
                        concat!($prefix, " must have remaining length 0").to_string(),
                    ));
                }
                Ok(Self)
            }
        }
    };
}

impl_ping_packet!(PingReqPacket, PacketType::PingReq, "PINGREQ");
impl_ping_packet!(PingRespPacket, PacketType::PingResp, "PINGRESP");
