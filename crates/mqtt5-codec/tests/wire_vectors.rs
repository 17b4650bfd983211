//! Byte-exact wire vectors for the packet codec.

use bytes::Bytes;
use mqtt5_codec::packet::{ConnectPacket, PingReqPacket, PublishPacket};
use mqtt5_codec::{MqttError, MqttPacket, Packet, QoS};

#[test]
fn pingreq_is_two_bytes() {
    let bytes = PingReqPacket.to_bytes().unwrap();
    assert_eq!(&bytes[..], &[0xC0, 0x00]);

    let decoded = Packet::decode(&mut bytes.clone()).unwrap();
    assert_eq!(decoded, Packet::PingReq(PingReqPacket));
}

#[test]
fn connect_minimal_vector() {
    let packet = ConnectPacket::new("c1");
    let bytes = packet.to_bytes().unwrap();

    // protocol signature, clean start, keep alive 60, empty properties, "c1"
    assert_eq!(
        &bytes[..],
        &[
            0x10, 0x0F, 0x00, 0x04, b'M', b'Q', b'T', b'T', 0x05, 0x02, 0x00, 0x3C, 0x00, 0x00,
            0x02, b'c', b'1',
        ]
    );
    assert_eq!(packet.encoded_len(), bytes.len());
}

#[test]
fn publish_qos1_vector() {
    let packet = PublishPacket::new("a/b", &b"hi"[..])
        .with_qos(QoS::AtLeastOnce)
        .with_packet_id(7);
    let bytes = packet.to_bytes().unwrap();

    assert_eq!(
        &bytes[..],
        &[0x32, 0x0B, 0x00, 0x03, b'a', b'/', b'b', 0x00, 0x07, 0x00, b'h', b'i']
    );

    let decoded = match Packet::decode(&mut bytes.clone()).unwrap() {
        Packet::Publish(p) => p,
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(decoded.qos, QoS::AtLeastOnce);
    assert!(!decoded.dup);
    assert!(!decoded.retain);
    assert_eq!(decoded.packet_id, Some(7));
    assert_eq!(decoded.topic_name, "a/b");
    assert_eq!(&decoded.payload[..], &[0x68, 0x69]);
}

#[test]
fn connect_with_nul_in_client_id_is_utf8_invalid() {
    // CONNECT whose client id is the single byte 0x00
    let mut raw = ConnectPacket::new("x").to_bytes().unwrap().to_vec();
    let len = raw.len();
    raw[len - 1] = 0x00;

    let mut buf = Bytes::from(raw);
    assert!(matches!(
        Packet::decode(&mut buf),
        Err(MqttError::Utf8Invalid(_))
    ));
}

#[test]
fn connect_with_surrogate_client_id_is_utf8_invalid() {
    let mut raw = ConnectPacket::new("abc").to_bytes().unwrap().to_vec();
    let len = raw.len();
    raw[len - 3] = 0xED;
    raw[len - 2] = 0xA0;
    raw[len - 1] = 0x80;

    let mut buf = Bytes::from(raw);
    assert!(matches!(
        Packet::decode(&mut buf),
        Err(MqttError::Utf8Invalid(_))
    ));
}

#[test]
fn publish_with_qos_bits_three_is_malformed() {
    let mut raw = PublishPacket::new("t", &b"x"[..])
        .with_qos(QoS::AtLeastOnce)
        .with_packet_id(1)
        .to_bytes()
        .unwrap()
        .to_vec();
    raw[0] |= 0x06; // both QoS bits

    let mut buf = Bytes::from(raw);
    assert!(matches!(
        Packet::decode(&mut buf),
        Err(MqttError::MalformedPacket(_))
    ));
}

#[test]
fn remaining_length_with_five_continuation_bytes_is_malformed() {
    let mut buf = Bytes::from_static(&[0x30, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F]);
    assert!(matches!(
        Packet::decode(&mut buf),
        Err(MqttError::MalformedPacket(_))
    ));
}

#[test]
fn property_block_overrunning_packet_is_malformed() {
    // PUBACK pid 1, reason 0x00, property block claiming 0x7F bytes with none present
    let mut buf = Bytes::from_static(&[0x40, 0x04, 0x00, 0x01, 0x00, 0x7F]);
    assert!(matches!(
        Packet::decode(&mut buf),
        Err(MqttError::MalformedPacket(_))
    ));
}

#[test]
fn truncated_packet_is_malformed() {
    let mut buf = Bytes::from_static(&[0x32, 0x0B, 0x00, 0x03, b'a']);
    assert!(matches!(
        Packet::decode(&mut buf),
        Err(MqttError::MalformedPacket(_))
    ));
}
