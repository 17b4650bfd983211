//! Session-side delivery state for QoS 1 and QoS 2 publications.
//!
//! The session captures the exact bytes of every QoS > 0 PUBLISH (and later
//! PUBREL) at first transmission and hands them to a caller-owned store
//! through [`PersistenceHandler`]. After a reconnect with an unexpired
//! session the caller replays its records through [`ResendSession::restore`],
//! which re-arms the packet identifier and queues the original bytes for
//! retransmission ahead of any new traffic.
//!
//! All state is owned by a single session actor; nothing here locks.

use crate::constants::publish::DUP_MASK;
use crate::error::{MqttError, Result};
use crate::packet::{MqttPacket, Packet, PubRelPacket, PublishPacket};
use crate::packet_id::PacketIdAllocator;
use crate::transport::Transport;
use crate::types::{PublishResult, QoS};
use bytes::{Bytes, BytesMut};
use std::collections::{HashMap, VecDeque};

/// Which packet a persisted record holds. The transition is one-way:
/// `Publish` becomes `Pubrel` when the PUBREC arrives, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredPacketKind {
    Publish,
    Pubrel,
}

/// One in-flight QoS > 0 exchange, keyed by packet identifier.
#[derive(Debug, Clone)]
pub struct InFlightRecord {
    pub kind: StoredPacketKind,
    pub bytes: Bytes,
}

/// Caller-owned persistence hooks. The store itself is opaque to the
/// session; it only has to return the exact bytes it was given.
pub trait PersistenceHandler {
    /// A QoS > 0 PUBLISH or a PUBREL is about to be transmitted for the
    /// first time. A PUBREL overwrites the PUBLISH record for the same id.
    fn on_serialize(&mut self, kind: StoredPacketKind, packet_id: u16, bytes: &[u8]);

    /// The terminal acknowledgement for `packet_id` arrived; the persisted
    /// record can be deleted.
    fn on_release(&mut self, packet_id: u16);
}

/// Sessions that never resume (clean start) need no store.
impl PersistenceHandler for () {
    fn on_serialize(&mut self, _kind: StoredPacketKind, _packet_id: u16, _bytes: &[u8]) {}
    fn on_release(&mut self, _packet_id: u16) {}
}

/// Per-session resend engine: packet-id allocation, in-flight tracking and
/// replay of persisted packets.
#[derive(Debug, Default)]
pub struct ResendSession {
    allocator: PacketIdAllocator<u16>,
    in_flight: HashMap<u16, InFlightRecord>,
    resend_queue: VecDeque<Bytes>,
    maximum_packet_size: Option<u32>,
}

impl ResendSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps outgoing packets at the peer's advertised maximum packet size
    /// (the CONNACK `MaximumPacketSize` property).
    pub fn set_maximum_packet_size(&mut self, max: Option<u32>) {
        self.maximum_packet_size = max;
    }

    /// Encodes a PUBLISH for transmission.
    ///
    /// QoS 0 packets pass straight through. For QoS 1 and 2 the session
    /// assigns a packet identifier (or re-arms a caller-chosen one), forces
    /// DUP to 0, records the encoded bytes and invokes
    /// [`PersistenceHandler::on_serialize`] before returning them.
    ///
    /// # Errors
    /// `PayloadFormatInvalid`, `PacketTooLarge`, `PacketIdExhausted` and any
    /// encode error. Failures leave no session state behind.
    pub fn publish<H: PersistenceHandler>(
        &mut self,
        mut packet: PublishPacket,
        handler: &mut H,
    ) -> Result<(PublishResult, Bytes)> {
        packet.validate_payload_format()?;
        packet.dup = false;

        if packet.qos == QoS::AtMostOnce {
            let bytes = packet.to_bytes()?;
            self.check_outgoing_size(bytes.len())?;
            return Ok((PublishResult::QoS0, bytes));
        }

        let packet_id = match packet.packet_id {
            Some(id) => {
                self.allocator
                    .mark_in_use(id)
                    .map_err(|_| MqttError::PacketIdInUse(id))?;
                id
            }
            None => self.allocator.acquire()?,
        };
        packet.packet_id = Some(packet_id);

        let bytes = match packet
            .to_bytes()
            .and_then(|bytes| self.check_outgoing_size(bytes.len()).map(|()| bytes))
        {
            Ok(bytes) => bytes,
            Err(e) => {
                self.allocator.release(packet_id);
                return Err(e);
            }
        };

        self.in_flight.insert(
            packet_id,
            InFlightRecord {
                kind: StoredPacketKind::Publish,
                bytes: bytes.clone(),
            },
        );
        handler.on_serialize(StoredPacketKind::Publish, packet_id, &bytes);
        tracing::debug!(packet_id, qos = ?packet.qos, "publish in flight");

        Ok((PublishResult::QoS1Or2 { packet_id }, bytes))
    }

    fn check_outgoing_size(&self, size: usize) -> Result<()> {
        if let Some(max) = self.maximum_packet_size {
            if size > max as usize {
                return Err(MqttError::PacketTooLarge {
                    size,
                    max: max as usize,
                });
            }
        }
        Ok(())
    }

    /// Completes a QoS 1 exchange. Unknown identifiers are ignored so
    /// duplicate PUBACKs are harmless.
    pub fn handle_puback<H: PersistenceHandler>(
        &mut self,
        packet_id: u16,
        handler: &mut H,
    ) -> Result<()> {
        match self.in_flight.get(&packet_id) {
            Some(record) if record.kind == StoredPacketKind::Publish => {
                self.in_flight.remove(&packet_id);
                handler.on_release(packet_id);
                self.allocator.release(packet_id);
                tracing::debug!(packet_id, "QoS 1 delivery complete");
                Ok(())
            }
            Some(_) => Err(MqttError::ProtocolError(format!(
                "PUBACK for packet {packet_id} awaiting PUBCOMP"
            ))),
            None => {
                tracing::debug!(packet_id, "PUBACK for unknown packet id ignored");
                Ok(())
            }
        }
    }

    /// Advances a QoS 2 exchange past the PUBREC. Returns the encoded PUBREL
    /// to transmit. The stored record flips from `Publish` to `Pubrel` and
    /// the overwrite is pushed to the persistence handler; a duplicate
    /// PUBREC returns the already-stored PUBREL without re-serializing.
    pub fn handle_pubrec<H: PersistenceHandler>(
        &mut self,
        packet_id: u16,
        handler: &mut H,
    ) -> Result<Option<Bytes>> {
        match self.in_flight.get(&packet_id) {
            Some(record) if record.kind == StoredPacketKind::Publish => {
                let bytes = PubRelPacket::new(packet_id).to_bytes()?;
                self.in_flight.insert(
                    packet_id,
                    InFlightRecord {
                        kind: StoredPacketKind::Pubrel,
                        bytes: bytes.clone(),
                    },
                );
                handler.on_serialize(StoredPacketKind::Pubrel, packet_id, &bytes);
                tracing::debug!(packet_id, "PUBREC received, sending PUBREL");
                Ok(Some(bytes))
            }
            Some(record) => {
                tracing::debug!(packet_id, "duplicate PUBREC, retransmitting PUBREL");
                Ok(Some(record.bytes.clone()))
            }
            None => {
                tracing::debug!(packet_id, "PUBREC for unknown packet id ignored");
                Ok(None)
            }
        }
    }

    /// Completes a QoS 2 exchange. Unknown identifiers are ignored.
    pub fn handle_pubcomp<H: PersistenceHandler>(
        &mut self,
        packet_id: u16,
        handler: &mut H,
    ) -> Result<()> {
        match self.in_flight.get(&packet_id) {
            Some(record) if record.kind == StoredPacketKind::Pubrel => {
                self.in_flight.remove(&packet_id);
                handler.on_release(packet_id);
                self.allocator.release(packet_id);
                tracing::debug!(packet_id, "QoS 2 delivery complete");
                Ok(())
            }
            Some(_) => Err(MqttError::ProtocolError(format!(
                "PUBCOMP for packet {packet_id} without a prior PUBREL"
            ))),
            None => {
                tracing::debug!(packet_id, "PUBCOMP for unknown packet id ignored");
                Ok(())
            }
        }
    }

    /// Re-arms one persisted record after a reconnect with
    /// `clean_start = false`.
    ///
    /// Stored PUBLISH bytes are replayed verbatim except for the DUP bit,
    /// which is set by patching the fixed header byte. Stored PUBREL bytes
    /// are replayed untouched. Restored packets are queued ahead of any new
    /// transmission, in restore-call order.
    ///
    /// # Errors
    /// `MalformedPacket` when the bytes do not parse, `ProtocolError` when
    /// they parse to a different packet than `kind` claims or carry no
    /// usable packet identifier.
    pub fn restore(&mut self, kind: StoredPacketKind, bytes: &[u8]) -> Result<()> {
        let mut cursor = Bytes::copy_from_slice(bytes);
        let packet = Packet::decode(&mut cursor)?;

        match (kind, packet) {
            (StoredPacketKind::Publish, Packet::Publish(publish)) => {
                if publish.qos == QoS::AtMostOnce {
                    return Err(MqttError::ProtocolError(
                        "Stored PUBLISH must be QoS 1 or 2".to_string(),
                    ));
                }
                let packet_id = publish.packet_id.ok_or_else(|| {
                    MqttError::ProtocolError(
                        "Stored PUBLISH carries no packet identifier".to_string(),
                    )
                })?;
                self.allocator
                    .mark_in_use(packet_id)
                    .map_err(|_| MqttError::PacketIdInUse(packet_id))?;

                let mut patched = BytesMut::from(bytes);
                patched[0] |= DUP_MASK;
                let patched = patched.freeze();

                self.in_flight.insert(
                    packet_id,
                    InFlightRecord {
                        kind: StoredPacketKind::Publish,
                        bytes: patched.clone(),
                    },
                );
                self.resend_queue.push_back(patched);
                tracing::debug!(packet_id, "restored QoS > 0 PUBLISH");
                Ok(())
            }
            (StoredPacketKind::Pubrel, Packet::PubRel(pubrel)) => {
                let packet_id = pubrel.packet_id;
                self.allocator
                    .mark_in_use(packet_id)
                    .map_err(|_| MqttError::PacketIdInUse(packet_id))?;

                let bytes = Bytes::copy_from_slice(bytes);
                self.in_flight.insert(
                    packet_id,
                    InFlightRecord {
                        kind: StoredPacketKind::Pubrel,
                        bytes: bytes.clone(),
                    },
                );
                self.resend_queue.push_back(bytes);
                tracing::debug!(packet_id, "restored PUBREL");
                Ok(())
            }
            (kind, packet) => Err(MqttError::ProtocolError(format!(
                "Stored record kind {kind:?} does not match {:?} packet",
                packet.packet_type()
            ))),
        }
    }

    /// Drains the queue of restored packets, oldest first. The caller must
    /// transmit these before anything newly issued.
    pub fn take_resend_queue(&mut self) -> Vec<Bytes> {
        self.resend_queue.drain(..).collect()
    }

    #[must_use]
    pub fn has_pending_resend(&self) -> bool {
        !self.resend_queue.is_empty()
    }

    /// Writes queued restored packets to the transport. A failed write
    /// leaves the packet at the head of the queue for the next attempt.
    pub fn flush_restored<T: Transport>(&mut self, transport: &mut T) -> Result<()> {
        while let Some(bytes) = self.resend_queue.front() {
            transport.write(bytes)?;
            self.resend_queue.pop_front();
        }
        Ok(())
    }

    /// Writes `bytes` after any restored packets still queued, preserving
    /// the per-client ordering the broker expects.
    pub fn transmit<T: Transport>(&mut self, transport: &mut T, bytes: &[u8]) -> Result<()> {
        self.flush_restored(transport)?;
        transport.write(bytes)
    }

    /// Discards all delivery state for a `clean_start = true` connection.
    /// The caller discards its persisted store alongside.
    pub fn clean_start(&mut self) {
        self.in_flight.clear();
        self.resend_queue.clear();
        self.allocator.reset();
        tracing::debug!("session state discarded for clean start");
    }

    #[must_use]
    pub fn in_flight_record(&self, packet_id: u16) -> Option<&InFlightRecord> {
        self.in_flight.get(&packet_id)
    }

    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }
}
