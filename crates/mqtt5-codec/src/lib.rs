#![warn(clippy::pedantic)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]

pub mod constants;
pub mod encoding;
pub mod error;
pub mod packet;
pub mod packet_id;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod types;
pub mod validation;

pub use error::{MqttError, Result};
pub use packet::{FixedHeader, MqttPacket, Packet, PacketType};
pub use packet_id::PacketIdAllocator;
pub use protocol::v5::properties::{Properties, PropertyId, PropertyValue, PropertyValueType};
pub use protocol::v5::reason_codes::ReasonCode;
pub use session::{InFlightRecord, PersistenceHandler, ResendSession, StoredPacketKind};
pub use transport::Transport;
pub use types::{PublishResult, QoS, WillMessage};
pub use validation::{validate_utf8, Utf8Validation};
