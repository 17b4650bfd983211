use crate::error::Result;

/// Byte transport underneath a session.
///
/// The codec never blocks on its own: `read` pulls whatever the transport
/// has and the caller re-frames. Errors surface as [`crate::MqttError::Io`]
/// and leave all in-flight session state intact.
pub trait Transport {
    /// Writes the whole buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the write operation fails.
    fn write(&mut self, buf: &[u8]) -> Result<()>;

    /// Reads data into the provided buffer, returning the byte count.
    ///
    /// # Errors
    ///
    /// Returns an error if the read operation fails.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}
