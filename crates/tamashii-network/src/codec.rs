//! Tokio codec for event framing on the manager link.
//!
//! Each [`Event`] travels as one frame:
//!
//! ```text
//! +----------------+----------------+-----------------+
//! | type: u32 (BE) | len: u32 (BE)  | body: len bytes |
//! +----------------+----------------+-----------------+
//! ```
//!
//! The type code is written verbatim, so codes the agent does not interpret
//! still round-trip between the manager and the components.
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use tokio::net::TcpStream;
//! use tokio_util::codec::Framed;
//! use tamashii_core::{Event, EventType};
//! use tamashii_network::EventCodec;
//! use futures::{SinkExt, StreamExt};
//!
//! # async fn example() -> tamashii_core::Result<()> {
//! let stream = TcpStream::connect("127.0.0.1:3000").await?;
//! let mut framed = Framed::new(stream, EventCodec::new());
//!
//! framed.send(Event::new(EventType::CardData, "04ABCDEF")).await?;
//!
//! if let Some(Ok(event)) = framed.next().await {
//!     println!("Received: {event}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # DoS Protection
//!
//! Frames announcing a body larger than the configured maximum (default
//! 64 KiB) are rejected before any body bytes are buffered.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use tamashii_core::constants::{FRAME_HEADER_LEN, MAX_EVENT_BODY};
use tamashii_core::{Error, Event, Result};

/// Tokio codec for framed events.
#[derive(Debug, Clone)]
pub struct EventCodec {
    /// Maximum allowed body size in bytes.
    max_body_size: usize,
}

impl EventCodec {
    /// Create a new codec with the default maximum body size.
    pub fn new() -> Self {
        Self::with_max_body_size(MAX_EVENT_BODY)
    }

    /// Create a codec with a custom maximum body size.
    ///
    /// # Example
    ///
    /// ```
    /// use tamashii_network::EventCodec;
    ///
    /// let codec = EventCodec::with_max_body_size(1024);
    /// assert_eq!(codec.max_body_size(), 1024);
    /// ```
    pub fn with_max_body_size(max_body_size: usize) -> Self {
        Self { max_body_size }
    }

    /// Maximum body size accepted in either direction.
    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }
}

impl Default for EventCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for EventCodec {
    type Item = Event;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.len() < FRAME_HEADER_LEN {
            src.reserve(FRAME_HEADER_LEN - src.len());
            return Ok(None);
        }

        // Peek at the header without consuming it
        let mut header = &src[..FRAME_HEADER_LEN];
        let code = header.get_u32();
        let len = header.get_u32() as usize;

        if len > self.max_body_size {
            return Err(Error::FrameTooLarge {
                size: len,
                max: self.max_body_size,
            });
        }

        let frame_len = FRAME_HEADER_LEN + len;
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        src.advance(FRAME_HEADER_LEN);
        let body = src.split_to(len).freeze();
        Ok(Some(Event::new(code, body)))
    }
}

impl Encoder<Event> for EventCodec {
    type Error = Error;

    fn encode(&mut self, item: Event, dst: &mut BytesMut) -> Result<()> {
        let body = item.body();
        if body.len() > self.max_body_size {
            return Err(Error::FrameTooLarge {
                size: body.len(),
                max: self.max_body_size,
            });
        }

        dst.reserve(FRAME_HEADER_LEN + body.len());
        dst.put_u32(item.code());
        dst.put_u32(body.len() as u32);
        dst.extend_from_slice(body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tamashii_core::EventType;

    fn encoded(event: Event) -> BytesMut {
        let mut buf = BytesMut::new();
        EventCodec::new().encode(event, &mut buf).unwrap();
        buf
    }

    #[test]
    fn test_encode_layout() {
        let buf = encoded(Event::new(EventType::Beep, "ok"));
        assert_eq!(&buf[..], &[0, 0, 0, 1, 0, 0, 0, 2, b'o', b'k']);
    }

    #[test]
    fn test_decode_single_frame() {
        let mut buf = BytesMut::from(&[0, 0, 0, 4, 0, 0, 0, 6, b'r', b'e', b'b', b'o', b'o', b't'][..]);
        let event = EventCodec::new().decode(&mut buf).unwrap().unwrap();

        assert_eq!(event, Event::new(EventType::SystemCommand, "reboot"));
        assert!(buf.is_empty());
    }

    #[rstest]
    #[case::inside_type(2)]
    #[case::inside_length(5)]
    #[case::header_only(8)]
    #[case::inside_body(9)]
    fn test_decode_waits_for_full_frame(#[case] split: usize) {
        let full = encoded(Event::new(987654321u32, "ABC"));
        let mut codec = EventCodec::new();
        let mut buf = BytesMut::from(&full[..split]);

        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), split);

        buf.extend_from_slice(&full[split..]);
        let event = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(event, Event::new(987654321u32, "ABC"));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_two_frames_in_one_read() {
        let mut buf = encoded(Event::new(EventType::CardData, "04ABCDEF"));
        buf.extend_from_slice(&encoded(Event::new(EventType::AuthResult, "ok")));

        let mut codec = EventCodec::new();
        let first = codec.decode(&mut buf).unwrap().unwrap();
        let second = codec.decode(&mut buf).unwrap().unwrap();

        assert_eq!(first.event_type(), EventType::CardData);
        assert_eq!(second.event_type(), EventType::AuthResult);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_decode_empty_body() {
        let mut buf = encoded(Event::new(EventType::ConnectionNotReady, ""));
        let event = EventCodec::new().decode(&mut buf).unwrap().unwrap();
        assert!(event.body().is_empty());
    }

    #[rstest]
    #[case(1025)]
    #[case(2048)]
    #[case(u32::MAX as usize)]
    fn test_decode_rejects_oversized_frame(#[case] declared: usize) {
        let mut buf = BytesMut::new();
        buf.put_u32(1);
        buf.put_u32(declared as u32);

        let result = EventCodec::with_max_body_size(1024).decode(&mut buf);
        assert!(matches!(
            result,
            Err(Error::FrameTooLarge { size, max: 1024 }) if size == declared
        ));
    }

    #[test]
    fn test_decode_accepts_body_at_limit() {
        let mut buf = encoded(Event::new(EventType::CardData, vec![b'A'; 1024]));
        let event = EventCodec::with_max_body_size(1024)
            .decode(&mut buf)
            .unwrap()
            .unwrap();
        assert_eq!(event.body().len(), 1024);
    }

    #[test]
    fn test_encode_rejects_oversized_body() {
        let mut buf = BytesMut::new();
        let result =
            EventCodec::with_max_body_size(2).encode(Event::new(EventType::Beep, "error"), &mut buf);
        assert!(matches!(result, Err(Error::FrameTooLarge { .. })));
        assert!(buf.is_empty());
    }
}
