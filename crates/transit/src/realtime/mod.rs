//! GTFS-Realtime snapshots: validated decoding of `FeedMessage` payloads.
//!
//! Feeds come off the network and are untrusted. A payload is accepted only if it
//! fits the size limit, decodes, carries a header and is a full dataset.

use prost::Message;

use crate::models::ParseError;
use gtfs_realtime::feed_header::Incrementality;
pub use gtfs_realtime::FeedMessage;

/// Maximum allowed feed size (50 MB)
pub const DEFAULT_MAX_FEED_BYTES: usize = 50 * 1024 * 1024;

/// Decode and validate a feed snapshot.
pub fn decode_feed(bytes: &[u8], max_bytes: usize) -> Result<FeedMessage, ParseError> {
    if bytes.len() > max_bytes {
        return Err(ParseError::TooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }

    if bytes.is_empty() {
        return Err(ParseError::MissingHeader);
    }

    let feed = FeedMessage::decode(bytes)?;

    if feed.header.gtfs_realtime_version.is_empty() {
        return Err(ParseError::MissingHeader);
    }

    if feed.header.incrementality == Some(Incrementality::Differential as i32) {
        return Err(ParseError::Differential);
    }

    Ok(feed)
}


#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_decode_roundtrip() {
        let message = testing::feed(vec![testing::trip_entity(
            "e1",
            "t1",
            Some("201"),
            vec![testing::stop_time("1123", 100, 110)],
        )]);

        let decoded = decode_feed(&message.encode_to_vec(), DEFAULT_MAX_FEED_BYTES).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode_feed(b"<html>502 Bad Gateway</html>", DEFAULT_MAX_FEED_BYTES);
        assert!(matches!(result, Err(ParseError::Decode(_)) | Err(ParseError::MissingHeader)));
    }

    #[test]
    fn test_decode_rejects_empty() {
        assert!(matches!(decode_feed(&[], DEFAULT_MAX_FEED_BYTES), Err(ParseError::MissingHeader)));
    }

    #[test]
    fn test_decode_rejects_oversize() {
        let message = testing::feed(vec![]);
        let bytes = message.encode_to_vec();
        let result = decode_feed(&bytes, bytes.len() - 1);
        assert!(matches!(result, Err(ParseError::TooLarge { .. })));
    }

    #[test]
    fn test_decode_rejects_differential() {
        let mut message = testing::feed(vec![]);
        message.header.incrementality = Some(Incrementality::Differential as i32);
        let result = decode_feed(&message.encode_to_vec(), DEFAULT_MAX_FEED_BYTES);
        assert!(matches!(result, Err(ParseError::Differential)));
    }
}
