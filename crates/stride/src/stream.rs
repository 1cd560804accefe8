use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::StrideError;
use crate::types::JsonObject;
use crate::Result;

/// Records are framed with CR+LF. A bare line feed inside a chunk is record
/// content, not a boundary.
const RECORD_DELIMITER: &str = "\r\n";

// ─── Chunk decoding ────────────────────────────────────────────────────────

/// Decode one body chunk into the records it contains.
///
/// Splitting happens per chunk with no carry-over buffer; the server is
/// expected to flush whole records, so a record split across two chunks
/// arrives as two malformed fragments and fails loudly instead of being
/// silently dropped. Empty and whitespace-only segments are skipped, and
/// parsed values that are not JSON objects are discarded. A malformed
/// segment ends decoding: records already decoded from the chunk are kept,
/// the fault is appended after them, and the rest of the chunk is not
/// parsed.
fn decode_chunk(chunk: &[u8]) -> Vec<Result<JsonObject>> {
    let text = String::from_utf8_lossy(chunk);
    let mut records = Vec::new();
    for candidate in text.trim().split(RECORD_DELIMITER) {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            continue;
        }
        match serde_json::from_str::<serde_json::Value>(candidate) {
            Ok(serde_json::Value::Object(record)) => records.push(Ok(record)),
            Ok(_) => {}
            Err(source) => {
                records.push(Err(StrideError::Parse {
                    record: candidate.to_string(),
                    source,
                }));
                break;
            }
        }
    }
    records
}

// ─── EventStream ───────────────────────────────────────────────────────────

/// An async stream of decoded records from a live subscription.
///
/// Backed by a Tokio mpsc channel. A background task owns the HTTP response
/// and forwards each decoded record until the server closes the connection,
/// a transport or framing fault occurs, or the consumer hangs up. Dropping
/// an `EventStream` aborts the reader task, which closes the underlying
/// socket.
///
/// ```rust,ignore
/// use futures::StreamExt;
/// use stride::Stride;
///
/// let client = Stride::new("my-token")?;
/// let sub = client.subscribe("/collect/clicks/subscribe").await?;
/// if let Some(mut events) = sub.stream {
///     while let Some(event) = events.next().await {
///         println!("event: {:?}", event?);
///     }
/// }
/// ```
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::Receiver<Result<JsonObject>>,
    reader: JoinHandle<()>,
    closed: bool,
}

impl EventStream {
    pub(crate) fn new(mut response: reqwest::Response) -> Self {
        let (tx, rx) = mpsc::channel(32);

        let reader = tokio::spawn(async move {
            loop {
                let chunk = match response.chunk().await {
                    Ok(Some(bytes)) => bytes,
                    Ok(None) => return, // Server closed the connection
                    Err(e) => {
                        tracing::warn!(error = %e, "subscription transport fault");
                        let _ = tx.send(Err(StrideError::Http(e))).await;
                        return;
                    }
                };
                for item in decode_chunk(&chunk) {
                    match item {
                        Ok(record) => {
                            if tx.send(Ok(record)).await.is_err() {
                                return; // Receiver dropped
                            }
                        }
                        Err(fault) => {
                            tracing::warn!(error = %fault, "subscription framing fault");
                            let _ = tx.send(Err(fault)).await;
                            return;
                        }
                    }
                }
            }
        });

        EventStream {
            rx,
            reader,
            closed: false,
        }
    }

    /// End the subscription now. Aborting the reader task drops the HTTP
    /// response, which closes the socket; records still buffered in the
    /// channel are discarded and the stream yields `None` from here on.
    pub fn close(&mut self) {
        self.reader.abort();
        self.closed = true;
    }

    /// Test-only constructor: wrap a raw mpsc receiver as an `EventStream`.
    #[cfg(test)]
    pub(crate) fn from_channel(rx: mpsc::Receiver<Result<JsonObject>>) -> Self {
        EventStream {
            rx,
            reader: tokio::spawn(async {}),
            closed: false,
        }
    }
}

impl Stream for EventStream {
    type Item = Result<JsonObject>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.closed {
            return Poll::Ready(None);
        }
        self.rx.poll_recv(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    fn event(value: serde_json::Value) -> JsonObject {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    /// Decode a chunk expected to contain no fault.
    fn objects(chunk: &[u8]) -> Vec<JsonObject> {
        decode_chunk(chunk)
            .into_iter()
            .map(|record| record.unwrap())
            .collect()
    }

    #[test]
    fn chunk_with_two_records_decodes_both_in_order() {
        let records = objects(b"{\"seq\":1}\r\n{\"seq\":2}\r\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["seq"], json!(1));
        assert_eq!(records[1]["seq"], json!(2));
    }

    #[test]
    fn empty_and_whitespace_segments_are_skipped() {
        let records = objects(b"\r\n   \r\n{\"seq\":1}\r\n\r\n  {\"seq\":2}  \r\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["seq"], json!(1));
        assert_eq!(records[1]["seq"], json!(2));
    }

    #[test]
    fn empty_chunk_decodes_to_nothing() {
        assert!(decode_chunk(b"").is_empty());
        assert!(decode_chunk(b"  \r\n \r\n").is_empty());
    }

    #[test]
    fn non_object_records_are_discarded() {
        let records = objects(b"[1,2]\r\n\"text\"\r\n42\r\nnull\r\ntrue\r\n{\"kept\":true}\r\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["kept"], json!(true));
    }

    #[test]
    fn truncated_record_is_a_fault() {
        let records = decode_chunk(b"{\"seq\":1}\r\n{\"seq\":");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].as_ref().unwrap()["seq"], json!(1));
        match &records[1] {
            Err(StrideError::Parse { record, .. }) => assert_eq!(record, "{\"seq\":"),
            other => panic!("expected parse fault, got {other:?}"),
        }
    }

    #[test]
    fn records_before_a_malformed_segment_are_kept() {
        // The fault ends decoding, so the record after the bad segment is
        // never parsed.
        let records = decode_chunk(b"{\"seq\":1}\r\nnot json\r\n{\"seq\":2}\r\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].as_ref().unwrap()["seq"], json!(1));
        match &records[1] {
            Err(StrideError::Parse { record, .. }) => assert_eq!(record, "not json"),
            other => panic!("expected parse fault, got {other:?}"),
        }
    }

    #[test]
    fn bare_line_feeds_are_not_record_boundaries() {
        let records = decode_chunk(b"{\"seq\":1}\n{\"seq\":2}");
        assert_eq!(records.len(), 1);
        assert!(records[0].is_err());
    }

    #[test]
    fn pretty_printed_records_span_lines_within_a_frame() {
        // The API pretty-prints event payloads, so line feeds appear inside
        // a record; only CR+LF separates records.
        let chunk = b"{\n  \"seq\": 1,\n  \"repo\": \"pipelinedb/pipelinedb\"\n}\r\n{\n  \"seq\": 2\n}\r\n";
        let records = objects(chunk);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["repo"], json!("pipelinedb/pipelinedb"));
        assert_eq!(records[1]["seq"], json!(2));
    }

    #[test]
    fn invalid_utf8_surfaces_as_a_parse_fault() {
        let records = decode_chunk(b"\xff\xfe{\"seq\":1}");
        assert_eq!(records.len(), 1);
        assert!(matches!(records[0], Err(StrideError::Parse { .. })));
    }

    #[tokio::test]
    async fn stream_yields_records_until_sender_hangs_up() {
        let (tx, rx) = mpsc::channel(32);
        tx.send(Ok(event(json!({"seq": 1})))).await.unwrap();
        tx.send(Ok(event(json!({"seq": 2})))).await.unwrap();
        drop(tx);

        let events: Vec<_> = EventStream::from_channel(rx).collect().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_ref().unwrap()["seq"], json!(1));
        assert_eq!(events[1].as_ref().unwrap()["seq"], json!(2));
    }

    #[tokio::test]
    async fn close_discards_buffered_records() {
        let (tx, rx) = mpsc::channel(32);
        for seq in 1..=3 {
            tx.send(Ok(event(json!({"seq": seq})))).await.unwrap();
        }

        let mut events = EventStream::from_channel(rx);
        let first = events.next().await.unwrap().unwrap();
        assert_eq!(first["seq"], json!(1));

        events.close();
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn fault_surfaces_as_an_err_item() {
        let (tx, rx) = mpsc::channel(32);
        tx.send(Ok(event(json!({"seq": 1})))).await.unwrap();
        tx.send(Err(StrideError::Parse {
            record: "{\"seq\":".to_string(),
            source: serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
        }))
        .await
        .unwrap();
        drop(tx);

        let events: Vec<_> = EventStream::from_channel(rx).collect().await;
        assert_eq!(events.len(), 2);
        assert!(events[0].is_ok());
        assert!(matches!(events[1], Err(StrideError::Parse { .. })));
    }
}
