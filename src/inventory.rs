use crate::error::{Error, Result};
use crate::models::RemoteStream;
use crate::transport::Transport;

pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Fetch every broadcast on the server by walking `/broadcasts/list/{offset}/{size}`
/// until a page comes back shorter than `page_size`.
///
/// Any failed page aborts the whole fetch; callers never see a partial list.
pub async fn fetch_all(transport: &dyn Transport, page_size: usize) -> Result<Vec<RemoteStream>> {
    if page_size == 0 {
        return Err(Error::invalid("page size must be positive"));
    }

    let mut streams = Vec::new();
    let mut offset = 0;

    loop {
        let path = format!("/broadcasts/list/{}/{}", offset, page_size);
        let page: Vec<RemoteStream> = transport.get(&path).await?.require(&path)?;
        let received = page.len();
        tracing::debug!("Page at offset {}: {} stream(s)", offset, received);

        streams.extend(page);
        if received < page_size {
            break;
        }
        offset += page_size;
    }

    tracing::info!("Fetched {} stream(s)", streams.len());
    Ok(streams)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::ScriptedTransport;
    use serde_json::{json, Value};

    fn page(range: std::ops::Range<usize>) -> Value {
        Value::Array(
            range
                .map(|i| json!({"streamId": format!("s{}", i), "name": format!("N{}", i)}))
                .collect(),
        )
    }

    async fn fetch_paged(total: usize, page_size: usize) -> (Vec<RemoteStream>, usize) {
        let mut transport = ScriptedTransport::new();
        let mut start = 0;
        loop {
            let end = (start + page_size).min(total);
            transport = transport.reply(200, page(start..end));
            if end - start < page_size {
                break;
            }
            start = end;
        }
        let streams = fetch_all(&transport, page_size).await.unwrap();
        (streams, transport.calls().len())
    }

    #[tokio::test]
    async fn complete_regardless_of_remainder() {
        for (total, page_size) in [(0, 3), (1, 3), (3, 3), (7, 3), (9, 3), (10, 1)] {
            let (streams, calls) = fetch_paged(total, page_size).await;
            assert_eq!(streams.len(), total, "total={} page={}", total, page_size);
            assert_eq!(calls, total / page_size + 1);
            let ids: Vec<String> = streams.into_iter().map(|s| s.stream_id).collect();
            let expected: Vec<String> = (0..total).map(|i| format!("s{}", i)).collect();
            assert_eq!(ids, expected);
        }
    }

    #[tokio::test]
    async fn requests_advancing_offsets() {
        let transport = ScriptedTransport::new()
            .reply(200, page(0..2))
            .reply(200, page(2..3));
        fetch_all(&transport, 2).await.unwrap();
        let paths: Vec<String> = transport.calls().into_iter().map(|c| c.path).collect();
        assert_eq!(paths, ["/broadcasts/list/0/2", "/broadcasts/list/2/2"]);
    }

    #[tokio::test]
    async fn failure_on_later_page_aborts() {
        let transport = ScriptedTransport::new()
            .reply(200, page(0..2))
            .reply(500, json!({"message": "internal"}));
        let err = fetch_all(&transport, 2).await.unwrap_err();
        assert!(err.is_transport());
        assert!(matches!(err, Error::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn malformed_page_aborts() {
        let transport = ScriptedTransport::new().reply_raw(200, "not json");
        let err = fetch_all(&transport, 10).await.unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[tokio::test]
    async fn sparse_records_with_nulls_are_kept() {
        let transport = ScriptedTransport::new().reply(
            200,
            json!([
                {"streamId": "a1", "name": "A01"},
                {"streamId": "x9", "name": null, "hlsViewerCount": null, "webRTCViewerCount": null}
            ]),
        );
        let streams = fetch_all(&transport, 10).await.unwrap();
        let ids: Vec<&str> = streams.iter().map(|s| s.stream_id.as_str()).collect();
        assert_eq!(ids, ["a1", "x9"]);
        assert_eq!(streams[1].name, "");
        assert_eq!(streams[1].hls_viewer_count, 0);
    }

    #[tokio::test]
    async fn network_failure_aborts() {
        let transport = ScriptedTransport::new().unreachable();
        assert!(fetch_all(&transport, 10).await.unwrap_err().is_transport());
    }
}
