//! JSON-lines bridge between a stream transport and the plugin handler.
//!
//! Each input line is `{"id": .., "endpoint": "/VolumeDriver.Mount", "body": {..}}`
//! and produces one output line `{"id": .., "response": {..}}`. Requests are
//! dispatched on blocking workers as they arrive, so replies may come back
//! out of order; callers match them by `id`.

use std::sync::Arc;

use glustervol::PluginHandler;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

#[derive(Debug, Deserialize)]
struct BridgeRequest {
    #[serde(default)]
    id: Value,
    endpoint: String,
    #[serde(default)]
    body: Value,
}

#[derive(Debug, Serialize)]
struct BridgeReply {
    id: Value,
    response: Value,
}

/// Serve requests from `input` until EOF, then wait for every in-flight
/// request and return the writer.
pub async fn serve<R, W>(handler: Arc<PluginHandler>, input: R, mut output: W) -> anyhow::Result<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let writer = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            output.write_all(line.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }
        Ok::<_, std::io::Error>(output)
    });

    let mut workers = JoinSet::new();
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let handler = Arc::clone(&handler);
        let tx = tx.clone();
        workers.spawn_blocking(move || {
            if tx.send(respond(&handler, &line)).is_err() {
                tracing::warn!("Reply dropped, output writer has stopped");
            }
        });
    }

    while let Some(result) = workers.join_next().await {
        if let Err(e) = result {
            tracing::error!(error = %e, "Request worker failed");
        }
    }
    drop(tx);

    let output = writer.await??;
    Ok(output)
}

fn respond(handler: &PluginHandler, line: &str) -> String {
    let reply = match serde_json::from_str::<BridgeRequest>(line) {
        Ok(request) => BridgeReply {
            id: request.id,
            response: handler.handle(&request.endpoint, request.body),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Malformed request line");
            BridgeReply {
                id: Value::Null,
                response: serde_json::json!({ "Err": format!("invalid request: {}", e) }),
            }
        }
    };

    serde_json::to_string(&reply).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to encode reply");
        r#"{"id":null,"response":{"Err":"failed to encode reply"}}"#.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glustervol::{MountExecutor, VolumeDriver, VolumeResult};
    use serde_json::json;
    use std::path::{Path, PathBuf};

    struct NoopMounter;

    impl MountExecutor for NoopMounter {
        fn mount(&self, _volume: &str, _servers: &[String], _dest: &Path) -> VolumeResult<()> {
            Ok(())
        }

        fn unmount(&self, _dest: &Path) -> VolumeResult<()> {
            Ok(())
        }
    }

    fn handler() -> Arc<PluginHandler> {
        let driver = VolumeDriver::new(
            PathBuf::from("/mnt/v"),
            vec!["10.0.0.1".into()],
            Arc::new(NoopMounter),
            None,
        );
        Arc::new(PluginHandler::new(Arc::new(driver)))
    }

    fn replies(output: Vec<u8>) -> Vec<Value> {
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_each_line_gets_a_reply() {
        let input = concat!(
            r#"{"id": 1, "endpoint": "/Plugin.Activate"}"#,
            "\n\n",
            r#"{"id": 2, "endpoint": "/VolumeDriver.Path", "body": {"Name": "x"}}"#,
            "\n",
        );

        let output = serve(handler(), input.as_bytes(), Vec::new()).await.unwrap();
        let mut replies = replies(output);
        replies.sort_by_key(|r| r["id"].as_i64());

        assert_eq!(
            replies,
            vec![
                json!({"id": 1, "response": {"Implements": ["VolumeDriver"]}}),
                json!({"id": 2, "response": {"Mountpoint": "/mnt/v/x"}}),
            ]
        );
    }

    struct BrokenPipe;

    impl AsyncWrite for BrokenPipe {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            std::task::Poll::Ready(Err(std::io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_dead_writer_ends_serving_with_error() {
        let input: String = (0..16)
            .map(|i| format!("{}\n", json!({"id": i, "endpoint": "/Plugin.Activate"})))
            .collect();

        let result = serve(handler(), input.as_bytes(), BrokenPipe).await;
        let err = result.err().unwrap();
        assert_eq!(
            err.downcast_ref::<std::io::Error>().unwrap().kind(),
            std::io::ErrorKind::BrokenPipe
        );
    }

    #[tokio::test]
    async fn test_malformed_line() {
        let output = serve(handler(), "not json\n".as_bytes(), Vec::new())
            .await
            .unwrap();
        let replies = replies(output);

        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0]["id"], Value::Null);
        assert!(
            replies[0]["response"]["Err"]
                .as_str()
                .unwrap()
                .starts_with("invalid request")
        );
    }
}
