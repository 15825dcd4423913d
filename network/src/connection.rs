//! Length-prefixed framing over any async byte stream.
//!
//! A frame is a 4-byte big-endian body length followed by the body. Bodies
//! larger than [`MAX_MESSAGE_SIZE`] are refused in both directions.

use std::time::Duration;

use sdupi_messages::MAX_MESSAGE_SIZE;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::NetworkError;

/// Timeout for the body once its length has arrived.
const BODY_TIMEOUT: Duration = Duration::from_secs(30);

fn max_frame() -> usize {
    MAX_MESSAGE_SIZE as usize
}

/// Write one frame and flush.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), NetworkError>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > max_frame() {
        return Err(NetworkError::FrameTooLarge {
            size: payload.len(),
            max: max_frame(),
        });
    }
    let len_bytes = (payload.len() as u32).to_be_bytes();
    writer.write_all(&len_bytes).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame.
///
/// Returns `Ok(None)` when the stream closes cleanly before a new frame
/// starts. `idle_timeout` bounds the wait for the length prefix; `None`
/// waits as long as the stream stays open, which is what peer connections use.
pub async fn read_frame<R>(
    reader: &mut R,
    idle_timeout: Option<Duration>,
) -> Result<Option<Vec<u8>>, NetworkError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    let prefix = match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, reader.read_exact(&mut len_buf))
            .await
            .map_err(|_| NetworkError::Timeout("waiting for frame"))?,
        None => reader.read_exact(&mut len_buf).await,
    };
    match prefix {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let body_len = u32::from_be_bytes(len_buf) as usize;
    if body_len > max_frame() {
        return Err(NetworkError::FrameTooLarge {
            size: body_len,
            max: max_frame(),
        });
    }

    let mut body = vec![0u8; body_len];
    match tokio::time::timeout(BODY_TIMEOUT, reader.read_exact(&mut body)).await {
        Ok(Ok(_)) => Ok(Some(body)),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(NetworkError::Timeout("waiting for frame body")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frames_survive_a_duplex_pipe() {
        let (mut a, mut b) = tokio::io::duplex(1024);
        write_frame(&mut a, b"first").await.unwrap();
        write_frame(&mut a, b"").await.unwrap();
        write_frame(&mut a, b"third").await.unwrap();

        let t = Some(Duration::from_secs(1));
        assert_eq!(read_frame(&mut b, t).await.unwrap(), Some(b"first".to_vec()));
        assert_eq!(read_frame(&mut b, t).await.unwrap(), Some(Vec::new()));
        assert_eq!(read_frame(&mut b, t).await.unwrap(), Some(b"third".to_vec()));
    }

    #[tokio::test]
    async fn clean_close_yields_none() {
        let (a, mut b) = tokio::io::duplex(64);
        drop(a);
        assert!(read_frame(&mut b, Some(Duration::from_secs(1))).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn oversized_length_prefix_rejected() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_all(&u32::MAX.to_be_bytes()).await.unwrap();
        let err = read_frame(&mut b, Some(Duration::from_secs(1))).await.unwrap_err();
        assert!(matches!(err, NetworkError::FrameTooLarge { .. }));
    }

    #[tokio::test]
    async fn truncated_body_is_an_error() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_all(&10u32.to_be_bytes()).await.unwrap();
        a.write_all(b"abc").await.unwrap();
        drop(a);
        assert!(matches!(
            read_frame(&mut b, Some(Duration::from_secs(1))).await,
            Err(NetworkError::Io(_))
        ));
    }

    #[tokio::test]
    async fn idle_peer_times_out() {
        let (_a, mut b) = tokio::io::duplex(64);
        let err = read_frame(&mut b, Some(Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkError::Timeout(_)));
    }

    #[tokio::test]
    async fn unbounded_read_outlasts_a_quiet_spell() {
        let (mut a, mut b) = tokio::io::duplex(64);
        let writer = tokio::spawn(async move {
            // Longer than the bounded read above waits.
            tokio::time::sleep(Duration::from_millis(200)).await;
            write_frame(&mut a, b"late").await.unwrap();
            a
        });
        let frame = tokio::time::timeout(Duration::from_secs(5), read_frame(&mut b, None))
            .await
            .expect("frame should arrive")
            .unwrap();
        assert_eq!(frame, Some(b"late".to_vec()));
        drop(writer.await.unwrap());
    }
}
