use crate::cursor::parse_cursor_pos;
use overlay_core::{CursorPos, OverlayError, Result};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

/// Hyprland command-socket client.
///
/// One connection per request; Hyprland closes the socket after replying.
#[derive(Debug, Clone)]
pub struct HyprlandIpc {
    /// Path to `.socket.sock` (the command socket).
    cmd_socket: PathBuf,
}

impl HyprlandIpc {
    /// Create a new client, discovering the socket from `$HYPRLAND_INSTANCE_SIGNATURE`.
    pub fn new() -> Result<Self> {
        let sig = std::env::var("HYPRLAND_INSTANCE_SIGNATURE").map_err(|_| {
            OverlayError::Ipc(
                "HYPRLAND_INSTANCE_SIGNATURE not set; is Hyprland running?".into(),
            )
        })?;

        let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
            .unwrap_or_else(|_| "/run/user/1000".to_string());

        Ok(Self::at(PathBuf::from(format!("{runtime_dir}/hypr/{sig}"))))
    }

    /// Client for the instance whose sockets live in `dir`.
    pub fn at(dir: impl AsRef<Path>) -> Self {
        Self {
            cmd_socket: dir.as_ref().join(".socket.sock"),
        }
    }

    /// Path to the command socket.
    pub fn cmd_socket(&self) -> &Path {
        &self.cmd_socket
    }

    /// Send a one-shot command to Hyprland and return the raw response.
    pub async fn command(&self, cmd: &str) -> Result<String> {
        let mut stream = UnixStream::connect(&self.cmd_socket)
            .await
            .map_err(|e| OverlayError::Ipc(format!("connect: {e}")))?;

        stream
            .write_all(cmd.as_bytes())
            .await
            .map_err(|e| OverlayError::Ipc(format!("write: {e}")))?;

        let mut buf = String::new();
        stream
            .read_to_string(&mut buf)
            .await
            .map_err(|e| OverlayError::Ipc(format!("read: {e}")))?;

        Ok(buf)
    }
}

/// Fetch the global cursor position via `hyprctl cursorpos -j`.
pub async fn fetch_cursor_pos(ipc: &HyprlandIpc) -> Result<CursorPos> {
    let raw = ipc.command("j/cursorpos").await?;
    parse_cursor_pos(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::UnixListener;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("overlay-ipc-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn cursor_round_trip_over_socket() {
        let dir = scratch_dir("cursor");
        let ipc = HyprlandIpc::at(&dir);
        let listener = UnixListener::bind(ipc.cmd_socket()).unwrap();

        let server = tokio::spawn(async move {
            let (mut conn, _) = listener.accept().await.unwrap();
            let mut req = [0u8; 64];
            let n = conn.read(&mut req).await.unwrap();
            conn.write_all(br#"{"x": 10, "y": 20}"#).await.unwrap();
            String::from_utf8_lossy(&req[..n]).into_owned()
        });

        let pos = fetch_cursor_pos(&ipc).await.unwrap();
        assert_eq!(pos, CursorPos { x: 10, y: 20 });
        assert_eq!(server.await.unwrap(), "j/cursorpos");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn missing_socket_is_ipc_error() {
        let ipc = HyprlandIpc::at(scratch_dir("missing"));
        let err = ipc.command("j/cursorpos").await.unwrap_err();
        assert!(matches!(err, OverlayError::Ipc(_)));
    }
}
