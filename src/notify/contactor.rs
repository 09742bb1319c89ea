// src/notify/contactor.rs
// =============================================================================
// Delivers change alerts to the "contactor" process over TCP.
//
// How it works:
// 1. `spawn` starts a background task and returns a cheap handle
// 2. `notify` pushes the event onto an unbounded channel and returns
// 3. The task keeps (re)connecting every RETRY_INTERVAL and writes each event
//    as one node-ipc style message: {"type":"alert","data":"<json>"} + '\f'
//
// An alert that shows up while we're disconnected, or whose write fails, is
// logged and dropped. The crawl never sees any of this.
// =============================================================================

use super::{ChangeEvent, Notifier, SOURCE_ID};
use serde::Serialize;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

const RETRY_INTERVAL: Duration = Duration::from_millis(1500);
const DELIMITER: u8 = b'\x0c';

/// Handle to the background contactor connection.
#[derive(Debug)]
pub struct ContactorChannel {
    sender: UnboundedSender<ChangeEvent>,
    task: JoinHandle<()>,
}

impl ContactorChannel {
    /// Starts the connection task. Must be called from within a tokio runtime.
    pub fn spawn(address: impl Into<String>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(address.into(), receiver, RETRY_INTERVAL));
        Self { sender, task }
    }
}

impl Notifier for ContactorChannel {
    fn notify(&self, event: ChangeEvent) {
        if let Err(e) = self.sender.send(event) {
            tracing::warn!(url = %e.0.url, "contactor channel closed, alert could not be delivered");
        }
    }
}

impl Drop for ContactorChannel {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[derive(Serialize)]
struct Alert<'a> {
    id: &'a str,
    message: String,
}

#[derive(Serialize)]
struct IpcMessage<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    data: String,
}

// One framed message, delimiter included
fn encode(event: &ChangeEvent) -> Result<Vec<u8>, serde_json::Error> {
    let alert = serde_json::to_string(&Alert {
        id: SOURCE_ID,
        message: event.message(),
    })?;
    let mut frame = serde_json::to_vec(&IpcMessage {
        kind: "alert",
        data: alert,
    })?;
    frame.push(DELIMITER);
    Ok(frame)
}

fn undelivered(event: &ChangeEvent, reason: &str) {
    tracing::warn!(url = %event.url, "alert could not be delivered: {}", reason);
}

async fn connect_with_retry(address: &str, retry: Duration) -> TcpStream {
    loop {
        match TcpStream::connect(address).await {
            Ok(stream) => return stream,
            Err(e) => {
                tracing::debug!("contactor at {} unreachable: {}", address, e);
                tokio::time::sleep(retry).await;
            }
        }
    }
}

async fn run(address: String, mut events: UnboundedReceiver<ChangeEvent>, retry: Duration) {
    let mut connection: Option<TcpStream> = None;

    loop {
        if connection.is_none() {
            // Keep draining events while we wait for the contactor
            tokio::select! {
                stream = connect_with_retry(&address, retry) => {
                    tracing::info!("Connected to contactor at {}", address);
                    connection = Some(stream);
                }
                event = events.recv() => match event {
                    Some(event) => undelivered(&event, "not connected to contactor"),
                    None => return,
                },
            }
            continue;
        }

        let Some(event) = events.recv().await else {
            return;
        };

        let frame = match encode(&event) {
            Ok(frame) => frame,
            Err(e) => {
                undelivered(&event, &e.to_string());
                continue;
            }
        };

        let Some(stream) = connection.as_mut() else {
            continue;
        };
        let written = stream.write_all(&frame).await;
        if let Err(e) = written {
            undelivered(&event, &e.to_string());
            connection = None;
        }
    }
}
