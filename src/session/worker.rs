//! Background owner of the recorded samples.
//!
//! The [`Worker`] runs as a tokio task and is the only place the
//! [`SampleBuffer`] lives.  The session talks to it exclusively through
//! [`Command`]s; each `Record` carries its own copy of the frame so nothing
//! is shared across the boundary.  Encoding is pushed onto
//! `tokio::task::spawn_blocking` so the async runtime never stalls.

use tokio::sync::mpsc;

use super::recorder::RecorderError;
use super::requests::{Reply, RequestId, Response};
use crate::audio::{FrameSet, SampleBuffer};
use crate::wav::{encode_channels, WavBlob};

/// Fixed encode parameters, sent once when the session starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WorkerConfig {
    pub sample_rate: u32,
    pub channel_count: u16,
    pub downsample_to: Option<u32>,
}

#[derive(Debug)]
pub(crate) enum Command {
    Init(WorkerConfig),
    Record(FrameSet),
    Export { id: RequestId, mime_type: String },
    GetBuffer { id: RequestId },
    Clear,
}

struct WorkerState {
    config: WorkerConfig,
    buffer: SampleBuffer,
}

pub(crate) struct Worker {
    state: Option<WorkerState>,
    responses: mpsc::UnboundedSender<Response>,
}

impl Worker {
    pub fn new(responses: mpsc::UnboundedSender<Response>) -> Self {
        Self {
            state: None,
            responses,
        }
    }

    /// Process commands until every sender has been dropped.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            self.handle(command).await;
        }
        log::debug!("worker: command channel closed, shutting down");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Init(config) => {
                log::debug!(
                    "worker: init {} Hz, {} ch, downsample {:?}",
                    config.sample_rate,
                    config.channel_count,
                    config.downsample_to
                );
                self.state = Some(WorkerState {
                    config,
                    buffer: SampleBuffer::new(config.channel_count as usize),
                });
            }

            Command::Record(frame) => match self.state.as_mut() {
                Some(state) => {
                    if !state.buffer.push(frame) {
                        log::warn!("worker: dropped frame with wrong channel count");
                    }
                }
                None => log::warn!("worker: record before init, frame dropped"),
            },

            Command::GetBuffer { id } => {
                let buffers = match &self.state {
                    Some(state) => state.buffer.merge(),
                    None => {
                        log::warn!("worker: get_buffer before init");
                        Vec::new()
                    }
                };
                self.respond(id, Reply::Buffer(buffers));
            }

            Command::Export { id, mime_type } => {
                let result = self.export(mime_type).await;
                self.respond(id, Reply::Wav(result));
            }

            Command::Clear => {
                if let Some(state) = self.state.as_mut() {
                    state.buffer.clear();
                }
                log::debug!("worker: buffer cleared");
            }
        }
    }

    async fn export(&self, mime_type: String) -> Result<WavBlob, RecorderError> {
        let state = self
            .state
            .as_ref()
            .ok_or(RecorderError::NotInitialized("export"))?;

        let channels = state.buffer.merge();
        let config = state.config;
        log::debug!(
            "worker: exporting {:.2}s ({} frames)",
            state.buffer.duration_secs(config.sample_rate),
            state.buffer.frame_count()
        );

        let bytes = tokio::task::spawn_blocking(move || {
            encode_channels(&channels, config.sample_rate, config.downsample_to)
        })
        .await
        .map_err(|e| RecorderError::Internal(e.to_string()))??;

        Ok(WavBlob::new(mime_type, bytes))
    }

    fn respond(&self, id: RequestId, reply: Reply) {
        if self.responses.send(Response { id, reply }).is_err() {
            log::warn!("worker: response receiver dropped, reply {id} lost");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
