//! Live transcription channel.
//!
//! A [`TranscriptSource`] opens a stream of transcript fragments. A [`Recorder`] drains
//! that stream on a background task, appending each fragment to a shared buffer until
//! [`Recorder::stop`] is called or the recorder is dropped. Either way the stream is
//! dropped, which is what releases the capture resource behind it.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::error::EnrichmentError;

pub type FragmentStream = BoxStream<'static, Result<String, EnrichmentError>>;

#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Open a new streaming session.
    async fn open(&self) -> Result<FragmentStream, EnrichmentError>;
}

/// A source fed from an in-process channel, e.g. lines piped from an external
/// speech-to-text tool. Single use: the receiver is handed out on the first `open`.
pub struct ChannelTranscriptSource {
    receiver: Mutex<Option<mpsc::Receiver<String>>>,
}

impl ChannelTranscriptSource {
    pub fn new(buffer: usize) -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (
            tx,
            Self {
                receiver: Mutex::new(Some(rx)),
            },
        )
    }
}

#[async_trait]
impl TranscriptSource for ChannelTranscriptSource {
    async fn open(&self) -> Result<FragmentStream, EnrichmentError> {
        let rx = self
            .receiver
            .lock()
            .map_err(|e| EnrichmentError::Transcription(format!("source lock poisoned: {e}")))?
            .take()
            .ok_or_else(|| EnrichmentError::Transcription("source already opened".into()))?;
        Ok(ReceiverStream::new(rx)
            .map(Ok::<String, EnrichmentError>)
            .boxed())
    }
}

/// An active recording session.
pub struct Recorder {
    buffer: Arc<Mutex<String>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<Option<EnrichmentError>>>,
}

impl Recorder {
    /// Open `source` and start appending fragments to a fresh buffer.
    pub async fn start(source: &dyn TranscriptSource) -> Result<Self, EnrichmentError> {
        let mut stream = source.open().await?;
        let buffer = Arc::new(Mutex::new(String::new()));
        let cancel = CancellationToken::new();

        let task_buffer = Arc::clone(&buffer);
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            tracing::info!("transcription session opened");
            let failure = loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => {
                        // keep whatever the source delivered before the stop
                        while let Some(Some(Ok(fragment))) = stream.next().now_or_never() {
                            if let Ok(mut buf) = task_buffer.lock() {
                                buf.push_str(&fragment);
                            }
                        }
                        break None;
                    }
                    next = stream.next() => match next {
                        Some(Ok(fragment)) => {
                            if let Ok(mut buf) = task_buffer.lock() {
                                buf.push_str(&fragment);
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "transcription stream failed");
                            break Some(e);
                        }
                        None => break None,
                    },
                }
            };
            drop(stream);
            tracing::info!("transcription session closed");
            failure
        });

        Ok(Self {
            buffer,
            cancel,
            task: Some(task),
        })
    }

    /// Transcript accumulated so far.
    pub fn transcript(&self) -> String {
        self.buffer.lock().map(|b| b.clone()).unwrap_or_default()
    }

    /// Stop recording, close the stream and return the final transcript.
    pub async fn stop(self) -> Result<String, EnrichmentError> {
        self.cancel.cancel();
        self.finish().await
    }

    /// Wait for the source to end the stream on its own, then return the transcript.
    pub async fn finish(mut self) -> Result<String, EnrichmentError> {
        if let Some(task) = self.task.take() {
            let failure = task.await.map_err(|e| {
                EnrichmentError::Transcription(format!("recorder task failed: {e}"))
            })?;
            if let Some(e) = failure {
                return Err(e);
            }
        }
        Ok(self.transcript())
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
