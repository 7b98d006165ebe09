use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use thoughtweave::enrichment::transcription::{ChannelTranscriptSource, Recorder};
use thoughtweave::session::Session;

use super::thoughts;

/// Capture a thought from a live transcript.
///
/// Each stdin line is one transcript fragment, e.g. piped from a speech-to-text tool.
/// Recording ends at EOF or Ctrl-C, and the transcript is then captured as a thought.
pub async fn record(session: &Session) -> Result<()> {
    let (tx, source) = ChannelTranscriptSource::new(64);
    let recorder = Recorder::start(&source).await?;
    eprintln!("Recording... (EOF or Ctrl-C to stop)");

    let mut feeder = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(format!("{line} ")).await.is_err() {
                break;
            }
        }
    });

    let transcript = tokio::select! {
        joined = &mut feeder => {
            joined?;
            recorder.finish().await?
        }
        _ = tokio::signal::ctrl_c() => {
            feeder.abort();
            recorder.stop().await?
        }
    };

    let text = transcript.trim();
    if text.is_empty() {
        anyhow::bail!("nothing was recorded");
    }
    thoughts::add(session, text).await
}
