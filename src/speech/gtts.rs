//! Google Translate text-to-speech.
//!
//! The endpoint only accepts short texts, so a reply is split into chunks of
//! at most [`MAX_CHUNK_CHARS`] characters at word boundaries.  The MP3
//! answers are concatenated (MPEG frames are self-delimiting) and handed to
//! an external player.

use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::SpeechConfig;
use crate::speech::{archive, Speaker, SpeechError};

pub const MAX_CHUNK_CHARS: usize = 100;

/// Speaks through Google Translate TTS and an MP3 player (`mpg123`).
pub struct TtsSpeaker {
    client: reqwest::Client,
    language: String,
    region: String,
    player: String,
}

impl TtsSpeaker {
    pub fn from_config(config: &SpeechConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("Mozilla/5.0")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            language: config.language.clone(),
            region: config.region.clone(),
            player: config.player.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("https://translate.google.{}/translate_tts", self.region)
    }

    /// Render `text` to MP3 bytes.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let total = chunks.len().to_string();
        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let response = self
                .client
                .get(self.endpoint())
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", self.language.as_str()),
                    ("q", chunk.as_str()),
                    ("total", total.as_str()),
                    ("idx", idx.to_string().as_str()),
                    ("textlen", chunk.chars().count().to_string().as_str()),
                ])
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(SpeechError::Status {
                    status: status.as_u16(),
                });
            }
            audio.extend_from_slice(&response.bytes().await?);
        }

        log::debug!("synthesised {} chunk(s), {} bytes", chunks.len(), audio.len());
        Ok(audio)
    }

    /// Play MP3 bytes through the external player and wait for it.
    async fn play(&self, audio: &[u8]) -> Result<(), SpeechError> {
        let mut file = tempfile::Builder::new()
            .prefix("reply-")
            .suffix(".mp3")
            .tempfile()?;
        file.write_all(audio)?;
        file.flush()?;
        log::debug!("playing {}", file.path().display());

        // Dropping this future (shutdown mid-reply) stops the player too.
        let status = tokio::process::Command::new(&self.player)
            .arg("-q")
            .arg(file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| SpeechError::Player(format!("{}: {e}", self.player)))?;

        if !status.success() {
            return Err(SpeechError::Player(format!("{} exited with {status}", self.player)));
        }
        Ok(())
    }
}

#[async_trait]
impl Speaker for TtsSpeaker {
    async fn speak(&self, text: &str, save_as: Option<&Path>) -> Result<(), SpeechError> {
        let audio = self.synthesize(text).await?;
        log::debug!("speaking: {text}");
        let played = self.play(&audio).await;

        if let Some(path) = save_as {
            match archive::save(path, &audio) {
                Ok(saved) => log::info!("reply saved at {}", saved.display()),
                Err(e) => log::error!("cannot save reply to {}: {e}", path.display()),
            }
        }

        played
    }
}

// ---------------------------------------------------------------------------
// Chunking
// ---------------------------------------------------------------------------

/// Split `text` into pieces of at most `max_chars` characters, breaking at
/// whitespace.  Words longer than `max_chars` are cut.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word = word;
        let mut word_len = word.chars().count();

        while word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let cut = word
                .char_indices()
                .nth(max_chars)
                .map_or(word.len(), |(i, _)| i);
            chunks.push(word[..cut].to_string());
            word = &word[cut..];
            word_len -= max_chars;
        }
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
