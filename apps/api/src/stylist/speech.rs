//! Speech synthesis: raw PCM from the model, wrapped as WAV for playback.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;
use tracing::{info, warn};

use crate::llm_client::{GeminiClient, LlmError};

pub const SAMPLE_RATE: u32 = 24_000;
pub const CHANNELS: u16 = 1;
pub const BITS_PER_SAMPLE: u16 = 16;

const WAV_HEADER_LEN: usize = 44;

/// Signed 16-bit little-endian mono PCM at [`SAMPLE_RATE`].
#[derive(Debug, Clone)]
pub struct SpeechClip {
    pcm: Bytes,
}

impl SpeechClip {
    pub fn from_pcm(pcm: Vec<u8>) -> Result<Self, LlmError> {
        if pcm.is_empty() {
            return Err(LlmError::Audio("no audio samples".to_string()));
        }
        if pcm.len() % usize::from(BITS_PER_SAMPLE / 8 * CHANNELS) != 0 {
            return Err(LlmError::Audio(format!(
                "{} bytes is not a whole number of 16-bit samples",
                pcm.len()
            )));
        }
        Ok(Self {
            pcm: Bytes::from(pcm),
        })
    }

    pub fn duration(&self) -> Duration {
        let bytes_per_second = SAMPLE_RATE as u64 * block_align() as u64;
        Duration::from_millis(self.pcm.len() as u64 * 1000 / bytes_per_second)
    }

    /// Canonical 44-byte RIFF/WAVE header followed by the samples.
    pub fn to_wav(&self) -> Bytes {
        let data_len = self.pcm.len() as u32;
        let mut wav = BytesMut::with_capacity(WAV_HEADER_LEN + self.pcm.len());

        wav.put_slice(b"RIFF");
        wav.put_u32_le(36 + data_len);
        wav.put_slice(b"WAVE");

        wav.put_slice(b"fmt ");
        wav.put_u32_le(16);
        wav.put_u16_le(1); // PCM
        wav.put_u16_le(CHANNELS);
        wav.put_u32_le(SAMPLE_RATE);
        wav.put_u32_le(SAMPLE_RATE * u32::from(block_align()));
        wav.put_u16_le(block_align());
        wav.put_u16_le(BITS_PER_SAMPLE);

        wav.put_slice(b"data");
        wav.put_u32_le(data_len);
        wav.put_slice(&self.pcm);

        wav.freeze()
    }
}

fn block_align() -> u16 {
    CHANNELS * BITS_PER_SAMPLE / 8
}

pub async fn synthesize(
    llm: &GeminiClient,
    text: &str,
    voice: &str,
) -> Result<SpeechClip, LlmError> {
    let pcm = llm.synthesize_speech(text, voice).await?;
    let clip = SpeechClip::from_pcm(pcm)?;
    info!("Synthesized {:?} of speech with voice {}", clip.duration(), voice);
    Ok(clip)
}

/// Result of the optional speech stage of a styling run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpeechOutcome {
    Ok {
        /// Base64 of a complete WAV file.
        audio_base64: String,
        sample_rate: u32,
        channels: u16,
        bits_per_sample: u16,
        duration_ms: u64,
    },
    Failed {
        message: String,
    },
}

impl SpeechOutcome {
    pub fn from_result(result: Result<SpeechClip, LlmError>) -> Self {
        match result {
            Ok(clip) => SpeechOutcome::Ok {
                audio_base64: BASE64.encode(clip.to_wav()),
                sample_rate: SAMPLE_RATE,
                channels: CHANNELS,
                bits_per_sample: BITS_PER_SAMPLE,
                duration_ms: clip.duration().as_millis() as u64,
            },
            Err(e) => {
                warn!("Speech synthesis failed: {e}");
                SpeechOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_client;
    use serde_json::json;

    #[test]
    fn odd_length_pcm_is_rejected() {
        assert!(matches!(
            SpeechClip::from_pcm(vec![0; 3]),
            Err(LlmError::Audio(_))
        ));
        assert!(matches!(SpeechClip::from_pcm(Vec::new()), Err(LlmError::Audio(_))));
    }

    #[test]
    fn one_second_of_audio() {
        let clip = SpeechClip::from_pcm(vec![0; 48_000]).unwrap();
        assert_eq!(clip.duration(), Duration::from_secs(1));
    }

    #[test]
    fn wav_header_describes_the_samples() {
        let clip = SpeechClip::from_pcm(vec![1, 0, 2, 0]).unwrap();
        let wav = clip.to_wav();

        assert_eq!(wav.len(), 48);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(wav[4..8].try_into().unwrap()), 40);
        assert_eq!(&wav[8..16], b"WAVEfmt ");
        assert_eq!(u16::from_le_bytes([wav[22], wav[23]]), 1);
        assert_eq!(u32::from_le_bytes(wav[24..28].try_into().unwrap()), 24_000);
        assert_eq!(u32::from_le_bytes(wav[28..32].try_into().unwrap()), 48_000);
        assert_eq!(u16::from_le_bytes([wav[34], wav[35]]), 16);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 4);
        assert_eq!(&wav[44..], &[1, 0, 2, 0]);
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let ok = SpeechOutcome::from_result(SpeechClip::from_pcm(vec![0; 4800]));
        let value = serde_json::to_value(&ok).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["sample_rate"], 24_000);
        assert_eq!(value["duration_ms"], 100);

        let failed = SpeechOutcome::from_result(Err(LlmError::EmptyContent));
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({"status": "failed", "message": "LLM returned empty content"})
        );
    }

    #[tokio::test]
    async fn synthesize_decodes_model_audio() {
        let pcm = BASE64.encode([0u8, 1, 2, 3]);
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/test-tts:generateContent")
            .with_status(200)
            .with_body(
                json!({
                    "candidates": [{
                        "content": {"parts": [{"inlineData": {"mimeType": "audio/L16;rate=24000", "data": pcm}}]}
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let llm = test_client(&server.url(), 1);
        let clip = synthesize(&llm, "hello", "Kore").await.unwrap();
        assert_eq!(clip.to_wav().len(), 48);
    }
}
