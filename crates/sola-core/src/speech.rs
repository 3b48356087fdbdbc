//! Speech output seam.
//!
//! When voice output is enabled, proactive pushes and other spoken text are
//! forwarded here. Failures are logged by the caller, never surfaced.

use async_trait::async_trait;

/// Trait for forwarding text to a speech-output facility.
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    /// Speaks the given text.
    async fn speak(&self, text: &str) -> Result<(), String>;
}

/// A silent implementation for fronts without audio output.
pub struct NoOpSpeechOutput;

#[async_trait]
impl SpeechOutput for NoOpSpeechOutput {
    async fn speak(&self, _text: &str) -> Result<(), String> {
        Ok(())
    }
}
