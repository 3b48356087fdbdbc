//! Streaming response assembler.
//!
//! Reconstructs one assistant message from a sequence of partial-token
//! chunk events plus exactly one terminal signal, while tolerating legacy
//! backends that only ever send a whole, non-chunked response.
//!
//! The assembler is a pure state machine: it owns no conversation data and
//! performs no I/O. Every event produces a [`StreamEffect`] the session
//! layer applies to the target message.

/// Seconds the assembler waits for a first chunk before assuming the
/// backend took the legacy path and cleaning up the placeholder.
pub const FALLBACK_TIMEOUT_SECS: u64 = 10;

/// Assembler lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    /// No stream in flight.
    Idle,
    /// Placeholder inserted, no chunk seen yet; the fallback timer is live.
    AwaitingFirstChunk,
    /// At least one chunk with text has arrived.
    Accumulating,
    /// Terminal chunk processed; the message is sealed.
    Finalized,
    /// An error event ended the stream.
    Errored,
}

/// Instruction for the session layer after processing one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEffect {
    /// Nothing to do; the event was stale or irrelevant.
    None,
    /// Append `text` to the target message's content.
    Append { message_id: String, text: String },
    /// Seal the target message. `trailing_text` is appended first when the
    /// terminal chunk carried text. `memory_commit` tags provenance.
    /// Finalization is the success path: the completed exchange should be
    /// committed to long-term memory.
    Finalize {
        message_id: String,
        trailing_text: Option<String>,
        memory_commit: Option<String>,
    },
    /// Replace the target message's content with an error display string
    /// and clear its streaming flag. Not a memory-commit path.
    Fail { message_id: String, display: String },
    /// Hydrate the untouched placeholder with a whole legacy response in
    /// one step, then seal it. A memory-commit path.
    Hydrate {
        message_id: String,
        content: String,
        memory_commit: Option<String>,
    },
    /// Remove the still-empty placeholder from the conversation; the turn
    /// produced nothing visible.
    Discard { message_id: String },
}

/// Correlates an in-flight speak request with exactly one target message.
///
/// At most one stream is tracked per conversation. Starting a new turn while
/// one is open detaches the old turn: its placeholder is left as-is, its
/// timer is defused via the generation counter, and late chunks for it are
/// dropped.
#[derive(Debug)]
pub struct StreamingAssembler {
    state: AssemblerState,
    message_id: Option<String>,
    generation: u64,
    saw_chunk: bool,
}

impl StreamingAssembler {
    /// Creates an idle assembler.
    pub fn new() -> Self {
        Self {
            state: AssemblerState::Idle,
            message_id: None,
            generation: 0,
            saw_chunk: false,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// Whether a stream is in flight (placeholder live, not yet sealed).
    pub fn is_open(&self) -> bool {
        matches!(
            self.state,
            AssemblerState::AwaitingFirstChunk | AssemblerState::Accumulating
        )
    }

    /// Generation of the current turn; fallback timers carry this value so
    /// a stale timer from a previous turn can never fire against a newer
    /// placeholder.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Opens a new turn targeting the placeholder `message_id`.
    ///
    /// Returns the generation the caller must arm the fallback timer with.
    pub fn begin_turn(&mut self, message_id: &str) -> u64 {
        if self.is_open() {
            tracing::debug!(
                "[Assembler] Detaching open stream for message {:?} in favor of a new turn",
                self.message_id
            );
        }
        self.generation += 1;
        self.state = AssemblerState::AwaitingFirstChunk;
        self.message_id = Some(message_id.to_string());
        self.saw_chunk = false;
        self.generation
    }

    /// Processes one `speak_response_chunk` event.
    pub fn on_chunk(
        &mut self,
        chunk: &str,
        done: bool,
        error: Option<&str>,
        memory_commit: Option<&str>,
    ) -> StreamEffect {
        if !self.is_open() {
            tracing::debug!("[Assembler] Dropping chunk with no open stream");
            return StreamEffect::None;
        }
        // message_id is always present while a stream is open
        let message_id = match self.message_id.clone() {
            Some(id) => id,
            None => return StreamEffect::None,
        };

        // Any chunk event means real data arrived; the fallback timer is
        // irrelevant from here on.
        self.saw_chunk = true;

        if let Some(error) = error {
            self.state = AssemblerState::Errored;
            self.message_id = None;
            return StreamEffect::Fail {
                message_id,
                display: format!("Error: {}", error),
            };
        }

        if done {
            self.state = AssemblerState::Finalized;
            self.message_id = None;
            return StreamEffect::Finalize {
                message_id,
                trailing_text: if chunk.is_empty() {
                    None
                } else {
                    Some(chunk.to_string())
                },
                memory_commit: memory_commit.map(str::to_string),
            };
        }

        if chunk.is_empty() {
            // Keep-alive style chunk: defuses the timer but carries nothing.
            return StreamEffect::None;
        }

        self.state = AssemblerState::Accumulating;
        StreamEffect::Append {
            message_id,
            text: chunk.to_string(),
        }
    }

    /// Processes a legacy whole `speak_response` event.
    ///
    /// Hydrates the placeholder only when no chunk was ever received for
    /// this turn; otherwise the event is a duplicate compatibility echo and
    /// is ignored.
    pub fn on_legacy_response(
        &mut self,
        content: &str,
        memory_commit: Option<&str>,
    ) -> StreamEffect {
        if self.state != AssemblerState::AwaitingFirstChunk || self.saw_chunk {
            tracing::debug!("[Assembler] Ignoring legacy response (duplicate echo or no stream)");
            return StreamEffect::None;
        }
        let message_id = match self.message_id.take() {
            Some(id) => id,
            None => return StreamEffect::None,
        };
        self.state = AssemblerState::Finalized;
        StreamEffect::Hydrate {
            message_id,
            content: content.to_string(),
            memory_commit: memory_commit.map(str::to_string),
        }
    }

    /// Processes a protocol-level error event for the active stream.
    pub fn on_error(&mut self, message: &str) -> StreamEffect {
        if !self.is_open() {
            return StreamEffect::None;
        }
        let message_id = match self.message_id.take() {
            Some(id) => id,
            None => return StreamEffect::None,
        };
        self.state = AssemblerState::Errored;
        StreamEffect::Fail {
            message_id,
            display: format!("Error: {}", message),
        }
    }

    /// Handles the fallback timer firing for the turn with `generation`.
    ///
    /// Only a timer from the current turn, with the stream still waiting on
    /// its first chunk, removes the placeholder; anything else is a no-op.
    pub fn on_fallback_timeout(&mut self, generation: u64) -> StreamEffect {
        if generation != self.generation
            || self.state != AssemblerState::AwaitingFirstChunk
            || self.saw_chunk
        {
            return StreamEffect::None;
        }
        let message_id = match self.message_id.take() {
            Some(id) => id,
            None => return StreamEffect::None,
        };
        tracing::debug!(
            "[Assembler] No chunk within {}s, discarding empty placeholder",
            FALLBACK_TIMEOUT_SECS
        );
        self.state = AssemblerState::Idle;
        StreamEffect::Discard { message_id }
    }

    /// Hard cutover on disconnect: the in-flight placeholder is left as-is
    /// in the conversation (never retried) and the assembler returns to
    /// idle. Late chunks and stale timers for the old turn are dropped.
    pub fn detach(&mut self) {
        if self.is_open() {
            tracing::debug!("[Assembler] Detaching in-flight stream on disconnect");
        }
        self.state = AssemblerState::Idle;
        self.message_id = None;
        self.saw_chunk = false;
    }
}

impl Default for StreamingAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_assembler() -> (StreamingAssembler, u64) {
        let mut assembler = StreamingAssembler::new();
        let generation = assembler.begin_turn("msg-1");
        (assembler, generation)
    }

    #[test]
    fn test_chunks_append_in_arrival_order() {
        let (mut assembler, _) = open_assembler();

        assert_eq!(
            assembler.on_chunk("Hi ", false, None, None),
            StreamEffect::Append {
                message_id: "msg-1".to_string(),
                text: "Hi ".to_string()
            }
        );
        assert_eq!(assembler.state(), AssemblerState::Accumulating);

        assert_eq!(
            assembler.on_chunk("there!", false, None, None),
            StreamEffect::Append {
                message_id: "msg-1".to_string(),
                text: "there!".to_string()
            }
        );

        assert_eq!(
            assembler.on_chunk("", true, None, None),
            StreamEffect::Finalize {
                message_id: "msg-1".to_string(),
                trailing_text: None,
                memory_commit: None,
            }
        );
        assert_eq!(assembler.state(), AssemblerState::Finalized);
    }

    #[test]
    fn test_terminal_chunk_with_trailing_text() {
        let (mut assembler, _) = open_assembler();
        assembler.on_chunk("partial", false, None, None);

        let effect = assembler.on_chunk(" end", true, None, Some("commit-7"));
        assert_eq!(
            effect,
            StreamEffect::Finalize {
                message_id: "msg-1".to_string(),
                trailing_text: Some(" end".to_string()),
                memory_commit: Some("commit-7".to_string()),
            }
        );
    }

    #[test]
    fn test_error_chunk_fails_the_stream() {
        let (mut assembler, _) = open_assembler();
        assembler.on_chunk("some", false, None, None);

        let effect = assembler.on_chunk("", false, Some("backend exploded"), None);
        assert_eq!(
            effect,
            StreamEffect::Fail {
                message_id: "msg-1".to_string(),
                display: "Error: backend exploded".to_string(),
            }
        );
        assert_eq!(assembler.state(), AssemblerState::Errored);
        // Nothing further is expected for this target.
        assert_eq!(assembler.on_chunk("late", false, None, None), StreamEffect::None);
    }

    #[test]
    fn test_legacy_response_hydrates_untouched_placeholder() {
        let (mut assembler, _) = open_assembler();

        let effect = assembler.on_legacy_response("full answer", Some("commit-1"));
        assert_eq!(
            effect,
            StreamEffect::Hydrate {
                message_id: "msg-1".to_string(),
                content: "full answer".to_string(),
                memory_commit: Some("commit-1".to_string()),
            }
        );
        assert_eq!(assembler.state(), AssemblerState::Finalized);
    }

    #[test]
    fn test_legacy_response_after_chunks_is_ignored() {
        let (mut assembler, _) = open_assembler();
        assembler.on_chunk("streamed", false, None, None);

        assert_eq!(
            assembler.on_legacy_response("duplicate echo", None),
            StreamEffect::None
        );
        assert_eq!(assembler.state(), AssemblerState::Accumulating);
    }

    #[test]
    fn test_timeout_discards_empty_placeholder() {
        let (mut assembler, generation) = open_assembler();

        assert_eq!(
            assembler.on_fallback_timeout(generation),
            StreamEffect::Discard {
                message_id: "msg-1".to_string()
            }
        );
        assert_eq!(assembler.state(), AssemblerState::Idle);
    }

    #[test]
    fn test_timeout_after_chunk_is_noop() {
        let (mut assembler, generation) = open_assembler();
        assembler.on_chunk("data", false, None, None);

        assert_eq!(assembler.on_fallback_timeout(generation), StreamEffect::None);
        assert_eq!(assembler.state(), AssemblerState::Accumulating);
    }

    #[test]
    fn test_timeout_after_legacy_hydration_is_noop() {
        let (mut assembler, generation) = open_assembler();
        assembler.on_legacy_response("whole", None);

        assert_eq!(assembler.on_fallback_timeout(generation), StreamEffect::None);
        assert_eq!(assembler.state(), AssemblerState::Finalized);
    }

    #[test]
    fn test_stale_timer_from_previous_turn_is_noop() {
        let mut assembler = StreamingAssembler::new();
        let old_generation = assembler.begin_turn("msg-old");
        let _ = assembler.begin_turn("msg-new");

        assert_eq!(assembler.on_fallback_timeout(old_generation), StreamEffect::None);
        assert_eq!(assembler.state(), AssemblerState::AwaitingFirstChunk);
    }

    #[test]
    fn test_empty_non_terminal_chunk_defuses_timer_without_appending() {
        let (mut assembler, generation) = open_assembler();

        assert_eq!(assembler.on_chunk("", false, None, None), StreamEffect::None);
        assert_eq!(assembler.state(), AssemblerState::AwaitingFirstChunk);
        // The keep-alive counts as arrival: the timer must no longer fire...
        assert_eq!(assembler.on_fallback_timeout(generation), StreamEffect::None);
        // ...and a legacy response no longer hydrates.
        assert_eq!(assembler.on_legacy_response("late", None), StreamEffect::None);
    }

    #[test]
    fn test_detach_leaves_placeholder_and_drops_late_chunks() {
        let (mut assembler, _) = open_assembler();
        assembler.on_chunk("half", false, None, None);

        assembler.detach();
        assert_eq!(assembler.state(), AssemblerState::Idle);
        assert_eq!(assembler.on_chunk("ghost", false, None, None), StreamEffect::None);
    }
}
