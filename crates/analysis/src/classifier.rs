//! Tag-aware token classifier.
//!
//! The model wraps internal deliberation in `<think>…</think>` markers, but
//! the transport delivers text in arbitrary fragments: a fragment may contain
//! an opening marker, a closing marker, both, neither, or a marker may itself
//! arrive broken across two consecutive fragments.
//!
//! The classifier threads one state bit (inside-reasoning-region) through
//! each call and splits every fragment at the marker occurrences it can see,
//! routing each non-empty segment to the channel that was active when it was
//! scanned. One classifier instance per request; never shared.
//!
//! Known limitation, preserved deliberately: detection is best-effort within
//! a single fragment. A marker broken exactly across a fragment boundary
//! (e.g. `"<th"` + `"ink>"`) is not recognized — there is no lookahead
//! buffering — so its pieces leak into the surrounding channel text for that
//! fragment. A fragment that *begins* with a partial opening marker is
//! routed to the thinking channel, matching the region it starts.

/// Opening marker of a reasoning region.
pub const THINK_OPEN: &str = "<think>";

/// Closing marker of a reasoning region.
pub const THINK_CLOSE: &str = "</think>";

/// The semantic channel a piece of text belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Hidden deliberation inside a reasoning region.
    Thinking,
    /// User-visible answer text.
    Content,
}

/// One classified piece of fragment text, markers stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEvent {
    pub channel: Channel,
    pub text: String,
}

/// Per-request classifier state.
#[derive(Debug, Default)]
pub struct TagClassifier {
    in_reasoning: bool,
}

impl TagClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the stream is currently inside a reasoning region.
    pub fn in_reasoning(&self) -> bool {
        self.in_reasoning
    }

    /// Classify one fragment, emitting zero or more events.
    ///
    /// The fragment is scanned for the marker matching the current state
    /// (`<think>` while outside, `</think>` while inside); state flips at
    /// each occurrence and the text between markers is emitted on the channel
    /// that was active when it was scanned. Residual marker substrings that
    /// did not drive a flip (e.g. a stray closing tag while outside) are
    /// stripped from emitted text. Empty-after-stripping segments emit no
    /// event.
    pub fn classify(&mut self, fragment: &str) -> Vec<ClassifiedEvent> {
        let mut events = Vec::new();
        let mut rest = fragment;

        loop {
            let marker = if self.in_reasoning {
                THINK_CLOSE
            } else {
                THINK_OPEN
            };

            match rest.find(marker) {
                Some(idx) => {
                    self.emit(&rest[..idx], &mut events);
                    rest = &rest[idx + marker.len()..];
                    self.in_reasoning = !self.in_reasoning;
                }
                None => {
                    // A fragment that begins with the head of an opening
                    // marker is a marker being born across fragments; route
                    // it to the region it starts (best-effort).
                    if !self.in_reasoning && rest.starts_with("<think") {
                        events.push(ClassifiedEvent {
                            channel: Channel::Thinking,
                            text: strip_markers(rest),
                        });
                    } else {
                        self.emit(rest, &mut events);
                    }
                    break;
                }
            }
        }

        events.retain(|e| !e.text.is_empty());
        events
    }

    fn emit(&self, segment: &str, events: &mut Vec<ClassifiedEvent>) {
        let text = strip_markers(segment);
        if text.is_empty() {
            return;
        }
        let channel = if self.in_reasoning {
            Channel::Thinking
        } else {
            Channel::Content
        };
        events.push(ClassifiedEvent { channel, text });
    }
}

fn strip_markers(text: &str) -> String {
    text.replace(THINK_OPEN, "").replace(THINK_CLOSE, "")
}
