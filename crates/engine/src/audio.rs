use arcade_tetris_types::LineClearEvent;

/// Receives sound cues from the game loop.
///
/// Called on the engine task, so implementations must return quickly.
pub trait AudioSink: Send {
    /// Rows completed by one lock; `event.is_tetris()` selects the big cue.
    fn line_clear(&mut self, event: LineClearEvent);
}

impl<A: AudioSink + ?Sized> AudioSink for Box<A> {
    fn line_clear(&mut self, event: LineClearEvent) {
        (**self).line_clear(event)
    }
}

/// Silence
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAudio;

impl AudioSink for NoopAudio {
    fn line_clear(&mut self, _event: LineClearEvent) {}
}
