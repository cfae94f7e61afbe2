use foundation::time::FrameClock;

/// Outcome of one poller tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Playback is live; the current frame index.
    Frame(u64),
    /// The poller stopped itself (paused or ended) or was never running.
    Stopped,
}

/// Animation-tick frame counter for video playback.
///
/// The playback element only exposes a media-time readout, so the current
/// frame index is derived by polling once per animation tick while playing.
/// The loop stops itself when the video is paused or has ended; it never runs
/// unbounded.
#[derive(Debug)]
pub struct FramePoller {
    clock: FrameClock,
    running: bool,
    last_frame: u64,
}

impl FramePoller {
    pub fn new(clock: FrameClock) -> Self {
        Self {
            clock,
            running: false,
            last_frame: 0,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stops the loop without waiting for the next tick.
    ///
    /// Must be called before the owning layer's source is removed.
    pub fn cancel(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn last_frame(&self) -> u64 {
        self.last_frame
    }

    /// One animation tick against the playback element's current state.
    pub fn tick(&mut self, media_time: f64, paused: bool, ended: bool) -> PollOutcome {
        if !self.running {
            return PollOutcome::Stopped;
        }
        if paused || ended {
            self.running = false;
            return PollOutcome::Stopped;
        }
        self.last_frame = self.clock.frame_at(media_time);
        PollOutcome::Frame(self.last_frame)
    }
}
