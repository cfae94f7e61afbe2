/// Frame/media-time conversion for fixed-rate video.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameClock {
    pub fps: f64,
}

impl FrameClock {
    pub fn new(fps: f64) -> Self {
        Self { fps }
    }

    /// Media time (seconds) at which `frame` begins.
    pub fn media_time(&self, frame: u64) -> f64 {
        frame as f64 / self.fps
    }

    /// Frame containing the given media time.
    ///
    /// The playback element only exposes a media-time readout, so frame
    /// indices are always derived by flooring.
    pub fn frame_at(&self, media_time: f64) -> u64 {
        if media_time <= 0.0 {
            return 0;
        }
        (media_time * self.fps).floor() as u64
    }
}
