use std::time::Instant;
use winit::window::Window;

pub struct FrameTiming {
    last_fps_time: Instant,
    frame_count: u32,
    frame_ms: f32,
    base_title: String,
}

impl FrameTiming {
    pub fn new(base_title: String) -> Self {
        Self {
            last_fps_time: Instant::now(),
            frame_count: 0,
            frame_ms: 0.0,
            base_title,
        }
    }

    /// Time spent in the last director frame.
    pub fn set_frame_ms(&mut self, frame_ms: f32) {
        self.frame_ms = frame_ms;
    }

    /// Count a frame and refresh the title twice a second with fps and `status`.
    pub fn update(&mut self, window: Option<&Window>, now: Instant, status: &str) {
        self.frame_count = self.frame_count.saturating_add(1);
        let elapsed = now.saturating_duration_since(self.last_fps_time);
        if elapsed.as_secs_f32() >= 0.5 {
            let fps = self.frame_count as f32 / elapsed.as_secs_f32();
            if let Some(window) = window {
                window.set_title(&format!(
                    "{} - {:.1} fps (frame {:.2} ms) - {}",
                    self.base_title, fps, self.frame_ms, status
                ));
            }
            self.frame_count = 0;
            self.last_fps_time = now;
        }
    }
}
