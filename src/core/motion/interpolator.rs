use crate::core::motion::easing::{blend, ease_out_cubic, linear_progress};
use crate::domain::models::LatLng;
use crate::infra::scheduler::{Scheduler, WakeupHandle};

#[derive(Debug, Clone, Copy)]
struct Glide {
    start: LatLng,
    end: LatLng,
    started_ms: u64,
    frame: WakeupHandle,
}

impl Glide {
    fn linear(&self, now_ms: u64, duration_ms: u64) -> f64 {
        linear_progress(now_ms.saturating_sub(self.started_ms), duration_ms)
    }

    fn position_at(&self, linear: f64) -> LatLng {
        if linear >= 1.0 {
            self.end
        } else {
            blend(self.start, self.end, ease_out_cubic(linear))
        }
    }
}

/// Glides the displayed marker coordinate toward the latest fix, one
/// animation frame at a time. At most one glide is in flight.
#[derive(Debug)]
pub struct PositionInterpolator {
    duration_ms: u64,
    displayed: Option<LatLng>,
    glide: Option<Glide>,
}

impl PositionInterpolator {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            displayed: None,
            glide: None,
        }
    }

    pub fn displayed(&self) -> Option<LatLng> {
        self.displayed
    }

    pub fn is_animating(&self) -> bool {
        self.glide.is_some()
    }

    pub fn pending_frame(&self) -> Option<WakeupHandle> {
        self.glide.map(|glide| glide.frame)
    }

    /// Points the interpolator at a new target. `None` or an invalid
    /// coordinate clears the display.
    pub fn retarget(
        &mut self,
        target: Option<LatLng>,
        now_ms: u64,
        scheduler: &mut impl Scheduler,
    ) {
        self.cancel(scheduler);
        let Some(end) = target.filter(LatLng::is_valid) else {
            self.displayed = None;
            return;
        };

        let start = self.displayed.unwrap_or(end);
        if start == end {
            self.displayed = Some(end);
            return;
        }

        let frame = scheduler.request_frame();
        tracing::debug!(
            "glide {:.5},{:.5} -> {:.5},{:.5}",
            start.lat,
            start.lng,
            end.lat,
            end.lng
        );
        self.glide = Some(Glide {
            start,
            end,
            started_ms: now_ms,
            frame,
        });
    }

    /// Applies one animation frame. Returns false when `handle` does not
    /// belong to the glide in flight; such frames leave state untouched.
    pub fn on_frame(
        &mut self,
        handle: WakeupHandle,
        now_ms: u64,
        scheduler: &mut impl Scheduler,
    ) -> bool {
        let Some(mut glide) = self.glide else {
            return false;
        };
        if glide.frame != handle {
            return false;
        }

        let linear = glide.linear(now_ms, self.duration_ms);
        self.displayed = Some(glide.position_at(linear));
        if linear < 1.0 {
            glide.frame = scheduler.request_frame();
            self.glide = Some(glide);
        } else {
            self.glide = None;
        }
        true
    }

    /// Position the marker would show at `now_ms` without advancing frames.
    pub fn sample(&self, now_ms: u64) -> Option<LatLng> {
        match self.glide {
            Some(glide) => Some(glide.position_at(glide.linear(now_ms, self.duration_ms))),
            None => self.displayed,
        }
    }

    pub fn cancel(&mut self, scheduler: &mut impl Scheduler) {
        if let Some(glide) = self.glide.take() {
            scheduler.cancel_frame(glide.frame);
        }
    }
}
