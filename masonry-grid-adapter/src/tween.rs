use masonry_grid::{Easing, ItemRect};

/// Interpolates an item view between two rects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RectTween {
    pub from: ItemRect,
    pub to: ItemRect,
    pub start_ms: u64,
    pub duration_ms: u64,
    pub easing: Easing,
}

impl RectTween {
    pub fn new(
        from: ItemRect,
        to: ItemRect,
        start_ms: u64,
        duration_ms: u64,
        easing: Easing,
    ) -> Self {
        Self {
            from,
            to,
            start_ms,
            duration_ms: duration_ms.max(1),
            easing,
        }
    }

    pub fn is_done(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.start_ms) >= self.duration_ms
    }

    pub fn sample(&self, now_ms: u64) -> ItemRect {
        let elapsed = now_ms.saturating_sub(self.start_ms);
        let t = (elapsed as f32 / self.duration_ms as f32).clamp(0.0, 1.0);
        let eased = self.easing.sample(t);
        ItemRect {
            x: lerp_i64(self.from.x, self.to.x, eased),
            y: lerp_i64(self.from.y, self.to.y, eased),
            width: lerp_i64(self.from.width as i64, self.to.width as i64, eased).max(0) as u32,
            height: lerp_i64(self.from.height as i64, self.to.height as i64, eased).max(0) as u32,
        }
    }

    /// Restarts from the current sample towards `new_to`.
    pub fn retarget(&mut self, now_ms: u64, new_to: ItemRect, duration_ms: u64) {
        let cur = self.sample(now_ms);
        *self = Self::new(cur, new_to, now_ms, duration_ms, self.easing);
    }
}

fn lerp_i64(from: i64, to: i64, t: f32) -> i64 {
    let v = from as f64 + (to as f64 - from as f64) * t as f64;
    if v.is_sign_negative() {
        (v - 0.5) as i64
    } else {
        (v + 0.5) as i64
    }
}
