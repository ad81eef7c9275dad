use crate::timer::Timer;
use crate::{ItemRect, Point};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DragPhase {
    Idle,
    /// Pointer is down; waiting for the hold delay.
    Pressed { slot: usize, origin: Point },
    /// Hold delay elapsed; the view follows the pointer from here on.
    Armed {
        slot: usize,
        origin: Point,
        base: ItemRect,
        from: usize,
    },
    Dragging {
        slot: usize,
        origin: Point,
        base: ItemRect,
        from: usize,
    },
}

/// One press-and-hold drag session: `Idle -> Pressed -> Armed -> Dragging -> Idle`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DragSession {
    phase: DragPhase,
    arm: Timer,
}

impl Default for DragSession {
    fn default() -> Self {
        Self {
            phase: DragPhase::Idle,
            arm: Timer::default(),
        }
    }
}

impl DragSession {
    pub(crate) fn is_idle(&self) -> bool {
        self.phase == DragPhase::Idle
    }

    /// Slot that must not be recycled while the session lasts.
    pub(crate) fn pinned_slot(&self) -> Option<usize> {
        match self.phase {
            DragPhase::Idle | DragPhase::Pressed { .. } => None,
            DragPhase::Armed { slot, .. } | DragPhase::Dragging { slot, .. } => Some(slot),
        }
    }

    pub(crate) fn press(&mut self, slot: usize, origin: Point, now_ms: u64, delay_ms: u64) {
        self.phase = DragPhase::Pressed { slot, origin };
        self.arm.arm(now_ms, delay_ms);
    }

    /// Arms the session once the hold delay has elapsed. Returns the pressed slot and origin.
    pub(crate) fn poll_arm(&mut self, now_ms: u64) -> Option<(usize, Point)> {
        let DragPhase::Pressed { slot, origin } = self.phase else {
            return None;
        };
        self.arm.fire(now_ms).then_some((slot, origin))
    }

    pub(crate) fn arm(&mut self, slot: usize, origin: Point, base: ItemRect, from: usize) {
        self.phase = DragPhase::Armed {
            slot,
            origin,
            base,
            from,
        };
    }

    /// Tracks a pointer move. Returns the dragged view's new rect once armed; cancels the
    /// session when the pointer travels beyond `jitter` before the hold delay elapsed.
    pub(crate) fn track(&mut self, pointer: Point, jitter: u32) -> Option<(usize, ItemRect)> {
        match self.phase {
            DragPhase::Idle => None,
            DragPhase::Pressed { origin, .. } => {
                if exceeds_jitter(origin, pointer, jitter) {
                    self.cancel();
                }
                None
            }
            DragPhase::Armed {
                slot,
                origin,
                base,
                from,
            }
            | DragPhase::Dragging {
                slot,
                origin,
                base,
                from,
            } => {
                self.phase = DragPhase::Dragging {
                    slot,
                    origin,
                    base,
                    from,
                };
                let dx = pointer.x.saturating_sub(origin.x);
                let dy = pointer.y.saturating_sub(origin.y);
                Some((slot, base.translate(dx, dy)))
            }
        }
    }

    pub(crate) fn cancel(&mut self) {
        self.phase = DragPhase::Idle;
        self.arm.cancel();
    }

    /// Ends the session, returning `(slot, from)` if a drag was armed.
    pub(crate) fn release(&mut self) -> Option<(usize, usize)> {
        let out = match self.phase {
            DragPhase::Armed { slot, from, .. } | DragPhase::Dragging { slot, from, .. } => {
                Some((slot, from))
            }
            _ => None,
        };
        self.cancel();
        out
    }
}

fn exceeds_jitter(origin: Point, pointer: Point, jitter: u32) -> bool {
    let dx = pointer.x as i128 - origin.x as i128;
    let dy = pointer.y as i128 - origin.y as i128;
    let limit = jitter as i128;
    dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy)) > limit * limit
}

/// A view the dragged view may be swapped with.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DropCandidate {
    pub(crate) index: usize,
    pub(crate) rect: ItemRect,
    pub(crate) in_transition: bool,
}

/// Picks the swap target for a dragged rect.
///
/// A view qualifies when the overlap covers more than half of the smaller of the two rects;
/// among qualifying views the lowest index wins. No target is returned when that view is the
/// dragged one or is still animating.
pub(crate) fn swap_target(
    dragged_index: usize,
    dragged: ItemRect,
    candidates: impl IntoIterator<Item = DropCandidate>,
) -> Option<usize> {
    let mut best: Option<DropCandidate> = None;
    for candidate in candidates {
        let smaller = dragged.area().min(candidate.rect.area());
        if smaller == 0 || dragged.overlap(&candidate.rect).saturating_mul(2) <= smaller {
            continue;
        }
        if best.is_none_or(|b| candidate.index < b.index) {
            best = Some(candidate);
        }
    }
    let best = best?;
    (best.index != dragged_index && !best.in_transition).then_some(best.index)
}
