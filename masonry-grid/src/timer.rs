/// A single pending deadline.
///
/// Re-arming replaces the previous deadline instead of stacking a second one, which gives
/// debounce semantics: the timer fires once, after the last trigger plus the delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Timer {
    deadline: Option<u64>,
}

impl Timer {
    pub(crate) fn arm(&mut self, now_ms: u64, delay_ms: u64) {
        self.deadline = Some(now_ms.saturating_add(delay_ms));
    }

    pub(crate) fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Consumes the deadline if it has passed.
    pub(crate) fn fire(&mut self, now_ms: u64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
