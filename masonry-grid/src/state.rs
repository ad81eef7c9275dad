/// Guards layout mutations.
///
/// Only `Normal` accepts scroll, resize and drag reconciliation. Every multi-step layout
/// mutation runs inside `Building`, and every path out of it (success or error) returns to a
/// settled state before notifications are delivered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GridState {
    #[default]
    Normal,
    Building,
    Disabled,
    /// The container currently has no width.
    Hidden,
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct StateMachine {
    state: GridState,
    // Settled state requested while a build was running.
    after_build: Option<GridState>,
}

impl StateMachine {
    pub(crate) fn state(&self) -> GridState {
        self.state
    }

    pub(crate) fn is_building(&self) -> bool {
        self.state == GridState::Building
    }

    pub(crate) fn is_normal(&self) -> bool {
        self.state == GridState::Normal
    }

    /// Enters `Building` from `Normal`. Returns `false` in any other state.
    pub(crate) fn begin(&mut self) -> bool {
        if self.state != GridState::Normal {
            return false;
        }
        self.state = GridState::Building;
        true
    }

    /// Leaves `Building`, landing on `Normal` unless another settled state was requested
    /// meanwhile.
    pub(crate) fn finish(&mut self) {
        if self.state != GridState::Building {
            return;
        }
        self.state = self.after_build.take().unwrap_or(GridState::Normal);
    }

    /// Moves to a settled state, or schedules it for the end of the running build.
    pub(crate) fn settle_to(&mut self, next: GridState) {
        debug_assert!(next != GridState::Building);
        if self.state == GridState::Building {
            self.after_build = Some(next);
        } else {
            self.state = next;
        }
    }
}
