//! Per-axis motion state.

/// Motion state of one axis as last commanded by this host.
///
/// The board runs moves on its own, so the state is tracked at runtime rather
/// than in the type system: several axes move at once and a handle must stay
/// usable while they do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisState {
    /// Not moving.
    #[default]
    Idle,
    /// A move was acknowledged and has not been seen to finish.
    Moving,
    /// A home search is in progress.
    Homing,
    /// The last home search ended without finding home.
    Fault,
}

impl AxisState {
    /// Get the state name as a static string.
    pub fn name(self) -> &'static str {
        match self {
            AxisState::Idle => "Idle",
            AxisState::Moving => "Moving",
            AxisState::Homing => "Homing",
            AxisState::Fault => "Fault",
        }
    }

    /// Whether the axis was last seen in motion.
    #[inline]
    pub fn is_busy(self) -> bool {
        matches!(self, AxisState::Moving | AxisState::Homing)
    }
}

impl core::fmt::Display for AxisState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
