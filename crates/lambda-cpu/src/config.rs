//! Processor board configuration.

/// Static configuration of one processor board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LambdaConfig {
    /// NuBus slot. Also the default bus master ID.
    pub slot: u8,
    /// Board revision reported in the Configuration register.
    pub board_revision: u8,
    /// Leave reset running instead of waiting for the debugger's run bit.
    pub start_running: bool,
}

impl Default for LambdaConfig {
    fn default() -> Self {
        Self {
            slot: 0,
            board_revision: 3,
            start_running: false,
        }
    }
}
