//! Fatal engine faults.
//!
//! Any of these raises the owning processor's die-request. Page faults and
//! bus errors are ordinary machine state and never appear here.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("illegal ALU operation {0:#04X}")]
    IllegalAluOp(u8),

    #[error("illegal output selector {0}")]
    IllegalOutputSelector(u8),

    #[error("illegal M source {0:#04o}")]
    IllegalMSource(u8),

    #[error("illegal functional destination {0:#04o}")]
    IllegalDestination(u8),

    #[error("illegal jump condition {0}")]
    IllegalJumpCondition(u8),

    #[error("illegal R-P-N code {0:#05b}")]
    IllegalRpn(u8),

    #[error("after-next slot already holds {pending:#06X}, cannot latch {requested:#06X}")]
    AfterNextCollision { pending: u16, requested: u16 },
}
