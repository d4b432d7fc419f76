//! Simulator error definitions.
//!
//! Every recoverable failure in the simulator is a [`SimError`] variant.
//! The `Display` form is the diagnostic line shown to the user; no error is
//! fatal to the command loop.

use std::fmt;

/// Failure classes surfaced by the simulator core.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimError {
    /// A core operation was issued before `init`.
    Uninitialized,

    /// The requested pool cannot hold a single block header.
    ///
    /// The associated value is the requested pool size in bytes.
    PoolTooSmall(usize),

    /// No free block (or buddy order) can satisfy the request.
    ///
    /// The associated value is the requested payload size in bytes.
    OutOfMemory(usize),

    /// The freed value is not the payload offset of any block.
    ///
    /// The associated value is the offending offset.
    InvalidFree(usize),

    /// The freed block is already free.
    ///
    /// The associated value is the payload offset.
    DoubleFree(usize),

    /// Neither an allocated id nor a payload offset matched the value.
    ///
    /// The associated value is the id-or-offset the user supplied.
    NotFound(usize),

    /// A virtual address falls beyond the virtual address space.
    ///
    /// The associated value is the faulting virtual address.
    SegFault(usize),

    /// A physical address falls beyond the pool.
    ///
    /// The associated value is the faulting physical address.
    AccessViolation(usize),

    /// A page fault could not be resolved (no free frame and the eviction
    /// policy produced no victim).
    EvictionFailed,
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Uninitialized => {
                write!(f, "Error: Memory not initialized. Run 'init <size>' first.")
            }
            SimError::PoolTooSmall(size) => {
                write!(f, "Error: Pool of {} bytes cannot hold a block header.", size)
            }
            SimError::OutOfMemory(size) => {
                write!(f, "Error: No free block can satisfy {} bytes.", size)
            }
            SimError::InvalidFree(offset) => write!(
                f,
                "Error: Invalid address {}. Pointer is not the start of an allocated block.",
                offset
            ),
            SimError::DoubleFree(offset) => {
                write!(f, "Error: Block at address {} is already free.", offset)
            }
            SimError::NotFound(value) => {
                write!(f, "Error: No allocated block found with ID or Address {}", value)
            }
            SimError::SegFault(addr) => {
                write!(f, "SegFault: Virtual Address {} out of bounds.", addr)
            }
            SimError::AccessViolation(addr) => {
                write!(f, "Error: Access violation at physical address {}", addr)
            }
            SimError::EvictionFailed => write!(
                f,
                "Critical Error: Could not resolve page fault (Memory full and eviction failed?)"
            ),
        }
    }
}

impl std::error::Error for SimError {}
