//! Memory-system simulator library.
//!
//! This crate models, inside one contiguous byte pool standing in for
//! physical RAM, the three layered mechanisms an operating system uses to
//! manage memory:
//! 1. **Heap:** a linear free-list allocator (first/best/worst fit with
//!    splitting and boundary coalescing) and a power-of-two buddy allocator.
//! 2. **Cache:** three independent set-associative cache levels with
//!    FIFO/LRU/LFU replacement, probed L1 -> L2 -> L3 per access.
//! 3. **Virtual memory:** a demand-paged translator with FIFO/LRU/CLOCK
//!    page replacement and a simulated disk-fault latency.
//!
//! The [`MemoryManager`] facade owns all three and exposes the flat
//! operation surface the command loop drives.

/// Shared types (errors).
pub mod common;
/// Simulator configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// Heap allocators (linear free-list and buddy system).
pub mod heap;
/// Set-associative cache hierarchy.
pub mod cache;
/// Demand-paged virtual memory translator.
pub mod vm;
/// Facade tying pool, heap, caches, and VM together.
pub mod manager;
/// Derived allocator statistics and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Simulator facade; constructed per pool by the command loop.
pub use crate::manager::MemoryManager;
/// Crate-wide error type; `Display` gives the diagnostic line.
pub use crate::common::error::SimError;
