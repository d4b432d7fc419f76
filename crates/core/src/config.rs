//! Configuration system for the memory simulator.
//!
//! This module defines all configuration structures and enums used to
//! parameterize the simulator. It provides:
//! 1. **Defaults:** baseline geometry (cache levels, virtual address space).
//! 2. **Structures:** hierarchical config for allocator, cache, and VM.
//! 3. **Enums:** allocation strategy, cache policy, and page replacement
//!    policy variants.
//!
//! Configuration is supplied as JSON (`Config::from_json`) or via
//! `Config::default()` for the interactive loop.

use serde::Deserialize;
use std::fmt;

/// Default configuration constants for the simulator.
///
/// These values define the baseline setup applied at `init` when not
/// explicitly overridden by a configuration file.
mod defaults {
    /// L1 cache: 64 bytes total, 8-byte blocks, direct-mapped.
    pub const L1_SIZE: usize = 64;
    /// L1 block size in bytes.
    pub const L1_BLOCK: usize = 8;
    /// L1 associativity (1 way = direct-mapped).
    pub const L1_WAYS: usize = 1;

    /// L2 cache: 256 bytes total, 8-byte blocks, 2-way set-associative.
    pub const L2_SIZE: usize = 256;
    /// L2 block size in bytes.
    pub const L2_BLOCK: usize = 8;
    /// L2 associativity.
    pub const L2_WAYS: usize = 2;

    /// L3 cache: 1024 bytes total, 64-byte blocks, 8-way set-associative.
    pub const L3_SIZE: usize = 1024;
    /// L3 block size in bytes.
    pub const L3_BLOCK: usize = 64;
    /// L3 associativity.
    pub const L3_WAYS: usize = 8;

    /// Virtual address space size in bytes when VM is enabled.
    pub const VIRTUAL_SIZE: usize = 65536;
}

/// Placement strategies for the heap allocator.
///
/// The first three share the linear free-list heap and differ only in which
/// candidate block they pick; `Buddy` switches to the power-of-two buddy
/// system over the same pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocStrategy {
    /// First free block that fits, in address order.
    #[default]
    #[serde(alias = "FirstFit")]
    FirstFit,
    /// Fitting free block with the least leftover space.
    #[serde(alias = "BestFit")]
    BestFit,
    /// Largest fitting free block.
    #[serde(alias = "WorstFit")]
    WorstFit,
    /// Power-of-two buddy system with XOR-buddy coalescing.
    #[serde(alias = "Buddy")]
    Buddy,
}

impl fmt::Display for AllocStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocStrategy::FirstFit => write!(f, "First Fit"),
            AllocStrategy::BestFit => write!(f, "Best Fit"),
            AllocStrategy::WorstFit => write!(f, "Worst Fit"),
            AllocStrategy::Buddy => write!(f, "Buddy"),
        }
    }
}

/// Cache replacement policy algorithms.
///
/// Selects which line to evict when a set is full. A policy switch applies
/// to all three levels and takes effect from the next access; existing line
/// metadata is retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// Round-robin eviction via a per-set cursor.
    #[default]
    #[serde(alias = "FIFO")]
    Fifo,
    /// Evict the line with the oldest access time.
    #[serde(alias = "LRU")]
    Lru,
    /// Evict the line with the fewest accesses; ties fall back to LRU.
    #[serde(alias = "LFU")]
    Lfu,
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CachePolicy::Fifo => write!(f, "FIFO"),
            CachePolicy::Lru => write!(f, "LRU"),
            CachePolicy::Lfu => write!(f, "LFU"),
        }
    }
}

/// Page replacement policy algorithms for the VM translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VmPolicy {
    /// Evict the page that has been resident longest.
    #[default]
    #[serde(alias = "FIFO")]
    Fifo,
    /// Evict the resident page with the oldest access time.
    #[serde(alias = "LRU")]
    Lru,
    /// Second-chance clock sweep over the frame table.
    #[serde(alias = "CLOCK")]
    Clock,
}

impl fmt::Display for VmPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmPolicy::Fifo => write!(f, "FIFO"),
            VmPolicy::Lru => write!(f, "LRU"),
            VmPolicy::Clock => write!(f, "CLOCK"),
        }
    }
}

/// Geometry of a single cache level.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheLevelConfig {
    /// Total level size in bytes.
    pub size_bytes: usize,
    /// Block (line) size in bytes.
    pub block_bytes: usize,
    /// Associativity (number of ways).
    pub ways: usize,
}

/// Cache hierarchy configuration (three levels plus the shared policy).
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// L1 geometry.
    #[serde(default = "CacheConfig::default_l1")]
    pub l1: CacheLevelConfig,

    /// L2 geometry.
    #[serde(default = "CacheConfig::default_l2")]
    pub l2: CacheLevelConfig,

    /// L3 geometry.
    #[serde(default = "CacheConfig::default_l3")]
    pub l3: CacheLevelConfig,

    /// Replacement policy applied to every level.
    #[serde(default)]
    pub policy: CachePolicy,
}

impl CacheConfig {
    /// Returns the default L1 geometry (64 B, 8 B blocks, direct-mapped).
    fn default_l1() -> CacheLevelConfig {
        CacheLevelConfig {
            size_bytes: defaults::L1_SIZE,
            block_bytes: defaults::L1_BLOCK,
            ways: defaults::L1_WAYS,
        }
    }

    /// Returns the default L2 geometry (256 B, 8 B blocks, 2-way).
    fn default_l2() -> CacheLevelConfig {
        CacheLevelConfig {
            size_bytes: defaults::L2_SIZE,
            block_bytes: defaults::L2_BLOCK,
            ways: defaults::L2_WAYS,
        }
    }

    /// Returns the default L3 geometry (1024 B, 64 B blocks, 8-way).
    fn default_l3() -> CacheLevelConfig {
        CacheLevelConfig {
            size_bytes: defaults::L3_SIZE,
            block_bytes: defaults::L3_BLOCK,
            ways: defaults::L3_WAYS,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            l1: Self::default_l1(),
            l2: Self::default_l2(),
            l3: Self::default_l3(),
            policy: CachePolicy::default(),
        }
    }
}

/// Virtual memory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VmConfig {
    /// Virtual address space size in bytes.
    #[serde(default = "VmConfig::default_virtual_size")]
    pub virtual_size: usize,

    /// Page replacement policy.
    #[serde(default)]
    pub policy: VmPolicy,

    /// Simulated disk latency per page fault, in milliseconds.
    #[serde(default)]
    pub disk_latency_ms: u64,
}

impl VmConfig {
    /// Returns the default virtual address space size.
    fn default_virtual_size() -> usize {
        defaults::VIRTUAL_SIZE
    }
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            virtual_size: defaults::VIRTUAL_SIZE,
            policy: VmPolicy::default(),
            disk_latency_ms: 0,
        }
    }
}

/// Allocator configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AllocatorConfig {
    /// Placement strategy active at `init`.
    #[serde(default)]
    pub strategy: AllocStrategy,
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use memsim_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.cache.l1.size_bytes, 64);
/// assert_eq!(config.vm.virtual_size, 65536);
/// ```
///
/// Deserializing a partial override from JSON:
///
/// ```
/// use memsim_core::config::{AllocStrategy, CachePolicy, Config};
///
/// let json = r#"{
///     "allocator": { "strategy": "best_fit" },
///     "cache": { "policy": "lru" }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.allocator.strategy, AllocStrategy::BestFit);
/// assert_eq!(config.cache.policy, CachePolicy::Lru);
/// assert_eq!(config.cache.l3.ways, 8);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Heap allocator settings.
    #[serde(default)]
    pub allocator: AllocatorConfig,

    /// Cache hierarchy settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Virtual memory settings.
    #[serde(default)]
    pub vm: VmConfig,
}

impl Config {
    /// Parses a configuration from a JSON document.
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
