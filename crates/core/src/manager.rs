//! Simulator facade.
//!
//! [`MemoryManager`] owns the byte pool standing in for physical RAM, the
//! active heap view over it, the three cache levels, and the optional VM
//! translator, and exposes the flat operation surface the command loop
//! drives. An `access` routes through the translator first (when enabled)
//! and probes the caches with the resulting physical offset; heap
//! operations go straight to the active allocator.
//!
//! The cache and VM components never read or write the pool; they only
//! maintain their own metadata, so the allocator is the pool's sole owner.

use crate::cache::CacheHierarchy;
use crate::common::error::SimError;
use crate::config::{AllocStrategy, CachePolicy, Config, VmConfig, VmPolicy};
use crate::heap::{BuddyHeap, HeapState, LinearHeap, HEADER_SIZE};
use crate::stats::HeapStats;
use crate::vm::VmTranslator;

/// The simulator: pool, heap, cache hierarchy, and optional VM.
pub struct MemoryManager {
    /// The simulated physical RAM. Allocation never zeroes it; contents
    /// are only meaningful to the user of the simulation.
    memory: Vec<u8>,
    heap: HeapState,
    strategy: AllocStrategy,
    cache: CacheHierarchy,
    vm: Option<VmTranslator>,
    /// VM settings applied when `enable_vm` runs (policy and latency may
    /// be adjusted before that).
    vm_config: VmConfig,
    alloc_requests: u64,
    successful_allocs: u64,
}

impl MemoryManager {
    /// Initializes a pool of `size` bytes with the configured strategy,
    /// cache geometry, and VM defaults.
    ///
    /// # Returns
    ///
    /// The ready simulator, or [`SimError::PoolTooSmall`] when the pool
    /// cannot hold a single block header.
    pub fn new(size: usize, config: &Config) -> Result<Self, SimError> {
        if size < HEADER_SIZE {
            return Err(SimError::PoolTooSmall(size));
        }

        let strategy = config.allocator.strategy;
        let heap = match strategy {
            AllocStrategy::Buddy => HeapState::Buddy(BuddyHeap::new(size)),
            _ => {
                let heap = LinearHeap::new(size);
                println!("Memory initialized with {} bytes.", size);
                println!("Initial Free Block Size: {} bytes.", size - HEADER_SIZE);
                HeapState::Linear(heap)
            }
        };

        Ok(Self {
            memory: vec![0; size],
            heap,
            strategy,
            cache: CacheHierarchy::new(&config.cache),
            vm: None,
            vm_config: config.vm.clone(),
            alloc_requests: 0,
            successful_allocs: 0,
        })
    }

    /// Pool size in bytes.
    pub fn total_size(&self) -> usize {
        self.memory.len()
    }

    /// Allocates `size` bytes with the active strategy.
    ///
    /// # Returns
    ///
    /// The payload offset of the new block, or an error. Failed requests
    /// still count toward the request statistics.
    pub fn malloc(&mut self, size: usize) -> Result<usize, SimError> {
        self.alloc_requests += 1;

        let offset = match &mut self.heap {
            HeapState::Linear(heap) => {
                let (id, offset) = heap.malloc(size, self.strategy)?;
                println!(
                    "Allocated block id {} at address {} (Strategy: {})",
                    id, offset, self.strategy
                );
                offset
            }
            HeapState::Buddy(heap) => {
                let (order, offset) = heap.malloc(size)?;
                println!("Buddy Alloc: Order {} ({} bytes)", order, 1usize << order);
                offset
            }
        };

        self.successful_allocs += 1;
        Ok(offset)
    }

    /// Frees by allocated id.
    pub fn free_by_id(&mut self, id: u32) -> Result<(), SimError> {
        match &mut self.heap {
            HeapState::Linear(heap) => {
                heap.free_by_id(id)?;
                println!("Freeing Block ID {}...", id);
                Ok(())
            }
            // Buddy blocks carry no ids; the caller must free by offset.
            HeapState::Buddy(_) => Err(SimError::NotFound(id as usize)),
        }
    }

    /// Frees by id first, then by payload offset.
    ///
    /// Under the buddy system ids do not exist and the value is taken as
    /// a payload offset directly.
    pub fn free_smart(&mut self, value: usize) -> Result<(), SimError> {
        match &mut self.heap {
            HeapState::Linear(heap) => {
                let (id, offset) = heap.free_smart(value)?;
                println!("Freeing Block ID {} (Address {})...", id, offset);
                Ok(())
            }
            HeapState::Buddy(heap) => heap
                .free(value)
                .map(|_| ())
                .map_err(|_| SimError::NotFound(value)),
        }
    }

    /// Switches the allocation strategy.
    ///
    /// Moving between the linear strategies only changes placement choice.
    /// Crossing into or out of the buddy system re-initializes that view
    /// over the pool and forgets the other view's allocations (documented
    /// hazard of switching at runtime).
    pub fn set_strategy(&mut self, strategy: AllocStrategy) {
        let was_buddy = matches!(self.heap, HeapState::Buddy(_));

        if strategy == AllocStrategy::Buddy && !was_buddy {
            println!("Warning: Switching to Buddy System at runtime. Initializing Buddy Allocator...");
            self.heap = HeapState::Buddy(BuddyHeap::new(self.memory.len()));
        } else if strategy != AllocStrategy::Buddy && was_buddy {
            println!("Warning: Leaving Buddy System at runtime. Re-initializing heap...");
            self.heap = HeapState::Linear(LinearHeap::new(self.memory.len()));
        }

        self.strategy = strategy;
    }

    /// Applies a cache replacement policy to all three levels.
    pub fn set_cache_policy(&mut self, policy: CachePolicy) {
        self.cache.set_policy(policy);
    }

    /// Sets the VM page replacement policy (effective once VM is enabled).
    pub fn set_vm_policy(&mut self, policy: VmPolicy) {
        self.vm_config.policy = policy;
        if let Some(vm) = &mut self.vm {
            vm.set_policy(policy);
        }
    }

    /// Sets the simulated disk latency per page fault.
    pub fn set_vm_latency(&mut self, ms: u64) {
        self.vm_config.disk_latency_ms = ms;
        if let Some(vm) = &mut self.vm {
            vm.set_disk_latency(ms);
        }
    }

    /// Enables demand paging over the configured virtual address space.
    ///
    /// The physical side of the translation is the pool itself.
    pub fn enable_vm(&mut self, page_size: usize) {
        self.vm = Some(VmTranslator::new(
            page_size,
            self.vm_config.virtual_size,
            self.memory.len(),
            &self.vm_config,
        ));
        println!("Virtual Memory Enabled.");
    }

    /// Runs one access through the VM (when enabled) and the caches.
    ///
    /// `rw` is `'R'` or `'W'` (case-insensitive for `'W'`); anything else
    /// is a read. A SegFault or access violation leaves every cache level
    /// untouched.
    pub fn access(&mut self, addr: usize, rw: char) -> Result<(), SimError> {
        let is_write = matches!(rw, 'W' | 'w');

        let final_addr = match &mut self.vm {
            Some(vm) => {
                let translation = vm.translate(addr, is_write)?;
                println!(
                    "  Virtual Address {} -> Physical Address {}",
                    addr, translation.physical
                );
                translation.physical
            }
            None => addr,
        };

        if final_addr >= self.memory.len() {
            return Err(SimError::AccessViolation(final_addr));
        }

        self.cache.access(final_addr, rw);
        Ok(())
    }

    /// Prints the memory map of the active heap view.
    pub fn dump_memory(&self) {
        match &self.heap {
            HeapState::Linear(heap) => heap.dump(),
            HeapState::Buddy(heap) => heap.dump(),
        }
    }

    /// Snapshot of heap usage and allocation counters.
    pub fn heap_stats(&self) -> HeapStats {
        let (used, free, frag, largest) = match &self.heap {
            HeapState::Linear(heap) => (
                heap.used_bytes(),
                heap.free_bytes(),
                heap.internal_fragmentation(),
                heap.largest_free_block(),
            ),
            HeapState::Buddy(heap) => (
                heap.used_bytes(),
                heap.free_bytes(),
                heap.internal_fragmentation(),
                heap.largest_free_block(),
            ),
        };

        HeapStats {
            total_size: self.memory.len(),
            used_bytes: used,
            free_bytes: free,
            internal_fragmentation: frag,
            largest_free_block: largest,
            requests: self.alloc_requests,
            successes: self.successful_allocs,
        }
    }

    /// Prints allocator, cache, and (when enabled) VM statistics.
    pub fn print_stats(&self) {
        self.heap_stats().print();
        self.cache.print_stats();
        if let Some(vm) = &self.vm {
            vm.print_stats();
        }
    }

    /// The active heap view. Exposed for tests.
    pub fn heap(&self) -> &HeapState {
        &self.heap
    }

    /// The cache hierarchy. Exposed for tests.
    pub fn cache(&self) -> &CacheHierarchy {
        &self.cache
    }

    /// The VM translator, when enabled. Exposed for tests.
    pub fn vm(&self) -> Option<&VmTranslator> {
        self.vm.as_ref()
    }

    /// The active allocation strategy.
    pub fn strategy(&self) -> AllocStrategy {
        self.strategy
    }
}
