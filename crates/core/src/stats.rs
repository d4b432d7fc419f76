//! Derived allocator statistics and reporting.
//!
//! [`HeapStats`] is a snapshot of the heap assembled by the facade. The
//! derived metrics follow the usual definitions:
//! 1. **Utilization:** used bytes over pool size.
//! 2. **Internal fragmentation:** padding wasted inside allocated blocks.
//! 3. **External fragmentation:** `1 - largest_free / total_free`, high
//!    when free memory is plentiful but scattered.
//! 4. **Success rate:** successful allocations over requests.

/// Snapshot of heap usage plus allocation counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapStats {
    /// Pool size in bytes.
    pub total_size: usize,
    /// Bytes unavailable to further allocations.
    pub used_bytes: usize,
    /// Bytes available to further allocations.
    pub free_bytes: usize,
    /// Padding bytes wasted inside allocated blocks.
    pub internal_fragmentation: usize,
    /// Largest single free block.
    pub largest_free_block: usize,
    /// Allocation requests seen (failed ones included).
    pub requests: u64,
    /// Allocation requests that succeeded.
    pub successes: u64,
}

impl HeapStats {
    /// Used fraction of the pool, in percent.
    pub fn utilization(&self) -> f64 {
        if self.total_size == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / self.total_size as f64 * 100.0
    }

    /// External fragmentation in percent.
    ///
    /// 0 when all free memory is one block (or none is free at all).
    pub fn external_fragmentation(&self) -> f64 {
        if self.free_bytes == 0 {
            return 0.0;
        }
        (1.0 - self.largest_free_block as f64 / self.free_bytes as f64) * 100.0
    }

    /// Fraction of requests that succeeded, in percent.
    pub fn success_rate(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        self.successes as f64 / self.requests as f64 * 100.0
    }

    /// Prints the allocator statistics block.
    pub fn print(&self) {
        println!("\n=== Memory System Statistics ===");
        println!(
            "Memory Utilization: {:.2}% ({}/{} bytes)",
            self.utilization(),
            self.used_bytes,
            self.total_size
        );
        println!("Internal Fragmentation: {} bytes", self.internal_fragmentation);
        println!("External Fragmentation: {:.2}%", self.external_fragmentation());
        println!("Allocation Requests: {}", self.requests);
        println!("Successful Allocs:   {}", self.successes);
        println!("Success Rate:        {:.2}%", self.success_rate());
        println!("==============================\n");
    }
}
