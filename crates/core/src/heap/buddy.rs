//! Power-of-two buddy allocator.
//!
//! The pool is truncated to the largest power of two it contains and carved
//! into blocks of size `2^order`. Each order keeps a LIFO free list of
//! block offsets; an allocation map records the order and requested size
//! of every live block so `free` can recover the order (and the padding
//! stays accountable) without in-band headers. A block at offset `x`
//! and order `k` has its buddy at `x ^ 2^k`, and both halves merge back
//! into an order `k+1` block whenever the buddy is free and whole at that
//! level (present in `free_lists[k]`, not split further down).

use std::collections::HashMap;

use crate::common::error::SimError;
use crate::heap::HEADER_SIZE;

/// Smallest block the buddy system will hand out (header included).
pub const MIN_BLOCK_SIZE: usize = 32;

/// Number of supported orders (block sizes up to `2^31`).
const MAX_LEVELS: usize = 32;

/// Smallest order `k` with `2^k >= size`.
#[inline]
fn order_of(size: usize) -> u32 {
    size.max(1).next_power_of_two().trailing_zeros()
}

/// Buddy system state over the pool.
pub struct BuddyHeap {
    /// Usable pool size, truncated to `2^max_order`.
    total_size: usize,
    min_order: u32,
    max_order: u32,
    /// Free block offsets per order; pushed and popped at the tail.
    free_lists: Vec<Vec<usize>>,
    /// Block offset -> (order, requested payload bytes), for every live
    /// allocation.
    allocated: HashMap<usize, (u32, usize)>,
}

impl BuddyHeap {
    /// Lays a single free block of the largest fitting order over the pool.
    ///
    /// The caller guarantees `pool_size >= MIN_BLOCK_SIZE`.
    pub fn new(pool_size: usize) -> Self {
        debug_assert!(pool_size >= MIN_BLOCK_SIZE);
        let max_order = pool_size.ilog2();
        let total_size = 1usize << max_order;
        let min_order = order_of(MIN_BLOCK_SIZE);

        let mut free_lists = vec![Vec::new(); MAX_LEVELS];
        free_lists[max_order as usize].push(0);

        println!(
            "Buddy Allocator Initialized. Total Size: {} (Order {})",
            total_size, max_order
        );

        Self {
            total_size,
            min_order,
            max_order,
            free_lists,
            allocated: HashMap::new(),
        }
    }

    /// Allocates `request` payload bytes.
    ///
    /// The block order covers the payload plus the header, clamped to
    /// [`MIN_BLOCK_SIZE`].
    ///
    /// # Returns
    ///
    /// `(order, payload_offset)`, or [`SimError::OutOfMemory`] when no
    /// order up to the pool root can yield a block.
    pub fn malloc(&mut self, request: usize) -> Result<(u32, usize), SimError> {
        let order = order_of(request + HEADER_SIZE).max(self.min_order);
        let offset = self
            .get_block(order)
            .ok_or(SimError::OutOfMemory(request))?;
        self.allocated.insert(offset, (order, request));
        Ok((order, offset + HEADER_SIZE))
    }

    /// Pops a free block of `order`, splitting a larger one if needed.
    ///
    /// Splitting takes an order `k+1` block, keeps its left half, and
    /// pushes the right half (the buddy at `offset + 2^k`) onto the order
    /// `k` free list.
    fn get_block(&mut self, order: u32) -> Option<usize> {
        if order > self.max_order {
            return None;
        }
        if let Some(offset) = self.free_lists[order as usize].pop() {
            return Some(offset);
        }

        let larger = self.get_block(order + 1)?;
        let buddy = larger + (1usize << order);
        self.free_lists[order as usize].push(buddy);
        Some(larger)
    }

    /// Frees the block whose payload starts at `payload_offset`, merging
    /// with free buddies as far up as possible.
    ///
    /// # Returns
    ///
    /// The order of the block finally inserted into the free lists, or
    /// [`SimError::InvalidFree`] when the offset is not a live buddy
    /// allocation.
    pub fn free(&mut self, payload_offset: usize) -> Result<u32, SimError> {
        let block = payload_offset
            .checked_sub(HEADER_SIZE)
            .ok_or(SimError::InvalidFree(payload_offset))?;
        let (mut order, _) = self
            .allocated
            .remove(&block)
            .ok_or(SimError::InvalidFree(payload_offset))?;

        let mut offset = block;
        while order < self.max_order {
            let buddy = offset ^ (1usize << order);
            let list = &mut self.free_lists[order as usize];
            let Some(pos) = list.iter().position(|&b| b == buddy) else {
                break;
            };
            list.remove(pos);
            println!("Merging with buddy at {} (Order {})", buddy, order);
            offset = offset.min(buddy);
            order += 1;
        }

        self.free_lists[order as usize].push(offset);
        Ok(order)
    }

    /// Usable pool size (power of two).
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Smallest order handed out.
    pub fn min_order(&self) -> u32 {
        self.min_order
    }

    /// Order of the whole pool.
    pub fn max_order(&self) -> u32 {
        self.max_order
    }

    /// Number of free blocks at `order`.
    pub fn free_count(&self, order: u32) -> usize {
        self.free_lists
            .get(order as usize)
            .map_or(0, |list| list.len())
    }

    /// Number of live allocations.
    pub fn allocated_count(&self) -> usize {
        self.allocated.len()
    }

    /// Sum of free bytes across all orders (headers included).
    pub fn free_bytes(&self) -> usize {
        self.free_lists
            .iter()
            .enumerate()
            .map(|(order, list)| list.len() << order)
            .sum()
    }

    /// Bytes consumed by live blocks (headers included).
    pub fn used_bytes(&self) -> usize {
        self.total_size - self.free_bytes()
    }

    /// Padding wasted inside live blocks: the power-of-two rounding left
    /// over once the header and the requested payload are taken out.
    pub fn internal_fragmentation(&self) -> usize {
        self.allocated
            .values()
            .map(|&(order, request)| (1usize << order) - HEADER_SIZE - request)
            .sum()
    }

    /// Largest free block size in bytes.
    pub fn largest_free_block(&self) -> usize {
        (self.min_order..=self.max_order)
            .rev()
            .find(|&order| !self.free_lists[order as usize].is_empty())
            .map_or(0, |order| 1usize << order)
    }

    /// Prints per-order free block counts.
    pub fn dump(&self) {
        println!("--- Buddy Free Lists ---");
        for order in self.min_order..=self.max_order {
            let count = self.free_lists[order as usize].len();
            if count > 0 {
                println!("Order {} ({} bytes): {} blocks", order, 1usize << order, count);
            }
        }
        println!("------------------------");
    }
}
