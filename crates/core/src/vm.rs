//! Demand-paged virtual memory translator.
//!
//! Virtual addresses are split into a page number and an offset over a
//! fixed page size. A page table maps pages to physical frames; the frame
//! table is the reverse map. A translation of an unmapped page is a fault:
//! the translator sleeps for the simulated disk latency, claims a free
//! frame (or evicts a resident page per FIFO/LRU/CLOCK), and installs the
//! mapping. The access counter advances once per in-bounds translation,
//! giving LRU a well-defined total order.

use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use crate::common::error::SimError;
use crate::config::{VmConfig, VmPolicy};

/// One page's mapping state.
///
/// A page is resident exactly when `frame` is `Some`; eviction clears it
/// back to `None`.
#[derive(Clone, Default)]
pub struct PageTableEntry {
    /// Physical frame holding the page, when resident.
    pub frame: Option<usize>,
    /// Set on any write access while resident.
    pub dirty: bool,
    /// One-shot recency marker consulted by the CLOCK sweep.
    pub referenced: bool,
    /// Access-counter stamp of the last touch, for LRU.
    pub last_access: u64,
}

/// Outcome of a successful translation.
pub struct Translation {
    /// Physical pool offset.
    pub physical: usize,
    /// Whether this translation required a page load.
    pub fault: bool,
}

/// Page table, frame table, and replacement state.
pub struct VmTranslator {
    page_size: usize,
    page_table: Vec<PageTableEntry>,
    /// Frame -> resident page number.
    frame_table: Vec<Option<usize>>,
    policy: VmPolicy,
    /// Pages in load order; consumed by FIFO eviction only.
    fifo_pages: VecDeque<usize>,
    access_counter: u64,
    clock_hand: usize,
    disk_latency_ms: u64,
    page_faults: u64,
    page_hits: u64,
}

impl VmTranslator {
    /// Sizes the tables for the given geometry.
    ///
    /// # Arguments
    ///
    /// * `page_size` - Page size in bytes (non-zero).
    /// * `virtual_size` - Virtual address space in bytes.
    /// * `physical_size` - Pool size in bytes; determines the frame count.
    /// * `config` - Initial policy and disk latency.
    pub fn new(page_size: usize, virtual_size: usize, physical_size: usize, config: &VmConfig) -> Self {
        debug_assert!(page_size > 0);
        let num_pages = virtual_size / page_size;
        let total_frames = physical_size / page_size;

        println!(
            "VM Initialized: Page Size={}, Virtual Pages={}, Physical Frames={}",
            page_size, num_pages, total_frames
        );

        Self {
            page_size,
            page_table: vec![PageTableEntry::default(); num_pages],
            frame_table: vec![None; total_frames],
            policy: config.policy,
            fifo_pages: VecDeque::new(),
            access_counter: 0,
            clock_hand: 0,
            disk_latency_ms: config.disk_latency_ms,
            page_faults: 0,
            page_hits: 0,
        }
    }

    /// Translates `v_addr` to a physical pool offset.
    ///
    /// Faults load the page on demand; `is_write` marks the resident page
    /// dirty. An address beyond the virtual space is a
    /// [`SimError::SegFault`] and counts as neither hit nor fault.
    pub fn translate(&mut self, v_addr: usize, is_write: bool) -> Result<Translation, SimError> {
        let page = v_addr / self.page_size;
        let offset = v_addr % self.page_size;

        if page >= self.page_table.len() {
            return Err(SimError::SegFault(v_addr));
        }
        self.access_counter += 1;

        if let Some(frame) = self.page_table[page].frame {
            self.page_hits += 1;
            let entry = &mut self.page_table[page];
            entry.last_access = self.access_counter;
            entry.referenced = true;
            if is_write {
                entry.dirty = true;
            }
            return Ok(Translation {
                physical: frame * self.page_size + offset,
                fault: false,
            });
        }

        self.page_faults += 1;
        println!("  Page Fault at address {} (Page {})", v_addr, page);

        if self.disk_latency_ms > 0 {
            println!("  (Simulating Disk I/O: {}ms)...", self.disk_latency_ms);
            thread::sleep(Duration::from_millis(self.disk_latency_ms));
        }

        let frame = match self.find_free_frame() {
            Some(frame) => frame,
            None => self.evict_page().ok_or(SimError::EvictionFailed)?,
        };

        let entry = &mut self.page_table[page];
        entry.frame = Some(frame);
        entry.last_access = self.access_counter;
        entry.referenced = true;
        entry.dirty = is_write;
        self.frame_table[frame] = Some(page);

        if self.policy == VmPolicy::Fifo {
            self.fifo_pages.push_back(page);
        }

        Ok(Translation {
            physical: frame * self.page_size + offset,
            fault: true,
        })
    }

    /// Lowest-numbered empty frame, if any.
    fn find_free_frame(&self) -> Option<usize> {
        self.frame_table.iter().position(Option::is_none)
    }

    /// Evicts one resident page per the active policy.
    ///
    /// # Returns
    ///
    /// The freed frame number, or `None` when the policy produced no
    /// victim (e.g. a FIFO queue emptied by a mid-run policy switch).
    fn evict_page(&mut self) -> Option<usize> {
        let victim = match self.policy {
            // Pages that were already evicted under another policy may
            // linger in the queue; skip them.
            VmPolicy::Fifo => loop {
                let page = self.fifo_pages.pop_front()?;
                if self.page_table[page].frame.is_some() {
                    break page;
                }
            },
            VmPolicy::Lru => self
                .frame_table
                .iter()
                .flatten()
                .min_by_key(|&&page| self.page_table[page].last_access)
                .copied()?,
            VmPolicy::Clock => {
                let total = self.frame_table.len();
                let mut victim = None;
                // Each resident entry is probed at most twice: the first
                // probe clears its reference bit, the second takes it.
                for _ in 0..(2 * total) {
                    if let Some(page) = self.frame_table[self.clock_hand] {
                        if self.page_table[page].referenced {
                            self.page_table[page].referenced = false;
                        } else {
                            victim = Some(page);
                            break;
                        }
                    }
                    self.clock_hand = (self.clock_hand + 1) % total;
                }
                let victim = victim?;
                self.clock_hand = (self.clock_hand + 1) % self.frame_table.len();
                victim
            }
        };

        let frame = self.page_table[victim].frame?;
        self.page_table[victim].frame = None;
        self.frame_table[frame] = None;
        println!("  Evicting Page {} from Frame {}", victim, frame);
        Some(frame)
    }

    /// Switches the replacement policy; takes effect from the next fault.
    pub fn set_policy(&mut self, policy: VmPolicy) {
        self.policy = policy;
    }

    /// Sets the simulated disk latency per fault.
    pub fn set_disk_latency(&mut self, ms: u64) {
        self.disk_latency_ms = ms;
    }

    /// Page size in bytes.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of virtual pages.
    pub fn num_pages(&self) -> usize {
        self.page_table.len()
    }

    /// Number of physical frames.
    pub fn total_frames(&self) -> usize {
        self.frame_table.len()
    }

    /// Frame holding `page`, when resident.
    pub fn frame_of(&self, page: usize) -> Option<usize> {
        self.page_table.get(page).and_then(|entry| entry.frame)
    }

    /// The page-table entry for `page`, when in range.
    pub fn entry(&self, page: usize) -> Option<&PageTableEntry> {
        self.page_table.get(page)
    }

    /// Number of currently resident pages.
    pub fn resident_pages(&self) -> usize {
        self.frame_table.iter().flatten().count()
    }

    /// Fault count since init.
    pub fn page_faults(&self) -> u64 {
        self.page_faults
    }

    /// Hit count since init.
    pub fn page_hits(&self) -> u64 {
        self.page_hits
    }

    /// In-bounds translations since init (`hits + faults`).
    pub fn access_counter(&self) -> u64 {
        self.access_counter
    }

    /// Prints the VM statistics block.
    pub fn print_stats(&self) {
        println!("\n=== Virtual Memory Statistics ===");
        println!("  Page Faults: {}", self.page_faults);
        println!("  Page Hits:   {}", self.page_hits);
        let total = self.page_hits + self.page_faults;
        let rate = if total > 0 {
            self.page_hits as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        println!("  Hit Rate:    {:.2}%", rate);
        if self.disk_latency_ms > 0 {
            println!("  Disk Latency per Fault: {}ms", self.disk_latency_ms);
        }
        println!("=================================\n");
    }
}
