//! Facade Unit Tests.
//!
//! Verifies the routing the `MemoryManager` performs between its parts:
//! heap dispatch per strategy, access flow through the VM translator into
//! the cache hierarchy, the guard rails (access violations, SegFaults
//! skipping the caches), and the allocation counters behind `stats`.

use memsim_core::config::{AllocStrategy, Config, VmPolicy};
use memsim_core::heap::{HeapState, HEADER_SIZE};
use memsim_core::{MemoryManager, SimError};

const POOL: usize = 1024;

fn manager() -> MemoryManager {
    MemoryManager::new(POOL, &Config::default()).unwrap()
}

fn buddy_manager() -> MemoryManager {
    let mut config = Config::default();
    config.allocator.strategy = AllocStrategy::Buddy;
    MemoryManager::new(POOL, &config).unwrap()
}

// ══════════════════════════════════════════════════════════
// 1. Initialization
// ══════════════════════════════════════════════════════════

#[test]
fn pool_must_hold_a_header() {
    let err = MemoryManager::new(16, &Config::default()).err();
    assert_eq!(err, Some(SimError::PoolTooSmall(16)));

    assert!(MemoryManager::new(HEADER_SIZE, &Config::default()).is_ok());
}

#[test]
fn config_strategy_selects_the_heap() {
    let mem = buddy_manager();
    assert!(matches!(mem.heap(), HeapState::Buddy(_)));
    assert_eq!(mem.strategy(), AllocStrategy::Buddy);

    let mem = manager();
    assert!(matches!(mem.heap(), HeapState::Linear(_)));
}

// ══════════════════════════════════════════════════════════
// 2. Heap Dispatch
// ══════════════════════════════════════════════════════════

#[test]
fn malloc_free_roundtrip_updates_stats() {
    let mut mem = manager();

    let offset = mem.malloc(100).unwrap();
    assert_eq!(offset, 32);

    let stats = mem.heap_stats();
    assert_eq!(stats.total_size, POOL);
    assert_eq!(stats.used_bytes, 104);
    assert_eq!(stats.requests, 1);
    assert_eq!(stats.successes, 1);

    mem.free_smart(1).unwrap();
    let stats = mem.heap_stats();
    assert_eq!(stats.used_bytes, 0);
    assert_eq!(stats.free_bytes, POOL - HEADER_SIZE);
    assert_eq!(stats.largest_free_block, POOL - HEADER_SIZE);
}

/// Failed requests still count toward the request statistics.
#[test]
fn failed_allocations_are_counted() {
    let mut mem = manager();
    assert!(mem.malloc(5000).is_err());

    let stats = mem.heap_stats();
    assert_eq!(stats.requests, 1);
    assert_eq!(stats.successes, 0);
    assert_eq!(stats.success_rate(), 0.0);
}

#[test]
fn buddy_dispatch_allocates_and_frees_by_offset() {
    let mut mem = buddy_manager();

    let offset = mem.malloc(96).unwrap();
    assert_eq!(offset, 32);

    // Buddy blocks carry no ids; free resolves the value as an offset.
    mem.free_smart(offset).unwrap();
    let stats = mem.heap_stats();
    assert_eq!(stats.used_bytes, 0);

    assert_eq!(mem.free_smart(offset), Err(SimError::NotFound(offset)));
    assert_eq!(mem.free_by_id(1), Err(SimError::NotFound(1)));
}

/// Buddy stats report the rounding waste of live blocks, like the linear
/// heap reports its alignment padding.
#[test]
fn buddy_stats_report_internal_fragmentation() {
    let mut mem = buddy_manager();

    // 100 + 32 = 132 rounds up to an order-8 (256-byte) block.
    mem.malloc(100).unwrap();
    assert_eq!(mem.heap_stats().internal_fragmentation, 124);
}

// ══════════════════════════════════════════════════════════
// 3. Strategy Switching
// ══════════════════════════════════════════════════════════

/// Crossing into the buddy system re-initializes the heap view; linear
/// allocations are forgotten (the documented hazard).
#[test]
fn switch_to_buddy_reinitializes_the_view() {
    let mut mem = manager();
    mem.malloc(100).unwrap();

    mem.set_strategy(AllocStrategy::Buddy);
    assert!(matches!(mem.heap(), HeapState::Buddy(_)));

    let offset = mem.malloc(96).unwrap();
    assert_eq!(offset, 32, "buddy view starts from an empty pool");

    // Switching back re-initializes the linear view the same way.
    mem.set_strategy(AllocStrategy::FirstFit);
    match mem.heap() {
        HeapState::Linear(heap) => {
            assert_eq!(heap.blocks().len(), 1);
            assert_eq!(heap.free_bytes(), POOL - HEADER_SIZE);
        }
        HeapState::Buddy(_) => panic!("expected the linear view"),
    }
}

/// Moving between the linear strategies keeps the heap intact.
#[test]
fn linear_strategy_switch_is_free() {
    let mut mem = manager();
    mem.malloc(100).unwrap();

    mem.set_strategy(AllocStrategy::BestFit);
    match mem.heap() {
        HeapState::Linear(heap) => assert_eq!(heap.used_bytes(), 104),
        HeapState::Buddy(_) => panic!("expected the linear view"),
    }
}

// ══════════════════════════════════════════════════════════
// 4. Access Routing
// ══════════════════════════════════════════════════════════

#[test]
fn access_feeds_the_cache_hierarchy() {
    let mut mem = manager();

    mem.access(0, 'R').unwrap();
    mem.access(0, 'R').unwrap();

    let [l1, _, _] = mem.cache().levels();
    assert_eq!(l1.misses(), 1);
    assert_eq!(l1.hits(), 1);
}

/// A physical address beyond the pool never reaches the caches.
#[test]
fn access_violation_skips_the_cache() {
    let mut mem = manager();
    assert_eq!(mem.access(POOL, 'R'), Err(SimError::AccessViolation(POOL)));

    let [l1, l2, l3] = mem.cache().levels();
    assert_eq!(l1.hits() + l1.misses(), 0);
    assert_eq!(l2.hits() + l2.misses(), 0);
    assert_eq!(l3.hits() + l3.misses(), 0);
}

// ══════════════════════════════════════════════════════════
// 5. Virtual Memory Integration
// ══════════════════════════════════════════════════════════

#[test]
fn enable_vm_sizes_the_tables() {
    let mut mem = manager();
    mem.enable_vm(64);

    let vm = mem.vm().unwrap();
    assert_eq!(vm.num_pages(), 65536 / 64);
    assert_eq!(vm.total_frames(), POOL / 64);
}

/// With VM enabled the cache sees physical offsets: the first touched
/// page lands in frame 0 regardless of its virtual address.
#[test]
fn translation_feeds_the_cache_with_physical_offsets() {
    let mut mem = manager();
    mem.enable_vm(64);

    // Virtual 64 (page 1) -> frame 0 -> physical 0.
    mem.access(64, 'R').unwrap();
    // Virtual 0 (page 0) -> frame 1 -> physical 64.
    mem.access(0, 'R').unwrap();

    let vm = mem.vm().unwrap();
    assert_eq!(vm.frame_of(1), Some(0));
    assert_eq!(vm.frame_of(0), Some(1));
    assert_eq!(vm.page_faults(), 2);

    // Both physical blocks are distinct L1 lines, so two misses.
    let [l1, _, _] = mem.cache().levels();
    assert_eq!(l1.misses(), 2);

    // The same virtual address hits the page table again, but its L1
    // line was evicted by the aliasing second frame (physical 0 and 64
    // both map to L1 set 0); the larger L2 still holds it.
    mem.access(64, 'R').unwrap();
    assert_eq!(mem.vm().unwrap().page_hits(), 1);
    let [l1, l2, _] = mem.cache().levels();
    assert_eq!(l1.misses(), 3);
    assert_eq!(l2.hits(), 1);
}

/// A SegFault aborts the access before any cache level is probed.
#[test]
fn segfault_skips_the_cache() {
    let mut mem = manager();
    mem.enable_vm(64);

    assert_eq!(mem.access(70000, 'R'), Err(SimError::SegFault(70000)));

    let [l1, _, _] = mem.cache().levels();
    assert_eq!(l1.hits() + l1.misses(), 0);
}

/// Policy and latency set before `enable_vm` carry into the translator.
#[test]
fn vm_settings_apply_before_enable() {
    let mut mem = manager();
    mem.set_vm_policy(VmPolicy::Lru);
    mem.set_vm_latency(0);
    mem.enable_vm(256); // 4 frames

    // LRU behavior: refresh page 0, then fault; page 1 is the victim.
    mem.access(0, 'R').unwrap();
    mem.access(256, 'R').unwrap();
    mem.access(512, 'R').unwrap();
    mem.access(768, 'R').unwrap();
    mem.access(0, 'R').unwrap();
    mem.access(1024, 'R').unwrap();

    let vm = mem.vm().unwrap();
    assert_eq!(vm.frame_of(1), None, "LRU evicts the stalest page");
    assert_eq!(vm.frame_of(0), Some(0));
}

/// Writes propagate through translation and dirty both the page and the
/// cache line.
#[test]
fn write_intent_reaches_page_and_cache() {
    let mut mem = manager();
    mem.enable_vm(64);

    mem.access(128, 'W').unwrap();

    let vm = mem.vm().unwrap();
    assert!(vm.entry(2).unwrap().dirty);
    let [l1, _, _] = mem.cache().levels();
    assert_eq!(l1.dirty_lines(), 1);
}
