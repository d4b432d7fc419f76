//! Set-associative cache hierarchy.
//!
//! Three independent cache levels are probed in order L1 -> L2 -> L3 per
//! access; a hit at one level stops the probe. No data moves through the
//! levels and no inclusion policy is enforced; each level only maintains
//! its own line metadata and hit/miss statistics. Replacement is
//! write-allocate with a per-level FIFO/LRU/LFU victim choice.

use crate::config::{CacheConfig, CacheLevelConfig, CachePolicy};

/// One cache line's metadata.
///
/// `last_access` and `access_count` feed the LRU and LFU victim choices;
/// both are stamped from the level's monotonic timer so ties are
/// well-defined.
#[derive(Clone, Default)]
pub struct CacheLine {
    valid: bool,
    dirty: bool,
    tag: usize,
    last_access: u64,
    access_count: u64,
}

/// One set of `ways` lines plus the FIFO eviction cursor.
struct CacheSet {
    lines: Vec<CacheLine>,
    fifo_next_victim: usize,
}

/// A single set-associative cache level.
pub struct CacheLevel {
    level: u8,
    block_size: usize,
    ways: usize,
    num_sets: usize,
    sets: Vec<CacheSet>,
    policy: CachePolicy,
    /// Monotonic per-level clock; advanced once per access.
    timer: u64,
    hits: u64,
    misses: u64,
}

impl CacheLevel {
    /// Creates a cache level from its geometry.
    ///
    /// Degenerate parameters are repaired rather than rejected: zero block
    /// size or associativity fall back to 32-byte direct-mapped lines, and
    /// a geometry smaller than one set still gets a single set.
    ///
    /// # Arguments
    ///
    /// * `level` - Level number used in reports (1, 2, 3).
    /// * `config` - Total size, block size, and associativity.
    pub fn new(level: u8, config: &CacheLevelConfig) -> Self {
        let (block_size, ways) = if config.block_bytes == 0 || config.ways == 0 {
            (32, 1)
        } else {
            (config.block_bytes, config.ways)
        };
        let num_sets = (config.size_bytes / (block_size * ways)).max(1);

        let sets = (0..num_sets)
            .map(|_| CacheSet {
                lines: vec![CacheLine::default(); ways],
                fifo_next_victim: 0,
            })
            .collect();

        Self {
            level,
            block_size,
            ways,
            num_sets,
            sets,
            policy: CachePolicy::default(),
            timer: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Probes the level for `addr`, installing the block on a miss.
    ///
    /// On a hit the line's access time and count are refreshed (and the
    /// dirty bit set for writes). On a miss the victim is the first
    /// invalid way if any, otherwise the policy's choice; the new line is
    /// installed with `dirty = is_write` and a fresh access count.
    ///
    /// # Returns
    ///
    /// `true` on hit, `false` on miss.
    pub fn access(&mut self, addr: usize, is_write: bool) -> bool {
        self.timer += 1;
        let block = addr / self.block_size;
        let index = block % self.num_sets;
        let tag = block / self.num_sets;

        let timer = self.timer;
        let policy = self.policy;
        let ways = self.ways;
        let set = &mut self.sets[index];

        if let Some(line) = set
            .lines
            .iter_mut()
            .find(|line| line.valid && line.tag == tag)
        {
            self.hits += 1;
            line.last_access = timer;
            line.access_count += 1;
            if is_write {
                line.dirty = true;
            }
            return true;
        }

        self.misses += 1;
        let victim = match set.lines.iter().position(|line| !line.valid) {
            Some(invalid) => invalid,
            None => match policy {
                CachePolicy::Fifo => {
                    let victim = set.fifo_next_victim;
                    set.fifo_next_victim = (victim + 1) % ways;
                    victim
                }
                CachePolicy::Lru => Self::min_way(set, |line| line.last_access),
                CachePolicy::Lfu => {
                    Self::min_way(set, |line| (line.access_count, line.last_access))
                }
            },
        };

        set.lines[victim] = CacheLine {
            valid: true,
            dirty: is_write,
            tag,
            last_access: timer,
            access_count: 1,
        };
        false
    }

    /// Way holding the minimal `key`; ties resolve to the lowest index.
    fn min_way<K: Ord>(set: &CacheSet, key: impl Fn(&CacheLine) -> K) -> usize {
        set.lines
            .iter()
            .enumerate()
            .min_by_key(|(idx, line)| (key(line), *idx))
            .map(|(idx, _)| idx)
            .expect("cache set has at least one way")
    }

    /// Number of valid lines currently marked dirty.
    pub fn dirty_lines(&self) -> usize {
        self.sets
            .iter()
            .flat_map(|set| &set.lines)
            .filter(|line| line.valid && line.dirty)
            .count()
    }

    /// Whether `addr` currently resides in this level.
    pub fn contains(&self, addr: usize) -> bool {
        let block = addr / self.block_size;
        let index = block % self.num_sets;
        let tag = block / self.num_sets;
        self.sets[index]
            .lines
            .iter()
            .any(|line| line.valid && line.tag == tag)
    }

    /// Switches the replacement policy; line metadata is retained.
    pub fn set_policy(&mut self, policy: CachePolicy) {
        self.policy = policy;
    }

    /// Hit count since the last reset.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Miss count since the last reset.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Hit rate in percent (0 when no accesses happened).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64 * 100.0
    }

    /// Zeroes the hit/miss counters. Line metadata is untouched.
    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
    }

    /// Prints this level's statistics block.
    pub fn print_stats(&self) {
        println!("L{} Cache Stats:", self.level);
        println!("  Hits: {}", self.hits);
        println!("  Misses: {}", self.misses);
        println!("  Hit Rate: {:.2}%", self.hit_rate());
    }
}

/// The three-level hierarchy driven by the facade.
pub struct CacheHierarchy {
    levels: [CacheLevel; 3],
}

impl CacheHierarchy {
    /// Builds L1/L2/L3 from the configuration and applies its policy.
    pub fn new(config: &CacheConfig) -> Self {
        let mut levels = [
            CacheLevel::new(1, &config.l1),
            CacheLevel::new(2, &config.l2),
            CacheLevel::new(3, &config.l3),
        ];
        for level in &mut levels {
            level.set_policy(config.policy);
        }

        println!("Cache System Initialized:");
        for (cfg, name) in [(&config.l1, "L1"), (&config.l2, "L2"), (&config.l3, "L3")] {
            println!(
                "  {}: {}B, Block {}B, {}-way",
                name, cfg.size_bytes, cfg.block_bytes, cfg.ways
            );
        }

        Self { levels }
    }

    /// Runs one access through the hierarchy.
    ///
    /// `rw` is `'R'` or `'W'` (case-insensitive for `'W'`); anything else
    /// is treated as a read. L2 is only consulted on an L1 miss, L3 only
    /// on an L2 miss; each consulted level updates its own statistics.
    pub fn access(&mut self, addr: usize, rw: char) {
        let is_write = matches!(rw, 'W' | 'w');
        for level in &mut self.levels {
            if level.access(addr, is_write) {
                return;
            }
        }
    }

    /// Applies `policy` to all three levels.
    pub fn set_policy(&mut self, policy: CachePolicy) {
        for level in &mut self.levels {
            level.set_policy(policy);
        }
    }

    /// The levels in probe order. Exposed for reporting and tests.
    pub fn levels(&self) -> &[CacheLevel; 3] {
        &self.levels
    }

    /// Prints the statistics of every level.
    pub fn print_stats(&self) {
        println!("\n=== Cache Statistics ===");
        for level in &self.levels {
            level.print_stats();
        }
        println!("========================\n");
    }
}
