//! Transposition table shared by all search workers.
//!
//! Lockless: every slot stores `key ^ data` next to `data`, and a probe only
//! accepts the slot when the two still XOR back to the probed key. A torn
//! write from a concurrent store is therefore seen as a miss.

use std::mem;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use chess::{ChessMove, Piece, ALL_SQUARES};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Exact,
    /// Failed high: the true score is at least this value.
    Lower,
    /// Failed low: the true score is at most this value.
    Upper,
}

impl Bound {
    fn to_bits(self) -> u8 {
        match self {
            Bound::Exact => 0,
            Bound::Lower => 1,
            Bound::Upper => 2,
        }
    }

    fn from_bits(v: u8) -> Self {
        match v & 0x3 {
            0 => Bound::Exact,
            1 => Bound::Lower,
            _ => Bound::Upper,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TtEntry {
    pub depth: i32,
    pub value: i32,
    pub bound: Bound,
    pub best_move: Option<ChessMove>,
    generation: u8,
}

fn encode_move(mv: Option<ChessMove>) -> u16 {
    let Some(mv) = mv else { return 0 };
    let promo = match mv.get_promotion() {
        None => 0,
        Some(Piece::Knight) => 1,
        Some(Piece::Bishop) => 2,
        Some(Piece::Rook) => 3,
        Some(_) => 4,
    };
    (mv.get_source().to_index() as u16) | ((mv.get_dest().to_index() as u16) << 6) | (promo << 12)
}

fn decode_move(bits: u16) -> Option<ChessMove> {
    if bits == 0 {
        return None;
    }
    let from = ALL_SQUARES[usize::from(bits & 0x3F)];
    let to = ALL_SQUARES[usize::from((bits >> 6) & 0x3F)];
    let promo = match bits >> 12 {
        1 => Some(Piece::Knight),
        2 => Some(Piece::Bishop),
        3 => Some(Piece::Rook),
        4 => Some(Piece::Queen),
        _ => None,
    };
    Some(ChessMove::new(from, to, promo))
}

/// Packed layout:
/// - bits 0-15:  move
/// - bits 16-31: value (i16)
/// - bits 32-39: depth (u8)
/// - bits 40-47: bound (2 bits) + generation (6 bits)
/// - bit  48:    occupied marker, so an all-zero entry is never valid
fn pack(depth: u8, value: i16, bound: Bound, best_move: Option<ChessMove>, generation: u8) -> u64 {
    let bound_gen = (bound.to_bits() & 0x3) | ((generation & 0x3F) << 2);
    u64::from(encode_move(best_move))
        | (u64::from(value as u16) << 16)
        | (u64::from(depth) << 32)
        | (u64::from(bound_gen) << 40)
        | (1 << 48)
}

fn unpack(data: u64) -> TtEntry {
    let bound_gen = ((data >> 40) & 0xFF) as u8;
    TtEntry {
        best_move: decode_move((data & 0xFFFF) as u16),
        value: i32::from(((data >> 16) & 0xFFFF) as u16 as i16),
        depth: i32::from(((data >> 32) & 0xFF) as u8),
        bound: Bound::from_bits(bound_gen),
        generation: bound_gen >> 2,
    }
}

#[repr(C)]
#[derive(Default)]
struct Slot {
    key_xor: AtomicU64,
    data: AtomicU64,
}

impl Slot {
    fn store(&self, key: u64, packed: u64) {
        self.data.store(packed, Ordering::Relaxed);
        self.key_xor.store(key ^ packed, Ordering::Relaxed);
    }

    fn probe(&self, key: u64) -> Option<TtEntry> {
        let key_xor = self.key_xor.load(Ordering::Relaxed);
        let data = self.data.load(Ordering::Relaxed);
        (data != 0 && key_xor ^ data == key).then(|| unpack(data))
    }

    fn raw(&self) -> u64 {
        self.data.load(Ordering::Relaxed)
    }

    fn clear(&self) {
        self.key_xor.store(0, Ordering::Relaxed);
        self.data.store(0, Ordering::Relaxed);
    }
}

const BUCKET_SIZE: usize = 4;

#[repr(C)]
#[derive(Default)]
struct Bucket {
    slots: [Slot; BUCKET_SIZE],
}

pub struct TranspositionTable {
    buckets: Vec<Bucket>,
    mask: usize,
    generation: AtomicU8,
    size_mb: usize,
}

impl TranspositionTable {
    /// Allocates roughly `size_mb` megabytes. If the allocation is refused the
    /// size is halved until it succeeds.
    #[must_use]
    pub fn new(size_mb: usize) -> Self {
        let mut mb = size_mb.max(1);
        loop {
            let bytes = mb.saturating_mul(1024 * 1024);
            // Largest power of two that fits in the requested size.
            let fit = bytes / mem::size_of::<Bucket>();
            let count = if fit == 0 { 0 } else { 1usize << fit.ilog2() };
            let count = count.max(1024);

            let mut buckets: Vec<Bucket> = Vec::new();
            if buckets.try_reserve_exact(count).is_ok() {
                buckets.resize_with(count, Bucket::default);
                if mb != size_mb {
                    log::warn!("hash of {size_mb} MB could not be allocated, using {mb} MB");
                }
                return TranspositionTable {
                    buckets,
                    mask: count - 1,
                    generation: AtomicU8::new(0),
                    size_mb: mb,
                };
            }
            mb /= 2;
        }
    }

    #[must_use]
    pub fn size_mb(&self) -> usize {
        self.size_mb
    }

    fn bucket(&self, key: u64) -> &Bucket {
        &self.buckets[(key as usize) & self.mask]
    }

    fn generation(&self) -> u8 {
        self.generation.load(Ordering::Relaxed) & 0x3F
    }

    /// Ages existing entries; called once per `go`.
    pub fn new_search(&self) {
        self.generation.fetch_add(1, Ordering::Relaxed);
    }

    pub fn probe(&self, key: u64) -> Option<TtEntry> {
        self.bucket(key).slots.iter().find_map(|slot| slot.probe(key))
    }

    pub fn store(&self, key: u64, depth: i32, value: i32, bound: Bound, best_move: Option<ChessMove>) {
        let generation = self.generation();
        let depth = depth.clamp(0, 255) as u8;
        let value = value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
        let bucket = self.bucket(key);

        // Keep the old move when re-storing a position without one.
        let existing = bucket.slots.iter().find(|slot| slot.probe(key).is_some());
        let best_move = best_move.or_else(|| existing.and_then(|s| s.probe(key)).and_then(|e| e.best_move));
        let packed = pack(depth, value, bound, best_move, generation);

        if let Some(slot) = existing.or_else(|| bucket.slots.iter().find(|slot| slot.raw() == 0)) {
            slot.store(key, packed);
            return;
        }

        let victim = bucket
            .slots
            .iter()
            .min_by_key(|slot| {
                let entry = unpack(slot.raw());
                let age = i32::from(generation.wrapping_sub(entry.generation) & 0x3F);
                entry.depth * 2 - age * 8
            })
            .unwrap_or(&bucket.slots[0]);
        victim.store(key, packed);
    }

    /// Per-mille of sampled slots written during the current search.
    #[must_use]
    pub fn hashfull(&self) -> u32 {
        let generation = self.generation();
        let sample = self.buckets.len().min(1000);
        let used = self.buckets[..sample]
            .iter()
            .flat_map(|bucket| bucket.slots.iter())
            .filter(|slot| {
                let raw = slot.raw();
                raw != 0 && unpack(raw).generation == generation
            })
            .count();
        (used * 1000 / (sample * BUCKET_SIZE)) as u32
    }

    pub fn clear(&self) {
        for bucket in &self.buckets {
            for slot in &bucket.slots {
                slot.clear();
            }
        }
    }
}
