//! tests/memory_hygiene.rs
//! Inspects every buffer handed back to the allocator: the memory arena must come back zeroed
//! and no freed buffer may hold the password, on success and failure alike.

use argon2_native::{derive, Argon2Error, Hash, Hasher};
use std::alloc::{GlobalAlloc, Layout, System};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

const PASSWORD: &[u8] = b"hygiene-marker-5c1d9e0b";

/// 256 KiB: the size of the arena for `m = 256`, whatever the lane count.
const ARENA_BYTES: usize = 256 * 1024;
const ARENA_ALIGN: usize = 64;

struct InspectingAllocator;

static ARMED: AtomicBool = AtomicBool::new(false);
static ARENAS_FREED: AtomicUsize = AtomicUsize::new(0);
static DIRTY_ARENAS: AtomicUsize = AtomicUsize::new(0);
static PASSWORD_LEAKS: AtomicUsize = AtomicUsize::new(0);

fn contains_password(bytes: &[u8]) -> bool {
    bytes.windows(PASSWORD.len()).any(|w| w == PASSWORD)
}

unsafe impl GlobalAlloc for InspectingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if ARMED.load(Ordering::SeqCst) {
            let bytes = std::slice::from_raw_parts(ptr, layout.size());

            if layout.size() == ARENA_BYTES && layout.align() == ARENA_ALIGN {
                ARENAS_FREED.fetch_add(1, Ordering::SeqCst);
                if bytes.iter().any(|&b| b != 0) {
                    DIRTY_ARENAS.fetch_add(1, Ordering::SeqCst);
                }
            }

            if contains_password(bytes) {
                PASSWORD_LEAKS.fetch_add(1, Ordering::SeqCst);
            }
        }

        System.dealloc(ptr, layout)
    }
}

#[global_allocator]
static GLOBAL: InspectingAllocator = InspectingAllocator;

fn arenas_freed() -> usize {
    ARENAS_FREED.load(Ordering::SeqCst)
}

// A single test so that nothing else runs while the allocator is armed.
#[test]
fn freed_memory_is_clean() {
    ARMED.store(true, Ordering::SeqCst);

    // Successful derivations, one lane and several
    for lanes in [1u32, 2, 4] {
        let before = arenas_freed();
        let tag = derive(2, 256, lanes, 32, PASSWORD, b"somesalt").unwrap();
        assert_eq!(tag.len(), 32);
        assert_eq!(arenas_freed(), before + 1, "lanes={lanes}");
    }

    // Rejected before any arena is reserved
    let before = arenas_freed();
    assert_eq!(
        derive(2, 256, 1, 32, PASSWORD, b"short"),
        Err(Argon2Error::InvalidSaltLength)
    );
    assert_eq!(
        derive(0, 256, 1, 32, PASSWORD, b"somesalt"),
        Err(Argon2Error::InvalidTimeCost)
    );
    assert_eq!(arenas_freed(), before);

    // Hashing and verification, which re-derives
    let before = arenas_freed();
    let hash = Hasher::new()
        .iterations(2)
        .memory_cost_kib(256)
        .threads(2)
        .hash(PASSWORD)
        .unwrap();
    let parsed = Hash::from_str(&hash.to_string()).unwrap();
    assert!(parsed.verify(PASSWORD));
    assert!(!parsed.verify(b"not the password"));
    drop(parsed);
    drop(hash);
    assert_eq!(arenas_freed(), before + 3);

    ARMED.store(false, Ordering::SeqCst);

    assert_eq!(
        DIRTY_ARENAS.load(Ordering::SeqCst),
        0,
        "an arena was freed unwiped"
    );
    assert_eq!(
        PASSWORD_LEAKS.load(Ordering::SeqCst),
        0,
        "the password was found in freed memory"
    );
}
