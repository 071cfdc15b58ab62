//! Identity Registry - unique ids for objects, labels and administrations.
//!
//! - Object ids for host objects
//! - Unique id counter used to synthesize labels (`ObservableObject@N`)
//! - Live administration count (records are dropped with their object)

use std::cell::RefCell;
use std::fmt;

// =============================================================================
// Registry State
// =============================================================================

thread_local! {
    /// Next host object id.
    static NEXT_OBJECT_ID: RefCell<u64> = const { RefCell::new(1) };

    /// Counter for generating unique label suffixes.
    static ID_COUNTER: RefCell<u64> = const { RefCell::new(1) };

    /// Number of administration records currently alive.
    static LIVE_ADMINISTRATIONS: RefCell<usize> = const { RefCell::new(0) };
}

/// Identity of a host object, unique per thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u64);

impl ObjectId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Allocation
// =============================================================================

pub(crate) fn next_object_id() -> ObjectId {
    NEXT_OBJECT_ID.with(|next| {
        let mut next = next.borrow_mut();
        let id = *next;
        *next += 1;
        ObjectId(id)
    })
}

/// Next value of the unique id counter.
pub fn next_unique_id() -> u64 {
    ID_COUNTER.with(|counter| {
        let mut counter = counter.borrow_mut();
        let id = *counter;
        *counter += 1;
        id
    })
}

// =============================================================================
// Administration Accounting
// =============================================================================

pub(crate) fn administration_created() {
    LIVE_ADMINISTRATIONS.with(|live| *live.borrow_mut() += 1);
}

pub(crate) fn administration_dropped() {
    LIVE_ADMINISTRATIONS.with(|live| {
        let mut live = live.borrow_mut();
        *live = live.saturating_sub(1);
    });
}

/// Number of administration records alive on this thread.
pub fn live_administrations() -> usize {
    LIVE_ADMINISTRATIONS.with(|live| *live.borrow())
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Reset the label counter.
///
/// Object ids are never reused, so they are left alone.
pub fn reset_registry() {
    ID_COUNTER.with(|counter| *counter.borrow_mut() = 1);
}
