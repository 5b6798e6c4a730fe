use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// A stable identifier for one handler subscription.
///
/// Ids are unique for the whole process, so a `HandlerId` obtained from one
/// event source can never accidentally unsubscribe a handler of another.
pub struct HandlerId(u64);

impl HandlerId {
    pub(crate) fn next() -> HandlerId {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        HandlerId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}
