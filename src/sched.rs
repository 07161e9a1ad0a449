//! Scheduler facade and record arenas.

mod donate;
pub mod policy;
pub mod queue;
pub mod thread;

use alloc::vec::Vec;

use self::policy::{Lottery, Policy, Priority};
use self::queue::{QueueId, WaitQueue};
use self::thread::{ThreadId, ThreadState};

/// Deterministic take-max scheduler.
pub type PriorityScheduler = Scheduler<Priority>;

/// Probabilistic ticket-sum scheduler.
pub type LotteryScheduler = Scheduler<Lottery>;

/// The scheduling core: thread records, wait queues and one donation policy.
///
/// Thread records are indexed by [`ThreadId`], the runtime's dense thread
/// numbering, and are created on first reference with the policy's default
/// value. Queues are created with [`Scheduler::new_queue`] and live for the
/// lifetime of the resource they guard.
#[derive(Debug)]
pub struct Scheduler<P: Policy> {
    policy: P,
    threads: Vec<ThreadState>,
    queues: Vec<WaitQueue>,
    /// Source of enqueue stamps. Strictly increasing across all queues.
    stamp: u64,
}

impl<P: Policy + Default> Scheduler<P> {
    pub fn new() -> Self {
        Self::with_policy(P::default())
    }
}

impl<P: Policy + Default> Default for Scheduler<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Policy> Scheduler<P> {
    pub fn with_policy(policy: P) -> Self {
        Scheduler {
            policy,
            threads: Vec::new(),
            queues: Vec::new(),
            stamp: 0,
        }
    }

    /// Creates a wait queue. A queue with `transfers` set passes its
    /// waiters' scheduling weight on to whichever thread holds it; helper
    /// queues that guard no starvation-prone resource pass nothing.
    pub fn new_queue(&mut self, transfers: bool) -> QueueId {
        let id = QueueId::new(self.queues.len() as u32);
        self.queues.push(WaitQueue::new(transfers));
        log::trace!("[SCHED] new queue {:?} (transfers: {})", id, transfers);
        id
    }

    /// The thread's own base value.
    pub fn priority(&mut self, t: ThreadId) -> u64 {
        self.ensure_thread(t);
        self.threads[t.index()].base
    }

    /// The cached effective value selection runs on.
    pub fn effective_priority(&mut self, t: ThreadId) -> u64 {
        self.ensure_thread(t);
        self.threads[t.index()].effective
    }

    /// Sets the thread's base value and propagates the change along the
    /// chain of holders the thread is donating to. A value outside the
    /// policy bounds is a caller bug and panics.
    pub fn set_priority(&mut self, t: ThreadId, value: u64) {
        assert!(
            (P::MIN..=P::MAX).contains(&value),
            "priority {} outside [{}, {}]",
            value,
            P::MIN,
            P::MAX
        );
        self.ensure_thread(t);
        if self.threads[t.index()].base == value {
            return;
        }
        log::debug!(
            "[SCHED] {:?}: priority {} -> {}",
            t,
            self.threads[t.index()].base,
            value
        );
        self.threads[t.index()].base = value;
        self.refresh(t);
        self.check_graph();
    }

    /// Raises the calling thread's base value by one. Returns `false` and
    /// changes nothing at the policy maximum.
    pub fn increase_priority(&mut self, t: ThreadId) -> bool {
        let current = self.priority(t);
        if current == P::MAX {
            return false;
        }
        self.set_priority(t, current + 1);
        true
    }

    /// Lowers the calling thread's base value by one. Returns `false` and
    /// changes nothing at the policy minimum.
    pub fn decrease_priority(&mut self, t: ThreadId) -> bool {
        let current = self.priority(t);
        if current == P::MIN {
            return false;
        }
        self.set_priority(t, current - 1);
        true
    }

    /// The thread currently holding the queue's resource.
    pub fn holder(&self, q: QueueId) -> Option<ThreadId> {
        self.queues[q.index()].holder
    }

    /// The queue's waiters in arrival order.
    pub fn waiters(&self, q: QueueId) -> &[ThreadId] {
        &self.queues[q.index()].waiters
    }

    pub(crate) fn ensure_thread(&mut self, t: ThreadId) {
        let needed = t.index() + 1;
        if self.threads.len() < needed {
            self.threads.resize_with(needed, || ThreadState::new(P::DEFAULT));
        }
    }

    pub(crate) fn next_stamp(&mut self) -> u64 {
        self.stamp += 1;
        self.stamp
    }

    /// Walks the whole graph and asserts every structural invariant: a
    /// holder is never a waiter, back-edges agree on both sides, stamps are
    /// unique within a queue, and every cached value equals a fresh fold.
    #[cfg(any(debug_assertions, feature = "debug"))]
    pub(crate) fn check_graph(&self) {
        for (qi, queue) in self.queues.iter().enumerate() {
            let qid = QueueId::new(qi as u32);
            if let Some(h) = queue.holder {
                assert!(
                    !queue.waiters.contains(&h),
                    "{:?} both holds and waits on {:?}",
                    h,
                    qid
                );
                assert!(
                    self.threads[h.index()].held.contains(&qid),
                    "{:?} does not record holding {:?}",
                    h,
                    qid
                );
            }
            for &w in &queue.waiters {
                assert_eq!(
                    self.threads[w.index()].donee,
                    Some(qid),
                    "{:?} waits on {:?} without a donee edge",
                    w,
                    qid
                );
            }
            for (i, &a) in queue.waiters.iter().enumerate() {
                for &b in &queue.waiters[i + 1..] {
                    assert_ne!(
                        self.threads[a.index()].stamp,
                        self.threads[b.index()].stamp,
                        "duplicate stamp on {:?}",
                        qid
                    );
                }
            }
        }
        for (ti, state) in self.threads.iter().enumerate() {
            let t = ThreadId(ti as u32);
            for &q in &state.held {
                assert_eq!(
                    self.queues[q.index()].holder,
                    Some(t),
                    "{:?} records holding {:?} but is not its holder",
                    t,
                    q
                );
            }
            let fresh = P::fold(
                state.base,
                state
                    .held
                    .iter()
                    .map(|q| &self.queues[q.index()])
                    .filter(|queue| queue.transfers)
                    .flat_map(|queue| queue.waiters.iter())
                    .map(|w| self.threads[w.index()].effective),
            );
            assert_eq!(state.effective, fresh, "stale cached value on {:?}", t);
        }
    }

    #[cfg(not(any(debug_assertions, feature = "debug")))]
    pub(crate) fn check_graph(&self) {}
}
