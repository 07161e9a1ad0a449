//! Wait queues and the four queue operations.

use alloc::vec::Vec;

use super::policy::{Candidate, Policy};
use super::thread::ThreadId;
use super::Scheduler;

/// Index of a wait queue in the scheduler arena.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct QueueId(u32);

impl QueueId {
    pub(crate) fn new(raw: u32) -> Self {
        QueueId(raw)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// One resource's waiting set. Waiters are kept in arrival order; selection
/// scans them under the policy comparator.
#[derive(Debug)]
pub(crate) struct WaitQueue {
    /// Whether waiters' scheduling weight passes to the holder.
    pub(crate) transfers: bool,
    pub(crate) holder: Option<ThreadId>,
    pub(crate) waiters: Vec<ThreadId>,
}

impl WaitQueue {
    pub(crate) fn new(transfers: bool) -> Self {
        WaitQueue {
            transfers,
            holder: None,
            waiters: Vec::new(),
        }
    }
}

impl<P: Policy> Scheduler<P> {
    /// Enqueues `t` on `q`. The caller could not obtain the resource and
    /// will suspend itself through the runtime once bookkeeping is done.
    ///
    /// If the queue transfers and has a holder, the holder's cached value
    /// reflects the new waiter before this returns. Waiting while already
    /// enqueued here or anywhere else is a caller bug and panics.
    pub fn wait(&mut self, q: QueueId, t: ThreadId) {
        self.ensure_thread(t);

        // A holder that re-waits on its own queue gives the resource up
        // first, so it never appears on both sides of the edge.
        if self.queues[q.index()].holder == Some(t) {
            self.queues[q.index()].holder = None;
            self.threads[t.index()].held.retain(|held| *held != q);
            self.refresh(t);
        }

        assert!(
            self.threads[t.index()].donee.is_none(),
            "{:?} waits on {:?} while already waiting elsewhere",
            t,
            q
        );
        assert!(
            !self.queues[q.index()].waiters.contains(&t),
            "{:?} is already in the wait list of {:?}",
            t,
            q
        );

        let stamp = self.next_stamp();
        let state = &mut self.threads[t.index()];
        state.stamp = stamp;
        state.donee = Some(q);
        self.queues[q.index()].waiters.push(t);
        log::trace!("[QUEUE] {:?}: {:?} waits (stamp {})", q, t, stamp);

        let (transfers, holder) = {
            let queue = &self.queues[q.index()];
            (queue.transfers, queue.holder)
        };
        if transfers {
            if let Some(holder) = holder {
                self.refresh(holder);
            }
        }
        self.check_graph();
    }

    /// Hands the free resource to `t` without queueing: the holder slot is
    /// taken, `q` joins `t`'s held set, and `t`'s cached value is brought up
    /// to date (it may have been promoted while waiting). Acquiring a held
    /// queue is a caller bug and panics.
    pub fn acquire(&mut self, q: QueueId, t: ThreadId) {
        self.ensure_thread(t);
        assert!(
            self.queues[q.index()].holder.is_none(),
            "{:?} acquires {:?} while it is held",
            t,
            q
        );
        assert!(
            !self.queues[q.index()].waiters.contains(&t),
            "{:?} acquires {:?} while waiting on it",
            t,
            q
        );

        self.queues[q.index()].holder = Some(t);
        self.threads[t.index()].held.push(q);
        if self.threads[t.index()].donee == Some(q) {
            self.threads[t.index()].donee = None;
        }
        self.refresh(t);
        log::trace!("[QUEUE] {:?}: acquired by {:?}", q, t);
        self.check_graph();
    }

    /// Releases the current holder, selects the policy's pick among the
    /// waiters, makes it the new holder and returns it. Returns `None` on an
    /// empty queue (the resource is then simply free). This is the only
    /// operation that changes an existing holder.
    pub fn next(&mut self, q: QueueId) -> Option<ThreadId> {
        if let Some(prev) = self.queues[q.index()].holder.take() {
            self.threads[prev.index()].held.retain(|held| *held != q);
            self.refresh(prev);
            log::trace!("[QUEUE] {:?}: released by {:?}", q, prev);
        }

        let candidates = self.candidates(q);
        let winner = match self.policy.pick(&candidates) {
            Some(i) => candidates[i].thread,
            None => {
                self.check_graph();
                return None;
            }
        };

        let waiters = &mut self.queues[q.index()].waiters;
        let pos = waiters.iter().position(|w| *w == winner).unwrap();
        waiters.remove(pos);
        self.acquire(q, winner);
        Some(winner)
    }

    /// The thread `next` would return, without touching the queue, any
    /// cached value or (for the lottery) the draw stream.
    pub fn peek(&self, q: QueueId) -> Option<ThreadId> {
        let candidates = self.candidates(q);
        self.policy.peek(&candidates).map(|i| candidates[i].thread)
    }

    fn candidates(&self, q: QueueId) -> Vec<Candidate> {
        self.queues[q.index()]
            .waiters
            .iter()
            .map(|&w| {
                let state = &self.threads[w.index()];
                Candidate {
                    thread: w,
                    value: state.effective,
                    stamp: state.stamp,
                }
            })
            .collect()
    }
}
