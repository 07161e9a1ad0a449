//! Effective-value maintenance over the ownership graph.
//!
//! The graph is a forest: every thread waits on at most one queue, every
//! queue has at most one holder, and a holder is never among its own
//! waiters. A thread's cached value therefore depends only on the subtree of
//! waiters below it, and a change climbs a single finite chain of holders.

use super::policy::Policy;
use super::thread::ThreadId;
use super::Scheduler;

use alloc::vec::Vec;

impl<P: Policy> Scheduler<P> {
    /// Recomputes `t`'s cached value from its base value and the waiters of
    /// every transferring queue it holds. The inputs must already be up to
    /// date. Returns whether the cached value changed.
    fn recompute(&mut self, t: ThreadId) -> bool {
        let threads = &self.threads;
        let queues = &self.queues;
        let state = &threads[t.index()];
        let value = P::fold(
            state.base,
            state
                .held
                .iter()
                .map(|q| &queues[q.index()])
                .filter(|queue| queue.transfers)
                .flat_map(|queue| queue.waiters.iter())
                .map(|&w| {
                    assert_ne!(w, t, "{:?} donates to itself", t);
                    threads[w.index()].effective
                }),
        );

        let slot = &mut self.threads[t.index()].effective;
        let changed = *slot != value;
        *slot = value;
        changed
    }

    /// Recomputes `t` eagerly and pushes any change up the chain of holders
    /// `t` is transitively donating to. Stops as soon as a recomputation
    /// leaves a value unchanged: an ancestor sees this thread only through
    /// that value. A record showing up twice means the forest has a cycle,
    /// which only a corrupted caller can produce.
    pub(crate) fn refresh(&mut self, t: ThreadId) {
        let mut visited: Vec<ThreadId> = Vec::new();
        let mut cur = t;
        loop {
            assert!(
                !visited.contains(&cur),
                "donation chain revisits {:?}",
                cur
            );
            visited.push(cur);

            if !self.recompute(cur) {
                break;
            }
            log::trace!(
                "[SCHED] {:?}: effective value now {}",
                cur,
                self.threads[cur.index()].effective
            );

            let up = match self.threads[cur.index()].donee {
                Some(q) => {
                    let queue = &self.queues[q.index()];
                    if queue.transfers {
                        queue.holder
                    } else {
                        None
                    }
                }
                None => None,
            };
            match up {
                Some(holder) => cur = holder,
                None => break,
            }
        }
    }
}
