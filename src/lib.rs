//! # Resource-queue scheduling with priority donation
//!
//! This crate is the scheduler core of a cooperative kernel: an ordered
//! waiting-set bound to a resource such as a lock or a join target, together
//! with the bookkeeping that propagates scheduling weight from waiters to
//! the thread holding the resource, so a low-priority holder cannot starve
//! a high-priority waiter.
//!
//! Two selection policies share one queue shape:
//!
//! - [`Priority`]: donation takes the maximum, selection prefers the highest
//!   effective priority and breaks ties round-robin by arrival order.
//! - [`Lottery`]: donation sums ticket counts, selection holds a weighted
//!   random draw over the waiters' effective tickets.
//!
//! The scheduler never blocks and never switches threads itself. Callers
//! (lock, join and condition-variable implementations) do their queue
//! bookkeeping here, then suspend or wake threads through the thread
//! runtime's own primitives. At most one piece of scheduling logic runs at a
//! time; the `&mut` receiver on every operation is that exclusion, which in
//! the kernel is the interrupt-disable critical section.
//!
//! ## Usage
//!
//! ```
//! use queso::{PriorityScheduler, ThreadId};
//!
//! let mut sched = PriorityScheduler::new();
//! let lock = sched.new_queue(true);
//! let (a, b) = (ThreadId(0), ThreadId(1));
//!
//! // A holds the lock; B arrives with a higher priority.
//! sched.acquire(lock, a);
//! sched.set_priority(b, 5);
//! sched.wait(lock, b);
//!
//! // B's priority reaches A through the lock.
//! assert_eq!(sched.effective_priority(a), 5);
//!
//! // Handing the lock to B takes the donation back.
//! assert_eq!(sched.next(lock), Some(b));
//! assert_eq!(sched.effective_priority(a), 1);
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod sched;

pub use self::sched::policy::{Candidate, Lottery, Policy, Priority};
pub use self::sched::queue::QueueId;
pub use self::sched::thread::ThreadId;
pub use self::sched::{LotteryScheduler, PriorityScheduler, Scheduler};
