//! Ticket-sum donation with a weighted random draw.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

use super::{Candidate, Policy};

/// Probabilistic lottery policy.
///
/// Donation adds ticket counts instead of taking a maximum: a holder runs
/// with its own tickets plus everything its waiters (transitively) hold.
/// Selection draws a uniform winner over the waiters' effective tickets, so
/// a waiter's chance is exactly its share of the total. Ticket counts can
/// run into the billions, so only per-thread totals are kept, never
/// per-ticket state.
///
/// The generator is seeded explicitly and the draw stream advances only on
/// [`Policy::pick`]; the target environment has no entropy source.
#[derive(Debug)]
pub struct Lottery {
    rng: Pcg64Mcg,
}

impl Lottery {
    pub fn new(seed: u64) -> Self {
        Lottery {
            rng: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    fn draw(rng: &mut Pcg64Mcg, waiters: &[Candidate]) -> Option<usize> {
        if waiters.is_empty() {
            return None;
        }
        let total = waiters.iter().fold(0u64, |sum, c| {
            sum.checked_add(c.value).expect("ticket total overflows u64")
        });
        assert!(total > 0, "lottery queue with zero tickets");

        let mut r = rng.gen_range(0..total);
        for (i, c) in waiters.iter().enumerate() {
            if r < c.value {
                return Some(i);
            }
            r -= c.value;
        }
        unreachable!("draw landed past the ticket total");
    }
}

impl Default for Lottery {
    /// A fixed seed; kernels that want run-to-run variation pass their own
    /// through [`Lottery::new`].
    fn default() -> Self {
        Lottery::new(0)
    }
}

impl Policy for Lottery {
    /// Every thread keeps at least one ticket, so no draw can be empty.
    const MIN: u64 = 1;
    const MAX: u64 = u32::MAX as u64;
    const DEFAULT: u64 = 1;

    fn fold<I: Iterator<Item = u64>>(base: u64, donors: I) -> u64 {
        donors.fold(base, |sum, tickets| {
            sum.checked_add(tickets)
                .expect("ticket total overflows u64")
        })
    }

    fn pick(&mut self, waiters: &[Candidate]) -> Option<usize> {
        Self::draw(&mut self.rng, waiters)
    }

    /// Draws against a clone of the generator: repeated peeks agree with
    /// each other and with the `next` that eventually commits.
    fn peek(&self, waiters: &[Candidate]) -> Option<usize> {
        let mut rng = self.rng.clone();
        Self::draw(&mut rng, waiters)
    }
}
