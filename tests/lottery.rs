//! Lottery-policy scenarios: ticket transfer, the weighted draw, and the
//! ticket floor.

use queso::{Lottery, LotteryScheduler, Scheduler, ThreadId};

const A: ThreadId = ThreadId(0);
const B: ThreadId = ThreadId(1);
const C: ThreadId = ThreadId(2);

#[test]
fn tickets_add_through_a_lock() {
    let mut sched = LotteryScheduler::new();
    let lock = sched.new_queue(true);

    sched.set_priority(A, 2);
    sched.acquire(lock, A);
    sched.set_priority(B, 3);
    sched.set_priority(C, 4);
    sched.wait(lock, B);
    sched.wait(lock, C);

    // 2 of its own plus 3 + 4 donated.
    assert_eq!(sched.effective_priority(A), 9);

    let winner = sched.next(lock).unwrap();
    assert_eq!(sched.effective_priority(A), 2);

    // The survivor now donates to the winner instead.
    let loser = if winner == B { C } else { B };
    assert_eq!(
        sched.effective_priority(winner),
        sched.priority(winner) + sched.priority(loser)
    );
}

#[test]
fn tickets_add_over_two_hops() {
    let mut sched = LotteryScheduler::new();
    let l1 = sched.new_queue(true);
    let l2 = sched.new_queue(true);

    sched.set_priority(A, 2);
    sched.set_priority(B, 3);
    sched.set_priority(C, 4);
    sched.acquire(l1, A);
    sched.acquire(l2, B);
    sched.wait(l1, B);
    sched.wait(l2, C);

    assert_eq!(sched.effective_priority(B), 7);
    assert_eq!(sched.effective_priority(A), 9);

    // Dropping C's tickets shrinks both totals at once.
    sched.set_priority(C, 1);
    assert_eq!(sched.effective_priority(B), 4);
    assert_eq!(sched.effective_priority(A), 6);
}

#[test]
fn draw_frequency_tracks_ticket_share() {
    let mut sched = Scheduler::with_policy(Lottery::new(0xC0FFEE));
    let queue = sched.new_queue(true);
    sched.set_priority(B, 3);
    sched.set_priority(C, 4);

    const TRIALS: u32 = 10_000;
    let mut b_wins = 0u32;
    for _ in 0..TRIALS {
        sched.wait(queue, B);
        sched.wait(queue, C);
        if sched.next(queue).unwrap() == B {
            b_wins += 1;
        }
        // Drain the queue so the next trial starts from scratch.
        sched.next(queue).unwrap();
        assert_eq!(sched.next(queue), None);
    }

    let share = f64::from(b_wins) / f64::from(TRIALS);
    let expected = 3.0 / 7.0;
    assert!(
        (share - expected).abs() < 0.03,
        "B won {} of {} draws ({:.3}); expected about {:.3}",
        b_wins,
        TRIALS,
        share,
        expected
    );
}

#[test]
fn peek_agrees_with_itself_and_with_next() {
    let mut sched = Scheduler::with_policy(Lottery::new(42));
    let queue = sched.new_queue(true);
    sched.set_priority(B, 3);
    sched.set_priority(C, 4);
    sched.wait(queue, B);
    sched.wait(queue, C);

    let peeked = sched.peek(queue);
    for _ in 0..10 {
        assert_eq!(sched.peek(queue), peeked);
    }
    assert_eq!(sched.next(queue), peeked);
}

#[test]
fn same_seed_same_schedule() {
    let mut runs = Vec::new();
    for _ in 0..2 {
        let mut sched = Scheduler::with_policy(Lottery::new(7));
        let queue = sched.new_queue(true);
        sched.set_priority(A, 5);
        sched.set_priority(B, 3);
        sched.set_priority(C, 4);

        let mut order = Vec::new();
        sched.wait(queue, A);
        sched.wait(queue, B);
        sched.wait(queue, C);
        while let Some(t) = sched.next(queue) {
            order.push(t);
        }
        runs.push(order);
    }
    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[0].len(), 3);
}

#[test]
fn non_transferring_queue_moves_no_tickets() {
    let mut sched = LotteryScheduler::new();
    let queue = sched.new_queue(false);

    sched.set_priority(A, 2);
    sched.acquire(queue, A);
    sched.set_priority(B, 6);
    sched.wait(queue, B);
    assert_eq!(sched.effective_priority(A), 2);
}

#[test]
fn lazy_records_start_with_one_ticket() {
    let mut sched = LotteryScheduler::new();
    assert_eq!(sched.priority(ThreadId(5)), 1);
    assert_eq!(sched.effective_priority(ThreadId(5)), 1);
}

#[test]
fn increase_clamps_at_the_ticket_cap() {
    let mut sched = LotteryScheduler::new();
    sched.set_priority(A, u64::from(u32::MAX));
    assert!(!sched.increase_priority(A));
    assert_eq!(sched.priority(A), u64::from(u32::MAX));
}

#[test]
fn decrease_clamps_at_one_ticket() {
    let mut sched = LotteryScheduler::new();
    assert!(!sched.decrease_priority(A));
    assert_eq!(sched.priority(A), 1);
}

#[test]
#[should_panic]
fn zero_tickets_is_fatal() {
    let mut sched = LotteryScheduler::new();
    sched.set_priority(A, 0);
}
