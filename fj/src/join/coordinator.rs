//! Join coordinator - run two producers as tasks and settle once

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::outcome::JoinOutcome;
use super::producer::Producer;

/// What a settled join delivers to the awaiting task
enum Settled<A, B, E> {
    Outcome(JoinOutcome<A, B, E>),
    Panicked(Box<dyn Any + Send>),
}

/// Shared settlement state for one join
///
/// The outcome sender doubles as the settled flag: once it has been taken the
/// join is settled and every later branch result is discarded.
struct Settlement<A, B, E> {
    a: Option<A>,
    b: Option<B>,
    tx: Option<oneshot::Sender<Settled<A, B, E>>>,
}

impl<A, B, E> Settlement<A, B, E> {
    fn new(tx: oneshot::Sender<Settled<A, B, E>>) -> Self {
        Self { a: None, b: None, tx: Some(tx) }
    }

    fn is_settled(&self) -> bool {
        self.tx.is_none()
    }

    /// Record the first producer's result; returns true if this call settled the join
    fn settle_a(&mut self, result: Result<A, E>) -> bool {
        if self.is_settled() {
            debug!(ok = result.is_ok(), "Settlement::settle_a: already settled, discarding");
            return false;
        }
        match result {
            Ok(a) => {
                self.a = Some(a);
                self.try_complete()
            }
            Err(e) => self.deliver(Settled::Outcome(JoinOutcome::Failure(e))),
        }
    }

    /// Record the second producer's result; returns true if this call settled the join
    fn settle_b(&mut self, result: Result<B, E>) -> bool {
        if self.is_settled() {
            debug!(ok = result.is_ok(), "Settlement::settle_b: already settled, discarding");
            return false;
        }
        match result {
            Ok(b) => {
                self.b = Some(b);
                self.try_complete()
            }
            Err(e) => self.deliver(Settled::Outcome(JoinOutcome::Failure(e))),
        }
    }

    /// Record a producer panic; settles like a failure
    fn panicked(&mut self, payload: Box<dyn Any + Send>) -> bool {
        if self.is_settled() {
            debug!("Settlement::panicked: already settled, discarding panic");
            return false;
        }
        self.deliver(Settled::Panicked(payload))
    }

    fn try_complete(&mut self) -> bool {
        if self.a.is_none() || self.b.is_none() {
            return false;
        }
        let (Some(a), Some(b)) = (self.a.take(), self.b.take()) else {
            return false;
        };
        debug!("Settlement::try_complete: both branches succeeded");
        self.deliver(Settled::Outcome(JoinOutcome::Success(a, b)))
    }

    fn deliver(&mut self, settled: Settled<A, B, E>) -> bool {
        let Some(tx) = self.tx.take() else {
            return false;
        };
        self.a = None;
        self.b = None;
        // Receiver gone means the caller stopped waiting; nothing to deliver to
        let _ = tx.send(settled);
        true
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Branch panics are caught outside the lock, so poisoning only means a panic inside settlement itself
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run two producers concurrently and combine their results
///
/// Both producers are spawned onto the current tokio runtime before this
/// function returns, so they are already running when the returned future is
/// first awaited. The join is **fail-fast**: the first failure settles it
/// immediately. The other producer is not cancelled; its result is discarded
/// when it arrives. With both producers succeeding the outcome pairs the
/// values by position, whatever order they finished in.
///
/// There is no internal timeout. If a producer never settles and the other
/// never fails, neither does the join; wrap it in `tokio::time::timeout` when
/// a bound is needed.
///
/// A producer panic settles the join like a failure would: if it is the first
/// settling event, the panic is resumed on the task awaiting the outcome,
/// whatever the other producer is doing. A panic after settlement is discarded.
///
/// # Panics
///
/// Must be called from within a tokio runtime.
pub fn join_two<PA, PB, E>(producer_a: PA, producer_b: PB) -> impl Future<Output = JoinOutcome<PA::Output, PB::Output, E>>
where
    PA: Producer<Error = E> + 'static,
    PB: Producer<Error = E> + 'static,
    PA::Output: 'static,
    PB::Output: 'static,
    E: Send + 'static,
{
    debug!("join_two: called");
    let (tx, rx) = oneshot::channel();
    let settlement = Arc::new(Mutex::new(Settlement::new(tx)));

    {
        let settlement = Arc::clone(&settlement);
        tokio::spawn(async move {
            match AssertUnwindSafe(producer_a.produce()).catch_unwind().await {
                Ok(result) => {
                    debug!(ok = result.is_ok(), "join_two: branch a finished");
                    lock(&settlement).settle_a(result);
                }
                Err(payload) => {
                    warn!("join_two: branch a panicked");
                    lock(&settlement).panicked(payload);
                }
            }
        });
    }

    tokio::spawn(async move {
        match AssertUnwindSafe(producer_b.produce()).catch_unwind().await {
            Ok(result) => {
                debug!(ok = result.is_ok(), "join_two: branch b finished");
                lock(&settlement).settle_b(result);
            }
            Err(payload) => {
                warn!("join_two: branch b panicked");
                lock(&settlement).panicked(payload);
            }
        }
    });

    async move {
        match rx.await {
            Ok(Settled::Outcome(outcome)) => {
                debug!(success = outcome.is_success(), "join_two: settled");
                outcome
            }
            Ok(Settled::Panicked(payload)) => std::panic::resume_unwind(payload),
            Err(_) => {
                // Both branch tasks were dropped unsettled, which only happens on runtime shutdown
                warn!("join_two: producers cancelled before settling, outcome will never arrive");
                std::future::pending().await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    use proptest::prelude::*;
    use tokio::time::{Instant, sleep};

    use super::*;
    use crate::join::producer::from_fn;

    #[derive(Debug, Clone, PartialEq)]
    struct User {
        id: i64,
        username: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Post {
        id: i64,
        title: String,
    }

    fn delayed<T>(ms: u64, result: Result<T, String>) -> impl Producer<Output = T, Error = String>
    where
        T: Clone + Send + Sync + 'static,
    {
        from_fn(move || {
            let result = result.clone();
            async move {
                sleep(Duration::from_millis(ms)).await;
                result
            }
        })
    }

    fn delivered<A, B, E>(rx: &mut oneshot::Receiver<Settled<A, B, E>>) -> JoinOutcome<A, B, E> {
        match rx.try_recv() {
            Ok(Settled::Outcome(outcome)) => outcome,
            Ok(Settled::Panicked(_)) => panic!("unexpected panic delivered"),
            Err(e) => panic!("nothing delivered: {:?}", e),
        }
    }

    fn never<T: Send + 'static>() -> impl Producer<Output = T, Error = String> {
        from_fn(|| std::future::pending::<Result<T, String>>())
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_pairs_users_and_posts_concurrently() {
        let users = vec![User {
            id: 1,
            username: "bret".to_string(),
        }];
        let posts = vec![Post {
            id: 1,
            title: "hello".to_string(),
        }];

        let start = Instant::now();
        let outcome = join_two(delayed(10, Ok(users.clone())), delayed(5, Ok(posts.clone()))).await;
        let elapsed = start.elapsed();

        assert_eq!(outcome, JoinOutcome::Success(users, posts));
        assert!(elapsed >= Duration::from_millis(10), "settled too early: {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(15), "producers ran sequentially: {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_preserves_position_when_a_finishes_first() {
        let outcome = join_two(delayed(1, Ok("a")), delayed(20, Ok(2u8))).await;
        assert_eq!(outcome, JoinOutcome::Success("a", 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_preserves_position_when_b_finishes_first() {
        let outcome = join_two(delayed(20, Ok("a")), delayed(1, Ok(2u8))).await;
        assert_eq!(outcome, JoinOutcome::Success("a", 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_fails_fast_on_a_without_waiting_for_b() {
        let start = Instant::now();
        let outcome = join_two(delayed::<u8>(5, Err("a broke".to_string())), delayed(3_600_000, Ok(1u8))).await;

        assert_eq!(outcome, JoinOutcome::Failure("a broke".to_string()));
        assert!(start.elapsed() < Duration::from_secs(1), "waited for b: {:?}", start.elapsed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_fails_fast_on_a_while_b_pending_forever() {
        let outcome = join_two(delayed::<u8>(5, Err("a broke".to_string())), never::<u8>()).await;
        assert_eq!(outcome, JoinOutcome::Failure("a broke".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_fails_on_b_after_a_succeeded() {
        let outcome = join_two(delayed(1, Ok(1u8)), delayed::<u8>(10, Err("b broke".to_string()))).await;
        assert_eq!(outcome, JoinOutcome::Failure("b broke".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_fails_on_b_while_a_pending() {
        let start = Instant::now();
        let outcome = join_two(never::<u8>(), delayed::<u8>(7, Err("b broke".to_string()))).await;

        assert_eq!(outcome, JoinOutcome::Failure("b broke".to_string()));
        assert!(start.elapsed() >= Duration::from_millis(7));
        assert!(start.elapsed() < Duration::from_millis(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_both_fail_reports_first_to_settle() {
        let outcome = join_two(
            delayed::<u8>(5, Err("a".to_string())),
            delayed::<u8>(10, Err("b".to_string())),
        )
        .await;
        assert_eq!(outcome, JoinOutcome::Failure("a".to_string()));

        let outcome = join_two(
            delayed::<u8>(10, Err("a".to_string())),
            delayed::<u8>(5, Err("b".to_string())),
        )
        .await;
        assert_eq!(outcome, JoinOutcome::Failure("b".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_does_not_cancel_losing_branch() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let slow = from_fn(move || {
            let flag = Arc::clone(&flag);
            async move {
                sleep(Duration::from_millis(20)).await;
                flag.store(true, Ordering::SeqCst);
                Ok::<_, String>(1u8)
            }
        });

        let outcome = join_two(delayed::<u8>(5, Err("fast failure".to_string())), slow).await;
        assert!(outcome.is_failure());
        assert!(!finished.load(Ordering::SeqCst));

        sleep(Duration::from_millis(30)).await;
        assert!(finished.load(Ordering::SeqCst), "losing branch should run to completion");
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_invokes_each_producer_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let producer = |calls: Arc<AtomicUsize>| {
            from_fn(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, String>(()) }
            })
        };

        let outcome = join_two(producer(Arc::clone(&calls)), producer(Arc::clone(&calls))).await;
        assert!(outcome.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_never_settles_without_a_settling_producer() {
        let join = join_two(never::<u8>(), delayed(1, Ok(1u8)));
        let result = tokio::time::timeout(Duration::from_secs(60), join).await;
        assert!(result.is_err(), "join should still be pending");
    }

    #[tokio::test]
    async fn test_join_starts_producers_before_first_poll() {
        let started = Arc::new(AtomicUsize::new(0));
        let producer = |started: Arc<AtomicUsize>| {
            from_fn(move || {
                started.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, String>(()) }
            })
        };

        let join = join_two(producer(Arc::clone(&started)), producer(Arc::clone(&started)));
        // Yield to let the spawned branches run without polling the join yet
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(started.load(Ordering::SeqCst), 2);
        assert!(join.await.is_success());
    }

    #[tokio::test]
    #[should_panic(expected = "producer exploded")]
    async fn test_join_resumes_producer_panic() {
        let exploding = from_fn(|| async {
            if true {
                panic!("producer exploded");
            }
            Ok::<u8, String>(0)
        });
        let _ = join_two(exploding, from_fn(|| async { Ok::<_, String>(1u8) })).await;
    }

    #[tokio::test(start_paused = true)]
    #[should_panic(expected = "producer exploded")]
    async fn test_join_resumes_panic_before_later_failure() {
        let exploding = from_fn(|| async {
            if true {
                panic!("producer exploded");
            }
            Ok::<u8, String>(0)
        });
        let _ = join_two(exploding, delayed::<u8>(10, Err("b broke".to_string()))).await;
    }

    #[tokio::test(start_paused = true)]
    #[should_panic(expected = "producer exploded")]
    async fn test_join_resumes_panic_while_other_pending() {
        let exploding = from_fn(|| async {
            if true {
                panic!("producer exploded");
            }
            Ok::<u8, String>(0)
        });
        let join = join_two(never::<u8>(), exploding);
        let _ = tokio::time::timeout(Duration::from_secs(60), join).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_discards_panic_after_failure() {
        let late_panic = from_fn(|| async {
            sleep(Duration::from_millis(10)).await;
            if true {
                panic!("late panic");
            }
            Ok::<u8, String>(0)
        });

        let outcome = join_two(delayed::<u8>(5, Err("a broke".to_string())), late_panic).await;
        assert_eq!(outcome, JoinOutcome::Failure("a broke".to_string()));

        // Let the losing branch panic; it must not reach this task
        sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_join_simultaneous_failures_settle_once() {
        for _ in 0..200 {
            let gate = Arc::new(tokio::sync::Barrier::new(2));
            let failing = |name: &'static str, gate: Arc<tokio::sync::Barrier>| {
                from_fn(move || {
                    let gate = Arc::clone(&gate);
                    async move {
                        gate.wait().await;
                        Err::<u8, _>(name.to_string())
                    }
                })
            };

            let outcome = join_two(failing("a", Arc::clone(&gate)), failing("b", gate)).await;
            match outcome {
                JoinOutcome::Failure(e) => assert!(e == "a" || e == "b", "unexpected error {}", e),
                JoinOutcome::Success(..) => panic!("expected a failure"),
            }
        }
    }

    #[test]
    fn test_settlement_race_settles_exactly_once() {
        for _ in 0..500 {
            let (tx, mut rx) = oneshot::channel::<Settled<u8, u8, &'static str>>();
            let settlement = Arc::new(Mutex::new(Settlement::new(tx)));
            let barrier = Arc::new(Barrier::new(2));

            let thread_a = {
                let settlement = Arc::clone(&settlement);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    lock(&settlement).settle_a(Err("a"))
                })
            };
            let thread_b = {
                let settlement = Arc::clone(&settlement);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    lock(&settlement).settle_b(Err("b"))
                })
            };

            let settled_a = thread_a.join().expect("thread a panicked");
            let settled_b = thread_b.join().expect("thread b panicked");
            assert!(settled_a ^ settled_b, "exactly one branch must settle");

            let outcome = delivered(&mut rx);
            let expected = if settled_a { "a" } else { "b" };
            assert_eq!(outcome, JoinOutcome::Failure(expected));
        }
    }

    #[test]
    fn test_settlement_ignores_results_after_failure() {
        let (tx, mut rx) = oneshot::channel::<Settled<u8, u8, &'static str>>();
        let mut settlement = Settlement::new(tx);

        assert!(!settlement.settle_a(Ok(1)));
        assert!(settlement.settle_b(Err("b")));
        assert!(settlement.is_settled());
        assert!(!settlement.settle_a(Err("late")));
        assert!(!settlement.settle_b(Ok(2)));

        assert_eq!(delivered(&mut rx), JoinOutcome::Failure("b"));
    }

    #[test]
    fn test_settlement_success_requires_both_slots() {
        let (tx, mut rx) = oneshot::channel::<Settled<u8, char, ()>>();
        let mut settlement = Settlement::new(tx);

        assert!(!settlement.settle_b(Ok('b')));
        assert!(!settlement.is_settled());
        assert!(rx.try_recv().is_err());

        assert!(settlement.settle_a(Ok(7)));
        assert_eq!(delivered(&mut rx), JoinOutcome::Success(7, 'b'));
    }

    #[test]
    fn test_settlement_panic_settles_once() {
        let (tx, mut rx) = oneshot::channel::<Settled<u8, u8, &'static str>>();
        let mut settlement = Settlement::new(tx);

        assert!(settlement.panicked(Box::new("boom")));
        assert!(!settlement.settle_b(Err("late")));
        assert!(!settlement.panicked(Box::new("again")));

        match rx.try_recv() {
            Ok(Settled::Panicked(payload)) => assert_eq!(payload.downcast_ref::<&str>(), Some(&"boom")),
            _ => panic!("expected the first panic to be delivered"),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_join_pairs_by_position(a: i64, b: String, delay_a in 0u64..50, delay_b in 0u64..50) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .start_paused(true)
                .build()
                .expect("runtime");

            let outcome = rt.block_on(async { join_two(delayed(delay_a, Ok(a)), delayed(delay_b, Ok(b.clone()))).await });
            prop_assert_eq!(outcome, JoinOutcome::Success(a, b));
        }
    }
}
