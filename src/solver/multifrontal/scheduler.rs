use super::assembly::{AssemblyTree, FrontStatus};
use crate::algebra::FloatT;
use crate::solver::{SolverError, SolverSettings};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

/// Dependency structure walked by the scheduler.
pub trait TaskGraph: Sync {
    fn len(&self) -> usize;
    /// tasks that must finish before `id` may start
    fn dependencies(&self, id: usize) -> &[usize];
    /// tasks released (in part) by the completion of `id`
    fn dependents(&self, id: usize) -> &[usize];
}

impl TaskGraph for AssemblyTree {
    fn len(&self) -> usize {
        AssemblyTree::len(self)
    }
    fn dependencies(&self, id: usize) -> &[usize] {
        &self.front(id).dependencies
    }
    fn dependents(&self, id: usize) -> &[usize] {
        &self.front(id).dependents
    }
}

/// A graph with every edge reversed, for top-down sweeps.
pub struct Reversed<'a, G>(pub &'a G);

impl<G: TaskGraph> TaskGraph for Reversed<'_, G> {
    fn len(&self) -> usize {
        self.0.len()
    }
    fn dependencies(&self, id: usize) -> &[usize] {
        self.0.dependents(id)
    }
    fn dependents(&self, id: usize) -> &[usize] {
        self.0.dependencies(id)
    }
}

/// Work done for one front once all of its dependencies are complete.
pub trait FrontTask: Sync {
    type Output: Send + Sync;
    fn run(
        &self,
        id: usize,
        completed: &CompletedFronts<'_, Self::Output>,
    ) -> Result<Self::Output, SolverError>;
}

/// Read access to the results published so far.
pub struct CompletedFronts<'a, O> {
    slots: &'a [OnceLock<O>],
}

impl<'a, O> CompletedFronts<'a, O> {
    pub fn new(slots: &'a [OnceLock<O>]) -> Self {
        Self { slots }
    }

    /// The result of front `id`, if it has been published.
    pub fn get(&self, id: usize) -> Option<&'a O> {
        self.slots.get(id).and_then(OnceLock::get)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    Claimed(usize),
    Completed(usize),
}

/// Claim and completion events of one run, in the order they were
/// recorded under the scheduler lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerTrace {
    events: Vec<TraceEvent>,
}

impl SchedulerTrace {
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// True if every task was claimed exactly once and only after all of
    /// its dependencies had completed.
    pub fn respects_dependencies<G: TaskGraph>(&self, graph: &G) -> bool {
        let mut done = vec![false; graph.len()];
        let mut claimed = vec![false; graph.len()];
        for event in &self.events {
            match *event {
                TraceEvent::Claimed(id) => {
                    if claimed[id] || !graph.dependencies(id).iter().all(|&d| done[d]) {
                        return false;
                    }
                    claimed[id] = true;
                }
                TraceEvent::Completed(id) => {
                    if !claimed[id] || done[id] {
                        return false;
                    }
                    done[id] = true;
                }
            }
        }
        done.into_iter().all(|d| d)
    }
}

/// Results of a successful scheduled run.
#[derive(Debug)]
pub struct ScheduleOutcome<O> {
    /// one output per task, indexed by task id
    pub outputs: Vec<O>,
    /// the order in which tasks completed
    pub order: Vec<usize>,
    pub trace: Option<SchedulerTrace>,
    pub workers: usize,
}

struct SchedulerState {
    status: Vec<FrontStatus>,
    pending: Vec<usize>,
    ready: VecDeque<usize>,
    running: usize,
    completed: usize,
    order: Vec<usize>,
    abort: bool,
    error: Option<SolverError>,
    trace: Option<Vec<TraceEvent>>,
}

impl SchedulerState {
    fn fail(&mut self, error: SolverError) {
        self.abort = true;
        // first observed error wins
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

struct Shared<'a, G, K: FrontTask> {
    graph: &'a G,
    task: &'a K,
    state: Mutex<SchedulerState>,
    wake: Condvar,
    slots: Vec<OnceLock<K::Output>>,
    wait: Duration,
}

impl<G: TaskGraph, K: FrontTask> Shared<'_, G, K> {
    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Take a ready task, or None when the run is finished or aborted.
    fn claim(&self) -> Option<usize> {
        let n = self.graph.len();
        let mut st = self.lock();
        loop {
            if st.abort || st.completed == n {
                return None;
            }
            if let Some(id) = st.ready.pop_front() {
                st.status[id] = FrontStatus::Running;
                st.running += 1;
                if let Some(trace) = st.trace.as_mut() {
                    trace.push(TraceEvent::Claimed(id));
                }
                return Some(id);
            }
            if st.running == 0 {
                // nothing can ever become ready
                let stuck = st
                    .status
                    .iter()
                    .position(|&s| s == FrontStatus::Pending)
                    .unwrap_or(0);
                st.fail(SolverError::ConcurrencyAbort {
                    front: stuck,
                    reason: "no task is ready and none is running".to_string(),
                });
                self.wake.notify_all();
                return None;
            }
            let (guard, _) = self
                .wake
                .wait_timeout(st, self.wait)
                .unwrap_or_else(PoisonError::into_inner);
            st = guard;
        }
    }

    fn complete(&self, id: usize, result: std::thread::Result<Result<K::Output, SolverError>>) {
        let mut st = self.lock();
        st.running -= 1;
        match result {
            Ok(Ok(output)) => {
                // published before Done is visible to anyone
                let _ = self.slots[id].set(output);
                st.status[id] = FrontStatus::Done;
                st.completed += 1;
                st.order.push(id);
                if let Some(trace) = st.trace.as_mut() {
                    trace.push(TraceEvent::Completed(id));
                }
                for &d in self.graph.dependents(id) {
                    st.pending[d] -= 1;
                    if st.pending[d] == 0 {
                        st.status[d] = FrontStatus::Ready;
                        st.ready.push_back(d);
                    }
                }
            }
            Ok(Err(error)) => {
                log::debug!("front {} failed: {}", id, error);
                st.fail(error);
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                log::warn!("worker panicked on front {}: {}", id, reason);
                st.fail(SolverError::ConcurrencyAbort { front: id, reason });
            }
        }
        drop(st);
        self.wake.notify_all();
    }

    fn worker(&self, worker: usize) {
        log::debug!("scheduler worker {} started", worker);
        let mut processed = 0usize;
        while let Some(id) = self.claim() {
            let completed = CompletedFronts::new(&self.slots);
            let result = catch_unwind(AssertUnwindSafe(|| self.task.run(id, &completed)));
            self.complete(id, result);
            processed += 1;
        }
        log::debug!("scheduler worker {} exiting after {} fronts", worker, processed);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Dependency-aware worker pool processing the fronts of a task graph.
///
/// A front is claimed only after all of its dependencies are done.  Claims
/// and completions go through one mutex and idle workers park on one
/// condition variable with a bounded wait.  The first error raised by any
/// front aborts the run and is returned.
#[derive(Debug, Clone)]
pub struct ParallelFrontScheduler {
    max_threads: usize,
    wait: Duration,
    trace: bool,
}

impl Default for ParallelFrontScheduler {
    fn default() -> Self {
        Self::new(0, 10, false)
    }
}

impl ParallelFrontScheduler {
    /// `max_threads = 0` uses the available hardware concurrency.
    pub fn new(max_threads: u32, wait_ms: u64, trace: bool) -> Self {
        Self {
            max_threads: max_threads as usize,
            wait: Duration::from_millis(wait_ms.max(1)),
            trace,
        }
    }

    pub fn from_settings<T: FloatT>(settings: &SolverSettings<T>) -> Self {
        Self::new(
            settings.max_threads,
            settings.scheduler_wait_ms,
            settings.trace_scheduling,
        )
    }

    /// Number of workers used for a graph of `ntasks` tasks.
    pub fn num_workers(&self, ntasks: usize) -> usize {
        let requested = if self.max_threads == 0 {
            std::thread::available_parallelism().map_or(1, |n| n.get())
        } else {
            self.max_threads
        };
        requested.max(1).min(ntasks.max(1))
    }

    /// Run `task` on every node of `graph` respecting its dependencies.
    pub fn run<G, K>(&self, graph: &G, task: &K) -> Result<ScheduleOutcome<K::Output>, SolverError>
    where
        G: TaskGraph,
        K: FrontTask,
    {
        let n = graph.len();
        let workers = self.num_workers(n);

        let pending: Vec<usize> = (0..n).map(|id| graph.dependencies(id).len()).collect();
        let ready: VecDeque<usize> = (0..n).filter(|&id| pending[id] == 0).collect();
        let status = pending
            .iter()
            .map(|&p| {
                if p == 0 {
                    FrontStatus::Ready
                } else {
                    FrontStatus::Pending
                }
            })
            .collect();

        let shared = Shared {
            graph,
            task,
            state: Mutex::new(SchedulerState {
                status,
                pending,
                ready,
                running: 0,
                completed: 0,
                order: Vec::with_capacity(n),
                abort: false,
                error: None,
                trace: self.trace.then(Vec::new),
            }),
            wake: Condvar::new(),
            slots: (0..n).map(|_| OnceLock::new()).collect(),
            wait: self.wait,
        };

        log::debug!("scheduling {} fronts on {} worker(s)", n, workers);

        if workers == 1 {
            shared.worker(0);
        } else {
            let shared = &shared;
            std::thread::scope(|s| {
                for w in 0..workers {
                    s.spawn(move || shared.worker(w));
                }
            });
        }

        let Shared { state, slots, .. } = shared;
        let st = state.into_inner().unwrap_or_else(PoisonError::into_inner);
        if let Some(error) = st.error {
            return Err(error);
        }

        let outputs = slots
            .into_iter()
            .enumerate()
            .map(|(id, slot)| {
                slot.into_inner().ok_or_else(|| SolverError::ConcurrencyAbort {
                    front: id,
                    reason: "front finished without a result".to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ScheduleOutcome {
            outputs,
            order: st.order,
            trace: st.trace.map(|events| SchedulerTrace { events }),
            workers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // explicit graph for testing: deps[i] and the derived dependents
    struct Graph {
        deps: Vec<Vec<usize>>,
        dependents: Vec<Vec<usize>>,
    }

    impl Graph {
        fn new(deps: Vec<Vec<usize>>) -> Self {
            let mut dependents = vec![Vec::new(); deps.len()];
            for (i, d) in deps.iter().enumerate() {
                for &j in d {
                    dependents[j].push(i);
                }
            }
            Self { deps, dependents }
        }
    }

    impl TaskGraph for Graph {
        fn len(&self) -> usize {
            self.deps.len()
        }
        fn dependencies(&self, id: usize) -> &[usize] {
            &self.deps[id]
        }
        fn dependents(&self, id: usize) -> &[usize] {
            &self.dependents[id]
        }
    }

    struct Unit;

    impl FrontTask for Unit {
        type Output = usize;
        fn run(&self, _id: usize, _: &CompletedFronts<'_, usize>) -> Result<usize, SolverError> {
            Ok(1)
        }
    }

    // each task sums its dependencies' outputs plus one
    struct SumTask<'a>(&'a Graph);

    impl FrontTask for SumTask<'_> {
        type Output = usize;
        fn run(&self, id: usize, completed: &CompletedFronts<'_, usize>) -> Result<usize, SolverError> {
            let mut total = 1;
            for &d in self.0.dependencies(id) {
                total += completed.get(d).copied().ok_or(SolverError::NotFactorized)?;
            }
            Ok(total)
        }
    }

    fn binary_tree() -> Graph {
        // leaves 0..4, internal 4,5, root 6
        Graph::new(vec![
            vec![],
            vec![],
            vec![],
            vec![],
            vec![0, 1],
            vec![2, 3],
            vec![4, 5],
        ])
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let graph = binary_tree();
        for threads in [1, 2, 4, 8] {
            let scheduler = ParallelFrontScheduler::new(threads, 1, true);
            let out = scheduler.run(&graph, &SumTask(&graph)).unwrap();
            assert_eq!(out.outputs, vec![1, 1, 1, 1, 3, 3, 7]);
            assert_eq!(out.order.len(), 7);
            assert_eq!(out.workers, threads.min(7) as usize);
            assert!(out.trace.unwrap().respects_dependencies(&graph));
        }
    }

    #[test]
    fn test_single_worker_order() {
        let graph = binary_tree();
        let scheduler = ParallelFrontScheduler::new(1, 1, false);
        let out = scheduler.run(&graph, &SumTask(&graph)).unwrap();
        assert_eq!(out.order, vec![0, 1, 2, 3, 4, 5, 6]);
        assert!(out.trace.is_none());
    }

    #[test]
    fn test_reversed_graph() {
        let graph = binary_tree();
        let reversed = Reversed(&graph);
        let scheduler = ParallelFrontScheduler::new(3, 1, true);
        let out = scheduler.run(&reversed, &Unit).unwrap();
        assert_eq!(out.order[0], 6);
        assert!(out.trace.unwrap().respects_dependencies(&reversed));
    }

    struct Failing {
        calls: AtomicUsize,
        error_at: Option<usize>,
        panic_at: Option<usize>,
    }

    impl Failing {
        fn new(error_at: Option<usize>, panic_at: Option<usize>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                error_at,
                panic_at,
            }
        }
    }

    impl FrontTask for Failing {
        type Output = ();
        fn run(&self, id: usize, _: &CompletedFronts<'_, ()>) -> Result<(), SolverError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if Some(id) == self.panic_at {
                panic!("boom");
            }
            if Some(id) == self.error_at {
                return Err(SolverError::SingularPivot {
                    variable: id,
                    value: 0.0,
                });
            }
            Ok(())
        }
    }

    #[test]
    fn test_first_error_aborts_run() {
        let graph = binary_tree();
        let task = Failing::new(Some(4), None);
        let err = ParallelFrontScheduler::new(1, 1, false)
            .run(&graph, &task)
            .unwrap_err();
        assert_eq!(
            err,
            SolverError::SingularPivot {
                variable: 4,
                value: 0.0
            }
        );
        // leaves 0..4 then front 4; the root is never reached
        assert_eq!(task.calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_error_with_many_workers() {
        let graph = binary_tree();
        let task = Failing::new(Some(2), None);
        let err = ParallelFrontScheduler::new(4, 1, true)
            .run(&graph, &task)
            .unwrap_err();
        assert_eq!(err.kind(), crate::solver::ErrorKind::Numeric);
        // front 5 depends on 2, so neither it nor the root ran
        assert!(task.calls.load(Ordering::SeqCst) <= 5);
    }

    #[test]
    fn test_panic_becomes_concurrency_abort() {
        let graph = binary_tree();
        for threads in [1, 3] {
            let task = Failing::new(None, Some(5));
            let err = ParallelFrontScheduler::new(threads, 1, false)
                .run(&graph, &task)
                .unwrap_err();
            match err {
                SolverError::ConcurrencyAbort { front, reason } => {
                    assert_eq!(front, 5);
                    assert_eq!(reason, "boom");
                }
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn test_num_workers() {
        assert_eq!(ParallelFrontScheduler::new(4, 10, false).num_workers(2), 2);
        assert_eq!(ParallelFrontScheduler::new(4, 10, false).num_workers(0), 1);
        assert!(ParallelFrontScheduler::new(0, 10, false).num_workers(1000) >= 1);
    }
}
