//! Local executor for task graphs.
//!
//! Every node whose dependencies have finished is started on tokio's blocking
//! pool, up to `max_jobs` at a time. The first failure stops scheduling, cancels
//! whatever has not started and is returned to the caller; there is no partial
//! result.

use std::collections::{HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::core::error::SplitError;
use crate::pipeline::graph::{NodeId, TaskGraph, TaskNode};

/// A task the executor can run
pub trait Runnable: TaskNode + Send + Sync + 'static {
    /// Shared, read-only state handed to every task
    type Context: Send + Sync + 'static;

    type Output: Send + Sync + 'static;

    /// Run the task body. `inputs` holds the outputs of exactly the declared dependencies.
    ///
    /// # Errors
    ///
    /// Any error aborts the whole run.
    fn run(
        &self,
        context: &Self::Context,
        inputs: &TaskInputs<Self::Output>,
    ) -> Result<Self::Output, SplitError>;
}

/// Outputs of a task's dependencies
pub struct TaskInputs<O> {
    outputs: HashMap<NodeId, Arc<O>>,
}

impl<O> TaskInputs<O> {
    /// Output of dependency `id`
    ///
    /// # Errors
    ///
    /// Returns `SplitError::Consistency` if `id` was not declared as a dependency.
    pub fn get(&self, id: NodeId) -> Result<&O, SplitError> {
        self.outputs
            .get(&id)
            .map(AsRef::as_ref)
            .ok_or_else(|| SplitError::consistency(format!("{id} is not an input of this task")))
    }
}

/// Outputs of every node of a finished graph
pub struct GraphOutputs<O> {
    outputs: HashMap<NodeId, Arc<O>>,
}

impl<O> GraphOutputs<O> {
    /// Output of node `id`
    ///
    /// # Errors
    ///
    /// Returns `SplitError::Consistency` if the node is not part of the graph.
    pub fn get(&self, id: NodeId) -> Result<&O, SplitError> {
        self.outputs
            .get(&id)
            .map(AsRef::as_ref)
            .ok_or_else(|| SplitError::consistency(format!("no output for {id}")))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Executor {
    max_jobs: usize,
}

impl Executor {
    #[must_use]
    pub fn new(max_jobs: usize) -> Self {
        Self {
            max_jobs: max_jobs.max(1),
        }
    }

    /// Run a graph to completion on a dedicated runtime
    ///
    /// # Errors
    ///
    /// Returns the first task error, or `SplitError::Io` if the runtime cannot start.
    pub fn run_blocking<T: Runnable>(
        &self,
        graph: TaskGraph<T>,
        context: Arc<T::Context>,
    ) -> Result<GraphOutputs<T::Output>, SplitError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .max_blocking_threads(self.max_jobs)
            .enable_all()
            .build()?;
        let result = runtime.block_on(self.run(graph, context));
        // A failed run may leave blocking tasks behind; don't wait for them
        runtime.shutdown_background();
        result
    }

    /// Run a graph to completion
    ///
    /// # Errors
    ///
    /// Returns the first task error.
    pub async fn run<T: Runnable>(
        &self,
        graph: TaskGraph<T>,
        context: Arc<T::Context>,
    ) -> Result<GraphOutputs<T::Output>, SplitError> {
        let total = graph.len();
        let dependents = graph.dependents();

        let mut waiting: Vec<usize> = Vec::with_capacity(total);
        let mut tasks: Vec<Option<(Arc<T>, Vec<NodeId>, Option<u64>)>> =
            Vec::with_capacity(total);
        let mut ready = VecDeque::new();
        for (id, node) in graph.into_nodes() {
            waiting.push(node.dependencies.len());
            if node.dependencies.is_empty() {
                ready.push_back(id);
            }
            tasks.push(Some((Arc::new(node.task), node.dependencies, node.disk_hint)));
        }

        let mut outputs: HashMap<NodeId, Arc<T::Output>> = HashMap::with_capacity(total);
        let mut running: JoinSet<(NodeId, String, Result<T::Output, SplitError>)> = JoinSet::new();

        loop {
            while running.len() < self.max_jobs {
                let Some(id) = ready.pop_front() else { break };
                let (task, dependencies, disk_hint) = tasks[id.index()]
                    .take()
                    .ok_or_else(|| SplitError::consistency(format!("{id} scheduled twice")))?;

                let inputs = TaskInputs {
                    outputs: dependencies
                        .iter()
                        .map(|dep| {
                            outputs
                                .get(dep)
                                .map(|out| (*dep, Arc::clone(out)))
                                .ok_or_else(|| {
                                    SplitError::consistency(format!("{dep} has no output"))
                                })
                        })
                        .collect::<Result<_, _>>()?,
                };

                let name = task.describe();
                match disk_hint {
                    Some(bytes) => debug!("Starting {name} (disk hint {bytes} bytes)"),
                    None => debug!("Starting {name}"),
                }
                let context = Arc::clone(&context);
                running.spawn_blocking(move || {
                    let result =
                        std::panic::catch_unwind(AssertUnwindSafe(|| task.run(&context, &inputs)))
                            .unwrap_or_else(|_| Err(SplitError::TaskAborted(task.describe())));
                    (id, name, result)
                });
            }

            let Some(joined) = running.join_next().await else {
                break;
            };
            let (id, name, result) =
                joined.map_err(|e| SplitError::TaskAborted(format!("unknown task: {e}")))?;
            match result {
                Ok(output) => {
                    debug!("Finished {name}");
                    outputs.insert(id, Arc::new(output));
                    for &next in &dependents[id.index()] {
                        waiting[next.index()] -= 1;
                        if waiting[next.index()] == 0 {
                            ready.push_back(next);
                        }
                    }
                }
                Err(e) => {
                    running.abort_all();
                    return Err(e);
                }
            }
        }

        if outputs.len() != total {
            return Err(SplitError::consistency(format!(
                "only {} of {total} tasks ran",
                outputs.len()
            )));
        }
        info!("Completed {total} tasks");

        Ok(GraphOutputs { outputs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Adds its own value to the sum of its inputs
    struct Add {
        name: &'static str,
        value: u64,
        inputs: Vec<NodeId>,
        fail: bool,
    }

    impl Add {
        fn new(name: &'static str, value: u64, inputs: Vec<NodeId>) -> Self {
            Self {
                name,
                value,
                inputs,
                fail: false,
            }
        }
    }

    #[derive(Default)]
    struct Log {
        order: Mutex<Vec<&'static str>>,
        concurrent: AtomicUsize,
        peak: AtomicUsize,
    }

    impl TaskNode for Add {
        fn dependencies(&self) -> Vec<NodeId> {
            self.inputs.clone()
        }

        fn describe(&self) -> String {
            self.name.to_string()
        }
    }

    impl Runnable for Add {
        type Context = Log;
        type Output = u64;

        fn run(&self, log: &Log, inputs: &TaskInputs<u64>) -> Result<u64, SplitError> {
            let now = log.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
            log.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            log.order.lock().unwrap().push(self.name);
            log.concurrent.fetch_sub(1, Ordering::SeqCst);

            if self.fail {
                return Err(SplitError::consistency(format!("{} failed", self.name)));
            }
            let mut sum = self.value;
            for id in &self.inputs {
                sum += inputs.get(*id)?;
            }
            Ok(sum)
        }
    }

    #[test]
    fn test_fan_out_and_join() {
        let mut graph = TaskGraph::new();
        let root = graph.add(Add::new("root", 1, vec![]), None).unwrap();
        let mut leaves = Vec::new();
        for (name, value) in [("a", 10), ("b", 100), ("c", 1000)] {
            leaves.push(graph.add(Add::new(name, value, vec![root]), None).unwrap());
        }
        let join = graph.add(Add::new("join", 0, leaves.clone()), None).unwrap();

        let log = Arc::new(Log::default());
        let outputs = Executor::new(4).run_blocking(graph, Arc::clone(&log)).unwrap();

        assert_eq!(outputs.len(), 5);
        assert_eq!(*outputs.get(join).unwrap(), 1113);
        let order = log.order.lock().unwrap();
        assert_eq!(order.first(), Some(&"root"));
        assert_eq!(order.last(), Some(&"join"));
    }

    #[test]
    fn test_respects_max_jobs() {
        let mut graph = TaskGraph::new();
        for name in ["a", "b", "c", "d", "e", "f"] {
            graph.add(Add::new(name, 1, vec![]), None).unwrap();
        }
        let log = Arc::new(Log::default());
        Executor::new(2).run_blocking(graph, Arc::clone(&log)).unwrap();
        assert!(log.peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_failure_aborts_dependents() {
        let mut graph = TaskGraph::new();
        let root = graph.add(Add::new("root", 1, vec![]), None).unwrap();
        let mut bad = Add::new("bad", 1, vec![root]);
        bad.fail = true;
        let bad = graph.add(bad, None).unwrap();
        graph.add(Add::new("after", 1, vec![bad]), None).unwrap();

        let log = Arc::new(Log::default());
        let result = Executor::new(2).run_blocking(graph, Arc::clone(&log));
        assert!(matches!(result, Err(SplitError::Consistency(msg)) if msg.contains("bad")));
        assert!(!log.order.lock().unwrap().contains(&"after"));
    }

    #[test]
    fn test_empty_graph() {
        let graph: TaskGraph<Add> = TaskGraph::new();
        let outputs = Executor::new(1)
            .run_blocking(graph, Arc::new(Log::default()))
            .unwrap();
        assert!(outputs.is_empty());
    }
}
