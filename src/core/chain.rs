use super::broker::Broker;
use super::handle::AsyncHandle;
use super::task::{Arguments, TaskDescriptor};
use super::task_state::TaskFailure;
use crate::constants::PREVIOUS_RESULT_KEY;
use crate::errors::{BrokerError, ChainError};
use serde_json::Value;
use tracing::debug;

/// One task of a chain together with its explicit keyword arguments
#[derive(Debug, Clone)]
pub struct TaskInvocation {
    pub descriptor: TaskDescriptor,
    pub kwargs: Arguments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainState {
    Empty,
    Building,
    Compiled,
}

/// Single-use builder for a pipeline.
///
/// Goes `Empty -> Building -> Compiled`. Once compiled the chainer accepts no
/// further call.
#[derive(Debug)]
pub struct TaskChainer {
    state: ChainState,
    invocations: Vec<TaskInvocation>,
}

impl Default for TaskChainer {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskChainer {
    pub fn new() -> Self {
        Self {
            state: ChainState::Empty,
            invocations: Vec::new(),
        }
    }

    /// Appends a task to the chain
    ///
    /// Arguments are not validated here: the output of earlier steps is only
    /// known at execution time.
    ///
    /// # Errors
    /// * `ChainError::IllegalState` if the chain was already compiled
    pub fn add_task(
        &mut self,
        descriptor: &TaskDescriptor,
        kwargs: Arguments,
    ) -> Result<(), ChainError> {
        if self.state == ChainState::Compiled {
            return Err(ChainError::IllegalState("cannot add a task to a compiled chain"));
        }
        self.invocations.push(TaskInvocation {
            descriptor: descriptor.clone(),
            kwargs,
        });
        self.state = ChainState::Building;
        Ok(())
    }

    /// Compiles the chain into a submittable pipeline
    ///
    /// # Errors
    /// * `ChainError::EmptyChain` if no task was added
    /// * `ChainError::IllegalState` if the chain was already compiled
    pub fn make_chain(&mut self) -> Result<Pipeline, ChainError> {
        match self.state {
            ChainState::Empty => Err(ChainError::EmptyChain),
            ChainState::Compiled => Err(ChainError::IllegalState("chain was already compiled")),
            ChainState::Building => {
                self.state = ChainState::Compiled;
                Ok(Pipeline {
                    steps: std::mem::take(&mut self.invocations),
                })
            }
        }
    }
}

/// Merges the output of the previous step into the explicit kwargs of the
/// next one.
///
/// A mapping result is spread shallowly as keyword arguments, `null`
/// contributes nothing and any other value is bound under
/// [`PREVIOUS_RESULT_KEY`]. Explicit kwargs always win on collision.
pub fn merge(explicit: Arguments, previous: Value) -> Arguments {
    let mut merged = match previous {
        Value::Object(map) => map,
        Value::Null => Arguments::new(),
        other => {
            let mut map = Arguments::new();
            map.insert(PREVIOUS_RESULT_KEY.to_string(), other);
            map
        }
    };
    merged.extend(explicit);
    merged
}

/// Compiled, immutable chain of tasks.
///
/// Submitting consumes the pipeline, so it is handed to the broker at most
/// once.
#[derive(Debug)]
pub struct Pipeline {
    steps: Vec<TaskInvocation>,
}

impl Pipeline {
    /// Task names in execution order
    pub fn task_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.descriptor.name()).collect()
    }

    /// Hands the pipeline to the broker and returns immediately
    pub async fn submit(self, broker: &Broker) -> Result<AsyncHandle, BrokerError> {
        broker.submit(self).await
    }

    /// Runs every step in order, threading each result into the next step.
    ///
    /// Stops at the first failing step; later steps never run. Each step runs
    /// in its own tokio task so a panic is reported as that step's failure.
    pub async fn execute(self, submission_id: &str) -> Result<Value, TaskFailure> {
        let mut previous: Option<Value> = None;

        for step in self.steps {
            let name = step.descriptor.name().to_string();
            let args = match previous.take() {
                Some(result) => merge(step.kwargs, result),
                None => step.kwargs,
            };

            debug!("[{}] Running task {}", submission_id, name);
            let descriptor = step.descriptor;
            let outcome = tokio::spawn(async move { descriptor.execute(args).await })
                .await
                .unwrap_or_else(|e| {
                    if e.is_panic() {
                        Err("task panicked".to_string())
                    } else {
                        Err(format!("task aborted: {}", e))
                    }
                });

            match outcome {
                Ok(result) => {
                    debug!("[{}] Task {} succeeded", submission_id, name);
                    previous = Some(result);
                }
                Err(reason) => return Err(TaskFailure::new(name, reason)),
            }
        }

        Ok(previous.unwrap_or(Value::Null))
    }
}
