use crate::errors::RegistryError;
use jsonschema::Validator;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Keyword arguments bound to a task invocation
pub type Arguments = Map<String, Value>;

/// A named unit of work executed by a broker worker.
///
/// Implementations receive their keyword arguments already merged with the
/// output of the previous step of the chain and validated against
/// [`Task::required_args`] and [`Task::argument_schema`].
#[async_trait::async_trait]
pub trait Task: fmt::Debug + Send + Sync {
    /// Registry key of the task
    fn name(&self) -> &str;

    /// Names of the keyword arguments that must be present before `run`
    fn required_args(&self) -> &[&str] {
        &[]
    }

    /// Optional JSON schema the arguments object must satisfy
    fn argument_schema(&self) -> Option<Value> {
        None
    }

    /// Runs the task. An `Err` stops the chain and becomes the failure
    /// reason reported to the caller.
    async fn run(&self, args: Arguments) -> Result<Value, String>;
}

/// Input contract of a task: required names plus a compiled JSON schema
pub struct InputSchema {
    required: BTreeSet<String>,
    validator: Validator,
}

impl InputSchema {
    /// Compiles the contract of a task
    ///
    /// The required names are added to the schema's own `required` list so a
    /// single validator covers both.
    pub fn compile(required: &[&str], schema: Option<Value>) -> Result<Self, String> {
        let required: BTreeSet<String> = required.iter().map(|s| s.to_string()).collect();

        let mut schema = schema.unwrap_or_else(|| json!({ "type": "object" }));
        let object = schema
            .as_object_mut()
            .ok_or_else(|| "argument schema must be a JSON object".to_string())?;
        let mut all_required: BTreeSet<String> = object
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|n| n.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();
        all_required.extend(required.iter().cloned());
        object.insert("required".into(), json!(all_required));

        let validator = jsonschema::validator_for(&schema).map_err(|e| e.to_string())?;
        Ok(Self {
            required: all_required,
            validator,
        })
    }

    /// Names every invocation must bind
    pub fn required(&self) -> &BTreeSet<String> {
        &self.required
    }

    /// Checks fully merged arguments against the contract
    pub fn validate(&self, args: &Arguments) -> Result<(), String> {
        let missing: Vec<&str> = self
            .required
            .iter()
            .filter(|name| !args.contains_key(name.as_str()))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(format!(
                "missing required argument(s): {}",
                missing.join(", ")
            ));
        }

        let instance = Value::Object(args.clone());
        let errors: Vec<String> = self
            .validator
            .iter_errors(&instance)
            .map(|e| e.to_string())
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("; "))
        }
    }
}

impl fmt::Debug for InputSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputSchema")
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

/// Registry entry describing a task: its name, its input contract and the
/// implementation to dispatch to.
#[derive(Debug, Clone)]
pub struct TaskDescriptor {
    name: String,
    input_schema: Arc<InputSchema>,
    implementation: Arc<dyn Task>,
}

impl TaskDescriptor {
    /// Builds the descriptor of a task, compiling its input contract
    pub fn new<T: Task + 'static>(task: T) -> Result<Self, RegistryError> {
        let name = task.name().to_string();
        let input_schema = InputSchema::compile(task.required_args(), task.argument_schema())
            .map_err(|reason| RegistryError::InvalidSchema {
                name: name.clone(),
                reason,
            })?;

        Ok(Self {
            name,
            input_schema: Arc::new(input_schema),
            implementation: Arc::new(task),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_schema(&self) -> &InputSchema {
        &self.input_schema
    }

    /// Validates the arguments then runs the implementation
    pub async fn execute(&self, args: Arguments) -> Result<Value, String> {
        self.input_schema
            .validate(&args)
            .map_err(|reason| format!("invalid arguments: {}", reason))?;
        self.implementation.run(args).await
    }
}
