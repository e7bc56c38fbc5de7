use crate::conversation::ToolCallRequest;
use crate::error::ToolError;
use crate::tools::validate_arguments;
use crate::traits::{Tool, ToolOutcome, ToolSpec};
use futures_util::FutureExt;
use futures_util::future::join_all;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> anyhow::Result<()> {
        if self.contains(tool.name()) {
            anyhow::bail!("Tool '{}' is already registered", tool.name());
        }
        self.tools.push(tool);
        Ok(())
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> anyhow::Result<Self> {
        self.register(tool)?;
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn get_specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    fn find(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub async fn dispatch(&self, call: &ToolCallRequest) -> ToolOutcome {
        let Some(tool) = self.find(&call.name) else {
            warn!(tool = %call.name, id = %call.id, "Tool not found");
            return Err(ToolError::UnknownTool(call.name.clone()));
        };

        if let Err(reason) = validate_arguments(&tool.parameters_schema(), &call.arguments) {
            warn!(tool = %call.name, id = %call.id, %reason, "Rejected tool arguments");
            return Err(ToolError::InvalidArguments {
                tool: call.name.clone(),
                reason,
            });
        }

        debug!(tool = %call.name, id = %call.id, args = %call.arguments, "Executing tool");
        let execution = AssertUnwindSafe(tool.execute(call.arguments.clone()))
            .catch_unwind()
            .await;

        let message = match execution {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => e.to_string(),
            Err(panic) => panic_message(panic.as_ref()),
        };
        warn!(tool = %call.name, id = %call.id, error = %message, "Tool execution failed");
        Err(ToolError::Execution {
            tool: call.name.clone(),
            message,
        })
    }

    /// Resolves a batch of calls. Outcomes come back in request order even
    /// when the calls run concurrently.
    pub async fn dispatch_batch(&self, calls: &[ToolCallRequest], parallel: bool) -> Vec<ToolOutcome> {
        if parallel {
            return join_all(calls.iter().map(|call| self.dispatch(call))).await;
        }

        let mut outcomes = Vec::with_capacity(calls.len());
        for call in calls {
            outcomes.push(self.dispatch(call).await);
        }
        outcomes
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "tool panicked".to_string()
    }
}
