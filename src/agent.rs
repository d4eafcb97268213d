//! Agent startup and lifetime.
//!
//! Builds the memory and executer, connects to the coordinator, performs the
//! handshake and then runs the dispatcher and the execution loop side by
//! side. Any failure before the loops start is fatal.

use crate::config::AgentConfiguration;
use crate::control::ControlState;
use crate::dispatcher::Dispatcher;
use crate::endpoint::ControlEndpoint;
use crate::engine::{BasicExecuter, EngineHandle, ExecutionEngine};
use crate::error::{AgentError, EndpointError};
use crate::execution::ExecutionLoop;
use crate::memory;
use std::sync::Arc;
use tokio::net::ToSocketAddrs;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Build the in-process executer described by `config`.
pub fn build_executer(config: &AgentConfiguration) -> Result<BasicExecuter, AgentError> {
    info!("Creating memory");
    let store = memory::build(&config.memory_controller, &config.memory)?;
    info!("Creating executer");
    Ok(BasicExecuter::new(
        config.name.clone(),
        store,
        config.rules.clone(),
    ))
}

/// Connect to the coordinator and complete the handshake.
///
/// The connection is closed again if the handshake fails.
pub async fn connect_and_handshake<A: ToSocketAddrs>(
    coordinator: A,
    name: &str,
) -> Result<ControlEndpoint, EndpointError> {
    let endpoint = ControlEndpoint::connect(coordinator).await?;
    if let Err(e) = endpoint.send_handshake(name).await {
        endpoint.close().await;
        return Err(e);
    }
    Ok(endpoint)
}

/// Run the agent with the basic executer.
pub async fn run<A: ToSocketAddrs>(
    config: AgentConfiguration,
    coordinator: A,
) -> Result<(), AgentError> {
    let executer = build_executer(&config)?;
    run_with_engine(config, executer, coordinator).await
}

/// Run the agent with a caller-supplied engine.
///
/// Returns only on a startup failure or once the engine stops.
pub async fn run_with_engine<E, A>(
    config: AgentConfiguration,
    engine: E,
    coordinator: A,
) -> Result<(), AgentError>
where
    E: ExecutionEngine,
    A: ToSocketAddrs,
{
    let config = Arc::new(config);
    let (engine, _owner) = EngineHandle::spawn(engine);

    info!(agent = %config.name, "Connecting to coordinator");
    let endpoint = Arc::new(connect_and_handshake(coordinator, &config.name).await?);

    let control = Arc::new(ControlState::default());
    let dispatcher = Dispatcher::new(
        Arc::clone(&endpoint),
        engine.clone(),
        Arc::clone(&control),
        Arc::clone(&config),
    );
    let dispatch_task = tokio::spawn(dispatcher.run());

    let result = ExecutionLoop::new(engine, control, config.tick).run().await;
    if let Err(e) = &result {
        error!(agent = %config.name, error = %e, "Agent stopped");
    }
    endpoint.close().await;
    join_dispatcher(dispatch_task).await;
    result.map_err(AgentError::from)
}

/// Wait for the dispatcher task; returns whether it ended cleanly.
async fn join_dispatcher(task: JoinHandle<()>) -> bool {
    match task.await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, "Dispatcher task failed");
            false
        }
    }
}
