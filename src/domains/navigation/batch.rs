use super::assignment::{AssignmentSettings, MultiAgentAssigner};
use super::codec::{
    decode_agents, decode_network, encode_agents, encode_network, encode_paths, AgentBuffer, NodeBuffer, PathBuffer,
};
use super::geometry::{WalkableSurface, WorldPosition};
use super::network::NodalNetwork;
use super::path::Path;
use crate::common::{DomainError, DomainResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Everything a batch job reads, copied out of the live state so nothing
/// mutable crosses into the worker.
#[derive(Debug, Clone)]
pub struct BatchSnapshot {
    nodes: NodeBuffer,
    agents: AgentBuffer,
    destination: WorldPosition,
    surface: Arc<WalkableSurface>,
    settings: AssignmentSettings,
}

impl BatchSnapshot {
    pub fn capture(
        network: &NodalNetwork,
        surface: Arc<WalkableSurface>,
        agents: &[WorldPosition],
        destination: WorldPosition,
        settings: AssignmentSettings,
    ) -> DomainResult<Self> {
        Ok(Self {
            nodes: encode_network(network)?,
            agents: encode_agents(agents),
            destination,
            surface,
            settings,
        })
    }

    pub fn agent_count(&self) -> usize {
        self.agents.agent_count()
    }

    pub fn destination(&self) -> WorldPosition {
        self.destination
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    pub paths: PathBuffer,
    pub diagnostics: Vec<DomainError>,
}

/// Run the multi-agent assignment against a snapshot. Blocking; meant for a worker thread.
pub fn execute(snapshot: BatchSnapshot) -> DomainResult<BatchOutput> {
    let agents = decode_agents(&snapshot.agents)?;
    if agents.is_empty() {
        return Ok(BatchOutput::default());
    }

    let network = decode_network(&snapshot.nodes)?;
    let outcome = MultiAgentAssigner::new(&network, &snapshot.surface, snapshot.settings)
        .assign(&agents, snapshot.destination);
    let paths: Vec<Path> = outcome.routes.into_iter().map(|r| r.path).collect();

    Ok(BatchOutput {
        paths: encode_paths(&paths)?,
        diagnostics: outcome.diagnostics,
    })
}

pub enum JobPoll {
    Pending,
    Complete(DomainResult<BatchOutput>),
}

/// An outstanding batch job. Jobs cannot be cancelled; dropping the handle
/// only discards the result.
#[derive(Debug)]
pub struct JobHandle {
    id: Uuid,
    agent_count: usize,
    scheduled_at: DateTime<Utc>,
    receiver: oneshot::Receiver<DomainResult<BatchOutput>>,
}

impl JobHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn agent_count(&self) -> usize {
        self.agent_count
    }

    pub fn scheduled_at(&self) -> DateTime<Utc> {
        self.scheduled_at
    }

    /// Non-blocking completion check, called once per tick.
    pub fn try_complete(&mut self) -> JobPoll {
        match self.receiver.try_recv() {
            Ok(result) => JobPoll::Complete(result),
            Err(oneshot::error::TryRecvError::Empty) => JobPoll::Pending,
            Err(oneshot::error::TryRecvError::Closed) => JobPoll::Complete(Err(DomainError::InfrastructureError(
                "batch worker exited without a result".to_string(),
            ))),
        }
    }
}

/// Move `snapshot` onto the runtime's blocking pool.
pub fn schedule(runtime: &Handle, snapshot: BatchSnapshot) -> JobHandle {
    let (tx, receiver) = oneshot::channel();
    let agent_count = snapshot.agent_count();
    runtime.spawn_blocking(move || {
        // the receiver may already be gone; nothing to report to then
        let _ = tx.send(execute(snapshot));
    });
    JobHandle {
        id: Uuid::new_v4(),
        agent_count,
        scheduled_at: Utc::now(),
        receiver,
    }
}
