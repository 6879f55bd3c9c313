use super::assignment::AssignmentSettings;
use super::batch::{schedule, BatchOutput, BatchSnapshot, JobHandle, JobPoll};
use super::codec::decode_paths;
use super::events::NavigationEvent;
use super::geometry::{GridPoint, WalkableSurface, WorldPosition};
use super::network::{NodalNetwork, NodeLabeler};
use super::patrol::PatrolPlanner;
use super::ports::MovementController;
use crate::common::{DomainError, DomainResult};
use crate::domains::logger::DynLogger;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behaviour {
    Patrol,
    Chase,
}

pub struct RegisteredAgent {
    pub name: String,
    pub controller: Arc<dyn MovementController>,
}

/// What one call to [`PathCoordinator::tick`] did.
#[derive(Debug, Default)]
pub struct TickReport {
    pub completed_job: Option<Uuid>,
    /// Names of agents that received a new path.
    pub assigned: Vec<String>,
    pub unmatched: Vec<GridPoint>,
    pub diagnostics: Vec<DomainError>,
}

/// Owns the agent set and drives path assignment from the primary line of
/// execution. At most one batch job is outstanding at any time.
pub struct PathCoordinator {
    network: Arc<NodalNetwork>,
    surface: Arc<WalkableSurface>,
    runtime: Handle,
    settings: AssignmentSettings,
    agents: Vec<RegisteredAgent>,
    agent_labels: NodeLabeler,
    behaviour: Behaviour,
    in_flight: Option<JobHandle>,
    last_destination: Option<WorldPosition>,
    patrol: PatrolPlanner,
    logger: DynLogger,
    events: Option<mpsc::Sender<NavigationEvent>>,
}

impl PathCoordinator {
    pub fn new(
        network: Arc<NodalNetwork>,
        surface: Arc<WalkableSurface>,
        runtime: Handle,
        settings: AssignmentSettings,
        logger: DynLogger,
    ) -> Self {
        Self {
            network,
            surface,
            runtime,
            settings,
            agents: Vec::new(),
            agent_labels: NodeLabeler::new(),
            behaviour: Behaviour::Patrol,
            in_flight: None,
            last_destination: None,
            patrol: PatrolPlanner::from_entropy(),
            logger,
            events: None,
        }
    }

    pub fn with_events(mut self, sender: mpsc::Sender<NavigationEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn with_patrol_planner(mut self, planner: PatrolPlanner) -> Self {
        self.patrol = planner;
        self
    }

    /// Register an agent; names run `unitA`, `unitB`, … per coordinator.
    pub fn add_agent(&mut self, controller: Arc<dyn MovementController>) -> String {
        let name = format!("unit{}", self.agent_labels.next_label());
        self.agents.push(RegisteredAgent {
            name: name.clone(),
            controller,
        });
        name
    }

    pub fn agent_names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn behaviour(&self) -> Behaviour {
        self.behaviour
    }

    pub fn is_job_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Switching to `Chase` re-targets the last known destination right away.
    /// The switch stands even when that re-target is turned away because a job
    /// is still outstanding; the rejection is logged and published instead.
    pub fn set_behaviour(&mut self, behaviour: Behaviour) -> DomainResult<()> {
        if self.behaviour == behaviour {
            return Ok(());
        }
        self.behaviour = behaviour;
        self.logger.info(&format!("Behaviour switched to {:?}", behaviour));

        match (behaviour, self.last_destination) {
            (Behaviour::Chase, Some(destination)) => match self.assign_chase_paths(destination) {
                Ok(_) | Err(DomainError::JobInFlight) => Ok(()),
                Err(e) => Err(e),
            },
            _ => Ok(()),
        }
    }

    /// Snapshot agents and network and schedule a batch job toward `destination`.
    /// Rejected, not queued, while another job is outstanding.
    pub fn assign_chase_paths(&mut self, destination: WorldPosition) -> DomainResult<Uuid> {
        self.last_destination = Some(destination);
        if self.behaviour != Behaviour::Chase {
            return Err(DomainError::InvalidCommand {
                reason: "chase paths requested while patrolling".to_string(),
            });
        }
        if self.in_flight.is_some() {
            self.logger
                .warn("Can't assign new chase paths, still waiting on the previous job");
            self.publish(NavigationEvent::TriggerRejected {
                destination: destination.snap_to_grid(),
                timestamp: Utc::now(),
            });
            return Err(DomainError::JobInFlight);
        }

        let positions: Vec<WorldPosition> = self.agents.iter().map(|a| a.controller.position()).collect();
        let snapshot = BatchSnapshot::capture(
            &self.network,
            Arc::clone(&self.surface),
            &positions,
            destination,
            self.settings,
        )?;
        let job = schedule(&self.runtime, snapshot);
        let job_id = job.id();

        self.logger.info(&format!(
            "Scheduled batch job {} for {} agents toward {}",
            job_id,
            positions.len(),
            destination.snap_to_grid()
        ));
        self.publish(NavigationEvent::BatchScheduled {
            job_id,
            agents: positions.len(),
            destination: destination.snap_to_grid(),
            timestamp: Utc::now(),
        });
        self.in_flight = Some(job);
        Ok(job_id)
    }

    /// Per-tick update: collect a finished batch job, or hand out patrol legs.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        if let Some(job) = self.in_flight.as_mut() {
            if let JobPoll::Complete(result) = job.try_complete() {
                let job_id = job.id();
                self.in_flight = None;
                report.completed_job = Some(job_id);
                match result {
                    Ok(output) if self.behaviour == Behaviour::Chase => self.deliver(job_id, output, &mut report),
                    Ok(_) => self
                        .logger
                        .info(&format!("Discarding batch job {} results; no longer chasing", job_id)),
                    Err(e) => {
                        self.logger.report(&e);
                        report.diagnostics.push(e);
                    }
                }
            }
        }

        if self.behaviour == Behaviour::Patrol {
            self.assign_patrol_paths(&mut report);
        }
        report
    }

    fn deliver(&mut self, job_id: Uuid, output: BatchOutput, report: &mut TickReport) {
        for diagnostic in &output.diagnostics {
            self.logger.report(diagnostic);
        }
        report.diagnostics.extend(output.diagnostics.iter().cloned());

        let paths = match decode_paths(&output.paths) {
            Ok(paths) => paths,
            Err(e) => {
                let e = DomainError::from(e);
                self.logger.report(&e);
                report.diagnostics.push(e);
                return;
            }
        };

        let mut served = vec![false; self.agents.len()];
        for path in &paths {
            let start = path.origin().map(|n| n.position).unwrap_or_default();
            let agent = self
                .agents
                .iter()
                .enumerate()
                .position(|(i, a)| !served[i] && a.controller.position().snap_to_grid() == start);

            let Some(index) = agent else {
                let e = DomainError::UnmatchedResult { position: start };
                self.logger.report(&e);
                self.publish(NavigationEvent::ResultUnmatched {
                    position: start,
                    timestamp: Utc::now(),
                });
                report.unmatched.push(start);
                report.diagnostics.push(e);
                continue;
            };

            served[index] = true;
            let agent = &self.agents[index];
            self.logger
                .info(&format!("{} assigned path {}", agent.name, path.describe()));
            self.publish(NavigationEvent::PathAssigned {
                agent: agent.name.clone(),
                waypoints: path.positions(),
                total_weight: path.total_weight(),
                found: path.is_found(),
                timestamp: Utc::now(),
            });
            report.assigned.push(agent.name.clone());
            agent.controller.assign_path(path.clone());
        }

        self.publish(NavigationEvent::BatchCompleted {
            job_id,
            paths: paths.len(),
            diagnostics: report.diagnostics.len(),
            timestamp: Utc::now(),
        });
    }

    fn assign_patrol_paths(&mut self, report: &mut TickReport) {
        for agent in &self.agents {
            if agent.controller.has_active_path() {
                continue;
            }
            // an agent still finishing its last leg plans from where that leg ends
            let position = agent
                .controller
                .previous_destination()
                .unwrap_or_else(|| agent.controller.position().snap_to_grid());

            let Some(path) = self
                .patrol
                .next_destination(&agent.name, position, &self.network, &self.surface)
            else {
                continue;
            };
            let target = path.destination().map(|n| n.position).unwrap_or(position);

            self.publish(NavigationEvent::PatrolAssigned {
                agent: agent.name.clone(),
                target,
                timestamp: Utc::now(),
            });
            report.assigned.push(agent.name.clone());
            agent.controller.assign_path(path);
        }
    }

    fn publish(&self, event: NavigationEvent) {
        if let Some(sender) = &self.events {
            if let Err(e) = sender.try_send(event) {
                tracing::debug!(error = %e, "navigation event dropped");
            }
        }
    }
}
