use super::geometry::GridPoint;
use crate::common::DomainEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NavigationEvent {
    BatchScheduled {
        job_id: Uuid,
        agents: usize,
        destination: GridPoint,
        timestamp: DateTime<Utc>,
    },
    BatchCompleted {
        job_id: Uuid,
        paths: usize,
        diagnostics: usize,
        timestamp: DateTime<Utc>,
    },
    PathAssigned {
        agent: String,
        waypoints: Vec<GridPoint>,
        total_weight: u32,
        found: bool,
        timestamp: DateTime<Utc>,
    },
    ResultUnmatched {
        position: GridPoint,
        timestamp: DateTime<Utc>,
    },
    TriggerRejected {
        destination: GridPoint,
        timestamp: DateTime<Utc>,
    },
    PatrolAssigned {
        agent: String,
        target: GridPoint,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent for NavigationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            NavigationEvent::BatchScheduled { .. } => "BatchScheduled",
            NavigationEvent::BatchCompleted { .. } => "BatchCompleted",
            NavigationEvent::PathAssigned { .. } => "PathAssigned",
            NavigationEvent::ResultUnmatched { .. } => "ResultUnmatched",
            NavigationEvent::TriggerRejected { .. } => "TriggerRejected",
            NavigationEvent::PatrolAssigned { .. } => "PatrolAssigned",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            NavigationEvent::BatchScheduled { timestamp, .. } => *timestamp,
            NavigationEvent::BatchCompleted { timestamp, .. } => *timestamp,
            NavigationEvent::PathAssigned { timestamp, .. } => *timestamp,
            NavigationEvent::ResultUnmatched { timestamp, .. } => *timestamp,
            NavigationEvent::TriggerRejected { timestamp, .. } => *timestamp,
            NavigationEvent::PatrolAssigned { timestamp, .. } => *timestamp,
        }
    }
}
