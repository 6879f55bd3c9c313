use super::augment::network_with_unit_and_destination;
use super::diversify::most_unique_below;
use super::geometry::{WalkableSurface, WorldPosition};
use super::network::{NodalNetwork, Node, NodeId, UNIT_LABEL};
use super::path::Path;
use super::search::shortest_path;
use crate::common::DomainError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignmentSettings {
    /// T1: a direct path is accepted when it overlaps every established path at most this much.
    pub first_pass_similarity: f64,
    /// T2: a path overlapping the closest agent's path more than this gets diversified.
    pub second_pass_similarity: f64,
    pub iteration_limit: usize,
}

impl Default for AssignmentSettings {
    fn default() -> Self {
        Self {
            first_pass_similarity: 0.4,
            second_pass_similarity: 0.7,
            iteration_limit: 100,
        }
    }
}

/// The route committed to one agent, by index into the input slice.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentRoute {
    pub agent: usize,
    pub path: Path,
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentOutcome {
    /// Ordered by agent index; one entry per agent.
    pub routes: Vec<AgentRoute>,
    pub diagnostics: Vec<DomainError>,
}

struct Candidate {
    agent: usize,
    path: Path,
    network: NodalNetwork,
}

pub struct MultiAgentAssigner<'a> {
    network: &'a NodalNetwork,
    surface: &'a WalkableSurface,
    settings: AssignmentSettings,
}

impl<'a> MultiAgentAssigner<'a> {
    pub fn new(network: &'a NodalNetwork, surface: &'a WalkableSurface, settings: AssignmentSettings) -> Self {
        Self {
            network,
            surface,
            settings,
        }
    }

    /// Give every agent a route to `destination`, spreading them over
    /// distinct corridors where the graph allows it.
    pub fn assign(&self, agents: &[WorldPosition], destination: WorldPosition) -> AssignmentOutcome {
        let mut outcome = AssignmentOutcome::default();
        let target = destination.snap_to_grid();

        let mut candidates = Vec::with_capacity(agents.len());
        for (agent, position) in agents.iter().enumerate() {
            let unit = position.snap_to_grid();
            let augmented = match network_with_unit_and_destination(self.network, self.surface, unit, target) {
                Ok(augmented) => augmented,
                Err(e) => {
                    outcome.diagnostics.push(e);
                    let stranded = Node::new(NodeId(self.network.len()), UNIT_LABEL, unit);
                    outcome.routes.push(AgentRoute {
                        agent,
                        path: Path::unreachable_from(stranded),
                    });
                    continue;
                }
            };

            let path = shortest_path(&augmented.network, augmented.unit, augmented.destination);
            if !path.is_found() {
                outcome.diagnostics.push(DomainError::NoRouteFound { from: unit, to: target });
                outcome.routes.push(AgentRoute {
                    agent,
                    path: Path::unreachable_from(augmented.network[augmented.unit].clone()),
                });
                continue;
            }
            candidates.push(Candidate {
                agent,
                path,
                network: augmented.network,
            });
        }

        candidates.sort_by_key(|c| c.path.total_weight());
        if candidates.is_empty() {
            outcome.routes.sort_by_key(|r| r.agent);
            return outcome;
        }

        let closest = candidates.remove(0);
        let closest_path = closest.path.clone();
        let mut established: Vec<AgentRoute> = vec![AgentRoute {
            agent: closest.agent,
            path: closest.path,
        }];

        let mut iterations = 0;
        while !candidates.is_empty() {
            iterations += 1;
            if iterations > self.settings.iteration_limit {
                outcome
                    .diagnostics
                    .push(DomainError::limit("multi-agent assignment", self.settings.iteration_limit));
                // whoever is left keeps the direct path
                established.extend(candidates.drain(..).map(|c| AgentRoute {
                    agent: c.agent,
                    path: c.path,
                }));
                break;
            }

            if let Some(index) = candidates.iter().position(|c| {
                established
                    .iter()
                    .all(|e| c.path.similarity(&e.path) <= self.settings.first_pass_similarity)
            }) {
                let chosen = candidates.remove(index);
                established.push(AgentRoute {
                    agent: chosen.agent,
                    path: chosen.path,
                });
                continue;
            }

            // Second pass: take direct paths in weight order until one overlaps the
            // closest agent's path too much, then route that one around it.
            while !candidates.is_empty() {
                let candidate = candidates.remove(0);
                if candidate.path.similarity(&closest_path) > self.settings.second_pass_similarity {
                    let baseline: Vec<Path> = established.iter().map(|e| e.path.clone()).collect();
                    let path = most_unique_below(
                        self.settings.second_pass_similarity,
                        &candidate.path,
                        &baseline,
                        &candidate.network,
                    );
                    established.push(AgentRoute {
                        agent: candidate.agent,
                        path,
                    });
                    break;
                }
                established.push(AgentRoute {
                    agent: candidate.agent,
                    path: candidate.path,
                });
            }
        }

        outcome.routes.extend(established);
        outcome.routes.sort_by_key(|r| r.agent);
        outcome
    }
}
