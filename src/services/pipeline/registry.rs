// src/services/pipeline/registry.rs
//
// Agent Registry
//
// Holds the set of registered agents, resolves them by capability and
// tracks per-agent health and throughput stats. Concurrent pipeline runs
// update the same agent's stats, so counters are atomics; a lost increment
// is a correctness bug, not an acceptable approximation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use super::agent::DocumentAgent;
use super::errors::PipelineError;
use super::types::{AgentState, AgentStatus, Capability};

const STATE_IDLE: u8 = 0;
const STATE_PROCESSING: u8 = 1;
const STATE_ERROR: u8 = 2;

/// Per-agent runtime counters. The running latency average stores only a
/// cumulative sum and count, never the full history.
struct AgentStats {
    processed_count: AtomicU64,
    total_latency_ms: AtomicU64,
    state: AtomicU8,
    last_processed_at: RwLock<Option<DateTime<Utc>>>,
}

impl AgentStats {
    fn new() -> Self {
        Self {
            processed_count: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            state: AtomicU8::new(STATE_IDLE),
            last_processed_at: RwLock::new(None),
        }
    }

    fn state(&self) -> AgentState {
        match self.state.load(Ordering::Acquire) {
            STATE_PROCESSING => AgentState::Processing,
            STATE_ERROR => AgentState::Error,
            _ => AgentState::Idle,
        }
    }
}

struct AgentEntry {
    agent: Arc<dyn DocumentAgent>,
    stats: AgentStats,
}

/// Registry of pipeline agents. Registration happens once at startup;
/// resolution and stat updates happen on every run.
pub struct AgentRegistry {
    inner: RwLock<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    // Insertion order is the resolution order for a capability.
    order: Vec<Uuid>,
    entries: HashMap<Uuid, Arc<AgentEntry>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// Register an agent. Fails if its id is already present.
    pub fn register(&self, agent: Arc<dyn DocumentAgent>) -> Result<(), PipelineError> {
        let mut inner = self.inner.write().expect("registry lock poisoned");
        let agent_id = agent.id();
        if inner.entries.contains_key(&agent_id) {
            return Err(PipelineError::DuplicateAgent {
                agent_id,
                agent_name: agent.name().to_string(),
            });
        }
        info!(agent_id = %agent_id, agent_name = agent.name(), "Registering pipeline agent");
        inner.order.push(agent_id);
        inner.entries.insert(
            agent_id,
            Arc::new(AgentEntry {
                agent,
                stats: AgentStats::new(),
            }),
        );
        Ok(())
    }

    /// Resolve the agents servicing a capability, in registration order.
    /// At least one match is required; an empty result is a
    /// pipeline-configuration error, fatal to the run.
    pub fn resolve(
        &self,
        capability: Capability,
    ) -> Result<Vec<Arc<dyn DocumentAgent>>, PipelineError> {
        let inner = self.inner.read().expect("registry lock poisoned");
        let matches: Vec<Arc<dyn DocumentAgent>> = inner
            .order
            .iter()
            .filter_map(|id| inner.entries.get(id))
            .filter(|entry| entry.agent.capabilities().contains(&capability))
            .map(|entry| Arc::clone(&entry.agent))
            .collect();
        if matches.is_empty() {
            return Err(PipelineError::NoAgentForCapability(capability));
        }
        Ok(matches)
    }

    /// Flip an agent to `processing` while a run is in flight, for
    /// concurrent health-check callers.
    pub fn mark_processing(&self, agent_id: Uuid) {
        if let Some(entry) = self.entry(agent_id) {
            entry.stats.state.store(STATE_PROCESSING, Ordering::Release);
        }
    }

    /// Record a completed run: bumps the processed count, folds the latency
    /// into the running average and settles the agent's state (`error` when
    /// the most recent run failed, `idle` otherwise).
    pub fn record_run(&self, agent_id: Uuid, latency_ms: u64, succeeded: bool) {
        let Some(entry) = self.entry(agent_id) else {
            debug!(agent_id = %agent_id, "record_run for unknown agent ignored");
            return;
        };
        entry.stats.processed_count.fetch_add(1, Ordering::AcqRel);
        entry
            .stats
            .total_latency_ms
            .fetch_add(latency_ms, Ordering::AcqRel);
        let state = if succeeded { STATE_IDLE } else { STATE_ERROR };
        entry.stats.state.store(state, Ordering::Release);
        *entry
            .stats
            .last_processed_at
            .write()
            .expect("stats lock poisoned") = Some(Utc::now());
    }

    /// Best-effort point-in-time view of every registered agent. Per-field
    /// consistent but not transactional; stats are advisory data.
    pub fn snapshot(&self) -> Vec<AgentStatus> {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner
            .order
            .iter()
            .filter_map(|id| inner.entries.get(id))
            .map(|entry| {
                let processed = entry.stats.processed_count.load(Ordering::Acquire);
                let total_latency = entry.stats.total_latency_ms.load(Ordering::Acquire);
                let average_latency_ms = if processed == 0 {
                    0.0
                } else {
                    total_latency as f64 / processed as f64
                };
                AgentStatus {
                    agent_id: entry.agent.id(),
                    agent_name: entry.agent.name().to_string(),
                    capabilities: entry.agent.capabilities().to_vec(),
                    status: entry.stats.state(),
                    last_processed_at: *entry
                        .stats
                        .last_processed_at
                        .read()
                        .expect("stats lock poisoned"),
                    processed_count: processed,
                    average_latency_ms,
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("registry lock poisoned").order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Map an agent id back to its display name, for response shaping.
    pub fn agent_name(&self, agent_id: Uuid) -> Option<String> {
        self.entry(agent_id)
            .map(|entry| entry.agent.name().to_string())
    }

    fn entry(&self, agent_id: Uuid) -> Option<Arc<AgentEntry>> {
        self.inner
            .read()
            .expect("registry lock poisoned")
            .entries
            .get(&agent_id)
            .map(Arc::clone)
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
