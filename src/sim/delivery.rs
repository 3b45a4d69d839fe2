use std::{
    cell::RefCell,
    collections::{BTreeMap, HashSet},
    rc::Rc,
};

use crate::{
    foundation::error::{ComposeError, ComposeResult},
    media::traits::ArtifactSink,
    model::job::{Artifact, CompositionJob, JobId},
    sim::log::{EventLog, SimEvent},
};

/// Keeps a copy of every delivered artifact, keyed by job id.
#[derive(Clone, Debug, Default)]
pub struct MemoryDelivery {
    delivered: Rc<RefCell<BTreeMap<JobId, Artifact>>>,
    order: Rc<RefCell<Vec<JobId>>>,
    fail_for: HashSet<JobId>,
    log: EventLog,
}

impl MemoryDelivery {
    /// An empty sink that accepts everything.
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    /// Delivery of this job's artifact fails.
    pub fn failing_for(mut self, id: impl Into<String>) -> Self {
        self.fail_for.insert(JobId::new(id));
        self
    }

    /// Copy of the artifact delivered for `id`.
    pub fn get(&self, id: &str) -> Option<Artifact> {
        self.delivered.borrow().get(&JobId::new(id)).cloned()
    }

    /// Job ids in delivery order.
    pub fn order(&self) -> Vec<JobId> {
        self.order.borrow().clone()
    }
}

#[async_trait::async_trait(?Send)]
impl ArtifactSink for MemoryDelivery {
    async fn deliver(&self, job: &CompositionJob, artifact: &Artifact) -> ComposeResult<()> {
        if self.fail_for.contains(&job.id) {
            return Err(ComposeError::asset(format!("download of '{}' blocked", job.id)));
        }
        self.delivered
            .borrow_mut()
            .insert(job.id.clone(), artifact.clone());
        self.order.borrow_mut().push(job.id.clone());
        self.log.push(SimEvent::Delivered(job.id.to_string()));
        Ok(())
    }
}
