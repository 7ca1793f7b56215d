//! Service wiring: one repository shared by every request.

use std::sync::Arc;

use slo_infra::{JobStatusRepo, JobStatusUseCases};

use crate::controller::JobStatusController;

pub type SharedRepo = Arc<dyn JobStatusRepo>;

pub struct AppServices {
    controller: JobStatusController<SharedRepo>,
}

impl AppServices {
    pub fn new(repo: SharedRepo) -> Self {
        Self {
            controller: JobStatusController::new(JobStatusUseCases::new(repo)),
        }
    }

    pub fn controller(&self) -> &JobStatusController<SharedRepo> {
        &self.controller
    }

    /// Repository handle, for shutdown.
    pub fn repo(&self) -> &SharedRepo {
        self.controller.use_cases().repo()
    }
}
