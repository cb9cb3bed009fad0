mod state;
mod tasks;
mod ui;

use crate::api::ProxyClient;
use crate::notify::Notifications;
use crate::upload::{BatchCoordinator, Collection, FileSelector};
use eframe::{egui, App};
pub use state::{Confirmation, DashboardState};
use std::path::Path;
use std::time::{Duration, Instant};
pub use tasks::Backend;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct AdminDashboard {
    backend: Backend,
    coordinator: BatchCoordinator<ProxyClient>,
    selector: FileSelector,
    notifications: Notifications,
    state: DashboardState,
}

impl AdminDashboard {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        backend: Backend,
        selector: FileSelector,
        notification_ttl: Duration,
    ) -> Self {
        tracing::info!(
            "Initializing admin dashboard for {}",
            backend.client().dashboard_url()
        );
        let mut dashboard = Self::with_backend(backend, selector, notification_ttl);
        dashboard.load_all();
        dashboard
    }

    fn with_backend(backend: Backend, selector: FileSelector, notification_ttl: Duration) -> Self {
        let coordinator =
            BatchCoordinator::new(backend.client().clone(), backend.runtime().clone());
        Self {
            backend,
            coordinator,
            selector,
            notifications: Notifications::new(notification_ttl),
            state: DashboardState::default(),
        }
    }

    /// Fetches every panel's initial content.
    pub fn load_all(&mut self) {
        let backend = &self.backend;
        self.state.templates.refresh(backend);
        self.state.resources.refresh(backend);
        self.state.objectives.refresh(backend);
        self.state.analytics.refresh(backend);
        self.state.tutor_prompt.load(backend);
        self.state.expert_prompt.load(backend);
        self.state.courses.load(backend);
    }

    pub fn add_files(&mut self, collection: Collection, paths: Vec<std::path::PathBuf>) {
        let files = self.selector.from_paths(paths);
        self.state.collection_mut(collection).selection.extend(files);
    }

    pub fn add_folder(&mut self, collection: Collection, folder: &Path) {
        let files = self.selector.from_folder(folder);
        self.state.collection_mut(collection).selection.extend(files);
    }

    /// Submits the current selection of `collection` as a new batch. The
    /// selection stays visible until the batch settles.
    pub fn upload(&mut self, collection: Collection) {
        let files = self.state.collection_mut(collection).selection.clone();
        self.coordinator
            .submit_batch(files, collection, &mut self.notifications);
    }

    pub fn confirm(&mut self, confirmation: Confirmation) {
        let backend = &self.backend;
        match confirmation {
            Confirmation::DeleteFile { collection, name } => {
                self.state.collection_mut(collection).delete(backend, name)
            }
            Confirmation::ResetPrompt(kind) => {
                self.state.prompt_mut(kind).reset(&mut self.notifications)
            }
            Confirmation::ReloadObjectives => self.state.objectives.reload(backend),
        }
    }

    /// Applies everything that finished since the last frame.
    pub fn update_state(&mut self) {
        for batch in self.coordinator.poll(&mut self.notifications) {
            tracing::debug!("Refreshing {} after {}", batch.summary.collection, batch.id);
            self.state
                .collection_mut(batch.summary.collection)
                .finish_batch(&self.backend);
        }
        self.state.poll(&self.backend, &mut self.notifications);
        self.notifications.prune(Instant::now());
    }
}

impl App for AdminDashboard {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state();
        self.render(ctx);
        ctx.request_repaint_after(POLL_INTERVAL);
    }
}
