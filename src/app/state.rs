use super::tasks::{take_ready, Backend, Pending};
use crate::analytics::{AnalyticsSummary, StudentActivity};
use crate::api::{Course, CurrentUser, FileEntry, NewCourse, PromptKind};
use crate::error::ApiError;
use crate::notify::Notifications;
use crate::upload::{Collection, SelectedFile};
use derivative::Derivative;
use std::collections::BTreeMap;

/// Listing and upload selection for one file collection.
#[derive(Debug)]
pub struct CollectionPanel {
    pub collection: Collection,
    pub selection: Vec<SelectedFile>,
    pub files: Vec<FileEntry>,
    pub loaded: bool,
    listing: Option<Pending<Vec<FileEntry>>>,
    deleting: Option<Pending<()>>,
}

impl CollectionPanel {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            selection: Vec::new(),
            files: Vec::new(),
            loaded: false,
            listing: None,
            deleting: None,
        }
    }

    /// Re-reads the whole listing. A refresh already in flight is superseded.
    pub fn refresh(&mut self, backend: &Backend) {
        let collection = self.collection;
        self.listing = Some(backend.spawn(move |client| async move {
            client.list_files(collection).await
        }));
    }

    /// Terminal step of an upload batch for this collection.
    pub fn finish_batch(&mut self, backend: &Backend) {
        self.selection.clear();
        self.refresh(backend);
    }

    pub fn delete(&mut self, backend: &Backend, name: String) {
        let collection = self.collection;
        tracing::info!("Deleting {} from {}", name, collection);
        self.deleting = Some(backend.spawn(move |client| async move {
            client.delete_file(collection, &name).await
        }));
    }

    pub fn is_loading(&self) -> bool {
        self.listing.is_some()
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting.is_some()
    }

    pub fn poll(&mut self, backend: &Backend, notifications: &mut Notifications) {
        match take_ready(&mut self.listing) {
            Some(Ok(files)) => {
                self.files = files;
                self.loaded = true;
            }
            Some(Err(e)) => {
                notifications.error(format!("Failed to load {}: {}", self.collection, e))
            }
            None => {}
        }

        match take_ready(&mut self.deleting) {
            Some(Ok(())) => {
                notifications.success(format!(
                    "{} deleted successfully!",
                    self.collection.item_label()
                ));
                self.refresh(backend);
            }
            Some(Err(ApiError::Rejected(reason))) => notifications.error(reason),
            Some(Err(e)) => notifications.error(format!("Delete failed: {}", e)),
            None => {}
        }
    }
}

#[derive(Debug)]
pub struct ObjectiveEditor {
    pub task: String,
    pub text: String,
    /// False until the current content has been fetched.
    pub ready: bool,
    loading: Option<Pending<String>>,
    saving: Option<Pending<()>>,
}

impl ObjectiveEditor {
    pub fn is_saving(&self) -> bool {
        self.saving.is_some()
    }
}

#[derive(Debug, Default)]
pub struct ObjectivesPanel {
    pub objectives: BTreeMap<String, Option<String>>,
    pub loaded: bool,
    pub editor: Option<ObjectiveEditor>,
    listing: Option<Pending<BTreeMap<String, Option<String>>>>,
    reloading: Option<Pending<Option<String>>>,
}

impl ObjectivesPanel {
    pub fn refresh(&mut self, backend: &Backend) {
        self.listing = Some(backend.spawn(|client| async move {
            client.learning_objectives().await
        }));
    }

    pub fn open_editor(&mut self, backend: &Backend, task: String) {
        let fetch_task = task.clone();
        let loading = backend.spawn(move |client| async move {
            client.learning_objective(&fetch_task).await
        });
        self.editor = Some(ObjectiveEditor {
            task,
            text: String::new(),
            ready: false,
            loading: Some(loading),
            saving: None,
        });
    }

    pub fn close_editor(&mut self) {
        self.editor = None;
    }

    /// Saves the trimmed editor text; an empty objective is allowed.
    pub fn save(&mut self, backend: &Backend) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        let task = editor.task.clone();
        let content = editor.text.trim().to_string();
        editor.saving = Some(backend.spawn(move |client| async move {
            client.save_learning_objective(&task, &content).await
        }));
    }

    pub fn reload(&mut self, backend: &Backend) {
        self.reloading = Some(backend.spawn(|client| async move {
            client.reload_learning_objectives().await
        }));
    }

    pub fn is_reloading(&self) -> bool {
        self.reloading.is_some()
    }

    pub fn poll(&mut self, backend: &Backend, notifications: &mut Notifications) {
        match take_ready(&mut self.listing) {
            Some(Ok(objectives)) => {
                self.objectives = objectives;
                self.loaded = true;
            }
            Some(Err(e)) => notifications.error(format!("Failed to load objectives: {}", e)),
            None => {}
        }

        match take_ready(&mut self.reloading) {
            Some(Ok(_)) => {
                notifications.success(
                    "Learning objectives reloaded successfully! Changes are now active.",
                );
                self.refresh(backend);
            }
            Some(Err(ApiError::Rejected(message))) => notifications.error(format!(
                "Failed to reload learning objectives: {}",
                message
            )),
            Some(Err(e)) => {
                tracing::error!("Error reloading learning objectives: {}", e);
                notifications
                    .error("Network error while reloading learning objectives. Please try again.");
            }
            None => {}
        }

        let mut saved = false;
        if let Some(editor) = self.editor.as_mut() {
            match take_ready(&mut editor.loading) {
                Some(Ok(content)) => {
                    editor.text = if content.trim().is_empty() {
                        String::new()
                    } else {
                        content
                    };
                    editor.ready = true;
                }
                Some(Err(e)) => {
                    tracing::error!("Error loading content for {}: {}", editor.task, e);
                    editor.text.clear();
                    editor.ready = true;
                }
                None => {}
            }

            match take_ready(&mut editor.saving) {
                Some(Ok(())) => {
                    notifications.success("Learning objective saved successfully!");
                    saved = true;
                }
                Some(Err(ApiError::Rejected(reason))) => notifications.error(reason),
                Some(Err(e)) => notifications.error(format!("Save failed: {}", e)),
                None => {}
            }
        }

        if saved {
            self.close_editor();
            self.refresh(backend);
        }
    }
}

#[derive(Debug)]
pub struct PromptPanel {
    pub kind: PromptKind,
    pub text: String,
    pub ready: bool,
    loading: Option<Pending<String>>,
    saving: Option<Pending<()>>,
}

impl PromptPanel {
    pub fn new(kind: PromptKind) -> Self {
        Self {
            kind,
            text: String::new(),
            ready: false,
            loading: None,
            saving: None,
        }
    }

    pub fn load(&mut self, backend: &Backend) {
        let kind = self.kind;
        self.ready = false;
        self.loading = Some(backend.spawn(move |client| async move { client.prompt(kind).await }));
    }

    pub fn save(&mut self, backend: &Backend) {
        let kind = self.kind;
        let content = self.text.clone();
        self.saving = Some(backend.spawn(move |client| async move {
            client.save_prompt(kind, &content).await
        }));
    }

    pub fn reset(&mut self, notifications: &mut Notifications) {
        self.text.clear();
        notifications.info(format!(
            "{} prompt cleared. Enter a new prompt and save.",
            self.kind.label()
        ));
    }

    pub fn is_saving(&self) -> bool {
        self.saving.is_some()
    }

    pub fn poll(&mut self, notifications: &mut Notifications) {
        let name = self.kind.slug();
        match take_ready(&mut self.loading) {
            Some(Ok(content)) => {
                self.text = content;
                self.ready = true;
            }
            Some(Err(e)) => {
                notifications.error(format!("Failed to load {} prompt: {}", name, e));
                self.ready = true;
            }
            None => {}
        }

        match take_ready(&mut self.saving) {
            Some(Ok(())) => {
                notifications.success(format!("{} prompt saved successfully!", self.kind.label()))
            }
            Some(Err(ApiError::Rejected(reason))) => {
                notifications.error(format!("Failed to save {} prompt: {}", name, reason))
            }
            Some(Err(e)) => notifications.error(format!("Save failed: {}", e)),
            None => {}
        }
    }
}

#[derive(Derivative)]
#[derivative(Debug, Default)]
pub struct AnalyticsPanel {
    #[derivative(Default(value = "true"))]
    pub expanded: bool,
    pub summary: Option<AnalyticsSummary>,
    pub selected_student: Option<String>,
    loading: Option<Pending<AnalyticsSummary>>,
}

impl AnalyticsPanel {
    pub fn refresh(&mut self, backend: &Backend) {
        self.loading = Some(backend.spawn(|client| async move {
            let records = client.student_analytics().await?;
            Ok(AnalyticsSummary::from_records(records))
        }));
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    /// Looks the selected student up in the last snapshot.
    pub fn selected_details(&self) -> Option<&StudentActivity> {
        let id = self.selected_student.as_deref()?;
        self.summary.as_ref()?.student(id)
    }

    pub fn poll(&mut self, notifications: &mut Notifications) {
        match take_ready(&mut self.loading) {
            Some(Ok(summary)) => {
                tracing::info!("Loaded analytics for {} students", summary.total_students);
                self.summary = Some(summary);
            }
            Some(Err(e)) => notifications.error(format!("Failed to load analytics: {}", e)),
            None => {}
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct CourseForm {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct EnrollForm {
    pub course_id: String,
    pub student: String,
}

#[derive(Debug, Default)]
pub struct CoursesPanel {
    pub user: Option<CurrentUser>,
    pub courses: Vec<Course>,
    pub loaded: bool,
    /// `(id, title)` of the course picked in this session.
    pub selected: Option<(String, String)>,
    pub create_form: Option<CourseForm>,
    pub enroll_form: Option<EnrollForm>,
    loading_user: Option<Pending<CurrentUser>>,
    loading_courses: Option<Pending<Vec<Course>>>,
    creating: Option<Pending<Course>>,
    assigning: Option<Pending<()>>,
    enrolling: Option<Pending<()>>,
}

impl CoursesPanel {
    /// Resolves the current user first so the course actions can be filtered.
    pub fn load(&mut self, backend: &Backend) {
        self.loading_user =
            Some(backend.spawn(|client| async move { client.current_user().await }));
    }

    pub fn refresh(&mut self, backend: &Backend) {
        self.loading_courses = Some(backend.spawn(|client| async move { client.courses().await }));
    }

    pub fn current_user(&self) -> CurrentUser {
        self.user.clone().unwrap_or_default()
    }

    pub fn create(&mut self, backend: &Backend, form: CourseForm) {
        let title = form.title.trim().to_string();
        if title.is_empty() {
            return;
        }
        let course = NewCourse {
            title,
            description: form.description.trim().to_string(),
        };
        self.creating = Some(backend.spawn(move |client| async move {
            client.create_course(&course).await
        }));
    }

    pub fn assign_me(&mut self, backend: &Backend, course_id: String) {
        let user = self.current_user();
        let teacher = if user.name.is_empty() {
            "admin".to_string()
        } else {
            user.name
        };
        self.assigning = Some(backend.spawn(move |client| async move {
            client.assign_teacher(&course_id, &teacher).await
        }));
    }

    pub fn enroll(&mut self, backend: &Backend, form: EnrollForm) {
        let student = form.student.trim().to_string();
        if student.is_empty() {
            return;
        }
        let course_id = form.course_id;
        self.enrolling = Some(backend.spawn(move |client| async move {
            client.enroll_student(&course_id, &student).await
        }));
    }

    pub fn select(&mut self, course: &Course, notifications: &mut Notifications) {
        let title = course.display_name().to_string();
        notifications.success(format!("Selected course: {}", title));
        self.selected = Some((course.id.clone(), title));
    }

    pub fn is_busy(&self) -> bool {
        self.loading_user.is_some()
            || self.loading_courses.is_some()
            || self.creating.is_some()
            || self.assigning.is_some()
            || self.enrolling.is_some()
    }

    pub fn poll(&mut self, backend: &Backend, notifications: &mut Notifications) {
        if let Some(result) = take_ready(&mut self.loading_user) {
            let user = result.unwrap_or_else(|e| {
                tracing::warn!("Could not fetch current user: {}", e);
                CurrentUser::default()
            });
            tracing::info!("Signed in as {} (admin: {})", user.name, user.admin);
            self.user = Some(user);
            self.refresh(backend);
        }

        match take_ready(&mut self.loading_courses) {
            Some(Ok(courses)) => {
                self.courses = courses;
                self.loaded = true;
            }
            Some(Err(e)) => notifications.error(format!("Failed to load courses: {}", e)),
            None => {}
        }

        match take_ready(&mut self.creating) {
            Some(Ok(course)) => {
                notifications.success(format!("Course created: {}", course.display_name()));
                self.refresh(backend);
            }
            Some(Err(e)) => notifications.error(format!("Failed to create course: {}", e)),
            None => {}
        }

        match take_ready(&mut self.assigning) {
            Some(Ok(())) => {
                notifications.success("Assigned as teacher");
                self.refresh(backend);
            }
            Some(Err(e)) => notifications.error(format!("Failed to assign teacher: {}", e)),
            None => {}
        }

        match take_ready(&mut self.enrolling) {
            Some(Ok(())) => {
                notifications.success("Student enrolled");
                self.refresh(backend);
            }
            Some(Err(e)) => notifications.error(format!("Failed to enroll student: {}", e)),
            None => {}
        }
    }
}

/// Actions that need a yes/no from the user first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    DeleteFile { collection: Collection, name: String },
    ResetPrompt(PromptKind),
    ReloadObjectives,
}

impl Confirmation {
    pub fn question(&self) -> String {
        match self {
            Confirmation::DeleteFile { name, .. } => {
                format!("Are you sure you want to delete {}?", name)
            }
            Confirmation::ResetPrompt(kind) => format!(
                "Are you sure you want to reset the {} prompt to default? This will overwrite any custom changes.",
                kind.slug()
            ),
            Confirmation::ReloadObjectives => {
                "Are you sure you want to reload learning objectives? This will refresh all learning objectives from the files without restarting the system."
                    .to_string()
            }
        }
    }
}

#[derive(Debug)]
pub struct DashboardState {
    pub templates: CollectionPanel,
    pub resources: CollectionPanel,
    pub objectives: ObjectivesPanel,
    pub tutor_prompt: PromptPanel,
    pub expert_prompt: PromptPanel,
    pub analytics: AnalyticsPanel,
    pub courses: CoursesPanel,
    pub confirmation: Option<Confirmation>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            templates: CollectionPanel::new(Collection::WorkspaceTemplates),
            resources: CollectionPanel::new(Collection::SharedResources),
            objectives: ObjectivesPanel::default(),
            tutor_prompt: PromptPanel::new(PromptKind::Tutor),
            expert_prompt: PromptPanel::new(PromptKind::Expert),
            analytics: AnalyticsPanel::default(),
            courses: CoursesPanel::default(),
            confirmation: None,
        }
    }
}

impl DashboardState {
    pub fn collection_mut(&mut self, collection: Collection) -> &mut CollectionPanel {
        match collection {
            Collection::WorkspaceTemplates => &mut self.templates,
            Collection::SharedResources => &mut self.resources,
        }
    }

    pub fn prompt_mut(&mut self, kind: PromptKind) -> &mut PromptPanel {
        match kind {
            PromptKind::Tutor => &mut self.tutor_prompt,
            PromptKind::Expert => &mut self.expert_prompt,
        }
    }

    pub fn poll(&mut self, backend: &Backend, notifications: &mut Notifications) {
        self.templates.poll(backend, notifications);
        self.resources.poll(backend, notifications);
        self.objectives.poll(backend, notifications);
        self.tutor_prompt.poll(notifications);
        self.expert_prompt.poll(notifications);
        self.analytics.poll(notifications);
        self.courses.poll(backend, notifications);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tasks::testing::{backend_for, until, PREFIX};
    use crate::notify::Message;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test(flavor = "multi_thread")]
    async fn finished_batch_clears_selection_and_reloads_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/workspace-templates", PREFIX)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "files": [{"name": "lab1.ipynb", "size": 10, "modified": "2024-03-01T12:30:00"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server.uri());
        let mut notifications = Notifications::default();
        let mut panel = CollectionPanel::new(Collection::WorkspaceTemplates);
        panel.selection.push(SelectedFile {
            path: "lab1.ipynb".into(),
            name: "lab1.ipynb".into(),
            size: 10,
        });

        panel.finish_batch(&backend);
        assert!(panel.selection.is_empty());

        until(|| {
            panel.poll(&backend, &mut notifications);
            panel.loaded
        })
        .await;
        assert_eq!(panel.files.len(), 1);
        assert!(notifications.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rejected_delete_shows_backend_reason_and_keeps_listing() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(format!("{}/shared-resources/data.csv", PREFIX)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": false, "error": "File is in use"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"files": []})))
            .expect(0)
            .mount(&server)
            .await;

        let backend = backend_for(&server.uri());
        let mut notifications = Notifications::default();
        let mut panel = CollectionPanel::new(Collection::SharedResources);

        panel.delete(&backend, "data.csv".into());
        until(|| {
            panel.poll(&backend, &mut notifications);
            !panel.is_deleting()
        })
        .await;

        assert_eq!(notifications.messages(), vec![Message::error("File is in use")]);
        assert!(!panel.is_loading());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn saving_objective_closes_editor_and_reloads() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/learning-objectives/task1", PREFIX)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": "   "})))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(format!("{}/learning-objectives/task1", PREFIX)))
            .and(body_json(json!({"content": "Explain the loop"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{}/learning-objectives", PREFIX)))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"task1": "Explain the loop"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server.uri());
        let mut notifications = Notifications::default();
        let mut panel = ObjectivesPanel::default();

        panel.open_editor(&backend, "task1".into());
        until(|| {
            panel.poll(&backend, &mut notifications);
            panel.editor.as_ref().map_or(false, |e| e.ready)
        })
        .await;
        assert_eq!(panel.editor.as_ref().unwrap().text, "");

        panel.editor.as_mut().unwrap().text = "  Explain the loop\n".into();
        panel.save(&backend);
        until(|| {
            panel.poll(&backend, &mut notifications);
            panel.loaded
        })
        .await;

        assert!(panel.editor.is_none());
        assert_eq!(panel.objectives["task1"].as_deref(), Some("Explain the loop"));
        assert_eq!(
            notifications.messages(),
            vec![Message::success("Learning objective saved successfully!")]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn prompt_save_rejection_names_the_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(format!("{}/prompts/expert", PREFIX)))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"error": "disk full"})),
            )
            .mount(&server)
            .await;

        let backend = backend_for(&server.uri());
        let mut notifications = Notifications::default();
        let mut panel = PromptPanel::new(PromptKind::Expert);
        panel.text = "Be precise.".into();

        panel.save(&backend);
        until(|| {
            panel.poll(&mut notifications);
            !panel.is_saving()
        })
        .await;

        assert_eq!(
            notifications.messages(),
            vec![Message::error("Failed to save expert prompt: disk full")]
        );
    }

    #[test]
    fn prompt_reset_clears_text_with_info() {
        let mut notifications = Notifications::default();
        let mut panel = PromptPanel::new(PromptKind::Tutor);
        panel.text = "old".into();

        panel.reset(&mut notifications);

        assert!(panel.text.is_empty());
        assert_eq!(
            notifications.messages(),
            vec![Message::info(
                "Tutor prompt cleared. Enter a new prompt and save."
            )]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn courses_load_after_user_even_when_user_lookup_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/user", PREFIX)))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "Missing OAuth token"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{}/courses", PREFIX)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": "c1",
                    "title": "Data 101",
                    "description": "",
                    "teachers": ["ada"],
                    "students": []
                }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server.uri());
        let mut notifications = Notifications::default();
        let mut panel = CoursesPanel::default();

        panel.load(&backend);
        until(|| {
            panel.poll(&backend, &mut notifications);
            panel.loaded
        })
        .await;

        assert_eq!(panel.current_user(), CurrentUser::default());
        assert_eq!(panel.courses[0].title, "Data 101");
        assert!(notifications.is_empty());

        let course = panel.courses[0].clone();
        panel.select(&course, &mut notifications);
        assert_eq!(panel.selected, Some(("c1".into(), "Data 101".into())));
        assert_eq!(
            notifications.messages(),
            vec![Message::success("Selected course: Data 101")]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn analytics_snapshot_backs_detail_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/analytics/students", PREFIX)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "username": "ada",
                    "message_count": 4,
                    "first_interaction": 1700000000.0,
                    "last_interaction": 1700003600.0
                }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server.uri());
        let mut notifications = Notifications::default();
        let mut panel = AnalyticsPanel::default();

        panel.refresh(&backend);
        until(|| {
            panel.poll(&mut notifications);
            !panel.is_loading()
        })
        .await;

        panel.selected_student = Some("ada".into());
        assert_eq!(panel.selected_details().unwrap().message_count, 4);
        panel.selected_student = Some("bob".into());
        assert!(panel.selected_details().is_none());
    }

    #[test]
    fn confirmation_questions() {
        assert_eq!(
            Confirmation::DeleteFile {
                collection: Collection::WorkspaceTemplates,
                name: "lab1.ipynb".into()
            }
            .question(),
            "Are you sure you want to delete lab1.ipynb?"
        );
        assert!(Confirmation::ResetPrompt(PromptKind::Expert)
            .question()
            .contains("reset the expert prompt"));
    }
}
