use super::state::{Confirmation, CourseForm, EnrollForm};
use super::AdminDashboard;
use crate::api::PromptKind;
use crate::notify::Severity;
use crate::upload::Collection;
use crate::utils::color::{ColorExt, ACCENT_HEX, ERROR_HEX, INFO_HEX, SUCCESS_HEX};
use crate::utils::file_size::FileSizeUtils;
use crate::utils::time;
use eframe::egui::{self, Align2, Color32, RichText};
use rfd::FileDialog;

/// Clicks collected while drawing, applied once the frame is laid out.
enum UiAction {
    PickFiles(Collection),
    PickFolder(Collection),
    ClearSelection(Collection),
    Upload(Collection),
    RefreshCollection(Collection),
    Ask(Confirmation),
    Confirm,
    Cancel,
    EditObjective(String),
    SaveObjective,
    CloseObjective,
    SavePrompt(PromptKind),
    RefreshAnalytics,
    ShowStudent(String),
    CloseStudent,
    OpenCreateCourse,
    CreateCourse,
    CloseCourseForm,
    AssignMe(String),
    OpenEnroll(String),
    Enroll,
    CloseEnroll,
    SelectCourse(usize),
    RefreshCourses,
    OpenInBrowser,
}

fn severity_color(severity: Severity) -> Color32 {
    match severity {
        Severity::Info => Color32::from_hex_or(INFO_HEX, Color32::BLUE),
        Severity::Success => Color32::from_hex_or(SUCCESS_HEX, Color32::GREEN),
        Severity::Error => Color32::from_hex_or(ERROR_HEX, Color32::RED),
    }
}

fn section_heading(ui: &mut egui::Ui, title: &str) {
    let accent = Color32::from_hex_or(ACCENT_HEX, Color32::LIGHT_BLUE);
    ui.label(RichText::new(title).heading().color(accent));
    ui.add_space(5.0);
}

impl AdminDashboard {
    pub fn render(&mut self, ctx: &egui::Context) {
        let mut actions = Vec::new();

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            self.render_footer(ui, &mut actions);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    ui.add_space(20.0);
                    ui.vertical_centered(|ui| {
                        ui.heading("JELAI Admin Dashboard");
                        ui.add_space(5.0);
                        ui.label(
                            RichText::new("Manage course material, objectives and AI agents")
                                .color(ui.visuals().text_color().gamma_multiply(0.7)),
                        );
                    });
                    ui.add_space(20.0);

                    self.render_courses(ui, &mut actions);
                    ui.add_space(20.0);
                    for collection in Collection::ALL {
                        self.render_collection(ui, collection, &mut actions);
                        ui.add_space(20.0);
                    }
                    self.render_objectives(ui, &mut actions);
                    ui.add_space(20.0);
                    self.render_prompts(ui, &mut actions);
                    ui.add_space(20.0);
                    self.render_analytics(ui, &mut actions);
                    ui.add_space(20.0);
                });
        });

        self.render_dialogs(ctx, &mut actions);
        self.render_notifications(ctx);

        for action in actions {
            self.apply(action);
        }
    }

    fn apply(&mut self, action: UiAction) {
        let backend = self.backend.clone();
        match action {
            UiAction::PickFiles(collection) => {
                if let Some(paths) = FileDialog::new().pick_files() {
                    self.add_files(collection, paths);
                }
            }
            UiAction::PickFolder(collection) => {
                if let Some(folder) = FileDialog::new().pick_folder() {
                    self.add_folder(collection, &folder);
                }
            }
            UiAction::ClearSelection(collection) => {
                self.state.collection_mut(collection).selection.clear()
            }
            UiAction::Upload(collection) => self.upload(collection),
            UiAction::RefreshCollection(collection) => {
                self.state.collection_mut(collection).refresh(&backend)
            }
            UiAction::Ask(confirmation) => self.state.confirmation = Some(confirmation),
            UiAction::Confirm => {
                if let Some(confirmation) = self.state.confirmation.take() {
                    self.confirm(confirmation);
                }
            }
            UiAction::Cancel => self.state.confirmation = None,
            UiAction::EditObjective(task) => self.state.objectives.open_editor(&backend, task),
            UiAction::SaveObjective => self.state.objectives.save(&backend),
            UiAction::CloseObjective => self.state.objectives.close_editor(),
            UiAction::SavePrompt(kind) => self.state.prompt_mut(kind).save(&backend),
            UiAction::RefreshAnalytics => self.state.analytics.refresh(&backend),
            UiAction::ShowStudent(id) => self.state.analytics.selected_student = Some(id),
            UiAction::CloseStudent => self.state.analytics.selected_student = None,
            UiAction::OpenCreateCourse => {
                self.state.courses.create_form = Some(CourseForm::default())
            }
            UiAction::CreateCourse => {
                if let Some(form) = self.state.courses.create_form.take() {
                    self.state.courses.create(&backend, form);
                }
            }
            UiAction::CloseCourseForm => self.state.courses.create_form = None,
            UiAction::AssignMe(course_id) => self.state.courses.assign_me(&backend, course_id),
            UiAction::OpenEnroll(course_id) => {
                self.state.courses.enroll_form = Some(EnrollForm {
                    course_id,
                    student: String::new(),
                })
            }
            UiAction::Enroll => {
                if let Some(form) = self.state.courses.enroll_form.take() {
                    self.state.courses.enroll(&backend, form);
                }
            }
            UiAction::CloseEnroll => self.state.courses.enroll_form = None,
            UiAction::SelectCourse(index) => {
                if let Some(course) = self.state.courses.courses.get(index).cloned() {
                    self.state.courses.select(&course, &mut self.notifications);
                }
            }
            UiAction::RefreshCourses => self.state.courses.refresh(&backend),
            UiAction::OpenInBrowser => {
                let url = self.backend.client().dashboard_url().to_string();
                if let Err(e) = open::that(&url) {
                    self.notifications
                        .error(format!("Could not open {}: {}", url, e));
                }
            }
        }
    }

    fn render_courses(&mut self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        let courses = &self.state.courses;
        let user = courses.current_user();

        ui.group(|ui| {
            section_heading(ui, "Courses");
            ui.horizontal(|ui| {
                if ui.button("➕ Create Course").clicked() {
                    actions.push(UiAction::OpenCreateCourse);
                }
                if ui.button("🔄 Refresh").clicked() {
                    actions.push(UiAction::RefreshCourses);
                }
                if courses.is_busy() {
                    ui.spinner();
                }
                if let Some((_, title)) = &courses.selected {
                    ui.label(format!("Selected: {}", title));
                }
            });
            ui.add_space(8.0);

            if courses.loaded && courses.courses.is_empty() {
                ui.label("No courses available.");
            }

            for (index, course) in courses.courses.iter().enumerate() {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.strong(course.display_name());
                    let description = course.description.as_deref().filter(|d| !d.is_empty());
                    if let Some(description) = description {
                        ui.label(description);
                    }
                    let names = |list: &[String]| {
                        if list.is_empty() {
                            "None".to_string()
                        } else {
                            list.join(", ")
                        }
                    };
                    ui.label(format!("Teachers: {}", names(&course.teachers[..])));
                    ui.label(format!("Students: {}", names(&course.students[..])));
                    ui.horizontal(|ui| {
                        if user.can_assign_teacher()
                            && ui.small_button("Assign Me as Teacher").clicked()
                        {
                            actions.push(UiAction::AssignMe(course.id.clone()));
                        }
                        if user.can_enroll(&course.id)
                            && ui.small_button("Enroll Student").clicked()
                        {
                            actions.push(UiAction::OpenEnroll(course.id.clone()));
                        }
                        if ui.small_button("Select Course").clicked() {
                            actions.push(UiAction::SelectCourse(index));
                        }
                    });
                });
                ui.add_space(4.0);
            }
        });
    }

    fn render_collection(
        &mut self,
        ui: &mut egui::Ui,
        collection: Collection,
        actions: &mut Vec<UiAction>,
    ) {
        let progress = self.coordinator.progress(collection);
        let panel = self.state.collection_mut(collection);

        ui.group(|ui| {
            section_heading(ui, collection.title());

            ui.horizontal(|ui| {
                if ui.button("📄 Select Files").clicked() {
                    actions.push(UiAction::PickFiles(collection));
                }
                if ui.button("📁 Add Folder").clicked() {
                    actions.push(UiAction::PickFolder(collection));
                }
                if !panel.selection.is_empty() && ui.button("✖ Clear").clicked() {
                    actions.push(UiAction::ClearSelection(collection));
                }
            });

            if !panel.selection.is_empty() {
                let total: u64 = panel.selection.iter().map(|f| f.size).sum();
                ui.label(format!(
                    "Selected: {} file(s), {}",
                    panel.selection.len(),
                    FileSizeUtils::format_size(total)
                ));
            }

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                let button = egui::Button::new("📤 Upload").min_size(egui::vec2(120.0, 28.0));
                if ui.add(button).clicked() {
                    actions.push(UiAction::Upload(collection));
                }
                if let Some((settled, total)) = progress {
                    let fraction = settled as f32 / total.max(1) as f32;
                    ui.add(
                        egui::ProgressBar::new(fraction)
                            .text(format!("{}/{} files", settled, total))
                            .fill(Color32::from_hex_or(ACCENT_HEX, Color32::LIGHT_BLUE)),
                    );
                }
            });

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.label(RichText::new("Uploaded").strong());
                if ui.small_button("🔄").on_hover_text("Reload listing").clicked() {
                    actions.push(UiAction::RefreshCollection(collection));
                }
                if panel.is_loading() || panel.is_deleting() {
                    ui.spinner();
                }
            });

            if panel.loaded && panel.files.is_empty() {
                ui.label(collection.empty_text());
            } else if !panel.files.is_empty() {
                egui::Grid::new(("listing", collection.endpoint()))
                    .striped(true)
                    .num_columns(4)
                    .show(ui, |ui| {
                        for file in &panel.files {
                            ui.label(&file.name);
                            ui.label(FileSizeUtils::format_size(file.size));
                            ui.label(
                                file.modified_at()
                                    .map(|t| time::format_date(&t))
                                    .unwrap_or_default(),
                            );
                            if ui.small_button("🗑 Delete").clicked() {
                                actions.push(UiAction::Ask(Confirmation::DeleteFile {
                                    collection,
                                    name: file.name.clone(),
                                }));
                            }
                            ui.end_row();
                        }
                    });
            }
        });
    }

    fn render_objectives(&mut self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        let objectives = &self.state.objectives;

        ui.group(|ui| {
            section_heading(ui, "Learning Objectives");
            ui.horizontal(|ui| {
                let reload = ui.add_enabled(
                    !objectives.is_reloading(),
                    egui::Button::new("🔄 Reload Learning Objectives"),
                );
                if reload.clicked() {
                    actions.push(UiAction::Ask(Confirmation::ReloadObjectives));
                }
                if objectives.is_reloading() {
                    ui.spinner();
                }
            });
            ui.add_space(8.0);

            if objectives.loaded && objectives.objectives.is_empty() {
                ui.label(
                    "No learning objectives found. Upload workspace templates first, then define objectives for each task.",
                );
            }

            for (task, objective) in &objectives.objectives {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.strong(format!("📄 {}", task));
                    match objective.as_deref().filter(|o| !o.trim().is_empty()) {
                        Some(text) => {
                            ui.label(text);
                        }
                        None => {
                            ui.label(RichText::new("No learning objective defined").italics());
                        }
                    }
                    if ui.small_button("Edit Objective").clicked() {
                        actions.push(UiAction::EditObjective(task.clone()));
                    }
                });
                ui.add_space(4.0);
            }
        });
    }

    fn render_prompts(&mut self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        ui.group(|ui| {
            section_heading(ui, "AI Configuration");
            for kind in [PromptKind::Tutor, PromptKind::Expert] {
                let panel = self.state.prompt_mut(kind);
                ui.label(RichText::new(format!("{} Agent Prompt", kind.label())).strong());
                ui.add_enabled(
                    panel.ready,
                    egui::TextEdit::multiline(&mut panel.text)
                        .desired_rows(8)
                        .desired_width(f32::INFINITY)
                        .hint_text(kind.placeholder()),
                );
                ui.horizontal(|ui| {
                    let save = ui.add_enabled(
                        panel.ready && !panel.is_saving(),
                        egui::Button::new("💾 Save"),
                    );
                    if save.clicked() {
                        actions.push(UiAction::SavePrompt(kind));
                    }
                    if ui.button("↺ Reset").clicked() {
                        actions.push(UiAction::Ask(Confirmation::ResetPrompt(kind)));
                    }
                    if panel.is_saving() {
                        ui.spinner();
                    }
                });
                ui.add_space(10.0);
            }
        });
    }

    fn render_analytics(&mut self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        let analytics = &mut self.state.analytics;

        ui.group(|ui| {
            ui.horizontal(|ui| {
                let toggle = if analytics.expanded { "▲" } else { "▼" };
                if ui.button(toggle).clicked() {
                    analytics.expanded = !analytics.expanded;
                }
                section_heading(ui, "Usage Analytics");
                if ui.small_button("🔄").clicked() {
                    actions.push(UiAction::RefreshAnalytics);
                }
                if analytics.is_loading() {
                    ui.spinner();
                }
            });

            if !analytics.expanded {
                return;
            }
            let Some(summary) = &analytics.summary else {
                return;
            };

            egui::Grid::new("analytics_summary")
                .num_columns(4)
                .spacing([30.0, 4.0])
                .show(ui, |ui| {
                    ui.label("Students");
                    ui.label("Messages");
                    ui.label("Avg / student");
                    ui.label("Tasks");
                    ui.end_row();
                    ui.strong(summary.total_students.to_string());
                    ui.strong(summary.total_messages.to_string());
                    ui.strong(summary.avg_messages_per_student.to_string());
                    ui.strong(summary.total_tasks.to_string());
                    ui.end_row();
                });
            ui.add_space(8.0);

            if summary.students.is_empty() {
                ui.label("No student data available.");
                return;
            }

            for student in &summary.students {
                let last = student
                    .last_message
                    .as_ref()
                    .map(time::format_date)
                    .unwrap_or_else(|| "unknown".to_string());
                let text = format!(
                    "{}  ·  Messages: {}  ·  Tasks: {}  ·  Last Activity: {}",
                    student.student_id, student.message_count, student.unique_tasks, last
                );
                let selected =
                    analytics.selected_student.as_deref() == Some(student.student_id.as_str());
                if ui.selectable_label(selected, text).clicked() {
                    actions.push(UiAction::ShowStudent(student.student_id.clone()));
                }
            }
        });
    }

    fn render_dialogs(&mut self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        if let Some(confirmation) = &self.state.confirmation {
            egui::Window::new("Please confirm")
                .collapsible(false)
                .resizable(false)
                .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(confirmation.question());
                    ui.add_space(10.0);
                    ui.horizontal(|ui| {
                        if ui.button("OK").clicked() {
                            actions.push(UiAction::Confirm);
                        }
                        if ui.button("Cancel").clicked() {
                            actions.push(UiAction::Cancel);
                        }
                    });
                });
        }

        if let Some(editor) = self.state.objectives.editor.as_mut() {
            egui::Window::new(format!("Edit Learning Objective: {}", editor.task))
                .collapsible(false)
                .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
                .default_width(500.0)
                .show(ctx, |ui| {
                    ui.label("Learning Objective:");
                    let hint = if editor.ready {
                        "Enter the learning objective for this task..."
                    } else {
                        "Loading existing content..."
                    };
                    ui.add_enabled(
                        editor.ready,
                        egui::TextEdit::multiline(&mut editor.text)
                            .desired_rows(10)
                            .desired_width(f32::INFINITY)
                            .hint_text(hint),
                    );
                    ui.add_space(8.0);
                    ui.horizontal(|ui| {
                        if ui.button("Cancel").clicked() {
                            actions.push(UiAction::CloseObjective);
                        }
                        let save = ui.add_enabled(
                            editor.ready && !editor.is_saving(),
                            egui::Button::new("Save Objective"),
                        );
                        if save.clicked() {
                            actions.push(UiAction::SaveObjective);
                        }
                    });
                });
        }

        if let Some(form) = self.state.courses.create_form.as_mut() {
            egui::Window::new("Create Course")
                .collapsible(false)
                .resizable(false)
                .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label("Course title:");
                    ui.text_edit_singleline(&mut form.title);
                    ui.label("Course description (optional):");
                    ui.text_edit_multiline(&mut form.description);
                    ui.horizontal(|ui| {
                        let create = ui.add_enabled(
                            !form.title.trim().is_empty(),
                            egui::Button::new("Create"),
                        );
                        if create.clicked() {
                            actions.push(UiAction::CreateCourse);
                        }
                        if ui.button("Cancel").clicked() {
                            actions.push(UiAction::CloseCourseForm);
                        }
                    });
                });
        }

        if let Some(form) = self.state.courses.enroll_form.as_mut() {
            egui::Window::new("Enroll Student")
                .collapsible(false)
                .resizable(false)
                .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label("Student username to enroll:");
                    ui.text_edit_singleline(&mut form.student);
                    ui.horizontal(|ui| {
                        let enroll = ui.add_enabled(
                            !form.student.trim().is_empty(),
                            egui::Button::new("Enroll"),
                        );
                        if enroll.clicked() {
                            actions.push(UiAction::Enroll);
                        }
                        if ui.button("Cancel").clicked() {
                            actions.push(UiAction::CloseEnroll);
                        }
                    });
                });
        }

        if let Some(student) = self.state.analytics.selected_details() {
            egui::Window::new("Student Details")
                .collapsible(false)
                .resizable(false)
                .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    egui::Grid::new("student_details").num_columns(2).show(ui, |ui| {
                        for (label, value) in student.details() {
                            ui.label(label);
                            ui.label(value);
                            ui.end_row();
                        }
                    });
                    ui.add_space(8.0);
                    if ui.button("Close").clicked() {
                        actions.push(UiAction::CloseStudent);
                    }
                });
        }
    }

    fn render_notifications(&self, ctx: &egui::Context) {
        if self.notifications.is_empty() {
            return;
        }

        egui::Area::new("notifications")
            .anchor(Align2::RIGHT_TOP, [-20.0, 20.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                ui.set_max_width(320.0);
                for notification in self.notifications.iter() {
                    ui.push_id(notification.id, |ui| {
                        egui::Frame::none()
                            .fill(severity_color(notification.message.severity))
                            .rounding(5.0)
                            .inner_margin(egui::Margin::same(15.0))
                            .show(ui, |ui| {
                                ui.label(
                                    RichText::new(&notification.message.text)
                                        .color(Color32::WHITE),
                                );
                            });
                    });
                    ui.add_space(6.0);
                }
            });
    }

    fn render_footer(&self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        ui.horizontal(|ui| {
            ui.label(
                RichText::new(self.backend.client().dashboard_url().as_str())
                    .color(ui.visuals().text_color().gamma_multiply(0.7)),
            );
            if ui.small_button("Open in browser").clicked() {
                actions.push(UiAction::OpenInBrowser);
            }
            let in_flight = self.coordinator.in_flight();
            if in_flight > 0 {
                ui.colored_label(
                    Color32::from_hex_or(ACCENT_HEX, Color32::LIGHT_BLUE),
                    format!("{} upload batch(es) in progress", in_flight),
                );
            }
        });
    }
}
