use crate::animation::{AnimationController, ControllerMode, ControllerPhase};
use crate::asset::LoadProgress;

/// Where the model load stands, as shown in the panel
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loading(Option<LoadProgress>),
    Failed(String),
    Ready,
}

/// What the user asked for this frame
#[derive(Debug, Default, PartialEq)]
pub struct UiResponse {
    pub selected_clip: Option<String>,
    pub reset_camera: bool,
}

pub struct Ui {
    selection_error: Option<String>,
}

impl Ui {
    pub fn new() -> Self {
        Self {
            selection_error: None,
        }
    }

    /// Shown until the next successful selection
    pub fn set_selection_error(&mut self, error: Option<String>) {
        self.selection_error = error;
    }

    pub fn show(
        &mut self,
        ctx: &egui::Context,
        controller: Option<&AnimationController>,
        load: &LoadStatus,
    ) -> UiResponse {
        let mut response = UiResponse::default();

        egui::Window::new("🎬 Animation")
            .default_width(280.0)
            .resizable(true)
            .show(ctx, |ui| {
                match load {
                    LoadStatus::Loading(progress) => {
                        let fraction = progress.and_then(|p| p.fraction()).unwrap_or(0.0);
                        ui.label("Loading model...");
                        ui.add(egui::ProgressBar::new(fraction).show_percentage());
                    }
                    LoadStatus::Failed(message) => {
                        ui.colored_label(egui::Color32::RED, format!("⚠ {}", message));
                    }
                    LoadStatus::Ready => {}
                }

                if let Some(controller) = controller {
                    response.selected_clip = self.show_clip_picker(ui, controller);
                    ui.separator();
                    show_state(ui, controller);
                }

                if let Some(error) = &self.selection_error {
                    ui.colored_label(egui::Color32::RED, error);
                }

                ui.separator();
                if ui.button("🔄 Reset camera").clicked() {
                    response.reset_camera = true;
                }
            });

        response
    }

    fn show_clip_picker(
        &mut self,
        ui: &mut egui::Ui,
        controller: &AnimationController,
    ) -> Option<String> {
        let active = controller.active_clip().unwrap_or("").to_string();
        let mut selected = active.clone();
        let manual = controller.mode() == ControllerMode::Manual;

        ui.add_enabled_ui(manual, |ui| {
            egui::ComboBox::from_label("Clip")
                .selected_text(&selected)
                .show_ui(ui, |ui| {
                    for clip in controller.clips() {
                        ui.selectable_value(&mut selected, clip.name.clone(), &clip.name);
                    }
                });
        });

        (selected != active).then_some(selected)
    }
}

fn phase_label(phase: ControllerPhase) -> &'static str {
    match phase {
        ControllerPhase::Unbound => "Unbound",
        ControllerPhase::Idle => "Idle",
        ControllerPhase::Transitioning { returning: false } => "Crossfading",
        ControllerPhase::Transitioning { returning: true } => "Returning to default",
        ControllerPhase::OneShotPlaying => "Playing once",
        ControllerPhase::PlayingA => "Playing A",
        ControllerPhase::PlayingB => "Playing B",
    }
}

fn show_state(ui: &mut egui::Ui, controller: &AnimationController) {
    let mode = match controller.mode() {
        ControllerMode::Manual => "Manual",
        ControllerMode::AutoAlternate => "Auto-alternate",
    };
    ui.label(format!("Mode: {}", mode));
    ui.label(egui::RichText::new(phase_label(controller.phase())).strong());
    ui.label(format!("Current: {}", controller.current_clip().unwrap_or("-")));
    if let Some(pending) = controller.pending_clip() {
        ui.label(format!("Fading to: {}", pending));
    }
}
