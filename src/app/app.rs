use crate::animation::AnimationController;
use crate::asset::{AssetLoader, LoadHandle, LoadedModel, error_chain};
use crate::clock::Clock;
use crate::error::ViewerError;
use crate::renderer::{CameraController, CameraState, Renderer};
use crate::scene::Scene;
use crate::settings::Settings;
use crate::ui::{LoadStatus, Ui, UiResponse};
use egui_wgpu::ScreenDescriptor;
use egui_winit::State;
use std::sync::Arc;
use winit::window::Window;

pub struct EventResponse {
    pub repaint: bool,
    pub exit: bool,
}

pub struct App {
    pub window: Arc<Window>,
    ui: Ui,
    scene: Scene,
    renderer: Renderer,
    camera_controller: CameraController,
    controller: Option<AnimationController>,
    load: Option<LoadHandle>,
    load_status: LoadStatus,
    clock: Clock,
    egui_state: State,
    settings: Settings,
}

impl App {
    pub fn new(
        window: Arc<Window>,
        settings: Settings,
        loader: &AssetLoader,
        model_path: &str,
    ) -> Result<Self, ViewerError> {
        let scene = Scene::new(&settings.display, &settings.lights);
        let renderer = pollster::block_on(Renderer::new(window.clone(), &scene))?;

        let egui_ctx = renderer.egui_context();
        let egui_state = State::new(
            egui_ctx,
            egui::viewport::ViewportId::ROOT,
            &*window,
            None,
            None,
            None,
        );

        let mut camera_controller =
            CameraController::new(CameraState::from_settings(&settings.camera));
        let (width, height) = renderer.size();
        camera_controller.on_resize(width, height);

        Ok(Self {
            window,
            ui: Ui::new(),
            scene,
            renderer,
            camera_controller,
            controller: None,
            load: Some(loader.load(model_path)),
            load_status: LoadStatus::Loading(None),
            clock: Clock::new(),
            egui_state,
            settings,
        })
    }

    pub fn handle_event(&mut self, event: &winit::event::WindowEvent) -> EventResponse {
        // Let egui handle the event first
        let egui_response = self.egui_state.on_window_event(&self.window, event);
        let ignored = EventResponse {
            repaint: egui_response.repaint,
            exit: false,
        };

        match event {
            winit::event::WindowEvent::CloseRequested => {
                return EventResponse {
                    repaint: false,
                    exit: true,
                };
            }
            winit::event::WindowEvent::KeyboardInput { event, .. } => {
                if egui_response.consumed {
                    return ignored;
                }
                if event.logical_key
                    == winit::keyboard::Key::Named(winit::keyboard::NamedKey::Escape)
                {
                    return EventResponse {
                        repaint: false,
                        exit: true,
                    };
                }
            }
            winit::event::WindowEvent::Resized(size) => {
                self.resize(*size);
            }
            winit::event::WindowEvent::ScaleFactorChanged { .. } => {
                self.resize(self.window.inner_size());
            }
            winit::event::WindowEvent::MouseInput { state, button, .. } => {
                let pressed = *state == winit::event::ElementState::Pressed;
                // Releases always reach the camera so a drag never sticks
                if egui_response.consumed && pressed {
                    return ignored;
                }
                self.camera_controller.on_mouse_button(*button, pressed);
            }
            winit::event::WindowEvent::CursorMoved { position, .. } => {
                if egui_response.consumed {
                    return ignored;
                }
                self.camera_controller
                    .on_mouse_move((position.x, position.y));
            }
            winit::event::WindowEvent::MouseWheel { delta, .. } => {
                if egui_response.consumed {
                    return ignored;
                }
                let scroll = match delta {
                    winit::event::MouseScrollDelta::LineDelta(_, y) => *y,
                    winit::event::MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.05,
                };
                self.camera_controller.zoom(scroll);
            }
            _ => {}
        }

        EventResponse {
            repaint: false,
            exit: false,
        }
    }

    fn resize(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        self.renderer.resize(size);
        self.camera_controller.on_resize(size.width, size.height);
    }

    /// Take the load result once it arrives and build the controller for it.
    fn poll_load(&mut self) {
        let Some(handle) = self.load.as_mut() else {
            return;
        };
        let progress = handle.progress();
        let Some(result) = handle.poll() else {
            self.load_status = LoadStatus::Loading(progress);
            return;
        };
        let path = handle.path().to_string();
        self.load = None;

        match result {
            Ok(model) => {
                log::info!("Loaded '{}' ({} clips)", path, model.clips.len());
                self.install_model(model);
            }
            Err(e) => {
                let message = error_chain(&e);
                log::error!("{}", message);
                self.load_status = LoadStatus::Failed(message);
            }
        }
    }

    fn install_model(&mut self, model: LoadedModel) {
        self.renderer.set_model(&model);
        self.load_status = LoadStatus::Ready;

        match self.settings.animation.start_controller(model.clips.clone()) {
            Ok(controller) => self.controller = Some(controller),
            Err(e) => {
                log::error!("{}", e);
                self.load_status = LoadStatus::Failed(e.to_string());
            }
        }

        self.scene.set_model(model);
    }

    fn apply_ui(&mut self, response: UiResponse) {
        if response.reset_camera {
            self.camera_controller.reset();
        }

        let (Some(name), Some(controller)) = (response.selected_clip, self.controller.as_mut())
        else {
            return;
        };
        match controller.select_clip(&name) {
            Ok(()) => self.ui.set_selection_error(None),
            Err(e) => self.ui.set_selection_error(Some(e.to_string())),
        }
    }

    /// Advance animation by one frame and draw it.
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.poll_load();

        let frame = self.clock.tick();
        if let Some(controller) = self.controller.as_mut() {
            controller.update(frame);
            if let Some(model) = self.scene.model() {
                let pose = controller.pose(self.scene.rest_pose());
                let globals = model.global_transforms(&pose);
                self.renderer.update_pose(model, &globals);
            }
        }
        self.renderer
            .update_scene(self.camera_controller.state(), &self.scene);

        let raw_input = self.egui_state.take_egui_input(&self.window);
        let egui_ctx = self.renderer.egui_context();
        let mut response = UiResponse::default();
        let full_output = egui_ctx.run(raw_input, |ctx| {
            response = self
                .ui
                .show(ctx, self.controller.as_ref(), &self.load_status);
        });
        self.apply_ui(response);

        self.egui_state
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let (width, height) = self.renderer.size();
        let screen_descriptor = ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: full_output.pixels_per_point,
        };

        match self
            .renderer
            .render(paint_jobs, full_output.textures_delta, screen_descriptor)
        {
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.resize(self.window.inner_size());
                Ok(())
            }
            other => other,
        }
    }
}
