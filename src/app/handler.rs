use crate::app::app::App;
use crate::asset::AssetLoader;
use crate::error::ViewerError;
use crate::settings::Settings;
use std::sync::Arc;
use tokio::runtime::Runtime;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowId};

pub struct AppHandler {
    app: Option<App>,
    settings: Settings,
    model_path: String,
    // Owns the threads the asset loader runs on
    runtime: Runtime,
    error: Option<ViewerError>,
}

impl AppHandler {
    pub fn new(settings: Settings, model_path: String, runtime: Runtime) -> Self {
        Self {
            app: None,
            settings,
            model_path,
            runtime,
            error: None,
        }
    }

    /// Startup failure that ended the event loop, if any
    pub fn take_error(&mut self) -> Option<ViewerError> {
        self.error.take()
    }

    fn create_app(&self, event_loop: &ActiveEventLoop) -> Result<App, ViewerError> {
        let window_attrs = Window::default_attributes()
            .with_title("rigview")
            .with_inner_size(winit::dpi::LogicalSize::new(1200.0, 800.0));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let loader = AssetLoader::new(self.runtime.handle().clone());
        App::new(window, self.settings.clone(), &loader, &self.model_path)
    }
}

impl ApplicationHandler for AppHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.app.is_some() {
            return;
        }
        match self.create_app(event_loop) {
            Ok(app) => self.app = Some(app),
            Err(e) => {
                log::error!("Failed to start viewer: {}", e);
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(app) = &mut self.app {
            let response = app.handle_event(&event);
            if response.repaint {
                app.window.request_redraw();
            }
            if response.exit {
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(app) = &mut self.app {
            if let Err(e) = app.render() {
                log::error!("Render error: {:?}", e);
            }
            app.window.request_redraw();
        }
    }
}
