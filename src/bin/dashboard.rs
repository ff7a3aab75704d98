//! SuperProductivite.Dashboard - Launcher Process
//!
//! This process manages:
//! - The dashboard window listing the bundled apps
//! - The focus and time bar overlays
//! - Clipboard forwarding to the bionic reader
//! - Dismissing the installer's splash screen once the app list is up

#![windows_subsystem = "windows"]

use std::time::Instant;

use anyhow::{anyhow, Result};
use crossbeam::channel::{unbounded, Receiver};
use tracing::{error, info, warn};
use winit::event::{Event, StartCause, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopWindowTarget};

use super_productivite::clipboard::SystemClipboard;
use super_productivite::config::load_config;
use super_productivite::desktop::content::EmbeddedContent;
use super_productivite::desktop::DesktopHost;
use super_productivite::host::HostEvent;
use super_productivite::ipc::UiEvent;
use super_productivite::registry::AppRegistry;
use super_productivite::shell::DashboardShell;
use super_productivite::splash::dismiss_splash;
use super_productivite::ticker::earliest;
use super_productivite::ui::{DashboardView, FocusPanel};

/// Everything the event loop closure owns
struct App {
    shell: DashboardShell,
    view: DashboardView<EmbeddedContent>,
    host: DesktopHost,
    clipboard: SystemClipboard,
    ui_events: Receiver<UiEvent>,
    splash: Option<String>,
}

impl App {
    fn start(&mut self, target: &EventLoopWindowTarget<HostEvent>, now: Instant) -> Result<()> {
        self.shell
            .start(&mut self.host.frame(target), now)
            .map_err(|e| anyhow!("Failed to open the dashboard: {}", e))?;
        self.drain_ui_events(now);

        if let Some(ref name) = self.splash {
            dismiss_splash(name);
        }
        Ok(())
    }

    fn dispatch(&mut self, event: HostEvent, target: &EventLoopWindowTarget<HostEvent>, now: Instant) {
        match event {
            HostEvent::Dashboard(input) => {
                let requests = self.view.handle_input(input);
                let mut frame = self.host.frame(target);
                for request in requests {
                    self.shell.handle_request(request, &mut frame, now);
                }
                self.host.request_dashboard_redraw();
            }
            other => self.shell.handle_host_event(other, &mut self.host.frame(target)),
        }
    }

    fn drain_ui_events(&mut self, now: Instant) {
        let mut changed = false;
        for event in self.ui_events.try_iter() {
            self.view.apply(event, now);
            changed = true;
        }
        if changed {
            self.host.request_dashboard_redraw();
        }
    }

    fn about_to_wait(&mut self, target: &EventLoopWindowTarget<HostEvent>, now: Instant) {
        self.shell.tick(now, &mut self.host.frame(target), &mut self.clipboard);
        self.host.tick(now);
        for event in self.host.drain_events() {
            self.dispatch(event, target, now);
        }

        self.drain_ui_events(now);
        if self.view.expire_flash(now) {
            self.host.request_dashboard_redraw();
        }

        if self.shell.should_exit() {
            info!("Dashboard closed, exiting");
            target.exit();
            return;
        }

        let deadline = earliest([
            self.shell.next_deadline(),
            self.host.next_deadline(),
            self.view.flash_deadline(),
        ]);
        target.set_control_flow(match deadline {
            Some(at) => ControlFlow::WaitUntil(at),
            None => ControlFlow::Wait,
        });
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    info!("SuperProductivite.Dashboard starting...");

    let config = load_config();
    let apps_dir = config.resolve_apps_dir();
    let registry = AppRegistry::discover(&apps_dir, &config.overlays);

    let event_loop = EventLoopBuilder::<HostEvent>::with_user_event()
        .build()
        .map_err(|e| anyhow!("Failed to create event loop: {}", e))?;
    let host = DesktopHost::new(event_loop.create_proxy(), &config);

    let (ui_tx, ui_rx) = unbounded();
    let focus_identifier = config.overlays.focus.clone();
    let consumer = config.clipboard_consumer().to_string();
    let splash = config.splash_process.clone();
    let shell = DashboardShell::new(config, registry, ui_tx);

    let settings = shell.focus_settings().clone();
    let panel = FocusPanel {
        size: settings.size,
        opacity: settings.opacity,
        active: settings.active,
        shortcut: settings.shortcut.unwrap_or_default(),
        recording: false,
    };
    let content = EmbeddedContent::new(consumer.clone());
    let view = DashboardView::new(focus_identifier, consumer, panel, content);

    let mut app = App {
        shell,
        view,
        host,
        clipboard: SystemClipboard::new(),
        ui_events: ui_rx,
        splash,
    };

    event_loop
        .run(move |event, target| {
            let now = Instant::now();
            match event {
                Event::NewEvents(StartCause::Init) => {
                    if let Err(e) = app.start(target, now) {
                        error!("{:#}", e);
                        target.exit();
                    }
                }
                Event::WindowEvent { window_id, event } => {
                    if let Some((width, height)) = app.host.dashboard_size() {
                        app.view.resize(width, height);
                    }
                    if let WindowEvent::RedrawRequested = event {
                        if let Err(e) = app.host.paint(window_id, &app.view, now) {
                            warn!("Repaint failed: {:#}", e);
                        }
                        return;
                    }
                    for host_event in app.host.handle_window_event(window_id, event, now) {
                        app.dispatch(host_event, target, now);
                    }
                }
                Event::UserEvent(host_event) => app.dispatch(host_event, target, now),
                Event::AboutToWait => app.about_to_wait(target, now),
                Event::LoopExiting => info!("SuperProductivite.Dashboard shutting down"),
                _ => {}
            }
        })
        .map_err(|e| anyhow!("Event loop error: {}", e))?;

    Ok(())
}
