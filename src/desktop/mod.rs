//! Desktop host
//!
//! [`WindowHost`] on top of winit windows painted with softbuffer (frames
//! drawn with tiny-skia, text rasterized with swash), with
//! global shortcuts from global-hotkey. Window creation needs the event loop
//! target, so controllers get a short-lived [`HostFrame`] for each batch of
//! work inside the event loop callback.

pub mod content;
pub mod platform;
pub mod render;
pub mod text;

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use parking_lot::Mutex;
use softbuffer::{Context, Surface};
use tracing::{debug, info, warn};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{EventLoopProxy, EventLoopWindowTarget};
use winit::keyboard::{Key, ModifiersState, NamedKey};
use winit::window::{Window, WindowBuilder, WindowId, WindowLevel};

use crate::config::{AppConfig, TimeBarConfig};
use crate::error::ShellError;
use crate::host::{
    Display, HostEvent, HotkeyAction, Point, Rect, StackLevel, WindowContent, WindowHandle,
    WindowHost, WindowMessage, WindowSpec,
};
use crate::reader::BionicReader;
use crate::shortcut::Shortcut;
use crate::ticker::{earliest, Ticker};
use crate::ui::{ContentView, DashboardInput, DashboardView};
use content::{FocusBand, PageContent, TimeBarContent, TimerState};
use render::Canvas;
use text::TextRenderer;

/// Repaint rate of a running time bar clock
const CLOCK_INTERVAL: Duration = Duration::from_secs(1);

enum Content {
    Dashboard,
    Focus(FocusBand),
    TimeBar(TimeBarContent),
    Page(PageContent),
    Reader(BionicReader),
}

struct HostWindow {
    window: Rc<Window>,
    surface: Surface<Rc<Window>, Rc<Window>>,
    _context: Context<Rc<Window>>,
    content: Content,
    /// Last pointer position inside the window
    pointer: Option<PhysicalPosition<f64>>,
}

pub struct DesktopHost {
    windows: HashMap<WindowHandle, HostWindow>,
    by_id: HashMap<WindowId, WindowHandle>,
    next_id: u64,
    hotkeys: Option<GlobalHotKeyManager>,
    bindings: Arc<Mutex<HashMap<u32, HotkeyAction>>>,
    last_cursor: Option<Point>,
    modifiers: ModifiersState,
    /// Requests raised by window content, drained by the event loop
    pending: Vec<HostEvent>,
    clock: Option<Ticker>,
    timebar: TimeBarConfig,
    dashboard_title: String,
    text: TextRenderer,
}

impl DesktopHost {
    pub fn new(proxy: EventLoopProxy<HostEvent>, config: &AppConfig) -> Self {
        let bindings: Arc<Mutex<HashMap<u32, HotkeyAction>>> = Arc::new(Mutex::new(HashMap::new()));

        let hotkeys = match GlobalHotKeyManager::new() {
            Ok(manager) => {
                let proxy = Mutex::new(proxy);
                let handler_bindings = Arc::clone(&bindings);
                GlobalHotKeyEvent::set_event_handler(Some(move |event: GlobalHotKeyEvent| {
                    if event.state != HotKeyState::Pressed {
                        return;
                    }
                    let action = handler_bindings.lock().get(&event.id).copied();
                    if let Some(action) = action {
                        let _ = proxy.lock().send_event(HostEvent::Hotkey(action));
                    }
                }));
                Some(manager)
            }
            Err(e) => {
                warn!("Global shortcuts unavailable: {:?}", e);
                None
            }
        };

        DesktopHost {
            windows: HashMap::new(),
            by_id: HashMap::new(),
            next_id: 1,
            hotkeys,
            bindings,
            last_cursor: None,
            modifiers: ModifiersState::empty(),
            pending: Vec::new(),
            clock: None,
            timebar: config.timebar.clone(),
            dashboard_title: config.dashboard.title.clone(),
            text: TextRenderer::system(),
        }
    }

    /// Borrow the host together with the loop target for one batch of calls
    pub fn frame<'a>(&'a mut self, target: &'a EventLoopWindowTarget<HostEvent>) -> HostFrame<'a> {
        HostFrame { host: self, target }
    }

    pub fn handle_of(&self, id: WindowId) -> Option<WindowHandle> {
        self.by_id.get(&id).copied()
    }

    /// Inner size of the dashboard window, if one is open
    pub fn dashboard_size(&self) -> Option<(u32, u32)> {
        self.windows
            .values()
            .find(|w| matches!(w.content, Content::Dashboard))
            .map(|w| {
                let size = w.window.inner_size();
                (size.width, size.height)
            })
    }

    pub fn request_dashboard_redraw(&self) {
        for w in self.windows.values() {
            if matches!(w.content, Content::Dashboard) {
                w.window.request_redraw();
            }
        }
    }

    /// Content requests raised since the last call
    pub fn drain_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.pending)
    }

    fn queue_timebar(&mut self, sender: WindowHandle, requests: Vec<crate::ipc::TimeBarRequest>) {
        self.pending.extend(
            requests
                .into_iter()
                .map(|request| HostEvent::TimeBar { sender, request }),
        );
    }

    /// Translate raw window input into host events
    pub fn handle_window_event(&mut self, id: WindowId, event: WindowEvent, now: Instant) -> Vec<HostEvent> {
        let Some(handle) = self.handle_of(id) else {
            return Vec::new();
        };

        if let WindowEvent::ModifiersChanged(modifiers) = &event {
            self.modifiers = modifiers.state();
            return Vec::new();
        }

        let modifiers = self.modifiers;
        let mut events = Vec::new();
        let mut timebar_requests = Vec::new();
        let Some(w) = self.windows.get_mut(&handle) else {
            return events;
        };

        match event {
            WindowEvent::CloseRequested => events.push(HostEvent::CloseRequested(handle)),
            WindowEvent::Resized(_) => w.window.request_redraw(),
            WindowEvent::CursorMoved { position, .. } => {
                w.pointer = Some(position);
                if let Ok(origin) = w.window.inner_position() {
                    self.last_cursor = Some(Point {
                        x: origin.x + position.x as i32,
                        y: origin.y + position.y as i32,
                    });
                }
            }
            WindowEvent::CursorEntered { .. } => {
                if let Content::TimeBar(ref mut timer) = w.content {
                    timebar_requests = timer.hover(true);
                    w.window.request_redraw();
                }
            }
            WindowEvent::CursorLeft { .. } => {
                w.pointer = None;
                if let Content::TimeBar(ref mut timer) = w.content {
                    timebar_requests = timer.hover(false);
                    w.window.request_redraw();
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Content::TimeBar(ref mut timer) = w.content {
                    let step = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y.signum() as i32,
                        MouseScrollDelta::PixelDelta(p) => p.y.signum() as i32,
                    };
                    timer.adjust_minutes(step);
                    w.window.request_redraw();
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => match w.content {
                Content::Dashboard => {
                    if let Some(pointer) = w.pointer {
                        events.push(HostEvent::Dashboard(DashboardInput::Click {
                            x: pointer.x,
                            y: pointer.y,
                        }));
                    }
                }
                Content::TimeBar(ref mut timer) => {
                    timebar_requests = timer.click(now);
                    w.window.request_redraw();
                }
                _ => {}
            },
            WindowEvent::KeyboardInput { event, .. } => {
                let dashboard = matches!(w.content, Content::Dashboard);
                if dashboard && event.state == ElementState::Pressed && !event.repeat {
                    if let Some(key) = key_name(&event.logical_key) {
                        events.push(HostEvent::Dashboard(DashboardInput::Key {
                            key,
                            ctrl: modifiers.control_key(),
                            meta: modifiers.super_key(),
                            shift: modifiers.shift_key(),
                            alt: modifiers.alt_key(),
                        }));
                    }
                }
            }
            _ => {}
        }

        self.queue_timebar(handle, timebar_requests);
        events
    }

    /// Advance time bar timers and keep running clocks repainted
    pub fn tick(&mut self, now: Instant) {
        let mut raised = Vec::new();
        let mut any_running = false;
        for (handle, w) in self.windows.iter_mut() {
            if let Content::TimeBar(ref mut timer) = w.content {
                let requests = timer.tick(now);
                if !requests.is_empty() {
                    w.window.request_redraw();
                    raised.push((*handle, requests));
                }
                any_running |= matches!(timer.state(), TimerState::Running { .. });
            }
        }
        for (handle, requests) in raised {
            self.queue_timebar(handle, requests);
        }

        match (&mut self.clock, any_running) {
            (Some(clock), true) => {
                if clock.fire(now) {
                    for w in self.windows.values() {
                        if matches!(w.content, Content::TimeBar(_)) {
                            w.window.request_redraw();
                        }
                    }
                }
            }
            (None, true) => self.clock = Some(Ticker::start(CLOCK_INTERVAL, now)),
            (_, false) => self.clock = None,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        let timers = self.windows.values().map(|w| match w.content {
            Content::TimeBar(ref timer) => timer.next_deadline(),
            _ => None,
        });
        earliest(timers.chain(std::iter::once(self.clock.map(|c| c.next_due()))))
    }

    /// Repaint one window
    pub fn paint<V: ContentView>(&mut self, id: WindowId, view: &DashboardView<V>, now: Instant) -> Result<()> {
        let Some(handle) = self.handle_of(id) else {
            return Ok(());
        };
        let title = self.dashboard_title.clone();
        let Some(w) = self.windows.get_mut(&handle) else {
            return Ok(());
        };

        let size = w.window.inner_size();
        let (Some(width), Some(height)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) else {
            return Ok(());
        };
        w.surface
            .resize(width, height)
            .map_err(|e| anyhow!("Failed to resize surface: {}", e))?;

        let Some(mut canvas) = Canvas::new(size.width, size.height, &mut self.text) else {
            return Ok(());
        };
        match w.content {
            Content::Dashboard => render::paint_dashboard(&mut canvas, view, &title, now),
            Content::Focus(ref band) => render::paint_focus(&mut canvas, band),
            Content::TimeBar(ref timer) => render::paint_timebar(&mut canvas, timer, now),
            Content::Page(ref page) => render::paint_page(&mut canvas, page),
            Content::Reader(ref reader) => render::paint_reader_window(&mut canvas, reader),
        }

        let mut buffer = w
            .surface
            .buffer_mut()
            .map_err(|e| anyhow!("Failed to map frame buffer: {}", e))?;
        canvas.present(&mut buffer);
        buffer
            .present()
            .map_err(|e| anyhow!("Failed to present frame: {}", e))?;
        Ok(())
    }

    fn create(&mut self, spec: WindowSpec, target: &EventLoopWindowTarget<HostEvent>) -> Result<WindowHandle, ShellError> {
        let creation_error = |reason: String| ShellError::WindowCreation {
            title: spec.title.clone(),
            reason,
        };

        let mut builder = WindowBuilder::new()
            .with_title(spec.title.clone())
            .with_position(PhysicalPosition::new(spec.bounds.x, spec.bounds.y))
            .with_inner_size(PhysicalSize::new(spec.bounds.width.max(1), spec.bounds.height.max(1)))
            .with_decorations(!spec.frameless)
            .with_resizable(!spec.frameless)
            .with_transparent(spec.transparent)
            .with_visible(spec.visible)
            .with_active(spec.focusable);
        if let Some((width, height)) = spec.min_size {
            builder = builder.with_min_inner_size(PhysicalSize::new(width, height));
        }
        if spec.level.is_some() {
            builder = builder.with_window_level(WindowLevel::AlwaysOnTop);
        }
        #[cfg(windows)]
        {
            use winit::platform::windows::WindowBuilderExtWindows;
            builder = builder.with_skip_taskbar(spec.skip_taskbar);
        }

        let window = Rc::new(builder.build(target).map_err(|e| creation_error(e.to_string()))?);
        let context = Context::new(window.clone()).map_err(|e| creation_error(e.to_string()))?;
        let surface = Surface::new(&context, window.clone()).map_err(|e| creation_error(e.to_string()))?;

        if spec.click_through {
            if let Err(e) = window.set_cursor_hittest(false) {
                warn!("Click-through unsupported for '{}': {}", spec.title, e);
            }
        }
        if spec.level == Some(StackLevel::ScreenSaver) {
            platform::raise_topmost(&window);
        }

        let content = match spec.content {
            WindowContent::Dashboard => Content::Dashboard,
            WindowContent::FocusOverlay => {
                let band = FocusBand::new(Point {
                    x: spec.bounds.x,
                    y: spec.bounds.y,
                });
                platform::apply_overlay_opacity(&window, band.settings.opacity);
                Content::Focus(band)
            }
            WindowContent::TimeBar => Content::TimeBar(TimeBarContent::new(&self.timebar)),
            WindowContent::Page(page) => {
                if let Err(e) = open::that(&page) {
                    warn!("Failed to open {}: {}", page.display(), e);
                }
                Content::Page(PageContent { page })
            }
            WindowContent::Reader => Content::Reader(BionicReader::new()),
        };

        let handle = WindowHandle(self.next_id);
        self.next_id += 1;
        self.by_id.insert(window.id(), handle);
        window.request_redraw();
        self.windows.insert(
            handle,
            HostWindow {
                window,
                surface,
                _context: context,
                content,
                pointer: None,
            },
        );
        debug!("Created window {:?} '{}'", handle, spec.title);
        Ok(handle)
    }

    fn window(&self, handle: WindowHandle) -> Option<&Window> {
        self.windows.get(&handle).map(|w| w.window.as_ref())
    }

    fn deliver(&mut self, handle: WindowHandle, message: WindowMessage) {
        let Some(w) = self.windows.get_mut(&handle) else {
            return;
        };

        let mut requests = Vec::new();
        match (&mut w.content, message) {
            (Content::Focus(band), WindowMessage::FocusSettings(settings)) => {
                platform::apply_overlay_opacity(&w.window, settings.opacity);
                band.settings = settings;
                w.window.request_redraw();
            }
            (Content::Focus(band), WindowMessage::Cursor(point)) => {
                if band.set_cursor(point) {
                    w.window.request_redraw();
                }
            }
            (Content::TimeBar(timer), WindowMessage::ResetTimer) => {
                requests = timer.reset();
                w.window.request_redraw();
            }
            (Content::Reader(reader), WindowMessage::NewText(text)) => {
                if reader.set_text(&text) {
                    w.window.request_redraw();
                }
            }
            (_, message) => debug!("Window {:?} ignores {:?}", handle, message),
        }
        self.queue_timebar(handle, requests);
    }

    fn displays(&self, target: &EventLoopWindowTarget<HostEvent>) -> Vec<Display> {
        let primary = target.primary_monitor();
        target
            .available_monitors()
            .map(|monitor| {
                let position = monitor.position();
                let size = monitor.size();
                let bounds = Rect {
                    x: position.x,
                    y: position.y,
                    width: size.width,
                    height: size.height,
                };
                let is_primary = primary.as_ref() == Some(&monitor);
                let work_area = if is_primary {
                    platform::primary_work_area().unwrap_or(bounds)
                } else {
                    bounds
                };
                Display {
                    bounds,
                    work_area,
                    primary: is_primary,
                }
            })
            .collect()
    }
}

/// Logical key as the dashboard's recorder names it
fn key_name(key: &Key) -> Option<String> {
    let name = match key {
        Key::Character(text) => return Some(text.to_string()),
        Key::Named(NamedKey::Space) => " ",
        Key::Named(NamedKey::Escape) => "Escape",
        Key::Named(NamedKey::Enter) => "Enter",
        Key::Named(NamedKey::Tab) => "Tab",
        Key::Named(NamedKey::Backspace) => "Backspace",
        Key::Named(NamedKey::Delete) => "Delete",
        Key::Named(NamedKey::Insert) => "Insert",
        Key::Named(NamedKey::Home) => "Home",
        Key::Named(NamedKey::End) => "End",
        Key::Named(NamedKey::PageUp) => "PageUp",
        Key::Named(NamedKey::PageDown) => "PageDown",
        Key::Named(NamedKey::ArrowUp) => "Up",
        Key::Named(NamedKey::ArrowDown) => "Down",
        Key::Named(NamedKey::ArrowLeft) => "Left",
        Key::Named(NamedKey::ArrowRight) => "Right",
        Key::Named(NamedKey::F1) => "F1",
        Key::Named(NamedKey::F2) => "F2",
        Key::Named(NamedKey::F3) => "F3",
        Key::Named(NamedKey::F4) => "F4",
        Key::Named(NamedKey::F5) => "F5",
        Key::Named(NamedKey::F6) => "F6",
        Key::Named(NamedKey::F7) => "F7",
        Key::Named(NamedKey::F8) => "F8",
        Key::Named(NamedKey::F9) => "F9",
        Key::Named(NamedKey::F10) => "F10",
        Key::Named(NamedKey::F11) => "F11",
        Key::Named(NamedKey::F12) => "F12",
        Key::Named(NamedKey::Shift) => "Shift",
        Key::Named(NamedKey::Control) => "Control",
        Key::Named(NamedKey::Alt) => "Alt",
        Key::Named(NamedKey::Super) => "Meta",
        _ => return None,
    };
    Some(name.to_string())
}

/// [`DesktopHost`] plus the loop target, valid for one event callback
pub struct HostFrame<'a> {
    host: &'a mut DesktopHost,
    target: &'a EventLoopWindowTarget<HostEvent>,
}

impl WindowHost for HostFrame<'_> {
    fn displays(&self) -> Vec<Display> {
        self.host.displays(self.target)
    }

    fn create_window(&mut self, spec: WindowSpec) -> Result<WindowHandle, ShellError> {
        self.host.create(spec, self.target)
    }

    fn is_alive(&self, window: WindowHandle) -> bool {
        self.host.windows.contains_key(&window)
    }

    fn show(&mut self, window: WindowHandle) {
        if let Some(w) = self.host.window(window) {
            w.set_visible(true);
        }
    }

    fn hide(&mut self, window: WindowHandle) {
        if let Some(w) = self.host.window(window) {
            w.set_visible(false);
        }
    }

    fn focus(&mut self, window: WindowHandle) {
        if let Some(w) = self.host.window(window) {
            w.focus_window();
        }
    }

    fn minimize(&mut self, window: WindowHandle) {
        if let Some(w) = self.host.window(window) {
            w.set_minimized(true);
        }
    }

    fn destroy(&mut self, window: WindowHandle) {
        if let Some(w) = self.host.windows.remove(&window) {
            self.host.by_id.remove(&w.window.id());
            debug!("Destroyed window {:?}", window);
        }
    }

    fn set_stack_level(&mut self, window: WindowHandle, level: StackLevel) {
        if let Some(w) = self.host.window(window) {
            w.set_window_level(WindowLevel::AlwaysOnTop);
            if level == StackLevel::ScreenSaver {
                platform::raise_topmost(w);
            }
        }
    }

    fn raise(&mut self, window: WindowHandle) {
        if let Some(w) = self.host.window(window) {
            platform::raise_topmost(w);
        }
    }

    fn set_click_through(&mut self, window: WindowHandle, enabled: bool) {
        if let Some(w) = self.host.window(window) {
            if let Err(e) = w.set_cursor_hittest(!enabled) {
                debug!("Click-through change failed: {}", e);
            }
        }
    }

    fn set_size(&mut self, window: WindowHandle, width: u32, height: u32) {
        if let Some(w) = self.host.window(window) {
            let _ = w.request_inner_size(PhysicalSize::new(width.max(1), height.max(1)));
            w.request_redraw();
        }
    }

    fn send(&mut self, window: WindowHandle, message: WindowMessage) {
        self.host.deliver(window, message);
    }

    fn cursor_position(&mut self) -> Option<Point> {
        platform::cursor_position().or(self.host.last_cursor)
    }

    fn register_shortcut(&mut self, shortcut: &Shortcut, action: HotkeyAction) -> Result<(), ShellError> {
        let Some(ref manager) = self.host.hotkeys else {
            return Err(ShellError::ShortcutRegistration {
                accelerator: shortcut.accelerator().to_string(),
                reason: "global shortcuts unavailable".to_string(),
            });
        };

        manager
            .register(shortcut.hotkey())
            .map_err(|e| ShellError::ShortcutRegistration {
                accelerator: shortcut.accelerator().to_string(),
                reason: e.to_string(),
            })?;
        self.host.bindings.lock().insert(shortcut.id(), action);
        info!("Registered global shortcut {}", shortcut.accelerator());
        Ok(())
    }

    fn unregister_shortcut(&mut self, shortcut: &Shortcut) {
        if let Some(ref manager) = self.host.hotkeys {
            if let Err(e) = manager.unregister(shortcut.hotkey()) {
                warn!("Failed to unregister {}: {}", shortcut.accelerator(), e);
            }
        }
        self.host.bindings.lock().remove(&shortcut.id());
    }

    fn beep(&mut self) {
        platform::beep();
    }
}
