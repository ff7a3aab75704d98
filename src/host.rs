//! Host windowing seam
//!
//! Everything the controllers need from the windowing framework goes through
//! [`WindowHost`]: window creation and visibility, stacking, click-through,
//! global shortcuts, the cursor, displays and the system bell. The desktop
//! binary implements it with winit (see [`crate::desktop`]); tests use
//! [`testing::FakeHost`].
//!
//! Window handles can die underneath us (the user closes a window between two
//! ticks), so every host call on a dead handle must be a silent no-op.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ShellError;
use crate::ipc::TimeBarRequest;
use crate::overlay::OverlaySettings;
use crate::shortcut::Shortcut;
use crate::ui::DashboardInput;

/// Host-assigned identity of a window, stable for its whole life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowHandle(pub u64);

/// Screen coordinates in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Display {
    pub bounds: Rect,
    /// Bounds minus taskbars and docks
    pub work_area: Rect,
    pub primary: bool,
}

/// Always-on-top tiers, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StackLevel {
    Floating,
    /// Highest tier, above fullscreen apps
    ScreenSaver,
}

/// What a window renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowContent {
    Dashboard,
    FocusOverlay,
    TimeBar,
    Page(PathBuf),
    /// Native bionic reader fed with clipboard text
    Reader,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowSpec {
    pub title: String,
    pub bounds: Rect,
    pub min_size: Option<(u32, u32)>,
    pub frameless: bool,
    pub transparent: bool,
    pub level: Option<StackLevel>,
    pub skip_taskbar: bool,
    pub focusable: bool,
    pub click_through: bool,
    pub visible: bool,
    pub content: WindowContent,
}

impl WindowSpec {
    /// Plain decorated, focusable, visible window
    pub fn normal(title: impl Into<String>, bounds: Rect, content: WindowContent) -> Self {
        WindowSpec {
            title: title.into(),
            bounds,
            min_size: None,
            frameless: false,
            transparent: false,
            level: None,
            skip_taskbar: false,
            focusable: true,
            click_through: false,
            visible: true,
            content,
        }
    }
}

/// Messages pushed from a controller into a window's content
#[derive(Debug, Clone, PartialEq)]
pub enum WindowMessage {
    FocusSettings(OverlaySettings),
    Cursor(Point),
    ResetTimer,
    NewText(String),
}

/// What a global shortcut does when pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyAction {
    ToggleFocusOverlay,
    ResetTimeBar,
}

/// Inbound events the host loop hands to the shell
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    CloseRequested(WindowHandle),
    Hotkey(HotkeyAction),
    TimeBar {
        sender: WindowHandle,
        request: TimeBarRequest,
    },
    Dashboard(DashboardInput),
}

pub trait WindowHost {
    fn displays(&self) -> Vec<Display>;

    fn primary_display(&self) -> Option<Display> {
        let displays = self.displays();
        displays
            .iter()
            .copied()
            .find(|d| d.primary)
            .or_else(|| displays.first().copied())
    }

    fn create_window(&mut self, spec: WindowSpec) -> Result<WindowHandle, ShellError>;

    fn is_alive(&self, window: WindowHandle) -> bool;

    fn show(&mut self, window: WindowHandle);

    fn hide(&mut self, window: WindowHandle);

    fn focus(&mut self, window: WindowHandle);

    fn minimize(&mut self, window: WindowHandle);

    fn destroy(&mut self, window: WindowHandle);

    fn set_stack_level(&mut self, window: WindowHandle, level: StackLevel);

    /// Move above sibling windows of the same tier
    fn raise(&mut self, window: WindowHandle);

    fn set_click_through(&mut self, window: WindowHandle, enabled: bool);

    fn set_size(&mut self, window: WindowHandle, width: u32, height: u32);

    fn send(&mut self, window: WindowHandle, message: WindowMessage);

    fn cursor_position(&mut self) -> Option<Point>;

    fn register_shortcut(
        &mut self,
        shortcut: &Shortcut,
        action: HotkeyAction,
    ) -> Result<(), ShellError>;

    fn unregister_shortcut(&mut self, shortcut: &Shortcut);

    /// Audible alert
    fn beep(&mut self);
}

#[cfg(test)]
pub mod testing {
    //! Recording host used by the controller and shell tests

    use super::*;
    use std::collections::{BTreeMap, HashMap, HashSet};

    /// Every effectful host call, in order. Liveness checks are not recorded.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Create(WindowHandle),
        Show(WindowHandle),
        Hide(WindowHandle),
        Focus(WindowHandle),
        Minimize(WindowHandle),
        Destroy(WindowHandle),
        StackLevel(WindowHandle, StackLevel),
        Raise(WindowHandle),
        ClickThrough(WindowHandle, bool),
        Size(WindowHandle, u32, u32),
        Send(WindowHandle, WindowMessage),
        CursorQuery,
        Register(String),
        Unregister(String),
        Beep,
    }

    #[derive(Debug, Clone)]
    pub struct FakeWindow {
        pub spec: WindowSpec,
        pub visible: bool,
        pub focused: bool,
        pub click_through: bool,
        pub level: Option<StackLevel>,
        pub size: (u32, u32),
        pub destroyed: bool,
    }

    pub struct FakeHost {
        pub display_list: Vec<Display>,
        pub windows: BTreeMap<WindowHandle, FakeWindow>,
        pub calls: Vec<Call>,
        pub shortcuts: HashMap<String, HotkeyAction>,
        /// Accelerators another process already owns
        pub taken_shortcuts: HashSet<String>,
        pub cursor: Option<Point>,
        pub fail_creation: bool,
        next_id: u64,
    }

    pub fn display(x: i32, width: u32, height: u32, primary: bool) -> Display {
        let bounds = Rect {
            x,
            y: 0,
            width,
            height,
        };
        Display {
            bounds,
            work_area: Rect {
                height: height - 40,
                ..bounds
            },
            primary,
        }
    }

    impl FakeHost {
        pub fn new() -> Self {
            Self::with_displays(vec![display(0, 1920, 1080, true)])
        }

        pub fn with_displays(display_list: Vec<Display>) -> Self {
            FakeHost {
                display_list,
                windows: BTreeMap::new(),
                calls: Vec::new(),
                shortcuts: HashMap::new(),
                taken_shortcuts: HashSet::new(),
                cursor: Some(Point { x: 10, y: 20 }),
                fail_creation: false,
                next_id: 1,
            }
        }

        pub fn window(&self, handle: WindowHandle) -> &FakeWindow {
            &self.windows[&handle]
        }

        pub fn live_windows(&self) -> Vec<WindowHandle> {
            self.windows
                .iter()
                .filter(|(_, w)| !w.destroyed)
                .map(|(h, _)| *h)
                .collect()
        }

        /// Simulate the user destroying a window behind the controller's back
        pub fn kill(&mut self, handle: WindowHandle) {
            if let Some(window) = self.windows.get_mut(&handle) {
                window.destroyed = true;
                window.visible = false;
            }
        }

        pub fn take_calls(&mut self) -> Vec<Call> {
            std::mem::take(&mut self.calls)
        }

        pub fn messages_to(&self, handle: WindowHandle) -> Vec<WindowMessage> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Send(h, m) if *h == handle => Some(m.clone()),
                    _ => None,
                })
                .collect()
        }

        fn live_mut(&mut self, handle: WindowHandle) -> Option<&mut FakeWindow> {
            self.windows.get_mut(&handle).filter(|w| !w.destroyed)
        }
    }

    impl WindowHost for FakeHost {
        fn displays(&self) -> Vec<Display> {
            self.display_list.clone()
        }

        fn create_window(&mut self, spec: WindowSpec) -> Result<WindowHandle, ShellError> {
            if self.fail_creation {
                return Err(ShellError::WindowCreation {
                    title: spec.title,
                    reason: "refused by test".to_string(),
                });
            }

            let handle = WindowHandle(self.next_id);
            self.next_id += 1;
            self.windows.insert(
                handle,
                FakeWindow {
                    visible: spec.visible,
                    focused: false,
                    click_through: spec.click_through,
                    level: spec.level,
                    size: (spec.bounds.width, spec.bounds.height),
                    destroyed: false,
                    spec,
                },
            );
            self.calls.push(Call::Create(handle));
            Ok(handle)
        }

        fn is_alive(&self, window: WindowHandle) -> bool {
            self.windows.get(&window).is_some_and(|w| !w.destroyed)
        }

        fn show(&mut self, window: WindowHandle) {
            if let Some(w) = self.live_mut(window) {
                w.visible = true;
                self.calls.push(Call::Show(window));
            }
        }

        fn hide(&mut self, window: WindowHandle) {
            if let Some(w) = self.live_mut(window) {
                w.visible = false;
                self.calls.push(Call::Hide(window));
            }
        }

        fn focus(&mut self, window: WindowHandle) {
            if let Some(w) = self.live_mut(window) {
                w.focused = true;
                self.calls.push(Call::Focus(window));
            }
        }

        fn minimize(&mut self, window: WindowHandle) {
            if self.live_mut(window).is_some() {
                self.calls.push(Call::Minimize(window));
            }
        }

        fn destroy(&mut self, window: WindowHandle) {
            if let Some(w) = self.live_mut(window) {
                w.destroyed = true;
                w.visible = false;
                self.calls.push(Call::Destroy(window));
            }
        }

        fn set_stack_level(&mut self, window: WindowHandle, level: StackLevel) {
            if let Some(w) = self.live_mut(window) {
                w.level = Some(level);
                self.calls.push(Call::StackLevel(window, level));
            }
        }

        fn raise(&mut self, window: WindowHandle) {
            if self.live_mut(window).is_some() {
                self.calls.push(Call::Raise(window));
            }
        }

        fn set_click_through(&mut self, window: WindowHandle, enabled: bool) {
            if let Some(w) = self.live_mut(window) {
                w.click_through = enabled;
                self.calls.push(Call::ClickThrough(window, enabled));
            }
        }

        fn set_size(&mut self, window: WindowHandle, width: u32, height: u32) {
            if let Some(w) = self.live_mut(window) {
                w.size = (width, height);
                self.calls.push(Call::Size(window, width, height));
            }
        }

        fn send(&mut self, window: WindowHandle, message: WindowMessage) {
            if self.live_mut(window).is_some() {
                self.calls.push(Call::Send(window, message));
            }
        }

        fn cursor_position(&mut self) -> Option<Point> {
            self.calls.push(Call::CursorQuery);
            self.cursor
        }

        fn register_shortcut(
            &mut self,
            shortcut: &Shortcut,
            action: HotkeyAction,
        ) -> Result<(), ShellError> {
            let accelerator = shortcut.accelerator().to_string();
            if self.taken_shortcuts.contains(&accelerator) || self.shortcuts.contains_key(&accelerator) {
                return Err(ShellError::ShortcutRegistration {
                    accelerator,
                    reason: "already registered".to_string(),
                });
            }
            self.calls.push(Call::Register(accelerator.clone()));
            self.shortcuts.insert(accelerator, action);
            Ok(())
        }

        fn unregister_shortcut(&mut self, shortcut: &Shortcut) {
            let accelerator = shortcut.accelerator().to_string();
            if self.shortcuts.remove(&accelerator).is_some() {
                self.calls.push(Call::Unregister(accelerator));
            }
        }

        fn beep(&mut self) {
            self.calls.push(Call::Beep);
        }
    }
}
