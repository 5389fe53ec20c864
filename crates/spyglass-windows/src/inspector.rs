//! The inspector window.
//!
//! A small top-level window holding the finder slot. Pressing the left
//! button on the slot arms the capture controller; from then on mouse
//! capture routes every move to this window until the button is released.
//! The controller lives in a thread-local so the window procedure can
//! reach it, and it is dropped (disarming any live session) when the
//! window is destroyed.

use std::cell::{Cell, RefCell};
use std::path::PathBuf;

use spyglass_core::{
    CaptureController, Config, FinderState, ForeignProcessExecutor, MetadataSink, MouseButton,
    Point, PointerEvent, ProbeReport, Rect, RemoteInjector, SpyResult, WindowProbe, log_info,
};

use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BLACK_BRUSH, BeginPaint, CreatePen, DT_LEFT, DT_NOPREFIX, DT_WORDBREAK, DrawTextW, Ellipse,
    EndPaint, FrameRect, GetStockObject, HBRUSH, HDC, InvalidateRect, LineTo, MoveToEx,
    NULL_BRUSH, PAINTSTRUCT, PS_SOLID, SelectObject, WHITE_BRUSH,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CW_USEDEFAULT, CreateWindowExW, DefWindowProcW, DispatchMessageW, GetClientRect, GetMessageW,
    IDC_ARROW, LoadCursorW, MSG, PostQuitMessage, RegisterClassW, SW_SHOW, ShowWindow,
    TranslateMessage, WM_CAPTURECHANGED, WM_DESTROY, WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MOUSEMOVE,
    WM_PAINT, WNDCLASSW, WS_CAPTION, WS_EX_TOPMOST, WS_MINIMIZEBOX, WS_OVERLAPPED, WS_SYSMENU,
};
use windows::core::w;

use crate::grab::CursorGrab;
use crate::handle::GdiObject;
use crate::highlight::GdiHighlighter;
use crate::process::Win32Executor;
use crate::window::{Win32Windows, cursor_position};

const WINDOW_WIDTH: i32 = 320;
const WINDOW_HEIGHT: i32 = 120;
const HINT: &str = "Drag the finder over a window to inspect it.";

type Inspector<S> = CaptureController<
    Win32Windows,
    GdiHighlighter,
    CursorGrab,
    FinderSink<S>,
    RemoteInjector<Win32Executor>,
>;

thread_local! {
    static DISPATCH: RefCell<Option<Box<dyn FnMut(PointerEvent)>>> =
        const { RefCell::new(None) };
    static FINDER: Cell<FinderState> = const { Cell::new(FinderState::Home) };
}

/// The finder slot, in client coordinates.
fn finder_rect() -> Rect {
    Rect::new(16, 16, 48, 48)
}

/// Opens the inspector window and pumps messages until it is closed.
///
/// `library` enables the load/unload probe of foreign processes; `None`
/// leaves injection off. Probe results go to `sink`.
pub fn run<S: MetadataSink + 'static>(
    config: &Config,
    library: Option<PathBuf>,
    sink: S,
) -> SpyResult<()> {
    let window = create_window()?;
    let executor = Win32Executor;

    let controller: Inspector<S> = CaptureController::new(
        WindowProbe::new(Win32Windows),
        GdiHighlighter::new(config.highlight.pen_color()),
        CursorGrab::new(window),
        FinderSink {
            inner: sink,
            window,
        },
        executor.local_pid(),
    );
    let mut controller = match library {
        Some(library) => {
            log_info!("inspector: probing foreign processes with {}", library.display());
            controller.with_injection(RemoteInjector::new(executor), library)
        }
        None => controller,
    };

    DISPATCH.with(|cell| {
        *cell.borrow_mut() = Some(Box::new(move |event| controller.handle(event)));
    });

    // SAFETY: `window` was just created on this thread.
    unsafe {
        let _ = ShowWindow(window, SW_SHOW);
    }
    run_message_pump();

    // Normally already gone via WM_DESTROY.
    drop(DISPATCH.with(|cell| cell.borrow_mut().take()));
    Ok(())
}

/// Forwards to the caller's sink and keeps the finder slot painted.
struct FinderSink<S> {
    inner: S,
    window: HWND,
}

impl<S: MetadataSink> MetadataSink for FinderSink<S> {
    fn publish(&mut self, report: &ProbeReport) {
        self.inner.publish(report);
    }

    fn finder_changed(&mut self, state: FinderState) {
        FINDER.with(|finder| finder.set(state));
        // SAFETY: Invalidating our own window only queues a WM_PAINT.
        unsafe {
            let _ = InvalidateRect(Some(self.window), None, true);
        }
        self.inner.finder_changed(state);
    }
}

fn create_window() -> SpyResult<HWND> {
    let class_name = w!("SpyglassInspector");

    // SAFETY: Class registration and window creation on the current
    // thread; the window procedure is a plain `extern "system"` fn.
    unsafe {
        let wc = WNDCLASSW {
            lpfnWndProc: Some(inspector_proc),
            lpszClassName: class_name,
            hCursor: LoadCursorW(None, IDC_ARROW)?,
            hbrBackground: HBRUSH(GetStockObject(WHITE_BRUSH).0),
            ..Default::default()
        };
        if RegisterClassW(&wc) == 0 {
            return Err("failed to register the inspector window class".into());
        }

        let hwnd = CreateWindowExW(
            WS_EX_TOPMOST,
            class_name,
            w!("Spyglass"),
            WS_OVERLAPPED | WS_CAPTION | WS_SYSMENU | WS_MINIMIZEBOX,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            WINDOW_WIDTH,
            WINDOW_HEIGHT,
            None,
            None,
            None,
            None,
        )?;
        Ok(hwnd)
    }
}

/// Blocks until WM_QUIT is received.
fn run_message_pump() {
    let mut msg = MSG::default();

    while unsafe { GetMessageW(&mut msg, None, 0, 0).as_bool() } {
        unsafe {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}

/// Hands `event` to the controller.
///
/// Input that arrives while the controller is already running (our own
/// `ReleaseCapture` sends `WM_CAPTURECHANGED` synchronously) is dropped.
fn dispatch(event: PointerEvent) {
    DISPATCH.with(|cell| {
        if let Ok(mut slot) = cell.try_borrow_mut()
            && let Some(handler) = slot.as_mut()
        {
            handler(event);
        }
    });
}

/// Client coordinates packed into a mouse message's `LPARAM`.
fn client_point(lparam: LPARAM) -> Point {
    let x = (lparam.0 & 0xFFFF) as u16 as i16;
    let y = ((lparam.0 >> 16) & 0xFFFF) as u16 as i16;
    Point::new(i32::from(x), i32::from(y))
}

unsafe extern "system" fn inspector_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_LBUTTONDOWN => {
            let on_finder = finder_rect().contains(client_point(lparam));
            dispatch(PointerEvent::Pressed {
                button: MouseButton::Left,
                on_finder,
            });
            LRESULT(0)
        }
        WM_MOUSEMOVE => {
            // Captured moves arrive in our client coordinates; the probe
            // wants screen coordinates.
            if let Some(point) = cursor_position() {
                dispatch(PointerEvent::Moved(point));
            }
            LRESULT(0)
        }
        WM_LBUTTONUP => {
            dispatch(PointerEvent::Released {
                button: MouseButton::Left,
            });
            LRESULT(0)
        }
        WM_CAPTURECHANGED => {
            // Capture taken away mid-drag (e.g. alt-tab) ends the session.
            if lparam.0 as usize != hwnd.0 as usize {
                dispatch(PointerEvent::Released {
                    button: MouseButton::Left,
                });
            }
            LRESULT(0)
        }
        WM_PAINT => {
            paint(hwnd);
            LRESULT(0)
        }
        WM_DESTROY => {
            let controller = DISPATCH.with(|cell| cell.borrow_mut().take());
            drop(controller);
            // SAFETY: Ends this thread's message loop.
            unsafe { PostQuitMessage(0) };
            LRESULT(0)
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}

fn paint(hwnd: HWND) {
    let mut ps = PAINTSTRUCT::default();
    let finder = finder_rect();

    // SAFETY: BeginPaint/EndPaint bracket all drawing on the returned DC.
    unsafe {
        let hdc = BeginPaint(hwnd, &mut ps);

        let slot = RECT {
            left: finder.x,
            top: finder.y,
            right: finder.right(),
            bottom: finder.bottom(),
        };
        FrameRect(hdc, &slot, HBRUSH(GetStockObject(BLACK_BRUSH).0));

        if FINDER.with(Cell::get) == FinderState::Home {
            draw_crosshair(hdc, &finder);
        }

        let mut client = RECT::default();
        if GetClientRect(hwnd, &mut client).is_ok() {
            let mut text_rect = RECT {
                left: finder.right() + 12,
                top: finder.y,
                right: client.right - 12,
                bottom: client.bottom - 12,
            };
            let mut text: Vec<u16> = HINT.encode_utf16().collect();
            DrawTextW(
                hdc,
                &mut text,
                &mut text_rect,
                DT_LEFT | DT_WORDBREAK | DT_NOPREFIX,
            );
        }

        let _ = EndPaint(hwnd, &ps);
    }
}

/// The crosshair image shown in the finder slot while idle.
fn draw_crosshair(hdc: HDC, finder: &Rect) {
    let cx = finder.x + finder.width / 2;
    let cy = finder.y + finder.height / 2;
    let radius = finder.width / 4;
    let arm = finder.width / 2 - 6;

    // SAFETY: The pen is deselected before the guard deletes it.
    unsafe {
        let Some(pen) = GdiObject::new(CreatePen(PS_SOLID, 2, COLORREF(0))) else {
            return;
        };
        let old_pen = SelectObject(hdc, pen.raw());
        let old_brush = SelectObject(hdc, GetStockObject(NULL_BRUSH));

        let _ = Ellipse(hdc, cx - radius, cy - radius, cx + radius, cy + radius);
        let _ = MoveToEx(hdc, cx - arm, cy, None);
        let _ = LineTo(hdc, cx + arm, cy);
        let _ = MoveToEx(hdc, cx, cy - arm, None);
        let _ = LineTo(hdc, cx, cy + arm);

        SelectObject(hdc, old_brush);
        SelectObject(hdc, old_pen);
    }
}
