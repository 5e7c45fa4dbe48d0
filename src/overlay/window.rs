use crate::assets::OverlayImage;
use crate::overlay::surface::{HeadlessSurface, OverlaySurface};

/// Background colour keyed out of the overlay window (pure green).
pub const TRANSPARENCY_KEY: [u8; 3] = [0x00, 0xff, 0x00];

/// Alpha below which an image pixel is replaced by the transparency key.
pub const ALPHA_CUTOFF: u8 = 128;

/// Convert the overlay image into top-down BGRA rows for a 32-bit DIB.
///
/// Colour-key transparency is all-or-nothing, so translucent pixels become
/// the key colour and opaque pixels that happen to match the key are nudged
/// off it.
pub fn colorkey_bgra(image: &OverlayImage) -> Vec<u8> {
    let [key_r, key_g, key_b] = TRANSPARENCY_KEY;
    let mut out = Vec::with_capacity(image.pixels.as_raw().len());
    for px in image.pixels.pixels() {
        let [r, g, b, a] = px.0;
        if a < ALPHA_CUTOFF {
            out.extend_from_slice(&[key_b, key_g, key_r, 0xff]);
        } else if [r, g, b] == TRANSPARENCY_KEY {
            out.extend_from_slice(&[b, g.saturating_sub(1), r, 0xff]);
        } else {
            out.extend_from_slice(&[b, g, r, 0xff]);
        }
    }
    out
}

#[cfg(windows)]
mod platform {
    use super::{colorkey_bgra, TRANSPARENCY_KEY};
    use crate::assets::OverlayImage;
    use crate::overlay::surface::{OverlayPointerEvent, OverlaySurface, SurfaceCapabilities};
    use anyhow::{anyhow, Result};
    use once_cell::sync::Lazy;
    use std::collections::{HashMap, HashSet};
    use std::mem;
    use std::ptr;
    use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
    use std::sync::{Mutex, Once};
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, LRESULT, WPARAM};
    use windows::Win32::Graphics::Gdi::{
        BeginPaint, BitBlt, CreateCompatibleDC, CreateDIBSection, DeleteDC, DeleteObject,
        EndPaint, InvalidateRect, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB,
        DIB_RGB_COLORS, HBITMAP, HDC, HGDIOBJ, PAINTSTRUCT, SRCCOPY,
    };
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::Input::KeyboardAndMouse::{TrackMouseEvent, TME_LEAVE, TRACKMOUSEEVENT};
    use windows::Win32::UI::WindowsAndMessaging::{
        CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetSystemMetrics,
        GetWindowLongPtrW, PeekMessageW, RegisterClassW, SetLayeredWindowAttributes,
        SetWindowLongPtrW, SetWindowPos, ShowWindow, TranslateMessage, GWLP_USERDATA,
        GWL_EXSTYLE, HWND_TOPMOST, LAYERED_WINDOW_ATTRIBUTES_FLAGS, LWA_ALPHA, LWA_COLORKEY, MSG,
        PM_REMOVE, SM_CXSCREEN, SM_CYSCREEN, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE,
        SWP_SHOWWINDOW, SW_HIDE, WINDOW_EX_STYLE, WINDOW_STYLE, WM_ERASEBKGND, WM_MOUSELEAVE,
        WM_MOUSEMOVE, WM_PAINT, WNDCLASSW, WS_EX_LAYERED, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW,
        WS_EX_TOPMOST, WS_POPUP,
    };

    static POINTER_SENDERS: Lazy<Mutex<HashMap<isize, Sender<OverlayPointerEvent>>>> =
        Lazy::new(|| Mutex::new(HashMap::new()));
    // Windows the pointer is currently inside; cleared on WM_MOUSELEAVE.
    static POINTER_INSIDE: Lazy<Mutex<HashSet<isize>>> = Lazy::new(|| Mutex::new(HashSet::new()));

    fn key_of(hwnd: HWND) -> isize {
        hwnd.0 as isize
    }

    pub fn compose_overlay_window_ex_style() -> WINDOW_EX_STYLE {
        WS_EX_LAYERED | WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE
    }

    pub fn transparency_colorref() -> COLORREF {
        let [r, g, b] = TRANSPARENCY_KEY;
        COLORREF((r as u32) | ((g as u32) << 8) | ((b as u32) << 16))
    }

    fn widestring(value: &str) -> Vec<u16> {
        use std::os::windows::ffi::OsStrExt;
        std::ffi::OsStr::new(value)
            .encode_wide()
            .chain(std::iter::once(0))
            .collect()
    }

    fn alpha_byte(opacity: f32) -> u8 {
        (opacity.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    /// Drop every pointer route registered for `hwnd`.
    fn forget_pointer(hwnd: HWND) {
        let key = key_of(hwnd);
        if let Ok(mut senders) = POINTER_SENDERS.lock() {
            senders.remove(&key);
        }
        forget_pointer_inside(hwnd);
    }

    fn forget_pointer_inside(hwnd: HWND) {
        if let Ok(mut inside) = POINTER_INSIDE.lock() {
            inside.remove(&key_of(hwnd));
        }
    }

    /// Copy the dirty rectangle from the image DC kept in `GWLP_USERDATA`.
    unsafe fn paint_from_memory_dc(hwnd: HWND) {
        let mut ps = PAINTSTRUCT::default();
        let hdc = BeginPaint(hwnd, &mut ps);
        let image_dc = HDC(GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut _);
        if !hdc.0.is_null() && !image_dc.0.is_null() {
            let dirty = ps.rcPaint;
            let _ = BitBlt(
                hdc,
                dirty.left,
                dirty.top,
                dirty.right - dirty.left,
                dirty.bottom - dirty.top,
                image_dc,
                dirty.left,
                dirty.top,
                SRCCOPY,
            );
        }
        let _ = EndPaint(hwnd, &ps);
    }

    unsafe extern "system" fn overlay_wndproc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        match msg {
            WM_ERASEBKGND => LRESULT(1),
            WM_PAINT => {
                unsafe { paint_from_memory_dc(hwnd) };
                LRESULT(0)
            }
            WM_MOUSEMOVE => {
                let entered = POINTER_INSIDE
                    .lock()
                    .map(|mut inside| inside.insert(key_of(hwnd)))
                    .unwrap_or(false);
                if entered {
                    let mut track = TRACKMOUSEEVENT {
                        cbSize: mem::size_of::<TRACKMOUSEEVENT>() as u32,
                        dwFlags: TME_LEAVE,
                        hwndTrack: hwnd,
                        dwHoverTime: 0,
                    };
                    let _ = unsafe { TrackMouseEvent(&mut track) };
                    if let Ok(senders) = POINTER_SENDERS.lock() {
                        if let Some(tx) = senders.get(&key_of(hwnd)) {
                            let _ = tx.send(OverlayPointerEvent::Entered);
                        }
                    }
                }
                LRESULT(0)
            }
            WM_MOUSELEAVE => {
                forget_pointer_inside(hwnd);
                LRESULT(0)
            }
            _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
        }
    }

    /// Borderless, topmost, colour-keyed layered window showing the overlay
    /// image. Must stay on the thread that created it.
    #[derive(Debug)]
    pub struct OverlayWindow {
        hwnd: HWND,
        mem_dc: HDC,
        dib: HBITMAP,
        old_bitmap: HGDIOBJ,
        capabilities: SurfaceCapabilities,
        pointer_rx: Receiver<OverlayPointerEvent>,
    }

    impl OverlayWindow {
        pub fn create(image: &OverlayImage) -> Result<Self> {
            static REGISTER_CLASS: Once = Once::new();
            let class_name = widestring("GolemOverlayWindow");
            let hinstance = unsafe { GetModuleHandleW(PCWSTR::null()) }
                .map_err(|err| anyhow!("GetModuleHandleW failed: {err}"))?;

            REGISTER_CLASS.call_once(|| unsafe {
                let wc = WNDCLASSW {
                    hInstance: hinstance.into(),
                    lpszClassName: PCWSTR(class_name.as_ptr()),
                    lpfnWndProc: Some(overlay_wndproc),
                    ..Default::default()
                };
                let _ = RegisterClassW(&wc);
            });

            let (width, height) = image.size();
            let hwnd = unsafe {
                CreateWindowExW(
                    compose_overlay_window_ex_style(),
                    PCWSTR(class_name.as_ptr()),
                    PCWSTR::null(),
                    WINDOW_STYLE(WS_POPUP.0),
                    0,
                    0,
                    width,
                    height,
                    None,
                    None,
                    hinstance,
                    None,
                )
            }
            .map_err(|err| anyhow!("CreateWindowExW failed: {err}"))?;

            let key = transparency_colorref();
            let opacity =
                unsafe { SetLayeredWindowAttributes(hwnd, key, 0, LWA_COLORKEY | LWA_ALPHA) }
                    .is_ok();
            let chroma_key = opacity
                || unsafe { SetLayeredWindowAttributes(hwnd, key, 0, LWA_COLORKEY) }.is_ok();
            let ex_style = unsafe { GetWindowLongPtrW(hwnd, GWL_EXSTYLE) } as u32;
            let capabilities = SurfaceCapabilities {
                chroma_key,
                opacity,
                hidden_from_taskbar: ex_style & WS_EX_TOOLWINDOW.0 != 0,
            };

            let mem_dc = unsafe { CreateCompatibleDC(HDC::default()) };
            if mem_dc.0.is_null() {
                unsafe {
                    let _ = DestroyWindow(hwnd);
                }
                return Err(anyhow!("CreateCompatibleDC failed"));
            }

            let mut bmi = BITMAPINFO::default();
            bmi.bmiHeader = BITMAPINFOHEADER {
                biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                biHeight: -height,
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            };

            let mut bits: *mut core::ffi::c_void = ptr::null_mut();
            let dib = match unsafe {
                CreateDIBSection(
                    mem_dc,
                    &bmi,
                    DIB_RGB_COLORS,
                    &mut bits,
                    windows::Win32::Foundation::HANDLE::default(),
                    0,
                )
            } {
                Ok(dib) if !bits.is_null() => dib,
                _ => {
                    unsafe {
                        let _ = DeleteDC(mem_dc);
                        let _ = DestroyWindow(hwnd);
                    }
                    return Err(anyhow!("CreateDIBSection failed"));
                }
            };

            let pixels = colorkey_bgra(image);
            unsafe {
                ptr::copy_nonoverlapping(pixels.as_ptr(), bits as *mut u8, pixels.len());
            }

            let old_bitmap = unsafe { SelectObject(mem_dc, dib) };
            unsafe {
                let _ = SetWindowLongPtrW(hwnd, GWLP_USERDATA, mem_dc.0 as isize);
            }

            let (pointer_tx, pointer_rx) = channel::<OverlayPointerEvent>();
            if let Ok(mut senders) = POINTER_SENDERS.lock() {
                senders.insert(key_of(hwnd), pointer_tx);
            }

            tracing::debug!(width, height, ?capabilities, "overlay window created");
            Ok(Self {
                hwnd,
                mem_dc,
                dib,
                old_bitmap,
                capabilities,
                pointer_rx,
            })
        }

        fn layered_flags(&self) -> LAYERED_WINDOW_ATTRIBUTES_FLAGS {
            if self.capabilities.chroma_key {
                LWA_COLORKEY | LWA_ALPHA
            } else {
                LWA_ALPHA
            }
        }

        /// Release the image bitmap and destroy the window. Safe to call
        /// more than once.
        pub fn shutdown(&mut self) {
            let hwnd = mem::take(&mut self.hwnd);
            if !hwnd.0.is_null() {
                forget_pointer(hwnd);
                unsafe {
                    let _ = DestroyWindow(hwnd);
                }
            }
            let mem_dc = mem::take(&mut self.mem_dc);
            let dib = mem::take(&mut self.dib);
            if !mem_dc.0.is_null() {
                unsafe {
                    let _ = SelectObject(mem_dc, self.old_bitmap);
                    let _ = DeleteDC(mem_dc);
                }
            }
            if !dib.0.is_null() {
                unsafe {
                    let _ = DeleteObject(dib);
                }
            }
        }
    }

    impl OverlaySurface for OverlayWindow {
        fn capabilities(&self) -> SurfaceCapabilities {
            self.capabilities
        }

        fn screen_size(&self) -> (i32, i32) {
            unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) }
        }

        fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
            unsafe {
                SetWindowPos(self.hwnd, HWND_TOPMOST, x, y, 0, 0, SWP_NOSIZE | SWP_NOACTIVATE)
            }
            .map_err(|err| anyhow!("SetWindowPos failed: {err}"))
        }

        fn show(&mut self) -> Result<()> {
            unsafe {
                SetWindowPos(
                    self.hwnd,
                    HWND_TOPMOST,
                    0,
                    0,
                    0,
                    0,
                    SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE | SWP_SHOWWINDOW,
                )
                .map_err(|err| anyhow!("SetWindowPos failed: {err}"))?;
                let _ = InvalidateRect(self.hwnd, None, false);
            }
            Ok(())
        }

        fn hide(&mut self) -> Result<()> {
            unsafe {
                let _ = ShowWindow(self.hwnd, SW_HIDE);
            }
            forget_pointer_inside(self.hwnd);
            // Start fully transparent next time so the first frame never
            // flashes at the previous opacity.
            if self.capabilities.opacity {
                let _ = unsafe {
                    SetLayeredWindowAttributes(
                        self.hwnd,
                        transparency_colorref(),
                        0,
                        self.layered_flags(),
                    )
                };
            }
            Ok(())
        }

        fn set_opacity(&mut self, opacity: f32) -> Result<()> {
            unsafe {
                SetLayeredWindowAttributes(
                    self.hwnd,
                    transparency_colorref(),
                    alpha_byte(opacity),
                    self.layered_flags(),
                )
            }
            .map_err(|err| anyhow!("SetLayeredWindowAttributes failed: {err}"))
        }

        fn pump(&mut self) {
            unsafe {
                let mut msg = MSG::default();
                while PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE).into() {
                    let _ = TranslateMessage(&msg);
                    let _ = DispatchMessageW(&msg);
                }
            }
        }

        fn drain_pointer_events(&mut self) -> Vec<OverlayPointerEvent> {
            let mut events = Vec::new();
            loop {
                match self.pointer_rx.try_recv() {
                    Ok(event) => events.push(event),
                    Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
                }
            }
            events
        }
    }

    impl Drop for OverlayWindow {
        fn drop(&mut self) {
            self.shutdown();
        }
    }

}

#[cfg(windows)]
pub use platform::OverlayWindow;

/// Placeholder on hosts without an overlay implementation; creation always
/// fails and [`open_surface`] falls back to a [`HeadlessSurface`].
#[cfg(not(windows))]
#[derive(Debug)]
pub struct OverlayWindow {
    _private: (),
}

#[cfg(not(windows))]
impl OverlayWindow {
    pub fn create(_image: &OverlayImage) -> anyhow::Result<Self> {
        Err(anyhow::anyhow!(
            "overlay windows are only supported on Windows"
        ))
    }
}

#[cfg(not(windows))]
impl OverlaySurface for OverlayWindow {
    fn capabilities(&self) -> crate::overlay::surface::SurfaceCapabilities {
        Default::default()
    }

    fn screen_size(&self) -> (i32, i32) {
        (0, 0)
    }

    fn move_to(&mut self, _x: i32, _y: i32) -> anyhow::Result<()> {
        Ok(())
    }

    fn show(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn hide(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn set_opacity(&mut self, _opacity: f32) -> anyhow::Result<()> {
        Ok(())
    }

    fn drain_pointer_events(&mut self) -> Vec<crate::overlay::surface::OverlayPointerEvent> {
        Vec::new()
    }
}

/// Create the overlay window for `image`, or a headless stand-in when the
/// host cannot provide one. A missing window is logged, never fatal.
pub fn open_surface(image: &OverlayImage, margin: i32) -> Box<dyn OverlaySurface> {
    match OverlayWindow::create(image) {
        Ok(window) => Box::new(window),
        Err(err) => {
            tracing::warn!("overlay surface unavailable, running headless: {err:#}");
            let (width, height) = image.size();
            Box::new(HeadlessSurface::new((width + 2 * margin, height + 2 * margin)))
        }
    }
}
