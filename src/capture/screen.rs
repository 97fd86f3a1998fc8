//! Desktop region capture.
//!
//! The broadcast is played full screen (or in a fixed window) and the region
//! configured in `capture` is copied from the desktop every frame.

use anyhow::Result;
use image::RgbaImage;

use super::FrameSource;
use crate::session::config::CaptureConfig;

/// Grabs a fixed desktop rectangle on every call.
pub struct ScreenSource {
    region: CaptureConfig,
}

impl ScreenSource {
    pub fn new(region: CaptureConfig) -> Result<Self> {
        if region.width == 0 || region.height == 0 {
            return Err(anyhow::anyhow!(
                "Capture region must not be empty ({}x{})",
                region.width,
                region.height
            ));
        }
        platform::check_supported()?;
        crate::log(&format!(
            "Capturing desktop region {}x{} at ({}, {})",
            region.width, region.height, region.x, region.y
        ));
        Ok(Self { region })
    }
}

impl FrameSource for ScreenSource {
    fn next_frame(&mut self) -> Result<Option<RgbaImage>> {
        platform::grab_region(&self.region).map(Some)
    }
}

#[cfg(windows)]
mod platform {
    use anyhow::{anyhow, Result};
    use image::{ImageBuffer, RgbaImage};

    use windows::Win32::Foundation::HWND;
    use windows::Win32::Graphics::Gdi::{
        BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC,
        GetDIBits, ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB,
        DIB_RGB_COLORS, HGDIOBJ, SRCCOPY,
    };

    use crate::session::config::CaptureConfig;

    pub fn check_supported() -> Result<()> {
        Ok(())
    }

    /// Copies the region from the screen DC into a top-down 32-bit DIB.
    pub fn grab_region(region: &CaptureConfig) -> Result<RgbaImage> {
        let width = region.width as i32;
        let height = region.height as i32;
        let mut bgra = vec![0u8; (region.width * region.height * 4) as usize];

        let (blit, lines) = unsafe {
            let screen_dc = GetDC(HWND::default());
            if screen_dc.is_invalid() {
                return Err(anyhow!("GetDC failed for the desktop"));
            }
            let mem_dc = CreateCompatibleDC(screen_dc);
            let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
            let previous = SelectObject(mem_dc, HGDIOBJ(bitmap.0));

            let blit = BitBlt(
                mem_dc, 0, 0, width, height, screen_dc, region.x, region.y, SRCCOPY,
            );

            // Negative height = top-down rows
            let mut info = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: width,
                    biHeight: -height,
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };
            let lines = GetDIBits(
                mem_dc,
                bitmap,
                0,
                region.height,
                Some(bgra.as_mut_ptr() as *mut std::ffi::c_void),
                &mut info,
                DIB_RGB_COLORS,
            );

            SelectObject(mem_dc, previous);
            let _ = DeleteObject(HGDIOBJ(bitmap.0));
            let _ = DeleteDC(mem_dc);
            ReleaseDC(HWND::default(), screen_dc);

            (blit, lines)
        };

        blit.map_err(|e| anyhow!("BitBlt failed: {}", e))?;
        if lines == 0 {
            return Err(anyhow!("GetDIBits returned no rows"));
        }

        // BGRA -> RGBA, GDI leaves alpha undefined
        for px in bgra.chunks_exact_mut(4) {
            px.swap(0, 2);
            px[3] = 255;
        }

        ImageBuffer::from_raw(region.width, region.height, bgra)
            .ok_or_else(|| anyhow!("Captured buffer has unexpected size"))
    }
}

#[cfg(not(windows))]
mod platform {
    use anyhow::{anyhow, Result};
    use image::RgbaImage;

    use crate::session::config::CaptureConfig;

    pub fn check_supported() -> Result<()> {
        Err(anyhow!(
            "Screen capture is only supported on Windows; replay extracted frames with --source <dir>"
        ))
    }

    pub fn grab_region(_region: &CaptureConfig) -> Result<RgbaImage> {
        check_supported().map(|_| RgbaImage::new(0, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_region_is_rejected() {
        let region = CaptureConfig {
            width: 0,
            ..CaptureConfig::default()
        };
        assert!(ScreenSource::new(region).is_err());
    }

    #[cfg(not(windows))]
    #[test]
    fn test_screen_capture_unsupported_off_windows() {
        let err = ScreenSource::new(CaptureConfig::default()).err().unwrap();
        assert!(err.to_string().contains("--source"));
    }
}
