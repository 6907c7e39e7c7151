//! [`BarcodeScanner`] backed by the `rqrr` crate.

use async_trait::async_trait;
use image::DynamicImage;
use rqrr::PreparedImage;

use super::{BarcodeScanner, Detection, QR_FORMAT};
use crate::error::QrDeckError;

/// Pure-Rust QR detector. Detection runs on the blocking thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct RqrrScanner;

impl RqrrScanner {
    /// Detect synchronously. Grids that are found but fail to decode are
    /// skipped.
    pub fn detect_blocking(frame: &DynamicImage) -> Vec<Detection> {
        let luma = frame.to_luma8();
        let (w, h) = (luma.width() as usize, luma.height() as usize);
        if w == 0 || h == 0 {
            return Vec::new();
        }
        let mut prepared = PreparedImage::prepare_from_greyscale(w, h, |x, y| {
            luma.get_pixel(x as u32, y as u32).0[0]
        });

        prepared
            .detect_grids()
            .into_iter()
            .filter_map(|grid| match grid.decode() {
                Ok((_meta, content)) => Some(Detection { raw_value: content }),
                Err(e) => {
                    log::debug!("found a QR grid but could not decode it: {:?}", e);
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl BarcodeScanner for RqrrScanner {
    async fn supported_formats(&self) -> Result<Vec<String>, QrDeckError> {
        Ok(vec![QR_FORMAT.to_string()])
    }

    async fn detect(&self, frame: &DynamicImage) -> Result<Vec<Detection>, QrDeckError> {
        let frame = frame.clone();
        tokio::task::spawn_blocking(move || Self::detect_blocking(&frame))
            .await
            .map_err(|e| QrDeckError::Detection(format!("detector task failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::engine::QrcodeEngine;
    use crate::render::{self, RenderOptions};

    fn rendered(payload: &str) -> DynamicImage {
        let options = RenderOptions {
            scale: 4,
            ..Default::default()
        };
        let out = render::render_payload(&QrcodeEngine, payload, &options).unwrap();
        DynamicImage::ImageRgba8(out.raster)
    }

    #[test]
    fn test_detects_rendered_code() {
        let found = RqrrScanner::detect_blocking(&rendered("WIFI:T:WPA;S:home;P:pw;H:false;;"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].raw_value, "WIFI:T:WPA;S:home;P:pw;H:false;;");
    }

    #[test]
    fn test_blank_image_has_no_codes() {
        let blank = DynamicImage::new_rgb8(64, 64);
        assert!(RqrrScanner::detect_blocking(&blank).is_empty());
    }

    #[tokio::test]
    async fn test_async_detect() {
        let found = RqrrScanner.detect(&rendered("hello")).await.unwrap();
        assert_eq!(found[0].raw_value, "hello");
        assert_eq!(RqrrScanner.supported_formats().await.unwrap(), vec!["qr_code"]);
    }
}
