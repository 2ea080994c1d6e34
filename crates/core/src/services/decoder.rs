use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::services::raster::RasterImage;

/// One decoded QR symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedPayload {
    pub text: String,
    /// Symbol corners in image coordinates, as reported by the detector.
    pub corners: [(i32, i32); 4],
}

impl DecodedPayload {
    /// Smallest (x, y) over the corners; used to order payloads by position.
    pub fn top_left(&self) -> (i32, i32) {
        let x = self.corners.iter().map(|c| c.0).min().unwrap_or(0);
        let y = self.corners.iter().map(|c| c.1).min().unwrap_or(0);
        (x, y)
    }
}

/// Trait implemented by QR decoders.
///
/// An empty result means no symbol was found; that is a normal outcome, not an error.
pub trait QrDecoder: Send + Sync {
    fn decode(&self, image: &RasterImage) -> Vec<DecodedPayload>;
    fn name(&self) -> &'static str;
}

/// Decoder built on `rqrr` (finder-pattern detection plus Reed-Solomon
/// correction at whatever ECC level the symbol declares).
#[derive(Debug, Clone, Copy, Default)]
pub struct RqrrDecoder;

impl QrDecoder for RqrrDecoder {
    fn decode(&self, image: &RasterImage) -> Vec<DecodedPayload> {
        let luma = image.to_luma();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            luma.width() as usize,
            luma.height() as usize,
            |x, y| luma.get_pixel(x as u32, y as u32).0[0],
        );

        let grids = prepared.detect_grids();
        let detected = grids.len();
        let mut payloads = Vec::with_capacity(detected);
        for grid in grids {
            match grid.decode() {
                Ok((_meta, text)) => {
                    debug!(bytes = text.len(), "decoded QR grid");
                    let corners = [
                        (grid.bounds[0].x, grid.bounds[0].y),
                        (grid.bounds[1].x, grid.bounds[1].y),
                        (grid.bounds[2].x, grid.bounds[2].y),
                        (grid.bounds[3].x, grid.bounds[3].y),
                    ];
                    payloads.push(DecodedPayload { text, corners });
                }
                Err(err) => debug!(error = ?err, "skipping undecodable QR grid"),
            }
        }

        sort_by_position(&mut payloads);
        debug!(detected, decoded = payloads.len(), "QR scan finished");
        payloads
    }

    fn name(&self) -> &'static str {
        "rqrr"
    }
}

/// Order payloads top-to-bottom, then left-to-right. Stable, so exact ties
/// keep detector order.
pub fn sort_by_position(payloads: &mut [DecodedPayload]) {
    payloads.sort_by_key(|p| {
        let (x, y) = p.top_left();
        (y, x)
    });
}
