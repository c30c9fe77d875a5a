//! ROLLCALL Visual - Ticket rendering for display surfaces
//!
//! Pure, stateless QR rendering: a ticket string in, a displayable SVG
//! artifact out. The only failure modes are malformed input (empty string,
//! payload beyond QR capacity).

use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};

use rollcall_core::{ImageArtifact, RollcallError, RollcallResult, SessionId};

/// Minimum rendered dimensions in SVG user units
const MIN_DIMENSIONS: u32 = 256;

/// Render a ticket string as a scannable QR artifact
pub fn render(text: &str) -> RollcallResult<ImageArtifact> {
    if text.is_empty() {
        return Err(RollcallError::EmptyInput);
    }

    let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::M).map_err(|e| {
        match e {
            qrcode::types::QrError::DataTooLong => RollcallError::PayloadTooLarge(text.len()),
            other => RollcallError::Internal(format!("qr encoding failed: {other:?}")),
        }
    })?;

    let document = code
        .render::<svg::Color>()
        .min_dimensions(MIN_DIMENSIONS, MIN_DIMENSIONS)
        .build();

    Ok(ImageArtifact::svg(document))
}

/// Scan URL a display QR encodes, e.g.
/// `https://host.example/mark?session=00000000000000ab&ticket=4f2a...`
pub fn mark_url(base: &str, session: SessionId, ticket: &str) -> String {
    format!("{}/mark?session={}&ticket={}", base.trim_end_matches('/'), session, ticket)
}
