//! Shareable-graphic rendering for the Pint of the Week.
//!
//! Fetches the winning photo, sends it inline to the Gemini
//! image-generation variant with the brand-card prompt, and normalizes
//! the returned image to 1200x1200 PNG (the 600px card template at 2x
//! pixel density). Every failure here, including an AI image call that
//! goes wrong, is reported as a rendering failure so it stays
//! distinguishable from the analysis failures earlier in the protocol.

use crate::error::{AppError, Result};
use crate::models::Rating;
use base64::{engine::general_purpose, Engine as _};
use gemini_client::{GeminiClient, InlineImage};
use image::imageops::FilterType;
use image::{GenericImageView, ImageOutputFormat};
use reqwest::Client;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// 600px card template rendered at 2x pixel density.
pub const GRAPHIC_DIMENSION: u32 = 1200;

const PHOTO_FETCH_TIMEOUT_SECS: u64 = 30;

pub struct GraphicRenderer {
    http: Client,
    gemini: Arc<GeminiClient>,
}

impl GraphicRenderer {
    pub fn new(gemini: Arc<GeminiClient>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(PHOTO_FETCH_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self { http, gemini }
    }

    /// Render the shareable card for `winner`, returning base64 PNG data.
    pub async fn render(&self, winner: &Rating) -> Result<String> {
        let image_url = winner.image_url.as_deref().ok_or_else(|| {
            AppError::RenderError("The winning rating has no photo to render".to_string())
        })?;

        let photo = self.fetch_photo(image_url).await?;
        info!(rating_id = %winner.id, photo_bytes = photo.data.len(), "Rendering shareable graphic");

        let prompt = build_prompt(winner);
        let generated = self
            .gemini
            .generate_image(&prompt, &photo)
            .await
            .map_err(|e| AppError::RenderError(e.to_string()))?;

        let png = tokio::task::spawn_blocking(move || finalize_png(&generated))
            .await
            .map_err(|e| AppError::Internal(format!("Render task panicked: {e}")))??;

        Ok(general_purpose::STANDARD.encode(png))
    }

    async fn fetch_photo(&self, url: &str) -> Result<InlineImage> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::RenderError(format!("Failed to fetch winner photo: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::RenderError(format!(
                "Failed to fetch winner photo: HTTP {status}"
            )));
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or("image/jpeg")
            .to_string();

        let data = response
            .bytes()
            .await
            .map_err(|e| AppError::RenderError(format!("Failed to read winner photo: {e}")))?
            .to_vec();

        debug!(bytes = data.len(), mime = %mime_type, "Fetched winner photo");
        Ok(InlineImage { mime_type, data })
    }
}

#[async_trait::async_trait]
impl crate::services::pint_of_week::CardRenderer for GraphicRenderer {
    async fn render(&self, winner: &Rating) -> Result<String> {
        GraphicRenderer::render(self, winner).await
    }
}

/// Decode the generated image, resize to the target card dimensions if
/// the model returned another size, and re-encode as PNG.
fn finalize_png(data: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory(data)
        .map_err(|e| AppError::RenderError(format!("Failed to decode generated image: {e}")))?;

    let (w, h) = img.dimensions();
    let img = if (w, h) != (GRAPHIC_DIMENSION, GRAPHIC_DIMENSION) {
        img.resize_exact(GRAPHIC_DIMENSION, GRAPHIC_DIMENSION, FilterType::Triangle)
    } else {
        img
    };

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageOutputFormat::Png)
        .map_err(|e| AppError::RenderError(format!("Failed to encode graphic: {e}")))?;

    Ok(out.into_inner())
}

fn stars(filled: i16) -> String {
    let filled = filled.clamp(0, 5) as usize;
    "★".repeat(filled) + &"☆".repeat(5 - filled)
}

pub fn build_prompt(winner: &Rating) -> String {
    let pub_name = winner
        .pub_ref
        .as_ref()
        .map(|p| p.name.as_str())
        .unwrap_or("A Fine Establishment");
    let username = winner
        .author
        .as_ref()
        .map(|a| a.username.as_str())
        .unwrap_or("A Stout Lover");

    let value_line = match winner.price {
        Some(price) if price > 0 => format!("\n- Value: {}", stars(price)),
        _ => String::new(),
    };

    format!(
        "Create a square social media graphic announcing Stoutly's 'Pint of the Week'. \
        Use the attached pint photo as the centrepiece on a dark charcoal (#1A120F) \
        background with amber accents. Layout: a bold 'PINT OF THE WEEK' headline at \
        the top, the photo framed below it, and the details overlaid at the photo's \
        bottom edge. Footer text: www.stoutly.co.uk.\n\
        Details to include:\n\
        - Pub: {pub_name}\n\
        - By: @{username}\n\
        - Quality: {}{value_line}",
        stars(winner.quality)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn winner() -> Rating {
        Rating {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            quality: 4,
            price: Some(3),
            exact_price: None,
            message: "creamy".into(),
            image_url: Some("https://cdn.stoutly.co.uk/p.jpg".into()),
            like_count: 10,
            comment_count: 1,
            is_private: false,
            pub_ref: None,
            author: None,
        }
    }

    #[test]
    fn prompt_carries_stars_and_fallback_names() {
        let prompt = build_prompt(&winner());
        assert!(prompt.contains("★★★★☆"));
        assert!(prompt.contains("A Fine Establishment"));
        assert!(prompt.contains("@A Stout Lover"));
        assert!(prompt.contains("Value: ★★★☆☆"));
    }

    #[test]
    fn zero_price_omits_value_line() {
        let mut r = winner();
        r.price = Some(0);
        assert!(!build_prompt(&r).contains("Value:"));
    }

    #[test]
    fn finalize_resizes_to_card_dimensions() {
        let img = image::DynamicImage::new_rgb8(64, 48);
        let mut raw = Cursor::new(Vec::new());
        img.write_to(&mut raw, ImageOutputFormat::Png).unwrap();

        let png = finalize_png(raw.get_ref()).unwrap();
        let round = image::load_from_memory(&png).unwrap();
        assert_eq!(round.dimensions(), (GRAPHIC_DIMENSION, GRAPHIC_DIMENSION));
    }

    #[test]
    fn finalize_rejects_non_image_payload() {
        let err = finalize_png(b"not an image").unwrap_err();
        assert!(matches!(err, AppError::RenderError(_)));
    }
}
