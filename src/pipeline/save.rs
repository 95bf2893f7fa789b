//! Output naming and image encoding.
//!
//! Rendered images carry no page number of their own; the engine tracks it
//! positionally. When the rasterizer returned exactly one image per selected
//! page, each file is labelled with its real page number. Otherwise (whole
//! document, or the document was shorter than the selection) files are
//! numbered 1, 2, 3, … in render order.

use crate::error::Pdf2ImgError;
use image::{DynamicImage, ImageFormat};
use std::path::Path;
use tracing::debug;

/// Choose the page label for each of `rendered` images.
///
/// ```rust
/// use pdf2img::pipeline::save::assign_labels;
///
/// assert_eq!(assign_labels(Some(&[2, 4]), 2), vec![2, 4]);
/// assert_eq!(assign_labels(Some(&[2, 4]), 1), vec![1]);
/// assert_eq!(assign_labels(None, 3), vec![1, 2, 3]);
/// ```
pub fn assign_labels(selection: Option<&[u32]>, rendered: usize) -> Vec<u32> {
    match selection {
        Some(pages) if pages.len() == rendered => pages.to_vec(),
        _ => (1..=rendered as u32).collect(),
    }
}

/// `{base}_{label}.{format}`
pub fn output_file_name(base: &str, label: u32, format: &str) -> String {
    format!("{base}_{label}.{format}")
}

/// Encode `image` as `format` and write it to `path`.
///
/// JPEG has no alpha channel, so RGBA renders are flattened to RGB first.
pub fn save_image(
    image: &DynamicImage,
    path: &Path,
    format: ImageFormat,
) -> Result<(), Pdf2ImgError> {
    let result = if format == ImageFormat::Jpeg && image.color().has_alpha() {
        DynamicImage::ImageRgb8(image.to_rgb8()).save_with_format(path, format)
    } else {
        image.save_with_format(path, format)
    };

    result.map_err(|e| match e {
        image::ImageError::IoError(source) => Pdf2ImgError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        },
        other => Pdf2ImgError::ImageSaveFailed {
            path: path.to_path_buf(),
            source: other,
        },
    })?;

    debug!("Saved {}", path.display());
    Ok(())
}
