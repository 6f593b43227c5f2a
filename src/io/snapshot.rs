use crate::error::AppError;
use chrono::Local;
use image::RgbaImage;
use log::info;
use std::path::{Path, PathBuf};

/// `showcase-<model>-YYYYmmdd-HHMMSS.png`, model stem sanitized for file names.
pub fn default_snapshot_name(model_name: Option<&str>) -> String {
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    match model_name.map(sanitize_stem).filter(|s| !s.is_empty()) {
        Some(stem) => format!("showcase-{stem}-{stamp}.png"),
        None => format!("showcase-{stamp}.png"),
    }
}

fn sanitize_stem(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    stem.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Writes `image` as PNG (format chosen from the extension).
pub fn save_image(image: &RgbaImage, path: &Path) -> Result<PathBuf, AppError> {
    image.save(path).map_err(|source| AppError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        "Snapshot saved to {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::{default_snapshot_name, save_image};
    use image::{Rgba, RgbaImage};

    #[test]
    fn snapshot_name_uses_the_model_stem() {
        let name = default_snapshot_name(Some("my robot.glb"));
        assert!(name.starts_with("showcase-my_robot-"));
        assert!(name.ends_with(".png"));
        assert!(default_snapshot_name(None).starts_with("showcase-2"));
    }

    #[test]
    fn saved_png_reads_back() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("frame.png");
        let img = RgbaImage::from_pixel(3, 2, Rgba([15, 15, 35, 255]));
        save_image(&img, &path).expect("save");
        let back = image::open(&path).expect("open").to_rgba8();
        assert_eq!(back.dimensions(), (3, 2));
        assert_eq!(*back.get_pixel(1, 1), Rgba([15, 15, 35, 255]));
    }
}
