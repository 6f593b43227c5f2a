use crate::error::IntakeError;
use log::{debug, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const MIB: u64 = 1024 * 1024;

/// Extensions accepted by the viewer, compared case-insensitively.
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["glb", "gltf"];

/// Shown in the large-model dialog.
pub const LARGE_MODEL_TIPS: [&str; 5] = [
    "Reduce polygon count with a decimation modifier",
    "Compress textures to 1K or 2K resolution",
    "Apply Draco mesh compression when exporting",
    "Remove unused materials and hidden objects",
    "Prefer binary GLB over JSON GLTF",
];

/// Where the bytes of a candidate file live.
#[derive(Debug, Clone)]
pub enum ModelSource {
    /// File picker or a native drop that carries a path.
    Path(PathBuf),
    /// Drop payload delivered as bytes only.
    Bytes { name: String, bytes: Arc<[u8]> },
}

impl ModelSource {
    pub fn display_name(&self) -> String {
        match self {
            Self::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            Self::Bytes { name, .. } => name.clone(),
        }
    }

    /// Directory that external `.gltf` buffers and images resolve against.
    pub fn base_dir(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => path.parent(),
            Self::Bytes { .. } => None,
        }
    }
}

/// A file offered to the viewer, before validation.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub name: String,
    pub size_bytes: u64,
    pub source: ModelSource,
}

impl FileCandidate {
    /// Reads the size from the file system.
    pub fn from_path(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let size_bytes = std::fs::metadata(&path)?.len();
        let source = ModelSource::Path(path);
        Ok(Self {
            name: source.display_name(),
            size_bytes,
            source,
        })
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Arc<[u8]>) -> Self {
        let name = name.into();
        Self {
            size_bytes: bytes.len() as u64,
            source: ModelSource::Bytes {
                name: name.clone(),
                bytes,
            },
            name,
        }
    }

    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.name.rsplit_once('.')?;
        Some(ext.to_ascii_lowercase())
    }
}

/// Size thresholds. A file is over a limit when strictly larger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IntakeLimits {
    /// Hard ceiling; larger files are rejected.
    pub max_bytes: u64,
    /// Larger files need explicit confirmation.
    pub warn_bytes: u64,
}

impl Default for IntakeLimits {
    fn default() -> Self {
        Self {
            max_bytes: 500 * MIB,
            warn_bytes: 100 * MIB,
        }
    }
}

/// What to do with a file that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    /// Large enough to warrant the optimisation warning first.
    Confirm,
}

/// Checks extension, then size. Nothing is read from the file.
pub fn validate(candidate: &FileCandidate, limits: &IntakeLimits) -> Result<Verdict, IntakeError> {
    let supported = candidate
        .extension()
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()));
    if !supported {
        warn!("Rejected '{}': unsupported extension", candidate.name);
        return Err(IntakeError::UnsupportedExtension {
            name: candidate.name.clone(),
        });
    }

    if candidate.size_bytes > limits.max_bytes {
        warn!(
            "Rejected '{}': {} exceeds the {} limit",
            candidate.name,
            format_file_size(candidate.size_bytes),
            format_file_size(limits.max_bytes)
        );
        return Err(IntakeError::TooLarge {
            size: format_file_size(candidate.size_bytes),
            limit: format_file_size(limits.max_bytes),
        });
    }

    let verdict = if candidate.size_bytes > limits.warn_bytes {
        Verdict::Confirm
    } else {
        Verdict::Accept
    };
    debug!(
        "'{}' ({}) -> {:?}",
        candidate.name,
        format_file_size(candidate.size_bytes),
        verdict
    );
    Ok(verdict)
}

/// Human-readable size in base 1024 with at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut exp = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && exp < UNITS.len() - 1 {
        value /= 1024.0;
        exp += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[exp])
}

/// Headline for the large-model dialog.
pub fn large_model_message(candidate: &FileCandidate) -> String {
    format!(
        "This model is {}. Large models may take longer to load and render slowly.",
        format_file_size(candidate.size_bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::{FileCandidate, IntakeLimits, ModelSource, Verdict, format_file_size, validate};
    use crate::error::IntakeError;
    use std::path::PathBuf;

    const MB: u64 = 1024 * 1024;

    fn candidate(name: &str, size_bytes: u64) -> FileCandidate {
        FileCandidate {
            name: name.to_string(),
            size_bytes,
            source: ModelSource::Path(PathBuf::from(name)),
        }
    }

    #[test]
    fn size_thresholds() {
        let limits = IntakeLimits::default();
        assert!(matches!(
            validate(&candidate("huge.glb", 600 * MB), &limits),
            Err(IntakeError::TooLarge { .. })
        ));
        assert_eq!(validate(&candidate("big.glb", 150 * MB), &limits), Ok(Verdict::Confirm));
        assert_eq!(validate(&candidate("ok.glb", 50 * MB), &limits), Ok(Verdict::Accept));
    }

    #[test]
    fn limits_are_exclusive() {
        let limits = IntakeLimits::default();
        assert_eq!(validate(&candidate("a.glb", 100 * MB), &limits), Ok(Verdict::Accept));
        assert_eq!(validate(&candidate("b.glb", 500 * MB), &limits), Ok(Verdict::Confirm));
    }

    #[test]
    fn extension_is_checked_case_insensitively() {
        let limits = IntakeLimits::default();
        assert!(validate(&candidate("Robot.GLB", 10), &limits).is_ok());
        assert!(validate(&candidate("scene.GlTf", 10), &limits).is_ok());
        for name in ["model.obj", "model.glb.zip", "glb", "model.", "archive.fbx"] {
            assert!(
                matches!(
                    validate(&candidate(name, 10), &limits),
                    Err(IntakeError::UnsupportedExtension { .. })
                ),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn wrong_extension_wins_over_size() {
        let err = validate(&candidate("huge.stl", 900 * MB), &IntakeLimits::default());
        assert!(matches!(err, Err(IntakeError::UnsupportedExtension { .. })));
    }

    #[test]
    fn formats_sizes_like_the_status_card() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * MB), "10 MB");
        assert_eq!(format_file_size(1280 * MB), "1.25 GB");
    }

    #[test]
    fn byte_candidates_report_their_length() {
        let c = FileCandidate::from_bytes("drop.glb", vec![0u8; 42].into());
        assert_eq!(c.size_bytes, 42);
        assert_eq!(c.source.display_name(), "drop.glb");
        assert!(c.source.base_dir().is_none());
    }
}
