use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{Map, Value};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Formats answer sources for the terminal and writes embedded images to disk.
pub struct SourceRenderer {
    image_dir: PathBuf,
}

#[derive(Clone, Copy, PartialEq)]
enum Images {
    Save,
    Reference,
}

impl SourceRenderer {
    pub fn new(image_dir: impl Into<PathBuf>) -> Self {
        Self {
            image_dir: image_dir.into(),
        }
    }

    /// Renders a fresh answer's sources, saving embedded images.
    pub fn render(&self, sources: &[Map<String, Value>]) -> String {
        self.render_with(sources, Images::Save)
    }

    /// Renders sources already shown once. Nothing is written; images point at
    /// the file saved earlier, or at the hosted URL when there is none.
    pub fn render_saved(&self, sources: &[Map<String, Value>]) -> String {
        self.render_with(sources, Images::Reference)
    }

    fn render_with(&self, sources: &[Map<String, Value>], images: Images) -> String {
        let mut output = String::new();
        if sources.is_empty() {
            return output;
        }

        output.push_str("📖 Source Context\n");
        for (i, source) in sources.iter().enumerate() {
            let _ = writeln!(output, "Source {}", i + 1);
            let _ = writeln!(output, "- Type: {}", field(source, "type", "Unknown"));
            let _ = writeln!(output, "- Page: {}", field(source, "page_number", "N/A"));
            let _ = writeln!(output, "- File: {}", field(source, "source", "N/A"));
            let _ = writeln!(output, "- Content: {}", field(source, "content", "N/A"));

            if source.get("type").and_then(Value::as_str) == Some("Image") {
                if let Some(line) = self.render_image(i + 1, source, images) {
                    let _ = writeln!(output, "{}", line);
                }
            }
        }
        output
    }

    fn render_image(
        &self,
        index: usize,
        source: &Map<String, Value>,
        images: Images,
    ) -> Option<String> {
        let page = field(source, "page_number", "None");

        if let Some(payload) = source.get("image_base64") {
            let path = self.image_path(index, source);
            if images == Images::Save {
                let payload = payload.as_str().unwrap_or_default();
                return Some(match save_image(&self.image_dir, &path, payload) {
                    Ok(()) => format!("- Image from page {}: saved to {}", page, path.display()),
                    Err(e) => format!("⚠️ Failed to display image: {}", e),
                });
            }
            if path.is_file() {
                return Some(format!("- Image from page {}: saved to {}", page, path.display()));
            }
        }

        source
            .get("imgbb_url")
            .map(|url| format!("- Image from page {}: {}", page, display(url)))
    }

    fn image_path(&self, index: usize, source: &Map<String, Value>) -> PathBuf {
        let name = source
            .get("image_name")
            .and_then(Value::as_str)
            .and_then(|name| Path::new(name).file_name())
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| {
                let ext = source
                    .get("image_ext")
                    .and_then(Value::as_str)
                    .unwrap_or("png");
                format!("source_{}.{}", index, ext)
            });

        self.image_dir.join(name)
    }
}

fn save_image(image_dir: &Path, path: &Path, payload: &str) -> anyhow::Result<()> {
    let bytes = STANDARD.decode(payload.trim())?;
    std::fs::create_dir_all(image_dir)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

fn field(source: &Map<String, Value>, key: &str, default: &str) -> String {
    source
        .get(key)
        .map(display)
        .unwrap_or_else(|| default.to_string())
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
