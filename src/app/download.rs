//! Saving attachments to disk

use std::path::{Path, PathBuf};

/// Downloads folder, falling back to home and then the working directory
pub fn downloads_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Keep only the final path component of a sender-supplied name
fn safe_filename(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("attachment")
        .to_string()
}

/// Path in `dir` that does not exist yet: "name.ext", then "name (1).ext"...
fn unique_save_path(dir: &Path, filename: &str) -> PathBuf {
    let path = dir.join(filename);
    if !path.exists() {
        return path;
    }

    let name = Path::new(filename);
    let stem = name
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    let ext = name.extension().and_then(|s| s.to_str());

    (1..100)
        .map(|i| match ext {
            Some(e) => dir.join(format!("{} ({}).{}", stem, i, e)),
            None => dir.join(format!("{} ({})", stem, i)),
        })
        .find(|p| !p.exists())
        .unwrap_or_else(|| {
            let timestamp = chrono::Utc::now().timestamp();
            dir.join(format!("{}.{}", filename, timestamp))
        })
}

/// Blocking write; run it off the async runtime
pub fn save_into(dir: &Path, filename: &str, data: &[u8]) -> Result<PathBuf, String> {
    std::fs::create_dir_all(dir).map_err(|e| format!("{}: {}", dir.display(), e))?;
    let path = unique_save_path(dir, &safe_filename(filename));
    std::fs::write(&path, data).map_err(|e| e.to_string())?;
    Ok(path)
}
