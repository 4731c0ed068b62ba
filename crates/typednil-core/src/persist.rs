//! On-disk fact files: one JSON file per package.

use std::path::{Path, PathBuf};

use typednil_analysis::facts::{FactError, FactFile};

/// `a/b` → `<dir>/a%b.facts.json`.
pub fn fact_file_path(dir: &Path, import_path: &str) -> PathBuf {
    dir.join(format!("{}.facts.json", import_path.replace('/', "%")))
}

/// Read the persisted facts of `import_path`. `Ok(None)` when the
/// package was never persisted.
pub fn read_fact_file(dir: &Path, import_path: &str) -> Result<Option<FactFile>, FactError> {
    let path = fact_file_path(dir, import_path);
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(&path)?;
    Ok(Some(FactFile::from_json(&data)?))
}

/// Write `file`, creating `dir` if needed. Returns the written path.
pub fn write_fact_file(dir: &Path, file: &FactFile) -> Result<PathBuf, FactError> {
    std::fs::create_dir_all(dir)?;
    let path = fact_file_path(dir, &file.package);
    std::fs::write(&path, file.to_json()?)?;
    Ok(path)
}
