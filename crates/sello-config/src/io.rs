use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Escribe `contents` en un fichero temporal hermano y lo renombra sobre `path`.
///
/// Un lector concurrente ve el contenido anterior o el nuevo, nunca uno a medias.
pub fn atomic_write_str(path: &Path, contents: &str) -> io::Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }

  let tmp_path = path.with_extension("tmp");

  {
    let mut tmp_file = fs::File::create(&tmp_path)?;
    tmp_file.write_all(contents.as_bytes())?;
    tmp_file.sync_all()?;
  }

  fs::rename(&tmp_path, path)?;
  Ok(())
}
