use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Turns a display name into something usable as a file name.
pub fn file_stem(name: &str) -> String {
    let stem = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>();
    let stem = stem.trim().trim_start_matches('.');
    if stem.is_empty() { "_".to_owned() } else { stem.to_owned() }
}

/// Writes next to `path` first, then renames over it, so readers never see half a file.
pub fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let tmp = sibling_tmp(path);
    if let Err(e) = fs::write(&tmp, contents).and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

fn sibling_tmp(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
