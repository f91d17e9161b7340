use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub fn data_root() -> PathBuf {
    if let Some(pd) = ProjectDirs::from("com", "kelime", "Kelime") {
        pd.data_dir().to_path_buf()
    } else {
        // Fallback: current dir
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

pub fn default_store_file() -> (PathBuf, PathBuf) {
    let file = data_root().join("kelime.json");
    let backups = backups_dir_for(&file);
    (file, backups)
}

pub fn backups_dir_for(store_file: &Path) -> PathBuf {
    store_file
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("backups")
}
