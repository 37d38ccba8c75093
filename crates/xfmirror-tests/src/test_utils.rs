//! Canonical postbox tree used by the integration tests

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use xfmirror_config::{Config, TransportKind};
use xfmirror_transport::MemoryTransport;

/// Remote files of the canonical postbox, with their sizes
pub const POSTBOX_FILES: &[(&str, usize)] = &[
    ("Products/P1/P1_Full_20240101.flg", 0),
    ("Products/P1/P1_Full_20240201.flg", 0),
    ("Products/P1/P1_Full_20240101_1.zip", 4096),
    ("Products/P1/P1_Full_20240101_2.zip", 2048),
    ("Products/P1/P1_Full_20240201_1.zip", 5000),
    ("Products/P1/P1_Full_20240201_2.zip", 3000),
    ("Products/P1/P1_Change_20240115.zip", 300),
    ("Products/P1/P1_Change_20240201.zip", 310),
    ("Products/P1/P1_Change_20240210.zip", 320),
    ("Products/P1/P1_readme.txt", 12),
    ("Products/XpressfeedFeedConfigV2/XpressfeedFeedConfigV2_20240101.zip", 100),
    ("Products/XpressfeedFeedConfigV2/XpressfeedFeedConfigV2_20240301.zip", 110),
    ("Products/V5Loader_Linux/V5Loader.tar.gz", 7000),
    ("Products/V5Loader_Linux/README.txt", 40),
    ("Xpressfeed/aBANK01/f_aBANK01_20240101.flg", 0),
    ("Xpressfeed/aBANK01/f_aBANK01_20240101.zip", 900),
    ("Xpressfeed/aBANK01/t_aBANK01_20231231.txt", 50),
    ("Xpressfeed/aBANK01/t_aBANK01_20240102.txt", 60),
    ("Xpressfeed/suppcxf/setup.exe", 1500),
];

/// Empty remote directories of the canonical postbox
pub const POSTBOX_EMPTY_DIRS: &[&str] = &["Products/Empty"];

/// Files a full sync of the canonical postbox selects
pub const EXPECTED_SELECTION: &[&str] = &[
    "Products/P1/P1_Full_20240201.flg",
    "Products/P1/P1_Full_20240201_1.zip",
    "Products/P1/P1_Full_20240201_2.zip",
    "Products/P1/P1_Change_20240201.zip",
    "Products/P1/P1_Change_20240210.zip",
    "Products/XpressfeedFeedConfigV2/XpressfeedFeedConfigV2_20240301.zip",
    "Products/V5Loader_Linux/V5Loader.tar.gz",
    "Products/V5Loader_Linux/README.txt",
    "Xpressfeed/aBANK01/f_aBANK01_20240101.flg",
    "Xpressfeed/aBANK01/f_aBANK01_20240101.zip",
    "Xpressfeed/aBANK01/t_aBANK01_20240102.txt",
    "Xpressfeed/suppcxf/setup.exe",
];

/// Deterministic file content, distinct per path
pub fn generate_test_data(path: &str, size: usize) -> Vec<u8> {
    let seed = path.bytes().fold(7u8, |acc, b| acc.wrapping_mul(31).wrapping_add(b));
    (0..size)
        .map(|i| seed.wrapping_add((i * 7 + 13) as u8))
        .collect()
}

/// Sum of the sizes of the expected selection
pub fn expected_selection_bytes() -> u64 {
    POSTBOX_FILES
        .iter()
        .filter(|(path, _)| EXPECTED_SELECTION.contains(path))
        .map(|(_, size)| *size as u64)
        .sum()
}

/// Expected selection, sorted
pub fn sorted_expected_selection() -> Vec<String> {
    let mut expected: Vec<String> = EXPECTED_SELECTION.iter().map(|s| (*s).to_string()).collect();
    expected.sort();
    expected
}

/// Build the canonical postbox in memory
pub fn memory_postbox() -> MemoryTransport {
    let transport = MemoryTransport::new();
    for (path, size) in POSTBOX_FILES {
        transport.add_file(path, generate_test_data(path, *size));
    }
    for dir in POSTBOX_EMPTY_DIRS {
        transport.add_dir(dir);
    }
    transport
}

/// Write the canonical postbox under `root`
pub fn create_postbox_dir(root: &Path) -> io::Result<()> {
    for (path, size) in POSTBOX_FILES {
        let full_path = root.join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(full_path, generate_test_data(path, *size))?;
    }
    for dir in POSTBOX_EMPTY_DIRS {
        fs::create_dir_all(root.join(dir))?;
    }
    Ok(())
}

/// Default configuration pointed at a directory postbox
pub fn fs_config(remote_root: &Path, destination: &Path) -> Config {
    let mut config = Config::default();
    config.remote.transport = TransportKind::Fs;
    config.remote.root = Some(remote_root.to_string_lossy().into_owned());
    config.local.destination = Some(destination.to_path_buf());
    config
}

/// Every file under `root`, as sorted `/`-joined relative paths
pub fn list_files(root: &Path) -> io::Result<Vec<String>> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path: PathBuf = entry?.path();
            if path.is_dir() {
                walk(root, &path, out)?;
            } else if let Ok(relative) = path.strip_prefix(root) {
                let parts: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                out.push(parts.join("/"));
            }
        }
        Ok(())
    }

    let mut files = Vec::new();
    if root.exists() {
        walk(root, root, &mut files)?;
    }
    files.sort();
    Ok(files)
}
