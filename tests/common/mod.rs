#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub fn write_file(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, content).expect("write file");
}

/// Writes a placeholder image; only its name matters to the audit.
pub fn image(root: &Path, split: &str, file_name: &str) {
    write_file(
        &root.join(split).join("images").join(file_name),
        b"not really a jpeg",
    );
}

pub fn label(root: &Path, split: &str, stem: &str, content: &str) {
    write_file(
        &root.join(split).join("labels").join(format!("{stem}.txt")),
        content.as_bytes(),
    );
}
