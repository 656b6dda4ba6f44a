//! Fixtures shared by the integration tests: a hand-built PDF and a library
//! directory with a config file pointing at it.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

pub fn shelf_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("shelf");
    path
}

/// Minimal valid PDF with `pages` pages, each showing `phrase`, and an
/// optional `/Title` in the document info dictionary. Byte offsets in the
/// xref table are computed so both lopdf and pdf-extract can read it.
pub fn minimal_pdf(phrase: &str, pages: usize, title: Option<&str>) -> Vec<u8> {
    let content = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", phrase);
    let first_page = 5;
    let kids: Vec<String> = (0..pages)
        .map(|i| format!("{} 0 R", first_page + i))
        .collect();

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages
        ),
        format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];
    for _ in 0..pages {
        objects.push(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 3 0 R /Resources << /Font << /F1 4 0 R >> >> >>"
                .to_string(),
        );
    }
    let info_id = title.map(|t| {
        objects.push(format!("<< /Title ({}) >>", t));
        objects.len()
    });

    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj {} endobj\n", i + 1, body).as_bytes());
    }

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    let info = info_id
        .map(|id| format!(" /Info {} 0 R", id))
        .unwrap_or_default();
    out.extend_from_slice(
        format!(
            "trailer << /Size {} /Root 1 0 R{} >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            info,
            xref_start
        )
        .as_bytes(),
    );
    out
}

pub fn write_pdf(root: &Path, rel: &str, phrase: &str, pages: usize) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, minimal_pdf(phrase, pages, None)).unwrap();
    path
}

pub fn write_tags(root: &Path, rel: &str, lines: &[&str]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, lines.join("\n")).unwrap();
}

/// Temp dir holding `pdf/` (the library root) and `config/shelf.toml` with
/// extraction disabled.
pub fn setup_library() -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().to_path_buf();
    let library_root = base.join("pdf");
    fs::create_dir_all(&library_root).unwrap();

    let config_dir = base.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_content = format!(
        r#"[library]
root = "{}"

[extraction]
provider = "disabled"

[server]
bind = "127.0.0.1:7340"
public_url = "http://manuals.local:7340/"
"#,
        library_root.display()
    );
    let config_path = config_dir.join("shelf.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path, library_root)
}

pub fn run_shelf(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = shelf_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("SHELF_LOG")
        .env_remove("OPENAI_API_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run shelf binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}
