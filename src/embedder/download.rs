/// Model file auto-download from HuggingFace.
///
/// Downloads the ONNX model and tokenizer files of a [`ModelSpec`] if they
/// don't already exist locally.
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::ModelSpec;

/// Local file name and path inside the repository.
const MODEL_FILES: &[(&str, &str)] = &[
    ("model.onnx", "onnx/model.onnx"),
    ("tokenizer.json", "tokenizer.json"),
    ("config.json", "config.json"),
    ("special_tokens_map.json", "special_tokens_map.json"),
    ("tokenizer_config.json", "tokenizer_config.json"),
];

/// Per-user cache location for a model, or `models/<name>` without one.
#[must_use]
pub fn default_model_dir(spec: &ModelSpec) -> PathBuf {
    match dirs::cache_dir() {
        Some(cache) => cache.join("coderag").join("models").join(spec.name),
        None => PathBuf::from("models").join(spec.name),
    }
}

#[must_use]
pub fn all_files_present(model_dir: &Path) -> bool {
    MODEL_FILES
        .iter()
        .all(|(name, _)| model_dir.join(name).exists())
}

fn file_url(spec: &ModelSpec, path: &str) -> String {
    format!("https://huggingface.co/{}/resolve/main/{path}", spec.repo)
}

/// Download missing model files from HuggingFace into `model_dir`.
///
/// Files already present are kept.
pub fn download_model_files(spec: &ModelSpec, model_dir: &Path) -> Result<()> {
    info!("Checking model files in {}", model_dir.display());

    fs::create_dir_all(model_dir)
        .with_context(|| format!("failed to create models directory: {}", model_dir.display()))?;

    if all_files_present(model_dir) {
        info!("All model files found, skipping download");
        return Ok(());
    }

    info!(model = spec.name, "Downloading model files (one-time)");

    for &(filename, url_path) in MODEL_FILES {
        let dest = model_dir.join(filename);

        if dest.exists() {
            info!("File already exists: {filename}");
            continue;
        }

        let url = file_url(spec, url_path);
        info!("Downloading {filename}...");
        download_file(&dest, &url).with_context(|| format!("failed to download {filename}"))?;
    }

    info!("Model download complete");
    Ok(())
}

/// Download a single file with a progress bar.
///
/// Writes to a `.part` file first so an interrupted download is retried.
fn download_file(dest: &Path, url: &str) -> Result<()> {
    let mut resp =
        reqwest::blocking::get(url).with_context(|| format!("HTTP request failed: {url}"))?;

    if !resp.status().is_success() {
        anyhow::bail!("bad status: {} for {url}", resp.status());
    }

    let total = resp.content_length().unwrap_or(0);

    let pb = if total > 0 {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {bar:40.cyan/blue} {percent}% ({bytes}/{total_bytes}) {msg}")
                .expect("valid template")
                .progress_chars("█▓░"),
        );
        pb
    } else {
        ProgressBar::new_spinner()
    };

    let partial = dest.with_extension("part");
    let file = fs::File::create(&partial)
        .with_context(|| format!("failed to create file: {}", partial.display()))?;

    let mut writer = pb.wrap_write(io::BufWriter::new(file));
    let written = io::copy(&mut resp, &mut writer).context("failed to stream response body")?;
    writer.flush().context("failed to write file")?;
    pb.finish_and_clear();
    info!(bytes = written, "saved {}", dest.display());

    fs::rename(&partial, dest)
        .with_context(|| format!("failed to move {} into place", partial.display()))?;
    Ok(())
}
