//! Output sinks: save to disk, preview as a data URL, or hand to a printer.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::task::JoinHandle;

use crate::error::Error;

#[derive(Clone, Debug)]
pub struct PrintOptions {
    /// Print command; the PDF path is appended as the last argument.
    pub command: String,
    pub args: Vec<String>,
    /// Passed as `-d <printer>` before the file.
    pub printer: Option<String>,
    /// How long to keep the temporary PDF when the print command's exit
    /// cannot be observed.
    pub cleanup_delay: Duration,
}

impl Default for PrintOptions {
    fn default() -> Self {
        PrintOptions {
            command: "lp".to_string(),
            args: Vec::new(),
            printer: None,
            cleanup_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Clone, Debug)]
pub enum OutputMode {
    /// Write `<type>_<number>.pdf` into the directory.
    Save { dir: PathBuf },
    /// Return a `data:application/pdf` URL.
    Preview,
    Print(PrintOptions),
}

/// A dispatched print. Nothing reports whether the printer succeeded; the
/// handle only tracks removal of the temporary file.
#[derive(Debug)]
pub struct PrintJob {
    path: PathBuf,
    cleanup: JoinHandle<()>,
}

impl PrintJob {
    /// Temporary PDF handed to the print command.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait until the temporary PDF has been removed.
    pub async fn wait(self) {
        if let Err(e) = self.cleanup.await {
            log::warn!("Print cleanup task failed: {e}");
        }
    }
}

#[derive(Debug)]
pub enum Rendered {
    Saved(PathBuf),
    Preview(String),
    Printed(PrintJob),
}

pub(crate) async fn save(bytes: &[u8], dir: &Path, file_name: &str) -> Result<PathBuf, Error> {
    let path = dir.join(file_name);
    tokio::fs::write(&path, bytes).await.map_err(|e| {
        Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())))
    })?;
    Ok(path)
}

pub fn data_url(bytes: &[u8], file_name: &str) -> String {
    format!(
        "data:application/pdf;filename={};base64,{}",
        file_name,
        BASE64.encode(bytes)
    )
}

/// Write the PDF to a temporary file and start the print command. The file
/// is removed once the command exits, or after `cleanup_delay` when waiting
/// on it fails. Failures after dispatch are only logged.
pub(crate) fn print(bytes: &[u8], options: &PrintOptions) -> Result<PrintJob, Error> {
    let mut file = tempfile::Builder::new()
        .prefix("bizdoc-")
        .suffix(".pdf")
        .tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    let path = file.into_temp_path();
    let path_buf = path.to_path_buf();

    let mut cmd = tokio::process::Command::new(&options.command);
    cmd.args(&options.args);
    if let Some(printer) = &options.printer {
        cmd.arg("-d").arg(printer);
    }
    cmd.arg(&*path);
    let mut child = cmd
        .spawn()
        .map_err(|e| Error::Print(format!("Failed to start `{}`: {}", options.command, e)))?;
    log::info!("Sent {} to `{}`", path.display(), options.command);

    let delay = options.cleanup_delay;
    let command = options.command.clone();
    let cleanup = tokio::spawn(async move {
        match child.wait().await {
            Ok(status) if status.success() => log::debug!("`{command}` finished"),
            Ok(status) => log::warn!("`{command}` exited with {status}"),
            Err(e) => {
                log::warn!("Could not wait on `{command}`: {e}");
                tokio::time::sleep(delay).await;
            }
        }
        if let Err(e) = path.close() {
            log::warn!("Failed to remove temporary print file: {e}");
        }
    });

    Ok(PrintJob {
        path: path_buf,
        cleanup,
    })
}
