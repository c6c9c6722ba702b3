//! SVG to PDF conversion through an external program.
//!
//! The converter is invoked as `<program> -f pdf [-d X -p Y]`, receives the
//! SVG document on stdin and writes the PDF to stdout. `rsvg-convert` from
//! librsvg follows this interface.

use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use tracing::debug;
use wait_timeout::ChildExt;

use crate::error::{LabelError, Result};

/// A configured converter invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converter {
    program: String,
    dpi: Option<(u32, u32)>,
    timeout: Duration,
}

impl Converter {
    pub fn new(program: impl Into<String>, dpi: Option<(u32, u32)>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            dpi,
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the program.
    ///
    /// # Examples
    ///
    /// ```
    /// use invent_label::Converter;
    /// use std::time::Duration;
    ///
    /// let converter = Converter::new("rsvg-convert", Some((300, 300)), Duration::from_secs(30));
    /// assert_eq!(converter.args(), vec!["-f", "pdf", "-d", "300", "-p", "300"]);
    ///
    /// let plain = Converter::new("rsvg-convert", None, Duration::from_secs(30));
    /// assert_eq!(plain.args(), vec!["-f", "pdf"]);
    /// ```
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["-f".to_string(), "pdf".to_string()];
        if let Some((x, y)) = self.dpi {
            args.extend(["-d".to_string(), x.to_string(), "-p".to_string(), y.to_string()]);
        }
        args
    }

    /// Converts an SVG document and returns the converter's output.
    ///
    /// # Errors
    ///
    /// - [`LabelError::ConverterSpawn`] if the program cannot be started
    /// - [`LabelError::ConverterTimeout`] if it runs longer than the timeout
    ///   (the process is killed)
    /// - [`LabelError::ConverterFailed`] if it exits unsuccessfully
    pub fn convert(&self, svg: &[u8]) -> Result<Vec<u8>> {
        let args = self.args();
        debug!(program = %self.program, ?args, bytes = svg.len(), "running converter");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| LabelError::ConverterSpawn {
                program: self.program.clone(),
                source,
            })?;

        // Feed and drain the pipes concurrently so a large document cannot
        // deadlock against a full pipe buffer.
        let stdin_thread = child.stdin.take().map(|mut pipe| {
            let input = svg.to_vec();
            thread::spawn(move || pipe.write_all(&input))
        });
        let stdout_thread = child.stdout.take().map(|pipe| thread::spawn(move || drain(pipe)));
        let stderr_thread = child.stderr.take().map(|pipe| thread::spawn(move || drain(pipe)));

        let status = match child.wait_timeout(self.timeout)? {
            Some(status) => status,
            None => {
                debug!(program = %self.program, "converter timed out, killing process");
                let _ = child.kill();
                let _ = child.wait();
                return Err(LabelError::ConverterTimeout {
                    program: self.program.clone(),
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        if let Some(Ok(Err(e))) = stdin_thread.map(|t| t.join()) {
            debug!(program = %self.program, error = %e, "converter did not consume all input");
        }
        let stdout = stdout_thread
            .and_then(|t| t.join().ok())
            .transpose()?
            .unwrap_or_default();
        let stderr = stderr_thread
            .and_then(|t| t.join().ok())
            .transpose()?
            .unwrap_or_default();

        if !status.success() {
            return Err(LabelError::ConverterFailed {
                status: status.to_string(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }
        debug!(program = %self.program, bytes = stdout.len(), "converter finished");
        Ok(stdout)
    }
}

fn drain(mut pipe: impl Read) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf)?;
    Ok(buf)
}
