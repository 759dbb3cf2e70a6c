use std::io::{self, Write};
use std::process::{Command, Stdio};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use thiserror::Error;

use crate::storage::AnalysisRecord;

const WL_COPY_COMMAND: &str = "wl-copy";
const SHARE_HEADING: &str = "Plant Analysis - PlantAI";
const TEXT_DATA_URI_PREFIX: &str = "data:text/plain;base64,";

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("failed to run share command: {command}")]
    CommandIo {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("{command} exited with non-zero status: {status}")]
    CommandFailed { command: String, status: String },
}

pub type ShareResult<T> = std::result::Result<T, ShareError>;

/// Plain-text blob handed to the OS share facility.
pub fn share_text(record: &AnalysisRecord) -> String {
    format!("{SHARE_HEADING}\n\n{}", record.result_text)
}

pub fn share_data_uri(text: &str) -> String {
    format!("{TEXT_DATA_URI_PREFIX}{}", BASE64.encode(text.as_bytes()))
}

/// Shape of the blob handed to a [`ShareTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShareFormat {
    #[default]
    Text,
    /// `data:text/plain;base64,...` wrapping the share text.
    DataUri,
}

impl ShareFormat {
    pub fn render(self, record: &AnalysisRecord) -> String {
        let text = share_text(record);
        match self {
            Self::Text => text,
            Self::DataUri => share_data_uri(&text),
        }
    }
}

pub trait ShareTarget {
    fn share(&self, text: &str) -> ShareResult<()>;
}

/// Places the text on the Wayland clipboard.
#[derive(Debug, Default)]
pub struct WlCopyShareTarget;

impl ShareTarget for WlCopyShareTarget {
    fn share(&self, text: &str) -> ShareResult<()> {
        let command_io = |source: io::Error| ShareError::CommandIo {
            command: WL_COPY_COMMAND.to_string(),
            source,
        };

        let mut child = Command::new(WL_COPY_COMMAND)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(command_io)?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).map_err(command_io)?;
        }
        let status = child.wait().map_err(command_io)?;

        if status.success() {
            Ok(())
        } else {
            Err(ShareError::CommandFailed {
                command: WL_COPY_COMMAND.to_string(),
                status: status.to_string(),
            })
        }
    }
}

/// Builds the share blob for `record` and hands it to `target`.
pub fn share_record<T: ShareTarget>(
    target: &T,
    record: &AnalysisRecord,
    format: ShareFormat,
) -> ShareResult<()> {
    let blob = format.render(record);
    target.share(&blob).inspect_err(|err| {
        tracing::warn!(?err, id = %record.id, ?format, "sharing analysis failed");
    })
}
