//! Selection of the files a run accepts.

use crate::model::SourceFile;

pub const ACCEPTED_MEDIA_TYPE: &str = "application/pdf";

#[derive(Debug, Default)]
pub struct Intake {
    pub accepted: Vec<SourceFile>,
    /// Names of the files that were turned away.
    pub rejected: Vec<String>,
}

impl Intake {
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

/// Keeps PDFs. Parameters such as `; charset=binary` are ignored.
pub fn filter_accepted(files: impl IntoIterator<Item = SourceFile>) -> Intake {
    let mut intake = Intake::default();
    for file in files {
        let media_type = file.media_type();
        let essence = media_type.split(';').next().unwrap_or_default().trim();
        if essence.eq_ignore_ascii_case(ACCEPTED_MEDIA_TYPE) {
            intake.accepted.push(file);
        } else {
            log::debug!("Rejected '{}' ({})", file.name(), media_type);
            intake.rejected.push(file.name().to_string());
        }
    }
    intake
}
