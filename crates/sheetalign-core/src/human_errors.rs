// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the people photographing answer sheets.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how a host UI presents it.

use crate::error::AlignError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Worth trying again with another photo of the same sheet.
    Retake,
    /// The host or operator must do something first (load a template).
    ActionRequired,
    /// Cannot be fixed by retaking the photo.
    Permanent,
}

/// A human-readable error with a plain English message and a suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether a new capture of the same sheet may succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert an `AlignError` into a `HumanError`.
pub fn humanize_error(err: &AlignError) -> HumanError {
    match err {
        AlignError::Input(_) | AlignError::Decode(_) => HumanError {
            message: "We couldn't read this picture.".into(),
            suggestion: "Make sure the file is a JPEG or PNG photo of the sheet, then try again."
                .into(),
            retriable: true,
            severity: Severity::Retake,
        },

        AlignError::Preprocess(_) => HumanError {
            message: "This picture is empty.".into(),
            suggestion: "Take the photo again so that the whole answer sheet is visible.".into(),
            retriable: true,
            severity: Severity::Retake,
        },

        AlignError::Detection(_) => HumanError {
            message: "We couldn't find the sheet's reference marks.".into(),
            suggestion: "Lay the sheet flat, avoid shadows, and keep all four corners in the frame."
                .into(),
            retriable: true,
            severity: Severity::Retake,
        },

        AlignError::NoOuterFrameFound { .. } => HumanError {
            message: "We couldn't find the edge of the answer sheet.".into(),
            suggestion: "Place the sheet on a contrasting surface and make sure its border is fully visible."
                .into(),
            retriable: true,
            severity: Severity::Retake,
        },

        AlignError::NotQuadrilateral { vertices } => HumanError {
            message: "The sheet doesn't look like a flat rectangle.".into(),
            suggestion: format!(
                "Flatten any folds or curled corners and photograph the sheet from straight above. (Outline had {vertices} corners.)"
            ),
            retriable: true,
            severity: Severity::Retake,
        },

        AlignError::Transform(_) => HumanError {
            message: "We couldn't line this sheet up with the template.".into(),
            suggestion: "Try another photo taken from directly above the sheet.".into(),
            retriable: true,
            severity: Severity::Retake,
        },

        AlignError::NotReady(_) => HumanError {
            message: "No template has been loaded yet.".into(),
            suggestion: "Load a blank template sheet before checking answer sheets.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        AlignError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "That file doesn't exist.".into(),
                suggestion: "Check the file name and location, then try again.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "We aren't allowed to open that file.".into(),
                suggestion: "Check the file's permissions, then try again.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "Something went wrong reading or writing a file.".into(),
                suggestion: format!("Check there is free disk space, then try again. ({io_err})"),
                retriable: false,
                severity: Severity::Permanent,
            },
        },

        AlignError::Serialization(_) => HumanError {
            message: "The settings file couldn't be understood.".into(),
            suggestion: "Check the configuration file for typos, or remove it to use the defaults."
                .into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}
