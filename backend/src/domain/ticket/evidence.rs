//! Evidence attached to a ticket by its reporter.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::user::UserId;

use super::TicketId;

/// Largest accepted image reference, in bytes.
///
/// References are either URLs or inline base64 payloads, so the bound is
/// sized for a compressed phone photo.
pub const MAX_IMAGE_REFERENCE_BYTES: usize = 10 * 1024 * 1024;
/// Largest accepted evidence caption, in characters.
pub const MAX_EVIDENCE_DESCRIPTION: usize = 1_000;

/// Validation errors for evidence input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvidenceValidationError {
    /// The image reference was blank.
    #[error("image reference must not be empty")]
    EmptyImage,
    /// The image reference exceeded [`MAX_IMAGE_REFERENCE_BYTES`].
    #[error("image reference must be at most {max} bytes")]
    ImageTooLarge { max: usize },
    /// The caption exceeded [`MAX_EVIDENCE_DESCRIPTION`].
    #[error("evidence description must be at most {max} characters")]
    DescriptionTooLong { max: usize },
}

/// Stable evidence identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EvidenceId(Uuid);

impl EvidenceId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

/// Validated evidence payload before it is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceDraft {
    image_ref: String,
    description: Option<String>,
}

impl EvidenceDraft {
    /// Validate an image reference and optional caption.
    ///
    /// Blank captions are treated as absent.
    pub fn try_new(
        image_ref: &str,
        description: Option<&str>,
    ) -> Result<Self, EvidenceValidationError> {
        let image_ref = image_ref.trim();
        if image_ref.is_empty() {
            return Err(EvidenceValidationError::EmptyImage);
        }
        if image_ref.len() > MAX_IMAGE_REFERENCE_BYTES {
            return Err(EvidenceValidationError::ImageTooLarge {
                max: MAX_IMAGE_REFERENCE_BYTES,
            });
        }
        let description = description.map(str::trim).filter(|text| !text.is_empty());
        if description.is_some_and(|text| text.chars().count() > MAX_EVIDENCE_DESCRIPTION) {
            return Err(EvidenceValidationError::DescriptionTooLong {
                max: MAX_EVIDENCE_DESCRIPTION,
            });
        }
        Ok(Self {
            image_ref: image_ref.to_owned(),
            description: description.map(str::to_owned),
        })
    }

    /// Materialise the draft against a ticket.
    pub fn into_evidence(
        self,
        id: EvidenceId,
        ticket_id: TicketId,
        uploaded_by: UserId,
        created_at: DateTime<Utc>,
    ) -> Evidence {
        Evidence {
            id,
            ticket_id,
            image_ref: self.image_ref,
            description: self.description,
            uploaded_by,
            created_at,
        }
    }
}

/// Supporting material attached to a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    /// Stable identifier.
    pub id: EvidenceId,
    /// Owning ticket.
    pub ticket_id: TicketId,
    /// URL or inline base64 image.
    pub image_ref: String,
    /// Optional caption.
    pub description: Option<String>,
    /// Account that attached this evidence.
    pub uploaded_by: UserId,
    /// Attachment instant.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn draft_rejects_blank_image(#[case] image: &str) {
        assert_eq!(
            EvidenceDraft::try_new(image, None),
            Err(EvidenceValidationError::EmptyImage)
        );
    }

    #[rstest]
    fn draft_rejects_oversized_image() {
        let image = "A".repeat(MAX_IMAGE_REFERENCE_BYTES + 1);
        assert_eq!(
            EvidenceDraft::try_new(&image, None),
            Err(EvidenceValidationError::ImageTooLarge {
                max: MAX_IMAGE_REFERENCE_BYTES
            })
        );
    }

    #[rstest]
    fn draft_drops_blank_caption() {
        let draft =
            EvidenceDraft::try_new("https://img.example/1.jpg", Some("  ")).expect("valid draft");
        let evidence = draft.into_evidence(
            EvidenceId::random(),
            TicketId::random(),
            UserId::random(),
            Utc::now(),
        );
        assert_eq!(evidence.description, None);
    }
}
