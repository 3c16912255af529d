use crate::storage::VideoRecord;

/// What a registration call did.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationOutcome {
    /// A new record was created and its assets generated.
    Registered(VideoRecord),
    /// The content was already registered at this path; nothing changed.
    Unchanged(VideoRecord),
    /// The content was already registered elsewhere; only the path changed.
    Moved {
        record: VideoRecord,
        previous_path: String,
    },
}

impl RegistrationOutcome {
    #[must_use]
    pub const fn record(&self) -> &VideoRecord {
        match self {
            Self::Registered(record) | Self::Unchanged(record) | Self::Moved { record, .. } => {
                record
            }
        }
    }

    #[must_use]
    pub fn into_record(self) -> VideoRecord {
        match self {
            Self::Registered(record) | Self::Unchanged(record) | Self::Moved { record, .. } => {
                record
            }
        }
    }

    #[must_use]
    pub const fn is_new(&self) -> bool {
        matches!(self, Self::Registered(_))
    }

    /// Short label for logs and summaries.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Registered(_) => "registered",
            Self::Unchanged(_) => "unchanged",
            Self::Moved { .. } => "moved",
        }
    }
}
