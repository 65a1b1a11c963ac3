//! Document intake and analysis completion

use crate::retention::RetentionScheduler;
use chrono::Utc;
use sentinel_state::{
    file_extension, Action, ActivityEvent, ActivityType, Document, DocumentId, DocumentPatch,
    DocumentStatus, Percentage, Severity, Store, ValidationError,
};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Outcome reported by the external document analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Analyzed {
        risk_score: Percentage,
        sensitive_data: BTreeSet<String>,
    },
    Failed {
        reason: String,
    },
}

impl AnalysisOutcome {
    /// Successful analysis with the given labels
    #[must_use]
    pub fn analyzed<I, S>(risk_score: Percentage, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AnalysisOutcome::Analyzed {
            risk_score,
            sensitive_data: labels.into_iter().map(Into::into).collect(),
        }
    }
}

/// Uploads, analysis results and explicit deletes
#[derive(Debug, Clone)]
pub struct DocumentService {
    store: Store,
    retention: RetentionScheduler,
}

impl DocumentService {
    #[inline]
    #[must_use]
    pub fn new(store: Store, retention: RetentionScheduler) -> Self {
        Self { store, retention }
    }

    /// Add a document for `content` and arm its retention timer
    ///
    /// The retention window is the one in force when the document is added.
    ///
    /// # Errors
    /// - `ValidationError::FileTypeNotAllowed` if the extension is missing
    ///   or not in `settings.allowed_file_types`
    pub fn upload_document(
        &self,
        filename: &str,
        content: &[u8],
    ) -> Result<Document, ValidationError> {
        let now = Utc::now();
        let content_hash = hex::encode(Sha256::digest(content));
        let file_size = content.len() as u64;

        let (document, retention) = self.store.transact(|state| {
            let kind = match file_extension(filename) {
                Some(ext) if state.settings.allowed_file_types.contains(&ext) => ext,
                _ => {
                    return (
                        Vec::new(),
                        Err(ValidationError::FileTypeNotAllowed(filename.to_string())),
                    )
                }
            };
            let document = Document::new(filename, kind, file_size, content_hash, now);
            let event = ActivityEvent::new(
                ActivityType::Upload,
                Severity::Info,
                "Document Uploaded",
                format!("{filename} ({}) uploaded for analysis", document.display_size()),
                now,
            );
            let retention = state
                .settings
                .auto_delete_expired
                .then_some(state.settings.retention_duration);
            (
                vec![
                    Action::AddDocument(document.clone()),
                    Action::AddActivity(event),
                ],
                Ok((document, retention)),
            )
        })?;

        tracing::info!(
            document_id = %document.id,
            filename,
            file_size,
            "document uploaded"
        );
        match retention {
            Some(period) => {
                self.retention.arm_for(document.id, period);
            }
            None => tracing::debug!(
                document_id = %document.id,
                "auto-delete disabled; retention timer not armed"
            ),
        }
        Ok(document)
    }

    /// Merge an analysis outcome into document `id`
    ///
    /// # Returns
    /// Whether the document existed
    pub fn record_analysis(&self, id: DocumentId, outcome: AnalysisOutcome) -> bool {
        let now = Utc::now();
        let recorded = self.store.transact(|state| {
            let Some(doc) = state.document(id) else {
                return (Vec::new(), false);
            };
            let filename = &doc.filename;
            let actions = match outcome {
                AnalysisOutcome::Analyzed {
                    risk_score,
                    sensitive_data,
                } => {
                    let mut actions = vec![
                        Action::UpdateDocument {
                            id,
                            patch: DocumentPatch::new()
                                .with_status(DocumentStatus::Analyzed)
                                .with_risk_score(risk_score)
                                .with_sensitive_data(sensitive_data.clone()),
                        },
                        Action::AddActivity(ActivityEvent::new(
                            ActivityType::Upload,
                            Severity::Info,
                            "Document Analyzed",
                            format!(
                                "{filename} analyzed: risk score {risk_score}, {} sensitive data categories",
                                sensitive_data.len()
                            ),
                            now,
                        )),
                    ];
                    let threshold = state.settings.risk_threshold;
                    if risk_score >= threshold {
                        actions.push(Action::AddActivity(ActivityEvent::new(
                            ActivityType::Alert,
                            Severity::Warning,
                            "High Risk Document",
                            format!(
                                "{filename} risk score {risk_score} meets the {threshold} threshold"
                            ),
                            now,
                        )));
                    }
                    actions
                }
                AnalysisOutcome::Failed { reason } => vec![
                    Action::UpdateDocument {
                        id,
                        patch: DocumentPatch::new().with_status(DocumentStatus::Failed),
                    },
                    Action::AddActivity(ActivityEvent::new(
                        ActivityType::Upload,
                        Severity::Critical,
                        "Document Analysis Failed",
                        format!("{filename}: {reason}"),
                        now,
                    )),
                ],
            };
            (actions, true)
        });

        if recorded {
            tracing::info!(document_id = %id, "analysis recorded");
        }
        recorded
    }

    /// Delete document `id` and cancel its retention timer
    ///
    /// # Returns
    /// Whether the document existed
    pub fn delete(&self, id: DocumentId) -> bool {
        self.retention.cancel(id);
        let existed = self.store.transact(|state| {
            if state.document(id).is_some() {
                (vec![Action::DeleteDocument(id)], true)
            } else {
                (Vec::new(), false)
            }
        });
        if existed {
            tracing::info!(document_id = %id, "document deleted");
        }
        existed
    }

    /// The retention scheduler backing this service
    #[inline]
    #[must_use]
    pub fn retention(&self) -> &RetentionScheduler {
        &self.retention
    }
}
