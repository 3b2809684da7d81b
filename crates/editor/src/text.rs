//! Text draft lifecycle and optional rewriting.
//!
//! A text draft lives in [`Interaction::EditingText`] until it is
//! committed or cancelled. Commit trims surrounding whitespace and
//! silently discards drafts that trim to nothing.

use inkmark_annot::Annotation;
use thiserror::Error;

use crate::controller::Interaction;
use crate::session::EditorSession;

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("rewrite service unavailable: {0}")]
    Unavailable(String),
    #[error("rewrite rejected the input: {0}")]
    Rejected(String),
}

/// External text polishing service.
///
/// Implementations may call out to anything; the session only promises
/// that a failed rewrite leaves the draft untouched.
pub trait TextRewriter {
    fn rewrite(&self, body: &str, style_hint: &str) -> Result<String, RewriteError>;
}

impl EditorSession {
    /// Replace the open draft's body. No-op outside a text session.
    pub fn update_text_draft(&mut self, body: &str) {
        if let Interaction::EditingText { body: draft, .. } = &mut self.interaction {
            draft.clear();
            draft.push_str(body);
        }
    }

    pub fn text_draft(&self) -> Option<&str> {
        match &self.interaction {
            Interaction::EditingText { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Commit the open draft as a `Text` annotation.
    ///
    /// The body is trimmed first; a draft that is empty or whitespace
    /// only is discarded without touching the store.
    pub fn commit_text_draft(&mut self) {
        let (anchor, body) = match std::mem::replace(&mut self.interaction, Interaction::Idle) {
            Interaction::EditingText { anchor, body } => (anchor, body),
            other => {
                self.interaction = other;
                return;
            }
        };

        let trimmed = body.trim();
        if trimmed.is_empty() {
            tracing::debug!("discarding empty text draft");
            return;
        }

        let annotation = Annotation::Text {
            position: anchor,
            body: trimmed.to_owned(),
            color: self.color(),
            font_size: self.font_size(),
        };
        let page = self.page();
        self.store_mut().append(page, annotation);
    }

    /// Drop the open draft without committing.
    pub fn cancel_text_draft(&mut self) {
        if matches!(self.interaction, Interaction::EditingText { .. }) {
            self.interaction = Interaction::Idle;
        }
    }

    /// Run the open draft through a rewriter. A failed rewrite is
    /// logged and the draft keeps its current body; committing is
    /// never blocked on the rewrite service.
    pub fn polish_text_draft(&mut self, rewriter: &dyn TextRewriter, style_hint: &str) {
        let Interaction::EditingText { body, .. } = &mut self.interaction else {
            return;
        };
        match rewriter.rewrite(body, style_hint) {
            Ok(rewritten) => {
                *body = rewritten;
            }
            Err(error) => {
                tracing::warn!(%error, "text rewrite failed, keeping draft");
            }
        }
    }
}
