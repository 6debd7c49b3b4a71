//! # Preview Pipeline
//!
//! Coordinates JS buffer → transform → document assembly.
//!
//! The pipeline manages:
//! - Debouncing JS edits so only the last one of a burst is transformed
//! - Keeping the latest transform result (no history)
//! - Assembling the preview document from the buffers and that result

use std::time::Duration;

use bigo_common::SourceBundle;
use bigo_compiler_html::{assemble_with, DocumentOptions};
use bigo_transform::{transform_with, Compiled, Dialect, TransformOptions, TransformResult};

use crate::debounce::Debouncer;
use crate::focus::Pane;

/// A debounced transform waiting for its quiet period
///
/// Carries no source text: the JS buffer is read when the request fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformRequest {
    pub dialect: Dialect,
    /// Edit count of the JS buffer when the request was last armed
    pub revision: u64,
}

#[derive(Debug)]
pub struct PreviewPipeline {
    options: TransformOptions,
    document_options: DocumentOptions,
    debouncer: Debouncer<Pane, TransformRequest>,
    last_result: TransformResult,
    revision: u64,
    transforms: u64,
}

impl PreviewPipeline {
    pub fn new(dialect: Dialect, delay: Duration, document_options: DocumentOptions) -> Self {
        Self {
            options: TransformOptions::new(dialect),
            document_options,
            debouncer: Debouncer::new(delay),
            last_result: Ok(Compiled {
                code: String::new(),
            }),
            revision: 0,
            transforms: 0,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.options.dialect
    }

    /// Note a JS edit and (re)arm the debounced transform
    pub fn source_changed(&mut self) {
        self.revision += 1;
        let request = TransformRequest {
            dialect: self.options.dialect,
            revision: self.revision,
        };
        if self.debouncer.schedule_default(Pane::Js, request) {
            tracing::debug!("[PreviewPipeline] coalesced edit {}", self.revision);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending(&Pane::Js)
    }

    /// Wait until the pending transform is due; pends forever when idle
    pub async fn next_due(&mut self) -> TransformRequest {
        let (_, request) = self.debouncer.next_expired().await;
        request
    }

    /// Drop the pending transform, if any
    pub fn cancel(&mut self) -> bool {
        self.debouncer.cancel(&Pane::Js).is_some()
    }

    /// Transform `js` right away, replacing the last result
    pub fn run(&mut self, js: &str) -> &TransformResult {
        self.transforms += 1;
        self.last_result = transform_with(js, &self.options);

        match &self.last_result {
            Ok(compiled) => tracing::debug!(
                "[PreviewPipeline] transform {} ok ({} bytes)",
                self.transforms,
                compiled.code.len()
            ),
            Err(error) => tracing::warn!(
                "[PreviewPipeline] transform {} failed: {}",
                self.transforms,
                error
            ),
        }

        &self.last_result
    }

    pub fn last_result(&self) -> &TransformResult {
        &self.last_result
    }

    /// Number of transforms actually run
    pub fn transform_count(&self) -> u64 {
        self.transforms
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The preview document for `buffers` and the last transform result
    pub fn assemble(&self, buffers: &SourceBundle) -> String {
        assemble_with(
            &buffers.html,
            &buffers.css,
            &self.last_result,
            self.options.dialect,
            &self.document_options,
        )
    }
}
