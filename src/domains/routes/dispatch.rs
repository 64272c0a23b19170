//! Per-request lifecycle of a tool route.
//!
//! accept upload -> stage -> invoke capability -> respond, with the staged
//! files removed on every exit path by the [`StagedUpload`] guard.
//!
//! [`StagedUpload`]: crate::domains::uploads::StagedUpload

use axum::{
    extract::{Multipart, State, multipart::MultipartRejection},
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::error::RouteError;
use crate::domains::capabilities::{Capability, CapabilityOutput, CapabilityRequest};
use crate::domains::plugins::{Plugin, ToolSchema};
use crate::domains::uploads::{StagingArea, UploadDiscipline, UploadError, receive};

/// Everything one tool route needs at request time.
pub struct RouteContext {
    pub plugin: Arc<Plugin>,
    pub capability: Arc<dyn Capability>,
    pub discipline: UploadDiscipline,
    pub staging: Arc<StagingArea>,
}

/// Axum handler shared by every tool route.
pub async fn handle(
    State(ctx): State<Arc<RouteContext>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    match dispatch(&ctx, multipart).await {
        Ok(output) => output.into_response(),
        Err(e) => e.into_response(),
    }
}

#[instrument(skip_all, fields(plugin = %ctx.plugin.slug()))]
async fn dispatch(
    ctx: &RouteContext,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<CapabilityOutput, RouteError> {
    let multipart = multipart.map_err(|e| UploadError::Malformed(e.body_text()))?;

    // Owns every staged path from here on; dropped when this function returns.
    let mut staged = ctx.staging.begin();

    let fields = receive(multipart, &ctx.discipline, &mut staged).await?;
    let options = collect_options(&ctx.plugin.schema, fields);
    let scratch_dir = staged.scratch_dir().await.map_err(UploadError::Staging)?;

    let request = CapabilityRequest {
        files: staged.files().to_vec(),
        options,
        scratch_dir,
    };

    info!(
        "Invoking {} with {} file(s)",
        ctx.capability.name(),
        request.files.len()
    );
    let output = ctx.capability.invoke(request).await?;
    Ok(output)
}

/// Keep the form fields the schema declares, filling absent ones from defaults.
pub fn collect_options(
    schema: &ToolSchema,
    mut fields: HashMap<String, String>,
) -> HashMap<String, String> {
    let mut options = HashMap::new();
    for spec in &schema.options {
        let value = fields
            .remove(&spec.name)
            .or_else(|| spec.default_as_form_value());
        if let Some(value) = value {
            options.insert(spec.name.clone(), value);
        }
    }
    for ignored in fields.keys() {
        debug!("Ignoring undeclared form field '{}'", ignored);
    }
    options
}
