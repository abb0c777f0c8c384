//! The request pipeline orchestrator.
//!
//! An [`Endpoint`] bundles a route's policy, input declaration, success
//! status, and handler into an axum-compatible request handler that runs
//! the full pipeline:
//!
//! 1. Enforce policy (may short-circuit the whole request)
//! 2. Construct the per-request [`ServiceRegistry`], only for admitted
//!    requests, with the organization context policy enforcement resolved
//! 3. Validate declared input (or extract multipart files)
//! 4. Assemble the [`RequestContext`] and invoke the handler
//! 5. Wrap the outcome in the success envelope, or map the error once,
//!    here, and nowhere else
//! 6. Schedule registry cleanup as a background task, exactly once, on
//!    every exit path
//!
//! # Example
//!
//! ```rust,ignore
//! use atelier_gateway::pipeline::Endpoint;
//! use atelier_gateway::policy::Policy;
//! use atelier_core::types::UserRole;
//! use axum::{Router, routing::post};
//!
//! let create_content = Endpoint::new(
//!     Policy::new().roles([UserRole::Creator]).require_org_membership(),
//!     |ctx| async move {
//!         let services = ctx.services.clone();
//!         // ... business logic ...
//!         Ok(serde_json::json!({ "id": "abc" }))
//!     },
//! )
//! .success(axum::http::StatusCode::CREATED);
//!
//! let app = Router::new().route("/content", post(create_content.into_handler(state)));
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequest, FromRequestParts, Request, multipart::Multipart, RawPathParams},
    http::{HeaderMap, HeaderValue, StatusCode, header, request::Parts},
    response::Response,
};
use bytes::Bytes;
use serde_json::Value;
use tracing::{debug, error};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::error::{GatewayError, GatewayResult};
use crate::input::{self, DeclaredInput};
use crate::policy::enforce::{PolicyEnforcer, resolve_client_ip};
use crate::policy::{AuthLevel, Policy};
use crate::response;
use crate::services::ServiceRegistry;
use crate::state::PlatformState;
use crate::upload::{FileFieldConfig, extract_files};

/// Header carrying the request correlation id.
pub static X_REQUEST_ID: header::HeaderName = header::HeaderName::from_static("x-request-id");

/// The future returned by endpoint handlers.
pub type HandlerFuture = Pin<Box<dyn Future<Output = GatewayResult<Value>> + Send>>;

type HandlerFn = Arc<dyn Fn(RequestContext) -> HandlerFuture + Send + Sync>;

/// One declared API endpoint: policy, input, and handler.
///
/// Cheap to clone; built once at router assembly.
#[derive(Clone)]
pub struct Endpoint {
    policy: Policy,
    input: DeclaredInput,
    files: Option<HashMap<String, FileFieldConfig>>,
    success: StatusCode,
    handler: HandlerFn,
}

impl Endpoint {
    /// Creates an endpoint from a policy and a handler.
    ///
    /// Defaults: no declared input, success status 200.
    pub fn new<F, Fut>(policy: Policy, handler: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = GatewayResult<Value>> + Send + 'static,
    {
        Self {
            policy,
            input: DeclaredInput::new(),
            files: None,
            success: StatusCode::OK,
            handler: Arc::new(move |ctx| Box::pin(handler(ctx)) as HandlerFuture),
        }
    }

    /// Declares the input schemas for this endpoint.
    pub fn input(mut self, input: DeclaredInput) -> Self {
        self.input = input;
        self
    }

    /// Declares multipart file fields for this endpoint.
    ///
    /// Replaces body validation: the body is multipart form data, so a
    /// declared body schema is ignored; params and query schemas still
    /// apply.
    pub fn files(mut self, files: HashMap<String, FileFieldConfig>) -> Self {
        self.files = Some(files);
        self
    }

    /// Sets the status used for successful responses.
    pub fn success(mut self, status: StatusCode) -> Self {
        self.success = status;
        self
    }

    /// Converts the endpoint into an axum handler function.
    pub fn into_handler(
        self,
        state: PlatformState,
    ) -> impl Fn(Request) -> Pin<Box<dyn Future<Output = Response> + Send>>
    + Clone
    + Send
    + Sync
    + 'static {
        let endpoint = Arc::new(self);
        move |req: Request| {
            let endpoint = Arc::clone(&endpoint);
            let state = state.clone();
            Box::pin(async move { endpoint.run(&state, req).await })
                as Pin<Box<dyn Future<Output = Response> + Send>>
        }
    }

    /// Runs the pipeline for one request.
    ///
    /// Never panics and never leaks an unmapped error: every outcome
    /// becomes a response here, and registry cleanup is scheduled exactly
    /// once whether the request succeeded, was rejected by policy, or
    /// failed in the handler.
    pub async fn run(&self, state: &PlatformState, req: Request) -> Response {
        let request_id = request_id_from(req.headers());
        let mut registry: Option<Arc<ServiceRegistry>> = None;

        let result = self.execute(state, req, &request_id, &mut registry).await;

        let mut response = match result {
            Ok(response) => response,
            Err(err) => {
                match &err {
                    GatewayError::Internal { message } | GatewayError::Configuration { message } => {
                        error!(request_id = %request_id, error = %message, "request failed");
                    }
                    other => {
                        debug!(request_id = %request_id, code = other.code(), "request rejected");
                    }
                }
                axum::response::IntoResponse::into_response(err)
            }
        };

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(&X_REQUEST_ID, value);
        }

        // Releasing the shared resource must not add latency to the
        // response; cleanup runs in the background. The registry slot is
        // taken exactly once, so cleanup is scheduled exactly once.
        if let Some(registry) = registry {
            tokio::spawn(async move { registry.cleanup().await });
        }

        response
    }

    async fn execute(
        &self,
        state: &PlatformState,
        req: Request,
        request_id: &str,
        registry_slot: &mut Option<Arc<ServiceRegistry>>,
    ) -> GatewayResult<Response> {
        let (mut parts, body) = req.into_parts();
        let path_params = raw_path_params(&mut parts).await;

        let is_multipart = self.files.is_some();
        let needs_raw_body =
            !is_multipart && (self.input.needs_body() || self.policy.auth == AuthLevel::Worker);

        let mut body_bytes: Option<Bytes> = None;
        let mut multipart_body: Option<Body> = None;
        if is_multipart {
            multipart_body = Some(body);
        } else if needs_raw_body {
            let bytes = axum::body::to_bytes(body, state.config().max_body_size)
                .await
                .map_err(|err| {
                    GatewayError::validation(format!("Unreadable request body: {err}"))
                })?;
            body_bytes = Some(bytes);
        }

        // Policy runs to completion before anything else is evaluated.
        let enforcement = PolicyEnforcer::new(state)
            .enforce(
                &self.policy,
                &parts,
                &path_params,
                body_bytes.as_deref().unwrap_or(&[]),
            )
            .await?;

        // Service construction never happens for rejected requests.
        let registry = Arc::new(ServiceRegistry::new(
            state.catalog_arc(),
            state.resources_arc(),
            state.config().environment.to_string(),
            enforcement.organization_id,
        ));
        *registry_slot = Some(Arc::clone(&registry));

        // Multipart routes validate params/query only; the body is form data.
        let declared = if is_multipart {
            DeclaredInput {
                params: self.input.params.clone(),
                query: self.input.query.clone(),
                body: None,
            }
        } else {
            self.input.clone()
        };
        let input = input::validate(
            &declared,
            &path_params,
            parts.uri.query(),
            body_bytes.as_ref(),
        )?;

        let client_ip = resolve_client_ip(&parts);
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let files = match (&self.files, multipart_body) {
            (Some(configs), Some(body)) => {
                let req = Request::from_parts(parts, body);
                let multipart = Multipart::from_request(req, &()).await.map_err(|err| {
                    GatewayError::validation(format!("Malformed multipart body: {err}"))
                })?;
                extract_files(multipart, configs, state.config().max_upload_size).await?
            }
            _ => HashMap::new(),
        };

        let (user, session) = match enforcement.session {
            Some(resolved) => (Some(resolved.user), Some(resolved.session)),
            None => (None, None),
        };

        let context = RequestContext {
            user,
            session,
            input,
            request_id: request_id.to_string(),
            client_ip,
            user_agent,
            organization_id: enforcement.organization_id,
            organization_role: enforcement.organization_role,
            files,
            services: Arc::clone(&registry),
        };

        let result = (self.handler)(context).await?;
        Ok(response::success(self.success, result))
    }
}

/// Returns the incoming correlation id, or mints one.
fn request_id_from(headers: &HeaderMap) -> String {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Collects route parameters captured by the router.
async fn raw_path_params(parts: &mut Parts) -> HashMap<String, String> {
    match RawPathParams::from_request_parts(parts, &()).await {
        Ok(params) => params
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        Err(_) => HashMap::new(),
    }
}
