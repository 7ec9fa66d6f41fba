//! AWS Lambda host.
//!
//! # Responsibilities
//! - Translate API Gateway / ALB events to and from HTTP (via `lambda_http`)
//! - Expose the invocation's request id as an `Invocation` extension
//! - Open one `lambda.invoke` span per invocation, parented on the caller's
//!   trace context, so handler spans nest under it
//!
//! # Design Decisions
//! - Parent comes from `traceparent` first, then the runtime's X-Ray header
//! - The invocation span is entered while the inner service is called and
//!   then instruments the returned future

use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use axum::http::Request;
use axum::Router;
use tower::{Layer, Service, ServiceBuilder};
use tracing::instrument::Instrumented;
use tracing::{Instrument, Span};

use crate::host::{Host, HostError, Invocation};
use crate::observability::tracing::{remote_parent, set_remote_parent, xray_parent};

static COLD_START: AtomicBool = AtomicBool::new(true);

/// True for the first invocation handled by this process.
fn check_cold_start() -> bool {
    if std::env::var("AWS_LAMBDA_INITIALIZATION_TYPE")
        .map(|v| v == "provisioned-concurrency")
        .unwrap_or(false)
    {
        COLD_START.store(false, Ordering::SeqCst);
        return false;
    }
    COLD_START.swap(false, Ordering::SeqCst)
}

/// Runs the router under the Lambda runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct LambdaHost;

impl Host for LambdaHost {
    async fn serve(self, app: Router) -> Result<(), HostError> {
        tracing::info!("Lambda host starting");

        let service = ServiceBuilder::new()
            .map_request(attach_invocation)
            .layer(InvocationLayer)
            .service(app);

        lambda_http::run(service).await.map_err(HostError::Lambda)
    }
}

/// Copy the runtime's invocation metadata into an [`Invocation`] extension.
pub fn attach_invocation(mut request: lambda_http::Request) -> lambda_http::Request {
    let invocation = request
        .extensions()
        .get::<lambda_http::Context>()
        .map(|ctx| Invocation {
            request_id: ctx.request_id.clone(),
            xray_trace_id: ctx.xray_trace_id.clone(),
        });

    if let Some(invocation) = invocation {
        request.extensions_mut().insert(invocation);
    }
    request
}

/// Wraps each invocation in a `lambda.invoke` span.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvocationLayer;

impl<S> Layer<S> for InvocationLayer {
    type Service = InvocationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InvocationService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct InvocationService<S> {
    inner: S,
}

impl<S, B> Service<Request<B>> for InvocationService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Instrumented<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        let span = invocation_span(&request);
        let future = {
            let _guard = span.enter();
            self.inner.call(request)
        };
        future.instrument(span)
    }
}

fn invocation_span<B>(request: &Request<B>) -> Span {
    let Some(invocation) = request.extensions().get::<Invocation>() else {
        return Span::none();
    };

    let span = tracing::info_span!(
        "lambda.invoke",
        otel.kind = "server",
        faas.trigger = "http",
        faas.invocation_id = %invocation.request_id,
        faas.coldstart = check_cold_start(),
    );

    let parent = remote_parent(request.headers()).or_else(|| {
        let xray = invocation
            .xray_trace_id
            .clone()
            .or_else(|| std::env::var("_X_AMZN_TRACE_ID").ok())?;
        xray_parent(&xray)
    });
    if let Some(parent) = parent {
        set_remote_parent(&span, parent);
    }

    span
}
