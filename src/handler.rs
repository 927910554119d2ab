//! Handler trait, outcome type, and type erasure.
//!
//! # How async handlers are stored
//!
//! The route table needs to hold handlers of *different* types in a single
//! `HashMap<String, _>`. Rust collections can only hold one concrete type,
//! so we use **trait objects** (`dyn ErasedHandler`) to hide the concrete
//! handler type behind a common interface and store everything uniformly.
//!
//! The chain from user code to vtable call is:
//!
//! ```text
//! async fn book(req: Request, g: Arc<Globals>) -> Option<String> { … }
//!        ↓ server.route("book", book)
//! book.into_boxed_handler()                        ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(book))                        ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(req, globals)  at request time      ← one vtable dispatch
//!        ↓
//! Box::pin(async { book(req, g).await.into_outcome() })  ← BoxFuture
//! ```
//!
//! The only runtime cost per request is **one Arc clone** (atomic inc) +
//! **one virtual call** — negligible compared to network I/O.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::globals::Globals;
use crate::request::Request;

// ── Outcome type ──────────────────────────────────────────────────────────────

/// What a handler produced.
///
/// Handlers usually don't construct this directly — return a `String`,
/// `&'static str`, or `Option<String>` and the [`IntoApiOutcome`] conversions
/// below do the rest. An empty string counts as a rejection: the wire
/// contract is "non-empty body or 400", never an empty 200.
pub enum ApiOutcome {
    /// Response body to send with status 200. Expected to be well-formed
    /// JSON by convention; porch does not validate it.
    Body(String),
    /// Reject the request: status 400 with the fixed JSON error body.
    Reject,
}

/// Conversion into an [`ApiOutcome`].
///
/// `None` and `""` both mean "reject as bad request".
pub trait IntoApiOutcome {
    fn into_outcome(self) -> ApiOutcome;
}

impl IntoApiOutcome for ApiOutcome {
    fn into_outcome(self) -> ApiOutcome {
        self
    }
}

impl IntoApiOutcome for String {
    fn into_outcome(self) -> ApiOutcome {
        if self.is_empty() { ApiOutcome::Reject } else { ApiOutcome::Body(self) }
    }
}

impl IntoApiOutcome for &'static str {
    fn into_outcome(self) -> ApiOutcome {
        self.to_owned().into_outcome()
    }
}

impl<T: IntoApiOutcome> IntoApiOutcome for Option<T> {
    fn into_outcome(self) -> ApiOutcome {
        match self {
            Some(inner) => inner.into_outcome(),
            None => ApiOutcome::Reject,
        }
    }
}

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to an [`ApiOutcome`].
///
/// `Pin<Box<…>>` is required because the async runtime must be able to poll
/// the future in-place — it cannot move it in memory after the first poll.
/// `Send + 'static` let tokio move the future across threads safely.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = ApiOutcome> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
/// External crates cannot usefully interact with this trait.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request, globals: Arc<Globals>) -> BoxFuture;
}

/// A heap-allocated, type-erased handler shared across concurrent requests.
///
/// `Arc` gives us cheap, thread-safe shared ownership (one atomic reference
/// count increment per request) without copying the handler.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` with the signature:
///
/// ```text
/// async fn name(req: Request, globals: Arc<Globals>) -> impl IntoApiOutcome
/// ```
///
/// The trait is **sealed** (via the private `Sealed` supertrait): only the
/// blanket impl below can satisfy it. This prevents accidental misuse and
/// keeps the API surface stable across versions.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

/// The sealing module. Because `Sealed` is private, external crates cannot
/// name it and therefore cannot implement `Handler` on their own types.
mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request, Arc<Globals>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoApiOutcome + Send + 'static,
{
}

/// Implement `Handler` for any function with the right signature.
///
/// `Fn(Request, Arc<Globals>) -> Fut` covers named `async fn` items,
/// closures returning futures, and any struct that implements `Fn`.
impl<F, Fut, R> Handler for F
where
    F: Fn(Request, Arc<Globals>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoApiOutcome + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Newtype wrapper that holds a concrete handler `F` and implements
/// [`ErasedHandler`], bridging the typed world to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request, Arc<Globals>) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoApiOutcome + Send + 'static,
{
    fn call(&self, req: Request, globals: Arc<Globals>) -> BoxFuture {
        let fut = (self.0)(req, globals);
        Box::pin(async move { fut.await.into_outcome() })
    }
}

// ── DynHandler ────────────────────────────────────────────────────────────────

/// An already-erased handler, for registration paths that cannot name a
/// concrete handler type — chiefly [`RouteLoader`](crate::RouteLoader)
/// implementations producing one handler per discovered file.
pub struct DynHandler(pub(crate) BoxedHandler);

impl DynHandler {
    pub fn new(handler: impl Handler) -> Self {
        Self(handler.into_boxed_handler())
    }
}
