//! grpc-mock-core — impersonates gRPC services described by `.proto` files
//! and answers every unary call from per-session fixture files.
//!
//! # Flow
//!
//! ```text
//! registry::load(proto_dir) ─→ ServiceCatalog
//!                                   │
//! binder::bind(catalog, dispatcher, MockServer) ─→ one MethodService per path
//!                                   │
//! inbound call ─→ MethodService ─→ CallDispatcher::handle(path)
//!                                   ├─ SessionContext::current()
//!                                   └─ MockStore::{load_status, load_content}
//! ```

pub mod binder;
pub mod catalog;
pub mod codec;
pub mod dispatcher;
pub mod error;
pub mod outcome;
pub mod registry;
pub mod server;
pub mod session;
pub mod store;

pub use binder::{bind, mount, BindReport};
pub use catalog::{MethodEntry, MethodKey, ServiceCatalog};
pub use dispatcher::CallDispatcher;
pub use error::{ArtifactError, RegistryError};
pub use outcome::{CallError, CallOutcome};
pub use server::{MethodService, MethodTable, MockServer};
pub use session::{Session, SessionContext, SharedSession};
pub use store::{ArtifactPaths, FsMockStore, MockStore, StatusRecord};
