//! Server Binder — attaches the call dispatcher to every method in the
//! catalog.
//!
//! Partial proto sets are normal (mocking a slice of a larger API), so empty
//! packages and services are skipped with a warning instead of failing.

use std::path::Path;
use std::sync::Arc;

use crate::catalog::ServiceCatalog;
use crate::dispatcher::CallDispatcher;
use crate::error::RegistryError;
use crate::registry;
use crate::server::MethodTable;

/// What a bind pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindReport {
    pub bound: usize,
    pub empty_packages: usize,
    pub empty_services: usize,
    /// Streaming or already-bound methods.
    pub skipped_methods: usize,
}

/// Register the dispatcher on `table` for every unary method in `catalog`.
///
/// Runs once, before the server accepts calls.
pub fn bind<T>(
    catalog: &ServiceCatalog,
    dispatcher: &Arc<CallDispatcher>,
    table: &mut T,
) -> BindReport
where
    T: MethodTable + ?Sized,
{
    let mut report = BindReport::default();

    for (package, entry) in catalog.packages() {
        if entry.services.is_empty() {
            tracing::warn!("No services found for package '{package}'");
            report.empty_packages += 1;
            continue;
        }

        for (service_name, service) in &entry.services {
            if service.methods.is_empty() {
                tracing::warn!("No methods found for service {service_name} in package '{package}'");
                report.empty_services += 1;
                continue;
            }

            for method in service.methods.values() {
                if !method.is_unary() {
                    tracing::warn!("Skipping streaming method {}", method.key);
                    report.skipped_methods += 1;
                    continue;
                }
                if table.register(method, Arc::clone(dispatcher)) {
                    tracing::debug!("Bound {}", method.key);
                    report.bound += 1;
                } else {
                    tracing::warn!("{} is already bound; skipping", method.key);
                    report.skipped_methods += 1;
                }
            }
        }
    }

    tracing::info!(
        "Bound {} method(s) ({} skipped, {} empty service(s), {} empty package(s))",
        report.bound,
        report.skipped_methods,
        report.empty_services,
        report.empty_packages
    );
    report
}

/// Discover every service in `proto_dir` and bind it on `table`.
pub fn mount<T>(
    proto_dir: &Path,
    dispatcher: &Arc<CallDispatcher>,
    table: &mut T,
) -> Result<BindReport, RegistryError>
where
    T: MethodTable + ?Sized,
{
    let catalog = registry::load(proto_dir)?;
    Ok(bind(&catalog, dispatcher, table))
}
