//! One store per back-office list

use std::sync::Arc;
use std::time::Duration;

use backoffice_core::entities::access::{self, AdminStore, RoleStore};
use backoffice_core::entities::applications::{self, ApplicationStore, BookingStore};
use backoffice_core::entities::candidates::{self, CandidateStore};
use backoffice_core::entities::clients::{self, ClientStore};
use backoffice_core::entities::jobs::{self, JobStore, WeeklyTimesheetStore};
use backoffice_core::entities::timesheets::{self, InvoiceStore, TimesheetStore};
use backoffice_core::{ApiGateway, EntityStore, ListEndpoint};
use backoffice_domain::{QueryFilters, RecordId, StoreConfig};

/// Every entity store, built over one gateway with shared defaults
pub struct EntityStores {
    gateway: Arc<dyn ApiGateway>,
    config: StoreConfig,

    pub permanent_jobs: Arc<JobStore>,
    pub temporary_jobs: Arc<JobStore>,
    pub posted_jobs: Arc<JobStore>,
    pub internal_jobs: Arc<JobStore>,
    pub weekly_timesheets: Arc<WeeklyTimesheetStore>,
    pub bookings: Arc<BookingStore>,
    pub applications: Arc<ApplicationStore>,
    pub candidates: Arc<CandidateStore>,
    pub clients: Arc<ClientStore>,
    pub timesheets: Arc<TimesheetStore>,
    pub invoices: Arc<InvoiceStore>,
    pub invoice_reports: Arc<InvoiceStore>,
    pub roles: Arc<RoleStore>,
    pub admins: Arc<AdminStore>,
}

impl EntityStores {
    pub fn new(gateway: Arc<dyn ApiGateway>, config: StoreConfig) -> Self {
        let build = StoreFactory { gateway: &gateway, config };
        Self {
            permanent_jobs: build.store("permanent_jobs", jobs::permanent_list()),
            temporary_jobs: build.store("temporary_jobs", jobs::temporary_list()),
            posted_jobs: build.store("posted_jobs", jobs::posted_list()),
            internal_jobs: build.store("internal_jobs", jobs::internal_list()),
            weekly_timesheets: build.store("weekly_timesheets", jobs::weekly_timesheets()),
            bookings: build.store("bookings", applications::bookings()),
            applications: build.store("applications", applications::list()),
            candidates: build.store("candidates", candidates::list()),
            clients: build.store("clients", clients::list()),
            timesheets: build.store("timesheets", timesheets::list()),
            invoices: build.store("invoices", timesheets::invoices()),
            invoice_reports: build.store("invoice_reports", timesheets::invoice_report()),
            roles: build.store("roles", access::roles()),
            admins: build.store("admins", access::admins()),
            gateway: Arc::clone(&gateway),
            config,
        }
    }

    /// Fresh store over one client's internal jobs.
    pub fn internal_jobs_for_client(&self, client_id: impl Into<RecordId>) -> Arc<JobStore> {
        let client_id = client_id.into();
        StoreFactory { gateway: &self.gateway, config: self.config }
            .store(&format!("internal_jobs:{client_id}"), jobs::internal_for_client(client_id))
    }

    /// Return every store to its initial state, discarding in-flight fetches.
    pub fn reset_all(&self) {
        self.permanent_jobs.reset();
        self.temporary_jobs.reset();
        self.posted_jobs.reset();
        self.internal_jobs.reset();
        self.weekly_timesheets.reset();
        self.bookings.reset();
        self.applications.reset();
        self.candidates.reset();
        self.clients.reset();
        self.timesheets.reset();
        self.invoices.reset();
        self.invoice_reports.reset();
        self.roles.reset();
        self.admins.reset();
    }
}

struct StoreFactory<'a> {
    gateway: &'a Arc<dyn ApiGateway>,
    config: StoreConfig,
}

impl StoreFactory<'_> {
    fn store<F: QueryFilters>(&self, name: &str, endpoint: ListEndpoint) -> Arc<EntityStore<F>> {
        Arc::new(
            EntityStore::<F>::new(name, Arc::clone(self.gateway), endpoint)
                .with_page_size(self.config.default_page_size)
                .with_search_debounce(Duration::from_millis(self.config.search_debounce_ms)),
        )
    }
}
