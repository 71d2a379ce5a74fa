//! Checkout coordinator orchestrating the settlement workflow.

use chrono::Utc;
use common::{AttemptId, ClientId, ProjectId};
use domain::{Money, PaymentType, Sale, SaleItem, SaleOrigin, SaleState, invoice_code};
use stores::{AttemptLog, AttemptRecord, CartStore, CatalogStore, SaleStore};

use crate::aggregate::CheckoutAttempt;
use crate::error::{CheckoutError, Result};
use crate::events::AttemptEvent;
use crate::services::directory::Directory;
use crate::settlement;

/// A validated settlement request, ready to run.
///
/// Both checkout channels normalize into this before the shared
/// workflow executes; the channels differ only in how they resolve the
/// project, the client and the line items.
#[derive(Debug, Clone)]
pub struct SettlementRequest {
    /// Project whose stock and sale sequence the attempt touches.
    pub project_id: ProjectId,
    /// Resolved client record, when one exists.
    pub client: Option<ClientId>,
    /// Customer email, when known.
    pub email: Option<String>,
    /// Line items to sell.
    pub items: Vec<SaleItem>,
    /// State the sale is written with.
    pub sale_state: SaleState,
    /// Payment method tag.
    pub payment_type: PaymentType,
    /// Channel that triggered the attempt.
    pub origin: SaleOrigin,
    /// When set, the pending cart for this email is cleared as the
    /// final step.
    pub clear_cart_for: Option<String>,
}

/// An in-store sale as the operator submits it.
#[derive(Debug, Clone)]
pub struct AdminSaleRequest {
    /// Client document number, if the operator entered one.
    pub dni: Option<String>,
    /// Customer email, if known.
    pub email: Option<String>,
    /// Line items to sell.
    pub items: Vec<SaleItem>,
    /// Sale state; defaults to paid when omitted.
    pub state: Option<SaleState>,
    /// Payment method tag.
    pub payment_type: PaymentType,
    /// Total as the operator's screen computed it, checked against the
    /// line items when present.
    pub declared_total: Option<Money>,
}

/// Result of a successful settlement.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    /// The journaled attempt.
    pub attempt_id: AttemptId,
    /// The committed sale.
    pub sale: Sale,
}

/// Orchestrates checkout settlements across the catalog, cart and sale
/// stores.
///
/// The workflow runs three journaled steps (persist sale → decrement
/// stock → clear cart) with compensating actions on failure. The
/// attempt itself is rebuilt from its journal, so a crashed attempt is
/// reconcilable.
pub struct CheckoutCoordinator<Cat, Crt, Sal, Log, Dir>
where
    Cat: CatalogStore,
    Crt: CartStore,
    Sal: SaleStore,
    Log: AttemptLog,
    Dir: Directory,
{
    catalog: Cat,
    carts: Crt,
    sales: Sal,
    log: Log,
    directory: Dir,
}

impl<Cat, Crt, Sal, Log, Dir> CheckoutCoordinator<Cat, Crt, Sal, Log, Dir>
where
    Cat: CatalogStore,
    Crt: CartStore,
    Sal: SaleStore,
    Log: AttemptLog,
    Dir: Directory,
{
    /// Creates a new checkout coordinator.
    pub fn new(catalog: Cat, carts: Crt, sales: Sal, log: Log, directory: Dir) -> Self {
        Self {
            catalog,
            carts,
            sales,
            log,
            directory,
        }
    }

    /// Settles the customer's pending cart.
    ///
    /// The customer must have a project assignment and a non-empty
    /// pending cart whose stored total agrees with its items. On
    /// success the sale is written ready-for-delivery and the cart is
    /// cleared.
    #[tracing::instrument(skip(self))]
    pub async fn checkout_web(&self, email: &str) -> Result<SettlementOutcome> {
        let project_id = self
            .directory
            .resolve_project_for_customer(email)
            .await?
            .ok_or(CheckoutError::NoProjectAssigned)?;

        let cart = self
            .carts
            .find_pending(email, &project_id)
            .await?
            .ok_or(CheckoutError::CartNotFound)?;

        if cart.items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if cart.total.is_zero() || cart.total.is_negative() || cart.total != cart.computed_total()
        {
            return Err(CheckoutError::InvalidTotal);
        }

        let client = self.directory.find_client_by_email(email).await?;
        let items: Vec<SaleItem> = cart
            .items
            .iter()
            .map(|item| SaleItem {
                product_id: item.product_id.clone(),
                unit_price: item.unit_price,
                quantity: item.quantity,
            })
            .collect();

        self.settle(SettlementRequest {
            project_id,
            client,
            email: Some(email.to_string()),
            items,
            sale_state: SaleState::ReadyForDelivery,
            payment_type: PaymentType::gateway(),
            origin: SaleOrigin::Web,
            clear_cart_for: Some(email.to_string()),
        })
        .await
    }

    /// Settles an in-store sale submitted by an operator.
    ///
    /// The operator must have a project assignment. The client is
    /// resolved by document number first, then by email. When the
    /// customer's email is given, their pending web cart for the same
    /// project is also cleared; a missing cart is not an error.
    #[tracing::instrument(skip(self, request))]
    pub async fn checkout_admin(
        &self,
        username: &str,
        request: AdminSaleRequest,
    ) -> Result<SettlementOutcome> {
        let project_id = self
            .directory
            .resolve_project_for_admin(username)
            .await?
            .ok_or(CheckoutError::NoProjectAssigned)?;

        if request.items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if let Some(declared) = request.declared_total {
            let computed: Money = request.items.iter().map(SaleItem::line_total).sum();
            if declared != computed {
                return Err(CheckoutError::InvalidTotal);
            }
        }

        let mut client = None;
        if let Some(dni) = request.dni.as_deref() {
            client = self.directory.find_client_by_dni(dni).await?;
        }
        if client.is_none() {
            if let Some(email) = request.email.as_deref() {
                client = self.directory.find_client_by_email(email).await?;
            }
        }

        self.settle(SettlementRequest {
            project_id,
            client,
            email: request.email.clone(),
            items: request.items,
            sale_state: request.state.unwrap_or(SaleState::Paid),
            payment_type: request.payment_type,
            origin: SaleOrigin::InStore,
            clear_cart_for: request.email,
        })
        .await
    }

    /// Runs the settlement workflow for a normalized request.
    ///
    /// Validation reads a catalog snapshot first and rejects without
    /// touching the journal; only a request that passed every check
    /// starts an attempt.
    #[tracing::instrument(
        skip(self, request),
        fields(workflow = settlement::WORKFLOW_TYPE, project = %request.project_id)
    )]
    pub async fn settle(&self, request: SettlementRequest) -> Result<SettlementOutcome> {
        metrics::counter!("checkout_attempts_total").increment(1);
        let attempt_start = std::time::Instant::now();

        // 1. Validate against a catalog snapshot, side-effect free
        for item in &request.items {
            if item.quantity == 0 {
                return Err(CheckoutError::InvalidQuantity(item.product_id.clone()));
            }
            let product = self
                .catalog
                .get(&item.product_id)
                .await?
                .ok_or_else(|| CheckoutError::ProductNotFound(item.product_id.clone()))?;
            let detail = product.project_detail(&request.project_id).ok_or_else(|| {
                CheckoutError::ProjectDetailNotFound(item.product_id.clone())
            })?;
            if detail.stock < i64::from(item.quantity) {
                return Err(CheckoutError::InsufficientStock(item.product_id.clone()));
            }
        }

        // 2. Start the attempt
        let attempt_id = AttemptId::new();
        let mut seq = 0;
        let mut attempt = CheckoutAttempt::default();

        let started = AttemptEvent::attempt_started(
            attempt_id,
            request.project_id.clone(),
            request.origin,
            request.email.clone(),
        );
        seq = self.append_event(attempt_id, seq, &started).await?;
        attempt.apply(started);

        // 3. Step 1: persist the sale under the next project number
        tracing::info!(step = settlement::STEP_PERSIST_SALE, "settlement step started");
        let step1_started = AttemptEvent::step_started(settlement::STEP_PERSIST_SALE);
        seq = self.append_event(attempt_id, seq, &step1_started).await?;
        attempt.apply(step1_started);

        let total: Money = request.items.iter().map(SaleItem::line_total).sum();
        let sale = match self.persist_sale(&request, total).await {
            Ok(sale) => {
                let step1_completed =
                    AttemptEvent::step_completed(settlement::STEP_PERSIST_SALE, Some(sale.number));
                seq = self.append_event(attempt_id, seq, &step1_completed).await?;
                attempt.apply(step1_completed);
                sale
            }
            Err(e) => {
                let step1_failed =
                    AttemptEvent::step_failed(settlement::STEP_PERSIST_SALE, e.to_string());
                seq = self.append_event(attempt_id, seq, &step1_failed).await?;
                attempt.apply(step1_failed);

                self.compensate(
                    &mut attempt,
                    attempt_id,
                    &mut seq,
                    &request.project_id,
                    settlement::STEP_PERSIST_SALE,
                )
                .await?;
                metrics::histogram!("checkout_duration_seconds")
                    .record(attempt_start.elapsed().as_secs_f64());
                return Err(e);
            }
        };

        // 4. Step 2: conditional decrement per line item
        tracing::info!(
            step = settlement::STEP_DECREMENT_STOCK,
            "settlement step started"
        );
        let step2_started = AttemptEvent::step_started(settlement::STEP_DECREMENT_STOCK);
        seq = self.append_event(attempt_id, seq, &step2_started).await?;
        attempt.apply(step2_started);

        for item in &request.items {
            match self
                .catalog
                .decrement_stock(&item.product_id, &request.project_id, item.quantity)
                .await
            {
                Ok(remaining) => {
                    let decremented = AttemptEvent::stock_decremented(
                        item.product_id.clone(),
                        item.quantity,
                        remaining,
                    );
                    seq = self.append_event(attempt_id, seq, &decremented).await?;
                    attempt.apply(decremented);
                }
                Err(e) => {
                    let step2_failed =
                        AttemptEvent::step_failed(settlement::STEP_DECREMENT_STOCK, e.to_string());
                    seq = self.append_event(attempt_id, seq, &step2_failed).await?;
                    attempt.apply(step2_failed);

                    self.compensate(
                        &mut attempt,
                        attempt_id,
                        &mut seq,
                        &request.project_id,
                        settlement::STEP_DECREMENT_STOCK,
                    )
                    .await?;
                    metrics::histogram!("checkout_duration_seconds")
                        .record(attempt_start.elapsed().as_secs_f64());
                    return Err(e.into());
                }
            }
        }
        let step2_completed = AttemptEvent::step_completed(settlement::STEP_DECREMENT_STOCK, None);
        seq = self.append_event(attempt_id, seq, &step2_completed).await?;
        attempt.apply(step2_completed);

        // 5. Step 3: clear the sourcing cart
        tracing::info!(step = settlement::STEP_CLEAR_CART, "settlement step started");
        let step3_started = AttemptEvent::step_started(settlement::STEP_CLEAR_CART);
        seq = self.append_event(attempt_id, seq, &step3_started).await?;
        attempt.apply(step3_started);

        if let Some(email) = request.clear_cart_for.as_deref() {
            // A missing cart is fine; the in-store channel clears
            // opportunistically.
            if let Err(e) = self.carts.delete_pending(email, &request.project_id).await {
                let step3_failed =
                    AttemptEvent::step_failed(settlement::STEP_CLEAR_CART, e.to_string());
                seq = self.append_event(attempt_id, seq, &step3_failed).await?;
                attempt.apply(step3_failed);

                self.compensate(
                    &mut attempt,
                    attempt_id,
                    &mut seq,
                    &request.project_id,
                    settlement::STEP_CLEAR_CART,
                )
                .await?;
                metrics::histogram!("checkout_duration_seconds")
                    .record(attempt_start.elapsed().as_secs_f64());
                return Err(e.into());
            }
        }
        let step3_completed = AttemptEvent::step_completed(settlement::STEP_CLEAR_CART, None);
        seq = self.append_event(attempt_id, seq, &step3_completed).await?;
        attempt.apply(step3_completed);

        // 6. Attempt completed
        let completed = AttemptEvent::attempt_completed();
        self.append_event(attempt_id, seq, &completed).await?;

        let duration = attempt_start.elapsed().as_secs_f64();
        metrics::histogram!("checkout_duration_seconds").record(duration);
        metrics::counter!("checkout_completed").increment(1);
        tracing::info!(%attempt_id, sale_number = sale.number, duration, "checkout settled");

        Ok(SettlementOutcome { attempt_id, sale })
    }

    /// Loads a settlement attempt by id, rebuilt from its journal.
    pub async fn get_attempt(&self, attempt_id: AttemptId) -> Result<Option<CheckoutAttempt>> {
        let records = self.log.records_for(attempt_id).await?;

        if records.is_empty() {
            return Ok(None);
        }

        let mut attempt = CheckoutAttempt::default();
        for record in records {
            let event: AttemptEvent = serde_json::from_value(record.payload)?;
            attempt.apply(event);
        }
        Ok(Some(attempt))
    }

    async fn persist_sale(&self, request: &SettlementRequest, total: Money) -> Result<Sale> {
        let number = self.sales.next_number(&request.project_id).await?;
        let sale = Sale {
            number,
            invoice_code: invoice_code(&request.project_id, number),
            client: request.client,
            email: request.email.clone(),
            items: request.items.clone(),
            total,
            project_id: request.project_id.clone(),
            state: request.sale_state,
            payment_type: request.payment_type.clone(),
            origin: request.origin,
            created_at: Utc::now(),
        };
        self.sales.insert(sale.clone()).await?;
        Ok(sale)
    }

    /// Undoes the attempt's applied effects in reverse order.
    ///
    /// Each restored decrement and the sale mark-failed are journaled
    /// individually; a compensation action that itself fails is logged
    /// and the chain continues with the rest.
    #[tracing::instrument(skip(self, attempt))]
    async fn compensate(
        &self,
        attempt: &mut CheckoutAttempt,
        attempt_id: AttemptId,
        seq: &mut i64,
        project_id: &ProjectId,
        failed_step: &str,
    ) -> Result<()> {
        let reason = attempt.failure_reason().unwrap_or("unknown").to_string();

        let comp_started = AttemptEvent::compensation_started(failed_step);
        *seq = self.append_event(attempt_id, *seq, &comp_started).await?;
        attempt.apply(comp_started);

        // Restore decrements newest-first
        let decremented: Vec<(String, u32)> = attempt.decremented().to_vec();
        for (product_id, quantity) in decremented.iter().rev() {
            match self
                .catalog
                .restore_stock(product_id, project_id, *quantity)
                .await
            {
                Ok(remaining) => {
                    let event =
                        AttemptEvent::stock_restored(product_id.clone(), *quantity, remaining);
                    *seq = self.append_event(attempt_id, *seq, &event).await?;
                    attempt.apply(event);
                }
                Err(e) => {
                    let event = AttemptEvent::compensation_step_failed(
                        settlement::STEP_DECREMENT_STOCK,
                        e.to_string(),
                    );
                    *seq = self.append_event(attempt_id, *seq, &event).await?;
                    attempt.apply(event);
                    tracing::warn!(%attempt_id, product_id, error = %e, "stock restore failed");
                }
            }
        }

        // Mark the written sale failed so listings and totals skip it
        if let Some(number) = attempt.sale_number() {
            match self.sales.mark_failed(project_id, number).await {
                Ok(()) => {
                    let event =
                        AttemptEvent::compensation_step_completed(settlement::STEP_PERSIST_SALE);
                    *seq = self.append_event(attempt_id, *seq, &event).await?;
                    attempt.apply(event);
                }
                Err(e) => {
                    let event = AttemptEvent::compensation_step_failed(
                        settlement::STEP_PERSIST_SALE,
                        e.to_string(),
                    );
                    *seq = self.append_event(attempt_id, *seq, &event).await?;
                    attempt.apply(event);
                    tracing::warn!(%attempt_id, number, error = %e, "sale mark-failed failed");
                }
            }
        }

        let failed = AttemptEvent::attempt_failed(reason.clone());
        *seq = self.append_event(attempt_id, *seq, &failed).await?;
        attempt.apply(failed);

        metrics::counter!("checkout_failed").increment(1);
        tracing::warn!(%attempt_id, %project_id, reason = %reason, "checkout attempt failed");

        Ok(())
    }

    /// Appends a single event to the attempt journal, returning the new
    /// tail sequence.
    async fn append_event(
        &self,
        attempt_id: AttemptId,
        seq: i64,
        event: &AttemptEvent,
    ) -> Result<i64> {
        let next = seq + 1;
        let record = AttemptRecord::new(attempt_id, next, event.event_type(), event)?;
        self.log.append(record).await?;
        Ok(next)
    }
}
