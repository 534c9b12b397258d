//! Subscription reconciliation engine
//!
//! This module provides the ReconciliationEngine that handles one webhook
//! delivery start to finish: resolve the gateway, pre-check the member and
//! subscription, classify the transaction, then refund, extend or pass through
//! a cancellation.
//!
//! The engine enforces these rules:
//! - A log row must already exist for the (member, subscription) pair
//! - A one-off payment consumes exactly one pending payment, and fails if none is pending
//! - The consumed pending payment is persisted before any price matching
//! - Payments that match no price are accepted without changing the subscription
//!
//! Replaying the same one-off payment is not idempotent: each delivery
//! consumes another pending entry until none are left.

use crate::config::{PaidConfig, ReceiptLevel};
use crate::core::cost_matching::{self, CostMatch, UnmatchedReason};
use crate::core::period::{self, RefundEffect};
use crate::core::resolver;
use crate::core::traits::SubscriptionStore;
use crate::gateway::{classify, GatewayAdapter, RawIds, TransactionKind};
use crate::notify::{NoticeBuilder, Notifier};
use crate::types::{
    Member, MemberId, Payload, RequestContext, SubscriptionError, SubscriptionId,
    SubscriptionLog, SubscriptionPlan, Timestamp,
};
use tracing::{debug, info, warn};

/// What a delivery did to the member's subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Refund applied to the active period
    Refunded(RefundEffect),
    /// Subscription extended; new period end
    Extended { end_time: Timestamp },
    /// Payment recorded by the gateway but matched no price
    PaymentIgnored(UnmatchedReason),
    /// Cancellation handed to the gateway adapter
    CancellationForwarded,
    /// Informational delivery, nothing recorded
    Ignored,
}

/// Summary of a handled delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub gateway: &'static str,
    pub kind: TransactionKind,
    pub subscription_id: SubscriptionId,
    pub member_id: MemberId,
    pub outcome: Outcome,
}

/// Everything the pre-check established about a delivery
#[derive(Debug, Clone)]
struct Target {
    subscription_id: SubscriptionId,
    member_id: MemberId,
    member: Member,
    plan: SubscriptionPlan,
    log: SubscriptionLog,
}

/// Webhook reconciliation engine
///
/// Owns the configured gateway adapters and the reconciler that reads and
/// writes subscription state.
pub struct ReconciliationEngine<S: SubscriptionStore> {
    gateways: Vec<Box<dyn GatewayAdapter>>,
    reconciler: Reconciler<S>,
}

impl<S: SubscriptionStore> ReconciliationEngine<S> {
    /// Create a new ReconciliationEngine
    ///
    /// # Arguments
    ///
    /// * `store` - Subscription state
    /// * `gateways` - Adapters in the order they are asked to recognise a delivery
    /// * `notifier` - Receives administrator notices
    /// * `settings` - Paid subscription settings (receipt level, recipients, formats)
    pub fn new(
        store: S,
        gateways: Vec<Box<dyn GatewayAdapter>>,
        notifier: Box<dyn Notifier>,
        settings: PaidConfig,
    ) -> Self {
        ReconciliationEngine {
            gateways,
            reconciler: Reconciler {
                store,
                notifier,
                settings,
            },
        }
    }

    /// Handle one webhook delivery
    ///
    /// Resolves the gateway, pre-checks the referenced member, plan and log
    /// row, then routes by transaction kind. The adapter's `close` hook runs
    /// once the delivery has been handled.
    ///
    /// # Returns
    ///
    /// * `Ok(Reconciliation)` - The delivery was handled (possibly as a no-op)
    /// * `Err(SubscriptionError)` - The delivery must be reported and abandoned
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No gateway recognises the delivery (checked before any storage access)
    /// - The gateway's pre-check rejects it, or yields no member ID
    /// - The member, plan or log row does not exist
    /// - A one-off payment arrives with nothing pending
    /// - Storage fails
    pub fn process(&mut self, request: &RequestContext) -> Result<Reconciliation, SubscriptionError> {
        let payload = request.payload();
        let now = request.received_at();

        let adapter = resolver::resolve_gateway(&self.gateways, payload)?;
        debug!(gateway = adapter.code(), "Gateway recognised delivery");

        let mut target = self.reconciler.precheck(adapter, payload)?;
        let kind = classify(adapter, payload);
        info!(
            gateway = adapter.code(),
            ?kind,
            subscription_id = target.subscription_id,
            member_id = target.member_id,
            "Reconciling delivery"
        );

        let outcome = match kind {
            TransactionKind::Refund => self.reconciler.process_refund(&mut target, now)?,
            TransactionKind::Payment | TransactionKind::SubscriptionRenewal => {
                let one_off = kind == TransactionKind::Payment;
                self.reconciler
                    .process_payment(adapter, &mut target, payload, one_off, now)?
            }
            TransactionKind::Cancellation => {
                self.reconciler.process_cancellation(adapter, &target, now)?
            }
            TransactionKind::Unrecognized => {
                debug!(
                    gateway = adapter.code(),
                    txn_type = payload.get("txn_type").unwrap_or_default(),
                    "Informational delivery ignored"
                );
                Outcome::Ignored
            }
        };

        adapter.close(payload);

        Ok(Reconciliation {
            gateway: adapter.code(),
            kind,
            subscription_id: target.subscription_id,
            member_id: target.member_id,
            outcome,
        })
    }

    /// Subscription state
    pub fn store(&self) -> &S {
        &self.reconciler.store
    }
}

/// Storage, notices and settings, kept apart from the adapters so an adapter
/// can be borrowed while state is updated
struct Reconciler<S: SubscriptionStore> {
    store: S,
    notifier: Box<dyn Notifier>,
    settings: PaidConfig,
}

impl<S: SubscriptionStore> Reconciler<S> {
    /// Establish who and what a delivery is about
    fn precheck(
        &self,
        adapter: &dyn GatewayAdapter,
        payload: &Payload,
    ) -> Result<Target, SubscriptionError> {
        let RawIds {
            subscription,
            member,
        } = adapter
            .precheck(payload)
            .map_err(|e| SubscriptionError::gateway(adapter.code(), e))?;

        let subscription_id = coerce_id(&subscription);
        let member_id = coerce_id(&member);
        if member_id == 0 {
            return Err(SubscriptionError::MissingMember);
        }

        let member = self
            .store
            .member(member_id)?
            .ok_or_else(|| SubscriptionError::member_not_found(member_id))?;

        let plan = self
            .store
            .plan(subscription_id)?
            .ok_or_else(|| SubscriptionError::subscription_not_found(member_id, subscription_id))?;

        let log = self
            .store
            .subscription_log(subscription_id, member_id)?
            .ok_or_else(|| {
                SubscriptionError::subscription_log_not_found(member_id, subscription_id)
            })?;

        Ok(Target {
            subscription_id,
            member_id,
            member,
            plan,
            log,
        })
    }

    /// Shorten or end the active period
    ///
    /// Neither the cost table nor the pending payments are consulted.
    fn process_refund(&mut self, target: &mut Target, now: Timestamp) -> Result<Outcome, SubscriptionError> {
        let effect = period::refund(&mut target.log, target.plan.length.seconds(), now);
        self.store.save_subscription_log(&target.log)?;
        info!(
            subscription_id = target.subscription_id,
            member_id = target.member_id,
            ?effect,
            "Refund applied"
        );

        if self.settings.receipts == ReceiptLevel::All {
            let notice = NoticeBuilder::new(&self.settings).refund(&target.plan.name, &target.member, now);
            self.notifier.send(&notice);
        }

        Ok(Outcome::Refunded(effect))
    }

    /// Record a payment and extend the subscription if the price matches
    ///
    /// # Arguments
    ///
    /// * `adapter` - Gateway that reported the payment
    /// * `target` - Pre-checked member, plan and log row
    /// * `payload` - The delivery's fields
    /// * `one_off` - `true` for a one-off payment, `false` for a recurring one
    /// * `now` - Time of receipt
    ///
    /// # Errors
    ///
    /// Returns `NoOutstandingPayment` for a one-off payment when nothing is pending.
    fn process_payment(
        &mut self,
        adapter: &dyn GatewayAdapter,
        target: &mut Target,
        payload: &Payload,
        one_off: bool,
        now: Timestamp,
    ) -> Result<Outcome, SubscriptionError> {
        let paid = adapter.cost(payload);

        // One-off payments are only captured once.
        if one_off {
            let consumed = target.log.consume_pending().ok_or_else(|| {
                SubscriptionError::no_outstanding_payment(target.member_id, target.subscription_id)
            })?;
            self.store.save_subscription_log(&target.log)?;
            debug!(
                subscription_id = target.subscription_id,
                member_id = target.member_id,
                kind = ?consumed.kind,
                remaining = target.log.pending_details.len(),
                payments_pending = target.log.payments_pending,
                "Pending payment consumed"
            );
        }

        let seconds = match cost_matching::match_payment(&target.plan, paid) {
            CostMatch::Duration(unit) => unit.seconds(),
            CostMatch::Fixed { seconds } => seconds,
            CostMatch::Unmatched(reason) => {
                warn!(
                    subscription_id = target.subscription_id,
                    member_id = target.member_id,
                    %paid,
                    ?reason,
                    "Payment matched no price, subscription unchanged"
                );
                return Ok(Outcome::PaymentIgnored(reason));
            }
        };

        period::extend(&mut target.log, seconds, now);
        self.store.save_subscription_log(&target.log)?;
        info!(
            subscription_id = target.subscription_id,
            member_id = target.member_id,
            %paid,
            end_time = target.log.end_time,
            "Subscription extended"
        );

        if self.settings.receipts == ReceiptLevel::All {
            let notice = NoticeBuilder::new(&self.settings).new_subscription(
                &target.plan.name,
                &target.member,
                paid,
                now,
            );
            self.notifier.send(&notice);
        }

        Ok(Outcome::Extended {
            end_time: target.log.end_time,
        })
    }

    /// Let the adapter do whatever its provider needs on cancellation
    fn process_cancellation(
        &mut self,
        adapter: &dyn GatewayAdapter,
        target: &Target,
        now: Timestamp,
    ) -> Result<Outcome, SubscriptionError> {
        adapter.process_cancellation(
            &mut self.store,
            target.subscription_id,
            target.member_id,
            &target.log,
            now,
        )?;
        Ok(Outcome::CancellationForwarded)
    }
}

/// Integer coercion of a provider-supplied ID
///
/// Leading whitespace is skipped and leading digits are read; anything else,
/// including overflow, reads as 0.
fn coerce_id(raw: &str) -> u32 {
    let trimmed = raw.trim_start();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits: &str = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .map_or(trimmed, |end| &trimmed[..end]);
    digits.parse().unwrap_or(0)
}
