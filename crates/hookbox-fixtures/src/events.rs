//! Stripe-shaped event builders.
//!
//! Each event kind maps to a payload builder through a lookup table;
//! adding a kind means adding a row, not extending a conditional chain.
//! Unknown kinds fall back to a generic object so the generator never
//! fails on an unrecognized name.

use std::collections::HashMap;

use bytes::Bytes;
use chrono::Utc;
use hookbox_core::NewRecord;
use rand::{
    distributions::{Alphanumeric, DistString},
    rngs::SmallRng,
    seq::SliceRandom,
    Rng,
};
use serde_json::{json, Value};
use uuid::Uuid;

/// Event kinds the generator knows how to synthesize.
pub const EVENT_KINDS: &[&str] = &[
    "payment_intent.succeeded",
    "payment_intent.payment_failed",
    "payment_intent.created",
    "payment_intent.canceled",
    "charge.succeeded",
    "charge.refunded",
    "charge.failed",
    "invoice.payment_succeeded",
    "invoice.payment_failed",
    "invoice.created",
    "invoice.finalized",
    "invoice.voided",
    "customer.subscription.created",
    "customer.subscription.updated",
    "customer.subscription.deleted",
    "customer.subscription.trial_will_end",
    "customer.created",
    "customer.updated",
    "customer.deleted",
    "checkout.session.completed",
    "checkout.session.async_payment_succeeded",
    "checkout.session.async_payment_failed",
    "coupon.created",
    "coupon.deleted",
    "plan.created",
    "plan.updated",
    "product.created",
    "product.updated",
    "refund.created",
    "transfer.created",
];

const CURRENCIES: &[&str] = &["usd", "eur", "brl", "gbp"];

const FIRST_NAMES: &[&str] = &["Ana", "Bruno", "Carla", "Diego", "Elena", "Felipe", "Grace", "Hugo"];
const LAST_NAMES: &[&str] = &["Almeida", "Barbosa", "Costa", "Dias", "Evans", "Fischer", "Garcia"];

/// Shared envelope fields every Stripe event carries.
struct Envelope {
    id: String,
    created: i64,
    livemode: bool,
    pending_webhooks: u64,
    request_id: String,
    idempotency_key: String,
}

impl Envelope {
    fn generate(rng: &mut SmallRng) -> Self {
        Self {
            id: format!("evt_{}", token(rng, 24)),
            created: Utc::now().timestamp() - rng.gen_range(0..30 * 24 * 3600),
            livemode: rng.gen_bool(0.5),
            pending_webhooks: rng.gen_range(0..=5),
            request_id: format!("req_{}", token(rng, 24)),
            idempotency_key: Uuid::new_v4().to_string(),
        }
    }
}

type PayloadFn = fn(&str, &Envelope, &mut SmallRng) -> Value;

/// Kind-to-builder table. Kinds without a specialized payload share the
/// generic builder.
static BUILDERS: &[(&str, PayloadFn)] = &[
    ("payment_intent.succeeded", payment_intent_object),
    ("payment_intent.payment_failed", payment_intent_object),
    ("payment_intent.created", payment_intent_object),
    ("payment_intent.canceled", payment_intent_object),
    ("charge.succeeded", charge_object),
    ("charge.refunded", charge_object),
    ("charge.failed", charge_object),
    ("invoice.payment_succeeded", invoice_object),
    ("invoice.payment_failed", invoice_object),
    ("invoice.created", invoice_object),
    ("invoice.finalized", invoice_object),
    ("invoice.voided", invoice_object),
    ("customer.subscription.created", subscription_object),
    ("customer.subscription.updated", subscription_object),
    ("customer.subscription.deleted", subscription_object),
    ("customer.subscription.trial_will_end", subscription_object),
    ("customer.created", customer_object),
    ("customer.updated", customer_object),
    ("customer.deleted", customer_object),
    ("checkout.session.completed", checkout_session_object),
    ("checkout.session.async_payment_succeeded", checkout_session_object),
    ("checkout.session.async_payment_failed", checkout_session_object),
    ("refund.created", refund_object),
];

fn builder_for(kind: &str) -> PayloadFn {
    BUILDERS
        .iter()
        .find(|(name, _)| *name == kind)
        .map(|(_, builder)| *builder)
        .unwrap_or(generic_object)
}

/// Synthesizes one provider-shaped delivery of the given event kind.
///
/// The result goes straight into `RecordStore::insert`; it mirrors what
/// the capture endpoint would have produced for a real Stripe delivery,
/// with `status_code` fixed at the accepted value.
pub fn synthesize(kind: &str, rng: &mut SmallRng) -> NewRecord {
    let envelope = Envelope::generate(rng);
    let data = builder_for(kind)(kind, &envelope, rng);

    let event = json!({
        "id": envelope.id,
        "object": "event",
        "api_version": "2024-12-18.acacia",
        "created": envelope.created,
        "livemode": envelope.livemode,
        "pending_webhooks": envelope.pending_webhooks,
        "request": {
            "id": envelope.request_id,
            "idempotency_key": envelope.idempotency_key,
        },
        "type": kind,
        "data": { "object": data },
    });

    let source_ip = random_ip(rng);
    NewRecord {
        method: "POST".to_string(),
        pathname: "/webhooks/stripe".to_string(),
        source_ip: source_ip.clone(),
        status_code: 200,
        content_type: Some("application/json".to_string()),
        query_params: rng
            .gen_bool(0.5)
            .then(|| HashMap::from([("test".to_string(), "true".to_string())])),
        headers: stripe_headers(rng, &source_ip),
        body: Bytes::from(event.to_string()),
    }
}

/// Headers a Stripe delivery typically carries.
pub fn stripe_headers(rng: &mut SmallRng, forwarded_for: &str) -> HashMap<String, String> {
    HashMap::from([
        ("content-type".to_string(), "application/json".to_string()),
        (
            "stripe-signature".to_string(),
            format!("t={},v1={},v0={}", Utc::now().timestamp(), token(rng, 64), token(rng, 64)),
        ),
        (
            "user-agent".to_string(),
            "Stripe/1.0 (+https://stripe.com/docs/webhooks)".to_string(),
        ),
        ("x-forwarded-for".to_string(), forwarded_for.to_string()),
        ("host".to_string(), "api.example.com".to_string()),
        ("connection".to_string(), "keep-alive".to_string()),
    ])
}

fn payment_intent_object(kind: &str, envelope: &Envelope, rng: &mut SmallRng) -> Value {
    let status = if kind.contains("succeeded") {
        "succeeded"
    } else if kind.contains("failed") {
        "failed"
    } else {
        "canceled"
    };
    json!({
        "id": format!("pi_{}", token(rng, 24)),
        "object": "payment_intent",
        "amount": rng.gen_range(1000..=100_000),
        "currency": currency(rng),
        "customer": format!("cus_{}", token(rng, 24)),
        "status": status,
        "payment_method": format!("pm_{}", token(rng, 24)),
        "created": envelope.created,
    })
}

fn charge_object(kind: &str, envelope: &Envelope, rng: &mut SmallRng) -> Value {
    let status = if kind.contains("succeeded") {
        "succeeded"
    } else if kind.contains("refunded") {
        "refunded"
    } else {
        "failed"
    };
    json!({
        "id": format!("ch_{}", token(rng, 24)),
        "object": "charge",
        "amount": rng.gen_range(1000..=100_000),
        "currency": currency(rng),
        "customer": format!("cus_{}", token(rng, 24)),
        "status": status,
        "payment_intent": format!("pi_{}", token(rng, 24)),
        "created": envelope.created,
    })
}

fn invoice_object(kind: &str, envelope: &Envelope, rng: &mut SmallRng) -> Value {
    let paid = kind.contains("payment_succeeded");
    let status = if paid {
        "paid"
    } else if kind.contains("payment_failed") {
        "open"
    } else {
        "draft"
    };
    json!({
        "id": format!("in_{}", token(rng, 24)),
        "object": "invoice",
        "amount_due": rng.gen_range(1000..=100_000),
        "amount_paid": if paid { rng.gen_range(1000..=100_000) } else { 0 },
        "currency": currency(rng),
        "customer": format!("cus_{}", token(rng, 24)),
        "status": status,
        "subscription": format!("sub_{}", token(rng, 24)),
        "created": envelope.created,
    })
}

fn subscription_object(_kind: &str, envelope: &Envelope, rng: &mut SmallRng) -> Value {
    let status = ["active", "canceled", "past_due", "trialing"]
        .choose(rng)
        .copied()
        .unwrap_or("active");
    json!({
        "id": format!("sub_{}", token(rng, 24)),
        "object": "subscription",
        "customer": format!("cus_{}", token(rng, 24)),
        "status": status,
        "current_period_start": envelope.created,
        "current_period_end": envelope.created + 2_592_000,
        "plan": {
            "id": format!("plan_{}", token(rng, 24)),
            "amount": rng.gen_range(1000..=50_000),
            "currency": "usd",
        },
        "created": envelope.created,
    })
}

fn customer_object(_kind: &str, envelope: &Envelope, rng: &mut SmallRng) -> Value {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Ana");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Costa");
    json!({
        "id": format!("cus_{}", token(rng, 24)),
        "object": "customer",
        "email": format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
        "name": format!("{first} {last}"),
        "created": envelope.created,
    })
}

fn checkout_session_object(kind: &str, envelope: &Envelope, rng: &mut SmallRng) -> Value {
    json!({
        "id": format!("cs_{}", token(rng, 24)),
        "object": "checkout.session",
        "customer": format!("cus_{}", token(rng, 24)),
        "payment_status": if kind.contains("succeeded") { "paid" } else { "unpaid" },
        "amount_total": rng.gen_range(1000..=100_000),
        "currency": currency(rng),
        "created": envelope.created,
    })
}

fn refund_object(_kind: &str, envelope: &Envelope, rng: &mut SmallRng) -> Value {
    json!({
        "id": format!("re_{}", token(rng, 24)),
        "object": "refund",
        "amount": rng.gen_range(1000..=50_000),
        "currency": currency(rng),
        "charge": format!("ch_{}", token(rng, 24)),
        "status": "succeeded",
        "created": envelope.created,
    })
}

fn generic_object(_kind: &str, envelope: &Envelope, rng: &mut SmallRng) -> Value {
    json!({
        "id": token(rng, 24),
        "object": "generic",
        "created": envelope.created,
    })
}

fn token(rng: &mut SmallRng, len: usize) -> String {
    Alphanumeric.sample_string(rng, len)
}

fn currency(rng: &mut SmallRng) -> &'static str {
    CURRENCIES.choose(rng).copied().unwrap_or("usd")
}

fn random_ip(rng: &mut SmallRng) -> String {
    format!(
        "{}.{}.{}.{}",
        rng.gen_range(1..=223u8),
        rng.gen_range(0..=255u8),
        rng.gen_range(0..=255u8),
        rng.gen_range(1..=254u8)
    )
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn every_kind_has_a_builder_or_the_fallback() {
        let mut rng = SmallRng::seed_from_u64(7);
        for kind in EVENT_KINDS {
            let envelope = Envelope::generate(&mut rng);
            let data = builder_for(kind)(kind, &envelope, &mut rng);
            assert!(data.get("id").is_some(), "kind {kind} produced no id");
            assert!(data.get("object").is_some(), "kind {kind} produced no object");
        }
    }

    #[test]
    fn unknown_kind_uses_the_generic_builder() {
        let mut rng = SmallRng::seed_from_u64(7);
        let envelope = Envelope::generate(&mut rng);
        let data = builder_for("mystery.kind")("mystery.kind", &envelope, &mut rng);
        assert_eq!(data["object"], "generic");
    }

    #[test]
    fn signature_header_has_timestamp_and_digests() {
        let mut rng = SmallRng::seed_from_u64(7);
        let headers = stripe_headers(&mut rng, "203.0.113.7");
        let signature = headers.get("stripe-signature").unwrap();
        assert!(signature.starts_with("t="));
        assert!(signature.contains(",v1="));
        assert!(signature.contains(",v0="));
        assert_eq!(headers.get("x-forwarded-for").map(String::as_str), Some("203.0.113.7"));
    }
}
