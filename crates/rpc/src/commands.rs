//! CLI commands

use chrono::{DateTime, Utc};
use pourguard_compliance::{
    calculate_excise_tax, AuditSink, ComplianceReport, Evaluation, ExciseBreakdown,
    VerificationRecord,
};
use pourguard_core::{parse_date_of_birth, AgeVerdict, Coordinate, Milliliters};
use pourguard_ledger::LedgerKey;
use pourguard_zones::{DeliveryWindow, LocationVerdict};
use rust_decimal::Decimal;

use crate::context::AppContext;

/// List the loaded zones
pub async fn zones(ctx: &AppContext) -> Result<(), anyhow::Error> {
    let registry = ctx.engine.zones();

    println!("📍 Zones from {}", ctx.zones_path().display());
    println!("Exclusion zones ({}):", registry.list_exclusion_zones().len());
    for zone in registry.list_exclusion_zones() {
        println!(
            "  {:<14} {:<18} {:>6.0}m  {}  {}",
            zone.id,
            zone.category.to_string(),
            zone.radius_meters,
            zone.center,
            zone.name
        );
    }

    println!("Delivery zones ({}):", registry.delivery_zones().len());
    for zone in registry.delivery_zones() {
        let restrictions: Vec<&str> = zone.restrictions.iter().map(String::as_str).collect();
        println!(
            "  {:<16} {:<18} {} points  {}  [{}]",
            zone.id,
            zone.name,
            zone.boundary.len(),
            if zone.active { "active" } else { "inactive" },
            restrictions.join(", ")
        );
    }
    Ok(())
}

/// Evaluate a single point
pub async fn check_location(
    ctx: &AppContext,
    latitude: f64,
    longitude: f64,
    now: DateTime<Utc>,
) -> Result<(LocationVerdict, Option<DeliveryWindow>), anyhow::Error> {
    let point = Coordinate::new(latitude, longitude)?;
    let verdict = ctx.engine.evaluate_location(&point)?;

    let window = match &verdict.delivery_zone {
        Some(zone) => Some(ctx.engine.check_delivery_window(zone, now)?),
        None => None,
    };

    let icon = if verdict.eligible { "✅" } else { "❌" };
    println!("{} {} at {}", icon, verdict.summary(), point);
    if let Some(zone) = &verdict.delivery_zone {
        println!("   Delivery zone: {} ({})", zone.name, zone.id);
    }
    for zone in &verdict.restricted_zone_violations {
        println!(
            "   Inside {} exclusion: {} ({:.0}m from centre)",
            zone.category,
            zone.name,
            zone.distance_to(&point)
        );
    }
    if let Some(nearest) = &verdict.nearest_exclusion {
        println!(
            "   Nearest exclusion: {} ({:.0}m away)",
            nearest.zone_name, nearest.distance_meters
        );
    }
    if let Some(window) = &window {
        println!(
            "   Delivery hours {}-{}, open now: {}",
            window.opens_at.format("%H:%M"),
            window.closes_at.format("%H:%M"),
            window.can_deliver_now
        );
    }

    Ok((verdict, window))
}

/// Age on `as_of` (operating day of `now` when absent)
pub async fn check_age(
    ctx: &AppContext,
    date_of_birth: &str,
    as_of: Option<&str>,
    now: DateTime<Utc>,
) -> Result<AgeVerdict, anyhow::Error> {
    let dob = parse_date_of_birth(date_of_birth)?;
    let as_of = match as_of {
        Some(day) => parse_date_of_birth(day)?,
        None => ctx.engine.config().operating_day(now)?,
    };

    let verdict = ctx.engine.evaluate_age(dob, as_of)?;
    let minimum = ctx.engine.config().minimum_age;

    if verdict.eligible {
        println!("✅ Age {} on {} (minimum {})", verdict.age, as_of, minimum);
    } else {
        println!("❌ Age {} on {} is under the minimum of {}", verdict.age, as_of, minimum);
    }
    Ok(verdict)
}

/// Evaluate an order for an identity given as JSON and record its events
pub async fn evaluate(
    ctx: &AppContext,
    identity_json: &str,
    latitude: f64,
    longitude: f64,
    volume_ml: u64,
    consumed_today_ml: u64,
    now: DateTime<Utc>,
) -> Result<Evaluation, anyhow::Error> {
    let identity: VerificationRecord = serde_json::from_str(identity_json)?;
    let point = Coordinate::new(latitude, longitude)?;

    if consumed_today_ml > 0 {
        let day = ctx.engine.config().operating_day(now)?;
        ctx.volumes
            .seed(
                LedgerKey::new(&identity.identity_id, day),
                Milliliters::new(consumed_today_ml),
            )
            .await;
    }

    let evaluation = ctx
        .engine
        .evaluate_order_eligibility(&identity, &point, Milliliters::new(volume_ml), now)
        .await?;
    ctx.audit.append_all(&evaluation.events).await?;

    if evaluation.allowed() {
        println!(
            "✅ Order allowed for {} ({} of {} today)",
            identity.identity_id, evaluation.volume.total_after, evaluation.volume.limit
        );
    } else {
        println!(
            "❌ Order denied for {}: {}",
            identity.identity_id,
            evaluation.verdict.reason_codes().join(", ")
        );
    }
    println!("   {} events written to {}", evaluation.events.len(), ctx.audit_path().display());

    Ok(evaluation)
}

/// Report over the audit ledger
pub async fn report(
    ctx: &AppContext,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<ComplianceReport, anyhow::Error> {
    let end = to.unwrap_or(now);
    let start = from.unwrap_or(end - chrono::Duration::days(30));
    if start > end {
        anyhow::bail!("Report period starts after it ends ({} > {})", start, end);
    }

    let events = ctx.audit.read_all().await?;
    let report = ComplianceReport::generate(&events, start, end);

    println!("📊 Compliance report {} to {}", start.to_rfc3339(), end.to_rfc3339());
    println!("   Events: {}", report.total_events);
    println!("   Success rate: {}%", report.success_rate);
    for (event_type, count) in &report.events_by_type {
        println!("   {:<16} {}", event_type.to_string(), count);
    }
    println!("   Failed: {}", report.failed_events.len());
    for recommendation in &report.recommendations {
        println!("   💡 {}", recommendation);
    }

    Ok(report)
}

/// Excise and GST for a product
pub async fn excise(product: &str, price: Decimal) -> Result<ExciseBreakdown, anyhow::Error> {
    let tax = calculate_excise_tax(product, price)?;
    println!(
        "🧾 {} at {}: excise {} ({}%), GST {}, total tax {}",
        product,
        price,
        tax.excise_tax,
        tax.excise_rate * Decimal::ONE_HUNDRED,
        tax.gst,
        tax.total_tax
    );
    Ok(tax)
}
