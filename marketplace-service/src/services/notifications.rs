use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::email::{EmailMessage, EmailProvider};
use crate::models::{Booking, BookingStatus, Package, User};

/// Booking emails. Delivery is best effort: failures are logged and counted,
/// never returned.
#[derive(Clone)]
pub struct BookingNotifier {
    provider: Arc<dyn EmailProvider>,
}

impl BookingNotifier {
    pub fn new(provider: Arc<dyn EmailProvider>) -> Self {
        Self { provider }
    }

    pub async fn booking_created(
        &self,
        booking: &Booking,
        package: &Package,
        tourist: &User,
        seller: &User,
    ) {
        self.deliver(confirmation_email(booking, package, tourist), "booking_confirmation")
            .await;
        self.deliver(seller_alert_email(booking, package, tourist, seller), "seller_alert")
            .await;
    }

    pub async fn booking_decided(&self, booking: &Booking, package_title: &str, tourist: &User) {
        if let Some(email) = decision_email(booking.status, package_title, tourist) {
            self.deliver(email, "booking_decision").await;
        }
    }

    async fn deliver(&self, email: EmailMessage, kind: &'static str) {
        if email.to.is_empty() {
            return;
        }

        match self.provider.send(&email).await {
            Ok(()) => {
                metrics::counter!("emails_sent_total", "kind" => kind, "outcome" => "sent")
                    .increment(1);
            }
            Err(e) => {
                tracing::warn!(error = %e, to = %email.to, kind, "Booking email not delivered");
                metrics::counter!("emails_sent_total", "kind" => kind, "outcome" => "failed")
                    .increment(1);
            }
        }
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn travel_day(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn confirmation_email(booking: &Booking, package: &Package, tourist: &User) -> EmailMessage {
    EmailMessage {
        to: tourist.email.clone(),
        subject: "Booking Confirmation".to_string(),
        body_html: format!(
            "<h2>Hi {name},</h2>\
             <p>Your booking for <b>{title}</b> has been received!</p>\
             <p>Travel Date: {date}</p>\
             <p>Guests: {guests}</p>\
             <p>Total Price: ₹{total}</p>\
             <p>Status: Pending seller approval</p>",
            name = escape(&tourist.name),
            title = escape(&package.title),
            date = travel_day(&booking.travel_date),
            guests = booking.guests,
            total = booking.total_price,
        ),
    }
}

fn seller_alert_email(
    booking: &Booking,
    package: &Package,
    tourist: &User,
    seller: &User,
) -> EmailMessage {
    let greeting = seller
        .agency_name
        .as_deref()
        .filter(|a| !a.is_empty())
        .unwrap_or(&seller.name);

    EmailMessage {
        to: seller.email.clone(),
        subject: "New Booking Request".to_string(),
        body_html: format!(
            "<h2>Hi {greeting},</h2>\
             <p>You have a new booking request for <b>{title}</b>.</p>\
             <p>Tourist: {name} ({email}, {phone})</p>\
             <p>Guests: {guests}</p>\
             <p>Travel Date: {date}</p>\
             <p>Please login to approve or reject the booking.</p>",
            greeting = escape(greeting),
            title = escape(&package.title),
            name = escape(&tourist.name),
            email = escape(&tourist.email),
            phone = escape(&tourist.phone),
            guests = booking.guests,
            date = travel_day(&booking.travel_date),
        ),
    }
}

fn decision_email(status: BookingStatus, package_title: &str, tourist: &User) -> Option<EmailMessage> {
    let (subject, body) = match status {
        BookingStatus::Approved => (
            "Booking Approved",
            format!(
                "<h2>Hi {},</h2><p>Your booking for <b>{}</b> has been \
                 <span style=\"color:green\">Approved</span>.</p>\
                 <p>We look forward to hosting you!</p>",
                escape(&tourist.name),
                escape(package_title),
            ),
        ),
        BookingStatus::Rejected => (
            "Booking Rejected",
            format!(
                "<h2>Hi {},</h2><p>Sorry, your booking for <b>{}</b> has been \
                 <span style=\"color:red\">Rejected</span>.</p>\
                 <p>Please try another package or date.</p>",
                escape(&tourist.name),
                escape(package_title),
            ),
        ),
        _ => return None,
    };

    Some(EmailMessage {
        to: tourist.email.clone(),
        subject: subject.to_string(),
        body_html: body,
    })
}
