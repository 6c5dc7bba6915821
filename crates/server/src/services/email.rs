//! Order confirmation email delivery.
//!
//! When SMTP is not configured the mailer degrades to logging the
//! confirmation, so local development works without a relay.

use askama::Template;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::{Config, EmailConfig};
use crate::models::Order;

const SUBJECT: &str = "Order Confirmation - T-Shirt Store";

/// Errors that can occur when sending emails.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Failed to build email message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Template rendering failed: {0}")]
    Template(#[from] askama::Error),

    #[cfg(test)]
    #[error("Simulated send failure")]
    Simulated,
}

struct LineView {
    name: String,
    quantity: i64,
    total: String,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    customer_name: &'a str,
    lines: &'a [LineView],
    total: String,
    phone: &'a str,
    address: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    customer_name: &'a str,
    lines: &'a [LineView],
    total: String,
    phone: &'a str,
    address: &'a str,
}

fn render_bodies(order: &Order) -> Result<(String, String), EmailError> {
    let lines: Vec<LineView> = order
        .items
        .iter()
        .map(|item| LineView {
            name: item.product_name.clone(),
            quantity: item.quantity,
            total: format!("{:.2}", item.price.line_total(item.quantity)),
        })
        .collect();
    let total = order.total_amount.to_string();

    let html = OrderConfirmationHtml {
        customer_name: &order.customer_name,
        lines: &lines,
        total: total.clone(),
        phone: &order.customer_phone,
        address: &order.customer_address,
    }
    .render()?;

    let text = OrderConfirmationText {
        customer_name: &order.customer_name,
        lines: &lines,
        total,
        phone: &order.customer_phone,
        address: &order.customer_address,
    }
    .render()?;

    Ok((html, text))
}

/// SMTP-backed mailer.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build an SMTP mailer from config.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Smtp` if the relay host is invalid, or
    /// `EmailError::InvalidAddress` if the from address fails to parse.
    pub fn new(config: &EmailConfig, from_address: &str) -> Result<Self, EmailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.expose_secret().to_string(),
            ))
            .build();

        let from = from_address
            .parse::<Mailbox>()
            .map_err(|_| EmailError::InvalidAddress(from_address.to_string()))?;

        Ok(Self { transport, from })
    }

    async fn send(&self, order: &Order) -> Result<(), EmailError> {
        let to = order
            .customer_email
            .parse::<Mailbox>()
            .map_err(|_| EmailError::InvalidAddress(order.customer_email.clone()))?;

        let (html, text) = render_bodies(order)?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(SUBJECT)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )?;

        self.transport.send(message).await?;
        Ok(())
    }
}

/// Order confirmation sender.
pub enum Mailer {
    /// Deliver over SMTP.
    Smtp(SmtpMailer),
    /// Render and log instead of sending.
    Log,
    /// Always fail, for exercising the retry path.
    #[cfg(test)]
    Failing,
}

impl Mailer {
    /// Pick the mailer the config calls for.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if SMTP is configured but the transport
    /// cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, EmailError> {
        match &config.email {
            Some(email) => Ok(Self::Smtp(SmtpMailer::new(
                email,
                &config.email_from_address,
            )?)),
            None => {
                tracing::info!("SMTP not configured, order confirmations will be logged");
                Ok(Self::Log)
            }
        }
    }

    /// Send the confirmation email for an order.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if rendering or delivery fails.
    pub async fn send_order_confirmation(&self, order: &Order) -> Result<(), EmailError> {
        match self {
            Self::Smtp(mailer) => {
                mailer.send(order).await?;
                tracing::info!(
                    order_id = %order.id,
                    email = %order.customer_email,
                    "order confirmation sent"
                );
                Ok(())
            }
            Self::Log => {
                // Render anyway so template breakage surfaces in development
                let (_html, text) = render_bodies(order)?;
                tracing::info!(
                    order_id = %order.id,
                    email = %order.customer_email,
                    body = %text,
                    "order confirmation (log mailer)"
                );
                Ok(())
            }
            #[cfg(test)]
            Self::Failing => Err(EmailError::Simulated),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::OrderItem;
    use chrono::Utc;
    use threadbare_core::{OrderId, OrderStatus, Price, ProductId};

    fn sample_order() -> Order {
        Order {
            id: OrderId::new(),
            owner: None,
            customer_name: "Ada Lovelace".to_string(),
            customer_email: "ada@example.com".to_string(),
            customer_phone: "+1-555-0100".to_string(),
            customer_address: "1 Analytical Way".to_string(),
            items: vec![
                OrderItem {
                    product_id: ProductId::new(),
                    product_name: "Classic White Tee".to_string(),
                    price: Price::parse("15.00").unwrap(),
                    quantity: 2,
                },
                OrderItem {
                    product_id: ProductId::new(),
                    product_name: "Graphic Print Tee".to_string(),
                    price: Price::parse("22.50").unwrap(),
                    quantity: 1,
                },
            ],
            total_amount: Price::parse("52.50").unwrap(),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_render_bodies() {
        let (html, text) = render_bodies(&sample_order()).unwrap();

        for body in [&html, &text] {
            assert!(body.contains("Order Confirmation"));
            assert!(body.contains("Thank you for your order, Ada Lovelace!"));
            assert!(body.contains("Classic White Tee x2 - 30.00"));
            assert!(body.contains("Graphic Print Tee x1 - 22.50"));
            assert!(body.contains("Total: 52.50"));
            assert!(body.contains("Phone: +1-555-0100"));
            assert!(body.contains("Delivery Address: 1 Analytical Way"));
            assert!(body.contains(
                "Your order will be delivered within 3-5 business days. \
                 Payment will be collected upon delivery."
            ));
            assert!(body.contains("Thank you for shopping with us!"));
        }
    }

    #[test]
    fn test_html_body_escapes_markup() {
        let mut order = sample_order();
        order.customer_name = "<script>alert(1)</script>".to_string();

        let (html, _text) = render_bodies(&order).unwrap();
        assert!(!html.contains("<script>"));
    }

    #[tokio::test]
    async fn test_log_mailer_succeeds() {
        let mailer = Mailer::Log;
        mailer.send_order_confirmation(&sample_order()).await.unwrap();
    }

    #[tokio::test]
    async fn test_failing_mailer_errors() {
        let mailer = Mailer::Failing;
        let result = mailer.send_order_confirmation(&sample_order()).await;
        assert!(matches!(result, Err(EmailError::Simulated)));
    }
}
