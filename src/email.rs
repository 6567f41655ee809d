//! Outgoing transactional mail for the contact form.
//!
//! SMTP via lettre, bodies rendered from Askama templates in `templates/email`.

use std::sync::Arc;

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use thiserror::Error;

use crate::{config::AppConfig, models::ContactMessage};

#[derive(Template)]
#[template(path = "email/contact_notification.html")]
struct ContactNotificationHtml<'a> {
    name: &'a str,
    email: &'a str,
    phone: Option<&'a str>,
    subject: &'a str,
    message: &'a str,
    received: &'a str,
}

#[derive(Template)]
#[template(path = "email/contact_notification.txt")]
struct ContactNotificationText<'a> {
    name: &'a str,
    email: &'a str,
    phone: Option<&'a str>,
    subject: &'a str,
    message: &'a str,
    received: &'a str,
}

#[derive(Template)]
#[template(path = "email/acknowledgment.html")]
struct AcknowledgmentHtml<'a> {
    name: &'a str,
    subject: &'a str,
    message: &'a str,
    site_owner: &'a str,
}

#[derive(Template)]
#[template(path = "email/acknowledgment.txt")]
struct AcknowledgmentText<'a> {
    name: &'a str,
    subject: &'a str,
    message: &'a str,
    site_owner: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Mailer
///
/// The two mails a contact submission triggers.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Confirmation to the visitor who submitted the form.
    async fn send_acknowledgment(&self, message: &ContactMessage) -> Result<(), EmailError>;

    /// Alert to the site operator's inbox.
    async fn send_owner_alert(&self, message: &ContactMessage) -> Result<(), EmailError>;
}

pub type MailerState = Arc<dyn Mailer>;

pub fn alert_subject(message: &ContactMessage) -> String {
    format!("New Contact Form Submission: {}", message.subject)
}

pub fn acknowledgment_subject(site_owner: &str) -> String {
    format!("Thank you for contacting {site_owner}")
}

/// EmailService
///
/// SMTP mailer. When SMTP credentials are not configured every send is skipped
/// silently and reports success, so local development needs no mail server.
#[derive(Clone)]
pub struct EmailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: String,
    owner_address: String,
    site_owner: String,
}

impl EmailService {
    pub fn new(config: &AppConfig) -> Result<Self, EmailError> {
        let transport = if config.smtp_enabled() {
            let credentials =
                Credentials::new(config.smtp_user.clone(), config.smtp_password.clone());
            Some(
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                    .port(config.smtp_port)
                    .credentials(credentials)
                    .build(),
            )
        } else {
            tracing::warn!("SMTP credentials not configured, outgoing email is disabled");
            None
        };

        Ok(Self {
            transport,
            from_address: config.email_from.clone(),
            owner_address: config.email_to.clone(),
            site_owner: config.site_owner.clone(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: String,
        html_body: String,
    ) -> Result<(), EmailError> {
        let Some(transport) = &self.transport else {
            tracing::debug!(to = %to, subject = %subject, "email disabled, skipping send");
            return Ok(());
        };

        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )?;

        transport.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "email sent");
        Ok(())
    }
}

#[async_trait]
impl Mailer for EmailService {
    async fn send_acknowledgment(&self, message: &ContactMessage) -> Result<(), EmailError> {
        let html = AcknowledgmentHtml {
            name: &message.name,
            subject: &message.subject,
            message: &message.message,
            site_owner: &self.site_owner,
        }
        .render()?;
        let text = AcknowledgmentText {
            name: &message.name,
            subject: &message.subject,
            message: &message.message,
            site_owner: &self.site_owner,
        }
        .render()?;

        self.send_multipart_email(
            &message.email,
            &acknowledgment_subject(&self.site_owner),
            text,
            html,
        )
        .await
    }

    async fn send_owner_alert(&self, message: &ContactMessage) -> Result<(), EmailError> {
        let received = message
            .created_at
            .format("%b %d, %Y at %-I:%M %p UTC")
            .to_string();
        let html = ContactNotificationHtml {
            name: &message.name,
            email: &message.email,
            phone: message.phone.as_deref(),
            subject: &message.subject,
            message: &message.message,
            received: &received,
        }
        .render()?;
        let text = ContactNotificationText {
            name: &message.name,
            email: &message.email,
            phone: message.phone.as_deref(),
            subject: &message.subject,
            message: &message.message,
            received: &received,
        }
        .render()?;

        let owner = self.owner_address.clone();
        self.send_multipart_email(&owner, &alert_subject(message), text, html)
            .await
    }
}
