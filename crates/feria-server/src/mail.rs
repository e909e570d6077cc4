//! Confirmation email delivery.
//!
//! [`SmtpNotifier`] relays through the configured SMTP server. When no relay
//! is configured the server falls back to [`LogNotifier`], which records that
//! a notice was due and reports it as undelivered.

use feria_core::notify::{ConfirmationNotice, Notifier, NotifyError};
use lettre::{
  Message, SmtpTransport, Transport,
  message::{Mailbox, header::ContentType},
  transport::smtp::authentication::Credentials,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::Result;

const SUBJECT: &str = "Confirmación de Reserva - Feria";

// ─── Configuration ───────────────────────────────────────────────────────────

/// The optional `[smtp]` table of the server configuration.
#[derive(Deserialize, Clone)]
pub struct SmtpConfig {
  pub host:       String,
  #[serde(default = "default_smtp_port")]
  pub port:       u16,
  pub username:   String,
  pub password:   String,
  pub from_email: String,
  #[serde(default = "default_from_name")]
  pub from_name:  String,
}

fn default_smtp_port() -> u16 { 587 }

fn default_from_name() -> String { "Feria".to_owned() }

// ─── SMTP ────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct SmtpNotifier {
  transport: SmtpTransport,
  from:      Mailbox,
}

impl SmtpNotifier {
  /// Port 465 uses implicit TLS; any other port upgrades with STARTTLS.
  pub fn new(config: &SmtpConfig) -> Result<Self> {
    let builder = if config.port == 465 {
      SmtpTransport::relay(&config.host)?
    } else {
      SmtpTransport::starttls_relay(&config.host)?
    };
    let transport = builder
      .port(config.port)
      .credentials(Credentials::new(config.username.clone(), config.password.clone()))
      .build();
    let from = Mailbox::new(Some(config.from_name.clone()), config.from_email.parse()?);
    Ok(Self { transport, from })
  }

  fn message(&self, notice: &ConfirmationNotice) -> Result<Message, NotifyError> {
    let to: Mailbox = notice
      .email
      .parse()
      .map_err(|e| NotifyError::Address(format!("{e}")))?;
    Message::builder()
      .from(self.from.clone())
      .to(to)
      .subject(SUBJECT)
      .header(ContentType::TEXT_HTML)
      .body(render_html(notice))
      .map_err(|e| NotifyError::Message(e.to_string()))
  }
}

impl Notifier for SmtpNotifier {
  async fn send_confirmation<'a>(
    &'a self,
    notice: &'a ConfirmationNotice,
  ) -> Result<(), NotifyError> {
    let message = self.message(notice)?;
    let transport = self.transport.clone();

    tokio::task::spawn_blocking(move || transport.send(&message))
      .await
      .map_err(|e| NotifyError::Delivery(format!("mail task failed: {e}")))?
      .map_err(|e| NotifyError::Delivery(e.to_string()))?;

    info!(reservation_id = %notice.reservation_id, "confirmation email sent");
    Ok(())
  }
}

// ─── Log only ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
  async fn send_confirmation<'a>(
    &'a self,
    notice: &'a ConfirmationNotice,
  ) -> Result<(), NotifyError> {
    warn!(
      reservation_id = %notice.reservation_id,
      email = %notice.email,
      "smtp not configured; confirmation email not sent"
    );
    Err(NotifyError::Delivery("no smtp relay configured".into()))
  }
}

// ─── Selection ───────────────────────────────────────────────────────────────

/// The notifier chosen at startup.
#[derive(Clone)]
pub enum Mailer {
  Smtp(SmtpNotifier),
  Log(LogNotifier),
}

impl Mailer {
  pub fn from_config(smtp: Option<&SmtpConfig>) -> Result<Self> {
    match smtp {
      Some(config) => {
        info!(host = %config.host, port = config.port, "using smtp relay");
        Ok(Self::Smtp(SmtpNotifier::new(config)?))
      }
      None => {
        warn!("no [smtp] section configured; confirmation emails will only be logged");
        Ok(Self::Log(LogNotifier))
      }
    }
  }
}

impl Notifier for Mailer {
  async fn send_confirmation<'a>(
    &'a self,
    notice: &'a ConfirmationNotice,
  ) -> Result<(), NotifyError> {
    match self {
      Self::Smtp(smtp) => smtp.send_confirmation(notice).await,
      Self::Log(log) => log.send_confirmation(notice).await,
    }
  }
}

// ─── Body ────────────────────────────────────────────────────────────────────

fn escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(c),
    }
  }
  out
}

/// The HTML body of a confirmation email. Every user-supplied field is
/// escaped.
pub fn render_html(notice: &ConfirmationNotice) -> String {
  let coordinator = escape(&notice.coordinator_name);
  let school = escape(&notice.school_name);
  let day = escape(&notice.day_label);
  let slot = escape(&notice.slot_label);
  let students = notice.student_count;
  let reservation_id = notice.reservation_id;
  let link = escape(&notice.confirm_link);

  format!(
    r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <title>{SUBJECT}</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2 style="color: #1f4b9e;">Confirma tu reserva</h2>
    <p>Hola <strong>{coordinator}</strong>,</p>
    <p>Hemos registrado la siguiente reserva:</p>
    <div style="background-color: #f8f9fa; padding: 15px; border-left: 4px solid #1f4b9e;">
      <p><strong>Institución:</strong> {school}</p>
      <p><strong>Día:</strong> {day}</p>
      <p><strong>Horario:</strong> {slot}</p>
      <p><strong>Estudiantes:</strong> {students}</p>
      <p><strong>Código de reserva:</strong> {reservation_id}</p>
    </div>
    <p style="margin: 30px 0;">
      <a href="{link}"
         style="display: inline-block; background-color: #1f4b9e; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px;">
        Confirmar reserva
      </a>
    </p>
    <p style="color: #666; font-size: 12px;">
      Si no solicitaste esta reserva, ignora este mensaje.
    </p>
  </div>
</body>
</html>
"#
  )
}
