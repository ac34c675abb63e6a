//! Narrow interfaces for the collaborators spec.md §1 scopes out of novel
//! engineering: CSV/XLSX export population, SMS/WhatsApp messaging, and
//! Telegram polling. Each gets a trait so the core crates compile and are
//! testable without pulling in the real integration; the no-op
//! implementation just logs.

use async_trait::async_trait;

#[async_trait]
pub trait ExportSink: Send + Sync {
    async fn export_csv(&self, filename: &str, rows: usize) -> anyhow::Result<()>;
}

#[async_trait]
pub trait MessagingSink: Send + Sync {
    async fn send_access_link(&self, phone_number: &str, url: &str) -> anyhow::Result<()>;
}

pub struct LoggingExportSink;

#[async_trait]
impl ExportSink for LoggingExportSink {
    async fn export_csv(&self, filename: &str, rows: usize) -> anyhow::Result<()> {
        tracing::info!(filename, rows, "export sink: no-op, would write CSV/XLSX");
        Ok(())
    }
}

pub struct LoggingMessagingSink;

#[async_trait]
impl MessagingSink for LoggingMessagingSink {
    async fn send_access_link(&self, phone_number: &str, url: &str) -> anyhow::Result<()> {
        tracing::info!(phone_number, url, "messaging sink: no-op, would send SMS/WhatsApp/Telegram");
        Ok(())
    }
}
