use std::str::FromStr;

use tracing::warn;

use stockscan_catalog::CheckConfig;
use stockscan_export::ExportConfig;
use stockscan_infra::AuditConfig;
use stockscan_scanner::DecoderConfig;

pub const DEBOUNCE_MS_ENV: &str = "STOCKSCAN_DEBOUNCE_MS";
pub const AUDIT_CAPACITY_ENV: &str = "STOCKSCAN_AUDIT_CAPACITY";
pub const LOW_STOCK_THRESHOLD_ENV: &str = "STOCKSCAN_LOW_STOCK_THRESHOLD";

/// Settings for every engine the terminal owns.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConfig {
    pub decoder: DecoderConfig,
    pub audit: AuditConfig,
    pub check: CheckConfig,
    pub export: ExportConfig,
}

impl TerminalConfig {
    /// Defaults overridden by `STOCKSCAN_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns. Unparsable values are
    /// logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(ms) = parse_setting::<i64, _>(&lookup, DEBOUNCE_MS_ENV).filter(|ms| *ms > 0) {
            config.decoder = config.decoder.with_debounce_ms(ms);
        }
        if let Some(capacity) =
            parse_setting::<usize, _>(&lookup, AUDIT_CAPACITY_ENV).filter(|c| *c > 0)
        {
            config.audit = config.audit.with_capacity(capacity);
        }
        if let Some(threshold) = parse_setting::<u32, _>(&lookup, LOW_STOCK_THRESHOLD_ENV) {
            config.check = config.check.with_low_stock_threshold(threshold);
        }
        config
    }

    pub fn with_decoder(mut self, decoder: DecoderConfig) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_audit(mut self, audit: AuditConfig) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_check(mut self, check: CheckConfig) -> Self {
        self.check = check;
        self
    }

    pub fn with_export(mut self, export: ExportConfig) -> Self {
        self.export = export;
        self
    }
}

fn parse_setting<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(setting = name, value = %raw, "ignoring unparsable setting");
            None
        }
    }
}
