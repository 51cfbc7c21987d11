//! One-line status summary produced after every event.
use serde::Serialize;
use std::fmt;

use crate::context::EncounterContext;
use crate::navigator::{BlockReason, NavigatorStatus};
use crate::quota::{QuotaReport, QuotaVariant};

pub const STATUS_PREFIX: &str = "[ShinyQuota]";

/// Missing units named in the status line before it is truncated.
const MISSING_SHOWN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub variant: QuotaVariant,
    pub context: Option<EncounterContext>,
    pub satisfied: usize,
    pub total: usize,
    pub missing: String,
    pub navigator: NavigatorStatus,
    pub block: Option<BlockReason>,
}

impl StatusLine {
    #[must_use]
    pub fn new(
        context: Option<&EncounterContext>,
        report: &QuotaReport,
        navigator: NavigatorStatus,
        block: Option<&BlockReason>,
    ) -> Self {
        Self {
            variant: report.variant,
            context: context.cloned(),
            satisfied: report.satisfied,
            total: report.total,
            missing: report.missing_summary(MISSING_SHOWN),
            navigator,
            block: block.cloned(),
        }
    }

    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        matches!(self.navigator, NavigatorStatus::Blocked)
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{STATUS_PREFIX} {}/{} ({}) - ",
            self.satisfied,
            self.total,
            self.variant.label()
        )?;
        match &self.context {
            Some(ctx) => write!(f, "{} {}", ctx.location, ctx.method)?,
            None => f.write_str("UNKNOWN")?,
        }
        if !self.missing.is_empty() {
            write!(f, " | missing: {}", self.missing)?;
        }
        match &self.block {
            Some(reason) => write!(f, " | BLOCKED: {reason}"),
            None => write!(f, " | nav: {}", self.navigator),
        }
    }
}
