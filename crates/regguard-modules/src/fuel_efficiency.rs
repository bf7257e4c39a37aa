//! Fuel efficiency module
//!
//! Treats compute as fuel: flags code shapes that burn cycles for nothing,
//! loosely modeled on fuel-economy standards. Heuristics:
//! - Loop nesting deeper than the configured limit
//! - Busy-wait loops with empty bodies
//! - Blocking calls (synchronous IO, sleeps) above the configured budget
//! - Polling timers firing faster than the configured minimum interval

use crate::module::{compile_pattern, contain_analysis, Findings, PolicyModule};
use async_trait::async_trait;
use regex::Regex;
use regguard_core::{
    Context, ModuleConfig, ModuleResult, Requirements, Result, Severity,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const NON_COMPLIANT_AT: Severity = Severity::High;

/// Options recognized by the fuel efficiency module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelEfficiencySettings {
    /// Deepest loop nesting allowed
    pub max_loop_nesting: usize,

    /// Blocking calls allowed per artifact
    pub max_blocking_calls: usize,

    /// Shortest acceptable polling interval in milliseconds
    pub min_polling_interval_ms: u64,
}

impl Default for FuelEfficiencySettings {
    fn default() -> Self {
        Self {
            max_loop_nesting: 2,
            max_blocking_calls: 2,
            min_polling_interval_ms: 1000,
        }
    }
}

/// Energy-efficiency heuristics over source code
pub struct FuelEfficiencyModule {
    settings: FuelEfficiencySettings,
    loop_keyword: Regex,
    busy_wait: Regex,
    blocking_call: Regex,
    polling_timer: Regex,
}

impl FuelEfficiencyModule {
    /// Catalog name
    pub const NAME: &'static str = "fuel_efficiency";

    /// Create a module with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(FuelEfficiencySettings::default())
    }

    /// Create a module from configuration options
    pub fn from_config(config: &ModuleConfig) -> Result<Self> {
        Self::with_settings(config.parse()?)
    }

    /// Create a module from typed settings
    pub fn with_settings(settings: FuelEfficiencySettings) -> Result<Self> {
        Ok(Self {
            settings,
            loop_keyword: compile_pattern("loop keyword", r"\b(?:for|while|loop|do)\b")?,
            busy_wait: compile_pattern(
                "busy wait",
                r"(?:while\s*\(\s*(?:true|1)\s*\)\s*(?:\{\s*\}|;)|\bloop\s*\{\s*\}|while\s+True\s*:\s*pass\b)",
            )?,
            blocking_call: compile_pattern(
                "blocking call",
                r"\b(?:readFileSync|writeFileSync|execSync|thread::sleep|time\.sleep|Thread\.sleep|usleep)\s*\(",
            )?,
            polling_timer: compile_pattern("polling timer", r"setInterval\s*\([^;]*?,\s*(\d+)\s*\)")?,
        })
    }

    /// Current settings
    pub fn settings(&self) -> &FuelEfficiencySettings {
        &self.settings
    }

    /// Deepest loop nesting found by brace tracking
    fn loop_nesting(&self, content: &str) -> usize {
        let mut stack: Vec<bool> = Vec::new();
        let mut deepest = 0;

        for line in content.lines() {
            let mut pending_loop = self.loop_keyword.is_match(line);
            for ch in line.chars() {
                match ch {
                    '{' => {
                        stack.push(pending_loop);
                        pending_loop = false;
                        let depth = stack.iter().filter(|is_loop| **is_loop).count();
                        deepest = deepest.max(depth);
                    }
                    '}' => {
                        stack.pop();
                    }
                    _ => {}
                }
            }
        }

        deepest
    }

    fn analyze(&self, content: &str, _context: &Context) -> Result<ModuleResult> {
        let mut findings = Findings::new();
        let mut penalty: u64 = 0;

        let nesting = self.loop_nesting(content);
        if nesting > self.settings.max_loop_nesting {
            findings.flag(
                "EXCESSIVE_LOOP_NESTING",
                format!(
                    "Loops nested {} deep (limit {})",
                    nesting, self.settings.max_loop_nesting
                ),
                Severity::High,
            );
            findings.recommend("Flatten nested loops or index data to avoid repeated scans");
            penalty += 30;
        }

        let busy_waits = self.busy_wait.find_iter(content).count();
        if busy_waits > 0 {
            findings.flag(
                "BUSY_WAIT",
                format!("{} busy-wait loop(s) spin without yielding", busy_waits),
                Severity::Critical,
            );
            findings.recommend("Replace busy waits with blocking primitives or async notifications");
            penalty += 50;
        }

        let blocking = self.blocking_call.find_iter(content).count();
        if blocking > self.settings.max_blocking_calls {
            findings.flag(
                "BLOCKING_CALLS",
                format!(
                    "{} blocking calls (budget {})",
                    blocking, self.settings.max_blocking_calls
                ),
                Severity::Medium,
            );
            findings.recommend("Use non-blocking IO and timers instead of synchronous calls");
            penalty += 10;
        }

        let mut fastest_poll: Option<u64> = None;
        for caps in self.polling_timer.captures_iter(content) {
            if let Some(ms) = caps.get(1).and_then(|m| m.as_str().parse::<u64>().ok()) {
                fastest_poll = Some(fastest_poll.map_or(ms, |f| f.min(ms)));
            }
        }
        if let Some(ms) = fastest_poll {
            if ms < self.settings.min_polling_interval_ms {
                findings.flag(
                    "AGGRESSIVE_POLLING",
                    format!(
                        "Polling every {}ms (minimum {}ms)",
                        ms, self.settings.min_polling_interval_ms
                    ),
                    Severity::High,
                );
                findings.recommend("Poll less often or switch to push-based updates");
                penalty += 20;
            }
        }

        let score = 100u64.saturating_sub(penalty);
        Ok(findings
            .finish(NON_COMPLIANT_AT)
            .with_metadata("max_loop_nesting", nesting)
            .with_metadata("busy_waits", busy_waits)
            .with_metadata("blocking_calls", blocking)
            .with_metadata("efficiency_score", score))
    }
}

#[async_trait]
impl PolicyModule for FuelEfficiencyModule {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn evaluate(&self, content: &str, context: &Context) -> Result<ModuleResult> {
        Ok(contain_analysis(Self::NAME, self.analyze(content, context)))
    }

    fn describe(&self) -> Result<Requirements> {
        Ok(Requirements {
            module: Self::NAME.to_string(),
            domain: "energy efficiency".to_string(),
            regulation: "Fuel economy standards (compute analogue)".to_string(),
            description: "Flags deep loop nesting, busy waits, blocking calls and aggressive polling"
                .to_string(),
            non_compliant_at: NON_COMPLIANT_AT,
            parameters: serde_json::to_value(&self.settings)?,
        })
    }

    fn reconfigured(&self, config: &ModuleConfig) -> Result<Arc<dyn PolicyModule>> {
        Ok(Arc::new(Self::from_config(config)?))
    }
}
