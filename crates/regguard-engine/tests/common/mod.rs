//! Mock policy modules for testing
//!
//! Provides configurable mock implementations of the PolicyModule trait
//! for testing the orchestrator, aggregation and failure isolation.

#![allow(dead_code)]

use async_trait::async_trait;
use regguard_core::{
    Context, Error, ModuleConfig, ModuleResult, Requirements, Result, Severity, Violation,
};
use regguard_modules::PolicyModule;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Options understood by [`StubModule::reconfigured`]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StubSettings {
    severity: Option<Severity>,
    recommendations: Vec<String>,
}

/// A module that returns a fixed set of findings
pub struct StubModule {
    name: String,
    severities: Vec<Severity>,
    recommendations: Vec<String>,
    threshold: Severity,
    call_count: AtomicU32,
}

impl StubModule {
    /// A module that always passes
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            severities: Vec::new(),
            recommendations: Vec::new(),
            threshold: Severity::High,
            call_count: AtomicU32::new(0),
        }
    }

    /// Add a violation of the given severity
    pub fn with_violation(mut self, severity: Severity) -> Self {
        self.severities.push(severity);
        self
    }

    /// Add a recommendation
    pub fn with_recommendation(mut self, recommendation: &str) -> Self {
        self.recommendations.push(recommendation.to_string());
        self
    }

    /// Set the lowest severity that makes the module non-compliant
    pub fn with_threshold(mut self, threshold: Severity) -> Self {
        self.threshold = threshold;
        self
    }

    /// Number of times evaluate was called
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    fn result(&self) -> ModuleResult {
        ModuleResult::from_findings(
            self.severities
                .iter()
                .map(|s| Violation::new("STUB", format!("{} finding", self.name), *s))
                .collect(),
            self.recommendations.clone(),
            self.threshold,
        )
    }
}

#[async_trait]
impl PolicyModule for StubModule {
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(&self, _content: &str, _context: &Context) -> Result<ModuleResult> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Ok(self.result())
    }

    fn describe(&self) -> Result<Requirements> {
        Ok(Requirements {
            module: self.name.clone(),
            domain: "testing".to_string(),
            regulation: "none".to_string(),
            description: "Returns fixed findings".to_string(),
            non_compliant_at: self.threshold,
            parameters: json!({ "violations": self.severities.len() }),
        })
    }

    fn reconfigured(&self, config: &ModuleConfig) -> Result<Arc<dyn PolicyModule>> {
        let settings: StubSettings = config.parse()?;
        let mut module = StubModule::new(&self.name).with_threshold(self.threshold);
        module.severities.extend(settings.severity);
        module.recommendations = settings.recommendations;
        Ok(Arc::new(module))
    }
}

/// A module that always fails
pub struct FailingModule {
    name: String,
    error_message: String,
}

impl FailingModule {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            error_message: "Simulated module failure".to_string(),
        }
    }

    /// Set a custom error message
    pub fn with_error(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }
}

#[async_trait]
impl PolicyModule for FailingModule {
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(&self, _content: &str, _context: &Context) -> Result<ModuleResult> {
        Err(Error::module(&self.error_message))
    }

    fn describe(&self) -> Result<Requirements> {
        Err(Error::module(&self.error_message))
    }

    fn reconfigured(&self, _config: &ModuleConfig) -> Result<Arc<dyn PolicyModule>> {
        Err(Error::config("failing module cannot be reconfigured"))
    }
}

/// A module that panics whenever it is used
pub struct PanickingModule {
    name: String,
}

impl PanickingModule {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl PolicyModule for PanickingModule {
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(&self, _content: &str, _context: &Context) -> Result<ModuleResult> {
        panic!("{} exploded during evaluation", self.name);
    }

    fn describe(&self) -> Result<Requirements> {
        panic!("{} exploded during describe", self.name);
    }

    fn reconfigured(&self, _config: &ModuleConfig) -> Result<Arc<dyn PolicyModule>> {
        Ok(Arc::new(PanickingModule::new(&self.name)))
    }
}

/// Signals shared between a test and a [`GatedModule`]
#[derive(Default)]
pub struct Gate {
    /// Notified once evaluation has started
    pub started: Notify,
    /// Evaluation completes after this is notified
    pub release: Notify,
}

/// A passing module whose evaluation blocks until released
pub struct GatedModule {
    name: String,
    gate: Arc<Gate>,
}

impl GatedModule {
    pub fn new(name: &str, gate: Arc<Gate>) -> Self {
        Self {
            name: name.to_string(),
            gate,
        }
    }
}

#[async_trait]
impl PolicyModule for GatedModule {
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(&self, _content: &str, _context: &Context) -> Result<ModuleResult> {
        self.gate.started.notify_one();
        self.gate.release.notified().await;
        Ok(ModuleResult::pass().with_metadata("gated", true))
    }

    fn describe(&self) -> Result<Requirements> {
        StubModule::new(&self.name).describe()
    }

    fn reconfigured(&self, _config: &ModuleConfig) -> Result<Arc<dyn PolicyModule>> {
        Ok(Arc::new(GatedModule::new(&self.name, Arc::clone(&self.gate))))
    }
}

/// Context with a single string entry
pub fn context_with(key: &str, value: &str) -> Context {
    let mut context = Context::new();
    context.insert(key.to_string(), json!(value));
    context
}
