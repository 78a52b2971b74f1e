//! GST configuration provider
//!
//! The configuration is an append-only log of revisions; the revision with
//! the highest number is current. Bills copy the effective rate when they
//! are created, so a later revision never changes an existing bill.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use core_kernel::{CoreError, DomainPort, MoneyError, Percentage, PortError, StaffId};

use crate::calculator::GstCalculation;
use crate::error::BillingError;

/// Rate applied when a configuration is seeded
pub const DEFAULT_GST_PERCENTAGE: Decimal = dec!(7);

/// What the configured rate applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppliedTo {
    #[default]
    All,
    Services,
    Products,
    Deals,
}

impl AppliedTo {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppliedTo::All => "all",
            AppliedTo::Services => "services",
            AppliedTo::Products => "products",
            AppliedTo::Deals => "deals",
        }
    }
}

impl fmt::Display for AppliedTo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppliedTo {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(AppliedTo::All),
            "services" => Ok(AppliedTo::Services),
            "products" => Ok(AppliedTo::Products),
            "deals" => Ok(AppliedTo::Deals),
            other => Err(CoreError::validation(format!("Unknown GST scope: {}", other))),
        }
    }
}

/// The staff member changing or seeding the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: StaffId,
    pub name: String,
}

impl Actor {
    pub fn new(id: StaffId, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

/// One revision of the GST configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GstConfig {
    pub revision: i64,
    pub gst_percentage: Percentage,
    pub is_active: bool,
    pub applied_to: AppliedTo,
    pub updated_by: StaffId,
    pub updated_by_name: String,
    pub created_at: DateTime<Utc>,
}

impl GstConfig {
    /// The first revision: 7%, active, applied to everything
    pub fn seed(actor: &Actor) -> Self {
        Self {
            revision: 1,
            gst_percentage: Percentage::new(DEFAULT_GST_PERCENTAGE).unwrap_or_default(),
            is_active: true,
            applied_to: AppliedTo::All,
            updated_by: actor.id,
            updated_by_name: actor.name.clone(),
            created_at: Utc::now(),
        }
    }

    /// The next revision, carrying forward every field the update omits
    pub fn revise(&self, update: &GstUpdate, actor: &Actor) -> Self {
        Self {
            revision: self.revision + 1,
            gst_percentage: update.gst_percentage.unwrap_or(self.gst_percentage),
            is_active: update.is_active.unwrap_or(self.is_active),
            applied_to: update.applied_to.unwrap_or(self.applied_to),
            updated_by: actor.id,
            updated_by_name: actor.name.clone(),
            created_at: Utc::now(),
        }
    }

    /// The rate bills use: zero while inactive
    pub fn effective_rate(&self) -> Percentage {
        if self.is_active {
            self.gst_percentage
        } else {
            Percentage::zero()
        }
    }
}

/// Fields an administrator may change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GstUpdate {
    pub gst_percentage: Option<Percentage>,
    pub is_active: Option<bool>,
    pub applied_to: Option<AppliedTo>,
}

impl GstUpdate {
    /// Validates raw request values; the percentage must lie in 0..=100
    pub fn parse(
        gst_percentage: Option<Decimal>,
        is_active: Option<bool>,
        applied_to: Option<&str>,
    ) -> Result<Self, BillingError> {
        let gst_percentage = gst_percentage
            .map(|p| {
                Percentage::new(p).map_err(|e| match e {
                    MoneyError::PercentageTooPrecise(_) => {
                        BillingError::validation("GST percentage allows at most two decimal places")
                    }
                    _ => BillingError::validation("GST percentage must be between 0 and 100"),
                })
            })
            .transpose()?;
        let applied_to = applied_to.map(str::parse::<AppliedTo>).transpose()?;
        Ok(Self { gst_percentage, is_active, applied_to })
    }
}

/// The rate handed to billing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GstForBilling {
    pub gst_percentage: Percentage,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_to: Option<AppliedTo>,
}

impl GstForBilling {
    /// No configuration: zero rate, inactive
    pub fn absent() -> Self {
        Self {
            gst_percentage: Percentage::zero(),
            is_active: false,
            applied_to: None,
        }
    }
}

impl From<&GstConfig> for GstForBilling {
    fn from(config: &GstConfig) -> Self {
        Self {
            gst_percentage: config.effective_rate(),
            is_active: config.is_active,
            applied_to: Some(config.applied_to),
        }
    }
}

/// Storage for configuration revisions
#[async_trait]
pub trait GstConfigPort: DomainPort {
    /// The highest revision, if any exists
    async fn current(&self) -> Result<Option<GstConfig>, PortError>;

    /// Appends a revision; `Conflict` when its number is already taken
    async fn append(&self, config: GstConfig) -> Result<GstConfig, PortError>;

    /// Revisions newest first
    async fn history(&self, limit: u32) -> Result<Vec<GstConfig>, PortError>;
}

/// Reads and revises the GST configuration
pub struct GstService {
    store: Arc<dyn GstConfigPort>,
}

impl GstService {
    pub fn new(store: Arc<dyn GstConfigPort>) -> Self {
        Self { store }
    }

    /// The current configuration, seeding the default on first use
    pub async fn get(&self, actor: &Actor) -> Result<GstConfig, BillingError> {
        if let Some(config) = self.store.current().await? {
            return Ok(config);
        }
        match self.store.append(GstConfig::seed(actor)).await {
            Ok(seeded) => {
                info!(updated_by = %actor.id, "Seeded default GST configuration");
                Ok(seeded)
            }
            // another request seeded it first
            Err(e) if e.is_conflict() => self
                .store
                .current()
                .await?
                .ok_or_else(|| BillingError::not_found("GST configuration", "current")),
            Err(e) => Err(e.into()),
        }
    }

    /// Appends a revision built from the current one
    pub async fn update(&self, actor: &Actor, update: GstUpdate) -> Result<GstConfig, BillingError> {
        let base = match self.store.current().await? {
            Some(current) => current,
            None => GstConfig {
                revision: 0,
                ..GstConfig::seed(actor)
            },
        };
        let revised = self.store.append(base.revise(&update, actor)).await?;
        info!(
            revision = revised.revision,
            gst_percentage = %revised.gst_percentage,
            is_active = revised.is_active,
            updated_by = %actor.id,
            "GST configuration updated"
        );
        Ok(revised)
    }

    pub async fn for_billing(&self) -> Result<GstForBilling, BillingError> {
        Ok(self
            .store
            .current()
            .await?
            .as_ref()
            .map(GstForBilling::from)
            .unwrap_or_else(GstForBilling::absent))
    }

    /// The rate to snapshot onto a new bill. A store failure yields the zero
    /// rate so that billing never fails on GST lookup.
    pub async fn effective_rate(&self) -> Percentage {
        match self.store.current().await {
            Ok(config) => config.map(|c| c.effective_rate()).unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "GST lookup failed, billing at 0%");
                Percentage::zero()
            }
        }
    }

    /// Applies the effective rate to an amount, which must be present and
    /// not negative
    pub async fn calculate(&self, amount: Option<Decimal>) -> Result<GstCalculation, BillingError> {
        let amount = amount
            .filter(|a| *a >= Decimal::ZERO)
            .ok_or_else(|| BillingError::validation("Valid amount is required"))?;
        let rate = self.for_billing().await?.gst_percentage;
        Ok(GstCalculation::new(amount, rate))
    }

    pub async fn history(&self, limit: u32) -> Result<Vec<GstConfig>, BillingError> {
        Ok(self.store.history(limit.clamp(1, 100)).await?)
    }
}

/// In-memory revision log
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::RwLock;

    #[derive(Debug, Default)]
    pub struct MockGstConfigPort {
        revisions: RwLock<Vec<GstConfig>>,
        failing: AtomicBool,
    }

    impl MockGstConfigPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every call fail with a connection error
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), PortError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(PortError::connection("gst store unavailable"));
            }
            Ok(())
        }
    }

    impl DomainPort for MockGstConfigPort {}

    #[async_trait]
    impl GstConfigPort for MockGstConfigPort {
        async fn current(&self) -> Result<Option<GstConfig>, PortError> {
            self.check()?;
            Ok(self.revisions.read().await.iter().max_by_key(|c| c.revision).cloned())
        }

        async fn append(&self, config: GstConfig) -> Result<GstConfig, PortError> {
            self.check()?;
            let mut revisions = self.revisions.write().await;
            if revisions.iter().any(|c| c.revision == config.revision) {
                return Err(PortError::conflict(format!(
                    "GST revision {} already exists",
                    config.revision
                )));
            }
            revisions.push(config.clone());
            Ok(config)
        }

        async fn history(&self, limit: u32) -> Result<Vec<GstConfig>, PortError> {
            self.check()?;
            let mut all = self.revisions.read().await.clone();
            all.sort_by(|a, b| b.revision.cmp(&a.revision));
            all.truncate(limit as usize);
            Ok(all)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockGstConfigPort;
    use super::*;

    fn admin() -> Actor {
        Actor::new(StaffId::new(), "Owner")
    }

    fn service() -> (GstService, Arc<MockGstConfigPort>) {
        let store = Arc::new(MockGstConfigPort::new());
        (GstService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_get_seeds_default_once() {
        let (gst, _) = service();
        let actor = admin();
        let first = gst.get(&actor).await.unwrap();
        let second = gst.get(&admin()).await.unwrap();

        assert_eq!(first.gst_percentage.value(), dec!(7));
        assert!(first.is_active);
        assert_eq!(first.applied_to, AppliedTo::All);
        assert_eq!(first.updated_by, actor.id);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_update_keeps_omitted_fields() {
        let (gst, _) = service();
        let actor = admin();
        gst.get(&actor).await.unwrap();

        let update = GstUpdate::parse(Some(dec!(16)), None, None).unwrap();
        let revised = gst.update(&actor, update).await.unwrap();
        assert_eq!(revised.revision, 2);
        assert_eq!(revised.gst_percentage.value(), dec!(16));
        assert!(revised.is_active);
        assert_eq!(revised.applied_to, AppliedTo::All);

        assert_eq!(gst.get(&actor).await.unwrap(), revised);
        let history = gst.history(10).await.unwrap();
        assert_eq!(history.iter().map(|c| c.revision).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[tokio::test]
    async fn test_update_without_config_starts_from_default() {
        let (gst, _) = service();
        let update = GstUpdate::parse(None, Some(false), Some("services")).unwrap();
        let config = gst.update(&admin(), update).await.unwrap();
        assert_eq!(config.revision, 1);
        assert_eq!(config.gst_percentage.value(), dec!(7));
        assert!(!config.is_active);
        assert_eq!(config.applied_to, AppliedTo::Services);
    }

    #[test]
    fn test_update_validation() {
        assert!(matches!(
            GstUpdate::parse(Some(dec!(101)), None, None),
            Err(BillingError::Validation(_))
        ));
        assert!(GstUpdate::parse(Some(dec!(-1)), None, None).is_err());
        assert!(GstUpdate::parse(None, None, Some("everything")).is_err());
        assert!(GstUpdate::parse(Some(dec!(0)), None, None).is_ok());
    }

    #[test]
    fn test_update_rejects_sub_hundredth_rates() {
        match GstUpdate::parse(Some(dec!(7.125)), None, None) {
            Err(BillingError::Validation(message)) => assert!(message.contains("two decimal places")),
            other => panic!("expected validation error, got {:?}", other),
        }
        let update = GstUpdate::parse(Some(dec!(7.13)), None, None).unwrap();
        assert_eq!(update.gst_percentage.map(|p| p.value()), Some(dec!(7.13)));
    }

    #[tokio::test]
    async fn test_inactive_or_absent_config_bills_at_zero() {
        let (gst, store) = service();
        assert_eq!(gst.for_billing().await.unwrap(), GstForBilling::absent());
        assert!(gst.effective_rate().await.is_zero());

        let actor = admin();
        gst.update(&actor, GstUpdate { is_active: Some(false), ..Default::default() })
            .await
            .unwrap();
        let billing = gst.for_billing().await.unwrap();
        assert!(billing.gst_percentage.is_zero());
        assert!(!billing.is_active);

        store.set_failing(true);
        assert!(gst.effective_rate().await.is_zero());
        assert!(gst.for_billing().await.is_err());
    }

    #[tokio::test]
    async fn test_calculate() {
        let (gst, _) = service();
        gst.get(&admin()).await.unwrap();

        let calc = gst.calculate(Some(dec!(1000))).await.unwrap();
        assert_eq!(calc.gst_amount, dec!(70.00));
        assert_eq!(calc.final_amount, dec!(1070.00));

        assert!(gst.calculate(None).await.is_err());
        assert!(gst.calculate(Some(dec!(-5))).await.is_err());
    }
}
