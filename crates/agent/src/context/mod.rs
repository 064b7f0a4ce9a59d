//! Agent context - dependency injection container
//!
//! [`AgentContext::start`] wires every component explicitly and runs the
//! startup sequence:
//!
//! 1. load user settings
//! 2. build the transport (the settings' API URL wins over the config's)
//! 3. check the client version against the server minimum
//! 4. log in with stored credentials and pull the user's tracking timings
//! 5. start the tracking scheduler
//!
//! A failure at any step is fatal. It is reported to the server once as an
//! error-level health record and returned to the host.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use codetrail_core::{
    Clock, FlushReport, FlushService, IdentityChange, IdentityService, ProjectRegistry,
    SystemClock,
};
use codetrail_domain::{
    AgentConfig, ClientVersion, CodetrailError, HealthLevel, Result, TimestampFormat,
    TrackingConfig,
};
use codetrail_infra::{
    ActivityFiles, AgentPaths, ApiClient, ApiClientConfig, ApiForwarder, ApiStatus,
    HealthReporter, SchedulerConfig, TrackingConsole, TrackingScheduler, UserSettingsStore,
    WireCodec,
};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Application context holding every long-lived component
pub struct AgentContext {
    pub paths: AgentPaths,
    pub settings: Arc<UserSettingsStore>,
    pub client: Arc<ApiClient>,
    pub registry: Arc<ProjectRegistry>,
    pub identity: Arc<IdentityService>,
    pub flush: Arc<FlushService>,
    pub health: Arc<HealthReporter>,
    /// Present when `tracking.console_enabled` is set.
    pub console: Option<Arc<TrackingConsole>>,
    pub timestamps: TimestampFormat,
    config: RwLock<AgentConfig>,
    clock: Arc<dyn Clock>,
    scheduler: Mutex<TrackingScheduler>,
}

impl AgentContext {
    /// Start the agent on the wall clock.
    ///
    /// # Errors
    /// Any fatal startup error, after it has been reported to the server.
    pub async fn start(config: AgentConfig) -> Result<Self> {
        Self::start_with_clock(config, Arc::new(SystemClock)).await
    }

    /// Start the agent with an injected clock.
    ///
    /// # Errors
    /// Same as [`AgentContext::start`].
    pub async fn start_with_clock(config: AgentConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let started_at = clock.now();
        let mut transport = None;

        match Self::bootstrap(config.clone(), clock, &mut transport).await {
            Ok(context) => Ok(context),
            Err(err) => {
                report_startup_failure(&config, transport, &err, started_at).await;
                Err(err)
            }
        }
    }

    async fn bootstrap(
        config: AgentConfig,
        clock: Arc<dyn Clock>,
        transport: &mut Option<Arc<ApiClient>>,
    ) -> Result<Self> {
        let timestamps = TimestampFormat::new(config.client.timestamp_format.clone())?;
        let client_version: ClientVersion = config.client.version.parse()?;

        let paths = AgentPaths::from_config(&config.storage)?;
        paths.ensure()?;
        let settings = Arc::new(UserSettingsStore::new(paths.user_settings_file()));
        let user_settings = settings.load()?;

        let mut api = config.api.clone();
        if let Some(url) = user_settings.api_url.filter(|url| !url.is_empty()) {
            api.base_url = url;
        }
        let client = Arc::new(ApiClient::new(ApiClientConfig::from(&api))?);
        *transport = Some(Arc::clone(&client));
        info!(base_url = %client.config().base_url, "Transport ready");

        check_version(&client, client_version).await?;

        let registry = Arc::new(ProjectRegistry::new(config.tracking.idle_timeout()));
        let console = config.tracking.console_enabled.then(|| {
            let console = Arc::new(TrackingConsole::new(timestamps.clone()));
            registry.add_observer(console.clone());
            console
        });

        let codec = WireCodec::new(timestamps.clone(), config.storage.instance_id.clone());
        let forwarder = Arc::new(ApiForwarder::new(Arc::clone(&client)));
        let archive = ActivityFiles::new(&paths, config.storage.client_id.clone(), codec.clone());
        let flush = Arc::new(
            FlushService::new(
                Arc::clone(&registry),
                Arc::new(codec),
                forwarder.clone(),
                Arc::new(archive),
            )
            .with_track_sent(config.storage.track_sent),
        );

        let identity = Arc::new(IdentityService::new(forwarder, settings.clone()));
        let headers = Arc::clone(&client);
        identity.on_change(move |change| match change {
            IdentityChange::LoggedIn(credentials) => {
                headers.set_credentials(Some(credentials.clone()));
            }
            IdentityChange::LoggedOut => headers.set_credentials(None),
        });

        let health = Arc::new(HealthReporter::new(Arc::clone(&client), timestamps.clone()));
        let scheduler = TrackingScheduler::new(
            Arc::clone(&registry),
            Arc::clone(&flush),
            Arc::clone(&clock),
            SchedulerConfig::from(&config.tracking),
        );

        let context = Self {
            paths,
            settings,
            client,
            registry,
            identity,
            flush,
            health,
            console,
            timestamps,
            config: RwLock::new(config),
            clock,
            scheduler: Mutex::new(scheduler),
        };

        if context.identity.try_login_with_stored_credentials().await? {
            context.refresh_user_configuration().await?;
        }

        context.scheduler.lock().await.start().await?;
        info!(
            version = %client_version,
            authenticated = context.identity.is_authenticated(),
            "Agent started"
        );
        Ok(context)
    }

    /// Snapshot of the effective configuration.
    pub fn config(&self) -> AgentConfig {
        self.config.read().clone()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn is_scheduler_running(&self) -> bool {
        self.scheduler.lock().await.is_running()
    }

    /// Pull the logged-in user's tracking timings and apply them.
    ///
    /// Returns whether remote timings were applied. An unavailable
    /// configuration keeps the local timings.
    ///
    /// # Errors
    /// `Internal` when a running scheduler cannot be restarted with the new
    /// intervals.
    pub async fn refresh_user_configuration(&self) -> Result<bool> {
        let Some(identity) = self.identity.identity() else {
            return Ok(false);
        };

        let response = self.client.get_user_configuration(&identity).await;
        let Some(remote) = response.payload else {
            warn!(
                status = %response.status,
                reason = %response.reason,
                "User configuration unavailable, keeping local timings"
            );
            return Ok(false);
        };

        let tracking = {
            let mut config = self.config.write();
            config.tracking.apply_remote(&remote);
            config.tracking.clone()
        };
        self.apply_tracking_config(&tracking).await?;
        info!(
            idle_timeout_secs = tracking.idle_timeout_secs,
            idle_check_interval_secs = tracking.idle_check_interval_secs,
            flush_interval_secs = tracking.flush_interval_secs,
            "Applied remote tracking configuration"
        );
        Ok(true)
    }

    async fn apply_tracking_config(&self, tracking: &TrackingConfig) -> Result<()> {
        self.registry.set_idle_timeout(tracking.idle_timeout());

        let intervals = SchedulerConfig::from(tracking);
        let mut scheduler = self.scheduler.lock().await;
        if *scheduler.config() == intervals {
            return Ok(());
        }

        scheduler.set_config(intervals);
        if scheduler.is_running() {
            debug!("Restarting tracking scheduler with new intervals");
            scheduler.stop().await?;
            scheduler.start().await?;
        }
        Ok(())
    }

    /// Send a health record stamped with the context clock.
    pub async fn report_health(
        &self,
        level: HealthLevel,
        message: &str,
        fault: Option<&str>,
    ) -> bool {
        self.health.report(level, message, fault, self.now()).await
    }

    /// Stop the scheduler, close every tracked project and flush once more.
    ///
    /// Records that cannot be delivered land in the cache for the next
    /// session.
    pub async fn shutdown(&self) -> FlushReport {
        info!("Shutting down agent");

        {
            let mut scheduler = self.scheduler.lock().await;
            if scheduler.is_running() {
                if let Err(err) = scheduler.stop().await {
                    warn!(error = %err, "Tracking scheduler did not stop cleanly");
                }
            }
        }

        let now = self.now();
        self.registry.stop_all(now);
        let report = self.flush.flush(now).await;

        info!(
            sent = report.sent,
            resent = report.resent,
            cached = report.cached,
            discarded = report.discarded,
            storage_failures = report.storage_failures,
            "Agent stopped"
        );
        report
    }
}

impl std::fmt::Debug for AgentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentContext")
            .field("root", &self.paths.root())
            .field("identity", &self.identity.identity())
            .field("tracked", &self.registry.tracked_projects().len())
            .finish_non_exhaustive()
    }
}

/// Compare the client against the server's minimum supported version.
///
/// Only a definite "too old" answer is an error. An unreachable server, a
/// failed call or an unreadable version lets startup continue.
async fn check_version(client: &ApiClient, current: ClientVersion) -> Result<()> {
    let response = client.version().await;
    let Some(info) = response.payload else {
        match response.status {
            ApiStatus::ConnectionProblems => {
                warn!("Version service unreachable, continuing offline");
            }
            status => warn!(%status, reason = %response.reason, "Version check failed"),
        }
        return Ok(());
    };

    let minimum: ClientVersion = match info.version.parse() {
        Ok(minimum) => minimum,
        Err(err) => {
            warn!(error = %err, "Ignoring unreadable minimum version");
            return Ok(());
        }
    };

    if current < minimum {
        return Err(CodetrailError::IncompatibleVersion(format!(
            "client {current} is older than the minimum supported {minimum}"
        )));
    }
    debug!(%current, %minimum, "Client version accepted");
    Ok(())
}

async fn report_startup_failure(
    config: &AgentConfig,
    transport: Option<Arc<ApiClient>>,
    fault: &CodetrailError,
    now: DateTime<Utc>,
) {
    let client = match transport {
        Some(client) => client,
        None => match ApiClient::new(ApiClientConfig::from(&config.api)) {
            Ok(client) => Arc::new(client),
            Err(err) => {
                error!(error = %err, fault = %fault, "No transport for the startup failure report");
                return;
            }
        },
    };

    let timestamps =
        TimestampFormat::new(config.client.timestamp_format.clone()).unwrap_or_default();
    HealthReporter::new(client, timestamps).report_startup_failure(fault, now).await;
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> ApiClient {
        let config = ApiClientConfig { base_url: server.uri(), ..ApiClientConfig::default() };
        ApiClient::new(config).unwrap()
    }

    async fn minimum_version(body: serde_json::Value, status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/version"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn equal_or_newer_client_is_accepted() {
        let server = minimum_version(serde_json::json!({ "Version": "1.2" }), 200).await;
        let client = client_for(&server);
        assert!(check_version(&client, ClientVersion::new(1, 2, 0, 0)).await.is_ok());
        assert!(check_version(&client, ClientVersion::new(1, 3, 0, 0)).await.is_ok());
    }

    #[tokio::test]
    async fn older_client_is_incompatible() {
        let server = minimum_version(serde_json::json!({ "Version": "1.2.0.5" }), 200).await;
        let client = client_for(&server);
        let result = check_version(&client, ClientVersion::new(1, 2, 0, 4)).await;
        assert!(matches!(result, Err(CodetrailError::IncompatibleVersion(_))));
    }

    #[tokio::test]
    async fn failed_or_unreadable_answers_do_not_block() {
        let server = minimum_version(serde_json::json!({ "Version": "latest" }), 200).await;
        let client = client_for(&server);
        assert!(check_version(&client, ClientVersion::default()).await.is_ok());

        let server = minimum_version(serde_json::json!({}), 503).await;
        let client = client_for(&server);
        assert!(check_version(&client, ClientVersion::default()).await.is_ok());
    }
}
