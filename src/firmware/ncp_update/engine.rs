use heapless::String;
use log::{debug, error, info, warn};

use super::super::{
    at::{AtResult, UrcMailbox},
    config::{
        find_known_upgrade, NcpFwUpdatePolicy, UpdateServer, NCP_FW_INSTALL_PROGRESS_COMPLETE,
        NCP_FW_UPDATE_DATA_FAILED, NCP_FW_UPDATE_DATA_STARTED, NCP_FW_UPDATE_DATA_SUCCESS,
        NCP_FW_UPDATE_EVENT, NCP_FW_UPDATE_INTERFACE, NCP_FW_UPDATE_PDP_CID,
        NCP_FW_UPDATE_PDP_PROFILE,
    },
    system::{CacheKey, CloudCallbacks, Platform},
    telemetry,
    types::{
        CloudFeature, DisconnectReason, NcpFwUpdateConfig, NcpFwUpdateState, NcpFwUpdateStatus,
        NcpIdentifier, PowerState, PublishVisibility, SystemError, UpdateAvailable,
    },
};
use super::{
    cooldown::Cooldown,
    data::{NcpFwUpdateData, NCP_FW_UPDATE_DATA_LEN},
    modem,
};

const SUPPORTED_NCP: NcpIdentifier = NcpIdentifier::SaraR510;
const POWER_ON_POLL_MS: u32 = 100;

#[derive(Clone, Copy, Debug, Default)]
struct Retries {
    qualify: u8,
    publish_start: u8,
    https_setup: u8,
    download: u8,
    cloud_connect_exit: u8,
}

/// Per-stage timing. Reset on every state change, so the first tick of a
/// stage (including one resumed after a reset) sees `entered_at_ms == None`.
#[derive(Clone, Copy, Debug, Default)]
struct StageTimer {
    entered_at_ms: Option<u64>,
    pending_since_ms: Option<u64>,
}

impl StageTimer {
    fn elapsed(&self, now_ms: u64) -> u64 {
        self.entered_at_ms
            .map_or(0, |entered| now_ms.saturating_sub(entered))
    }
}

/// Modem firmware update driver.
///
/// Owns the checkpoint record and advances at most one stage per
/// [`process`](Self::process) call. Blocking happens only inside single AT
/// round trips; every wait is a bounded poll across ticks.
pub struct NcpFwUpdate<'a, P, C> {
    platform: P,
    urc: &'a UrcMailbox,
    callbacks: Option<C>,
    policy: NcpFwUpdatePolicy,
    server: UpdateServer,
    data: NcpFwUpdateData,
    status_diag: NcpFwUpdateStatus,
    cooldown: Cooldown,
    stage: StageTimer,
    retries: Retries,
    last_progress: Option<u8>,
}

impl<'a, P, C> NcpFwUpdate<'a, P, C>
where
    P: Platform,
    C: CloudCallbacks,
{
    pub fn new(platform: P, urc: &'a UrcMailbox) -> Self {
        Self::with_policy(platform, urc, NcpFwUpdatePolicy::default(), UpdateServer::default())
    }

    pub fn with_policy(
        platform: P,
        urc: &'a UrcMailbox,
        policy: NcpFwUpdatePolicy,
        server: UpdateServer,
    ) -> Self {
        Self {
            platform,
            urc,
            callbacks: None,
            policy,
            server,
            data: NcpFwUpdateData::default(),
            status_diag: NcpFwUpdateStatus::None,
            cooldown: Cooldown::default(),
            stage: StageTimer::default(),
            retries: Retries::default(),
            last_progress: None,
        }
    }

    /// Restores the checkpoint. Must run once before [`process`](Self::process).
    pub fn init(&mut self, callbacks: C) -> Result<(), SystemError> {
        self.callbacks = Some(callbacks);
        let safe_mode = self.platform.is_safe_mode();
        match self.recall() {
            Some(stored) if stored.state == NcpFwUpdateState::FinishedIdle && safe_mode => {
                info!(
                    "ncp_fw: init run finished status={}, deferring to normal mode",
                    stored.status.as_str()
                );
                self.data = NcpFwUpdateData::default();
            }
            Some(stored) if stored.state == NcpFwUpdateState::FinishedIdle => {
                info!(
                    "ncp_fw: init surfacing last status={}",
                    stored.status.as_str()
                );
                self.set_status_diag(stored.status);
                self.data = stored;
                self.data.state = NcpFwUpdateState::Idle;
                self.data.status = NcpFwUpdateStatus::Idle;
                self.data.update_available = UpdateAvailable::Unknown;
                self.data.is_user_config = false;
                self.persist();
            }
            Some(stored) if stored.state == NcpFwUpdateState::InstallWaiting && !safe_mode => {
                info!("ncp_fw: init install pending, resetting into safe mode");
                self.data = stored;
                self.request_safe_mode_reset();
            }
            Some(stored) if safe_mode => {
                info!(
                    "ncp_fw: init resume state={} status={}",
                    stored.state.as_str(),
                    stored.status.as_str()
                );
                self.data = stored;
            }
            _ => {
                self.data = NcpFwUpdateData::default();
            }
        }
        self.cooldown.clear();
        self.stage = StageTimer::default();
        Ok(())
    }

    /// Requests an update run against a caller-supplied upgrade path.
    pub fn check_update(&mut self, config: &NcpFwUpdateConfig) -> Result<(), SystemError> {
        config.validate()?;
        self.ensure_ready_for_request()?;
        self.data.user_config = config.clone();
        self.data.is_user_config = true;
        self.begin_run();
        Ok(())
    }

    /// Overrides the built-in upgrade table for the next run. `None` returns
    /// to the table.
    pub fn set_config(&mut self, config: Option<&NcpFwUpdateConfig>) -> Result<(), SystemError> {
        if self.data.state != NcpFwUpdateState::Idle {
            return Err(SystemError::InvalidState);
        }
        match config {
            Some(config) => {
                config.validate()?;
                self.data.user_config = config.clone();
                self.data.is_user_config = true;
            }
            None => {
                self.data.user_config = NcpFwUpdateConfig::default();
                self.data.is_user_config = false;
            }
        }
        Ok(())
    }

    /// Starts a run when the device qualifies, powering the modem if needed.
    pub fn enable_updates(&mut self) -> Result<(), SystemError> {
        self.ensure_ready_for_request()?;
        if self.platform.ncp_identifier() != SUPPORTED_NCP
            || !self.platform.updates_enabled()
            || !self.feature_enabled()
        {
            debug!("ncp_fw: enable_updates prerequisites not met");
            return Err(SystemError::InvalidState);
        }
        if !self.power_on_blocking() {
            warn!("ncp_fw: enable_updates modem did not power on");
            return Err(SystemError::InvalidState);
        }
        self.begin_run();
        Ok(())
    }

    pub fn process(&mut self) -> Result<(), SystemError> {
        if self.callbacks.is_none() {
            return Err(SystemError::InvalidState);
        }
        self.platform.poll_urcs();
        let now = self.platform.now_ms();
        if self.cooldown.update(now) {
            return Ok(());
        }
        let entered = self.stage.entered_at_ms.is_none();
        if entered {
            self.stage.entered_at_ms = Some(now);
        }

        match self.data.state {
            NcpFwUpdateState::Idle => self.idle(),
            NcpFwUpdateState::QualifyFlags => self.qualify_flags(),
            NcpFwUpdateState::QualifyModemOn => self.qualify_modem_on(now),
            NcpFwUpdateState::QualifyRetry => self.qualify_retry(now),
            NcpFwUpdateState::SetupCloudConnect => self.setup_cloud_connect(),
            NcpFwUpdateState::SetupCloudConnecting => self.setup_cloud_connecting(now),
            NcpFwUpdateState::SetupCloudConnected => self.setup_cloud_connected(now),
            NcpFwUpdateState::DownloadCloudDisconnect => self.download_cloud_disconnect(now, entered),
            NcpFwUpdateState::DownloadCellDisconnecting => self.download_cell_disconnecting(now),
            NcpFwUpdateState::DownloadCellConnecting => self.download_cell_connecting(now, entered),
            NcpFwUpdateState::DownloadHttpsSetup => self.download_https_setup(now),
            NcpFwUpdateState::DownloadReady => self.download_ready(now),
            NcpFwUpdateState::InstallCellDisconnecting => {
                self.install_cell_disconnecting(now, entered)
            }
            NcpFwUpdateState::InstallStarting => self.install_starting(now, entered),
            NcpFwUpdateState::InstallWaiting => self.install_waiting(now, entered),
            NcpFwUpdateState::FinishedPowerOff => self.finished_power_off(),
            NcpFwUpdateState::FinishedPoweringOff => self.finished_powering_off(now),
            NcpFwUpdateState::FinishedCloudConnecting => {
                self.finished_cloud_connecting(now, entered)
            }
            NcpFwUpdateState::FinishedCloudConnected => self.finished_cloud_connected(),
            NcpFwUpdateState::FinishedIdle => self.finished_idle(),
        }
        Ok(())
    }

    /// Last terminal status surfaced for diagnostics, `-1` before any run.
    pub fn status_diagnostics(&self) -> i32 {
        self.status_diag.as_i32()
    }

    /// Re-publishes the diagnostic to telemetry and returns it.
    pub fn update_status_diagnostics(&self) -> i32 {
        telemetry::set_ncp_update_status_diag(self.status_diag);
        self.status_diag.as_i32()
    }

    pub fn state(&self) -> NcpFwUpdateState {
        self.data.state
    }

    pub fn status(&self) -> NcpFwUpdateStatus {
        self.data.status
    }

    pub fn data(&self) -> &NcpFwUpdateData {
        &self.data
    }

    pub fn in_cooldown(&self) -> bool {
        self.cooldown.in_cooldown()
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn into_platform(self) -> P {
        self.platform
    }

    fn ensure_ready_for_request(&self) -> Result<(), SystemError> {
        if self.callbacks.is_none()
            || self.data.state != NcpFwUpdateState::Idle
            || self.data.status != NcpFwUpdateStatus::Idle
        {
            return Err(SystemError::InvalidState);
        }
        Ok(())
    }

    fn begin_run(&mut self) {
        telemetry::record_ncp_update_run();
        self.retries = Retries::default();
        self.cooldown.clear();
        self.transition(NcpFwUpdateState::QualifyFlags);
    }

    fn power_on_blocking(&mut self) -> bool {
        if self.platform.network_power_state(NCP_FW_UPDATE_INTERFACE) == PowerState::On {
            return true;
        }
        if self.platform.network_on(NCP_FW_UPDATE_INTERFACE).is_err() {
            return false;
        }
        let started = self.platform.now_ms();
        loop {
            if self.platform.network_power_state(NCP_FW_UPDATE_INTERFACE) == PowerState::On {
                return true;
            }
            let elapsed = self.platform.now_ms().saturating_sub(started);
            if elapsed >= u64::from(self.policy.power_on_timeout_ms) {
                return false;
            }
            self.platform.delay_ms(POWER_ON_POLL_MS);
        }
    }

    fn transition(&mut self, next: NcpFwUpdateState) {
        if self.data.state != next {
            info!(
                "ncp_fw: state {} -> {}",
                self.data.state.as_str(),
                next.as_str()
            );
        }
        self.data.state = next;
        self.stage = StageTimer::default();
    }

    /// Records a terminal failure and routes it to `next`.
    fn fail(&mut self, status: NcpFwUpdateStatus, next: NcpFwUpdateState) {
        error!(
            "ncp_fw: failed status={} in state={}",
            status.as_str(),
            self.data.state.as_str()
        );
        self.data.status = status;
        self.transition(next);
    }

    fn checkpoint(&mut self, state: NcpFwUpdateState) {
        self.data.state = state;
        self.persist();
    }

    fn persist(&mut self) {
        let record = self.data.to_record();
        if let Err(err) = self
            .platform
            .cache_set(CacheKey::NcpFwUpdateData, &record)
        {
            warn!("ncp_fw: checkpoint write failed err={}", err.as_str());
        }
    }

    fn recall(&mut self) -> Option<NcpFwUpdateData> {
        let mut record = [0u8; NCP_FW_UPDATE_DATA_LEN];
        let len = match self
            .platform
            .cache_get(CacheKey::NcpFwUpdateData, &mut record)
        {
            Ok(len) => len,
            Err(SystemError::NotFound) => return None,
            Err(err) => {
                warn!("ncp_fw: checkpoint unreadable err={}", err.as_str());
                return None;
            }
        };
        let data = NcpFwUpdateData::from_record(&record[..len]);
        if data.is_none() {
            warn!("ncp_fw: checkpoint invalid len={}, using defaults", len);
        }
        data
    }

    fn set_status_diag(&mut self, status: NcpFwUpdateStatus) {
        self.status_diag = status;
        telemetry::set_ncp_update_status_diag(status);
    }

    fn request_safe_mode_reset(&mut self) {
        telemetry::record_ncp_reset_requested();
        info!("ncp_fw: reset into safe mode");
        self.platform.reset_into_safe_mode();
    }

    fn feature_enabled(&self) -> bool {
        self.callbacks
            .as_ref()
            .is_some_and(|cloud| cloud.feature_enabled(CloudFeature::NcpFwUpdates))
    }

    fn cloud_connected(&self) -> bool {
        self.callbacks
            .as_ref()
            .is_some_and(|cloud| cloud.is_cloud_connected())
    }

    fn cloud_request_connect(&mut self) {
        if let Some(cloud) = self.callbacks.as_mut() {
            cloud.request_connect();
        }
    }

    fn cloud_request_disconnect(&mut self) {
        if let Some(cloud) = self.callbacks.as_mut() {
            cloud.request_disconnect();
        }
    }

    fn publish(&mut self, data: &str) -> bool {
        match self.callbacks.as_mut() {
            Some(cloud) if cloud.is_cloud_connected() => {
                cloud.publish(NCP_FW_UPDATE_EVENT, data, PublishVisibility::Private)
            }
            _ => false,
        }
    }

    fn timed_out(&self, now: u64, timeout_ms: u32) -> bool {
        self.stage.elapsed(now) >= u64::from(timeout_ms)
    }

    /// Nothing runs in safe mode without a stage in flight, so an idle tick
    /// there always leaves it. The finished record, if any, is surfaced by
    /// the normal-mode boot.
    fn idle(&mut self) {
        if self.platform.is_safe_mode() {
            info!(
                "ncp_fw: idle in safe mode status={}, leaving safe mode",
                self.data.status.as_str()
            );
            self.data.is_user_config = false;
            telemetry::record_ncp_reset_requested();
            self.platform.reset_into_normal_mode();
        } else if self.data.status != NcpFwUpdateStatus::Idle {
            self.data.status = NcpFwUpdateStatus::Idle;
        }
    }

    fn qualify_flags(&mut self) {
        if self.platform.ncp_identifier() != SUPPORTED_NCP {
            info!("ncp_fw: ncp not supported, nothing to do");
            self.transition(NcpFwUpdateState::Idle);
            return;
        }
        if !self.feature_enabled() || !self.platform.updates_enabled() {
            warn!("ncp_fw: updates disabled by feature or user flag");
            self.set_status_diag(NcpFwUpdateStatus::FailedQualifyFlags);
            self.transition(NcpFwUpdateState::Idle);
            return;
        }
        if self.platform.network_power_state(NCP_FW_UPDATE_INTERFACE) != PowerState::On {
            if let Err(err) = self.platform.network_on(NCP_FW_UPDATE_INTERFACE) {
                warn!("ncp_fw: modem power on failed err={}", err.as_str());
                self.transition(NcpFwUpdateState::QualifyRetry);
                return;
            }
        }
        self.transition(NcpFwUpdateState::QualifyModemOn);
    }

    fn qualify_modem_on(&mut self, now: u64) {
        if self.platform.network_power_state(NCP_FW_UPDATE_INTERFACE) != PowerState::On {
            if self.timed_out(now, self.policy.power_on_timeout_ms) {
                warn!("ncp_fw: modem power on timeout");
                self.transition(NcpFwUpdateState::QualifyRetry);
            }
            return;
        }

        let version = modem::read_firmware_version(&mut self.platform);
        if version == 0 {
            warn!("ncp_fw: modem version unreadable");
            self.transition(NcpFwUpdateState::QualifyRetry);
            return;
        }
        self.data.firmware_version = version;

        if !self.select_upgrade(version) {
            info!("ncp_fw: no update for version={}", version);
            self.data.update_available = UpdateAvailable::NotAvailable;
            self.transition(NcpFwUpdateState::Idle);
            return;
        }

        info!(
            "ncp_fw: update available {} -> {}",
            version, self.data.update_version
        );
        self.data.update_available = UpdateAvailable::Available;
        self.checkpoint(NcpFwUpdateState::SetupCloudConnect);
        if !self.platform.is_safe_mode() {
            self.request_safe_mode_reset();
            return;
        }
        self.transition(NcpFwUpdateState::SetupCloudConnect);
    }

    /// Picks the caller config or the built-in table entry for `version`.
    fn select_upgrade(&mut self, version: u32) -> bool {
        if self.data.is_user_config {
            if self.data.user_config.start_version != version {
                return false;
            }
            self.data.update_version = self.data.user_config.end_version;
            return true;
        }
        let Some(known) = find_known_upgrade(version) else {
            return false;
        };
        let mut filename = String::new();
        let mut md5sum = String::new();
        if filename.push_str(known.filename).is_err() || md5sum.push_str(known.md5sum).is_err() {
            return false;
        }
        self.data.user_config = NcpFwUpdateConfig {
            start_version: known.start_version,
            end_version: known.end_version,
            filename,
            md5sum,
        };
        self.data.update_version = known.end_version;
        true
    }

    fn qualify_retry(&mut self, now: u64) {
        self.retries.qualify = self.retries.qualify.saturating_add(1);
        if self.retries.qualify > self.policy.qualify_retry_max {
            error!(
                "ncp_fw: qualify gave up after {} retries",
                self.policy.qualify_retry_max
            );
            self.transition(NcpFwUpdateState::Idle);
            return;
        }
        warn!("ncp_fw: qualify retry {}", self.retries.qualify);
        self.cooldown.arm(now, self.policy.qualify_retry_cooldown_ms);
        self.transition(NcpFwUpdateState::QualifyFlags);
    }

    fn setup_cloud_connect(&mut self) {
        if !self.cloud_connected() {
            self.cloud_request_connect();
        }
        self.transition(NcpFwUpdateState::SetupCloudConnecting);
    }

    fn setup_cloud_connecting(&mut self, now: u64) {
        if self.cloud_connected() {
            self.transition(NcpFwUpdateState::SetupCloudConnected);
        } else if self.timed_out(now, self.policy.cloud_connect_timeout_ms) {
            self.fail(
                NcpFwUpdateStatus::FailedCloudConnectOnEntryTimeout,
                NcpFwUpdateState::FinishedIdle,
            );
        }
    }

    fn setup_cloud_connected(&mut self, now: u64) {
        if self.publish(NCP_FW_UPDATE_DATA_STARTED) {
            self.data.status = NcpFwUpdateStatus::Downloading;
            self.cooldown.arm(now, self.policy.publish_start_cooldown_ms);
            self.transition(NcpFwUpdateState::DownloadCloudDisconnect);
            return;
        }
        self.retries.publish_start = self.retries.publish_start.saturating_add(1);
        if self.retries.publish_start > self.policy.publish_start_retry_max {
            self.fail(
                NcpFwUpdateStatus::FailedPublishStart,
                NcpFwUpdateState::FinishedIdle,
            );
        } else {
            warn!("ncp_fw: publish start failed, retrying");
        }
    }

    fn download_cloud_disconnect(&mut self, now: u64, entered: bool) {
        if entered && self.cloud_connected() {
            self.cloud_request_disconnect();
        }
        if self.cloud_connected() {
            if !self.timed_out(now, self.policy.cloud_disconnect_timeout_ms) {
                return;
            }
            warn!("ncp_fw: cloud disconnect timeout, tearing down cellular anyway");
        }
        self.platform
            .set_ncp_update_mode(NCP_FW_UPDATE_INTERFACE, true);
        if let Err(err) = self
            .platform
            .network_disconnect(NCP_FW_UPDATE_INTERFACE, DisconnectReason::NcpUpdate)
        {
            warn!("ncp_fw: cellular disconnect request failed err={}", err.as_str());
        }
        self.cooldown
            .arm(now, self.policy.cloud_disconnect_cooldown_ms);
        self.transition(NcpFwUpdateState::DownloadCellDisconnecting);
    }

    fn download_cell_disconnecting(&mut self, now: u64) {
        if !self.platform.network_ready(NCP_FW_UPDATE_INTERFACE) {
            self.transition(NcpFwUpdateState::DownloadCellConnecting);
        } else if self.timed_out(now, self.policy.cellular_disconnect_timeout_ms) {
            self.fail(
                NcpFwUpdateStatus::FailedSetupCellularDisconnectTimeout,
                NcpFwUpdateState::FinishedIdle,
            );
        }
    }

    fn download_cell_connecting(&mut self, now: u64, entered: bool) {
        if entered {
            if let Err(err) = self.platform.network_connect(NCP_FW_UPDATE_INTERFACE) {
                warn!("ncp_fw: cellular connect request failed err={}", err.as_str());
            }
        }
        if modem::is_registered(&mut self.platform) {
            if modem::pdp_active(&mut self.platform, NCP_FW_UPDATE_PDP_PROFILE) {
                self.transition(NcpFwUpdateState::DownloadHttpsSetup);
                return;
            }
            let result = modem::activate_pdp(
                &mut self.platform,
                NCP_FW_UPDATE_PDP_PROFILE,
                NCP_FW_UPDATE_PDP_CID,
            );
            if result.is_ok() {
                self.transition(NcpFwUpdateState::DownloadHttpsSetup);
                return;
            }
            debug!("ncp_fw: pdp activation result={}", result.as_str());
        }
        if self.timed_out(now, self.policy.cellular_connect_timeout_ms) {
            self.fail(
                NcpFwUpdateStatus::FailedCellularConnectTimeout,
                NcpFwUpdateState::FinishedIdle,
            );
            return;
        }
        self.cooldown.arm(now, self.policy.cellular_connect_poll_ms);
    }

    fn download_https_setup(&mut self, now: u64) {
        if modem::setup_https(&mut self.platform, &self.server).is_ok() {
            self.transition(NcpFwUpdateState::DownloadReady);
            return;
        }
        self.retries.https_setup = self.retries.https_setup.saturating_add(1);
        if self.retries.https_setup > self.policy.https_setup_retry_max {
            self.fail(
                NcpFwUpdateStatus::FailedHttpsSetup,
                NcpFwUpdateState::FinishedIdle,
            );
        } else {
            warn!("ncp_fw: https setup retry {}", self.retries.https_setup);
            self.cooldown
                .arm(now, self.policy.https_setup_retry_cooldown_ms);
        }
    }

    fn download_ready(&mut self, now: u64) {
        let Some(pending_since) = self.stage.pending_since_ms else {
            self.start_download_attempt(now);
            return;
        };

        if let Some(response) = self.urc.take_https_response() {
            let matched = response.command == 100
                && response.result == 1
                && response.status_code == 200
                && self.data.user_config.md5_matches(&response.md5_sum);
            if matched {
                info!("ncp_fw: download complete md5 verified");
                self.transition(NcpFwUpdateState::InstallCellDisconnecting);
            } else {
                warn!(
                    "ncp_fw: download rejected command={} result={} status={} md5={}",
                    response.command,
                    response.result,
                    response.status_code,
                    response.md5_sum.as_str()
                );
                self.download_attempt_failed();
            }
            return;
        }

        if now.saturating_sub(pending_since) >= u64::from(self.policy.download_timeout_ms) {
            warn!("ncp_fw: download timeout");
            self.download_attempt_failed();
        }
    }

    fn start_download_attempt(&mut self, now: u64) {
        if self.urc.take_pdp_deactivation() == Some(NCP_FW_UPDATE_PDP_CID) {
            info!("ncp_fw: pdp context was deactivated, reactivating");
            let result = modem::activate_pdp(
                &mut self.platform,
                NCP_FW_UPDATE_PDP_PROFILE,
                NCP_FW_UPDATE_PDP_CID,
            );
            debug!("ncp_fw: pdp reactivation result={}", result.as_str());
        }

        let filename = self.data.user_config.filename.clone();
        if modem::file_exists(&mut self.platform, &filename) {
            info!("ncp_fw: deleting stale image {}", filename.as_str());
            let result = modem::delete_file(&mut self.platform, &filename);
            if !result.is_ok() {
                warn!(
                    "ncp_fw: stale image not deleted result={}",
                    result.as_str()
                );
            }
        }

        self.urc.clear_https_response();
        telemetry::record_ncp_download_attempt();
        info!(
            "ncp_fw: download attempt {} file={}",
            self.retries.download + 1,
            filename.as_str()
        );
        match modem::start_download(&mut self.platform, &filename) {
            AtResult::Ok => self.stage.pending_since_ms = Some(now),
            result => {
                warn!("ncp_fw: download command result={}", result.as_str());
                self.download_attempt_failed();
            }
        }
    }

    fn download_attempt_failed(&mut self) {
        telemetry::record_ncp_download_failure();
        if let Some((class, code)) = modem::http_error(&mut self.platform) {
            warn!("ncp_fw: http error class={} code={}", class, code);
        }
        self.stage.pending_since_ms = None;
        self.retries.download = self.retries.download.saturating_add(1);
        if self.retries.download >= self.policy.download_attempts_max {
            self.fail(
                NcpFwUpdateStatus::FailedDownloadRetryMax,
                NcpFwUpdateState::FinishedIdle,
            );
        } else {
            warn!("ncp_fw: download retry {}", self.retries.download);
        }
    }

    fn install_cell_disconnecting(&mut self, now: u64, entered: bool) {
        if entered {
            if let Err(err) = self
                .platform
                .network_disconnect(NCP_FW_UPDATE_INTERFACE, DisconnectReason::NcpUpdate)
            {
                warn!("ncp_fw: cellular disconnect request failed err={}", err.as_str());
            }
        }
        if !self.platform.network_ready(NCP_FW_UPDATE_INTERFACE) {
            self.transition(NcpFwUpdateState::InstallStarting);
        } else if self.timed_out(now, self.policy.cellular_disconnect_timeout_ms) {
            self.fail(
                NcpFwUpdateStatus::FailedInstallCellularDisconnectTimeout,
                NcpFwUpdateState::FinishedIdle,
            );
        }
    }

    fn install_starting(&mut self, now: u64, entered: bool) {
        if entered {
            let version = modem::read_firmware_version(&mut self.platform);
            self.data.starting_firmware_version = if version != 0 {
                version
            } else {
                self.data.firmware_version
            };
            self.urc.clear_install_progress();
            self.last_progress = None;
            info!(
                "ncp_fw: starting install from version={}",
                self.data.starting_firmware_version
            );
            if modem::start_install(&mut self.platform) == AtResult::Error {
                self.fail(
                    NcpFwUpdateStatus::FailedInstallAtError,
                    NcpFwUpdateState::FinishedPowerOff,
                );
                return;
            }
            self.cooldown.arm(now, self.policy.install_start_poll_ms);
            return;
        }

        if !modem::probe(&mut self.platform).is_ok() {
            info!("ncp_fw: modem went silent, install running");
            self.data.status = NcpFwUpdateStatus::Updating;
            self.checkpoint(NcpFwUpdateState::InstallWaiting);
            self.transition(NcpFwUpdateState::InstallWaiting);
            return;
        }
        if self.timed_out(now, self.policy.install_start_timeout_ms) {
            self.fail(
                NcpFwUpdateStatus::FailedStartInstallTimeout,
                NcpFwUpdateState::FinishedPowerOff,
            );
            return;
        }
        self.cooldown.arm(now, self.policy.install_start_poll_ms);
    }

    fn install_waiting(&mut self, now: u64, entered: bool) {
        if entered {
            debug!("ncp_fw: install waiting");
            self.cooldown.arm(now, self.policy.install_atok_interval_ms);
            return;
        }
        telemetry::record_ncp_install_poll();

        let progress = self.urc.install_progress();
        if progress != self.last_progress {
            if let Some(progress) = progress {
                info!("ncp_fw: install progress {}%", progress);
            }
            self.last_progress = progress;
        }
        let complete = progress.is_some_and(|value| value >= NCP_FW_INSTALL_PROGRESS_COMPLETE);

        if modem::probe(&mut self.platform).is_ok() {
            let version = modem::read_firmware_version(&mut self.platform);
            if version != 0 {
                if version == self.data.starting_firmware_version {
                    self.data.firmware_version = version;
                    self.fail(
                        NcpFwUpdateStatus::FailedSameVersion,
                        NcpFwUpdateState::FinishedPowerOff,
                    );
                    return;
                }
                if version == self.data.update_version || complete {
                    info!("ncp_fw: install succeeded version={}", version);
                    self.data.firmware_version = version;
                    self.data.status = NcpFwUpdateStatus::Success;
                    self.transition(NcpFwUpdateState::FinishedPowerOff);
                    return;
                }
                debug!("ncp_fw: modem answers with version={}, waiting", version);
            }
        }

        if self.timed_out(now, self.policy.install_finish_timeout_ms) {
            self.fail(
                NcpFwUpdateStatus::FailedInstallTimeout,
                NcpFwUpdateState::FinishedPowerOff,
            );
            return;
        }
        self.cooldown.arm(now, self.policy.install_atok_interval_ms);
    }

    fn finished_power_off(&mut self) {
        self.checkpoint(NcpFwUpdateState::FinishedPowerOff);
        if let Err(err) = self.platform.network_off(NCP_FW_UPDATE_INTERFACE) {
            warn!("ncp_fw: modem power off request failed err={}", err.as_str());
        }
        self.transition(NcpFwUpdateState::FinishedPoweringOff);
    }

    fn finished_powering_off(&mut self, now: u64) {
        if self.platform.network_power_state(NCP_FW_UPDATE_INTERFACE) == PowerState::Off {
            self.checkpoint(NcpFwUpdateState::FinishedCloudConnecting);
            self.transition(NcpFwUpdateState::FinishedCloudConnecting);
        } else if self.timed_out(now, self.policy.power_off_timeout_ms) {
            self.fail(
                NcpFwUpdateStatus::FailedPowerOffTimeout,
                NcpFwUpdateState::FinishedIdle,
            );
        }
    }

    fn finished_cloud_connecting(&mut self, now: u64, entered: bool) {
        if entered {
            self.platform
                .set_ncp_update_mode(NCP_FW_UPDATE_INTERFACE, false);
            if let Err(err) = self.platform.network_on(NCP_FW_UPDATE_INTERFACE) {
                warn!("ncp_fw: modem power on request failed err={}", err.as_str());
            }
            if let Err(err) = self.platform.network_connect(NCP_FW_UPDATE_INTERFACE) {
                warn!("ncp_fw: cellular connect request failed err={}", err.as_str());
            }
            self.cloud_request_connect();
        }
        if self.cloud_connected() {
            self.transition(NcpFwUpdateState::FinishedCloudConnected);
            return;
        }
        if !self.timed_out(now, self.policy.cloud_connect_timeout_ms) {
            return;
        }
        self.retries.cloud_connect_exit = self.retries.cloud_connect_exit.saturating_add(1);
        if self.retries.cloud_connect_exit > self.policy.cloud_connect_exit_retry_max {
            self.fail(
                NcpFwUpdateStatus::FailedCloudConnectOnExitTimeout,
                NcpFwUpdateState::FinishedIdle,
            );
        } else {
            warn!("ncp_fw: cloud connect timeout, power cycling modem");
            self.transition(NcpFwUpdateState::FinishedPowerOff);
        }
    }

    fn finished_cloud_connected(&mut self) {
        let payload = if self.data.status == NcpFwUpdateStatus::Success {
            NCP_FW_UPDATE_DATA_SUCCESS
        } else {
            NCP_FW_UPDATE_DATA_FAILED
        };
        if !self.publish(payload) {
            self.fail(
                NcpFwUpdateStatus::FailedPublishResult,
                NcpFwUpdateState::FinishedIdle,
            );
            return;
        }
        info!("ncp_fw: published result {}", payload);
        self.transition(NcpFwUpdateState::FinishedIdle);
    }

    fn finished_idle(&mut self) {
        self.platform
            .set_ncp_update_mode(NCP_FW_UPDATE_INTERFACE, false);
        self.checkpoint(NcpFwUpdateState::FinishedIdle);
        self.set_status_diag(self.data.status);
        info!(
            "ncp_fw: run finished status={}",
            self.data.status.as_str()
        );
        self.data.update_available = UpdateAvailable::Unknown;
        self.data.is_user_config = false;
        self.transition(NcpFwUpdateState::Idle);
    }
}
