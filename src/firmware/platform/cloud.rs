use core::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};

use super::super::{
    net::NotificationSink,
    system::CloudCallbacks,
    types::{CloudFeature, NetworkInterface, NetworkNotification, PublishVisibility},
};

/// Cellular link state shared between the interface sink and the cloud
/// stand-in.
static LINK_UP: AtomicBool = AtomicBool::new(false);
static CLOUD_WANTED: AtomicBool = AtomicBool::new(true);

/// Forwards interface transitions to the log and tracks link state.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinkSink;

impl NotificationSink for LinkSink {
    fn notify(&mut self, iface: NetworkInterface, notification: NetworkNotification) {
        info!("net: {} event={:?}", iface.as_str(), notification);
        match notification {
            NetworkNotification::Connected => LINK_UP.store(true, Ordering::Relaxed),
            NetworkNotification::Disconnected | NetworkNotification::PoweredOff => {
                LINK_UP.store(false, Ordering::Relaxed)
            }
            _ => {}
        }
    }

    fn request_cloud_disconnect(&mut self) {
        CLOUD_WANTED.store(false, Ordering::Relaxed);
    }
}

/// Cloud session seen as "connected whenever the cellular link is up and a
/// session is wanted". Publishes go to the log.
#[derive(Clone, Copy, Debug)]
pub struct LinkCloud {
    updates_feature: bool,
}

impl LinkCloud {
    pub const fn new(updates_feature: bool) -> Self {
        Self { updates_feature }
    }
}

impl CloudCallbacks for LinkCloud {
    fn is_cloud_connected(&self) -> bool {
        CLOUD_WANTED.load(Ordering::Relaxed) && LINK_UP.load(Ordering::Relaxed)
    }

    fn request_connect(&mut self) {
        CLOUD_WANTED.store(true, Ordering::Relaxed);
    }

    fn request_disconnect(&mut self) {
        CLOUD_WANTED.store(false, Ordering::Relaxed);
    }

    fn publish(&mut self, event: &str, data: &str, visibility: PublishVisibility) -> bool {
        if !self.is_cloud_connected() {
            warn!("cloud: publish dropped event={} link down", event);
            return false;
        }
        info!("cloud: publish event={} data={} visibility={:?}", event, data, visibility);
        true
    }

    fn feature_enabled(&self, feature: CloudFeature) -> bool {
        match feature {
            CloudFeature::NcpFwUpdates => self.updates_feature,
        }
    }
}
