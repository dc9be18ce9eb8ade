mod config;

use embassy_time::{Duration, Ticker};
use esp_hal::{
    gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull},
    timer::timg::TimerGroup,
    uart::{Config as UartConfig, Uart},
};
use log::{info, warn};
use ncp_system::firmware::{
    at::UrcMailbox,
    ncp_update::NcpFwUpdate,
    platform::{EspDevice, LinkCloud, SaraPins, UartPort},
    system::NetworkControl,
    telemetry,
    types::NetworkInterface,
};

use self::config::{
    MODEM_UART_BAUD, NCP_UPDATES_ENABLED, SUPERVISOR_TICK_MS, TELEMETRY_INTERVAL_SECONDS,
};

type Updater = NcpFwUpdate<'static, EspDevice<'static>, LinkCloud>;

static URC: UrcMailbox = UrcMailbox::new();

pub(crate) fn run() -> ! {
    esp_println::logger::init_logger_from_env();

    let peripherals = esp_hal::init(esp_hal::Config::default());
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let uart_cfg = UartConfig::default().with_baudrate(MODEM_UART_BAUD);
    let uart = match Uart::new(peripherals.UART2, uart_cfg) {
        Ok(uart) => uart.with_rx(peripherals.GPIO16).with_tx(peripherals.GPIO17),
        Err(_) => halt_forever(),
    };
    let pins = SaraPins {
        pwr_on: Output::new(peripherals.GPIO26, Level::High, OutputConfig::default()),
        v_int: Input::new(
            peripherals.GPIO27,
            InputConfig::default().with_pull(Pull::Down),
        ),
    };

    let device = match EspDevice::new(
        UartPort::new(uart),
        &URC,
        pins,
        peripherals.FLASH,
        NCP_UPDATES_ENABLED,
    ) {
        Ok(device) => device,
        Err(err) => {
            warn!("app: device init failed err={}", err.as_str());
            halt_forever()
        }
    };

    let mut updater = NcpFwUpdate::new(device, &URC);
    if let Err(err) = updater.init(LinkCloud::new(NCP_UPDATES_ENABLED)) {
        warn!("app: ncp update init failed err={}", err.as_str());
    }
    if let Err(err) = updater.platform_mut().network_connect(NetworkInterface::Cellular) {
        warn!("app: cellular connect failed err={}", err.as_str());
    }

    let mut executor = esp_rtos::embassy::Executor::new();
    let executor = unsafe { make_static(&mut executor) };
    executor.run(move |spawner| {
        spawner.must_spawn(supervisor_task(updater));
        spawner.must_spawn(telemetry_task());
    });
}

#[embassy_executor::task]
async fn supervisor_task(mut updater: Updater) {
    let mut ticker = Ticker::every(Duration::from_millis(SUPERVISOR_TICK_MS));

    loop {
        ticker.next().await;
        updater.platform_mut().supervise();
        if let Err(err) = updater.process() {
            warn!("app: ncp update tick failed err={}", err.as_str());
        }
    }
}

#[embassy_executor::task]
async fn telemetry_task() {
    let mut ticker = Ticker::every(Duration::from_secs(TELEMETRY_INTERVAL_SECONDS));

    loop {
        ticker.next().await;
        let snapshot = telemetry::snapshot();
        info!(
            "telemetry: ncp_runs={} downloads={} download_failures={} install_polls={} resets={} status_diag={} net_connects={} net_watchdog_resets={} cell={:?}",
            snapshot.ncp_update_runs,
            snapshot.ncp_download_attempts,
            snapshot.ncp_download_failures,
            snapshot.ncp_install_polls,
            snapshot.ncp_resets_requested,
            snapshot.ncp_update_status_diag,
            snapshot.net_connect_attempts,
            snapshot.net_watchdog_resets,
            telemetry::network_diag_state(NetworkInterface::Cellular),
        );
    }
}

unsafe fn make_static<T>(value: &mut T) -> &'static mut T {
    unsafe { core::mem::transmute(value) }
}

fn halt_forever() -> ! {
    loop {
        core::hint::spin_loop();
    }
}
