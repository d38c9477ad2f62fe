use std::time::Duration;

use minidsp_frame::{decode_report, encode_report, hex, Frame, REPORT_SIZE};
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info, warn};

use crate::config::UsbConfig;
use crate::error::{Result, TransportError};
use crate::link::{LinkParts, ProbedDevice, Transport, TransportKind};

/// Blocking access to one HID device.
///
/// Implemented for `hidapi::HidDevice` when the `usb` feature is enabled.
pub trait HidLink: Send + 'static {
    /// Write one output report. The first byte is the report id.
    fn write_report(&mut self, report: &[u8]) -> std::io::Result<usize>;

    /// Read one input report into `buf`.
    ///
    /// Returns `Ok(0)` when nothing arrived within `timeout`.
    fn read_report(&mut self, buf: &mut [u8], timeout: Duration) -> std::io::Result<usize>;
}

/// USB HID transport: one frame per 64-byte report.
pub struct UsbTransport;

impl UsbTransport {
    /// Drive an already opened HID link.
    ///
    /// The link is serviced on a blocking task; must be called from within a
    /// tokio runtime. The link is dropped when the transport closes.
    pub fn from_link<L: HidLink>(link: L, config: &UsbConfig) -> Transport {
        let (transport, parts) = Transport::new_pair(TransportKind::Usb, &config.transport);
        let poll_interval = config.poll_interval;
        tokio::task::spawn_blocking(move || service_link(link, parts, poll_interval));
        transport
    }

    /// Open the device by path, or else by vendor/product id.
    #[cfg(feature = "usb")]
    pub fn open(config: &UsbConfig) -> Result<Transport> {
        let device = hid::open(config)?;
        Ok(Self::from_link(device, config))
    }

    #[cfg(not(feature = "usb"))]
    pub fn open(_config: &UsbConfig) -> Result<Transport> {
        Err(TransportError::Unsupported(
            "USB support was not compiled in (enable the `usb` feature)",
        ))
    }

    /// List attached devices matching the configured vendor/product id.
    #[cfg(feature = "usb")]
    pub fn probe(config: &UsbConfig) -> Result<Vec<ProbedDevice>> {
        hid::probe(config)
    }

    #[cfg(not(feature = "usb"))]
    pub fn probe(_config: &UsbConfig) -> Result<Vec<ProbedDevice>> {
        Err(TransportError::Unsupported(
            "USB support was not compiled in (enable the `usb` feature)",
        ))
    }
}

fn service_link<L: HidLink>(mut link: L, parts: LinkParts, poll_interval: Duration) {
    let LinkParts {
        mut writes,
        frames,
        shutdown,
    } = parts;
    let mut report = [0u8; REPORT_SIZE];

    info!("USB link open");
    'link: while !shutdown.is_cancelled() {
        loop {
            match writes.try_recv() {
                Ok(request) => {
                    let result = write_frame(&mut link, &request.frame);
                    let fatal = matches!(result, Err(TransportError::Io(_)));
                    let _ = request.done.send(result);
                    if fatal {
                        break 'link;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break 'link,
            }
        }

        match link.read_report(&mut report, poll_interval) {
            Ok(0) => {}
            Ok(n) => match decode_report(&report[..n]) {
                Ok(frame) => {
                    debug!(payload = %hex(&frame.payload), "received report");
                    let _ = frames.send(frame);
                }
                Err(err) => warn!(error = %err, "dropping malformed report"),
            },
            Err(err) => {
                warn!(error = %err, "HID read failed");
                break;
            }
        }
    }

    shutdown.cancel();
    info!("USB link released");
}

fn write_frame<L: HidLink>(link: &mut L, frame: &Frame) -> Result<()> {
    let report = encode_report(frame)?;
    debug!(payload = %hex(&frame.payload), "writing report");
    let written = link.write_report(&report).inspect_err(|err| {
        warn!(error = %err, "HID write failed");
    })?;
    if written < report.len() {
        return Err(TransportError::Io(std::io::Error::new(
            std::io::ErrorKind::WriteZero,
            format!("short HID write ({written} of {} bytes)", report.len()),
        )));
    }
    Ok(())
}

#[cfg(feature = "usb")]
mod hid {
    use std::ffi::CString;
    use std::time::Duration;

    use hidapi::{HidApi, HidDevice};
    use tracing::info;

    use super::HidLink;
    use crate::config::UsbConfig;
    use crate::error::{Result, TransportError};
    use crate::link::ProbedDevice;

    impl HidLink for HidDevice {
        fn write_report(&mut self, report: &[u8]) -> std::io::Result<usize> {
            self.write(report)
                .map_err(|err| std::io::Error::other(err.to_string()))
        }

        fn read_report(&mut self, buf: &mut [u8], timeout: Duration) -> std::io::Result<usize> {
            let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
            self.read_timeout(buf, millis)
                .map_err(|err| std::io::Error::other(err.to_string()))
        }
    }

    fn api() -> Result<HidApi> {
        HidApi::new().map_err(|err| TransportError::Hid(err.to_string()))
    }

    pub(super) fn open(config: &UsbConfig) -> Result<HidDevice> {
        let api = api()?;

        let device = match &config.path {
            Some(path) => {
                info!(path = %path, "opening USB device by path");
                let c_path = CString::new(path.as_str())
                    .map_err(|_| TransportError::Hid(format!("invalid device path {path:?}")))?;
                api.open_path(&c_path)
            }
            None => {
                let present = api.device_list().any(|info| {
                    info.vendor_id() == config.vendor_id && info.product_id() == config.product_id
                });
                if !present {
                    return Err(TransportError::DeviceNotFound {
                        vid: config.vendor_id,
                        pid: config.product_id,
                    });
                }
                info!(
                    vendor_id = %format!("{:04X}", config.vendor_id),
                    product_id = %format!("{:04X}", config.product_id),
                    "opening USB device"
                );
                api.open(config.vendor_id, config.product_id)
            }
        };

        device.map_err(|err| TransportError::Hid(err.to_string()))
    }

    pub(super) fn probe(config: &UsbConfig) -> Result<Vec<ProbedDevice>> {
        let api = api()?;
        Ok(api
            .device_list()
            .filter(|info| {
                info.vendor_id() == config.vendor_id && info.product_id() == config.product_id
            })
            .map(|info| ProbedDevice {
                path: info.path().to_string_lossy().into_owned(),
                product: info.product_string().map(str::to_string),
                serial: info.serial_number().map(str::to_string),
            })
            .collect())
    }
}
